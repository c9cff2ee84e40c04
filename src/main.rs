//! Undead Protocol entry point
//!
//! Native builds run a headless bot through a full run; the browser build
//! exposes `WebGame` to the page, which owns rendering and input capture.

#[cfg(target_arch = "wasm32")]
mod web {
    use wasm_bindgen::prelude::*;

    use undead_protocol::leaderboard::{DEFAULT_TOP, Leaderboard};
    use undead_protocol::notify::EventLog;
    use undead_protocol::persistence::LocalStore;
    use undead_protocol::sim::{ArenaWorld, WeaponKind};
    use undead_protocol::{Session, Tuning, platform};

    fn to_json<T: serde::Serialize>(value: &T) -> String {
        serde_json::to_string(value).unwrap_or_else(|e| {
            log::warn!("Could not encode for the page: {}", e);
            "null".to_string()
        })
    }

    /// One run, driven by the page's animation frame loop
    #[wasm_bindgen]
    pub struct WebGame {
        session: Session<ArenaWorld, Leaderboard<LocalStore>, EventLog>,
    }

    #[wasm_bindgen]
    impl WebGame {
        #[wasm_bindgen(constructor)]
        pub fn new(username: String) -> Result<WebGame, JsValue> {
            platform::init_logging();
            let store = LocalStore::open().map_err(|e| JsValue::from_str(&e.to_string()))?;
            let seed = js_sys::Date::now() as u64;
            let session = Session::start(
                username,
                seed,
                Tuning::load(),
                ArenaWorld::from_state,
                Leaderboard::new(store),
                EventLog::new(),
            )
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
            log::info!("Undead Protocol started (seed {})", seed);
            Ok(Self { session })
        }

        pub fn set_movement(&mut self, forward: bool, back: bool, left: bool, right: bool, sprint: bool) {
            let input = self.session.input_mut();
            input.forward = forward;
            input.back = back;
            input.left = left;
            input.right = right;
            input.sprint = sprint;
        }

        pub fn set_look(&mut self, yaw: f32, pitch: f32) {
            let input = self.session.input_mut();
            input.yaw = Some(yaw);
            input.pitch = Some(pitch);
        }

        pub fn set_fire(&mut self, held: bool) {
            self.session.input_mut().fire = held;
        }

        pub fn reload(&mut self) {
            self.session.input_mut().reload = true;
        }

        /// Number key pressed ("1", "2", "3")
        pub fn select_weapon(&mut self, key: &str) {
            if let Some(weapon) = WeaponKind::from_key(key) {
                self.session.input_mut().switch_weapon = Some(weapon);
            }
        }

        pub fn toggle_pause(&mut self) {
            self.session.input_mut().pause = true;
        }

        /// Advance by the frame delta (seconds)
        pub fn frame(&mut self, dt: f32) {
            self.session.update(dt);
        }

        pub fn is_over(&self) -> bool {
            self.session.is_over()
        }

        pub fn hud_json(&self) -> String {
            to_json(&self.session.hud())
        }

        /// Sounds, hit markers and banners to play
        pub fn drain_notices_json(&mut self) -> String {
            to_json(&self.session.notifier_mut().drain())
        }

        /// Raw simulation events since the last call
        pub fn drain_events_json(&mut self) -> String {
            to_json(&self.session.drain_events())
        }

        pub fn result_json(&self) -> String {
            to_json(&self.session.result())
        }

        pub fn leaderboard_json(&self) -> String {
            to_json(&self.session.sink().top(DEFAULT_TOP))
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::PathBuf;

    use clap::Parser;

    use undead_protocol::consts::SIM_DT;
    use undead_protocol::leaderboard::{DEFAULT_TOP, Leaderboard};
    use undead_protocol::notify::LogNotifier;
    use undead_protocol::persistence::MemoryStore;
    use undead_protocol::sim::{ArenaWorld, GameState, TickInput, WeaponKind};
    use undead_protocol::{Session, Tuning, platform, yaw_of};

    /// Headless Undead Protocol run driven by a simple bot
    #[derive(Parser)]
    #[command(author, version, about, long_about = None)]
    struct Args {
        /// Run seed (defaults to the clock)
        #[arg(long)]
        seed: Option<u64>,
        /// Tuning JSON; missing fields keep their defaults
        #[arg(long)]
        tuning: Option<PathBuf>,
        #[arg(long, default_value = "bot")]
        username: String,
        /// Stop after this many simulation ticks
        #[arg(long, default_value_t = 60_000)]
        max_ticks: u64,
    }

    type HeadlessSession = Session<ArenaWorld, Leaderboard<MemoryStore>, LogNotifier>;

    /// Aim at the nearest live enemy and shoot it; reload when dry
    fn drive(state: &GameState, input: &mut TickInput) {
        let eye = state.player.position;
        let target = state
            .enemies
            .iter()
            .filter(|e| !e.is_dead())
            .min_by(|a, b| eye.distance(a.position).total_cmp(&eye.distance(b.position)));

        input.fire = false;
        if state.player.ammo == 0 {
            input.reload = true;
            return;
        }
        let Some(enemy) = target else {
            return;
        };

        let to_enemy = enemy.position - eye;
        let distance = to_enemy.length();
        if distance <= f32::EPSILON {
            return;
        }
        input.yaw = Some(yaw_of(to_enemy));
        input.pitch = Some((to_enemy.y / distance).clamp(-1.0, 1.0).asin());
        input.fire = true;

        // Back off when one gets close
        input.back = distance < 4.0;
        input.switch_weapon = match state.player.weapon {
            WeaponKind::Shotgun if distance > 8.0 => Some(WeaponKind::Rifle),
            WeaponKind::Rifle | WeaponKind::Pistol if distance < 5.0 => Some(WeaponKind::Shotgun),
            _ => None,
        };
    }

    pub fn run() {
        let args = Args::parse();
        platform::init_logging();

        let tuning = match &args.tuning {
            Some(path) => match Tuning::from_path(path) {
                Ok(tuning) => tuning,
                Err(e) => {
                    log::error!("Could not load {}: {}", path.display(), e);
                    std::process::exit(1);
                }
            },
            None => Tuning::default(),
        };
        let seed = args.seed.unwrap_or_else(|| platform::now_ms() as u64);
        log::info!("Undead Protocol (headless) starting, seed {}", seed);

        let mut session: HeadlessSession = match Session::start(
            args.username.as_str(),
            seed,
            tuning,
            ArenaWorld::from_state,
            Leaderboard::new(MemoryStore::new()),
            LogNotifier,
        ) {
            Ok(session) => session,
            Err(e) => {
                log::error!("Could not start the run: {}", e);
                std::process::exit(1);
            }
        };

        while !session.is_over() && session.state().time_ticks < args.max_ticks {
            let mut input = session.input_mut().clone();
            drive(session.state(), &mut input);
            *session.input_mut() = input;
            session.update(SIM_DT);
        }

        let hud = session.hud();
        match session.result() {
            Some(result) => log::info!(
                "{} fell on wave {}: score {}, {} kills, {}% accuracy",
                result.username,
                result.wave_reached,
                result.final_score,
                result.total_kills,
                result.accuracy_percent
            ),
            None => log::info!(
                "Stopped after {} ticks alive: health {}, score {}, wave {}",
                session.state().time_ticks,
                hud.health,
                hud.score,
                hud.wave
            ),
        }

        for (rank, entry) in session.sink().top(DEFAULT_TOP).iter().enumerate() {
            log::info!(
                "#{} {} {} (wave {}, {} kills)",
                rank + 1,
                entry.username,
                entry.final_score,
                entry.wave_reached,
                entry.total_kills
            );
        }
        let profile = session.sink().profile(&args.username);
        log::info!(
            "{}: {} games, best {}, highest wave {}",
            args.username,
            profile.games_played,
            profile.highest_score,
            profile.highest_wave
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The page constructs WebGame; nothing to do at load
}
