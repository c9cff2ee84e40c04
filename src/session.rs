//! Run lifecycle around the simulation
//!
//! Owns one run: the game state, the collision world, the leaderboard sink
//! and the notifier. The host calls `update` once per rendered frame with
//! the real frame time; the session turns that into fixed simulation ticks,
//! forwards notifications, and saves the result when the player dies.

use serde::Serialize;

use crate::consts::*;
use crate::error::SpawnError;
use crate::leaderboard::{LeaderboardSink, RecordOutcome, RunResult};
use crate::notify::{self, Notifier};
use crate::platform;
use crate::sim::{GameEvent, GamePhase, GameState, PhysicsWorld, TickInput, start_run, tick};
use crate::tuning::Tuning;

/// HUD snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hud {
    pub health: u32,
    pub max_health: u32,
    pub ammo: u32,
    pub max_ammo: u32,
    pub weapon: &'static str,
    pub score: u64,
    pub wave: u32,
    pub kills: u32,
    pub accuracy: u32,
    pub paused: bool,
    pub game_over: bool,
}

pub struct Session<W, S, N> {
    state: GameState,
    world: W,
    sink: S,
    notifier: N,
    input: TickInput,
    accumulator: f32,
    /// Events since the host last polled
    pending: Vec<GameEvent>,
    saved: bool,
    record: Option<RecordOutcome>,
}

impl<W: PhysicsWorld, S: LeaderboardSink, N: Notifier> Session<W, S, N> {
    /// Lay out a new arena, build the world for it, and drop the player in
    ///
    /// `build_world` receives the fresh state so it can add the buildings.
    pub fn start(
        username: impl Into<String>,
        seed: u64,
        tuning: Tuning,
        build_world: impl FnOnce(&GameState) -> W,
        sink: S,
        notifier: N,
    ) -> Result<Self, SpawnError> {
        let mut state = GameState::new(seed, username, tuning);
        state.started_at_ms = platform::now_ms();
        let mut world = build_world(&state);
        start_run(&mut state, &mut world)?;

        Ok(Self {
            state,
            world,
            sink,
            notifier,
            input: TickInput::default(),
            accumulator: 0.0,
            pending: Vec::new(),
            saved: false,
            record: None,
        })
    }

    /// Input applied on the next tick; one-shots are cleared once used
    pub fn input_mut(&mut self) -> &mut TickInput {
        &mut self.input
    }

    /// Advance by a frame of real time
    pub fn update(&mut self, frame_dt: f32) {
        let dt = frame_dt.clamp(0.0, MAX_FRAME_DT);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut self.state, &mut self.world, &self.input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            self.input.clear_one_shots();
            self.flush_events();
        }

        // Carry at most one tick of rounding over
        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }
    }

    fn flush_events(&mut self) {
        let mut events = self.state.drain_events();
        if events.is_empty() {
            return;
        }
        // The sim clock stops while paused; stamp results with the real end time
        for event in &mut events {
            if let GameEvent::RunEnded(result) = event {
                result.timestamp = platform::now_ms();
                self.state.result = Some(result.clone());
            }
        }
        notify::dispatch(&events, &mut self.notifier);

        for event in &events {
            if let GameEvent::RunEnded(result) = event {
                self.save(result);
            }
        }
        self.pending.extend(events);
    }

    fn save(&mut self, result: &RunResult) {
        if self.saved {
            return;
        }
        self.saved = true;
        match self.sink.record(result) {
            Ok(outcome) => self.record = Some(outcome),
            Err(e) => log::warn!("Run result not saved: {}", e),
        }
    }

    /// Events raised since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn hud(&self) -> Hud {
        let player = &self.state.player;
        Hud {
            health: player.health,
            max_health: player.max_health,
            ammo: player.ammo,
            max_ammo: player.max_ammo,
            weapon: player.weapon.stats().name,
            score: player.score,
            wave: self.state.waves.current_wave,
            kills: player.total_kills,
            accuracy: player.accuracy_percent(),
            paused: self.state.phase == GamePhase::Paused,
            game_over: self.is_over(),
        }
    }

    pub fn is_over(&self) -> bool {
        self.state.phase == GamePhase::GameOver
    }

    /// Final stats, once the run is over
    pub fn result(&self) -> Option<&RunResult> {
        self.state.result.as_ref()
    }

    /// Leaderboard placement, once saved
    pub fn record(&self) -> Option<RecordOutcome> {
        self.record
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PersistenceError;
    use crate::notify::{EventLog, Notice, NullNotifier};
    use crate::sim::ArenaWorld;
    use crate::sim::spawner::spawn_enemy_at;
    use glam::Vec3;

    #[derive(Default)]
    struct CountingSink {
        calls: Vec<RunResult>,
        fail: bool,
    }

    impl LeaderboardSink for CountingSink {
        fn record(&mut self, result: &RunResult) -> Result<RecordOutcome, PersistenceError> {
            self.calls.push(result.clone());
            if self.fail {
                return Err(PersistenceError::Unavailable);
            }
            Ok(RecordOutcome {
                rank: 1,
                personal_best: true,
            })
        }
    }

    fn quiet() -> Tuning {
        Tuning {
            obstacle_count: 0,
            spawn_interval_ms: 10_000_000,
            min_spawn_interval_ms: 10_000_000,
            ..Tuning::default()
        }
    }

    fn session<N: Notifier>(sink: CountingSink, notifier: N) -> Session<ArenaWorld, CountingSink, N> {
        Session::start("tester", 3, quiet(), ArenaWorld::from_state, sink, notifier).unwrap()
    }

    #[test]
    fn test_fixed_substeps() {
        let mut s = session(CountingSink::default(), NullNotifier);
        s.update(0.035);
        assert_eq!(s.state().time_ticks, 3);
        s.update(0.006);
        assert_eq!(s.state().time_ticks, 4);

        // Long frames are capped
        s.update(5.0);
        assert_eq!(s.state().time_ticks, 4 + MAX_SUBSTEPS as u64);
    }

    #[test]
    fn test_slow_frames_keep_real_time() {
        let mut s = session(CountingSink::default(), NullNotifier);
        // 10 fps for one second
        for _ in 0..10 {
            s.update(0.1);
        }
        let ticks = s.state().time_ticks;
        assert!((99..=100).contains(&ticks), "ticks = {}", ticks);
    }

    #[test]
    fn test_one_shot_input_cleared_after_use() {
        let mut s = session(CountingSink::default(), NullNotifier);
        s.input_mut().pause = true;
        s.update(0.03);
        assert!(s.hud().paused);
        assert!(!s.input_mut().pause);
    }

    #[test]
    fn test_death_saves_exactly_once() {
        let mut s = session(CountingSink::default(), NullNotifier);
        for _ in 0..4 {
            s.state_mut().damage_player(10);
        }
        s.update(0.02);
        assert_eq!(s.hud().health, 60);
        assert!(!s.is_over());
        assert!(s.sink().calls.is_empty());

        for _ in 0..10 {
            s.state_mut().damage_player(10);
        }
        for _ in 0..5 {
            s.update(0.02);
        }
        assert!(s.is_over());
        assert_eq!(s.sink().calls.len(), 1);
        assert_eq!(s.result(), Some(&s.sink().calls[0]));
        assert_eq!(s.record().map(|r| r.rank), Some(1));
    }

    #[test]
    fn test_enemy_kills_player_and_run_is_saved() {
        let mut s = session(CountingSink::default(), EventLog::new());
        s.state_mut().tuning.attack_damage = 50;
        let eye = Vec3::new(0.0, 1.6, 0.0);
        if let Some(body) = s.state.player.body {
            s.world.set_position(body, eye);
        }
        s.state.player.position = eye;
        spawn_enemy_at(&mut s.state, &mut s.world, Vec3::new(0.0, 1.0, -1.0)).unwrap();

        for _ in 0..400 {
            s.update(0.016);
        }
        assert!(s.is_over());
        assert_eq!(s.sink().calls.len(), 1);
        let result = &s.sink().calls[0];
        assert_eq!(result.username, "tester");
        assert_eq!(result.wave_reached, 1);
        assert!(result.timestamp >= s.state().started_at_ms);

        let notices = s.notifier_mut().drain();
        assert_eq!(
            notices.iter().filter(|n| **n == Notice::DamageFlash).count(),
            2
        );
        assert!(notices.contains(&Notice::Sound {
            name: "zombieAttack".to_string()
        }));
    }

    #[test]
    fn test_result_stamped_with_wall_clock() {
        let mut s = session(CountingSink::default(), NullNotifier);
        s.state_mut().started_at_ms = 0.0;
        let before = platform::now_ms();
        s.state_mut().damage_player(100);
        s.update(0.02);
        let after = platform::now_ms();

        let stamped = s.sink().calls[0].timestamp;
        assert!(stamped >= before && stamped <= after);
        assert_eq!(s.result().map(|r| r.timestamp), Some(stamped));
    }

    #[test]
    fn test_failed_save_is_not_retried() {
        let sink = CountingSink {
            fail: true,
            ..CountingSink::default()
        };
        let mut s = session(sink, NullNotifier);
        s.state_mut().damage_player(100);
        s.update(0.05);
        s.update(0.05);
        assert_eq!(s.sink().calls.len(), 1);
        assert!(s.record().is_none());
        assert!(s
            .drain_events()
            .iter()
            .any(|e| matches!(e, GameEvent::RunEnded(_))));
    }
}
