//! Fixed timestep simulation tick
//!
//! One tick runs to completion in this order: pause handling, clock advance,
//! due deferred tasks, player input, spawning, enemy AI, firing, physics
//! step, projectile sweep.

use glam::Vec3;
use rand::Rng;

use super::ai;
use super::combat;
use super::schedule::Task;
use super::spawner;
use super::state::{BehaviorState, GameEvent, GamePhase, GameState};
use super::weapon::WeaponKind;
use super::world::{MotionProvider, PhysicsWorld};
use crate::error::SpawnError;
use crate::notify::Sound;
use crate::{look_direction, planar, right_of};

/// Pitch limit just short of straight up/down
const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub sprint: bool,
    /// Absolute look yaw from the host camera
    pub yaw: Option<f32>,
    pub pitch: Option<f32>,
    /// Trigger held
    pub fire: bool,
    /// Reload (one-shot)
    pub reload: bool,
    /// Weapon key pressed (one-shot)
    pub switch_weapon: Option<WeaponKind>,
    /// Pause toggle (one-shot)
    pub pause: bool,
}

impl TickInput {
    /// Drop the one-shot commands after they have been applied once
    pub fn clear_one_shots(&mut self) {
        self.reload = false;
        self.switch_weapon = None;
        self.pause = false;
    }
}

/// Put the player into the world and start the ambience timer
pub fn start_run<W: MotionProvider>(state: &mut GameState, world: &mut W) -> Result<(), SpawnError> {
    state.spawn_player_body(world)?;
    state
        .scheduler
        .schedule(state.time_ms, state.tuning.ambient_first_ms, Task::AmbientSound);
    log::info!(
        "Run started for {} (seed {}, {} buildings)",
        state.username,
        state.seed,
        state.obstacles.len()
    );
    Ok(())
}

/// Advance the game state by one fixed timestep
pub fn tick<W: PhysicsWorld>(state: &mut GameState, world: &mut W, input: &TickInput, dt: f32) {
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                return;
            }
            GamePhase::Paused => state.phase = GamePhase::Playing,
            GamePhase::GameOver => {}
        }
    }

    // Paused freezes the clock, so deferred tasks wait too
    if state.phase != GamePhase::Playing {
        return;
    }

    state.time_ms += (dt * 1000.0).round() as u64;
    state.time_ticks += 1;

    for task in state.scheduler.drain_due(state.time_ms) {
        run_task(state, world, task);
        if state.phase == GamePhase::GameOver {
            return;
        }
    }

    apply_player_input(state, world, input, dt);

    spawner::run(state, world);

    for enemy in &mut state.enemies {
        if let Some(p) = world.position(enemy.body) {
            enemy.position = p;
        }
    }
    ai::run(state, world);

    if input.fire {
        combat::pull_trigger(state);
    }

    world.step(dt);
    combat::advance_projectiles(state, world, dt);

    state.normalize_order();
}

/// Execute one deferred task; tasks whose target is gone do nothing
fn run_task<W: PhysicsWorld>(state: &mut GameState, world: &mut W, task: Task) {
    match task {
        Task::StrikePlayer { enemy, damage } => {
            if state.enemy(enemy).is_none_or(|e| e.is_dead()) {
                log::debug!("Dropped strike from enemy {}", enemy);
                return;
            }
            state.emit(GameEvent::Sound(Sound::PlayerHit));
            state.damage_player(damage);
        }
        Task::RecoverFromHit { enemy } => match state.enemy_mut(enemy) {
            Some(e) if e.behavior == BehaviorState::Hit => e.recover(),
            _ => log::debug!("Dropped recovery for enemy {}", enemy),
        },
        Task::RemoveEnemy { enemy } => {
            combat::remove_enemy(state, world, enemy);
        }
        Task::ExpireProjectile { projectile } => {
            state.projectiles.retain(|p| p.id != projectile);
        }
        Task::AmbientSound => {
            let idx = state.rng.random_range(0..Sound::AMBIENT.len());
            let sound = Sound::AMBIENT[idx];
            state.emit(GameEvent::Sound(sound));

            let (min, max) = (state.tuning.ambient_min_ms, state.tuning.ambient_max_ms);
            let delay = state.rng.random_range(min..=max.max(min));
            state.scheduler.schedule(state.time_ms, delay, Task::AmbientSound);
        }
    }
}

fn apply_player_input<W: PhysicsWorld>(
    state: &mut GameState,
    world: &mut W,
    input: &TickInput,
    dt: f32,
) {
    if let Some(weapon) = input.switch_weapon {
        state.player.switch_weapon(weapon);
        log::debug!("Switched to {}", weapon.stats().name);
        state.emit(GameEvent::Sound(Sound::Reload));
        state.emit(GameEvent::WeaponSwitched(weapon));
    }

    if input.reload && state.player.reload() {
        log::debug!("Reloaded {}", state.player.weapon.stats().name);
        state.emit(GameEvent::Sound(Sound::Reload));
        state.emit(GameEvent::Reloaded);
    }

    if let Some(yaw) = input.yaw {
        state.player.yaw = crate::normalize_angle(yaw);
    }
    if let Some(pitch) = input.pitch {
        state.player.pitch = pitch.clamp(-MAX_PITCH, MAX_PITCH);
    }

    let Some(body) = state.player.body else {
        return;
    };

    let yaw = state.player.yaw;
    let forward = planar(look_direction(yaw, 0.0));
    let right = right_of(yaw);
    let mut wish = Vec3::ZERO;
    if input.forward {
        wish += forward;
    }
    if input.back {
        wish -= forward;
    }
    if input.right {
        wish += right;
    }
    if input.left {
        wish -= right;
    }

    if let Some(direction) = wish.try_normalize() {
        let speed = if input.sprint {
            state.tuning.sprint_speed
        } else {
            state.tuning.walk_speed
        };
        world.move_with_collision(body, direction * speed * dt);
    }
    if let Some(p) = world.position(body) {
        state.player.position = p;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::arena::ArenaWorld;
    use crate::sim::spawner::spawn_enemy_at;
    use crate::tuning::Tuning;
    use proptest::prelude::*;

    /// No buildings and no timed spawns
    fn quiet_tuning() -> Tuning {
        Tuning {
            obstacle_count: 0,
            spawn_interval_ms: 10_000_000,
            min_spawn_interval_ms: 10_000_000,
            ..Tuning::default()
        }
    }

    fn setup() -> (GameState, ArenaWorld) {
        let mut state = GameState::new(21, "tester", quiet_tuning());
        state.player.position = Vec3::new(0.0, 1.6, 0.0);
        let mut world = ArenaWorld::from_state(&state);
        start_run(&mut state, &mut world).unwrap();
        (state, world)
    }

    /// Measured on the body, which is ahead of the mirrored position
    fn distance_to_player(state: &GameState, world: &ArenaWorld, id: u32) -> f32 {
        let body = state.enemy(id).unwrap().body;
        planar(world.position(body).unwrap() - state.player.position).length()
    }

    #[test]
    fn test_enemy_closes_in_and_holds_range() {
        let (mut state, mut world) = setup();
        let id = spawn_enemy_at(&mut state, &mut world, Vec3::new(0.0, 1.0, 10.0)).unwrap();
        let input = TickInput::default();

        let mut previous = distance_to_player(&state, &world, id);
        let mut reached = false;
        for _ in 0..600 {
            tick(&mut state, &mut world, &input, SIM_DT);
            let d = distance_to_player(&state, &world, id);
            if !reached {
                assert!(d < previous, "distance went {} -> {}", previous, d);
                reached = d <= state.tuning.attack_range;
            }
            previous = d;
        }
        assert!(reached);

        for _ in 0..300 {
            tick(&mut state, &mut world, &input, SIM_DT);
            assert!(distance_to_player(&state, &world, id) <= state.tuning.attack_range);
        }
        assert_eq!(state.enemy(id).unwrap().behavior, BehaviorState::Attacking);
        assert!(state.player.health < 100);
    }

    #[test]
    fn test_strike_lands_after_delay() {
        let (mut state, mut world) = setup();
        spawn_enemy_at(&mut state, &mut world, Vec3::new(0.0, 1.0, 1.0)).unwrap();
        let input = TickInput::default();

        // Attack starts on the first tick, damage 300ms later
        for _ in 0..30 {
            tick(&mut state, &mut world, &input, SIM_DT);
        }
        assert_eq!(state.player.health, 100);
        tick(&mut state, &mut world, &input, SIM_DT);
        assert_eq!(state.player.health, 90);
        assert!(state.events.contains(&GameEvent::DamageFlash { amount: 10, health: 90 }));
    }

    #[test]
    fn test_dead_enemy_strike_is_dropped() {
        let (mut state, mut world) = setup();
        let id = spawn_enemy_at(&mut state, &mut world, Vec3::new(0.0, 1.0, 1.0)).unwrap();
        let input = TickInput::default();
        tick(&mut state, &mut world, &input, SIM_DT);
        combat::kill_enemy(&mut state, &mut world, id);

        for _ in 0..50 {
            tick(&mut state, &mut world, &input, SIM_DT);
        }
        assert_eq!(state.player.health, 100);
    }

    #[test]
    fn test_hit_enemy_holds_still_then_recovers() {
        let (mut state, mut world) = setup();
        let id = spawn_enemy_at(&mut state, &mut world, Vec3::new(0.0, 1.0, 10.0)).unwrap();
        let input = TickInput::default();
        tick(&mut state, &mut world, &input, SIM_DT);

        let origin = state.player.position;
        combat::resolve_hit(&mut state, &mut world, id, origin, 34);
        let held_at = world.position(state.enemy(id).unwrap().body).unwrap();

        // 1490ms of stagger
        for _ in 0..149 {
            tick(&mut state, &mut world, &input, SIM_DT);
            let enemy = state.enemy(id).unwrap();
            assert_eq!(enemy.behavior, BehaviorState::Hit);
            assert_eq!(enemy.speed, 0.0);
            assert!(planar(enemy.position - held_at).length() < 1e-4);
        }

        tick(&mut state, &mut world, &input, SIM_DT);
        let enemy = state.enemy(id).unwrap();
        assert_ne!(enemy.behavior, BehaviorState::Hit);
        assert!(!enemy.is_slowed);
        assert_eq!(enemy.speed, enemy.normal_speed);
    }

    #[test]
    fn test_recovery_returns_to_idle() {
        let (mut state, mut world) = setup();
        let id = spawn_enemy_at(&mut state, &mut world, Vec3::new(0.0, 1.0, 10.0)).unwrap();
        state.enemy_mut(id).unwrap().stagger();

        run_task(&mut state, &mut world, Task::RecoverFromHit { enemy: id });
        let enemy = state.enemy(id).unwrap();
        assert_eq!(enemy.behavior, BehaviorState::Idle);
        assert_eq!(enemy.speed, enemy.normal_speed);

        // Gone targets are ignored
        run_task(&mut state, &mut world, Task::RecoverFromHit { enemy: 999 });
        run_task(&mut state, &mut world, Task::StrikePlayer { enemy: 999, damage: 10 });
        assert_eq!(state.player.health, 100);
    }

    #[test]
    fn test_corpse_removed_once_after_linger() {
        let (mut state, mut world) = setup();
        let id = spawn_enemy_at(&mut state, &mut world, Vec3::new(0.0, 1.0, 10.0)).unwrap();
        let body = state.enemy(id).unwrap().body;
        let input = TickInput::default();

        combat::kill_enemy(&mut state, &mut world, id);
        for _ in 0..199 {
            tick(&mut state, &mut world, &input, SIM_DT);
        }
        assert!(state.enemy(id).is_some());

        tick(&mut state, &mut world, &input, SIM_DT);
        assert!(state.enemy(id).is_none());
        assert!(!world.contains(body));

        for _ in 0..300 {
            tick(&mut state, &mut world, &input, SIM_DT);
        }
        let removed = state
            .drain_events()
            .into_iter()
            .filter(|e| *e == GameEvent::EnemyRemoved { id })
            .count();
        assert_eq!(removed, 1);
    }

    #[test]
    fn test_pause_freezes_clock() {
        let (mut state, mut world) = setup();
        let pause = TickInput {
            pause: true,
            ..TickInput::default()
        };
        tick(&mut state, &mut world, &TickInput::default(), SIM_DT);
        tick(&mut state, &mut world, &pause, SIM_DT);
        assert_eq!(state.phase, GamePhase::Paused);
        for _ in 0..100 {
            tick(&mut state, &mut world, &TickInput::default(), SIM_DT);
        }
        assert_eq!(state.time_ms, 10);

        tick(&mut state, &mut world, &pause, SIM_DT);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.time_ms, 20);
    }

    #[test]
    fn test_movement_walk_and_sprint() {
        let (mut state, mut world) = setup();
        let walk = TickInput {
            forward: true,
            yaw: Some(0.0),
            ..TickInput::default()
        };
        for _ in 0..100 {
            tick(&mut state, &mut world, &walk, SIM_DT);
        }
        assert!((state.player.position.z - 6.0).abs() < 1e-3);

        let sprint_strafe = TickInput {
            right: true,
            sprint: true,
            ..walk
        };
        for _ in 0..50 {
            tick(&mut state, &mut world, &sprint_strafe, SIM_DT);
        }
        // Forward + right normalized: 6 units along the diagonal
        let expected = 6.0 / 2.0_f32.sqrt();
        assert!((state.player.position.x - expected).abs() < 1e-3);
        assert!((state.player.position.z - 6.0 - expected).abs() < 1e-3);
    }

    #[test]
    fn test_fire_rate_limits_held_trigger() {
        let (mut state, mut world) = setup();
        let fire = TickInput {
            fire: true,
            ..TickInput::default()
        };
        // One second of held trigger with the pistol (300ms)
        for _ in 0..100 {
            tick(&mut state, &mut world, &fire, SIM_DT);
        }
        assert_eq!(state.player.shots_fired, 4);
        assert_eq!(state.player.ammo, 26);
    }

    #[test]
    fn test_switch_and_reload() {
        let (mut state, mut world) = setup();
        let switch = TickInput {
            switch_weapon: Some(WeaponKind::Shotgun),
            ..TickInput::default()
        };
        tick(&mut state, &mut world, &switch, SIM_DT);
        assert_eq!(state.player.weapon, WeaponKind::Shotgun);
        assert_eq!(state.player.ammo, 12);

        state.player.ammo = 3;
        let reload = TickInput {
            reload: true,
            ..TickInput::default()
        };
        tick(&mut state, &mut world, &reload, SIM_DT);
        assert_eq!(state.player.ammo, 12);
        assert!(state.events.contains(&GameEvent::Reloaded));
    }

    #[test]
    fn test_ambient_sound_timing() {
        let (mut state, mut world) = setup();
        let input = TickInput::default();
        let is_ambient = |e: &GameEvent| matches!(e, GameEvent::Sound(s) if Sound::AMBIENT.contains(s));

        for _ in 0..499 {
            tick(&mut state, &mut world, &input, SIM_DT);
        }
        assert!(!state.drain_events().iter().any(is_ambient));
        tick(&mut state, &mut world, &input, SIM_DT);
        assert_eq!(state.drain_events().iter().filter(|e| is_ambient(e)).count(), 1);

        // Next one lands 10-30s later
        for _ in 0..999 {
            tick(&mut state, &mut world, &input, SIM_DT);
        }
        assert!(!state.drain_events().iter().any(is_ambient));
        for _ in 0..2001 {
            tick(&mut state, &mut world, &input, SIM_DT);
        }
        assert!(state.drain_events().iter().any(is_ambient));
    }

    #[test]
    fn test_nothing_runs_after_game_over() {
        let (mut state, mut world) = setup();
        state.damage_player(100);
        assert_eq!(state.phase, GamePhase::GameOver);
        let t = state.time_ms;
        tick(&mut state, &mut world, &TickInput::default(), SIM_DT);
        assert_eq!(state.time_ms, t);
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = || {
            let mut state = GameState::new(77, "tester", Tuning::default());
            let mut world = ArenaWorld::from_state(&state);
            start_run(&mut state, &mut world).unwrap();
            let input = TickInput {
                fire: true,
                yaw: Some(1.0),
                ..TickInput::default()
            };
            for _ in 0..1500 {
                tick(&mut state, &mut world, &input, SIM_DT);
            }
            (
                state.enemies.iter().map(|e| (e.id, e.health)).collect::<Vec<_>>(),
                state.player.score,
                state.player.shots_hit,
            )
        };
        assert_eq!(run(), run());
    }

    proptest! {
        #[test]
        fn prop_attack_cooldown_independent_of_tick_rate(step_ms in 4u64..50) {
            let (mut state, mut world) = setup();
            let id = spawn_enemy_at(&mut state, &mut world, Vec3::new(0.0, 1.0, 1.0)).unwrap();
            let input = TickInput::default();
            let dt = step_ms as f32 / 1000.0;
            let cooldown = state.tuning.attack_cooldown_ms;

            let mut attacks = Vec::new();
            while state.time_ms < 9_000 {
                tick(&mut state, &mut world, &input, dt);
                let last = state.enemy(id).unwrap().last_attack_ms;
                if let Some(t) = last {
                    if attacks.last() != Some(&t) {
                        attacks.push(t);
                    }
                }
            }

            prop_assert!(!attacks.is_empty());
            prop_assert!(attacks.windows(2).all(|w| w[1] - w[0] >= cooldown));
            prop_assert!(attacks.len() as u64 <= 9_000 / cooldown + 1);
        }
    }
}
