//! Game state and core simulation types
//!
//! Everything a run needs between ticks lives here; the collision world only
//! holds bodies.

use glam::{Vec2, Vec3};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::schedule::Scheduler;
use super::spawner::{self, SpawnClock};
use super::wave::WaveDirector;
use super::weapon::WeaponKind;
use super::world::{BodyDesc, BodyId, BodyKind, MotionProvider};
use crate::consts::*;
use crate::error::SpawnError;
use crate::leaderboard::RunResult;
use crate::notify::Sound;
use crate::tuning::Tuning;

/// Current phase of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Clock frozen
    Paused,
    /// Player died, result finalized
    GameOver,
}

/// Enemy AI mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BehaviorState {
    Idle,
    Chasing,
    /// Line to the player crosses a building
    Blocked,
    Attacking,
    /// Staggered by a bullet; AI suspended until recovery
    Hit,
    /// Terminal
    Dead,
}

/// Animation the host should be playing for an enemy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimationCue {
    Idle,
    Walking,
    Running,
    Attack,
    TakenHit,
    Death,
}

/// A building: solid footprint plus a wider invisible barrier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    /// Center on the ground plane (x, z)
    pub center: Vec2,
    /// Spawn exclusion radius
    pub footprint_radius: f32,
    /// Collision radius for bodies and rays
    pub barrier_radius: f32,
}

/// A zombie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub body: BodyId,
    /// Mirrored from the body each tick
    pub position: Vec3,
    /// Heading in radians, from +z toward +x
    pub facing: f32,
    pub health: u32,
    pub max_health: u32,
    pub speed: f32,
    pub normal_speed: f32,
    pub is_slowed: bool,
    pub behavior: BehaviorState,
    pub animation: AnimationCue,
    /// None until the first attack
    pub last_attack_ms: Option<u64>,
    pub attack_cooldown_ms: u64,
    pub died_at_ms: Option<u64>,
}

impl Enemy {
    pub fn new(id: u32, body: BodyId, position: Vec3, tuning: &Tuning) -> Self {
        Self {
            id,
            body,
            position,
            facing: 0.0,
            health: tuning.enemy_max_health,
            max_health: tuning.enemy_max_health,
            speed: tuning.enemy_speed,
            normal_speed: tuning.enemy_speed,
            is_slowed: false,
            behavior: BehaviorState::Idle,
            animation: AnimationCue::Idle,
            last_attack_ms: None,
            attack_cooldown_ms: tuning.attack_cooldown_ms,
            died_at_ms: None,
        }
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.behavior == BehaviorState::Dead
    }

    /// Subtract health (floor 0), returning what is left
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        self.health = self.health.saturating_sub(amount);
        self.health
    }

    /// Switch animation cue; corpses only ever play Death
    pub fn play(&mut self, cue: AnimationCue) {
        if self.is_dead() && cue != AnimationCue::Death {
            return;
        }
        self.animation = cue;
    }

    /// Whether the attack cooldown has elapsed at `now_ms`
    pub fn can_attack(&self, now_ms: u64) -> bool {
        self.last_attack_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= self.attack_cooldown_ms)
    }

    /// Enter the hit stagger
    pub fn stagger(&mut self) {
        self.speed = 0.0;
        self.is_slowed = true;
        self.behavior = BehaviorState::Hit;
        self.play(AnimationCue::TakenHit);
    }

    /// Leave the hit stagger at normal speed
    pub fn recover(&mut self) {
        if self.is_dead() {
            return;
        }
        self.speed = self.normal_speed;
        self.is_slowed = false;
        self.behavior = BehaviorState::Idle;
        self.play(AnimationCue::Idle);
    }

    /// Transition to Dead; false if already dead
    pub fn mark_dead(&mut self, now_ms: u64) -> bool {
        if self.is_dead() {
            return false;
        }
        self.behavior = BehaviorState::Dead;
        self.speed = 0.0;
        self.died_at_ms = Some(now_ms);
        self.play(AnimationCue::Death);
        true
    }
}

/// Result of damaging the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Player was already dead
    Ignored,
    Wounded,
    /// This hit brought health to zero
    Killed,
}

/// The player (singleton per run)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Collision body, once spawned into the world
    pub body: Option<BodyId>,
    /// Eye position
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub health: u32,
    pub max_health: u32,
    pub ammo: u32,
    pub max_ammo: u32,
    pub weapon: WeaponKind,
    pub score: u64,
    pub last_shot_ms: Option<u64>,
    /// Pellets fired, for accuracy
    pub shots_fired: u32,
    /// Pellets that hit an enemy
    pub shots_hit: u32,
    pub total_kills: u32,
}

impl Player {
    pub fn new(position: Vec3, tuning: &Tuning) -> Self {
        let weapon = WeaponKind::default();
        Self {
            body: None,
            position,
            yaw: 0.0,
            pitch: 0.0,
            health: tuning.player_max_health,
            max_health: tuning.player_max_health,
            ammo: weapon.stats().max_ammo,
            max_ammo: weapon.stats().max_ammo,
            weapon,
            score: 0,
            last_shot_ms: None,
            shots_fired: 0,
            shots_hit: 0,
            total_kills: 0,
        }
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    pub fn take_damage(&mut self, amount: u32) -> DamageOutcome {
        if !self.is_alive() {
            return DamageOutcome::Ignored;
        }
        self.health = self.health.saturating_sub(amount);
        if self.is_alive() {
            DamageOutcome::Wounded
        } else {
            DamageOutcome::Killed
        }
    }

    pub fn add_score(&mut self, points: u64) {
        self.score = self.score.saturating_add(points);
    }

    pub fn add_health(&mut self, amount: u32) {
        self.health = self.health.saturating_add(amount).min(self.max_health);
    }

    pub fn add_ammo(&mut self, amount: u32) {
        self.ammo = self.ammo.saturating_add(amount).min(self.max_ammo);
    }

    /// Spend one round; false (and no change) when empty
    pub fn fire_ammo(&mut self) -> bool {
        if self.ammo == 0 {
            return false;
        }
        self.ammo -= 1;
        true
    }

    /// Equip a weapon with a full magazine
    pub fn switch_weapon(&mut self, weapon: WeaponKind) {
        self.weapon = weapon;
        self.max_ammo = weapon.stats().max_ammo;
        self.ammo = self.max_ammo;
    }

    /// Refill the magazine; false if it was already full
    pub fn reload(&mut self) -> bool {
        if self.ammo >= self.max_ammo {
            return false;
        }
        self.ammo = self.max_ammo;
        true
    }

    /// Fire-rate gate for the current weapon
    pub fn can_shoot(&self, now_ms: u64) -> bool {
        let rate = self.weapon.stats().fire_rate_ms;
        self.last_shot_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= rate)
    }

    /// Rounded hit percentage, 0 with no shots
    pub fn accuracy_percent(&self) -> u32 {
        if self.shots_fired == 0 {
            return 0;
        }
        let pct = f64::from(self.shots_hit) * 100.0 / f64::from(self.shots_fired);
        (pct.round() as u32).min(100)
    }
}

/// A bullet or shotgun pellet in flight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub origin: Vec3,
    pub position: Vec3,
    /// Unit direction
    pub direction: Vec3,
    pub speed: f32,
    pub damage: u32,
    pub weapon: WeaponKind,
}

/// Notifications for the host, drained after each tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Sound(Sound),
    HitMarker,
    DamageFlash { amount: u32, health: u32 },
    WaveComplete { completed: u32, next: u32, bonus: u64 },
    EnemySpawned { id: u32 },
    EnemyKilled { id: u32 },
    EnemyRemoved { id: u32 },
    SpawnAbandoned { reason: String },
    WeaponSwitched(WeaponKind),
    Reloaded,
    OutOfAmmo,
    RunEnded(RunResult),
}

/// Complete run state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub username: String,
    /// Wall-clock start of the run (ms since epoch)
    pub started_at_ms: f64,
    /// Simulation clock
    pub time_ms: u64,
    pub time_ticks: u64,
    pub phase: GamePhase,
    pub player: Player,
    /// Live set (sorted by id for determinism)
    pub enemies: Vec<Enemy>,
    /// Projectiles in flight (sorted by id)
    pub projectiles: Vec<Projectile>,
    pub obstacles: Vec<Obstacle>,
    pub waves: WaveDirector,
    pub spawn_clock: SpawnClock,
    pub scheduler: Scheduler,
    /// Set once when the player dies
    pub result: Option<RunResult>,
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    /// Next entity ID (never reused within a run)
    next_id: u32,
}

impl GameState {
    /// Lay out the arena and place the player for a new run
    pub fn new(seed: u64, username: impl Into<String>, tuning: Tuning) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let obstacles = spawner::place_obstacles(&mut rng, &tuning);
        let spot = spawner::safe_spawn_position(
            &mut rng,
            &obstacles,
            tuning.arena_half(),
            tuning.player_spawn_min_distance,
            tuning.spawn_attempts,
        );
        let player = Player::new(Vec3::new(spot.x, tuning.eye_height, spot.y), &tuning);
        let waves = WaveDirector::new(tuning.first_wave_size);
        let spawn_clock = SpawnClock::new(&tuning);

        Self {
            seed,
            rng,
            tuning,
            username: username.into(),
            started_at_ms: 0.0,
            time_ms: 0,
            time_ticks: 0,
            phase: GamePhase::Playing,
            player,
            enemies: Vec::new(),
            projectiles: Vec::new(),
            next_id: obstacles.len() as u32 + 1,
            obstacles,
            waves,
            spawn_clock,
            scheduler: Scheduler::new(),
            result: None,
            events: Vec::new(),
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Create the player's kinematic body at its spawn point
    pub fn spawn_player_body<W: MotionProvider + ?Sized>(
        &mut self,
        world: &mut W,
    ) -> Result<BodyId, SpawnError> {
        let body = world.spawn_body(BodyDesc {
            kind: BodyKind::Kinematic,
            position: self.player.position,
            radius: PLAYER_BODY_RADIUS,
            half_height: PLAYER_BODY_HALF_HEIGHT,
        })?;
        self.player.body = Some(body);
        Ok(body)
    }

    pub fn enemy(&self, id: u32) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.id == id)
    }

    pub fn enemy_mut(&mut self, id: u32) -> Option<&mut Enemy> {
        self.enemies.iter_mut().find(|e| e.id == id)
    }

    pub fn enemy_by_body(&self, body: BodyId) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.body == body)
    }

    /// Enemies not yet dead
    pub fn live_enemy_count(&self) -> usize {
        self.enemies.iter().filter(|e| !e.is_dead()).count()
    }

    #[inline]
    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all events raised since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Damage the player, flash, and end the run on death
    pub fn damage_player(&mut self, amount: u32) -> DamageOutcome {
        let outcome = self.player.take_damage(amount);
        match outcome {
            DamageOutcome::Ignored => {}
            DamageOutcome::Wounded | DamageOutcome::Killed => {
                self.emit(GameEvent::DamageFlash {
                    amount,
                    health: self.player.health,
                });
                if outcome == DamageOutcome::Killed {
                    self.finish_run();
                }
            }
        }
        outcome
    }

    /// Freeze the run and build its result (only the first call counts)
    pub fn finish_run(&mut self) {
        if self.phase == GamePhase::GameOver {
            return;
        }
        self.phase = GamePhase::GameOver;

        let result = RunResult {
            username: self.username.clone(),
            final_score: self.player.score,
            wave_reached: self.waves.current_wave,
            total_kills: self.player.total_kills,
            accuracy_percent: self.player.accuracy_percent(),
            // Sim-clock estimate; a session restamps it with the real end time
            timestamp: self.started_at_ms + self.time_ms as f64,
        };
        log::info!(
            "Run over for {}: score {}, wave {}, kills {}, accuracy {}%",
            result.username,
            result.final_score,
            result.wave_reached,
            result.total_kills,
            result.accuracy_percent
        );
        self.result = Some(result.clone());
        self.emit(GameEvent::RunEnded(result));
    }

    /// Ensure entities are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.enemies.sort_by_key(|e| e.id);
        self.projectiles.sort_by_key(|p| p.id);
    }
}
