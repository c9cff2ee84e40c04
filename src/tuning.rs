//! Game balance tuning
//!
//! Every gameplay number the simulation reads lives here so balance can be
//! overridden from JSON. Persisted separately from run results in LocalStorage.

use serde::{Deserialize, Serialize};

use crate::error::TuningError;

/// How a projectile hit converts into enemy damage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DamageModel {
    /// Same damage for every pellet regardless of weapon (3 hits per zombie)
    Flat { damage: u32 },
    /// Use the weapon catalog's per-weapon damage
    PerWeapon,
}

impl Default for DamageModel {
    fn default() -> Self {
        DamageModel::Flat { damage: 34 }
    }
}

/// Game balance values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Arena ===
    /// Side length of the square arena centered at origin
    pub arena_size: f32,
    /// Buildings placed per run
    pub obstacle_count: u32,
    pub obstacle_scale_min: f32,
    pub obstacle_scale_max: f32,
    /// Footprint radius per unit of building scale
    pub footprint_per_scale: f32,
    /// Extra radius of the invisible barrier around a building footprint
    pub barrier_buffer: f32,

    // === Spawning ===
    /// Clearance beyond a building footprint for enemy spawns
    pub spawn_min_distance: f32,
    /// Clearance beyond a building footprint for the player spawn
    pub player_spawn_min_distance: f32,
    pub spawn_attempts: u32,
    pub spawn_interval_ms: u64,
    /// Multiplier applied to the spawn interval per wave cleared
    pub spawn_interval_decay: f32,
    pub min_spawn_interval_ms: u64,
    /// Spawns are skipped while this many enemies are alive
    pub max_live_enemies: usize,

    // === Enemies ===
    pub enemy_max_health: u32,
    pub enemy_speed: f32,
    pub attack_range: f32,
    pub attack_cooldown_ms: u64,
    pub attack_damage: u32,
    /// Delay between the attack starting and the damage landing
    pub attack_delay_ms: u64,
    /// Beyond this distance chasing enemies run instead of walk
    pub run_animation_distance: f32,
    /// Minimum planar distance before an enemy turns to face the player
    pub face_threshold: f32,
    pub hit_recovery_ms: u64,
    /// Time a dead enemy lingers before removal
    pub corpse_linger_ms: u64,

    // === Combat ===
    pub damage_model: DamageModel,
    pub projectile_lifetime_ms: u64,
    /// Distance in front of the eye where projectiles spawn
    pub muzzle_offset: f32,
    pub kill_score: u64,
    /// Wave bonus is this times the new wave number
    pub wave_bonus_per_wave: u64,
    pub first_wave_size: u32,

    // === Player ===
    pub player_max_health: u32,
    pub walk_speed: f32,
    pub sprint_speed: f32,
    pub eye_height: f32,

    // === Ambience ===
    pub ambient_first_ms: u64,
    pub ambient_min_ms: u64,
    pub ambient_max_ms: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            arena_size: 100.0,
            obstacle_count: 5,
            obstacle_scale_min: 1.0,
            obstacle_scale_max: 3.0,
            footprint_per_scale: 5.0,
            barrier_buffer: 1.5,

            spawn_min_distance: 5.0,
            player_spawn_min_distance: 10.0,
            spawn_attempts: 20,
            spawn_interval_ms: 2000,
            spawn_interval_decay: 0.85,
            min_spawn_interval_ms: 500,
            max_live_enemies: 50,

            enemy_max_health: 100,
            enemy_speed: 2.0,
            attack_range: 1.2,
            attack_cooldown_ms: 2500,
            attack_damage: 10,
            attack_delay_ms: 300,
            run_animation_distance: 5.0,
            face_threshold: 0.1,
            hit_recovery_ms: 1500,
            corpse_linger_ms: 2000,

            damage_model: DamageModel::default(),
            projectile_lifetime_ms: 3000,
            muzzle_offset: 0.5,
            kill_score: 100,
            wave_bonus_per_wave: 100,
            first_wave_size: 5,

            player_max_health: 100,
            walk_speed: 6.0,
            sprint_speed: 12.0,
            eye_height: 1.6,

            ambient_first_ms: 5000,
            ambient_min_ms: 10_000,
            ambient_max_ms: 30_000,
        }
    }
}

impl Tuning {
    /// LocalStorage key
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    const STORAGE_KEY: &'static str = "undead_protocol_tuning";

    /// Half the arena side (walls sit at ±half on x and z)
    pub fn arena_half(&self) -> f32 {
        self.arena_size / 2.0
    }

    /// Spawn interval for a wave: shrinks per wave, never below the floor
    pub fn spawn_interval_for_wave(&self, wave: u32) -> u64 {
        let steps = wave.saturating_sub(1).min(i32::MAX as u32) as i32;
        let scaled = self.spawn_interval_ms as f64 * (self.spawn_interval_decay as f64).powi(steps);
        (scaled.round() as u64).max(self.min_spawn_interval_ms)
    }

    /// Parse and validate tuning JSON (missing fields take defaults)
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a JSON file on disk
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_path(path: &std::path::Path) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        fn invalid(field: &'static str, reason: &str) -> TuningError {
            TuningError::Invalid {
                field,
                reason: reason.to_string(),
            }
        }

        if !(self.arena_size > 0.0) {
            return Err(invalid("arena_size", "must be positive"));
        }
        if self.obstacle_scale_max < self.obstacle_scale_min {
            return Err(invalid("obstacle_scale_max", "below obstacle_scale_min"));
        }
        if !(self.attack_range > 0.0) {
            return Err(invalid("attack_range", "must be positive"));
        }
        if self.spawn_interval_ms == 0 {
            return Err(invalid("spawn_interval_ms", "must be positive"));
        }
        if self.min_spawn_interval_ms == 0 || self.min_spawn_interval_ms > self.spawn_interval_ms {
            return Err(invalid(
                "min_spawn_interval_ms",
                "must be positive and no larger than spawn_interval_ms",
            ));
        }
        if !(self.spawn_interval_decay > 0.0 && self.spawn_interval_decay <= 1.0) {
            return Err(invalid("spawn_interval_decay", "must be in (0, 1]"));
        }
        if self.first_wave_size == 0 {
            return Err(invalid("first_wave_size", "must be at least 1"));
        }
        if self.enemy_max_health == 0 || self.player_max_health == 0 {
            return Err(invalid("max_health", "must be at least 1"));
        }
        if self.ambient_max_ms < self.ambient_min_ms {
            return Err(invalid("ambient_max_ms", "below ambient_min_ms"));
        }
        Ok(())
    }

    /// Load tuning from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(tuning) => {
                        log::info!("Loaded tuning from LocalStorage");
                        return tuning;
                    }
                    Err(e) => log::warn!("Ignoring stored tuning: {}", e),
                }
            }
        }

        log::info!("Using default tuning");
        Self::default()
    }

    /// Save tuning to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                if storage.set_item(Self::STORAGE_KEY, &json).is_err() {
                    log::warn!("Tuning save rejected by LocalStorage");
                } else {
                    log::info!("Tuning saved");
                }
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
