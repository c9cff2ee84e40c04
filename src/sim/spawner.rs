//! Arena layout and enemy spawning
//!
//! Positions are chosen by rejection sampling: uniform points in the arena,
//! rejected while too close to a building footprint, with the origin as the
//! fallback once the attempts run out.

use glam::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::{Enemy, GameEvent, GameState, Obstacle};
use super::world::{BodyDesc, BodyKind, MotionProvider};
use crate::consts::*;
use crate::tuning::Tuning;

/// Enemy spawn cadence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnClock {
    pub interval_ms: u64,
    pub next_spawn_ms: u64,
    /// Spawn attempts made (successful or not)
    pub attempts: u64,
}

impl SpawnClock {
    pub fn new(tuning: &Tuning) -> Self {
        let interval_ms = tuning.spawn_interval_for_wave(1);
        Self {
            interval_ms,
            next_spawn_ms: interval_ms,
            attempts: 0,
        }
    }

    /// Re-time spawns for a new wave; the pending spawn is not delayed
    pub fn set_wave(&mut self, wave: u32, tuning: &Tuning, now_ms: u64) {
        let interval_ms = tuning.spawn_interval_for_wave(wave);
        if interval_ms != self.interval_ms {
            log::debug!("Spawn interval {}ms -> {}ms", self.interval_ms, interval_ms);
            self.interval_ms = interval_ms;
            self.next_spawn_ms = self.next_spawn_ms.min(now_ms + interval_ms);
        }
    }
}

/// Scatter buildings across the arena
pub fn place_obstacles(rng: &mut impl Rng, tuning: &Tuning) -> Vec<Obstacle> {
    let half = tuning.arena_half();
    (0..tuning.obstacle_count)
        .map(|i| {
            let center = random_arena_point(rng, half);
            let scale = if tuning.obstacle_scale_max > tuning.obstacle_scale_min {
                rng.random_range(tuning.obstacle_scale_min..tuning.obstacle_scale_max)
            } else {
                tuning.obstacle_scale_min
            };
            let footprint_radius = scale * tuning.footprint_per_scale;
            Obstacle {
                id: i + 1,
                center,
                footprint_radius,
                barrier_radius: footprint_radius + tuning.barrier_buffer,
            }
        })
        .collect()
}

/// Uniform point in the square arena (x, z)
fn random_arena_point(rng: &mut impl Rng, half: f32) -> Vec2 {
    Vec2::new(
        rng.random_range(-half..half),
        rng.random_range(-half..half),
    )
}

/// Whether `p` clears every building footprint by `min_distance`
pub fn is_safe_position(p: Vec2, obstacles: &[Obstacle], min_distance: f32) -> bool {
    obstacles
        .iter()
        .all(|o| p.distance(o.center) >= o.footprint_radius + min_distance)
}

/// Random safe point on the ground plane, or the origin if none was found
pub fn safe_spawn_position(
    rng: &mut impl Rng,
    obstacles: &[Obstacle],
    half: f32,
    min_distance: f32,
    attempts: u32,
) -> Vec2 {
    for _ in 0..attempts {
        let p = random_arena_point(rng, half);
        if is_safe_position(p, obstacles, min_distance) {
            return p;
        }
    }
    Vec2::ZERO
}

/// Spawn an enemy if the clock says so
///
/// A body that fails to instantiate abandons this spawn only; the clock
/// still advances.
pub fn run<W: MotionProvider + ?Sized>(state: &mut GameState, world: &mut W) {
    let now = state.time_ms;
    if now < state.spawn_clock.next_spawn_ms {
        return;
    }
    state.spawn_clock.next_spawn_ms = now + state.spawn_clock.interval_ms;
    state.spawn_clock.attempts += 1;

    if state.live_enemy_count() >= state.tuning.max_live_enemies {
        log::debug!("Arena full ({} live), skipping spawn", state.live_enemy_count());
        return;
    }

    let spot = safe_spawn_position(
        &mut state.rng,
        &state.obstacles,
        state.tuning.arena_half(),
        state.tuning.spawn_min_distance,
        state.tuning.spawn_attempts,
    );
    let position = Vec3::new(spot.x, ENEMY_BODY_HALF_HEIGHT, spot.y);

    if let Some(id) = spawn_enemy_at(state, world, position) {
        log::debug!("Spawned enemy {} at ({:.1}, {:.1})", id, spot.x, spot.y);
    }
}

/// Create an enemy body and register it in the live set
pub fn spawn_enemy_at<W: MotionProvider + ?Sized>(
    state: &mut GameState,
    world: &mut W,
    position: Vec3,
) -> Option<u32> {
    let body = match world.spawn_body(BodyDesc {
        kind: BodyKind::Dynamic,
        position,
        radius: ENEMY_BODY_RADIUS,
        half_height: ENEMY_BODY_HALF_HEIGHT,
    }) {
        Ok(body) => body,
        Err(e) => {
            log::warn!("Enemy spawn abandoned: {}", e);
            state.emit(GameEvent::SpawnAbandoned {
                reason: e.to_string(),
            });
            return None;
        }
    };

    let id = state.next_entity_id();
    let enemy = Enemy::new(id, body, position, &state.tuning);
    state.enemies.push(enemy);
    state.emit(GameEvent::EnemySpawned { id });
    Some(id)
}
