//! Enemy AI
//!
//! Each tick every enemy that is neither staggered nor dead picks a mode
//! from its planar distance to the player:
//! - beyond attack range with a clear line: chase at full speed
//! - beyond attack range with a building in the way: stand still (Blocked)
//! - within attack range: stop and attack when the cooldown allows
//!
//! `think` decides and updates the enemy; `run` applies the decisions to the
//! world and queues the delayed attack damage.

use glam::Vec3;

use super::schedule::Task;
use super::state::{AnimationCue, BehaviorState, Enemy, GameEvent, GameState};
use super::world::{PhysicsWorld, SpatialQuery, obstacles_only};
use crate::notify::Sound;
use crate::tuning::Tuning;
use crate::{planar, yaw_of};

/// What an enemy wants this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Steering {
    /// Desired horizontal velocity (y is always 0; the body keeps its own)
    pub velocity: Vec3,
    /// An attack started this tick
    pub attack: bool,
}

/// Update one enemy's facing, mode and animation
///
/// Returns None for staggered and dead enemies, which must not be steered.
pub fn think<S: SpatialQuery>(
    enemy: &mut Enemy,
    player_position: Vec3,
    sight: &S,
    now_ms: u64,
    tuning: &Tuning,
) -> Option<Steering> {
    if matches!(enemy.behavior, BehaviorState::Hit | BehaviorState::Dead) {
        return None;
    }

    let to_player = planar(player_position - enemy.position);
    let distance = to_player.length();

    if distance > tuning.face_threshold {
        enemy.facing = yaw_of(to_player);
    }

    if distance > tuning.attack_range {
        let direction = to_player / distance;
        let blocked = sight
            .raycast(enemy.position, direction, distance, &obstacles_only)
            .is_some();

        if blocked {
            enemy.behavior = BehaviorState::Blocked;
            enemy.play(AnimationCue::Idle);
            return Some(Steering {
                velocity: Vec3::ZERO,
                attack: false,
            });
        }

        enemy.behavior = BehaviorState::Chasing;
        enemy.play(if distance > tuning.run_animation_distance {
            AnimationCue::Running
        } else {
            AnimationCue::Walking
        });
        return Some(Steering {
            velocity: direction * enemy.speed,
            attack: false,
        });
    }

    enemy.behavior = BehaviorState::Attacking;
    let attack = enemy.can_attack(now_ms);
    if attack {
        enemy.last_attack_ms = Some(now_ms);
        enemy.play(AnimationCue::Attack);
    } else if enemy.animation != AnimationCue::Attack {
        enemy.play(AnimationCue::Idle);
    }

    Some(Steering {
        velocity: Vec3::ZERO,
        attack,
    })
}

/// Run AI for every live enemy and apply the results
pub fn run<W: PhysicsWorld>(state: &mut GameState, world: &mut W) {
    let now = state.time_ms;
    let player_position = state.player.position;
    let mut attackers = Vec::new();

    for enemy in &mut state.enemies {
        let Some(steering) = think(enemy, player_position, &*world, now, &state.tuning) else {
            continue;
        };

        // Vertical velocity belongs to the physics world (gravity)
        let current = world.velocity(enemy.body).unwrap_or(Vec3::ZERO);
        world.set_velocity(
            enemy.body,
            Vec3::new(steering.velocity.x, current.y, steering.velocity.z),
        );

        if steering.attack {
            attackers.push(enemy.id);
        }
    }

    let damage = state.tuning.attack_damage;
    let delay = state.tuning.attack_delay_ms;
    for enemy in attackers {
        state
            .scheduler
            .schedule(now, delay, Task::StrikePlayer { enemy, damage });
        state.emit(GameEvent::Sound(Sound::ZombieAttack));
    }
}
