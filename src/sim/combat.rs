//! Weapon fire and hit resolution
//!
//! A trigger pull spawns one projectile per pellet. Each tick a projectile
//! sweeps the segment it travels; the first thing it touches consumes it.
//! Only live enemies take damage: a non-lethal hit staggers the enemy, a
//! lethal one kills it, scores, feeds the wave counter and queues removal.

use glam::Vec3;
use rand::Rng;

use super::schedule::{Task, TaskTarget};
use super::state::{GameEvent, GameState, Projectile};
use super::weapon::WeaponKind;
use super::world::{BodyId, HitTarget, MotionProvider, PhysicsWorld};
use crate::notify::Sound;
use crate::tuning::DamageModel;
use crate::{look_direction, planar, yaw_of};

/// What a hit did to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// Enemy survived and is staggered
    Staggered,
    /// This hit killed the enemy
    Killed,
    /// Enemy was already dead
    Ignored,
    /// Enemy no longer exists
    Missing,
}

/// Try to fire the current weapon from the player's eye
///
/// Needs a round in the magazine and the weapon's fire-rate window to have
/// passed. Returns true if a shot went off.
pub fn pull_trigger(state: &mut GameState) -> bool {
    let now = state.time_ms;
    if state.player.ammo == 0 {
        log::debug!("Out of ammo");
        state.emit(GameEvent::OutOfAmmo);
        return false;
    }
    if !state.player.can_shoot(now) {
        return false;
    }

    state.player.last_shot_ms = Some(now);
    state.player.fire_ammo();
    state.emit(GameEvent::Sound(Sound::Shoot));

    let aim = look_direction(state.player.yaw, state.player.pitch);
    let origin = state.player.position + aim * state.tuning.muzzle_offset;
    let weapon = state.player.weapon;
    fire_weapon(state, weapon, origin, aim);
    true
}

/// Spawn the projectiles for one shot of `weapon`, returning their ids
pub fn fire_weapon(state: &mut GameState, weapon: WeaponKind, origin: Vec3, aim: Vec3) -> Vec<u32> {
    let stats = weapon.stats();
    let damage = match state.tuning.damage_model {
        DamageModel::Flat { damage } => damage,
        DamageModel::PerWeapon => stats.damage,
    };
    let aim = aim.try_normalize().unwrap_or(Vec3::Z);
    let now = state.time_ms;
    let lifetime = state.tuning.projectile_lifetime_ms;

    let mut ids = Vec::with_capacity(stats.pellets as usize);
    for _ in 0..stats.pellets {
        let direction = scatter(&mut state.rng, aim, stats.spread);
        let id = state.next_entity_id();
        state.projectiles.push(Projectile {
            id,
            origin,
            position: origin,
            direction,
            speed: stats.bullet_speed,
            damage,
            weapon,
        });
        state
            .scheduler
            .schedule(now, lifetime, Task::ExpireProjectile { projectile: id });
        state.player.shots_fired += 1;
        ids.push(id);
    }
    ids
}

/// Jitter a direction by up to `spread` radians in yaw and pitch
fn scatter(rng: &mut impl Rng, aim: Vec3, spread: f32) -> Vec3 {
    if spread <= 0.0 {
        return aim;
    }
    let yaw = yaw_of(aim) + rng.random_range(-spread..=spread);
    let pitch = aim.y.clamp(-1.0, 1.0).asin() + rng.random_range(-spread..=spread);
    look_direction(yaw, pitch)
}

/// Bodies shots pass through: the shooter and every corpse
fn transparent_bodies(state: &GameState) -> Vec<BodyId> {
    let mut bodies: Vec<BodyId> = state
        .enemies
        .iter()
        .filter(|e| e.is_dead())
        .map(|e| e.body)
        .collect();
    bodies.extend(state.player.body);
    bodies
}

/// Move every projectile one tick and resolve anything it touches
///
/// Projectiles resolve in id order, so a pellet that kills an enemy leaves
/// a corpse the following pellets fly through.
pub fn advance_projectiles<W: PhysicsWorld>(state: &mut GameState, world: &mut W, dt: f32) {
    let ids: Vec<u32> = state.projectiles.iter().map(|p| p.id).collect();
    for id in ids {
        let Some(idx) = state.projectiles.iter().position(|p| p.id == id) else {
            continue;
        };
        let ignored = transparent_bodies(state);
        let filter = |target: HitTarget| match target {
            HitTarget::Body(body) => !ignored.contains(&body),
            _ => true,
        };

        let projectile = &mut state.projectiles[idx];
        let step = projectile.speed * dt;
        let Some(hit) = world.raycast(projectile.position, projectile.direction, step, &filter)
        else {
            projectile.position += projectile.direction * step;
            continue;
        };

        let projectile = state.projectiles.remove(idx);
        state.scheduler.cancel_target(TaskTarget::Projectile(id));

        if let HitTarget::Body(body) = hit.target {
            if let Some(enemy) = state.enemy_by_body(body).map(|e| e.id) {
                resolve_hit(state, world, enemy, projectile.origin, projectile.damage);
            }
        }
    }
}

/// Apply one projectile hit to an enemy
pub fn resolve_hit<W: MotionProvider>(
    state: &mut GameState,
    world: &mut W,
    enemy_id: u32,
    shot_origin: Vec3,
    damage: u32,
) -> HitOutcome {
    let face_threshold = state.tuning.face_threshold;
    let Some(enemy) = state.enemy_mut(enemy_id) else {
        log::debug!("Hit on missing enemy {}", enemy_id);
        return HitOutcome::Missing;
    };
    if enemy.is_dead() {
        return HitOutcome::Ignored;
    }

    let remaining = enemy.apply_damage(damage);
    let body = enemy.body;

    if remaining > 0 {
        let toward_shooter = planar(shot_origin - enemy.position);
        if toward_shooter.length() > face_threshold {
            enemy.facing = yaw_of(toward_shooter);
        }
        enemy.stagger();
        world.set_velocity(body, Vec3::ZERO);

        // A fresh hit restarts the stagger
        let now = state.time_ms;
        let recovery = state.tuning.hit_recovery_ms;
        state
            .scheduler
            .cancel_where(|t| *t == Task::RecoverFromHit { enemy: enemy_id });
        state
            .scheduler
            .schedule(now, recovery, Task::RecoverFromHit { enemy: enemy_id });
    }

    state.player.shots_hit += 1;
    state.emit(GameEvent::HitMarker);

    if remaining > 0 {
        HitOutcome::Staggered
    } else {
        kill_enemy(state, world, enemy_id);
        HitOutcome::Killed
    }
}

/// Transition an enemy to Dead and credit the kill
///
/// Safe to call repeatedly: only the first call for a given enemy scores,
/// counts toward the wave, and queues removal.
pub fn kill_enemy<W: MotionProvider>(state: &mut GameState, world: &mut W, enemy_id: u32) -> bool {
    let now = state.time_ms;
    let Some(enemy) = state.enemy_mut(enemy_id) else {
        return false;
    };
    if !enemy.mark_dead(now) {
        return false;
    }
    let body = enemy.body;
    world.set_velocity(body, Vec3::ZERO);

    // Dead enemies neither recover nor land pending attacks
    state.scheduler.cancel_target(TaskTarget::Enemy(enemy_id));
    state.scheduler.schedule(
        now,
        state.tuning.corpse_linger_ms,
        Task::RemoveEnemy { enemy: enemy_id },
    );

    state.player.add_score(state.tuning.kill_score);
    state.player.total_kills += 1;
    state.emit(GameEvent::Sound(Sound::ZombieDying));
    state.emit(GameEvent::EnemyKilled { id: enemy_id });

    if let Some(advance) = state.waves.on_enemy_killed() {
        let bonus = state.waves.bonus(state.tuning.wave_bonus_per_wave);
        state.player.add_score(bonus);
        state.spawn_clock.set_wave(advance.next, &state.tuning, now);
        state.emit(GameEvent::WaveComplete {
            completed: advance.completed,
            next: advance.next,
            bonus,
        });
    }
    true
}

/// Drop a corpse from the live set and the world
pub fn remove_enemy<W: MotionProvider>(state: &mut GameState, world: &mut W, enemy_id: u32) -> bool {
    let Some(idx) = state.enemies.iter().position(|e| e.id == enemy_id) else {
        log::debug!("Enemy {} already removed", enemy_id);
        return false;
    };
    let enemy = state.enemies.remove(idx);
    world.despawn_body(enemy.body);
    state.scheduler.cancel_target(TaskTarget::Enemy(enemy_id));
    state.emit(GameEvent::EnemyRemoved { id: enemy_id });
    true
}
