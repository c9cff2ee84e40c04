//! In-crate collision world
//!
//! A small stand-in for the host physics engine: upright cylinder bodies,
//! cylinder building barriers, a ground plane and four boundary walls.
//! Dynamic bodies fall under gravity, rest on the ground, and are pushed out
//! of barriers, walls and kinematic bodies after integrating.

use std::collections::BTreeMap;

use glam::{Vec2, Vec3};

use super::collision::{
    push_out_of_circle, ray_arena_walls, ray_cylinder, ray_ground, xz,
};
use super::state::GameState;
use super::world::{
    BodyDesc, BodyId, BodyKind, HitTarget, MotionProvider, RayHit, SpatialQuery,
};
use crate::consts::*;
use crate::error::SpawnError;

/// Building barrier as seen by the world
#[derive(Debug, Clone, Copy)]
struct Barrier {
    id: u32,
    center: Vec2,
    radius: f32,
}

#[derive(Debug, Clone, Copy)]
struct Body {
    kind: BodyKind,
    position: Vec3,
    velocity: Vec3,
    radius: f32,
    half_height: f32,
}

/// Reference implementation of the physics seams
#[derive(Debug, Clone)]
pub struct ArenaWorld {
    half: f32,
    barriers: Vec<Barrier>,
    /// Ordered so iteration (and therefore stepping) is deterministic
    bodies: BTreeMap<BodyId, Body>,
    next_body: BodyId,
    max_bodies: usize,
    /// Spawns to fail before succeeding again (fault injection)
    failing_spawns: u32,
}

impl ArenaWorld {
    /// Empty walled arena of side `2 * half`
    pub fn new(half: f32) -> Self {
        Self {
            half,
            barriers: Vec::new(),
            bodies: BTreeMap::new(),
            next_body: 1,
            max_bodies: 512,
            failing_spawns: 0,
        }
    }

    /// Arena with the run's buildings
    pub fn from_state(state: &GameState) -> Self {
        let mut world = Self::new(state.tuning.arena_half());
        for o in &state.obstacles {
            world.add_barrier(o.id, o.center, o.barrier_radius);
        }
        world
    }

    pub fn add_barrier(&mut self, id: u32, center: Vec2, radius: f32) {
        self.barriers.push(Barrier { id, center, radius });
    }

    /// Make the next `count` spawns fail as if their assets did not load
    pub fn inject_spawn_failures(&mut self, count: u32) {
        self.failing_spawns = count;
    }

    pub fn set_max_bodies(&mut self, max: usize) {
        self.max_bodies = max;
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn contains(&self, body: BodyId) -> bool {
        self.bodies.contains_key(&body)
    }

    /// Teleport a body (test and editor use)
    pub fn set_position(&mut self, body: BodyId, position: Vec3) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.position = position;
        }
    }

    /// Resolve horizontal overlap of a body with barriers and walls
    fn resolve_static(&self, position: Vec3, radius: f32) -> Vec3 {
        let mut p = xz(position);
        for barrier in &self.barriers {
            if let Some(out) = push_out_of_circle(p, barrier.center, barrier.radius + radius) {
                p = out;
            }
        }
        let limit = (self.half - radius).max(0.0);
        p = p.clamp(Vec2::splat(-limit), Vec2::splat(limit));
        Vec3::new(p.x, position.y, p.y)
    }
}

impl SpatialQuery for ArenaWorld {
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: &dyn Fn(HitTarget) -> bool,
    ) -> Option<RayHit> {
        let mut best: Option<(f32, HitTarget)> = None;
        let mut consider = |t: Option<f32>, target: HitTarget| {
            if let Some(t) = t {
                if filter(target) && best.is_none_or(|(bt, _)| t < bt) {
                    best = Some((t, target));
                }
            }
        };

        for barrier in &self.barriers {
            let t = ray_cylinder(
                origin,
                direction,
                barrier.center,
                barrier.radius,
                0.0,
                BARRIER_HEIGHT,
                max_distance,
            );
            consider(t, HitTarget::Obstacle(barrier.id));
        }

        for (&id, body) in &self.bodies {
            let t = ray_cylinder(
                origin,
                direction,
                xz(body.position),
                body.radius,
                body.position.y - body.half_height,
                body.position.y + body.half_height,
                max_distance,
            );
            consider(t, HitTarget::Body(id));
        }

        consider(
            ray_arena_walls(origin, direction, self.half, WALL_HEIGHT, max_distance),
            HitTarget::Wall,
        );
        consider(ray_ground(origin, direction, max_distance), HitTarget::Ground);

        best.map(|(distance, target)| RayHit {
            point: origin + direction * distance,
            distance,
            target,
        })
    }
}

impl MotionProvider for ArenaWorld {
    fn spawn_body(&mut self, desc: BodyDesc) -> Result<BodyId, SpawnError> {
        if self.failing_spawns > 0 {
            self.failing_spawns -= 1;
            return Err(SpawnError::AssetLoad("zombie model".to_string()));
        }
        if self.bodies.len() >= self.max_bodies {
            return Err(SpawnError::WorldFull(self.bodies.len()));
        }

        let id = self.next_body;
        self.next_body += 1;
        self.bodies.insert(
            id,
            Body {
                kind: desc.kind,
                position: desc.position,
                velocity: Vec3::ZERO,
                radius: desc.radius,
                half_height: desc.half_height,
            },
        );
        Ok(id)
    }

    fn despawn_body(&mut self, body: BodyId) {
        self.bodies.remove(&body);
    }

    fn set_velocity(&mut self, body: BodyId, velocity: Vec3) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.velocity = velocity;
        }
    }

    fn velocity(&self, body: BodyId) -> Option<Vec3> {
        self.bodies.get(&body).map(|b| b.velocity)
    }

    fn position(&self, body: BodyId) -> Option<Vec3> {
        self.bodies.get(&body).map(|b| b.position)
    }

    fn move_with_collision(&mut self, body: BodyId, delta: Vec3) {
        let Some(b) = self.bodies.get(&body).copied() else {
            return;
        };
        let moved = self.resolve_static(b.position + delta, b.radius);
        if let Some(b) = self.bodies.get_mut(&body) {
            b.position = moved;
        }
    }

    fn step(&mut self, dt: f32) {
        let kinematic: Vec<(Vec2, f32)> = self
            .bodies
            .values()
            .filter(|b| b.kind == BodyKind::Kinematic)
            .map(|b| (xz(b.position), b.radius))
            .collect();

        let ids: Vec<BodyId> = self
            .bodies
            .iter()
            .filter(|(_, b)| b.kind == BodyKind::Dynamic)
            .map(|(&id, _)| id)
            .collect();

        for id in ids {
            let Some(mut b) = self.bodies.get(&id).copied() else {
                continue;
            };

            b.velocity.y -= GRAVITY * dt;
            b.position += b.velocity * dt;

            // Rest on the ground
            if b.position.y - b.half_height < 0.0 {
                b.position.y = b.half_height;
                b.velocity.y = b.velocity.y.max(0.0);
            }

            // Kinematic bodies do not yield
            let mut p = xz(b.position);
            for &(center, radius) in &kinematic {
                if let Some(out) = push_out_of_circle(p, center, radius + b.radius) {
                    p = out;
                }
            }
            b.position = self.resolve_static(Vec3::new(p.x, b.position.y, p.y), b.radius);

            self.bodies.insert(id, b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::world::obstacles_only;

    fn enemy_desc(x: f32, z: f32) -> BodyDesc {
        BodyDesc {
            kind: BodyKind::Dynamic,
            position: Vec3::new(x, ENEMY_BODY_HALF_HEIGHT, z),
            radius: ENEMY_BODY_RADIUS,
            half_height: ENEMY_BODY_HALF_HEIGHT,
        }
    }

    #[test]
    fn test_raycast_picks_nearest() {
        let mut world = ArenaWorld::new(50.0);
        world.add_barrier(1, Vec2::new(0.0, 20.0), 3.0);
        let near = world.spawn_body(enemy_desc(0.0, 10.0)).unwrap();

        let hit = world
            .raycast(Vec3::new(0.0, 1.0, 0.0), Vec3::Z, 100.0, &|_| true)
            .unwrap();
        assert_eq!(hit.target, HitTarget::Body(near));
        assert!((hit.distance - (10.0 - ENEMY_BODY_RADIUS)).abs() < 1e-4);

        // Filtered down to buildings only
        let hit = world
            .raycast(Vec3::new(0.0, 1.0, 0.0), Vec3::Z, 100.0, &obstacles_only)
            .unwrap();
        assert_eq!(hit.target, HitTarget::Obstacle(1));
        assert!((hit.distance - 17.0).abs() < 1e-4);
    }

    #[test]
    fn test_line_of_sight() {
        let mut world = ArenaWorld::new(50.0);
        world.add_barrier(1, Vec2::new(0.0, 10.0), 3.0);
        let from = Vec3::new(0.0, 1.0, 0.0);
        assert!(!world.line_of_sight(from, Vec3::new(0.0, 1.0, 20.0), &obstacles_only));
        assert!(world.line_of_sight(from, Vec3::new(20.0, 1.0, 0.0), &obstacles_only));
        // Target short of the barrier
        assert!(world.line_of_sight(from, Vec3::new(0.0, 1.0, 5.0), &obstacles_only));
    }

    #[test]
    fn test_dynamic_body_moves_and_keeps_gravity_channel() {
        let mut world = ArenaWorld::new(50.0);
        let id = world.spawn_body(enemy_desc(0.0, 0.0)).unwrap();
        world.set_velocity(id, Vec3::new(2.0, 0.0, 0.0));
        for _ in 0..100 {
            world.step(0.01);
        }
        let p = world.position(id).unwrap();
        assert!((p.x - 2.0).abs() < 1e-3);
        assert!((p.y - ENEMY_BODY_HALF_HEIGHT).abs() < 1e-6);
    }

    #[test]
    fn test_bodies_stay_out_of_barriers_and_walls() {
        let mut world = ArenaWorld::new(50.0);
        world.add_barrier(1, Vec2::new(5.0, 0.0), 2.0);
        let id = world.spawn_body(enemy_desc(0.0, 0.0)).unwrap();
        world.set_velocity(id, Vec3::new(3.0, 0.0, 0.0));
        for _ in 0..200 {
            world.step(0.01);
        }
        let p = xz(world.position(id).unwrap());
        assert!(p.distance(Vec2::new(5.0, 0.0)) >= 2.0 + ENEMY_BODY_RADIUS - 1e-4);

        let player = world
            .spawn_body(BodyDesc {
                kind: BodyKind::Kinematic,
                position: Vec3::new(0.0, 1.6, 0.0),
                radius: PLAYER_BODY_RADIUS,
                half_height: PLAYER_BODY_HALF_HEIGHT,
            })
            .unwrap();
        world.move_with_collision(player, Vec3::new(0.0, 0.0, -80.0));
        let p = world.position(player).unwrap();
        assert!((p.z + 50.0 - PLAYER_BODY_RADIUS).abs() < 1e-4);
    }

    #[test]
    fn test_spawn_failures() {
        let mut world = ArenaWorld::new(50.0);
        world.inject_spawn_failures(1);
        assert!(matches!(
            world.spawn_body(enemy_desc(0.0, 0.0)),
            Err(SpawnError::AssetLoad(_))
        ));
        assert!(world.spawn_body(enemy_desc(0.0, 0.0)).is_ok());

        world.set_max_bodies(1);
        assert_eq!(
            world.spawn_body(enemy_desc(1.0, 0.0)),
            Err(SpawnError::WorldFull(1))
        );
    }
}
