//! Seams to the host physics engine
//!
//! The simulation never owns geometry or integrates motion itself. It asks a
//! `SpatialQuery` for rays and line of sight, and drives bodies through a
//! `MotionProvider`. `ArenaWorld` is the in-crate implementation; a host
//! engine can supply its own.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::SpawnError;

/// Handle to a rigid body in the collision world
pub type BodyId = u32;

/// What a ray struck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitTarget {
    /// Building or its invisible collision barrier
    Obstacle(u32),
    /// A player or enemy body
    Body(BodyId),
    /// Arena boundary wall
    Wall,
    Ground,
}

/// Nearest hit along a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    pub distance: f32,
    pub target: HitTarget,
}

/// How the world moves a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    /// Moved explicitly by the game (the player)
    Kinematic,
    /// Integrated by the world with gravity (enemies)
    Dynamic,
}

/// Body creation request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub kind: BodyKind,
    /// Center of the volume
    pub position: Vec3,
    pub radius: f32,
    pub half_height: f32,
}

/// Ray and line-of-sight queries
pub trait SpatialQuery {
    /// Nearest hit within `max_distance` along `direction` (unit length)
    /// whose target passes `filter`
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: &dyn Fn(HitTarget) -> bool,
    ) -> Option<RayHit>;

    /// True when nothing passing `filter` lies on the segment `from`..`to`
    fn line_of_sight(&self, from: Vec3, to: Vec3, filter: &dyn Fn(HitTarget) -> bool) -> bool {
        let delta = to - from;
        let distance = delta.length();
        if distance <= f32::EPSILON {
            return true;
        }
        self.raycast(from, delta / distance, distance, filter).is_none()
    }
}

/// Rigid body control
pub trait MotionProvider {
    /// Create a body; may fail when assets or world capacity run out
    fn spawn_body(&mut self, desc: BodyDesc) -> Result<BodyId, SpawnError>;
    /// Remove a body; unknown ids are ignored
    fn despawn_body(&mut self, body: BodyId);
    fn set_velocity(&mut self, body: BodyId, velocity: Vec3);
    fn velocity(&self, body: BodyId) -> Option<Vec3>;
    fn position(&self, body: BodyId) -> Option<Vec3>;
    /// Translate a body by `delta`, stopping at anything solid
    fn move_with_collision(&mut self, body: BodyId, delta: Vec3);
    /// Advance dynamic bodies by `dt` seconds
    fn step(&mut self, dt: f32);
}

/// Everything the simulation needs from the physics engine
pub trait PhysicsWorld: SpatialQuery + MotionProvider {}

impl<T: SpatialQuery + MotionProvider> PhysicsWorld for T {}

/// Ray filter accepting only buildings and their barriers
pub fn obstacles_only(target: HitTarget) -> bool {
    matches!(target, HitTarget::Obstacle(_))
}
