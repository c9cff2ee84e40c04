//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering, audio or storage; hosts read `GameState::events`

pub mod ai;
pub mod arena;
pub mod collision;
pub mod combat;
pub mod schedule;
pub mod spawner;
pub mod state;
pub mod tick;
pub mod wave;
pub mod weapon;
pub mod world;

pub use arena::ArenaWorld;
pub use combat::HitOutcome;
pub use schedule::{Scheduler, Task, TaskTarget};
pub use state::{
    AnimationCue, BehaviorState, DamageOutcome, Enemy, GameEvent, GamePhase, GameState, Obstacle,
    Player, Projectile,
};
pub use tick::{TickInput, start_run, tick};
pub use wave::{WaveAdvance, WaveDirector};
pub use weapon::{Weapon, WeaponKind};
pub use world::{BodyDesc, BodyId, BodyKind, HitTarget, MotionProvider, PhysicsWorld, RayHit, SpatialQuery};
