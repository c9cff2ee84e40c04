//! Undead Protocol - wave-based zombie survival shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (enemy AI, combat, waves, game state)
//! - `session`: Run lifecycle around the simulation (fixed timestep, persistence)
//! - `leaderboard`: Run results and personal bests
//! - `persistence`: Flat key-value storage (LocalStorage on web)
//! - `notify`: Audio/visual notification seam
//! - `platform`: Browser/native platform abstraction
//! - `tuning`: Data-driven game balance

pub mod error;
pub mod leaderboard;
pub mod notify;
pub mod persistence;
pub mod platform;
pub mod session;
pub mod sim;
pub mod tuning;

pub use error::{PersistenceError, SpawnError, TuningError};
pub use leaderboard::{Leaderboard, LeaderboardSink, RunResult};
pub use session::Session;
pub use tuning::Tuning;

use glam::Vec3;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (100 Hz, 10ms per tick)
    pub const SIM_DT: f32 = 1.0 / 100.0;
    /// Maximum substeps per frame to prevent spiral of death
    ///
    /// Enough to cover a full `MAX_FRAME_DT` frame.
    pub const MAX_SUBSTEPS: u32 = 10;
    /// Longest frame delta the session will simulate at once (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Gravity applied to dynamic bodies (units/s²)
    pub const GRAVITY: f32 = 9.81;

    /// Invisible arena walls
    pub const WALL_HEIGHT: f32 = 3.0;
    /// Building collision barrier height
    pub const BARRIER_HEIGHT: f32 = 15.0;

    /// Enemy collision volume (upright capsule approximated as a cylinder)
    pub const ENEMY_BODY_RADIUS: f32 = 0.3;
    pub const ENEMY_BODY_HALF_HEIGHT: f32 = 1.0;

    /// Player collision volume
    pub const PLAYER_BODY_RADIUS: f32 = 0.5;
    pub const PLAYER_BODY_HALF_HEIGHT: f32 = 0.5;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Horizontal (xz-plane) component of a vector, y discarded
#[inline]
pub fn planar(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Heading of a horizontal direction, measured from +z toward +x
#[inline]
pub fn yaw_of(dir: Vec3) -> f32 {
    normalize_angle(dir.x.atan2(dir.z))
}

/// Unit look direction from yaw/pitch (pitch positive looks up)
#[inline]
pub fn look_direction(yaw: f32, pitch: f32) -> Vec3 {
    Vec3::new(
        yaw.sin() * pitch.cos(),
        pitch.sin(),
        yaw.cos() * pitch.cos(),
    )
}

/// Horizontal right-hand vector for a given yaw
#[inline]
pub fn right_of(yaw: f32) -> Vec3 {
    Vec3::new(yaw.cos(), 0.0, -yaw.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaw_round_trips_look_direction() {
        for yaw in [-3.0_f32, -1.2, 0.0, 0.4, 2.9] {
            let dir = look_direction(yaw, 0.0);
            assert!((yaw_of(dir) - yaw).abs() < 1e-4);
        }
    }

    #[test]
    fn test_right_is_perpendicular_to_forward() {
        let yaw = 0.7;
        let forward = look_direction(yaw, 0.0);
        assert!(forward.dot(right_of(yaw)).abs() < 1e-6);
        // Yaw 0 looks down +z, right is +x
        assert!((right_of(0.0) - Vec3::X).length() < 1e-6);
    }

    #[test]
    fn test_planar_discards_height() {
        assert_eq!(planar(Vec3::new(1.0, 5.0, -2.0)), Vec3::new(1.0, 0.0, -2.0));
    }
}
