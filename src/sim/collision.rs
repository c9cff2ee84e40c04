//! Collision geometry for the arena
//!
//! Everything solid in the arena is an upright cylinder (bodies, building
//! barriers) or an axis-aligned plane (ground, boundary walls). Rays are
//! tested as parameter spans: the ray is inside a shape for `t` in
//! `[enter, exit]`, and a capped cylinder is the overlap of a circle span in
//! xz with a slab span in y.

use glam::{Vec2, Vec3};

const EPS: f32 = 1e-6;

/// Signed distance to a circle
#[inline]
pub fn sd_circle(p: Vec2, center: Vec2, radius: f32) -> f32 {
    (p - center).length() - radius
}

/// xz projection of a point
#[inline]
pub fn xz(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.z)
}

/// Span of `t` for which `origin + t * dir` lies inside a circle
pub fn ray_circle_span(origin: Vec2, dir: Vec2, center: Vec2, radius: f32) -> Option<(f32, f32)> {
    let to_origin = origin - center;
    let a = dir.length_squared();
    let c = to_origin.length_squared() - radius * radius;

    if a < EPS {
        // Ray parallel to the cylinder axis: inside for all t or never
        return (c <= 0.0).then_some((f32::NEG_INFINITY, f32::INFINITY));
    }

    let b = to_origin.dot(dir);
    let disc = b * b - a * c;
    if disc < 0.0 {
        return None;
    }
    let root = disc.sqrt();
    Some(((-b - root) / a, (-b + root) / a))
}

/// Span of `t` for which a 1D ray lies within `[min, max]`
pub fn ray_slab_span(origin: f32, dir: f32, min: f32, max: f32) -> Option<(f32, f32)> {
    if dir.abs() < EPS {
        return (origin >= min && origin <= max).then_some((f32::NEG_INFINITY, f32::INFINITY));
    }
    let t1 = (min - origin) / dir;
    let t2 = (max - origin) / dir;
    Some((t1.min(t2), t1.max(t2)))
}

/// Distance along a ray to an upright capped cylinder, if hit within `max_distance`
///
/// A ray starting inside the cylinder hits at distance 0.
pub fn ray_cylinder(
    origin: Vec3,
    dir: Vec3,
    center: Vec2,
    radius: f32,
    y_min: f32,
    y_max: f32,
    max_distance: f32,
) -> Option<f32> {
    let (c0, c1) = ray_circle_span(xz(origin), xz(dir), center, radius)?;
    let (s0, s1) = ray_slab_span(origin.y, dir.y, y_min, y_max)?;

    let enter = c0.max(s0).max(0.0);
    let exit = c1.min(s1);
    (enter <= exit && enter <= max_distance).then_some(enter)
}

/// Distance along a ray to the ground plane (y = 0), if hit within `max_distance`
pub fn ray_ground(origin: Vec3, dir: Vec3, max_distance: f32) -> Option<f32> {
    if dir.y > -EPS || origin.y < 0.0 {
        return None;
    }
    let t = -origin.y / dir.y;
    (t <= max_distance).then_some(t)
}

/// Distance along a ray to the square arena's boundary walls
///
/// The ray must start inside the arena. Rays leaving over the top of the
/// walls miss.
pub fn ray_arena_walls(
    origin: Vec3,
    dir: Vec3,
    half: f32,
    wall_height: f32,
    max_distance: f32,
) -> Option<f32> {
    if origin.x.abs() > half || origin.z.abs() > half {
        return None;
    }

    let exit_along = |o: f32, d: f32| -> f32 {
        if d > EPS {
            (half - o) / d
        } else if d < -EPS {
            (-half - o) / d
        } else {
            f32::INFINITY
        }
    };

    let t = exit_along(origin.x, dir.x).min(exit_along(origin.z, dir.z));
    if !t.is_finite() || t > max_distance {
        return None;
    }
    let y = origin.y + dir.y * t;
    (0.0..=wall_height).contains(&y).then_some(t)
}

/// Push a point out of a circle so it sits at least `min_dist` from `center`
///
/// Returns the corrected point, or None if it was already clear.
pub fn push_out_of_circle(p: Vec2, center: Vec2, min_dist: f32) -> Option<Vec2> {
    let d = sd_circle(p, center, min_dist);
    if d >= 0.0 {
        return None;
    }
    let away = (p - center).try_normalize().unwrap_or(Vec2::X);
    Some(center + away * min_dist)
}
