//! Bone orientation helpers.
//!
//! A freshly created bone has zero roll; its local frame is fully determined by the
//! head→tail direction. `bone_z_axis` reproduces that frame so the roll can be
//! measured against the surface normal of the vertex the bone starts from.

use crate::settings::{Axis, Direction};
use nalgebra::Vector3;

const SAFE_THRESHOLD: f64 = 6.1e-3;
const CRITICAL_THRESHOLD: f64 = 2.5e-4;
const THRESHOLD_SQUARED: f64 = CRITICAL_THRESHOLD * CRITICAL_THRESHOLD;

/// Local Z axis of a zero-roll bone spanning `head` to `tail`.
///
/// The bone's Y axis is the normalized head→tail vector `(x, y, z)`; the frame is
/// the shortest rotation taking world +Y onto it. Bones pointing (almost) straight
/// down −Y use a second-order expansion of `1 + y`, and exactly −Y flips X and Y.
/// Zero-length bones keep the rest frame.
pub fn bone_z_axis(head: &Vector3<f64>, tail: &Vector3<f64>) -> Vector3<f64> {
    let Some(nor) = (tail - head).try_normalize(0.0) else {
        return Vector3::z();
    };
    let (x, y, z) = (nor.x, nor.y, nor.z);

    let mut theta = 1.0 + y;
    let theta_alt = x * x + z * z;
    if theta > SAFE_THRESHOLD || theta_alt > THRESHOLD_SQUARED {
        if theta <= SAFE_THRESHOLD {
            theta = theta_alt * 0.5 + theta_alt * theta_alt * 0.125;
        }
        Vector3::new(-x * z / theta, -z, 1.0 - z * z / theta)
    } else {
        Vector3::z()
    }
}

/// Roll that turns the bone's Z axis toward `normal`.
///
/// The magnitude is the angle between the two; the sign depends on which world axis
/// the chain runs along and in which direction, so that all bones of a ring roll
/// consistently around the mesh.
pub fn compute_roll(
    normal: &Vector3<f64>,
    z_axis: &Vector3<f64>,
    axis: Axis,
    direction: Direction,
) -> f64 {
    let cos = normal.dot(z_axis).clamp(-1.0, 1.0);
    let roll = cos.acos();
    let positive = match (axis, direction) {
        (Axis::Z, _) => normal.x >= 0.0,
        (Axis::X, Direction::Plus) => normal.y < 0.0,
        (Axis::X, Direction::Minus) => normal.y >= 0.0,
        (Axis::Y, Direction::Plus) => normal.x >= 0.0,
        (Axis::Y, Direction::Minus) => normal.x < 0.0,
    };
    if positive {
        roll
    } else {
        -roll
    }
}
