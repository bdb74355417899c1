//! Frame-rate independent smoothing for the view framer.
//!
//! Exponential damping: `current + (target - current) * (1 - e^(-speed * dt))`.
//! Unlike a fixed linear step, the convergence rate does not depend on how
//! the frame time is sliced, and the value never overshoots a constant
//! target.

use std::f32::consts::{PI, TAU};

use bevy::prelude::*;

pub fn smooth(current: f32, target: f32, dt: f32, speed: f32) -> f32 {
    current + (target - current) * (1.0 - (-speed * dt).exp())
}

pub fn smooth_vec3(current: Vec3, target: Vec3, dt: f32, speed: f32) -> Vec3 {
    current + (target - current) * (1.0 - (-speed * dt).exp())
}

/// Like [`smooth`] for angles, always taking the shorter arc.
pub fn smooth_angle(current: f32, target: f32, dt: f32, speed: f32) -> f32 {
    current + wrap_angle(target - current) * (1.0 - (-speed * dt).exp())
}

/// Normalize an angle to `(-PI, PI]`.
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

/// Yaw (rotation about +Y) of a direction, zero facing -Z.
pub fn yaw_of(dir: Vec3) -> f32 {
    (-dir.x).atan2(-dir.z)
}
