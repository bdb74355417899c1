use bevy::prelude::*;

use crate::common::resources::TargetingConfig;

/// Interpolated spring-arm state: anchor offset from the player, arm length,
/// and view rotation. The lock-on controller steers the fields; the camera
/// system turns them into a transform once per frame.
#[derive(Component, Clone, Copy, Debug)]
pub struct ViewRig {
    /// Current anchor offset from the player.
    pub offset: Vec3,
    pub default_offset: Vec3,
    pub arm_length: f32,
    pub default_arm_length: f32,
    /// View rotation about +Y.
    pub yaw: f32,
    pub pitch: f32,
}

impl ViewRig {
    pub fn from_config(config: &TargetingConfig) -> Self {
        Self {
            offset: config.default_offset,
            default_offset: config.default_offset,
            arm_length: config.default_arm_length,
            default_arm_length: config.default_arm_length,
            yaw: 0.0,
            pitch: config.base_pitch,
        }
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation() * Vec3::NEG_Z
    }

    /// Forward flattened onto the ground plane.
    pub fn flat_forward(&self) -> Vec3 {
        let f = Quat::from_rotation_y(self.yaw) * Vec3::NEG_Z;
        f.normalize_or_zero()
    }

    pub fn right(&self) -> Vec3 {
        Quat::from_rotation_y(self.yaw) * Vec3::X
    }

    /// Within epsilon of the rest pose (offset and arm length).
    pub fn at_defaults(&self, epsilon: f32) -> bool {
        (self.offset - self.default_offset).length() <= epsilon
            && (self.arm_length - self.default_arm_length).abs() <= epsilon
    }
}

impl Default for ViewRig {
    fn default() -> Self {
        Self::from_config(&TargetingConfig::default())
    }
}
