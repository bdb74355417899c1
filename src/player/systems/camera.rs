use bevy::prelude::*;

use crate::common::components::PlayerControlled;
use crate::player::components::view_rig::ViewRig;

/// Marks the camera driven by the player's view rig.
#[derive(Component, Default)]
pub struct ViewCamera;

/// Turn the interpolated rig state into a camera transform: orbit the anchor
/// (player plus framing offset) at arm length, then look back at it.
pub fn apply(
    players: Query<(&Transform, &ViewRig), (With<PlayerControlled>, Without<ViewCamera>)>,
    mut cameras: Query<&mut Transform, With<ViewCamera>>,
) {
    let Ok((player_tf, rig)) = players.single() else { return };
    let Ok(mut camera_tf) = cameras.single_mut() else { return };

    let anchor = player_tf.translation + rig.offset;
    camera_tf.translation = anchor - rig.forward() * rig.arm_length;
    camera_tf.look_at(anchor, Vec3::Y);
}
