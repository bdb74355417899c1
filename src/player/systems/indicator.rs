//! Targeting indicator state.
//!
//! The floating arrow over the locked target is rendered by the embedding
//! game; this module owns its logical state — which entity it hangs over,
//! whether it is visible, which display mode it uses, and the world-space
//! head point it should hover at. The arrow follows the target every frame
//! and hides itself the moment the target stops existing.

use bevy::prelude::*;

use crate::common::{components::targetable::Targetable, message::*};

/// Height of the hover point above the target's head.
const BASE_HEIGHT: f32 = 70.0;

#[derive(Resource, Clone, Copy, Debug, Default)]
pub struct IndicatorState {
    pub target: Option<Entity>,
    pub visible: bool,
    pub mode: IndicatorMode,
    /// World-space hover point, valid while `visible`.
    pub position: Vec3,
}

pub fn apply_messages(
    mut state: ResMut<IndicatorState>,
    mut set: MessageReader<SetIndicatorTarget>,
    mut show: MessageReader<ShowIndicator>,
    mut hide: MessageReader<HideIndicator>,
) {
    for &SetIndicatorTarget { target } in set.read() {
        state.target = Some(target);
    }
    for &ShowIndicator { mode } in show.read() {
        state.mode = mode;
        state.visible = true;
    }
    for _ in hide.read() {
        state.visible = false;
        state.target = None;
    }
}

pub fn follow_target(
    mut state: ResMut<IndicatorState>,
    targetables: Query<(&Transform, &Targetable)>,
) {
    if !state.visible {
        return;
    }
    let Some(target) = state.target else {
        state.visible = false;
        return;
    };
    let Ok((transform, targetable)) = targetables.get(target) else {
        // Target destroyed out from under the arrow.
        state.visible = false;
        state.target = None;
        return;
    };
    state.position =
        transform.translation + Vec3::Y * (targetable.half_height + BASE_HEIGHT);
}
