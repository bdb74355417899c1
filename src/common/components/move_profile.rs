use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// How a moving entity orients itself while a move task is active.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum OrientMode {
    /// Face the direction of travel.
    #[default]
    Movement,
    /// Face the entity's [`Focus`](super::Focus) target while moving.
    FocusTarget,
}

/// Movement tuning the behavior controller swaps per state: roaming, chasing
/// and retreating each run at a different speed, and retreating keeps facing
/// the threat instead of the path.
#[derive(Clone, Component, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct MoveProfile {
    pub speed: f32,
    pub orient: OrientMode,
}

impl MoveProfile {
    pub fn new(speed: f32, orient: OrientMode) -> Self {
        Self { speed, orient }
    }
}

impl Default for MoveProfile {
    fn default() -> Self {
        Self {
            speed: 450.0,
            orient: OrientMode::Movement,
        }
    }
}
