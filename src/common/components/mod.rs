pub mod move_profile;
pub mod targetable;

use bevy::prelude::*;

/// Marker for actors driven by a human player. Enemy perception only senses
/// entities carrying this, which is where the opponent-faction filtering of
/// the sensing layer happens.
#[derive(Clone, Component, Copy, Debug, Default)]
pub struct PlayerControlled;

/// Look-at override while moving. While present (and the entity's profile asks
/// for it) the movement executor keeps the entity facing this actor instead of
/// its direction of travel — retreating enemies back away without turning
/// around.
#[derive(Clone, Component, Copy, Debug)]
pub struct Focus(pub Entity);
