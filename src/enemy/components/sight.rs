use bevy::prelude::*;

/// Sensing state for one adversary: which actor is currently sensed and when
/// it was last actually seen. An unseen target is kept "sensed" until the
/// stimulus ages out, which is what produces the delayed lost notification.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct SightMemory {
    pub sensed: Option<Entity>,
    pub last_seen: f32,
}
