use bevy::prelude::*;

use crate::common::plugins::nntree::Tracked;

/// Capability tag for lock-on eligibility, plus the collision geometry the
/// view framer and indicator use to place themselves relative to the body.
///
/// Targetable entities are kept in the spatial index automatically (via the
/// required [`Tracked`] component); the core never owns them and re-validates
/// the reference before every dereference.
#[derive(Clone, Component, Copy, Debug)]
#[require(Tracked)]
pub struct Targetable {
    /// Horizontal collision radius.
    pub radius: f32,
    /// Half of the collision capsule height; head point = position + half_height.
    pub half_height: f32,
}

impl Default for Targetable {
    fn default() -> Self {
        Self {
            radius: 42.0,
            half_height: 88.0,
        }
    }
}
