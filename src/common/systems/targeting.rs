//! Target Selection
//!
//! Pure ranking over candidates produced by the spatial index:
//! - nearest-target selection for the initial lock-on
//! - direction-relative selection for cycling targets left/right
//!
//! # Design
//!
//! Both selectors are deliberately dumb about world state: callers gather
//! candidates (already filtered to targetable entities, excluding the
//! querying actor), and the selectors only rank. Distances are compared
//! squared; no square roots in the hot path.

use bevy::prelude::*;

/// A candidate produced from the spatial index: identity plus the position it
/// was sampled at.
#[derive(Clone, Copy, Debug)]
pub struct Candidate {
    pub ent: Entity,
    pub pos: Vec3,
}

/// Select the candidate nearest to `reference`.
///
/// `excluding` drops one entity from consideration (the just-released target
/// during the re-target cooldown). Exact distance ties go to the first
/// candidate encountered; candidate order comes from the spatial index and is
/// unspecified, so callers must only rely on strict minima.
///
/// # Returns
///
/// `None` when no candidate survives the exclusion — never an error. Callers
/// fall back to a camera reset or keep their current target.
pub fn select_nearest(
    candidates: &[Candidate],
    reference: Vec3,
    excluding: Option<Entity>,
) -> Option<Entity> {
    let mut closest_dist = f32::MAX;
    let mut closest: Option<Entity> = None;

    for candidate in candidates {
        if Some(candidate.ent) == excluding {
            continue;
        }
        let dist = candidate.pos.distance_squared(reference);
        if dist < closest_dist {
            closest_dist = dist;
            closest = Some(candidate.ent);
        }
    }

    closest
}

/// Select the next target in a direction relative to the view.
///
/// Each candidate's offset from `origin` (the current target's position) is
/// projected onto `right_axis` with a dot product. Cycling right picks the
/// smallest strictly-positive projection; cycling left the largest
/// strictly-negative one. A candidate at zero projection is on neither side
/// and is never picked.
///
/// When nothing qualifies — the player is already on the edge target — the
/// current target is returned unchanged, a deliberate no-op rather than a
/// wrap-around.
pub fn select_directional(
    candidates: &[Candidate],
    origin: Vec3,
    right_axis: Vec3,
    current: Entity,
    want_right: bool,
) -> Entity {
    let mut best_proj = if want_right { f32::MAX } else { f32::MIN };
    let mut best: Option<Entity> = None;

    for candidate in candidates {
        if candidate.ent == current {
            continue;
        }
        let proj = (candidate.pos - origin).dot(right_axis);
        if want_right {
            if proj > 0.0 && proj < best_proj {
                best_proj = proj;
                best = Some(candidate.ent);
            }
        } else if proj < 0.0 && proj > best_proj {
            best_proj = proj;
            best = Some(candidate.ent);
        }
    }

    best.unwrap_or(current)
}
