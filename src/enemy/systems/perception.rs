//! Sight sensing.
//!
//! Geometry stand-in for the engine's perception component: an adversary
//! acquires a player inside the sight radius and vision cone, keeps the
//! stimulus alive while the player stays inside the (larger) lose-sight
//! radius, and reports the loss only after the stimulus has gone unseen
//! longer than its max age. The acquired/lost edges are delivered to the
//! behavior controller as [`PerceptionChanged`] messages — at most one edge
//! per change, never a stream.

use bevy::{math::Vec3Swizzles, prelude::*};

use crate::common::{components::PlayerControlled, message::PerceptionChanged, resources::BehaviorConfig};
use crate::enemy::components::{behavior::Behavior, sight::SightMemory};

/// True when `target` is inside `radius` and the vision cone of `looker`.
fn in_sight(looker: &Transform, target: &Transform, radius: f32, half_angle: f32) -> bool {
    let to_target = (target.translation - looker.translation).xz();
    let dist_sq = to_target.length_squared();
    if dist_sq > radius * radius {
        return false;
    }
    // On top of each other: always seen.
    if dist_sq < 1.0 {
        return true;
    }
    let forward = (*looker.forward()).xz();
    let Some(forward) = forward.try_normalize() else {
        // Looking straight up or down: no horizontal facing, treat as blind
        // to the cone check but not to touch range.
        return false;
    };
    forward.dot(to_target / dist_sq.sqrt()) >= half_angle.cos()
}

pub fn sense(
    time: Res<Time>,
    config: Res<BehaviorConfig>,
    mut enemies: Query<(Entity, &Transform, &mut SightMemory), With<Behavior>>,
    players: Query<(Entity, &Transform), With<PlayerControlled>>,
    mut writer: MessageWriter<PerceptionChanged>,
) {
    let now = time.elapsed_secs();

    for (ent, transform, mut memory) in &mut enemies {
        match memory.sensed {
            None => {
                for (actor, player_tf) in &players {
                    if in_sight(transform, player_tf, config.sight_radius, config.peripheral_half_angle) {
                        memory.sensed = Some(actor);
                        memory.last_seen = now;
                        writer.write(PerceptionChanged {
                            ent,
                            actor,
                            acquired: true,
                        });
                        break;
                    }
                }
            }
            Some(actor) => {
                let still_seen = players.get(actor).is_ok_and(|(_, player_tf)| {
                    in_sight(transform, player_tf, config.lose_sight_radius, config.peripheral_half_angle)
                });
                if still_seen {
                    memory.last_seen = now;
                } else if now - memory.last_seen >= config.sight_max_age {
                    memory.sensed = None;
                    writer.write(PerceptionChanged {
                        ent,
                        actor,
                        acquired: false,
                    });
                }
            }
        }
    }
}
