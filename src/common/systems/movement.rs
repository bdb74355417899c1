//! Movement executor.
//!
//! The thin stand-in for the engine's path-following layer: it consumes
//! [`MoveTo`]/[`StopMovement`] requests, walks entities toward their goal at
//! the speed of their [`MoveProfile`], and answers with [`MoveCompleted`]
//! once inside the acceptance radius. Completion messages echo the request id
//! so requesters can discard completions for moves they have since replaced.

use bevy::{math::Vec3Swizzles, prelude::*};

use crate::common::{
    components::{move_profile::*, Focus},
    message::*,
    resources::BehaviorConfig,
};

/// An in-flight movement request. At most one per entity; replacing it aborts
/// the previous request.
#[derive(Clone, Component, Copy, Debug)]
pub struct MoveTask {
    pub request: u64,
    pub goal: MoveGoal,
    pub acceptance: f32,
}

pub fn apply_profiles(
    mut commands: Commands,
    mut reader: MessageReader<SetMoveProfile>,
    movers: Query<(), With<Transform>>,
) {
    for &SetMoveProfile { ent, profile } in reader.read() {
        if movers.get(ent).is_err() {
            warn!("movement profile for missing entity {ent:?}");
            continue;
        }
        commands.entity(ent).try_insert(profile);
    }
}

pub fn apply_requests(
    mut commands: Commands,
    mut reader: MessageReader<MoveTo>,
    mut tasks: Query<&mut MoveTask>,
    movers: Query<(), With<Transform>>,
    mut done: MessageWriter<MoveCompleted>,
) {
    for &MoveTo { ent, request, goal, acceptance } in reader.read() {
        if movers.get(ent).is_err() {
            warn!("move request for missing entity {ent:?}");
            continue;
        }
        if let Ok(mut task) = tasks.get_mut(ent) {
            done.write(MoveCompleted {
                ent,
                request: task.request,
                result: MoveResult::Aborted,
            });
            *task = MoveTask { request, goal, acceptance };
        } else {
            commands.entity(ent).try_insert(MoveTask { request, goal, acceptance });
        }
    }
}

pub fn apply_stops(
    mut commands: Commands,
    mut reader: MessageReader<StopMovement>,
    tasks: Query<&MoveTask>,
    mut done: MessageWriter<MoveCompleted>,
) {
    for &StopMovement { ent } in reader.read() {
        let Ok(task) = tasks.get(ent) else { continue };
        done.write(MoveCompleted {
            ent,
            request: task.request,
            result: MoveResult::Aborted,
        });
        commands.entity(ent).remove::<MoveTask>();
    }
}

/// Advance every active move task. Arrival is measured on the horizontal
/// plane; actor goals are re-resolved each tick since the target may be
/// moving.
pub fn advance(
    time: Res<Time>,
    config: Res<BehaviorConfig>,
    mut commands: Commands,
    mut query: Query<(Entity, &mut Transform, &MoveTask, Option<&MoveProfile>, Option<&Focus>)>,
    targets: Query<&Transform, Without<MoveTask>>,
    mut done: MessageWriter<MoveCompleted>,
) {
    let dt = time.delta_secs();

    for (ent, mut transform, task, profile, focus) in &mut query {
        let goal = match task.goal {
            MoveGoal::Point(p) => p,
            MoveGoal::Actor(actor) => match targets.get(actor) {
                Ok(t) => t.translation,
                Err(_) => {
                    // Goal actor destroyed mid-move: the path no longer exists.
                    warn!("move goal {actor:?} is gone; aborting move for {ent:?}");
                    done.write(MoveCompleted {
                        ent,
                        request: task.request,
                        result: MoveResult::Aborted,
                    });
                    commands.entity(ent).remove::<MoveTask>();
                    continue;
                }
            },
        };

        let to_goal = (goal - transform.translation).xz();
        let dist = to_goal.length();
        if dist <= task.acceptance {
            done.write(MoveCompleted {
                ent,
                request: task.request,
                result: MoveResult::Succeeded,
            });
            commands.entity(ent).remove::<MoveTask>();
            continue;
        }

        let speed = profile.map(|p| p.speed).unwrap_or(config.roaming_speed);
        let step = (speed * dt).min(dist);
        let dir = to_goal / dist;
        transform.translation += Vec3::new(dir.x, 0.0, dir.y) * step;

        // Orientation: face the focus target when the profile asks for it,
        // otherwise face the direction of travel.
        let face = match (profile.map(|p| p.orient), focus) {
            (Some(OrientMode::FocusTarget), Some(&Focus(actor))) => targets
                .get(actor)
                .map(|t| (t.translation - transform.translation).xz())
                .unwrap_or(dir),
            _ => dir,
        };
        if face.length_squared() > 1e-6 {
            let forward = Vec3::new(face.x, 0.0, face.y);
            transform.look_to(forward, Vec3::Y);
        }
    }
}
