//! Lock-on controller.
//!
//! Owns the per-player targeting state machine:
//!
//! - **Idle**: free look.
//! - **Targeting**: a locked entity; the view frames the midpoint between
//!   player and target, look input steers an offset rotation instead of the
//!   camera, and switch input cycles to the next target left or right.
//! - **CleaningUp**: the lock ended; offset and arm length ease back to
//!   defaults.
//! - **CameraResetting**: no target was found; the view eases around to the
//!   facing captured at the button press, unless the player overrides it
//!   with look input.
//!
//! Targets are searched in a sphere pushed ahead of the player (forward bias)
//! and re-validated every frame; a destroyed or out-of-range target routes
//! through the same cleanup path as a released one. Releasing a target opens
//! a short cooldown during which a fresh lock-on skips it — unless it is the
//! only candidate around.

use bevy::{ecs::system::SystemParam, math::Vec3Swizzles, prelude::*};

use crate::common::{
    components::{targetable::Targetable, PlayerControlled},
    message::*,
    plugins::nntree::NNTree,
    resources::TargetingConfig,
    systems::{
        interp::{smooth, smooth_angle, smooth_vec3, wrap_angle, yaw_of},
        targeting::{select_directional, select_nearest, Candidate},
    },
};
use crate::player::components::{
    lock_on::{LockOn, LockOnPhase},
    view_rig::ViewRig,
};

#[derive(SystemParam)]
pub struct IndicatorWriters<'w> {
    pub set: MessageWriter<'w, SetIndicatorTarget>,
    pub show: MessageWriter<'w, ShowIndicator>,
    pub hide: MessageWriter<'w, HideIndicator>,
}

/// Candidates around `center`, excluding the searching player. Validity is
/// re-checked against the live query, not just the index.
fn gather_candidates(
    nntree: &NNTree,
    targetables: &Query<(Entity, &Transform), With<Targetable>>,
    center: Vec3,
    radius: f32,
    searcher: Entity,
) -> Vec<Candidate> {
    nntree
        .within(center, radius)
        .into_iter()
        .filter(|&(ent, _)| ent != searcher)
        .filter_map(|(ent, _)| targetables.get(ent).ok())
        .map(|(ent, transform)| Candidate {
            ent,
            pos: transform.translation,
        })
        .collect()
}

/// Release the lock and start easing the view back: remember the released
/// target for the re-target cooldown and hide the indicator.
fn begin_cleanup(
    lock: &mut LockOn,
    released: Option<Entity>,
    config: &TargetingConfig,
    indicator: &mut IndicatorWriters,
) {
    lock.previous_target = released;
    lock.retarget_cooldown = config.retarget_cooldown;
    lock.phase = LockOnPhase::CleaningUp;
    indicator.hide.write(HideIndicator);
}

pub fn handle_input(
    mut reader: MessageReader<TargetingInput>,
    mut players: Query<(&Transform, &mut LockOn, &ViewRig), With<PlayerControlled>>,
    targetables: Query<(Entity, &Transform), With<Targetable>>,
    nntree: Res<NNTree>,
    config: Res<TargetingConfig>,
    mut indicator: IndicatorWriters,
) {
    for &TargetingInput { ent, action } in reader.read() {
        let Ok((transform, mut lock, rig)) = players.get_mut(ent) else { continue };

        match action {
            TargetingAction::Start => {
                if lock.phase != LockOnPhase::Idle {
                    continue;
                }

                // Search a sphere pushed ahead of the view so lock-on favors
                // what the player is looking at.
                let forward = rig.flat_forward();
                let half_radius = config.max_target_radius * 0.5;
                let candidates = gather_candidates(
                    &nntree,
                    &targetables,
                    transform.translation + forward * half_radius,
                    half_radius,
                    ent,
                );

                let excluded =
                    (lock.retarget_cooldown > 0.0).then_some(lock.previous_target).flatten();
                let mut found = select_nearest(&candidates, transform.translation, excluded);
                if found.is_none() && excluded.is_some() {
                    // The just-released target is the only thing in range:
                    // allow it back rather than finding nothing.
                    found = select_nearest(&candidates, transform.translation, None);
                }

                match found {
                    Some(target) => {
                        // Angle the locked view toward whichever side the
                        // camera already sits on.
                        let side = (*transform.right()).dot(rig.flat_forward());
                        lock.offset_rot = Vec2::new(config.initial_yaw_offset.copysign(side), 0.0);
                        lock.phase = LockOnPhase::Targeting { target };
                        debug!("{ent:?} locked onto {target:?}");
                        indicator.set.write(SetIndicatorTarget { target });
                        indicator.show.write(ShowIndicator {
                            mode: IndicatorMode::Locked,
                        });
                    }
                    None => {
                        debug!("{ent:?} found nothing to target; resetting camera");
                        lock.phase = LockOnPhase::CameraResetting {
                            target_yaw: yaw_of(*transform.forward()),
                        };
                    }
                }
            }
            TargetingAction::Stop => {
                if let LockOnPhase::Targeting { target } = lock.phase {
                    begin_cleanup(&mut lock, Some(target), &config, &mut indicator);
                }
                // Stop during CleaningUp/CameraResetting is an idempotent
                // no-op: the view is already headed for a rest pose.
            }
            TargetingAction::Switch { right } => {
                let LockOnPhase::Targeting { target } = lock.phase else { continue };
                let Ok((_, target_tf)) = targetables.get(target) else {
                    // Invalid mid-switch: the per-tick validity check owns
                    // the loss transition.
                    continue;
                };
                let origin = target_tf.translation;
                let candidates = gather_candidates(
                    &nntree,
                    &targetables,
                    transform.translation,
                    config.max_target_radius,
                    ent,
                );
                let new_target = select_directional(&candidates, origin, rig.right(), target, right);
                if new_target != target {
                    // Stay in Targeting; the offset rotation carries over,
                    // only the indicator restarts.
                    lock.phase = LockOnPhase::Targeting { target: new_target };
                    debug!("{ent:?} switched target to {new_target:?}");
                    indicator.set.write(SetIndicatorTarget { target: new_target });
                    indicator.show.write(ShowIndicator {
                        mode: IndicatorMode::Locked,
                    });
                }
            }
        }
    }
}

pub fn handle_look(
    mut reader: MessageReader<LookInput>,
    mut players: Query<(&mut LockOn, &mut ViewRig), With<PlayerControlled>>,
    config: Res<TargetingConfig>,
) {
    for &LookInput { ent, delta } in reader.read() {
        let Ok((mut lock, mut rig)) = players.get_mut(ent) else { continue };

        match lock.phase {
            LockOnPhase::Targeting { .. } => {
                // While locked, look input steers the offset around the
                // target instead of the raw view. Pitch inverted, and clamped
                // clear of the poles.
                lock.offset_rot.x += delta.x * config.look_sensitivity;
                lock.offset_rot.y = (lock.offset_rot.y - delta.y * config.look_sensitivity)
                    .clamp(-config.pitch_limit, config.pitch_limit);
            }
            LockOnPhase::CameraResetting { .. } => {
                if delta.length_squared() > config.look_cancel_deadzone_sq {
                    // The player is fighting the reset: let them have it.
                    lock.phase = LockOnPhase::Idle;
                }
            }
            LockOnPhase::Idle | LockOnPhase::CleaningUp => {
                rig.yaw = wrap_angle(rig.yaw + delta.x * config.look_sensitivity);
                rig.pitch = (rig.pitch - delta.y * config.look_sensitivity)
                    .clamp(-config.pitch_limit, config.pitch_limit);
            }
        }
    }
}

/// Per-frame step: frame the locked target, or converge whichever rest pose
/// is in progress. Also counts the re-target cooldown down.
pub fn tick(
    time: Res<Time>,
    config: Res<TargetingConfig>,
    mut players: Query<(Entity, &Transform, &mut LockOn, &mut ViewRig), With<PlayerControlled>>,
    targetables: Query<(&Transform, &Targetable)>,
    mut indicator: IndicatorWriters,
) {
    let dt = time.delta_secs();

    for (ent, transform, mut lock, mut rig) in &mut players {
        lock.retarget_cooldown = (lock.retarget_cooldown - dt).max(0.0);

        match lock.phase {
            LockOnPhase::Idle => {}
            LockOnPhase::Targeting { target } => {
                let Ok((target_tf, _)) = targetables.get(target) else {
                    debug!("{ent:?} lock-on target {target:?} is gone");
                    begin_cleanup(&mut lock, Some(target), &config, &mut indicator);
                    continue;
                };

                // Frame the midpoint between player and target; the arm backs
                // off with distance and breaks the lock past its maximum.
                let midpoint = (target_tf.translation - transform.translation) * 0.5;
                let desired_arm = config.default_arm_length + midpoint.xz().length();
                if desired_arm > config.max_arm_length() {
                    debug!("{ent:?} lock-on target {target:?} out of range");
                    begin_cleanup(&mut lock, Some(target), &config, &mut indicator);
                    continue;
                }

                rig.offset = smooth_vec3(rig.offset, midpoint, dt, config.offset_interp_speed);
                rig.arm_length = smooth(rig.arm_length, desired_arm, dt, config.arm_interp_speed);

                let player_yaw = yaw_of(*transform.forward());
                rig.yaw = smooth_angle(
                    rig.yaw,
                    player_yaw + lock.offset_rot.x,
                    dt,
                    config.rot_interp_speed,
                );
                let desired_pitch = (config.base_pitch + lock.offset_rot.y)
                    .clamp(-config.pitch_limit, config.pitch_limit);
                rig.pitch = smooth(rig.pitch, desired_pitch, dt, config.rot_interp_speed);
            }
            LockOnPhase::CleaningUp => {
                let default_offset = rig.default_offset;
                let default_arm = rig.default_arm_length;
                rig.offset = smooth_vec3(rig.offset, default_offset, dt, config.offset_interp_speed);
                rig.arm_length = smooth(rig.arm_length, default_arm, dt, config.arm_interp_speed);
                if rig.at_defaults(config.offset_epsilon) {
                    rig.offset = default_offset;
                    rig.arm_length = default_arm;
                    lock.phase = LockOnPhase::Idle;
                }
            }
            LockOnPhase::CameraResetting { target_yaw } => {
                rig.yaw = smooth_angle(rig.yaw, target_yaw, dt, config.rot_interp_speed);
                rig.pitch = smooth(rig.pitch, config.base_pitch, dt, config.rot_interp_speed);
                if wrap_angle(target_yaw - rig.yaw).abs() <= config.rot_epsilon {
                    rig.yaw = wrap_angle(target_yaw);
                    lock.phase = LockOnPhase::Idle;
                }
            }
        }
    }
}
