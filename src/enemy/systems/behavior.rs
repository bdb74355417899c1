//! Adversary behavior controller.
//!
//! A timed, perception-driven state machine per enemy:
//!
//! - **RoamIdle** waits, then picks a random reachable point and **Roams** to it
//! - a perceived target interrupts the roam loop into **Chasing**
//! - reaching the target chains **Attacking** → **Retreating** → **ChaseIdle**
//!   → back to Chasing until sight is lost
//! - losing sight resets to RoamIdle from anywhere — except mid-attack, where
//!   the swing is allowed to finish and the enemy still retreats afterwards
//!
//! All waiting is timer decrements across ticks; collaborator callbacks
//! (move completion, attack finish) arrive as messages and are guarded
//! against staleness by request ids and current-state checks.

use bevy::{ecs::system::SystemParam, math::Vec3Swizzles, prelude::*};

use crate::common::{
    components::{move_profile::*, Focus},
    message::*,
    resources::{BehaviorConfig, NavBounds, SimRng},
};
use crate::enemy::components::behavior::{Behavior, EnemyState};

/// Everything a state transition may touch, bundled so the entry actions can
/// live in one place instead of being smeared across systems.
#[derive(SystemParam)]
pub struct BehaviorCtx<'w, 's> {
    pub commands: Commands<'w, 's>,
    pub config: Res<'w, BehaviorConfig>,
    pub nav: Res<'w, NavBounds>,
    pub rng: ResMut<'w, SimRng>,
    pub moves: MessageWriter<'w, MoveTo>,
    pub stops: MessageWriter<'w, StopMovement>,
    pub profiles: MessageWriter<'w, SetMoveProfile>,
    pub attacks: MessageWriter<'w, StartAttack>,
    pub targets: Query<'w, 's, &'static Transform, Without<Behavior>>,
}

fn issue_move(
    ent: Entity,
    behavior: &mut Behavior,
    goal: MoveGoal,
    acceptance: f32,
    moves: &mut MessageWriter<MoveTo>,
) {
    let request = behavior.next_request();
    moves.write(MoveTo {
        ent,
        request,
        goal,
        acceptance,
    });
}

/// Point `retreat_distance` past the enemy along the target→enemy direction,
/// flattened to the horizontal plane. `None` when the two overlap exactly.
fn retreat_goal(config: &BehaviorConfig, enemy_pos: Vec3, target_pos: Vec3) -> Option<Vec3> {
    let away = (enemy_pos - target_pos).xz();
    let dir = away.try_normalize()?;
    Some(Vec3::new(
        target_pos.x + dir.x * config.retreat_distance,
        enemy_pos.y,
        target_pos.z + dir.y * config.retreat_distance,
    ))
}

/// Enter `new_state` and run its entry action.
fn switch_state(
    ent: Entity,
    behavior: &mut Behavior,
    transform: &Transform,
    new_state: EnemyState,
    ctx: &mut BehaviorCtx,
) {
    behavior.state = new_state;
    debug!("{ent:?} enters {new_state:?}");

    match new_state {
        EnemyState::RoamIdle => {
            behavior.timer = ctx.rng.sample_wait(ctx.config.roam_wait, ctx.config.wait_jitter);
        }
        EnemyState::Roaming => {
            match ctx
                .nav
                .random_reachable_point(&mut ctx.rng, transform.translation, ctx.config.roam_radius)
            {
                Some(point) => issue_move(
                    ent,
                    behavior,
                    MoveGoal::Point(point),
                    ctx.config.roam_acceptance,
                    &mut ctx.moves,
                ),
                // Holds in Roaming until perception interrupts; there is
                // nothing useful to walk to.
                None => warn!("{ent:?} found no reachable roam point"),
            }
        }
        EnemyState::Chasing => {
            ctx.profiles.write(SetMoveProfile {
                ent,
                profile: MoveProfile::new(ctx.config.chasing_speed, OrientMode::Movement),
            });
            ctx.commands.entity(ent).remove::<Focus>();
            let Some(target) = behavior.target else {
                warn!("{ent:?} entered Chasing with no target");
                return;
            };
            issue_move(
                ent,
                behavior,
                MoveGoal::Actor(target),
                ctx.config.chase_acceptance,
                &mut ctx.moves,
            );
        }
        EnemyState::ChaseIdle => {
            behavior.timer = ctx.rng.sample_wait(ctx.config.chase_wait, ctx.config.wait_jitter);
        }
        EnemyState::Retreating => {
            ctx.profiles.write(SetMoveProfile {
                ent,
                profile: MoveProfile::new(ctx.config.retreating_speed, OrientMode::FocusTarget),
            });
            behavior.timer = ctx.config.max_retreat_time;
            let Some(target) = behavior.target else {
                warn!("{ent:?} entered Retreating with no target");
                return;
            };
            ctx.commands.entity(ent).insert(Focus(target));
            if let Ok(target_pos) = ctx.targets.get(target).map(|t| t.translation) {
                if let Some(goal) = retreat_goal(&ctx.config, transform.translation, target_pos) {
                    issue_move(
                        ent,
                        behavior,
                        MoveGoal::Point(goal),
                        ctx.config.retreat_acceptance,
                        &mut ctx.moves,
                    );
                }
            } else {
                warn!("{ent:?} cannot retreat from a missing target");
            }
        }
        EnemyState::Attacking => {
            ctx.attacks.write(StartAttack { ent });
        }
    }
}

/// Drop the target and fall back to the roam loop. Shared by the
/// perception-lost path and the stale-reference path.
fn lose_target(ent: Entity, behavior: &mut Behavior, transform: &Transform, ctx: &mut BehaviorCtx) {
    behavior.target = None;
    ctx.commands.entity(ent).remove::<Focus>();
    ctx.stops.write(StopMovement { ent });
    ctx.profiles.write(SetMoveProfile {
        ent,
        profile: MoveProfile::new(ctx.config.roaming_speed, OrientMode::Movement),
    });
    switch_state(ent, behavior, transform, EnemyState::RoamIdle, ctx);
}

/// Possession: freshly spawned adversaries start the roam loop.
pub fn init_spawned(
    mut query: Query<(Entity, &mut Behavior, &Transform), Added<Behavior>>,
    mut ctx: BehaviorCtx,
) {
    for (ent, mut behavior, transform) in &mut query {
        ctx.profiles.write(SetMoveProfile {
            ent,
            profile: MoveProfile::new(ctx.config.roaming_speed, OrientMode::Movement),
        });
        switch_state(ent, &mut behavior, transform, EnemyState::RoamIdle, &mut ctx);
    }
}

pub fn on_perception(
    mut reader: MessageReader<PerceptionChanged>,
    mut query: Query<(&mut Behavior, &Transform)>,
    mut ctx: BehaviorCtx,
) {
    for &PerceptionChanged { ent, actor, acquired } in reader.read() {
        let Ok((mut behavior, transform)) = query.get_mut(ent) else { continue };

        if acquired {
            debug!("{ent:?} spotted {actor:?}");
            behavior.target = Some(actor);
            if matches!(behavior.state, EnemyState::RoamIdle | EnemyState::Roaming) {
                switch_state(ent, &mut behavior, transform, EnemyState::Chasing, &mut ctx);
            }
        } else if behavior.state == EnemyState::Attacking {
            // The one asymmetry: a swing in flight is never interrupted, and
            // the post-attack transition still goes to Retreating.
            debug!("{ent:?} lost sight mid-attack; finishing the swing");
        } else {
            debug!("{ent:?} lost sight of {actor:?}");
            lose_target(ent, &mut behavior, transform, &mut ctx);
        }
    }
}

pub fn on_move_completed(
    mut reader: MessageReader<MoveCompleted>,
    mut query: Query<(&mut Behavior, &Transform)>,
    mut ctx: BehaviorCtx,
) {
    for &MoveCompleted { ent, request, result } in reader.read() {
        let Ok((mut behavior, transform)) = query.get_mut(ent) else { continue };

        if request != behavior.move_request {
            debug!("{ent:?} stale move completion {request} (current {})", behavior.move_request);
            continue;
        }
        // An aborted path is not an arrival.
        if result == MoveResult::Aborted {
            continue;
        }

        match behavior.state {
            EnemyState::Roaming => {
                switch_state(ent, &mut behavior, transform, EnemyState::RoamIdle, &mut ctx)
            }
            EnemyState::Chasing => {
                switch_state(ent, &mut behavior, transform, EnemyState::Attacking, &mut ctx)
            }
            EnemyState::Retreating => {
                switch_state(ent, &mut behavior, transform, EnemyState::ChaseIdle, &mut ctx)
            }
            other => debug!("{ent:?} move completed in {other:?}; ignored"),
        }
    }
}

pub fn on_attack_finished(
    mut reader: MessageReader<AttackFinished>,
    mut query: Query<(&mut Behavior, &Transform)>,
    mut ctx: BehaviorCtx,
) {
    for &AttackFinished { ent } in reader.read() {
        let Ok((mut behavior, transform)) = query.get_mut(ent) else { continue };

        // Guards the race where the state already left Attacking (e.g. the
        // target was destroyed mid-swing).
        if behavior.state != EnemyState::Attacking {
            debug!("{ent:?} attack finished in {:?}; ignored", behavior.state);
            continue;
        }
        switch_state(ent, &mut behavior, transform, EnemyState::Retreating, &mut ctx);
    }
}

/// Per-frame step: timed states count down, retreats re-aim at the moving
/// target, and every held target reference is re-validated first.
pub fn tick(
    time: Res<Time>,
    mut query: Query<(Entity, &mut Behavior, &Transform)>,
    mut ctx: BehaviorCtx,
) {
    let dt = time.delta_secs();

    for (ent, mut behavior, transform) in &mut query {
        if let Some(target) = behavior.target {
            if ctx.targets.get(target).is_err() {
                debug!("{ent:?} target {target:?} destroyed");
                lose_target(ent, &mut behavior, transform, &mut ctx);
                continue;
            }
        }

        match behavior.state {
            EnemyState::RoamIdle => {
                behavior.timer -= dt;
                if behavior.timer <= 0.0 {
                    switch_state(ent, &mut behavior, transform, EnemyState::Roaming, &mut ctx);
                }
            }
            EnemyState::ChaseIdle => {
                behavior.timer -= dt;
                if behavior.timer <= 0.0 {
                    switch_state(ent, &mut behavior, transform, EnemyState::Chasing, &mut ctx);
                }
            }
            EnemyState::Retreating => {
                behavior.timer -= dt;
                if behavior.timer <= 0.0 {
                    // Give up on distance: rest, then re-engage.
                    switch_state(ent, &mut behavior, transform, EnemyState::ChaseIdle, &mut ctx);
                } else if let Some(target) = behavior.target {
                    // The target may be moving; keep the retreat point fresh.
                    if let Ok(target_pos) = ctx.targets.get(target).map(|t| t.translation) {
                        if let Some(goal) =
                            retreat_goal(&ctx.config, transform.translation, target_pos)
                        {
                            issue_move(
                                ent,
                                &mut behavior,
                                MoveGoal::Point(goal),
                                ctx.config.retreat_acceptance,
                                &mut ctx.moves,
                            );
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::systems::movement::MoveTask;
    use crate::enemy::systems::attack::AttackTask;
    use crate::EnemyBehaviorPlugin;
    use std::time::Duration;

    fn test_app() -> App {
        let mut app = App::new();
        app.add_plugins(EnemyBehaviorPlugin);
        app.insert_resource(SimRng::from_seed(99));
        app
    }

    fn step(app: &mut App, secs: f32) {
        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_secs_f32(secs));
        app.update();
    }

    fn spawn_enemy(app: &mut App) -> Entity {
        app.world_mut()
            .spawn((Transform::default(), Behavior::new()))
            .id()
    }

    fn spawn_victim(app: &mut App, pos: Vec3) -> Entity {
        app.world_mut().spawn(Transform::from_translation(pos)).id()
    }

    fn behavior(app: &App, ent: Entity) -> Behavior {
        *app.world().entity(ent).get::<Behavior>().unwrap()
    }

    fn force_state(app: &mut App, ent: Entity, state: EnemyState, target: Option<Entity>, timer: f32) {
        let mut b = app.world_mut().entity_mut(ent);
        let mut b = b.get_mut::<Behavior>().unwrap();
        b.state = state;
        b.target = target;
        b.timer = timer;
    }

    #[test]
    fn spawns_into_roam_idle_with_jittered_wait() {
        let mut app = test_app();
        let ent = spawn_enemy(&mut app);
        step(&mut app, 0.01);

        let b = behavior(&app, ent);
        assert_eq!(b.state, EnemyState::RoamIdle);
        assert!(
            (1.4..=2.5).contains(&b.timer),
            "wait {} outside roam_wait ± jitter",
            b.timer
        );
    }

    #[test]
    fn roam_wait_expiry_starts_a_roam_leg() {
        let mut app = test_app();
        let ent = spawn_enemy(&mut app);
        step(&mut app, 0.01);
        step(&mut app, 3.0);

        assert_eq!(behavior(&app, ent).state, EnemyState::Roaming);
        assert!(
            app.world().entity(ent).get::<MoveTask>().is_some(),
            "roam leg should have an active move"
        );
    }

    #[test]
    fn roam_arrival_returns_to_roam_idle() {
        let mut app = test_app();
        let ent = spawn_enemy(&mut app);
        step(&mut app, 0.01);
        step(&mut app, 3.0);

        // Teleport onto the roam destination so the move completes.
        let task = *app.world().entity(ent).get::<MoveTask>().unwrap();
        let MoveGoal::Point(goal) = task.goal else {
            panic!("roam goal should be a point")
        };
        app.world_mut()
            .entity_mut(ent)
            .get_mut::<Transform>()
            .unwrap()
            .translation = goal;
        step(&mut app, 0.01); // executor reports arrival
        step(&mut app, 0.01); // controller consumes it

        let b = behavior(&app, ent);
        assert_eq!(b.state, EnemyState::RoamIdle);
        assert!(b.timer > 0.0, "fresh wait must be sampled");
    }

    #[test]
    fn aborted_move_completion_is_not_an_arrival() {
        // Scenario: roaming, the path gets aborted — the enemy stays Roaming.
        let mut app = test_app();
        let ent = spawn_enemy(&mut app);
        step(&mut app, 0.01);
        step(&mut app, 3.0);
        assert_eq!(behavior(&app, ent).state, EnemyState::Roaming);

        let request = behavior(&app, ent).move_request;
        app.world_mut().write_message(MoveCompleted {
            ent,
            request,
            result: MoveResult::Aborted,
        });
        step(&mut app, 0.01);

        assert_eq!(behavior(&app, ent).state, EnemyState::Roaming);
    }

    #[test]
    fn stale_move_completion_is_ignored() {
        let mut app = test_app();
        let ent = spawn_enemy(&mut app);
        let victim = spawn_victim(&mut app, Vec3::new(4000.0, 0.0, 0.0));
        step(&mut app, 0.01);
        force_state(&mut app, ent, EnemyState::Chasing, Some(victim), 0.0);

        app.world_mut().write_message(MoveCompleted {
            ent,
            request: 999,
            result: MoveResult::Succeeded,
        });
        step(&mut app, 0.01);

        assert_eq!(behavior(&app, ent).state, EnemyState::Chasing);
    }

    #[test]
    fn move_completion_outside_a_moving_state_is_ignored() {
        let mut app = test_app();
        let ent = spawn_enemy(&mut app);
        step(&mut app, 0.01);
        assert_eq!(behavior(&app, ent).state, EnemyState::RoamIdle);

        let request = behavior(&app, ent).move_request;
        app.world_mut().write_message(MoveCompleted {
            ent,
            request,
            result: MoveResult::Succeeded,
        });
        step(&mut app, 0.01);

        assert_eq!(behavior(&app, ent).state, EnemyState::RoamIdle);
    }

    #[test]
    fn perception_interrupts_roaming_into_chasing() {
        let mut app = test_app();
        let ent = spawn_enemy(&mut app);
        let victim = spawn_victim(&mut app, Vec3::new(1500.0, 0.0, 0.0));
        step(&mut app, 0.01);
        step(&mut app, 3.0);
        assert_eq!(behavior(&app, ent).state, EnemyState::Roaming);

        app.world_mut().write_message(PerceptionChanged {
            ent,
            actor: victim,
            acquired: true,
        });
        step(&mut app, 0.01);

        let b = behavior(&app, ent);
        assert_eq!(b.state, EnemyState::Chasing);
        assert_eq!(b.target, Some(victim));
        let profile = app.world().entity(ent).get::<MoveProfile>().unwrap();
        assert_eq!(profile.speed, 670.0, "chasing speed profile expected");
        let task = app.world().entity(ent).get::<MoveTask>().unwrap();
        assert!(matches!(task.goal, MoveGoal::Actor(a) if a == victim));
    }

    #[test]
    fn chase_completion_attacks_then_retreats_with_full_timer() {
        // Scenario: arrival at the target chains into Attacking, and the
        // attack-finished callback into Retreating with timer = max retreat.
        let mut app = test_app();
        let ent = spawn_enemy(&mut app);
        let victim = spawn_victim(&mut app, Vec3::new(50.0, 0.0, 0.0));
        step(&mut app, 0.01);

        app.world_mut().write_message(PerceptionChanged {
            ent,
            actor: victim,
            acquired: true,
        });
        step(&mut app, 0.01); // Chasing; executor completes instantly (within acceptance)
        step(&mut app, 0.01); // controller consumes the arrival

        assert_eq!(behavior(&app, ent).state, EnemyState::Attacking);
        assert!(
            app.world().entity(ent).get::<AttackTask>().is_some(),
            "attack action should be running"
        );

        // Let the attack action window elapse.
        for _ in 0..30 {
            step(&mut app, 0.05);
            if behavior(&app, ent).state == EnemyState::Retreating {
                break;
            }
        }

        let b = behavior(&app, ent);
        assert_eq!(b.state, EnemyState::Retreating);
        assert!(
            b.timer > 5.9,
            "retreat timer should start at max_retreat_time, was {}",
            b.timer
        );

        // The retreat move runs away from the victim along -X.
        let task = app.world().entity(ent).get::<MoveTask>().unwrap();
        let MoveGoal::Point(goal) = task.goal else {
            panic!("retreat goal should be a point")
        };
        assert!(goal.x < 0.0, "retreat goal {goal:?} should be away from the target");
    }

    #[test]
    fn sight_loss_resets_chasing_chase_idle_and_retreating() {
        for state in [EnemyState::Chasing, EnemyState::ChaseIdle, EnemyState::Retreating] {
            let mut app = test_app();
            let ent = spawn_enemy(&mut app);
            let victim = spawn_victim(&mut app, Vec3::new(900.0, 0.0, 0.0));
            step(&mut app, 0.01);
            force_state(&mut app, ent, state, Some(victim), 10.0);

            app.world_mut().write_message(PerceptionChanged {
                ent,
                actor: victim,
                acquired: false,
            });
            step(&mut app, 0.01);

            let b = behavior(&app, ent);
            assert_eq!(b.state, EnemyState::RoamIdle, "loss from {state:?}");
            assert_eq!(b.target, None, "loss from {state:?} must clear the target");
        }
    }

    #[test]
    fn sight_loss_mid_attack_finishes_the_swing_then_retreats() {
        let mut app = test_app();
        let ent = spawn_enemy(&mut app);
        let victim = spawn_victim(&mut app, Vec3::new(60.0, 0.0, 0.0));
        step(&mut app, 0.01);
        force_state(&mut app, ent, EnemyState::Attacking, Some(victim), 0.0);

        app.world_mut().write_message(PerceptionChanged {
            ent,
            actor: victim,
            acquired: false,
        });
        step(&mut app, 0.01);

        // Unchanged: the swing is in flight.
        let b = behavior(&app, ent);
        assert_eq!(b.state, EnemyState::Attacking);
        assert_eq!(b.target, Some(victim));

        app.world_mut().write_message(AttackFinished { ent });
        step(&mut app, 0.01);

        assert_eq!(behavior(&app, ent).state, EnemyState::Retreating);
    }

    #[test]
    fn retreat_timer_expiry_always_yields_chase_idle() {
        let mut app = test_app();
        // Push the retreat point out of walking range so the timer wins.
        app.insert_resource(BehaviorConfig {
            retreat_distance: 1.0e6,
            ..Default::default()
        });
        let ent = spawn_enemy(&mut app);
        let victim = spawn_victim(&mut app, Vec3::new(100.0, 0.0, 0.0));
        step(&mut app, 0.01);
        force_state(&mut app, ent, EnemyState::Retreating, Some(victim), 6.0);

        for _ in 0..14 {
            step(&mut app, 0.5);
            if behavior(&app, ent).state != EnemyState::Retreating {
                break;
            }
        }

        let b = behavior(&app, ent);
        assert_eq!(b.state, EnemyState::ChaseIdle);
        assert_eq!(b.target, Some(victim), "resting between engagements keeps the target");
    }

    #[test]
    fn reaching_the_retreat_point_also_yields_chase_idle() {
        let mut app = test_app();
        let ent = spawn_enemy(&mut app);
        let victim = spawn_victim(&mut app, Vec3::new(100.0, 0.0, 0.0));
        step(&mut app, 0.01);
        force_state(&mut app, ent, EnemyState::Retreating, Some(victim), 6.0);

        // Default tuning: 800 units at roaming-ish speed, well under 6 s.
        for _ in 0..40 {
            step(&mut app, 0.1);
            if behavior(&app, ent).state != EnemyState::Retreating {
                break;
            }
        }

        let b = behavior(&app, ent);
        assert_eq!(b.state, EnemyState::ChaseIdle);
        assert!(b.timer > 0.0);
    }

    #[test]
    fn chase_idle_expiry_re_engages() {
        let mut app = test_app();
        let ent = spawn_enemy(&mut app);
        let victim = spawn_victim(&mut app, Vec3::new(3000.0, 0.0, 0.0));
        step(&mut app, 0.01);
        force_state(&mut app, ent, EnemyState::ChaseIdle, Some(victim), 1.5);

        step(&mut app, 2.1);

        assert_eq!(behavior(&app, ent).state, EnemyState::Chasing);
    }

    #[test]
    fn acquire_during_chase_idle_only_refreshes_the_target() {
        let mut app = test_app();
        let ent = spawn_enemy(&mut app);
        let victim = spawn_victim(&mut app, Vec3::new(900.0, 0.0, 0.0));
        step(&mut app, 0.01);
        force_state(&mut app, ent, EnemyState::ChaseIdle, Some(victim), 10.0);

        app.world_mut().write_message(PerceptionChanged {
            ent,
            actor: victim,
            acquired: true,
        });
        step(&mut app, 0.01);

        assert_eq!(behavior(&app, ent).state, EnemyState::ChaseIdle);
    }

    #[test]
    fn destroyed_target_mid_attack_resets_and_discards_the_late_finish() {
        let mut app = test_app();
        let ent = spawn_enemy(&mut app);
        let victim = spawn_victim(&mut app, Vec3::new(60.0, 0.0, 0.0));
        step(&mut app, 0.01);
        force_state(&mut app, ent, EnemyState::Attacking, Some(victim), 0.0);

        app.world_mut().entity_mut(victim).despawn();
        step(&mut app, 0.01);

        let b = behavior(&app, ent);
        assert_eq!(b.state, EnemyState::RoamIdle, "no retreat anchor without a target");
        assert_eq!(b.target, None);

        // The attack callback straggles in afterwards; the guard drops it.
        app.world_mut().write_message(AttackFinished { ent });
        step(&mut app, 0.01);
        assert_eq!(behavior(&app, ent).state, EnemyState::RoamIdle);
    }

    #[test]
    fn retreat_goal_is_target_plus_distance_away_vector() {
        let config = BehaviorConfig::default();
        let goal = retreat_goal(
            &config,
            Vec3::new(100.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 0.0),
        )
        .unwrap();
        assert!((goal - Vec3::new(800.0, 0.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn retreat_goal_degenerates_to_none_when_overlapping() {
        let config = BehaviorConfig::default();
        assert!(retreat_goal(&config, Vec3::ZERO, Vec3::ZERO).is_none());
    }
}
