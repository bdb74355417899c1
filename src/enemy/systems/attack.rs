//! Attack action window.
//!
//! Stand-in for the animation layer: [`StartAttack`] opens a fixed-length
//! action window, and its expiry is reported back as [`AttackFinished`] —
//! the same begin/end contract an attack anim-notify would provide. Hitboxes
//! and damage live with the embedding game.

use bevy::prelude::*;

use crate::common::{message::*, resources::BehaviorConfig};

/// A swing in progress.
#[derive(Clone, Component, Copy, Debug)]
pub struct AttackTask {
    pub remaining: f32,
}

pub fn on_start_attack(
    mut commands: Commands,
    mut reader: MessageReader<StartAttack>,
    attackers: Query<Option<&AttackTask>, With<Transform>>,
    config: Res<BehaviorConfig>,
) {
    for &StartAttack { ent } in reader.read() {
        match attackers.get(ent) {
            Ok(None) => {
                commands.entity(ent).try_insert(AttackTask {
                    remaining: config.attack_duration,
                });
            }
            // A swing is already running; the trigger is fire-and-forget.
            Ok(Some(_)) => debug!("{ent:?} attack trigger while already attacking"),
            Err(_) => warn!("attack trigger for missing entity {ent:?}"),
        }
    }
}

pub fn advance(
    time: Res<Time>,
    mut commands: Commands,
    mut query: Query<(Entity, &mut AttackTask)>,
    mut finished: MessageWriter<AttackFinished>,
) {
    let dt = time.delta_secs();
    for (ent, mut task) in &mut query {
        task.remaining -= dt;
        if task.remaining <= 0.0 {
            commands.entity(ent).remove::<AttackTask>();
            finished.write(AttackFinished { ent });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Default, Resource)]
    struct Finished(Vec<AttackFinished>);

    fn collect(mut reader: MessageReader<AttackFinished>, mut out: ResMut<Finished>) {
        out.0.extend(reader.read().copied());
    }

    fn test_app() -> App {
        let mut app = App::new();
        app.add_message::<StartAttack>()
            .add_message::<AttackFinished>()
            .init_resource::<Time>()
            .init_resource::<BehaviorConfig>()
            .init_resource::<Finished>()
            .add_systems(Update, (on_start_attack, advance, collect).chain());
        app
    }

    fn step(app: &mut App, secs: f32) {
        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_secs_f32(secs));
        app.update();
    }

    #[test]
    fn finishes_after_the_action_window() {
        let mut app = test_app();
        let ent = app.world_mut().spawn(Transform::default()).id();
        app.world_mut().write_message(StartAttack { ent });

        step(&mut app, 0.5);
        assert!(app.world().resource::<Finished>().0.is_empty(), "window still open");

        step(&mut app, 0.6);
        let done = &app.world().resource::<Finished>().0;
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].ent, ent);
        assert!(app.world().entity(ent).get::<AttackTask>().is_none());
    }

    #[test]
    fn retrigger_during_a_swing_does_not_extend_it() {
        let mut app = test_app();
        let ent = app.world_mut().spawn(Transform::default()).id();
        app.world_mut().write_message(StartAttack { ent });
        step(&mut app, 0.6);

        app.world_mut().write_message(StartAttack { ent });
        step(&mut app, 0.5);

        assert_eq!(
            app.world().resource::<Finished>().0.len(),
            1,
            "original window finishes on schedule"
        );
    }
}
