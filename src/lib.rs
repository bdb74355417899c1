//! Lock-on targeting and enemy behavior core.
//!
//! Everything here runs headless on the `Update` schedule: the embedding game
//! supplies windowing, input devices, rendering and animation, and talks to
//! this crate exclusively through the messages in [`common::message`].

pub mod common;
pub mod enemy;
pub mod player;

use bevy::prelude::*;

use common::{
    message::*,
    plugins::nntree::NNTreePlugin,
    resources::{BehaviorConfig, NavBounds, SimRng, TargetingConfig},
    systems::movement,
};
use player::systems::{camera, indicator, indicator::IndicatorState, lock_on};

/// Execution phases for one simulation step. Chained so that sensing output is
/// visible to the controllers in the same frame, and controller output to the
/// movement/attack executors in the same frame.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombatSet {
    /// Perception and spatial bookkeeping.
    Sense,
    /// Lock-on and behavior controllers.
    Decide,
    /// Movement, attack tasks, camera and indicator application.
    Act,
}

/// Player-side targeting: lock-on controller, view rig, targeting indicator.
///
/// Registers the spatial index plugin it queries targets through. Expects
/// the player entity to carry `(Transform, PlayerControlled, LockOn,
/// ViewRig)`, the camera to carry `ViewCamera`, and lockable entities to
/// carry `(Transform, Targetable)`.
pub struct LockOnPlugin;

impl Plugin for LockOnPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(NNTreePlugin)
            .add_message::<TargetingInput>()
            .add_message::<LookInput>()
            .add_message::<SetIndicatorTarget>()
            .add_message::<ShowIndicator>()
            .add_message::<HideIndicator>()
            .init_resource::<Time>()
            .init_resource::<TargetingConfig>()
            .init_resource::<IndicatorState>()
            .configure_sets(
                Update,
                (CombatSet::Sense, CombatSet::Decide, CombatSet::Act).chain(),
            )
            .add_systems(
                Update,
                (lock_on::handle_input, lock_on::handle_look, lock_on::tick)
                    .chain()
                    .in_set(CombatSet::Decide),
            )
            .add_systems(
                Update,
                (
                    camera::apply,
                    (indicator::apply_messages, indicator::follow_target).chain(),
                )
                    .in_set(CombatSet::Act),
            );
    }
}

/// Adversary-side simulation: behavior controllers plus the thin movement,
/// perception and attack collaborators they talk to.
///
/// Each adversary carries `(Transform, Behavior, SightMemory)`; the movement
/// executor adds its own task components as requests come in.
pub struct EnemyBehaviorPlugin;

impl Plugin for EnemyBehaviorPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<MoveTo>()
            .add_message::<StopMovement>()
            .add_message::<MoveCompleted>()
            .add_message::<SetMoveProfile>()
            .add_message::<PerceptionChanged>()
            .add_message::<StartAttack>()
            .add_message::<AttackFinished>()
            .init_resource::<Time>()
            .init_resource::<BehaviorConfig>()
            .init_resource::<NavBounds>()
            .init_resource::<SimRng>()
            .configure_sets(
                Update,
                (CombatSet::Sense, CombatSet::Decide, CombatSet::Act).chain(),
            )
            .add_systems(Update, enemy::systems::perception::sense.in_set(CombatSet::Sense))
            .add_systems(
                Update,
                (
                    enemy::systems::behavior::init_spawned,
                    enemy::systems::behavior::on_perception,
                    enemy::systems::behavior::on_move_completed,
                    enemy::systems::behavior::on_attack_finished,
                    enemy::systems::behavior::tick,
                )
                    .chain()
                    .in_set(CombatSet::Decide),
            )
            .add_systems(
                Update,
                (
                    (
                        movement::apply_profiles,
                        movement::apply_stops,
                        movement::apply_requests,
                        movement::advance,
                    )
                        .chain(),
                    (enemy::systems::attack::on_start_attack, enemy::systems::attack::advance)
                        .chain(),
                )
                    .in_set(CombatSet::Act),
            );
    }
}

/// The whole core: both sides plus the spatial index.
pub struct CombatCorePlugin;

impl Plugin for CombatCorePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((LockOnPlugin, EnemyBehaviorPlugin));
    }
}
