//! Every message crossing a collaborator boundary.
//!
//! The embedding game writes the player input messages and reads the
//! indicator messages; the movement/perception/attack collaborators and the
//! controllers talk to each other through the rest. All of them are buffered
//! and drained on the single simulation schedule — callbacks may therefore
//! arrive a frame after the state that requested them has been left, which is
//! why completions carry request ids and the handlers guard on current state.

use bevy::prelude::*;

// ---------------------------------------------------------------------------
// Player input
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TargetingAction {
    Start,
    Stop,
    Switch { right: bool },
}

/// Lock-on input for one player entity.
#[derive(Message, Clone, Copy, Debug)]
pub struct TargetingInput {
    pub ent: Entity,
    pub action: TargetingAction,
}

/// Raw look stick/mouse delta. Routed into the view rig, the lock-on offset
/// rotation, or a camera-reset cancel depending on the current phase.
#[derive(Message, Clone, Copy, Debug)]
pub struct LookInput {
    pub ent: Entity,
    pub delta: Vec2,
}

// ---------------------------------------------------------------------------
// Movement collaborator
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MoveGoal {
    /// A fixed point in the world.
    Point(Vec3),
    /// Another actor; the executor re-resolves its position every tick.
    Actor(Entity),
}

/// Request to move an entity. A new request for an entity with a move already
/// in flight aborts the old one first.
#[derive(Message, Clone, Copy, Debug)]
pub struct MoveTo {
    pub ent: Entity,
    /// Monotonically increasing per entity; echoed back in [`MoveCompleted`]
    /// so the requester can discard completions for moves it has replaced.
    pub request: u64,
    pub goal: MoveGoal,
    /// Arrival is reported once within this distance of the goal.
    pub acceptance: f32,
}

#[derive(Message, Clone, Copy, Debug)]
pub struct StopMovement {
    pub ent: Entity,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MoveResult {
    Succeeded,
    Aborted,
}

#[derive(Message, Clone, Copy, Debug)]
pub struct MoveCompleted {
    pub ent: Entity,
    pub request: u64,
    pub result: MoveResult,
}

#[derive(Message, Clone, Copy, Debug)]
pub struct SetMoveProfile {
    pub ent: Entity,
    pub profile: crate::common::components::move_profile::MoveProfile,
}

// ---------------------------------------------------------------------------
// Perception and attack collaborators
// ---------------------------------------------------------------------------

/// Sight acquired/lost notification for one adversary, already filtered to
/// the opposing faction by the sensing layer.
#[derive(Message, Clone, Copy, Debug)]
pub struct PerceptionChanged {
    pub ent: Entity,
    pub actor: Entity,
    pub acquired: bool,
}

/// Fire-and-forget attack trigger; the action window is owned by the attack
/// collaborator, which answers with [`AttackFinished`].
#[derive(Message, Clone, Copy, Debug)]
pub struct StartAttack {
    pub ent: Entity,
}

#[derive(Message, Clone, Copy, Debug)]
pub struct AttackFinished {
    pub ent: Entity,
}

// ---------------------------------------------------------------------------
// Visual indicator collaborator
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum IndicatorMode {
    /// Locked-on style: full size, bobbing above the target.
    #[default]
    Locked,
    /// Dimmed hint style for a not-yet-locked candidate.
    Hint,
}

#[derive(Message, Clone, Copy, Debug)]
pub struct SetIndicatorTarget {
    pub target: Entity,
}

#[derive(Message, Clone, Copy, Debug)]
pub struct ShowIndicator {
    pub mode: IndicatorMode,
}

#[derive(Message, Clone, Copy, Debug)]
pub struct HideIndicator;
