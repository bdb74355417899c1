use bevy::prelude::*;

/// Adversary behavior states.
///
/// RoamIdle/ChaseIdle/Retreating are the timed states; everything else waits
/// on a collaborator callback (move completion, perception, attack finish).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum EnemyState {
    #[default]
    RoamIdle,
    Roaming,
    Chasing,
    ChaseIdle,
    Retreating,
    Attacking,
}

/// Per-adversary behavior state. Mutated only by the behavior controller
/// systems; collaborators see it exclusively through messages.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Behavior {
    pub state: EnemyState,
    /// Seconds remaining in the current timed state; meaningless elsewhere.
    pub timer: f32,
    /// The perceived target. Held through combat states, and through an
    /// in-flight attack even if sight is lost mid-swing.
    pub target: Option<Entity>,
    /// Id of the most recently issued movement request; completions carrying
    /// any other id are stale and ignored.
    pub move_request: u64,
}

impl Behavior {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_request(&mut self) -> u64 {
        self.move_request += 1;
        self.move_request
    }

    /// Anything past the roam loop counts as combat.
    pub fn in_combat(&self) -> bool {
        !matches!(self.state, EnemyState::RoamIdle | EnemyState::Roaming)
    }
}
