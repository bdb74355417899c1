use bevy::prelude::*;

/// What the lock-on controller is currently doing. The phases are mutually
/// exclusive by construction: targeting, cleaning up the view, and resetting
/// the camera can never overlap.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum LockOnPhase {
    #[default]
    Idle,
    /// Locked onto an entity; the view frames player and target together.
    Targeting { target: Entity },
    /// Not targeting anymore, view offset/arm still easing back to defaults.
    CleaningUp,
    /// No target was found; the view is easing around to the captured facing.
    CameraResetting { target_yaw: f32 },
}

/// Lock-on targeting state, one per player.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct LockOn {
    pub phase: LockOnPhase,
    /// Cumulative look adjustment (yaw, pitch) layered on the locked view.
    pub offset_rot: Vec2,
    /// The target released most recently; only meaningful while the
    /// re-target cooldown is running.
    pub previous_target: Option<Entity>,
    /// Seconds left in which a fresh lock-on skips `previous_target`.
    pub retarget_cooldown: f32,
}

impl LockOn {
    pub fn is_targeting(&self) -> bool {
        matches!(self.phase, LockOnPhase::Targeting { .. })
    }

    pub fn target(&self) -> Option<Entity> {
        match self.phase {
            LockOnPhase::Targeting { target } => Some(target),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_idle_with_no_history() {
        let lock = LockOn::default();
        assert_eq!(lock.phase, LockOnPhase::Idle);
        assert!(!lock.is_targeting());
        assert!(lock.target().is_none());
        assert!(lock.previous_target.is_none());
    }

    #[test]
    fn target_is_only_reported_while_targeting() {
        let ent = Entity::from_raw_u32(7).unwrap();
        let mut lock = LockOn {
            phase: LockOnPhase::Targeting { target: ent },
            ..Default::default()
        };
        assert_eq!(lock.target(), Some(ent));

        lock.phase = LockOnPhase::CleaningUp;
        assert_eq!(lock.target(), None);
    }
}
