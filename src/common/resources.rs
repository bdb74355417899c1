//! Tunable configuration and the shared simulation RNG.
//!
//! Both config resources are plain data with serde derives so the embedding
//! game can load them from its settings; the defaults reproduce the shipped
//! tuning.

use std::f32::consts::TAU;

use bevy::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Player-side targeting and view framing tuning.
#[derive(Clone, Debug, Deserialize, Resource, Serialize)]
pub struct TargetingConfig {
    /// Maximum distance at which an entity can be locked on.
    pub max_target_radius: f32,
    /// Spring-arm length when not targeting.
    pub default_arm_length: f32,
    /// View anchor offset from the player when not targeting.
    pub default_offset: Vec3,
    /// Resting view pitch (radians, negative looks down).
    pub base_pitch: f32,
    /// Yaw offset applied on lock-on, signed by which side the camera sits.
    pub initial_yaw_offset: f32,
    /// Radians of rotation per unit of look input.
    pub look_sensitivity: f32,
    /// Pitch is clamped to ±this to stay clear of the poles.
    pub pitch_limit: f32,
    /// Look input with squared magnitude above this cancels a camera reset.
    pub look_cancel_deadzone_sq: f32,
    pub offset_interp_speed: f32,
    pub arm_interp_speed: f32,
    pub rot_interp_speed: f32,
    /// Cleanup counts as converged within this distance/length of defaults.
    pub offset_epsilon: f32,
    /// Camera reset counts as converged within this angle (radians).
    pub rot_epsilon: f32,
    /// Window after releasing a target during which it is skipped by a fresh
    /// nearest-target search (unless it is the only candidate).
    pub retarget_cooldown: f32,
}

impl TargetingConfig {
    /// Arm length at which a locked target counts as out of range.
    pub fn max_arm_length(&self) -> f32 {
        self.default_arm_length + self.max_target_radius * 0.5
    }
}

impl Default for TargetingConfig {
    fn default() -> Self {
        Self {
            max_target_radius: 1000.0,
            default_arm_length: 500.0,
            default_offset: Vec3::ZERO,
            base_pitch: (-15.0_f32).to_radians(),
            initial_yaw_offset: 30.0_f32.to_radians(),
            look_sensitivity: 1.5_f32.to_radians(),
            pitch_limit: 89.0_f32.to_radians(),
            look_cancel_deadzone_sq: 0.02,
            offset_interp_speed: 5.0,
            arm_interp_speed: 5.0,
            rot_interp_speed: 8.0,
            offset_epsilon: 1.0,
            rot_epsilon: 0.5_f32.to_radians(),
            retarget_cooldown: 0.5,
        }
    }
}

/// Adversary behavior tuning.
#[derive(Clone, Debug, Deserialize, Resource, Serialize)]
pub struct BehaviorConfig {
    /// Radius around the current position roam destinations are sampled from.
    pub roam_radius: f32,
    /// Base wait before the next roam leg.
    pub roam_wait: f32,
    /// Base wait before re-engaging after a retreat.
    pub chase_wait: f32,
    /// Wait timers sample uniformly from base ± this.
    pub wait_jitter: f32,
    /// Retreating gives up and rests after this long even short of distance.
    pub max_retreat_time: f32,
    /// Distance a retreating enemy tries to put between itself and the target.
    pub retreat_distance: f32,
    /// Chase moves complete within this distance of the target.
    pub chase_acceptance: f32,
    pub roam_acceptance: f32,
    pub retreat_acceptance: f32,
    pub sight_radius: f32,
    pub lose_sight_radius: f32,
    /// Half-angle of the vision cone (radians).
    pub peripheral_half_angle: f32,
    /// Seconds an unseen target is remembered before sight counts as lost.
    pub sight_max_age: f32,
    /// Length of the attack action window.
    pub attack_duration: f32,
    pub roaming_speed: f32,
    pub chasing_speed: f32,
    pub retreating_speed: f32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            roam_radius: 5000.0,
            roam_wait: 2.0,
            chase_wait: 1.5,
            wait_jitter: 0.5,
            max_retreat_time: 6.0,
            retreat_distance: 800.0,
            chase_acceptance: 100.0,
            roam_acceptance: 50.0,
            retreat_acceptance: 50.0,
            sight_radius: 2000.0,
            lose_sight_radius: 2500.0,
            peripheral_half_angle: 90.0_f32.to_radians(),
            sight_max_age: 2.0,
            attack_duration: 1.0,
            roaming_speed: 450.0,
            chasing_speed: 670.0,
            retreating_speed: 350.0,
        }
    }
}

/// Walkable region for roam destination sampling. Stands in for the
/// navigation system's reachability query: a destination is reachable when it
/// falls inside the bounds.
#[derive(Clone, Copy, Debug, Deserialize, Resource, Serialize)]
pub struct NavBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl NavBounds {
    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.z >= self.min.y && p.z <= self.max.y
    }

    /// Uniform random point in the disc around `center`, rejected against the
    /// bounds. `None` after a handful of failed draws; callers treat that as
    /// a no-op and wait for the next timer.
    pub fn random_reachable_point(
        &self,
        rng: &mut SimRng,
        center: Vec3,
        radius: f32,
    ) -> Option<Vec3> {
        for _ in 0..8 {
            let r = radius * rng.0.random_range(0.0_f32..=1.0).sqrt();
            let theta = rng.0.random_range(0.0_f32..TAU);
            let p = center + Vec3::new(r * theta.cos(), 0.0, r * theta.sin());
            if self.contains(p) {
                return Some(p);
            }
        }
        None
    }
}

impl Default for NavBounds {
    fn default() -> Self {
        Self {
            min: Vec2::splat(-10_000.0),
            max: Vec2::splat(10_000.0),
        }
    }
}

/// Seeded RNG behind every random draw in the core, so tests can pin a seed
/// and replay behavior deterministically.
#[derive(Resource)]
pub struct SimRng(pub StdRng);

impl SimRng {
    pub fn from_seed(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }

    /// Uniform sample from `base ± jitter`, floored at zero.
    pub fn sample_wait(&mut self, base: f32, jitter: f32) -> f32 {
        self.0.random_range((base - jitter).max(0.0)..=base + jitter)
    }
}

impl Default for SimRng {
    fn default() -> Self {
        Self::from_seed(0xA11CE)
    }
}
