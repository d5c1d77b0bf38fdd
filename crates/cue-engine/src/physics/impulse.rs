//! Cue strike: a one-shot impulse from an external striker.

use glam::Vec3;

use crate::api::config::SimConfig;
use crate::api::types::BodyHandle;
use crate::core::state::BodyStore;
use crate::physics::resolution::impulse_magnitude;

/// The cue tip modelled as a body moving at a fixed speed along the strike
/// direction. Only linear velocity changes; no spin is imparted at the tip.
#[derive(Debug, Clone)]
pub struct CueStrike {
    speed: f32,
    inverse_mass: f32,
    restitution: f32,
}

/// Result of a strike.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrikeOutcome {
    /// Where the tip met the ball surface.
    pub poi: Vec3,
    /// Ball velocity after the strike.
    pub velocity: Vec3,
}

impl CueStrike {
    pub fn new(speed: f32, inverse_mass: f32, restitution: f32) -> Self {
        Self {
            speed,
            inverse_mass,
            restitution,
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.cue_speed, config.cue_inverse_mass, config.restitution_ball_ball)
    }

    /// Hit `handle` moving toward `direction`. Returns `None` when the
    /// direction is degenerate, the handle is unknown, or the ball is already
    /// outrunning the cue.
    pub fn apply(&self, store: &mut BodyStore, handle: BodyHandle, direction: Vec3) -> Option<StrikeOutcome> {
        let d = direction.normalize_or_zero();
        if d == Vec3::ZERO {
            log::warn!("Ignoring strike on {:?} with zero direction", handle);
            return None;
        }
        let origin = store.sphere(handle)?.origin;
        let radius = store.sphere(handle)?.radius;
        let body = store.body_mut(handle)?;

        let poi = origin - d * radius;
        let cue_velocity = d * self.speed;
        let closing = (cue_velocity - body.velocity).dot(d);
        if closing <= 0.0 {
            log::debug!("Strike on {:?} missed: ball already moving away", handle);
            return None;
        }

        let k = impulse_magnitude(self.restitution, closing, body.inverse_mass + self.inverse_mass)?;
        body.velocity += d * k * body.inverse_mass;
        log::debug!(
            "Strike on {:?} along {:?}: velocity now {:?}",
            handle,
            d,
            body.velocity
        );
        Some(StrikeOutcome {
            poi,
            velocity: body.velocity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::{RigidBody, Transform};

    fn one_ball() -> BodyStore {
        let mut store = BodyStore::new();
        store.spawn(
            Transform::from_position(Vec3::new(0.0, 0.1, 0.0)),
            RigidBody::solid_sphere(0.5, 0.1),
            0.1,
        );
        store
    }

    #[test]
    fn heavy_cue_launches_at_one_plus_e_times_speed() {
        let mut store = one_ball();
        let cue = CueStrike::new(2.0, 0.0, 0.5);
        let outcome = cue.apply(&mut store, BodyHandle(0), Vec3::new(3.0, 0.0, 0.0)).unwrap();
        assert!(outcome.velocity.abs_diff_eq(Vec3::new(3.0, 0.0, 0.0), 1e-5), "{:?}", outcome.velocity);
        assert!(outcome.poi.abs_diff_eq(Vec3::new(-0.1, 0.1, 0.0), 1e-6));
    }

    #[test]
    fn equal_mass_elastic_cue_transfers_its_speed() {
        let mut store = one_ball();
        // Cue as heavy as the ball
        let cue = CueStrike::new(2.0, 2.0, 1.0);
        let outcome = cue.apply(&mut store, BodyHandle(0), Vec3::Z).unwrap();
        assert!(outcome.velocity.abs_diff_eq(Vec3::new(0.0, 0.0, 2.0), 1e-5));
    }

    #[test]
    fn strike_leaves_spin_untouched() {
        let mut store = one_ball();
        CueStrike::new(2.0, 0.0, 1.0).apply(&mut store, BodyHandle(0), Vec3::X);
        assert_eq!(store.bodies()[0].angular_velocity, Vec3::ZERO);
    }

    #[test]
    fn zero_direction_and_unknown_ball_are_ignored() {
        let mut store = one_ball();
        let cue = CueStrike::new(2.0, 0.0, 1.0);
        assert!(cue.apply(&mut store, BodyHandle(0), Vec3::ZERO).is_none());
        assert!(cue.apply(&mut store, BodyHandle(5), Vec3::X).is_none());
        assert_eq!(store.bodies()[0].velocity, Vec3::ZERO);
    }

    #[test]
    fn ball_outrunning_cue_is_not_hit() {
        let mut store = one_ball();
        store.body_mut(BodyHandle(0)).unwrap().velocity = Vec3::X * 5.0;
        assert!(CueStrike::new(2.0, 0.0, 1.0).apply(&mut store, BodyHandle(0), Vec3::X).is_none());
        assert_eq!(store.bodies()[0].velocity, Vec3::X * 5.0);
    }
}
