//! Sliding and rolling friction against the cloth.
//!
//! Each tick a moving ball receives two forces at its contact point, straight
//! below the centre:
//!
//! - kinetic friction opposing the velocity, weighted by how much the ball is
//!   still sliding, and
//! - static friction along the velocity (by default), weighted by how much the
//!   ball is already rolling.
//!
//! The blend factor is the sliding percentage: the share of the travel speed
//! that spin already carries at the contact point, clamped to `[0, 1]`. Spin
//! against the direction of travel counts as pure sliding.
//! Balls whose horizontal speed drops under the rest threshold are snapped to
//! exactly zero so floating-point noise cannot keep them creeping.

use glam::Vec3;

use crate::api::config::SimConfig;
use crate::core::state::{BodyStore, RigidBody};

#[derive(Debug, Clone)]
pub struct FrictionModel {
    kinetic_force: f32,
    static_force: f32,
    linear_rest_threshold: f32,
    angular_rest_threshold: f32,
    static_friction_sign: f32,
    static_torque_sign: f32,
}

impl FrictionModel {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            kinetic_force: config.kinetic_friction_force(),
            static_force: config.static_friction_force(),
            linear_rest_threshold: config.linear_rest_threshold,
            angular_rest_threshold: config.angular_rest_threshold,
            static_friction_sign: config.static_friction_sign,
            static_torque_sign: config.static_torque_sign,
        }
    }

    /// Accumulate friction forces and torques on every ball.
    /// Returns how many balls are at rest afterwards.
    pub fn apply(&self, store: &mut BodyStore) -> usize {
        let mut resting = 0;
        for i in 0..store.len() {
            let radius = store.spheres[i].radius;
            if self.apply_to(&mut store.bodies[i], radius) {
                resting += 1;
            }
        }
        resting
    }

    /// Returns `true` when the body was put (or already is) at rest.
    pub fn apply_to(&self, body: &mut RigidBody, radius: f32) -> bool {
        if body.is_immovable() {
            return true;
        }

        let v = body.velocity;
        if v.x.abs() <= self.linear_rest_threshold && v.z.abs() <= self.linear_rest_threshold {
            body.stop();
            return true;
        }

        if body.angular_velocity.length() <= self.angular_rest_threshold {
            body.angular_velocity = Vec3::ZERO;
        }

        let speed = v.length();
        if speed <= f32::EPSILON {
            body.stop();
            return true;
        }
        let direction = v / speed;
        let contact = Vec3::new(0.0, -radius, 0.0);
        let sliding = self.sliding_percentage(body, contact, direction, speed);

        let kinetic = -direction * self.kinetic_force * (1.0 - sliding);
        body.add_force_at(kinetic, contact);

        let rolling = direction * self.static_force * sliding * self.static_friction_sign;
        body.forces += rolling;
        body.torques += contact.cross(rolling) * self.static_torque_sign;

        false
    }

    /// Backward surface speed at the contact from spin alone, as a fraction of
    /// the travel speed. 0 for a ball sliding without forward spin, 1 once it rolls.
    fn sliding_percentage(&self, body: &RigidBody, contact: Vec3, direction: Vec3, speed: f32) -> f32 {
        let surface = body.angular_velocity.cross(contact);
        (-surface.dot(direction) / speed).clamp(0.0, 1.0)
    }
}
