//! Per-tick integration of position, orientation, velocity and spin.
//!
//! Forces and torques are read from the body accumulators, held constant over
//! the step, and cleared afterwards. Every scheme finishes the same way: the
//! orientation is renormalised and the sphere proxy is moved onto the new
//! transform position.

use glam::{Quat, Vec3};

use crate::api::config::{IntegratorKind, SimConfig};
use crate::core::state::{BodyStore, RigidBody, Sphere, Transform};

/// A zero quaternion, used as the additive identity for orientation derivatives.
const ZERO_QUAT: Quat = Quat::from_xyzw(0.0, 0.0, 0.0, 0.0);

/// Numerical integration scheme for one fixed tick.
pub trait Integrator {
    fn name(&self) -> &str;

    /// Advance every movable body by `dt` seconds.
    fn integrate(&self, store: &mut BodyStore, dt: f32);
}

/// Build the scheme selected in the configuration.
pub fn from_config(config: &SimConfig) -> Box<dyn Integrator> {
    match config.integrator {
        IntegratorKind::SemiImplicitEuler => Box::new(SemiImplicitEuler),
        IntegratorKind::Rk4 => Box::new(Rk4::new(config.spin_y_damping)),
    }
}

/// Time derivative of an orientation spinning at `angular_velocity`.
///
/// Angular velocity is kept in the world frame (torques and the inverse
/// inertia are world-space too), so the pure quaternion multiplies from the
/// left: `dq/dt = 0.5 · (0, ω) ⊗ q`. A body-frame ω would use `q ⊗ (0, ω)`.
fn spin(orientation: Quat, angular_velocity: Vec3) -> Quat {
    let w = Quat::from_xyzw(angular_velocity.x, angular_velocity.y, angular_velocity.z, 0.0);
    (w * orientation) * 0.5
}

fn renormalize(q: Quat) -> Quat {
    if q.length_squared() > f32::EPSILON && q.is_finite() {
        q.normalize()
    } else {
        Quat::IDENTITY
    }
}

/// Linear and angular acceleration from the current accumulators.
fn accelerations(body: &RigidBody, orientation: Quat) -> (Vec3, Vec3) {
    let linear = body.forces * body.inverse_mass;
    let angular = body.world_inverse_inertia(orientation) * body.torques;
    (linear, angular)
}

fn finish(transform: &mut Transform, body: &mut RigidBody, sphere: &mut Sphere) {
    transform.rotation = renormalize(transform.rotation);
    sphere.origin = transform.position;
    body.clear_accumulators();
}

// ---------------------------------------------------------------------------
// Semi-implicit Euler
// ---------------------------------------------------------------------------

/// First-order scheme: velocities first, then positions from the new velocities.
#[derive(Debug, Clone, Copy, Default)]
pub struct SemiImplicitEuler;

impl Integrator for SemiImplicitEuler {
    fn name(&self) -> &str {
        "Semi-implicit Euler"
    }

    fn integrate(&self, store: &mut BodyStore, dt: f32) {
        for i in 0..store.len() {
            let (transform, body, sphere) = store.parts_mut(i);
            if !body.is_immovable() {
                let (acceleration, angular_acceleration) = accelerations(body, transform.rotation);
                body.angular_velocity += angular_acceleration * dt;
                body.velocity += acceleration * dt;
                transform.position += body.velocity * dt;
                transform.rotation = transform.rotation + spin(transform.rotation, body.angular_velocity) * dt;
            }
            finish(transform, body, sphere);
        }
    }
}

// ---------------------------------------------------------------------------
// RK4
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct State {
    position: Vec3,
    orientation: Quat,
    velocity: Vec3,
    angular_velocity: Vec3,
}

#[derive(Debug, Clone, Copy)]
struct Derivative {
    velocity: Vec3,
    spin: Quat,
    acceleration: Vec3,
    angular_acceleration: Vec3,
}

impl Derivative {
    const ZERO: Derivative = Derivative {
        velocity: Vec3::ZERO,
        spin: ZERO_QUAT,
        acceleration: Vec3::ZERO,
        angular_acceleration: Vec3::ZERO,
    };
}

/// Classical fourth-order Runge-Kutta.
///
/// Forces are not re-evaluated inside the step, so acceleration is the same
/// in all four samples; the gain over Euler is in position and orientation.
/// After each step the Y component of the spin is multiplied by
/// `spin_y_damping`. That is a stabiliser for the simplified torque model,
/// not a physical effect; set it to `1.0` to integrate pure physics.
#[derive(Debug, Clone, Copy)]
pub struct Rk4 {
    spin_y_damping: f32,
}

impl Rk4 {
    pub fn new(spin_y_damping: f32) -> Self {
        Self { spin_y_damping }
    }

    /// Sample the derivative at `initial` advanced by `previous * dt`.
    fn evaluate(
        initial: &State,
        dt: f32,
        previous: &Derivative,
        acceleration: Vec3,
        angular_acceleration: Vec3,
    ) -> Derivative {
        let state = State {
            position: initial.position + previous.velocity * dt,
            orientation: initial.orientation + previous.spin * dt,
            velocity: initial.velocity + previous.acceleration * dt,
            angular_velocity: initial.angular_velocity + previous.angular_acceleration * dt,
        };
        Derivative {
            velocity: state.velocity,
            spin: spin(state.orientation, state.angular_velocity),
            acceleration,
            angular_acceleration,
        }
    }

    fn step(initial: &State, dt: f32, acceleration: Vec3, angular_acceleration: Vec3) -> State {
        let k0 = Self::evaluate(initial, 0.0, &Derivative::ZERO, acceleration, angular_acceleration);
        let k1 = Self::evaluate(initial, dt * 0.5, &k0, acceleration, angular_acceleration);
        let k2 = Self::evaluate(initial, dt * 0.5, &k1, acceleration, angular_acceleration);
        let k3 = Self::evaluate(initial, dt, &k2, acceleration, angular_acceleration);

        let dt_6 = dt / 6.0;
        let velocity = k0.velocity + (k1.velocity + k2.velocity) * 2.0 + k3.velocity;
        let spin = k0.spin + (k1.spin + k2.spin) * 2.0 + k3.spin;
        let accel = k0.acceleration + (k1.acceleration + k2.acceleration) * 2.0 + k3.acceleration;
        let angular = k0.angular_acceleration
            + (k1.angular_acceleration + k2.angular_acceleration) * 2.0
            + k3.angular_acceleration;

        State {
            position: initial.position + velocity * dt_6,
            orientation: initial.orientation + spin * dt_6,
            velocity: initial.velocity + accel * dt_6,
            angular_velocity: initial.angular_velocity + angular * dt_6,
        }
    }
}

impl Integrator for Rk4 {
    fn name(&self) -> &str {
        "Runge-Kutta 4"
    }

    fn integrate(&self, store: &mut BodyStore, dt: f32) {
        for i in 0..store.len() {
            let (transform, body, sphere) = store.parts_mut(i);
            if !body.is_immovable() {
                let (acceleration, angular_acceleration) = accelerations(body, transform.rotation);
                let initial = State {
                    position: transform.position,
                    orientation: transform.rotation,
                    velocity: body.velocity,
                    angular_velocity: body.angular_velocity,
                };
                let next = Self::step(&initial, dt, acceleration, angular_acceleration);

                transform.position = next.position;
                transform.rotation = next.orientation;
                body.velocity = next.velocity;
                body.angular_velocity = next.angular_velocity;
                body.angular_velocity.y *= self.spin_y_damping;
            }
            finish(transform, body, sphere);
        }
    }
}
