use glam::{Mat4, Vec3};

use crate::api::config::{CollisionSchedule, ConfigError, DetectorKind, SimConfig};
use crate::api::types::BodyHandle;
use crate::core::state::{BodyStore, Collision, Plane, RigidBody, Transform};
use crate::core::table;
use crate::core::time::FixedTimestep;
use crate::input::queue::{InputQueue, StrikeLatch};
use crate::physics::detection::{self, Detector};
use crate::physics::friction::FrictionModel;
use crate::physics::impulse::CueStrike;
use crate::physics::integrator::{self, Integrator};
use crate::physics::resolution::Resolver;
use crate::renderer::instance::{TransformBuffer, WorldTransform};

/// The billiards world: bodies, boundary planes and the per-frame pipeline
/// that advances them.
///
/// Each `step` runs friction and integration once per fixed tick, then detects
/// and resolves contacts. The swept detector looks ahead over the coming tick,
/// so with it contacts are resolved before integration instead. Under
/// `CollisionSchedule::AlternateFrames` the two halves run on alternating
/// frames.
pub struct Simulation {
    config: SimConfig,
    layout: Vec<Vec3>,
    store: BodyStore,
    planes: Vec<Plane>,
    contacts: Vec<Collision>,
    timestep: FixedTimestep,
    friction: FrictionModel,
    integrator: Box<dyn Integrator>,
    detector: Box<dyn Detector>,
    resolver: Resolver,
    cue: CueStrike,
    latch: StrikeLatch,
    frame_count: u64,
    tick_count: u64,
}

impl Simulation {
    /// A racked table: cue ball plus fifteen object balls.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        let layout = table::rack_layout(&config);
        Self::from_layout(config, &layout)
    }

    /// A world with one ball per position, all at rest. Index 0 is the ball
    /// driven by the cue.
    pub fn from_layout(config: SimConfig, layout: &[Vec3]) -> Result<Self, ConfigError> {
        config.validate()?;
        let planes = table::boundary_planes(&config);
        let mut sim = Self {
            layout: layout.to_vec(),
            store: BodyStore::with_capacity(layout.len()),
            contacts: Vec::with_capacity(layout.len()),
            timestep: FixedTimestep::new(config.tick_ms, config.max_frame_ms),
            friction: FrictionModel::from_config(&config),
            integrator: integrator::from_config(&config),
            detector: detection::from_config(&config),
            resolver: Resolver::from_config(&config),
            cue: CueStrike::from_config(&config),
            latch: StrikeLatch::new(),
            frame_count: 0,
            tick_count: 0,
            planes,
            config,
        };
        sim.spawn_layout();
        log::info!(
            "Simulation ready: {} bodies, {} planes, {} integrator, {} detector",
            sim.store.len(),
            sim.planes.len(),
            sim.integrator.name(),
            sim.detector.name()
        );
        Ok(sim)
    }

    fn spawn_layout(&mut self) {
        let radius = self.config.ball_radius;
        let mass = self.config.ball_mass;
        for &position in &self.layout {
            self.store.spawn(
                Transform::from_position(position),
                RigidBody::solid_sphere(mass, radius),
                radius,
            );
        }
    }

    /// Put every ball back where it started and forget all carried-over time.
    pub fn reset(&mut self) {
        self.store.clear();
        self.spawn_layout();
        self.contacts.clear();
        self.timestep.reset();
        self.latch.release_all();
        self.frame_count = 0;
        self.tick_count = 0;
        log::info!("Re-racked {} bodies", self.store.len());
    }

    // -- Stepping --

    /// Advance by one rendered frame of `elapsed_ms` milliseconds.
    /// Returns the number of fixed ticks integrated.
    pub fn step(&mut self, elapsed_ms: f32) -> u32 {
        let frame = self.frame_count;
        self.frame_count += 1;
        let dt = self.timestep.tick_seconds();

        match self.config.schedule {
            CollisionSchedule::EveryTick => {
                let ticks = self.timestep.accumulate(elapsed_ms);
                let look_ahead = self.config.detector == DetectorKind::Swept;
                for _ in 0..ticks {
                    if look_ahead {
                        self.collide(dt);
                        self.tick(dt);
                    } else {
                        self.tick(dt);
                        self.collide(dt);
                    }
                }
                ticks
            }
            CollisionSchedule::AlternateFrames => {
                if frame % 2 == 0 {
                    let ticks = self.timestep.accumulate(elapsed_ms);
                    for _ in 0..ticks {
                        self.tick(dt);
                    }
                    ticks
                } else {
                    self.collide(dt);
                    0
                }
            }
        }
    }

    fn tick(&mut self, dt: f32) {
        self.friction.apply(&mut self.store);
        self.integrator.integrate(&mut self.store, dt);
        self.tick_count += 1;
    }

    fn collide(&mut self, dt: f32) {
        self.detector.detect(&self.store, &self.planes, dt, &mut self.contacts);
        if self.contacts.is_empty() {
            return;
        }
        let report = self.resolver.resolve(&mut self.store, &self.planes, &mut self.contacts);
        log::trace!(
            "Resolved {} impulses, {} separations",
            report.impulses,
            report.separations
        );
    }

    // -- External input --

    /// Strike `handle` with the cue along `direction`. Returns whether the
    /// ball's velocity changed.
    pub fn apply_external_impulse(&mut self, handle: BodyHandle, direction: Vec3) -> bool {
        if !self.store.contains(handle) {
            log::warn!("Strike on unknown body {:?}", handle);
            return false;
        }
        self.cue.apply(&mut self.store, handle, direction).is_some()
    }

    /// Drain queued input. Returns `true` if a strike was applied to the cue ball.
    ///
    /// Aim updates are always taken; a strike while any ball is still moving
    /// is dropped.
    pub fn process_input(&mut self, input: &mut InputQueue) -> bool {
        let mut struck = false;
        for event in input.drain() {
            let Some(direction) = self.latch.feed(event) else {
                continue;
            };
            if !self.all_at_rest() {
                log::debug!("Strike ignored: balls still moving");
                continue;
            }
            struck |= self.apply_external_impulse(BodyHandle::CUE_BALL, direction);
        }
        struck
    }

    // -- Output --

    /// Column-major world matrix of one body.
    pub fn world_transform(&self, handle: BodyHandle) -> Option<Mat4> {
        self.store.transform(handle).map(Transform::world_matrix)
    }

    /// Overwrite `buffer` with one world matrix per body, in handle order.
    pub fn publish(&self, buffer: &mut TransformBuffer) {
        buffer.clear();
        for transform in self.store.transforms() {
            buffer.push(WorldTransform::from_mat4(transform.world_matrix()));
        }
    }

    // -- Queries --

    /// No ball has any linear or angular velocity.
    pub fn all_at_rest(&self) -> bool {
        self.store
            .bodies()
            .iter()
            .all(|b| b.velocity == Vec3::ZERO && b.angular_velocity == Vec3::ZERO)
    }

    /// Total translational plus rotational kinetic energy of movable bodies.
    pub fn kinetic_energy(&self) -> f32 {
        self.store
            .bodies()
            .iter()
            .zip(self.store.transforms())
            .filter(|(b, _)| !b.is_immovable())
            .map(|(b, t)| {
                let linear = 0.5 * b.mass() * b.velocity.length_squared();
                let inv_inertia = b.world_inverse_inertia(t.rotation);
                let angular = if inv_inertia.determinant().abs() > f32::EPSILON {
                    0.5 * b.angular_velocity.dot(inv_inertia.inverse() * b.angular_velocity)
                } else {
                    0.0
                };
                linear + angular
            })
            .sum()
    }

    /// Total linear momentum of movable bodies.
    pub fn momentum(&self) -> Vec3 {
        self.store
            .bodies()
            .iter()
            .filter(|b| !b.is_immovable())
            .map(|b| b.velocity * b.mass())
            .sum()
    }

    pub fn position(&self, handle: BodyHandle) -> Option<Vec3> {
        self.store.transform(handle).map(|t| t.position)
    }

    pub fn velocity(&self, handle: BodyHandle) -> Option<Vec3> {
        self.store.body(handle).map(|b| b.velocity)
    }

    pub fn angular_velocity(&self, handle: BodyHandle) -> Option<Vec3> {
        self.store.body(handle).map(|b| b.angular_velocity)
    }

    pub fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec3) -> bool {
        match self.store.body_mut(handle) {
            Some(body) => {
                body.velocity = velocity;
                true
            }
            None => {
                log::warn!("set_velocity on unknown body {:?}", handle);
                false
            }
        }
    }

    pub fn set_angular_velocity(&mut self, handle: BodyHandle, angular_velocity: Vec3) -> bool {
        match self.store.body_mut(handle) {
            Some(body) => {
                body.angular_velocity = angular_velocity;
                true
            }
            None => {
                log::warn!("set_angular_velocity on unknown body {:?}", handle);
                false
            }
        }
    }

    pub fn body_count(&self) -> usize {
        self.store.len()
    }

    pub fn handles(&self) -> impl Iterator<Item = BodyHandle> {
        self.store.handles()
    }

    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn store(&self) -> &BodyStore {
        &self.store
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}
