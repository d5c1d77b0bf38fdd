use glam::{Mat3, Mat4, Quat, Vec3};

use crate::api::types::{BodyHandle, ContactKind};

/// Placement of a body in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    /// Scale, then rotate, then translate. Column-major, as glam builds it.
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::from_position(Vec3::ZERO)
    }
}

/// Dynamics state of one body.
///
/// `forces` and `torques` are accumulators: written by the friction model,
/// consumed and cleared by the integrator within the same tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidBody {
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub forces: Vec3,
    pub torques: Vec3,
    pub inverse_mass: f32,
    /// Inverse inertia tensor in body space.
    pub inverse_inertia: Mat3,
}

impl RigidBody {
    /// A solid sphere of uniform density at rest.
    pub fn solid_sphere(mass: f32, radius: f32) -> Self {
        let (inverse_mass, inverse_inertia) = if mass > 0.0 && radius > 0.0 {
            let inertia = 0.4 * mass * radius * radius;
            (1.0 / mass, Mat3::from_diagonal(Vec3::splat(1.0 / inertia)))
        } else {
            (0.0, Mat3::ZERO)
        };
        Self {
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            forces: Vec3::ZERO,
            torques: Vec3::ZERO,
            inverse_mass,
            inverse_inertia,
        }
    }

    /// Whether the body ignores forces and impulses.
    pub fn is_immovable(&self) -> bool {
        self.inverse_mass == 0.0
    }

    pub fn mass(&self) -> f32 {
        if self.is_immovable() {
            f32::INFINITY
        } else {
            1.0 / self.inverse_mass
        }
    }

    /// Inverse inertia tensor rotated into world space: `R · J⁻¹ · Rᵀ`.
    pub fn world_inverse_inertia(&self, rotation: Quat) -> Mat3 {
        let r = Mat3::from_quat(rotation);
        r * self.inverse_inertia * r.transpose()
    }

    /// Add a force applied at `offset` from the centre of mass.
    pub fn add_force_at(&mut self, force: Vec3, offset: Vec3) {
        self.forces += force;
        self.torques += offset.cross(force);
    }

    pub fn clear_accumulators(&mut self) {
        self.forces = Vec3::ZERO;
        self.torques = Vec3::ZERO;
    }

    /// Snap to rest.
    pub fn stop(&mut self) {
        self.velocity = Vec3::ZERO;
        self.angular_velocity = Vec3::ZERO;
    }
}

/// Geometric proxy used by collision detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub origin: Vec3,
    pub radius: f32,
}

impl Sphere {
    pub fn new(origin: Vec3, radius: f32) -> Self {
        Self { origin, radius }
    }
}

/// Immovable boundary: the set of points `p` with `dot(normal, p) == distance`.
/// Normals point into the playing volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {
    /// Build a plane from any non-zero normal; it is normalised here.
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self {
            normal: normal.normalize_or_zero(),
            distance,
        }
    }

    /// Positive on the inward side.
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.distance
    }
}

/// One contact found by a detection pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collision {
    pub kind: ContactKind,
    /// Point of impact in world space.
    pub poi: Vec3,
    /// Time of impact within the tick in seconds; zero for overlap detection.
    pub t: f32,
    pub s0: usize,
    pub s1: usize,
}

/// Parallel arrays of transforms, dynamics and collision proxies.
///
/// Index `i` of every array is the same ball. Positions are only changed
/// through methods that move the transform and the sphere together.
#[derive(Debug, Clone, Default)]
pub struct BodyStore {
    pub(crate) transforms: Vec<Transform>,
    pub(crate) bodies: Vec<RigidBody>,
    pub(crate) spheres: Vec<Sphere>,
}

impl BodyStore {
    pub fn new() -> Self {
        Self::with_capacity(16)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            transforms: Vec::with_capacity(capacity),
            bodies: Vec::with_capacity(capacity),
            spheres: Vec::with_capacity(capacity),
        }
    }

    /// Add a ball. The sphere proxy is centred on the transform's position.
    pub fn spawn(&mut self, transform: Transform, body: RigidBody, radius: f32) -> BodyHandle {
        let handle = BodyHandle::from(self.transforms.len());
        self.spheres.push(Sphere::new(transform.position, radius));
        self.transforms.push(transform);
        self.bodies.push(body);
        handle
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        handle.index() < self.len()
    }

    /// Handles of every body, in index order.
    pub fn handles(&self) -> impl Iterator<Item = BodyHandle> {
        (0..self.len()).map(BodyHandle::from)
    }

    pub fn transform(&self, handle: BodyHandle) -> Option<&Transform> {
        self.transforms.get(handle.index())
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle.index())
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle.index())
    }

    pub fn sphere(&self, handle: BodyHandle) -> Option<&Sphere> {
        self.spheres.get(handle.index())
    }

    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }

    pub fn bodies(&self) -> &[RigidBody] {
        &self.bodies
    }

    pub fn spheres(&self) -> &[Sphere] {
        &self.spheres
    }

    /// Teleport a body, keeping its transform and sphere in step.
    pub fn set_position(&mut self, handle: BodyHandle, position: Vec3) -> bool {
        let i = handle.index();
        if i >= self.len() {
            return false;
        }
        self.transforms[i].position = position;
        self.spheres[i].origin = position;
        true
    }

    /// Shift body `i` by `delta`, keeping its transform and sphere in step.
    pub(crate) fn translate(&mut self, i: usize, delta: Vec3) {
        self.transforms[i].position += delta;
        self.spheres[i].origin = self.transforms[i].position;
    }

    /// Split borrow of body `i` for the integrator.
    pub(crate) fn parts_mut(&mut self, i: usize) -> (&mut Transform, &mut RigidBody, &mut Sphere) {
        (&mut self.transforms[i], &mut self.bodies[i], &mut self.spheres[i])
    }

    pub fn clear(&mut self) {
        self.transforms.clear();
        self.bodies.clear();
        self.spheres.clear();
    }
}
