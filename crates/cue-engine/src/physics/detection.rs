//! All-pairs contact detection between balls and against the boundary planes.
//!
//! Contacts are appended in detection order: every sphere pair `(i, j)` with
//! `i < j` first, then every `(plane, sphere)` pair. No deduplication or
//! prioritisation happens here, so a ball touching two others yields two
//! independent records and resolution order follows this order.

use glam::Vec3;

use crate::api::config::{DetectorKind, SimConfig};
use crate::api::types::ContactKind;
use crate::core::state::{BodyStore, Collision, Plane, Sphere};

/// Below this, a relative speed is treated as zero.
const VELOCITY_EPSILON: f32 = 1e-9;

/// Contact detection strategy.
pub trait Detector {
    fn name(&self) -> &str;

    /// Append every contact found within a tick of `dt` seconds to `out`.
    fn detect(&self, store: &BodyStore, planes: &[Plane], dt: f32, out: &mut Vec<Collision>);
}

/// Build the strategy selected in the configuration.
pub fn from_config(config: &SimConfig) -> Box<dyn Detector> {
    match config.detector {
        DetectorKind::Discrete => Box::new(DiscreteDetector),
        DetectorKind::Swept => Box::new(SweptDetector),
    }
}

pub fn spheres_overlap(a: &Sphere, b: &Sphere) -> bool {
    let reach = a.radius + b.radius;
    a.origin.distance_squared(b.origin) <= reach * reach
}

pub fn plane_overlaps_sphere(plane: &Plane, sphere: &Sphere) -> bool {
    plane.signed_distance(sphere.origin).abs() <= sphere.radius
}

/// Earliest `t` in `[0, dt]` at which two spheres moving at constant
/// velocity touch. Already-overlapping spheres report `t = 0`.
pub fn sphere_sphere_toi(a: &Sphere, va: Vec3, b: &Sphere, vb: Vec3, dt: f32) -> Option<f32> {
    let p = b.origin - a.origin;
    let u = vb - va;
    let reach = a.radius + b.radius;

    let c = p.length_squared() - reach * reach;
    if c <= 0.0 {
        return Some(0.0);
    }
    let qa = u.length_squared();
    if qa < VELOCITY_EPSILON {
        return None;
    }
    let qb = 2.0 * p.dot(u);
    if qb >= 0.0 {
        // Moving apart
        return None;
    }
    let discriminant = qb * qb - 4.0 * qa * c;
    if discriminant < 0.0 {
        return None;
    }
    let t = (-qb - discriminant.sqrt()) / (2.0 * qa);
    (t >= 0.0 && t <= dt).then_some(t)
}

/// Earliest `t` in `[0, dt]` at which a sphere moving at `v` reaches the plane
/// from its inward side. Spheres already within a radius report `t = 0`.
pub fn plane_sphere_toi(plane: &Plane, sphere: &Sphere, v: Vec3, dt: f32) -> Option<f32> {
    let s = plane.signed_distance(sphere.origin);
    if s.abs() <= sphere.radius {
        return Some(0.0);
    }
    let vn = plane.normal.dot(v);
    if vn > -VELOCITY_EPSILON || s < 0.0 {
        return None;
    }
    let t = (s - sphere.radius) / -vn;
    (t <= dt).then_some(t)
}

fn sphere_contact(i: usize, j: usize, poi: Vec3, t: f32) -> Collision {
    Collision {
        kind: ContactKind::SphereSphere,
        poi,
        t,
        s0: i,
        s1: j,
    }
}

fn plane_contact(plane: usize, sphere: usize, poi: Vec3, t: f32) -> Collision {
    Collision {
        kind: ContactKind::PlaneSphere,
        poi,
        t,
        s0: plane,
        s1: sphere,
    }
}

// ---------------------------------------------------------------------------
// Discrete
// ---------------------------------------------------------------------------

/// Overlap tests on the current positions; every contact has `t = 0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscreteDetector;

impl Detector for DiscreteDetector {
    fn name(&self) -> &str {
        "Discrete"
    }

    fn detect(&self, store: &BodyStore, planes: &[Plane], _dt: f32, out: &mut Vec<Collision>) {
        let spheres = store.spheres();
        for i in 0..spheres.len() {
            for j in (i + 1)..spheres.len() {
                if spheres_overlap(&spheres[i], &spheres[j]) {
                    let poi = (spheres[i].origin + spheres[j].origin) * 0.5;
                    out.push(sphere_contact(i, j, poi, 0.0));
                }
            }
        }
        for (p, plane) in planes.iter().enumerate() {
            for (s, sphere) in spheres.iter().enumerate() {
                if plane_overlaps_sphere(plane, sphere) {
                    let poi = sphere.origin - plane.normal * sphere.radius;
                    out.push(plane_contact(p, s, poi, 0.0));
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Swept
// ---------------------------------------------------------------------------

/// Closed-form time of impact from relative velocity.
///
/// Catches contacts a discrete test would tunnel through, but reports only
/// the earliest contact per pair per tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct SweptDetector;

impl Detector for SweptDetector {
    fn name(&self) -> &str {
        "Swept"
    }

    fn detect(&self, store: &BodyStore, planes: &[Plane], dt: f32, out: &mut Vec<Collision>) {
        let spheres = store.spheres();
        let bodies = store.bodies();
        for i in 0..spheres.len() {
            for j in (i + 1)..spheres.len() {
                let (vi, vj) = (bodies[i].velocity, bodies[j].velocity);
                if let Some(t) = sphere_sphere_toi(&spheres[i], vi, &spheres[j], vj, dt) {
                    let poi = (spheres[i].origin + vi * t + spheres[j].origin + vj * t) * 0.5;
                    out.push(sphere_contact(i, j, poi, t));
                }
            }
        }
        for (p, plane) in planes.iter().enumerate() {
            for (s, sphere) in spheres.iter().enumerate() {
                let v = bodies[s].velocity;
                if let Some(t) = plane_sphere_toi(plane, sphere, v, dt) {
                    let poi = sphere.origin + v * t - plane.normal * sphere.radius;
                    out.push(plane_contact(p, s, poi, t));
                }
            }
        }
    }
}
