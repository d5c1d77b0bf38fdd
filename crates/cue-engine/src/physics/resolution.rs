//! Impulse-based contact resolution.
//!
//! For a contact with normal `n`, offsets `r` from each centre to the point of
//! impact and relative velocity `v_rel` at that point, the impulse magnitude is
//!
//! ```text
//!           (e + 1) · dot(v_rel, n)
//! k = ---------------------------------------------
//!     Σ inverse_mass + Σ dot((J⁻¹ · (r × n)) × r, n)
//! ```
//!
//! with `J⁻¹` the world-space inverse inertia tensor of each body. Contacts are
//! processed once each, in detection order, with no iteration: a ball with
//! several simultaneous contacts can end up over- or under-corrected.

use glam::{Mat3, Vec3};

use crate::api::config::SimConfig;
use crate::api::types::ContactKind;
use crate::core::state::{BodyStore, Collision, Plane, RigidBody};

/// Impulse denominators smaller than this are treated as degenerate.
const DENOMINATOR_EPSILON: f32 = 1e-9;

/// Centre distances smaller than this give no usable contact normal.
const NORMAL_EPSILON: f32 = 1e-6;

/// Angular contribution of one body to the impulse denominator.
pub(crate) fn angular_term(world_inverse_inertia: Mat3, r: Vec3, n: Vec3) -> f32 {
    (world_inverse_inertia * r.cross(n)).cross(r).dot(n)
}

/// Scalar impulse along the normal, or `None` for a degenerate denominator.
pub(crate) fn impulse_magnitude(restitution: f32, closing_speed: f32, denominator: f32) -> Option<f32> {
    if denominator.abs() < DENOMINATOR_EPSILON || !denominator.is_finite() {
        return None;
    }
    Some((restitution + 1.0) * closing_speed / denominator)
}

/// Velocity of the material point at offset `r` from the centre.
fn point_velocity(body: &RigidBody, r: Vec3) -> Vec3 {
    body.velocity + body.angular_velocity.cross(r)
}

/// Outcome of one resolution pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResolveReport {
    /// Contacts that received an impulse.
    pub impulses: usize,
    /// Sphere pairs pushed apart to remove overlap.
    pub separations: usize,
}

#[derive(Debug, Clone)]
pub struct Resolver {
    restitution_ball_ball: f32,
    restitution_ball_plane: f32,
}

impl Resolver {
    pub fn new(restitution_ball_ball: f32, restitution_ball_plane: f32) -> Self {
        Self {
            restitution_ball_ball,
            restitution_ball_plane,
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.restitution_ball_ball, config.restitution_ball_plane)
    }

    /// Resolve every contact, then empty the list for the next detection pass.
    pub fn resolve(
        &self,
        store: &mut BodyStore,
        planes: &[Plane],
        contacts: &mut Vec<Collision>,
    ) -> ResolveReport {
        let mut report = ResolveReport::default();
        for contact in contacts.iter() {
            match contact.kind {
                ContactKind::SphereSphere => self.resolve_spheres(store, contact, &mut report),
                ContactKind::PlaneSphere => match planes.get(contact.s0) {
                    Some(plane) => self.resolve_plane(store, plane, contact, &mut report),
                    None => log::warn!("Contact references missing plane {}", contact.s0),
                },
            }
        }
        contacts.clear();
        contacts.reserve(store.len());
        report
    }

    fn resolve_spheres(&self, store: &mut BodyStore, contact: &Collision, report: &mut ResolveReport) {
        let (i, j) = (contact.s0, contact.s1);
        if i == j || i >= store.len() || j >= store.len() {
            log::warn!("Skipping contact with invalid sphere pair ({}, {})", i, j);
            return;
        }

        let (bi, bj) = (store.bodies[i], store.bodies[j]);
        let (si, sj) = (store.spheres[i], store.spheres[j]);

        // Swept contacts are resolved at the configuration they touch in
        let oi = si.origin + bi.velocity * contact.t;
        let oj = sj.origin + bj.velocity * contact.t;
        let delta = oj - oi;
        let distance = delta.length();
        let n = if distance > NORMAL_EPSILON {
            delta / distance
        } else {
            log::warn!("Spheres {} and {} are concentric; separating along +X", i, j);
            Vec3::X
        };

        let ri = contact.poi - oi;
        let rj = contact.poi - oj;
        let closing = (point_velocity(&bi, ri) - point_velocity(&bj, rj)).dot(n);

        if closing > 0.0 {
            let ji = bi.world_inverse_inertia(store.transforms[i].rotation);
            let jj = bj.world_inverse_inertia(store.transforms[j].rotation);
            let denominator =
                bi.inverse_mass + bj.inverse_mass + angular_term(ji, ri, n) + angular_term(jj, rj, n);
            match impulse_magnitude(self.restitution_ball_ball, closing, denominator) {
                Some(k) => {
                    let impulse = n * k;
                    let a = &mut store.bodies[i];
                    a.velocity -= impulse * bi.inverse_mass;
                    a.angular_velocity -= ji * ri.cross(impulse);
                    let b = &mut store.bodies[j];
                    b.velocity += impulse * bj.inverse_mass;
                    b.angular_velocity += jj * rj.cross(impulse);
                    report.impulses += 1;
                    log::trace!("ball {} <-> ball {}: impulse {:.5}", i, j, k);
                }
                None => log::warn!("Degenerate impulse between balls {} and {}", i, j),
            }
        }

        // Remove remaining overlap, half from each ball
        let current = store.spheres[j].origin - store.spheres[i].origin;
        let penetration = si.radius + sj.radius - current.length();
        if penetration > 0.0 {
            let push = n * (penetration * 0.5);
            store.translate(i, -push);
            store.translate(j, push);
            report.separations += 1;
        }
    }

    fn resolve_plane(
        &self,
        store: &mut BodyStore,
        plane: &Plane,
        contact: &Collision,
        report: &mut ResolveReport,
    ) {
        let s = contact.s1;
        if s >= store.len() {
            log::warn!("Skipping plane contact with invalid sphere {}", s);
            return;
        }

        let body = store.bodies[s];
        let origin = store.spheres[s].origin + body.velocity * contact.t;
        let n = plane.normal;
        let r = contact.poi - origin;
        let closing = -point_velocity(&body, r).dot(n);
        if closing <= 0.0 {
            return;
        }

        let j = body.world_inverse_inertia(store.transforms[s].rotation);
        let denominator = body.inverse_mass + angular_term(j, r, n);
        match impulse_magnitude(self.restitution_ball_plane, closing, denominator) {
            Some(k) => {
                let impulse = n * k;
                let b = &mut store.bodies[s];
                b.velocity += impulse * body.inverse_mass;
                b.angular_velocity += j * r.cross(impulse);
                report.impulses += 1;
                log::trace!("plane {} -> ball {}: impulse {:.5}", contact.s0, s, k);
            }
            None => log::warn!("Degenerate impulse between plane {} and ball {}", contact.s0, s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::Transform;
    use crate::physics::detection::{Detector, DiscreteDetector, SweptDetector};

    const R: f32 = 0.105;

    fn two_balls(gap: f32, va: Vec3, vb: Vec3, mass: f32) -> BodyStore {
        let mut store = BodyStore::new();
        for (x, v) in [(-gap * 0.5, va), (gap * 0.5, vb)] {
            let h = store.spawn(
                Transform::from_position(Vec3::new(x, R, 0.0)),
                RigidBody::solid_sphere(mass, R),
                R,
            );
            store.body_mut(h).unwrap().velocity = v;
        }
        store
    }

    fn detect_and_resolve(store: &mut BodyStore, planes: &[Plane], resolver: &Resolver) -> ResolveReport {
        let mut contacts = Vec::new();
        DiscreteDetector.detect(store, planes, 0.0001, &mut contacts);
        let report = resolver.resolve(store, planes, &mut contacts);
        assert!(contacts.is_empty(), "contact list must be emptied");
        report
    }

    #[test]
    fn elastic_head_on_swaps_velocities() {
        let mut store = two_balls(2.0 * R, Vec3::X, Vec3::NEG_X, 1.0);
        let report = detect_and_resolve(&mut store, &[], &Resolver::new(1.0, 1.0));
        assert_eq!(report.impulses, 1);
        assert!(store.bodies[0].velocity.abs_diff_eq(Vec3::NEG_X, 1e-6), "{:?}", store.bodies[0].velocity);
        assert!(store.bodies[1].velocity.abs_diff_eq(Vec3::X, 1e-6), "{:?}", store.bodies[1].velocity);
        assert!(store.bodies[0].angular_velocity.abs_diff_eq(Vec3::ZERO, 1e-6));
    }

    #[test]
    fn momentum_is_conserved_for_unequal_masses() {
        let mut store = BodyStore::new();
        for (x, m, v) in [(-R, 2.0, Vec3::new(1.5, 0.0, 0.0)), (R * 0.9, 0.5, Vec3::new(-0.5, 0.0, 0.0))] {
            let h = store.spawn(Transform::from_position(Vec3::new(x, R, 0.0)), RigidBody::solid_sphere(m, R), R);
            store.body_mut(h).unwrap().velocity = v;
        }
        let before = store.bodies[0].velocity * 2.0 + store.bodies[1].velocity * 0.5;
        detect_and_resolve(&mut store, &[], &Resolver::new(0.8, 0.8));
        let after = store.bodies[0].velocity * 2.0 + store.bodies[1].velocity * 0.5;
        assert!(before.abs_diff_eq(after, 1e-5), "before {:?} after {:?}", before, after);
    }

    #[test]
    fn inelastic_contact_leaves_common_velocity() {
        let mut store = two_balls(2.0 * R, Vec3::X, Vec3::ZERO, 1.0);
        detect_and_resolve(&mut store, &[], &Resolver::new(0.0, 0.0));
        assert!(store.bodies[0].velocity.abs_diff_eq(Vec3::X * 0.5, 1e-6));
        assert!(store.bodies[1].velocity.abs_diff_eq(Vec3::X * 0.5, 1e-6));
    }

    #[test]
    fn separating_spheres_get_no_impulse_but_are_pushed_apart() {
        let mut store = two_balls(1.5 * R, Vec3::NEG_X, Vec3::X, 1.0);
        let report = detect_and_resolve(&mut store, &[], &Resolver::new(1.0, 1.0));
        assert_eq!(report.impulses, 0);
        assert_eq!(report.separations, 1);
        assert_eq!(store.bodies[0].velocity, Vec3::NEG_X);
        let d = store.spheres()[0].origin.distance(store.spheres()[1].origin);
        assert!(d >= 2.0 * R - 1e-5, "distance was {}", d);
    }

    #[test]
    fn overlap_is_removed_symmetrically_and_transforms_follow() {
        let mut store = two_balls(1.2 * R, Vec3::X, Vec3::NEG_X, 1.0);
        detect_and_resolve(&mut store, &[], &Resolver::new(1.0, 1.0));
        let (a, b) = (store.spheres()[0].origin, store.spheres()[1].origin);
        assert!((a.distance(b) - 2.0 * R).abs() < 1e-5);
        assert!((a.x + b.x).abs() < 1e-6, "correction should be symmetric");
        assert_eq!(store.transforms()[0].position, a);
        assert_eq!(store.transforms()[1].position, b);
    }

    #[test]
    fn concentric_spheres_are_separated() {
        let mut store = two_balls(0.0, Vec3::ZERO, Vec3::ZERO, 1.0);
        detect_and_resolve(&mut store, &[], &Resolver::new(1.0, 1.0));
        let d = store.spheres()[0].origin.distance(store.spheres()[1].origin);
        assert!((d - 2.0 * R).abs() < 1e-5, "distance was {}", d);
    }

    #[test]
    fn ball_bounces_off_cushion() {
        let mut store = BodyStore::new();
        let h = store.spawn(
            Transform::from_position(Vec3::new(1.0 - 0.9 * R, R, 0.0)),
            RigidBody::solid_sphere(1.0, R),
            R,
        );
        store.body_mut(h).unwrap().velocity = Vec3::new(2.0, 0.0, 0.5);
        let planes = [Plane::new(Vec3::NEG_X, -1.0)];
        let report = detect_and_resolve(&mut store, &planes, &Resolver::new(1.0, 0.5));
        assert_eq!(report.impulses, 1);
        let v = store.bodies[0].velocity;
        assert!((v.x + 1.0).abs() < 1e-5, "normal component should reverse at e=0.5: {:?}", v);
        assert!((v.z - 0.5).abs() < 1e-6, "tangential component untouched: {:?}", v);
        // No positional correction against planes
        assert_eq!(store.spheres()[0].origin, Vec3::new(1.0 - 0.9 * R, R, 0.0));
    }

    #[test]
    fn ball_leaving_cushion_is_left_alone() {
        let mut store = BodyStore::new();
        let h = store.spawn(
            Transform::from_position(Vec3::new(1.0 - R * 0.5, R, 0.0)),
            RigidBody::solid_sphere(1.0, R),
            R,
        );
        store.body_mut(h).unwrap().velocity = Vec3::new(-1.0, 0.0, 0.0);
        let planes = [Plane::new(Vec3::NEG_X, -1.0)];
        let report = detect_and_resolve(&mut store, &planes, &Resolver::new(1.0, 1.0));
        assert_eq!(report.impulses, 0);
        assert_eq!(store.bodies[0].velocity, Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn off_centre_contact_induces_spin() {
        // Impact point above the centre line of the plane contact
        let mut store = BodyStore::new();
        let h = store.spawn(Transform::from_position(Vec3::ZERO), RigidBody::solid_sphere(1.0, 1.0), 1.0);
        store.body_mut(h).unwrap().velocity = Vec3::X;
        let planes = [Plane::new(Vec3::NEG_X, -1.0)];
        let mut contacts = vec![Collision {
            kind: ContactKind::PlaneSphere,
            poi: Vec3::new(0.8, 0.6, 0.0),
            t: 0.0,
            s0: 0,
            s1: 0,
        }];
        Resolver::new(1.0, 1.0).resolve(&mut store, &planes, &mut contacts);
        assert!(store.bodies[0].velocity.x < 0.0);
        assert!(store.bodies[0].angular_velocity.length() > 0.0);
    }

    #[test]
    fn swept_contact_uses_normal_at_time_of_impact() {
        let mut store = BodyStore::new();
        for (position, velocity) in [
            (Vec3::new(-0.5, R, 0.0), Vec3::new(5.0, 0.0, 0.0)),
            (Vec3::new(0.0, R, 0.15), Vec3::ZERO),
        ] {
            let h = store.spawn(Transform::from_position(position), RigidBody::solid_sphere(1.0, R), R);
            store.body_mut(h).unwrap().velocity = velocity;
        }
        let mut contacts = Vec::new();
        SweptDetector.detect(&store, &[], 0.1, &mut contacts);
        assert_eq!(contacts.len(), 1);
        assert!((contacts[0].t - 0.070606).abs() < 1e-4, "t = {}", contacts[0].t);

        let report = Resolver::new(1.0, 1.0).resolve(&mut store, &[], &mut contacts);
        assert_eq!(report, ResolveReport { impulses: 1, separations: 0 });

        // Centres at impact: (-0.14697, 0, 0) and (0, 0, 0.15)
        let n = Vec3::new(0.14697, 0.0, 0.15) / (2.0 * R);
        let vb = store.bodies[1].velocity;
        assert!(vb.normalize().abs_diff_eq(n, 1e-3), "{:?} vs {:?}", vb.normalize(), n);
        assert!((vb.length() - 5.0 * n.x).abs() < 1e-3);
        assert!(store.bodies[0].angular_velocity.abs_diff_eq(Vec3::ZERO, 1e-4));
        // Not yet touching, so nothing is moved
        assert_eq!(store.spheres()[0].origin, Vec3::new(-0.5, R, 0.0));
    }

    #[test]
    fn swept_cushion_contact_is_resolved_at_impact_position() {
        let mut store = BodyStore::new();
        let start = Vec3::new(1.0 - R - 0.05, R, 0.0);
        let h = store.spawn(Transform::from_position(start), RigidBody::solid_sphere(1.0, R), R);
        store.body_mut(h).unwrap().velocity = Vec3::new(1.0, 0.0, 1.0);
        let planes = [Plane::new(Vec3::NEG_X, -1.0)];

        let mut contacts = Vec::new();
        SweptDetector.detect(&store, &planes, 0.1, &mut contacts);
        assert_eq!(contacts.len(), 1);
        assert!((contacts[0].t - 0.05).abs() < 1e-5);

        Resolver::new(1.0, 0.5).resolve(&mut store, &planes, &mut contacts);
        let body = store.bodies[0];
        assert!(body.velocity.abs_diff_eq(Vec3::new(-0.5, 0.0, 1.0), 1e-5), "{:?}", body.velocity);
        // The impact point sits straight along the normal from the advanced centre
        assert!(body.angular_velocity.abs_diff_eq(Vec3::ZERO, 1e-4), "{:?}", body.angular_velocity);
        assert_eq!(store.spheres()[0].origin, start);
    }

    #[test]
    fn impulse_magnitude_rejects_degenerate_denominator() {
        assert!(impulse_magnitude(1.0, 2.0, 0.0).is_none());
        assert!(impulse_magnitude(1.0, 2.0, f32::NAN).is_none());
        assert_eq!(impulse_magnitude(1.0, 2.0, 2.0), Some(2.0));
    }

    #[test]
    fn angular_term_vanishes_for_central_contact() {
        let j = Mat3::from_diagonal(Vec3::splat(2.5));
        assert!(angular_term(j, Vec3::X * 0.5, Vec3::X).abs() < 1e-9);
        assert!(angular_term(j, Vec3::Y, Vec3::X) > 0.0);
    }
}
