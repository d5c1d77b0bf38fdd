//! Initial ball placement and the table boundary.

use glam::Vec3;

use crate::api::config::{Boundary, SimConfig};
use crate::core::state::Plane;

/// Cue ball plus fifteen object balls.
pub const BALL_COUNT: usize = 16;

/// Clearance between neighbouring balls in the rack, so the break starts
/// without overlapping contacts.
const RACK_CLEARANCE: f32 = 0.002;

/// Fifteen object balls packed in a triangle, apex first.
/// Entry `n - 1` holds ball `n`. Rows step away from the apex along +X and
/// fan out along Z, the 8 ball in the middle of the third row:
/// ```text
///  1
///  9   2
///  3   8  10
/// 11  4  5  12
///  6 13 14  7 15
/// ```
pub fn rack_positions(apex: Vec3, ball_radius: f32) -> [Vec3; 15] {
    let spacing = ball_radius * 2.0 + RACK_CLEARANCE;
    // Touching rows of a close-packed triangle
    let row_step = spacing * 3.0_f32.sqrt() * 0.5;

    // (ball, row, lateral slot in half-spacings from the centre line)
    const SLOTS: [(usize, u8, i8); 15] = [
        (1, 0, 0),
        (9, 1, -1), (2, 1, 1),
        (3, 2, -2), (8, 2, 0), (10, 2, 2),
        (11, 3, -3), (4, 3, -1), (5, 3, 1), (12, 3, 3),
        (6, 4, -4), (13, 4, -2), (14, 4, 0), (7, 4, 2), (15, 4, 4),
    ];

    let mut positions = [apex; 15];
    for (ball, row, slot) in SLOTS {
        positions[ball - 1] = apex
            + Vec3::new(f32::from(row) * row_step, 0.0, f32::from(slot) * spacing * 0.5);
    }
    positions
}

/// Centres of all sixteen balls: index 0 is the cue ball on the head spot,
/// indices 1..=15 are the numbered balls racked around the foot spot.
pub fn rack_layout(config: &SimConfig) -> Vec<Vec3> {
    let y = config.table_surface_y + config.ball_radius;
    let head_spot = Vec3::new(-config.table_half_length * 0.5, y, 0.0);
    let foot_spot = Vec3::new(config.table_half_length * 0.5, y, 0.0);

    let mut layout = Vec::with_capacity(BALL_COUNT);
    layout.push(head_spot);
    layout.extend(rack_positions(foot_spot, config.ball_radius));
    layout
}

/// Inward-facing boundary planes for the configured boundary shape.
pub fn boundary_planes(config: &SimConfig) -> Vec<Plane> {
    let l = config.table_half_length;
    let w = config.table_half_width;
    let mut planes = vec![
        Plane::new(Vec3::X, -l),
        Plane::new(Vec3::NEG_X, -l),
        Plane::new(Vec3::Z, -w),
        Plane::new(Vec3::NEG_Z, -w),
    ];
    if config.boundary == Boundary::Arena {
        let floor = config.table_surface_y;
        let ceiling = floor + config.arena_height;
        planes.push(Plane::new(Vec3::Y, floor));
        planes.push(Plane::new(Vec3::NEG_Y, -ceiling));
    }
    planes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rack_has_no_overlaps() {
        let radius = 0.105;
        let positions = rack_positions(Vec3::ZERO, radius);
        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                let d = positions[i].distance(positions[j]);
                assert!(d >= 2.0 * radius, "balls {} and {} overlap: d={}", i + 1, j + 1, d);
            }
        }
    }

    #[test]
    fn eight_ball_sits_in_middle_of_third_row() {
        let apex = Vec3::new(1.0, 0.1, 0.0);
        let positions = rack_positions(apex, 0.1);
        let eight = positions[7];
        assert!((eight.z - apex.z).abs() < 1e-6);
        assert!(eight.x > apex.x);
        assert_eq!(eight.y, apex.y);
    }

    #[test]
    fn layout_puts_cue_ball_first_and_everything_on_the_cloth() {
        let config = SimConfig::default();
        let layout = rack_layout(&config);
        assert_eq!(layout.len(), BALL_COUNT);
        assert!(layout[0].x < 0.0, "cue ball should start on the head side");
        for p in &layout {
            assert!((p.y - (config.table_surface_y + config.ball_radius)).abs() < 1e-6);
        }
    }

    #[test]
    fn rack_fits_between_cushions() {
        let config = SimConfig::default();
        let planes = boundary_planes(&config);
        for p in rack_layout(&config) {
            for plane in &planes {
                assert!(
                    plane.signed_distance(p) > config.ball_radius,
                    "ball at {:?} touches plane {:?}",
                    p,
                    plane
                );
            }
        }
    }

    #[test]
    fn table_has_four_planes_and_arena_six() {
        let config = SimConfig::default();
        assert_eq!(boundary_planes(&config).len(), 4);
        let arena = SimConfig { boundary: Boundary::Arena, ..SimConfig::default() };
        let planes = boundary_planes(&arena);
        assert_eq!(planes.len(), 6);
        // Ceiling faces down
        assert_eq!(planes[5].normal, Vec3::NEG_Y);
    }
}
