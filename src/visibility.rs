//! Visibility cone: a fan of rays cast against the collision grid every frame
//!
//! # Algorithm
//!
//! Each ray walks the grid cell by cell with the fast voxel traversal: it keeps, per axis,
//! the ray distance at which it crosses the next grid line and always advances along the
//! axis whose crossing comes first. The walk stops when the current cell is out of the grid
//! or solid (a hit; bounds are checked before occupancy) or when the distance walked exceeds
//! the radius (a miss, capped at the radius). The origin cell is tested before the first
//! step, so a light inside a wall is fully blocked.
//!
//! Intensity falls off with distance: 1 up to half the radius, then linearly to 0 at the
//! radius.
//!
//! The output is a triangle fan: vertex 0 is the origin, vertices 1..=N are the ray ends in
//! increasing angle order. Intensities run parallel to the vertices; the origin carries 1.

use crate::tile::CollisionGrid;
use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConeParams {
    pub origin: Vec2,
    /// Center direction in radians
    pub facing: f32,
    /// Full opening angle in radians
    pub aperture: f32,
    /// Ray count; fewer than 2 casts a single ray along `facing`
    pub rays: usize,
    pub radius: f32,
}

/// Where one ray stopped
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec2,
    pub distance: f32,
    /// False when the ray ran the full radius without meeting a solid cell
    pub blocked: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightFan {
    pub vertices: Vec<Vec2>,
    pub intensities: Vec<f32>,
}

impl LightFan {
    pub fn is_empty(&self) -> bool {
        self.vertices.len() < 2
    }
}

/// `clamp(2 * (1 - distance / radius), 0, 1)`
pub fn intensity(distance: f32, radius: f32) -> f32 {
    if !(radius > 0.0) {
        return 0.0;
    }
    (2.0 * (1.0 - distance / radius)).clamp(0.0, 1.0)
}

/// Casts the whole cone. `pitch` is the world size of one grid cell.
pub fn cast_cone(params: &ConeParams, grid: &CollisionGrid, pitch: f32) -> LightFan {
    let origin = params.origin;
    if !origin.is_finite() {
        return LightFan::default();
    }
    let facing = if params.facing.is_finite() { params.facing } else { 0.0 };

    let angles: Vec<f32> = if params.rays < 2 {
        vec![facing]
    } else {
        let start = facing - params.aperture / 2.0;
        let step = params.aperture / (params.rays - 1) as f32;
        (0..params.rays).map(|i| start + i as f32 * step).collect()
    };

    let mut fan = LightFan {
        vertices: Vec::with_capacity(angles.len() + 1),
        intensities: Vec::with_capacity(angles.len() + 1),
    };
    fan.vertices.push(origin);
    fan.intensities.push(1.0);

    for angle in angles {
        let hit = cast_ray(origin, angle, params.radius, grid, pitch);
        fan.vertices.push(hit.point);
        fan.intensities.push(intensity(hit.distance, params.radius));
    }

    fan
}

/// Walks one ray through the grid
pub fn cast_ray(origin: Vec2, angle: f32, radius: f32, grid: &CollisionGrid, pitch: f32) -> RayHit {
    let direction = Vec2::new(angle.cos(), angle.sin());
    let radius = radius.max(0.0);
    let pitch = pitch.max(f32::EPSILON);
    let end = |distance: f32, blocked: bool| RayHit {
        point: origin + direction * distance,
        distance,
        blocked,
    };

    let mut cell_x = (origin.x / pitch).floor() as i32;
    let mut cell_y = (origin.y / pitch).floor() as i32;

    let (step_x, mut next_x, delta_x) = axis_setup(origin.x, direction.x, cell_x, pitch);
    let (step_y, mut next_y, delta_y) = axis_setup(origin.y, direction.y, cell_y, pitch);

    let mut distance = 0.0;
    loop {
        match grid.is_solid(cell_x, cell_y) {
            None | Some(true) => return end(distance, true),
            Some(false) => {}
        }

        if next_x < next_y {
            distance = next_x;
            next_x += delta_x;
            cell_x += step_x;
        } else {
            distance = next_y;
            next_y += delta_y;
            cell_y += step_y;
        }

        if distance > radius {
            return end(radius, false);
        }
    }
}

/// Per-axis traversal state: step direction, ray distance to the first grid line crossing,
/// and ray distance between two crossings
fn axis_setup(origin: f32, direction: f32, cell: i32, pitch: f32) -> (i32, f32, f32) {
    if direction > 0.0 {
        let boundary = (cell + 1) as f32 * pitch;
        (1, (boundary - origin) / direction, pitch / direction)
    } else if direction < 0.0 {
        let boundary = cell as f32 * pitch;
        (-1, (origin - boundary) / -direction, pitch / -direction)
    } else {
        (0, f32::INFINITY, f32::INFINITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::{FRAC_PI_2, PI};

    const PITCH: f32 = 10.0;

    fn corridor() -> CollisionGrid {
        // Open row with a wall at column 6
        CollisionGrid::from_ascii(&["..........", "......#...", ".........."])
    }

    #[test]
    fn test_hit_at_known_wall() {
        let grid = corridor();
        let origin = Vec2::new(5.0, 15.0);

        let hit = cast_ray(origin, 0.0, 100.0, &grid, PITCH);
        assert!(hit.blocked);
        assert_relative_eq!(hit.distance, 55.0, epsilon = PITCH);
        assert_relative_eq!(hit.point.x, 60.0, epsilon = 1e-3);
        assert_relative_eq!(intensity(hit.distance, 100.0), 0.9, epsilon = 1e-3);
    }

    #[test]
    fn test_close_hit_full_intensity() {
        let grid = corridor();
        let fan = cast_cone(
            &ConeParams {
                origin: Vec2::new(35.0, 15.0),
                facing: 0.0,
                aperture: 0.0,
                rays: 1,
                radius: 100.0,
            },
            &grid,
            PITCH,
        );

        assert_eq!(fan.vertices.len(), 2);
        assert_relative_eq!(fan.vertices[1].x, 60.0, epsilon = 1e-3);
        assert_eq!(fan.intensities[1], 1.0);
    }

    #[test]
    fn test_open_space_reaches_radius_with_zero_intensity() {
        let grid = CollisionGrid::new(100, 100);
        let origin = Vec2::new(500.0, 500.0);

        let hit = cast_ray(origin, 0.3, 120.0, &grid, PITCH);
        assert!(!hit.blocked);
        assert_eq!(hit.distance, 120.0);
        assert_eq!(intensity(hit.distance, 120.0), 0.0);
        assert_relative_eq!(hit.point.distance(origin), 120.0, epsilon = 1e-3);
    }

    #[test]
    fn test_leaving_grid_is_a_hit() {
        let grid = CollisionGrid::new(3, 3);
        let hit = cast_ray(Vec2::new(15.0, 15.0), PI, 100.0, &grid, PITCH);

        assert!(hit.blocked);
        assert_relative_eq!(hit.distance, 15.0, epsilon = 1e-3);
    }

    #[test]
    fn test_origin_inside_solid_blocks_immediately() {
        let grid = CollisionGrid::from_ascii(&["#"]);
        let hit = cast_ray(Vec2::new(5.0, 5.0), 1.0, 50.0, &grid, PITCH);

        assert!(hit.blocked);
        assert_eq!(hit.distance, 0.0);
    }

    #[test]
    fn test_fan_layout_and_angle_order() {
        let grid = CollisionGrid::new(100, 100);
        let fan = cast_cone(
            &ConeParams {
                origin: Vec2::new(500.0, 500.0),
                facing: 0.0,
                aperture: FRAC_PI_2,
                rays: 5,
                radius: 50.0,
            },
            &grid,
            PITCH,
        );

        assert_eq!(fan.vertices.len(), 6);
        assert_eq!(fan.intensities.len(), 6);
        assert_eq!(fan.vertices[0], Vec2::new(500.0, 500.0));
        assert_eq!(fan.intensities[0], 1.0);

        let angles: Vec<f32> = fan.vertices[1..]
            .iter()
            .map(|v| (v.y - 500.0).atan2(v.x - 500.0))
            .collect();
        assert_relative_eq!(angles[0], -PI / 4.0, epsilon = 1e-4);
        assert_relative_eq!(angles[2], 0.0, epsilon = 1e-4);
        assert_relative_eq!(angles[4], PI / 4.0, epsilon = 1e-4);
        assert!(angles.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_diagonal_ray_through_gap() {
        // Solid cells at (1,0) and (0,1) only touch the diagonal at a corner
        let grid = CollisionGrid::from_ascii(&[".#..", "#...", "...#"]);
        let hit = cast_ray(Vec2::new(5.0, 5.0), PI / 4.0, 200.0, &grid, PITCH);

        assert!(hit.blocked);
    }

    #[test]
    fn test_intensity_model() {
        assert_eq!(intensity(0.0, 100.0), 1.0);
        assert_eq!(intensity(50.0, 100.0), 1.0);
        assert_relative_eq!(intensity(75.0, 100.0), 0.5);
        assert_eq!(intensity(100.0, 100.0), 0.0);
        assert_eq!(intensity(10.0, 0.0), 0.0);
    }

    #[test]
    fn test_non_finite_facing_is_absorbed() {
        let grid = CollisionGrid::new(10, 10);
        let fan = cast_cone(
            &ConeParams {
                origin: Vec2::new(50.0, 50.0),
                facing: f32::NAN,
                aperture: 1.0,
                rays: 3,
                radius: 20.0,
            },
            &grid,
            PITCH,
        );

        assert_eq!(fan.vertices.len(), 4);
        assert!(fan.vertices.iter().all(|v| v.is_finite()));
    }
}
