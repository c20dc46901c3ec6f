use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

use super::grid::GridMap;

pub const DEFAULT_CHECK_RADIUS: f32 = 0.15;
pub const DEFAULT_CHECK_STEPS: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionTuning {
    pub check_radius: f32,
    pub check_steps: u32,
}

impl Default for CollisionTuning {
    fn default() -> Self {
        Self {
            check_radius: DEFAULT_CHECK_RADIUS,
            check_steps: DEFAULT_CHECK_STEPS,
        }
    }
}

/// Decides whether a circular player footprint fits at a position.
pub trait CollisionResolver {
    fn can_occupy(&self, world_x: f32, world_z: f32) -> bool;
}

/// Samples points on a circle around the candidate position against a
/// [`GridMap`]. Every sample must land on a non-blocking cell; corners may be
/// rejected even when the true circle would fit.
#[derive(Debug, Clone, Copy)]
pub struct GridCollision<'a> {
    grid: &'a GridMap,
    tuning: CollisionTuning,
}

impl<'a> GridCollision<'a> {
    pub fn new(grid: &'a GridMap, tuning: CollisionTuning) -> Self {
        Self { grid, tuning }
    }

    pub fn sample_points(&self, world_x: f32, world_z: f32) -> impl Iterator<Item = (f32, f32)> {
        sample_circle(
            world_x,
            world_z,
            self.tuning.check_radius,
            self.tuning.check_steps,
        )
    }
}

impl CollisionResolver for GridCollision<'_> {
    fn can_occupy(&self, world_x: f32, world_z: f32) -> bool {
        self.sample_points(world_x, world_z)
            .all(|(x, z)| !self.grid.cell_at(x, z).is_blocking())
    }
}

fn sample_circle(
    center_x: f32,
    center_z: f32,
    radius: f32,
    steps: u32,
) -> impl Iterator<Item = (f32, f32)> {
    // Zero steps would accept anything; always probe at least one point.
    let steps = steps.max(1);
    (0..steps).map(move |step| {
        let angle = TAU * step as f32 / steps as f32;
        (
            center_x + angle.cos() * radius,
            center_z + angle.sin() * radius,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::grid::{Cell, CellCoord};

    // Offset 2 puts world (0, 0) on the center of cell (2, 2).
    fn room() -> GridMap {
        GridMap::from_rows(&["*****", "*   *", "*   *", "*  d*", "*****"], 2.0, 2.0)
            .expect("grid")
    }

    #[test]
    fn open_center_is_accepted() {
        let grid = room();
        let collision = GridCollision::new(&grid, CollisionTuning::default());
        assert!(collision.can_occupy(0.0, 0.0));
    }

    #[test]
    fn single_blocking_sample_rejects_position() {
        let grid = room();
        let collision = GridCollision::new(&grid, CollisionTuning::default());
        // Center rounds to column 3; the +X sample rounds into the wall at 4.
        assert!(!collision.can_occupy(1.4, 0.0));

        let blocked = collision
            .sample_points(1.4, 0.0)
            .filter(|(x, z)| grid.cell_at(*x, *z).is_blocking())
            .count();
        assert!(blocked >= 1);
    }

    #[test]
    fn door_cells_block_until_opened() {
        let mut grid = room();
        let door_world = grid.cell_center_world(CellCoord { x: 3, y: 3 });
        {
            let collision = GridCollision::new(&grid, CollisionTuning::default());
            assert!(!collision.can_occupy(door_world.0, door_world.1));
        }

        grid.set_cell(door_world.0, door_world.1, Cell::Open);
        let collision = GridCollision::new(&grid, CollisionTuning::default());
        assert!(collision.can_occupy(door_world.0, door_world.1));
    }

    #[test]
    fn samples_are_evenly_spaced_on_the_radius() {
        let grid = room();
        let collision = GridCollision::new(
            &grid,
            CollisionTuning {
                check_radius: 0.25,
                check_steps: 4,
            },
        );
        let points: Vec<(f32, f32)> = collision.sample_points(1.0, -1.0).collect();
        assert_eq!(points.len(), 4);
        let expected = [(1.25, -1.0), (1.0, -0.75), (0.75, -1.0), (1.0, -1.25)];
        for ((x, z), (ex, ez)) in points.iter().zip(expected) {
            assert!((x - ex).abs() < 1e-5, "x {x} vs {ex}");
            assert!((z - ez).abs() < 1e-5, "z {z} vs {ez}");
        }
    }

    #[test]
    fn far_outside_the_map_is_absorbed_by_edge_walls() {
        let grid = room();
        let collision = GridCollision::new(&grid, CollisionTuning::default());
        assert!(!collision.can_occupy(100.0, 100.0));
        assert!(!collision.can_occupy(-100.0, 0.0));
    }

    #[test]
    fn zero_steps_still_probes_the_center_ring() {
        let grid = room();
        let collision = GridCollision::new(
            &grid,
            CollisionTuning {
                check_radius: 0.15,
                check_steps: 0,
            },
        );
        assert_eq!(collision.sample_points(0.0, 0.0).count(), 1);
        assert!(!collision.can_occupy(100.0, 0.0));
    }
}
