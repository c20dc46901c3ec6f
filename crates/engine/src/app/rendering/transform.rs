use glam::Mat4;

use crate::app::grid::{CellCoord, GridMap};

pub const FIELD_OF_VIEW_DEGREES: f32 = 45.0;
pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            return 1.0;
        }
        self.width as f32 / self.height as f32
    }
}

/// Perspective projection with depth in `[0, 1]` and clip-space Y pointing
/// down.
pub fn projection_matrix(aspect: f32) -> Mat4 {
    let aspect = if aspect.is_finite() && aspect > 0.0 {
        aspect
    } else {
        1.0
    };
    let mut projection = Mat4::perspective_rh(
        FIELD_OF_VIEW_DEGREES.to_radians(),
        aspect,
        NEAR_PLANE,
        FAR_PLANE,
    );
    projection.y_axis.y *= -1.0;
    projection
}

/// Square-cell placement of a [`GridMap`] centered in a viewport. Grid rows
/// run down the screen, so world +Z points down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapLayout {
    pub origin_x: i32,
    pub origin_y: i32,
    pub cell_px: i32,
}

impl MapLayout {
    pub fn fit(viewport: Viewport, grid_width: u32, grid_height: u32) -> Self {
        let cell_px = if grid_width == 0 || grid_height == 0 {
            1
        } else {
            (viewport.width / grid_width)
                .min(viewport.height / grid_height)
                .max(1) as i32
        };
        let map_width = cell_px * grid_width as i32;
        let map_height = cell_px * grid_height as i32;
        Self {
            origin_x: (viewport.width as i32 - map_width) / 2,
            origin_y: (viewport.height as i32 - map_height) / 2,
            cell_px,
        }
    }

    /// Top-left pixel of a cell.
    pub fn cell_origin_px(&self, coord: CellCoord) -> (i32, i32) {
        (
            self.origin_x + coord.x as i32 * self.cell_px,
            self.origin_y + coord.y as i32 * self.cell_px,
        )
    }

    pub fn world_to_screen_px(&self, grid: &GridMap, world_x: f32, world_z: f32) -> (i32, i32) {
        let (offset_x, offset_z) = grid.offset();
        let cell = self.cell_px as f32;
        let x = self.origin_x as f32 + (world_x + offset_x + 0.5) * cell;
        let y = self.origin_y as f32 + (world_z + offset_z + 0.5) * cell;
        (x.round() as i32, y.round() as i32)
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec3, Vec4};

    use super::*;

    #[test]
    fn layout_centers_square_cells() {
        let layout = MapLayout::fit(
            Viewport {
                width: 800,
                height: 600,
            },
            10,
            5,
        );
        assert_eq!(layout.cell_px, 80);
        assert_eq!(layout.origin_x, 0);
        assert_eq!(layout.origin_y, 100);
    }

    #[test]
    fn tiny_viewport_still_uses_one_pixel_cells() {
        let layout = MapLayout::fit(
            Viewport {
                width: 4,
                height: 4,
            },
            24,
            24,
        );
        assert_eq!(layout.cell_px, 1);
    }

    #[test]
    fn cell_center_world_maps_to_cell_center_px() {
        let grid = GridMap::from_rows(&["***", "* *", "***"], 1.0, 1.0).expect("grid");
        let layout = MapLayout {
            origin_x: 10,
            origin_y: 20,
            cell_px: 8,
        };
        let coord = CellCoord { x: 1, y: 1 };
        let (wx, wz) = grid.cell_center_world(coord);
        let (px, py) = layout.world_to_screen_px(&grid, wx, wz);
        let (left, top) = layout.cell_origin_px(coord);
        assert_eq!((px, py), (left + 4, top + 4));
    }

    #[test]
    fn projection_flips_y_and_maps_near_plane_to_zero_depth() {
        let projection = projection_matrix(16.0 / 9.0);
        let upward = projection * Vec4::new(0.0, 1.0, -1.0, 1.0);
        assert!(upward.y < 0.0);

        let near = projection.project_point3(Vec3::new(0.0, 0.0, -NEAR_PLANE));
        assert!(near.z.abs() < 1e-5);
        let far = projection.project_point3(Vec3::new(0.0, 0.0, -FAR_PLANE));
        assert!((far.z - 1.0).abs() < 1e-4);
    }

    #[test]
    fn degenerate_aspect_falls_back_to_square() {
        assert_eq!(projection_matrix(0.0), projection_matrix(1.0));
        assert_eq!(
            Viewport {
                width: 10,
                height: 0
            }
            .aspect(),
            1.0
        );
    }
}
