use std::sync::Arc;

use glam::Vec3;
use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::app::grid::{Cell, CellCoord, GridMap};
use crate::app::scene::{Entity, SceneWorld};

use super::transform::{MapLayout, Viewport};

const CLEAR_COLOR: [u8; 4] = [14, 14, 18, 255];
const OPEN_COLOR: [u8; 4] = [46, 44, 40, 255];
const WALL_COLOR: [u8; 4] = [96, 92, 104, 255];
const DOOR_CLOSED_COLOR: [u8; 4] = [150, 92, 48, 255];
const DOOR_OPEN_COLOR: [u8; 4] = [88, 66, 44, 255];
const EXIT_COLOR: [u8; 4] = [60, 130, 70, 255];
const GRID_LINE_COLOR: [u8; 4] = [28, 28, 34, 255];
const LEVER_COLOR: [u8; 4] = [210, 210, 220, 255];
const LEVER_ACTIVE_COLOR: [u8; 4] = [120, 230, 120, 255];
const KEYHOLE_LOCKED_COLOR: [u8; 4] = [200, 70, 70, 255];
const KEYHOLE_UNLOCKED_COLOR: [u8; 4] = [240, 200, 80, 255];
const KEY_COLOR: [u8; 4] = [255, 220, 90, 255];
const PLAYER_COLOR: [u8; 4] = [80, 200, 255, 255];
const PLAYER_FACING_COLOR: [u8; 4] = [200, 240, 255, 255];
const PLAYER_FACING_LENGTH_CELLS: f32 = 0.8;

/// Top-down debug view of the dungeon: grid cells, interactive entities and
/// the player with its facing.
pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
}

impl Renderer {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub(crate) fn render_world(&mut self, world: &SceneWorld) -> Result<(), Error> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Ok(());
        }
        let viewport = self.viewport;
        let frame = self.pixels.frame_mut();
        draw_world(frame, viewport, world);
        self.pixels.render()
    }
}

fn draw_world(frame: &mut [u8], viewport: Viewport, world: &SceneWorld) {
    for chunk in frame.chunks_exact_mut(4) {
        chunk.copy_from_slice(&CLEAR_COLOR);
    }
    let Some(grid) = world.grid() else {
        return;
    };

    let layout = MapLayout::fit(viewport, grid.width(), grid.height());
    draw_grid_cells(frame, viewport, grid, &layout, world);

    // Markers sit where the published model matrix puts each entity origin.
    let marker_half = (layout.cell_px / 4).max(1);
    for uniform in world.frame_uniforms() {
        let Some(entity) = world.find_entity(uniform.entity) else {
            continue;
        };
        let Some(color) = entity_marker_color(entity) else {
            continue;
        };
        let position = uniform.model.transform_point3(entity.position());
        let (x, y) = layout.world_to_screen_px(grid, position.x, position.z);
        draw_square(frame, viewport.width, viewport.height, x, y, marker_half, color);
    }

    let state = world.frame();
    let eye = state.eye_position;
    let (px, py) = layout.world_to_screen_px(grid, eye.x, eye.z);
    draw_square(
        frame,
        viewport.width,
        viewport.height,
        px,
        py,
        (layout.cell_px / 3).max(1),
        PLAYER_COLOR,
    );
    // The view looks down the negative light direction.
    let facing = Vec3::new(-state.light_direction.x, 0.0, -state.light_direction.z);
    if let Some(facing) = facing.try_normalize() {
        let tip = eye + facing * PLAYER_FACING_LENGTH_CELLS;
        let (tx, ty) = layout.world_to_screen_px(grid, tip.x, tip.z);
        draw_line_clipped(
            frame,
            viewport.width,
            viewport.height,
            (px, py),
            (tx, ty),
            PLAYER_FACING_COLOR,
        );
    }
}

fn draw_grid_cells(
    frame: &mut [u8],
    viewport: Viewport,
    grid: &GridMap,
    layout: &MapLayout,
    world: &SceneWorld,
) {
    let exit = grid.exit_cell();
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let coord = CellCoord { x, y };
            let Some(cell) = grid.cell(coord) else {
                continue;
            };
            let color = cell_color(cell, coord, exit, world);
            let (left, top) = layout.cell_origin_px(coord);
            fill_rect(
                frame,
                viewport.width,
                viewport.height,
                left,
                top,
                layout.cell_px,
                color,
            );
            if layout.cell_px >= 4 {
                draw_rect_outline(
                    frame,
                    viewport.width,
                    viewport.height,
                    left,
                    top,
                    layout.cell_px,
                    GRID_LINE_COLOR,
                );
            }
        }
    }
}

fn cell_color(
    cell: Cell,
    coord: CellCoord,
    exit: Option<CellCoord>,
    world: &SceneWorld,
) -> [u8; 4] {
    match cell {
        Cell::Wall => WALL_COLOR,
        Cell::Door => DOOR_CLOSED_COLOR,
        Cell::Open if exit == Some(coord) => EXIT_COLOR,
        Cell::Open if is_tracked_door_cell(world, coord) => DOOR_OPEN_COLOR,
        Cell::Open => OPEN_COLOR,
    }
}

fn is_tracked_door_cell(world: &SceneWorld, coord: CellCoord) -> bool {
    world
        .entities()
        .iter()
        .any(|entity| entity.grid_cell == Some(coord))
}

fn entity_marker_color(entity: &Entity) -> Option<[u8; 4]> {
    if let Some(key) = entity.key {
        return (!key.collected).then_some(KEY_COLOR);
    }
    match (entity.interaction, entity.key_gate) {
        (Some(_), Some(gate)) if gate.has_key => Some(KEYHOLE_UNLOCKED_COLOR),
        (Some(_), Some(_)) => Some(KEYHOLE_LOCKED_COLOR),
        (Some(state), None) if state.is_active => Some(LEVER_ACTIVE_COLOR),
        (Some(_), None) => Some(LEVER_COLOR),
        _ => None,
    }
}

fn write_pixel_rgba_clipped(frame: &mut [u8], width: usize, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 || x as usize >= width {
        return;
    }
    let x = x as usize;
    let y = y as usize;
    let Some(pixel_offset) = y.checked_mul(width).and_then(|row| row.checked_add(x)) else {
        return;
    };
    let Some(byte_offset) = pixel_offset.checked_mul(4) else {
        return;
    };
    let Some(end) = byte_offset.checked_add(4) else {
        return;
    };
    if end > frame.len() {
        return;
    }
    frame[byte_offset..end].copy_from_slice(&color);
}

fn fill_rect(
    frame: &mut [u8],
    width: u32,
    height: u32,
    left: i32,
    top: i32,
    size: i32,
    color: [u8; 4],
) {
    for y in top..top + size {
        if y < 0 || y >= height as i32 {
            continue;
        }
        for x in left..left + size {
            write_pixel_rgba_clipped(frame, width as usize, x, y, color);
        }
    }
}

fn draw_rect_outline(
    frame: &mut [u8],
    width: u32,
    _height: u32,
    left: i32,
    top: i32,
    size: i32,
    color: [u8; 4],
) {
    let right = left + size - 1;
    let bottom = top + size - 1;
    for x in left..=right {
        write_pixel_rgba_clipped(frame, width as usize, x, top, color);
        write_pixel_rgba_clipped(frame, width as usize, x, bottom, color);
    }
    for y in top..=bottom {
        write_pixel_rgba_clipped(frame, width as usize, left, y, color);
        write_pixel_rgba_clipped(frame, width as usize, right, y, color);
    }
}

fn draw_square(
    frame: &mut [u8],
    width: u32,
    height: u32,
    cx: i32,
    cy: i32,
    half_size: i32,
    color: [u8; 4],
) {
    for y in (cy - half_size)..=(cy + half_size) {
        for x in (cx - half_size)..=(cx + half_size) {
            if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
                continue;
            }
            write_pixel_rgba_clipped(frame, width as usize, x, y, color);
        }
    }
}

fn draw_line_clipped(
    frame: &mut [u8],
    width: u32,
    height: u32,
    from: (i32, i32),
    to: (i32, i32),
    color: [u8; 4],
) {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    let steps = dx.abs().max(dy.abs());
    if steps == 0 {
        write_pixel_rgba_clipped(frame, width as usize, from.0, from.1, color);
        return;
    }
    for step in 0..=steps {
        let t = step as f32 / steps as f32;
        let x = (from.0 as f32 + dx as f32 * t).round() as i32;
        let y = (from.1 as f32 + dy as f32 * t).round() as i32;
        if y >= height as i32 {
            continue;
        }
        write_pixel_rgba_clipped(frame, width as usize, x, y, color);
    }
}

#[cfg(test)]
mod tests {
    use glam::Mat4;

    use super::*;
    use crate::app::scene::{EntityDesc, FrameState, InteractionState, KeyGate};

    fn pixel(frame: &[u8], width: u32, x: i32, y: i32) -> [u8; 4] {
        let offset = (y as usize * width as usize + x as usize) * 4;
        [
            frame[offset],
            frame[offset + 1],
            frame[offset + 2],
            frame[offset + 3],
        ]
    }

    fn world_with_grid() -> SceneWorld {
        let mut world = SceneWorld::default();
        world.set_grid(
            GridMap::from_rows(&["****", "*od*", "* f*", "****"], 1.0, 1.0).expect("grid"),
        );
        world
    }

    #[test]
    fn renderer_type_is_non_generic() {
        fn assert_sized<T: Sized>() {}
        assert_sized::<Renderer>();
    }

    #[test]
    fn write_pixel_ignores_out_of_bounds() {
        let mut frame = vec![0u8; 2 * 2 * 4];
        write_pixel_rgba_clipped(&mut frame, 2, -1, 0, [1, 1, 1, 1]);
        write_pixel_rgba_clipped(&mut frame, 2, 2, 0, [1, 1, 1, 1]);
        write_pixel_rgba_clipped(&mut frame, 2, 0, 2, [1, 1, 1, 1]);
        assert!(frame.iter().all(|byte| *byte == 0));

        write_pixel_rgba_clipped(&mut frame, 2, 1, 1, [9, 8, 7, 6]);
        assert_eq!(pixel(&frame, 2, 1, 1), [9, 8, 7, 6]);
    }

    #[test]
    fn grid_cells_use_symbol_colors() {
        let world = world_with_grid();
        let viewport = Viewport {
            width: 40,
            height: 40,
        };
        let mut frame = vec![0u8; 40 * 40 * 4];
        draw_world(&mut frame, viewport, &world);

        // 10 px cells; sample away from outlines and the player marker.
        assert_eq!(pixel(&frame, 40, 2, 2), WALL_COLOR);
        assert_eq!(pixel(&frame, 40, 22, 12), DOOR_CLOSED_COLOR);
        assert_eq!(pixel(&frame, 40, 22, 22), EXIT_COLOR);
        assert_eq!(pixel(&frame, 40, 12, 22), OPEN_COLOR);
    }

    #[test]
    fn opened_tracked_door_cell_is_drawn_as_open_door() {
        let mut world = world_with_grid();
        let door = world.spawn(EntityDesc::new("door", Vec3::new(1.0, 0.0, 0.0)));
        let coord = CellCoord { x: 2, y: 1 };
        world.find_entity_mut(door).expect("door").grid_cell = Some(coord);
        if let Some(grid) = world.grid_mut() {
            grid.set_cell_at(coord, Cell::Open);
        }
        assert_eq!(cell_color(Cell::Open, coord, None, &world), DOOR_OPEN_COLOR);
    }

    #[test]
    fn marker_colors_follow_capabilities() {
        let mut world = SceneWorld::default();
        let lever = world.spawn(EntityDesc::new("lever", Vec3::ZERO));
        let keyhole = world.spawn(EntityDesc::new("keyhole", Vec3::ZERO));
        let prop = world.spawn(EntityDesc::new("floor", Vec3::ZERO));
        world.find_entity_mut(lever).expect("lever").interaction =
            Some(InteractionState::new(None, 0.9));
        {
            let entity = world.find_entity_mut(keyhole).expect("keyhole");
            entity.interaction = Some(InteractionState::new(None, 2.0));
            entity.key_gate = Some(KeyGate::default());
        }

        let lever = world.find_entity(lever).expect("lever");
        let keyhole = world.find_entity(keyhole).expect("keyhole");
        let prop = world.find_entity(prop).expect("prop");
        assert_eq!(entity_marker_color(lever), Some(LEVER_COLOR));
        assert_eq!(entity_marker_color(keyhole), Some(KEYHOLE_LOCKED_COLOR));
        assert_eq!(entity_marker_color(prop), None);
    }

    #[test]
    fn player_facing_line_points_away_from_light_direction() {
        let mut world = world_with_grid();
        world.publish_frame(FrameState {
            eye_position: Vec3::new(0.0, 0.5, 1.0),
            light_direction: Vec3::NEG_X,
            ..FrameState::default()
        });
        let viewport = Viewport {
            width: 40,
            height: 40,
        };
        let mut frame = vec![0u8; 40 * 40 * 4];
        draw_world(&mut frame, viewport, &world);

        // Player at cell (1, 2) center (15, 25); facing +X draws toward (23, 25).
        assert_eq!(pixel(&frame, 40, 13, 25), PLAYER_COLOR);
        assert_eq!(pixel(&frame, 40, 21, 25), PLAYER_FACING_COLOR);
    }

    #[test]
    fn markers_follow_published_model_matrix() {
        let mut world = world_with_grid();
        let lever = world.spawn(EntityDesc::new("lever", Vec3::ZERO));
        let hidden = world.spawn(EntityDesc::new("hidden", Vec3::new(0.0, 0.0, 1.0)));
        for id in [lever, hidden] {
            world.find_entity_mut(id).expect("entity").interaction =
                Some(InteractionState::new(None, 0.9));
        }
        world.find_entity_mut(lever).expect("lever").current_matrix =
            Mat4::from_translation(Vec3::X);
        world.find_entity_mut(hidden).expect("hidden").visible = false;
        world.publish_frame(FrameState {
            eye_position: Vec3::new(1.0, 0.5, 1.0),
            light_direction: Vec3::NEG_X,
            ..FrameState::default()
        });
        let viewport = Viewport {
            width: 40,
            height: 40,
        };
        let mut frame = vec![0u8; 40 * 40 * 4];
        draw_world(&mut frame, viewport, &world);

        // Base position maps to cell (1, 1); the model matrix moves it to (2, 1).
        assert_eq!(pixel(&frame, 40, 25, 15), LEVER_COLOR);
        assert_eq!(pixel(&frame, 40, 15, 15), OPEN_COLOR);
        // Hidden entities publish no uniform, so no marker at cell (1, 2).
        assert_eq!(pixel(&frame, 40, 15, 25), OPEN_COLOR);
    }

    #[test]
    fn line_handles_single_point() {
        let mut frame = vec![0u8; 3 * 3 * 4];
        draw_line_clipped(&mut frame, 3, 3, (1, 1), (1, 1), [5, 5, 5, 5]);
        assert_eq!(pixel(&frame, 3, 1, 1), [5, 5, 5, 5]);
    }
}
