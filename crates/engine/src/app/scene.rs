use glam::{Mat4, Vec2, Vec3};

use super::grid::{CellCoord, GridMap};
use super::input::{ActionStates, InputAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Quit,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
    cursor_position_px: Option<Vec2>,
    look_drag_held: bool,
    window_width: u32,
    window_height: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(
        quit_requested: bool,
        actions: ActionStates,
        cursor_position_px: Option<Vec2>,
        look_drag_held: bool,
        window_width: u32,
        window_height: u32,
    ) -> Self {
        Self {
            quit_requested,
            actions,
            cursor_position_px,
            look_drag_held,
            window_width,
            window_height,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn was_pressed(&self, action: InputAction) -> bool {
        self.actions.was_pressed(action)
    }

    pub fn was_released(&self, action: InputAction) -> bool {
        self.actions.was_released(action)
    }

    pub fn with_quit_requested(mut self, quit_requested: bool) -> Self {
        self.quit_requested = quit_requested;
        self
    }

    /// Builder for tests and scripted input: applies the transition, so the
    /// matching pressed/released edge is recorded as well.
    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_cursor_position_px(mut self, cursor_position_px: Option<Vec2>) -> Self {
        self.cursor_position_px = cursor_position_px;
        self
    }

    pub fn with_look_drag_held(mut self, look_drag_held: bool) -> Self {
        self.look_drag_held = look_drag_held;
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_width = window_size.0;
        self.window_height = window_size.1;
        self
    }

    pub fn cursor_position_px(&self) -> Option<Vec2> {
        self.cursor_position_px
    }

    pub fn look_drag_held(&self) -> bool {
        self.look_drag_held
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

/// On/off state for anything the player triggers at close range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionState {
    /// Entity rotated open/closed together with this one (lever -> door).
    pub controls: Option<EntityId>,
    pub is_active: bool,
    /// Set while the trigger is held after a toggle; cleared on release.
    pub edge_latched: bool,
    pub activation_radius: f32,
}

impl InteractionState {
    pub fn new(controls: Option<EntityId>, activation_radius: f32) -> Self {
        Self {
            controls,
            is_active: false,
            edge_latched: false,
            activation_radius,
        }
    }
}

/// Extra gate on an interactable: it only responds once a key was collected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyGate {
    pub has_key: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyPickup {
    /// Keyhole that receives the key.
    pub unlocks: EntityId,
    pub collected: bool,
    pub pickup_radius: f32,
    /// Horizontal inventory slot offset, in view units.
    pub inventory_right: f32,
}

/// Authoring record for [`SceneWorld::spawn`].
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDesc {
    pub name: String,
    pub mesh_index: u32,
    pub texture: Option<String>,
    pub position: Vec3,
    pub rotation_axis: Vec3,
    pub rotation_angle_degrees: f32,
    pub reflectance: f32,
}

impl EntityDesc {
    pub fn new(name: impl Into<String>, position: Vec3) -> Self {
        Self {
            name: name.into(),
            mesh_index: 0,
            texture: None,
            position,
            rotation_axis: Vec3::Y,
            rotation_angle_degrees: 0.0,
            reflectance: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub mesh_index: u32,
    pub texture: Option<String>,
    position: Vec3,
    rotation_axis: Vec3,
    rotation_angle_degrees: f32,
    pub current_matrix: Mat4,
    pub reflectance: f32,
    pub visible: bool,
    /// Door cell rewritten when this entity opens or closes.
    pub grid_cell: Option<CellCoord>,
    pub interaction: Option<InteractionState>,
    pub key_gate: Option<KeyGate>,
    pub key: Option<KeyPickup>,
}

impl Entity {
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn open_transform(&self) -> Mat4 {
        rotate_in_place(
            self.position,
            self.rotation_axis,
            self.rotation_angle_degrees,
        )
    }

    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.position.distance(point)
    }
}

/// `T(pivot) · R(angle, axis) · T(-pivot)`.
pub fn rotate_in_place(pivot: Vec3, axis: Vec3, angle_degrees: f32) -> Mat4 {
    let axis = axis.try_normalize().unwrap_or(Vec3::Y);
    Mat4::from_translation(pivot)
        * Mat4::from_axis_angle(axis, angle_degrees.to_radians())
        * Mat4::from_translation(-pivot)
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Shared per-frame camera state published alongside entity transforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    pub view: Mat4,
    pub projection: Mat4,
    pub eye_position: Vec3,
    pub light_direction: Vec3,
}

impl Default for FrameState {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            eye_position: Vec3::ZERO,
            light_direction: Vec3::Z,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniform {
    pub entity: EntityId,
    pub mesh_index: u32,
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
    pub eye_position: Vec3,
    pub light_direction: Vec3,
    pub reflectance: f32,
}

#[derive(Debug, Default)]
pub struct SceneWorld {
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    grid: Option<GridMap>,
    frame: FrameState,
}

impl SceneWorld {
    pub fn spawn(&mut self, desc: EntityDesc) -> EntityId {
        let id = self.allocator.allocate();
        self.entities.push(Entity {
            id,
            name: desc.name,
            mesh_index: desc.mesh_index,
            texture: desc.texture,
            position: desc.position,
            rotation_axis: desc.rotation_axis,
            rotation_angle_degrees: desc.rotation_angle_degrees,
            current_matrix: Mat4::IDENTITY,
            reflectance: desc.reflectance,
            visible: true,
            grid_cell: None,
            interaction: None,
            key_gate: None,
            key: None,
        });
        id
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.grid = None;
        self.frame = FrameState::default();
    }

    pub fn set_grid(&mut self, grid: GridMap) {
        self.grid = Some(grid);
    }

    pub fn grid(&self) -> Option<&GridMap> {
        self.grid.as_ref()
    }

    pub fn grid_mut(&mut self) -> Option<&mut GridMap> {
        self.grid.as_mut()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    /// Entities and the grid borrowed at once, for passes that rewrite both.
    pub fn entities_and_grid_mut(&mut self) -> (&mut [Entity], Option<&mut GridMap>) {
        (&mut self.entities, self.grid.as_mut())
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.name == name)
    }

    pub fn frame(&self) -> &FrameState {
        &self.frame
    }

    pub fn publish_frame(&mut self, frame: FrameState) {
        self.frame = frame;
    }

    /// One uniform block per visible entity, in spawn order.
    pub fn frame_uniforms(&self) -> Vec<FrameUniform> {
        let frame = self.frame;
        self.entities
            .iter()
            .filter(|entity| entity.visible)
            .map(|entity| FrameUniform {
                entity: entity.id,
                mesh_index: entity.mesh_index,
                model: entity.current_matrix,
                view: frame.view,
                projection: frame.projection,
                eye_position: frame.eye_position,
                light_direction: frame.light_direction,
                reflectance: entity.reflectance,
            })
            .collect()
    }
}

pub trait Scene {
    fn load(&mut self, world: &mut SceneWorld);
    /// Called once per rendered frame with the monotonic time since start.
    fn update(
        &mut self,
        elapsed_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand;
    fn render(&mut self, world: &SceneWorld);
    fn unload(&mut self, world: &mut SceneWorld);
    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
}
