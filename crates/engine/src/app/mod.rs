mod camera;
mod collision;
mod grid;
mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod scene;

pub use camera::{CameraController, CameraTuning, Pose, ViewAnchor};
pub use collision::{
    CollisionResolver, CollisionTuning, GridCollision, DEFAULT_CHECK_RADIUS, DEFAULT_CHECK_STEPS,
};
pub use grid::{
    Cell, CellCoord, GridError, GridMap, DOOR_SYMBOL, EXIT_SYMBOL, OPEN_SYMBOL, SPAWN_SYMBOL,
    WALL_SYMBOL,
};
pub use input::InputAction;
pub use loop_runner::{run_app, run_app_with_metrics, AppError, LoopConfig};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use rendering::{
    projection_matrix, MapLayout, Renderer, Viewport, FAR_PLANE, FIELD_OF_VIEW_DEGREES, NEAR_PLANE,
};
pub use scene::{
    rotate_in_place, Entity, EntityDesc, EntityId, EntityIdAllocator, FrameState, FrameUniform,
    InputSnapshot, InteractionState, KeyGate, KeyPickup, Scene, SceneCommand, SceneWorld,
};
