pub mod app;

pub use app::{
    projection_matrix, rotate_in_place, run_app, run_app_with_metrics, AppError, CameraController,
    CameraTuning, Cell, CellCoord, CollisionResolver, CollisionTuning, Entity, EntityDesc,
    EntityId, FrameState, FrameUniform, GridCollision, GridError, GridMap, InputAction,
    InputSnapshot, InteractionState, KeyGate, KeyPickup, LoopConfig, LoopMetricsSnapshot,
    MetricsHandle, Pose, Scene, SceneCommand, SceneWorld, ViewAnchor, Viewport,
};
