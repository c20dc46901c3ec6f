use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use engine::{
    projection_matrix, CameraController, CameraTuning, Cell, CellCoord, CollisionTuning,
    EntityDesc, EntityId, FrameState, GridCollision, GridError, GridMap, InputAction,
    InputSnapshot, InteractionState, KeyGate, KeyPickup, Pose, Scene, SceneCommand, SceneWorld,
    ViewAnchor, Viewport,
};
use glam::{Mat3, Mat4, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

const LEVER_ACTIVATION_RADIUS: f32 = 0.9;
const KEYHOLE_ACTIVATION_RADIUS: f32 = 2.0;
const KEY_PICKUP_RADIUS: f32 = 1.5;
const MAP_OFFSET_X: f32 = 6.0;
const MAP_OFFSET_Z: f32 = 9.0;
const PLAYER_EYE_HEIGHT: f32 = 0.5;
const INTERACTIVE_REFLECTANCE: f32 = 1.0;
const KEY_INVENTORY_DEPTH: f32 = 0.13;
const KEY_INVENTORY_RIGHT: f32 = 0.045;
const GOLD_KEY_INVENTORY_RIGHT: f32 = 0.06;
const KEY_INVENTORY_DOWN: f32 = 0.045;
const KEY_INVENTORY_SCALE: f32 = 0.08;
const LEVEL_PATH_ENV_VAR: &str = "DUNGEON_LEVEL_PATH";

include!("types.rs");
include!("systems.rs");
include!("scene_impl.rs");

pub(crate) fn build_scene(level: DungeonLevel) -> Box<dyn Scene> {
    Box::new(DungeonScene::new(level))
}
