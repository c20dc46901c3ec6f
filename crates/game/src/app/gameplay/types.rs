#[derive(Debug, Error)]
pub(crate) enum LevelError {
    #[error("failed to read level file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse level json{}: {source}", format_json_path(.json_path))]
    Parse {
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("level grid is invalid: {0}")]
    InvalidGrid(#[from] GridError),
    #[error("entity name '{name}' is used more than once")]
    DuplicateEntity { name: String },
    #[error("entity '{entity}' references unknown entity '{target}'")]
    DanglingReference { entity: String, target: String },
    #[error("key '{key}' must unlock a keyhole, but '{target}' is not one")]
    KeyTargetNotKeyhole { key: String, target: String },
}

fn format_json_path(json_path: &str) -> String {
    if json_path.is_empty() || json_path == "." {
        String::new()
    } else {
        format!(" at {json_path}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct GridDef {
    rows: Vec<String>,
    #[serde(default = "default_offset_x")]
    offset_x: f32,
    #[serde(default = "default_offset_z")]
    offset_z: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct InteractionRadii {
    lever: f32,
    keyhole: f32,
    key_pickup: f32,
}

impl Default for InteractionRadii {
    fn default() -> Self {
        Self {
            lever: LEVER_ACTIVATION_RADIUS,
            keyhole: KEYHOLE_ACTIVATION_RADIUS,
            key_pickup: KEY_PICKUP_RADIUS,
        }
    }
}

/// Gameplay role of an authored entity. References use entity names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum EntityRole {
    #[default]
    Prop,
    Door,
    Lever {
        #[serde(default)]
        controls: Option<String>,
    },
    Keyhole {
        #[serde(default)]
        controls: Option<String>,
    },
    Key {
        unlocks: String,
        #[serde(default = "default_inventory_right")]
        inventory_right: f32,
    },
}

impl EntityRole {
    fn reference(&self) -> Option<&str> {
        match self {
            EntityRole::Lever { controls } | EntityRole::Keyhole { controls } => controls.as_deref(),
            EntityRole::Key { unlocks, .. } => Some(unlocks.as_str()),
            EntityRole::Prop | EntityRole::Door => None,
        }
    }

    fn is_interactive(&self) -> bool {
        matches!(
            self,
            EntityRole::Lever { .. } | EntityRole::Keyhole { .. } | EntityRole::Key { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct EntityDef {
    name: String,
    #[serde(default)]
    mesh: u32,
    #[serde(default)]
    texture: Option<String>,
    position: [f32; 3],
    #[serde(default = "default_rotation_axis")]
    rotation_axis: [f32; 3],
    #[serde(default)]
    rotation_angle_degrees: f32,
    #[serde(default)]
    role: EntityRole,
}

impl EntityDef {
    fn new(name: &str, mesh: u32, texture: &str, position: [f32; 3], role: EntityRole) -> Self {
        Self {
            name: name.to_string(),
            mesh,
            texture: Some(texture.to_string()),
            position,
            rotation_axis: default_rotation_axis(),
            rotation_angle_degrees: 0.0,
            role,
        }
    }

    fn rotating(mut self, axis: [f32; 3], angle_degrees: f32) -> Self {
        self.rotation_axis = axis;
        self.rotation_angle_degrees = angle_degrees;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LevelDef {
    name: String,
    grid: GridDef,
    #[serde(default = "default_eye_height")]
    eye_height: f32,
    #[serde(default)]
    camera: CameraTuning,
    #[serde(default)]
    collision: CollisionTuning,
    #[serde(default)]
    radii: InteractionRadii,
    entities: Vec<EntityDef>,
}

fn default_offset_x() -> f32 {
    MAP_OFFSET_X
}

fn default_offset_z() -> f32 {
    MAP_OFFSET_Z
}

fn default_eye_height() -> f32 {
    PLAYER_EYE_HEIGHT
}

fn default_rotation_axis() -> [f32; 3] {
    [0.0, 1.0, 0.0]
}

fn default_inventory_right() -> f32 {
    KEY_INVENTORY_RIGHT
}

impl LevelDef {
    fn parse_json(raw: &str) -> Result<Self, LevelError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        serde_path_to_error::deserialize::<_, LevelDef>(&mut deserializer).map_err(|error| {
            let json_path = error.path().to_string();
            LevelError::Parse {
                json_path,
                source: error.into_inner(),
            }
        })
    }

    fn builtin() -> Self {
        let entity = EntityDef::new;
        Self {
            name: "dungeon".to_string(),
            grid: GridDef {
                rows: BUILTIN_GRID_ROWS.iter().map(|row| row.to_string()).collect(),
                offset_x: MAP_OFFSET_X,
                offset_z: MAP_OFFSET_Z,
            },
            eye_height: PLAYER_EYE_HEIGHT,
            camera: CameraTuning::default(),
            collision: CollisionTuning::default(),
            radii: InteractionRadii::default(),
            entities: vec![
                entity(
                    "copperKey",
                    0,
                    "CopperKey.png",
                    [15.0, 0.0, 3.0],
                    EntityRole::Key {
                        unlocks: "copperKeyHole2".to_string(),
                        inventory_right: KEY_INVENTORY_RIGHT,
                    },
                ),
                entity(
                    "goldKey",
                    1,
                    "GoldKey.png",
                    [10.0, 0.0, -8.0],
                    EntityRole::Key {
                        unlocks: "goldKeyHole4".to_string(),
                        inventory_right: GOLD_KEY_INVENTORY_RIGHT,
                    },
                ),
                entity("doorSide", 2, "DoorSide2.png", [0.0; 3], EntityRole::Prop),
                entity(
                    "goldKeyHole4",
                    3,
                    "GoldKey.png",
                    [11.55, 0.5, 3.95],
                    EntityRole::Keyhole {
                        controls: Some("door4".to_string()),
                    },
                ),
                entity(
                    "copperKeyHole2",
                    4,
                    "CopperKey.png",
                    [6.95, 0.5, 8.45],
                    EntityRole::Keyhole {
                        controls: Some("door2".to_string()),
                    },
                ),
                entity(
                    "lever1",
                    5,
                    "Lever.png",
                    [3.0, 0.5, 3.5],
                    EntityRole::Lever {
                        controls: Some("door1".to_string()),
                    },
                )
                .rotating([1.0, 0.0, 0.0], -90.0),
                entity(
                    "lever3",
                    6,
                    "Lever.png",
                    [9.5, 0.5, 4.0],
                    EntityRole::Lever {
                        controls: Some("door3".to_string()),
                    },
                )
                .rotating([0.0, 0.0, 1.0], 90.0),
                entity(
                    "lever5",
                    7,
                    "Lever.png",
                    [4.5, 0.5, -1.0],
                    EntityRole::Lever {
                        controls: Some("door5".to_string()),
                    },
                )
                .rotating([0.0, 0.0, 1.0], 90.0),
                entity("door5", 8, "wood_door_flip.jpg", [4.4, 0.0, -2.0], EntityRole::Door)
                    .rotating([0.0, 1.0, 0.0], -90.0),
                entity("door4", 9, "wood_door.jpg", [12.4, 0.0, 4.0], EntityRole::Door)
                    .rotating([0.0, 1.0, 0.0], 90.0),
                entity("door3", 10, "wood_door_flip.jpg", [9.4, 0.0, 3.0], EntityRole::Door)
                    .rotating([0.0, 1.0, 0.0], -90.0),
                entity("door2", 11, "wood_door.jpg", [7.0, 0.0, 7.6], EntityRole::Door)
                    .rotating([0.0, 1.0, 0.0], 90.0),
                entity("door1", 12, "wood_door_flip.jpg", [4.0, 0.0, 3.4], EntityRole::Door)
                    .rotating([0.0, 1.0, 0.0], -90.0),
                entity("floor", 13, "terra.png", [0.0; 3], EntityRole::Prop),
                entity("wallW", 14, "muro_rosso.jpg", [0.0; 3], EntityRole::Prop),
                entity("wallE", 15, "muro_rosso.jpg", [0.0; 3], EntityRole::Prop),
                entity("wallN", 16, "muro_rosso.jpg", [0.0; 3], EntityRole::Prop),
                entity("wallS", 17, "muro_rosso.jpg", [0.0; 3], EntityRole::Prop),
                entity("ceiling", 18, "trak_tile_red.jpg", [0.0; 3], EntityRole::Prop),
                entity("endPlane", 19, "end.png", [0.0; 3], EntityRole::Prop),
            ],
        }
    }
}

/// A level whose grid parsed and whose entity references all resolve.
#[derive(Debug, Clone)]
pub(crate) struct DungeonLevel {
    def: LevelDef,
    grid: GridMap,
}

impl DungeonLevel {
    pub(crate) fn builtin() -> Result<Self, LevelError> {
        Self::new(LevelDef::builtin())
    }

    pub(crate) fn from_json_str(raw: &str) -> Result<Self, LevelError> {
        Self::new(LevelDef::parse_json(raw)?)
    }

    pub(crate) fn load_from_path(path: &Path) -> Result<Self, LevelError> {
        let raw = fs::read_to_string(path).map_err(|source| LevelError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Level named by `DUNGEON_LEVEL_PATH`, or the built-in dungeon.
    pub(crate) fn from_env() -> Result<Self, LevelError> {
        match std::env::var(LEVEL_PATH_ENV_VAR) {
            Ok(raw) if !raw.trim().is_empty() => {
                let path = PathBuf::from(raw.trim());
                info!(path = %path.display(), "level_source_file");
                Self::load_from_path(&path)
            }
            Ok(_) | Err(std::env::VarError::NotPresent) => Self::builtin(),
            Err(error) => {
                warn!(
                    env_var = LEVEL_PATH_ENV_VAR,
                    error = %error,
                    "unable to read level path env var; using built-in level"
                );
                Self::builtin()
            }
        }
    }

    fn new(def: LevelDef) -> Result<Self, LevelError> {
        let grid = GridMap::from_rows(&def.grid.rows, def.grid.offset_x, def.grid.offset_z)?;
        validate_entity_references(&def.entities)?;
        Ok(Self { def, grid })
    }

    pub(crate) fn name(&self) -> &str {
        &self.def.name
    }

    pub(crate) fn grid(&self) -> &GridMap {
        &self.grid
    }

    /// Player start: the grid's spawn cell at eye height, or the world origin.
    pub(crate) fn spawn_point(&self) -> Vec3 {
        let (x, z) = self
            .grid
            .spawn_cell()
            .map(|coord| self.grid.cell_center_world(coord))
            .unwrap_or((0.0, 0.0));
        Vec3::new(x, self.def.eye_height, z)
    }
}

fn validate_entity_references(entities: &[EntityDef]) -> Result<(), LevelError> {
    let mut roles: HashMap<&str, &EntityRole> = HashMap::with_capacity(entities.len());
    for entity in entities {
        if roles.insert(entity.name.as_str(), &entity.role).is_some() {
            return Err(LevelError::DuplicateEntity {
                name: entity.name.clone(),
            });
        }
    }

    for entity in entities {
        let Some(target) = entity.role.reference() else {
            continue;
        };
        let Some(target_role) = roles.get(target) else {
            return Err(LevelError::DanglingReference {
                entity: entity.name.clone(),
                target: target.to_string(),
            });
        };
        if matches!(entity.role, EntityRole::Key { .. })
            && !matches!(target_role, EntityRole::Keyhole { .. })
        {
            return Err(LevelError::KeyTargetNotKeyhole {
                key: entity.name.clone(),
                target: target.to_string(),
            });
        }
    }
    Ok(())
}

/// Door opened or closed by a lever or keyhole this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Toggle {
    source: EntityId,
    door: Option<EntityId>,
    now_active: bool,
}

const BUILTIN_GRID_ROWS: [&str; 24] = [
    "************************",
    "****************  ******",
    "****************  ******",
    "************   **  *****",
    "************ *   * *****",
    "****** ***** **     ****",
    "****** ***     ***  ****",
    "****** ***d*** * * *****",
    "*********  *   * * *****",
    "******o     *  *   *****",
    "*********  ** *  * *****",
    "******   ** * *  * *****",
    "****      d   *d*   * **",
    "**** *   ** **  **d*   *",
    "**** *******   **   * **",
    "**           ** *   * **",
    "** * **********  * *  **",
    "** *         df*     ***",
    "** *   ***   ***** *****",
    "** ***** ****      *****",
    "*   ***       **********",
    "*       ****************",
    "*   ********************",
    "************************",
];
