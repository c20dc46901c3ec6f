struct DungeonScene {
    level: DungeonLevel,
    camera: CameraController,
    exited: bool,
}

impl DungeonScene {
    fn new(level: DungeonLevel) -> Self {
        let camera = CameraController::new(level.spawn_point(), level.def.camera);
        Self {
            level,
            camera,
            exited: false,
        }
    }

    fn exited(&self) -> bool {
        self.exited
    }

    fn spawn_entities(&self, world: &mut SceneWorld) {
        let def = &self.level.def;
        let mut ids: HashMap<&str, EntityId> = HashMap::with_capacity(def.entities.len());
        for entity_def in &def.entities {
            let id = world.spawn(EntityDesc {
                name: entity_def.name.clone(),
                mesh_index: entity_def.mesh,
                texture: entity_def.texture.clone(),
                position: Vec3::from_array(entity_def.position),
                rotation_axis: Vec3::from_array(entity_def.rotation_axis),
                rotation_angle_degrees: entity_def.rotation_angle_degrees,
                reflectance: if entity_def.role.is_interactive() {
                    INTERACTIVE_REFLECTANCE
                } else {
                    0.0
                },
            });
            ids.insert(entity_def.name.as_str(), id);
        }

        for entity_def in &def.entities {
            let Some(&id) = ids.get(entity_def.name.as_str()) else {
                continue;
            };
            let target = entity_def
                .role
                .reference()
                .and_then(|name| ids.get(name).copied());
            let door_cell = match entity_def.role {
                EntityRole::Door => self.door_cell(entity_def),
                _ => None,
            };
            let Some(entity) = world.find_entity_mut(id) else {
                continue;
            };
            match &entity_def.role {
                EntityRole::Prop => {}
                EntityRole::Door => entity.grid_cell = door_cell,
                EntityRole::Lever { .. } => {
                    entity.interaction = Some(InteractionState::new(target, def.radii.lever));
                }
                EntityRole::Keyhole { .. } => {
                    entity.interaction = Some(InteractionState::new(target, def.radii.keyhole));
                    entity.key_gate = Some(KeyGate::default());
                }
                EntityRole::Key {
                    inventory_right, ..
                } => {
                    entity.key = target.map(|unlocks| KeyPickup {
                        unlocks,
                        collected: false,
                        pickup_radius: def.radii.key_pickup,
                        inventory_right: *inventory_right,
                    });
                }
            }
        }
    }

    /// Grid cell a door blocks, if its position lands on a door symbol.
    fn door_cell(&self, entity_def: &EntityDef) -> Option<CellCoord> {
        let grid = self.level.grid();
        let [x, _, z] = entity_def.position;
        let coord = grid.world_to_cell(x, z);
        if grid.cell(coord) == Some(Cell::Door) {
            Some(coord)
        } else {
            warn!(
                door = %entity_def.name,
                x = coord.x,
                y = coord.y,
                "door_cell_untracked"
            );
            None
        }
    }

    fn check_exit(&mut self, world: &SceneWorld) {
        if self.exited {
            return;
        }
        let Some(grid) = world.grid() else {
            return;
        };
        let position = self.camera.pose().position;
        let Some(exit) = grid.exit_cell() else {
            return;
        };
        if grid.world_to_cell(position.x, position.z) == exit {
            self.exited = true;
            info!(x = position.x, z = position.z, "exit_reached");
        }
    }

    fn collected_key_names(world: &SceneWorld) -> Vec<&str> {
        world
            .entities()
            .iter()
            .filter(|entity| entity.key.is_some_and(|key| key.collected))
            .map(|entity| entity.name.as_str())
            .collect()
    }
}

impl Scene for DungeonScene {
    fn load(&mut self, world: &mut SceneWorld) {
        world.clear();
        world.set_grid(self.level.grid().clone());
        self.spawn_entities(world);
        self.camera = CameraController::new(self.level.spawn_point(), self.level.def.camera);
        self.exited = false;

        let spawn = self.level.spawn_point();
        info!(
            level = self.level.name(),
            entities = world.entity_count(),
            spawn_x = spawn.x,
            spawn_z = spawn.z,
            "level_loaded"
        );
    }

    fn update(
        &mut self,
        elapsed_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        if input.quit_requested() {
            return SceneCommand::Quit;
        }

        let view = match world.grid() {
            Some(grid) => {
                let collision = GridCollision::new(grid, self.level.def.collision);
                self.camera.update(elapsed_seconds, input, &collision)
            }
            None => {
                debug!("update_without_grid");
                return SceneCommand::None;
            }
        };

        let pose = *self.camera.pose();
        check_interaction(world, pose.position, input);
        check_key_holes(world, pose.position, input);
        check_keys(world, pose.position, input);
        update_key_inventory(world, &pose);
        self.check_exit(world);

        let (width, height) = input.window_size();
        world.publish_frame(FrameState {
            view,
            projection: projection_matrix(Viewport { width, height }.aspect()),
            eye_position: pose.position,
            light_direction: pose.light_direction(),
        });

        SceneCommand::None
    }

    fn render(&mut self, _world: &SceneWorld) {}

    fn unload(&mut self, world: &mut SceneWorld) {
        info!(level = self.level.name(), "level_unloaded");
        world.clear();
    }

    fn debug_title(&self, world: &SceneWorld) -> Option<String> {
        let keys = Self::collected_key_names(world);
        let keys = if keys.is_empty() {
            "none".to_string()
        } else {
            keys.join(", ")
        };
        let exit = if self.exited() { " | exit reached" } else { "" };
        Some(format!("Dungeon | keys: {keys}{exit}"))
    }
}
