/// Levers: toggle in range on a fresh press, or while held if not yet latched.
fn check_interaction(world: &mut SceneWorld, player: Vec3, input: &InputSnapshot) -> Vec<Toggle> {
    let toggles = run_toggle_pass(world, player, input, false);
    for toggle in &toggles {
        info!(
            lever = toggle.source.0,
            door = ?toggle.door.map(|id| id.0),
            active = toggle.now_active,
            "lever_toggled"
        );
    }
    toggles
}

/// Keyholes: same toggle as levers, but only once their key was collected.
fn check_key_holes(world: &mut SceneWorld, player: Vec3, input: &InputSnapshot) -> Vec<Toggle> {
    let toggles = run_toggle_pass(world, player, input, true);
    for toggle in &toggles {
        info!(
            keyhole = toggle.source.0,
            door = ?toggle.door.map(|id| id.0),
            active = toggle.now_active,
            "keyhole_toggled"
        );
    }
    toggles
}

/// Keys are level-triggered: holding (or tapping) the trigger in range
/// collects the key and hands it to its keyhole. Repeats are harmless.
fn check_keys(world: &mut SceneWorld, player: Vec3, input: &InputSnapshot) -> Vec<EntityId> {
    if !input.is_down(InputAction::Interact) && !input.was_pressed(InputAction::Interact) {
        return Vec::new();
    }

    let in_range: Vec<(EntityId, EntityId, bool)> = world
        .entities()
        .iter()
        .filter_map(|entity| {
            let key = entity.key?;
            (entity.distance_to(player) < key.pickup_radius)
                .then_some((entity.id, key.unlocks, key.collected))
        })
        .collect();

    let mut newly_collected = Vec::new();
    for (key_id, keyhole_id, was_collected) in in_range {
        if let Some(gate) = world
            .find_entity_mut(keyhole_id)
            .and_then(|keyhole| keyhole.key_gate.as_mut())
        {
            gate.has_key = true;
        }
        if let Some(key) = world
            .find_entity_mut(key_id)
            .and_then(|entity| entity.key.as_mut())
        {
            key.collected = true;
        }
        if !was_collected {
            info!(key = key_id.0, keyhole = keyhole_id.0, "key_collected");
            newly_collected.push(key_id);
        }
    }
    newly_collected
}

/// Collected keys float in the lower right of the view, following the camera.
fn update_key_inventory(world: &mut SceneWorld, pose: &Pose) {
    let orientation = Mat3::from_rotation_y(90_f32.to_radians())
        * Mat3::from_rotation_z(90_f32.to_radians());
    for entity in world.entities_mut() {
        let Some(key) = entity.key else {
            continue;
        };
        if !key.collected {
            continue;
        }
        let anchor = ViewAnchor {
            depth: KEY_INVENTORY_DEPTH,
            right: key.inventory_right,
            down: KEY_INVENTORY_DOWN,
            scale: KEY_INVENTORY_SCALE,
            orientation,
        };
        entity.current_matrix = pose.view_anchored_transform(entity.position(), &anchor);
    }
}

fn run_toggle_pass(
    world: &mut SceneWorld,
    player: Vec3,
    input: &InputSnapshot,
    key_gated: bool,
) -> Vec<Toggle> {
    let trigger_held = input.is_down(InputAction::Interact);
    let trigger_pressed = input.was_pressed(InputAction::Interact);
    let trigger_released = input.was_released(InputAction::Interact);
    let candidates: Vec<EntityId> = world
        .entities()
        .iter()
        .filter(|entity| entity.interaction.is_some() && entity.key_gate.is_some() == key_gated)
        .map(|entity| entity.id)
        .collect();

    let mut toggles = Vec::new();
    for id in candidates {
        let Some(entity) = world.find_entity_mut(id) else {
            continue;
        };
        let Some(mut state) = entity.interaction else {
            continue;
        };
        let unlocked = entity.key_gate.map_or(true, |gate| gate.has_key);
        let in_range = entity.distance_to(player) < state.activation_radius;

        // A release seen this frame ends the previous press, even if the
        // trigger went down again before the frame was sampled.
        if trigger_released || !trigger_held {
            state.edge_latched = false;
        }

        let mut toggle = None;
        if in_range && unlocked && (trigger_pressed || trigger_held) && !state.edge_latched {
            state.edge_latched = trigger_held;
            state.is_active = !state.is_active;
            entity.current_matrix = if state.is_active {
                entity.open_transform()
            } else {
                Mat4::IDENTITY
            };
            toggle = Some(Toggle {
                source: id,
                door: state.controls,
                now_active: state.is_active,
            });
        }
        entity.interaction = Some(state);

        if let Some(toggle) = toggle {
            if let Some(door) = toggle.door {
                set_door_open(world, door, toggle.now_active);
            }
            toggles.push(toggle);
        }
    }
    toggles
}

/// Open: rotate the door in place and free its tracked cell. Closed: identity
/// transform and a blocking cell again.
fn set_door_open(world: &mut SceneWorld, door_id: EntityId, open: bool) {
    let (entities, grid) = world.entities_and_grid_mut();
    let Some(door) = entities.iter_mut().find(|entity| entity.id == door_id) else {
        return;
    };
    door.current_matrix = if open {
        door.open_transform()
    } else {
        Mat4::IDENTITY
    };
    if let (Some(coord), Some(grid)) = (door.grid_cell, grid) {
        let cell = if open { Cell::Open } else { Cell::Door };
        grid.set_cell_at(coord, cell);
    }
}
