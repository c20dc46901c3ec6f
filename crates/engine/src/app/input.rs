#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveForward,
    MoveBack,
    StrafeLeft,
    StrafeRight,
    LookLeft,
    LookRight,
    LookUp,
    LookDown,
    RollLeft,
    RollRight,
    Interact,
    Quit,
}

const ACTION_COUNT: usize = 12;

/// Held state per action plus the press/release edges seen since the last
/// time the edges were consumed.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
    pressed: [bool; ACTION_COUNT],
    released: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        let index = action.index();
        let was_down = self.down[index];
        if is_down && !was_down {
            self.pressed[index] = true;
        }
        if !is_down && was_down {
            self.released[index] = true;
        }
        self.down[index] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }

    pub(crate) fn was_pressed(&self, action: InputAction) -> bool {
        self.pressed[action.index()]
    }

    pub(crate) fn was_released(&self, action: InputAction) -> bool {
        self.released[action.index()]
    }

    pub(crate) fn clear_edges(&mut self) {
        self.pressed = [false; ACTION_COUNT];
        self.released = [false; ACTION_COUNT];
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveForward => 0,
            InputAction::MoveBack => 1,
            InputAction::StrafeLeft => 2,
            InputAction::StrafeRight => 3,
            InputAction::LookLeft => 4,
            InputAction::LookRight => 5,
            InputAction::LookUp => 6,
            InputAction::LookDown => 7,
            InputAction::RollLeft => 8,
            InputAction::RollRight => 9,
            InputAction::Interact => 10,
            InputAction::Quit => 11,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_sets_down_and_pressed_edge() {
        let mut states = ActionStates::default();
        states.set(InputAction::Interact, true);

        assert!(states.is_down(InputAction::Interact));
        assert!(states.was_pressed(InputAction::Interact));
        assert!(!states.was_released(InputAction::Interact));
    }

    #[test]
    fn repeated_down_does_not_add_new_edge_after_clear() {
        let mut states = ActionStates::default();
        states.set(InputAction::Interact, true);
        states.clear_edges();
        states.set(InputAction::Interact, true);

        assert!(states.is_down(InputAction::Interact));
        assert!(!states.was_pressed(InputAction::Interact));
    }

    #[test]
    fn release_sets_released_edge() {
        let mut states = ActionStates::default();
        states.set(InputAction::MoveForward, true);
        states.clear_edges();
        states.set(InputAction::MoveForward, false);

        assert!(!states.is_down(InputAction::MoveForward));
        assert!(states.was_released(InputAction::MoveForward));
    }

    #[test]
    fn release_without_prior_press_is_not_an_edge() {
        let mut states = ActionStates::default();
        states.set(InputAction::Quit, false);
        assert!(!states.was_released(InputAction::Quit));
    }
}
