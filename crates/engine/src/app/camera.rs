use glam::{Mat3, Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::collision::CollisionResolver;
use super::input::InputAction;
use super::scene::InputSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraTuning {
    pub rot_speed_degrees: f32,
    pub move_speed: f32,
    /// Cursor pixels per `rot_speed_degrees` of mouse-look rotation.
    pub mouse_resolution: f32,
    pub pitch_limit_degrees: f32,
}

impl Default for CameraTuning {
    fn default() -> Self {
        Self {
            rot_speed_degrees: 90.0,
            move_speed: 3.0,
            mouse_resolution: 500.0,
            pitch_limit_degrees: 90.0,
        }
    }
}

/// Player pose. Angles are radians; Y is up and never touched by movement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    /// View-only tilt. Does not affect movement, torch or collision.
    pub roll: f32,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
        }
    }
}

impl Pose {
    pub fn yaw_rotation(&self) -> Mat3 {
        Mat3::from_rotation_y(self.yaw)
    }

    pub fn look_rotation(&self) -> Mat3 {
        Mat3::from_rotation_y(self.yaw) * Mat3::from_rotation_x(self.pitch)
    }

    /// Camera local +Z in world space. The view looks down `-forward`.
    pub fn forward(&self) -> Vec3 {
        self.look_rotation() * Vec3::Z
    }

    /// Torch light direction; follows the camera basis without roll.
    pub fn light_direction(&self) -> Vec3 {
        self.forward()
    }

    /// Horizontal strafe axis.
    pub fn right(&self) -> Vec3 {
        self.yaw_rotation() * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.look_rotation() * Vec3::Y
    }

    /// Translate by `-position`, then apply the transposed (inverse) rotation
    /// basis.
    pub fn view_matrix(&self) -> Mat4 {
        let basis = self.look_rotation() * Mat3::from_rotation_z(self.roll);
        Mat4::from_mat3(basis.transpose()) * Mat4::from_translation(-self.position)
    }

    /// Model matrix that places an object authored at `origin` at a fixed
    /// spot in front of the camera, following the camera orientation.
    pub fn view_anchored_transform(&self, origin: Vec3, anchor: &ViewAnchor) -> Mat4 {
        let target = self.position - anchor.depth * self.forward() + anchor.right * self.right()
            - anchor.down * self.up();
        Mat4::from_translation(target)
            * Mat4::from_mat3(self.look_rotation() * anchor.orientation)
            * Mat4::from_scale(Vec3::splat(anchor.scale))
            * Mat4::from_translation(-origin)
    }
}

/// Camera-relative placement for inventory style display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewAnchor {
    pub depth: f32,
    pub right: f32,
    pub down: f32,
    pub scale: f32,
    pub orientation: Mat3,
}

#[derive(Debug, Clone)]
pub struct CameraController {
    pose: Pose,
    tuning: CameraTuning,
    last_time_seconds: Option<f32>,
    last_cursor_px: Option<Vec2>,
}

impl CameraController {
    pub fn new(position: Vec3, tuning: CameraTuning) -> Self {
        Self {
            pose: Pose {
                position,
                ..Pose::default()
            },
            tuning,
            last_time_seconds: None,
            last_cursor_px: None,
        }
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    /// Samples the clock and cursor once, derives Δt and the mouse delta from
    /// the previous call, then runs [`CameraController::step`].
    pub fn update(
        &mut self,
        elapsed_seconds: f32,
        input: &InputSnapshot,
        collision: &impl CollisionResolver,
    ) -> Mat4 {
        let delta_seconds = match self.last_time_seconds {
            Some(last) => (elapsed_seconds - last).max(0.0),
            None => 0.0,
        };
        self.last_time_seconds = Some(elapsed_seconds);

        let cursor = input.cursor_position_px();
        let mouse_delta = match (self.last_cursor_px, cursor) {
            (Some(last), Some(now)) => now - last,
            _ => Vec2::ZERO,
        };
        self.last_cursor_px = cursor;

        self.step(delta_seconds, mouse_delta, input, collision)
    }

    pub fn step(
        &mut self,
        delta_seconds: f32,
        mouse_delta_px: Vec2,
        input: &InputSnapshot,
        collision: &impl CollisionResolver,
    ) -> Mat4 {
        self.apply_rotation(delta_seconds, mouse_delta_px, input);

        let previous = self.pose.position;
        self.pose.position += self.translation(delta_seconds, input);
        if self.pose.position != previous
            && !collision.can_occupy(self.pose.position.x, self.pose.position.z)
        {
            trace!(
                x = self.pose.position.x,
                z = self.pose.position.z,
                "movement_blocked"
            );
            self.pose.position = previous;
        }

        self.pose.view_matrix()
    }

    fn apply_rotation(&mut self, delta_seconds: f32, mouse_delta_px: Vec2, input: &InputSnapshot) {
        let rot_speed = self.tuning.rot_speed_degrees.to_radians();

        if input.look_drag_held() && self.tuning.mouse_resolution > 0.0 {
            let per_pixel = rot_speed / self.tuning.mouse_resolution;
            self.pose.yaw -= mouse_delta_px.x * per_pixel;
            self.pose.pitch -= mouse_delta_px.y * per_pixel;
        }

        let step = rot_speed * delta_seconds;
        if input.is_down(InputAction::LookLeft) {
            self.pose.yaw += step;
        }
        if input.is_down(InputAction::LookRight) {
            self.pose.yaw -= step;
        }
        if input.is_down(InputAction::LookUp) {
            self.pose.pitch += step;
        }
        if input.is_down(InputAction::LookDown) {
            self.pose.pitch -= step;
        }
        if input.is_down(InputAction::RollLeft) {
            self.pose.roll -= step;
        }
        if input.is_down(InputAction::RollRight) {
            self.pose.roll += step;
        }

        let limit = self.tuning.pitch_limit_degrees.abs().to_radians();
        self.pose.pitch = self.pose.pitch.clamp(-limit, limit);
    }

    fn translation(&self, delta_seconds: f32, input: &InputSnapshot) -> Vec3 {
        let yaw = self.pose.yaw_rotation();
        let right = yaw * Vec3::X;
        let back = yaw * Vec3::Z;
        let mut direction = Vec3::ZERO;
        if input.is_down(InputAction::StrafeLeft) {
            direction -= right;
        }
        if input.is_down(InputAction::StrafeRight) {
            direction += right;
        }
        if input.is_down(InputAction::MoveBack) {
            direction += back;
        }
        if input.is_down(InputAction::MoveForward) {
            direction -= back;
        }
        direction * self.tuning.move_speed * delta_seconds
    }
}
