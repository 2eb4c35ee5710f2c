//! Free-fly camera driven by keyboard and mouse.
//!
//! Moves and looks only while the right mouse button is held.

use aurora_engine::camera::CameraPose;
use aurora_engine::input::{InputFrame, InputState, Key, MouseButton};
use glam::Vec3;

const LOOK_SENSITIVITY: f32 = 0.003;
const MAX_PITCH: f32 = 1.55;

#[derive(Debug, Clone)]
pub struct FlyCamera {
    pub position: Vec3,
    /// Radians around +Y, 0 looking down -Z.
    pub yaw: f32,
    pub pitch: f32,
    /// World units per second.
    pub speed: f32,
    pub vertical_fov: f32,
}

impl FlyCamera {
    /// Camera at `position` facing `target`.
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        let dir = (target - position).try_normalize().unwrap_or(Vec3::NEG_Z);
        Self {
            position,
            yaw: (-dir.x).atan2(-dir.z),
            pitch: dir.y.clamp(-1.0, 1.0).asin(),
            speed: 4.0,
            vertical_fov: 45.0,
        }
    }

    pub fn forward(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        Vec3::new(-sy * cp, sp, -cy * cp)
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize_or_zero()
    }

    pub fn pose(&self) -> CameraPose {
        CameraPose {
            position: self.position,
            target: self.position + self.forward(),
            up: Vec3::Y,
            vertical_fov: self.vertical_fov,
        }
    }

    /// Applies one frame of input. Returns whether the pose changed.
    pub fn update(&mut self, input: &InputState, frame: &InputFrame, dt: f32) -> bool {
        if !input.button_down(MouseButton::Right) {
            return false;
        }

        let (dx, dy) = frame.pointer_delta;
        self.yaw -= dx * LOOK_SENSITIVITY;
        self.pitch = (self.pitch - dy * LOOK_SENSITIVITY).clamp(-MAX_PITCH, MAX_PITCH);

        if frame.wheel_lines != 0.0 {
            self.speed = (self.speed * 1.1f32.powf(frame.wheel_lines)).clamp(0.25, 64.0);
        }

        let mut wish = Vec3::ZERO;
        let axes = [
            (Key::W, self.forward()),
            (Key::S, -self.forward()),
            (Key::D, self.right()),
            (Key::A, -self.right()),
            (Key::Space, Vec3::Y),
            (Key::Shift, Vec3::NEG_Y),
        ];
        for (key, dir) in axes {
            if input.key_down(key) {
                wish += dir;
            }
        }
        if let Some(dir) = wish.try_normalize() {
            self.position += dir * self.speed * dt;
        }

        dx != 0.0 || dy != 0.0 || wish != Vec3::ZERO
    }
}

impl Default for FlyCamera {
    fn default() -> Self {
        let pose = CameraPose::default();
        Self::looking_at(pose.position, pose.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looking_at_recovers_direction() {
        let cam = FlyCamera::looking_at(Vec3::new(-1.0, 2.0, -0.5), Vec3::ZERO);
        let expected = Vec3::new(1.0, -2.0, 0.5).normalize();
        assert!(cam.forward().abs_diff_eq(expected, 1e-5));
        assert!(cam.pose().forward().abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn idle_without_right_button() {
        let mut cam = FlyCamera::default();
        let mut input = InputState::default();
        input.keys_down.insert(Key::W);
        let before = cam.position;
        assert!(!cam.update(&input, &InputFrame::default(), 1.0));
        assert_eq!(cam.position, before);
    }

    #[test]
    fn moves_forward_at_speed() {
        let mut cam = FlyCamera::looking_at(Vec3::ZERO, Vec3::NEG_Z);
        let mut input = InputState::default();
        input.buttons_down.insert(MouseButton::Right);
        input.keys_down.insert(Key::W);

        assert!(cam.update(&input, &InputFrame::default(), 0.5));
        assert!(cam.position.abs_diff_eq(Vec3::new(0.0, 0.0, -2.0), 1e-5));
    }

    #[test]
    fn pitch_is_clamped() {
        let mut cam = FlyCamera::default();
        let mut input = InputState::default();
        input.buttons_down.insert(MouseButton::Right);
        let frame = InputFrame {
            pointer_delta: (0.0, -100_000.0),
            ..InputFrame::default()
        };
        cam.update(&input, &frame, 0.0);
        assert_eq!(cam.pitch, MAX_PITCH);
    }
}
