use std::collections::HashSet;

use super::types::{Key, MouseButton};

/// Input that happened since the last rendered frame.
///
/// Cleared by the runtime after every `App::on_frame`.
#[derive(Debug, Default)]
pub struct InputFrame {
    /// Keys that went down this frame. Auto-repeat does not re-add them.
    pub keys_pressed: HashSet<Key>,
    pub buttons_pressed: HashSet<MouseButton>,
    /// Summed pointer motion, logical pixels.
    pub pointer_delta: (f32, f32),
    pub wheel_lines: f32,
}

impl InputFrame {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn pressed(&self, key: Key) -> bool {
        self.keys_pressed.contains(&key)
    }
}
