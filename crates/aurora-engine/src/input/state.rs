use std::collections::HashSet;

use super::frame::InputFrame;
use super::types::{InputEvent, Key, Modifiers, MouseButton};

/// What is held down right now.
#[derive(Debug, Default)]
pub struct InputState {
    pub modifiers: Modifiers,
    pub keys_down: HashSet<Key>,
    pub buttons_down: HashSet<MouseButton>,
    last_pointer: Option<(f32, f32)>,
}

impl InputState {
    /// Folds `ev` into the held state and records edges in `frame`.
    pub fn apply_event(&mut self, frame: &mut InputFrame, ev: InputEvent) {
        match ev {
            InputEvent::Key { key, pressed: true } => {
                if self.keys_down.insert(key) {
                    frame.keys_pressed.insert(key);
                }
            }
            InputEvent::Key { key, pressed: false } => {
                self.keys_down.remove(&key);
            }
            InputEvent::Button {
                button,
                pressed: true,
            } => {
                if self.buttons_down.insert(button) {
                    frame.buttons_pressed.insert(button);
                }
            }
            InputEvent::Button {
                button,
                pressed: false,
            } => {
                self.buttons_down.remove(&button);
            }
            InputEvent::PointerMoved { x, y } => {
                // No motion is reported for the first sample after entering.
                if let Some((px, py)) = self.last_pointer.replace((x, y)) {
                    frame.pointer_delta.0 += x - px;
                    frame.pointer_delta.1 += y - py;
                }
            }
            InputEvent::PointerLeft => self.last_pointer = None,
            InputEvent::Wheel { lines } => frame.wheel_lines += lines,
            InputEvent::Modifiers(m) => self.modifiers = m,
            InputEvent::Focused(false) => {
                // Releases are not delivered while unfocused.
                self.keys_down.clear();
                self.buttons_down.clear();
                self.modifiers = Modifiers::default();
            }
            InputEvent::Focused(true) => {}
        }
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn button_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }
}
