use winit::event::{ElementState, MouseButton as WinitButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::Window;

use crate::input::{InputEvent, Key, Modifiers, MouseButton};

/// Nominal height of one scroll line for pixel-precise wheels.
const PIXELS_PER_LINE: f64 = 20.0;

/// Converts the window events the input layer cares about.
pub(crate) fn translate_window_event(window: &Window, event: &WindowEvent) -> Option<InputEvent> {
    let ev = match event {
        WindowEvent::KeyboardInput { event, .. } => InputEvent::Key {
            key: map_key(event.physical_key),
            pressed: event.state == ElementState::Pressed,
        },
        WindowEvent::MouseInput { state, button, .. } => InputEvent::Button {
            button: map_button(*button),
            pressed: *state == ElementState::Pressed,
        },
        WindowEvent::CursorMoved { position, .. } => {
            let p = position.to_logical::<f64>(window.scale_factor());
            InputEvent::PointerMoved {
                x: p.x as f32,
                y: p.y as f32,
            }
        }
        WindowEvent::CursorLeft { .. } => InputEvent::PointerLeft,
        WindowEvent::MouseWheel { delta, .. } => {
            let lines = match delta {
                MouseScrollDelta::LineDelta(_, y) => *y,
                MouseScrollDelta::PixelDelta(p) => {
                    (p.to_logical::<f64>(window.scale_factor()).y / PIXELS_PER_LINE) as f32
                }
            };
            InputEvent::Wheel { lines }
        }
        WindowEvent::ModifiersChanged(m) => {
            let state = m.state();
            InputEvent::Modifiers(Modifiers {
                shift: state.shift_key(),
                ctrl: state.control_key(),
                alt: state.alt_key(),
            })
        }
        WindowEvent::Focused(focused) => InputEvent::Focused(*focused),
        _ => return None,
    };
    Some(ev)
}

fn map_button(button: WinitButton) -> MouseButton {
    match button {
        WinitButton::Left => MouseButton::Left,
        WinitButton::Right => MouseButton::Right,
        WinitButton::Middle => MouseButton::Middle,
        WinitButton::Back => MouseButton::Other(3),
        WinitButton::Forward => MouseButton::Other(4),
        WinitButton::Other(n) => MouseButton::Other(n),
    }
}

fn map_key(physical: PhysicalKey) -> Key {
    let PhysicalKey::Code(code) = physical else {
        return Key::Other;
    };
    match code {
        KeyCode::Escape => Key::Escape,
        KeyCode::Space => Key::Space,
        KeyCode::ShiftLeft | KeyCode::ShiftRight => Key::Shift,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::ArrowUp => Key::ArrowUp,
        KeyCode::ArrowDown => Key::ArrowDown,
        KeyCode::ArrowLeft => Key::ArrowLeft,
        KeyCode::ArrowRight => Key::ArrowRight,
        KeyCode::KeyW => Key::W,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyD => Key::D,
        KeyCode::KeyZ => Key::Z,
        KeyCode::KeyX => Key::X,
        KeyCode::KeyC => Key::C,
        KeyCode::KeyV => Key::V,
        KeyCode::KeyB => Key::B,
        KeyCode::KeyN => Key::N,
        KeyCode::KeyF => Key::F,
        KeyCode::KeyJ => Key::J,
        KeyCode::KeyK => Key::K,
        KeyCode::KeyL => Key::L,
        KeyCode::KeyU => Key::U,
        KeyCode::KeyI => Key::I,
        KeyCode::KeyO => Key::O,
        KeyCode::KeyG => Key::G,
        other => digit(other).map_or(Key::Other, Key::Digit),
    }
}

fn digit(code: KeyCode) -> Option<u8> {
    const DIGITS: [KeyCode; 10] = [
        KeyCode::Digit0,
        KeyCode::Digit1,
        KeyCode::Digit2,
        KeyCode::Digit3,
        KeyCode::Digit4,
        KeyCode::Digit5,
        KeyCode::Digit6,
        KeyCode::Digit7,
        KeyCode::Digit8,
        KeyCode::Digit9,
    ];
    DIGITS.iter().position(|d| *d == code).map(|i| i as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_by_physical_position() {
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::KeyW)), Key::W);
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::ShiftRight)), Key::Shift);
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::Digit7)), Key::Digit(7));
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::KeyO)), Key::O);
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::KeyQ)), Key::Other);
    }
}
