/// A key the viewer can bind.
///
/// Letters and named keys outside this set arrive as `Key::Other`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Space,
    Shift,
    PageUp,
    PageDown,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    // fly camera
    W,
    A,
    S,
    D,

    // parameter panel
    Z,
    X,
    C,
    V,
    B,
    N,
    F,
    J,
    K,
    L,
    U,
    I,
    O,
    G,

    /// Top-row digit `0..=9`.
    Digit(u8),

    Other,
}

impl Key {
    /// Zero-based slot for digits 1..=9; `0` and non-digits give `None`.
    pub fn digit_index(self) -> Option<usize> {
        match self {
            Key::Digit(d @ 1..=9) => Some(usize::from(d) - 1),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

/// Window input, already converted out of platform types.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InputEvent {
    Key { key: Key, pressed: bool },
    Button { button: MouseButton, pressed: bool },
    /// Logical pixels.
    PointerMoved { x: f32, y: f32 },
    PointerLeft,
    /// Vertical scroll in lines; positive away from the user.
    Wheel { lines: f32 },
    Modifiers(Modifiers),
    Focused(bool),
}

#[cfg(test)]
mod tests {
    use super::Key;

    #[test]
    fn digit_slots() {
        assert_eq!(Key::Digit(1).digit_index(), Some(0));
        assert_eq!(Key::Digit(9).digit_index(), Some(8));
        assert_eq!(Key::Digit(0).digit_index(), None);
        assert_eq!(Key::W.digit_index(), None);
    }
}
