//! Keyboard and mouse state for the frame loop.
//!
//! `InputState` tracks what is held; `InputFrame` collects edges and motion
//! between two frames. Winit types stay inside `platform`.

mod frame;
pub(crate) mod platform;
mod state;
mod types;

pub use frame::InputFrame;
pub use state::InputState;
pub use types::{InputEvent, Key, Modifiers, MouseButton};
