//! The winit event loop and the single window it renders into.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
