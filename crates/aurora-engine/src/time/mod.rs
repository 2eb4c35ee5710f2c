//! Frame timing. The runtime ticks one `FrameClock` per presented frame.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
