//! Aurora engine crate.
//!
//! Platform and GPU runtime (device, window, input, time) plus the
//! offscreen HDR pipeline in `render`.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod camera;
pub mod lights;
pub mod mesh;
pub mod params;
pub mod render;
