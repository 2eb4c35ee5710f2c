//! Offscreen rendering pipeline.
//!
//! `FrameDriver` owns a `RenderTargetSet` and runs the passes in a fixed
//! order every tick:
//!
//! - scene: skybox, lit geometry and light markers into hdr + bright
//! - blur: ping-pong Gaussian over the bright buffer
//! - composite: tone map hdr + bloom into `aa_input`
//! - antialias: FXAA (or a texel copy) into the output image
//!
//! Passes record into a caller-provided encoder; the caller submits.

pub mod antialias;
pub mod binding;
pub mod blur;
mod common;
pub mod composite;
mod ctx;
pub mod driver;
mod error;
pub mod readback;
pub mod scene;
pub mod targets;
pub mod texture;

pub use ctx::RenderCtx;
pub use driver::{DriverState, FinalImage, FrameDriver, FrameOutput, OutputImage, RenderContext};
pub use error::{RenderError, RenderResult};
pub use scene::{SceneAssets, SceneDesc};
pub use targets::{Extent, RenderTargetSet, TargetId};
pub use texture::ImageRgba8;
