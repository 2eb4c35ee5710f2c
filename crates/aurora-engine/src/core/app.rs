use crate::device::Gpu;

use super::ctx::FrameCtx;

/// Returned by `App::on_frame`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// A program driven by `window::Runtime`.
pub trait App {
    /// Runs once the window's device exists and before the first frame.
    /// An error stops the runtime and is returned from `Runtime::run`.
    fn on_gpu_ready(&mut self, gpu: &Gpu<'_>) -> anyhow::Result<()>;

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
