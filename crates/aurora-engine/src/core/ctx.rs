use winit::window::Window;

use crate::device::{Gpu, SurfaceErrorAction};
use crate::input::{InputFrame, InputState};
use crate::render::Extent;
use crate::time::FrameTime;

use super::app::AppControl;

/// What `FrameCtx::present` lends to the recording closure.
pub struct PresentTarget<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub encoder: &'a mut wgpu::CommandEncoder,
    /// The swapchain image for this frame.
    pub view: &'a wgpu::TextureView,
    pub format: wgpu::TextureFormat,
    /// Size of `view`, which may lag the window during a resize.
    pub extent: Extent,
}

/// Everything an `App` sees during one frame.
///
/// `'a` spans the callback; `'w` is the window borrow inside `Gpu<'w>`.
pub struct FrameCtx<'a, 'w> {
    pub window: &'a Window,
    pub gpu: &'a mut Gpu<'w>,
    pub input: &'a InputState,
    pub input_frame: &'a InputFrame,
    pub time: FrameTime,
}

impl FrameCtx<'_, '_> {
    /// Records one frame into the next swapchain image and presents it.
    ///
    /// A failed acquire skips the frame after any needed reconfigure.
    /// Only `SurfaceErrorAction::Fatal` asks the runtime to exit.
    pub fn present<F>(&mut self, record: F) -> AppControl
    where
        F: FnOnce(PresentTarget<'_>),
    {
        let mut frame = match self.gpu.acquire_frame() {
            Ok(frame) => frame,
            Err(err) => {
                return match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => AppControl::Exit,
                    SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => {
                        AppControl::Continue
                    }
                };
            }
        };

        record(PresentTarget {
            device: self.gpu.device(),
            queue: self.gpu.queue(),
            encoder: &mut frame.encoder,
            view: &frame.view,
            format: self.gpu.surface_format(),
            extent: frame.extent,
        });

        self.window.pre_present_notify();
        self.gpu.present_frame(frame);
        AppControl::Continue
    }
}
