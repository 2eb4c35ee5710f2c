use anyhow::{Context, Result};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::render::{Extent, RenderCtx};

use super::surface::Swapchain;
use super::{GpuFrame, GpuInit, SurfaceErrorAction};

/// GPU context bound to one window.
///
/// The offscreen pipeline only borrows the device and queue through
/// `render_ctx`; the swapchain stays private to this type.
pub struct Gpu<'w> {
    #[allow(dead_code)]
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    swapchain: Swapchain<'w>,
}

impl<'w> Gpu<'w> {
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let instance = init.instance();
        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let (adapter, device, queue) = init
            .open_device(&instance, Some(&surface), "aurora device")
            .await
            .context("failed to open a GPU device for the window")?;

        let swapchain = Swapchain::new(surface, &adapter, &device, size, &init)
            .context("surface reports no formats")?;

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            swapchain,
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.swapchain.format()
    }

    /// Window size in physical pixels. May be 0x0 while minimized.
    pub fn size(&self) -> PhysicalSize<u32> {
        self.swapchain.size()
    }

    pub fn extent(&self) -> Extent {
        Extent::from(self.size())
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn render_ctx(&self) -> RenderCtx<'_> {
        RenderCtx::new(&self.device, &self.queue)
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.swapchain.resize(&self.device, new_size);
    }

    pub fn acquire_frame(&self) -> Result<GpuFrame, wgpu::SurfaceError> {
        self.swapchain.acquire(&self.device)
    }

    /// Submits the frame's commands and queues the image for display.
    pub fn present_frame(&self, frame: GpuFrame) {
        let GpuFrame {
            surface_texture,
            encoder,
            ..
        } = frame;
        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
    }

    pub fn handle_surface_error(&mut self, err: wgpu::SurfaceError) -> SurfaceErrorAction {
        self.swapchain.recover(&self.device, err)
    }
}
