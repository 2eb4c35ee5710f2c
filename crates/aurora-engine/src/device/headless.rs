use crate::render::{RenderCtx, RenderResult};

use super::GpuInit;

/// GPU context without a surface.
///
/// Used for offline capture and by the integration tests.
pub struct HeadlessGpu {
    #[allow(dead_code)]
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl HeadlessGpu {
    pub async fn new(init: &GpuInit) -> RenderResult<Self> {
        let instance = init.instance();
        let (adapter, device, queue) = init
            .open_device(&instance, None, "aurora headless device")
            .await?;
        Ok(Self {
            instance,
            adapter,
            device,
            queue,
        })
    }

    /// Blocking constructor. `None` when no adapter or device is usable,
    /// so callers on GPU-less machines can skip instead of failing.
    pub fn try_blocking() -> Option<Self> {
        pollster::block_on(Self::new(&GpuInit::default()))
            .inspect_err(|e| log::warn!("headless GPU unavailable: {e}"))
            .ok()
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
}
