use crate::render::RenderResult;

/// Transfer function of the swapchain format.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceEncoding {
    /// Store shader output as-is. The tone-map pass already gamma-encodes.
    Linear,
    /// Let the hardware encode on write.
    Srgb,
}

/// Device and surface settings shared by `Gpu` and `HeadlessGpu`.
#[derive(Debug, Clone)]
pub struct GpuInit {
    pub backends: wgpu::Backends,
    pub power_preference: wgpu::PowerPreference,

    pub surface_encoding: SurfaceEncoding,
    /// FIFO paces the frame loop to vsync.
    pub present_mode: wgpu::PresentMode,
    /// Replaced by a supported mode when the surface does not offer it.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,
    /// Hint only; honored per backend.
    pub desired_maximum_frame_latency: u32,

    pub required_features: wgpu::Features,
    /// `max_texture_dimension_2d` bounds the render target size.
    pub required_limits: wgpu::Limits,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            surface_encoding: SurfaceEncoding::Linear,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            desired_maximum_frame_latency: 2,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
        }
    }
}

impl GpuInit {
    pub(crate) fn instance(&self) -> wgpu::Instance {
        wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: self.backends,
            ..Default::default()
        })
    }

    /// Adapter plus device/queue. `surface` is `None` for headless use.
    pub(crate) async fn open_device(
        &self,
        instance: &wgpu::Instance,
        surface: Option<&wgpu::Surface<'_>>,
        label: &str,
    ) -> RenderResult<(wgpu::Adapter, wgpu::Device, wgpu::Queue)> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: self.power_preference,
                compatible_surface: surface,
                force_fallback_adapter: false,
            })
            .await?;

        let info = adapter.get_info();
        log::info!("adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some(label),
                required_features: self.required_features,
                required_limits: self.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await?;

        Ok((adapter, device, queue))
    }
}
