use winit::dpi::PhysicalSize;

use crate::render::Extent;

use super::{GpuFrame, GpuInit, SurfaceEncoding};

/// What the caller should do after a failed acquire.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// The surface was configured again; the next frame can proceed.
    Reconfigured,
    /// Drop this frame only.
    SkipFrame,
    /// Unrecoverable (out of memory). Shut down.
    Fatal,
}

/// Picks an 8-bit swapchain format with the requested encoding.
///
/// Falls back to any format of that encoding, then to the first listed.
pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    encoding: SurfaceEncoding,
) -> Option<wgpu::TextureFormat> {
    let srgb = encoding == SurfaceEncoding::Srgb;
    let preferred = if srgb {
        [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ]
    } else {
        [wgpu::TextureFormat::Bgra8Unorm, wgpu::TextureFormat::Rgba8Unorm]
    };

    preferred
        .into_iter()
        .find(|f| caps.formats.contains(f))
        .or_else(|| caps.formats.iter().copied().find(|f| f.is_srgb() == srgb))
        .or_else(|| caps.formats.first().copied())
}

pub(crate) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    match requested {
        Some(mode) if caps.alpha_modes.contains(&mode) => mode,
        _ => caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto),
    }
}

/// A window surface and its current configuration.
pub(crate) struct Swapchain<'w> {
    surface: wgpu::Surface<'w>,
    config: wgpu::SurfaceConfiguration,
    /// Last size reported by the window; may be 0x0 while minimized.
    size: PhysicalSize<u32>,
}

impl<'w> Swapchain<'w> {
    pub(crate) fn new(
        surface: wgpu::Surface<'w>,
        adapter: &wgpu::Adapter,
        device: &wgpu::Device,
        size: PhysicalSize<u32>,
        init: &GpuInit,
    ) -> Option<Self> {
        let caps = surface.get_capabilities(adapter);
        let format = choose_surface_format(&caps, init.surface_encoding)?;
        let alpha_mode = choose_alpha_mode(&caps, init.alpha_mode);
        log::debug!("swapchain {format:?}, alpha {alpha_mode:?}, {:?}", init.present_mode);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: init.present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };
        surface.configure(device, &config);

        Some(Self {
            surface,
            config,
            size,
        })
    }

    pub(crate) fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    /// Records the new size; configuration waits until it is non-zero.
    pub(crate) fn resize(&mut self, device: &wgpu::Device, new_size: PhysicalSize<u32>) {
        self.size = new_size;
        if new_size.width == 0 || new_size.height == 0 {
            log::debug!("surface hidden; deferring configure");
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(device, &self.config);
    }

    pub(crate) fn acquire(&self, device: &wgpu::Device) -> Result<GpuFrame, wgpu::SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let extent = Extent::new(
            surface_texture.texture.width(),
            surface_texture.texture.height(),
        );
        let encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("aurora frame encoder"),
        });

        Ok(GpuFrame {
            surface_texture,
            view,
            encoder,
            extent,
        })
    }

    pub(crate) fn recover(
        &self,
        device: &wgpu::Device,
        err: wgpu::SurfaceError,
    ) -> SurfaceErrorAction {
        match err {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                if self.size.width > 0 && self.size.height > 0 {
                    self.surface.configure(device, &self.config);
                }
                log::debug!("surface {err:?}; reconfigured");
                SurfaceErrorAction::Reconfigured
            }
            wgpu::SurfaceError::OutOfMemory => {
                log::error!("surface out of memory");
                SurfaceErrorAction::Fatal
            }
            wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other => {
                log::warn!("surface {err:?}; skipping frame");
                SurfaceErrorAction::SkipFrame
            }
        }
    }
}
