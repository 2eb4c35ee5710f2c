//! Offscreen render targets.
//!
//! Every buffer in a `RenderTargetSet` shares one extent. The set is created
//! as a whole and dropped as a whole; it is never resized in place.

use super::error::{RenderError, RenderResult};

pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const LDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

/// Drawable size in physical pixels.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }

    pub fn to_wgpu(self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }
}

impl From<winit::dpi::PhysicalSize<u32>> for Extent {
    fn from(size: winit::dpi::PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }
}

/// Identifies one buffer of the set.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TargetId {
    HdrColor,
    BrightColor,
    Blur0,
    Blur1,
    AaInput,
    Depth,
}

impl TargetId {
    pub const ALL: [TargetId; 6] = [
        TargetId::HdrColor,
        TargetId::BrightColor,
        TargetId::Blur0,
        TargetId::Blur1,
        TargetId::AaInput,
        TargetId::Depth,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TargetId::HdrColor => "hdr color",
            TargetId::BrightColor => "bright color",
            TargetId::Blur0 => "blur 0",
            TargetId::Blur1 => "blur 1",
            TargetId::AaInput => "aa input",
            TargetId::Depth => "scene depth",
        }
    }

    pub fn format(self) -> wgpu::TextureFormat {
        match self {
            TargetId::HdrColor | TargetId::BrightColor | TargetId::Blur0 | TargetId::Blur1 => {
                HDR_FORMAT
            }
            TargetId::AaInput => LDR_FORMAT,
            TargetId::Depth => DEPTH_FORMAT,
        }
    }

    fn usage(self) -> wgpu::TextureUsages {
        match self {
            TargetId::Depth => wgpu::TextureUsages::RENDER_ATTACHMENT,
            _ => {
                wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::COPY_SRC
            }
        }
    }

    /// Ping-pong target written by blur iteration `index % 2`.
    pub fn blur(index: usize) -> Self {
        if index % 2 == 0 {
            TargetId::Blur0
        } else {
            TargetId::Blur1
        }
    }
}

/// What `RenderTargetSet::allocate` will create for one buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TargetSpec {
    pub id: TargetId,
    pub format: wgpu::TextureFormat,
    pub usage: wgpu::TextureUsages,
    pub extent: Extent,
}

/// The full allocation plan for `extent`, in `TargetId::ALL` order.
pub fn plan(extent: Extent) -> [TargetSpec; 6] {
    TargetId::ALL.map(|id| TargetSpec {
        id,
        format: id.format(),
        usage: id.usage(),
        extent,
    })
}

/// Rejects extents the device cannot back.
pub fn check_extent(extent: Extent, max_dimension: u32) -> RenderResult<()> {
    let reason = if extent.is_empty() {
        "zero-sized extent".to_string()
    } else if extent.width > max_dimension || extent.height > max_dimension {
        format!("exceeds the device limit of {max_dimension}")
    } else {
        return Ok(());
    };

    Err(RenderError::TargetAllocation {
        label: "render target set",
        width: extent.width,
        height: extent.height,
        reason,
    })
}

/// One GPU image plus its default view.
pub struct RenderTarget {
    pub id: TargetId,
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub extent: Extent,
}

impl RenderTarget {
    fn create(device: &wgpu::Device, spec: &TargetSpec) -> Self {
        let label = format!("aurora {}", spec.id.label());
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&label),
            size: spec.extent.to_wgpu(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: spec.format,
            usage: spec.usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            id: spec.id,
            texture,
            view,
            extent: spec.extent,
        }
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.texture.format()
    }
}

/// Color attachments and depth of the multiple-render-target scene framebuffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SceneFramebufferLayout {
    pub colors: [TargetId; 2],
    pub depth: TargetId,
    pub draw_buffers: u32,
}

pub const SCENE_FRAMEBUFFER: SceneFramebufferLayout = SceneFramebufferLayout {
    colors: [TargetId::HdrColor, TargetId::BrightColor],
    depth: TargetId::Depth,
    draw_buffers: 2,
};

/// All offscreen buffers of the pipeline.
pub struct RenderTargetSet {
    extent: Extent,
    hdr_color: RenderTarget,
    bright_color: RenderTarget,
    blur: [RenderTarget; 2],
    aa_input: RenderTarget,
    depth: RenderTarget,
}

impl RenderTargetSet {
    /// Creates every buffer at `extent`.
    ///
    /// The extent is validated first, so a failure leaves nothing allocated.
    pub fn allocate(device: &wgpu::Device, extent: Extent) -> RenderResult<Self> {
        check_extent(extent, device.limits().max_texture_dimension_2d)?;

        let [hdr, bright, blur0, blur1, aa, depth] = plan(extent);
        let set = Self {
            extent,
            hdr_color: RenderTarget::create(device, &hdr),
            bright_color: RenderTarget::create(device, &bright),
            blur: [
                RenderTarget::create(device, &blur0),
                RenderTarget::create(device, &blur1),
            ],
            aa_input: RenderTarget::create(device, &aa),
            depth: RenderTarget::create(device, &depth),
        };

        log::info!("allocated render targets at {}x{}", extent.width, extent.height);
        Ok(set)
    }

    /// Frees the GPU memory now instead of waiting for the last handle to drop.
    pub fn release(self) {
        let extent = self.extent;
        for target in self.iter() {
            target.texture.destroy();
        }
        log::debug!("released render targets at {}x{}", extent.width, extent.height);
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn get(&self, id: TargetId) -> &RenderTarget {
        match id {
            TargetId::HdrColor => &self.hdr_color,
            TargetId::BrightColor => &self.bright_color,
            TargetId::Blur0 => &self.blur[0],
            TargetId::Blur1 => &self.blur[1],
            TargetId::AaInput => &self.aa_input,
            TargetId::Depth => &self.depth,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &RenderTarget> {
        TargetId::ALL.into_iter().map(|id| self.get(id))
    }

    pub fn scene_framebuffer(&self) -> SceneFramebufferLayout {
        SCENE_FRAMEBUFFER
    }
}
