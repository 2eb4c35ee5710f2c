//! Copying render results back to CPU memory.
//!
//! Used by the integration tests and for offline capture on a headless device.

use half::f16;

use super::ctx::RenderCtx;
use super::driver::OutputImage;
use super::error::{RenderError, RenderResult};
use super::targets::{Extent, LDR_FORMAT};
use super::texture::ImageRgba8;

/// Rec. 709 relative luminance of a linear or encoded RGB triple.
pub fn luminance(rgb: [f32; 3]) -> f32 {
    0.2126 * rgb[0] + 0.7152 * rgb[1] + 0.0722 * rgb[2]
}

/// Float RGBA pixels read from an `Rgba16Float` target, row 0 at the top.
#[derive(Debug, Clone, PartialEq)]
pub struct HdrImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[f32; 4]>,
}

impl HdrImage {
    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }

    /// Largest channel value over the whole image, ignoring alpha.
    pub fn max_rgb(&self) -> f32 {
        self.pixels
            .iter()
            .flat_map(|p| p[..3].iter().copied())
            .fold(0.0, f32::max)
    }
}

/// An offscreen image standing in for the swapchain.
pub struct CaptureTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub extent: Extent,
}

impl CaptureTarget {
    pub fn new(device: &wgpu::Device, extent: Extent) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("aurora capture target"),
            size: extent.to_wgpu(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: LDR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            extent,
        }
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.texture.format()
    }

    /// This target as a frame destination.
    pub fn output(&self) -> OutputImage<'_> {
        OutputImage::new(&self.view, self.extent)
    }

    pub fn read(&self, ctx: RenderCtx<'_>) -> RenderResult<ImageRgba8> {
        read_rgba8(ctx, &self.texture)
    }
}

fn aligned_bytes_per_row(width: u32, bytes_per_pixel: u32) -> u32 {
    let unaligned = width * bytes_per_pixel;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unaligned.div_ceil(align) * align
}

/// Copies mip 0 of `texture` into tightly packed rows.
fn read_texture(
    ctx: RenderCtx<'_>,
    texture: &wgpu::Texture,
    bytes_per_pixel: u32,
) -> RenderResult<Vec<u8>> {
    let (width, height) = (texture.width(), texture.height());
    let bytes_per_row = aligned_bytes_per_row(width, bytes_per_pixel);

    let buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("aurora readback buffer"),
        size: u64::from(bytes_per_row * height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("aurora readback encoder"),
        });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        texture.size(),
    );
    ctx.queue.submit(std::iter::once(encoder.finish()));

    let slice = buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        // The receiver outlives the poll below.
        let _ = tx.send(result);
    });
    let _ = ctx.device.poll(wgpu::PollType::wait_indefinitely());
    rx.recv()
        .map_err(|e| RenderError::Readback(e.to_string()))?
        .map_err(|e| RenderError::Readback(e.to_string()))?;

    let row_bytes = (width * bytes_per_pixel) as usize;
    let mut packed = Vec::with_capacity(row_bytes * height as usize);
    {
        let data = slice.get_mapped_range();
        for row in 0..height {
            let start = (row * bytes_per_row) as usize;
            packed.extend_from_slice(&data[start..start + row_bytes]);
        }
    }
    buffer.unmap();

    log::trace!("read back {width}x{height} ({bytes_per_pixel} bytes/px)");
    Ok(packed)
}

/// Reads an 8-bit RGBA or BGRA texture as RGBA.
pub fn read_rgba8(ctx: RenderCtx<'_>, texture: &wgpu::Texture) -> RenderResult<ImageRgba8> {
    let swizzle = match texture.format() {
        wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => false,
        wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb => true,
        other => {
            return Err(RenderError::Readback(format!(
                "cannot read {other:?} as rgba8"
            )));
        }
    };

    let mut pixels = read_texture(ctx, texture, 4)?;
    if swizzle {
        for px in pixels.chunks_exact_mut(4) {
            px.swap(0, 2);
        }
    }
    Ok(ImageRgba8 {
        width: texture.width(),
        height: texture.height(),
        pixels,
    })
}

/// Reads an `Rgba16Float` texture.
pub fn read_hdr(ctx: RenderCtx<'_>, texture: &wgpu::Texture) -> RenderResult<HdrImage> {
    if texture.format() != wgpu::TextureFormat::Rgba16Float {
        return Err(RenderError::Readback(format!(
            "expected Rgba16Float, got {:?}",
            texture.format()
        )));
    }

    let bytes = read_texture(ctx, texture, 8)?;
    Ok(HdrImage {
        width: texture.width(),
        height: texture.height(),
        pixels: decode_rgba16f(&bytes),
    })
}

fn decode_rgba16f(bytes: &[u8]) -> Vec<[f32; 4]> {
    let channel = |b: &[u8]| f16::from_le_bytes([b[0], b[1]]).to_f32();
    bytes
        .chunks_exact(8)
        .map(|px| {
            [
                channel(&px[0..2]),
                channel(&px[2..4]),
                channel(&px[4..6]),
                channel(&px[6..8]),
            ]
        })
        .collect()
}
