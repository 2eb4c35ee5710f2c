use crate::render::Extent;

/// An acquired swapchain image with its encoder.
///
/// Hand it back through `Gpu::present_frame` in the same frame; the next
/// image cannot be acquired while this one is held.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
    /// Size of the acquired image.
    pub extent: Extent,
}
