//! Final stage: FXAA from `aa_input` into the output image, or a texel copy
//! when antialiasing is off.

use bytemuck::{Pod, Zeroable};

use super::binding::{Attachment, BindingState, ColorTarget, FramebufferBinding, PassPipeline};
use super::common::{
    fullscreen_pipeline, sampler_entry, texture_entry, uniform_buffer, uniform_entry,
};
use super::ctx::RenderCtx;
use super::error::RenderResult;
use super::targets::{Extent, RenderTargetSet, TargetId};
use super::texture::linear_clamp_sampler;

/// Size of one texel in uv units.
pub fn texel_step(extent: Extent) -> [f32; 2] {
    [1.0 / extent.width as f32, 1.0 / extent.height as f32]
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct FxaaParams {
    texel_step: [f32; 2],
    _pad: [f32; 2],
}

fn output_binding<'e, 's>(
    encoder: &'e mut wgpu::CommandEncoder,
    bindings: &'s mut BindingState,
    label: &'static str,
    output: &wgpu::TextureView,
) -> FramebufferBinding<'e, 's> {
    FramebufferBinding::begin(
        encoder,
        bindings,
        label,
        &[ColorTarget {
            id: Attachment::Output,
            view: output,
            clear: Some(wgpu::Color::BLACK),
        }],
        None,
    )
}

pub struct AntialiasPass {
    pipeline: PassPipeline,
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    ubo: wgpu::Buffer,
    /// Extent the uniform was last written for.
    step_extent: Option<Extent>,
}

impl AntialiasPass {
    pub fn new(device: &wgpu::Device, output_format: wgpu::TextureFormat) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("aurora fxaa bgl"),
            entries: &[
                texture_entry(0, wgpu::TextureViewDimension::D2),
                sampler_entry(1),
                uniform_entry::<FxaaParams>(2, wgpu::ShaderStages::FRAGMENT),
            ],
        });

        Self {
            pipeline: fullscreen_pipeline(
                device,
                "fxaa",
                include_str!("shaders/fxaa.wgsl"),
                &layout,
                output_format,
            ),
            layout,
            sampler: linear_clamp_sampler(device, "aurora fxaa sampler"),
            ubo: uniform_buffer::<FxaaParams>(device, "aurora fxaa ubo"),
            step_extent: None,
        }
    }

    /// Rewrites the texel step when the target size changed.
    pub fn sync_extent(&mut self, queue: &wgpu::Queue, extent: Extent) {
        if self.step_extent == Some(extent) {
            return;
        }
        let params = FxaaParams {
            texel_step: texel_step(extent),
            _pad: [0.0; 2],
        };
        queue.write_buffer(&self.ubo, 0, bytemuck::bytes_of(&params));
        self.step_extent = Some(extent);
        log::debug!("fxaa texel step set for {}x{}", extent.width, extent.height);
    }

    pub fn record(
        &mut self,
        ctx: RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        bindings: &mut BindingState,
        targets: &RenderTargetSet,
        output: &wgpu::TextureView,
    ) -> RenderResult<()> {
        self.sync_extent(ctx.queue, targets.extent());

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("aurora fxaa bind group"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(
                        &targets.get(TargetId::AaInput).view,
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.ubo.as_entire_binding(),
                },
            ],
        });

        let mut fb = output_binding(encoder, bindings, "fxaa output", output);
        fb.use_pipeline(&self.pipeline)?;
        fb.pass().set_bind_group(0, &bind_group, &[]);
        fb.draw_fullscreen();
        Ok(())
    }
}

/// Copies `aa_input` into the output texel for texel.
pub struct PresentBlit {
    pipeline: PassPipeline,
    layout: wgpu::BindGroupLayout,
}

impl PresentBlit {
    pub fn new(device: &wgpu::Device, output_format: wgpu::TextureFormat) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("aurora blit bgl"),
            entries: &[texture_entry(0, wgpu::TextureViewDimension::D2)],
        });

        Self {
            pipeline: fullscreen_pipeline(
                device,
                "present blit",
                include_str!("shaders/blit.wgsl"),
                &layout,
                output_format,
            ),
            layout,
        }
    }

    pub fn record(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        bindings: &mut BindingState,
        targets: &RenderTargetSet,
        output: &wgpu::TextureView,
    ) -> RenderResult<()> {
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("aurora blit bind group"),
            layout: &self.layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&targets.get(TargetId::AaInput).view),
            }],
        });

        let mut fb = output_binding(encoder, bindings, "blit output", output);
        fb.use_pipeline(&self.pipeline)?;
        fb.pass().set_bind_group(0, &bind_group, &[]);
        fb.draw_fullscreen();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texel_step_is_reciprocal_size() {
        assert_eq!(texel_step(Extent::new(800, 600)), [1.0 / 800.0, 1.0 / 600.0]);
        assert_eq!(texel_step(Extent::new(1, 2)), [1.0, 0.5]);
    }
}
