//! Tone mapping of scene and bloom into the display-range `aa_input` target.

use bytemuck::{Pod, Zeroable};

use super::binding::{Attachment, BindingState, ColorTarget, FramebufferBinding, PassPipeline};
use super::blur::BloomSource;
use super::common::{
    fullscreen_pipeline, sampler_entry, texture_entry, uniform_buffer, uniform_entry,
};
use super::ctx::RenderCtx;
use super::error::RenderResult;
use super::targets::{LDR_FORMAT, RenderTargetSet, TargetId};
use super::texture::linear_clamp_sampler;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ToneMapUniforms {
    pub exposure: f32,
    pub gamma: f32,
    pub _pad: [f32; 2],
}

impl ToneMapUniforms {
    pub fn new(exposure: f32, gamma: f32) -> Self {
        Self {
            exposure,
            gamma,
            _pad: [0.0; 2],
        }
    }

    /// CPU reference of the shader curve for one channel.
    pub fn map(&self, hdr: f32, bloom: f32) -> f32 {
        let mapped = 1.0 - (-(hdr + bloom) * self.exposure).exp();
        mapped.powf(1.0 / self.gamma)
    }
}

pub struct CompositePass {
    pipeline: PassPipeline,
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    ubo: wgpu::Buffer,
}

impl CompositePass {
    pub fn new(device: &wgpu::Device) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("aurora tone map bgl"),
            entries: &[
                texture_entry(0, wgpu::TextureViewDimension::D2),
                texture_entry(1, wgpu::TextureViewDimension::D2),
                sampler_entry(2),
                uniform_entry::<ToneMapUniforms>(3, wgpu::ShaderStages::FRAGMENT),
            ],
        });

        Self {
            pipeline: fullscreen_pipeline(
                device,
                "tone map",
                include_str!("shaders/tone_map.wgsl"),
                &layout,
                LDR_FORMAT,
            ),
            layout,
            sampler: linear_clamp_sampler(device, "aurora tone map sampler"),
            ubo: uniform_buffer::<ToneMapUniforms>(device, "aurora tone map ubo"),
        }
    }

    pub fn record(
        &self,
        ctx: RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        bindings: &mut BindingState,
        targets: &RenderTargetSet,
        bloom: BloomSource,
        tone: ToneMapUniforms,
    ) -> RenderResult<()> {
        ctx.queue.write_buffer(&self.ubo, 0, bytemuck::bytes_of(&tone));

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("aurora tone map bind group"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(
                        &targets.get(TargetId::HdrColor).view,
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(
                        &targets.get(bloom.target()).view,
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: self.ubo.as_entire_binding(),
                },
            ],
        });

        let mut fb = FramebufferBinding::begin(
            encoder,
            bindings,
            TargetId::AaInput.label(),
            &[ColorTarget {
                id: Attachment::Target(TargetId::AaInput),
                view: &targets.get(TargetId::AaInput).view,
                clear: Some(wgpu::Color::BLACK),
            }],
            None,
        );
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
    fn black_stays_black() {
        assert_eq!(ToneMapUniforms::new(1.0, 2.2).map(0.0, 0.0), 0.0);
    }

    #[test]
    fn curve_is_monotonic_and_bounded() {
        let tone = ToneMapUniforms::new(1.0, 2.2);
        assert!(tone.map(0.25, 0.0) > 0.0);
        let mut prev = 0.0;
        for i in 1..100 {
            let v = tone.map(i as f32 * 0.25, 0.0);
            assert!(v >= prev && v <= 1.0);
            prev = v;
        }
    }

    #[test]
    fn bloom_adds_to_hdr() {
        let tone = ToneMapUniforms::new(0.5, 1.0);
        assert!((tone.map(0.25, 0.25) - tone.map(0.5, 0.0)).abs() < 1e-6);
        assert!((tone.map(1.0, 0.0) - (1.0 - (-0.5f32).exp())).abs() < 1e-6);
    }
}
