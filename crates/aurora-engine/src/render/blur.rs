//! Ping-pong Gaussian blur of the bright buffer.
//!
//! Iteration `i` writes blur target `i % 2` and reads the bright buffer on
//! the first iteration, the other blur target afterwards. Even iterations
//! blur horizontally, odd ones vertically.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::binding::{Attachment, BindingState, ColorTarget, FramebufferBinding, PassPipeline};
use super::common::{fullscreen_pipeline, sampler_entry, texture_entry, uniform_entry};
use super::error::RenderResult;
use super::targets::{HDR_FORMAT, RenderTargetSet, TargetId};
use super::texture::linear_clamp_sampler;

/// Where the bloom texture of a frame lives.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BloomSource {
    /// No blur iteration ran.
    Bright,
    /// Result of the last iteration.
    Blur(usize),
}

impl BloomSource {
    pub fn target(self) -> TargetId {
        match self {
            BloomSource::Bright => TargetId::BrightColor,
            BloomSource::Blur(index) => TargetId::blur(index),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BlurStep {
    pub source: TargetId,
    pub destination: TargetId,
    pub horizontal: bool,
}

/// Order of reads and writes for `pass_count` iterations.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BlurSchedule {
    pass_count: u32,
}

impl BlurSchedule {
    pub fn new(pass_count: u32) -> Self {
        Self { pass_count }
    }

    pub fn pass_count(&self) -> u32 {
        self.pass_count
    }

    pub fn steps(&self) -> impl Iterator<Item = BlurStep> {
        (0..self.pass_count as usize).map(|i| BlurStep {
            source: if i == 0 {
                TargetId::BrightColor
            } else {
                TargetId::blur(i + 1)
            },
            destination: TargetId::blur(i),
            horizontal: i % 2 == 0,
        })
    }

    pub fn bloom(&self) -> BloomSource {
        match self.pass_count {
            0 => BloomSource::Bright,
            n => BloomSource::Blur((n as usize - 1) % 2),
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct BlurParams {
    horizontal: u32,
    _pad: [u32; 3],
}

pub struct BlurPass {
    pipeline: PassPipeline,
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    /// Indexed by `horizontal as usize`.
    direction: [wgpu::Buffer; 2],
}

impl BlurPass {
    pub fn new(device: &wgpu::Device) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("aurora blur bgl"),
            entries: &[
                texture_entry(0, wgpu::TextureViewDimension::D2),
                sampler_entry(1),
                uniform_entry::<BlurParams>(2, wgpu::ShaderStages::FRAGMENT),
            ],
        });
        let pipeline = fullscreen_pipeline(
            device,
            "gaussian blur",
            include_str!("shaders/blur.wgsl"),
            &layout,
            HDR_FORMAT,
        );

        let direction = [false, true].map(|horizontal| {
            let params = BlurParams {
                horizontal: horizontal as u32,
                _pad: [0; 3],
            };
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(if horizontal {
                    "aurora blur horizontal ubo"
                } else {
                    "aurora blur vertical ubo"
                }),
                contents: bytemuck::bytes_of(&params),
                usage: wgpu::BufferUsages::UNIFORM,
            })
        });

        Self {
            pipeline,
            layout,
            sampler: linear_clamp_sampler(device, "aurora blur sampler"),
            direction,
        }
    }

    /// Runs every step of `schedule` and returns where the bloom ended up.
    pub fn record(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        bindings: &mut BindingState,
        targets: &RenderTargetSet,
        schedule: &BlurSchedule,
    ) -> RenderResult<BloomSource> {
        for step in schedule.steps() {
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("aurora blur bind group"),
                layout: &self.layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(
                            &targets.get(step.source).view,
                        ),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: self.direction[step.horizontal as usize].as_entire_binding(),
                    },
                ],
            });

            let mut fb = FramebufferBinding::begin(
                encoder,
                bindings,
                step.destination.label(),
                &[ColorTarget {
                    id: Attachment::Target(step.destination),
                    view: &targets.get(step.destination).view,
                    clear: None,
                }],
                None,
            );
            fb.use_pipeline(&self.pipeline)?;
            fb.pass().set_bind_group(0, &bind_group, &[]);
            fb.draw_fullscreen();
        }

        Ok(schedule.bloom())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_passes_bloom_is_bright() {
        let schedule = BlurSchedule::new(0);
        assert_eq!(schedule.steps().count(), 0);
        assert_eq!(schedule.bloom(), BloomSource::Bright);
        assert_eq!(schedule.bloom().target(), TargetId::BrightColor);
    }

    #[test]
    fn ten_passes_alternate_and_end_in_blur1() {
        let steps: Vec<BlurStep> = BlurSchedule::new(10).steps().collect();
        assert_eq!(steps.len(), 10);
        assert_eq!(steps[0].source, TargetId::BrightColor);
        assert_eq!(steps[0].destination, TargetId::Blur0);
        assert!(steps[0].horizontal);

        for pair in steps.windows(2) {
            assert_eq!(pair[1].source, pair[0].destination);
            assert_ne!(pair[1].destination, pair[0].destination);
            assert_ne!(pair[1].horizontal, pair[0].horizontal);
        }
        assert_eq!(BlurSchedule::new(10).bloom(), BloomSource::Blur(1));
    }

    #[test]
    fn odd_pass_count_ends_in_blur0() {
        let schedule = BlurSchedule::new(3);
        let last = schedule.steps().last().unwrap();
        assert_eq!(last.destination, TargetId::Blur0);
        assert_eq!(schedule.bloom().target(), last.destination);
    }

    #[test]
    fn no_step_reads_what_it_writes() {
        for n in 0..16 {
            assert!(BlurSchedule::new(n).steps().all(|s| s.source != s.destination));
        }
    }
}
