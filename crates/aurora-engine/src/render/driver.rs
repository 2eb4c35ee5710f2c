//! Per-frame orchestration of the pipeline.
//!
//! The driver owns the render targets and every pass. Each tick it first
//! compares the output image size with the size the targets were built for and
//! reallocates on change, then runs scene, blur, composite and antialias in
//! that order into that image.

use crate::camera::CameraPose;
use crate::lights::LightSet;
use crate::params::PipelineParameters;

use super::antialias::{AntialiasPass, PresentBlit};
use super::binding::BindingState;
use super::blur::{BloomSource, BlurPass, BlurSchedule};
use super::composite::{CompositePass, ToneMapUniforms};
use super::ctx::RenderCtx;
use super::error::RenderResult;
use super::scene::{SceneAssets, SceneInputs, ScenePass};
use super::targets::{Extent, RenderTargetSet};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DriverState {
    Steady,
    Resizing,
}

impl DriverState {
    /// State a tick starts in, given the cached and the current drawable size.
    pub fn for_sizes(cached: Extent, drawable: Extent) -> Self {
        if cached == drawable {
            DriverState::Steady
        } else {
            DriverState::Resizing
        }
    }
}

/// Which stage produced the output image.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FinalImage {
    /// FXAA ran over the composite.
    Antialiased,
    /// The composite was copied unchanged.
    Composite,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FrameOutput {
    pub extent: Extent,
    pub final_image: FinalImage,
    pub bloom: BloomSource,
    /// The target set was rebuilt at the start of this tick.
    pub reallocated: bool,
}

/// The image a tick ends in, with its size.
///
/// The driver sizes its targets from `extent`, so it must be the size of the
/// texture behind `view` (for a swapchain, the acquired image).
#[derive(Clone, Copy)]
pub struct OutputImage<'a> {
    pub view: &'a wgpu::TextureView,
    pub extent: Extent,
}

impl<'a> OutputImage<'a> {
    pub fn new(view: &'a wgpu::TextureView, extent: Extent) -> Self {
        Self { view, extent }
    }
}

/// Everything a frame reads: targets, passes, lights and parameters.
pub struct RenderContext {
    pub targets: RenderTargetSet,
    pub lights: LightSet,
    pub params: PipelineParameters,
    pub bindings: BindingState,
    scene: ScenePass,
    blur: BlurPass,
    composite: CompositePass,
    antialias: AntialiasPass,
    blit: PresentBlit,
}

pub struct FrameDriver {
    state: DriverState,
    output_format: wgpu::TextureFormat,
    context: RenderContext,
}

impl FrameDriver {
    /// Builds every pipeline and allocates targets at `extent`.
    pub fn new(
        ctx: RenderCtx<'_>,
        output_format: wgpu::TextureFormat,
        extent: Extent,
        lights: LightSet,
        params: PipelineParameters,
    ) -> RenderResult<Self> {
        let targets = RenderTargetSet::allocate(ctx.device, extent)?;
        let mut antialias = AntialiasPass::new(ctx.device, output_format);
        antialias.sync_extent(ctx.queue, extent);

        log::info!("frame driver ready ({output_format:?} output)");

        Ok(Self {
            state: DriverState::Steady,
            output_format,
            context: RenderContext {
                targets,
                lights,
                params,
                bindings: BindingState::default(),
                scene: ScenePass::new(ctx.device),
                blur: BlurPass::new(ctx.device),
                composite: CompositePass::new(ctx.device),
                antialias,
                blit: PresentBlit::new(ctx.device, output_format),
            },
        })
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn output_format(&self) -> wgpu::TextureFormat {
        self.output_format
    }

    pub fn scene_pass(&self) -> &ScenePass {
        &self.context.scene
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    pub fn targets(&self) -> &RenderTargetSet {
        &self.context.targets
    }

    pub fn bindings(&self) -> &BindingState {
        &self.context.bindings
    }

    pub fn lights(&self) -> &LightSet {
        &self.context.lights
    }

    pub fn lights_mut(&mut self) -> &mut LightSet {
        &mut self.context.lights
    }

    pub fn params(&self) -> &PipelineParameters {
        &self.context.params
    }

    pub fn params_mut(&mut self) -> &mut PipelineParameters {
        &mut self.context.params
    }

    /// Replaces the whole target set with one at `extent`.
    ///
    /// The new set is validated and created before the old one is released,
    /// so an error leaves the previous set in place.
    pub fn reallocate(&mut self, ctx: RenderCtx<'_>, extent: Extent) -> RenderResult<()> {
        let old = self.context.targets.extent();
        let fresh = RenderTargetSet::allocate(ctx.device, extent)?;

        self.state = DriverState::Resizing;
        std::mem::replace(&mut self.context.targets, fresh).release();
        self.context.antialias.sync_extent(ctx.queue, extent);

        log::info!(
            "render targets {}x{} -> {}x{}",
            old.width,
            old.height,
            extent.width,
            extent.height
        );
        self.state = DriverState::Steady;
        Ok(())
    }

    /// Reallocates when `drawable` differs from the current target size.
    ///
    /// Returns whether a reallocation happened.
    pub fn sync_size(&mut self, ctx: RenderCtx<'_>, drawable: Extent) -> RenderResult<bool> {
        match DriverState::for_sizes(self.context.targets.extent(), drawable) {
            DriverState::Steady => Ok(false),
            DriverState::Resizing => {
                self.reallocate(ctx, drawable)?;
                Ok(true)
            }
        }
    }

    /// Records one frame into `encoder`, ending in `output`.
    ///
    /// The targets follow `output.extent`; `output.view` must have the
    /// driver's output format.
    pub fn tick(
        &mut self,
        ctx: RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        pose: &CameraPose,
        assets: &SceneAssets,
        output: OutputImage<'_>,
    ) -> RenderResult<FrameOutput> {
        let reallocated = self.sync_size(ctx, output.extent)?;

        let RenderContext {
            targets,
            lights,
            params,
            bindings,
            scene,
            blur,
            composite,
            antialias,
            blit,
        } = &mut self.context;
        bindings.begin_frame();

        scene.record(
            ctx,
            encoder,
            bindings,
            targets,
            assets,
            &SceneInputs {
                pose,
                lights,
                params,
            },
        )?;

        let schedule = BlurSchedule::new(params.blur_pass_count);
        let bloom = blur.record(ctx.device, encoder, bindings, targets, &schedule)?;

        composite.record(
            ctx,
            encoder,
            bindings,
            targets,
            bloom,
            ToneMapUniforms::new(params.exposure, params.gamma),
        )?;

        let final_image = if params.antialias_enabled {
            antialias.record(ctx, encoder, bindings, targets, output.view)?;
            FinalImage::Antialiased
        } else {
            blit.record(ctx.device, encoder, bindings, targets, output.view)?;
            FinalImage::Composite
        };

        log::trace!(
            "frame recorded: {} bindings, {} draws",
            bindings.bound().len(),
            bindings.draws().len()
        );

        Ok(FrameOutput {
            extent: targets.extent(),
            final_image,
            bloom,
            reallocated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_size_is_steady() {
        let e = Extent::new(800, 600);
        assert_eq!(DriverState::for_sizes(e, e), DriverState::Steady);
    }

    #[test]
    fn any_dimension_change_resizes() {
        let e = Extent::new(800, 600);
        assert_eq!(
            DriverState::for_sizes(e, Extent::new(1024, 768)),
            DriverState::Resizing
        );
        assert_eq!(
            DriverState::for_sizes(e, Extent::new(800, 601)),
            DriverState::Resizing
        );
    }
}
