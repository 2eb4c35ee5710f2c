use anyhow::Context;
use aurora_engine::core::{App, AppControl, FrameCtx};
use aurora_engine::device::Gpu;
use aurora_engine::input::Key;
use aurora_engine::lights::{LightSet, emission_mask};
use aurora_engine::params::PipelineParameters;
use aurora_engine::render::{FrameDriver, OutputImage, RenderCtx, SceneAssets, SceneDesc};

use crate::assets::ViewerAssets;
use crate::fly_camera::FlyCamera;
use crate::panel::ParameterPanel;
use crate::scene;

/// GPU-side state, created once the window has a device.
struct Renderer {
    driver: FrameDriver,
    assets: SceneAssets,
}

pub struct Viewer {
    assets: ViewerAssets,
    lights: LightSet,
    marker_tint: f32,
    params: PipelineParameters,
    camera: FlyCamera,
    panel: ParameterPanel,
    renderer: Option<Renderer>,
}

impl Viewer {
    pub fn new(assets: ViewerAssets, params: PipelineParameters) -> Self {
        let marker_tint = match assets.emission.as_ref().and_then(|e| e.center_rgb()) {
            Some(rgb) => {
                let mask = emission_mask(rgb);
                log::info!("emission mask {mask:.3}");
                mask
            }
            None => 1.0,
        };

        Self {
            assets,
            lights: LightSet::default(),
            marker_tint,
            params,
            camera: FlyCamera::default(),
            panel: ParameterPanel::default(),
            renderer: None,
        }
    }
}

impl App for Viewer {
    fn on_gpu_ready(&mut self, gpu: &Gpu<'_>) -> anyhow::Result<()> {
        let ctx = gpu.render_ctx();

        let driver = FrameDriver::new(
            ctx,
            gpu.surface_format(),
            gpu.extent(),
            self.lights.clone(),
            self.params,
        )
        .context("failed to create frame driver")?;

        let geometry = scene::colonnade();
        let desc = SceneDesc {
            emission: self.assets.emission.as_ref(),
            sky_faces: self.assets.sky_faces.as_ref(),
            marker_tint: self.marker_tint,
            ..SceneDesc::new(&geometry)
        };
        let assets = SceneAssets::new(ctx, driver.scene_pass(), &desc)
            .context("failed to upload scene assets")?;

        log::info!(
            "scene ready: {} triangles, {} lit lights",
            geometry.triangle_count(),
            self.lights.iter().filter(|l| l.intensity > 0.0).count()
        );
        self.renderer = Some(Renderer { driver, assets });
        Ok(())
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if ctx.input_frame.pressed(Key::Escape) {
            return AppControl::Exit;
        }
        let Some(renderer) = self.renderer.as_mut() else {
            return AppControl::Continue;
        };

        let dt = ctx.time.dt;
        self.camera.update(ctx.input, ctx.input_frame, dt);
        let mut params = *renderer.driver.params();
        self.panel.apply(
            ctx.input,
            ctx.input_frame,
            &mut params,
            renderer.driver.lights_mut(),
        );
        *renderer.driver.params_mut() = params;
        if let Some(line) = self
            .panel
            .tick(dt, renderer.driver.params(), renderer.driver.lights())
        {
            log::info!("{line}");
        }

        let pose = self.camera.pose();
        let mut result = Ok(());

        let control = ctx.present(|target| {
            // Minimized windows hand out empty frames; skip rather than fail.
            if target.extent.is_empty() {
                return;
            }
            let rctx = RenderCtx::new(target.device, target.queue);
            let output = OutputImage::new(target.view, target.extent);
            result = renderer
                .driver
                .tick(rctx, target.encoder, &pose, &renderer.assets, output)
                .map(|_| ());
        });

        match result {
            Ok(()) => control,
            Err(e) => {
                log::error!("frame failed: {e}");
                AppControl::Exit
            }
        }
    }
}
