//! End-to-end pipeline checks on a headless device.
//!
//! Every test returns early when no GPU adapter is available.

use aurora_engine::camera::CameraPose;
use aurora_engine::device::HeadlessGpu;
use aurora_engine::lights::{LightSet, PointLight};
use aurora_engine::mesh::MeshData;
use aurora_engine::params::PipelineParameters;
use aurora_engine::render::binding::Attachment;
use aurora_engine::render::readback::{CaptureTarget, luminance, read_hdr, read_rgba8};
use aurora_engine::render::targets::SCENE_FRAMEBUFFER;
use aurora_engine::render::{
    Extent, FinalImage, FrameDriver, FrameOutput, ImageRgba8, OutputImage, RenderCtx, RenderError,
    RenderTargetSet, SceneAssets, SceneDesc, TargetId,
};
use aurora_engine::time::FrameClock;
use glam::{Mat4, Vec3};

struct Harness {
    gpu: HeadlessGpu,
    driver: FrameDriver,
    assets: SceneAssets,
}

impl Harness {
    fn new(extent: Extent, lights: LightSet, params: PipelineParameters) -> Option<Self> {
        let gpu = HeadlessGpu::try_blocking()?;
        let ctx = RenderCtx::new(gpu.device(), gpu.queue());

        let driver = FrameDriver::new(
            ctx,
            wgpu::TextureFormat::Rgba8Unorm,
            extent,
            lights,
            params,
        )
        .expect("driver");

        let floor = MeshData::plane(10.0, 10.0)
            .transformed(Mat4::from_translation(Vec3::new(0.0, -0.5, 0.0)));
        let assets =
            SceneAssets::new(ctx, driver.scene_pass(), &SceneDesc::new(&floor)).expect("assets");

        Some(Self {
            gpu,
            driver,
            assets,
        })
    }

    fn ctx(&self) -> RenderCtx<'_> {
        RenderCtx::new(self.gpu.device(), self.gpu.queue())
    }

    /// Ticks once into a fresh capture target of `extent`.
    fn frame(&mut self, extent: Extent, pose: &CameraPose) -> (FrameOutput, CaptureTarget) {
        let capture = CaptureTarget::new(self.gpu.device(), extent);
        let ctx = RenderCtx::new(self.gpu.device(), self.gpu.queue());

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("test frame"),
            });
        let output = self
            .driver
            .tick(ctx, &mut encoder, pose, &self.assets, capture.output())
            .expect("tick");
        ctx.queue.submit(std::iter::once(encoder.finish()));

        (output, capture)
    }

    fn read(&self, capture: &CaptureTarget) -> ImageRgba8 {
        capture.read(self.ctx()).expect("readback")
    }
}

fn front_pose() -> CameraPose {
    CameraPose {
        position: Vec3::new(0.0, 2.0, 3.0),
        target: Vec3::ZERO,
        ..CameraPose::default()
    }
}

fn origin_light() -> LightSet {
    LightSet::single(PointLight {
        position: Vec3::ZERO,
        color: Vec3::ONE,
        intensity: 1.0,
        range: 4.0,
    })
}

fn no_aa() -> PipelineParameters {
    PipelineParameters {
        antialias_enabled: false,
        ..PipelineParameters::default()
    }
}

fn assert_all_targets(targets: &RenderTargetSet, extent: Extent) {
    assert_eq!(targets.extent(), extent);
    for target in targets.iter() {
        assert_eq!(target.extent, extent, "{:?}", target.id);
        assert_eq!(target.texture.width(), extent.width, "{:?}", target.id);
        assert_eq!(target.texture.height(), extent.height, "{:?}", target.id);
    }
}

#[test]
fn allocation_sizes_every_target_and_pairs_the_mrt() {
    let Some(gpu) = HeadlessGpu::try_blocking() else {
        return;
    };
    for extent in [Extent::new(1, 1), Extent::new(640, 480), Extent::new(37, 1013)] {
        let set = RenderTargetSet::allocate(gpu.device(), extent).expect("allocate");
        assert_all_targets(&set, extent);

        let fb = set.scene_framebuffer();
        assert_eq!(fb.colors, [TargetId::HdrColor, TargetId::BrightColor]);
        assert_eq!(fb.draw_buffers, 2);
        assert_eq!(set.get(TargetId::HdrColor).format(), wgpu::TextureFormat::Rgba16Float);
        assert_eq!(set.get(TargetId::AaInput).format(), wgpu::TextureFormat::Rgba8Unorm);
        set.release();
    }
}

#[test]
fn allocation_rejects_empty_and_oversized_extents() {
    let Some(gpu) = HeadlessGpu::try_blocking() else {
        return;
    };
    let max = gpu.device().limits().max_texture_dimension_2d;

    for extent in [Extent::new(0, 600), Extent::new(max + 1, 4)] {
        match RenderTargetSet::allocate(gpu.device(), extent) {
            Err(RenderError::TargetAllocation { width, height, .. }) => {
                assert_eq!((width, height), (extent.width, extent.height));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("{extent:?} should not allocate"),
        }
    }
}

#[test]
fn frame_binds_the_expected_framebuffers() {
    let extent = Extent::new(160, 120);
    let Some(mut h) = Harness::new(extent, origin_light(), PipelineParameters::default()) else {
        return;
    };
    let (output, _capture) = h.frame(extent, &front_pose());
    assert_eq!(output.final_image, FinalImage::Antialiased);

    let bound = h.driver.bindings().bound();
    let labels: Vec<&str> = bound.iter().map(|r| r.label).collect();
    assert_eq!(labels.len(), 1 + 10 + 1 + 1);
    assert_eq!(labels[0], "scene mrt");
    assert_eq!(labels[11], "aa input");
    assert_eq!(labels[12], "fxaa output");

    let scene = &bound[0];
    assert_eq!(
        scene.colors,
        SCENE_FRAMEBUFFER.colors.map(Attachment::Target).to_vec()
    );
    assert_eq!(scene.depth, Some(Attachment::Target(TargetId::Depth)));
    assert_eq!(scene.draw_buffers, 2);
    assert!(bound[1..].iter().all(|r| r.colors.len() == 1 && r.draw_buffers == 1));

    let draws: Vec<(&str, u32)> = h
        .driver
        .bindings()
        .draws()
        .iter()
        .filter(|d| d.framebuffer == "scene mrt")
        .map(|d| (d.pipeline, d.draw_buffers))
        .collect();
    assert_eq!(
        draws,
        vec![("skybox", 1), ("scene lit", 1), ("emissive", 2)]
    );
    assert!(h.driver.bindings().current().is_none());
}

#[test]
fn reallocating_at_the_same_size_keeps_dimensions() {
    let extent = Extent::new(320, 200);
    let Some(mut h) = Harness::new(extent, origin_light(), no_aa()) else {
        return;
    };
    let ctx = RenderCtx::new(h.gpu.device(), h.gpu.queue());

    assert!(!h.driver.sync_size(ctx, extent).expect("sync"));
    h.driver.reallocate(ctx, extent).expect("reallocate");
    assert_all_targets(h.driver.targets(), extent);

    let (output, _capture) = h.frame(extent, &front_pose());
    assert!(!output.reallocated);
}

#[test]
fn resize_then_render_uses_the_new_size() {
    let first = Extent::new(800, 600);
    let second = Extent::new(1024, 768);
    let Some(mut h) = Harness::new(first, origin_light(), PipelineParameters::default()) else {
        return;
    };
    let pose = front_pose();

    let (out, capture) = h.frame(first, &pose);
    assert_eq!(out.extent, first);
    assert_eq!(h.read(&capture).width, 800);

    let (out, capture) = h.frame(second, &pose);
    assert!(out.reallocated);
    assert_eq!(out.extent, second);
    assert_all_targets(h.driver.targets(), second);

    let image = h.read(&capture);
    assert_eq!((image.width, image.height), (1024, 768));
}

#[test]
fn output_size_drives_the_targets() {
    let Some(mut h) = Harness::new(Extent::new(64, 64), origin_light(), no_aa()) else {
        return;
    };
    let larger = Extent::new(128, 128);

    let (out, capture) = h.frame(larger, &front_pose());
    assert!(out.reallocated);
    assert_eq!(out.extent, larger);
    assert_all_targets(h.driver.targets(), larger);

    // The far corner is sky, never left untouched.
    let image = h.read(&capture);
    let [r, g, b, _] = image.pixel(127, 0).expect("corner");
    assert!(r > 0 || g > 0 || b > 0, "corner was not drawn");
}

#[test]
fn empty_output_fails_and_keeps_the_targets() {
    let extent = Extent::new(96, 64);
    let Some(mut h) = Harness::new(extent, origin_light(), no_aa()) else {
        return;
    };
    let capture = CaptureTarget::new(h.gpu.device(), extent);
    let ctx = RenderCtx::new(h.gpu.device(), h.gpu.queue());
    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });

    let empty = OutputImage::new(&capture.view, Extent::new(0, 0));
    match h
        .driver
        .tick(ctx, &mut encoder, &front_pose(), &h.assets, empty)
    {
        Err(RenderError::TargetAllocation { width, height, .. }) => {
            assert_eq!((width, height), (0, 0));
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("an empty output should not render"),
    }
    assert_all_targets(h.driver.targets(), extent);
}

#[test]
fn invalid_sky_faces_fall_back_to_the_gradient() {
    let Some(gpu) = HeadlessGpu::try_blocking() else {
        return;
    };
    let ctx = RenderCtx::new(gpu.device(), gpu.queue());
    let driver = FrameDriver::new(
        ctx,
        wgpu::TextureFormat::Rgba8Unorm,
        Extent::new(32, 32),
        origin_light(),
        no_aa(),
    )
    .expect("driver");

    let mut faces: [ImageRgba8; 6] = std::array::from_fn(|_| ImageRgba8::solid(8, 8, [40; 4]));
    faces[4] = ImageRgba8::solid(8, 4, [40; 4]);
    let floor = MeshData::plane(4.0, 4.0);
    let desc = SceneDesc {
        sky_faces: Some(&faces),
        marker_tint: 0.5,
        ..SceneDesc::new(&floor)
    };
    let assets = SceneAssets::new(ctx, driver.scene_pass(), &desc).expect("gradient fallback");
    assert_eq!(assets.markers.tint(), 0.5);
    assert_eq!(assets.markers.scale(), 0.2);
}

#[test]
fn disabled_antialiasing_copies_the_composite() {
    let extent = Extent::new(192, 144);
    let Some(mut h) = Harness::new(extent, origin_light(), no_aa()) else {
        return;
    };
    let (output, capture) = h.frame(extent, &front_pose());
    assert_eq!(output.final_image, FinalImage::Composite);

    let composite =
        read_rgba8(h.ctx(), &h.driver.targets().get(TargetId::AaInput).texture).expect("aa input");
    let final_image = h.read(&capture);
    assert_eq!(final_image, composite);
}

#[test]
fn fixed_inputs_render_identical_frames() {
    let extent = Extent::new(128, 96);
    let Some(mut h) = Harness::new(extent, LightSet::default(), PipelineParameters::default())
    else {
        return;
    };
    let mut clock = FrameClock::fixed(0.0);
    let pose = CameraPose::default();

    assert_eq!(clock.tick().dt, 0.0);
    let (_, a) = h.frame(extent, &pose);
    assert_eq!(clock.tick().dt, 0.0);
    let (_, b) = h.frame(extent, &pose);

    assert_eq!(h.read(&a), h.read(&b));
}

#[test]
fn lit_scene_has_a_visible_center() {
    let extent = Extent::new(256, 192);
    let Some(mut h) = Harness::new(extent, origin_light(), no_aa()) else {
        return;
    };
    let (output, capture) = h.frame(extent, &front_pose());
    assert_eq!(output.extent, extent);

    let image = h.read(&capture);
    assert_eq!((image.width, image.height), (256, 192));
    let center = image.center_rgb().expect("center pixel");
    assert!(luminance(center) > 0.0, "center {center:?}");
}

#[test]
fn only_markers_reach_the_bright_buffer() {
    let extent = Extent::new(128, 128);

    let dark = LightSet::single(PointLight {
        intensity: 0.0,
        ..PointLight::default()
    });
    let Some(mut h) = Harness::new(extent, dark, no_aa()) else {
        return;
    };
    h.frame(extent, &front_pose());
    let bright =
        read_hdr(h.ctx(), &h.driver.targets().get(TargetId::BrightColor).texture).expect("bright");
    assert_eq!(bright.max_rgb(), 0.0);

    let hdr = read_hdr(h.ctx(), &h.driver.targets().get(TargetId::HdrColor).texture).expect("hdr");
    assert!(hdr.max_rgb() > 0.0, "sky should still be drawn");

    *h.driver.lights_mut() = origin_light();
    h.frame(extent, &front_pose());
    let bright =
        read_hdr(h.ctx(), &h.driver.targets().get(TargetId::BrightColor).texture).expect("bright");
    assert!(bright.max_rgb() > 0.0);
}

#[test]
fn zero_blur_passes_bloom_from_bright() {
    let extent = Extent::new(64, 64);
    let params = PipelineParameters {
        blur_pass_count: 0,
        ..no_aa()
    };
    let Some(mut h) = Harness::new(extent, origin_light(), params) else {
        return;
    };
    let (output, _) = h.frame(extent, &front_pose());
    assert_eq!(output.bloom.target(), TargetId::BrightColor);
    assert!(h.driver.bindings().bound().iter().all(|r| {
        !r.colors.contains(&Attachment::Target(TargetId::Blur0))
            && !r.colors.contains(&Attachment::Target(TargetId::Blur1))
    }));
}
