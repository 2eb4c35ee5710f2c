//! Scene pass.
//!
//! One render pass over the multiple-render-target framebuffer:
//! skybox, then lit geometry, then the emissive light markers. The first two
//! pipelines mask off the bright attachment, so only markers reach it.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::camera::CameraPose;
use crate::lights::{LightArrays, LightSet, MAX_LIGHTS};
use crate::mesh::{GpuMesh, MeshData, Vertex};
use crate::params::PipelineParameters;

use super::binding::{
    Attachment, BindingState, ColorTarget, DepthTarget, FramebufferBinding, PassPipeline,
};
use super::common::{sampler_entry, texture_entry, uniform_buffer, uniform_entry};
use super::ctx::RenderCtx;
use super::error::RenderResult;
use super::targets::{DEPTH_FORMAT, HDR_FORMAT, RenderTargetSet, SCENE_FRAMEBUFFER};
use super::texture::{
    ColorSpace, Cubemap, FLAT_NORMAL, ImageRgba8, Texture2d, WHITE, linear_clamp_sampler,
    linear_repeat_sampler,
};

/// Face edge of the procedural sky used when no valid faces are supplied.
const GRADIENT_SKY_SIZE: u32 = 64;

// ── uniform blocks ────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct SceneUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub eye: [f32; 4],
    /// rgb ambient, w shininess.
    pub ambient_shininess: [f32; 4],
    pub specular: [f32; 4],
    pub lights: LightArrays,
}

impl SceneUniforms {
    pub fn new(
        pose: &CameraPose,
        aspect: f32,
        lights: &LightSet,
        params: &PipelineParameters,
    ) -> Self {
        Self {
            view_proj: pose.view_projection(aspect).to_cols_array_2d(),
            eye: pose.position.extend(1.0).to_array(),
            ambient_shininess: params.ambient_color.extend(params.shininess).to_array(),
            specular: params.specular_color.extend(0.0).to_array(),
            lights: lights.to_arrays(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct SkyUniforms {
    rotation_view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
}

// ── marker instances ──────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MarkerInstance {
    pub model: [[f32; 4]; 4],
    /// rgb color, a intensity.
    pub emissive: [f32; 4],
}

impl MarkerInstance {
    const ATTRS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        4 => Float32x4, // model col 0
        5 => Float32x4, // model col 1
        6 => Float32x4, // model col 2
        7 => Float32x4, // model col 3
        8 => Float32x4  // emissive
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MarkerInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

/// One marker per light with positive intensity, placed at the light.
///
/// `tint` scales the marker color only; the lit shading never sees it.
pub fn marker_instances(lights: &LightSet, scale: f32, tint: f32) -> Vec<MarkerInstance> {
    lights
        .iter()
        .filter(|l| l.intensity > 0.0)
        .map(|l| MarkerInstance {
            model: (Mat4::from_translation(l.position) * Mat4::from_scale(Vec3::splat(scale)))
                .to_cols_array_2d(),
            emissive: (l.color * tint).extend(l.intensity).to_array(),
        })
        .collect()
}

// ── assets ────────────────────────────────────────────────────────────────

/// Inputs for building `SceneAssets`. Every image is optional.
pub struct SceneDesc<'a> {
    /// World-space opaque geometry.
    pub geometry: &'a MeshData,
    pub diffuse: Option<&'a ImageRgba8>,
    pub normal: Option<&'a ImageRgba8>,
    pub emission: Option<&'a ImageRgba8>,
    pub sky_faces: Option<&'a [ImageRgba8; 6]>,
    pub marker_radius: f32,
    pub marker_scale: f32,
    /// Multiplier on marker color, e.g. from `lights::emission_mask`.
    pub marker_tint: f32,
}

impl<'a> SceneDesc<'a> {
    pub fn new(geometry: &'a MeshData) -> Self {
        Self {
            geometry,
            diffuse: None,
            normal: None,
            emission: None,
            sky_faces: None,
            marker_radius: 0.2,
            marker_scale: 0.2,
            marker_tint: 1.0,
        }
    }
}

pub struct SceneModel {
    mesh: GpuMesh,
    material: wgpu::BindGroup,
}

pub struct Skybox {
    mesh: GpuMesh,
    bind_group: wgpu::BindGroup,
    #[allow(dead_code)]
    cubemap: Cubemap,
}

pub struct LightMarkers {
    mesh: GpuMesh,
    emission: wgpu::BindGroup,
    scale: f32,
    tint: f32,
}

impl LightMarkers {
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn tint(&self) -> f32 {
        self.tint
    }
}

/// GPU resources the scene pass draws.
///
/// Holds no reference to the render targets, so it survives resizes.
pub struct SceneAssets {
    pub model: SceneModel,
    pub skybox: Skybox,
    pub markers: LightMarkers,
}

impl SceneAssets {
    pub fn new(ctx: RenderCtx<'_>, pass: &ScenePass, desc: &SceneDesc<'_>) -> RenderResult<Self> {
        let RenderCtx { device, queue } = ctx;

        let diffuse = Texture2d::or_default(
            device,
            queue,
            "aurora diffuse map",
            desc.diffuse,
            WHITE,
            ColorSpace::Srgb,
        )?;
        let normal = Texture2d::or_default(
            device,
            queue,
            "aurora normal map",
            desc.normal,
            FLAT_NORMAL,
            ColorSpace::Linear,
        )?;
        let emission = Texture2d::or_default(
            device,
            queue,
            "aurora emission map",
            desc.emission,
            WHITE,
            ColorSpace::Srgb,
        )?;
        let cubemap = match desc.sky_faces.map(|faces| Cubemap::from_faces(device, queue, faces)) {
            Some(Ok(cubemap)) => cubemap,
            Some(Err(e)) => {
                log::warn!("{e}; using gradient sky");
                Cubemap::gradient(device, queue, GRADIENT_SKY_SIZE)?
            }
            None => {
                log::debug!("no skybox faces provided; using gradient sky");
                Cubemap::gradient(device, queue, GRADIENT_SKY_SIZE)?
            }
        };

        let material = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("aurora material bind group"),
            layout: &pass.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&diffuse.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&normal.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&pass.repeat_sampler),
                },
            ],
        });

        let emission_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("aurora emission bind group"),
            layout: &pass.emission_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&emission.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&pass.clamp_sampler),
                },
            ],
        });

        let sky_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("aurora skybox bind group"),
            layout: &pass.sky_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: pass.sky_ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&cubemap.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&pass.clamp_sampler),
                },
            ],
        });

        let marker_mesh = MeshData::uv_sphere(desc.marker_radius, 32, 32);

        Ok(Self {
            model: SceneModel {
                mesh: GpuMesh::upload(device, "aurora scene", desc.geometry),
                material,
            },
            skybox: Skybox {
                mesh: GpuMesh::upload(device, "aurora skybox", &MeshData::cube(1.0)),
                bind_group: sky_group,
                cubemap,
            },
            markers: LightMarkers {
                mesh: GpuMesh::upload(device, "aurora marker", &marker_mesh),
                emission: emission_group,
                scale: desc.marker_scale,
                tint: desc.marker_tint,
            },
        })
    }
}

// ── pass ──────────────────────────────────────────────────────────────────

/// Per-frame inputs of the scene pass.
pub struct SceneInputs<'a> {
    pub pose: &'a CameraPose,
    pub lights: &'a LightSet,
    pub params: &'a PipelineParameters,
}

pub struct ScenePass {
    skybox: PassPipeline,
    lit: PassPipeline,
    emissive: PassPipeline,

    material_layout: wgpu::BindGroupLayout,
    emission_layout: wgpu::BindGroupLayout,
    sky_layout: wgpu::BindGroupLayout,

    scene_ubo: wgpu::Buffer,
    sky_ubo: wgpu::Buffer,
    camera_ubo: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,
    camera_bind_group: wgpu::BindGroup,

    marker_vbo: wgpu::Buffer,

    repeat_sampler: wgpu::Sampler,
    clamp_sampler: wgpu::Sampler,
}

impl ScenePass {
    pub fn new(device: &wgpu::Device) -> Self {
        let scene_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("aurora scene bgl"),
            entries: &[uniform_entry::<SceneUniforms>(
                0,
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            )],
        });
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("aurora material bgl"),
            entries: &[
                texture_entry(0, wgpu::TextureViewDimension::D2),
                texture_entry(1, wgpu::TextureViewDimension::D2),
                sampler_entry(2),
            ],
        });
        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("aurora camera bgl"),
            entries: &[uniform_entry::<CameraUniform>(0, wgpu::ShaderStages::VERTEX)],
        });
        let emission_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("aurora emission bgl"),
            entries: &[texture_entry(0, wgpu::TextureViewDimension::D2), sampler_entry(1)],
        });
        let sky_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("aurora skybox bgl"),
            entries: &[
                uniform_entry::<SkyUniforms>(0, wgpu::ShaderStages::VERTEX),
                texture_entry(1, wgpu::TextureViewDimension::Cube),
                sampler_entry(2),
            ],
        });

        let skybox = scene_pipeline(
            device,
            SceneStage {
                label: "skybox",
                source: include_str!("shaders/skybox.wgsl"),
                layouts: &[&sky_layout],
                instance: None,
                draw_buffers: 1,
                cull_mode: None,
                depth_write: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
            },
        );
        let lit = scene_pipeline(
            device,
            SceneStage {
                label: "scene lit",
                source: include_str!("shaders/scene_lit.wgsl"),
                layouts: &[&scene_layout, &material_layout],
                instance: None,
                draw_buffers: 1,
                cull_mode: Some(wgpu::Face::Back),
                depth_write: true,
                depth_compare: wgpu::CompareFunction::Less,
            },
        );
        let emissive = scene_pipeline(
            device,
            SceneStage {
                label: "emissive",
                source: include_str!("shaders/emissive.wgsl"),
                layouts: &[&camera_layout, &emission_layout],
                instance: Some(MarkerInstance::layout()),
                draw_buffers: 2,
                cull_mode: Some(wgpu::Face::Back),
                depth_write: true,
                depth_compare: wgpu::CompareFunction::Less,
            },
        );

        let scene_ubo = uniform_buffer::<SceneUniforms>(device, "aurora scene ubo");
        let sky_ubo = uniform_buffer::<SkyUniforms>(device, "aurora skybox ubo");
        let camera_ubo = uniform_buffer::<CameraUniform>(device, "aurora camera ubo");

        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("aurora scene bind group"),
            layout: &scene_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_ubo.as_entire_binding(),
            }],
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("aurora camera bind group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_ubo.as_entire_binding(),
            }],
        });

        let marker_vbo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("aurora marker instance vbo"),
            size: (MAX_LIGHTS * std::mem::size_of::<MarkerInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            skybox,
            lit,
            emissive,
            material_layout,
            emission_layout,
            sky_layout,
            scene_ubo,
            sky_ubo,
            camera_ubo,
            scene_bind_group,
            camera_bind_group,
            marker_vbo,
            repeat_sampler: linear_repeat_sampler(device, "aurora material sampler"),
            clamp_sampler: linear_clamp_sampler(device, "aurora scene clamp sampler"),
        }
    }

    /// Renders the scene into `hdr_color` and `bright_color`.
    pub fn record(
        &self,
        ctx: RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        bindings: &mut BindingState,
        targets: &RenderTargetSet,
        assets: &SceneAssets,
        inputs: &SceneInputs<'_>,
    ) -> RenderResult<()> {
        let aspect = targets.extent().aspect();
        let pose = inputs.pose;

        let scene = SceneUniforms::new(pose, aspect, inputs.lights, inputs.params);
        let sky = SkyUniforms {
            rotation_view: pose.rotation_only_view().to_cols_array_2d(),
            projection: pose.projection(aspect).to_cols_array_2d(),
        };
        let camera = CameraUniform {
            view_proj: scene.view_proj,
        };
        ctx.queue.write_buffer(&self.scene_ubo, 0, bytemuck::bytes_of(&scene));
        ctx.queue.write_buffer(&self.sky_ubo, 0, bytemuck::bytes_of(&sky));
        ctx.queue.write_buffer(&self.camera_ubo, 0, bytemuck::bytes_of(&camera));

        let markers = marker_instances(inputs.lights, assets.markers.scale, assets.markers.tint);
        if !markers.is_empty() {
            ctx.queue
                .write_buffer(&self.marker_vbo, 0, bytemuck::cast_slice(&markers));
        }

        let [hdr_id, bright_id] = SCENE_FRAMEBUFFER.colors;
        let black = Some(wgpu::Color::BLACK);
        let mut fb = FramebufferBinding::begin(
            encoder,
            bindings,
            "scene mrt",
            &[
                ColorTarget {
                    id: Attachment::Target(hdr_id),
                    view: &targets.get(hdr_id).view,
                    clear: black,
                },
                ColorTarget {
                    id: Attachment::Target(bright_id),
                    view: &targets.get(bright_id).view,
                    clear: black,
                },
            ],
            Some(DepthTarget {
                id: Attachment::Target(SCENE_FRAMEBUFFER.depth),
                view: &targets.get(SCENE_FRAMEBUFFER.depth).view,
                clear: 1.0,
            }),
        );

        fb.use_pipeline(&self.skybox)?;
        fb.pass().set_bind_group(0, &assets.skybox.bind_group, &[]);
        assets.skybox.mesh.bind(fb.pass());
        fb.draw_indexed(0..assets.skybox.mesh.index_count, 0..1);

        fb.use_pipeline(&self.lit)?;
        fb.pass().set_bind_group(0, &self.scene_bind_group, &[]);
        fb.pass().set_bind_group(1, &assets.model.material, &[]);
        assets.model.mesh.bind(fb.pass());
        fb.draw_indexed(0..assets.model.mesh.index_count, 0..1);

        if markers.is_empty() {
            return Ok(());
        }
        fb.use_pipeline(&self.emissive)?;
        fb.pass().set_bind_group(0, &self.camera_bind_group, &[]);
        fb.pass().set_bind_group(1, &assets.markers.emission, &[]);
        assets.markers.mesh.bind(fb.pass());
        fb.pass().set_vertex_buffer(1, self.marker_vbo.slice(..));
        fb.draw_indexed(
            0..assets.markers.mesh.index_count,
            0..markers.len() as u32,
        );
        Ok(())
    }
}

struct SceneStage<'a> {
    label: &'static str,
    source: &'a str,
    layouts: &'a [&'a wgpu::BindGroupLayout],
    instance: Option<wgpu::VertexBufferLayout<'static>>,
    draw_buffers: u32,
    cull_mode: Option<wgpu::Face>,
    depth_write: bool,
    depth_compare: wgpu::CompareFunction,
}

/// Builds a pipeline targeting the scene framebuffer.
///
/// Attachments beyond `draw_buffers` get an empty write mask.
fn scene_pipeline(device: &wgpu::Device, stage: SceneStage<'_>) -> PassPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(stage.label),
        source: wgpu::ShaderSource::Wgsl(stage.source.into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(stage.label),
        bind_group_layouts: stage.layouts,
        immediate_size: 0,
    });

    let targets: Vec<Option<wgpu::ColorTargetState>> = (0..SCENE_FRAMEBUFFER.draw_buffers)
        .map(|slot| {
            Some(wgpu::ColorTargetState {
                format: HDR_FORMAT,
                blend: None,
                write_mask: if slot < stage.draw_buffers {
                    wgpu::ColorWrites::ALL
                } else {
                    wgpu::ColorWrites::empty()
                },
            })
        })
        .collect();

    let mut buffers = vec![Vertex::layout()];
    buffers.extend(stage.instance);

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(stage.label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &targets,
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: stage.cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: stage.depth_write,
            depth_compare: stage.depth_compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    });

    log::debug!(
        "created pipeline `{}` ({} draw buffers)",
        stage.label,
        stage.draw_buffers
    );

    PassPipeline {
        label: stage.label,
        pipeline,
        draw_buffers: stage.draw_buffers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lights::PointLight;

    #[test]
    fn uniform_blocks_are_16_byte_multiples() {
        assert_eq!(std::mem::size_of::<SceneUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<SceneUniforms>(), 64 + 3 * 16 + 2 * MAX_LIGHTS * 16);
        assert_eq!(std::mem::size_of::<SkyUniforms>(), 128);
        assert_eq!(std::mem::size_of::<MarkerInstance>(), 80);
    }

    #[test]
    fn dark_lights_get_no_marker() {
        let mut lights = LightSet::single(PointLight::default());
        lights.get_mut(3).unwrap().intensity = 2.0;
        let markers = marker_instances(&lights, 0.2, 1.0);
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[1].emissive[3], 2.0);
    }

    #[test]
    fn tint_scales_marker_color_but_not_the_lights() {
        let lights = LightSet::single(PointLight {
            color: Vec3::new(1.0, 0.5, 0.25),
            intensity: 3.0,
            ..PointLight::default()
        });
        let markers = marker_instances(&lights, 0.2, 0.5);
        assert_eq!(markers[0].emissive, [0.5, 0.25, 0.125, 3.0]);

        let arrays = lights.to_arrays();
        assert_eq!(arrays.color_intensity[0], [1.0, 0.5, 0.25, 3.0]);
    }

    #[test]
    fn marker_model_places_and_scales() {
        let lights = LightSet::single(PointLight {
            position: Vec3::new(1.0, 2.0, 3.0),
            ..PointLight::default()
        });
        let m = Mat4::from_cols_array_2d(&marker_instances(&lights, 0.5, 1.0)[0].model);
        let p = m.transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert!(p.abs_diff_eq(Vec3::new(1.5, 2.0, 3.0), 1e-6));
    }

    #[test]
    fn scene_uniforms_pack_parameters() {
        let params = PipelineParameters::default();
        let u = SceneUniforms::new(&CameraPose::default(), 1.5, &LightSet::default(), &params);
        assert_eq!(u.ambient_shininess[3], 32.0);
        assert_eq!(u.eye, [-1.0, 2.0, -0.5, 1.0]);
        assert_eq!(u.specular[..3], [1.0, 1.0, 1.0]);
    }
}
