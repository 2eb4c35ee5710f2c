//! Procedural meshes and their GPU buffers.
//!
//! All generators produce counter-clockwise front faces, per-vertex normals,
//! UVs and tangents (`w` = bitangent sign) so normal maps work unchanged.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub tangent: [f32; 4],
}

impl Vertex {
    const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3, // normal
        2 => Float32x2, // uv
        3 => Float32x4  // tangent
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// CPU-side indexed triangle list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Axis-aligned cube of edge `size`, centred on the origin.
    pub fn cube(size: f32) -> Self {
        Self::cuboid(Vec3::splat(size * 0.5))
    }

    /// Axis-aligned box spanning `min..max`.
    pub fn aabb(min: Vec3, max: Vec3) -> Self {
        let half = (max - min) * 0.5;
        Self::cuboid(half).transformed(Mat4::from_translation(min + half))
    }

    fn cuboid(half: Vec3) -> Self {
        // (normal, u axis, v axis) per face; u x v = normal.
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];

        let mut mesh = Self::default();
        for (n, u, v) in faces {
            let base = mesh.vertices.len() as u32;
            let center = n * half;
            let du = u * half;
            let dv = v * half;
            // Face extents keep UVs at world scale.
            let u_len = (u * half).length() * 2.0;
            let v_len = (v * half).length() * 2.0;

            for (su, sv) in [(-1.0f32, -1.0f32), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let p = center + du * su + dv * sv;
                let uv = Vec2::new((su + 1.0) * 0.5 * u_len, (1.0 - sv) * 0.5 * v_len);
                mesh.vertices.push(Vertex {
                    position: p.to_array(),
                    normal: n.to_array(),
                    uv: uv.to_array(),
                    tangent: u.extend(1.0).to_array(),
                });
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        mesh
    }

    /// Horizontal plane at y = 0 facing +Y.
    pub fn plane(width: f32, depth: f32) -> Self {
        let hw = width * 0.5;
        let hd = depth * 0.5;
        let corners = [
            (Vec3::new(-hw, 0.0, hd), Vec2::new(0.0, depth)),
            (Vec3::new(hw, 0.0, hd), Vec2::new(width, depth)),
            (Vec3::new(hw, 0.0, -hd), Vec2::new(width, 0.0)),
            (Vec3::new(-hw, 0.0, -hd), Vec2::new(0.0, 0.0)),
        ];
        Self {
            vertices: corners
                .iter()
                .map(|(p, uv)| Vertex {
                    position: p.to_array(),
                    normal: Vec3::Y.to_array(),
                    uv: uv.to_array(),
                    tangent: [1.0, 0.0, 0.0, 1.0],
                })
                .collect(),
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    /// UV sphere with `rings` latitude bands and `sectors` longitude bands.
    pub fn uv_sphere(radius: f32, rings: u32, sectors: u32) -> Self {
        let rings = rings.max(2);
        let sectors = sectors.max(3);
        let mut mesh = Self::default();

        for r in 0..=rings {
            let v = r as f32 / rings as f32;
            let theta = v * std::f32::consts::PI;
            for s in 0..=sectors {
                let u = s as f32 / sectors as f32;
                let phi = u * std::f32::consts::TAU;
                let n = Vec3::new(theta.sin() * phi.cos(), theta.cos(), -theta.sin() * phi.sin());
                // d/dphi of the position, constant at the poles.
                let t = Vec3::new(-phi.sin(), 0.0, -phi.cos());
                mesh.vertices.push(Vertex {
                    position: (n * radius).to_array(),
                    normal: n.to_array(),
                    uv: [u, v],
                    tangent: t.extend(1.0).to_array(),
                });
            }
        }

        let stride = sectors + 1;
        for r in 0..rings {
            for s in 0..sectors {
                let a = r * stride + s;
                let b = a + stride;
                mesh.indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
            }
        }
        mesh
    }

    /// Applies `m` to positions and its normal matrix to normals/tangents.
    pub fn transformed(mut self, m: Mat4) -> Self {
        let normal_m = m.inverse().transpose();
        for v in &mut self.vertices {
            v.position = m.transform_point3(Vec3::from(v.position)).to_array();
            v.normal = normal_m
                .transform_vector3(Vec3::from(v.normal))
                .normalize_or_zero()
                .to_array();
            let t = m
                .transform_vector3(Vec3::new(v.tangent[0], v.tangent[1], v.tangent[2]))
                .normalize_or_zero();
            v.tangent = t.extend(v.tangent[3]).to_array();
        }
        self
    }

    /// Appends `other`, re-basing its indices.
    pub fn merge(&mut self, other: &MeshData) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Uploaded mesh.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    pub fn upload(device: &wgpu::Device, label: &str, mesh: &MeshData) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} vbo")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} ibo")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        }
    }

    pub fn bind<'p>(&self, pass: &mut wgpu::RenderPass<'p>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
    }
}
