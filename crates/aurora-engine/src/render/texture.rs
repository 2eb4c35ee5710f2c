//! Sampled textures: 2D material maps and the skybox cubemap.
//!
//! Missing optional maps are replaced by 1x1 neutral textures so every
//! pipeline always sees a complete bind group.

use super::error::{RenderError, RenderResult};

/// Tightly packed RGBA8 pixels, row 0 at the top.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRgba8 {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl ImageRgba8 {
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take((width * height * 4) as usize)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        let p = self.pixels.get(i..i + 4)?;
        Some([p[0], p[1], p[2], p[3]])
    }

    /// Normalized RGB of the center pixel.
    pub fn center_rgb(&self) -> Option<[f32; 3]> {
        let [r, g, b, _] = self.pixel(self.width / 2, self.height / 2)?;
        Some([r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0])
    }

    /// Checks the pixel count and that neither side exceeds `max_dimension`.
    pub fn validate(&self, label: &str, max_dimension: u32) -> RenderResult<()> {
        let invalid = |reason: String| RenderError::InvalidTexture {
            label: label.to_string(),
            reason,
        };
        let expected = self.width as usize * self.height as usize * 4;
        if self.width == 0 || self.height == 0 || self.pixels.len() != expected {
            return Err(invalid(format!(
                "{}x{} needs {expected} bytes, got {}",
                self.width,
                self.height,
                self.pixels.len()
            )));
        }
        if self.width > max_dimension || self.height > max_dimension {
            return Err(invalid(format!(
                "{}x{} exceeds the device limit of {max_dimension}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Validates six cube faces and returns their common edge length.
///
/// Faces must be square, the same size and within `max_dimension`.
pub fn check_cube_faces(faces: &[ImageRgba8; 6], max_dimension: u32) -> RenderResult<u32> {
    let edge = faces[0].width;
    for (i, face) in faces.iter().enumerate() {
        let label = format!("skybox face {i}");
        face.validate(&label, max_dimension)?;
        if face.width != edge || face.height != edge {
            return Err(RenderError::InvalidTexture {
                label,
                reason: format!(
                    "faces must be square and equal, expected {edge}x{edge}, got {}x{}",
                    face.width, face.height
                ),
            });
        }
    }
    Ok(edge)
}

/// Color space of an uploaded material map.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ColorSpace {
    /// Color data; decoded to linear on sampling.
    Srgb,
    /// Non-color data such as normal maps.
    Linear,
}

impl ColorSpace {
    fn format(self) -> wgpu::TextureFormat {
        match self {
            ColorSpace::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            ColorSpace::Linear => wgpu::TextureFormat::Rgba8Unorm,
        }
    }
}

pub struct Texture2d {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl Texture2d {
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        image: &ImageRgba8,
        space: ColorSpace,
    ) -> RenderResult<Self> {
        image.validate(label, device.limits().max_texture_dimension_2d)?;

        let size = wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: space.format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        write_layer(queue, &texture, 0, image);

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(Self { texture, view })
    }

    /// Uses `image` when present and valid, otherwise a 1x1 texture of
    /// `fallback`. A rejected image is logged, not returned as an error.
    pub fn or_default(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        image: Option<&ImageRgba8>,
        fallback: [u8; 4],
        space: ColorSpace,
    ) -> RenderResult<Self> {
        if let Some(image) = image {
            match Self::from_image(device, queue, label, image, space) {
                Ok(texture) => return Ok(texture),
                Err(e) => log::warn!("{e}; using neutral default"),
            }
        } else {
            log::debug!("`{label}` not provided; using neutral default");
        }
        Self::from_image(device, queue, label, &ImageRgba8::solid(1, 1, fallback), space)
    }
}

/// Neutral defaults for missing maps.
pub const WHITE: [u8; 4] = [255, 255, 255, 255];
pub const FLAT_NORMAL: [u8; 4] = [128, 128, 255, 255];

/// Cube face order: +X, -X, +Y, -Y, +Z, -Z (right, left, top, bottom, front, back).
pub struct Cubemap {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl Cubemap {
    pub fn from_faces(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        faces: &[ImageRgba8; 6],
    ) -> RenderResult<Self> {
        let edge = check_cube_faces(faces, device.limits().max_texture_dimension_2d)?;

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("aurora skybox cubemap"),
            size: wgpu::Extent3d {
                width: edge,
                height: edge,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        for (layer, face) in faces.iter().enumerate() {
            write_layer(queue, &texture, layer as u32, face);
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("aurora skybox cube view"),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        Ok(Self { texture, view })
    }

    /// Procedural horizon gradient used when no face images are supplied.
    pub fn gradient(device: &wgpu::Device, queue: &wgpu::Queue, size: u32) -> RenderResult<Self> {
        let faces = std::array::from_fn(|face| gradient_face(face, size.max(2)));
        Self::from_faces(device, queue, &faces)
    }
}

const ZENITH: [f32; 3] = [0.10, 0.18, 0.42];
const HORIZON: [f32; 3] = [0.55, 0.62, 0.75];
const GROUND: [f32; 3] = [0.08, 0.07, 0.06];

/// One face of the gradient sky, shaded by the elevation of each texel direction.
fn gradient_face(face: usize, size: u32) -> ImageRgba8 {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let s = (x as f32 + 0.5) / size as f32 * 2.0 - 1.0;
            let t = (y as f32 + 0.5) / size as f32 * 2.0 - 1.0;
            let dir = face_direction(face, s, t);
            let len = (dir[0] * dir[0] + dir[1] * dir[1] + dir[2] * dir[2]).sqrt();
            let elevation = dir[1] / len;

            let rgb = if elevation >= 0.0 {
                lerp3(HORIZON, ZENITH, elevation.powf(0.6))
            } else {
                lerp3(HORIZON, GROUND, (-elevation).powf(0.4))
            };
            for c in rgb {
                pixels.push((c.clamp(0.0, 1.0) * 255.0).round() as u8);
            }
            pixels.push(255);
        }
    }
    ImageRgba8 {
        width: size,
        height: size,
        pixels,
    }
}

/// Direction through texel `(s, t)` in [-1, 1] of cube `face`.
fn face_direction(face: usize, s: f32, t: f32) -> [f32; 3] {
    match face {
        0 => [1.0, -t, -s],
        1 => [-1.0, -t, s],
        2 => [s, 1.0, t],
        3 => [s, -1.0, -t],
        4 => [s, -t, 1.0],
        _ => [-s, -t, -1.0],
    }
}

fn lerp3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    std::array::from_fn(|i| a[i] + (b[i] - a[i]) * t)
}

fn write_layer(queue: &wgpu::Queue, texture: &wgpu::Texture, layer: u32, image: &ImageRgba8) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d {
                x: 0,
                y: 0,
                z: layer,
            },
            aspect: wgpu::TextureAspect::All,
        },
        &image.pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(image.width * 4),
            rows_per_image: Some(image.height),
        },
        wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        },
    );
}

/// Linear clamp sampler shared by the post-processing passes.
pub fn linear_clamp_sampler(device: &wgpu::Device, label: &str) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

/// Repeating sampler for material maps.
pub fn linear_repeat_sampler(device: &wgpu::Device, label: &str) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_image_has_exact_size() {
        let img = ImageRgba8::solid(3, 2, [1, 2, 3, 4]);
        assert_eq!(img.pixels.len(), 24);
        assert_eq!(img.pixel(2, 1), Some([1, 2, 3, 4]));
        assert_eq!(img.pixel(3, 0), None);
        assert!(img.validate("solid", 8).is_ok());
    }

    #[test]
    fn truncated_pixels_are_rejected() {
        let mut img = ImageRgba8::solid(2, 2, WHITE);
        img.pixels.pop();
        assert!(matches!(
            img.validate("broken", 8),
            Err(RenderError::InvalidTexture { .. })
        ));
    }

    #[test]
    fn images_over_the_limit_are_rejected() {
        let img = ImageRgba8::solid(4, 2, WHITE);
        assert!(img.validate("wide", 4).is_ok());
        assert!(matches!(
            img.validate("wide", 3),
            Err(RenderError::InvalidTexture { .. })
        ));
    }

    #[test]
    fn cube_faces_must_be_square_equal_and_in_limits() {
        let square = || ImageRgba8::solid(4, 4, WHITE);
        let faces: [ImageRgba8; 6] = std::array::from_fn(|_| square());
        assert_eq!(check_cube_faces(&faces, 16).expect("valid faces"), 4);
        assert!(check_cube_faces(&faces, 3).is_err());

        let mut wide = faces.clone();
        wide[0] = ImageRgba8::solid(8, 4, WHITE);
        assert!(check_cube_faces(&wide, 16).is_err());

        let mut unequal = faces;
        unequal[5] = ImageRgba8::solid(2, 2, WHITE);
        match check_cube_faces(&unequal, 16) {
            Err(RenderError::InvalidTexture { label, .. }) => assert_eq!(label, "skybox face 5"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn gradient_sky_is_brighter_above_than_below() {
        let top = gradient_face(2, 8);
        let bottom = gradient_face(3, 8);
        let luma = |img: &ImageRgba8| {
            let [r, g, b, _] = img.pixel(4, 4).unwrap();
            r as u32 + g as u32 + b as u32
        };
        assert!(luma(&top) > luma(&bottom));
    }

    #[test]
    fn face_directions_point_outward() {
        let axes = [
            [1.0, 0.0, 0.0],
            [-1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, -1.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.0, -1.0],
        ];
        for (face, axis) in axes.iter().enumerate() {
            assert_eq!(face_direction(face, 0.0, 0.0), *axis);
        }
    }
}
