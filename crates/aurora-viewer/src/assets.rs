//! Optional image assets read from disk.
//!
//! Anything missing or unreadable is logged and left out; the engine then
//! uses its neutral defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use aurora_engine::render::ImageRgba8;
use aurora_engine::render::texture::check_cube_faces;

/// Face file stems in cubemap layer order.
pub const SKYBOX_FACES: [&str; 6] = ["right", "left", "top", "bottom", "front", "back"];
const EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

#[derive(Default)]
pub struct ViewerAssets {
    pub sky_faces: Option<[ImageRgba8; 6]>,
    pub emission: Option<ImageRgba8>,
}

impl ViewerAssets {
    pub fn load(skybox_dir: Option<&Path>, emission: Option<&Path>) -> Self {
        let sky_faces = skybox_dir.and_then(|dir| {
            load_skybox(dir)
                .inspect_err(|e| log::warn!("skybox not loaded: {e:#}"))
                .ok()
        });
        let emission = emission.and_then(|path| {
            load_rgba(path)
                .inspect_err(|e| log::warn!("emission texture not loaded: {e:#}"))
                .ok()
        });
        Self {
            sky_faces,
            emission,
        }
    }
}

pub fn load_rgba(path: &Path) -> Result<ImageRgba8> {
    let image = image::open(path)
        .with_context(|| format!("failed to read {}", path.display()))?
        .to_rgba8();
    log::debug!(
        "loaded {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(ImageRgba8 {
        width: image.width(),
        height: image.height(),
        pixels: image.into_raw(),
    })
}

fn load_skybox(dir: &Path) -> Result<[ImageRgba8; 6]> {
    let mut faces = Vec::with_capacity(6);
    for stem in SKYBOX_FACES {
        let path = face_path(dir, stem)
            .with_context(|| format!("no `{stem}` face in {}", dir.display()))?;
        faces.push(load_rgba(&path)?);
    }
    let faces: [ImageRgba8; 6] = faces
        .try_into()
        .map_err(|_| anyhow::anyhow!("expected six skybox faces"))?;
    // The device limit is checked again at upload.
    let edge = check_cube_faces(&faces, u32::MAX)?;
    log::debug!("skybox faces are {edge}x{edge}");
    Ok(faces)
}

fn face_path(dir: &Path, stem: &str) -> Option<PathBuf> {
    EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|p| p.is_file())
}
