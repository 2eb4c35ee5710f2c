use glam::Vec3;

/// Tunables read by the passes every frame.
///
/// Values are used as given. Non-positive exposure or gamma produce a
/// degenerate image, not an error.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PipelineParameters {
    pub ambient_color: Vec3,
    pub specular_color: Vec3,
    pub shininess: f32,
    pub exposure: f32,
    pub gamma: f32,
    pub antialias_enabled: bool,
    pub blur_pass_count: u32,
}

impl Default for PipelineParameters {
    fn default() -> Self {
        Self {
            ambient_color: Vec3::splat(0.001),
            specular_color: Vec3::ONE,
            shininess: 32.0,
            exposure: 1.0,
            gamma: 2.2,
            antialias_enabled: true,
            blur_pass_count: 10,
        }
    }
}
