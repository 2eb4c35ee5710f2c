//! Camera pose and the matrices derived from it.

use glam::{Mat4, Vec3, Vec4};

pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 1000.0;

/// Eye placement supplied once per tick.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub vertical_fov: f32,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: Vec3::new(-1.0, 2.0, -0.5),
            target: Vec3::ZERO,
            up: Vec3::Y,
            vertical_fov: 45.0,
        }
    }
}

impl CameraPose {
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// View matrix with the translation removed, used for the skybox.
    pub fn rotation_only_view(&self) -> Mat4 {
        let mut view = self.view();
        view.w_axis = Vec4::W;
        view
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(
            self.vertical_fov.to_radians(),
            aspect.max(f32::EPSILON),
            NEAR_PLANE,
            FAR_PLANE,
        )
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view()
    }

    /// Unit vector from the eye towards the target.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position)
            .try_normalize()
            .unwrap_or(Vec3::NEG_Z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_only_view_ignores_eye_position() {
        let a = CameraPose::default();
        let b = CameraPose {
            position: a.position + Vec3::new(10.0, -3.0, 7.0),
            target: a.target + Vec3::new(10.0, -3.0, 7.0),
            ..a
        };
        let (ra, rb) = (a.rotation_only_view(), b.rotation_only_view());
        assert!(ra.abs_diff_eq(rb, 1e-5));
        assert_eq!(ra.w_axis, Vec4::W);
    }

    #[test]
    fn target_projects_to_screen_center() {
        let pose = CameraPose {
            position: Vec3::new(0.0, 2.0, 3.0),
            ..CameraPose::default()
        };
        let clip = pose.view_projection(4.0 / 3.0) * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5);
        assert!(ndc.y.abs() < 1e-5);
        assert!((0.0..=1.0).contains(&ndc.z));
    }

    #[test]
    fn projection_tracks_aspect() {
        let pose = CameraPose::default();
        let wide = pose.projection(2.0);
        let square = pose.projection(1.0);
        assert!((wide.x_axis.x * 2.0 - square.x_axis.x).abs() < 1e-5);
        assert!((wide.y_axis.y - square.y_axis.y).abs() < 1e-6);
    }
}
