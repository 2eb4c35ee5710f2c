//! Point lights and their GPU layout.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Number of light slots. The lit shader loops over exactly this many.
pub const MAX_LIGHTS: usize = 8;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    /// Linear RGB, not clamped.
    pub color: Vec3,
    pub intensity: f32,
    /// Distance at which the contribution fades to zero.
    pub range: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            color: Vec3::ONE,
            intensity: 1.0,
            range: 4.0,
        }
    }
}

/// Fixed-size set of point lights, edited in place between frames.
#[derive(Debug, Clone, PartialEq)]
pub struct LightSet {
    lights: [PointLight; MAX_LIGHTS],
}

impl LightSet {
    /// Every slot holds a copy of `light`.
    pub fn uniform(light: PointLight) -> Self {
        Self {
            lights: [light; MAX_LIGHTS],
        }
    }

    /// Demo layout: a row of lights at y = 1.7, the rest parked at the origin.
    pub fn row() -> Self {
        let mut set = Self::uniform(PointLight::default());
        for (light, x) in set.lights.iter_mut().zip([8.3, 4.3, 0.3, -4.3]) {
            light.position = Vec3::new(x, 1.7, 0.0);
        }
        set
    }

    /// Only the first slot lit; the others have zero intensity.
    pub fn single(light: PointLight) -> Self {
        let mut set = Self::uniform(PointLight {
            intensity: 0.0,
            ..PointLight::default()
        });
        set.lights[0] = light;
        set
    }

    pub fn get(&self, index: usize) -> Option<&PointLight> {
        self.lights.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut PointLight> {
        self.lights.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PointLight> {
        self.lights.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PointLight> {
        self.lights.iter_mut()
    }

    /// Packs the set into the contiguous arrays the lit shader reads.
    pub fn to_arrays(&self) -> LightArrays {
        let mut arrays = LightArrays::zeroed();
        for (i, light) in self.lights.iter().enumerate() {
            arrays.position_range[i] = light.position.extend(light.range).to_array();
            arrays.color_intensity[i] = light.color.extend(light.intensity).to_array();
        }
        arrays
    }
}

impl Default for LightSet {
    fn default() -> Self {
        Self::row()
    }
}

/// Light uniform block: `xyz` + range, `rgb` + intensity.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct LightArrays {
    pub position_range: [[f32; 4]; MAX_LIGHTS],
    pub color_intensity: [[f32; 4]; MAX_LIGHTS],
}

/// Marker tint derived from an emission image sample.
///
/// Rec. 709 luminance, boosted by 1.5 and softened with a 0.8 power.
pub fn emission_mask(rgb: [f32; 3]) -> f32 {
    let lum = 0.2126 * rgb[0] + 0.7152 * rgb[1] + 0.0722 * rgb[2];
    (lum * 1.5).max(0.0).powf(0.8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_layout_places_four_lights() {
        let set = LightSet::row();
        let xs: Vec<f32> = set.iter().take(4).map(|l| l.position.x).collect();
        assert_eq!(xs, vec![8.3, 4.3, 0.3, -4.3]);
        assert!(set.iter().take(4).all(|l| l.position.y == 1.7));
        assert!(set.iter().skip(4).all(|l| l.position == Vec3::ZERO));
    }

    #[test]
    fn arrays_follow_slot_order() {
        let mut set = LightSet::single(PointLight {
            position: Vec3::new(1.0, 2.0, 3.0),
            color: Vec3::new(0.5, 0.25, 2.0),
            intensity: 3.0,
            range: 6.0,
        });
        set.get_mut(7).unwrap().range = 9.0;

        let arrays = set.to_arrays();
        assert_eq!(arrays.position_range[0], [1.0, 2.0, 3.0, 6.0]);
        assert_eq!(arrays.color_intensity[0], [0.5, 0.25, 2.0, 3.0]);
        assert_eq!(arrays.color_intensity[1][3], 0.0);
        assert_eq!(arrays.position_range[7][3], 9.0);
        assert_eq!(std::mem::size_of::<LightArrays>(), 2 * MAX_LIGHTS * 16);
    }

    #[test]
    fn emission_mask_of_white_and_black() {
        assert!((emission_mask([1.0, 1.0, 1.0]) - 1.5f32.powf(0.8)).abs() < 1e-5);
        assert_eq!(emission_mask([0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn out_of_range_index_is_none() {
        let mut set = LightSet::default();
        assert!(set.get(MAX_LIGHTS).is_none());
        assert!(set.get_mut(MAX_LIGHTS).is_none());
    }
}
