//! Keyboard parameter panel.
//!
//! Stands in for an on-screen UI: key presses edit the pipeline parameters
//! and the selected light, and a status line is logged periodically.
//!
//! | keys          | effect                              |
//! |---------------|-------------------------------------|
//! | Z / X         | gamma down / up                     |
//! | C / V         | exposure down / up                  |
//! | B / N         | ambient down / up                   |
//! | F             | toggle FXAA                         |
//! | PageDown / Up | blur iterations down / up           |
//! | 1..8          | select light                        |
//! | Up / Down     | selected light intensity            |
//! | Right / Left  | selected light range                |
//! | J / K / L     | selected light red / green / blue (Shift lowers) |
//! | U / I / O     | selected light x / y / z (Shift lowers) |
//! | G             | specular color (Shift lowers)       |

use aurora_engine::input::{InputFrame, InputState, Key};
use aurora_engine::lights::{LightSet, MAX_LIGHTS};
use aurora_engine::params::PipelineParameters;
use glam::Vec3;

const GAMMA_STEP: f32 = 0.1;
const EXPOSURE_STEP: f32 = 0.1;
const AMBIENT_STEP: f32 = 0.005;
const INTENSITY_STEP: f32 = 0.25;
const RANGE_STEP: f32 = 0.5;
const COLOR_STEP: f32 = 0.1;
const POSITION_STEP: f32 = 0.25;
/// Light positions stay inside this cube.
const POSITION_LIMIT: f32 = 20.0;
const SPECULAR_STEP: f32 = 0.1;
const SPECULAR_MAX: f32 = 2.0;
const STATUS_INTERVAL: f32 = 2.0;

#[derive(Debug, Default)]
pub struct ParameterPanel {
    selected: usize,
    frames: u32,
    elapsed: f32,
}

impl ParameterPanel {
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Applies this frame's key presses. Returns whether anything changed.
    pub fn apply(
        &mut self,
        input: &InputState,
        frame: &InputFrame,
        params: &mut PipelineParameters,
        lights: &mut LightSet,
    ) -> bool {
        let lower = input.modifiers.shift || input.key_down(Key::Shift);
        let mut changed = false;

        for key in &frame.keys_pressed {
            if let Some(index) = key.digit_index().filter(|i| *i < MAX_LIGHTS) {
                self.selected = index;
                log::info!("selected light {}", index + 1);
                continue;
            }

            changed |= match key {
                Key::Z => step(&mut params.gamma, -GAMMA_STEP),
                Key::X => step(&mut params.gamma, GAMMA_STEP),
                Key::C => step(&mut params.exposure, -EXPOSURE_STEP),
                Key::V => step(&mut params.exposure, EXPOSURE_STEP),
                Key::B => {
                    params.ambient_color = (params.ambient_color - AMBIENT_STEP).max(Vec3::ZERO);
                    true
                }
                Key::N => {
                    params.ambient_color += AMBIENT_STEP;
                    true
                }
                Key::F => {
                    params.antialias_enabled = !params.antialias_enabled;
                    true
                }
                Key::G => {
                    let delta = if lower { -SPECULAR_STEP } else { SPECULAR_STEP };
                    params.specular_color =
                        (params.specular_color + delta).clamp(Vec3::ZERO, Vec3::splat(SPECULAR_MAX));
                    true
                }
                Key::PageUp => {
                    params.blur_pass_count += 1;
                    true
                }
                Key::PageDown => {
                    params.blur_pass_count = params.blur_pass_count.saturating_sub(1);
                    true
                }
                _ => self.edit_light(*key, lower, lights),
            };
        }
        changed
    }

    fn edit_light(&self, key: Key, lower: bool, lights: &mut LightSet) -> bool {
        let Some(light) = lights.get_mut(self.selected) else {
            return false;
        };
        let color_step = if lower { -COLOR_STEP } else { COLOR_STEP };
        let position_step = if lower { -POSITION_STEP } else { POSITION_STEP };
        let axis = match key {
            Key::U => Some(0),
            Key::I => Some(1),
            Key::O => Some(2),
            _ => None,
        };
        if let Some(axis) = axis {
            let moved = light.position[axis] + position_step;
            light.position[axis] = moved.clamp(-POSITION_LIMIT, POSITION_LIMIT);
            return true;
        }

        match key {
            Key::ArrowUp => light.intensity += INTENSITY_STEP,
            Key::ArrowDown => light.intensity = (light.intensity - INTENSITY_STEP).max(0.0),
            Key::ArrowRight => light.range += RANGE_STEP,
            Key::ArrowLeft => light.range = (light.range - RANGE_STEP).max(RANGE_STEP),
            Key::J => light.color.x = (light.color.x + color_step).max(0.0),
            Key::K => light.color.y = (light.color.y + color_step).max(0.0),
            Key::L => light.color.z = (light.color.z + color_step).max(0.0),
            _ => return false,
        }
        true
    }

    /// Counts a frame; returns a status line every few seconds.
    pub fn tick(
        &mut self,
        dt: f32,
        params: &PipelineParameters,
        lights: &LightSet,
    ) -> Option<String> {
        self.frames += 1;
        self.elapsed += dt;
        if self.elapsed < STATUS_INTERVAL {
            return None;
        }

        let fps = self.frames as f32 / self.elapsed;
        self.frames = 0;
        self.elapsed = 0.0;

        let light = lights.get(self.selected)?;
        Some(format!(
            "{fps:.1} fps | gamma {:.2} exposure {:.2} ambient {:.3} specular {:.2} fxaa {} blur {} | light {} at ({:.2}, {:.2}, {:.2}) rgb ({:.2}, {:.2}, {:.2}) x{:.2} range {:.1}",
            params.gamma,
            params.exposure,
            params.ambient_color.x,
            params.specular_color.x,
            if params.antialias_enabled { "on" } else { "off" },
            params.blur_pass_count,
            self.selected + 1,
            light.position.x,
            light.position.y,
            light.position.z,
            light.color.x,
            light.color.y,
            light.color.z,
            light.intensity,
            light.range,
        ))
    }
}

/// Adds `delta` unvalidated; a non-positive result is allowed.
fn step(value: &mut f32, delta: f32) -> bool {
    *value += delta;
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(keys: &[Key]) -> InputFrame {
        let mut frame = InputFrame::default();
        frame.keys_pressed.extend(keys.iter().copied());
        frame
    }

    #[test]
    fn parameter_keys() {
        let mut panel = ParameterPanel::default();
        let mut params = PipelineParameters::default();
        let mut lights = LightSet::default();

        let changed = panel.apply(
            &InputState::default(),
            &press(&[Key::X, Key::C, Key::F, Key::PageDown]),
            &mut params,
            &mut lights,
        );
        assert!(changed);
        assert!((params.gamma - 2.3).abs() < 1e-5);
        assert!((params.exposure - 0.9).abs() < 1e-5);
        assert!(!params.antialias_enabled);
        assert_eq!(params.blur_pass_count, 9);
    }

    #[test]
    fn exposure_may_go_non_positive() {
        let mut panel = ParameterPanel::default();
        let mut params = PipelineParameters {
            exposure: 0.05,
            ..PipelineParameters::default()
        };
        let mut lights = LightSet::default();
        panel.apply(&InputState::default(), &press(&[Key::C]), &mut params, &mut lights);
        assert!(params.exposure < 0.0);
    }

    #[test]
    fn digit_selects_then_arrows_edit_that_light() {
        let mut panel = ParameterPanel::default();
        let mut params = PipelineParameters::default();
        let mut lights = LightSet::default();
        let input = InputState::default();

        panel.apply(&input, &press(&[Key::Digit(3)]), &mut params, &mut lights);
        assert_eq!(panel.selected(), 2);

        panel.apply(&input, &press(&[Key::ArrowUp, Key::ArrowRight]), &mut params, &mut lights);
        let light = lights.get(2).unwrap();
        assert_eq!(light.intensity, 1.25);
        assert_eq!(light.range, 4.5);
        assert_eq!(lights.get(0).unwrap().intensity, 1.0);
    }

    #[test]
    fn digit_nine_is_out_of_range() {
        let mut panel = ParameterPanel::default();
        panel.apply(
            &InputState::default(),
            &press(&[Key::Digit(9)]),
            &mut PipelineParameters::default(),
            &mut LightSet::default(),
        );
        assert_eq!(panel.selected(), 0);
    }

    #[test]
    fn shift_lowers_color() {
        let mut panel = ParameterPanel::default();
        let mut lights = LightSet::default();
        let mut input = InputState::default();
        input.modifiers.shift = true;
        panel.apply(&input, &press(&[Key::J]), &mut PipelineParameters::default(), &mut lights);
        assert!((lights.get(0).unwrap().color.x - 0.9).abs() < 1e-6);
    }

    #[test]
    fn position_keys_move_the_selected_light_within_limits() {
        let mut panel = ParameterPanel::default();
        let mut params = PipelineParameters::default();
        let mut lights = LightSet::default();
        let input = InputState::default();

        panel.apply(&input, &press(&[Key::Digit(2)]), &mut params, &mut lights);
        panel.apply(&input, &press(&[Key::U, Key::I]), &mut params, &mut lights);
        panel.apply(&input, &press(&[Key::I]), &mut params, &mut lights);
        let light = lights.get(1).unwrap();
        assert!((light.position.x - 4.55).abs() < 1e-5);
        assert!((light.position.y - 2.2).abs() < 1e-5);
        assert_eq!(light.position.z, 0.0);
        assert_eq!(lights.get(0).unwrap().position.x, 8.3);

        let mut lowered = InputState::default();
        lowered.modifiers.shift = true;
        for _ in 0..100 {
            panel.apply(&lowered, &press(&[Key::O]), &mut params, &mut lights);
        }
        assert_eq!(lights.get(1).unwrap().position.z, -POSITION_LIMIT);

        for _ in 0..100 {
            panel.apply(&input, &press(&[Key::U]), &mut params, &mut lights);
        }
        assert_eq!(lights.get(1).unwrap().position.x, POSITION_LIMIT);
    }

    #[test]
    fn specular_steps_and_clamps() {
        let mut panel = ParameterPanel::default();
        let mut params = PipelineParameters::default();
        let mut lights = LightSet::default();
        let mut lowered = InputState::default();
        lowered.modifiers.shift = true;

        assert!(panel.apply(&lowered, &press(&[Key::G]), &mut params, &mut lights));
        assert!(params.specular_color.abs_diff_eq(Vec3::splat(0.9), 1e-6));

        for _ in 0..30 {
            panel.apply(&lowered, &press(&[Key::G]), &mut params, &mut lights);
        }
        assert_eq!(params.specular_color, Vec3::ZERO);

        for _ in 0..30 {
            panel.apply(&InputState::default(), &press(&[Key::G]), &mut params, &mut lights);
        }
        assert_eq!(params.specular_color, Vec3::splat(SPECULAR_MAX));
    }

    #[test]
    fn status_line_every_interval() {
        let mut panel = ParameterPanel::default();
        let params = PipelineParameters::default();
        let lights = LightSet::default();
        assert!(panel.tick(1.0, &params, &lights).is_none());
        let line = panel.tick(1.0, &params, &lights).unwrap();
        assert!(line.starts_with("1.0 fps"), "{line}");
        assert!(panel.tick(0.5, &params, &lights).is_none());
    }
}
