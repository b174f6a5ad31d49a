//! Global highlight defaults, loadable from YAML.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::render::material::Color;
use crate::render::outline::{OutlineMode, MAX_WIDTH};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightSettings {
    pub default_color: Color,
    pub default_width: f32,
    pub default_mode: OutlineMode,
    pub default_blink: bool,
    pub blink_speed: f32,
    pub blink_min_width: f32,
    pub blink_max_width: f32,
    /// When set, an untimed highlight stops after `auto_stop_duration` seconds.
    pub use_auto_stop: bool,
    pub auto_stop_duration: f32,
}

impl Default for HighlightSettings {
    fn default() -> Self {
        Self {
            default_color: Color::YELLOW,
            default_width: 4.0,
            default_mode: OutlineMode::OutlineAll,
            default_blink: true,
            blink_speed: 3.0,
            blink_min_width: 0.0,
            blink_max_width: 4.0,
            use_auto_stop: false,
            auto_stop_duration: 3.0,
        }
    }
}

impl HighlightSettings {
    /// Clamp width-like values into [0, 10] and durations to non-negative.
    pub fn sanitized(mut self) -> Self {
        let clamp = |v: f32| if v.is_nan() { 0.0 } else { v.clamp(0.0, MAX_WIDTH) };
        self.default_width = clamp(self.default_width);
        self.blink_speed = clamp(self.blink_speed);
        self.blink_min_width = clamp(self.blink_min_width);
        self.blink_max_width = clamp(self.blink_max_width);
        self.auto_stop_duration = if self.auto_stop_duration.is_nan() { 0.0 } else { self.auto_stop_duration.max(0.0) };
        self
    }
}

pub fn load_from_yaml_str(s: &str) -> Result<HighlightSettings> {
    let settings: HighlightSettings = serde_yaml::from_str(s)?;
    Ok(settings.sanitized())
}

pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<HighlightSettings> {
    let data = std::fs::read_to_string(path)?;
    load_from_yaml_str(&data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let s = load_from_yaml_str("use_auto_stop: true\nauto_stop_duration: 5.0\n").unwrap();
        assert!(s.use_auto_stop);
        assert_eq!(s.auto_stop_duration, 5.0);
        assert_eq!(s.default_width, 4.0);
        assert_eq!(s.default_color, Color::YELLOW);
        assert!(s.default_blink);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let s = load_from_yaml_str("default_width: 25.0\nblink_min_width: -2.0\nauto_stop_duration: -1.0\n").unwrap();
        assert_eq!(s.default_width, MAX_WIDTH);
        assert_eq!(s.blink_min_width, 0.0);
        assert_eq!(s.auto_stop_duration, 0.0);
    }

    #[test]
    fn shipped_settings_match_defaults() {
        let s = load_from_path(concat!(env!("CARGO_MANIFEST_DIR"), "/../assets/highlight.yaml")).unwrap();
        assert!(s.default_color.to_vec4().abs_diff_eq(Color::YELLOW.to_vec4(), 1e-6));
        assert_eq!(HighlightSettings { default_color: Color::YELLOW, ..s }, HighlightSettings::default());
    }

    #[test]
    fn mode_and_color_parse() {
        let s = load_from_yaml_str(
            "default_mode: SilhouetteOnly\ndefault_color: { r: 0.0, g: 1.0, b: 0.0, a: 1.0 }\n",
        )
        .unwrap();
        assert_eq!(s.default_mode, OutlineMode::SilhouetteOnly);
        assert_eq!(s.default_color, Color::rgba(0.0, 1.0, 0.0, 1.0));
    }
}
