use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use eframe::egui::{Vec2, vec2};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
    pub link_distance: f32,
    /// Per-link spring strength. `None` derives it from endpoint degrees.
    pub link_strength: Option<f32>,
    pub link_iterations: usize,
    /// Negative values repel.
    pub charge_strength: f32,
    pub charge_distance_min: f32,
    pub charge_distance_max: f32,
    pub theta: f32,
    pub center_strength: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
    pub velocity_decay: f32,
}

impl Default for ForceConfig {
    fn default() -> Self {
        let alpha_min = 0.001_f32;
        Self {
            link_distance: 30.0,
            link_strength: None,
            link_iterations: 1,
            charge_strength: -15.0,
            charge_distance_min: 1.0,
            charge_distance_max: 300.0,
            theta: 0.9,
            center_strength: 1.0,
            alpha_min,
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            velocity_decay: 0.4,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub min_scale: f32,
    pub max_scale: f32,
    pub wheel_sensitivity: f32,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.5,
            max_scale: 8.0,
            wheel_sensitivity: 0.002,
        }
    }
}

impl ZoomConfig {
    pub fn clamp_scale(&self, scale: f32) -> f32 {
        let low = self.min_scale.min(self.max_scale);
        let high = self.max_scale.max(self.min_scale);
        scale.clamp(low, high)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    pub drag_alpha_target: f32,
    pub reheat_alpha: f32,
    /// Screen-space travel above which a drag release is not a click.
    pub click_distance: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            drag_alpha_target: 0.3,
            reheat_alpha: 0.3,
            click_distance: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub tick_rate_hz: f32,
    pub max_ticks_per_frame: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60.0,
            max_ticks_per_frame: 4,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub width: f32,
    pub height: f32,
    pub initial_translate: [f32; 2],
    pub forces: ForceConfig,
    pub zoom: ZoomConfig,
    pub interaction: InteractionConfig,
    pub scheduler: SchedulerConfig,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 600.0,
            initial_translate: [0.0, 300.0],
            forces: ForceConfig::default(),
            zoom: ZoomConfig::default(),
            interaction: InteractionConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl GraphConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("failed to parse graph config JSON")
    }

    /// Point the centering force pulls toward. Degenerate containers map to the origin.
    pub fn center_target(&self) -> Vec2 {
        vec2(sanitize_extent(self.width) / 2.0, sanitize_extent(self.height) / 4.0)
    }

    pub fn initial_translate(&self) -> Vec2 {
        let [x, y] = self.initial_translate;
        vec2(x, y)
    }
}

fn sanitize_extent(value: f32) -> f32 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_target_uses_half_width_quarter_height() {
        let config = GraphConfig {
            width: 800.0,
            height: 400.0,
            ..GraphConfig::default()
        };
        assert_eq!(config.center_target(), vec2(400.0, 100.0));
    }

    #[test]
    fn degenerate_container_centers_on_origin() {
        let config = GraphConfig {
            width: 0.0,
            height: f32::NAN,
            ..GraphConfig::default()
        };
        assert_eq!(config.center_target(), Vec2::ZERO);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            GraphConfig::from_json(r#"{ "width": 320, "forces": { "charge_strength": -30 } }"#)
                .expect("valid config");

        assert_eq!(config.width, 320.0);
        assert_eq!(config.height, GraphConfig::default().height);
        assert_eq!(config.forces.charge_strength, -30.0);
        assert_eq!(config.forces.charge_distance_max, 300.0);
        assert_eq!(config.zoom.max_scale, 8.0);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(GraphConfig::from_json("{ width: ").is_err());
    }

    #[test]
    fn default_alpha_decay_settles_in_three_hundred_ticks() {
        let forces = ForceConfig::default();
        let alpha = (1.0 - forces.alpha_decay).powi(300);
        assert!((alpha - forces.alpha_min).abs() < 1e-4);
    }
}
