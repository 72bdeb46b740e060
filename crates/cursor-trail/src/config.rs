//! Cursor trail configuration.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use skyfx_core::error::EngineError;
use skyfx_core::params::config_from_json;
use skyfx_core::{Rgba, Srgb};

/// Half-open `[min, max)` range for a rolled value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

/// Sparkle spawning and motion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SparkleConfig {
    /// Cursor speed above which sparkles spawn.
    pub speed_threshold: f64,
    /// Sparkles per unit of speed, floored.
    pub per_speed: f64,
    /// Spawn radius per unit of speed, in pixels.
    pub spread: f64,
    /// Initial velocity range on each axis, centered on zero.
    pub velocity: f64,
    /// Per-frame random velocity perturbation, centered on zero.
    pub jitter: f64,
    /// Per-frame velocity multiplier.
    pub drag: f64,
    /// Per-frame size multiplier.
    pub shrink: f64,
    pub size: Range,
    pub opacity: Range,
    /// Opacity lost per frame.
    pub decay: Range,
    /// Inner radius of the star shape as a fraction of its size.
    pub inner_ratio: f64,
    pub min_rays: u32,
    pub max_rays: u32,
    /// Radius of the soft halo as a multiple of the size.
    pub glow_factor: f64,
    pub colors: Vec<Srgb>,
}

impl Default for SparkleConfig {
    fn default() -> Self {
        Self {
            speed_threshold: 0.5,
            per_speed: 2.0,
            spread: 10.0,
            velocity: 1.5,
            jitter: 0.15,
            drag: 0.97,
            shrink: 0.99,
            size: Range::new(1.0, 4.0),
            opacity: Range::new(0.1, 1.0),
            decay: Range::new(0.01, 0.04),
            inner_ratio: 0.4,
            min_rays: 4,
            max_rays: 6,
            glow_factor: 3.0,
            colors: vec![
                Srgb::from_rgb8(255, 255, 255),
                Srgb::from_rgb8(255, 240, 180),
                Srgb::from_rgb8(255, 220, 150),
                Srgb::from_rgb8(220, 220, 255),
            ],
        }
    }
}

/// Full cursor trail configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorTrailConfig {
    /// Trail points kept; the oldest is dropped beyond this.
    pub max_points: usize,
    /// Insert intermediate points when a move is longer than `max_segment_length`.
    pub interpolate: bool,
    pub max_segment_length: f64,
    /// Speed is `distance / elapsed_ms * speed_scale`, capped at `max_speed`.
    pub speed_scale: f64,
    pub max_speed: f64,
    /// Stroke width of a point at zero speed; speed adds to it.
    pub base_width: f64,
    /// Opacity lost per second of point age.
    pub decay_rate: f64,
    /// Control point tension of interior segments.
    pub tension: f64,
    pub color: Srgb,
    /// Opacity at the start of a segment relative to its end.
    pub tail_ratio: f64,
    pub base_path_width: f64,
    pub base_path_opacity: f64,
    pub glow_color: Rgba,
    /// Opacity of the glow stroke relative to its segment.
    pub glow_strength: f64,
    pub max_glow: f64,
    pub fps: f64,
    pub sparkles: SparkleConfig,
}

impl Default for CursorTrailConfig {
    fn default() -> Self {
        Self {
            max_points: 150,
            interpolate: true,
            max_segment_length: 10.0,
            speed_scale: 10.0,
            max_speed: 5.0,
            base_width: 3.0,
            decay_rate: 1.6,
            tension: 0.15,
            color: Srgb::WHITE,
            tail_ratio: 0.7,
            base_path_width: 4.0,
            base_path_opacity: 0.1,
            glow_color: Srgb::from_rgb8(255, 255, 212).with_alpha(0.8),
            glow_strength: 0.25,
            max_glow: 20.0,
            fps: 60.0,
            sparkles: SparkleConfig::default(),
        }
    }
}

impl CursorTrailConfig {
    pub fn from_json(params: &Value) -> Result<Self, EngineError> {
        let config: Self = config_from_json(params)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let invalid = |msg: &str| Err(EngineError::InvalidConfig(msg.to_string()));
        if self.max_points == 0 {
            return invalid("max_points must be at least 1");
        }
        if !(self.max_segment_length > 0.0 && self.max_segment_length.is_finite()) {
            return invalid("max_segment_length must be positive");
        }
        if !(self.decay_rate >= 0.0 && self.decay_rate.is_finite()) {
            return invalid("decay_rate must be >= 0");
        }
        let s = &self.sparkles;
        if !(s.size.is_valid() && s.opacity.is_valid() && s.decay.is_valid()) {
            return invalid("sparkle ranges must be finite with min <= max");
        }
        if s.decay.min <= 0.0 {
            return invalid("sparkle decay must be positive");
        }
        if s.min_rays < 2 || s.max_rays < s.min_rays {
            return invalid("sparkle rays must satisfy 2 <= min_rays <= max_rays");
        }
        if s.colors.is_empty() {
            return Err(EngineError::InvalidPalette(
                "sparkles need at least one color".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_are_valid() {
        let c = CursorTrailConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.max_segment_length, 10.0);
        assert_eq!(c.sparkles.colors.len(), 4);
    }

    #[test]
    fn null_params_give_defaults() {
        let c = CursorTrailConfig::from_json(&Value::Null).unwrap();
        assert_eq!(c, CursorTrailConfig::default());
    }

    #[test]
    fn partial_json_merges() {
        let c = CursorTrailConfig::from_json(&json!({"max_points": 20, "sparkles": {"drag": 0.5}})).unwrap();
        assert_eq!(c.max_points, 20);
        assert_eq!(c.sparkles.drag, 0.5);
        assert_eq!(c.sparkles.jitter, 0.15);
    }

    #[test]
    fn invalid_values_rejected() {
        for bad in [
            json!({"max_points": 0}),
            json!({"max_segment_length": 0.0}),
            json!({"sparkles": {"decay": {"min": 0.0, "max": 0.1}}}),
            json!({"sparkles": {"min_rays": 5, "max_rays": 4}}),
            json!({"sparkles": {"colors": []}}),
        ] {
            assert!(CursorTrailConfig::from_json(&bad).is_err(), "accepted {bad}");
        }
    }

    #[test]
    fn glow_color_serializes() {
        let v = serde_json::to_value(CursorTrailConfig::default()).unwrap();
        assert_eq!(v["color"], "#ffffff");
        assert!(v["glow_color"].is_object());
    }
}
