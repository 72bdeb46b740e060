#![deny(unsafe_code)]
//! Glowing pointer trail with sparkles.
//!
//! Pointer samples are kept in a bounded FIFO trail and drawn as a smoothed
//! curve whose width and opacity grow toward the head. Fast moves spawn
//! star-shaped sparkles that drift, slow down, shrink and fade.
//!
//! The effect is driven entirely by [`PointerEvent`]s and the frame time;
//! it has nothing to regenerate on resize.

pub mod config;
pub mod render;
pub mod trail;

use glam::DVec2;
use serde_json::Value;
use skyfx_core::canvas::Canvas;
use skyfx_core::error::EngineError;
use skyfx_core::field::Viewport;
use skyfx_core::params::config_to_json;
use skyfx_core::{Effect, PointerEvent, Xorshift64};
use tracing::{debug, trace};

pub use crate::config::{CursorTrailConfig, SparkleConfig};
use crate::render::{draw_sparkle, draw_trail};
pub use crate::trail::{Sparkle, Trail, TrailPoint, TrailState};

/// The cursor trail effect.
#[derive(Debug, Clone)]
pub struct CursorTrail {
    config: CursorTrailConfig,
    rng: Xorshift64,
    trail: Trail,
    viewport: Option<Viewport>,
}

impl CursorTrail {
    pub fn new(seed: Option<u64>, config: CursorTrailConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            trail: Trail::new(config.max_points),
            config,
            rng: seed.map_or_else(Xorshift64::from_entropy, Xorshift64::new),
            viewport: None,
        })
    }

    pub fn from_json(seed: Option<u64>, params: &Value) -> Result<Self, EngineError> {
        Self::new(seed, CursorTrailConfig::from_json(params)?)
    }

    pub fn config(&self) -> &CursorTrailConfig {
        &self.config
    }

    pub fn trail(&self) -> &Trail {
        &self.trail
    }

    pub fn state(&self) -> TrailState {
        self.trail.state()
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    /// Feeds a pointer move at `time` seconds.
    pub fn pointer_move(&mut self, x: f64, y: f64, time: f64) {
        self.trail
            .pointer_move(DVec2::new(x, y), time, &self.config, &mut self.rng);
    }
}

impl Effect for CursorTrail {
    fn name(&self) -> &'static str {
        "cursor-trail"
    }

    fn resize(&mut self, width: usize, height: usize) -> Result<(), EngineError> {
        self.viewport = Some(Viewport::new(width, height)?);
        Ok(())
    }

    fn update(&mut self, t: f64) {
        self.trail.advance(t, &self.config, &mut self.rng);
    }

    fn render(&self, canvas: &mut Canvas, _t: f64) -> Result<(), EngineError> {
        let mut failed = draw_trail(canvas, self.trail.points(), &self.config);
        for sparkle in self.trail.sparkles() {
            if let Err(err) = draw_sparkle(canvas, sparkle, &self.config) {
                trace!(%err, "sparkle draw failed");
                failed += 1;
            }
        }
        if failed > 0 {
            trace!(failed, "skipped trail draws");
        }
        Ok(())
    }

    fn pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Move { x, y, time } => self.pointer_move(x, y, time),
            PointerEvent::Leave => {
                debug!("pointer left, trail cleared");
                self.trail.leave();
            }
            PointerEvent::Clear => self.trail.clear(),
        }
    }

    fn teardown(&mut self) {
        self.trail.clear();
        self.trail.leave();
        self.viewport = None;
    }

    fn params(&self) -> Value {
        config_to_json(&self.config)
    }

    fn preferred_fps(&self) -> Option<f64> {
        Some(self.config.fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn effect() -> CursorTrail {
        let mut fx = CursorTrail::from_json(Some(5), &Value::Null).unwrap();
        fx.resize(200, 200).unwrap();
        fx
    }

    #[test]
    fn enter_and_short_move_scenario() {
        let mut fx = effect();
        assert_eq!(fx.state(), TrailState::Idle);
        fx.pointer(PointerEvent::Move { x: 100.0, y: 100.0, time: 0.0 });
        fx.pointer(PointerEvent::Move { x: 110.0, y: 100.0, time: 0.010 });
        assert_eq!(fx.state(), TrailState::Tracking);
        assert_eq!(fx.trail().points().len(), 2);
        assert_eq!(fx.trail().speed(), 5.0);
    }

    #[test]
    fn leave_then_clear_events() {
        let mut fx = effect();
        fx.pointer(PointerEvent::Move { x: 10.0, y: 10.0, time: 0.0 });
        fx.pointer(PointerEvent::Move { x: 90.0, y: 10.0, time: 0.01 });
        fx.pointer(PointerEvent::Leave);
        assert_eq!(fx.state(), TrailState::Idle);
        assert!(fx.trail().points().is_empty());
        assert!(!fx.trail().sparkles().is_empty(), "sparkles keep fading");
        fx.pointer(PointerEvent::Clear);
        assert!(fx.trail().sparkles().is_empty());
        assert_eq!(fx.state(), TrailState::Idle);
    }

    #[test]
    fn renders_trail_and_is_idempotent() {
        let mut fx = effect();
        for i in 0..10 {
            fx.pointer(PointerEvent::Move {
                x: 20.0 + i as f64 * 15.0,
                y: 100.0,
                time: i as f64 * 0.016,
            });
        }
        fx.update(0.16);
        let mut a = Canvas::new(200, 200).unwrap();
        let mut b = Canvas::new(200, 200).unwrap();
        fx.render(&mut a, 0.16).unwrap();
        fx.render(&mut b, 0.16).unwrap();
        assert!(!a.is_blank());
        assert_eq!(a, b);
    }

    #[test]
    fn idle_effect_renders_nothing() {
        let fx = effect();
        let mut canvas = Canvas::new(200, 200).unwrap();
        fx.render(&mut canvas, 0.0).unwrap();
        assert!(canvas.is_blank());
    }

    #[test]
    fn trail_fades_out_over_time() {
        let mut fx = effect();
        fx.pointer(PointerEvent::Move { x: 10.0, y: 10.0, time: 0.0 });
        fx.pointer(PointerEvent::Move { x: 12.0, y: 10.0, time: 0.1 });
        fx.update(2.0);
        assert!(fx.trail().points().is_empty());
    }

    #[test]
    fn teardown_resets_to_idle() {
        let mut fx = effect();
        fx.pointer(PointerEvent::Move { x: 10.0, y: 10.0, time: 0.0 });
        assert!(fx.viewport().is_some());
        fx.teardown();
        assert_eq!(fx.state(), TrailState::Idle);
        assert_eq!(fx.viewport(), None);
        assert!(fx.trail().points().is_empty());
        assert!(fx.trail().sparkles().is_empty());
    }

    #[test]
    fn params_and_fps() {
        let fx = CursorTrail::from_json(Some(1), &json!({"fps": 30.0})).unwrap();
        assert_eq!(fx.preferred_fps(), Some(30.0));
        assert_eq!(fx.params()["max_points"], 150);
        assert_eq!(fx.name(), "cursor-trail");
    }
}
