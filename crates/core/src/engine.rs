//! The `Effect` trait that every animated layer implements.
//!
//! The trait is object-safe so effects can be used as `dyn Effect` for
//! runtime selection by name.

use crate::canvas::Canvas;
use crate::error::EngineError;
use serde_json::Value;

/// Pointer input forwarded by the host. Times are in seconds on the same
/// clock as the `t` passed to [`Effect::update`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// The pointer moved to `(x, y)` in device pixels.
    Move { x: f64, y: f64, time: f64 },
    /// The pointer left the drawing surface.
    Leave,
    /// Manual clear (secondary click).
    Clear,
}

/// An animated particle layer.
///
/// The host calls [`resize`](Effect::resize) whenever the surface size
/// changes, then once per rendered frame [`update`](Effect::update) followed
/// by [`render`](Effect::render).
pub trait Effect {
    /// Registry name of the effect.
    fn name(&self) -> &'static str;

    /// Regenerates the scene for a `width x height` surface.
    fn resize(&mut self, width: usize, height: usize) -> Result<(), EngineError>;

    /// Advances time-dependent state to `t` seconds.
    fn update(&mut self, t: f64);

    /// Paints the current state onto `canvas`.
    ///
    /// Must not mutate the effect: rendering the same state at the same `t`
    /// twice yields identical pixels.
    fn render(&self, canvas: &mut Canvas, t: f64) -> Result<(), EngineError>;

    /// Handles pointer input. Ignored by default.
    fn pointer(&mut self, _event: PointerEvent) {}

    /// Returns every pooled particle and drops transient state.
    fn teardown(&mut self);

    /// Current configuration as a JSON object.
    fn params(&self) -> Value;

    /// Frame rate the effect was tuned for, if it has one.
    fn preferred_fps(&self) -> Option<f64> {
        None
    }
}
