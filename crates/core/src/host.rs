//! Frame scheduling around an [`Effect`].
//!
//! [`AnimationHost`] owns the visible surface, an off-screen target and the
//! effect. It never reads a clock: whatever drives it (a display callback, a
//! timer, a test) passes the current timestamp in milliseconds to
//! [`AnimationHost::frame`]. Frames closer together than the target period
//! are skipped, resizes are debounced, and a hidden host does no work.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace, warn};

use crate::canvas::Canvas;
use crate::engine::{Effect, PointerEvent};
use crate::error::EngineError;

/// Host scheduling settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Frame cap. `None` uses the effect's preferred rate, else 60.
    pub target_fps: Option<f64>,
    /// Quiet period before a resize is applied.
    pub resize_debounce_ms: f64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            target_fps: None,
            resize_debounce_ms: 150.0,
        }
    }
}

const FALLBACK_FPS: f64 = 60.0;

/// Skips frames that arrive sooner than `1000 / fps` ms after the last one.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameLimiter {
    interval_ms: f64,
    last: Option<f64>,
}

impl FrameLimiter {
    /// A non-positive or non-finite `fps` disables the cap.
    pub fn new(fps: f64) -> Self {
        let interval_ms = if fps.is_finite() && fps > 0.0 {
            1000.0 / fps
        } else {
            0.0
        };
        Self {
            interval_ms,
            last: None,
        }
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// True if a frame at `now` is due.
    pub fn ready(&self, now: f64) -> bool {
        match self.last {
            None => true,
            Some(last) => now - last >= self.interval_ms,
        }
    }

    /// Records a rendered frame at `now`.
    pub fn mark(&mut self, now: f64) {
        self.last = Some(now);
    }

    /// Restarts the period at `now`, as if a frame had just been rendered.
    pub fn reset(&mut self, now: f64) {
        self.last = Some(now);
    }

    /// Forgets the last frame so the next one renders immediately.
    pub fn clear(&mut self) {
        self.last = None;
    }
}

/// Coalesces resize requests into one after a quiet period.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeDebouncer {
    delay_ms: f64,
    pending: Option<(usize, usize, f64)>,
}

impl ResizeDebouncer {
    pub fn new(delay_ms: f64) -> Self {
        Self {
            delay_ms: delay_ms.max(0.0),
            pending: None,
        }
    }

    /// Replaces any pending request and restarts the timer.
    pub fn request(&mut self, width: usize, height: usize, now: f64) {
        self.pending = Some((width, height, now + self.delay_ms));
    }

    /// Takes the pending size if its deadline has passed.
    pub fn poll(&mut self, now: f64) -> Option<(usize, usize)> {
        match self.pending {
            Some((w, h, deadline)) if now >= deadline => {
                self.pending = None;
                Some((w, h))
            }
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// What a call to [`AnimationHost::frame`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The effect was updated, rendered and presented.
    Rendered,
    /// Too soon after the previous frame.
    Throttled,
    /// The surface is hidden.
    Paused,
    /// The host was torn down.
    Stopped,
    /// Rendering failed; the visible surface keeps the previous frame.
    Dropped,
}

/// Drives one effect on one surface.
pub struct AnimationHost<E: Effect> {
    effect: E,
    surface: Canvas,
    offscreen: Canvas,
    limiter: FrameLimiter,
    debouncer: ResizeDebouncer,
    visible: bool,
    torn_down: bool,
    frames_rendered: u64,
    frames_dropped: u64,
}

impl<E: Effect> AnimationHost<E> {
    /// Attaches `effect` to `surface` and generates the initial scene.
    ///
    /// Returns `EngineError::SurfaceMissing` when no surface is given, or the
    /// effect's own error if the initial generation fails. Nothing is
    /// scheduled in either case.
    pub fn attach(
        surface: Option<Canvas>,
        mut effect: E,
        config: HostConfig,
    ) -> Result<Self, EngineError> {
        let Some(surface) = surface else {
            error!(effect = effect.name(), "drawing surface missing, animation not started");
            return Err(EngineError::SurfaceMissing);
        };
        let (width, height) = (surface.width(), surface.height());
        let offscreen = Canvas::new(width, height)?;
        if let Err(e) = effect.resize(width, height) {
            error!(effect = effect.name(), error = %e, "initial scene generation failed");
            return Err(e);
        }
        let fps = config
            .target_fps
            .or_else(|| effect.preferred_fps())
            .unwrap_or(FALLBACK_FPS);
        debug!(effect = effect.name(), width, height, fps, "effect attached");
        Ok(Self {
            effect,
            surface,
            offscreen,
            limiter: FrameLimiter::new(fps),
            debouncer: ResizeDebouncer::new(config.resize_debounce_ms),
            visible: true,
            torn_down: false,
            frames_rendered: 0,
            frames_dropped: 0,
        })
    }

    /// Runs one scheduling tick at `timestamp_ms`.
    pub fn frame(&mut self, timestamp_ms: f64) -> FrameOutcome {
        if self.torn_down {
            return FrameOutcome::Stopped;
        }
        if !self.visible {
            return FrameOutcome::Paused;
        }
        if let Some((width, height)) = self.debouncer.poll(timestamp_ms) {
            self.apply_resize(width, height);
        }
        if !self.limiter.ready(timestamp_ms) {
            trace!(timestamp_ms, "frame throttled");
            return FrameOutcome::Throttled;
        }
        self.limiter.mark(timestamp_ms);

        let t = timestamp_ms / 1000.0;
        self.effect.update(t);
        self.offscreen.clear();
        let presented = self
            .effect
            .render(&mut self.offscreen, t)
            .and_then(|()| self.surface.copy_from(&self.offscreen));
        match presented {
            Ok(()) => {
                self.frames_rendered += 1;
                FrameOutcome::Rendered
            }
            Err(e) => {
                self.frames_dropped += 1;
                warn!(effect = self.effect.name(), error = %e, "frame skipped");
                FrameOutcome::Dropped
            }
        }
    }

    /// Schedules a resize; it is applied by the first visible frame after the debounce period.
    pub fn resize(&mut self, width: usize, height: usize, now_ms: f64) {
        if self.torn_down {
            return;
        }
        self.debouncer.request(width, height, now_ms);
    }

    fn apply_resize(&mut self, width: usize, height: usize) {
        // The pending tick is dropped; the next frame renders the new scene.
        self.limiter.clear();
        let surfaces =
            Canvas::new(width, height).and_then(|s| Canvas::new(width, height).map(|o| (s, o)));
        let (surface, offscreen) = match surfaces {
            Ok(pair) => pair,
            Err(e) => {
                warn!(width, height, error = %e, "resize ignored");
                return;
            }
        };
        if let Err(e) = self.effect.resize(width, height) {
            warn!(effect = self.effect.name(), width, height, error = %e, "regeneration failed");
            return;
        }
        self.surface = surface;
        self.offscreen = offscreen;
        debug!(effect = self.effect.name(), width, height, "surface resized");
    }

    /// Pauses scheduling while hidden; on show the frame period restarts at `now_ms`.
    pub fn set_visible(&mut self, visible: bool, now_ms: f64) {
        if visible && !self.visible {
            self.limiter.reset(now_ms);
        }
        self.visible = visible;
    }

    /// Forwards pointer input to the effect.
    pub fn pointer(&mut self, event: PointerEvent) {
        if !self.torn_down {
            self.effect.pointer(event);
        }
    }

    /// Cancels pending work and returns the effect's particles to its pools.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.debouncer.cancel();
        self.effect.teardown();
        self.torn_down = true;
        debug!(effect = self.effect.name(), "host torn down");
    }

    /// The last presented frame.
    pub fn surface(&self) -> &Canvas {
        &self.surface
    }

    pub fn effect(&self) -> &E {
        &self.effect
    }

    pub fn effect_mut(&mut self) -> &mut E {
        &mut self.effect
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// True while frames can still be scheduled.
    pub fn is_running(&self) -> bool {
        !self.torn_down && self.visible
    }

    pub fn resize_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::BlendMode;
    use crate::color::Srgb;
    use glam::DVec2;
    use serde_json::{json, Value};

    #[derive(Default)]
    struct Probe {
        size: (usize, usize),
        resizes: usize,
        updates: Vec<f64>,
        fail_render: bool,
        fail_resize: bool,
        torn_down: bool,
        pointer_events: usize,
    }

    impl Effect for Probe {
        fn name(&self) -> &'static str {
            "probe"
        }

        fn resize(&mut self, width: usize, height: usize) -> Result<(), EngineError> {
            if self.fail_resize {
                return Err(EngineError::InvalidConfig("resize refused".into()));
            }
            self.size = (width, height);
            self.resizes += 1;
            Ok(())
        }

        fn update(&mut self, t: f64) {
            self.updates.push(t);
        }

        fn render(&self, canvas: &mut Canvas, _t: f64) -> Result<(), EngineError> {
            if self.fail_render {
                return Err(EngineError::InvalidGeometry("boom".into()));
            }
            canvas.fill_circle(
                DVec2::new(1.0, 1.0),
                1.0,
                Srgb::WHITE.with_alpha(1.0),
                BlendMode::Normal,
            )
        }

        fn pointer(&mut self, _event: PointerEvent) {
            self.pointer_events += 1;
        }

        fn teardown(&mut self) {
            self.torn_down = true;
        }

        fn params(&self) -> Value {
            json!({})
        }

        fn preferred_fps(&self) -> Option<f64> {
            Some(20.0)
        }
    }

    fn host() -> AnimationHost<Probe> {
        AnimationHost::attach(
            Some(Canvas::new(8, 6).unwrap()),
            Probe::default(),
            HostConfig::default(),
        )
        .unwrap()
    }

    // ── Setup ──

    #[test]
    fn attach_without_surface_fails() {
        let result = AnimationHost::attach(None, Probe::default(), HostConfig::default());
        assert!(matches!(result, Err(EngineError::SurfaceMissing)));
    }

    #[test]
    fn attach_propagates_generation_failure() {
        let probe = Probe {
            fail_resize: true,
            ..Probe::default()
        };
        let result = AnimationHost::attach(Some(Canvas::new(4, 4).unwrap()), probe, HostConfig::default());
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn attach_generates_initial_scene() {
        let h = host();
        assert_eq!(h.effect().size, (8, 6));
        assert!(h.is_running());
    }

    // ── Frame limiting ──

    #[test]
    fn frames_are_capped_to_effect_rate() {
        let mut h = host();
        assert_eq!(h.frame(0.0), FrameOutcome::Rendered);
        assert_eq!(h.frame(16.0), FrameOutcome::Throttled);
        assert_eq!(h.frame(49.0), FrameOutcome::Throttled);
        assert_eq!(h.frame(50.0), FrameOutcome::Rendered);
        assert_eq!(h.effect().updates, vec![0.0, 0.05]);
        assert!(!h.surface().is_blank());
    }

    #[test]
    fn config_fps_overrides_effect_rate() {
        let config = HostConfig {
            target_fps: Some(100.0),
            ..HostConfig::default()
        };
        let mut h = AnimationHost::attach(Some(Canvas::new(2, 2).unwrap()), Probe::default(), config)
            .unwrap();
        h.frame(0.0);
        assert_eq!(h.frame(10.0), FrameOutcome::Rendered);
    }

    #[test]
    fn limiter_without_cap_always_ready() {
        let mut l = FrameLimiter::new(0.0);
        l.mark(5.0);
        assert!(l.ready(5.0));
        assert_eq!(l.interval_ms(), 0.0);
    }

    // ── Errors ──

    #[test]
    fn render_error_drops_frame_and_keeps_running() {
        let mut h = host();
        h.effect_mut().fail_render = true;
        assert_eq!(h.frame(0.0), FrameOutcome::Dropped);
        assert_eq!(h.frames_dropped(), 1);
        assert!(h.surface().is_blank());
        h.effect_mut().fail_render = false;
        assert_eq!(h.frame(100.0), FrameOutcome::Rendered);
        assert_eq!(h.frames_rendered(), 1);
    }

    // ── Resize ──

    #[test]
    fn resize_is_debounced_and_coalesced() {
        let mut h = host();
        h.resize(100, 50, 0.0);
        h.resize(200, 100, 100.0);
        assert!(h.resize_pending());
        h.frame(200.0);
        assert_eq!(h.effect().resizes, 1, "still debouncing");
        h.frame(250.0);
        assert_eq!(h.effect().resizes, 2);
        assert_eq!(h.effect().size, (200, 100));
        assert_eq!(h.surface().width(), 200);
        assert!(!h.resize_pending());
    }

    #[test]
    fn resize_renders_immediately_after_regeneration() {
        let mut h = host();
        h.frame(0.0);
        h.resize(10, 10, 1.0);
        assert_eq!(h.frame(151.0), FrameOutcome::Rendered);
        assert_eq!(h.frame(152.0), FrameOutcome::Throttled);
    }

    #[test]
    fn zero_sized_resize_keeps_previous_surface() {
        let mut h = host();
        h.resize(0, 10, 0.0);
        h.frame(500.0);
        assert_eq!(h.surface().width(), 8);
        assert_eq!(h.effect().resizes, 1);
    }

    // ── Visibility ──

    #[test]
    fn hidden_host_does_no_work() {
        let mut h = host();
        h.set_visible(false, 0.0);
        assert_eq!(h.frame(0.0), FrameOutcome::Paused);
        assert_eq!(h.frame(1000.0), FrameOutcome::Paused);
        assert!(h.effect().updates.is_empty());
        assert!(!h.is_running());
    }

    #[test]
    fn hidden_host_defers_pending_resize() {
        let mut h = host();
        h.resize(40, 20, 0.0);
        h.set_visible(false, 10.0);
        assert_eq!(h.frame(500.0), FrameOutcome::Paused);
        assert_eq!(h.effect().resizes, 1);
        assert!(h.resize_pending());
        h.set_visible(true, 600.0);
        assert_eq!(h.frame(601.0), FrameOutcome::Rendered);
        assert_eq!(h.effect().resizes, 2);
        assert_eq!(h.surface().width(), 40);
    }

    #[test]
    fn showing_restarts_the_period() {
        let mut h = host();
        h.set_visible(false, 0.0);
        h.set_visible(true, 1000.0);
        assert_eq!(h.frame(1010.0), FrameOutcome::Throttled);
        assert_eq!(h.frame(1050.0), FrameOutcome::Rendered);
    }

    // ── Teardown ──

    #[test]
    fn teardown_stops_frames_and_cancels_resize() {
        let mut h = host();
        h.resize(30, 30, 0.0);
        h.teardown();
        assert!(h.effect().torn_down);
        assert!(!h.resize_pending());
        assert_eq!(h.frame(1000.0), FrameOutcome::Stopped);
        h.pointer(PointerEvent::Leave);
        assert_eq!(h.effect().pointer_events, 0);
        assert_eq!(h.effect().resizes, 1);
    }

    #[test]
    fn pointer_is_forwarded() {
        let mut h = host();
        h.pointer(PointerEvent::Clear);
        assert_eq!(h.effect().pointer_events, 1);
    }

    #[test]
    fn debouncer_poll_respects_deadline() {
        let mut d = ResizeDebouncer::new(150.0);
        d.request(1, 2, 10.0);
        assert_eq!(d.poll(159.0), None);
        assert_eq!(d.poll(160.0), Some((1, 2)));
        assert_eq!(d.poll(161.0), None);
    }
}
