#![deny(unsafe_code)]
//! Effect registry: maps effect names to implementations and provides CPU-side
//! snapshot rendering.
//!
//! This crate sits between `skyfx-core` (which defines the `Effect` trait)
//! and the individual effect crates (`skyfx-starfield`, etc.). Hosts such as
//! the CLI depend on this crate to avoid duplicating dispatch logic.

pub mod pixel;

#[cfg(feature = "png")]
pub mod snapshot;

use serde_json::Value;
use skyfx_core::canvas::Canvas;
use skyfx_core::error::EngineError;
use skyfx_core::{Effect, PointerEvent};
use skyfx_cursor_trail::CursorTrail;
use skyfx_galaxies::Galaxies;
use skyfx_starfield::Starfield;

/// All available effect names.
const EFFECT_NAMES: &[&str] = &["starfield", "galaxies", "cursor-trail"];

/// Enumeration of all available effects.
///
/// Wraps each effect implementation and delegates `Effect` trait methods.
/// Use [`EffectKind::from_name`] for string-based construction.
pub enum EffectKind {
    /// Twinkling multi-class star field.
    Starfield(Box<Starfield>),
    /// Static baked galaxy layer.
    Galaxies(Box<Galaxies>),
    /// Pointer trail with sparkles.
    CursorTrail(Box<CursorTrail>),
}

impl EffectKind {
    /// Constructs an effect by name. `None` seeds from entropy.
    ///
    /// Returns `EngineError::UnknownEffect` if the name is not recognized.
    pub fn from_name(name: &str, seed: Option<u64>, params: &Value) -> Result<Self, EngineError> {
        match name {
            "starfield" => Ok(EffectKind::Starfield(Box::new(Starfield::from_json(
                seed, params,
            )?))),
            "galaxies" => Ok(EffectKind::Galaxies(Box::new(Galaxies::from_json(
                seed, params,
            )?))),
            "cursor-trail" => Ok(EffectKind::CursorTrail(Box::new(CursorTrail::from_json(
                seed, params,
            )?))),
            _ => Err(EngineError::UnknownEffect(name.to_string())),
        }
    }

    /// Returns a slice of all recognized effect names.
    pub fn list_effects() -> &'static [&'static str] {
        EFFECT_NAMES
    }

    /// True for effects that only change in response to pointer input.
    pub fn is_interactive(&self) -> bool {
        matches!(self, EffectKind::CursorTrail(_))
    }

    fn inner(&self) -> &dyn Effect {
        match self {
            EffectKind::Starfield(e) => e.as_ref(),
            EffectKind::Galaxies(e) => e.as_ref(),
            EffectKind::CursorTrail(e) => e.as_ref(),
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Effect {
        match self {
            EffectKind::Starfield(e) => e.as_mut(),
            EffectKind::Galaxies(e) => e.as_mut(),
            EffectKind::CursorTrail(e) => e.as_mut(),
        }
    }
}

impl Effect for EffectKind {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn resize(&mut self, width: usize, height: usize) -> Result<(), EngineError> {
        self.inner_mut().resize(width, height)
    }

    fn update(&mut self, t: f64) {
        self.inner_mut().update(t)
    }

    fn render(&self, canvas: &mut Canvas, t: f64) -> Result<(), EngineError> {
        self.inner().render(canvas, t)
    }

    fn pointer(&mut self, event: PointerEvent) {
        self.inner_mut().pointer(event)
    }

    fn teardown(&mut self) {
        self.inner_mut().teardown()
    }

    fn params(&self) -> Value {
        self.inner().params()
    }

    fn preferred_fps(&self) -> Option<f64> {
        self.inner().preferred_fps()
    }
}
