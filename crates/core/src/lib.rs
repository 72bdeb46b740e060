#![deny(unsafe_code)]
//! Core types and traits for the skyfx animated particle-layer renderer.
//!
//! Provides the premultiplied `Canvas` raster with its blend modes, color
//! types (`Srgb`, `Rgba`), weighted palettes and gradients, the `Xorshift64`
//! PRNG, the pooled `Particle` record, field-generation and per-frame
//! animation helpers, whole-raster post-processing, the `Effect` trait and the
//! `AnimationHost` that schedules frames around an effect.

pub mod animate;
pub mod canvas;
pub mod color;
pub mod engine;
pub mod error;
pub mod field;
pub mod host;
pub mod palette;
pub mod params;
pub mod particle;
pub mod pool;
pub mod postprocess;
pub mod prng;

pub use canvas::{BlendMode, Canvas, Channel};
pub use color::{Rgba, Srgb};
pub use engine::{Effect, PointerEvent};
pub use error::EngineError;
pub use field::Viewport;
pub use host::{AnimationHost, FrameOutcome, HostConfig};
pub use palette::{Gradient, WeightedColor, WeightedPalette};
pub use particle::{Flicker, Particle, SizeClass};
pub use pool::{ParticleFactory, ParticlePool};
pub use prng::Xorshift64;
