//! The particle record shared by pooled effects.
//!
//! A [`Particle`] is a plain value: position, base and current radius, color
//! and opacity, random animation phases, and the [`SizeClass`] that selects
//! its behavior profile. Effects own their particles; the
//! [`ParticlePool`](crate::pool::ParticlePool) recycles them across
//! regenerations.

use std::f64::consts::PI;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::color::Srgb;

/// Behavior profile tag for a particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    Large,
    Medium,
    Small,
    Tiny,
}

impl SizeClass {
    /// Every class, largest first.
    pub const ALL: [SizeClass; 4] = [
        SizeClass::Large,
        SizeClass::Medium,
        SizeClass::Small,
        SizeClass::Tiny,
    ];

    /// Back-to-front paint order: tiny particles first, large ones on top.
    pub const DRAW_ORDER: [SizeClass; 4] = [
        SizeClass::Tiny,
        SizeClass::Small,
        SizeClass::Medium,
        SizeClass::Large,
    ];

    /// Stable index into per-class arrays, matching [`SizeClass::ALL`].
    pub fn index(self) -> usize {
        match self {
            SizeClass::Large => 0,
            SizeClass::Medium => 1,
            SizeClass::Small => 2,
            SizeClass::Tiny => 3,
        }
    }

    /// Lowercase name used in configs and logs.
    pub fn name(self) -> &'static str {
        match self {
            SizeClass::Large => "large",
            SizeClass::Medium => "medium",
            SizeClass::Small => "small",
            SizeClass::Tiny => "tiny",
        }
    }
}

impl std::fmt::Display for SizeClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A short dip in opacity lasting a fixed number of rendered frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flicker {
    frame: u32,
    frames: u32,
    depth: f64,
}

impl Flicker {
    /// Starts a flicker of `frames` frames (at least 1) dimming by up to `depth`.
    pub fn new(frames: u32, depth: f64) -> Self {
        Self {
            frame: 0,
            frames: frames.max(1),
            depth: if depth.is_finite() {
                depth.clamp(0.0, 1.0)
            } else {
                0.0
            },
        }
    }

    /// Position within the flicker, sampled at the middle of the current frame.
    pub fn progress(&self) -> f64 {
        (self.frame as f64 + 0.5) / self.frames as f64
    }

    /// Opacity multiplier `1 - depth * sin(pi * progress)`, in [0, 1].
    pub fn envelope(&self) -> f64 {
        (1.0 - self.depth * (PI * self.progress()).sin()).clamp(0.0, 1.0)
    }

    /// Moves to the next frame. Returns false once the flicker has run out.
    pub fn advance(&mut self) -> bool {
        self.frame += 1;
        self.frame < self.frames
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }

    pub fn depth(&self) -> f64 {
        self.depth
    }
}

/// One pooled particle.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub class: SizeClass,
    /// Device-pixel position.
    pub position: DVec2,
    pub base_radius: f64,
    pub radius: f64,
    /// Palette-selected color, before brightness.
    pub base_color: Srgb,
    /// Color actually painted for the core.
    pub color: Srgb,
    pub base_opacity: f64,
    pub opacity: f64,
    pub twinkle_phase: f64,
    pub twinkle_freq2: f64,
    pub burst_phase: f64,
    /// Current starburst ray length multiplier in [0, 1].
    pub ray_factor: f64,
    /// Whether this particle takes part in twinkling. Rolled on acquisition.
    pub twinkles: bool,
    pub flicker: Option<Flicker>,
}

impl Particle {
    /// A zero-sized white particle at the origin.
    pub fn new(class: SizeClass) -> Self {
        Self {
            class,
            position: DVec2::ZERO,
            base_radius: 0.0,
            radius: 0.0,
            base_color: Srgb::WHITE,
            color: Srgb::WHITE,
            base_opacity: 1.0,
            opacity: 1.0,
            twinkle_phase: 0.0,
            twinkle_freq2: 1.0,
            burst_phase: 0.0,
            ray_factor: 1.0,
            twinkles: false,
            flicker: None,
        }
    }

    /// Puts the animated attributes back to their base values.
    pub fn reset_animation(&mut self) {
        self.radius = self.base_radius;
        self.opacity = self.base_opacity;
        self.ray_factor = 1.0;
        self.flicker = None;
    }
}
