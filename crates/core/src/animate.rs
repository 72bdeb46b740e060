//! Per-frame animation math.
//!
//! Everything here is a pure function of a particle's random phases and the
//! frame time `t` in seconds, so rendering the same state at the same time is
//! reproducible.

use serde::{Deserialize, Serialize};

use crate::particle::Particle;

/// Twinkle settings for one size class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwinkleParams {
    pub enabled: bool,
    /// Angular speed in radians per second.
    pub speed: f64,
    /// Radius swing as a fraction of the base radius.
    pub intensity_radius: f64,
    /// Opacity dip as a fraction of the base opacity.
    pub intensity_opacity: f64,
    /// Fraction of particles in the class that twinkle at all.
    pub percentage: f64,
    /// Mix in a second, slower wave.
    pub complex: bool,
}

impl Default for TwinkleParams {
    fn default() -> Self {
        Self {
            enabled: true,
            speed: 5.0,
            intensity_radius: 0.1,
            intensity_opacity: 0.3,
            percentage: 0.5,
            complex: true,
        }
    }
}

/// Twinkle wave in [-1, 1].
///
/// Simple: `sin(phase + t * speed)`. Complex adds
/// `0.5 * sin(phase * freq2 + t * speed * 0.7)` and renormalizes by 1.5.
pub fn twinkle_factor(phase: f64, freq2: f64, t: f64, speed: f64, complex: bool) -> f64 {
    let primary = (phase + t * speed).sin();
    if !complex {
        return primary;
    }
    let secondary = 0.5 * (phase * freq2 + t * speed * 0.7).sin();
    ((primary + secondary) / 1.5).clamp(-1.0, 1.0)
}

/// Updates the animated radius and opacity of `particle` for time `t`.
///
/// An active flicker wins over twinkling and is advanced one frame; it is
/// dropped after its last frame.
pub fn update_particle(particle: &mut Particle, t: f64, params: &TwinkleParams) {
    if let Some(mut flicker) = particle.flicker.take() {
        particle.radius = particle.base_radius;
        particle.opacity = particle.base_opacity * flicker.envelope();
        if flicker.advance() {
            particle.flicker = Some(flicker);
        }
        return;
    }
    if particle.twinkles && params.enabled {
        let f = twinkle_factor(
            particle.twinkle_phase,
            particle.twinkle_freq2,
            t,
            params.speed,
            params.complex,
        );
        particle.radius = (particle.base_radius * (1.0 + f * params.intensity_radius)).max(0.0);
        particle.opacity = (particle.base_opacity * (1.0 - f.abs() * params.intensity_opacity))
            .clamp(0.0, particle.base_opacity);
    } else {
        particle.radius = particle.base_radius;
        particle.opacity = particle.base_opacity;
    }
}

/// Starburst ray length multiplier in `[min_ray_factor, 1]`.
///
/// Three sines at different rates are summed and normalized to [0, 1] before
/// mapping into the target band.
pub fn burst_ray_factor(phase: f64, t: f64, speed: f64, min_ray_factor: f64) -> f64 {
    let ts = t * speed;
    let wave = (phase + ts).sin()
        + 0.3 * (phase * 1.3 + ts * 2.1).sin()
        + 0.15 * (phase * 0.7 + ts * 0.5).sin();
    let normalized = ((wave + 1.45) / 2.9).clamp(0.0, 1.0);
    let min = min_ray_factor.clamp(0.0, 1.0);
    min + normalized * (1.0 - min)
}

/// `max(0, 1 - age * rate)`.
pub fn linear_decay(age: f64, rate: f64) -> f64 {
    (1.0 - age * rate).max(0.0)
}
