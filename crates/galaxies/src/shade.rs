//! Radial shading of galaxy points.
//!
//! Shading runs in 8-bit space, outward from the center:
//! white inside 70% of the core radius, a faint tint band out to the core
//! radius, a squared fade to the galaxy color up to 2.5 core radii with
//! +/-7 of per-channel noise, then the galaxy color dimmed with distance.

use skyfx_core::{Srgb, Xorshift64};

/// Spread of the per-channel noise in the transition zone.
const VARIANCE: f64 = 15.0;

fn channels(color: Srgb) -> [f64; 3] {
    color.to_rgb8().map(f64::from)
}

fn from_channels([r, g, b]: [f64; 3]) -> Srgb {
    let c = |v: f64| v.clamp(0.0, 255.0) as u8;
    Srgb::from_rgb8(c(r), c(g), c(b))
}

/// Color of a point at `radius` inside the core.
///
/// White within `0.7 * core_radius`; beyond that the point moves 20% of the
/// way from white toward `base` over the remaining 30% of the core.
pub fn core_tint(base: Srgb, radius: f64, core_radius: f64) -> Srgb {
    if core_radius <= 0.0 || radius < core_radius * 0.7 {
        return Srgb::WHITE;
    }
    let factor = (radius - core_radius * 0.7) / (core_radius * 0.3);
    from_channels(channels(base).map(|c| 255.0 - (factor * (255.0 - c) * 0.2).floor()))
}

/// Color of a disc point at `radius` for a galaxy of color `base`.
pub fn random_shade(
    base: Srgb,
    radius: f64,
    core_radius: f64,
    end_radius: f64,
    rng: &mut Xorshift64,
) -> Srgb {
    if radius < core_radius {
        return core_tint(base, radius, core_radius);
    }
    let transition = core_radius * 2.5;
    if radius < transition {
        let t = (radius - core_radius) / (transition - core_radius);
        return from_channels(channels(base).map(|c| {
            let faded = (255.0 - t * t * (255.0 - c)).floor();
            faded + (rng.next_f64() * VARIANCE - VARIANCE / 2.0).floor()
        }));
    }
    let brightness = 1.0 - radius / end_radius * 0.7;
    let jitter = 0.75 + rng.next_f64() * 0.5;
    from_channels(channels(base).map(|c| (c * brightness * jitter).floor()))
}
