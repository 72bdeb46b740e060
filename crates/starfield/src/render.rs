//! Drawing a single star: rays, glow, channel split, then the core.

use glam::DVec2;
use skyfx_core::canvas::{BlendMode, Canvas, Channel};
use skyfx_core::error::EngineError;
use skyfx_core::palette::Gradient;
use skyfx_core::{Particle, Srgb};

use crate::config::{ClassProfile, StarburstSettings};

/// Brightness multiplier actually applied for `profile`.
pub fn effective_brightness(profile: &ClassProfile) -> f64 {
    if profile.brightness_enabled {
        profile.brightness
    } else {
        1.0
    }
}

/// Color painted for the core of a star with palette color `base`.
pub fn core_color(profile: &ClassProfile, base: Srgb) -> Srgb {
    let color = if profile.white_core { Srgb::WHITE } else { base };
    color.with_brightness(effective_brightness(profile))
}

/// Color used for glow and rays. Always derived from the palette color.
pub fn halo_color(profile: &ClassProfile, base: Srgb) -> Srgb {
    base.with_brightness(effective_brightness(profile))
}

/// Paints one star in layer order.
pub fn draw_star(
    canvas: &mut Canvas,
    star: &Particle,
    profile: &ClassProfile,
    burst: &StarburstSettings,
) -> Result<(), EngineError> {
    let halo = halo_color(profile, star.base_color);
    if burst.enabled && profile.starburst.enabled {
        draw_rays(canvas, star, halo, profile, burst)?;
    }
    if profile.glow.enabled {
        draw_glow(canvas, star, halo, profile)?;
    }
    if profile.aberration.enabled {
        draw_channel_split(canvas, star, profile)?;
    }
    canvas.fill_circle(
        star.position,
        star.radius,
        star.color.with_alpha(star.opacity),
        BlendMode::Normal,
    )
}

fn draw_rays(
    canvas: &mut Canvas,
    star: &Particle,
    halo: Srgb,
    profile: &ClassProfile,
    burst: &StarburstSettings,
) -> Result<(), EngineError> {
    if burst.ray_count == 0 {
        return Ok(());
    }
    let length = star.base_radius
        * burst.ray_length_factor
        * profile.starburst.length_scale
        * star.ray_factor;
    let width = star.base_radius * burst.width_factor;
    if length <= 0.0 || width <= 0.0 {
        return Ok(());
    }
    let step = std::f64::consts::TAU / burst.ray_count as f64;
    let start = burst.angle.to_radians();
    let head = halo.with_alpha(burst.opacity);
    let tail = halo.with_alpha(0.0);
    for i in 0..burst.ray_count {
        let end = star.position + DVec2::from_angle(start + i as f64 * step) * length;
        canvas.stroke_segment(star.position, end, width, head, tail, BlendMode::Normal)?;
    }
    Ok(())
}

fn draw_glow(
    canvas: &mut Canvas,
    star: &Particle,
    halo: Srgb,
    profile: &ClassProfile,
) -> Result<(), EngineError> {
    let outer = star.radius * profile.glow.size_factor;
    if outer <= 0.0 {
        return Ok(());
    }
    let opacity = profile.glow.opacity;
    let gradient = Gradient::new(vec![
        (0.0, Srgb::WHITE.with_alpha(1.0)),
        (0.35, halo.with_alpha(opacity)),
        (0.7, halo.with_alpha(opacity * 0.3)),
        (1.0, halo.with_alpha(0.0)),
    ])?;
    canvas.fill_radial_gradient(
        star.position,
        star.radius * 0.5,
        outer,
        &gradient,
        BlendMode::Normal,
    )
}

fn draw_channel_split(
    canvas: &mut Canvas,
    star: &Particle,
    profile: &ClassProfile,
) -> Result<(), EngineError> {
    let split = &profile.aberration;
    let alpha = split.intensity * star.opacity;
    for (channel, offset) in [
        (Channel::Red, split.red_offset),
        (Channel::Green, split.green_offset),
        (Channel::Blue, split.blue_offset),
    ] {
        let color = isolate(star.color, channel).with_alpha(alpha);
        canvas.fill_circle(
            star.position + DVec2::new(offset, 0.0),
            star.radius,
            color,
            BlendMode::Screen,
        )?;
    }
    Ok(())
}

fn isolate(color: Srgb, channel: Channel) -> Srgb {
    match channel {
        Channel::Red => Srgb { g: 0.0, b: 0.0, ..color },
        Channel::Green => Srgb { r: 0.0, b: 0.0, ..color },
        Channel::Blue => Srgb { r: 0.0, g: 0.0, ..color },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClassProfile;
    use skyfx_core::{Rgba, SizeClass};

    const CLEAR: Rgba = Rgba::TRANSPARENT;

    fn star_at(x: f64, y: f64, radius: f64) -> Particle {
        let mut star = Particle::new(SizeClass::Large);
        star.position = DVec2::new(x, y);
        star.base_radius = radius;
        star.radius = radius;
        star.base_color = Srgb::from_rgb8(0x34, 0x80, 0xff);
        star.color = Srgb::WHITE;
        star
    }

    fn bare(profile: &mut ClassProfile) {
        profile.starburst.enabled = false;
        profile.glow.enabled = false;
        profile.aberration.enabled = false;
    }

    // -- colors --

    #[test]
    fn white_core_keeps_halo_in_palette_color() {
        let mut profile = ClassProfile::large();
        profile.brightness = 0.5;
        let base = Srgb::from_rgb8(200, 100, 50);
        assert_eq!(core_color(&profile, base).to_rgb8(), [128, 128, 128]);
        assert_eq!(halo_color(&profile, base).to_rgb8(), [100, 50, 25]);
    }

    #[test]
    fn disabled_brightness_is_neutral() {
        let mut profile = ClassProfile::small();
        profile.brightness = 3.0;
        profile.brightness_enabled = false;
        let base = Srgb::from_rgb8(10, 20, 30);
        assert_eq!(core_color(&profile, base), base);
    }

    // -- draw_star --

    #[test]
    fn bare_core_is_a_disk() {
        let mut profile = ClassProfile::tiny();
        bare(&mut profile);
        let mut canvas = Canvas::new(20, 20).unwrap();
        draw_star(&mut canvas, &star_at(10.0, 10.0, 3.0), &profile, &StarburstSettings::default()).unwrap();
        let center = canvas.pixel(10, 10).unwrap();
        assert!(center.a > 0.99);
        assert_eq!(canvas.pixel(0, 0).unwrap(), CLEAR);
    }

    #[test]
    fn rays_reach_beyond_the_glow() {
        let mut profile = ClassProfile::large();
        profile.glow.enabled = false;
        profile.aberration.enabled = false;
        let burst = StarburstSettings::default();
        let mut canvas = Canvas::new(60, 60).unwrap();
        // ray length = 3 * 9 * 1 * 1 = 27
        draw_star(&mut canvas, &star_at(30.0, 30.0, 3.0), &profile, &burst).unwrap();
        assert!(canvas.pixel(50, 30).unwrap().a > 0.0, "right ray");
        assert!(canvas.pixel(30, 50).unwrap().a > 0.0, "down ray");
        assert_eq!(canvas.pixel(50, 50).unwrap(), CLEAR, "diagonal stays dark");
    }

    #[test]
    fn ray_factor_shortens_rays() {
        let mut profile = ClassProfile::large();
        bare(&mut profile);
        profile.starburst.enabled = true;
        let burst = StarburstSettings::default();
        let mut star = star_at(30.0, 30.0, 3.0);
        star.ray_factor = 0.5;
        let mut canvas = Canvas::new(60, 60).unwrap();
        draw_star(&mut canvas, &star, &profile, &burst).unwrap();
        assert!(canvas.pixel(40, 30).unwrap().a > 0.0);
        assert_eq!(canvas.pixel(50, 30).unwrap(), CLEAR);
    }

    #[test]
    fn glow_extends_past_the_core() {
        let mut profile = ClassProfile::large();
        bare(&mut profile);
        profile.glow.enabled = true;
        let mut canvas = Canvas::new(40, 40).unwrap();
        draw_star(&mut canvas, &star_at(20.0, 20.0, 2.0), &profile, &StarburstSettings::default()).unwrap();
        // glow radius 9.5, core radius 2
        assert!(canvas.pixel(26, 20).unwrap().a > 0.0);
        assert_eq!(canvas.pixel(35, 20).unwrap(), CLEAR);
    }

    #[test]
    fn channel_split_tints_the_sides() {
        let mut profile = ClassProfile::large();
        bare(&mut profile);
        profile.aberration.enabled = true;
        profile.aberration.red_offset = 4.0;
        profile.aberration.blue_offset = -4.0;
        let mut canvas = Canvas::new(40, 20).unwrap();
        draw_star(&mut canvas, &star_at(20.0, 10.0, 2.0), &profile, &StarburstSettings::default()).unwrap();
        let right = canvas.pixel(25, 10).unwrap();
        let left = canvas.pixel(15, 10).unwrap();
        assert!(right.r > right.b, "red shifted right");
        assert!(left.b > left.r, "blue shifted left");
    }

    #[test]
    fn non_finite_position_is_an_error() {
        let profile = ClassProfile::tiny();
        let mut canvas = Canvas::new(10, 10).unwrap();
        let star = star_at(f64::NAN, 1.0, 1.0);
        let result = draw_star(&mut canvas, &star, &profile, &StarburstSettings::default());
        assert!(matches!(result, Err(EngineError::InvalidGeometry(_))));
    }
}
