//! Whole-raster post-processing passes.
//!
//! These run after the particles are painted: a separable Gaussian blur, an
//! aura (the blurred copy composited back over the sharp image), and a
//! chromatic aberration that splits the raster into offset color channels.

use serde::{Deserialize, Serialize};

use crate::canvas::{BlendMode, Canvas, Channel};
use crate::error::EngineError;

/// Normalized Gaussian kernel of length `2 * radius + 1` with `sigma = radius / 3`.
///
/// A radius of 0 yields the identity kernel `[1.0]`.
pub fn gaussian_kernel(radius: usize) -> Vec<f64> {
    if radius == 0 {
        return vec![1.0];
    }
    let sigma = radius as f64 / 3.0;
    let denom = 2.0 * sigma * sigma;
    let r = radius as isize;
    let mut kernel: Vec<f64> = (-r..=r)
        .map(|i| (-((i * i) as f64) / denom).exp())
        .collect();
    let sum: f64 = kernel.iter().sum();
    for w in &mut kernel {
        *w /= sum;
    }
    kernel
}

/// Two-pass separable blur, horizontal then vertical.
///
/// Taps that fall outside the raster are skipped without renormalizing, so
/// content fades slightly toward the borders.
pub fn gaussian_blur(canvas: &mut Canvas, radius: usize) {
    if radius == 0 {
        return;
    }
    let kernel: Vec<f32> = gaussian_kernel(radius).into_iter().map(|w| w as f32).collect();
    let (w, h) = (canvas.width(), canvas.height());
    let r = radius as isize;
    let source = canvas.data().to_vec();
    let mut horizontal = vec![0.0_f32; source.len()];
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0.0_f32; 4];
            for k in -r..=r {
                let nx = x as isize + k;
                if nx < 0 || nx >= w as isize {
                    continue;
                }
                let weight = kernel[(k + r) as usize];
                let i = (y * w + nx as usize) * 4;
                for c in 0..4 {
                    acc[c] += source[i + c] * weight;
                }
            }
            let o = (y * w + x) * 4;
            horizontal[o..o + 4].copy_from_slice(&acc);
        }
    }
    let out = canvas.data_mut();
    for x in 0..w {
        for y in 0..h {
            let mut acc = [0.0_f32; 4];
            for k in -r..=r {
                let ny = y as isize + k;
                if ny < 0 || ny >= h as isize {
                    continue;
                }
                let weight = kernel[(k + r) as usize];
                let i = (ny as usize * w + x) * 4;
                for c in 0..4 {
                    acc[c] += horizontal[i + c] * weight;
                }
            }
            let o = (y * w + x) * 4;
            for c in 0..4 {
                out[o + c] = acc[c].clamp(0.0, 1.0);
            }
        }
    }
}

/// Draws a blurred copy of the raster source-over onto itself.
pub fn aura(canvas: &mut Canvas, radius: usize) -> Result<(), EngineError> {
    let mut halo = canvas.clone();
    gaussian_blur(&mut halo, radius);
    canvas.draw_canvas(&halo, 0, 0, 1.0, BlendMode::Normal)
}

/// Channel-split settings: opacity of each channel copy and its x offset in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromaticAberration {
    pub enabled: bool,
    pub opacity: f64,
    pub red_offset: f64,
    pub green_offset: f64,
    pub blue_offset: f64,
}

impl Default for ChromaticAberration {
    fn default() -> Self {
        Self {
            enabled: true,
            opacity: 0.15,
            red_offset: 2.0,
            green_offset: 0.0,
            blue_offset: -2.0,
        }
    }
}

impl ChromaticAberration {
    /// `(channel, x offset)` for red, green and blue.
    pub fn offsets(&self) -> [(Channel, f64); 3] {
        [
            (Channel::Red, self.red_offset),
            (Channel::Green, self.green_offset),
            (Channel::Blue, self.blue_offset),
        ]
    }
}

/// Replaces the raster with screen-blended, offset channel copies at
/// `settings.opacity`, then draws the untouched original on top.
///
/// Does nothing when `settings.enabled` is false.
pub fn chromatic_aberration(
    canvas: &mut Canvas,
    settings: &ChromaticAberration,
) -> Result<(), EngineError> {
    if !settings.enabled {
        return Ok(());
    }
    if settings.offsets().iter().any(|(_, o)| !o.is_finite()) {
        return Err(EngineError::InvalidGeometry(
            "chromatic aberration offset is not finite".to_string(),
        ));
    }
    let original = canvas.clone();
    canvas.clear();
    for (channel, offset) in settings.offsets() {
        let split = original.channel_only(channel);
        canvas.draw_canvas(
            &split,
            offset.round() as isize,
            0,
            settings.opacity,
            BlendMode::Screen,
        )?;
    }
    canvas.draw_canvas(&original, 0, 0, 1.0, BlendMode::Normal)
}
