//! Pixel buffer conversion from a premultiplied [`Canvas`].
//!
//! This module is always available (no feature gate) so that the `png`
//! snapshot path and any embedding host can share the same conversion.

use skyfx_core::canvas::Canvas;
use skyfx_core::color::Srgb;

fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Converts a canvas to an RGBA8 buffer of `width * height * 4` bytes.
///
/// With a `background`, every pixel is composited over it and the output is
/// opaque. Without one, colors are un-premultiplied and alpha is kept.
pub fn canvas_to_rgba(canvas: &Canvas, background: Option<Srgb>) -> Vec<u8> {
    canvas
        .data()
        .chunks_exact(4)
        .flat_map(|px| {
            let [r, g, b, a] = [px[0], px[1], px[2], px[3]];
            match background {
                Some(bg) => {
                    let rest = 1.0 - a;
                    [
                        to_byte(r + bg.r as f32 * rest),
                        to_byte(g + bg.g as f32 * rest),
                        to_byte(b + bg.b as f32 * rest),
                        255,
                    ]
                }
                None if a <= 0.0 => [0, 0, 0, 0],
                None => [to_byte(r / a), to_byte(g / a), to_byte(b / a), to_byte(a)],
            }
        })
        .collect()
}
