//! CPU-side PNG rendering of a [`Canvas`].
//!
//! This module is feature-gated behind `png` (default on) so that embedders
//! can depend on the `engines` crate without pulling in the `image` crate.
//! The pixel buffer conversion itself lives in [`crate::pixel`] (always available).

use skyfx_core::canvas::Canvas;
use skyfx_core::color::Srgb;
use skyfx_core::error::EngineError;
use std::path::Path;

use crate::pixel::canvas_to_rgba;

/// Writes a canvas as a PNG image, composited over `background` when given.
///
/// Returns `EngineError::InvalidDimensions` if the canvas dimensions overflow
/// `u32`, or `EngineError::Io` on write failure.
pub fn write_png(
    canvas: &Canvas,
    background: Option<Srgb>,
    path: &Path,
) -> Result<(), EngineError> {
    let rgba = canvas_to_rgba(canvas, background);
    let w = u32::try_from(canvas.width()).map_err(|_| EngineError::InvalidDimensions)?;
    let h = u32::try_from(canvas.height()).map_err(|_| EngineError::InvalidDimensions)?;
    let img = image::RgbaImage::from_raw(w, h, rgba)
        .ok_or_else(|| EngineError::Io("RGBA buffer size mismatch".into()))?;
    img.save(path).map_err(|e| EngineError::Io(e.to_string()))
}
