//! Premultiplied RGBA raster and the drawing primitives effects paint with.
//!
//! A [`Canvas`] stores `width * height` pixels as premultiplied `f32` RGBA in
//! row-major order. Every primitive composites through a [`BlendMode`]:
//!
//! - `Normal`: source-over, `dst = src + dst * (1 - src_a)`
//! - `Additive`: `dst = min(1, src + dst)` per channel
//! - `Screen`: `dst = src + dst - src * dst` per channel
//!
//! Geometry is in device pixels with pixel centers at `(x + 0.5, y + 0.5)`.
//! Edges are anti-aliased by a one-pixel coverage ramp. Non-finite coordinates
//! or sizes are rejected with [`EngineError::InvalidGeometry`]; fully
//! transparent or zero-sized shapes are a successful no-op.

use std::collections::HashMap;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::error::EngineError;
use crate::palette::Gradient;

/// Compositing operator applied when painting onto a canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Source-over alpha compositing.
    #[default]
    Normal,
    /// Saturating per-channel addition.
    Additive,
    /// Inverse-multiply brightening.
    Screen,
}

/// A single color channel, used for chromatic aberration splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    /// All three channels in red, green, blue order.
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }
}

/// Premultiplied RGBA raster with `f32` channels in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

/// Inclusive-exclusive pixel rectangle `[x0, x1) x [y0, y1)`.
struct PixelRect {
    x0: usize,
    y0: usize,
    x1: usize,
    y1: usize,
}

fn ensure_finite(what: &str, values: &[f64]) -> Result<(), EngineError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(EngineError::InvalidGeometry(format!(
            "{what} has non-finite input"
        )))
    }
}

fn ensure_points_finite(what: &str, points: &[DVec2]) -> Result<(), EngineError> {
    if points.iter().all(|p| p.is_finite()) {
        Ok(())
    } else {
        Err(EngineError::InvalidGeometry(format!(
            "{what} has a non-finite point"
        )))
    }
}

/// Coverage of a pixel whose center is `distance` from the center of a disk.
///
/// Sub-pixel disks keep their area by scaling coverage with the diameter.
fn disk_coverage(radius: f64, distance: f64) -> f64 {
    (radius + 0.5 - distance).clamp(0.0, 1.0) * (radius * 2.0).min(1.0)
}

fn premultiply(color: Rgba, coverage: f64) -> [f32; 4] {
    let a = (color.a * coverage).clamp(0.0, 1.0);
    [
        (color.r.clamp(0.0, 1.0) * a) as f32,
        (color.g.clamp(0.0, 1.0) * a) as f32,
        (color.b.clamp(0.0, 1.0) * a) as f32,
        a as f32,
    ]
}

fn blend(dst: &mut [f32], src: [f32; 4], mode: BlendMode) {
    match mode {
        BlendMode::Normal => {
            let inv = 1.0 - src[3];
            for (d, s) in dst.iter_mut().zip(src) {
                *d = s + *d * inv;
            }
        }
        BlendMode::Additive => {
            for (d, s) in dst.iter_mut().zip(src) {
                *d = (s + *d).min(1.0);
            }
        }
        BlendMode::Screen => {
            for (d, s) in dst.iter_mut().zip(src) {
                *d = s + *d - s * *d;
            }
        }
    }
}

fn cubic_point(p0: DVec2, p1: DVec2, p2: DVec2, p3: DVec2, t: f64) -> DVec2 {
    let u = 1.0 - t;
    p0 * (u * u * u) + p1 * (3.0 * u * u * t) + p2 * (3.0 * u * t * t) + p3 * (t * t * t)
}

/// Number of line pieces used to flatten a curve with the given control hull length.
fn flatten_steps(hull_length: f64) -> usize {
    ((hull_length / 2.0).ceil() as usize).clamp(1, 64)
}

/// Distance from `p` to the segment `a..b` and the parameter of the closest point.
fn segment_distance(p: DVec2, a: DVec2, b: DVec2) -> (f64, f64) {
    let ab = b - a;
    let len2 = ab.length_squared();
    let t = if len2 > 0.0 {
        ((p - a).dot(ab) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (p.distance(a + ab * t), t)
}

impl Canvas {
    /// Creates a fully transparent canvas.
    ///
    /// Returns `EngineError::InvalidDimensions` if either dimension is zero
    /// or if the pixel buffer size overflows `usize`.
    pub fn new(width: usize, height: usize) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidDimensions);
        }
        let len = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(4))
            .ok_or(EngineError::InvalidDimensions)?;
        Ok(Self {
            width,
            height,
            data: vec![0.0; len],
        })
    }

    /// Canvas width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Canvas height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Read-only access to the premultiplied row-major RGBA data.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable access to the premultiplied data, for whole-raster passes.
    ///
    /// Callers must keep every color channel at or below its alpha.
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Premultiplied RGBA at `(x, y)`, or `None` outside the raster.
    pub fn premultiplied(&self, x: usize, y: usize) -> Option<[f32; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Straight-alpha color at `(x, y)`, or `None` outside the raster.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        let [r, g, b, a] = self.premultiplied(x, y)?;
        if a <= 0.0 {
            return Some(Rgba::TRANSPARENT);
        }
        Some(Rgba {
            r: (r / a).min(1.0) as f64,
            g: (g / a).min(1.0) as f64,
            b: (b / a).min(1.0) as f64,
            a: a as f64,
        })
    }

    /// Returns true if every pixel is fully transparent.
    pub fn is_blank(&self) -> bool {
        self.data.iter().all(|&v| v == 0.0)
    }

    /// Resets every pixel to transparent.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    /// Copies every pixel from `other`, which must have the same dimensions.
    pub fn copy_from(&mut self, other: &Canvas) -> Result<(), EngineError> {
        self.ensure_same_size(other)?;
        self.data.copy_from_slice(&other.data);
        Ok(())
    }

    /// Returns a copy that keeps only `channel` (and alpha).
    pub fn channel_only(&self, channel: Channel) -> Canvas {
        let keep = channel.index();
        let mut out = self.clone();
        for px in out.data.chunks_exact_mut(4) {
            for (c, v) in px.iter_mut().take(3).enumerate() {
                if c != keep {
                    *v = 0.0;
                }
            }
        }
        out
    }

    /// Composites `src` with its top-left corner at `(dx, dy)`, scaled by `alpha`.
    ///
    /// Pixels of `src` that land outside this canvas are dropped.
    pub fn draw_canvas(
        &mut self,
        src: &Canvas,
        dx: isize,
        dy: isize,
        alpha: f64,
        mode: BlendMode,
    ) -> Result<(), EngineError> {
        ensure_finite("draw_canvas alpha", &[alpha])?;
        let alpha = alpha.clamp(0.0, 1.0) as f32;
        if alpha <= 0.0 {
            return Ok(());
        }
        for sy in 0..src.height {
            let ty = sy as isize + dy;
            if ty < 0 || ty >= self.height as isize {
                continue;
            }
            for sx in 0..src.width {
                let tx = sx as isize + dx;
                if tx < 0 || tx >= self.width as isize {
                    continue;
                }
                let si = (sy * src.width + sx) * 4;
                let s = [
                    src.data[si] * alpha,
                    src.data[si + 1] * alpha,
                    src.data[si + 2] * alpha,
                    src.data[si + 3] * alpha,
                ];
                if s[3] <= 0.0 && s[0] <= 0.0 && s[1] <= 0.0 && s[2] <= 0.0 {
                    continue;
                }
                let di = (ty as usize * self.width + tx as usize) * 4;
                blend(&mut self.data[di..di + 4], s, mode);
            }
        }
        Ok(())
    }

    /// Fills an anti-aliased disk.
    pub fn fill_circle(
        &mut self,
        center: DVec2,
        radius: f64,
        color: Rgba,
        mode: BlendMode,
    ) -> Result<(), EngineError> {
        ensure_finite("fill_circle", &[center.x, center.y, radius, color.a])?;
        if radius <= 0.0 || color.a <= 0.0 {
            return Ok(());
        }
        let Some(rect) = self.bounds(center - DVec2::splat(radius + 1.0), center + DVec2::splat(radius + 1.0)) else {
            return Ok(());
        };
        for y in rect.y0..rect.y1 {
            for x in rect.x0..rect.x1 {
                let p = DVec2::new(x as f64 + 0.5, y as f64 + 0.5);
                let coverage = disk_coverage(radius, p.distance(center));
                if coverage > 0.0 {
                    self.plot(x, y, color, coverage, mode);
                }
            }
        }
        Ok(())
    }

    /// Fills a disk of radius `outer` whose color follows `gradient` radially.
    ///
    /// The gradient parameter is 0 at `inner` and 1 at `outer`; pixels closer
    /// than `inner` take the first stop.
    pub fn fill_radial_gradient(
        &mut self,
        center: DVec2,
        inner: f64,
        outer: f64,
        gradient: &Gradient,
        mode: BlendMode,
    ) -> Result<(), EngineError> {
        ensure_finite("fill_radial_gradient", &[center.x, center.y, inner, outer])?;
        if outer <= 0.0 {
            return Ok(());
        }
        let inner = inner.clamp(0.0, outer);
        let span = outer - inner;
        let Some(rect) = self.bounds(center - DVec2::splat(outer + 1.0), center + DVec2::splat(outer + 1.0)) else {
            return Ok(());
        };
        for y in rect.y0..rect.y1 {
            for x in rect.x0..rect.x1 {
                let p = DVec2::new(x as f64 + 0.5, y as f64 + 0.5);
                let d = p.distance(center);
                let coverage = disk_coverage(outer, d);
                if coverage <= 0.0 {
                    continue;
                }
                let t = if span > 0.0 { (d - inner) / span } else { 1.0 };
                let color = gradient.sample(t);
                if color.a > 0.0 {
                    self.plot(x, y, color, coverage, mode);
                }
            }
        }
        Ok(())
    }

    /// Strokes a straight segment with round caps, colored from `start` to `end`.
    pub fn stroke_segment(
        &mut self,
        from: DVec2,
        to: DVec2,
        width: f64,
        start: Rgba,
        end: Rgba,
        mode: BlendMode,
    ) -> Result<(), EngineError> {
        self.stroke_polyline(&[from, to], width, start, end, mode)
    }

    /// Strokes a quadratic Bézier from `p0` to `p2` with control point `c`.
    pub fn stroke_quadratic(
        &mut self,
        p0: DVec2,
        c: DVec2,
        p2: DVec2,
        width: f64,
        color: Rgba,
        mode: BlendMode,
    ) -> Result<(), EngineError> {
        // Degree elevation: the same curve as a cubic.
        let c1 = p0 + (c - p0) * (2.0 / 3.0);
        let c2 = p2 + (c - p2) * (2.0 / 3.0);
        self.stroke_cubic(p0, c1, c2, p2, width, color, color, mode)
    }

    /// Strokes a cubic Bézier, colored from `start` at `p0` to `end` at `p3`.
    #[allow(clippy::too_many_arguments)]
    pub fn stroke_cubic(
        &mut self,
        p0: DVec2,
        c1: DVec2,
        c2: DVec2,
        p3: DVec2,
        width: f64,
        start: Rgba,
        end: Rgba,
        mode: BlendMode,
    ) -> Result<(), EngineError> {
        ensure_points_finite("stroke_cubic", &[p0, c1, c2, p3])?;
        let steps = flatten_steps(p0.distance(c1) + c1.distance(c2) + c2.distance(p3));
        let points: Vec<DVec2> = (0..=steps)
            .map(|i| cubic_point(p0, c1, c2, p3, i as f64 / steps as f64))
            .collect();
        self.stroke_polyline(&points, width, start, end, mode)
    }

    /// Strokes a connected polyline so joints are painted once.
    ///
    /// The color runs from `start` at the first point to `end` at the last,
    /// interpolated by piece index. Each piece only visits the pixels near
    /// it; a pixel covered by several pieces takes its nearest one.
    pub fn stroke_polyline(
        &mut self,
        points: &[DVec2],
        width: f64,
        start: Rgba,
        end: Rgba,
        mode: BlendMode,
    ) -> Result<(), EngineError> {
        ensure_points_finite("stroke", points)?;
        ensure_finite("stroke width", &[width])?;
        if points.is_empty() || width <= 0.0 || (start.a <= 0.0 && end.a <= 0.0) {
            return Ok(());
        }
        let half = width / 2.0;
        let pad = DVec2::splat(half + 1.0);
        let pieces: Vec<(DVec2, DVec2)> = match points {
            [only] => vec![(*only, *only)],
            _ => points.windows(2).map(|w| (w[0], w[1])).collect(),
        };
        let count = pieces.len() as f64;

        // (distance, position along the line) of the nearest piece per pixel
        let mut nearest: HashMap<(usize, usize), (f64, f64)> = HashMap::new();
        for (i, &(a, b)) in pieces.iter().enumerate() {
            let Some(rect) = self.bounds(a.min(b) - pad, a.max(b) + pad) else {
                continue;
            };
            for y in rect.y0..rect.y1 {
                for x in rect.x0..rect.x1 {
                    let p = DVec2::new(x as f64 + 0.5, y as f64 + 0.5);
                    let (d, t) = segment_distance(p, a, b);
                    if d >= half + 0.5 {
                        continue;
                    }
                    let along = (i as f64 + t) / count;
                    nearest
                        .entry((x, y))
                        .and_modify(|best| {
                            if d < best.0 {
                                *best = (d, along);
                            }
                        })
                        .or_insert((d, along));
                }
            }
        }

        let thin = width.min(1.0);
        for ((x, y), (d, along)) in nearest {
            let coverage = (half + 0.5 - d).clamp(0.0, 1.0) * thin;
            let color = start.lerp(end, along);
            if coverage > 0.0 && color.a > 0.0 {
                self.plot(x, y, color, coverage, mode);
            }
        }
        Ok(())
    }

    /// Fills a polygon using the nonzero winding rule, sampled at pixel centers.
    pub fn fill_polygon(
        &mut self,
        points: &[DVec2],
        color: Rgba,
        mode: BlendMode,
    ) -> Result<(), EngineError> {
        ensure_points_finite("fill_polygon", points)?;
        if points.len() < 3 || color.a <= 0.0 {
            return Ok(());
        }
        let (min, max) = points
            .iter()
            .fold((points[0], points[0]), |(lo, hi), &p| (lo.min(p), hi.max(p)));
        let Some(rect) = self.bounds(min, max + DVec2::ONE) else {
            return Ok(());
        };
        for y in rect.y0..rect.y1 {
            for x in rect.x0..rect.x1 {
                let p = DVec2::new(x as f64 + 0.5, y as f64 + 0.5);
                if winding_number(points, p) != 0 {
                    self.plot(x, y, color, 1.0, mode);
                }
            }
        }
        Ok(())
    }

    fn ensure_same_size(&self, other: &Canvas) -> Result<(), EngineError> {
        if self.width != other.width || self.height != other.height {
            return Err(EngineError::DimensionMismatch {
                lhs_w: self.width,
                lhs_h: self.height,
                rhs_w: other.width,
                rhs_h: other.height,
            });
        }
        Ok(())
    }

    /// Clips the box `[min, max]` to the raster. `None` when nothing is visible.
    fn bounds(&self, min: DVec2, max: DVec2) -> Option<PixelRect> {
        let x0 = min.x.floor().max(0.0);
        let y0 = min.y.floor().max(0.0);
        let x1 = max.x.ceil().min(self.width as f64);
        let y1 = max.y.ceil().min(self.height as f64);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some(PixelRect {
            x0: x0 as usize,
            y0: y0 as usize,
            x1: x1 as usize,
            y1: y1 as usize,
        })
    }

    fn plot(&mut self, x: usize, y: usize, color: Rgba, coverage: f64, mode: BlendMode) {
        let i = (y * self.width + x) * 4;
        blend(&mut self.data[i..i + 4], premultiply(color, coverage), mode);
    }
}

fn winding_number(points: &[DVec2], p: DVec2) -> i32 {
    let mut winding = 0;
    for (i, &a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        let cross = (b - a).perp_dot(p - a);
        if a.y <= p.y {
            if b.y > p.y && cross > 0.0 {
                winding += 1;
            }
        } else if b.y <= p.y && cross < 0.0 {
            winding -= 1;
        }
    }
    winding
}
