//! Weighted color palettes and color-stop gradients.
//!
//! A [`WeightedPalette`] picks a base color for a particle: each entry is
//! repeated `weight` times so a uniform pick honors the weights. A
//! [`Gradient`] maps a parameter `t` in [0, 1] to a color by linear
//! interpolation between stops, the way glow halos and ray strokes fade out.

use serde::{Deserialize, Serialize};

use crate::color::{Rgba, Srgb};
use crate::error::EngineError;
use crate::prng::Xorshift64;

/// One palette entry: a color and how many times it appears in the draw pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedColor {
    pub color: Srgb,
    pub weight: u32,
}

impl WeightedColor {
    /// Builds an entry from a hex string. Intended for built-in tables.
    pub fn hex(hex: &str, weight: u32) -> Result<Self, EngineError> {
        Ok(Self {
            color: Srgb::from_hex(hex)?,
            weight,
        })
    }
}

/// A palette sampled uniformly over its weight-expanded entries.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedPalette {
    colors: Vec<Srgb>,
}

impl WeightedPalette {
    /// Expands the weighted entries. Zero-weight entries are dropped.
    ///
    /// Returns `EngineError::InvalidPalette` if the total weight is zero.
    pub fn from_weights(entries: &[WeightedColor]) -> Result<Self, EngineError> {
        let mut palette = Self { colors: Vec::new() };
        palette.extend(entries);
        if palette.colors.is_empty() {
            return Err(EngineError::InvalidPalette(
                "palette requires at least one entry with non-zero weight".to_string(),
            ));
        }
        Ok(palette)
    }

    /// Appends more weighted entries to the draw pool.
    pub fn extend(&mut self, entries: &[WeightedColor]) {
        for entry in entries {
            self.colors
                .extend(std::iter::repeat(entry.color).take(entry.weight as usize));
        }
    }

    /// Returns the number of slots in the expanded draw pool.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Returns true if the pool has no colors. (Always false for valid palettes.)
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Picks a color uniformly from the expanded pool.
    pub fn pick(&self, rng: &mut Xorshift64) -> Srgb {
        self.colors[rng.next_usize(self.colors.len())]
    }
}

/// A linear gradient over color stops at offsets in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    stops: Vec<(f64, Rgba)>,
}

impl Gradient {
    /// Creates a gradient from `(offset, color)` stops.
    ///
    /// Stops must be non-empty, with offsets in [0, 1] in non-decreasing order.
    pub fn new(stops: Vec<(f64, Rgba)>) -> Result<Self, EngineError> {
        if stops.is_empty() {
            return Err(EngineError::InvalidPalette(
                "gradient requires at least 1 stop".to_string(),
            ));
        }
        let ordered = stops.windows(2).all(|w| w[0].0 <= w[1].0);
        let in_range = stops.iter().all(|(o, _)| (0.0..=1.0).contains(o));
        if !ordered || !in_range {
            return Err(EngineError::InvalidPalette(
                "gradient stop offsets must be sorted and within [0, 1]".to_string(),
            ));
        }
        Ok(Self { stops })
    }

    /// Two-stop gradient from `start` at 0 to `end` at 1.
    pub fn linear(start: Rgba, end: Rgba) -> Self {
        Self {
            stops: vec![(0.0, start), (1.0, end)],
        }
    }

    /// Returns the stops.
    pub fn stops(&self) -> &[(f64, Rgba)] {
        &self.stops
    }

    /// Samples the gradient at `t`, clamped to [0, 1].
    ///
    /// Before the first stop the first color is used, after the last stop the
    /// last color is used.
    pub fn sample(&self, t: f64) -> Rgba {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let first = self.stops[0];
        if t <= first.0 {
            return first.1;
        }
        for pair in self.stops.windows(2) {
            let (o0, c0) = pair[0];
            let (o1, c1) = pair[1];
            if t <= o1 {
                let span = o1 - o0;
                let frac = if span > 0.0 { (t - o0) / span } else { 1.0 };
                return c0.lerp(c1, frac);
            }
        }
        self.stops[self.stops.len() - 1].1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn weights_expand_draw_pool() {
        let palette = WeightedPalette::from_weights(&[
            WeightedColor::hex("#ffffff", 3).unwrap(),
            WeightedColor::hex("#000000", 1).unwrap(),
        ])
        .unwrap();
        assert_eq!(palette.len(), 4);
    }

    #[test]
    fn zero_weight_entries_are_dropped() {
        let palette = WeightedPalette::from_weights(&[
            WeightedColor::hex("#ffffe3", 0).unwrap(),
            WeightedColor::hex("#fcfc8f", 1).unwrap(),
        ])
        .unwrap();
        assert_eq!(palette.len(), 1);
        let mut rng = Xorshift64::new(1);
        assert_eq!(palette.pick(&mut rng).to_hex(), "#fcfc8f");
    }

    #[test]
    fn all_zero_weights_rejected() {
        let result = WeightedPalette::from_weights(&[WeightedColor::hex("#ffffff", 0).unwrap()]);
        assert!(matches!(result, Err(EngineError::InvalidPalette(_))));
    }

    #[test]
    fn pick_frequency_follows_weights() {
        let white = Srgb::WHITE;
        let palette = WeightedPalette::from_weights(&[
            WeightedColor {
                color: white,
                weight: 3,
            },
            WeightedColor {
                color: Srgb::BLACK,
                weight: 1,
            },
        ])
        .unwrap();
        let mut rng = Xorshift64::new(99);
        let whites = (0..20_000)
            .filter(|_| palette.pick(&mut rng) == white)
            .count();
        let ratio = whites as f64 / 20_000.0;
        assert!((ratio - 0.75).abs() < 0.02, "white ratio {ratio}");
    }

    #[test]
    fn extend_adds_entries() {
        let mut palette =
            WeightedPalette::from_weights(&[WeightedColor::hex("#ffffff", 1).unwrap()]).unwrap();
        palette.extend(&[WeightedColor::hex("#3480ff", 8).unwrap()]);
        assert_eq!(palette.len(), 9);
    }

    #[test]
    fn gradient_rejects_empty_and_unsorted() {
        assert!(Gradient::new(vec![]).is_err());
        let c = Srgb::WHITE.with_alpha(1.0);
        assert!(Gradient::new(vec![(0.7, c), (0.3, c)]).is_err());
        assert!(Gradient::new(vec![(0.0, c), (1.5, c)]).is_err());
    }

    #[test]
    fn gradient_linear_endpoints() {
        let start = Srgb::WHITE.with_alpha(1.0);
        let end = Srgb::WHITE.with_alpha(0.0);
        let g = Gradient::linear(start, end);
        assert_eq!(g.sample(0.0), start);
        assert_eq!(g.sample(1.0), end);
        assert!(approx_eq(g.sample(0.25).a, 0.75));
    }

    #[test]
    fn gradient_multi_stop_interpolates_within_segment() {
        let a = Srgb::WHITE.with_alpha(1.0);
        let b = Srgb::BLACK.with_alpha(0.5);
        let c = Srgb::BLACK.with_alpha(0.0);
        let g = Gradient::new(vec![(0.0, a), (0.5, b), (1.0, c)]).unwrap();
        assert!(approx_eq(g.sample(0.25).r, 0.5));
        assert!(approx_eq(g.sample(0.75).a, 0.25));
    }

    #[test]
    fn gradient_clamps_and_handles_nan() {
        let g = Gradient::linear(Srgb::WHITE.with_alpha(1.0), Srgb::BLACK.with_alpha(0.0));
        assert_eq!(g.sample(-3.0), g.sample(0.0));
        assert_eq!(g.sample(7.0), g.sample(1.0));
        assert_eq!(g.sample(f64::NAN), g.sample(0.0));
    }

    #[test]
    fn gradient_before_first_stop_uses_first_color() {
        let a = Srgb::WHITE.with_alpha(1.0);
        let b = Srgb::BLACK.with_alpha(1.0);
        let g = Gradient::new(vec![(0.4, a), (1.0, b)]).unwrap();
        assert_eq!(g.sample(0.1), a);
    }
}
