#![deny(unsafe_code)]
//! Procedural background galaxies.
//!
//! A handful of galaxies (the count depends on the viewport height, with a
//! smaller table below the mobile breakpoint) are placed in distinct cells of
//! a shuffled 5x5 grid over the reference resolution. Each is drawn as
//! thousands of tiny points, then the whole raster goes through chromatic
//! aberration, one or two aura passes with the galaxies redrawn sharp on top,
//! and a final Gaussian blur.
//!
//! Galaxies are static: the raster is baked on resize and `render` only
//! composites it.

pub mod galaxy;
pub mod shade;

use glam::DVec2;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use skyfx_core::canvas::{BlendMode, Canvas};
use skyfx_core::error::EngineError;
use skyfx_core::field::{jittered_cell_center, shuffled_grid_cells, Viewport};
use skyfx_core::params::{config_from_json, config_to_json};
use skyfx_core::postprocess::{aura, chromatic_aberration, gaussian_blur, ChromaticAberration};
use skyfx_core::{Effect, Srgb, Xorshift64};
use tracing::{debug, trace, warn};

pub use crate::galaxy::{Galaxy, GalaxyPoint, GalaxyType, ShapeProfile};

/// Galaxy count by minimum viewport height, desktop then mobile.
const COUNT_TABLE: [(usize, usize, usize); 10] = [
    (7680, 28, 14),
    (2880, 20, 10),
    (2160, 16, 8),
    (1600, 12, 6),
    (1440, 10, 5),
    (1080, 8, 5),
    (900, 7, 4),
    (720, 6, 4),
    (480, 4, 3),
    (360, 3, 2),
];

/// Number of galaxies for a viewport. Below 360 px desktop shows none and
/// mobile shows two.
pub fn galaxy_count(height: usize, mobile: bool) -> usize {
    COUNT_TABLE
        .iter()
        .find(|(min_height, _, _)| height >= *min_height)
        .map_or(if mobile { 2 } else { 0 }, |&(_, desktop, phone)| {
            if mobile {
                phone
            } else {
                desktop
            }
        })
}

/// Galaxies configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalaxiesConfig {
    pub reference_width: usize,
    pub reference_height: usize,
    pub grid_rows: usize,
    pub grid_cols: usize,
    pub min_size: f64,
    pub max_size: f64,
    /// Viewports narrower than this use the mobile count table and skip
    /// chromatic aberration and the second aura pass.
    pub mobile_breakpoint: usize,
    /// Fixed galaxy count, overriding the height table.
    pub count: Option<usize>,
    /// Chance that an arm point takes one of the special colors.
    pub special_chance: f64,
    pub chromatic_aberration: ChromaticAberration,
    /// Kernel radius of each aura pass.
    pub aura_radius: usize,
    /// Kernel radius of the closing blur.
    pub blur_radius: usize,
}

impl Default for GalaxiesConfig {
    fn default() -> Self {
        Self {
            reference_width: 1920,
            reference_height: 1080,
            grid_rows: 5,
            grid_cols: 5,
            min_size: 0.02,
            max_size: galaxy::MAX_SIZE_FACTOR,
            mobile_breakpoint: 768,
            count: None,
            special_chance: 0.008,
            chromatic_aberration: ChromaticAberration::default(),
            aura_radius: 9,
            blur_radius: 2,
        }
    }
}

impl GalaxiesConfig {
    pub fn from_json(params: &Value) -> Result<Self, EngineError> {
        let config: Self = config_from_json(params)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.reference_width == 0 || self.reference_height == 0 {
            return Err(EngineError::InvalidConfig(
                "reference resolution must be non-zero".to_string(),
            ));
        }
        if self.grid_rows == 0 || self.grid_cols == 0 {
            return Err(EngineError::InvalidConfig(
                "placement grid must be non-empty".to_string(),
            ));
        }
        if !(self.min_size > 0.0 && self.min_size <= self.max_size && self.max_size.is_finite()) {
            return Err(EngineError::InvalidConfig(format!(
                "size range [{}, {}] is invalid",
                self.min_size, self.max_size
            )));
        }
        Ok(())
    }
}

/// The galaxies effect.
#[derive(Debug, Clone)]
pub struct Galaxies {
    config: GalaxiesConfig,
    rng: Xorshift64,
    galaxies: Vec<Galaxy>,
    points: Vec<GalaxyPoint>,
    raster: Option<Canvas>,
}

impl Galaxies {
    pub fn new(seed: Option<u64>, config: GalaxiesConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            config,
            rng: seed.map_or_else(Xorshift64::from_entropy, Xorshift64::new),
            galaxies: Vec::new(),
            points: Vec::new(),
            raster: None,
        })
    }

    pub fn from_json(seed: Option<u64>, params: &Value) -> Result<Self, EngineError> {
        Self::new(seed, GalaxiesConfig::from_json(params)?)
    }

    pub fn config(&self) -> &GalaxiesConfig {
        &self.config
    }

    pub fn galaxies(&self) -> &[Galaxy] {
        &self.galaxies
    }

    /// Points of the current galaxies, as drawn into the raster.
    pub fn points(&self) -> &[GalaxyPoint] {
        &self.points
    }

    /// The baked raster, once the effect has been sized.
    pub fn raster(&self) -> Option<&Canvas> {
        self.raster.as_ref()
    }

    fn is_mobile(&self, viewport: Viewport) -> bool {
        viewport.width < self.config.mobile_breakpoint
    }

    /// Places a fresh set of galaxies for `viewport`.
    pub fn place(&mut self, viewport: Viewport) -> Vec<Galaxy> {
        let cfg = &self.config;
        let mobile = viewport.width < cfg.mobile_breakpoint;
        let wanted = cfg
            .count
            .unwrap_or_else(|| galaxy_count(viewport.height, mobile));
        let cell = DVec2::new(
            cfg.reference_width as f64 / cfg.grid_cols as f64,
            cfg.reference_height as f64 / cfg.grid_rows as f64,
        );
        let rng = &mut self.rng;
        let cells = shuffled_grid_cells(cfg.grid_rows, cfg.grid_cols, rng);
        cells
            .into_iter()
            .take(wanted)
            .map(|c| {
                let center = jittered_cell_center(c, cell, rng);
                let kind = GalaxyType::roll(rng);
                let colors = kind.colors();
                let [r, g, b] = colors[rng.next_usize(colors.len())];
                Galaxy {
                    kind,
                    center,
                    size_factor: rng.next_range(cfg.min_size, cfg.max_size),
                    arms: 2 + rng.next_usize(2),
                    view_x: rng.next_angle(),
                    view_y: rng.next_f64() * std::f64::consts::PI - std::f64::consts::FRAC_PI_2,
                    color: Srgb::from_rgb8(r, g, b),
                }
            })
            .collect()
    }

    /// Regenerates the galaxies and bakes the raster for a `width x height` surface.
    pub fn bake(&mut self, width: usize, height: usize) -> Result<(), EngineError> {
        let viewport = Viewport::new(width, height)?;
        let mut raster = Canvas::new(width, height)?;
        let galaxies = self.place(viewport);
        let scale = DVec2::new(
            width as f64 / self.config.reference_width as f64,
            height as f64 / self.config.reference_height as f64,
        );
        let mut points = Vec::new();
        for galaxy in &galaxies {
            points.extend(galaxy.points(scale, self.config.special_chance, &mut self.rng));
        }

        let mobile = self.is_mobile(viewport);
        let skipped = draw_points(&mut raster, &points);
        if !mobile {
            chromatic_aberration(&mut raster, &self.config.chromatic_aberration)?;
        }
        let passes = if mobile { 1 } else { 2 };
        for _ in 0..passes {
            aura(&mut raster, self.config.aura_radius)?;
            draw_points(&mut raster, &points);
        }
        gaussian_blur(&mut raster, self.config.blur_radius);

        if skipped > 0 {
            warn!(skipped, "galaxy points skipped");
        }
        debug!(
            galaxies = galaxies.len(),
            points = points.len(),
            mobile,
            "baked galaxies"
        );
        self.galaxies = galaxies;
        self.points = points;
        self.raster = Some(raster);
        Ok(())
    }
}

/// Draws every point, skipping the ones that fail. Returns the skipped count.
fn draw_points(canvas: &mut Canvas, points: &[GalaxyPoint]) -> usize {
    let mut skipped = 0;
    for p in points {
        let color = p.color.with_alpha(p.opacity);
        if let Err(err) = canvas.fill_circle(p.position, p.radius, color, BlendMode::Normal) {
            trace!(%err, "galaxy point draw failed");
            skipped += 1;
        }
    }
    skipped
}

impl Effect for Galaxies {
    fn name(&self) -> &'static str {
        "galaxies"
    }

    fn resize(&mut self, width: usize, height: usize) -> Result<(), EngineError> {
        self.bake(width, height)
    }

    fn update(&mut self, _t: f64) {}

    fn render(&self, canvas: &mut Canvas, _t: f64) -> Result<(), EngineError> {
        match &self.raster {
            Some(raster) => canvas.draw_canvas(raster, 0, 0, 1.0, BlendMode::Normal),
            None => Ok(()),
        }
    }

    fn teardown(&mut self) {
        self.galaxies.clear();
        self.points.clear();
        self.raster = None;
    }

    fn params(&self) -> Value {
        config_to_json(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    fn quick() -> Value {
        json!({"aura_radius": 2, "blur_radius": 1})
    }

    // -- count table --

    #[test]
    fn count_table_desktop() {
        assert_eq!(galaxy_count(1080, false), 8);
        assert_eq!(galaxy_count(1079, false), 7);
        assert_eq!(galaxy_count(8000, false), 28);
        assert_eq!(galaxy_count(360, false), 3);
        assert_eq!(galaxy_count(100, false), 0);
    }

    #[test]
    fn count_table_mobile() {
        assert_eq!(galaxy_count(1080, true), 5);
        assert_eq!(galaxy_count(900, true), 4);
        assert_eq!(galaxy_count(100, true), 2);
    }

    // -- placement --

    #[test]
    fn galaxies_occupy_distinct_cells() {
        let mut fx = Galaxies::from_json(Some(9), &quick()).unwrap();
        let placed = fx.place(Viewport::new(1920, 1440).unwrap());
        assert_eq!(placed.len(), 10);
        let cells: HashSet<(u64, u64)> = placed
            .iter()
            .map(|g| ((g.center.x / 384.0) as u64, (g.center.y / 216.0) as u64))
            .collect();
        assert_eq!(cells.len(), placed.len());
    }

    #[test]
    fn placement_respects_ranges() {
        let mut fx = Galaxies::from_json(Some(10), &quick()).unwrap();
        for _ in 0..20 {
            for g in fx.place(Viewport::new(1920, 1080).unwrap()) {
                assert!((0.02..0.08).contains(&g.size_factor));
                assert!(g.arms == 2 || g.arms == 3);
                assert!((-std::f64::consts::FRAC_PI_2..std::f64::consts::FRAC_PI_2).contains(&g.view_y));
                let palette: Vec<Srgb> = g
                    .kind
                    .colors()
                    .into_iter()
                    .map(|[r, gg, b]| Srgb::from_rgb8(r, gg, b))
                    .collect();
                assert!(palette.contains(&g.color));
            }
        }
    }

    #[test]
    fn count_is_capped_by_grid() {
        let mut fx = Galaxies::from_json(Some(11), &json!({"count": 40})).unwrap();
        assert_eq!(fx.place(Viewport::new(1920, 1080).unwrap()).len(), 25);
    }

    // -- baking --

    #[test]
    fn bake_produces_visible_raster() {
        let mut fx = Galaxies::from_json(Some(12), &json!({"count": 3, "aura_radius": 2, "blur_radius": 1})).unwrap();
        fx.resize(320, 180).unwrap();
        assert_eq!(fx.galaxies().len(), 3);
        let raster = fx.raster().unwrap();
        assert_eq!((raster.width(), raster.height()), (320, 180));
        assert!(!raster.is_blank());
    }

    #[test]
    fn bad_point_is_skipped_and_others_still_draw() {
        let point = |x: f64, y: f64| GalaxyPoint {
            position: DVec2::new(x, y),
            radius: 2.0,
            color: Srgb::WHITE,
            opacity: 1.0,
        };
        let mut nan = point(0.0, 0.0);
        nan.radius = f64::NAN;
        let points = [point(5.0, 5.0), nan, point(15.0, 5.0)];
        let mut canvas = Canvas::new(20, 10).unwrap();
        assert_eq!(draw_points(&mut canvas, &points), 1);
        assert!(canvas.pixel(5, 5).unwrap().a > 0.9);
        assert!(canvas.pixel(15, 5).unwrap().a > 0.9);
    }

    #[test]
    fn baked_points_follow_the_galaxies() {
        let mut fx = Galaxies::from_json(Some(16), &json!({"count": 2, "aura_radius": 1, "blur_radius": 1})).unwrap();
        fx.resize(120, 80).unwrap();
        assert!(!fx.points().is_empty());
        fx.teardown();
        assert!(fx.points().is_empty());
    }

    #[test]
    fn render_is_idempotent_and_static() {
        let mut fx = Galaxies::from_json(Some(13), &json!({"count": 2, "aura_radius": 2, "blur_radius": 1})).unwrap();
        fx.resize(200, 120).unwrap();
        let mut a = Canvas::new(200, 120).unwrap();
        let mut b = Canvas::new(200, 120).unwrap();
        fx.update(0.0);
        fx.render(&mut a, 0.0).unwrap();
        fx.update(5.0);
        fx.render(&mut b, 5.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn zero_galaxies_stay_blank() {
        let mut fx = Galaxies::from_json(Some(14), &json!({"count": 0})).unwrap();
        fx.resize(64, 64).unwrap();
        assert!(fx.raster().unwrap().is_blank());
    }

    #[test]
    fn teardown_drops_raster() {
        let mut fx = Galaxies::from_json(Some(15), &json!({"count": 1, "aura_radius": 1, "blur_radius": 1})).unwrap();
        fx.resize(50, 50).unwrap();
        fx.teardown();
        assert!(fx.raster().is_none());
        let mut c = Canvas::new(50, 50).unwrap();
        fx.render(&mut c, 0.0).unwrap();
        assert!(c.is_blank());
    }

    #[test]
    fn invalid_config_rejected() {
        assert!(Galaxies::from_json(None, &json!({"min_size": 0.5, "max_size": 0.1})).is_err());
        assert!(Galaxies::from_json(None, &json!({"grid_rows": 0})).is_err());
    }

    #[test]
    fn params_expose_defaults() {
        let fx = Galaxies::from_json(Some(1), &Value::Null).unwrap();
        let params = fx.params();
        assert_eq!(params["mobile_breakpoint"], 768);
        assert_eq!(params["chromatic_aberration"]["opacity"], 0.15);
    }
}
