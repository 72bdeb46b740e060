#![deny(unsafe_code)]
//! Twinkling multi-layer starfield.
//!
//! Stars come in four size classes (large, medium, small, tiny), each with its
//! own count, size range, twinkle, glow, starburst, blur, flicker and channel
//! split profile. Counts are configured at a reference resolution and scaled
//! by `min(width / reference_width, height / reference_height)`. Particles are
//! pooled per class so regenerating on resize allocates nothing once warm.
//!
//! Layers are drawn tiny first and large last, so bright stars sit on top.

pub mod config;
pub mod patch;
pub mod render;

use serde_json::Value;
use skyfx_core::animate::{burst_ray_factor, update_particle};
use skyfx_core::canvas::{BlendMode, Canvas};
use skyfx_core::error::EngineError;
use skyfx_core::field::{sample_position, scale_factor, scaled_count, Viewport};
use skyfx_core::params::{config_to_json, merge_config};
use skyfx_core::postprocess::gaussian_blur;
use skyfx_core::{Effect, Flicker, Particle, ParticleFactory, ParticlePool, SizeClass, Xorshift64};
use tracing::{debug, trace};

use crate::config::{ClassPalettes, ClassProfile, ClassProfiles};
pub use crate::config::StarfieldConfig;
pub use crate::patch::{ConfigChange, StarfieldPatch};
use crate::render::{core_color, draw_star};

/// Rolls fresh randomness into pooled stars.
struct StarFactory<'a> {
    rng: &'a mut Xorshift64,
    palettes: &'a ClassPalettes,
    classes: &'a ClassProfiles,
}

impl ParticleFactory for StarFactory<'_> {
    fn create(&mut self, class: SizeClass) -> Particle {
        Particle::new(class)
    }

    fn reroll(&mut self, star: &mut Particle) {
        let profile = self.classes.get(star.class);
        star.base_radius = self.rng.next_range(profile.size.min, profile.size.max);
        star.base_color = self.palettes.for_class(star.class).pick(self.rng);
        star.color = core_color(profile, star.base_color);
        star.base_opacity = 1.0;
        star.twinkle_phase = self.rng.next_angle();
        star.burst_phase = self.rng.next_angle();
        star.twinkle_freq2 = 0.3 + 0.7 * self.rng.next_f64();
        star.twinkles = self.rng.next_bool(profile.twinkle.percentage);
        star.reset_animation();
    }
}

/// The starfield effect.
#[derive(Debug, Clone)]
pub struct Starfield {
    config: StarfieldConfig,
    palettes: ClassPalettes,
    rng: Xorshift64,
    pool: ParticlePool,
    stars: [Vec<Particle>; 4],
    viewport: Option<Viewport>,
}

impl Starfield {
    /// Creates an empty starfield. Stars appear after the first
    /// [`generate`](Self::generate) (or `Effect::resize`).
    ///
    /// `seed` of `None` draws one from the clock.
    pub fn new(seed: Option<u64>, config: StarfieldConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let palettes = ClassPalettes::build(&config.palettes)?;
        Ok(Self {
            config,
            palettes,
            rng: seed.map_or_else(Xorshift64::from_entropy, Xorshift64::new),
            pool: ParticlePool::new(),
            stars: Default::default(),
            viewport: None,
        })
    }

    /// Creates a starfield from a partial JSON config merged over the defaults.
    pub fn from_json(seed: Option<u64>, params: &Value) -> Result<Self, EngineError> {
        Self::new(seed, StarfieldConfig::from_json(params)?)
    }

    pub fn config(&self) -> &StarfieldConfig {
        &self.config
    }

    /// Active stars of `class`, in draw order.
    pub fn stars(&self, class: SizeClass) -> &[Particle] {
        &self.stars[class.index()]
    }

    /// Number of active stars of `class`.
    pub fn count(&self, class: SizeClass) -> usize {
        self.stars[class.index()].len()
    }

    pub fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    /// Returns every star to the pool and fills a `width x height` field.
    pub fn generate(&mut self, width: usize, height: usize) -> Result<(), EngineError> {
        let viewport = Viewport::new(width, height)?;
        self.release_stars();
        let reference = Viewport::new(self.config.reference_width, self.config.reference_height)?;
        let scale = scale_factor(viewport, reference);

        let mut factory = StarFactory {
            rng: &mut self.rng,
            palettes: &self.palettes,
            classes: &self.config.classes,
        };
        for class in SizeClass::ALL {
            let profile = self.config.classes.get(class);
            let target = if profile.enabled {
                scaled_count(profile.count, scale)
            } else {
                0
            };
            let created = self
                .pool
                .prewarm(class, target, self.config.pool_factor, &mut factory);
            let stars = &mut self.stars[class.index()];
            stars.reserve(target);
            for _ in 0..target {
                let mut star = self.pool.acquire(class, &mut factory);
                star.position = sample_position(viewport, self.config.distribution, factory.rng);
                stars.push(star);
            }
            debug!(class = %class, count = target, created, "generated star layer");
        }
        self.viewport = Some(viewport);
        Ok(())
    }

    /// Merges `patch` into the config and applies it at the cheapest
    /// sufficient cost.
    ///
    /// On error the previous config stays in place.
    pub fn update_config(&mut self, patch: &StarfieldPatch) -> Result<ConfigChange, EngineError> {
        let next = merge_config(&self.config, &patch.to_value())?;
        next.validate()?;
        let change = ConfigChange::between(&self.config, &next);
        if change == ConfigChange::Unchanged {
            return Ok(change);
        }
        let palettes = ClassPalettes::build(&next.palettes)?;
        self.config = next;
        self.palettes = palettes;
        match change {
            ConfigChange::Regenerate => {
                if let Some(viewport) = self.viewport {
                    self.generate(viewport.width, viewport.height)?;
                }
            }
            ConfigChange::Brightness => self.refresh_colors(),
            ConfigChange::Live | ConfigChange::Unchanged => {}
        }
        debug!(?change, "applied starfield config");
        Ok(change)
    }

    /// Sets the brightness of one class, or of every class when `class` is `None`.
    pub fn set_brightness(
        &mut self,
        class: Option<SizeClass>,
        brightness: f64,
    ) -> Result<ConfigChange, EngineError> {
        let patch = match class {
            Some(class) => StarfieldPatch::new().brightness(class, brightness),
            None => SizeClass::ALL
                .into_iter()
                .fold(StarfieldPatch::new(), |patch, class| patch.brightness(class, brightness)),
        };
        self.update_config(&patch)
    }

    /// Recomputes core colors from the stored palette colors.
    fn refresh_colors(&mut self) {
        for class in SizeClass::ALL {
            let profile = self.config.classes.get(class);
            for star in &mut self.stars[class.index()] {
                star.color = core_color(profile, star.base_color);
            }
        }
    }

    fn release_stars(&mut self) {
        for stars in &mut self.stars {
            self.pool.release_all(stars.drain(..));
        }
    }

    /// Advances twinkle, flicker and ray animation to `t` seconds.
    pub fn advance(&mut self, t: f64) {
        let burst = &self.config.starburst;
        for class in SizeClass::ALL {
            let profile = self.config.classes.get(class);
            let rays = burst.enabled && profile.starburst.enabled && profile.starburst.animate;
            for star in &mut self.stars[class.index()] {
                if star.flicker.is_none() && self.rng.next_bool(profile.flicker.chance) {
                    star.flicker = Some(roll_flicker(&mut self.rng, profile));
                }
                update_particle(star, t, &profile.twinkle);
                star.ray_factor = if rays {
                    burst_ray_factor(
                        star.burst_phase,
                        t,
                        profile.starburst.animation_speed,
                        burst.min_ray_factor,
                    )
                } else {
                    1.0
                };
            }
        }
    }

    /// Draws every enabled layer onto `canvas`, tiny first.
    ///
    /// A star that fails to draw is skipped; the rest of the frame continues.
    pub fn draw(&self, canvas: &mut Canvas) -> Result<(), EngineError> {
        let mut skipped = 0usize;
        for class in SizeClass::DRAW_ORDER {
            let profile = self.config.classes.get(class);
            let stars = &self.stars[class.index()];
            if !profile.enabled || stars.is_empty() {
                continue;
            }
            let radius = profile.blur.radius();
            if radius == 0 {
                skipped += self.draw_layer(canvas, stars, profile);
                continue;
            }
            let mut layer = Canvas::new(canvas.width(), canvas.height())?;
            skipped += self.draw_layer(&mut layer, stars, profile);
            gaussian_blur(&mut layer, radius);
            canvas.draw_canvas(&layer, 0, 0, 1.0, BlendMode::Normal)?;
        }
        if skipped > 0 {
            trace!(skipped, "skipped star draws");
        }
        Ok(())
    }

    fn draw_layer(&self, canvas: &mut Canvas, stars: &[Particle], profile: &ClassProfile) -> usize {
        let mut skipped = 0;
        for star in stars {
            if let Err(err) = draw_star(canvas, star, profile, &self.config.starburst) {
                trace!(class = %star.class, %err, "star draw failed");
                skipped += 1;
            }
        }
        skipped
    }
}

fn roll_flicker(rng: &mut Xorshift64, profile: &ClassProfile) -> Flicker {
    let min = profile.flicker.min_frames.max(1);
    let max = profile.flicker.max_frames.max(min);
    let frames = min + rng.next_usize((max - min + 1) as usize) as u32;
    Flicker::new(frames, profile.flicker.depth)
}

impl Effect for Starfield {
    fn name(&self) -> &'static str {
        "starfield"
    }

    fn resize(&mut self, width: usize, height: usize) -> Result<(), EngineError> {
        self.generate(width, height)
    }

    fn update(&mut self, t: f64) {
        self.advance(t);
    }

    fn render(&self, canvas: &mut Canvas, _t: f64) -> Result<(), EngineError> {
        self.draw(canvas)
    }

    fn teardown(&mut self) {
        self.release_stars();
        self.viewport = None;
    }

    fn params(&self) -> Value {
        config_to_json(&self.config)
    }

    fn preferred_fps(&self) -> Option<f64> {
        Some(self.config.framerate)
    }
}
