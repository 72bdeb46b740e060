//! Starfield configuration: per-class profiles, shared starburst settings and
//! weighted palettes.
//!
//! Defaults reproduce the canonical look (glow size factor 4.75 for large
//! stars, ray length factor 9). Any subset can be overridden with a partial
//! JSON object through [`StarfieldConfig::from_json`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use skyfx_core::animate::TwinkleParams;
use skyfx_core::error::EngineError;
use skyfx_core::palette::{WeightedColor, WeightedPalette};
use skyfx_core::params::config_from_json;
use skyfx_core::particle::SizeClass;
use skyfx_core::Srgb;

/// Inclusive-exclusive radius range `[min, max)` in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeRange {
    pub min: f64,
    pub max: f64,
}

/// Per-class starburst eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarburstProfile {
    pub enabled: bool,
    pub animate: bool,
    /// Angular speed of the ray pulse in radians per second.
    pub animation_speed: f64,
    /// Multiplier on the shared ray length.
    pub length_scale: f64,
}

impl Default for StarburstProfile {
    fn default() -> Self {
        Self {
            enabled: false,
            animate: true,
            animation_speed: 0.0,
            length_scale: 1.0,
        }
    }
}

/// Radial glow halo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlowProfile {
    pub enabled: bool,
    /// Halo radius as a multiple of the star radius.
    pub size_factor: f64,
    pub opacity: f64,
}

impl Default for GlowProfile {
    fn default() -> Self {
        Self {
            enabled: false,
            size_factor: 1.75,
            opacity: 0.1,
        }
    }
}

/// Layer blur. `amount` is the Gaussian standard deviation in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlurProfile {
    pub enabled: bool,
    pub amount: f64,
}

impl Default for BlurProfile {
    fn default() -> Self {
        Self {
            enabled: false,
            amount: 0.0,
        }
    }
}

impl BlurProfile {
    /// Kernel radius covering three standard deviations, or 0 when inactive.
    pub fn radius(&self) -> usize {
        if self.enabled && self.amount > 0.0 && self.amount.is_finite() {
            (3.0 * self.amount).ceil() as usize
        } else {
            0
        }
    }
}

/// Random opacity dips.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlickerProfile {
    /// Probability per rendered frame that an idle star starts flickering.
    pub chance: f64,
    pub min_frames: u32,
    pub max_frames: u32,
    pub depth: f64,
}

impl Default for FlickerProfile {
    fn default() -> Self {
        Self {
            chance: 0.0,
            min_frames: 3,
            max_frames: 8,
            depth: 0.6,
        }
    }
}

/// Per-star channel split drawn under the core.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AberrationProfile {
    pub enabled: bool,
    /// Opacity of each channel disk.
    pub intensity: f64,
    pub red_offset: f64,
    pub green_offset: f64,
    pub blue_offset: f64,
}

impl Default for AberrationProfile {
    fn default() -> Self {
        Self {
            enabled: false,
            intensity: 0.35,
            red_offset: 1.0,
            green_offset: 0.0,
            blue_offset: -1.0,
        }
    }
}

/// Everything that distinguishes one size class from another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassProfile {
    pub enabled: bool,
    /// Star count at the reference resolution.
    pub count: usize,
    pub size: SizeRange,
    pub brightness: f64,
    pub brightness_enabled: bool,
    pub twinkle: TwinkleParams,
    pub starburst: StarburstProfile,
    pub glow: GlowProfile,
    pub blur: BlurProfile,
    pub flicker: FlickerProfile,
    pub aberration: AberrationProfile,
    /// Paint the core white; glow and rays keep the palette color.
    pub white_core: bool,
}

impl Default for ClassProfile {
    fn default() -> Self {
        Self::tiny()
    }
}

impl ClassProfile {
    pub fn large() -> Self {
        Self {
            enabled: true,
            count: 115,
            size: SizeRange { min: 2.8, max: 3.5 },
            brightness: 1.0,
            brightness_enabled: true,
            twinkle: twinkle(0.15, 0.1, 0.3),
            starburst: StarburstProfile {
                enabled: true,
                animate: true,
                animation_speed: 7.0,
                length_scale: 1.0,
            },
            glow: GlowProfile {
                enabled: true,
                size_factor: 4.75,
                opacity: 0.35,
            },
            blur: BlurProfile::default(),
            flicker: FlickerProfile {
                chance: 0.0002,
                ..FlickerProfile::default()
            },
            aberration: AberrationProfile {
                enabled: true,
                ..AberrationProfile::default()
            },
            white_core: true,
        }
    }

    pub fn medium() -> Self {
        Self {
            enabled: true,
            count: 390,
            size: SizeRange { min: 1.7, max: 2.7 },
            brightness: 1.0,
            brightness_enabled: true,
            twinkle: twinkle(0.25, 0.5, 0.4),
            starburst: StarburstProfile {
                enabled: true,
                animate: true,
                animation_speed: 7.0,
                length_scale: 0.7,
            },
            glow: GlowProfile {
                enabled: true,
                size_factor: 3.75,
                opacity: 0.3,
            },
            blur: BlurProfile::default(),
            flicker: FlickerProfile {
                chance: 0.0005,
                ..FlickerProfile::default()
            },
            aberration: AberrationProfile::default(),
            white_core: true,
        }
    }

    pub fn small() -> Self {
        Self {
            enabled: true,
            count: 2500,
            size: SizeRange { min: 0.8, max: 1.6 },
            brightness: 1.0,
            brightness_enabled: true,
            twinkle: twinkle(0.10, 0.3, 0.5),
            starburst: StarburstProfile {
                length_scale: 0.5,
                ..StarburstProfile::default()
            },
            glow: GlowProfile {
                enabled: false,
                size_factor: 2.75,
                opacity: 0.2,
            },
            blur: BlurProfile {
                enabled: false,
                amount: 0.1,
            },
            flicker: FlickerProfile {
                chance: 0.001,
                ..FlickerProfile::default()
            },
            aberration: AberrationProfile::default(),
            white_core: false,
        }
    }

    pub fn tiny() -> Self {
        Self {
            enabled: true,
            count: 6800,
            size: SizeRange { min: 0.3, max: 0.7 },
            brightness: 1.0,
            brightness_enabled: true,
            twinkle: twinkle(0.005, 0.4, 0.6),
            starburst: StarburstProfile {
                length_scale: 0.3,
                ..StarburstProfile::default()
            },
            glow: GlowProfile::default(),
            blur: BlurProfile {
                enabled: false,
                amount: 0.1,
            },
            flicker: FlickerProfile {
                chance: 0.003,
                ..FlickerProfile::default()
            },
            aberration: AberrationProfile::default(),
            white_core: false,
        }
    }

    /// Defaults for `class`.
    pub fn for_class(class: SizeClass) -> Self {
        match class {
            SizeClass::Large => Self::large(),
            SizeClass::Medium => Self::medium(),
            SizeClass::Small => Self::small(),
            SizeClass::Tiny => Self::tiny(),
        }
    }
}

fn twinkle(intensity_radius: f64, intensity_opacity: f64, percentage: f64) -> TwinkleParams {
    TwinkleParams {
        enabled: true,
        speed: 5.0,
        intensity_radius,
        intensity_opacity,
        percentage,
        complex: true,
    }
}

/// The four class profiles, keyed by name in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassProfiles {
    pub large: ClassProfile,
    pub medium: ClassProfile,
    pub small: ClassProfile,
    pub tiny: ClassProfile,
}

impl Default for ClassProfiles {
    fn default() -> Self {
        Self {
            large: ClassProfile::large(),
            medium: ClassProfile::medium(),
            small: ClassProfile::small(),
            tiny: ClassProfile::tiny(),
        }
    }
}

impl ClassProfiles {
    pub fn get(&self, class: SizeClass) -> &ClassProfile {
        match class {
            SizeClass::Large => &self.large,
            SizeClass::Medium => &self.medium,
            SizeClass::Small => &self.small,
            SizeClass::Tiny => &self.tiny,
        }
    }

    pub fn get_mut(&mut self, class: SizeClass) -> &mut ClassProfile {
        match class {
            SizeClass::Large => &mut self.large,
            SizeClass::Medium => &mut self.medium,
            SizeClass::Small => &mut self.small,
            SizeClass::Tiny => &mut self.tiny,
        }
    }
}

/// Starburst settings shared by every eligible class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarburstSettings {
    pub enabled: bool,
    pub ray_count: u32,
    /// Ray length as a multiple of the star radius.
    pub ray_length_factor: f64,
    /// Angle of the first ray in degrees.
    pub angle: f64,
    pub opacity: f64,
    /// Shortest ray length as a fraction of the full length while pulsing.
    pub min_ray_factor: f64,
    /// Ray stroke width as a fraction of the star radius.
    pub width_factor: f64,
}

impl Default for StarburstSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ray_count: 4,
            ray_length_factor: 9.0,
            angle: 0.0,
            opacity: 0.8,
            min_ray_factor: 0.8,
            width_factor: 0.5,
        }
    }
}

/// Weighted color tables. Medium and large stars draw from the basic table
/// plus their own extra entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    pub basic: Vec<WeightedColor>,
    pub medium_extra: Vec<WeightedColor>,
    pub large_extra: Vec<WeightedColor>,
}

fn weighted(table: &[([u8; 3], u32)]) -> Vec<WeightedColor> {
    table
        .iter()
        .map(|&([r, g, b], weight)| WeightedColor {
            color: Srgb::from_rgb8(r, g, b),
            weight,
        })
        .collect()
}

impl Default for PaletteConfig {
    fn default() -> Self {
        let basic = weighted(&[
            ([0xad, 0xb2, 0xff], 1),
            ([0x4f, 0x86, 0xf6], 1),
            ([0x5a, 0xad, 0xf2], 2),
            ([0x91, 0xc2, 0xff], 3),
            ([0xce, 0xf3, 0xff], 10),
            ([0xff, 0xff, 0xff], 10),
            ([0xff, 0xff, 0xe3], 0),
            ([0xfc, 0xfc, 0x8f], 1),
            ([0xfe, 0xf3, 0xb9], 1),
            ([0xfb, 0x99, 0x64], 1),
            ([0xfd, 0xba, 0xa2], 1),
            ([0xf3, 0x74, 0x77], 1),
            ([0xf9, 0xbd, 0xcd], 1),
        ]);
        let extra = |spring_green: u32| {
            weighted(&[
                ([0x7b, 0x96, 0xff], 1),
                ([0x34, 0x80, 0xff], 8),
                ([0x76, 0xcf, 0xfa], 1),
                ([0xff, 0xe6, 0x87], 3),
                ([0xff, 0xab, 0x1a], 1),
                ([0xff, 0x7f, 0x10], 1),
                ([0xff, 0x5b, 0x5b], 3),
                ([0x3f, 0xfa, 0xb2], spring_green),
                ([0x48, 0xd1, 0xcc], 1),
                ([0x20, 0xb2, 0xaa], 1),
            ])
        };
        Self {
            basic,
            medium_extra: extra(1),
            large_extra: extra(2),
        }
    }
}

/// Expanded palettes per class, built once from a [`PaletteConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClassPalettes {
    basic: WeightedPalette,
    medium: WeightedPalette,
    large: WeightedPalette,
}

impl ClassPalettes {
    pub fn build(config: &PaletteConfig) -> Result<Self, EngineError> {
        let basic = WeightedPalette::from_weights(&config.basic)?;
        let mut medium = basic.clone();
        medium.extend(&config.medium_extra);
        let mut large = basic.clone();
        large.extend(&config.large_extra);
        Ok(Self {
            basic,
            medium,
            large,
        })
    }

    pub fn for_class(&self, class: SizeClass) -> &WeightedPalette {
        match class {
            SizeClass::Large => &self.large,
            SizeClass::Medium => &self.medium,
            SizeClass::Small | SizeClass::Tiny => &self.basic,
        }
    }
}

/// Full starfield configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarfieldConfig {
    pub reference_width: usize,
    pub reference_height: usize,
    pub classes: ClassProfiles,
    pub starburst: StarburstSettings,
    /// Center bias exponent; 0 is uniform.
    pub distribution: f64,
    /// Pool prewarm multiplier, at least 1.
    pub pool_factor: f64,
    /// Frame rate the animation is tuned for.
    pub framerate: f64,
    pub palettes: PaletteConfig,
}

impl Default for StarfieldConfig {
    fn default() -> Self {
        Self {
            reference_width: 1920,
            reference_height: 1080,
            classes: ClassProfiles::default(),
            starburst: StarburstSettings::default(),
            distribution: 0.0,
            pool_factor: 1.2,
            framerate: 20.0,
            palettes: PaletteConfig::default(),
        }
    }
}

impl StarfieldConfig {
    /// Merges a partial JSON object over the defaults and validates the result.
    pub fn from_json(params: &Value) -> Result<Self, EngineError> {
        let config: Self = config_from_json(params)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configs that cannot produce a scene.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.reference_width == 0 || self.reference_height == 0 {
            return Err(EngineError::InvalidConfig(
                "reference resolution must be non-zero".to_string(),
            ));
        }
        if !self.distribution.is_finite() || self.distribution < 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "distribution must be a finite value >= 0, got {}",
                self.distribution
            )));
        }
        if !self.pool_factor.is_finite() || self.pool_factor < 1.0 {
            return Err(EngineError::InvalidConfig(format!(
                "pool_factor must be >= 1, got {}",
                self.pool_factor
            )));
        }
        for class in SizeClass::ALL {
            let profile = self.classes.get(class);
            let SizeRange { min, max } = profile.size;
            if !(min.is_finite() && max.is_finite()) || min < 0.0 || max < min {
                return Err(EngineError::InvalidConfig(format!(
                    "{class} size range [{min}, {max}] is invalid"
                )));
            }
            if !profile.brightness.is_finite() || profile.brightness < 0.0 {
                return Err(EngineError::InvalidConfig(format!(
                    "{class} brightness must be >= 0"
                )));
            }
        }
        ClassPalettes::build(&self.palettes)?;
        Ok(())
    }
}
