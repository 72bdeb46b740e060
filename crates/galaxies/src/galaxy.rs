//! Galaxy shapes and their point clouds.
//!
//! Every galaxy is the same struct tagged with a [`GalaxyType`]; the type
//! only selects an immutable [`ShapeProfile`] and a color set. A galaxy is
//! turned into three point populations (arms, inter-arm field, core) which
//! are tilted by two view angles and then painted as small disks.

use std::f64::consts::{PI, TAU};

use glam::DVec2;
use serde::{Deserialize, Serialize};
use skyfx_core::field::pick_cumulative;
use skyfx_core::{Srgb, Xorshift64};

use crate::shade::{core_tint, random_shade};

/// Outer radius of a galaxy with size factor 1, in pixels.
pub const BASE_GALAXY_SIZE: f64 = 500.0;
/// Size factor at which a galaxy uses its full base point count.
pub const MAX_SIZE_FACTOR: f64 = 0.08;
/// Colors that occasionally replace an arm point's shade.
pub const SPECIAL_COLORS: [[u8; 3]; 3] = [[0xff, 0xff, 0xff], [0xc8, 0xc8, 0xff], [0xff, 0xf0, 0xc8]];

const O_TYPE: [[u8; 3]; 2] = [[0x95, 0x7f, 0xf7], [0xad, 0xb2, 0xff]];
const B_TYPE: [[u8; 3]; 2] = [[0x4f, 0x86, 0xf6], [0x5a, 0xad, 0xf2]];
const A_TYPE: [[u8; 3]; 2] = [[0x91, 0xc2, 0xff], [0xce, 0xf3, 0xff]];
const F_TYPE: [[u8; 3]; 2] = [[0xff, 0xff, 0xff], [0xff, 0xff, 0xe3]];
const G_TYPE: [[u8; 3]; 2] = [[0xfe, 0xfe, 0xa7], [0xfe, 0xf3, 0xb9]];
const K_TYPE: [[u8; 3]; 2] = [[0xfb, 0x99, 0x64], [0xfd, 0xba, 0xa2]];
const M_TYPE: [[u8; 3]; 2] = [[0xf3, 0x74, 0x77], [0xf9, 0xbd, 0xcd]];

/// Morphology of a galaxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GalaxyType {
    Spiral,
    SpiralAlternate,
    Elliptical,
    Irregular,
    Ring,
}

/// Cumulative probability of each type.
pub const TYPE_TABLE: [(f64, GalaxyType); 5] = [
    (0.6, GalaxyType::Spiral),
    (0.8, GalaxyType::SpiralAlternate),
    (0.9, GalaxyType::Elliptical),
    (0.98, GalaxyType::Irregular),
    (1.0, GalaxyType::Ring),
];

/// Shape parameters of one galaxy, already scaled by its size factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeProfile {
    /// Points per arm at the maximum size factor.
    pub base_points: usize,
    /// Arm winding: the arm turns `10 * pi * tightness` radians end to end.
    pub tightness: f64,
    pub start_radius: f64,
    pub end_radius: f64,
    /// Jitter across the arm as a fraction of the radius.
    pub arm_width: f64,
    /// Inter-arm points per arm point.
    pub inter_arm_density: f64,
    /// Core points per 240.
    pub core_density: f64,
    pub core_radius: f64,
}

impl GalaxyType {
    pub const ALL: [GalaxyType; 5] = [
        GalaxyType::Spiral,
        GalaxyType::SpiralAlternate,
        GalaxyType::Elliptical,
        GalaxyType::Irregular,
        GalaxyType::Ring,
    ];

    /// Picks a type from [`TYPE_TABLE`].
    pub fn roll(rng: &mut Xorshift64) -> GalaxyType {
        pick_cumulative(&TYPE_TABLE, rng.next_f64()).unwrap_or(GalaxyType::Spiral)
    }

    /// Shape of a galaxy of this type with the given size factor.
    pub fn profile(self, size_factor: f64) -> ShapeProfile {
        let s = size_factor;
        let end_radius = BASE_GALAXY_SIZE * s;
        match self {
            GalaxyType::Spiral => ShapeProfile {
                base_points: 325,
                tightness: 0.25,
                start_radius: 5.0 * s,
                end_radius,
                arm_width: 2.9 * s,
                inter_arm_density: 2.0 * s,
                core_density: 20.0 * s,
                core_radius: 100.0 * s,
            },
            GalaxyType::SpiralAlternate => ShapeProfile {
                base_points: 275,
                tightness: 0.32,
                start_radius: 5.0 * s,
                end_radius,
                arm_width: 2.2 * s,
                inter_arm_density: 2.5 * s,
                core_density: 20.0 * s,
                core_radius: 80.0 * s,
            },
            GalaxyType::Elliptical => ShapeProfile {
                base_points: 200,
                tightness: 0.7,
                start_radius: s,
                end_radius,
                arm_width: 5.0 * s,
                inter_arm_density: 2.5 * s,
                core_density: s,
                core_radius: 50.0 * s,
            },
            GalaxyType::Irregular => ShapeProfile {
                base_points: 150,
                tightness: 1.0,
                start_radius: 5.0 * s,
                end_radius,
                arm_width: 0.0,
                inter_arm_density: 1.2 * s,
                core_density: 0.0,
                core_radius: 0.0,
            },
            GalaxyType::Ring => ShapeProfile {
                base_points: 200,
                tightness: 0.5,
                start_radius: 350.0 * s,
                end_radius,
                arm_width: 5.0 * s,
                inter_arm_density: s,
                core_density: 20.0 * s,
                core_radius: 50.0 * s,
            },
        }
    }

    /// Spectral colors a galaxy of this type may take.
    pub fn colors(self) -> Vec<[u8; 3]> {
        let sets: &[&[[u8; 3]; 2]] = match self {
            GalaxyType::Spiral => &[&B_TYPE, &A_TYPE],
            GalaxyType::SpiralAlternate => &[&O_TYPE, &B_TYPE, &A_TYPE],
            GalaxyType::Elliptical => &[&G_TYPE, &K_TYPE, &M_TYPE],
            GalaxyType::Irregular => &[&O_TYPE, &B_TYPE, &A_TYPE, &F_TYPE, &G_TYPE, &K_TYPE, &M_TYPE],
            GalaxyType::Ring => &[&O_TYPE, &B_TYPE],
        };
        sets.iter().flat_map(|set| set.iter().copied()).collect()
    }
}

/// One galaxy, positioned in reference coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Galaxy {
    pub kind: GalaxyType,
    pub center: DVec2,
    pub size_factor: f64,
    pub arms: usize,
    /// Rotation about the vertical axis, in [0, 2pi).
    pub view_x: f64,
    /// Tilt about the horizontal axis, in [-pi/2, pi/2).
    pub view_y: f64,
    pub color: Srgb,
}

/// A single painted point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GalaxyPoint {
    pub position: DVec2,
    pub radius: f64,
    pub color: Srgb,
    pub opacity: f64,
}

impl Galaxy {
    pub fn profile(&self) -> ShapeProfile {
        self.kind.profile(self.size_factor)
    }

    /// Points along each arm.
    pub fn arm_points(&self) -> usize {
        let ratio = self.size_factor / MAX_SIZE_FACTOR;
        (self.profile().base_points as f64 * ratio).floor().max(0.0) as usize
    }

    /// Builds the point cloud for a surface scaled by `scale` from the
    /// reference resolution. Radii and offsets stay in device pixels.
    pub fn points(&self, scale: DVec2, special_chance: f64, rng: &mut Xorshift64) -> Vec<GalaxyPoint> {
        let shape = self.profile();
        let center = self.center * scale;
        let view = View::new(self.view_x, self.view_y);
        let n = self.arm_points();
        let inter = (n as f64 * shape.inter_arm_density).floor() as usize;
        let core = (240.0 * shape.core_density).floor() as usize;
        let mut points = Vec::with_capacity(n * self.arms + inter + core);

        for i in 0..n {
            let t = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 };
            let radius = shape.start_radius + t * (shape.end_radius - shape.start_radius);
            let jitter = shape.arm_width * radius;
            for arm in 0..self.arms {
                let offset = arm as f64 / self.arms as f64 * TAU;
                let angle = t * 10.0 * PI * shape.tightness + offset;
                let dx = rng.next_centered() * jitter;
                let dy = rng.next_centered() * jitter;
                let local = DVec2::from_angle(angle) * radius + DVec2::new(dx, dy);
                let size = (rng.next_f64() * 0.525 + 0.1) * self.size_factor;
                let mut color = random_shade(self.color, radius, shape.core_radius, shape.end_radius, rng);
                if rng.next_bool(special_chance) {
                    let [r, g, b] = SPECIAL_COLORS[rng.next_usize(SPECIAL_COLORS.len())];
                    color = Srgb::from_rgb8(r, g, b);
                }
                let edge = if jitter > 0.0 { dx.abs() / jitter } else { 0.0 };
                points.push(GalaxyPoint {
                    position: center + view.apply(local),
                    radius: size,
                    color,
                    opacity: (1.0 - edge * 1.5).max(0.1),
                });
            }
        }

        for _ in 0..inter {
            let radius = rng.next_range(shape.start_radius, shape.end_radius);
            let local = DVec2::from_angle(rng.next_angle()) * radius;
            let size = (rng.next_f64() * 0.25 + 0.05) * self.size_factor;
            let opacity = rng.next_f64() * 0.6 + 0.4;
            let color = random_shade(self.color, radius, shape.core_radius, shape.end_radius, rng);
            points.push(GalaxyPoint {
                position: center + view.apply(local),
                radius: size,
                color,
                opacity,
            });
        }

        if shape.core_radius > 0.0 {
            for _ in 0..core {
                let radius = rng.next_f64() * shape.core_radius;
                let local = DVec2::from_angle(rng.next_angle()) * radius;
                let size = (rng.next_f64() * 0.6 + 0.15)
                    * (1.0 - radius / shape.core_radius)
                    * self.size_factor;
                let color = core_tint(self.color, radius, shape.core_radius);
                let opacity = rng.next_f64() * 0.4 + 0.6;
                points.push(GalaxyPoint {
                    position: center + view.apply(local),
                    radius: size,
                    color,
                    opacity,
                });
            }
        }
        points
    }
}

/// Two-axis view rotation of a point in the galaxy plane.
#[derive(Debug, Clone, Copy)]
struct View {
    cos_x: f64,
    sin_x: f64,
    cos_y: f64,
    sin_y: f64,
}

impl View {
    fn new(view_x: f64, view_y: f64) -> Self {
        Self {
            cos_x: view_x.cos(),
            sin_x: view_x.sin(),
            cos_y: view_y.cos(),
            sin_y: view_y.sin(),
        }
    }

    /// Rotates about the vertical axis, then tilts about the horizontal one,
    /// and projects back onto the screen plane.
    fn apply(&self, p: DVec2) -> DVec2 {
        let x = p.x * self.cos_x;
        let z = p.x * self.sin_x;
        let y = p.y * self.cos_y - z * self.sin_y;
        DVec2::new(x, y)
    }
}
