//! Trail curve and sparkle drawing.

use std::collections::VecDeque;

use glam::DVec2;
use skyfx_core::canvas::{BlendMode, Canvas};
use skyfx_core::error::EngineError;
use skyfx_core::palette::Gradient;

use crate::config::CursorTrailConfig;
use crate::trail::{Sparkle, TrailPoint};

/// Steps used to flatten each quadratic of the faint base path.
const BASE_PATH_STEPS: usize = 8;

/// Faint continuous path under the trail: a straight first segment, then
/// quadratics whose control point is `prev + (cur - prev2) * 0.2`.
pub fn base_path(points: &VecDeque<TrailPoint>) -> Vec<DVec2> {
    let mut path = Vec::with_capacity(points.len() * BASE_PATH_STEPS);
    let Some(first) = points.front() else {
        return path;
    };
    path.push(first.position);
    for i in 1..points.len() {
        let cur = points[i].position;
        if i == 1 {
            path.push(cur);
            continue;
        }
        let prev = points[i - 1].position;
        let control = prev + (cur - points[i - 2].position) * 0.2;
        for step in 1..=BASE_PATH_STEPS {
            let t = step as f64 / BASE_PATH_STEPS as f64;
            let u = 1.0 - t;
            path.push(prev * (u * u) + control * (2.0 * u * t) + cur * (t * t));
        }
    }
    path
}

/// Bezier control points of segment `i` (from point `i - 1` to `i`).
///
/// Interior segments use the neighbors with `tension`; the first and last
/// segments put both controls at the midpoint.
pub fn segment_controls(points: &VecDeque<TrailPoint>, i: usize, tension: f64) -> (DVec2, DVec2) {
    let prev = points[i - 1].position;
    let cur = points[i].position;
    if i > 1 && i + 1 < points.len() {
        let before = points[i - 2].position;
        let after = points[i + 1].position;
        (
            prev + (cur - before) * tension,
            cur - (after - prev) * tension,
        )
    } else {
        let mid = prev.lerp(cur, 0.5);
        (mid, mid)
    }
}

/// Draws the trail. Returns the number of segments that failed to draw.
pub fn draw_trail(
    canvas: &mut Canvas,
    points: &VecDeque<TrailPoint>,
    config: &CursorTrailConfig,
) -> usize {
    if points.len() < 2 {
        return 0;
    }
    let mut failed = 0;
    let faint = config.color.with_alpha(config.base_path_opacity);
    if canvas
        .stroke_polyline(&base_path(points), config.base_path_width, faint, faint, BlendMode::Normal)
        .is_err()
    {
        failed += 1;
    }

    let n = points.len() as f64;
    for i in 1..points.len() {
        let prev = points[i - 1].position;
        let cur = &points[i];
        let (c1, c2) = segment_controls(points, i, config.tension);
        let progress = i as f64 / n;
        let opacity = progress * cur.opacity;
        let width = cur.width * progress.sqrt();
        if opacity <= 0.0 || width <= 0.0 {
            continue;
        }
        let glow = (10.0 + width * 2.0).min(config.max_glow);
        let halo = config.glow_color.fade(opacity * config.glow_strength);
        let drawn = canvas
            .stroke_cubic(prev, c1, c2, cur.position, width + glow * 0.5, halo, halo, BlendMode::Screen)
            .and_then(|()| {
                canvas.stroke_cubic(
                    prev,
                    c1,
                    c2,
                    cur.position,
                    width,
                    config.color.with_alpha(opacity * config.tail_ratio),
                    config.color.with_alpha(opacity),
                    BlendMode::Normal,
                )
            });
        if drawn.is_err() {
            failed += 1;
        }
    }
    failed
}

/// Vertices of a star with `rays` points alternating between `outer` and
/// `inner` radius, starting on the positive x axis.
pub fn star_polygon(center: DVec2, rays: u32, outer: f64, inner: f64) -> Vec<DVec2> {
    let corners = rays as usize * 2;
    (0..corners)
        .map(|i| {
            let radius = if i % 2 == 0 { outer } else { inner };
            let angle = std::f64::consts::TAU * i as f64 / corners as f64;
            center + DVec2::from_angle(angle) * radius
        })
        .collect()
}

/// Draws one sparkle: a soft halo in its color, then the star shape.
pub fn draw_sparkle(
    canvas: &mut Canvas,
    sparkle: &Sparkle,
    config: &CursorTrailConfig,
) -> Result<(), EngineError> {
    if sparkle.opacity <= 0.0 || sparkle.size <= 0.0 {
        return Ok(());
    }
    let sc = &config.sparkles;
    let color = sparkle.color.with_alpha(sparkle.opacity);
    let halo = Gradient::linear(color.fade(0.5), color.fade(0.0));
    canvas.fill_radial_gradient(
        sparkle.position,
        0.0,
        sparkle.size * sc.glow_factor,
        &halo,
        BlendMode::Screen,
    )?;
    let shape = star_polygon(sparkle.position, sparkle.rays, sparkle.size, sparkle.size * sc.inner_ratio);
    canvas.fill_polygon(&shape, color, BlendMode::Normal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyfx_core::Srgb;

    fn point(x: f64, y: f64) -> TrailPoint {
        TrailPoint {
            position: DVec2::new(x, y),
            time: 0.0,
            speed: 0.0,
            opacity: 1.0,
            width: 4.0,
        }
    }

    fn trail(xy: &[(f64, f64)]) -> VecDeque<TrailPoint> {
        xy.iter().map(|&(x, y)| point(x, y)).collect()
    }

    // -- geometry --

    #[test]
    fn base_path_passes_through_every_point() {
        let pts = trail(&[(0.0, 0.0), (10.0, 0.0), (20.0, 5.0), (30.0, 0.0)]);
        let path = base_path(&pts);
        for p in &pts {
            assert!(path.iter().any(|q| q.distance(p.position) < 1e-9));
        }
        assert_eq!(path.len(), 2 + 2 * BASE_PATH_STEPS);
    }

    #[test]
    fn end_segments_use_midpoint_controls() {
        let pts = trail(&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0)]);
        assert_eq!(segment_controls(&pts, 1, 0.15), (DVec2::new(5.0, 0.0), DVec2::new(5.0, 0.0)));
        assert_eq!(segment_controls(&pts, 2, 0.15), (DVec2::new(15.0, 0.0), DVec2::new(15.0, 0.0)));
    }

    #[test]
    fn interior_segments_use_neighbors() {
        let pts = trail(&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0), (30.0, 0.0)]);
        let (c1, c2) = segment_controls(&pts, 2, 0.15);
        assert_eq!(c1, DVec2::new(13.0, 0.0));
        assert_eq!(c2, DVec2::new(17.0, 0.0));
    }

    #[test]
    fn star_polygon_alternates_radii() {
        let shape = star_polygon(DVec2::ZERO, 5, 2.0, 0.8);
        assert_eq!(shape.len(), 10);
        assert!((shape[0].length() - 2.0).abs() < 1e-12);
        assert!((shape[1].length() - 0.8).abs() < 1e-12);
    }

    // -- drawing --

    #[test]
    fn trail_draws_brighter_toward_the_head() {
        let cfg = CursorTrailConfig::default();
        let pts = trail(&[(10.0, 20.0), (30.0, 20.0), (50.0, 20.0), (70.0, 20.0), (90.0, 20.0)]);
        let mut canvas = Canvas::new(100, 40).unwrap();
        assert_eq!(draw_trail(&mut canvas, &pts, &cfg), 0);
        let tail = canvas.pixel(20, 20).unwrap().a;
        let head = canvas.pixel(85, 20).unwrap().a;
        assert!(head > tail, "head {head} tail {tail}");
    }

    #[test]
    fn full_trail_across_the_screen_renders_within_frame_budget() {
        let cfg = CursorTrailConfig::default();
        // zig-zag spanning the whole surface, the worst case for bounding boxes
        let pts: VecDeque<TrailPoint> = (0..cfg.max_points)
            .map(|i| {
                let u = i as f64 / (cfg.max_points - 1) as f64;
                point(20.0 + u * 1880.0, 540.0 + 480.0 * (u * 12.0).sin())
            })
            .collect();
        let mut canvas = Canvas::new(1920, 1080).unwrap();
        let started = std::time::Instant::now();
        assert_eq!(draw_trail(&mut canvas, &pts, &cfg), 0);
        let elapsed = started.elapsed();
        assert!(elapsed.as_secs_f64() < 2.0, "took {elapsed:?}");
        assert!(!canvas.is_blank());
        assert_eq!(canvas.pixel(1900, 20).unwrap().a, 0.0);
    }

    #[test]
    fn single_point_draws_nothing() {
        let cfg = CursorTrailConfig::default();
        let mut canvas = Canvas::new(20, 20).unwrap();
        assert_eq!(draw_trail(&mut canvas, &trail(&[(5.0, 5.0)]), &cfg), 0);
        assert!(canvas.is_blank());
    }

    #[test]
    fn sparkle_covers_its_center() {
        let cfg = CursorTrailConfig::default();
        let sparkle = Sparkle {
            position: DVec2::new(10.0, 10.0),
            velocity: DVec2::ZERO,
            size: 3.0,
            opacity: 1.0,
            decay: 0.02,
            color: Srgb::from_rgb8(255, 220, 150),
            rays: 4,
        };
        let mut canvas = Canvas::new(20, 20).unwrap();
        draw_sparkle(&mut canvas, &sparkle, &cfg).unwrap();
        assert!(canvas.pixel(10, 10).unwrap().a > 0.9);
        assert!(canvas.pixel(0, 0).unwrap().a == 0.0);
    }

    #[test]
    fn non_finite_sparkle_is_an_error() {
        let cfg = CursorTrailConfig::default();
        let sparkle = Sparkle {
            position: DVec2::new(f64::INFINITY, 0.0),
            velocity: DVec2::ZERO,
            size: 1.0,
            opacity: 1.0,
            decay: 0.02,
            color: Srgb::WHITE,
            rays: 4,
        };
        let mut canvas = Canvas::new(10, 10).unwrap();
        assert!(draw_sparkle(&mut canvas, &sparkle, &cfg).is_err());
    }
}
