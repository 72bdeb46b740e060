//! Trail samples, sparkles and the pointer state machine.

use std::collections::VecDeque;

use glam::DVec2;
use skyfx_core::animate::linear_decay;
use skyfx_core::{Srgb, Xorshift64};

use crate::config::{CursorTrailConfig, Range};

/// One recorded pointer sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailPoint {
    pub position: DVec2,
    /// Sample time in seconds.
    pub time: f64,
    pub speed: f64,
    pub opacity: f64,
    pub width: f64,
}

/// A short-lived star-shaped spark.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sparkle {
    pub position: DVec2,
    pub velocity: DVec2,
    pub size: f64,
    pub opacity: f64,
    pub decay: f64,
    pub color: Srgb,
    pub rays: u32,
}

/// Whether the pointer is over the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailState {
    /// Pointer off the surface, trail empty.
    #[default]
    Idle,
    /// Pointer on the surface, samples being appended.
    Tracking,
}

/// Trail points, sparkles and pointer tracking.
#[derive(Debug, Clone)]
pub struct Trail {
    points: VecDeque<TrailPoint>,
    sparkles: Vec<Sparkle>,
    state: TrailState,
    last_sample: Option<(DVec2, f64)>,
    speed: f64,
}

fn roll(rng: &mut Xorshift64, range: Range) -> f64 {
    rng.next_range(range.min, range.max)
}

impl Trail {
    pub fn new(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity + 1),
            sparkles: Vec::new(),
            state: TrailState::Idle,
            last_sample: None,
            speed: 0.0,
        }
    }

    pub fn points(&self) -> &VecDeque<TrailPoint> {
        &self.points
    }

    pub fn sparkles(&self) -> &[Sparkle] {
        &self.sparkles
    }

    pub fn state(&self) -> TrailState {
        self.state
    }

    /// Most recent cursor speed.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Records a pointer move to `position` at `time` seconds.
    ///
    /// The first move after `Idle` starts a fresh trail. Moves longer than the
    /// max segment length are split into evenly spaced points with
    /// interpolated times; only the real cursor sample spawns sparkles. A move
    /// with no elapsed time adds nothing.
    pub fn pointer_move(
        &mut self,
        position: DVec2,
        time: f64,
        config: &CursorTrailConfig,
        rng: &mut Xorshift64,
    ) {
        if self.state == TrailState::Idle {
            self.state = TrailState::Tracking;
            self.points.clear();
            self.last_sample = None;
        }
        match self.last_sample {
            Some((last, last_time)) => {
                let dt = time - last_time;
                if dt > 0.0 {
                    let delta = position - last;
                    let distance = delta.length();
                    let speed = (distance / (dt * 1000.0) * config.speed_scale).min(config.max_speed);
                    self.speed = speed;
                    if config.interpolate && distance > config.max_segment_length {
                        let segments = (distance / config.max_segment_length).ceil() as usize;
                        for i in 1..=segments {
                            let ratio = i as f64 / segments as f64;
                            self.add_point(
                                last + delta * ratio,
                                time - (1.0 - ratio) * dt,
                                speed,
                                i == segments,
                                config,
                                rng,
                            );
                        }
                    } else {
                        self.add_point(position, time, speed, true, config, rng);
                    }
                }
            }
            None => {
                self.speed = 0.0;
                self.add_point(position, time, 0.0, true, config, rng);
            }
        }
        self.last_sample = Some((position, time));
    }

    fn add_point(
        &mut self,
        position: DVec2,
        time: f64,
        speed: f64,
        spawn: bool,
        config: &CursorTrailConfig,
        rng: &mut Xorshift64,
    ) {
        self.points.push_back(TrailPoint {
            position,
            time,
            speed,
            opacity: 1.0,
            width: config.base_width + speed,
        });
        let sc = &config.sparkles;
        if spawn && speed > sc.speed_threshold {
            let count = (speed * sc.per_speed).floor() as usize;
            self.sparkles.reserve(count);
            for _ in 0..count {
                let offset = DVec2::from_angle(rng.next_angle()) * rng.next_f64() * sc.spread * speed;
                let rays = sc.min_rays + rng.next_usize((sc.max_rays - sc.min_rays + 1) as usize) as u32;
                self.sparkles.push(Sparkle {
                    position: position + offset,
                    velocity: DVec2::new(rng.next_centered(), rng.next_centered()) * sc.velocity,
                    size: roll(rng, sc.size),
                    opacity: roll(rng, sc.opacity),
                    decay: roll(rng, sc.decay),
                    color: sc.colors[rng.next_usize(sc.colors.len())],
                    rays,
                });
            }
        }
        while self.points.len() > config.max_points {
            self.points.pop_front();
        }
    }

    /// Pointer left the surface: back to `Idle` with an empty trail.
    /// Sparkles already in flight keep fading.
    pub fn leave(&mut self) {
        self.state = TrailState::Idle;
        self.points.clear();
        self.last_sample = None;
        self.speed = 0.0;
    }

    /// Drops every point and sparkle without changing state.
    pub fn clear(&mut self) {
        self.points.clear();
        self.sparkles.clear();
    }

    /// Fades points by age at `t` seconds and steps every sparkle one frame.
    pub fn advance(&mut self, t: f64, config: &CursorTrailConfig, rng: &mut Xorshift64) {
        for point in &mut self.points {
            point.opacity = linear_decay(t - point.time, config.decay_rate).min(1.0);
        }
        self.points.retain(|p| p.opacity > 0.0);

        let sc = &config.sparkles;
        for s in &mut self.sparkles {
            s.position += s.velocity;
            s.velocity += DVec2::new(rng.next_centered(), rng.next_centered()) * sc.jitter;
            s.velocity *= sc.drag;
            s.opacity -= s.decay;
            s.size *= sc.shrink;
        }
        self.sparkles.retain(|s| s.opacity > 0.0);
    }
}
