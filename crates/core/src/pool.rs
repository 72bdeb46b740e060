//! Per-class particle pools.
//!
//! Regenerating a scene on resize releases every active particle back into
//! the pool of its [`SizeClass`] and acquires them again, so a steady-state
//! resize allocates nothing. Reused particles are always re-rolled by the
//! [`ParticleFactory`] so their phases and color never repeat the previous
//! life.

use crate::particle::{Particle, SizeClass};

/// Creates and re-randomizes particles for a pool.
pub trait ParticleFactory {
    /// Builds a brand-new particle for `class`.
    fn create(&mut self, class: SizeClass) -> Particle;

    /// Re-randomizes the phase and color fields of a particle being handed out.
    fn reroll(&mut self, particle: &mut Particle);
}

/// One free list per size class. Single-threaded.
#[derive(Debug, Clone, Default)]
pub struct ParticlePool {
    free: [Vec<Particle>; 4],
}

impl ParticlePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a recycled particle for `class`, or creates one if none is free.
    ///
    /// The particle is re-rolled before it is returned.
    pub fn acquire<F>(&mut self, class: SizeClass, factory: &mut F) -> Particle
    where
        F: ParticleFactory + ?Sized,
    {
        let mut particle = match self.free[class.index()].pop() {
            Some(p) => p,
            None => factory.create(class),
        };
        particle.class = class;
        factory.reroll(&mut particle);
        particle
    }

    /// Returns a particle to the pool of `class`.
    pub fn release(&mut self, mut particle: Particle, class: SizeClass) {
        particle.class = class;
        particle.flicker = None;
        self.free[class.index()].push(particle);
    }

    /// Returns every particle to the pool of its own class.
    pub fn release_all<I>(&mut self, particles: I)
    where
        I: IntoIterator<Item = Particle>,
    {
        for particle in particles {
            let class = particle.class;
            self.release(particle, class);
        }
    }

    /// Grows the pool of `class` to `ceil(target * pool_factor)` free particles.
    ///
    /// `pool_factor` below 1 is treated as 1. Never shrinks the pool. Returns
    /// the number of particles created.
    pub fn prewarm<F>(
        &mut self,
        class: SizeClass,
        target: usize,
        pool_factor: f64,
        factory: &mut F,
    ) -> usize
    where
        F: ParticleFactory + ?Sized,
    {
        let factor = if pool_factor.is_finite() {
            pool_factor.max(1.0)
        } else {
            1.0
        };
        let desired = (target as f64 * factor).ceil() as usize;
        let free = &mut self.free[class.index()];
        let missing = desired.saturating_sub(free.len());
        free.reserve(missing);
        for _ in 0..missing {
            free.push(factory.create(class));
        }
        missing
    }

    /// Free particles for `class`.
    pub fn len(&self, class: SizeClass) -> usize {
        self.free[class.index()].len()
    }

    /// Free particles across all classes.
    pub fn total(&self) -> usize {
        self.free.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Drops every pooled particle.
    pub fn clear(&mut self) {
        for free in &mut self.free {
            free.clear();
        }
    }
}
