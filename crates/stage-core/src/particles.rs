//! Decorative drifting orbs behind an act.
//!
//! Positions are viewport fractions and wrap at the edges. A frozen field
//! holds no frame-loop registration and does no per-frame work.

use crate::config::ParticleTuning;
use crate::error::{Result, StageError};
use crate::lifecycle::{FrameLoop, SharedHost};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

/// Upper bound on orbs in one field.
pub const MAX_PARTICLES: u32 = 256;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    /// Unit drift direction.
    pub heading: Vec2,
    /// Fraction of the viewport width.
    pub radius: f32,
    /// Pulse phase offset in cycles.
    pub phase: f32,
}

pub struct ParticleField {
    particles: Vec<Particle>,
    speed: f32,
    pulse_period: f32,
    clock: f32,
    ticks: u64,
    frame_loop: FrameLoop,
    host: SharedHost,
}

impl ParticleField {
    /// Scatters `count` particles (tuning default when `None`). The layout
    /// is deterministic for a given seed. The field starts frozen.
    pub fn mount(
        host: &SharedHost,
        tuning: &ParticleTuning,
        count: Option<u32>,
        seed: Option<u64>,
    ) -> Result<Self> {
        let count = count.unwrap_or(tuning.count);
        if count > MAX_PARTICLES {
            return Err(StageError::TooManyParticles {
                count,
                max: MAX_PARTICLES,
            });
        }
        let mut rng = StdRng::seed_from_u64(seed.unwrap_or(tuning.seed));
        let particles = (0..count)
            .map(|_| {
                let angle = rng.gen_range(0.0..TAU);
                Particle {
                    position: Vec2::new(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)),
                    heading: Vec2::new(angle.cos(), angle.sin()),
                    radius: rng.gen_range(0.15..0.3),
                    phase: rng.gen_range(0.0..1.0),
                }
            })
            .collect();
        Ok(Self {
            particles,
            speed: tuning.speed,
            pulse_period: tuning.pulse_period,
            clock: 0.0,
            ticks: 0,
            frame_loop: FrameLoop::new(),
            host: host.clone(),
        })
    }

    pub fn start(&mut self) {
        self.frame_loop.start(&self.host);
    }

    pub fn freeze(&mut self) {
        self.frame_loop.stop();
    }

    pub fn is_running(&self) -> bool {
        self.frame_loop.is_running()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Frames actually simulated.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn tick(&mut self, dt: f32) {
        if !self.frame_loop.is_running() || !(dt > 0.0) {
            return;
        }
        self.clock += dt;
        self.ticks += 1;
        let step = self.speed * dt;
        for particle in &mut self.particles {
            let next = particle.position + particle.heading * step;
            particle.position = Vec2::new(wrap_unit(next.x), wrap_unit(next.y));
        }
    }

    /// Breathing scale of particle `index`, between 1.0 and 1.1.
    pub fn scale_of(&self, index: usize) -> f32 {
        let Some(particle) = self.particles.get(index) else {
            return 1.0;
        };
        let cycle = self.clock / self.pulse_period + particle.phase;
        1.0 + 0.05 * (1.0 - (TAU * cycle).cos())
    }
}

fn wrap_unit(v: f32) -> f32 {
    let wrapped = v.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negatives
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}

impl std::fmt::Debug for ParticleField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticleField")
            .field("count", &self.particles.len())
            .field("running", &self.is_running())
            .field("ticks", &self.ticks)
            .finish()
    }
}
