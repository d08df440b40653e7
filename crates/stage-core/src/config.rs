//! Engine tunables.
//!
//! Every field has a default, so an empty JSON object is a valid
//! configuration. Authoring files can embed a partial `config` block.

use crate::error::{Result, StageError};
use crate::particles::MAX_PARTICLES;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Scroll distance per act, in viewport heights.
    pub scroll_factor: f32,
    pub viewport_height: f32,
    pub frame_rate: f32,
    /// Added to each viewport edge for in-view checks. Negative values
    /// shrink the viewport, so elements must travel further in.
    pub in_view_margin: f32,
    /// Opacity below which a rendered act counts as invisible.
    pub opacity_epsilon: f32,
    pub counter: CounterTuning,
    pub particles: ParticleTuning,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scroll_factor: 1.0,
            viewport_height: 800.0,
            frame_rate: 60.0,
            in_view_margin: -100.0,
            opacity_epsilon: 0.01,
            counter: CounterTuning::default(),
            particles: ParticleTuning::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterTuning {
    pub stiffness: f32,
    pub damping: f32,
    pub mass: f32,
    /// Control points of the target tween, `[x1, y1, x2, y2]`.
    pub ease: [f32; 4],
    pub settle_epsilon: f32,
    /// Skip the target tween and let the spring chase `v` directly.
    pub spring_only: bool,
}

impl Default for CounterTuning {
    fn default() -> Self {
        Self {
            stiffness: 100.0,
            damping: 30.0,
            mass: 1.0,
            ease: [0.16, 1.0, 0.3, 1.0],
            settle_epsilon: 0.5,
            spring_only: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleTuning {
    pub count: u32,
    /// Drift speed in viewport fractions per second.
    pub speed: f32,
    /// Seconds per pulse cycle.
    pub pulse_period: f32,
    pub seed: u64,
}

impl Default for ParticleTuning {
    fn default() -> Self {
        Self {
            count: 6,
            speed: 0.02,
            pulse_period: 8.0,
            seed: 0x5eed,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| StageError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        let config: Self = serde_json::from_value(value.clone())
            .map_err(|e| StageError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("scroll_factor", self.scroll_factor),
            ("viewport_height", self.viewport_height),
            ("frame_rate", self.frame_rate),
            ("counter.stiffness", self.counter.stiffness),
            ("counter.mass", self.counter.mass),
            ("counter.settle_epsilon", self.counter.settle_epsilon),
            ("particles.pulse_period", self.particles.pulse_period),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(StageError::Config(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if self.particles.count > MAX_PARTICLES {
            return Err(StageError::Config(format!(
                "particles.count must be at most {MAX_PARTICLES}, got {}",
                self.particles.count
            )));
        }
        if !(self.counter.damping.is_finite() && self.counter.damping >= 0.0) {
            return Err(StageError::Config(format!(
                "counter.damping must be non-negative, got {}",
                self.counter.damping
            )));
        }
        Ok(())
    }

    /// Seconds per frame at the configured rate.
    pub fn frame_dt(&self) -> f32 {
        1.0 / self.frame_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn partial_nested_block_keeps_other_defaults() {
        let config =
            EngineConfig::from_json_str(r#"{ "scroll_factor": 1.5, "counter": { "damping": 40 } }"#)
                .unwrap();
        assert_eq!(config.scroll_factor, 1.5);
        assert_eq!(config.counter.damping, 40.0);
        assert_eq!(config.counter.stiffness, 100.0);
        assert_eq!(config.particles.count, 6);
    }

    #[test]
    fn rejects_non_positive_scroll_factor() {
        let err = EngineConfig::from_json_str(r#"{ "scroll_factor": 0 }"#).unwrap_err();
        assert!(matches!(err, StageError::Config(msg) if msg.contains("scroll_factor")));
    }

    #[test]
    fn rejects_oversized_default_particle_count() {
        let err = EngineConfig::from_json_str(r#"{ "particles": { "count": 4000000000 } }"#)
            .unwrap_err();
        assert!(matches!(err, StageError::Config(msg) if msg.contains("particles.count")));
    }
}
