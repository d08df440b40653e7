//! Setup-time failures.
//!
//! Only authoring data and construction parameters can be rejected. Once a
//! stage is mounted, every per-frame path is infallible.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StageError>;

#[derive(Debug, Error, PartialEq)]
pub enum StageError {
    #[error("curve `{curve}` has no keyframes")]
    EmptyCurve { curve: String },

    #[error("curve `{curve}`: keyframe {index} is at {at}, expected a finite position in [0, 1]")]
    KeyframeOutOfRange { curve: String, index: usize, at: f32 },

    #[error("curve `{curve}`: keyframe {index} at {at} does not come after {previous}")]
    KeyframeOrder {
        curve: String,
        index: usize,
        at: f32,
        previous: f32,
    },

    #[error("curve `{curve}`: keyframe {index} has a non-finite value")]
    NonFiniteValue { curve: String, index: usize },

    #[error("act {act}: window ({start}, {end}) must satisfy 0 <= start <= end <= 1")]
    InvalidWindow { act: u32, start: f32, end: f32 },

    #[error("act {act}: interactive window ({start}, {end}) lies outside the act window")]
    InvalidInteractiveWindow { act: u32, start: f32, end: f32 },

    #[error("act {act} appears more than once")]
    DuplicateAct { act: u32 },

    #[error("a stage needs at least one act")]
    NoActs,

    #[error("magnetic field needs radius > 0 and strength > 0 (got radius {radius}, strength {strength})")]
    InvalidMagneticField { radius: f32, strength: f32 },

    #[error("act {act}: magnetic field has no target element name")]
    EmptyMagneticTarget { act: u32 },

    #[error("particle field asks for {count} particles, at most {max} are allowed")]
    TooManyParticles { count: u32, max: u32 },

    #[error("counter duration must be positive (got {duration})")]
    InvalidCounterDuration { duration: f32 },

    #[error("invalid engine configuration: {0}")]
    Config(String),
}
