pub mod act;
pub mod animation;
pub mod composition;
pub mod config;
pub mod counter;
pub mod error;
pub mod lifecycle;
pub mod magnetic;
pub mod particles;
pub mod presets;
pub mod progress;
pub mod timeline;

pub use act::{ActChild, ActController, ActPhase, ActWindow, RenderParams};
pub use composition::{CompositionRoot, PointerTarget};
pub use config::EngineConfig;
pub use counter::{CounterSpec, InView, SpringCounter};
pub use error::{Result, StageError};
pub use lifecycle::{HeadlessHost, Host, Registration, SharedHost, Subscription};
pub use magnetic::{ElementHandle, MagneticField, Rect};
pub use progress::{compute_progress, Progress, ProgressReader, ProgressSignal, ScrollProgressSource};
pub use timeline::{interpolate, Curve, CurveSet, Keyframe, Property};
