//! Authoring model for a scroll stage.
//!
//! Everything here is inert data: window bounds, keyframe lists and the
//! content blocks that collaborators hand to the engine. Validation and
//! interpretation live in `stage-core`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StageJson {
    #[serde(default)]
    pub name: Option<String>,
    pub acts: Vec<ActSpec>,
    /// Engine tunables, parsed by the engine. Unknown keys are ignored there.
    #[serde(default)]
    pub config: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ActSpec {
    /// Ordinal. Higher ordinals stack above lower ones.
    pub index: u32,
    #[serde(default)]
    pub name: Option<String>,
    pub window: WindowSpec,
    /// Sub-window (inside `window`) during which the act takes pointer input.
    /// Acts without one stay decorative.
    #[serde(default)]
    pub interactive: Option<WindowSpec>,
    #[serde(default)]
    pub curves: CurvesSpec,
    #[serde(default)]
    pub content: Vec<ContentSpec>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct WindowSpec {
    pub start: f32,
    pub end: f32,
}

impl WindowSpec {
    pub fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct CurvesSpec {
    #[serde(default)]
    pub opacity: Option<Vec<KeyframeSpec>>,
    #[serde(default, rename = "translateY")]
    pub translate_y: Option<Vec<KeyframeSpec>>,
    #[serde(default)]
    pub scale: Option<Vec<KeyframeSpec>>,
    #[serde(default)]
    pub blur: Option<Vec<KeyframeSpec>>,
    #[serde(default)]
    pub hue: Option<Vec<KeyframeSpec>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct KeyframeSpec {
    pub at: f32,
    pub value: f32,
    /// Easing of the segment that starts at this keyframe.
    #[serde(default)]
    pub ease: Option<EaseSpec>,
}

impl KeyframeSpec {
    pub fn new(at: f32, value: f32) -> Self {
        Self {
            at,
            value,
            ease: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum EaseSpec {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    CubicBezier([f32; 4]),
}

/// A nested content block owned by an act.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentSpec {
    Text {
        text: String,
    },
    Image {
        src: String,
        #[serde(default)]
        alt: Option<String>,
    },
    Counter {
        value: u32,
        #[serde(default = "default_counter_duration")]
        duration: f32,
        #[serde(default)]
        prefix: String,
        #[serde(default)]
        suffix: String,
        #[serde(default)]
        label: Option<String>,
    },
    Particles {
        #[serde(default)]
        count: Option<u32>,
        #[serde(default)]
        seed: Option<u64>,
    },
    Magnetic {
        /// Name of the element the field pulls; the host measures it.
        target: String,
        #[serde(default = "default_magnetic_radius")]
        radius: f32,
        strength: f32,
    },
    Link(NavTarget),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NavTarget {
    pub label: String,
    pub href: String,
}

fn default_counter_duration() -> f32 {
    2.0
}

fn default_magnetic_radius() -> f32 {
    200.0
}
