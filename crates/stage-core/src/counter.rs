//! # Spring Number Counter
//!
//! One-shot count-up from 0 to a target, fired the first time its element
//! becomes visible. `fired` is explicit entity state: it flips to `true`
//! once and stays there for the life of the counter, so later viewport
//! entries are no-ops.
//!
//! The value is driven in two stages: an eased tween of the goal from 0
//! to `v` over the configured duration, chased by an over-damped spring.
//! The rendered integer is `floor(value)`, clamped to `v`, and snaps to `v`
//! once the spring settles.

use crate::animation::{EasingType, Spring, SpringConfig};
use crate::config::CounterTuning;
use crate::error::{Result, StageError};
use crate::lifecycle::{FrameLoop, SharedHost};
use crate::magnetic::Rect;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, warn};

/// Extra seconds past the tween before the counter is forced to land.
const SETTLE_TIMEOUT: f32 = 10.0;

/// Viewport intersection test with a CSS-style root margin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InView {
    /// Grows (positive) or shrinks (negative) each viewport edge.
    pub margin: f32,
}

impl InView {
    pub fn new(margin: f32) -> Self {
        Self { margin }
    }

    pub fn check(&self, rect: Rect, viewport_height: f32) -> bool {
        let top = -self.margin;
        let bottom = viewport_height + self.margin;
        if bottom <= top {
            return false;
        }
        rect.bottom() > top && rect.top() < bottom
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CounterSpec {
    pub target: u32,
    /// Seconds.
    pub duration: f32,
    pub prefix: String,
    pub suffix: String,
    /// Caption rendered under the number.
    pub label: Option<String>,
}

impl CounterSpec {
    pub fn new(target: u32, duration: f32) -> Self {
        Self {
            target,
            duration,
            prefix: String::new(),
            suffix: String::new(),
            label: None,
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    fn format(&self, value: u32) -> String {
        format!("{}{}{}", self.prefix, value, self.suffix)
    }
}

#[derive(Debug, Default)]
struct DisplayState {
    text: String,
    writes: u64,
}

/// Text slot shared between a counter and the host that renders it.
#[derive(Clone, Debug, Default)]
pub struct DisplaySlot {
    inner: Rc<RefCell<DisplayState>>,
}

impl DisplaySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        self.inner.borrow().text.clone()
    }

    /// Number of text mutations since the slot was created.
    pub fn writes(&self) -> u64 {
        self.inner.borrow().writes
    }

    fn initialize(&self, text: String) {
        self.inner.borrow_mut().text = text;
    }

    /// Writes `text` if it differs from what is displayed.
    fn write(&self, text: String) -> bool {
        let mut state = self.inner.borrow_mut();
        if state.text == text {
            return false;
        }
        state.text = text;
        state.writes += 1;
        true
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CounterState {
    Idle,
    Running { elapsed: f32 },
    Settled,
}

pub struct SpringCounter {
    spec: CounterSpec,
    ease: EasingType,
    spring: Spring,
    settle_epsilon: f32,
    spring_only: bool,
    fired: bool,
    state: CounterState,
    /// Highest integer rendered so far; the display never counts back.
    shown: u32,
    display: DisplaySlot,
    frame_loop: FrameLoop,
    host: SharedHost,
}

impl SpringCounter {
    pub fn mount(host: &SharedHost, spec: CounterSpec, tuning: &CounterTuning) -> Result<Self> {
        if !(spec.duration.is_finite() && spec.duration > 0.0) {
            return Err(StageError::InvalidCounterDuration {
                duration: spec.duration,
            });
        }
        let [x1, y1, x2, y2] = tuning.ease;
        let config = SpringConfig {
            stiffness: tuning.stiffness,
            damping: tuning.damping,
            mass: tuning.mass,
        };
        if !config.is_overdamped() {
            warn!(
                stiffness = config.stiffness,
                damping = config.damping,
                "counter spring is under-damped and may overshoot"
            );
        }
        let display = DisplaySlot::new();
        display.initialize(spec.format(0));
        Ok(Self {
            ease: EasingType::cubic_bezier(x1, y1, x2, y2),
            spring: Spring::new(config, 0.0),
            settle_epsilon: tuning.settle_epsilon,
            spring_only: tuning.spring_only,
            fired: false,
            state: CounterState::Idle,
            shown: 0,
            display,
            frame_loop: FrameLoop::new(),
            host: host.clone(),
            spec,
        })
    }

    pub fn spec(&self) -> &CounterSpec {
        &self.spec
    }

    pub fn fired(&self) -> bool {
        self.fired
    }

    pub fn state(&self) -> CounterState {
        self.state
    }

    pub fn display(&self) -> &DisplaySlot {
        &self.display
    }

    pub fn text(&self) -> String {
        self.display.text()
    }

    /// True while the frame loop is registered.
    pub fn is_animating(&self) -> bool {
        self.frame_loop.is_running()
    }

    /// Feeds the element's visibility. The first `true` fires the counter;
    /// everything after that is ignored. Returns whether this call fired.
    pub fn observe_visibility(&mut self, visible: bool) -> bool {
        if !visible || self.fired {
            return false;
        }
        self.fired = true;
        self.state = CounterState::Running { elapsed: 0.0 };
        self.frame_loop.start(&self.host);
        debug!(target_value = self.spec.target, "counter fired");
        true
    }

    /// Stops ticking without losing progress.
    pub fn pause(&mut self) {
        self.frame_loop.stop();
    }

    pub fn resume(&mut self) {
        if matches!(self.state, CounterState::Running { .. }) {
            self.frame_loop.start(&self.host);
        }
    }

    /// Advances one frame. Does nothing unless running.
    pub fn tick(&mut self, dt: f32) {
        let CounterState::Running { elapsed } = self.state else {
            return;
        };
        if !self.frame_loop.is_running() {
            return;
        }
        let elapsed = elapsed + dt.max(0.0);
        let target = self.spec.target as f32;

        let tween_t = (elapsed / self.spec.duration).min(1.0);
        let goal = if self.spring_only {
            target
        } else {
            target * self.ease.eval(tween_t)
        };
        self.spring.step(goal, dt);

        let tween_done = self.spring_only || tween_t >= 1.0;
        let timed_out = elapsed >= self.spec.duration + SETTLE_TIMEOUT;
        let settled =
            (tween_done && self.spring.is_settled(target, self.settle_epsilon)) || timed_out;
        if settled {
            self.spring.snap_to(target);
            self.state = CounterState::Settled;
            self.frame_loop.stop();
            debug!(target_value = self.spec.target, elapsed, "counter settled");
        } else {
            self.state = CounterState::Running { elapsed };
        }

        // f32 cannot hold every u32: land on the exact target, and bound
        // in-flight values in integer space.
        let value = if settled {
            self.spec.target
        } else {
            (self.spring.position.max(0.0).floor() as u32).min(self.spec.target)
        };
        self.shown = self.shown.max(value);
        self.display.write(self.spec.format(self.shown));
    }
}

impl std::fmt::Debug for SpringCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpringCounter")
            .field("target", &self.spec.target)
            .field("fired", &self.fired)
            .field("state", &self.state)
            .field("text", &self.display.text())
            .finish()
    }
}
