//! # Act Controller
//!
//! Binds curve outputs to one full-viewport layer.
//!
//! ## Responsibilities
//! - **Phase**: `Inactive`, `Entering`, `Active`, `Exiting`, recomputed from
//!   the shared progress every frame. Only nested counters remember
//!   anything across frames (their `fired` flag).
//! - **Render parameters**: opacity, translateY, scale, blur and hue,
//!   sampled from the act's curves; forced transparent and non-interactive
//!   while inactive.
//! - **Children**: counters, particle fields and magnetic fields. An inactive
//!   act releases their frame loops and pointer listeners, so it costs
//!   nothing per frame.

use crate::config::EngineConfig;
use crate::counter::{CounterSpec, SpringCounter};
use crate::error::{Result, StageError};
use crate::lifecycle::SharedHost;
use crate::magnetic::{ElementHandle, MagneticField};
use crate::particles::ParticleField;
use crate::progress::ProgressReader;
use crate::timeline::{CurveSet, Property};
use glam::Vec2;
use stage_data::model::{ActSpec, ContentSpec, NavTarget, WindowSpec};
use std::collections::HashMap;
use tracing::{debug, trace};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActPhase {
    Inactive,
    Entering,
    Active,
    Exiting,
}

/// Progress range `[start, end]` inside [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActWindow {
    pub start: f32,
    pub end: f32,
}

impl ActWindow {
    pub fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, p: f32) -> bool {
        self.start <= p && p <= self.end
    }

    fn is_valid(&self) -> bool {
        self.start.is_finite()
            && self.end.is_finite()
            && 0.0 <= self.start
            && self.start <= self.end
            && self.end <= 1.0
    }
}

impl From<WindowSpec> for ActWindow {
    fn from(spec: WindowSpec) -> Self {
        Self::new(spec.start, spec.end)
    }
}

/// Per-frame output of an act.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderParams {
    pub phase: ActPhase,
    pub opacity: f32,
    pub translate_y: f32,
    pub scale: f32,
    pub blur: f32,
    pub hue: Option<f32>,
    pub z_index: i32,
    pub pointer_events: bool,
}

impl RenderParams {
    fn hidden(z_index: i32) -> Self {
        Self {
            phase: ActPhase::Inactive,
            opacity: 0.0,
            translate_y: Property::TranslateY.identity(),
            scale: Property::Scale.identity(),
            blur: Property::Blur.identity(),
            hue: None,
            z_index,
            pointer_events: false,
        }
    }
}

/// Nested content owned by an act.
#[derive(Debug)]
pub enum ActChild {
    Text(String),
    Image { src: String, alt: Option<String> },
    Counter(SpringCounter),
    Particles(ParticleField),
    Magnetic { target: String, field: MagneticField },
    Link(NavTarget),
}

pub struct ActController {
    index: u32,
    name: Option<String>,
    window: ActWindow,
    interactive: Option<ActWindow>,
    curves: CurveSet,
    children: Vec<ActChild>,
    elements: HashMap<String, ElementHandle>,
    progress: ProgressReader,
    host: SharedHost,
    config: EngineConfig,
    render: RenderParams,
    last_frame: u64,
}

/// Stacking order of act `index`.
pub fn z_index_for(index: u32) -> i32 {
    10 + 10 * index as i32
}

impl ActController {
    pub fn new(
        index: u32,
        window: ActWindow,
        curves: CurveSet,
        progress: ProgressReader,
        host: &SharedHost,
        config: &EngineConfig,
    ) -> Result<Self> {
        if !window.is_valid() {
            return Err(StageError::InvalidWindow {
                act: index,
                start: window.start,
                end: window.end,
            });
        }
        Ok(Self {
            index,
            name: None,
            window,
            interactive: None,
            curves,
            children: Vec::new(),
            elements: HashMap::new(),
            progress,
            host: host.clone(),
            config: config.clone(),
            render: RenderParams::hidden(z_index_for(index)),
            last_frame: 0,
        })
    }

    pub fn from_spec(
        spec: &ActSpec,
        progress: ProgressReader,
        host: &SharedHost,
        config: &EngineConfig,
    ) -> Result<Self> {
        let curves = CurveSet::from_spec(&spec.curves)?;
        let mut act = Self::new(spec.index, spec.window.into(), curves, progress, host, config)?;
        act.name = spec.name.clone();
        if let Some(interactive) = spec.interactive {
            act = act.with_interactive(interactive.into())?;
        }
        for content in &spec.content {
            act.push_content(content)?;
        }
        Ok(act)
    }

    /// Enables pointer input while progress is inside `window` and the act
    /// is fully visible.
    pub fn with_interactive(mut self, window: ActWindow) -> Result<Self> {
        let inside = window.is_valid()
            && self.window.contains(window.start)
            && self.window.contains(window.end);
        if !inside {
            return Err(StageError::InvalidInteractiveWindow {
                act: self.index,
                start: window.start,
                end: window.end,
            });
        }
        self.interactive = Some(window);
        Ok(self)
    }

    pub fn push_content(&mut self, content: &ContentSpec) -> Result<()> {
        let child = match content {
            ContentSpec::Text { text } => ActChild::Text(text.clone()),
            ContentSpec::Image { src, alt } => ActChild::Image {
                src: src.clone(),
                alt: alt.clone(),
            },
            ContentSpec::Counter {
                value,
                duration,
                prefix,
                suffix,
                label,
            } => {
                let mut spec = CounterSpec::new(*value, *duration)
                    .with_prefix(prefix.clone())
                    .with_suffix(suffix.clone());
                if let Some(label) = label {
                    spec = spec.with_label(label.clone());
                }
                ActChild::Counter(SpringCounter::mount(&self.host, spec, &self.config.counter)?)
            }
            ContentSpec::Particles { count, seed } => ActChild::Particles(ParticleField::mount(
                &self.host,
                &self.config.particles,
                *count,
                *seed,
            )?),
            ContentSpec::Magnetic {
                target,
                radius,
                strength,
            } => {
                if target.trim().is_empty() {
                    return Err(StageError::EmptyMagneticTarget { act: self.index });
                }
                let element = self.elements.entry(target.clone()).or_default().clone();
                ActChild::Magnetic {
                    target: target.clone(),
                    field: MagneticField::new(element, *radius, *strength)?,
                }
            }
            ContentSpec::Link(nav) => ActChild::Link(nav.clone()),
        };
        self.children.push(child);
        Ok(())
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn window(&self) -> ActWindow {
        self.window
    }

    pub fn interactive(&self) -> Option<ActWindow> {
        self.interactive
    }

    pub fn curves(&self) -> &CurveSet {
        &self.curves
    }

    pub fn phase(&self) -> ActPhase {
        self.render.phase
    }

    pub fn render(&self) -> RenderParams {
        self.render
    }

    pub fn children(&self) -> &[ActChild] {
        &self.children
    }

    /// Frame number of the progress value this act last rendered.
    pub fn last_frame(&self) -> u64 {
        self.last_frame
    }

    /// Measurement slot for a named element (magnetic targets).
    pub fn element(&self, name: &str) -> Option<ElementHandle> {
        self.elements.get(name).cloned()
    }

    pub fn counters(&self) -> impl Iterator<Item = &SpringCounter> {
        self.children.iter().filter_map(|c| match c {
            ActChild::Counter(counter) => Some(counter),
            _ => None,
        })
    }

    pub fn magnetic(&self, target: &str) -> Option<&MagneticField> {
        self.children.iter().find_map(|c| match c {
            ActChild::Magnetic { target: t, field } if t == target => Some(field),
            _ => None,
        })
    }

    pub fn particle_fields(&self) -> impl Iterator<Item = &ParticleField> {
        self.children.iter().filter_map(|c| match c {
            ActChild::Particles(field) => Some(field),
            _ => None,
        })
    }

    pub fn links(&self) -> Vec<&NavTarget> {
        self.children
            .iter()
            .filter_map(|c| match c {
                ActChild::Link(nav) => Some(nav),
                _ => None,
            })
            .collect()
    }

    /// Phase at progress `p`, independent of any previous frame.
    pub fn classify(&self, p: f32) -> ActPhase {
        if !self.window.contains(p) {
            return ActPhase::Inactive;
        }
        let epsilon = self.config.opacity_epsilon;
        let opacity = self.curves.sample(Property::Opacity, p);
        if opacity >= 1.0 - epsilon {
            return ActPhase::Active;
        }
        let slope = self
            .curves
            .get(Property::Opacity)
            .map(|c| c.slope_at(p))
            .unwrap_or(0.0);
        if slope > 0.0 {
            ActPhase::Entering
        } else if slope < 0.0 {
            ActPhase::Exiting
        } else if opacity > epsilon {
            ActPhase::Active
        } else {
            ActPhase::Inactive
        }
    }

    /// Recomputes render parameters from the shared progress and runs the
    /// children's frame work. `dt` is the frame duration in seconds.
    pub fn update(&mut self, dt: f32) -> RenderParams {
        let snapshot = self.progress.get();
        self.last_frame = snapshot.frame;
        let p = snapshot.progress.value();

        let previous = self.render.phase;
        let phase = self.classify(p);
        if phase != previous {
            debug!(act = self.index, ?previous, ?phase, p, "act phase changed");
            if phase == ActPhase::Inactive {
                self.suspend_children();
            } else if previous == ActPhase::Inactive {
                self.resume_children();
            }
        }

        self.render = if phase == ActPhase::Inactive {
            RenderParams::hidden(z_index_for(self.index))
        } else {
            RenderParams {
                phase,
                opacity: self.curves.sample(Property::Opacity, p).clamp(0.0, 1.0),
                translate_y: self.curves.sample(Property::TranslateY, p),
                scale: self.curves.sample(Property::Scale, p),
                blur: self.curves.sample(Property::Blur, p).max(0.0),
                hue: self.curves.get(Property::Hue).map(|c| c.sample(p)),
                z_index: z_index_for(self.index),
                pointer_events: phase == ActPhase::Active
                    && self.interactive.is_some_and(|w| w.contains(p)),
            }
        };

        if phase != ActPhase::Inactive {
            self.tick_children(dt);
        }
        trace!(act = self.index, p, opacity = self.render.opacity, "act updated");
        self.render
    }

    /// Queues a pointer position for the act's magnetic fields. Ignored
    /// while the published progress puts the act outside its window.
    pub fn on_pointer_move(&mut self, pointer: Vec2) {
        if self.classify(self.progress.progress().value()) == ActPhase::Inactive {
            return;
        }
        for child in &mut self.children {
            if let ActChild::Magnetic { field, .. } = child {
                field.on_pointer_move(pointer);
            }
        }
    }

    pub fn on_pointer_leave(&mut self) {
        for child in &mut self.children {
            if let ActChild::Magnetic { field, .. } = child {
                field.on_pointer_leave();
                field.reset();
            }
        }
    }

    fn tick_children(&mut self, dt: f32) {
        let visible = self.render.opacity > self.config.opacity_epsilon;
        for child in &mut self.children {
            match child {
                ActChild::Counter(counter) => {
                    counter.observe_visibility(visible);
                    counter.tick(dt);
                }
                ActChild::Particles(field) => field.tick(dt),
                ActChild::Magnetic { field, .. } => {
                    field.tick();
                }
                ActChild::Text(_) | ActChild::Image { .. } | ActChild::Link(_) => {}
            }
        }
    }

    fn suspend_children(&mut self) {
        for child in &mut self.children {
            match child {
                ActChild::Counter(counter) => counter.pause(),
                ActChild::Particles(field) => field.freeze(),
                ActChild::Magnetic { field, .. } => field.suspend(),
                ActChild::Text(_) | ActChild::Image { .. } | ActChild::Link(_) => {}
            }
        }
    }

    fn resume_children(&mut self) {
        for child in &mut self.children {
            match child {
                ActChild::Counter(counter) => counter.resume(),
                ActChild::Particles(field) => field.start(),
                ActChild::Magnetic { field, .. } => field.resume(&self.host),
                ActChild::Text(_) | ActChild::Image { .. } | ActChild::Link(_) => {}
            }
        }
    }
}

impl std::fmt::Debug for ActController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActController")
            .field("index", &self.index)
            .field("window", &self.window)
            .field("render", &self.render)
            .field("children", &self.children.len())
            .finish()
    }
}
