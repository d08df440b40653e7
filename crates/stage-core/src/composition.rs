//! # Composition Root
//!
//! Mounts every act of a stage over one shared progress value and drives
//! them frame by frame.
//!
//! ## Responsibilities
//! - **Layout**: acts are stacked in ordinal order (z-index `10 + 10 * n`)
//!   over a track `acts * viewport * scroll_factor` tall.
//! - **Frame ordering**: progress is sampled and published once per frame,
//!   before any act reads it, so no act sees a stale value.
//! - **Input**: scroll, resize and pointer events are coalesced to one
//!   update per frame. Pointer input only reaches acts inside their window.
//! - **Terminal state**: once progress reaches 1 the final act's links are
//!   the page's navigation surface.

use crate::act::{ActController, ActPhase};
use crate::config::EngineConfig;
use crate::error::{Result, StageError};
use crate::lifecycle::{FrameLoop, FrameThrottle, Registration, SharedHost, Subscription};
use crate::magnetic::ElementHandle;
use crate::progress::{Progress, ProgressSignal, ScrollProgressSource, TrackGeometry};
use glam::Vec2;
use stage_data::model::{NavTarget, StageJson};
use tracing::{debug, info, trace, warn};

/// Where a pointer event lands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerTarget {
    /// The act with this ordinal takes the event.
    Act(u32),
    /// Passes through every act to the page underneath.
    Page,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum PointerInput {
    Move(Vec2),
    Leave,
}

pub struct CompositionRoot {
    name: Option<String>,
    config: EngineConfig,
    acts: Vec<ActController>,
    signal: ProgressSignal,
    source: ScrollProgressSource,
    pointer: FrameThrottle<PointerInput>,
    pointer_listeners: Vec<Registration>,
    frame_loop: FrameLoop,
}

impl CompositionRoot {
    /// Mounts `stage` with the config embedded in it (defaults otherwise).
    pub fn mount_stage(host: &SharedHost, stage: &StageJson) -> Result<Self> {
        let config = match &stage.config {
            Some(value) => EngineConfig::from_value(value)?,
            None => EngineConfig::default(),
        };
        Self::mount(host, stage, config)
    }

    pub fn mount(host: &SharedHost, stage: &StageJson, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        if stage.acts.is_empty() {
            return Err(StageError::NoActs);
        }

        let mut specs: Vec<_> = stage.acts.iter().collect();
        specs.sort_by_key(|spec| spec.index);
        if let Some(pair) = specs.windows(2).find(|w| w[0].index == w[1].index) {
            return Err(StageError::DuplicateAct { act: pair[1].index });
        }

        let signal = ProgressSignal::new();
        let acts = specs
            .into_iter()
            .map(|spec| ActController::from_spec(spec, signal.reader(), host, &config))
            .collect::<Result<Vec<_>>>()?;

        let last = acts.len() - 1;
        for act in &acts[..last] {
            if !act.links().is_empty() {
                warn!(
                    act = act.index(),
                    "links on a non-final act are never exposed as navigation"
                );
            }
        }

        let source = ScrollProgressSource::mount(host, config.viewport_height);
        let pointer_listeners = vec![
            Registration::acquire(host, Subscription::PointerMove),
            Registration::acquire(host, Subscription::PointerLeave),
        ];
        let mut frame_loop = FrameLoop::new();
        frame_loop.start(host);

        info!(
            stage = stage.name.as_deref().unwrap_or("untitled"),
            acts = acts.len(),
            "mounted composition"
        );
        Ok(Self {
            name: stage.name.clone(),
            config,
            acts,
            signal,
            source,
            pointer: FrameThrottle::new(),
            pointer_listeners,
            frame_loop,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Acts in stacking order, bottom first.
    pub fn acts(&self) -> &[ActController] {
        &self.acts
    }

    pub fn act(&self, index: u32) -> Option<&ActController> {
        self.acts.iter().find(|act| act.index() == index)
    }

    /// Height of the outer tracking element.
    pub fn track_height(&self) -> f32 {
        self.acts.len() as f32 * self.source.viewport_height() * self.config.scroll_factor
    }

    /// Records where the host placed the tracking element. Its height is
    /// always `track_height()`.
    pub fn attach_track(&mut self, container_top: f32) {
        let geometry = TrackGeometry {
            container_top,
            scroll_height: self.track_height(),
        };
        debug!(container_top, scroll_height = geometry.scroll_height, "attached track");
        self.source.attach(geometry);
    }

    pub fn detach_track(&mut self) {
        self.source.detach();
    }

    pub fn source(&self) -> &ScrollProgressSource {
        &self.source
    }

    pub fn on_scroll(&mut self, offset: f32) {
        self.source.on_scroll(offset);
    }

    pub fn on_resize(&mut self, viewport_height: f32) {
        self.source.on_resize(viewport_height);
    }

    pub fn on_pointer_move(&mut self, pointer: Vec2) {
        if pointer.is_finite() {
            self.pointer.offer(PointerInput::Move(pointer));
        }
    }

    pub fn on_pointer_leave(&mut self) {
        self.pointer.offer(PointerInput::Leave);
    }

    /// Progress published for the current frame.
    pub fn progress(&self) -> Progress {
        self.signal.current().progress
    }

    /// Number of frames published so far.
    pub fn frame_count(&self) -> u64 {
        self.signal.current().frame
    }

    pub fn is_running(&self) -> bool {
        self.frame_loop.is_running()
    }

    /// Runs one frame: samples progress once, publishes it, routes pending
    /// pointer input and updates every act in stacking order.
    pub fn frame(&mut self, dt: f32) -> Progress {
        let viewport = self.source.viewport_height();
        let mut progress = self.source.sample();
        if self.source.viewport_height() != viewport {
            // The track is sized in viewports; re-measure before publishing.
            if let Some(geometry) = self.source.geometry() {
                self.attach_track(geometry.container_top);
                progress = self.source.sample();
            }
        }
        let snapshot = self.signal.publish(progress);

        match self.pointer.take() {
            Some(PointerInput::Move(pointer)) => {
                for act in &mut self.acts {
                    act.on_pointer_move(pointer);
                }
            }
            Some(PointerInput::Leave) => {
                for act in &mut self.acts {
                    act.on_pointer_leave();
                }
            }
            None => {}
        }

        for act in &mut self.acts {
            act.update(dt);
        }
        trace!(frame = snapshot.frame, progress = progress.value(), "composition frame");
        progress
    }

    /// Topmost act accepting pointer input, or the page.
    pub fn pointer_target(&self) -> PointerTarget {
        self.acts
            .iter()
            .rev()
            .find(|act| act.render().pointer_events)
            .map(|act| PointerTarget::Act(act.index()))
            .unwrap_or(PointerTarget::Page)
    }

    /// The final act's links, once the track is fully scrolled and that act
    /// takes pointer input.
    pub fn navigation_surface(&self) -> Option<Vec<&NavTarget>> {
        let last = self.acts.last()?;
        let terminal = self.progress().is_complete()
            && last.phase() == ActPhase::Active
            && last.render().pointer_events;
        terminal.then(|| last.links())
    }

    /// Measurement slot for element `name` in act `act`.
    pub fn element_handle(&self, act: u32, name: &str) -> Option<ElementHandle> {
        self.act(act)?.element(name)
    }
}

impl Drop for CompositionRoot {
    fn drop(&mut self) {
        info!(
            stage = self.name.as_deref().unwrap_or("untitled"),
            frames = self.signal.current().frame,
            "unmounting composition"
        );
        self.pointer_listeners.clear();
        self.frame_loop.stop();
    }
}

impl std::fmt::Debug for CompositionRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositionRoot")
            .field("name", &self.name)
            .field("acts", &self.acts.len())
            .field("progress", &self.progress())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::HeadlessHost;
    use serde_json::json;

    fn two_acts() -> StageJson {
        serde_json::from_value(json!({
            "acts": [
                {
                    "index": 2,
                    "window": { "start": 0.4, "end": 1.0 },
                    "interactive": { "start": 0.8, "end": 1.0 },
                    "curves": { "opacity": [ { "at": 0.4, "value": 0.0 }, { "at": 0.8, "value": 1.0 } ] },
                    "content": [ { "kind": "link", "label": "About", "href": "/about" } ]
                },
                {
                    "index": 1,
                    "window": { "start": 0.0, "end": 0.5 },
                    "curves": { "opacity": [ { "at": 0.0, "value": 1.0 }, { "at": 0.5, "value": 0.0 } ] }
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn sorts_acts_and_stacks_them() {
        let host: SharedHost = HeadlessHost::new();
        let mut root = CompositionRoot::mount(&host, &two_acts(), EngineConfig::default()).unwrap();
        root.frame(1.0 / 60.0);
        let order: Vec<_> = root.acts().iter().map(|a| a.index()).collect();
        assert_eq!(order, vec![1, 2]);
        assert!(root.acts()[0].render().z_index < root.acts()[1].render().z_index);
        assert_eq!(root.track_height(), 1600.0);
    }

    #[test]
    fn rejects_empty_and_duplicate_stages() {
        let host: SharedHost = HeadlessHost::new();
        let empty = StageJson {
            name: None,
            acts: Vec::new(),
            config: None,
        };
        assert_eq!(
            CompositionRoot::mount(&host, &empty, EngineConfig::default()).unwrap_err(),
            StageError::NoActs
        );

        let mut stage = two_acts();
        stage.acts[0].index = 1;
        assert_eq!(
            CompositionRoot::mount(&host, &stage, EngineConfig::default()).unwrap_err(),
            StageError::DuplicateAct { act: 1 }
        );
    }

    #[test]
    fn failed_mount_leaves_nothing_registered() {
        let headless = HeadlessHost::new();
        let host: SharedHost = headless.clone();
        let mut stage = two_acts();
        stage.acts[1].window.end = 1.5;
        assert!(CompositionRoot::mount(&host, &stage, EngineConfig::default()).is_err());
        assert_eq!(headless.live(), 0);
    }

    #[test]
    fn embedded_config_is_applied() {
        let host: SharedHost = HeadlessHost::new();
        let mut stage = two_acts();
        stage.config = Some(json!({ "viewport_height": 1000.0, "scroll_factor": 1.5 }));
        let root = CompositionRoot::mount_stage(&host, &stage).unwrap();
        assert_eq!(root.track_height(), 3000.0);
    }

    #[test]
    fn resize_remeasures_track() {
        let host: SharedHost = HeadlessHost::new();
        let mut root = CompositionRoot::mount(&host, &two_acts(), EngineConfig::default()).unwrap();
        root.attach_track(0.0);
        root.on_scroll(400.0);
        assert_eq!(root.frame(0.016).value(), 0.5);

        root.on_resize(400.0);
        root.frame(0.016);
        assert_eq!(root.track_height(), 800.0);
        assert_eq!(root.progress().value(), 1.0);
    }

    #[test]
    fn terminal_navigation_only_at_full_progress() {
        let host: SharedHost = HeadlessHost::new();
        let mut root = CompositionRoot::mount(&host, &two_acts(), EngineConfig::default()).unwrap();
        root.attach_track(0.0);

        root.on_scroll(600.0);
        root.frame(0.016);
        assert!(root.navigation_surface().is_none());

        root.on_scroll(800.0);
        root.frame(0.016);
        let links = root.navigation_surface().unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].href, "/about");
        assert_eq!(root.pointer_target(), PointerTarget::Act(2));
    }
}
