//! # Scroll Progress
//!
//! Turns the scroll position of a tall tracking container into a
//! normalized `Progress` in [0, 1], and shares that value read-only with
//! every act.
//!
//! Degenerate input never fails: a container that is not attached yet,
//! or one no taller than the viewport, yields progress 0.

use crate::lifecycle::{FrameThrottle, Registration, SharedHost, Subscription};
use std::cell::Cell;
use std::rc::Rc;
use tracing::trace;

/// Position along the scroll track. Always finite and within [0, 1].
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Progress(f32);

impl Progress {
    pub const START: Progress = Progress(0.0);
    pub const END: Progress = Progress(1.0);

    /// Clamps `raw` into [0, 1]; NaN maps to 0.
    pub fn new(raw: f32) -> Self {
        if raw.is_nan() {
            Progress::START
        } else {
            Progress(raw.clamp(0.0, 1.0))
        }
    }

    pub fn value(self) -> f32 {
        self.0
    }

    pub fn is_complete(self) -> bool {
        self.0 >= 1.0
    }
}

/// Measured geometry of the tracking container.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackGeometry {
    /// Document offset of the container's top edge.
    pub container_top: f32,
    /// Full scrollable height of the container.
    pub scroll_height: f32,
}

/// `clamp((scroll - top) / max(H - V, 1), 0, 1)`.
///
/// Returns 0 when the container is missing or when `H <= V` (nothing to
/// scroll through).
pub fn compute_progress(
    geometry: Option<TrackGeometry>,
    scroll_offset: f32,
    viewport_height: f32,
) -> Progress {
    let Some(geometry) = geometry else {
        return Progress::START;
    };
    let scrollable = geometry.scroll_height - viewport_height;
    if !(scrollable > 0.0) {
        return Progress::START;
    }
    Progress::new((scroll_offset - geometry.container_top) / scrollable.max(1.0))
}

/// One published progress value and the frame it belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ProgressSnapshot {
    pub progress: Progress,
    pub frame: u64,
}

/// Owner side of the shared progress value. Only the composition root
/// holds one; it publishes once per frame.
#[derive(Debug, Default)]
pub struct ProgressSignal {
    cell: Rc<Cell<ProgressSnapshot>>,
}

impl ProgressSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, progress: Progress) -> ProgressSnapshot {
        let snapshot = ProgressSnapshot {
            progress,
            frame: self.cell.get().frame + 1,
        };
        self.cell.set(snapshot);
        snapshot
    }

    pub fn current(&self) -> ProgressSnapshot {
        self.cell.get()
    }

    pub fn reader(&self) -> ProgressReader {
        ProgressReader {
            cell: self.cell.clone(),
        }
    }
}

/// Read-only view of a `ProgressSignal`.
#[derive(Clone, Debug)]
pub struct ProgressReader {
    cell: Rc<Cell<ProgressSnapshot>>,
}

impl ProgressReader {
    pub fn get(&self) -> ProgressSnapshot {
        self.cell.get()
    }

    pub fn progress(&self) -> Progress {
        self.cell.get().progress
    }
}

/// Scroll and resize input, folded into progress once per frame.
#[derive(Debug)]
pub struct ScrollProgressSource {
    geometry: Option<TrackGeometry>,
    viewport_height: f32,
    scroll_offset: f32,
    scroll: FrameThrottle<f32>,
    resize: FrameThrottle<f32>,
    current: Progress,
    listeners: Vec<Registration>,
}

impl ScrollProgressSource {
    /// A detached source with no host listeners.
    pub fn new(viewport_height: f32) -> Self {
        Self {
            geometry: None,
            viewport_height,
            scroll_offset: 0.0,
            scroll: FrameThrottle::new(),
            resize: FrameThrottle::new(),
            current: Progress::START,
            listeners: Vec::new(),
        }
    }

    /// Subscribes to scroll and resize on `host`; both are released when the
    /// source is dropped.
    pub fn mount(host: &SharedHost, viewport_height: f32) -> Self {
        let mut source = Self::new(viewport_height);
        source.listeners = vec![
            Registration::acquire(host, Subscription::Scroll),
            Registration::acquire(host, Subscription::Resize),
        ];
        source
    }

    pub fn attach(&mut self, geometry: TrackGeometry) {
        self.geometry = Some(geometry);
    }

    pub fn detach(&mut self) {
        self.geometry = None;
    }

    pub fn geometry(&self) -> Option<TrackGeometry> {
        self.geometry
    }

    pub fn viewport_height(&self) -> f32 {
        self.viewport_height
    }

    pub fn on_scroll(&mut self, offset: f32) {
        if offset.is_finite() {
            self.scroll.offer(offset);
        }
    }

    pub fn on_resize(&mut self, viewport_height: f32) {
        if viewport_height.is_finite() && viewport_height > 0.0 {
            self.resize.offer(viewport_height);
        }
    }

    /// Applies the latest pending input and recomputes. Call once per frame.
    pub fn sample(&mut self) -> Progress {
        if let Some(height) = self.resize.take() {
            self.viewport_height = height;
        }
        if let Some(offset) = self.scroll.take() {
            self.scroll_offset = offset;
        }
        self.current = compute_progress(self.geometry, self.scroll_offset, self.viewport_height);
        trace!(progress = self.current.value(), "sampled scroll progress");
        self.current
    }

    pub fn current(&self) -> Progress {
        self.current
    }

    /// Input events dropped by per-frame coalescing.
    pub fn coalesced(&self) -> u64 {
        self.scroll.coalesced() + self.resize.coalesced()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::HeadlessHost;

    fn track(h: f32) -> Option<TrackGeometry> {
        Some(TrackGeometry {
            container_top: 0.0,
            scroll_height: h,
        })
    }

    #[test]
    fn maps_scroll_range_onto_unit_interval() {
        assert_eq!(compute_progress(track(2000.0), 0.0, 800.0), Progress::START);
        assert_eq!(compute_progress(track(2000.0), 1200.0, 800.0), Progress::END);
        assert_eq!(compute_progress(track(2000.0), 600.0, 800.0).value(), 0.5);
    }

    #[test]
    fn clamps_before_and_after_track() {
        assert_eq!(compute_progress(track(2000.0), -50.0, 800.0), Progress::START);
        assert_eq!(compute_progress(track(2000.0), 5000.0, 800.0), Progress::END);
    }

    #[test]
    fn degenerate_track_is_zero() {
        for offset in [0.0, 10.0, 500.0] {
            let p = compute_progress(track(800.0), offset, 800.0);
            assert_eq!(p, Progress::START);
            let p = compute_progress(track(300.0), offset, 800.0);
            assert_eq!(p, Progress::START);
        }
    }

    #[test]
    fn sub_pixel_track_floors_denominator() {
        // H - V = 0.5 is floored to 1
        let p = compute_progress(track(800.5), 0.25, 800.0);
        assert_eq!(p.value(), 0.25);
    }

    #[test]
    fn missing_container_is_zero() {
        assert_eq!(compute_progress(None, 400.0, 800.0), Progress::START);
    }

    #[test]
    fn container_offset_is_subtracted() {
        let geometry = Some(TrackGeometry {
            container_top: 400.0,
            scroll_height: 2000.0,
        });
        assert_eq!(compute_progress(geometry, 400.0, 800.0), Progress::START);
        assert_eq!(compute_progress(geometry, 1000.0, 800.0).value(), 0.5);
    }

    #[test]
    fn progress_constructor_rejects_nan() {
        assert_eq!(Progress::new(f32::NAN), Progress::START);
        assert_eq!(Progress::new(-3.0), Progress::START);
        assert_eq!(Progress::new(7.0), Progress::END);
    }

    #[test]
    fn source_coalesces_scroll_events_per_frame() {
        let mut source = ScrollProgressSource::new(800.0);
        source.attach(TrackGeometry {
            container_top: 0.0,
            scroll_height: 2000.0,
        });
        source.on_scroll(100.0);
        source.on_scroll(300.0);
        source.on_scroll(600.0);
        assert_eq!(source.sample().value(), 0.5);
        assert_eq!(source.coalesced(), 2);
        // No new input: value is stable.
        assert_eq!(source.sample().value(), 0.5);
    }

    #[test]
    fn source_ignores_non_finite_input() {
        let mut source = ScrollProgressSource::new(800.0);
        source.attach(TrackGeometry {
            container_top: 0.0,
            scroll_height: 2000.0,
        });
        source.on_scroll(600.0);
        source.sample();
        source.on_scroll(f32::NAN);
        source.on_resize(0.0);
        assert_eq!(source.sample().value(), 0.5);
    }

    #[test]
    fn resize_changes_scrollable_distance() {
        let mut source = ScrollProgressSource::new(800.0);
        source.attach(TrackGeometry {
            container_top: 0.0,
            scroll_height: 2000.0,
        });
        source.on_scroll(600.0);
        source.on_resize(1400.0);
        assert_eq!(source.sample(), Progress::END);
    }

    #[test]
    fn unattached_source_emits_zero() {
        let mut source = ScrollProgressSource::new(800.0);
        source.on_scroll(900.0);
        assert_eq!(source.sample(), Progress::START);
    }

    #[test]
    fn mounted_source_releases_listeners() {
        let headless = HeadlessHost::new();
        let host: SharedHost = headless.clone();
        let source = ScrollProgressSource::mount(&host, 800.0);
        assert_eq!(headless.live_of(Subscription::Scroll), 1);
        assert_eq!(headless.live_of(Subscription::Resize), 1);
        drop(source);
        assert_eq!(headless.live(), 0);
    }

    #[test]
    fn readers_see_each_publish() {
        let signal = ProgressSignal::new();
        let reader = signal.reader();
        let first = signal.publish(Progress::new(0.25));
        assert_eq!(reader.get(), first);
        assert_eq!(reader.get().frame, 1);
        signal.publish(Progress::new(0.5));
        assert_eq!(reader.progress().value(), 0.5);
        assert_eq!(reader.get().frame, 2);
    }
}
