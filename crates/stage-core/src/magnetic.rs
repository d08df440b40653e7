//! # Magnetic Cursor Field
//!
//! Elastic pointer attraction for one focal element. The pull is
//! `normalize(center - pointer) * S * (1 - d / R)` inside the radius and
//! zero at or beyond it, so it fades out continuously at the boundary.

use crate::error::{Result, StageError};
use crate::lifecycle::{FrameThrottle, Registration, SharedHost, Subscription};
use glam::Vec2;
use std::cell::Cell;
use std::rc::Rc;
use tracing::trace;

/// Axis-aligned box in viewport coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Measurement slot for a host element. The host writes the current
/// bounding box (after layout or resize); engine code reads it on demand
/// and never caches it. Empty while the element is not attached.
#[derive(Clone, Debug, Default)]
pub struct ElementHandle {
    bounds: Rc<Cell<Option<Rect>>>,
}

impl ElementHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attached(rect: Rect) -> Self {
        let handle = Self::new();
        handle.set(rect);
        handle
    }

    pub fn set(&self, rect: Rect) {
        self.bounds.set(Some(rect));
    }

    pub fn clear(&self) {
        self.bounds.set(None);
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.bounds.get()
    }
}

/// Pure pull computation. `fallback` is the unit direction used when the
/// pointer sits exactly on the center.
pub fn magnetic_pull(center: Vec2, pointer: Vec2, radius: f32, strength: f32, fallback: Vec2) -> Vec2 {
    let delta = center - pointer;
    let distance = delta.length();
    if !(distance < radius) {
        return Vec2::ZERO;
    }
    let direction = if distance > f32::EPSILON {
        delta / distance
    } else {
        fallback
    };
    direction * strength * (1.0 - distance / radius)
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum PointerEvent {
    Move(Vec2),
    Leave,
}

pub struct MagneticField {
    element: ElementHandle,
    radius: f32,
    strength: f32,
    offset: Vec2,
    last_direction: Vec2,
    pending: FrameThrottle<PointerEvent>,
    listeners: Vec<Registration>,
}

impl MagneticField {
    /// A field that is not listening yet. Parameters are validated before
    /// anything is registered.
    pub fn new(element: ElementHandle, radius: f32, strength: f32) -> Result<Self> {
        let valid = |v: f32| v.is_finite() && v > 0.0;
        if !(valid(radius) && valid(strength)) {
            return Err(StageError::InvalidMagneticField { radius, strength });
        }
        Ok(Self {
            element,
            radius,
            strength,
            offset: Vec2::ZERO,
            last_direction: Vec2::X,
            pending: FrameThrottle::new(),
            listeners: Vec::new(),
        })
    }

    /// Validates, then subscribes to pointer move and leave on `host`.
    pub fn mount(host: &SharedHost, element: ElementHandle, radius: f32, strength: f32) -> Result<Self> {
        let mut field = Self::new(element, radius, strength)?;
        field.resume(host);
        Ok(field)
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn strength(&self) -> f32 {
        self.strength
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn element(&self) -> &ElementHandle {
        &self.element
    }

    pub fn is_listening(&self) -> bool {
        !self.listeners.is_empty()
    }

    /// Recomputes the offset for `pointer` against the element's current
    /// bounds. An unmeasured element has no pull.
    pub fn update(&mut self, pointer: Vec2) -> Vec2 {
        let Some(bounds) = self.element.bounds() else {
            self.offset = Vec2::ZERO;
            return self.offset;
        };
        let center = bounds.center();
        let delta = center - pointer;
        let distance = delta.length();
        if distance > f32::EPSILON && distance.is_finite() {
            self.last_direction = delta / distance;
        }
        self.offset = magnetic_pull(center, pointer, self.radius, self.strength, self.last_direction);
        trace!(x = self.offset.x, y = self.offset.y, distance, "magnetic offset");
        self.offset
    }

    pub fn on_pointer_move(&mut self, pointer: Vec2) {
        self.pending.offer(PointerEvent::Move(pointer));
    }

    pub fn on_pointer_leave(&mut self) {
        self.pending.offer(PointerEvent::Leave);
    }

    /// Applies the latest queued pointer event. Call once per frame.
    pub fn tick(&mut self) -> Vec2 {
        match self.pending.take() {
            Some(PointerEvent::Move(pointer)) => self.update(pointer),
            Some(PointerEvent::Leave) => {
                self.reset();
                self.offset
            }
            None => self.offset,
        }
    }

    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
    }

    /// Drops the pointer listeners and any stale pull.
    pub fn suspend(&mut self) {
        self.listeners.clear();
        self.pending.take();
        self.reset();
    }

    pub fn resume(&mut self, host: &SharedHost) {
        if self.listeners.is_empty() {
            self.listeners = vec![
                Registration::acquire(host, Subscription::PointerMove),
                Registration::acquire(host, Subscription::PointerLeave),
            ];
        }
    }
}

impl std::fmt::Debug for MagneticField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MagneticField")
            .field("radius", &self.radius)
            .field("strength", &self.strength)
            .field("offset", &self.offset)
            .field("listening", &self.is_listening())
            .finish()
    }
}
