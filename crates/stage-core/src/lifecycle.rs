//! # Lifecycle
//!
//! Listener and frame-loop registration as scoped resources.
//!
//! ## Responsibilities
//! - **Host seam**: `Host` is what the embedding environment implements to
//!   deliver scroll, resize, pointer and per-frame callbacks.
//! - **Release on every exit path**: a `Registration` unsubscribes in `Drop`,
//!   so unmounting, early returns and panics unwinding through setup all
//!   release it.
//! - **Coalescing**: `FrameThrottle` keeps at most one pending event per
//!   frame.
//!
//! ## Key Types
//! - `Registration`: RAII guard for one subscription.
//! - `HeadlessHost`: in-process host that counts live subscriptions.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Subscription {
    Scroll,
    Resize,
    PointerMove,
    PointerLeave,
    /// Per-frame callback (one invocation per display refresh).
    FrameLoop,
}

pub type RegistrationId = u64;

/// The embedding environment.
pub trait Host {
    fn subscribe(&self, kind: Subscription) -> RegistrationId;
    fn unsubscribe(&self, id: RegistrationId);
}

pub type SharedHost = Rc<dyn Host>;

/// A live subscription. Dropping it unsubscribes.
pub struct Registration {
    host: SharedHost,
    id: RegistrationId,
    kind: Subscription,
}

impl Registration {
    pub fn acquire(host: &SharedHost, kind: Subscription) -> Self {
        let id = host.subscribe(kind);
        debug!(id, ?kind, "acquired registration");
        Self {
            host: host.clone(),
            id,
            kind,
        }
    }

    pub fn id(&self) -> RegistrationId {
        self.id
    }

    pub fn kind(&self) -> Subscription {
        self.kind
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.host.unsubscribe(self.id);
        debug!(id = self.id, kind = ?self.kind, "released registration");
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}

/// A frame-loop subscription that can be paused and resumed in place.
#[derive(Debug, Default)]
pub struct FrameLoop {
    registration: Option<Registration>,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, host: &SharedHost) {
        if self.registration.is_none() {
            self.registration = Some(Registration::acquire(host, Subscription::FrameLoop));
        }
    }

    pub fn stop(&mut self) {
        self.registration = None;
    }

    pub fn is_running(&self) -> bool {
        self.registration.is_some()
    }
}

/// Host without a real environment behind it. Tracks which subscriptions
/// are live so tests and the CLI can check for leaks.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    next_id: Cell<RegistrationId>,
    live: RefCell<HashMap<RegistrationId, Subscription>>,
}

impl HeadlessHost {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn live(&self) -> usize {
        self.live.borrow().len()
    }

    pub fn live_of(&self, kind: Subscription) -> usize {
        self.live.borrow().values().filter(|k| **k == kind).count()
    }
}

impl Host for HeadlessHost {
    fn subscribe(&self, kind: Subscription) -> RegistrationId {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.live.borrow_mut().insert(id, kind);
        id
    }

    fn unsubscribe(&self, id: RegistrationId) {
        // Unknown ids are a no-op: teardown may race with host shutdown.
        self.live.borrow_mut().remove(&id);
    }
}

/// Coalesces bursts of events into at most one update per frame.
#[derive(Debug, Clone)]
pub struct FrameThrottle<T> {
    pending: Option<T>,
    coalesced: u64,
}

impl<T> Default for FrameThrottle<T> {
    fn default() -> Self {
        Self {
            pending: None,
            coalesced: 0,
        }
    }
}

impl<T> FrameThrottle<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `event`, replacing anything not yet consumed this frame.
    pub fn offer(&mut self, event: T) {
        if self.pending.replace(event).is_some() {
            self.coalesced += 1;
            trace!(coalesced = self.coalesced, "event coalesced");
        }
    }

    /// Takes the latest event at a frame boundary.
    pub fn take(&mut self) -> Option<T> {
        self.pending.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Events dropped because a newer one arrived in the same frame.
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }
}
