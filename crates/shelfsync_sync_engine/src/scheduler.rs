//! Debounced propagation scheduling.
//!
//! Each direction has its own trailing-edge debouncer. Every event restarts
//! the window; only the quiet period after the last event of a burst fires.
//! Nothing is queued: the fired propagation re-reads current store state, so
//! collapsing a burst of keystroke saves into one push loses nothing.

use std::time::Duration;
use tokio::time::Instant;

/// A trailing-edge debounce timer.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    /// Creates an idle debouncer with the given quiet window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// Restarts the window at `now`, replacing any pending deadline.
    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    /// When the pending action fires, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns true if an action is pending.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Clears the pending action if its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Clears the pending action regardless of its deadline.
    pub fn take(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    /// Drops the pending action without firing it.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

/// A propagation the scheduler decided to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    /// Pull the remote collection and merge it locally.
    Pull,
    /// Push the local collection outward.
    Push,
}

/// Owns the outbound and inbound debouncers.
#[derive(Debug, Clone)]
pub struct PropagationScheduler {
    outbound: Debouncer,
    inbound: Debouncer,
}

impl PropagationScheduler {
    /// Creates a scheduler with the given windows.
    pub fn new(outbound: Duration, inbound: Duration) -> Self {
        Self {
            outbound: Debouncer::new(outbound),
            inbound: Debouncer::new(inbound),
        }
    }

    /// Records a local-store change.
    pub fn local_changed(&mut self, now: Instant) {
        self.outbound.trigger(now);
    }

    /// Records a remote-store change.
    pub fn remote_changed(&mut self, now: Instant) {
        self.inbound.trigger(now);
    }

    /// Earliest pending deadline across both directions.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.outbound.deadline(), self.inbound.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Propagations whose window has elapsed, pulls before pushes.
    pub fn take_due(&mut self, now: Instant) -> Vec<Propagation> {
        let mut due = Vec::new();
        if self.inbound.take_due(now) {
            due.push(Propagation::Pull);
        }
        if self.outbound.take_due(now) {
            due.push(Propagation::Push);
        }
        due
    }

    /// All pending propagations, regardless of deadline.
    pub fn drain(&mut self) -> Vec<Propagation> {
        let mut due = Vec::new();
        if self.inbound.take() {
            due.push(Propagation::Pull);
        }
        if self.outbound.take() {
            due.push(Propagation::Push);
        }
        due
    }

    /// Drops every pending propagation.
    pub fn cancel_all(&mut self) {
        self.outbound.cancel();
        self.inbound.cancel();
    }

    /// Returns true if nothing is pending.
    pub fn is_idle(&self) -> bool {
        !self.outbound.is_pending() && !self.inbound.is_pending()
    }
}
