//! Single-slot debounced actions
//!
//! A newer [`Debounced::schedule`] supersedes whatever was pending; the
//! superseded action is dropped without running. The owner polls with the
//! current time and runs the action once it is due.

use std::time::{Duration, Instant};

/// Holds at most one pending action.
#[derive(Debug)]
pub struct Debounced<T> {
    delay: Duration,
    /// Due time and the action waiting for it
    slot: Option<(Instant, T)>,
}

impl<T> Debounced<T> {
    pub fn new(delay: Duration) -> Self {
        Self { delay, slot: None }
    }

    /// Schedule `action` to run `delay` after `now`, replacing any pending one.
    pub fn schedule(&mut self, action: T, now: Instant) {
        self.slot = Some((now + self.delay, action));
    }

    /// Take the pending action if it is due at `now`.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.slot.take() {
            Some((due, action)) if due <= now => Some(action),
            waiting => {
                self.slot = waiting;
                None
            }
        }
    }

    pub fn is_pending(&self) -> bool {
        self.slot.is_some()
    }

    pub fn cancel(&mut self) -> bool {
        self.slot.take().is_some()
    }
}
