//! Settles raw search keystrokes into a single value after an idle window.
//!
//! The debouncer is driven by the caller's clock: every keystroke goes through
//! [`Debouncer::input`] and the event loop calls [`Debouncer::poll`] whenever
//! it wakes up (the next wake-up is [`Debouncer::deadline`]).

use std::time::{Duration, Instant};

/// Idle interval after the last keystroke before a search settles.
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(450);

#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    pending: Option<Pending>,
}

#[derive(Debug, Clone)]
struct Pending {
    value: String,
    deadline: Instant,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Records a keystroke, restarting the idle window.
    pub fn input(&mut self, value: impl Into<String>, now: Instant) {
        self.pending = Some(Pending {
            value: value.into(),
            deadline: now + self.window,
        });
    }

    /// Returns the settled value once the idle window has fully elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match &self.pending {
            Some(pending) if now >= pending.deadline => self.pending.take().map(|p| p.value),
            _ => None,
        }
    }

    /// Settles the pending value immediately.
    pub fn flush(&mut self) -> Option<String> {
        self.pending.take().map(|pending| pending.value)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|pending| pending.deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_DEBOUNCE)
    }
}
