//! "Latest request wins" debouncing for search input.
//!
//! Each `schedule` call bumps a token and re-arms the deadline. Only the value
//! carried by the newest token is ever released; older ones are dropped.

use std::time::{Duration, Instant};

#[derive(Debug)]
struct Pending<T> {
    token: u64,
    value: T,
    deadline: Instant,
}

#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    next_token: u64,
    pending: Option<Pending<T>>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_token: 0,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace any pending value and restart the timer. Returns the new token.
    pub fn schedule(&mut self, value: T, now: Instant) -> u64 {
        self.next_token += 1;
        let token = self.next_token;
        if let Some(previous) = self.pending.replace(Pending {
            token,
            value,
            deadline: now + self.delay,
        }) {
            log::debug!("Debounce: request {} superseded by {}", previous.token, token);
        }
        token
    }

    /// Release the pending value once its deadline has passed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some(pending) if now >= pending.deadline => self.pending.take().map(|p| p.value),
            _ => None,
        }
    }

    /// Release the pending value immediately
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.value)
    }

    /// Drop the pending value without releasing it
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Token of the request that would be released next
    pub fn latest_token(&self) -> Option<u64> {
        self.pending.as_ref().map(|p| p.token)
    }

    /// Time left until the pending value is due, used as an event-poll timeout
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|p| p.deadline.saturating_duration_since(now))
    }
}
