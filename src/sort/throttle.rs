use std::time::{Duration, Instant};

/// De-duplicating throttle in front of the sort worker.
///
/// Holds at most one pending value. A value equal to the previously offered
/// one is coalesced: it replaces a pending value (so the newest timestamp
/// wins) and is dropped otherwise. Pending values are released no more than
/// once per `interval`; the first value after a quiet period goes out
/// immediately.
#[derive(Debug)]
pub struct Throttle<T> {
    interval: Duration,
    last_offered: Option<T>,
    pending: Option<T>,
    last_emitted: Option<Instant>,
}

impl<T: PartialEq + Clone> Throttle<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_offered: None,
            pending: None,
            last_emitted: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns `false` when `value` was discarded as a duplicate.
    pub fn offer(&mut self, value: T) -> bool {
        let duplicate = self.last_offered.as_ref() == Some(&value);
        self.last_offered = Some(value.clone());
        match (&mut self.pending, duplicate) {
            (Some(pending), true) => {
                *pending = value;
                true
            }
            (None, true) => false,
            (pending, false) => {
                *pending = Some(value);
                true
            }
        }
    }

    /// How long until the pending value may be released, or `None` when
    /// nothing is pending.
    pub fn wait_time(&self, now: Instant) -> Option<Duration> {
        self.pending.as_ref()?;
        let wait = match self.last_emitted {
            Some(at) => (at + self.interval).saturating_duration_since(now),
            None => Duration::ZERO,
        };
        Some(wait)
    }

    /// Releases the pending value if the window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if self.wait_time(now)? > Duration::ZERO {
            return None;
        }
        self.last_emitted = Some(now);
        self.pending.take()
    }
}
