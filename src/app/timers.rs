//! Cancellable timers owned by a screen.
//!
//! The reducer never sleeps. Instead it arms a [`Timer`] with a deadline and
//! the runtime feeds `Tick` events; [`Timer::fire_if_due`] reports when the
//! deadline has passed. Unmount cancels every timer so nothing fires on a dead
//! screen.

use chrono::{DateTime, Duration, Utc};

/// Which screen timer a deadline belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Periodic silent refresh of the collection.
    AutoRefresh,
    /// Delay between the last keystroke and committing the search term.
    SearchDebounce,
}

/// A one-shot deadline that can be re-armed or cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timer {
    kind: TimerKind,
    period: Duration,
    deadline: Option<DateTime<Utc>>,
}

impl Timer {
    /// Creates a disarmed timer with the given period in milliseconds.
    #[must_use]
    pub fn new(kind: TimerKind, period_ms: u64) -> Self {
        Self {
            kind,
            period: i64::try_from(period_ms)
                .ok()
                .and_then(Duration::try_milliseconds)
                .unwrap_or(Duration::MAX),
            deadline: None,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> TimerKind {
        self.kind
    }

    /// Arms (or re-arms) the timer to fire one period after `now`.
    ///
    /// A deadline past the end of representable time never fires.
    pub fn arm(&mut self, now: DateTime<Utc>) {
        self.deadline = Some(
            now.checked_add_signed(self.period)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        );
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    #[must_use]
    pub const fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    /// Returns `true` and disarms when the deadline has passed.
    pub fn fire_if_due(&mut self, now: DateTime<Utc>) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                tracing::trace!(kind = ?self.kind, "timer fired");
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn rearming_pushes_deadline_back() {
        let mut debounce = Timer::new(TimerKind::SearchDebounce, 300);
        debounce.arm(at(0));
        debounce.arm(at(200));
        assert!(!debounce.fire_if_due(at(300)));
        assert!(debounce.fire_if_due(at(500)));
        assert!(!debounce.fire_if_due(at(900)));
    }

    #[test]
    fn oversized_period_never_fires() {
        let mut refresh = Timer::new(TimerKind::AutoRefresh, u64::MAX);
        refresh.arm(at(1_000));
        assert!(refresh.is_armed());
        assert!(!refresh.fire_if_due(DateTime::<Utc>::MAX_UTC - Duration::seconds(1)));
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut refresh = Timer::new(TimerKind::AutoRefresh, 30_000);
        refresh.arm(at(0));
        refresh.cancel();
        assert!(!refresh.is_armed());
        assert!(!refresh.fire_if_due(at(60_000)));
    }
}
