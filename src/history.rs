use std::fmt;

use time::{Duration, OffsetDateTime};

/// Toggle-parity history of a boolean state.
///
/// Entry `2k` marks the state becoming active, entry `2k + 1` marks it becoming
/// inactive. Rather than keeping every timestamp, fully closed intervals are
/// folded into a running total and only the latest transition is retained, so
/// memory stays constant for long-running watches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToggleHistory {
    entries: usize,
    closed: Duration,
    last: Option<OffsetDateTime>,
}

impl ToggleHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a transition at `at`. Timestamps earlier than the previous
    /// transition are clamped to it.
    pub fn push(&mut self, at: OffsetDateTime) {
        let at = self.last.map_or(at, |last| at.max(last));
        if self.is_active() {
            if let Some(start) = self.last {
                self.closed += at - start;
            }
        }
        self.last = Some(at);
        self.entries += 1;
    }

    /// Number of transitions recorded so far.
    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Odd length: the final interval is still open.
    pub fn is_active(&self) -> bool {
        self.entries % 2 == 1
    }

    pub fn last(&self) -> Option<OffsetDateTime> {
        self.last
    }

    /// Total active time up to `now`, including the open interval if any.
    pub fn active_duration(&self, now: OffsetDateTime) -> Duration {
        let open = match (self.is_active(), self.last) {
            (true, Some(start)) if now > start => now - start,
            _ => Duration::ZERO,
        };
        self.closed + open
    }
}

/// Active time against total observation time, both in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Uptime {
    pub up: Duration,
    pub observed: Duration,
}

impl Uptime {
    pub fn new(up: Duration, observed: Duration) -> Self {
        Self {
            up: truncate_seconds(up),
            observed: truncate_seconds(observed),
        }
    }
}

fn truncate_seconds(d: Duration) -> Duration {
    Duration::seconds(d.whole_seconds().max(0))
}

/// Render a span as `H:MM:SS`, with a `N day(s), ` prefix past one day.
pub struct Span(pub Duration);

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.0.whole_seconds().max(0);
        let days = total / 86_400;
        let rem = total % 86_400;
        let (h, m, s) = (rem / 3600, (rem % 3600) / 60, rem % 60);
        match days {
            0 => write!(f, "{h}:{m:02}:{s:02}"),
            1 => write!(f, "1 day, {h}:{m:02}:{s:02}"),
            n => write!(f, "{n} days, {h}:{m:02}:{s:02}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: i64) -> OffsetDateTime {
        OffsetDateTime::UNIX_EPOCH + Duration::seconds(secs)
    }

    /// Straightforward pairwise sum over a full timestamp list.
    fn reference_active(history: &[i64], now: i64) -> i64 {
        let mut total = 0;
        for pair in history.chunks(2) {
            match pair {
                [start, end] => total += end - start,
                [start] => total += now - start,
                _ => {}
            }
        }
        total
    }

    #[test]
    fn empty_history_is_zero() {
        let h = ToggleHistory::new();
        assert_eq!(h.active_duration(t(100)), Duration::ZERO);
        assert!(h.is_empty());
    }

    #[test]
    fn single_entry_runs_until_now() {
        let mut h = ToggleHistory::new();
        h.push(t(5));
        assert_eq!(h.active_duration(t(12)), Duration::seconds(7));
    }

    #[test]
    fn closed_and_open_intervals() {
        let mut h = ToggleHistory::new();
        for s in [0, 10, 15] {
            h.push(t(s));
        }
        assert_eq!(h.len(), 3);
        assert!(h.is_active());
        assert_eq!(h.active_duration(t(20)), Duration::seconds(15));
    }

    #[test]
    fn compaction_matches_full_list() {
        let cases: &[&[i64]] = &[
            &[3],
            &[0, 4],
            &[0, 4, 9, 30],
            &[1, 2, 3, 5, 8, 13, 21],
            &[0, 100, 101, 102, 200, 250, 251, 260],
        ];
        for list in cases {
            let mut h = ToggleHistory::new();
            for &s in *list {
                h.push(t(s));
            }
            let now = 300;
            assert_eq!(
                h.active_duration(t(now)).whole_seconds(),
                reference_active(list, now),
                "history {:?}",
                list
            );
            assert_eq!(h.len(), list.len());
        }
    }

    #[test]
    fn out_of_order_push_is_clamped() {
        let mut h = ToggleHistory::new();
        h.push(t(10));
        h.push(t(4));
        assert_eq!(h.last(), Some(t(10)));
        assert_eq!(h.active_duration(t(50)), Duration::ZERO);
    }

    #[test]
    fn uptime_truncates_to_seconds() {
        let u = Uptime::new(Duration::milliseconds(1999), Duration::milliseconds(2500));
        assert_eq!(u.up, Duration::seconds(1));
        assert_eq!(u.observed, Duration::seconds(2));
    }

    #[test]
    fn span_formatting() {
        assert_eq!(Span(Duration::seconds(15)).to_string(), "0:00:15");
        assert_eq!(Span(Duration::seconds(3723)).to_string(), "1:02:03");
        assert_eq!(Span(Duration::seconds(86_400 + 61)).to_string(), "1 day, 0:01:01");
        assert_eq!(Span(Duration::seconds(2 * 86_400)).to_string(), "2 days, 0:00:00");
    }
}
