use std::ops::RangeInclusive;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::{MonitorError, Result};
use crate::models::domain::{ThreatIncrement, ThreatStatistics};

/// Inclusive bounds for each per-tick counter delta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncrementRanges {
    pub total: RangeInclusive<u64>,
    pub high_severity: RangeInclusive<u64>,
    pub blocked_ips: RangeInclusive<u64>,
    pub false_positives: RangeInclusive<u64>,
}

impl Default for IncrementRanges {
    fn default() -> Self {
        Self {
            total: 0..=5,
            high_severity: 0..=2,
            blocked_ips: 0..=3,
            false_positives: 0..=1,
        }
    }
}

impl IncrementRanges {
    /// Every range must hold at least one value.
    pub fn validate(&self) -> Result<()> {
        let named = [
            ("total", &self.total),
            ("high_severity", &self.high_severity),
            ("blocked_ips", &self.blocked_ips),
            ("false_positives", &self.false_positives),
        ];
        for (name, range) in named {
            if range.is_empty() {
                return Err(MonitorError::Config(format!(
                    "{} increment range {:?} is empty",
                    name, range
                )));
            }
        }
        Ok(())
    }
}

/// Advances a session's threat counters at most once per threshold window.
pub struct ThreatAccumulator {
    rng: StdRng,
    threshold: Duration,
    ranges: IncrementRanges,
    last_tick: Instant,
}

impl ThreatAccumulator {
    /// `started` is the session start; the first update happens once the
    /// threshold has passed since then.
    pub fn new(rng: StdRng, threshold: Duration, started: Instant) -> Self {
        Self {
            rng,
            threshold,
            ranges: IncrementRanges::default(),
            last_tick: started,
        }
    }

    pub fn seeded(seed: u64, threshold: Duration, started: Instant) -> Self {
        Self::new(StdRng::seed_from_u64(seed), threshold, started)
    }

    pub fn with_ranges(mut self, ranges: IncrementRanges) -> Result<Self> {
        ranges.validate()?;
        self.ranges = ranges;
        Ok(self)
    }

    pub fn last_tick(&self) -> Instant {
        self.last_tick
    }

    /// Returns `stats` plus a fresh random increment when more than the
    /// threshold has elapsed since the last update, otherwise `stats` as is.
    /// An `now` earlier than the last update counts as no time elapsed.
    pub fn tick(&mut self, stats: &ThreatStatistics, now: Instant) -> ThreatStatistics {
        let elapsed = now.saturating_duration_since(self.last_tick);
        if elapsed <= self.threshold {
            return *stats;
        }

        let inc = self.draw_increment();
        let mut next = *stats;
        next.apply(&inc);
        self.last_tick = now;

        debug!(
            elapsed_ms = elapsed.as_millis() as u64,
            total = next.total,
            high_severity = next.high_severity,
            blocked_ips = next.blocked_ips,
            false_positives = next.false_positives,
            "threat counters advanced"
        );
        next
    }

    fn draw_increment(&mut self) -> ThreatIncrement {
        ThreatIncrement {
            total: self.rng.gen_range(self.ranges.total.clone()),
            high_severity: self.rng.gen_range(self.ranges.high_severity.clone()),
            blocked_ips: self.rng.gen_range(self.ranges.blocked_ips.clone()),
            false_positives: self.rng.gen_range(self.ranges.false_positives.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_TICK_THRESHOLD: Duration = Duration::from_secs(2);

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn nothing_changes_inside_the_window() {
        let t0 = Instant::now();
        let mut acc = ThreatAccumulator::seeded(11, DEFAULT_TICK_THRESHOLD, t0);
        let stats = ThreatStatistics::new();

        assert_eq!(acc.tick(&stats, t0 + secs(0.5)), stats);
        assert_eq!(acc.tick(&stats, t0 + secs(2.0)), stats);
        assert_eq!(acc.last_tick(), t0);
    }

    #[test]
    fn second_call_within_window_is_identical() {
        let t0 = Instant::now();
        let mut acc = ThreatAccumulator::seeded(12, DEFAULT_TICK_THRESHOLD, t0);

        let first = acc.tick(&ThreatStatistics::new(), t0 + secs(2.5));
        let second = acc.tick(&first, t0 + secs(3.0));
        assert_eq!(first, second);
        assert_eq!(acc.last_tick(), t0 + secs(2.5));
    }

    #[test]
    fn counters_never_decrease() {
        let t0 = Instant::now();
        let mut acc = ThreatAccumulator::seeded(13, DEFAULT_TICK_THRESHOLD, t0);
        let mut stats = ThreatStatistics::new();
        let mut now = t0;

        for step in 0..500u64 {
            // mix of in-window, out-of-window and backwards timestamps
            now = match step % 3 {
                0 => now + secs(2.1),
                1 => now + secs(0.7),
                _ => now - secs(0.3),
            };
            let next = acc.tick(&stats, now);
            assert!(next.dominates(&stats), "step {}: {:?} -> {:?}", step, stats, next);
            stats = next;
        }
        assert!(stats.total > 0);
    }

    #[test]
    fn out_of_window_tick_adds_a_positive_total() {
        let t0 = Instant::now();
        let ranges = IncrementRanges { total: 1..=5, ..IncrementRanges::default() };
        let mut acc = ThreatAccumulator::seeded(14, DEFAULT_TICK_THRESHOLD, t0).with_ranges(ranges).unwrap();

        let mut stats = ThreatStatistics::new();
        for i in 1..=20u32 {
            let next = acc.tick(&stats, t0 + secs(2.5) * i);
            assert!(next.total > stats.total);
            stats = next;
        }
    }

    #[test]
    fn zero_ranges_leave_stats_alone_but_move_the_window() {
        let t0 = Instant::now();
        let ranges = IncrementRanges {
            total: 0..=0,
            high_severity: 0..=0,
            blocked_ips: 0..=0,
            false_positives: 0..=0,
        };
        let mut acc = ThreatAccumulator::seeded(15, DEFAULT_TICK_THRESHOLD, t0).with_ranges(ranges).unwrap();

        let stats = ThreatStatistics { total: 4, ..Default::default() };
        assert_eq!(acc.tick(&stats, t0 + secs(3.0)), stats);
        assert_eq!(acc.last_tick(), t0 + secs(3.0));
    }

    #[test]
    fn increments_stay_within_ranges() {
        let t0 = Instant::now();
        let ranges = IncrementRanges::default();
        let mut acc = ThreatAccumulator::seeded(16, DEFAULT_TICK_THRESHOLD, t0);
        let mut stats = ThreatStatistics::new();

        for i in 1..=200u32 {
            let next = acc.tick(&stats, t0 + secs(2.5) * i);
            assert!(ranges.total.contains(&(next.total - stats.total)));
            assert!(ranges.high_severity.contains(&(next.high_severity - stats.high_severity)));
            assert!(ranges.blocked_ips.contains(&(next.blocked_ips - stats.blocked_ips)));
            assert!(ranges.false_positives.contains(&(next.false_positives - stats.false_positives)));
            stats = next;
        }
    }

    #[test]
    fn empty_increment_range_is_rejected() {
        let ranges = IncrementRanges { blocked_ips: 3..=1, ..IncrementRanges::default() };
        let result = ThreatAccumulator::seeded(18, DEFAULT_TICK_THRESHOLD, Instant::now()).with_ranges(ranges);
        match result {
            Err(MonitorError::Config(msg)) => assert!(msg.contains("blocked_ips")),
            Err(e) => panic!("unexpected error {}", e),
            Ok(_) => panic!("empty range accepted"),
        }
    }

    #[test]
    fn same_seed_same_counters() {
        let t0 = Instant::now();
        let mut a = ThreatAccumulator::seeded(17, DEFAULT_TICK_THRESHOLD, t0);
        let mut b = ThreatAccumulator::seeded(17, DEFAULT_TICK_THRESHOLD, t0);
        let (mut sa, mut sb) = (ThreatStatistics::new(), ThreatStatistics::new());
        for i in 1..=10u32 {
            sa = a.tick(&sa, t0 + secs(3.0) * i);
            sb = b.tick(&sb, t0 + secs(3.0) * i);
        }
        assert_eq!(sa, sb);
    }
}
