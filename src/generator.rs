use std::net::Ipv4Addr;
use std::ops::RangeInclusive;

use chrono::{DateTime, Duration as ChronoDuration, DurationRound, Local};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{DEFAULT_BATCH_MAX, DEFAULT_BATCH_MIN, MAX_BATCH_SIZE};
use crate::error::{MonitorError, Result};
use crate::models::domain::{Protocol, ThreatLevel, TrafficSample, TrafficType};

pub const PACKET_SIZE_RANGE: RangeInclusive<u16> = 64..=1500;
pub const HOST_OCTET_RANGE: RangeInclusive<u8> = 1..=254;
pub const CONNECTION_RANGE: RangeInclusive<u32> = 25..=75;
pub const SERIES_PACKET_RANGE: RangeInclusive<u32> = 10..=50;

/// Probability that a sample carries an elevated threat level.
pub const ELEVATED_THREAT_PROBABILITY: f64 = 0.1;

const SUBNET: [u8; 3] = [192, 168, 1];

/// One bucket of the simulated "traffic over time" chart.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub minute: DateTime<Local>,
    pub packets: u32,
}

pub struct TrafficGenerator {
    rng: StdRng,
    batch_size: RangeInclusive<u32>,
}

impl TrafficGenerator {
    pub fn new(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    pub fn from_rng(rng: StdRng) -> Self {
        Self {
            rng,
            batch_size: DEFAULT_BATCH_MIN..=DEFAULT_BATCH_MAX,
        }
    }

    /// The range must be non-empty and top out at [`MAX_BATCH_SIZE`].
    pub fn with_batch_size(mut self, batch_size: RangeInclusive<u32>) -> Result<Self> {
        if batch_size.is_empty() || *batch_size.end() > MAX_BATCH_SIZE {
            return Err(MonitorError::Config(format!(
                "batch size range {:?} must be non-empty and at most {}",
                batch_size, MAX_BATCH_SIZE
            )));
        }
        self.batch_size = batch_size;
        Ok(self)
    }

    /// Draws one sample. Every field is independent; the threat level is
    /// NORMAL nine times out of ten.
    pub fn generate_sample(&mut self) -> TrafficSample {
        TrafficSample {
            timestamp: Local::now(),
            source: self.host_address(),
            destination: self.host_address(),
            protocol: *pick(&mut self.rng, &Protocol::ALL),
            packet_size: self.rng.gen_range(PACKET_SIZE_RANGE),
            traffic_type: *pick(&mut self.rng, &TrafficType::ALL),
            threat_level: self.threat_level(),
        }
    }

    /// Samples for one refresh; the count is drawn from the batch range.
    pub fn generate_batch(&mut self) -> Vec<TrafficSample> {
        let count = self.rng.gen_range(self.batch_size.clone());
        (0..count).map(|_| self.generate_sample()).collect()
    }

    pub fn active_connections(&mut self) -> u32 {
        self.rng.gen_range(CONNECTION_RANGE)
    }

    /// Per-minute packet counts for the last `points` minutes, oldest first.
    pub fn packet_series(&mut self, points: usize) -> Vec<SeriesPoint> {
        let now = Local::now();
        let current_minute = now
            .duration_trunc(ChronoDuration::minutes(1))
            .unwrap_or(now);

        (0..points)
            .rev()
            .map(|back| SeriesPoint {
                minute: current_minute - ChronoDuration::minutes(back as i64),
                packets: self.rng.gen_range(SERIES_PACKET_RANGE),
            })
            .collect()
    }

    fn host_address(&mut self) -> Ipv4Addr {
        let host = self.rng.gen_range(HOST_OCTET_RANGE);
        Ipv4Addr::new(SUBNET[0], SUBNET[1], SUBNET[2], host)
    }

    fn threat_level(&mut self) -> ThreatLevel {
        if self.rng.gen_bool(ELEVATED_THREAT_PROBABILITY) {
            *pick(&mut self.rng, &ThreatLevel::ELEVATED)
        } else {
            ThreatLevel::Normal
        }
    }
}

fn pick<'a, T>(rng: &mut StdRng, choices: &'a [T]) -> &'a T {
    // choices are non-empty constant tables
    &choices[rng.gen_range(0..choices.len())]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_stay_in_their_domains() {
        let mut gen = TrafficGenerator::new(7);
        for _ in 0..5_000 {
            let s = gen.generate_sample();
            assert!(PACKET_SIZE_RANGE.contains(&s.packet_size));
            assert!(Protocol::ALL.contains(&s.protocol));
            assert!(TrafficType::ALL.contains(&s.traffic_type));
            for addr in [s.source, s.destination] {
                let [a, b, c, d] = addr.octets();
                assert_eq!([a, b, c], SUBNET);
                assert!(HOST_OCTET_RANGE.contains(&d));
            }
        }
    }

    #[test]
    fn elevated_threat_rate_is_about_ten_percent() {
        let mut gen = TrafficGenerator::new(42);
        let n = 10_000;
        let elevated = (0..n)
            .filter(|_| gen.generate_sample().threat_level.is_elevated())
            .count();
        let rate = elevated as f64 / n as f64;
        // sd is 0.003 at n = 10k; allow five of them
        assert!((rate - 0.10).abs() < 0.015, "elevated rate {}", rate);
    }

    #[test]
    fn elevated_levels_are_all_reachable() {
        let mut gen = TrafficGenerator::new(3);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..10_000 {
            seen.insert(gen.generate_sample().threat_level);
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn same_seed_same_stream() {
        let mut a = TrafficGenerator::new(99);
        let mut b = TrafficGenerator::new(99);
        for _ in 0..100 {
            let (x, y) = (a.generate_sample(), b.generate_sample());
            assert_eq!(
                (x.source, x.destination, x.protocol, x.packet_size, x.traffic_type, x.threat_level),
                (y.source, y.destination, y.protocol, y.packet_size, y.traffic_type, y.threat_level)
            );
        }
    }

    #[test]
    fn batch_length_respects_range() {
        let mut gen = TrafficGenerator::new(1).with_batch_size(3..=6).unwrap();
        for _ in 0..200 {
            let len = gen.generate_batch().len() as u32;
            assert!((3..=6).contains(&len));
        }
    }

    #[test]
    fn bad_batch_ranges_are_rejected() {
        assert!(matches!(
            TrafficGenerator::new(1).with_batch_size(RangeInclusive::new(5, 1)),
            Err(MonitorError::Config(_))
        ));
        assert!(TrafficGenerator::new(1).with_batch_size(1..=MAX_BATCH_SIZE + 1).is_err());
        assert!(TrafficGenerator::new(1).with_batch_size(0..=0).is_ok());
    }

    #[test]
    fn connections_and_series_are_bounded() {
        let mut gen = TrafficGenerator::new(5);
        for _ in 0..200 {
            assert!(CONNECTION_RANGE.contains(&gen.active_connections()));
        }
        let series = gen.packet_series(20);
        assert_eq!(series.len(), 20);
        assert!(series.iter().all(|p| SERIES_PACKET_RANGE.contains(&p.packets)));
        assert!(series.windows(2).all(|w| w[1].minute - w[0].minute == ChronoDuration::minutes(1)));
    }
}
