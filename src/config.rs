//! Startup configuration.
//!
//! Values come from CLI flags or `NID_*` environment variables (a `.env` file
//! is loaded by the binary before parsing) and are validated once into a
//! [`MonitorConfig`]. Anything malformed fails here rather than mid-session.

use std::ops::RangeInclusive;
use std::time::Duration;

use clap::Args;
use serde::Serialize;

use crate::error::{MonitorError, Result};

pub const DEFAULT_POLL_INTERVAL_MS: i64 = 3000;
pub const DEFAULT_TICK_THRESHOLD_MS: i64 = 2000;
pub const DEFAULT_BATCH_MIN: u32 = 8;
pub const DEFAULT_BATCH_MAX: u32 = 20;
pub const DEFAULT_SERIES_POINTS: usize = 20;
pub const DEFAULT_SENSITIVITY: f64 = 0.7;
pub const DEFAULT_ALERT_EMAIL: &str = "admin@company.com";

/// Largest batch a single refresh may draw.
pub const MAX_BATCH_SIZE: u32 = 10_000;
/// One day of one-minute buckets.
pub const MAX_SERIES_POINTS: usize = 1440;

const SENSITIVITY_RANGE: RangeInclusive<f64> = 0.1..=1.0;

/// Unvalidated settings as parsed from the command line / environment.
#[derive(Args, Debug, Clone)]
pub struct RawConfig {
    /// Delay between dashboard refreshes, in milliseconds
    #[arg(long, env = "NID_POLL_INTERVAL_MS", default_value_t = DEFAULT_POLL_INTERVAL_MS, allow_negative_numbers = true)]
    pub poll_interval_ms: i64,

    /// Minimum time between threat counter updates, in milliseconds
    #[arg(long, env = "NID_TICK_THRESHOLD_MS", default_value_t = DEFAULT_TICK_THRESHOLD_MS, allow_negative_numbers = true)]
    pub tick_threshold_ms: i64,

    /// Fewest samples generated per refresh
    #[arg(long, env = "NID_BATCH_MIN", default_value_t = DEFAULT_BATCH_MIN)]
    pub batch_min: u32,

    /// Most samples generated per refresh
    #[arg(long, env = "NID_BATCH_MAX", default_value_t = DEFAULT_BATCH_MAX)]
    pub batch_max: u32,

    /// Number of one-minute buckets in the traffic series
    #[arg(long, env = "NID_SERIES_POINTS", default_value_t = DEFAULT_SERIES_POINTS)]
    pub series_points: usize,

    /// Seed for the random source; omitted means seeded from entropy
    #[arg(long, env = "NID_SEED")]
    pub seed: Option<u64>,

    /// Detection sensitivity, between 0.1 and 1.0
    #[arg(long, env = "NID_SENSITIVITY", default_value_t = DEFAULT_SENSITIVITY, allow_negative_numbers = true)]
    pub sensitivity: f64,

    /// Auto-block high-risk IPs
    #[arg(long, env = "NID_AUTO_BLOCK")]
    pub auto_block: bool,

    /// Address alerts would be sent to
    #[arg(long, env = "NID_ALERT_EMAIL", default_value = DEFAULT_ALERT_EMAIL)]
    pub alert_email: String,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            tick_threshold_ms: DEFAULT_TICK_THRESHOLD_MS,
            batch_min: DEFAULT_BATCH_MIN,
            batch_max: DEFAULT_BATCH_MAX,
            series_points: DEFAULT_SERIES_POINTS,
            seed: None,
            sensitivity: DEFAULT_SENSITIVITY,
            auto_block: false,
            alert_email: DEFAULT_ALERT_EMAIL.to_string(),
        }
    }
}

/// Detection settings shown on the settings page. Display only: nothing in
/// the feed reads them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionSettings {
    pub sensitivity: f64,
    pub auto_block: bool,
    pub alert_email: String,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            sensitivity: DEFAULT_SENSITIVITY,
            auto_block: false,
            alert_email: DEFAULT_ALERT_EMAIL.to_string(),
        }
    }
}

impl DetectionSettings {
    pub fn validate(&self) -> Result<()> {
        if !SENSITIVITY_RANGE.contains(&self.sensitivity) {
            return Err(MonitorError::Config(format!(
                "sensitivity must be between {} and {}, got {}",
                SENSITIVITY_RANGE.start(),
                SENSITIVITY_RANGE.end(),
                self.sensitivity
            )));
        }
        let email = self.alert_email.trim();
        match email.split_once('@') {
            Some((user, domain)) if !user.is_empty() && !domain.is_empty() => Ok(()),
            _ => Err(MonitorError::Config(format!(
                "alert email is not an address: {:?}",
                self.alert_email
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub poll_interval: Duration,
    pub tick_threshold: Duration,
    pub batch_size: RangeInclusive<u32>,
    pub series_points: usize,
    pub seed: Option<u64>,
    pub settings: DetectionSettings,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS as u64),
            tick_threshold: Duration::from_millis(DEFAULT_TICK_THRESHOLD_MS as u64),
            batch_size: DEFAULT_BATCH_MIN..=DEFAULT_BATCH_MAX,
            series_points: DEFAULT_SERIES_POINTS,
            seed: None,
            settings: DetectionSettings::default(),
        }
    }
}

impl MonitorConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl TryFrom<RawConfig> for MonitorConfig {
    type Error = MonitorError;

    fn try_from(raw: RawConfig) -> Result<Self> {
        let poll_interval = positive_millis("poll interval", raw.poll_interval_ms)?;
        let tick_threshold = positive_millis("tick threshold", raw.tick_threshold_ms)?;

        if raw.batch_min == 0 {
            return Err(MonitorError::Config("batch minimum must be at least 1".into()));
        }
        if raw.batch_min > raw.batch_max {
            return Err(MonitorError::Config(format!(
                "batch minimum {} exceeds batch maximum {}",
                raw.batch_min, raw.batch_max
            )));
        }
        if raw.batch_max > MAX_BATCH_SIZE {
            return Err(MonitorError::Config(format!(
                "batch maximum {} exceeds the limit of {}",
                raw.batch_max, MAX_BATCH_SIZE
            )));
        }
        if raw.series_points == 0 {
            return Err(MonitorError::Config("series needs at least one point".into()));
        }
        if raw.series_points > MAX_SERIES_POINTS {
            return Err(MonitorError::Config(format!(
                "series points {} exceed the limit of {}",
                raw.series_points, MAX_SERIES_POINTS
            )));
        }

        let settings = DetectionSettings {
            sensitivity: raw.sensitivity,
            auto_block: raw.auto_block,
            alert_email: raw.alert_email.trim().to_string(),
        };
        settings.validate()?;

        Ok(Self {
            poll_interval,
            tick_threshold,
            batch_size: raw.batch_min..=raw.batch_max,
            series_points: raw.series_points,
            seed: raw.seed,
            settings,
        })
    }
}

fn positive_millis(name: &str, ms: i64) -> Result<Duration> {
    if ms <= 0 {
        return Err(MonitorError::Config(format!(
            "{} must be positive, got {}ms",
            name, ms
        )));
    }
    Ok(Duration::from_millis(ms as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejects(raw: RawConfig) -> String {
        match MonitorConfig::try_from(raw) {
            Err(MonitorError::Config(msg)) => msg,
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn defaults_validate() {
        let config = MonitorConfig::try_from(RawConfig::default()).unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert_eq!(config.tick_threshold, Duration::from_secs(2));
        assert_eq!(config.batch_size, 8..=20);
        assert_eq!(config.settings, DetectionSettings::default());
    }

    #[test]
    fn negative_intervals_fail_fast() {
        let msg = rejects(RawConfig { tick_threshold_ms: -2000, ..Default::default() });
        assert!(msg.contains("tick threshold"));

        let msg = rejects(RawConfig { poll_interval_ms: 0, ..Default::default() });
        assert!(msg.contains("poll interval"));
    }

    #[test]
    fn batch_range_must_be_ordered_and_non_empty() {
        rejects(RawConfig { batch_min: 0, ..Default::default() });
        rejects(RawConfig { batch_min: 21, batch_max: 20, ..Default::default() });

        let config =
            MonitorConfig::try_from(RawConfig { batch_min: 5, batch_max: 5, ..Default::default() })
                .unwrap();
        assert_eq!(config.batch_size, 5..=5);
    }

    #[test]
    fn series_points_must_be_positive() {
        rejects(RawConfig { series_points: 0, ..Default::default() });
    }

    #[test]
    fn oversized_series_and_batches_fail_fast() {
        let msg = rejects(RawConfig { series_points: usize::MAX, ..Default::default() });
        assert!(msg.contains("series points"));
        rejects(RawConfig { series_points: MAX_SERIES_POINTS + 1, ..Default::default() });

        let msg = rejects(RawConfig { batch_max: u32::MAX, ..Default::default() });
        assert!(msg.contains("batch maximum"));
        rejects(RawConfig { batch_max: MAX_BATCH_SIZE + 1, ..Default::default() });

        let config = MonitorConfig::try_from(RawConfig {
            batch_max: MAX_BATCH_SIZE,
            series_points: MAX_SERIES_POINTS,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(config.series_points, MAX_SERIES_POINTS);
    }

    #[test]
    fn settings_are_checked() {
        rejects(RawConfig { sensitivity: 0.05, ..Default::default() });
        rejects(RawConfig { sensitivity: 1.5, ..Default::default() });
        rejects(RawConfig { alert_email: "admin".into(), ..Default::default() });
        rejects(RawConfig { alert_email: "@company.com".into(), ..Default::default() });

        let config = MonitorConfig::try_from(RawConfig {
            sensitivity: 1.0,
            alert_email: " soc@example.org ".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(config.settings.alert_email, "soc@example.org");
    }
}
