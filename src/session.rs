use std::time::Instant;

use chrono::{DateTime, Local};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::accumulator::ThreatAccumulator;
use crate::config::{DetectionSettings, MonitorConfig};
use crate::error::{MonitorError, Result};
use crate::generator::{SeriesPoint, TrafficGenerator};
use crate::metrics::TrafficSummary;
use crate::models::domain::{ThreatStatistics, TrafficSample};
use crate::models::dto::TrafficSampleDTO;
use crate::report::SessionReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Active,
}

/// Everything the dashboard needs for one refresh.
#[derive(Debug, Clone)]
pub struct Frame {
    pub cycle: u64,
    pub monitoring_since: DateTime<Local>,
    pub batch: Vec<TrafficSample>,
    pub summary: TrafficSummary,
    pub series: Vec<SeriesPoint>,
    pub stats: ThreatStatistics,
}

struct ActiveSession {
    started_at: DateTime<Local>,
    started: Instant,
    stats: ThreatStatistics,
    accumulator: ThreatAccumulator,
    cycles: u64,
    last_batch: Vec<TrafficSampleDTO>,
}

/// Owns the monitoring flag, the feed and the counters of one monitoring
/// session. Callers hold it explicitly; nothing here is global.
pub struct MonitoringSession {
    config: MonitorConfig,
    seeds: StdRng,
    generator: TrafficGenerator,
    active: Option<ActiveSession>,
}

impl MonitoringSession {
    pub fn new(config: MonitorConfig) -> Result<Self> {
        let mut seeds = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let generator = TrafficGenerator::new(seeds.gen()).with_batch_size(config.batch_size.clone())?;

        Ok(Self {
            config,
            seeds,
            generator,
            active: None,
        })
    }

    pub fn state(&self) -> SessionState {
        if self.active.is_some() {
            SessionState::Active
        } else {
            SessionState::Idle
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.active.is_some()
    }

    pub fn stats(&self) -> Option<&ThreatStatistics> {
        self.active.as_ref().map(|s| &s.stats)
    }

    pub fn settings(&self) -> &DetectionSettings {
        &self.config.settings
    }

    /// IDLE -> ACTIVE with all counters at zero.
    pub fn start(&mut self, now: Instant) -> Result<()> {
        if self.active.is_some() {
            warn!("start requested while monitoring is already active");
            return Err(MonitorError::SessionActive);
        }

        let accumulator = ThreatAccumulator::seeded(self.seeds.gen(), self.config.tick_threshold, now);
        self.active = Some(ActiveSession {
            started_at: Local::now(),
            started: now,
            stats: ThreatStatistics::new(),
            accumulator,
            cycles: 0,
            last_batch: Vec::new(),
        });
        info!(
            tick_threshold_ms = self.config.tick_threshold.as_millis() as u64,
            "monitoring session started"
        );
        Ok(())
    }

    /// ACTIVE -> IDLE. The counters are dropped; the returned report is the
    /// last view of them.
    pub fn stop(&mut self, now: Instant) -> Result<SessionReport> {
        let session = match self.active.take() {
            Some(session) => session,
            None => {
                warn!("stop requested with no active monitoring session");
                return Err(MonitorError::SessionIdle);
            }
        };

        let report = SessionReport::new(
            session.started_at,
            now.saturating_duration_since(session.started),
            session.cycles,
            session.stats,
            self.config.settings.clone(),
            session.last_batch,
        );
        info!(
            cycles = session.cycles,
            total = session.stats.total,
            "monitoring session stopped"
        );
        Ok(report)
    }

    /// Starts a fresh session, ending the current one if there is one.
    pub fn restart(&mut self, now: Instant) -> Result<Option<SessionReport>> {
        let previous = match self.active {
            Some(_) => Some(self.stop(now)?),
            None => None,
        };
        self.start(now)?;
        Ok(previous)
    }

    /// Flips monitoring on or off. Returns the report when this turned it off.
    pub fn toggle(&mut self, now: Instant) -> Result<Option<SessionReport>> {
        if self.active.is_some() {
            self.stop(now).map(Some)
        } else {
            self.start(now).map(|_| None)
        }
    }

    /// Settings can only be changed while monitoring is off.
    pub fn update_settings(&mut self, settings: DetectionSettings) -> Result<()> {
        if self.active.is_some() {
            warn!("settings change rejected while monitoring is active");
            return Err(MonitorError::SessionActive);
        }
        settings.validate()?;
        self.config.settings = settings;
        info!("detection settings updated");
        Ok(())
    }

    /// One refresh cycle: a new traffic batch plus an accumulator tick.
    /// `None` while idle.
    pub fn cycle(&mut self, now: Instant) -> Option<Frame> {
        let session = self.active.as_mut()?;

        let batch = self.generator.generate_batch();
        let connections = self.generator.active_connections();
        let series = self.generator.packet_series(self.config.series_points);
        let summary = TrafficSummary::from_batch(&batch, connections);

        session.stats = session.accumulator.tick(&session.stats, now);
        session.cycles += 1;
        session.last_batch = batch.iter().map(TrafficSampleDTO::from).collect();

        debug!(
            cycle = session.cycles,
            packets = summary.total_packets,
            threats = summary.active_threats,
            "cycle generated"
        );

        Some(Frame {
            cycle: session.cycles,
            monitoring_since: session.started_at,
            batch,
            summary,
            series,
            stats: session.stats,
        })
    }
}
