use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::config::DetectionSettings;
use crate::error::Result;
use crate::metrics::ModelMetrics;
use crate::models::domain::ThreatStatistics;
use crate::models::dto::TrafficSampleDTO;

/// Snapshot of a monitoring session, taken when it stops.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub started_at: String,
    pub duration_secs: f64,
    pub cycles: u64,
    pub stats: ThreatStatistics,
    pub settings: DetectionSettings,
    pub model: ModelMetrics,
    /// Samples of the last refresh before the session stopped.
    pub last_batch: Vec<TrafficSampleDTO>,
}

impl SessionReport {
    pub fn new(
        started_at: DateTime<Local>,
        duration: Duration,
        cycles: u64,
        stats: ThreatStatistics,
        settings: DetectionSettings,
        last_batch: Vec<TrafficSampleDTO>,
    ) -> Self {
        Self {
            started_at: started_at.to_rfc3339(),
            duration_secs: duration.as_secs_f64(),
            cycles,
            stats,
            settings,
            model: ModelMetrics::DEMO,
            last_batch,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
