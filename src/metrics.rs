use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::domain::{Protocol, TrafficSample};

/// Headline numbers for one refresh batch.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficSummary {
    pub total_packets: usize,
    pub active_threats: usize,
    pub connections: u32,
    /// Percentage of the batch with an elevated threat level.
    pub threat_rate: f64,
    pub protocol_counts: BTreeMap<Protocol, usize>,
}

impl TrafficSummary {
    pub fn from_batch(batch: &[TrafficSample], connections: u32) -> Self {
        let mut protocol_counts = BTreeMap::new();
        let mut active_threats = 0;
        for sample in batch {
            *protocol_counts.entry(sample.protocol).or_insert(0) += 1;
            if sample.threat_level.is_elevated() {
                active_threats += 1;
            }
        }

        let threat_rate = if batch.is_empty() {
            0.0
        } else {
            active_threats as f64 / batch.len() as f64 * 100.0
        };

        TrafficSummary {
            total_packets: batch.len(),
            active_threats,
            connections,
            threat_rate,
            protocol_counts,
        }
    }

    /// Share of the batch carried by `protocol`, in percent.
    pub fn protocol_share(&self, protocol: Protocol) -> f64 {
        if self.total_packets == 0 {
            return 0.0;
        }
        let count = self.protocol_counts.get(&protocol).copied().unwrap_or(0);
        count as f64 / self.total_packets as f64 * 100.0
    }
}

/// Fixed model-performance figures shown alongside the feed. Not computed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub features: u32,
    pub attack_types: u32,
}

impl ModelMetrics {
    pub const DEMO: ModelMetrics = ModelMetrics {
        accuracy: 99.68,
        precision: 98.45,
        recall: 97.23,
        f1_score: 97.84,
        features: 41,
        attack_types: 6,
    };

    /// Label/percentage pairs in display order.
    pub fn performance(&self) -> [(&'static str, f64); 4] {
        [
            ("Accuracy", self.accuracy),
            ("Precision", self.precision),
            ("Recall", self.recall),
            ("F1-Score", self.f1_score),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::{ThreatLevel, TrafficType};
    use chrono::Local;
    use std::net::Ipv4Addr;

    fn sample(protocol: Protocol, threat_level: ThreatLevel) -> TrafficSample {
        TrafficSample {
            timestamp: Local::now(),
            source: Ipv4Addr::new(192, 168, 1, 1),
            destination: Ipv4Addr::new(192, 168, 1, 2),
            protocol,
            packet_size: 100,
            traffic_type: TrafficType::Normal,
            threat_level,
        }
    }

    #[test]
    fn summary_counts_threats_and_protocols() {
        let batch = vec![
            sample(Protocol::Tcp, ThreatLevel::Normal),
            sample(Protocol::Tcp, ThreatLevel::High),
            sample(Protocol::Udp, ThreatLevel::Normal),
            sample(Protocol::Icmp, ThreatLevel::Low),
        ];
        let summary = TrafficSummary::from_batch(&batch, 40);

        assert_eq!(summary.total_packets, 4);
        assert_eq!(summary.active_threats, 2);
        assert_eq!(summary.connections, 40);
        assert!((summary.threat_rate - 50.0).abs() < 1e-9);
        assert_eq!(summary.protocol_counts[&Protocol::Tcp], 2);
        assert!((summary.protocol_share(Protocol::Udp) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn empty_batch_has_zero_rate() {
        let summary = TrafficSummary::from_batch(&[], 30);
        assert_eq!(summary.total_packets, 0);
        assert_eq!(summary.threat_rate, 0.0);
        assert_eq!(summary.protocol_share(Protocol::Tcp), 0.0);
    }

    #[test]
    fn demo_metrics_are_fixed() {
        let m = ModelMetrics::DEMO;
        assert_eq!(m.performance()[0], ("Accuracy", 99.68));
        assert_eq!(m.performance()[3], ("F1-Score", 97.84));
        assert_eq!((m.features, m.attack_types), (41, 6));
    }
}
