pub mod domain {
    use std::fmt;
    use std::net::Ipv4Addr;

    use chrono::{DateTime, Local};
    use serde::Serialize;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub enum Protocol {
        Tcp,
        Udp,
        Icmp,
    }

    impl Protocol {
        pub const ALL: [Protocol; 3] = [Protocol::Tcp, Protocol::Udp, Protocol::Icmp];

        pub fn as_str(&self) -> &'static str {
            match self {
                Protocol::Tcp => "tcp",
                Protocol::Udp => "udp",
                Protocol::Icmp => "icmp",
            }
        }
    }

    impl fmt::Display for Protocol {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.pad(self.as_str())
        }
    }

    /// Traffic classes of the NSL-KDD style label set, plus DDoS.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum TrafficType {
        Normal,
        DoS,
        Probe,
        R2L,
        U2R,
        DDoS,
    }

    impl TrafficType {
        pub const ALL: [TrafficType; 6] = [
            TrafficType::Normal,
            TrafficType::DoS,
            TrafficType::Probe,
            TrafficType::R2L,
            TrafficType::U2R,
            TrafficType::DDoS,
        ];

        pub fn as_str(&self) -> &'static str {
            match self {
                TrafficType::Normal => "Normal",
                TrafficType::DoS => "DoS",
                TrafficType::Probe => "Probe",
                TrafficType::R2L => "R2L",
                TrafficType::U2R => "U2R",
                TrafficType::DDoS => "DDoS",
            }
        }
    }

    impl fmt::Display for TrafficType {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.pad(self.as_str())
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub enum ThreatLevel {
        Normal,
        Low,
        Medium,
        High,
    }

    impl ThreatLevel {
        pub const ELEVATED: [ThreatLevel; 3] =
            [ThreatLevel::Low, ThreatLevel::Medium, ThreatLevel::High];

        pub fn is_elevated(&self) -> bool {
            *self != ThreatLevel::Normal
        }

        pub fn as_str(&self) -> &'static str {
            match self {
                ThreatLevel::Normal => "NORMAL",
                ThreatLevel::Low => "LOW",
                ThreatLevel::Medium => "MEDIUM",
                ThreatLevel::High => "HIGH",
            }
        }
    }

    impl fmt::Display for ThreatLevel {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.pad(self.as_str())
        }
    }

    /// One synthetic network event. Samples are independent of each other.
    #[derive(Debug, Clone, PartialEq)]
    pub struct TrafficSample {
        pub timestamp: DateTime<Local>,
        pub source: Ipv4Addr,
        pub destination: Ipv4Addr,
        pub protocol: Protocol,
        pub packet_size: u16,
        pub traffic_type: TrafficType,
        pub threat_level: ThreatLevel,
    }

    /// Per-session threat counters. Only grows while the session is active.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
    pub struct ThreatStatistics {
        pub total: u64,
        pub high_severity: u64,
        pub blocked_ips: u64,
        pub false_positives: u64,
    }

    /// Deltas drawn for a single accumulator tick.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct ThreatIncrement {
        pub total: u64,
        pub high_severity: u64,
        pub blocked_ips: u64,
        pub false_positives: u64,
    }

    impl ThreatStatistics {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn apply(&mut self, inc: &ThreatIncrement) {
            self.total = self.total.saturating_add(inc.total);
            self.high_severity = self.high_severity.saturating_add(inc.high_severity);
            self.blocked_ips = self.blocked_ips.saturating_add(inc.blocked_ips);
            self.false_positives = self.false_positives.saturating_add(inc.false_positives);
        }

        /// True when no counter in `self` is below its value in `earlier`.
        pub fn dominates(&self, earlier: &ThreatStatistics) -> bool {
            self.total >= earlier.total
                && self.high_severity >= earlier.high_severity
                && self.blocked_ips >= earlier.blocked_ips
                && self.false_positives >= earlier.false_positives
        }
    }
}

pub mod dto {
    use serde::Serialize;

    use super::domain::TrafficSample;

    #[derive(Debug, Serialize, Clone, PartialEq)]
    pub struct TrafficSampleDTO {
        pub timestamp: String,
        pub src_ip: String,
        pub dst_ip: String,
        pub protocol: String,
        pub packet_size: u16,
        pub traffic_type: String,
        pub threat_level: String,
    }

    impl From<&TrafficSample> for TrafficSampleDTO {
        fn from(sample: &TrafficSample) -> Self {
            TrafficSampleDTO {
                timestamp: sample.timestamp.format("%H:%M:%S").to_string(),
                src_ip: sample.source.to_string(),
                dst_ip: sample.destination.to_string(),
                protocol: sample.protocol.to_string(),
                packet_size: sample.packet_size,
                traffic_type: sample.traffic_type.to_string(),
                threat_level: sample.threat_level.to_string(),
            }
        }
    }
}
