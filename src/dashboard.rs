//! Plain-text rendering of the monitor. Each view is a `Display` wrapper so
//! it can be written straight to a terminal or collected into a `String`.

use std::fmt;

use crate::config::DetectionSettings;
use crate::metrics::ModelMetrics;
use crate::models::domain::Protocol;
use crate::models::dto::TrafficSampleDTO;
use crate::session::Frame;

const BAR_WIDTH: usize = 30;
const RULE: &str = "------------------------------------------------------------------------";

/// One refresh of an active session.
pub struct ActiveView<'a>(pub &'a Frame);

pub struct StandbyView;

/// System info and settings page.
pub struct SettingsView<'a> {
    pub settings: &'a DetectionSettings,
    pub model: &'a ModelMetrics,
}

/// Keys accepted on stdin while the monitor runs.
pub struct HelpView;

impl fmt::Display for ActiveView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let frame = self.0;
        let summary = &frame.summary;
        let stats = &frame.stats;

        writeln!(f, "NETWORK INTRUSION DETECTOR  [SYSTEM ACTIVE]  cycle {}", frame.cycle)?;
        writeln!(
            f,
            "monitoring since {}",
            frame.monitoring_since.format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(f, "{}", RULE)?;

        writeln!(
            f,
            "Total Packets: {:<6} Active Threats: {:<6} Connections: {:<6} Threat Rate: {:.1}%",
            summary.total_packets, summary.active_threats, summary.connections, summary.threat_rate
        )?;
        writeln!(
            f,
            "Session Threats: {:<6} High Severity: {:<6} Blocked IPs: {:<6} False Positives: {}",
            stats.total, stats.high_severity, stats.blocked_ips, stats.false_positives
        )?;
        writeln!(f, "{}", RULE)?;

        writeln!(f, "Protocol Distribution")?;
        for protocol in Protocol::ALL {
            let share = summary.protocol_share(protocol);
            writeln!(
                f,
                "  {:<5} {:<width$} {:>5.1}%",
                protocol,
                bar(share, 100.0),
                share,
                width = BAR_WIDTH
            )?;
        }

        writeln!(f, "Traffic Over Time")?;
        let peak = frame.series.iter().map(|p| p.packets).max().unwrap_or(0) as f64;
        for point in &frame.series {
            writeln!(
                f,
                "  {} {:<width$} {:>3}",
                point.minute.format("%H:%M"),
                bar(point.packets as f64, peak),
                point.packets,
                width = BAR_WIDTH
            )?;
        }
        writeln!(f, "{}", RULE)?;

        writeln!(f, "Recent Network Activity")?;
        writeln!(
            f,
            "  {:<9} {:<15} {:<15} {:<5} {:>5} {:<7} {}",
            "time", "src_ip", "dst_ip", "proto", "size", "type", "threat"
        )?;
        for sample in &frame.batch {
            let row = TrafficSampleDTO::from(sample);
            writeln!(
                f,
                "  {:<9} {:<15} {:<15} {:<5} {:>5} {:<7} {}",
                row.timestamp,
                row.src_ip,
                row.dst_ip,
                row.protocol,
                row.packet_size,
                row.traffic_type,
                row.threat_level
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for StandbyView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "NETWORK INTRUSION DETECTOR  [SYSTEM STANDBY]")?;
        writeln!(f, "Monitoring disabled. Start monitoring to begin real-time analysis.")
    }
}

impl fmt::Display for SettingsView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let settings = self.settings;
        writeln!(f, "System Configuration")?;
        writeln!(f, "  Detection Sensitivity: {:.2}", settings.sensitivity)?;
        writeln!(
            f,
            "  Auto-block High-Risk IPs: {}",
            if settings.auto_block { "on" } else { "off" }
        )?;
        writeln!(f, "  Alert Email: {}", settings.alert_email)?;
        writeln!(f, "Model Performance")?;
        for (label, value) in self.model.performance() {
            writeln!(f, "  {}: {:.2}%", label, value)?;
        }
        writeln!(f, "  Features: {}", self.model.features)?;
        writeln!(f, "  Attack Types: {}", self.model.attack_types)
    }
}

impl fmt::Display for HelpView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Commands (type and press Enter):")?;
        writeln!(f, "  s                      start / stop monitoring")?;
        writeln!(f, "  r                      restart the session")?;
        writeln!(f, "  c                      show settings and model performance")?;
        writeln!(f, "  sensitivity <0.1-1.0>  set detection sensitivity (monitoring off)")?;
        writeln!(f, "  autoblock <on|off>     toggle auto-blocking (monitoring off)")?;
        writeln!(f, "  email <address>        set the alert email (monitoring off)")?;
        writeln!(f, "  q                      quit")
    }
}

pub fn render(frame: &Frame) -> String {
    ActiveView(frame).to_string()
}

pub fn render_standby() -> String {
    StandbyView.to_string()
}

pub fn render_settings(settings: &DetectionSettings, model: &ModelMetrics) -> String {
    SettingsView { settings, model }.to_string()
}

fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 {
        return String::new();
    }
    let filled = ((value / max) * BAR_WIDTH as f64).round() as usize;
    "#".repeat(filled.min(BAR_WIDTH))
}
