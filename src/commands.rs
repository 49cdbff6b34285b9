//! Operator commands typed on stdin while the monitor runs: the start/stop
//! switch, restart, and the settings page edits.

use std::io::BufRead;
use std::time::Instant;

use crossbeam_channel::Sender;
use tracing::{debug, warn};

use crate::error::{MonitorError, Result};
use crate::report::SessionReport;
use crate::session::MonitoringSession;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Toggle,
    Restart,
    ShowSettings,
    Sensitivity(f64),
    AutoBlock(bool),
    Email(String),
    Help,
    Quit,
}

/// What applying a command did, for the caller to display.
#[derive(Debug)]
pub enum Outcome {
    Started,
    Stopped(SessionReport),
    Restarted(Option<SessionReport>),
    ShowSettings,
    SettingsUpdated,
    Help,
    Quit,
}

impl Command {
    /// Blank lines parse to `None`.
    pub fn parse(line: &str) -> Result<Option<Command>> {
        let mut words = line.split_whitespace();
        let head = match words.next() {
            Some(head) => head.to_ascii_lowercase(),
            None => return Ok(None),
        };
        let arg = words.next();

        let cmd = match (head.as_str(), arg) {
            ("s" | "start" | "stop", None) => Command::Toggle,
            ("r" | "restart", None) => Command::Restart,
            ("c" | "settings", None) => Command::ShowSettings,
            ("h" | "help" | "?", None) => Command::Help,
            ("q" | "quit" | "exit", None) => Command::Quit,
            ("sensitivity", Some(value)) => {
                let value = value.parse::<f64>().map_err(|_| {
                    MonitorError::Command(format!("sensitivity is not a number: {}", value))
                })?;
                Command::Sensitivity(value)
            }
            ("autoblock", Some(value)) => match value.to_ascii_lowercase().as_str() {
                "on" | "true" | "yes" => Command::AutoBlock(true),
                "off" | "false" | "no" => Command::AutoBlock(false),
                _ => {
                    return Err(MonitorError::Command(format!(
                        "autoblock takes on or off, got {}",
                        value
                    )))
                }
            },
            ("email", Some(value)) => Command::Email(value.to_string()),
            _ => return Err(MonitorError::Command(format!("unknown command: {}", line.trim()))),
        };

        if words.next().is_some() {
            return Err(MonitorError::Command(format!("too many arguments: {}", line.trim())));
        }
        Ok(Some(cmd))
    }

    pub fn apply(self, session: &mut MonitoringSession, now: Instant) -> Result<Outcome> {
        match self {
            Command::Toggle => Ok(match session.toggle(now)? {
                Some(report) => Outcome::Stopped(report),
                None => Outcome::Started,
            }),
            Command::Restart => session.restart(now).map(Outcome::Restarted),
            Command::ShowSettings => Ok(Outcome::ShowSettings),
            Command::Help => Ok(Outcome::Help),
            Command::Quit => Ok(Outcome::Quit),
            Command::Sensitivity(sensitivity) => {
                let mut settings = session.settings().clone();
                settings.sensitivity = sensitivity;
                session.update_settings(settings).map(|_| Outcome::SettingsUpdated)
            }
            Command::AutoBlock(auto_block) => {
                let mut settings = session.settings().clone();
                settings.auto_block = auto_block;
                session.update_settings(settings).map(|_| Outcome::SettingsUpdated)
            }
            Command::Email(alert_email) => {
                let mut settings = session.settings().clone();
                settings.alert_email = alert_email;
                session.update_settings(settings).map(|_| Outcome::SettingsUpdated)
            }
        }
    }
}

/// Forwards lines from `reader` until EOF or until the receiver is gone.
pub fn read_commands<R: BufRead>(reader: R, sender: Sender<String>) {
    for line in reader.lines() {
        match line {
            Ok(line) => {
                if sender.send(line).is_err() {
                    debug!("command receiver dropped, reader exiting");
                    return;
                }
            }
            Err(e) => {
                warn!("failed to read command input: {}", e);
                return;
            }
        }
    }
}
