pub mod accumulator;
pub mod commands;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod generator;
pub mod metrics;
pub mod models;
pub mod report;
pub mod session;

pub use error::{MonitorError, Result};
pub use session::{Frame, MonitoringSession, SessionState};
