use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use clap::Parser;
use crossbeam_channel::unbounded;
use dotenv::dotenv;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use nid_monitor::commands::{self, Command, Outcome};
use nid_monitor::config::{MonitorConfig, RawConfig};
use nid_monitor::dashboard::{self, HelpView};
use nid_monitor::metrics::ModelMetrics;
use nid_monitor::report::SessionReport;
use nid_monitor::MonitoringSession;

#[derive(Parser, Debug)]
#[command(name = "nid-monitor", version, about = "Simulated network intrusion detection monitor")]
struct Cli {
    #[command(flatten)]
    config: RawConfig,

    /// Stop after this many refresh cycles
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    cycles: Option<u64>,

    /// Print a JSON session report whenever monitoring stops
    #[arg(long)]
    export: bool,

    /// Print the settings page before monitoring starts
    #[arg(long)]
    show_settings: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn limit_reached(done: u64, limit: Option<u64>) -> bool {
    limit.map_or(false, |limit| done >= limit)
}

fn print_report(report: &SessionReport, export: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", dashboard::render_standby());
    if export {
        println!("{}", report.to_json()?);
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    let cli = Cli::parse();
    init_tracing();

    let config = match MonitorConfig::try_from(cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();
    ctrlc::set_handler(move || running_clone.store(false, Ordering::SeqCst))?;

    let (tx, rx) = unbounded();
    thread::spawn(move || commands::read_commands(io::stdin().lock(), tx));

    let mut session = MonitoringSession::new(config.clone())?;
    if cli.show_settings {
        println!("{}", dashboard::render_settings(session.settings(), &ModelMetrics::DEMO));
    }
    print!("{}", HelpView);

    session.start(Instant::now())?;
    info!(
        poll_interval_ms = config.poll_interval.as_millis() as u64,
        "monitoring started, Ctrl-C or q to quit"
    );

    let mut interval = time::interval(config.poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut cycles = 0u64;

    'poll: while running.load(Ordering::SeqCst) {
        interval.tick().await;
        if !running.load(Ordering::SeqCst) {
            break;
        }

        for line in rx.try_iter() {
            let cmd = match Command::parse(&line) {
                Ok(Some(cmd)) => cmd,
                Ok(None) => continue,
                Err(e) => {
                    warn!("{}", e);
                    continue;
                }
            };
            match cmd.apply(&mut session, Instant::now()) {
                Ok(Outcome::Quit) => break 'poll,
                Ok(Outcome::Started) => info!("monitoring resumed"),
                Ok(Outcome::Stopped(report)) => print_report(&report, cli.export)?,
                Ok(Outcome::Restarted(previous)) => {
                    if let Some(report) = previous {
                        print_report(&report, cli.export)?;
                    }
                }
                Ok(Outcome::ShowSettings) | Ok(Outcome::SettingsUpdated) => {
                    println!("{}", dashboard::render_settings(session.settings(), &ModelMetrics::DEMO));
                }
                Ok(Outcome::Help) => print!("{}", HelpView),
                Err(e) => warn!("{}", e),
            }
        }

        if limit_reached(cycles, cli.cycles) {
            break;
        }
        if let Some(frame) = session.cycle(Instant::now()) {
            println!("{}", dashboard::render(&frame));
            cycles += 1;
        }
    }

    if session.is_monitoring() {
        let report = session.stop(Instant::now())?;
        print_report(&report, cli.export)?;
    }
    Ok(())
}
