//! # Blinds Motion Binary
//!
//! Runs the motion engine and serves JSON-lines commands on stdin.
//!
//! # Usage
//!
//! ```bash
//! # Simulated coils, state kept in a scratch file
//! blinds_motion --config config/blinds.toml -s --state-file /tmp/state.bin
//!
//! # Real GPIO lines
//! blinds_motion --config /etc/blinds/blinds.toml --driver sysfs
//!
//! # Drive it
//! echo '{"op":"unsafe_move","steps":200}' | blinds_motion -s -v
//! ```

use blinds_common::config::{ConfigLoader, LogLevel};
use blinds_common::consts::{DEFAULT_CONFIG_PATH, SERVICE_NAME};
use blinds_common::motor::config::BlindsConfig;
use blinds_motion::driver_registry::DriverRegistry;
use blinds_motion::engine::MotionEngine;
use blinds_motion::gateway;
use blinds_motion::store::FsStore;
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Blinds motion service - stepper control with crash-safe position state
#[derive(Parser, Debug)]
#[command(name = "blinds_motion")]
#[command(version)]
#[command(about = "Stepper motion engine with crash-safe position persistence")]
#[command(long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Force simulation driver
    #[arg(short = 's', long)]
    simulate: bool,

    /// Coil driver to use instead of the configured one
    #[arg(short, long)]
    driver: Option<String>,

    /// Position record location instead of the configured one
    #[arg(long, value_name = "FILE")]
    state_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

enum Event {
    Line(String),
    Eof,
    Shutdown,
}

fn main() {
    if let Err(e) = run() {
        error!("{} startup failed: {}", SERVICE_NAME, e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loaded = BlindsConfig::load(&args.config);
    setup_tracing(&args, loaded.as_ref().ok().map(|c| c.shared.log_level));
    let mut config = loaded?;

    info!(
        "{} v{} starting ({})",
        SERVICE_NAME,
        env!("CARGO_PKG_VERSION"),
        config.shared.service_name
    );

    if args.simulate {
        info!("Simulation mode enabled");
        config.motor.driver = "simulation".to_string();
    } else if let Some(driver) = &args.driver {
        info!("Driver from CLI: {}", driver);
        config.motor.driver = driver.clone();
    }
    if let Some(state_file) = &args.state_file {
        config.storage.state_file = state_file.clone();
    }

    let registry = DriverRegistry::with_builtin();
    let mut engine = MotionEngine::from_config(&config, &registry, Box::new(FsStore::new()))?;
    let state = engine.status();
    info!(
        "Ready: max_steps={}, current_step={}",
        state.max_steps, state.current_step
    );

    let (events, rx) = mpsc::channel();

    let signal = events.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        let _ = signal.send(Event::Shutdown);
    })?;

    thread::Builder::new()
        .name("gateway-reader".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if events.send(Event::Line(line)).is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        warn!("stdin read failed: {}", e);
                        break;
                    }
                }
            }
            let _ = events.send(Event::Eof);
        })?;

    let mut stdout = io::stdout().lock();
    for event in rx {
        match event {
            Event::Line(line) if line.trim().is_empty() => continue,
            Event::Line(line) => {
                let response = gateway::handle_line(&engine, &line);
                writeln!(stdout, "{}", response)?;
                stdout.flush()?;
            }
            Event::Eof => {
                debug!("Input closed");
                break;
            }
            Event::Shutdown => break,
        }
    }

    if engine.is_moving() {
        info!("Waiting for move in flight to finish");
        while !engine.wait_idle(Duration::from_secs(1)) {
            debug!("Still moving");
        }
    }
    engine.shutdown();

    info!("{} shutdown complete", SERVICE_NAME);
    Ok(())
}

/// Setup tracing subscriber from CLI arguments and the configured level.
fn setup_tracing(args: &Args, configured: Option<LogLevel>) {
    let level = if args.verbose {
        LogLevel::Debug
    } else {
        configured.unwrap_or_default()
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_directive()));

    // Logs go to stderr; stdout carries gateway responses.
    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }
}
