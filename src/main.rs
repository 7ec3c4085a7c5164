// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/rayshed

//! RayShed daemon entry point
//!
//! Wires the serial transport, dispatch loop, broker publisher, event log
//! and command server together and runs until interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use parking_lot::RwLock;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use rayshed::command::{self, CommandContext};
use rayshed::config::Config;
use rayshed::eventlog::EventLog;
use rayshed::publisher::{MqttPublisher, Publisher};
use rayshed::telemetry::{
    resolve_detector_id, DispatchContext, DispatchLoop, DispatchStats, EventAssembler,
    RuntimeToggleStore, SensorState,
};
use rayshed::transport::SerialTransport;
use rayshed::VERSION;

/// RayShed - Field Telemetry Bridge for Cosmic Ray Detectors
#[derive(Parser, Debug)]
#[command(name = "rayshed")]
#[command(author = "RayShed Project")]
#[command(version = VERSION)]
#[command(about = "Cosmic ray detector telemetry bridge")]
struct Args {
    /// Configuration file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug diagnostics
    #[arg(short, long)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long)]
    trace: bool,

    /// Serial device path
    #[arg(short = 'u', long)]
    device: Option<String>,

    /// Broker host
    #[arg(short = 'i', long)]
    broker: Option<String>,

    /// Broker port
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Broker username
    #[arg(short = 'a', long)]
    username: Option<String>,

    /// Broker password
    #[arg(short = 'b', long)]
    password: Option<String>,

    /// Start with event publication off
    #[arg(short = 'n', long)]
    no_publish: bool,

    /// Start with the local event log off
    #[arg(short = 'l', long)]
    no_log: bool,

    /// Start with vibration monitoring off
    #[arg(short = 'v', long)]
    no_vibration: bool,

    /// Start with weather monitoring off
    #[arg(short = 'w', long)]
    no_weather: bool,

    /// Start with cosmic ray monitoring off
    #[arg(short = 'c', long)]
    no_cosmics: bool,

    /// Command socket path
    #[arg(long)]
    socket: Option<PathBuf>,

    /// Data output directory
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.trace {
        Level::TRACE
    } else if args.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(args.debug)
        .with_line_number(args.debug)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("RayShed v{} - cosmic ray detector telemetry bridge", VERSION);

    // Load or create configuration
    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_create(&config_path)?;
    apply_overrides(&mut config, &args);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config))
}

/// Fold command line flags into the loaded configuration. Flags win.
fn apply_overrides(config: &mut Config, args: &Args) {
    if args.debug {
        config.debug = true;
    }
    if let Some(device) = &args.device {
        config.device.path = device.clone();
    }
    if let Some(broker) = &args.broker {
        config.broker.host = broker.clone();
    }
    if let Some(port) = args.port {
        config.broker.port = port;
    }
    if let Some(username) = &args.username {
        config.broker.username = Some(username.clone());
    }
    if let Some(password) = &args.password {
        config.broker.password = Some(password.clone());
    }
    if args.no_publish {
        config.broker.enabled = false;
    }
    if args.no_log {
        config.logging.enabled = false;
    }
    if args.no_vibration {
        config.monitoring.vibration = false;
    }
    if args.no_weather {
        config.monitoring.weather = false;
    }
    if args.no_cosmics {
        config.monitoring.cosmics = false;
    }
    if let Some(socket) = &args.socket {
        config.command.socket = socket.clone();
    }
    if let Some(data_dir) = &args.data_dir {
        config.data_dir = data_dir.clone();
    }
}

async fn run(config: Config) -> Result<()> {
    // Identity and broker failures here are fatal: without either the
    // daemon cannot do anything useful.
    let detector_id = resolve_detector_id().context("Couldn't determine the detector identity")?;
    info!("Detector identity: {}", detector_id);

    let publisher: Arc<dyn Publisher> = Arc::new(MqttPublisher::connect(&config.broker).await?);
    let event_log = Arc::new(EventLog::open(&config.logging.event_log)?);

    let config = Arc::new(config);
    let toggles = Arc::new(RuntimeToggleStore::from_config(&config));
    let stats = Arc::new(DispatchStats::new());
    let snapshot = Arc::new(RwLock::new(SensorState::default()));
    let transport = Arc::new(SerialTransport::new(&config.device, toggles.clone()));

    let assembler = EventAssembler::new(detector_id);
    let mut dispatch = DispatchLoop::spawn(
        assembler,
        DispatchContext {
            transport: transport.clone(),
            publisher: publisher.clone(),
            event_log,
            toggles: toggles.clone(),
            stats: stats.clone(),
            snapshot: snapshot.clone(),
        },
    )?;

    let command_ctx = CommandContext {
        config: config.clone(),
        toggles,
        transport,
        stats,
        snapshot,
    };
    let socket_path = config.command.socket.clone();
    tokio::spawn(async move {
        if let Err(e) = command::run(&socket_path, command_ctx).await {
            tracing::error!("Command server failed: {}", e);
        }
    });

    info!("RayShed running, press Ctrl+C to shut down");
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received, stopping dispatch");
    tokio::task::spawn_blocking(move || dispatch.stop()).await?;
    publisher.close();

    info!("RayShed shutdown complete");
    Ok(())
}
