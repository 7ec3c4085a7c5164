// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/rayshed

//! Local command socket
//!
//! Line-oriented request/response protocol over a Unix domain socket for
//! external tooling: query status, flip runtime toggles, forward firmware
//! verbs to the device. Connections are served strictly one at a time and
//! each carries exactly one request, so toggle mutations are naturally
//! serialized. The only state shared with the dispatch loop is the toggle
//! store and a read-only sensor snapshot.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::RwLock;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixListener;
use tracing::{info, warn};

use crate::config::Config;
use crate::telemetry::{DispatchStats, RuntimeToggleStore, SensorState};
use crate::transport::Transport;

/// Prefix for forwarding a firmware verb to the device.
const DEVICE_PREFIX: &str = "device ";

/// Shared handles the command server answers requests from.
#[derive(Clone)]
pub struct CommandContext {
    /// Merged startup configuration (for the status report).
    pub config: Arc<Config>,
    /// Runtime flags, shared with the dispatch loop.
    pub toggles: Arc<RuntimeToggleStore>,
    /// Detector link, for enable/disable and verb forwarding.
    pub transport: Arc<dyn Transport>,
    /// Dispatched-event counters.
    pub stats: Arc<DispatchStats>,
    /// Latest sensor snapshot, read-only here.
    pub snapshot: Arc<RwLock<SensorState>>,
}

/// Run the command server until the process exits.
pub async fn run(socket_path: &Path, ctx: CommandContext) -> Result<()> {
    // A stale socket file from a previous run would make bind fail.
    if socket_path.exists() {
        let _ = std::fs::remove_file(socket_path);
    }

    let listener = UnixListener::bind(socket_path)?;
    info!("Listening for commands on {:?}", socket_path);

    loop {
        // An accept failure must not retire the server; skip the connection.
        let mut conn = match listener.accept().await {
            Ok((conn, _)) => conn,
            Err(e) => {
                warn!("Error accepting command connection: {}", e);
                continue;
            }
        };

        let mut buf = [0u8; 1024];
        let n = match conn.read(&mut buf).await {
            Ok(0) => continue,
            Ok(n) => n,
            Err(e) => {
                warn!("Error reading client command: {}", e);
                continue;
            }
        };

        let cmd = String::from_utf8_lossy(&buf[..n]).trim().to_string();
        info!("Received command: {}", cmd);

        let response = handle_command(&ctx, &cmd);
        if let Err(e) = conn.write_all(response.as_bytes()).await {
            warn!("Error replying to client: {}", e);
        }
    }
}

/// Dispatch one command and build its reply.
///
/// Unrecognized commands get an empty reply; internal failures are reported
/// back to the caller as an error string rather than crashing anything.
pub fn handle_command(ctx: &CommandContext, cmd: &str) -> String {
    match cmd {
        "d" => format!("Debug:{}\n", ctx.toggles.toggle_debug()),
        "v" => format!("Vibration:{}\n", ctx.toggles.toggle_vibration()),
        "w" => format!("WeatherStation:{}\n", ctx.toggles.toggle_weather()),
        "c" => format!("Cosmics:{}\n", ctx.toggles.toggle_cosmics()),
        "n" => format!("Send:{}\n", ctx.toggles.toggle_publish()),
        "l" => format!("Log:{}\n", ctx.toggles.toggle_log()),
        "u" => {
            if ctx.transport.is_enabled() {
                ctx.transport.disable();
                "Device:disabled\n".to_string()
            } else {
                ctx.transport.enable();
                "Device:enabled\n".to_string()
            }
        }
        "s" => status_report(ctx),
        _ if cmd.starts_with(DEVICE_PREFIX) => {
            let verb = cmd[DEVICE_PREFIX.len()..].trim().to_uppercase();
            match ctx.transport.write(format!("{}\n", verb).as_bytes()) {
                Ok(()) => format!("{}\n", cmd),
                Err(e) => {
                    let msg = format!("Error processing client command: {}", e);
                    warn!("{}", msg);
                    msg
                }
            }
        }
        _ => String::new(),
    }
}

/// Fixed multi-section status report: hardware readings, then monitor and
/// runtime state.
fn status_report(ctx: &CommandContext) -> String {
    let s = ctx.snapshot.read().clone();
    let cfg = &ctx.config;
    let mut out = String::new();

    let _ = writeln!(out, "DETECTOR STATUS");
    let _ = writeln!(
        out,
        "Status........: uptime:{} counter_frequency:{} queue_size:{} missed_events:{}",
        s.timing.uptime, s.timing.counter_frequency, s.status.queue_size, s.status.missed_events
    );
    let _ = writeln!(
        out,
        "HardwareStatus: temp_status:{} baro_status:{} accel_status:{} mag_status:{} gps_status:{}",
        s.status.temp_status,
        s.status.baro_status,
        s.status.accel_status,
        s.status.mag_status,
        s.status.gps_status
    );
    let _ = writeln!(
        out,
        "Location......: latitude:{} longitude:{} altitude:{}",
        s.location.latitude, s.location.longitude, s.location.altitude
    );
    let _ = writeln!(
        out,
        "Accelerometer.: x:{} y:{} z:{}",
        s.accelerometer.x, s.accelerometer.y, s.accelerometer.z
    );
    let _ = writeln!(
        out,
        "Magnetometer..: x:{} y:{} z:{}",
        s.magnetometer.x, s.magnetometer.y, s.magnetometer.z
    );
    let _ = writeln!(
        out,
        "Barometer.....: temperature:{} pressure:{} altitude:{}",
        s.barometer.temperature, s.barometer.pressure, s.barometer.altitude
    );
    let _ = writeln!(
        out,
        "Humidity......: temperature:{} humidity:{}",
        s.temperature.temperature, s.temperature.humidity
    );
    let _ = writeln!(
        out,
        "Vibration.....: direction:{} count:{}",
        s.vibration.direction, s.vibration.count
    );

    let _ = writeln!(out, "MONITOR STATUS");
    let _ = writeln!(
        out,
        "Device........: {} Enabled:{}",
        cfg.device.path,
        ctx.transport.is_enabled()
    );
    let _ = writeln!(
        out,
        "Remote........: Host:{} Port:{} PublishFlag:{}",
        cfg.broker.host,
        cfg.broker.port,
        ctx.toggles.publish()
    );
    let _ = writeln!(
        out,
        "Vibration.....: Sent:{} Flag:{}",
        ctx.stats.vibrations(),
        ctx.toggles.vibration()
    );
    let _ = writeln!(
        out,
        "WeatherStation: Sent:{} Flag:{}",
        ctx.stats.weathers(),
        ctx.toggles.weather()
    );
    let _ = writeln!(
        out,
        "Cosmics.......: Sent:{} LogFlag:{}",
        ctx.stats.cosmics(),
        ctx.toggles.log()
    );
    let _ = writeln!(out, "Debug.........: {}", ctx.toggles.debug());

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct FakeTransport {
        enabled: AtomicBool,
        written: parking_lot::Mutex<Vec<Vec<u8>>>,
    }

    impl Transport for FakeTransport {
        fn read_line(&self) -> String {
            String::new()
        }

        fn write(&self, bytes: &[u8]) -> Result<()> {
            self.written.lock().push(bytes.to_vec());
            Ok(())
        }

        fn enable(&self) {
            self.enabled.store(true, Ordering::Relaxed);
        }

        fn disable(&self) {
            self.enabled.store(false, Ordering::Relaxed);
        }

        fn is_enabled(&self) -> bool {
            self.enabled.load(Ordering::Relaxed)
        }
    }

    fn context() -> (CommandContext, Arc<FakeTransport>) {
        let transport = Arc::new(FakeTransport::default());
        transport.enable();
        let ctx = CommandContext {
            config: Arc::new(Config::default()),
            toggles: Arc::new(RuntimeToggleStore::default()),
            transport: transport.clone(),
            stats: Arc::new(DispatchStats::new()),
            snapshot: Arc::new(RwLock::new(SensorState::default())),
        };
        (ctx, transport)
    }

    #[test]
    fn test_debug_toggles_each_time() {
        let (ctx, _) = context();

        assert_eq!(handle_command(&ctx, "d"), "Debug:true\n");
        assert_eq!(handle_command(&ctx, "d"), "Debug:false\n");
        assert_eq!(handle_command(&ctx, "d"), "Debug:true\n");
    }

    #[test]
    fn test_monitoring_toggles_report_new_value() {
        let (ctx, _) = context();

        assert_eq!(handle_command(&ctx, "v"), "Vibration:false\n");
        assert_eq!(handle_command(&ctx, "w"), "WeatherStation:false\n");
        assert_eq!(handle_command(&ctx, "c"), "Cosmics:false\n");
        assert_eq!(handle_command(&ctx, "n"), "Send:false\n");
        assert_eq!(handle_command(&ctx, "l"), "Log:false\n");
        assert!(!ctx.toggles.vibration());
        assert!(!ctx.toggles.publish());
    }

    #[test]
    fn test_device_toggle_flips_the_transport() {
        let (ctx, transport) = context();

        assert_eq!(handle_command(&ctx, "u"), "Device:disabled\n");
        assert!(!transport.is_enabled());
        assert_eq!(handle_command(&ctx, "u"), "Device:enabled\n");
        assert!(transport.is_enabled());
    }

    #[test]
    fn test_device_verb_is_uppercased_and_forwarded() {
        let (ctx, transport) = context();

        let reply = handle_command(&ctx, "device acld 5");
        assert_eq!(reply, "device acld 5\n");

        let written = transport.written.lock();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0], b"ACLD 5\n");
    }

    #[test]
    fn test_unknown_command_yields_empty_response() {
        let (ctx, _) = context();

        assert_eq!(handle_command(&ctx, "x"), "");
        assert_eq!(handle_command(&ctx, ""), "");
        assert_eq!(handle_command(&ctx, "status"), "");
    }

    #[tokio::test]
    async fn test_server_outlives_a_dead_connection() {
        use std::time::Duration;
        use tokio::net::UnixStream;

        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("cmd.sock");
        let (ctx, _) = context();

        let server_socket = socket.clone();
        tokio::spawn(async move { run(&server_socket, ctx).await });
        for _ in 0..100 {
            if socket.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        // A client that connects and goes away without sending anything
        // must not end the accept loop.
        drop(UnixStream::connect(&socket).await.unwrap());

        let mut conn = UnixStream::connect(&socket).await.unwrap();
        conn.write_all(b"d").await.unwrap();
        conn.shutdown().await.unwrap();

        let mut reply = String::new();
        conn.read_to_string(&mut reply).await.unwrap();
        assert_eq!(reply, "Debug:true\n");
    }

    #[test]
    fn test_status_report_has_both_sections() {
        let (ctx, _) = context();
        ctx.snapshot
            .write()
            .merge(r#"{"vibration": {"direction": "1", "count": "3"}}"#);

        let report = handle_command(&ctx, "s");

        assert!(report.contains("DETECTOR STATUS\n"));
        assert!(report.contains("MONITOR STATUS\n"));
        assert!(report.contains("Vibration.....: direction:1 count:3"));
        assert!(report.contains("Remote........: Host:localhost Port:1883 PublishFlag:true"));
        assert!(report.ends_with('\n'));
    }
}
