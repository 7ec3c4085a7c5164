// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/rayshed

//! rayshed-ctl - command line control for a running RayShed daemon
//!
//! Talks the one-request-per-connection protocol over the daemon's Unix
//! socket: send a command, read the reply, print it.

use std::io::{Read, Write};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

/// RayShed control client
#[derive(Parser, Debug)]
#[command(name = "rayshed-ctl")]
#[command(version)]
#[command(about = "Control a running RayShed daemon")]
struct Args {
    /// Daemon command socket path
    #[arg(long, default_value = "/tmp/rayshed.sock")]
    socket: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the detector and monitor status report
    Status {
        /// Refresh the report once a second
        #[arg(long)]
        watch: bool,
    },
    /// Toggle debug diagnostics
    Debug,
    /// Toggle vibration event monitoring
    Vibration,
    /// Toggle weather event monitoring
    Weather,
    /// Toggle cosmic ray event monitoring
    Cosmics,
    /// Toggle event publication to the broker
    Publish,
    /// Toggle the local event log
    Log,
    /// Toggle the serial device on or off
    DeviceToggle,
    /// Forward a firmware command to the detector
    Device {
        /// Firmware verb, case-insensitive
        verb: String,

        /// Optional numeric argument
        value: Option<i64>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    match &args.command {
        Command::Status { watch: true } => loop {
            let report = send(&args.socket, "s")?;
            print!("\x1b[2J\x1b[H{}", report);
            thread::sleep(Duration::from_secs(1));
        },
        Command::Status { watch: false } => print!("{}", send(&args.socket, "s")?),
        Command::Debug => print!("{}", send(&args.socket, "d")?),
        Command::Vibration => print!("{}", send(&args.socket, "v")?),
        Command::Weather => print!("{}", send(&args.socket, "w")?),
        Command::Cosmics => print!("{}", send(&args.socket, "c")?),
        Command::Publish => print!("{}", send(&args.socket, "n")?),
        Command::Log => print!("{}", send(&args.socket, "l")?),
        Command::DeviceToggle => print!("{}", send(&args.socket, "u")?),
        Command::Device { verb, value } => {
            let cmd = match value {
                Some(v) => format!("device {} {}", verb, v),
                None => format!("device {}", verb),
            };
            print!("{}", send(&args.socket, &cmd)?);
        }
    }

    Ok(())
}

/// Send one command and collect the full reply.
fn send(socket: &Path, cmd: &str) -> Result<String> {
    let mut stream = UnixStream::connect(socket)
        .with_context(|| format!("Couldn't connect to {:?}, is the daemon running?", socket))?;

    stream.write_all(cmd.as_bytes())?;
    // Half-close so the daemon sees the end of the request.
    stream.shutdown(Shutdown::Write)?;

    let mut reply = String::new();
    stream.read_to_string(&mut reply)?;
    Ok(reply)
}
