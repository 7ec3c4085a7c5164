// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/rayshed

//! RayShed - Field Telemetry Bridge for Cosmic Ray Detectors
//!
//! A small daemon that sits between a cosmic ray detector's serial link and
//! the collection network: it reassembles the detector's line-oriented
//! telemetry into coherent events, publishes them to an MQTT broker, appends
//! them to a local event log, and exposes a Unix socket for runtime control.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      RayShed Daemon                      │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌───────────┐   ┌────────────────────┐  │
//! │  │  Serial   │ → │ Dispatch  │ → │ Publisher / Event  │  │
//! │  │ Transport │   │   Loop    │   │        Log         │  │
//! │  └───────────┘   └───────────┘   └────────────────────┘  │
//! │        ↑               ↑                                 │
//! │  ┌─────────────────────────────────────────────┐         │
//! │  │ Command Server (rayshed-ctl, Unix socket)   │         │
//! │  └─────────────────────────────────────────────┘         │
//! └──────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![allow(dead_code)]

pub mod command;
pub mod config;
pub mod eventlog;
pub mod publisher;
pub mod telemetry;
pub mod transport;

// Re-exports for convenience
pub use command::CommandContext;
pub use config::Config;
pub use eventlog::EventLog;
pub use publisher::{MqttPublisher, Publisher};
pub use telemetry::{
    DispatchContext, DispatchLoop, Event, EventAssembler, SensorCategory, SensorState,
};
pub use transport::{SerialTransport, Transport};

/// RayShed version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// RayShed name
pub const NAME: &str = "RayShed";
