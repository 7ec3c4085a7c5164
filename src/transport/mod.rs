// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/rayshed

//! Serial transport to the detector hardware
//!
//! The dispatch loop consumes this as a blocking "read next line or empty on
//! failure" primitive. The port is opened lazily and reopened on the next
//! read after any failure, with a short fixed backoff, so a detector that is
//! unplugged and replugged recovers without intervention.

use std::io::{self, Read, Write};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use serialport::SerialPort;
use tracing::{info, warn};

use crate::config::DeviceConfig;
use crate::telemetry::RuntimeToggleStore;

/// Backoff after a failed open or read before the next attempt.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Byte/line source for the detector link.
pub trait Transport: Send + Sync {
    /// Read the next newline-delimited record.
    ///
    /// Returns an empty string when nothing usable is available this
    /// iteration: read timeout, device outage, or transport disabled.
    fn read_line(&self) -> String;

    /// Forward raw bytes (an uppercase firmware command) to the device.
    fn write(&self, bytes: &[u8]) -> Result<()>;

    /// Administratively enable the transport.
    fn enable(&self);

    /// Administratively disable the transport and close the port.
    fn disable(&self);

    /// Whether the transport is administratively enabled.
    fn is_enabled(&self) -> bool;
}

/// Serial-port transport to the detector microcontroller.
pub struct SerialTransport {
    path: String,
    baud_rate: u32,
    read_timeout: Duration,
    toggles: Arc<RuntimeToggleStore>,
    // Reader handle, held only by the dispatch thread.
    reader: Mutex<Option<Box<dyn SerialPort>>>,
    // Cloned handle for firmware commands from the command thread, so a
    // blocked read never stalls a write.
    writer: Mutex<Option<Box<dyn SerialPort>>>,
}

impl SerialTransport {
    /// Build a transport for the configured device. The port itself is not
    /// opened until the first read.
    pub fn new(config: &DeviceConfig, toggles: Arc<RuntimeToggleStore>) -> Self {
        Self {
            path: config.path.clone(),
            baud_rate: config.baud_rate,
            read_timeout: Duration::from_secs(config.read_timeout_secs),
            toggles,
            reader: Mutex::new(None),
            writer: Mutex::new(None),
        }
    }

    fn open(&self) -> serialport::Result<Box<dyn SerialPort>> {
        serialport::new(&self.path, self.baud_rate)
            .timeout(self.read_timeout)
            .open()
    }

    fn close(&self) {
        *self.reader.lock() = None;
        *self.writer.lock() = None;
    }
}

impl Transport for SerialTransport {
    fn read_line(&self) -> String {
        if !self.toggles.device() {
            if self.reader.lock().is_some() {
                info!("Serial port {} closed", self.path);
                self.close();
            }
            thread::sleep(RETRY_DELAY);
            return String::new();
        }

        let mut reader = self.reader.lock();
        if reader.is_none() {
            match self.open() {
                Ok(port) => {
                    match port.try_clone() {
                        Ok(clone) => *self.writer.lock() = Some(clone),
                        Err(e) => warn!("Couldn't clone serial handle for writes: {}", e),
                    }
                    info!("Serial port {} opened", self.path);
                    *reader = Some(port);
                }
                Err(e) => {
                    warn!("Couldn't open serial port {}: {}", self.path, e);
                    drop(reader);
                    thread::sleep(RETRY_DELAY);
                    return String::new();
                }
            }
        }

        let Some(port) = reader.as_mut() else {
            return String::new();
        };

        let mut line = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            match port.read(&mut byte) {
                Ok(0) => {
                    warn!("Serial input buffer empty");
                    drop(reader);
                    self.close();
                    return String::new();
                }
                Ok(_) if byte[0] == b'\n' => break,
                Ok(_) => line.push(byte[0]),
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                    // A partial line at timeout is dropped; only the latest
                    // value per field matters.
                    return String::new();
                }
                Err(e) => {
                    warn!("Error reading from serial port: {}", e);
                    drop(reader);
                    self.close();
                    thread::sleep(RETRY_DELAY);
                    return String::new();
                }
            }
        }

        String::from_utf8_lossy(&line).into_owned()
    }

    fn write(&self, bytes: &[u8]) -> Result<()> {
        let mut writer = self.writer.lock();
        match writer.as_mut() {
            Some(port) => {
                port.write_all(bytes)?;
                Ok(())
            }
            None => Err(anyhow!("serial port {} is not open", self.path)),
        }
    }

    fn enable(&self) {
        info!("Enabling serial port");
        self.toggles.set_device(true);
    }

    fn disable(&self) {
        info!("Disabling serial port");
        self.toggles.set_device(false);
        // The reader handle is dropped by the dispatch thread once it
        // observes the flag; the write handle can go now.
        *self.writer.lock() = None;
    }

    fn is_enabled(&self) -> bool {
        self.toggles.device()
    }
}
