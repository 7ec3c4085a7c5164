// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/rayshed

//! Dispatch loop
//!
//! The continuously running control loop: pull one line from the transport,
//! merge it into the sensor snapshot, assemble an event if one is due, and
//! route it to the publisher and/or event log according to the toggles in
//! force at dispatch time. A decode error or transport hiccup never ends the
//! loop; only an explicit stop does.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::Result;
use parking_lot::RwLock;
use tracing::{debug, error, info, warn};

use crate::eventlog::EventLog;
use crate::publisher::Publisher;
use crate::transport::Transport;

use super::event::{Event, EventAssembler};
use super::sensors::{SensorCategory, SensorState};
use super::toggles::RuntimeToggleStore;
use super::DispatchStats;

/// Collaborators and shared state the dispatch thread runs against.
pub struct DispatchContext {
    /// Line source from the detector hardware.
    pub transport: Arc<dyn Transport>,
    /// Downstream message-bus client.
    pub publisher: Arc<dyn Publisher>,
    /// Local event log.
    pub event_log: Arc<EventLog>,
    /// Runtime flags, shared with the command server.
    pub toggles: Arc<RuntimeToggleStore>,
    /// Dispatched-event counters, shared with the command server.
    pub stats: Arc<DispatchStats>,
    /// Read-only snapshot of the latest sensor state for the status report.
    pub snapshot: Arc<RwLock<SensorState>>,
}

/// Handle to the running dispatch thread.
pub struct DispatchLoop {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl DispatchLoop {
    /// Spawn the dispatch thread. Failing to spawn is the only fatal error
    /// on this path.
    pub fn spawn(assembler: EventAssembler, ctx: DispatchContext) -> Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();

        let handle = thread::Builder::new()
            .name("rayshed-dispatch".to_string())
            .spawn(move || run(assembler, ctx, flag))?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Request a cooperative stop and block until the thread has exited.
    ///
    /// The loop observes the flag at the top of its next iteration, so this
    /// blocks for at most one in-flight transport read timeout.
    pub fn stop(&mut self) {
        info!("Stopping dispatch loop");
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Dispatch thread panicked");
            }
        }
    }
}

impl Drop for DispatchLoop {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.stop();
        }
    }
}

fn run(mut assembler: EventAssembler, ctx: DispatchContext, stop: Arc<AtomicBool>) {
    info!("Dispatch loop running");
    let mut state = SensorState::default();

    while !stop.load(Ordering::Relaxed) {
        let line = ctx.transport.read_line();
        if line.is_empty() {
            // Transient outage or disabled transport; nothing this iteration.
            continue;
        }

        let Some(category) = state.merge(&line) else {
            continue;
        };
        *ctx.snapshot.write() = state.clone();

        match assembler.maybe_build(category, &ctx.toggles, &state) {
            Some(event) => {
                ctx.stats.record(category);
                match category {
                    SensorCategory::Vibration => info!("Vibration event #{}", event.sequence),
                    SensorCategory::Temperature => info!("Weather event #{}", event.sequence),
                    SensorCategory::Cosmic => info!("Cosmic event #{}", event.sequence),
                    _ => {}
                }
                dispatch_event(&ctx, &event);
            }
            None => {
                if ctx.toggles.debug() {
                    debug!("Background update: {}", line.trim_end());
                }
            }
        }
    }

    info!("Dispatch loop exited");
}

fn dispatch_event(ctx: &DispatchContext, event: &Event) {
    let payload = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to serialize event #{}: {}", event.sequence, e);
            return;
        }
    };

    // Both routes are independent; the flags are read here, at dispatch
    // time, so a toggle flipped mid-stream applies to the very next event.
    if ctx.toggles.publish() {
        ctx.publisher.publish(&payload);
    }
    if ctx.toggles.log() {
        ctx.event_log.record(&payload);
    }
}
