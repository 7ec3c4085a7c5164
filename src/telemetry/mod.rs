//! Event-assembly and dispatch core
//!
//! The pipeline: the serial transport yields raw lines, [`SensorState`]
//! merges them into the latest per-category snapshot, the [`EventAssembler`]
//! decides when a coherent event is ready, and the [`DispatchLoop`] routes
//! finished events to the publisher and the local event log.

mod dispatch;
mod event;
mod identity;
mod sensors;
mod toggles;

pub use dispatch::{DispatchContext, DispatchLoop};
pub use event::{Event, EventAssembler};
pub use identity::{resolve_detector_id, IdentityError};
pub use sensors::{
    AxisReading, BarometerReading, LocationReading, SensorCategory, SensorState, StatusReading,
    TemperatureReading, TimingReading, VibrationReading,
};
pub use toggles::RuntimeToggleStore;

use std::sync::atomic::{AtomicU64, Ordering};

/// Allocates event sequence numbers: 1, 2, 3, ... for the process lifetime.
///
/// Single writer, owned by the dispatch thread. Never resets.
#[derive(Debug, Default)]
pub struct SequenceAllocator {
    last: u64,
}

impl SequenceAllocator {
    /// Start a fresh allocator; the first call to [`next`](Self::next)
    /// returns 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the next sequence number.
    pub fn next(&mut self) -> u64 {
        self.last += 1;
        self.last
    }
}

/// Per-category counters of dispatched events, for the status report.
#[derive(Debug, Default)]
pub struct DispatchStats {
    cosmics: AtomicU64,
    vibrations: AtomicU64,
    weathers: AtomicU64,
}

impl DispatchStats {
    /// Fresh zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one dispatched event of the given category.
    pub fn record(&self, category: SensorCategory) {
        match category {
            SensorCategory::Vibration => self.vibrations.fetch_add(1, Ordering::Relaxed),
            SensorCategory::Temperature => self.weathers.fetch_add(1, Ordering::Relaxed),
            SensorCategory::Cosmic => self.cosmics.fetch_add(1, Ordering::Relaxed),
            _ => 0,
        };
    }

    /// Cosmic events dispatched so far.
    pub fn cosmics(&self) -> u64 {
        self.cosmics.load(Ordering::Relaxed)
    }

    /// Vibration events dispatched so far.
    pub fn vibrations(&self) -> u64 {
        self.vibrations.load(Ordering::Relaxed)
    }

    /// Weather events dispatched so far.
    pub fn weathers(&self) -> u64 {
        self.weathers.load(Ordering::Relaxed)
    }
}
