//! The only state shared between the detection thread and the control tick.
//!
//! The detection thread publishes one measurement per processed frame; the
//! control tick reads whatever was published last. Offset, actuable flag and
//! frame number live behind one mutex so a reader always sees a triple that was
//! written together.

use std::sync::{
    atomic::{AtomicU8, Ordering},
    Mutex, MutexGuard, PoisonError,
};

use serde::Serialize;

use crate::types::OffsetMeasurement;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Snapshot {
    /// Last numeric offset. Kept across "no target" frames, so it is only
    /// meaningful while `actuable` is set.
    pub offset: f64,
    pub actuable: bool,
    /// Number of frames published so far, 0 before the first one.
    pub frame: u64,
}

impl Snapshot {
    /// The offset, or `None` when it must not be acted on.
    pub fn actuable_offset(&self) -> Option<f64> {
        self.actuable.then_some(self.offset)
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Snapshot {
            offset: 0.,
            actuable: false,
            frame: 0,
        }
    }
}

/// Which camera feeds the detection thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CameraSource {
    /// Peg camera. Detection only runs on this one.
    Primary,
    /// Rear camera, passed through to the driver display untouched.
    Secondary,
}

impl CameraSource {
    pub fn toggled(self) -> Self {
        match self {
            CameraSource::Primary => CameraSource::Secondary,
            CameraSource::Secondary => CameraSource::Primary,
        }
    }
}

#[derive(Debug, Default)]
pub struct MeasurementChannel {
    latest: Mutex<Snapshot>,
    source: AtomicU8,
}

impl MeasurementChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes the result of one frame and returns its frame number.
    pub fn publish(&self, measurement: OffsetMeasurement) -> u64 {
        let mut latest = self.lock();

        latest.frame += 1;
        match measurement {
            OffsetMeasurement::Target(offset) => {
                latest.offset = offset;
                latest.actuable = true;
            }
            OffsetMeasurement::NoTarget => latest.actuable = false,
        }

        latest.frame
    }

    pub fn snapshot(&self) -> Snapshot {
        *self.lock()
    }

    pub fn active_source(&self) -> CameraSource {
        match self.source.load(Ordering::Acquire) {
            0 => CameraSource::Primary,
            _ => CameraSource::Secondary,
        }
    }

    pub fn select_source(&self, source: CameraSource) {
        let value = match source {
            CameraSource::Primary => 0,
            CameraSource::Secondary => 1,
        };
        self.source.store(value, Ordering::Release);
    }

    pub fn toggle_source(&self) -> CameraSource {
        let previous = self.source.fetch_xor(1, Ordering::AcqRel);
        if previous == 0 {
            CameraSource::Secondary
        } else {
            CameraSource::Primary
        }
    }

    // Fields are plain data, so a poisoned snapshot is still whole.
    fn lock(&self) -> MutexGuard<'_, Snapshot> {
        self.latest.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
