use log::debug;

use crate::{
    channel::Snapshot,
    pid::{Gains, PidController},
};

/// Negative: a target right of center (positive offset) needs a negative
/// correction.
pub const ALIGNMENT_GAINS: Gains = Gains {
    kp: -0.01,
    ki: -0.0001,
    kd: 0.,
};

/// Pixels of error still considered lined up.
pub const ALIGNED_TOLERANCE: f64 = 3.;

/// Feeds the peg offset into a PID loop and exposes the correction.
///
/// Stepped by the control tick through [`AlignmentController::update`] with the
/// channel snapshot taken for that tick. Every `enable` after a disable starts
/// from a clean integrator; `restart` clears it unconditionally.
pub struct AlignmentController {
    pid: PidController,
}

impl Default for AlignmentController {
    fn default() -> Self {
        Self::new()
    }
}

impl AlignmentController {
    pub fn new() -> Self {
        Self::with_gains(ALIGNMENT_GAINS)
    }

    pub fn with_gains(gains: Gains) -> Self {
        AlignmentController {
            pid: PidController::new(gains),
        }
    }

    pub fn enable(&mut self) {
        if !self.pid.is_enabled() {
            debug!("alignment enabled");
            self.pid.reset();
            self.pid.enable();
        }
    }

    /// Enables with a cleared integrator, even if already running.
    pub fn restart(&mut self) {
        debug!("alignment restarted");
        self.pid.reset();
        self.pid.enable();
    }

    pub fn disable(&mut self) {
        if self.pid.is_enabled() {
            debug!("alignment disabled");
        }
        self.pid.disable();
    }

    pub fn is_enabled(&self) -> bool {
        self.pid.is_enabled()
    }

    pub fn set_setpoint(&mut self, setpoint: f64) {
        self.pid.set_setpoint(setpoint);
    }

    /// Steps the loop once on the snapshot's numeric offset, regardless of its
    /// actuable flag. Returns 0 while disabled.
    pub fn update(&mut self, vision: &Snapshot) -> f64 {
        let offset = vision.offset;
        self.pid.calculate(&|| offset)
    }

    pub fn output(&self) -> f64 {
        self.pid.output()
    }

    pub fn error(&self) -> f64 {
        self.pid.error()
    }

    pub fn is_aligned(&self) -> bool {
        self.error().abs() < ALIGNED_TOLERANCE
    }
}
