use std::ops::RangeInclusive;

/// Where the controller reads its process variable from.
pub trait PidSource {
    fn pid_get(&self) -> f64;
}

impl<F: Fn() -> f64> PidSource for F {
    fn pid_get(&self) -> f64 {
        self()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

/// Discrete PID controller stepped once per control tick.
///
/// Error is `measurement - setpoint`, so gains carry the sign of the
/// correction. The integral is clamped so that `ki * integral` never leaves the
/// output range. While disabled `calculate` leaves the state untouched and the
/// output reads zero. Disabling does not clear the integral; call `reset` for
/// that.
#[derive(Debug, Clone)]
pub struct PidController {
    gains: Gains,
    output_range: RangeInclusive<f64>,
    setpoint: f64,
    enabled: bool,
    error: f64,
    prev_error: Option<f64>,
    integral: f64,
    output: f64,
}

impl PidController {
    pub fn new(gains: Gains) -> Self {
        PidController {
            gains,
            output_range: -1.0..=1.0,
            setpoint: 0.,
            enabled: false,
            error: 0.,
            prev_error: None,
            integral: 0.,
            output: 0.,
        }
    }

    pub fn with_output_range(mut self, range: RangeInclusive<f64>) -> Self {
        self.output_range = range;
        self
    }

    pub fn gains(&self) -> Gains {
        self.gains
    }

    pub fn set_setpoint(&mut self, setpoint: f64) {
        self.setpoint = setpoint;
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
        self.output = 0.;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Clears integral, derivative history and output.
    pub fn reset(&mut self) {
        self.error = 0.;
        self.prev_error = None;
        self.integral = 0.;
        self.output = 0.;
    }

    /// Advances one step with the current source value.
    pub fn calculate<S: PidSource + ?Sized>(&mut self, source: &S) -> f64 {
        if !self.enabled {
            return 0.;
        }

        let Gains { kp, ki, kd } = self.gains;
        let (min, max) = (*self.output_range.start(), *self.output_range.end());

        self.error = source.pid_get() - self.setpoint;

        if ki != 0. {
            let (a, b) = (min / ki, max / ki);
            self.integral = (self.integral + self.error).clamp(a.min(b), a.max(b));
        }

        let derivative = self.prev_error.map_or(0., |prev| self.error - prev);
        self.prev_error = Some(self.error);

        self.output = (kp * self.error + ki * self.integral + kd * derivative).clamp(min, max);
        self.output
    }

    pub fn output(&self) -> f64 {
        if self.enabled {
            self.output
        } else {
            0.
        }
    }

    /// Error from the last step.
    pub fn error(&self) -> f64 {
        self.error
    }
}
