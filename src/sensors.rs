use serde::{Deserialize, Serialize};

/// Raw analog counts at the sensor's minimum range. Anything below reads as
/// the minimum.
pub const ULTRASONIC_ZERO_RAW: f64 = 214.;

/// Inches per analog count above the dead zone.
pub const ULTRASONIC_SCALE: f64 = 0.125;

/// Inches reported at `ULTRASONIC_ZERO_RAW`.
pub const ULTRASONIC_MIN_RANGE: f64 = 10.5;

/// Inches per encoder pulse in 4x decoding. Negative because the encoder is
/// mounted facing backwards.
pub const ENCODER_DISTANCE_PER_PULSE: f64 = -0.0211600227;

/// Converts a raw ultrasonic reading to inches. Readings inside the dead zone
/// clamp to the minimum range.
pub fn ultrasonic_range(raw: f64) -> f64 {
    let counts = if raw < ULTRASONIC_ZERO_RAW {
        0.
    } else {
        raw - ULTRASONIC_ZERO_RAW
    };

    counts * ULTRASONIC_SCALE + ULTRASONIC_MIN_RANGE
}

pub fn encoder_distance(pulses: i64) -> f64 {
    pulses as f64 * ENCODER_DISTANCE_PER_PULSE
}

/// Values sampled by the sensor bindings at the start of a tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    /// Accumulated gyro angle in degrees, positive clockwise.
    pub gyro_angle: f64,
    /// Encoder distance in inches.
    pub encoder_distance: f64,
    /// Ultrasonic analog counts.
    pub ultrasonic_raw: f64,
}

/// Sensor values relative to the last re-zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SensorReadings {
    pub heading: f64,
    pub distance: f64,
    pub range: f64,
}

/// Re-zeroes the gyro and encoder in software, which is what a reset on the
/// hardware would do.
#[derive(Debug, Clone, Copy, Default)]
pub struct SensorBaseline {
    heading: f64,
    distance: f64,
}

impl SensorBaseline {
    pub fn zero_heading(&mut self, sample: &SensorSample) {
        self.heading = sample.gyro_angle;
    }

    pub fn zero_distance(&mut self, sample: &SensorSample) {
        self.distance = sample.encoder_distance;
    }

    pub fn zero_all(&mut self, sample: &SensorSample) {
        self.zero_heading(sample);
        self.zero_distance(sample);
    }

    pub fn readings(&self, sample: &SensorSample) -> SensorReadings {
        SensorReadings {
            heading: sample.gyro_angle - self.heading,
            distance: sample.encoder_distance - self.distance,
            range: ultrasonic_range(sample.ultrasonic_raw),
        }
    }
}
