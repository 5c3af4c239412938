//! Bench simulation of the drivetrain, sensors and peg camera, for running the
//! control loop without a robot.
//!
//! Field frame: x to the right of the peg, y from the wall toward the robot's
//! starting position, peg at the origin. Heading is degrees clockwise from
//! facing the wall.

use serde::{Deserialize, Serialize};

use crate::{
    camera::{peg_strips, TapeStrip},
    sensors::{SensorSample, ULTRASONIC_MIN_RANGE, ULTRASONIC_SCALE, ULTRASONIC_ZERO_RAW},
    types::{DriveCommand, OffsetMeasurement},
};

/// Inches per second at full output.
pub const MAX_SPEED: f64 = 120.;
/// Degrees per second at full rotation.
pub const MAX_TURN_RATE: f64 = 180.;
/// Peg camera focal length in pixels.
pub const FOCAL_LENGTH: f64 = 280.;
/// Range at which the tape renders at scale 1.
pub const REFERENCE_RANGE: f64 = 60.;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimStart {
    /// Inches right of the peg.
    pub lateral: f64,
    /// Inches from the wall.
    pub range: f64,
    pub heading: f64,
}

impl Default for SimStart {
    fn default() -> Self {
        SimStart {
            lateral: 12.,
            range: 90.,
            heading: 0.,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedRobot {
    x: f64,
    range: f64,
    heading: f64,
    encoder: f64,
}

impl SimulatedRobot {
    pub fn new(start: SimStart) -> Self {
        SimulatedRobot {
            x: start.lateral,
            range: start.range,
            heading: start.heading,
            encoder: 0.,
        }
    }

    pub fn lateral(&self) -> f64 {
        self.x
    }

    pub fn range(&self) -> f64 {
        self.range
    }

    pub fn heading(&self) -> f64 {
        self.heading
    }

    /// Applies `command` scaled by `max_output` for `dt` seconds.
    ///
    /// Strafe follows the alignment sign: a positive command moves the robot
    /// left, which moves the peg right in the frame.
    pub fn step(&mut self, command: &DriveCommand, max_output: f64, dt: f64) {
        let forward = command.forward.clamp(-1., 1.) * max_output * MAX_SPEED * dt;
        let strafe = command.strafe.clamp(-1., 1.) * max_output * MAX_SPEED * dt;
        let rotation = command.rotation.clamp(-1., 1.) * max_output * MAX_TURN_RATE * dt;

        let theta = match command.field_heading {
            Some(_) => 0.,
            None => self.heading.to_radians(),
        };
        let (sin, cos) = theta.sin_cos();

        // Facing (sin, cos) toward the wall, left (-cos, sin).
        self.x += forward * sin - strafe * cos;
        self.range = (self.range - forward * cos - strafe * sin).max(0.);
        self.heading += rotation;
        self.encoder += forward;
    }

    pub fn sample(&self) -> SensorSample {
        let counts = (self.range - ULTRASONIC_MIN_RANGE).max(0.) / ULTRASONIC_SCALE;

        SensorSample {
            gyro_angle: self.heading,
            encoder_distance: self.encoder,
            ultrasonic_raw: ULTRASONIC_ZERO_RAW + counts,
        }
    }

    /// What an ideal detector would report for a frame `width` pixels wide.
    pub fn measurement(&self, width: u32) -> OffsetMeasurement {
        if self.range <= 0. {
            return OffsetMeasurement::NoTarget;
        }

        let bearing = (-self.x).atan2(self.range) - self.heading.to_radians();
        if bearing.cos() <= 0. {
            return OffsetMeasurement::NoTarget;
        }

        let offset = FOCAL_LENGTH * bearing.tan();
        if offset.abs() > width as f64 / 2. {
            return OffsetMeasurement::NoTarget;
        }

        OffsetMeasurement::Target(offset)
    }

    /// Tape strips as the peg camera would see them.
    pub fn scene(&self, width: u32, height: u32) -> Vec<TapeStrip> {
        match self.measurement(width) {
            OffsetMeasurement::Target(offset) => {
                let scale = (REFERENCE_RANGE / self.range).clamp(1., 2.5);
                peg_strips(width, height, offset, scale).to_vec()
            }
            OffsetMeasurement::NoTarget => Vec::new(),
        }
    }
}
