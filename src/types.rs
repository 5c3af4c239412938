use image::RgbImage;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// A single camera frame. Pixels are stored in RGB order.
pub type Frame = RgbImage;

/// One retro-reflective blob found in a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetCandidate {
    pub center: Point2<f64>,
    pub radius: f64,
}

impl TargetCandidate {
    pub fn new(x: f64, y: f64, radius: f64) -> Self {
        TargetCandidate {
            center: Point2::new(x, y),
            radius,
        }
    }
}

/// A candidate together with the simplified polygon it was fitted to.
#[derive(Debug, Clone, PartialEq)]
pub struct TapeRegion {
    pub outline: Vec<Point2<f64>>,
    pub candidate: TargetCandidate,
}

/// The two tape strips flanking the peg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TapePair {
    pub primary: TargetCandidate,
    pub secondary: TargetCandidate,
}

impl TapePair {
    pub fn midpoint(&self) -> Point2<f64> {
        nalgebra::center(&self.primary.center, &self.secondary.center)
    }
}

/// Result of analyzing one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OffsetMeasurement {
    /// Horizontal pixel offset of the target midpoint from the frame center.
    /// Positive means the target is right of center.
    Target(f64),
    NoTarget,
}

impl OffsetMeasurement {
    pub fn offset(&self) -> Option<f64> {
        match self {
            OffsetMeasurement::Target(offset) => Some(*offset),
            OffsetMeasurement::NoTarget => None,
        }
    }
}

/// Velocity request handed to the drive command composer once per tick.
///
/// `forward` and `strafe` are in [-1, 1], `rotation` is positive clockwise.
/// When `field_heading` is set the translation is field-relative to that gyro
/// heading (degrees).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DriveCommand {
    pub forward: f64,
    pub strafe: f64,
    pub rotation: f64,
    pub field_heading: Option<f64>,
}

impl DriveCommand {
    pub fn neutral() -> Self {
        DriveCommand::default()
    }

    pub fn robot_relative(forward: f64, strafe: f64, rotation: f64) -> Self {
        DriveCommand {
            forward,
            strafe,
            rotation,
            field_heading: None,
        }
    }

    pub fn is_neutral(&self) -> bool {
        self.forward == 0. && self.strafe == 0. && self.rotation == 0.
    }
}
