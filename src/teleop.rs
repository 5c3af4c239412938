//! Driver-controlled operation: mecanum drive with optional peg alignment,
//! winch pulses and shooter power.

use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    alignment::AlignmentController,
    autonomous::KP_GYRO,
    channel::Snapshot,
    input::{deadband, EdgeDetector, Toggle},
    sensors::SensorReadings,
    status::StatusLights,
    types::DriveCommand,
};

pub const STRAFE_DEADBAND: f64 = 0.15;
pub const FORWARD_DEADBAND: f64 = 0.1;
pub const TWIST_DEADBAND: f64 = 0.1;

pub const WINCH_PULSE_TICKS: u32 = 40;
pub const WINCH_MEDIUM: f64 = -0.3;
pub const WINCH_FAST: f64 = -0.7;
pub const WINCH_SLOW: f64 = -0.2;

pub const SHOOTER_TRIGGER_THRESHOLD: f64 = 0.8;
pub const SHOOTER_DEFAULT_POWER: f64 = 0.6;
pub const SHOOTER_POWER_STEP: f64 = 0.1;

/// Everything read from the two driver joysticks in one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverControls {
    pub x: f64,
    pub y: f64,
    pub twist: f64,
    /// Throttle slider, -1 at full speed and 1 at stop.
    pub throttle: f64,
    pub align: bool,
    pub reset_gyro: bool,
    pub toggle_camera: bool,
    pub toggle_drive_mode: bool,

    pub winch_medium: bool,
    pub winch_fast: bool,
    pub winch_slow: bool,
    pub shooter_trigger: f64,
    pub shooter_power_up: bool,
    pub shooter_power_down: bool,
    pub shooter_power_reset: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DriveMode {
    Robot,
    Field,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TeleopOutputs {
    pub drive: DriveCommand,
    pub max_output: f64,
    pub winch: f64,
    pub shooter: f64,
    pub lights: StatusLights,
    /// Re-zero the gyro before the next tick.
    pub reset_heading: bool,
    /// Switch the camera feeding the driver display.
    pub toggle_camera: bool,
}

/// Timed winch pulses: the medium and fast buttons run the winch for a fixed
/// number of ticks and then stop until the button is released.
#[derive(Debug, Clone, Copy, Default)]
pub struct Winch {
    count: u32,
}

impl Winch {
    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn update(&mut self, controls: &DriverControls) -> f64 {
        let pulse = if controls.winch_medium {
            Some(WINCH_MEDIUM)
        } else if controls.winch_fast {
            Some(WINCH_FAST)
        } else {
            None
        };

        match pulse {
            Some(speed) if self.count < WINCH_PULSE_TICKS => {
                self.count += 1;
                speed
            }
            Some(_) => 0.,
            None => {
                self.count = 0;
                if controls.winch_slow {
                    WINCH_SLOW
                } else {
                    0.
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Shooter {
    power: f64,
    buttons: EdgeDetector,
}

impl Default for Shooter {
    fn default() -> Self {
        Shooter {
            power: SHOOTER_DEFAULT_POWER,
            buttons: EdgeDetector::new(),
        }
    }
}

impl Shooter {
    pub fn power(&self) -> f64 {
        self.power
    }

    pub fn update(&mut self, controls: &DriverControls) -> f64 {
        let any_pressed = controls.shooter_power_up
            || controls.shooter_power_down
            || controls.shooter_power_reset;

        if self.buttons.rising(any_pressed) {
            self.power = if controls.shooter_power_up {
                (self.power + SHOOTER_POWER_STEP).min(1.)
            } else if controls.shooter_power_down {
                (self.power - SHOOTER_POWER_STEP).max(0.)
            } else {
                SHOOTER_DEFAULT_POWER
            };
        }

        if controls.shooter_trigger > SHOOTER_TRIGGER_THRESHOLD {
            self.power
        } else {
            0.
        }
    }
}

pub struct TeleopController {
    robot_relative: Toggle,
    camera_button: EdgeDetector,
    locked_heading: Option<f64>,
    winch: Winch,
    shooter: Shooter,
}

impl Default for TeleopController {
    fn default() -> Self {
        Self::new()
    }
}

impl TeleopController {
    pub fn new() -> Self {
        TeleopController {
            robot_relative: Toggle::new(true),
            camera_button: EdgeDetector::new(),
            locked_heading: None,
            winch: Winch::default(),
            shooter: Shooter::default(),
        }
    }

    /// Called on teleop entry. Starts field-relative with no heading lock.
    pub fn enter(&mut self) {
        self.robot_relative.set(false);
        self.locked_heading = None;
        self.winch.reset();
    }

    pub fn drive_mode(&self) -> DriveMode {
        if self.robot_relative.get() {
            DriveMode::Robot
        } else {
            DriveMode::Field
        }
    }

    pub fn shooter_power(&self) -> f64 {
        self.shooter.power()
    }

    /// `vision` is the channel snapshot taken once for this tick.
    pub fn tick(
        &mut self,
        controls: &DriverControls,
        readings: &SensorReadings,
        vision: &Snapshot,
        alignment: &mut AlignmentController,
    ) -> TeleopOutputs {
        let max_output = ((controls.throttle - 1.) / -2.).clamp(0., 1.);

        let x = deadband(controls.x, STRAFE_DEADBAND);
        let y = deadband(controls.y, FORWARD_DEADBAND);
        let twist = deadband(controls.twist, TWIST_DEADBAND) / 2.;

        let (drive, lights) = if controls.align {
            let locked = *self.locked_heading.get_or_insert_with(|| {
                alignment.set_setpoint(0.);
                alignment.restart();
                readings.heading
            });

            let correction = alignment.update(vision);
            let actuable = vision.actuable;
            let strafe = if actuable { correction } else { 0. };
            let rotation = KP_GYRO * (locked - readings.heading);

            let lights = if actuable && alignment.is_aligned() {
                StatusLights::LinedUp
            } else {
                StatusLights::TeleopNormal
            };

            (DriveCommand::robot_relative(y, strafe, rotation), lights)
        } else {
            alignment.disable();
            self.locked_heading = None;

            let drive = match self.drive_mode() {
                DriveMode::Robot => DriveCommand::robot_relative(y, x, twist),
                DriveMode::Field => DriveCommand {
                    field_heading: Some(readings.heading),
                    ..DriveCommand::robot_relative(y, x, twist)
                },
            };

            (drive, StatusLights::TeleopNormal)
        };

        if self.robot_relative.update(controls.toggle_drive_mode) {
            info!("drive mode: {:?}", self.drive_mode());
        }

        TeleopOutputs {
            drive,
            max_output,
            winch: self.winch.update(controls),
            shooter: self.shooter.update(controls),
            lights,
            reset_heading: controls.reset_gyro,
            toggle_camera: self.camera_button.rising(controls.toggle_camera),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;

    fn setup() -> (AlignmentController, TeleopController) {
        let mut teleop = TeleopController::new();
        teleop.enter();
        (AlignmentController::new(), teleop)
    }

    fn vision(offset: f64, actuable: bool) -> Snapshot {
        Snapshot {
            offset,
            actuable,
            frame: 1,
        }
    }

    fn readings(heading: f64) -> SensorReadings {
        SensorReadings {
            heading,
            distance: 0.,
            range: 40.,
        }
    }

    #[test]
    fn test_deadband_and_field_drive() {
        let (mut alignment, mut teleop) = setup();
        let controls = DriverControls {
            x: 0.1,
            y: 0.5,
            twist: 0.6,
            throttle: -1.,
            ..Default::default()
        };

        let outputs = teleop.tick(&controls, &readings(12.), &Snapshot::default(), &mut alignment);

        assert_eq!(outputs.drive.strafe, 0.);
        assert_eq!(outputs.drive.forward, 0.5);
        assert_eq!(outputs.drive.rotation, 0.3);
        assert_eq!(outputs.drive.field_heading, Some(12.));
        assert_eq!(outputs.max_output, 1.);
        assert_eq!(outputs.lights, StatusLights::TeleopNormal);
    }

    #[test]
    fn test_drive_mode_toggle() {
        let (mut alignment, mut teleop) = setup();
        assert_eq!(teleop.drive_mode(), DriveMode::Field);

        let pressed = DriverControls {
            toggle_drive_mode: true,
            ..Default::default()
        };
        let none = Snapshot::default();
        teleop.tick(&pressed, &readings(0.), &none, &mut alignment);
        teleop.tick(&pressed, &readings(0.), &none, &mut alignment);
        assert_eq!(teleop.drive_mode(), DriveMode::Robot);

        let outputs = teleop.tick(&DriverControls::default(), &readings(5.), &none, &mut alignment);
        assert_eq!(outputs.drive.field_heading, None);
        assert_eq!(outputs.max_output, 0.5);
    }

    #[test]
    fn test_align_hold() {
        let (mut alignment, mut teleop) = setup();
        let seen = vision(40., true);

        let controls = DriverControls {
            align: true,
            y: 0.4,
            ..Default::default()
        };

        let outputs = teleop.tick(&controls, &readings(10.), &seen, &mut alignment);
        assert!(alignment.is_enabled());
        assert!(outputs.drive.strafe < 0.);
        assert_eq!(outputs.drive.forward, 0.4);
        assert_eq!(outputs.drive.rotation, 0.);
        assert_eq!(outputs.lights, StatusLights::TeleopNormal);

        // The heading lock holds the heading from the press.
        let outputs = teleop.tick(&controls, &readings(20.), &seen, &mut alignment);
        assert_abs_diff_eq!(outputs.drive.rotation, KP_GYRO * -10., epsilon = 1e-12);

        let lined_up = vision(1., true);
        let outputs = teleop.tick(&controls, &readings(10.), &lined_up, &mut alignment);
        assert_eq!(outputs.lights, StatusLights::LinedUp);

        teleop.tick(&DriverControls::default(), &readings(10.), &lined_up, &mut alignment);
        assert!(!alignment.is_enabled());
    }

    #[test]
    fn test_align_without_target_does_not_strafe() {
        let (mut alignment, mut teleop) = setup();
        let lost = vision(80., false);

        let controls = DriverControls {
            align: true,
            ..Default::default()
        };
        let outputs = teleop.tick(&controls, &readings(0.), &lost, &mut alignment);

        assert_eq!(outputs.drive.strafe, 0.);
        assert_eq!(outputs.lights, StatusLights::TeleopNormal);
    }

    #[test]
    fn test_camera_toggle_is_edge_triggered() {
        let (mut alignment, mut teleop) = setup();
        let pressed = DriverControls {
            toggle_camera: true,
            ..Default::default()
        };

        let toggles: Vec<bool> = [true, true, false, true]
            .iter()
            .map(|&held| {
                let controls = if held { pressed } else { DriverControls::default() };
                teleop
                    .tick(&controls, &readings(0.), &Snapshot::default(), &mut alignment)
                    .toggle_camera
            })
            .collect();

        assert_eq!(toggles, [true, false, false, true]);
    }

    #[test]
    fn test_winch_pulse_stops_until_release() {
        let mut winch = Winch::default();
        let held = DriverControls {
            winch_fast: true,
            ..Default::default()
        };

        let outputs: Vec<f64> = (0..100).map(|_| winch.update(&held)).collect();
        assert!(outputs[..40].iter().all(|&speed| speed == WINCH_FAST));
        assert!(outputs[40..].iter().all(|&speed| speed == 0.));

        assert_eq!(winch.update(&DriverControls::default()), 0.);
        assert_eq!(winch.update(&held), WINCH_FAST);
    }

    #[test]
    fn test_winch_priority_and_slow() {
        let mut winch = Winch::default();

        let both = DriverControls {
            winch_medium: true,
            winch_fast: true,
            winch_slow: true,
            ..Default::default()
        };
        assert_eq!(winch.update(&both), WINCH_MEDIUM);

        let slow = DriverControls {
            winch_slow: true,
            ..Default::default()
        };
        for _ in 0..100 {
            assert_eq!(winch.update(&slow), WINCH_SLOW);
        }
    }

    #[test]
    fn test_shooter_power_buttons() {
        let mut shooter = Shooter::default();
        let up = DriverControls {
            shooter_power_up: true,
            ..Default::default()
        };
        let release = DriverControls::default();

        for _ in 0..10 {
            shooter.update(&up);
            shooter.update(&release);
        }
        assert_eq!(shooter.power(), 1.);

        // Held buttons only count once.
        let down = DriverControls {
            shooter_power_down: true,
            ..Default::default()
        };
        for _ in 0..5 {
            shooter.update(&down);
        }
        assert_abs_diff_eq!(shooter.power(), 0.9, epsilon = 1e-12);

        shooter.update(&release);
        shooter.update(&DriverControls {
            shooter_power_reset: true,
            ..Default::default()
        });
        assert_eq!(shooter.power(), SHOOTER_DEFAULT_POWER);

        let firing = DriverControls {
            shooter_trigger: 0.9,
            ..Default::default()
        };
        assert_eq!(shooter.update(&firing), SHOOTER_DEFAULT_POWER);
        assert_eq!(shooter.update(&release), 0.);
    }
}
