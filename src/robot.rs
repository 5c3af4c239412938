use std::sync::Arc;

use log::info;
use serde::Serialize;

use crate::{
    alignment::AlignmentController,
    autonomous::{AutoInputs, AutoSelection, Sequencer},
    channel::{CameraSource, MeasurementChannel, Snapshot},
    sensors::{SensorBaseline, SensorReadings, SensorSample},
    status::StatusLights,
    teleop::{DriveMode, DriverControls, TeleopController},
    types::DriveCommand,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Disabled,
    /// `None` is a selection that did not parse; the robot holds.
    Autonomous(Option<AutoSelection>),
    Teleop,
}

/// Status values published to the dashboard every tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Telemetry {
    pub heading: f64,
    pub distance: f64,
    pub range: f64,
    pub vision: Snapshot,
    pub alignment: f64,
    pub camera: CameraSource,
    pub drive_mode: DriveMode,
    pub shooter_power: f64,
    pub auto_stage: Option<usize>,
}

/// Everything the actuator bindings apply after one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RobotOutputs {
    pub drive: DriveCommand,
    pub max_output: f64,
    pub winch: f64,
    pub shooter: f64,
    pub lights: StatusLights,
    pub telemetry: Telemetry,
}

enum ModeState {
    Disabled,
    Autonomous(Sequencer),
    Teleop,
}

/// Control-tick side of the robot. Owns all controller and sequence state;
/// the only thing shared with the detection thread is the channel.
pub struct Robot {
    channel: Arc<MeasurementChannel>,
    alignment: AlignmentController,
    teleop: TeleopController,
    baseline: SensorBaseline,
    state: ModeState,
    pending_zero: bool,
}

impl Robot {
    pub fn new(channel: Arc<MeasurementChannel>) -> Self {
        Robot {
            alignment: AlignmentController::new(),
            channel,
            teleop: TeleopController::new(),
            baseline: SensorBaseline::default(),
            state: ModeState::Disabled,
            pending_zero: false,
        }
    }

    pub fn mode(&self) -> Mode {
        match &self.state {
            ModeState::Disabled => Mode::Disabled,
            ModeState::Autonomous(sequencer) => Mode::Autonomous(sequencer.selection()),
            ModeState::Teleop => Mode::Teleop,
        }
    }

    /// Switches mode. Sensor re-zeroing happens against the first sample of
    /// the next tick.
    pub fn enter(&mut self, mode: Mode) {
        info!("entering {:?}", mode);

        self.state = match mode {
            Mode::Disabled => {
                self.alignment.disable();
                ModeState::Disabled
            }
            Mode::Autonomous(selection) => {
                self.alignment.set_setpoint(0.);
                self.alignment.restart();
                self.channel.select_source(CameraSource::Primary);
                self.pending_zero = true;
                ModeState::Autonomous(Sequencer::new(selection))
            }
            Mode::Teleop => {
                self.alignment.disable();
                self.teleop.enter();
                self.pending_zero = true;
                ModeState::Teleop
            }
        };
    }

    pub fn tick(&mut self, sample: &SensorSample, controls: &DriverControls) -> RobotOutputs {
        if self.pending_zero {
            self.pending_zero = false;
            match self.state {
                ModeState::Autonomous(_) => self.baseline.zero_all(sample),
                ModeState::Teleop => self.baseline.zero_distance(sample),
                ModeState::Disabled => {}
            }
        }

        let readings = self.baseline.readings(sample);
        // One read per tick: offset and actuable flag always come from the
        // same frame.
        let vision = self.channel.snapshot();

        let (drive, max_output, winch, shooter, lights, auto_stage) = match &mut self.state {
            ModeState::Disabled => (DriveCommand::neutral(), 0., 0., 0., StatusLights::Off, None),
            ModeState::Autonomous(sequencer) => {
                let correction = self.alignment.update(&vision);
                let inputs = AutoInputs {
                    heading: readings.heading,
                    distance: readings.distance,
                    range: readings.range,
                    alignment: vision.actuable.then_some(correction),
                };
                let drive = sequencer.tick(&inputs);

                (drive, 1., 0., 0., StatusLights::Autonomous, Some(sequencer.stage()))
            }
            ModeState::Teleop => {
                let outputs = self.teleop.tick(
                    controls,
                    &readings,
                    &vision,
                    &mut self.alignment,
                );

                if outputs.reset_heading {
                    self.baseline.zero_heading(sample);
                }
                if outputs.toggle_camera {
                    let source = self.channel.toggle_source();
                    info!("camera: {:?}", source);
                }

                (
                    outputs.drive,
                    outputs.max_output,
                    outputs.winch,
                    outputs.shooter,
                    outputs.lights,
                    None,
                )
            }
        };

        RobotOutputs {
            drive,
            max_output,
            winch,
            shooter,
            lights,
            telemetry: self.telemetry(&readings, vision, auto_stage),
        }
    }

    fn telemetry(
        &self,
        readings: &SensorReadings,
        vision: Snapshot,
        auto_stage: Option<usize>,
    ) -> Telemetry {
        Telemetry {
            heading: readings.heading,
            distance: readings.distance,
            range: readings.range,
            vision,
            alignment: self.alignment.output(),
            camera: self.channel.active_source(),
            drive_mode: self.teleop.drive_mode(),
            shooter_power: self.teleop.shooter_power(),
            auto_stage,
        }
    }
}
