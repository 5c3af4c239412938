//! Scripted autonomous maneuvers.
//!
//! A maneuver is a fixed list of steps run in order, one per stage, followed by
//! a terminal hold. Stages only ever advance. The tick on which a step's exit
//! condition is met outputs a neutral command and moves to the next stage.

use std::{fmt, str::FromStr};

use anyhow::{anyhow, Error};
use log::info;
use serde::{Deserialize, Serialize};

use crate::types::DriveCommand;

/// Encoder inches to clear the baseline.
pub const CROSS_LINE_DISTANCE: f64 = 100.;
/// Encoder inches before turning toward a side peg.
pub const SIDE_DRIVE_DISTANCE: f64 = 80.;
/// Heading of the side pegs relative to the starting heading, degrees.
pub const SIDE_PEG_HEADING: f64 = 60.;
pub const HEADING_TOLERANCE: f64 = 3.;
/// Ultrasonic inches at which the gear is on the peg.
pub const DOCK_RANGE: f64 = 15.;

pub const DRIVE_SPEED: f64 = 0.5;
pub const APPROACH_SPEED: f64 = 0.3;
pub const TURN_SPEED: f64 = 0.4;
pub const TURN_MIN_SPEED: f64 = 0.15;

/// Rotation per degree of heading error.
pub const KP_GYRO: f64 = 0.03;
pub const KP_TURN: f64 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutoSelection {
    CrossLine,
    GearLeft,
    GearCenter,
    GearRight,
    /// Reserved. Holds position.
    Balls,
}

impl AutoSelection {
    pub const ALL: [AutoSelection; 5] = [
        AutoSelection::CrossLine,
        AutoSelection::GearLeft,
        AutoSelection::GearCenter,
        AutoSelection::GearRight,
        AutoSelection::Balls,
    ];

    /// Position in the dashboard chooser.
    pub fn from_index(index: i64) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }

    fn steps(self) -> Vec<Step> {
        match self {
            AutoSelection::CrossLine => vec![Step::DriveOut {
                distance: CROSS_LINE_DISTANCE,
            }],
            AutoSelection::GearLeft => Self::side_peg(SIDE_PEG_HEADING),
            AutoSelection::GearRight => Self::side_peg(-SIDE_PEG_HEADING),
            AutoSelection::GearCenter => vec![Step::Approach { heading: 0. }],
            AutoSelection::Balls => Vec::new(),
        }
    }

    fn side_peg(heading: f64) -> Vec<Step> {
        vec![
            Step::DriveOut {
                distance: SIDE_DRIVE_DISTANCE,
            },
            Step::Turn { heading },
            Step::Approach { heading },
        ]
    }
}

impl fmt::Display for AutoSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AutoSelection::CrossLine => "Cross Line",
            AutoSelection::GearLeft => "Left",
            AutoSelection::GearCenter => "Center",
            AutoSelection::GearRight => "Right",
            AutoSelection::Balls => "Balls",
        };
        f.write_str(name)
    }
}

impl FromStr for AutoSelection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], " ").as_str() {
            "cross line" | "cross" => Ok(AutoSelection::CrossLine),
            "left" | "gear left" => Ok(AutoSelection::GearLeft),
            "center" | "gear center" => Ok(AutoSelection::GearCenter),
            "right" | "gear right" => Ok(AutoSelection::GearRight),
            "balls" => Ok(AutoSelection::Balls),
            _ => Err(anyhow!("unknown autonomous selection {:?}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Drive straight until the encoder reads at least `distance`.
    DriveOut { distance: f64 },
    /// Rotate in place until within tolerance of `heading`.
    Turn { heading: f64 },
    /// Creep forward, strafing on the alignment correction and holding
    /// `heading`, until the ultrasonic range is under the docking range.
    Approach { heading: f64 },
}

impl Step {
    pub fn needs_alignment(&self) -> bool {
        matches!(self, Step::Approach { .. })
    }
}

/// Per-tick inputs, already zeroed at autonomous entry.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AutoInputs {
    pub heading: f64,
    pub distance: f64,
    pub range: f64,
    /// Alignment correction, `None` while the target is not actuable.
    pub alignment: Option<f64>,
}

pub struct Sequencer {
    selection: Option<AutoSelection>,
    steps: Vec<Step>,
    stage: usize,
    heading_target: f64,
}

impl Sequencer {
    /// `None` is an unrecognized selection and only ever holds.
    pub fn new(selection: Option<AutoSelection>) -> Self {
        Sequencer {
            selection,
            steps: selection.map(AutoSelection::steps).unwrap_or_default(),
            stage: 0,
            heading_target: 0.,
        }
    }

    pub fn selection(&self) -> Option<AutoSelection> {
        self.selection
    }

    /// Current stage number. Equal to the number of steps once holding.
    pub fn stage(&self) -> usize {
        self.stage
    }

    pub fn current_step(&self) -> Option<Step> {
        self.steps.get(self.stage).copied()
    }

    pub fn is_holding(&self) -> bool {
        self.stage >= self.steps.len()
    }

    pub fn tick(&mut self, inputs: &AutoInputs) -> DriveCommand {
        let Some(step) = self.current_step() else {
            return DriveCommand::neutral();
        };

        match step {
            Step::DriveOut { distance } => {
                if inputs.distance >= distance {
                    return self.advance();
                }

                DriveCommand::robot_relative(
                    DRIVE_SPEED,
                    0.,
                    hold_heading(self.heading_target, inputs.heading),
                )
            }
            Step::Turn { heading } => {
                let error = heading - inputs.heading;
                if error.abs() <= HEADING_TOLERANCE {
                    self.heading_target = heading;
                    return self.advance();
                }

                let rotation = (KP_TURN * error).clamp(-TURN_SPEED, TURN_SPEED);
                let rotation = rotation.signum() * rotation.abs().max(TURN_MIN_SPEED);

                DriveCommand::robot_relative(0., 0., rotation)
            }
            Step::Approach { heading } => match inputs.alignment {
                // Docking only counts with the target in view.
                None => DriveCommand::neutral(),
                Some(_) if inputs.range < DOCK_RANGE => self.advance(),
                Some(correction) => DriveCommand::robot_relative(
                    APPROACH_SPEED,
                    correction,
                    hold_heading(heading, inputs.heading),
                ),
            },
        }
    }

    fn advance(&mut self) -> DriveCommand {
        self.stage += 1;

        match self.current_step() {
            Some(step) => info!("autonomous stage {}: {:?}", self.stage, step),
            None => info!("autonomous stage {}: hold", self.stage),
        }

        DriveCommand::neutral()
    }
}

fn hold_heading(target: f64, heading: f64) -> f64 {
    (KP_GYRO * (target - heading)).clamp(-TURN_SPEED, TURN_SPEED)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(heading: f64, distance: f64, range: f64, alignment: Option<f64>) -> AutoInputs {
        AutoInputs {
            heading,
            distance,
            range,
            alignment,
        }
    }

    #[test]
    fn test_selection_parsing() {
        assert_eq!("Cross Line".parse::<AutoSelection>().unwrap(), AutoSelection::CrossLine);
        assert_eq!("gear-left".parse::<AutoSelection>().unwrap(), AutoSelection::GearLeft);
        assert_eq!("CENTER".parse::<AutoSelection>().unwrap(), AutoSelection::GearCenter);
        assert!("spin".parse::<AutoSelection>().is_err());

        assert_eq!(AutoSelection::from_index(3), Some(AutoSelection::GearRight));
        assert_eq!(AutoSelection::from_index(5), None);
        assert_eq!(AutoSelection::from_index(-1), None);

        for selection in AutoSelection::ALL {
            assert_eq!(selection.to_string().parse::<AutoSelection>().unwrap(), selection);
        }
    }

    #[test]
    fn test_cross_line_reaches_hold_once() {
        let mut sequencer = Sequencer::new(Some(AutoSelection::CrossLine));

        let mut hold_entries = 0;
        let mut was_holding = sequencer.is_holding();

        for tick in 0..200 {
            let distance = tick as f64 * 1.5;
            let command = sequencer.tick(&inputs(0., distance, 100., None));

            if sequencer.is_holding() && !was_holding {
                hold_entries += 1;
            }
            if was_holding {
                assert!(command.is_neutral(), "moved after hold at tick {}", tick);
            } else if !sequencer.is_holding() {
                assert_eq!(command.forward, DRIVE_SPEED);
            }
            was_holding = sequencer.is_holding();
        }

        assert_eq!(hold_entries, 1);

        // Encoder noise after the hold changes nothing.
        for distance in [0., -50., 1000.] {
            assert!(sequencer.tick(&inputs(10., distance, 12., Some(0.5))).is_neutral());
        }
        assert!(sequencer.is_holding());
    }

    #[test]
    fn test_drive_out_holds_heading() {
        let mut sequencer = Sequencer::new(Some(AutoSelection::CrossLine));

        let command = sequencer.tick(&inputs(5., 0., 100., None));

        assert_eq!(command.forward, DRIVE_SPEED);
        assert!(command.rotation < 0.);
    }

    #[test]
    fn test_gear_left_sequence() {
        let mut sequencer = Sequencer::new(Some(AutoSelection::GearLeft));
        assert_eq!(sequencer.stage(), 0);

        sequencer.tick(&inputs(0., 40., 100., None));
        sequencer.tick(&inputs(0., 80., 100., None));
        assert_eq!(sequencer.current_step(), Some(Step::Turn { heading: 60. }));

        let command = sequencer.tick(&inputs(0., 80., 100., None));
        assert_eq!(command.forward, 0.);
        assert_eq!(command.rotation, TURN_SPEED);

        let command = sequencer.tick(&inputs(55., 80., 100., None));
        assert_eq!(command.rotation, TURN_MIN_SPEED);

        sequencer.tick(&inputs(58., 80., 100., None));
        assert_eq!(sequencer.current_step(), Some(Step::Approach { heading: 60. }));

        let command = sequencer.tick(&inputs(60., 80., 60., Some(-0.2)));
        assert_eq!(command.forward, APPROACH_SPEED);
        assert_eq!(command.strafe, -0.2);

        sequencer.tick(&inputs(60., 80., 14., Some(0.)));
        assert!(sequencer.is_holding());
        assert_eq!(sequencer.stage(), 3);
    }

    #[test]
    fn test_gear_right_turns_the_other_way() {
        let mut sequencer = Sequencer::new(Some(AutoSelection::GearRight));

        sequencer.tick(&inputs(0., 90., 100., None));
        let command = sequencer.tick(&inputs(0., 90., 100., None));

        assert_eq!(command.rotation, -TURN_SPEED);
    }

    #[test]
    fn test_approach_waits_for_target() {
        let mut sequencer = Sequencer::new(Some(AutoSelection::GearCenter));

        for _ in 0..10 {
            let command = sequencer.tick(&inputs(0., 0., 80., None));
            assert!(command.is_neutral());
        }
        assert_eq!(sequencer.stage(), 0);

        let command = sequencer.tick(&inputs(0., 0., 80., Some(0.1)));
        assert_eq!(command.forward, APPROACH_SPEED);
        assert_eq!(command.strafe, 0.1);
    }

    #[test]
    fn test_dock_needs_target_in_view() {
        let mut sequencer = Sequencer::new(Some(AutoSelection::GearCenter));

        let command = sequencer.tick(&inputs(0., 60., 10., None));
        assert!(command.is_neutral());
        assert_eq!(sequencer.stage(), 0);

        let command = sequencer.tick(&inputs(0., 60., 10., Some(0.)));
        assert!(command.is_neutral());
        assert_eq!(sequencer.stage(), 1);
        assert!(sequencer.is_holding());
    }

    #[test]
    fn test_reserved_and_unknown_selections_hold() {
        for mut sequencer in [
            Sequencer::new(Some(AutoSelection::Balls)),
            Sequencer::new(AutoSelection::from_index(42)),
        ] {
            assert!(sequencer.is_holding());
            for tick in 0..20 {
                let command = sequencer.tick(&inputs(tick as f64, tick as f64, 50., Some(1.)));
                assert!(command.is_neutral());
            }
        }
    }

    #[test]
    fn test_stages_never_go_back() {
        let mut sequencer = Sequencer::new(Some(AutoSelection::GearRight));
        let mut last_stage = 0;

        for tick in 0..500 {
            // Sensors wander back and forth.
            let t = tick as f64;
            let command = sequencer.tick(&inputs(
                -70. * (t / 40.).sin().abs(),
                t * 0.5 * (t / 60.).cos().signum(),
                100. - t * 0.2,
                if tick % 3 == 0 { None } else { Some(0.) },
            ));

            assert!(sequencer.stage() >= last_stage);
            last_stage = sequencer.stage();
            assert!(command.forward.abs() <= 1. && command.rotation.abs() <= 1.);
        }
    }
}
