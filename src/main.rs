use std::{
    path::PathBuf,
    sync::{Arc, Mutex, PoisonError},
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use vision_2017::{
    analysis::PegTapeAnalyzer,
    autonomous::AutoSelection,
    camera::{CameraPair, ImageSequenceCamera, SyntheticCamera},
    channel::MeasurementChannel,
    config::{CameraConfig, Config},
    display::ImageDirSink,
    extraction::RetroTapeExtractor,
    pipeline::{Detector, VisionPipeline},
    robot::{Mode, Robot},
    sim::SimulatedRobot,
    teleop::DriverControls,
    traits::{Camera, FrameSink, NullFrameSink, NullTelemetrySink, TelemetrySink},
    udp::UdpSender,
};

/// Runs the detection thread and the control loop against the bench
/// simulation: one autonomous period, then disabled.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "config.json")]
    config: PathBuf,
}

type SharedSim = Arc<Mutex<SimulatedRobot>>;

fn open_camera(
    camera: &CameraConfig,
    config: &Config,
    sim: Option<SharedSim>,
) -> Result<Box<dyn Camera + Send>> {
    let frame_period = Duration::from_millis(config.frame_period_ms);
    let (width, height) = (config.frame_width, config.frame_height);

    let camera: Box<dyn Camera + Send> = match camera {
        CameraConfig::Directory { path } => {
            Box::new(ImageSequenceCamera::open(path, frame_period)?)
        }
        CameraConfig::Synthetic { noise } => {
            let scene = move || match &sim {
                Some(sim) => sim
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .scene(width, height),
                None => Vec::new(),
            };

            let mut camera =
                SyntheticCamera::new(width, height, scene).with_frame_period(frame_period);
            if *noise > 0. {
                camera = camera.with_noise(*noise)?;
            }
            Box::new(camera)
        }
    };

    Ok(camera)
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = Config::load_or_default(&args.config)?;

    let channel = Arc::new(MeasurementChannel::new());
    let sim = Arc::new(Mutex::new(SimulatedRobot::new(config.sim)));

    let cameras = CameraPair::new(
        open_camera(&config.primary_camera, &config, Some(sim.clone()))
            .context("Failed to open primary camera")?,
        open_camera(&config.secondary_camera, &config, None)
            .context("Failed to open secondary camera")?,
    );
    let display: Box<dyn FrameSink + Send> = match &config.display {
        Some(display) => Box::new(ImageDirSink::new(&display.dir, display.every, display.keep)?),
        None => Box::new(NullFrameSink),
    };
    let detector = Detector::new(RetroTapeExtractor::new(), PegTapeAnalyzer::new());
    let pipeline = VisionPipeline::new(cameras, detector, channel.clone(), display);

    thread::Builder::new()
        .name("vision".to_string())
        .spawn(move || pipeline.run_forever())
        .context("Failed to spawn detection thread")?;

    let mut telemetry: Box<dyn TelemetrySink> = match &config.telemetry {
        Some(telemetry) => Box::new(UdpSender::new(telemetry.src_port, &telemetry.dst_address)?),
        None => Box::new(NullTelemetrySink),
    };

    let selection = match config.auto_selection.parse::<AutoSelection>() {
        Ok(selection) => Some(selection),
        Err(err) => {
            warn!("{:#}, holding for the autonomous period", err);
            None
        }
    };

    let period = Duration::from_millis(config.control_period_ms.max(1));
    let auto_ticks = (config.auto_duration_s / period.as_secs_f64()).round() as u64;
    let controls = DriverControls::default();

    let mut robot = Robot::new(channel);
    robot.enter(Mode::Autonomous(selection));

    let mut deadline = Instant::now();
    for tick in 0..=auto_ticks {
        if tick == auto_ticks {
            robot.enter(Mode::Disabled);
        }

        let sample = sim.lock().unwrap_or_else(PoisonError::into_inner).sample();
        let outputs = robot.tick(&sample, &controls);
        sim.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .step(&outputs.drive, outputs.max_output, period.as_secs_f64());

        if let Err(err) = telemetry.publish(&outputs.telemetry) {
            warn!("{:#}", err);
        }

        deadline += period;
        let now = Instant::now();
        if now > deadline {
            warn!("control tick {} overran by {:?}", tick, now - deadline);
            deadline = now;
        } else {
            thread::sleep(deadline - now);
        }
    }

    let sim = sim.lock().unwrap_or_else(PoisonError::into_inner);
    info!(
        "finished {:?}: range {:.1} in, lateral {:.1} in, heading {:.1} deg",
        selection,
        sim.range(),
        sim.lateral(),
        sim.heading()
    );

    Ok(())
}
