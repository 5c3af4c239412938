use std::sync::Arc;

use anyhow::{Context, Result};
use log::{trace, warn};

use crate::{
    camera::CameraPair,
    channel::{CameraSource, MeasurementChannel},
    display::annotate,
    traits::{Camera as CameraTrait, ContourAnalyzer, ContourExtractor, FrameSink},
    types::{Frame, OffsetMeasurement},
};

/// Extraction plus analysis for a single frame.
pub struct Detector<Extractor, Analyzer> {
    extractor: Extractor,
    analyzer: Analyzer,
}

impl<Extractor, Analyzer> Detector<Extractor, Analyzer>
where
    Extractor: ContourExtractor,
    Analyzer: ContourAnalyzer,
{
    pub fn new(extractor: Extractor, analyzer: Analyzer) -> Self {
        Detector {
            extractor,
            analyzer,
        }
    }

    /// Measures the peg offset in `frame` and draws the diagnostic overlay on
    /// it afterwards.
    pub fn detect(&self, frame: &mut Frame) -> OffsetMeasurement {
        let regions = self.extractor.extract_regions(frame);
        let candidates: Vec<_> = regions.iter().map(|region| region.candidate).collect();
        let measurement = self.analyzer.analyze(&candidates, frame.width());

        let pair = self.analyzer.select_pair(&candidates);
        annotate(frame, &regions, pair.as_ref());

        trace!(
            "{} candidates, measurement {:?}",
            candidates.len(),
            measurement
        );

        measurement
    }
}

/// The detection thread: grabs from whichever camera is selected, measures on
/// the primary feed, publishes to the channel and forwards the frame to the
/// driver display.
pub struct VisionPipeline<Primary, Secondary, Extractor, Analyzer, Display> {
    cameras: CameraPair<Primary, Secondary>,
    detector: Detector<Extractor, Analyzer>,
    channel: Arc<MeasurementChannel>,
    display: Display,
}

impl<Primary, Secondary, Extractor, Analyzer, Display>
    VisionPipeline<Primary, Secondary, Extractor, Analyzer, Display>
where
    Primary: CameraTrait,
    Secondary: CameraTrait,
    Extractor: ContourExtractor,
    Analyzer: ContourAnalyzer,
    Display: FrameSink,
{
    pub fn new(
        cameras: CameraPair<Primary, Secondary>,
        detector: Detector<Extractor, Analyzer>,
        channel: Arc<MeasurementChannel>,
        display: Display,
    ) -> Self {
        VisionPipeline {
            cameras,
            detector,
            channel,
            display,
        }
    }

    /// Processes one frame. Returns the published measurement, or `None` when
    /// the secondary feed was passed through.
    pub fn run(&mut self) -> Result<Option<OffsetMeasurement>> {
        let source = self.channel.active_source();

        let grabbed = self
            .cameras
            .grab_frame(source)
            .context("Failed to read frame from camera");

        let mut frame = match grabbed {
            Ok(frame) => frame,
            Err(err) => {
                if source == CameraSource::Primary {
                    self.channel.publish(OffsetMeasurement::NoTarget);
                }
                return Err(err);
            }
        };

        let measurement = match source {
            CameraSource::Primary => {
                let measurement = self.detector.detect(&mut frame);
                self.channel.publish(measurement);
                Some(measurement)
            }
            CameraSource::Secondary => None,
        };

        self.display
            .put_frame(&frame)
            .context("Failed to send frame to display")?;

        Ok(measurement)
    }

    /// Runs for the life of the process. Failures are logged and the loop
    /// moves on to the next frame.
    pub fn run_forever(mut self) -> ! {
        loop {
            if let Err(err) = self.run() {
                warn!("{:#}", err);
            }
        }
    }
}
