use anyhow::Result;

use crate::{
    robot::Telemetry,
    types::{Frame, OffsetMeasurement, TapePair, TapeRegion, TargetCandidate},
};

/// A source of frames. `grab_frame` blocks until the next frame is available.
pub trait Camera {
    fn grab_frame(&mut self) -> Result<Frame>;
}

impl<C: Camera + ?Sized> Camera for Box<C> {
    fn grab_frame(&mut self) -> Result<Frame> {
        (**self).grab_frame()
    }
}

/// Finds candidate target regions in a frame.
pub trait ContourExtractor {
    fn extract_regions(&self, frame: &Frame) -> Vec<TapeRegion>;

    fn extract_from(&self, frame: &Frame) -> Vec<TargetCandidate> {
        self.extract_regions(frame)
            .into_iter()
            .map(|region| region.candidate)
            .collect()
    }
}

/// Reduces the candidates of one frame to a single measurement.
pub trait ContourAnalyzer {
    /// The candidates the measurement is taken from, if there are enough.
    fn select_pair(&self, candidates: &[TargetCandidate]) -> Option<TapePair>;

    fn analyze(&self, candidates: &[TargetCandidate], frame_width: u32) -> OffsetMeasurement;
}

/// Operator display. Frames are only ever written, never read back.
pub trait FrameSink {
    fn put_frame(&mut self, frame: &Frame) -> Result<()>;
}

impl<S: FrameSink + ?Sized> FrameSink for Box<S> {
    fn put_frame(&mut self, frame: &Frame) -> Result<()> {
        (**self).put_frame(frame)
    }
}

/// Discards every frame.
pub struct NullFrameSink;

impl FrameSink for NullFrameSink {
    fn put_frame(&mut self, _frame: &Frame) -> Result<()> {
        Ok(())
    }
}

/// Dashboard link for the per-tick status record.
pub trait TelemetrySink {
    fn publish(&mut self, telemetry: &Telemetry) -> Result<()>;
}

impl<S: TelemetrySink + ?Sized> TelemetrySink for Box<S> {
    fn publish(&mut self, telemetry: &Telemetry) -> Result<()> {
        (**self).publish(telemetry)
    }
}

pub struct NullTelemetrySink;

impl TelemetrySink for NullTelemetrySink {
    fn publish(&mut self, _telemetry: &Telemetry) -> Result<()> {
        Ok(())
    }
}
