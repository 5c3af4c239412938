use crate::{
    traits::ContourAnalyzer,
    types::{OffsetMeasurement, TapePair, TargetCandidate},
};

/// Turns the candidates of one frame into the horizontal offset of the peg.
///
/// With the camera mounted low and tilted up, the strips that sit highest in
/// the frame (smallest y) are the ones on the airship wall; anything lower is
/// reflections off the floor or the bumpers.
pub struct PegTapeAnalyzer {}

impl PegTapeAnalyzer {
    pub fn new() -> Self {
        PegTapeAnalyzer {}
    }
}

impl Default for PegTapeAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl ContourAnalyzer for PegTapeAnalyzer {
    /// Picks the two candidates with the smallest y. Ties keep extraction
    /// order.
    fn select_pair(&self, candidates: &[TargetCandidate]) -> Option<TapePair> {
        let mut ranked: Vec<&TargetCandidate> = candidates.iter().collect();
        ranked.sort_by(|a, b| a.center.y.total_cmp(&b.center.y));

        match ranked.as_slice() {
            [primary, secondary, ..] => Some(TapePair {
                primary: **primary,
                secondary: **secondary,
            }),
            _ => None,
        }
    }

    fn analyze(&self, candidates: &[TargetCandidate], frame_width: u32) -> OffsetMeasurement {
        match self.select_pair(candidates) {
            Some(pair) => OffsetMeasurement::Target(pair.midpoint().x - frame_width as f64 / 2.),
            None => OffsetMeasurement::NoTarget,
        }
    }
}
