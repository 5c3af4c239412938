//! Driver display side channel. Nothing here feeds back into detection.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use image::Rgb;
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut, draw_line_segment_mut};
use nalgebra::Point2;

use crate::{
    traits::FrameSink,
    types::{Frame, TapePair, TapeRegion},
};

const CANDIDATE_COLOR: Rgb<u8> = Rgb([200, 100, 50]);
const MARKER_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Draws every region outline, the chosen pair, its midpoint and the center
/// line.
pub fn annotate(frame: &mut Frame, regions: &[TapeRegion], pair: Option<&TapePair>) {
    let (width, height) = frame.dimensions();

    for region in regions {
        draw_outline(frame, &region.outline);
    }

    let center_x = (width / 2) as f32;
    draw_line_segment_mut(frame, (center_x, 0.), (center_x, height as f32), MARKER_COLOR);

    if let Some(pair) = pair {
        for candidate in [&pair.primary, &pair.secondary] {
            let center = pixel(candidate.center.x, candidate.center.y);
            let radius = candidate.radius as i32;
            draw_hollow_circle_mut(frame, center, radius, CANDIDATE_COLOR);
            draw_hollow_circle_mut(frame, center, radius + 1, CANDIDATE_COLOR);
        }

        let midpoint = pair.midpoint();
        draw_filled_circle_mut(frame, pixel(midpoint.x, midpoint.y), 3, MARKER_COLOR);
    }
}

fn draw_outline(frame: &mut Frame, outline: &[Point2<f64>]) {
    let closing = outline.last().zip(outline.first());

    for (start, end) in outline.windows(2).map(|edge| (&edge[0], &edge[1])).chain(closing) {
        draw_line_segment_mut(
            frame,
            (start.x as f32, start.y as f32),
            (end.x as f32, end.y as f32),
            CANDIDATE_COLOR,
        );
    }
}

fn pixel(x: f64, y: f64) -> (i32, i32) {
    (x.round() as i32, y.round() as i32)
}

/// Writes every `every`-th frame to a directory as PNG, overwriting a small
/// ring of files.
pub struct ImageDirSink {
    dir: PathBuf,
    every: u64,
    keep: u64,
    count: u64,
}

impl ImageDirSink {
    pub fn new(dir: &Path, every: u64, keep: u64) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create display directory {}", dir.display()))?;

        Ok(ImageDirSink {
            dir: dir.to_path_buf(),
            every: every.max(1),
            keep: keep.max(1),
            count: 0,
        })
    }
}

impl FrameSink for ImageDirSink {
    fn put_frame(&mut self, frame: &Frame) -> Result<()> {
        let index = self.count;
        self.count += 1;

        if index % self.every != 0 {
            return Ok(());
        }

        let slot = (index / self.every) % self.keep;
        let path = self.dir.join(format!("frame_{}.png", slot));

        frame
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}
