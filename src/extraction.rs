use std::ops::RangeInclusive;

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::{
    contours::{self, BorderType},
    filter::gaussian_blur_f32,
    geometry::approximate_polygon_dp,
    point::Point,
};
use nalgebra::Point2;

use crate::{
    geometry::min_enclosing_circle,
    traits::ContourExtractor,
    types::{Frame, TapeRegion, TargetCandidate},
};

/// HSV band of the peg tape under the ring light, in OpenCV 8-bit units
/// (hue in [0, 180), saturation and value in [0, 255]).
pub const TAPE_HSV_RANGE: RangeInclusive<[u8; 3]> = [70, 100, 170]..=[90, 210, 255];

/// Matches a 5x5 kernel with sigma 2.
pub const BLUR_SIGMA: f32 = 2.;

pub const POLY_EPSILON: f64 = 3.;

/// Regions whose enclosing circle is smaller than this are noise.
pub const MIN_RADIUS: f64 = 10.;

pub struct RetroTapeExtractor {}

impl RetroTapeExtractor {
    pub fn new() -> Self {
        RetroTapeExtractor {}
    }

    pub(crate) fn threshold_image(&self, image: &RgbImage) -> GrayImage {
        let hsv_image = gaussian_blur_f32(&rgb_to_hsv(image), BLUR_SIGMA);

        let (low, high) = (*TAPE_HSV_RANGE.start(), *TAPE_HSV_RANGE.end());

        GrayImage::from_fn(hsv_image.width(), hsv_image.height(), |x, y| {
            let Rgb(hsv) = *hsv_image.get_pixel(x, y);
            let in_band = (0..3).all(|c| low[c] <= hsv[c] && hsv[c] <= high[c]);

            Luma([if in_band { 255 } else { 0 }])
        })
    }

    /// Outer borders of every connected region, simplified.
    pub(crate) fn find_contours(&self, mask: &GrayImage) -> Vec<Vec<Point<i32>>> {
        contours::find_contours::<i32>(mask)
            .into_iter()
            .filter(|contour| contour.border_type == BorderType::Outer)
            .map(|contour| approximate_polygon_dp(&contour.points, POLY_EPSILON, true))
            .collect()
    }

    fn enclose(&self, polygon: &[Point<i32>]) -> TapeRegion {
        let outline: Vec<_> = polygon
            .iter()
            .map(|point| Point2::new(point.x as f64, point.y as f64))
            .collect();

        let circle = min_enclosing_circle(&outline);

        TapeRegion {
            outline,
            candidate: TargetCandidate {
                center: circle.center,
                radius: circle.radius,
            },
        }
    }
}

impl Default for RetroTapeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ContourExtractor for RetroTapeExtractor {
    fn extract_regions(&self, frame: &Frame) -> Vec<TapeRegion> {
        let mask = self.threshold_image(frame);

        self.find_contours(&mask)
            .iter()
            .map(|polygon| self.enclose(polygon))
            .filter(|region| region.candidate.radius >= MIN_RADIUS)
            .collect()
    }
}

/// RGB to HSV using the OpenCV 8-bit convention. The result reuses the `Rgb`
/// pixel type with channels holding (h, s, v).
pub(crate) fn rgb_to_hsv(image: &RgbImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        Rgb(pixel_to_hsv(*image.get_pixel(x, y)))
    })
}

fn pixel_to_hsv(Rgb([r, g, b]): Rgb<u8>) -> [u8; 3] {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max > 0. { 255. * delta / max } else { 0. };

    let mut h = if delta == 0. {
        0.
    } else if max == r {
        60. * (g - b) / delta
    } else if max == g {
        120. + 60. * (b - r) / delta
    } else {
        240. + 60. * (r - g) / delta
    };

    if h < 0. {
        h += 360.;
    }

    [
        ((h / 2.).round() as u8).min(179),
        s.round() as u8,
        max as u8,
    ]
}
