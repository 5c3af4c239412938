use std::{
    fs,
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use anyhow::{bail, Context, Result};
use image::{Rgb, RgbImage};
use imageproc::{drawing::draw_filled_rect_mut, rect::Rect};
use log::debug;
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::{
    channel::CameraSource,
    traits::Camera,
    types::Frame,
};

/// Tape as seen under the green ring light.
pub const TAPE_COLOR: Rgb<u8> = Rgb([90, 240, 150]);

/// An axis-aligned strip of tape in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TapeStrip {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Renders tape strips on a black background.
pub fn render_strips(width: u32, height: u32, strips: &[TapeStrip]) -> Frame {
    let mut frame = RgbImage::new(width, height);

    for strip in strips {
        draw_filled_rect_mut(
            &mut frame,
            Rect::at(strip.x, strip.y).of_size(strip.width, strip.height),
            TAPE_COLOR,
        );
    }

    frame
}

/// Two strips of the peg target, `offset` pixels right of the frame center
/// and scaled by `scale` (1.0 is roughly two meters away).
pub fn peg_strips(width: u32, height: u32, offset: f64, scale: f64) -> [TapeStrip; 2] {
    let strip_width = (16. * scale).round().max(1.) as u32;
    let strip_height = (40. * scale).round().max(1.) as u32;
    let spacing = 40. * scale;

    let center_x = width as f64 / 2. + offset;
    let top = (height as f64 / 3. - strip_height as f64 / 2.).round() as i32;

    let strip = |center: f64| TapeStrip {
        x: (center - strip_width as f64 / 2.).round() as i32,
        y: top,
        width: strip_width,
        height: strip_height,
    };

    [strip(center_x - spacing), strip(center_x + spacing)]
}

/// Renders frames from a scene callback, with optional Gaussian sensor noise.
pub struct SyntheticCamera<F> {
    width: u32,
    height: u32,
    scene: F,
    noise: Option<Normal<f32>>,
    rng: StdRng,
    frame_period: Duration,
}

impl<F> SyntheticCamera<F>
where
    F: FnMut() -> Vec<TapeStrip>,
{
    pub fn new(width: u32, height: u32, scene: F) -> Self {
        SyntheticCamera {
            width,
            height,
            scene,
            noise: None,
            rng: StdRng::from_entropy(),
            frame_period: Duration::ZERO,
        }
    }

    pub fn with_noise(mut self, std_dev: f32) -> Result<Self> {
        self.noise = Some(Normal::new(0., std_dev).context("Invalid noise standard deviation")?);
        Ok(self)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Sleeps this long per grab to mimic a real frame rate.
    pub fn with_frame_period(mut self, frame_period: Duration) -> Self {
        self.frame_period = frame_period;
        self
    }
}

impl<F> Camera for SyntheticCamera<F>
where
    F: FnMut() -> Vec<TapeStrip>,
{
    fn grab_frame(&mut self) -> Result<Frame> {
        if !self.frame_period.is_zero() {
            thread::sleep(self.frame_period);
        }

        let strips = (self.scene)();
        let mut frame = render_strips(self.width, self.height, &strips);

        if let Some(noise) = &self.noise {
            for channel in frame.iter_mut() {
                let value = *channel as f32 + noise.sample(&mut self.rng);
                *channel = value.round().clamp(0., 255.) as u8;
            }
        }

        Ok(frame)
    }
}

/// Plays back the images of a directory in file-name order, looping forever.
pub struct ImageSequenceCamera {
    paths: Vec<PathBuf>,
    next: usize,
    frame_period: Duration,
}

impl ImageSequenceCamera {
    pub fn open(dir: &Path, frame_period: Duration) -> Result<Self> {
        let mut paths = fs::read_dir(dir)
            .with_context(|| format!("Failed to read image directory {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.is_file())
            .filter(|path| image::ImageFormat::from_path(path).is_ok())
            .collect::<Vec<_>>();

        if paths.is_empty() {
            bail!("No images found in {}", dir.display());
        }

        paths.sort();
        debug!("playing back {} images from {}", paths.len(), dir.display());

        Ok(ImageSequenceCamera {
            paths,
            next: 0,
            frame_period,
        })
    }
}

impl Camera for ImageSequenceCamera {
    fn grab_frame(&mut self) -> Result<Frame> {
        if !self.frame_period.is_zero() {
            thread::sleep(self.frame_period);
        }

        let path = &self.paths[self.next];
        self.next = (self.next + 1) % self.paths.len();

        let frame = image::open(path)
            .with_context(|| format!("Failed to decode {}", path.display()))?
            .to_rgb8();

        Ok(frame)
    }
}

/// The peg camera and the rear camera. Both can be grabbed from
/// interchangeably; the caller picks which by [`CameraSource`].
pub struct CameraPair<P, S> {
    primary: P,
    secondary: S,
}

impl<P: Camera, S: Camera> CameraPair<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        CameraPair { primary, secondary }
    }

    pub fn grab_frame(&mut self, source: CameraSource) -> Result<Frame> {
        match source {
            CameraSource::Primary => self.primary.grab_frame(),
            CameraSource::Secondary => self.secondary.grab_frame(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_strips() {
        let frame = render_strips(
            64,
            48,
            &[TapeStrip {
                x: 10,
                y: 5,
                width: 4,
                height: 6,
            }],
        );

        assert_eq!(*frame.get_pixel(10, 5), TAPE_COLOR);
        assert_eq!(*frame.get_pixel(13, 10), TAPE_COLOR);
        assert_eq!(*frame.get_pixel(14, 10), Rgb([0, 0, 0]));
        assert_eq!(*frame.get_pixel(13, 11), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_peg_strips_are_centered_on_offset() {
        let [left, right] = peg_strips(320, 240, -30., 1.);

        let left_center = left.x as f64 + left.width as f64 / 2.;
        let right_center = right.x as f64 + right.width as f64 / 2.;

        assert_eq!((left_center + right_center) / 2., 130.);
        assert_eq!(left.width, 16);
        assert_eq!(left.y, right.y);
    }

    #[test]
    fn test_synthetic_camera_noise_is_seeded() {
        let scene = || peg_strips(80, 60, 0., 0.5).to_vec();
        let mut a = SyntheticCamera::new(80, 60, scene)
            .with_noise(5.)
            .unwrap()
            .with_seed(7);
        let mut b = SyntheticCamera::new(80, 60, scene)
            .with_noise(5.)
            .unwrap()
            .with_seed(7);

        let frame = a.grab_frame().unwrap();
        assert_eq!(frame, b.grab_frame().unwrap());
        assert_eq!(frame.dimensions(), (80, 60));
        assert!(frame.pixels().any(|pixel| *pixel != Rgb([0, 0, 0])));
    }

    #[test]
    fn test_camera_pair_switches() {
        let primary = SyntheticCamera::new(8, 8, || {
            vec![TapeStrip {
                x: 0,
                y: 0,
                width: 8,
                height: 8,
            }]
        });
        let secondary = SyntheticCamera::new(8, 8, Vec::new);
        let mut cameras = CameraPair::new(primary, secondary);

        let frame = cameras.grab_frame(CameraSource::Primary).unwrap();
        assert_eq!(*frame.get_pixel(4, 4), TAPE_COLOR);

        let frame = cameras.grab_frame(CameraSource::Secondary).unwrap();
        assert_eq!(*frame.get_pixel(4, 4), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_image_sequence_requires_images() {
        let dir = std::env::temp_dir().join(format!("vision-2017-empty-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        assert!(ImageSequenceCamera::open(&dir, Duration::ZERO).is_err());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_image_sequence_loops() {
        let dir = std::env::temp_dir().join(format!("vision-2017-seq-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        render_strips(16, 16, &[]).save(dir.join("a.png")).unwrap();
        render_strips(
            16,
            16,
            &[TapeStrip {
                x: 0,
                y: 0,
                width: 16,
                height: 16,
            }],
        )
        .save(dir.join("b.png"))
        .unwrap();
        fs::write(dir.join("notes.txt"), "not an image").unwrap();

        let mut camera = ImageSequenceCamera::open(&dir, Duration::ZERO).unwrap();
        let colors: Vec<Rgb<u8>> = (0..3)
            .map(|_| *camera.grab_frame().unwrap().get_pixel(0, 0))
            .collect();

        assert_eq!(colors, [Rgb([0, 0, 0]), TAPE_COLOR, Rgb([0, 0, 0])]);

        fs::remove_dir_all(&dir).unwrap();
    }
}
