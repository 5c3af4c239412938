use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use vision_2017::{analysis::PegTapeAnalyzer, extraction::RetroTapeExtractor, pipeline::Detector};

/// Runs peg detection over still images and prints the measured offsets.
#[derive(Debug, Parser)]
#[command(about)]
struct Args {
    #[arg(required = true)]
    image_paths: Vec<PathBuf>,
    /// Writes the annotated frames here.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if let Some(dir) = &args.output_dir {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let detector = Detector::new(RetroTapeExtractor::new(), PegTapeAnalyzer::new());

    for path in &args.image_paths {
        let mut frame = image::open(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
            .to_rgb8();

        let measurement = detector.detect(&mut frame);
        match measurement.offset() {
            Some(offset) => println!("{}: {:+.1} px", path.display(), offset),
            None => println!("{}: no target", path.display()),
        }

        if let Some(dir) = &args.output_dir {
            let stem = path
                .file_stem()
                .with_context(|| format!("{} has no file name", path.display()))?;
            let out = dir.join(stem).with_extension("png");

            frame
                .save(&out)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            info!("wrote {}", out.display());
        }
    }

    Ok(())
}
