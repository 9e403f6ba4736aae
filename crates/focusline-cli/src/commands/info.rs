use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use focusline_core::asset::VideoAsset;
use focusline_core::decode::FrameStream;
use focusline_core::timecode::format_timestamp;

use super::analyze::media_type_for;

#[derive(Args)]
pub struct InfoArgs {
    /// Input video file
    pub file: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let asset = VideoAsset::new(bytes, media_type_for(&args.file));
    let stream = FrameStream::open(&asset)?;
    let header = stream.header();

    println!("File:        {}", args.file.display());
    println!("Frames:      {}", stream.frame_count());
    println!("Dimensions:  {}x{}", header.width, header.height);
    println!("Bit depth:   {}", header.pixel_depth);
    println!("Color mode:  {}", header.color_label());
    println!(
        "Timestamps:  {}",
        if stream.has_timestamp_trailer() {
            "per-frame trailer"
        } else {
            "synthesized (30 fps)"
        }
    );
    println!("Duration:    ~{}", format_timestamp(stream.duration_us()));

    let frame_bytes = header.frame_byte_size()?;
    let total_mb = (frame_bytes * stream.frame_count()) as f64 / (1024.0 * 1024.0);
    println!("Data size:   {:.1} MB", total_mb);

    Ok(())
}
