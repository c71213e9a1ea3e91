use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use super::command::{Cli, InfoArgs};
use crate::input::{FrameReader, InputReader};
use mpegh::process::alc::AlcConfig;
use mpegh::process::{NUM_CHANNELS, SAMPLE_RATE, SAMPLES_PER_FRAME};

#[derive(Default)]
struct CaptureStats {
    frames: u64,
    total_bytes: u64,
    min_frame: Option<usize>,
    max_frame: usize,
}

pub fn cmd_info(args: &InfoArgs, _cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!("Analyzing frame capture: {}", args.input.display());

    let pb = multi.map(|multi| {
        let pb = multi.add(ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb.set_message("Scanning frames...");
        pb
    });

    let mut frames = FrameReader::new(InputReader::new(&args.input)?);
    let mut stats = CaptureStats::default();
    while let Some(frame) = frames.next_frame()? {
        stats.frames += 1;
        stats.total_bytes += frame.len() as u64;
        stats.min_frame = Some(stats.min_frame.map_or(frame.len(), |min| min.min(frame.len())));
        stats.max_frame = stats.max_frame.max(frame.len());
    }

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    if stats.frames == 0 {
        println!("No frames found in the capture.");
        println!("This doesn't appear to be a valid frame capture.");
        return Ok(());
    }

    let duration_secs =
        stats.frames as f64 * SAMPLES_PER_FRAME as f64 / f64::from(SAMPLE_RATE);

    println!("Capture");
    println!("  Frames:        {}", stats.frames);
    println!("  Payload bytes: {}", stats.total_bytes);
    println!(
        "  Frame size:    {}..{} bytes",
        stats.min_frame.unwrap_or(0),
        stats.max_frame
    );
    println!("  Duration:      {duration_secs:.3}s (at {SAMPLES_PER_FRAME} samples/frame)");

    println!();
    println!("Decoder");
    println!("  Library:       {}", decoder_version());
    println!("  Output:        {NUM_CHANNELS} ch, {SAMPLE_RATE} Hz, 32-bit float");

    let alc = AlcConfig::default();
    println!();
    println!("Level control");
    println!("  fs:            {}", alc.sample_rate);
    println!("  delay:         {}", alc.delay);
    println!("  att_time:      {:#x}", alc.attack_time);
    println!("  rel_time:      {:#x}", alc.release_time);
    println!("  comp_thresh:   {:#x}", alc.comp_thresh);
    println!("  gate_thresh:   {:#x}", alc.gate_thresh);
    println!("  gain:          {} dB", alc.gain_db);

    Ok(())
}

#[cfg(feature = "vendor")]
fn decoder_version() -> String {
    mpegh::vendor::vendor_library_version().to_string()
}

#[cfg(not(feature = "vendor"))]
fn decoder_version() -> String {
    "not linked (built without the `vendor` feature)".to_string()
}
