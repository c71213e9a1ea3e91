use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use super::command::{AudioFormat, Cli, DecodeArgs};
use crate::input::{FrameReader, InputReader};
use crate::wav::WavWriter;
use mpegh::process::FRAME_SAMPLES;
use mpegh::process::session::{DecodeOutput, Session};

enum AudioWriter {
    Wav(WavWriter<File>),
    Pcm(BufWriter<File>),
}

impl AudioWriter {
    fn create(path: &Path, format: AudioFormat, session: &Session) -> Result<Self> {
        let path = path_with_extension(path, format);
        log::info!("Creating audio file: {}", path.display());
        let file = File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;

        Ok(match format {
            AudioFormat::Wav => {
                let mut writer = WavWriter::new(
                    file,
                    session.output_sample_rate(),
                    session.output_channel_count() as u32,
                );
                writer.write_header()?;
                AudioWriter::Wav(writer)
            }
            AudioFormat::Pcm => AudioWriter::Pcm(BufWriter::new(file)),
        })
    }

    fn write_samples(&mut self, samples: &[f32]) -> Result<()> {
        match self {
            AudioWriter::Wav(writer) => writer.write_samples(samples)?,
            AudioWriter::Pcm(writer) => {
                for &sample in samples {
                    writer.write_all(&sample.to_le_bytes())?;
                }
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        match self {
            AudioWriter::Wav(writer) => writer.finish()?,
            AudioWriter::Pcm(writer) => writer.flush()?,
        }
        Ok(())
    }
}

fn path_with_extension(base: &Path, format: AudioFormat) -> PathBuf {
    let expected = match format {
        AudioFormat::Wav => "wav",
        AudioFormat::Pcm => "pcm",
    };
    if base.extension().is_some_and(|ext| ext == expected) {
        base.to_path_buf()
    } else {
        let mut path = base.to_path_buf();
        path.set_extension(expected);
        path
    }
}

pub fn cmd_decode(args: &DecodeArgs, _cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    let mut session = open_session()?;

    if let Some(config_path) = &args.config {
        let config = std::fs::read(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        log::info!(
            "Configuring decoder out of band: {} ({} bytes)",
            config_path.display(),
            config.len()
        );
        session.configure(&config)?;
    }

    log::info!("Decoding frame capture: {}", args.input.display());

    let pb = multi.map(|multi| {
        let pb = multi.add(ProgressBar::new_spinner());
        if let Ok(style) =
            ProgressStyle::with_template("{spinner:.green} {pos} frames\n{msg} | elapsed: {elapsed_precise}")
        {
            pb.set_style(style);
        }
        pb.set_message("decoding");
        pb
    });

    let mut frames = FrameReader::new(InputReader::new(&args.input)?);
    let mut writer = None;
    let mut output = vec![0.0f32; FRAME_SAMPLES];
    let mut pending_frames = 0u64;
    let mut decoded_frames = 0u64;
    let mut decoded_samples = 0u64;
    let start_time = std::time::Instant::now();

    while let Some(frame) = frames.next_frame()? {
        let result = session
            .decode(&frame, &mut output)
            .with_context(|| format!("decode failed at frame {}", frames.frames_read()))?;

        match result {
            DecodeOutput::Pending => pending_frames += 1,
            DecodeOutput::Frame { samples } => {
                write_frame(args, &session, &mut writer, &output[..samples])?;
                decoded_frames += 1;
                decoded_samples += samples as u64;
            }
        }

        if let Some(ref pb) = pb {
            pb.set_position(frames.frames_read());
        }
    }

    // Every frame held back by the renderer pipeline is still buffered
    // vendor side; flush them out.
    for _ in 0..pending_frames {
        if !session.is_configured() {
            break;
        }
        let result = session
            .decode_end_of_stream(&mut output)
            .context("end-of-stream flush failed")?;
        if let DecodeOutput::Frame { samples } = result {
            write_frame(args, &session, &mut writer, &output[..samples])?;
            decoded_frames += 1;
            decoded_samples += samples as u64;
        }
    }

    if let Some(mut writer) = writer {
        writer.finish()?;
    }

    let channel_samples = decoded_samples / session.output_channel_count() as u64;
    let duration_secs = channel_samples as f64 / session.output_sample_rate() as f64;
    if let Some(pb) = pb {
        pb.finish_with_message(format!(
            "decoded {:.3}s of audio in {:.3}s",
            duration_secs,
            start_time.elapsed().as_secs_f64()
        ));
    }
    log::info!(
        "Processing complete: {} frames in, {} frames out, {:.3}s of audio",
        frames.frames_read(),
        decoded_frames,
        duration_secs
    );

    Ok(())
}

fn write_frame(
    args: &DecodeArgs,
    session: &Session,
    writer: &mut Option<AudioWriter>,
    samples: &[f32],
) -> Result<()> {
    let Some(base_path) = &args.output_path else {
        return Ok(());
    };
    if writer.is_none() {
        *writer = Some(AudioWriter::create(base_path, args.format, session)?);
    }
    if let Some(writer) = writer {
        writer.write_samples(samples)?;
    }
    Ok(())
}

#[cfg(feature = "vendor")]
fn open_session() -> Result<Session> {
    Session::with_vendor_library()
}

#[cfg(not(feature = "vendor"))]
fn open_session() -> Result<Session> {
    anyhow::bail!(
        "this build does not link the vendor decoder library; rebuild with `--features vendor`"
    )
}
