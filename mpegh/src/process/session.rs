use anyhow::{Result, bail};
use log::{debug, info, warn};

use crate::process::alc::AlcStage;
use crate::process::{
    FRAME_SAMPLES, MHAS_FRAME_MAX_SIZE, NUM_CHANNELS, PIPELINE_DELAY_FRAMES, SAMPLE_RATE,
    SAMPLES_PER_FRAME,
};
use crate::utils::errors::SessionError;
use crate::utils::pcm::interleave;
use crate::vendor::DecoderBackend;

/// How the open bitstream carries its configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Framing {
    /// Raw elementary stream; configuration supplied out of band.
    OutOfBand,
    /// Self-framed stream; configuration read from the first frame.
    InBand,
}

/// Result of one decode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeOutput {
    /// The renderer is still filling its internal pipeline; no samples
    /// were produced. Expected during warm-up, not an error.
    Pending,
    /// One interleaved frame was written to the output buffer.
    Frame { samples: usize },
}

/// One decoder instance: vendor handle, configuration lifetime, and the
/// per-frame write/render cycle.
///
/// A session is single threaded; calls must be serialized by the caller.
/// Constructing one acquires the vendor handle (a construction failure in
/// the backend means no session exists), after which the life cycle is
///
/// ```text
/// initialized --configure/auto-configure--> configured --decode*-->
///     configured --reset_decoder--> initialized
/// ```
///
/// Dropping the session tears down any configured state and releases the
/// handle.
pub struct Session {
    decoder: Box<dyn DecoderBackend>,
    alc: AlcStage,
    /// Owned for the whole configured lifetime; the vendor retains a
    /// reference to the open configuration.
    config: Option<Box<[u8]>>,
    framing: Option<Framing>,
    delay_frames: usize,
    planar: Box<[f32]>,
}

impl Session {
    pub fn new(decoder: Box<dyn DecoderBackend>, alc: AlcStage) -> Self {
        info!("decoder library version {}", decoder.library_version());
        Self {
            decoder,
            alc,
            config: None,
            framing: None,
            delay_frames: 0,
            planar: vec![0.0; FRAME_SAMPLES].into_boxed_slice(),
        }
    }

    /// Opens a session over the linked vendor libraries.
    #[cfg(feature = "vendor")]
    pub fn with_vendor_library() -> Result<Self> {
        use crate::vendor::{SonyAlc, SonyDecoder};

        let decoder = SonyDecoder::new()?;
        let alc = AlcStage::new(Box::new(SonyAlc::new()));
        Ok(Self::new(Box::new(decoder), alc))
    }

    /// Configures the session from out-of-band configuration bytes.
    ///
    /// Valid only while unconfigured. On any vendor failure the partially
    /// opened state is rolled back and the session stays exactly as it
    /// was.
    pub fn configure(&mut self, config: &[u8]) -> Result<()> {
        if self.framing.is_some() {
            bail!(SessionError::AlreadyConfigured);
        }
        if config.is_empty() {
            bail!(SessionError::EmptyInput);
        }

        let owned: Box<[u8]> = config.into();
        self.decoder.raw_open(&owned)?;
        if let Err(err) = self.decoder.init() {
            if let Err(close_err) = self.decoder.raw_close() {
                warn!("rollback close failed: {close_err}");
            }
            return Err(err.into());
        }

        debug!("configured from {} config bytes", owned.len());
        self.config = Some(owned);
        self.framing = Some(Framing::OutOfBand);
        Ok(())
    }

    /// Infers configuration from the first frame of a self-framed stream.
    fn configure_in_band(&mut self, frame: &[u8]) -> Result<()> {
        if frame.len() > MHAS_FRAME_MAX_SIZE {
            bail!(SessionError::FrameTooLarge {
                size: frame.len(),
                limit: MHAS_FRAME_MAX_SIZE,
            });
        }

        let mut padded = vec![0u8; MHAS_FRAME_MAX_SIZE].into_boxed_slice();
        padded[..frame.len()].copy_from_slice(frame);

        self.decoder.stream_open(&padded)?;
        if let Err(err) = self.decoder.init() {
            if let Err(close_err) = self.decoder.stream_close() {
                warn!("rollback close failed: {close_err}");
            }
            return Err(err.into());
        }

        debug!("configured in band from a {} byte frame", frame.len());
        self.config = Some(padded);
        self.framing = Some(Framing::InBand);
        Ok(())
    }

    /// Decodes one compressed frame into `output` (interleaved f32).
    ///
    /// An unconfigured session configures itself from the frame. During
    /// renderer warm-up this returns [`DecodeOutput::Pending`] with no
    /// samples written; afterwards every call yields a full frame.
    pub fn decode(&mut self, input: &[u8], output: &mut [f32]) -> Result<DecodeOutput> {
        self.check_output_capacity(output)?;
        if input.is_empty() {
            if self.framing.is_none() {
                bail!(SessionError::NotConfigured);
            }
            bail!(SessionError::EmptyInput);
        }

        if self.framing.is_none() {
            self.configure_in_band(input)?;
        }

        let last_frame = self.write_frame(input)?;

        if self.delay_frames < PIPELINE_DELAY_FRAMES {
            self.delay_frames += 1;
            debug!(
                "renderer warming up ({}/{PIPELINE_DELAY_FRAMES})",
                self.delay_frames
            );
            return Ok(DecodeOutput::Pending);
        }

        self.render_frame(last_frame, output)
    }

    /// Flushes the renderer's buffered frame at end of stream.
    ///
    /// No input is consumed; the render call is marked as the stream's
    /// final frame.
    pub fn decode_end_of_stream(&mut self, output: &mut [f32]) -> Result<DecodeOutput> {
        self.check_output_capacity(output)?;
        if self.framing.is_none() {
            bail!(SessionError::NotConfigured);
        }
        self.render_frame(true, output)
    }

    fn write_frame(&mut self, input: &[u8]) -> Result<bool> {
        let Some(framing) = self.framing else {
            bail!(SessionError::NotConfigured);
        };
        let last_frame = match framing {
            Framing::OutOfBand => self.decoder.raw_read_frame(input)?,
            Framing::InBand => self.decoder.stream_read_frame(input)?,
        };
        Ok(last_frame)
    }

    fn render_frame(&mut self, last_frame: bool, output: &mut [f32]) -> Result<DecodeOutput> {
        let mut post_flags = [0i32; NUM_CHANNELS];
        self.decoder
            .render_frame(last_frame, &mut self.planar, &mut post_flags)?;

        let frame = &mut output[..FRAME_SAMPLES];
        interleave(frame, &self.planar, SAMPLES_PER_FRAME, NUM_CHANNELS);
        self.alc.process(frame, 0)?;

        Ok(DecodeOutput::Frame {
            samples: FRAME_SAMPLES,
        })
    }

    /// Clears streaming state without discarding configuration. Used when
    /// seeking; the renderer warm-up starts over.
    pub fn reset_buffer(&mut self) -> Result<()> {
        if self.framing.is_none() {
            bail!(SessionError::NotConfigured);
        }
        self.decoder.reset()?;
        self.delay_frames = 0;
        Ok(())
    }

    /// Tears the configured state down, returning the session to
    /// initialized so it can be configured again with new bytes.
    pub fn reset_decoder(&mut self) -> Result<()> {
        if self.framing.is_none() {
            bail!(SessionError::NotConfigured);
        }
        self.teardown();
        Ok(())
    }

    fn teardown(&mut self) {
        if let Err(err) = self.decoder.close() {
            warn!("decoder close failed: {err}");
        }
        let close_result = match self.framing {
            Some(Framing::OutOfBand) => self.decoder.raw_close(),
            Some(Framing::InBand) => self.decoder.stream_close(),
            None => Ok(()),
        };
        if let Err(err) = close_result {
            warn!("bitstream close failed: {err}");
        }

        self.config = None;
        self.framing = None;
        self.delay_frames = 0;
    }

    fn check_output_capacity(&self, output: &[f32]) -> Result<()> {
        if output.len() < FRAME_SAMPLES {
            bail!(SessionError::OutputTooSmall {
                got: output.len(),
                needed: FRAME_SAMPLES,
            });
        }
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.framing.is_some()
    }

    pub fn output_channel_count(&self) -> usize {
        NUM_CHANNELS
    }

    pub fn output_sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    pub fn output_samples_per_frame(&self) -> usize {
        SAMPLES_PER_FRAME
    }

    pub fn level_control(&self) -> &AlcStage {
        &self.alc
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.framing.is_some() {
            self.teardown();
        }
    }
}
