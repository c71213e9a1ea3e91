//! Per-frame decode pipeline.
//!
//! 1. **Session** ([`process::session`](session)): owns the vendor decoder
//!    handle, drives the write-frame/render-frame cycle, and interleaves
//!    the renderer's planar output.
//!
//! 2. **Level control** ([`process::alc`](alc)): fixed-parameter streaming
//!    dynamics stage run in place over every decoded frame.

pub mod alc;
pub mod session;

/// Output sample rate of the renderer.
pub const SAMPLE_RATE: u32 = 48_000;

/// Samples per channel produced by one render call.
pub const SAMPLES_PER_FRAME: usize = 1024;

/// Channels in the rendered output.
pub const NUM_CHANNELS: usize = 2;

/// Interleaved samples in one output frame.
pub const FRAME_SAMPLES: usize = SAMPLES_PER_FRAME * NUM_CHANNELS;

/// Most channels any renderer configuration produces.
pub const MAX_RENDER_CHANNELS: usize = 14;

/// Largest compressed frame the self-framed reader accepts.
pub const MHAS_FRAME_MAX_SIZE: usize = 19_072;

/// Frames the renderer buffers internally before the first valid output.
pub const PIPELINE_DELAY_FRAMES: usize = 1;

/// Fixed make-up gain applied by the level-control stage, in dB.
pub const AMPLIFY_GAIN_DB: i32 = 1;
