//! Orchestration layer for a binary-only MPEG-H 3D audio
//! decoder/renderer library with automatic level control.
//!
//! The decoding, rendering, and level-control algorithms live in opaque
//! vendor libraries reached through handle-based C APIs. This crate
//! implements everything around them: handle and configuration lifetime,
//! the per-frame write/render cycle with its warm-up delay, planar to
//! interleaved conversion, and the level-control post stage with its
//! aligned workspace.
//!
//! ## Pipeline
//!
//! Per frame: compressed input bytes are fed to the vendor's bitstream
//! reader, one rendered frame of planar PCM is requested, the planes are
//! interleaved, and the level-control kernel mutates the interleaved
//! frame in place. During the renderer's fixed pipeline delay a decode
//! call reports pending output instead of samples.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mpegh::process::FRAME_SAMPLES;
//! use mpegh::process::session::{DecodeOutput, Session};
//!
//! # fn compressed_frames() -> Vec<Vec<u8>> { unimplemented!() }
//! // Requires the `vendor` feature and the vendor libraries at link time.
//! # #[cfg(feature = "vendor")]
//! # fn run() -> anyhow::Result<()> {
//! let mut session = Session::with_vendor_library()?;
//! let mut pcm = vec![0.0f32; FRAME_SAMPLES];
//!
//! for frame in compressed_frames() {
//!     match session.decode(&frame, &mut pcm)? {
//!         DecodeOutput::Pending => continue,
//!         DecodeOutput::Frame { samples } => {
//!             // interleaved 32-bit float samples in pcm[..samples]
//!         }
//!     }
//! }
//!
//! // Flush the renderer's buffered frame.
//! session.decode_end_of_stream(&mut pcm)?;
//! # Ok(())
//! # }
//! ```

/// Per-frame decode pipeline.
///
/// 1. **Session management** ([`process::session`]): configuration and
///    handle lifetime, the write-frame/render-frame cycle, and pipeline
///    warm-up tracking.
///
/// 2. **Level control** ([`process::alc`]): the streaming dynamics stage
///    applied to every decoded frame.
pub mod process;

/// Boundary to the closed vendor libraries.
///
/// - **Backend traits** ([`vendor::DecoderBackend`], [`vendor::AlcBackend`])
/// - **Raw C ABI** (`vendor::sys`, `vendor` feature)
/// - **Linked backends** (`SonyDecoder`/`SonyAlc`, `vendor` feature)
pub mod vendor;

/// Utility functions and supporting infrastructure.
///
/// - **Aligned workspace** ([`utils::aligned`]): kernel work-area ownership
/// - **Error types** ([`utils::errors`])
/// - **Sample layout** ([`utils::pcm`]): planar/interleaved conversion
pub mod utils;
