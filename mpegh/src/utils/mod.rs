//! Supporting infrastructure for the decode pipeline.
//!
//! Provides aligned workspace allocation, error types, and sample layout
//! conversion.

pub mod aligned;
pub mod errors;
pub mod pcm;
