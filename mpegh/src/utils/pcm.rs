//! Sample layout conversion between the renderer's planar output and the
//! interleaved layout handed to callers.
//!
//! Planar layout orders a buffer channel-first:
//!
//! ```text
//! [ch0 s0, ch0 s1, .. ch0 sN-1, ch1 s0, ch1 s1, .. ch1 sN-1, ..]
//! ```
//!
//! Interleaved layout orders it sample-first:
//!
//! ```text
//! [ch0 s0, ch1 s0, .. chM-1 s0, ch0 s1, ch1 s1, .. chM-1 s1, ..]
//! ```

/// Index of `(channel, sample)` in a planar buffer.
#[inline]
pub const fn planar_index(channel: usize, sample: usize, samples_per_frame: usize) -> usize {
    samples_per_frame * channel + sample
}

/// Index of `(channel, sample)` in an interleaved buffer.
#[inline]
pub const fn interleaved_index(channel: usize, channels: usize, sample: usize) -> usize {
    channels * sample + channel
}

/// Copies a planar frame into `dest` in interleaved order.
///
/// `src` must hold exactly `samples_per_frame * channels` samples; `dest`
/// must hold at least as many.
pub fn interleave(dest: &mut [f32], src: &[f32], samples_per_frame: usize, channels: usize) {
    let total = samples_per_frame * channels;
    assert_eq!(src.len(), total, "planar frame length mismatch");
    assert!(dest.len() >= total, "interleaved buffer too small");

    for sample in 0..samples_per_frame {
        for channel in 0..channels {
            dest[interleaved_index(channel, channels, sample)] =
                src[planar_index(channel, sample, samples_per_frame)];
        }
    }
}

/// Copies an interleaved frame into `dest` in planar order.
pub fn deinterleave(dest: &mut [f32], src: &[f32], samples_per_frame: usize, channels: usize) {
    let total = samples_per_frame * channels;
    assert_eq!(src.len(), total, "interleaved frame length mismatch");
    assert!(dest.len() >= total, "planar buffer too small");

    for sample in 0..samples_per_frame {
        for channel in 0..channels {
            dest[planar_index(channel, sample, samples_per_frame)] =
                src[interleaved_index(channel, channels, sample)];
        }
    }
}
