use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use anyhow::{Result, bail};

/// Unified input reader that handles both file and pipe input with
/// buffered reading
pub struct InputReader {
    reader: Box<dyn Read>,
}

impl InputReader {
    /// Create a new InputReader from a path
    /// Use "-" for stdin pipe input
    pub fn new<P: AsRef<Path>>(input_path: P) -> Result<Self> {
        let path_str = input_path.as_ref().to_string_lossy();

        let reader: Box<dyn Read> = if path_str == "-" {
            Box::new(io::stdin().lock())
        } else {
            let file = File::open(input_path)?;
            Box::new(BufReader::new(file))
        };

        Ok(Self { reader })
    }
}

impl Read for InputReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

/// Upper bound on a single captured frame; anything larger means the
/// capture is corrupt or not a capture at all.
const MAX_CAPTURED_FRAME: u32 = 1 << 24;

/// Splits a frame capture into compressed frames.
///
/// A capture is a flat sequence of frames, each prefixed with its byte
/// length as a 4-byte little-endian word. This is transport framing for
/// the tool only; frame contents are opaque and handed to the decoder
/// unchanged.
pub struct FrameReader<R: Read> {
    reader: R,
    frames_read: u64,
}

impl<R: Read> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            frames_read: 0,
        }
    }

    /// Reads the next frame, or `None` at a clean end of input.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        let mut prefix = [0u8; 4];
        match read_exact_or_eof(&mut self.reader, &mut prefix)? {
            Filled::Eof => return Ok(None),
            Filled::Partial(got) => {
                bail!(
                    "truncated length prefix after frame {}: got {got} of 4 bytes",
                    self.frames_read
                );
            }
            Filled::Complete => {}
        }

        let length = u32::from_le_bytes(prefix);
        if length == 0 {
            bail!("zero-length frame at index {}", self.frames_read);
        }
        if length > MAX_CAPTURED_FRAME {
            bail!(
                "frame {} claims {length} bytes; capture is corrupt",
                self.frames_read
            );
        }

        let mut frame = vec![0u8; length as usize];
        self.reader.read_exact(&mut frame).map_err(|err| {
            anyhow::anyhow!("truncated frame {} ({length} bytes): {err}", self.frames_read)
        })?;

        self.frames_read += 1;
        Ok(Some(frame))
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }
}

enum Filled {
    Complete,
    Partial(usize),
    Eof,
}

fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<Filled> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 if filled == 0 => return Ok(Filled::Eof),
            0 => return Ok(Filled::Partial(filled)),
            n => filled += n,
        }
    }
    Ok(Filled::Complete)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn capture(frames: &[&[u8]]) -> Vec<u8> {
        let mut data = Vec::new();
        for frame in frames {
            data.extend_from_slice(&(frame.len() as u32).to_le_bytes());
            data.extend_from_slice(frame);
        }
        data
    }

    #[test]
    fn reads_frames_in_order() {
        let data = capture(&[&[1, 2, 3], &[4], &[5; 1024]]);
        let mut reader = FrameReader::new(Cursor::new(data));

        assert_eq!(reader.next_frame().unwrap().unwrap(), vec![1, 2, 3]);
        assert_eq!(reader.next_frame().unwrap().unwrap(), vec![4]);
        assert_eq!(reader.next_frame().unwrap().unwrap(), vec![5; 1024]);
        assert!(reader.next_frame().unwrap().is_none());
        assert_eq!(reader.frames_read(), 3);
    }

    #[test]
    fn empty_capture_is_clean_eof() {
        let mut reader = FrameReader::new(Cursor::new(Vec::new()));
        assert!(reader.next_frame().unwrap().is_none());
    }

    #[test]
    fn truncated_prefix_is_an_error() {
        let mut data = capture(&[&[1, 2]]);
        data.extend_from_slice(&[7, 0]); // half a length word
        let mut reader = FrameReader::new(Cursor::new(data));

        reader.next_frame().unwrap();
        assert!(reader.next_frame().is_err());
    }

    #[test]
    fn truncated_payload_is_an_error() {
        let mut data = Vec::new();
        data.extend_from_slice(&16u32.to_le_bytes());
        data.extend_from_slice(&[0; 8]);
        let mut reader = FrameReader::new(Cursor::new(data));
        assert!(reader.next_frame().is_err());
    }

    #[test]
    fn zero_and_oversized_lengths_are_rejected() {
        let mut reader = FrameReader::new(Cursor::new(0u32.to_le_bytes().to_vec()));
        assert!(reader.next_frame().is_err());

        let mut reader =
            FrameReader::new(Cursor::new((MAX_CAPTURED_FRAME + 1).to_le_bytes().to_vec()));
        assert!(reader.next_frame().is_err());
    }
}
