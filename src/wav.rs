use std::io::{self, BufWriter, Seek, SeekFrom, Write};

const WAVE_FORMAT_IEEE_FLOAT: u16 = 3;
const BITS_PER_SAMPLE: u32 = 32;

/// RIFF/WAVE writer for interleaved 32-bit float PCM.
///
/// Chunk sizes are back-patched by [`finish`](Self::finish); a file that
/// was never finished has zeroed size fields.
pub struct WavWriter<W: Write + Seek> {
    writer: BufWriter<W>,
    sample_rate: u32,
    channels: u32,
    data_written: u64,
    riff_size_position: u64,
    fact_frames_position: u64,
    data_size_position: u64,
}

impl<W: Write + Seek> WavWriter<W> {
    pub fn new(writer: W, sample_rate: u32, channels: u32) -> Self {
        Self {
            writer: BufWriter::new(writer),
            sample_rate,
            channels,
            data_written: 0,
            riff_size_position: 0,
            fact_frames_position: 0,
            data_size_position: 0,
        }
    }

    /// Write the RIFF header, fmt and fact chunks, and the data chunk
    /// preamble.
    pub fn write_header(&mut self) -> io::Result<()> {
        self.writer.write_all(b"RIFF")?;
        self.riff_size_position = self.writer.stream_position()?;
        self.writer.write_all(&0u32.to_le_bytes())?; // patched in finish()
        self.writer.write_all(b"WAVE")?;

        // fmt chunk; cbSize = 0 extension for the non-PCM format tag
        self.writer.write_all(b"fmt ")?;
        self.writer.write_all(&18u32.to_le_bytes())?;
        self.writer
            .write_all(&WAVE_FORMAT_IEEE_FLOAT.to_le_bytes())?;
        self.writer
            .write_all(&(self.channels as u16).to_le_bytes())?;
        self.writer.write_all(&self.sample_rate.to_le_bytes())?;

        let byte_rate = self.sample_rate * self.channels * (BITS_PER_SAMPLE / 8);
        self.writer.write_all(&byte_rate.to_le_bytes())?;

        let block_align = self.channels * (BITS_PER_SAMPLE / 8);
        self.writer.write_all(&(block_align as u16).to_le_bytes())?;
        self.writer
            .write_all(&(BITS_PER_SAMPLE as u16).to_le_bytes())?;
        self.writer.write_all(&0u16.to_le_bytes())?;

        // fact chunk, required for non-PCM formats
        self.writer.write_all(b"fact")?;
        self.writer.write_all(&4u32.to_le_bytes())?;
        self.fact_frames_position = self.writer.stream_position()?;
        self.writer.write_all(&0u32.to_le_bytes())?; // patched in finish()

        self.writer.write_all(b"data")?;
        self.data_size_position = self.writer.stream_position()?;
        self.writer.write_all(&0u32.to_le_bytes())?; // patched in finish()

        Ok(())
    }

    /// Append interleaved float samples.
    pub fn write_samples(&mut self, samples: &[f32]) -> io::Result<()> {
        for &sample in samples {
            self.writer.write_all(&sample.to_le_bytes())?;
        }
        self.data_written += samples.len() as u64 * 4;
        Ok(())
    }

    /// Patch the size fields and flush.
    pub fn finish(&mut self) -> io::Result<()> {
        self.writer.flush()?;

        let end = self.writer.stream_position()?;

        self.writer.seek(SeekFrom::Start(self.riff_size_position))?;
        self.writer
            .write_all(&((end - 8) as u32).to_le_bytes())?;

        let sample_frames = self.data_written / (self.channels as u64 * 4);
        self.writer
            .seek(SeekFrom::Start(self.fact_frames_position))?;
        self.writer
            .write_all(&(sample_frames as u32).to_le_bytes())?;

        self.writer.seek(SeekFrom::Start(self.data_size_position))?;
        self.writer
            .write_all(&(self.data_written as u32).to_le_bytes())?;

        self.writer.seek(SeekFrom::Start(end))?;
        self.writer.flush()?;

        Ok(())
    }

    /// Get the underlying writer
    pub fn into_inner(self) -> io::Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error())
    }

    pub fn data_written(&self) -> u64 {
        self.data_written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn header_layout() -> io::Result<()> {
        let mut writer = WavWriter::new(Cursor::new(Vec::new()), 48_000, 2);
        writer.write_header()?;

        let buffer = writer.into_inner()?.into_inner();

        assert_eq!(&buffer[0..4], b"RIFF");
        assert_eq!(&buffer[8..12], b"WAVE");
        assert_eq!(&buffer[12..16], b"fmt ");
        // format tag 3 (IEEE float), 2 channels, 48 kHz, 32 bits
        assert_eq!(u16::from_le_bytes([buffer[20], buffer[21]]), 3);
        assert_eq!(u16::from_le_bytes([buffer[22], buffer[23]]), 2);
        assert_eq!(
            u32::from_le_bytes([buffer[24], buffer[25], buffer[26], buffer[27]]),
            48_000
        );
        assert_eq!(u16::from_le_bytes([buffer[34], buffer[35]]), 32);
        assert_eq!(&buffer[38..42], b"fact");
        assert_eq!(&buffer[50..54], b"data");
        Ok(())
    }

    #[test]
    fn finish_patches_sizes() -> io::Result<()> {
        let mut writer = WavWriter::new(Cursor::new(Vec::new()), 48_000, 2);
        writer.write_header()?;
        writer.write_samples(&[0.0, 0.5, -0.5, 1.0])?;
        assert_eq!(writer.data_written(), 16);
        writer.finish()?;

        let buffer = writer.into_inner()?.into_inner();

        let riff_size = u32::from_le_bytes([buffer[4], buffer[5], buffer[6], buffer[7]]);
        assert_eq!(riff_size as usize, buffer.len() - 8);

        // fact sample frames: 4 samples over 2 channels
        assert_eq!(
            u32::from_le_bytes([buffer[46], buffer[47], buffer[48], buffer[49]]),
            2
        );

        let data_size =
            u32::from_le_bytes([buffer[54], buffer[55], buffer[56], buffer[57]]);
        assert_eq!(data_size, 16);

        // last sample is 1.0f32
        let last = f32::from_le_bytes([
            buffer[buffer.len() - 4],
            buffer[buffer.len() - 3],
            buffer[buffer.len() - 2],
            buffer[buffer.len() - 1],
        ]);
        assert_eq!(last, 1.0);
        Ok(())
    }
}
