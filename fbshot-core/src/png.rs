//! PNG output backend over the `png` crate's streaming writer.

use crate::convert::{stream_frame, RowSink};
use crate::error::SaveError;
use crate::geometry::FrameGeometry;
use crate::pixel::CHANNELS;
use png::{BitDepth, ColorType, Encoder, StreamWriter};
use std::io::{Read, Write};
use tracing::debug;

/// Row-buffer sink feeding the PNG encoder one scanline at a time.
///
/// The encoder writes the IHDR up front; each completed row goes out as
/// soon as `end_row` fires, so the frame is never held in memory.
pub struct PngSink<W: Write + 'static> {
    stream: StreamWriter<'static, W>,
    row: Vec<u8>,
}

impl<W: Write + 'static> PngSink<W> {
    /// Write the PNG header (8-bit RGB, no interlacing) and set up a
    /// one-row stream writer.
    pub fn new(out: W, geometry: &FrameGeometry) -> Result<Self, SaveError> {
        let row_len = geometry.width as usize * CHANNELS;
        let mut encoder = Encoder::new(out, geometry.width, geometry.height);
        encoder.set_color(ColorType::Rgb);
        encoder.set_depth(BitDepth::Eight);
        let writer = encoder.write_header()?;
        let stream = writer.into_stream_writer_with_size(row_len)?;
        Ok(Self {
            stream,
            row: vec![0; row_len],
        })
    }

    /// Finalize the image (flush remaining data and the IEND chunk).
    pub fn finish(self) -> Result<(), SaveError> {
        self.stream.finish()?;
        Ok(())
    }
}

impl<W: Write + 'static> RowSink for PngSink<W> {
    fn put_pixel(&mut self, column: usize, r: u8, g: u8, b: u8) -> Result<(), SaveError> {
        self.row[column] = r;
        self.row[column + 1] = g;
        self.row[column + 2] = b;
        Ok(())
    }

    fn end_row(&mut self) -> Result<(), SaveError> {
        self.stream.write_all(&self.row)?;
        Ok(())
    }
}

/// Stream a whole frame from `source` into a PNG image on `out`.
pub fn save_png<R: Read, W: Write + 'static>(
    source: &mut R,
    geometry: &FrameGeometry,
    out: W,
) -> Result<(), SaveError> {
    debug!(width = geometry.width, height = geometry.height, "writing PNG stream");
    let mut sink = PngSink::new(out, geometry)?;
    stream_frame(source, geometry, &mut sink)?;
    sink.finish()
}
