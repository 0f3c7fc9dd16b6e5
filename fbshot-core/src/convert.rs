//! Streaming conversion from raw framebuffer bytes to image rows.
//!
//! The converter consumes the device's byte stream in arbitrary-sized
//! chunks and pushes fully assembled rows into a [`RowSink`] as soon as
//! they complete. It never buffers a frame and never splits a pixel: a
//! chunk's trailing 1-3 bytes are reported back to the caller, who
//! re-delivers them at the front of the next chunk.

use crate::error::SaveError;
use crate::geometry::FrameGeometry;
use crate::pixel::{self, BYTES_PER_PIXEL, CHANNELS};
use std::io::Read;

/// Destination for assembled image rows.
///
/// `put_pixel` receives the output column in channel units (pixel column
/// already multiplied by the channel count); `end_row` is called exactly
/// once per completed row. The text backend writes immediately and ignores
/// the column; the binary backend fills a row buffer and flushes it on
/// `end_row`.
pub trait RowSink {
    fn put_pixel(&mut self, column: usize, r: u8, g: u8, b: u8) -> Result<(), SaveError>;
    fn end_row(&mut self) -> Result<(), SaveError>;
}

/// Mutable conversion bookkeeping carried across the chunks of one capture.
///
/// Created once per frame, mutated by every [`convert`] call, discarded
/// when the stream ends.
#[derive(Debug, Default)]
pub struct ConversionState {
    /// Output column within the active row, in channel units.
    column: usize,
    /// Input pixels examined so far, including non-visible ones. Only
    /// consulted when the geometry is padded.
    position: u64,
}

impl ConversionState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Convert one chunk of raw bytes, emitting completed rows into `sink`.
///
/// Only whole pixels are consumed. Returns the number of trailing bytes
/// (0-3) that did not form a complete pixel; the caller must shift them to
/// the front of its buffer and make the next chunk start with them.
pub fn convert<S: RowSink>(
    geometry: &FrameGeometry,
    state: &mut ConversionState,
    sink: &mut S,
    chunk: &[u8],
) -> Result<usize, SaveError> {
    let width3 = geometry.width as usize * CHANNELS;
    if geometry.is_padded() {
        let row_len = width3 + geometry.hblank() as usize * CHANNELS;
        for raw in chunk.chunks_exact(BYTES_PER_PIXEL) {
            let (r, g, b) = pixel::unpack(raw);
            let pos = state.position;
            state.position += 1;
            if pos < geometry.start() || pos >= geometry.end() {
                continue;
            }
            // Blank columns advance the row position but are never stored.
            if state.column < width3 {
                sink.put_pixel(state.column, r, g, b)?;
            }
            state.column += CHANNELS;
            if state.column == row_len {
                sink.end_row()?;
                state.column = 0;
            }
        }
    } else {
        for raw in chunk.chunks_exact(BYTES_PER_PIXEL) {
            let (r, g, b) = pixel::unpack(raw);
            sink.put_pixel(state.column, r, g, b)?;
            state.column += CHANNELS;
            if state.column == width3 {
                sink.end_row()?;
                state.column = 0;
            }
        }
    }
    Ok(chunk.len() % BYTES_PER_PIXEL)
}

/// Size of the read buffer used by [`stream_frame`].
const READ_BUF_LEN: usize = 8 << 10;

/// Drive [`convert`] over an entire byte stream.
///
/// Reads `source` to end in whatever chunk sizes it yields, carrying
/// partial pixels between reads. The sink sees every visible row exactly
/// once, regardless of how the stream was split.
pub fn stream_frame<R: Read, S: RowSink>(
    source: &mut R,
    geometry: &FrameGeometry,
    sink: &mut S,
) -> Result<(), SaveError> {
    let mut state = ConversionState::new();
    let mut buf = [0u8; READ_BUF_LEN];
    let mut carry = 0usize;
    loop {
        let got = source.read(&mut buf[carry..])?;
        if got == 0 {
            break;
        }
        let valid = carry + got;
        let rest = convert(geometry, &mut state, sink, &buf[..valid])?;
        if rest > 0 {
            buf.copy_within(valid - rest..valid, 0);
        }
        carry = rest;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    /// Sink collecting rows as RGB byte vectors.
    #[derive(Default)]
    struct CollectSink {
        rows: Vec<Vec<u8>>,
        current: Vec<u8>,
    }

    impl RowSink for CollectSink {
        fn put_pixel(&mut self, column: usize, r: u8, g: u8, b: u8) -> Result<(), SaveError> {
            if self.current.len() < column + CHANNELS {
                self.current.resize(column + CHANNELS, 0);
            }
            self.current[column] = r;
            self.current[column + 1] = g;
            self.current[column + 2] = b;
            Ok(())
        }

        fn end_row(&mut self) -> Result<(), SaveError> {
            self.rows.push(std::mem::take(&mut self.current));
            Ok(())
        }
    }

    /// Reader that yields at most one byte per read call.
    struct TrickleReader<'a> {
        data: &'a [u8],
        pos: usize,
    }

    impl Read for TrickleReader<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.pos >= self.data.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.data[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    /// Build a stream of `count` packed pixels with distinct channel values.
    fn pixel_stream(count: usize) -> Vec<u8> {
        let mut data = Vec::with_capacity(count * BYTES_PER_PIXEL);
        for i in 0..count {
            let i = i as u8;
            // blue, green, red, padding
            data.extend_from_slice(&[i, i.wrapping_add(1), i.wrapping_add(2), 0]);
        }
        data
    }

    fn convert_in_one_chunk(geometry: &FrameGeometry, data: &[u8]) -> Vec<Vec<u8>> {
        let mut sink = CollectSink::default();
        let mut state = ConversionState::new();
        let rest = convert(geometry, &mut state, &mut sink, data).unwrap();
        assert_eq!(rest, data.len() % BYTES_PER_PIXEL);
        sink.rows
    }

    #[test]
    fn trailing_bytes_are_reported_not_consumed() {
        let geometry = FrameGeometry::packed(2, 2).unwrap();
        let mut sink = CollectSink::default();
        let mut state = ConversionState::new();
        assert_eq!(convert(&geometry, &mut state, &mut sink, &[0; 5]).unwrap(), 1);
        assert_eq!(convert(&geometry, &mut state, &mut sink, &[0; 3]).unwrap(), 3);
        assert_eq!(convert(&geometry, &mut state, &mut sink, &[0; 8]).unwrap(), 0);
    }

    #[test]
    fn blank_columns_are_counted_but_not_emitted() {
        // Stride 5, width 4, height 2: pixel positions 4 and 9 are the
        // blank column of each row.
        let geometry = FrameGeometry::new(4, 2, 5, 0, 0).unwrap();
        let data = pixel_stream(10);
        let rows = convert_in_one_chunk(&geometry, &data);
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.len(), 4 * CHANNELS);
        }
        // Row 1 starts at pixel 5, not pixel 4.
        assert_eq!(rows[1][0], 7); // red channel of pixel index 5
        assert_eq!(rows[1][2], 5); // blue channel of pixel index 5
    }

    #[test]
    fn panning_offset_skips_leading_pixels() {
        let geometry = FrameGeometry::new(2, 2, 2, 0, 1).unwrap();
        // Positions 0-1 are dead, 2-5 visible, 6-7 past the end.
        let data = pixel_stream(8);
        let rows = convert_in_one_chunk(&geometry, &data);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][2], 2); // blue of pixel index 2
        assert_eq!(rows[1][2], 4); // blue of pixel index 4
    }

    #[test]
    fn optimized_and_general_paths_match() {
        let packed = FrameGeometry::packed(3, 2).unwrap();
        let fast = FrameGeometry::unpadded(3, 2).unwrap();
        let data = pixel_stream(6);
        assert_eq!(
            convert_in_one_chunk(&packed, &data),
            convert_in_one_chunk(&fast, &data)
        );
    }

    #[test]
    fn output_is_identical_for_all_chunkings() {
        let geometry = FrameGeometry::new(4, 2, 5, 0, 0).unwrap();
        let data = pixel_stream(10);
        let expected = convert_in_one_chunk(&geometry, &data);

        for split in 1..data.len() {
            let mut sink = CollectSink::default();
            let mut state = ConversionState::new();
            let mut buf = data[..split].to_vec();
            let rest = convert(&geometry, &mut state, &mut sink, &buf).unwrap();
            // Carry the unconsumed tail, exactly as a reader would.
            buf.drain(..buf.len() - rest);
            buf.extend_from_slice(&data[split..]);
            let rest = convert(&geometry, &mut state, &mut sink, &buf).unwrap();
            assert_eq!(rest, 0);
            assert_eq!(sink.rows, expected, "split at byte {}", split);
        }
    }

    #[test]
    fn stream_frame_handles_single_byte_reads() {
        let geometry = FrameGeometry::packed(3, 2).unwrap();
        let data = pixel_stream(6);
        let expected = convert_in_one_chunk(&geometry, &data);

        let mut reader = TrickleReader { data: &data, pos: 0 };
        let mut sink = CollectSink::default();
        stream_frame(&mut reader, &geometry, &mut sink).unwrap();
        assert_eq!(sink.rows, expected);
    }

    #[test]
    fn pixels_past_the_frame_end_are_ignored() {
        let geometry = FrameGeometry::packed(2, 2).unwrap();
        // Two extra pixels past the visible frame, as when the device
        // exposes more backing store than one frame.
        let data = pixel_stream(6);
        let rows = convert_in_one_chunk(&geometry, &data);
        assert_eq!(rows.len(), 2);
    }
}
