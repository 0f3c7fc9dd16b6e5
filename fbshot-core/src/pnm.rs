//! Plain-text PNM (P3) output backend.

use crate::convert::{stream_frame, RowSink};
use crate::error::SaveError;
use crate::geometry::FrameGeometry;
use once_cell::sync::Lazy;
use std::io::{BufWriter, Read, Write};
use tracing::debug;

/// Decimal renderings of 0-255, each with a trailing newline.
///
/// PNM allows any whitespace between samples; one sample per line keeps
/// lines well under the format's 70-column recommendation and lets the hot
/// loop emit a pre-rendered string per channel instead of formatting.
static INT_TABLE: Lazy<[String; 256]> = Lazy::new(|| std::array::from_fn(|i| format!("{}\n", i)));

/// Text row sink emitting one decimal sample per line.
pub struct PnmSink<W: Write> {
    out: W,
}

impl<W: Write> PnmSink<W> {
    /// Write the `P3` header and wrap `out` as a row sink.
    pub fn new(mut out: W, geometry: &FrameGeometry) -> Result<Self, SaveError> {
        write!(out, "P3\n{} {}\n255\n", geometry.width, geometry.height)?;
        Ok(Self { out })
    }

    /// Flush buffered output.
    pub fn finish(mut self) -> Result<(), SaveError> {
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> RowSink for PnmSink<W> {
    fn put_pixel(&mut self, _column: usize, r: u8, g: u8, b: u8) -> Result<(), SaveError> {
        self.out.write_all(INT_TABLE[r as usize].as_bytes())?;
        self.out.write_all(INT_TABLE[g as usize].as_bytes())?;
        self.out.write_all(INT_TABLE[b as usize].as_bytes())?;
        Ok(())
    }

    fn end_row(&mut self) -> Result<(), SaveError> {
        Ok(())
    }
}

/// Stream a whole frame from `source` into a PNM image on `out`.
pub fn save_pnm<R: Read, W: Write>(
    source: &mut R,
    geometry: &FrameGeometry,
    out: W,
) -> Result<(), SaveError> {
    debug!(width = geometry.width, height = geometry.height, "writing PNM stream");
    let mut sink = PnmSink::new(BufWriter::new(out), geometry)?;
    stream_frame(source, geometry, &mut sink)?;
    sink.finish()
}
