//! Row geometry of one captured frame.

use crate::error::GeometryError;

/// Describes how one frame's pixels are laid out in the device's backing
/// store: visible size, row stride, and the panning offset of the first
/// visible pixel.
///
/// Computed once per capture, before the first byte is read, and immutable
/// for the duration of the conversion. Whether any padding/panning
/// bookkeeping applies at all is decided here, once, instead of being
/// re-inferred from individual fields during conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    /// Visible width in pixels.
    pub width: u32,
    /// Visible height in pixels.
    pub height: u32,
    /// Pixel offset of the first visible pixel.
    start: u64,
    /// Pixel offset one past the last visible pixel. Only meaningful while
    /// `padded` is set.
    end: u64,
    /// Non-visible pixels appended after each visible row.
    hblank: u32,
    /// Whether panning/blanking bookkeeping applies.
    padded: bool,
}

impl FrameGeometry {
    /// Build the geometry for one frame.
    ///
    /// `stride` is the device's row length in pixels and must be at least
    /// `width`. A zero `stride` together with a zero panning offset marks
    /// the unpadded fast path used for devices that do not report a line
    /// length; every bounds check is skipped in that mode.
    pub fn new(
        width: u32,
        height: u32,
        stride: u32,
        xoffset: u32,
        yoffset: u32,
    ) -> Result<Self, GeometryError> {
        if width == 0 || height == 0 {
            return Err(GeometryError::EmptyFrame { width, height });
        }
        let start = u64::from(yoffset) * u64::from(stride) + u64::from(xoffset);
        let padded = !(start == 0 && stride == 0);
        if padded && stride < width {
            return Err(GeometryError::StrideTooSmall { stride, width });
        }
        let (end, hblank) = if padded {
            (start + u64::from(stride) * u64::from(height), stride - width)
        } else {
            (0, 0)
        };
        Ok(Self {
            width,
            height,
            start,
            end,
            hblank,
            padded,
        })
    }

    /// Geometry for a frame stored contiguously (`stride == width`, no
    /// panning).
    pub fn packed(width: u32, height: u32) -> Result<Self, GeometryError> {
        Self::new(width, height, width, 0, 0)
    }

    /// Geometry taking the unpadded fast path: no stride, no panning, no
    /// end-of-frame marker.
    pub fn unpadded(width: u32, height: u32) -> Result<Self, GeometryError> {
        Self::new(width, height, 0, 0, 0)
    }

    pub(crate) fn is_padded(&self) -> bool {
        self.padded
    }

    pub(crate) fn start(&self) -> u64 {
        self.start
    }

    pub(crate) fn end(&self) -> u64 {
        self.end
    }

    pub(crate) fn hblank(&self) -> u32 {
        self.hblank
    }
}
