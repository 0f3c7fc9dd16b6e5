//! Error types for geometry, image saving and pattern evaluation.

use std::fmt;
use std::io;

/// Error raised while the frame geometry is being established.
///
/// All of these are fatal for the affected device: the pixel layout cannot
/// be converted, so no capture is attempted.
#[derive(Debug)]
pub enum GeometryError {
    /// Width or height of zero
    EmptyFrame { width: u32, height: u32 },
    /// Row stride smaller than the visible width
    StrideTooSmall { stride: u32, width: u32 },
    /// Pixels are not packed as whole 32-bit words
    UnsupportedDepth { bits_per_pixel: u32 },
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::EmptyFrame { width, height } => {
                write!(f, "Frame has no visible pixels: {}x{}", width, height)
            }
            GeometryError::StrideTooSmall { stride, width } => {
                write!(f, "Row stride {} is smaller than the width {}", stride, width)
            }
            GeometryError::UnsupportedDepth { bits_per_pixel } => {
                write!(
                    f,
                    "Unsupported pixel depth: {} bits per pixel (only packed 32-bit pixels are supported)",
                    bits_per_pixel
                )
            }
        }
    }
}

impl std::error::Error for GeometryError {}

/// Error while streaming a frame into an image file.
#[derive(Debug)]
pub enum SaveError {
    /// Reading the source or writing the destination failed
    Io(io::Error),
    /// The PNG encoder rejected a write
    Png(png::EncodingError),
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::Io(err) => write!(f, "I/O error: {}", err),
            SaveError::Png(err) => write!(f, "PNG encoding error: {}", err),
        }
    }
}

impl std::error::Error for SaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SaveError::Io(err) => Some(err),
            SaveError::Png(err) => Some(err),
        }
    }
}

impl From<io::Error> for SaveError {
    fn from(err: io::Error) -> Self {
        SaveError::Io(err)
    }
}

impl From<png::EncodingError> for SaveError {
    fn from(err: png::EncodingError) -> Self {
        SaveError::Png(err)
    }
}

/// Error from filename/command pattern evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternError {
    /// The output buffer cannot hold the rendered string. The evaluator
    /// retries with a doubled buffer; callers never see this variant from
    /// [`crate::pattern::evaluate`].
    BufferTooSmall,
    /// A `$` escape used a letter outside the substitution table
    UnknownVariable(char),
    /// The calendar formatter rejected the format string
    Format,
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::BufferTooSmall => write!(f, "Rendered pattern does not fit the buffer"),
            PatternError::UnknownVariable(c) => write!(f, "Unknown pattern variable: ${}", c),
            PatternError::Format => write!(f, "Invalid calendar format in pattern"),
        }
    }
}

impl std::error::Error for PatternError {}
