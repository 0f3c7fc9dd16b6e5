//! Framebuffer device discovery and measurement.

use fbshot_core::error::GeometryError;
use fbshot_core::geometry::FrameGeometry;
use std::fmt;
use std::path::{Path, PathBuf};

/// Highest alternate path-pattern index tried when scanning all devices
/// turns up nothing.
pub const ALT_PATH_LIMIT: usize = 2;

/// Build the path to a framebuffer device.
///
/// `alt == 0` gives the usual `/dev/fbN`; nonzero selects the `/dev/fb/N`
/// layout used by devfs-style setups.
pub fn fb_path(alt: usize, index: u32) -> PathBuf {
    if alt == 0 {
        PathBuf::from(format!("/dev/fb{}", index))
    } else {
        PathBuf::from(format!("/dev/fb/{}", index))
    }
}

/// Error from measuring a framebuffer device.
#[derive(Debug)]
pub enum DeviceError {
    /// Opening or querying the device failed
    Access(String),
    /// The device reports a pixel layout the converter cannot handle
    Unsupported(GeometryError),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::Access(msg) => write!(f, "Cannot access framebuffer: {}", msg),
            DeviceError::Unsupported(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for DeviceError {}

/// Query a device's frame geometry via the screen-info ioctls.
///
/// Width and height come from the variable screen info; the stride is the
/// fixed line length converted from bytes to pixels; the panning offsets
/// place the visible frame inside the backing store.
#[cfg(target_os = "linux")]
pub fn measure(path: &Path) -> Result<FrameGeometry, DeviceError> {
    let path_str = path.to_string_lossy();
    let fb = framebuffer::Framebuffer::new(&*path_str)
        .map_err(|e| DeviceError::Access(e.to_string()))?;
    let var = &fb.var_screen_info;
    let fix = &fb.fix_screen_info;

    if var.bits_per_pixel != 32 {
        return Err(DeviceError::Unsupported(GeometryError::UnsupportedDepth {
            bits_per_pixel: var.bits_per_pixel,
        }));
    }

    let stride = fix.line_length / (var.bits_per_pixel / 8);
    FrameGeometry::new(var.xres, var.yres, stride, var.xoffset, var.yoffset)
        .map_err(DeviceError::Unsupported)
}

#[cfg(not(target_os = "linux"))]
pub fn measure(_path: &Path) -> Result<FrameGeometry, DeviceError> {
    Err(DeviceError::Access(
        "framebuffer capture is only implemented on Linux".to_string(),
    ))
}
