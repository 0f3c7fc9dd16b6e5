//! Capture orchestration: device scan, pattern evaluation, image save,
//! command execution.

use crate::colors;
use crate::config::{self, AppConfig};
use crate::device::{self, DeviceError, ALT_PATH_LIMIT};
use crate::exec::{self, ExecError};
use crate::exit_codes::ExitCode;
use crate::ImageFormat;
use fbshot_core::error::{PatternError, SaveError};
use fbshot_core::geometry::FrameGeometry;
use fbshot_core::pattern;
use fbshot_core::pnm::save_pnm;
use fbshot_core::png::save_png;
use std::fmt;
use std::fs::File;
use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};

/// Default filename pattern when stdout is a terminal; the configured
/// format's extension is appended.
const DEFAULT_PATTERN: &str = "%Y-%m-%d_%H:%M:%S_$wx$h.$i";

/// Environment variables whose presence suggests a display server.
const DISPLAY_VARS: &[&str] = &[
    "DISPLAY",
    "MDS_DISPLAY",
    "MIR_DISPLAY",
    "WAYLAND_DISPLAY",
    "PREFERRED_DISPLAY",
];

/// Everything one capture run needs, owned per invocation.
struct CaptureContext<'a> {
    pattern: Option<&'a str>,
    exec: Option<&'a str>,
    format: ImageFormat,
    config: &'a AppConfig,
    quiet: bool,
}

/// Error from capturing one framebuffer. Carries the path that failed
/// where one is known, so the report can name it.
#[derive(Debug)]
enum CaptureError {
    Device(DeviceError),
    Pattern(PatternError),
    Open { path: PathBuf, source: io::Error },
    Save { path: Option<PathBuf>, source: SaveError },
    Exec(ExecError),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::Device(err) => write!(f, "{}", err),
            CaptureError::Pattern(err) => write!(f, "{}", err),
            CaptureError::Open { path, source } => {
                write!(f, "{}: {}", path.display(), source)
            }
            CaptureError::Save { path: Some(path), source } => {
                write!(f, "{}: {}", path.display(), source)
            }
            CaptureError::Save { path: None, source } => write!(f, "{}", source),
            CaptureError::Exec(err) => write!(f, "{}", err),
        }
    }
}

impl CaptureError {
    fn exit_code(&self) -> ExitCode {
        match self {
            CaptureError::Exec(_) => ExitCode::CommandFailed,
            _ => ExitCode::CaptureFailed,
        }
    }
}

/// Entry point after argument parsing.
pub fn capture(
    pattern: Option<String>,
    device: Option<u32>,
    exec: Option<String>,
    format: Option<ImageFormat>,
    quiet: bool,
) -> ExitCode {
    let config = config::load_config();
    let format = format.or(config.output.format).unwrap_or(ImageFormat::Png);

    // With no pattern and stdout redirected, the single image is piped;
    // on a terminal a timestamped filename is used instead.
    let pattern = match pattern {
        Some(p) => Some(p),
        None if io::stdout().is_terminal() => {
            Some(format!("{}.{}", DEFAULT_PATTERN, format.extension()))
        }
        None => None,
    };
    if pattern.is_none() && exec.is_some() {
        eprintln!("{}", colors::error("--exec cannot be combined with piping"));
        return ExitCode::InvalidArguments;
    }

    let ctx = CaptureContext {
        pattern: pattern.as_deref(),
        exec: exec.as_deref(),
        format,
        config: &config,
        quiet,
    };

    match run_capture(&ctx, device) {
        Ok(true) => {
            if have_display() && !quiet {
                eprintln!(
                    "{}",
                    colors::warning(
                        "it looks like you are inside a display server; \
                         what you see is probably not what you get"
                    )
                );
            }
            ExitCode::Success
        }
        Ok(false) => {
            if device.is_some() {
                eprintln!("{}", colors::error("the selected device does not exist"));
            } else {
                eprintln!(
                    "{}",
                    colors::error(
                        "unable to find a framebuffer; \
                         try 'mknod /dev/fb0 c 29 0 && chgrp video /dev/fb0' as root"
                    )
                );
            }
            ExitCode::NoFramebuffer
        }
        Err(err) => {
            eprintln!("{}", colors::error(&err.to_string()));
            err.exit_code()
        }
    }
}

/// Scan framebuffer devices and capture each one.
///
/// Returns whether any device was found. With an explicit device index
/// only that device is tried; otherwise every existing device is captured,
/// tolerating a hole at index 0 and retrying with the alternate path
/// pattern when a scan finds nothing at all.
fn run_capture(ctx: &CaptureContext, device: Option<u32>) -> Result<bool, CaptureError> {
    if let Some(index) = device {
        let path = device::fb_path(0, index);
        if !path.exists() {
            return Ok(false);
        }
        capture_one(ctx, &path, index)?;
        return Ok(true);
    }

    for alt in 0..=ALT_PATH_LIMIT {
        let mut found = false;
        for index in 0..u32::MAX {
            let path = device::fb_path(alt, index);
            if !path.exists() {
                if index == 0 {
                    // Perhaps framebuffer 1 is the first.
                    continue;
                }
                break;
            }
            capture_one(ctx, &path, index)?;
            found = true;
        }
        if found {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Measure, convert and post-process one framebuffer.
fn capture_one(ctx: &CaptureContext, fb_path: &Path, index: u32) -> Result<(), CaptureError> {
    let geometry = device::measure(fb_path).map_err(CaptureError::Device)?;
    tracing::debug!(
        device = %fb_path.display(),
        width = geometry.width,
        height = geometry.height,
        "measured framebuffer"
    );

    let img_path = match ctx.pattern {
        Some(p) => {
            let rendered = pattern::evaluate_path(p, index, geometry.width, geometry.height)
                .map_err(CaptureError::Pattern)?;
            Some(config::resolve_output_path(ctx.config, &rendered))
        }
        None => None,
    };

    save_image(fb_path, &geometry, img_path.as_deref(), ctx.format)?;

    let Some(img_path) = img_path else {
        return Ok(());
    };
    if !ctx.quiet {
        eprintln!(
            "{}",
            colors::success(&format!(
                "Saved framebuffer {} to {}.",
                index,
                img_path.display()
            ))
        );
    }

    if let Some(exec_pattern) = ctx.exec {
        let path_str = img_path.to_string_lossy();
        let args = pattern::evaluate_command(
            exec_pattern,
            index,
            geometry.width,
            geometry.height,
            &path_str,
        )
        .map_err(CaptureError::Pattern)?;
        exec::run_command(&args).map_err(CaptureError::Exec)?;
    }
    Ok(())
}

/// Stream the device into the image file, or onto stdout when piping.
///
/// A file that fails mid-write is left behind as-is; deleting partial
/// output is the caller's call, not the converter's.
fn save_image(
    fb_path: &Path,
    geometry: &FrameGeometry,
    img_path: Option<&Path>,
    format: ImageFormat,
) -> Result<(), CaptureError> {
    let mut source = File::open(fb_path).map_err(|source| CaptureError::Open {
        path: fb_path.to_path_buf(),
        source,
    })?;
    match img_path {
        Some(path) => {
            let out = File::create(path).map_err(|source| CaptureError::Open {
                path: path.to_path_buf(),
                source,
            })?;
            write_frame(&mut source, geometry, out, format).map_err(|source| {
                CaptureError::Save {
                    path: Some(path.to_path_buf()),
                    source,
                }
            })
        }
        None => {
            let stdout = io::stdout();
            write_frame(&mut source, geometry, stdout.lock(), format)
                .map_err(|source| CaptureError::Save { path: None, source })
        }
    }
}

fn write_frame<R: Read, W: Write + 'static>(
    source: &mut R,
    geometry: &FrameGeometry,
    out: W,
    format: ImageFormat,
) -> Result<(), SaveError> {
    match format {
        ImageFormat::Png => save_png(source, geometry, out),
        ImageFormat::Pnm => save_pnm(source, geometry, out),
    }
}

/// Whether the environment suggests a display server is running.
fn have_display() -> bool {
    DISPLAY_VARS
        .iter()
        .any(|var| std::env::var_os(var).is_some_and(|value| !value.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pattern_gets_the_format_extension() {
        let name = format!("{}.{}", DEFAULT_PATTERN, ImageFormat::Png.extension());
        assert!(name.ends_with(".png"));
        let name = format!("{}.{}", DEFAULT_PATTERN, ImageFormat::Pnm.extension());
        assert!(name.ends_with(".pnm"));
    }

    #[test]
    fn exec_failures_map_to_their_own_exit_code() {
        let err = CaptureError::Exec(ExecError::EmptyCommand);
        assert_eq!(err.exit_code(), ExitCode::CommandFailed);
        let err = CaptureError::Pattern(PatternError::Format);
        assert_eq!(err.exit_code(), ExitCode::CaptureFailed);
    }

    #[test]
    fn capture_errors_name_the_failing_path() {
        let err = CaptureError::Open {
            path: PathBuf::from("/tmp/shot.png"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/tmp/shot.png"));
    }
}
