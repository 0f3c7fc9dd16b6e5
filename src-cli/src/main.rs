//! fbshot — framebuffer screenshot CLI
//!
//! Captures the raw contents of Linux framebuffer devices (`/dev/fb*`)
//! into PNG or PNM images named by a filename pattern, optionally running
//! a command over each saved image.

mod colors;
mod commands;
mod config;
mod device;
mod exec;
mod exit_codes;

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// fbshot - Framebuffer screenshot CLI
#[derive(Parser, Debug)]
#[command(name = "fbshot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Filename pattern for saved images. Supports $-variables ($i device
    /// index, $w width, $h height, $p pixel count, $$ literal dollar),
    /// backslash escapes and strftime %-escapes. Omit to pipe one image to
    /// stdout when stdout is not a terminal.
    pattern: Option<String>,

    /// Capture only the framebuffer with this index
    #[arg(short, long, value_name = "INDEX")]
    device: Option<u32>,

    /// Command pattern to run on each saved image; additionally supports
    /// $f (image path) and $n (image basename), with unescaped spaces
    /// separating arguments
    #[arg(short, long, value_name = "PATTERN")]
    exec: Option<String>,

    /// Output image format (defaults to the configured format, then png)
    #[arg(short, long, value_enum)]
    format: Option<ImageFormat>,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Supported output encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// 8-bit RGB PNG, no interlacing
    Png,
    /// Plain-text PNM (P3)
    Pnm,
}

impl ImageFormat {
    /// File extension used by the default filename pattern.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Pnm => "pnm",
        }
    }
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(if cli.verbose { "debug" } else { "warn" })
        }))
        .with_writer(std::io::stderr)
        .init();

    let exit_code = commands::capture(cli.pattern, cli.device, cli.exec, cli.format, cli.quiet);
    std::process::exit(exit_code.as_i32());
}
