//! Terminal color support for CLI output.
//!
//! Colorful output when running interactively, with automatic detection to
//! disable colors when stderr is piped or redirected. All user-facing
//! notices go to stderr so they never mix with a piped image on stdout.

use owo_colors::OwoColorize;
use std::io::IsTerminal;

/// Check if stderr is a terminal (interactive mode).
fn is_stderr_interactive() -> bool {
    std::io::stderr().is_terminal()
}

/// Style for error messages.
pub fn error(msg: &str) -> String {
    if is_stderr_interactive() {
        format!("{} {}", "error:".red().bold(), msg)
    } else {
        format!("error: {}", msg)
    }
}

/// Style for warning messages.
pub fn warning(msg: &str) -> String {
    if is_stderr_interactive() {
        format!("{} {}", "warning:".yellow().bold(), msg)
    } else {
        format!("warning: {}", msg)
    }
}

/// Style for success messages.
pub fn success(msg: &str) -> String {
    if is_stderr_interactive() {
        format!("{}", msg.green())
    } else {
        msg.to_string()
    }
}
