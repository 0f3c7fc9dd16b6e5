//! Exit codes for the CLI.
//!
//! Structured codes let scripts tell a missing framebuffer apart from a
//! failed capture or a failed --exec command.

/// Exit codes for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
pub enum ExitCode {
    /// Operation completed successfully
    Success = 0,
    /// General/unspecified error
    GeneralError = 1,
    /// Invalid command-line arguments
    InvalidArguments = 2,
    /// No framebuffer device was found
    NoFramebuffer = 3,
    /// Measuring or converting a framebuffer failed
    CaptureFailed = 4,
    /// The --exec command failed
    CommandFailed = 5,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitCode::Success => write!(f, "success"),
            ExitCode::GeneralError => write!(f, "general error"),
            ExitCode::InvalidArguments => write!(f, "invalid arguments"),
            ExitCode::NoFramebuffer => write!(f, "no framebuffer found"),
            ExitCode::CaptureFailed => write!(f, "capture failed"),
            ExitCode::CommandFailed => write!(f, "command failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::GeneralError.as_i32(), 1);
        assert_eq!(ExitCode::InvalidArguments.as_i32(), 2);
        assert_eq!(ExitCode::NoFramebuffer.as_i32(), 3);
        assert_eq!(ExitCode::CaptureFailed.as_i32(), 4);
        assert_eq!(ExitCode::CommandFailed.as_i32(), 5);
    }
}
