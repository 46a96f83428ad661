//! Process exit classifications.

use std::process::ExitCode;

/// Exit code constants.
pub mod codes {
    /// Normal termination.
    pub const SUCCESS: i32 = 0;
    /// Engine startup or serve failed, or a sink could not start.
    pub const RUNTIME_ERROR: i32 = 1;
    /// Bad flags or undecodable values.
    pub const BAD_COMMAND_LINE: i32 = 2;
    /// Second shutdown signal before the server stopped.
    pub const DOUBLE_SIGNAL: i32 = 3;
}

/// How the process ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitClass {
    Success,
    RuntimeError,
    BadCommandLine,
    DoubleSignal,
}

impl ExitClass {
    pub fn code(&self) -> i32 {
        match self {
            Self::Success => codes::SUCCESS,
            Self::RuntimeError => codes::RUNTIME_ERROR,
            Self::BadCommandLine => codes::BAD_COMMAND_LINE,
            Self::DoubleSignal => codes::DOUBLE_SIGNAL,
        }
    }
}

impl From<ExitClass> for ExitCode {
    fn from(class: ExitClass) -> Self {
        // codes are all small and non-negative
        ExitCode::from(class.code() as u8)
    }
}
