use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the simulator
#[derive(Error, Debug)]
pub enum SimulatorError {
    #[error("Failed to load program: {0}")]
    ProgramLoadError(#[from] ProgramError),

    #[error("Failed to export report: {0}")]
    ExportError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("No instructions executed")]
    NoInstructionsExecuted,
}

/// Errors related to reading program files
#[derive(Error, Debug)]
pub enum ProgramError {
    #[error("Failed to read program file '{0}': {1}")]
    FileReadError(PathBuf, #[source] std::io::Error),
}

/// Type alias for Result with SimulatorError
pub type SimulatorResult<T> = Result<T, SimulatorError>;
