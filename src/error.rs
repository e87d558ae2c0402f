//! Error types and exit codes for swa-engine.

use std::process::ExitCode;
use thiserror::Error;

/// Main error type for swa-engine operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error in {path}: {message}")]
    Parse { path: String, message: String },

    #[error("external symbol index error: {message}")]
    ExternalIndex { message: String },

    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Configuration { .. } => ExitCode::from(1),
            Self::Io { .. } => ExitCode::from(2),
            Self::Parse { .. } => ExitCode::from(3),
            Self::ExternalIndex { .. } => ExitCode::from(4),
            Self::Cancelled => ExitCode::from(5),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
