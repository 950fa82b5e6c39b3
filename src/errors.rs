// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatrixError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Version error: {0}")]
    VersionError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("failed to spawn command '{command}': {source}")]
    SpawnError {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("setup command '{command}' exited with code {code}")]
    FatalSetupFailure { command: String, code: i32 },

    #[error("Report error: {0}")]
    ReportError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MatrixError {
    /// Process exit code the binary should use when this error ends the run.
    ///
    /// A failed setup command hands its own exit code through; one killed
    /// by signal `N` (reported as `-N`) maps to the shell's `128 + N`.
    /// Everything else is a plain `1`.
    pub fn exit_code(&self) -> i32 {
        match self {
            MatrixError::FatalSetupFailure { code, .. } if *code > 0 => *code,
            MatrixError::FatalSetupFailure { code, .. } if *code < 0 => 128 + code.saturating_neg(),
            _ => 1,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, MatrixError>;
