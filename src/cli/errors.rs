//! CLI-specific error types
//!
//! Subsystem errors keep their own codes; the CLI only adds input and
//! I/O failures.

use std::io;

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::index::IndexError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Input JSON has the wrong shape.
    #[error("invalid input: {0}")]
    Input(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    pub fn input(message: impl Into<String>) -> Self {
        CliError::Input(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(e) => e.code(),
            CliError::Index(e) => e.code(),
            CliError::Catalog(e) => e.code(),
            CliError::Input(_) => "CLI_INPUT_INVALID",
            CliError::Io(_) => "CLI_IO_ERROR",
            CliError::Json(_) => "CLI_JSON_ERROR",
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
