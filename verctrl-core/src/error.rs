//! Error types for verctrl operations

use std::path::PathBuf;
use thiserror::Error;

/// verctrl Error types
#[derive(Error, Debug)]
pub enum VerctrlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("Config file '{}' not found", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Unknown naming scheme: {0}")]
    UnknownNamingScheme(String),

    #[error("Invalid detection strategy: {0}")]
    InvalidStrategy(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Backup not found: {0}")]
    BackupNotFound(String),

    #[error("Backup directory '{}' does not exist", .0.display())]
    BackupDirMissing(PathBuf),
}

/// Result type for verctrl operations
pub type Result<T> = std::result::Result<T, VerctrlError>;

impl From<serde_json::Error> for VerctrlError {
    fn from(e: serde_json::Error) -> Self {
        VerctrlError::Config(e.to_string())
    }
}

impl From<globset::Error> for VerctrlError {
    fn from(e: globset::Error) -> Self {
        VerctrlError::InvalidPattern(e.to_string())
    }
}

impl From<glob::PatternError> for VerctrlError {
    fn from(e: glob::PatternError) -> Self {
        VerctrlError::InvalidPattern(e.to_string())
    }
}
