use crate::formats::OutputFormat;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Nothing to convert: {0} does not exist or is not accessible")]
    RootNotFound(PathBuf),

    #[error("Cannot read directory {path}: {reason}")]
    SubtreeUnreadable { path: PathBuf, reason: String },

    #[error("Cannot read input {path}: {reason}")]
    UnreadableInput { path: PathBuf, reason: String },

    #[error("Failed to encode {path}: {reason}")]
    EncodeFailure { path: PathBuf, reason: String },

    #[error("Invalid quality value: {0}. Must be between 0 and 100")]
    InvalidQuality(u8),

    #[error("Invalid effort value for {format}: {effort}. Must be between 0 and {max}")]
    InvalidEffort {
        effort: u8,
        format: OutputFormat,
        max: u8,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl ConvertError {
    pub fn unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ConvertError::UnreadableInput {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn encode_failure(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ConvertError::EncodeFailure {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
