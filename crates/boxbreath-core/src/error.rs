//! Core error types for boxbreath-core.
//!
//! Errors only surface from the operations a caller explicitly asks for
//! (opening storage, loading or editing configuration). Runtime paths such
//! as settings persistence and feedback cues log and swallow them instead.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for boxbreath-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Audio/haptic feedback errors
    #[error("Feedback error: {0}")]
    Feedback(#[from] FeedbackError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Key-value storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The data directory could not be resolved or created
    #[error("Failed to prepare data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// In-memory store mutex was poisoned
    #[error("Store is poisoned")]
    Poisoned,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration tree
    #[error("Unknown config key: {0}")]
    UnknownKey(String),
}

/// Feedback (sound/vibration) errors. Never propagated to the timer.
#[derive(Error, Debug)]
pub enum FeedbackError {
    /// No audio output device is available
    #[error("No audio output device available")]
    NoOutputDevice,

    /// The output device uses a sample format we do not render
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// Building or driving the output stream failed
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// The haptic driver rejected a pulse
    #[error("Haptic error: {0}")]
    Haptics(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
