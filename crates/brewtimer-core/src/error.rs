//! Core error types for brewtimer-core.
//!
//! This module defines the error hierarchy using thiserror. Malformed
//! recipes, refused timer commands and configuration failures each get
//! their own enum; [`CoreError`] wraps them for callers that do not care
//! which layer failed.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for brewtimer-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Stage list could not be turned into a timeline
    #[error("Timeline error: {0}")]
    Timeline(#[from] TimelineError),

    /// Timer command was refused
    #[error("Timer error: {0}")]
    Timer(#[from] TimerError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parse errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Reasons a stage list is malformed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimelineError {
    /// A timed stage ends before the timed stage preceding it.
    #[error("stage {index}: cumulative time {current}s is before previous stage's {previous}s")]
    NonMonotonicTime {
        index: usize,
        previous: u32,
        current: u32,
    },

    /// A timed stage asks for less total water than the stage before it.
    #[error("stage {index}: cumulative water {current}g is below previous stage's {previous}g")]
    DecreasingWater {
        index: usize,
        previous: f64,
        current: f64,
    },

    /// The water target could not be parsed.
    #[error("stage {index}: invalid water amount {value:?}")]
    InvalidWater { index: usize, value: String },
}

/// Failure to parse a `"<number>g"` water string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WaterParseError {
    #[error("missing 'g' unit suffix")]
    MissingUnit,

    #[error("not a number: {0:?}")]
    NotANumber(String),

    #[error("amount must be finite and non-negative")]
    OutOfRange,
}

/// Refusals returned by timer commands.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimerError {
    /// No timed stages to walk through.
    #[error("recipe has no timed stages")]
    EmptyTimeline,

    /// Stage list failed validation.
    #[error("recipe stages are malformed: {0}")]
    MalformedStages(TimelineError),

    /// Skip is only offered during the final wait.
    #[error("skip is only available during the final wait segment")]
    SkipNotAllowed,

    /// The driver task is gone.
    #[error("timer driver has shut down")]
    DriverClosed,
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

    /// Key does not name a configuration field
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Error type returned by haptic/audio listeners.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
