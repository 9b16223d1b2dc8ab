//! Error types.

use std::path::PathBuf;
use thiserror::Error;

/// Invalid combinator parameter or gesture configuration.
///
/// Raised when a stream is built, never clamped silently.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a positive duration, got {millis}ms")]
    NonPositiveDuration { name: &'static str, millis: i64 },

    #[error("{name} must be at least {min}, got {value}")]
    TooSmall {
        name: &'static str,
        min: usize,
        value: i64,
    },

    #[error("{name} must be a finite, non-negative distance, got {value}")]
    InvalidTolerance { name: &'static str, value: f32 },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse gesture config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize gesture config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Failure reported by a subscriber.
///
/// Returning this from a listener ends that one subscription; other
/// subscribers of the same stream keep receiving events.
#[derive(Debug, Error)]
#[error("listener failed: {0}")]
pub struct ListenerError(#[source] Box<dyn std::error::Error + 'static>);

impl ListenerError {
    pub fn new(err: impl std::error::Error + 'static) -> Self {
        ListenerError(Box::new(err))
    }

    pub fn msg(msg: impl Into<String>) -> Self {
        let msg: String = msg.into();
        ListenerError(msg.into())
    }
}

/// Failure to arm a logical timer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimerError {
    #[error("timer deadline overflows the clock ({now}ms + {delay_ms}ms)")]
    Overflow { now: u64, delay_ms: u128 },
}

/// Failure to load or save a replay recording.
#[cfg(feature = "replay")]
#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed recording: {0}")]
    Json(#[from] serde_json::Error),
}
