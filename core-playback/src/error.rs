//! # Playback Error Types
//!
//! Two kinds of error live here:
//!
//! - [`PlaybackError`]: failures to *build or wire* playback, returned from
//!   constructors and configuration. These reach the caller as `Err`.
//! - [`PlaybackFailure`]: the outcome of a play attempt that did not work.
//!   Commands never return it; it is recorded in
//!   [`PlaybackState::error`](crate::PlaybackState::error) and published on
//!   the event bus. Its `Display` text is the message shown to listeners.

use bridge_traits::MediaErrorKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while setting up playback.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// No media engine was supplied to the coordinator.
    #[error("Playback adapter not initialized")]
    AdapterNotInitialized,

    /// A configuration value was rejected.
    #[error("Playback configuration error: {0}")]
    Config(String),

    /// Error bubbled up from a host bridge.
    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::BridgeError),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for playback setup operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

/// Why a track's media URL was refused before reaching the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvalidSourceReason {
    /// Missing or blank URL.
    Empty,
    /// The URL carries a stringified placeholder (`undefined`, `null`).
    Placeholder,
    /// The URL does not parse; carries the parser's explanation.
    Malformed(String),
}

/// A play attempt that did not result in audio.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackFailure {
    #[error("{}", invalid_source_message(.0))]
    InvalidSource(InvalidSourceReason),

    /// The reachability probe failed; carries the HTTP status text or
    /// transport error.
    #[error("Audio file not accessible: {0}")]
    SourceUnreachable(String),

    #[error("Audio loading was aborted")]
    Aborted,

    #[error("Network error while loading audio")]
    NetworkError,

    #[error("Audio format not supported")]
    DecodeError,

    #[error("Audio source not supported or invalid URL")]
    SourceNotSupported,

    #[error("Audio error: {}", .0.as_deref().unwrap_or("Unknown error"))]
    UnknownError(Option<String>),

    /// The host refused to start audio (autoplay policy and the like).
    #[error("Playback was rejected: {0}")]
    PlaybackRejected(String),
}

fn invalid_source_message(reason: &InvalidSourceReason) -> &'static str {
    match reason {
        InvalidSourceReason::Empty => "No audio file available for this track. Please contact support.",
        InvalidSourceReason::Placeholder => {
            "Audio file URL is not properly configured. Please contact support."
        }
        InvalidSourceReason::Malformed(_) => "Invalid audio URL format",
    }
}

impl PlaybackFailure {
    /// Returns `true` if retrying the same track may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PlaybackFailure::SourceUnreachable(_) | PlaybackFailure::NetworkError
        )
    }

    /// Map an engine-reported error to a failure.
    pub fn from_media_error(kind: MediaErrorKind, message: Option<String>) -> Self {
        match kind {
            MediaErrorKind::Aborted => PlaybackFailure::Aborted,
            MediaErrorKind::Network => PlaybackFailure::NetworkError,
            MediaErrorKind::Decode => PlaybackFailure::DecodeError,
            MediaErrorKind::SourceNotSupported => PlaybackFailure::SourceNotSupported,
            MediaErrorKind::Unknown => PlaybackFailure::UnknownError(message),
        }
    }
}
