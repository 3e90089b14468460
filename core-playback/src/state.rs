//! # Playback State
//!
//! The single authoritative "now playing" snapshot. Only the coordinator
//! writes it; every UI surface reads it through a `watch` receiver.

use serde::{Deserialize, Serialize};

use crate::error::PlaybackFailure;
use crate::track::Track;

/// Where the current playback attempt is in its lifecycle.
///
/// ```text
/// Idle ──> Loading ──> Ready ──> Playing <──> Paused
///             │
///             └──> Errored
/// ```
///
/// `Errored` ends an attempt, not the coordinator: the next play request
/// starts a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackPhase {
    /// Nothing has been loaded yet.
    #[default]
    Idle,
    /// A source was assigned and metadata has not arrived.
    Loading,
    /// Metadata is known and the engine is not producing audio.
    Ready,
    Playing,
    Paused,
    Errored,
}

impl PlaybackPhase {
    /// Whether a source is attached and usable for pause/resume/seek.
    pub fn is_loaded(&self) -> bool {
        matches!(
            self,
            PlaybackPhase::Ready | PlaybackPhase::Playing | PlaybackPhase::Paused
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    /// Track loaded or last loaded. `None` only before the first play.
    pub current_track: Option<Track>,
    /// Mirrors the engine's own play/pause events.
    pub is_playing: bool,
    /// Seconds.
    pub current_time: f64,
    /// Seconds; `0.0` until metadata loads.
    pub duration: f64,
    /// In `0.0..=1.0`.
    pub volume: f32,
    pub is_loading: bool,
    pub error: Option<PlaybackFailure>,
    /// Track deferred by the ad gate, replayed by `resolve_interstitial`.
    pub pending_gated_track: Option<Track>,
    /// Raised while an interstitial must be on screen.
    pub show_interstitial: bool,
    pub phase: PlaybackPhase,
}

impl PlaybackState {
    pub fn new(volume: f32) -> Self {
        Self {
            current_track: None,
            is_playing: false,
            current_time: 0.0,
            duration: 0.0,
            volume: clamp_volume(volume).unwrap_or(0.0),
            is_loading: false,
            error: None,
            pending_gated_track: None,
            show_interstitial: false,
            phase: PlaybackPhase::Idle,
        }
    }

    pub fn current_track_id(&self) -> Option<&str> {
        self.current_track.as_ref().map(|track| track.id.as_str())
    }

    /// Error message for display, if any.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    /// Clamp a position into `[0, duration]`; only the lower bound applies
    /// while the duration is unknown.
    pub fn clamp_position(&self, seconds: f64) -> f64 {
        let seconds = if seconds.is_nan() { 0.0 } else { seconds.max(0.0) };

        if self.duration > 0.0 {
            seconds.min(self.duration)
        } else if seconds.is_finite() {
            seconds
        } else {
            0.0
        }
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_VOLUME)
    }
}

/// Clamp into `0.0..=1.0`. `None` for NaN.
pub(crate) fn clamp_volume(volume: f32) -> Option<f32> {
    if volume.is_nan() {
        None
    } else {
        Some(volume.clamp(0.0, 1.0))
    }
}

pub(crate) fn seconds_to_ms(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    }
}
