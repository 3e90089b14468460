//! # Playback Configuration
//!
//! Tunables for the playback coordinator. Every field has a serde default,
//! so hosts can deserialize a partial document.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::state::clamp_volume;

/// Volume used when the host does not pick one.
pub const DEFAULT_VOLUME: f32 = 0.7;

/// Playback coordinator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Volume applied to the engine at startup, in `0.0..=1.0`.
    ///
    /// Default: 0.7.
    #[serde(default = "default_initial_volume")]
    pub initial_volume: f32,

    /// Whether to `HEAD`-probe a media URL before assigning it to the engine.
    ///
    /// Requires an `HttpClient`; without one probing is skipped.
    ///
    /// Default: true.
    #[serde(default = "default_reachability_probe")]
    pub reachability_probe: bool,

    /// Upper bound on a single reachability probe.
    ///
    /// Default: 10 seconds.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout: Duration,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            initial_volume: default_initial_volume(),
            reachability_probe: default_reachability_probe(),
            probe_timeout: default_probe_timeout(),
        }
    }
}

impl PlaybackConfig {
    pub fn with_initial_volume(mut self, volume: f32) -> Self {
        self.initial_volume = volume;
        self
    }

    pub fn with_reachability_probe(mut self, enabled: bool) -> Self {
        self.reachability_probe = enabled;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Initial volume clamped into range; NaN falls back to the default.
    pub fn effective_initial_volume(&self) -> f32 {
        clamp_volume(self.initial_volume).unwrap_or(DEFAULT_VOLUME)
    }
}

fn default_initial_volume() -> f32 {
    DEFAULT_VOLUME
}

fn default_reachability_probe() -> bool {
    true
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(10)
}
