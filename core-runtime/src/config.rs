//! # Core Configuration Module
//!
//! Provides configuration management for the player core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the bridges and settings the core needs. It enforces
//! fail-fast validation so a misconfigured host finds out at startup rather
//! than on the first play request.
//!
//! ## Optional Dependencies (with platform defaults)
//!
//! - `HttpClient` - reachability probes and play-count reporting
//!   (desktop default: reqwest)
//!
//! When the `desktop-shims` feature is enabled, a `ReqwestHttpClient` is
//! injected automatically if a feature needs HTTP and no client was provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .http_client(Arc::new(MyHttpClient))
//!     .play_count_endpoint("https://music.example/api/audio/update-play-count")
//!     .enable_play_count_reporting(true)
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // Reporting play counts without an endpoint is rejected
//! let config = CoreConfig::builder()
//!     .enable_reachability_probe(false)
//!     .enable_play_count_reporting(true)
//!     .build()
//!     .expect("Should fail - missing endpoint");
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::HttpClient;
use std::sync::Arc;
use url::Url;

/// Core configuration for the player core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// HTTP client for probes and play-count reporting
    pub http_client: Option<Arc<dyn HttpClient>>,

    /// Capacity of the broadcast event bus
    pub event_buffer_size: usize,

    /// Endpoint receiving `{"trackId": ...}` after each completed track
    pub play_count_endpoint: Option<Url>,

    /// Features flags
    pub features: FeatureFlags,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field(
                "http_client",
                &self.http_client.as_ref().map(|_| "HttpClient { ... }"),
            )
            .field("event_buffer_size", &self.event_buffer_size)
            .field(
                "play_count_endpoint",
                &self.play_count_endpoint.as_ref().map(Url::as_str),
            )
            .field("features", &self.features)
            .finish()
    }
}

/// Feature flags control optional functionality.
///
/// Some features need an `HttpClient`; see [`CoreConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// `HEAD`-probe media URLs before handing them to the engine
    pub enable_reachability_probe: bool,

    /// Consult the ad gate before playback starts
    pub enable_interstitials: bool,

    /// Report completed tracks to the play-count endpoint
    pub enable_play_count_reporting: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enable_reachability_probe: true,
            enable_interstitials: true,
            enable_play_count_reporting: false,
        }
    }
}

impl FeatureFlags {
    fn needs_http(&self) -> bool {
        self.enable_reachability_probe || self.enable_play_count_reporting
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - The event buffer holds at least one event
    /// - HTTP-backed features have an `HttpClient`
    /// - Play-count reporting has an http(s) endpoint
    pub fn validate(&self) -> Result<()> {
        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.features.needs_http() && self.http_client.is_none() {
            return Err(http_client_missing_error());
        }

        if self.features.enable_play_count_reporting {
            match &self.play_count_endpoint {
                None => {
                    return Err(Error::Config(
                        "Play-count reporting enabled but no endpoint configured. \
                         Use .play_count_endpoint() or disable the feature."
                            .to_string(),
                    ))
                }
                Some(url) if !matches!(url.scheme(), "http" | "https") => {
                    return Err(Error::Config(format!(
                        "Play-count endpoint must use http or https, got '{}'",
                        url.scheme()
                    )))
                }
                Some(_) => {}
            }
        }

        Ok(())
    }
}

fn http_client_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required for reachability probes and \
                 play-count reporting. \
                 Desktop: enable the 'desktop-shims' feature to use the default ReqwestHttpClient. \
                 Web: inject bridge_wasm::WasmHttpClient. \
                 Otherwise disable both features."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Option<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());
    Some(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Option<Arc<dyn HttpClient>> {
    None
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Call [`build()`](CoreConfigBuilder::build) to validate and create the
/// final config.
#[derive(Default)]
pub struct CoreConfigBuilder {
    http_client: Option<Arc<dyn HttpClient>>,
    event_buffer_size: Option<usize>,
    play_count_endpoint: Option<String>,
    features: FeatureFlags,
}

impl CoreConfigBuilder {
    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the desktop default (reqwest-based) will be used when
    /// the `desktop-shims` feature is enabled and a feature needs HTTP.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the event bus capacity.
    ///
    /// Default: 100 events. Subscribers that fall further behind observe a
    /// lag and skip ahead.
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Sets the play-count endpoint.
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder()
    ///     .play_count_endpoint("https://music.example/api/audio/update-play-count");
    /// ```
    pub fn play_count_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.play_count_endpoint = Some(endpoint.into());
        self
    }

    /// Enables or disables reachability probing.
    ///
    /// Default: true
    pub fn enable_reachability_probe(mut self, enabled: bool) -> Self {
        self.features.enable_reachability_probe = enabled;
        self
    }

    /// Enables or disables interstitial gating.
    ///
    /// Default: true
    pub fn enable_interstitials(mut self, enabled: bool) -> Self {
        self.features.enable_interstitials = enabled;
        self
    }

    /// Enables or disables play-count reporting.
    ///
    /// Requires an endpoint. Default: false
    pub fn enable_play_count_reporting(mut self, enabled: bool) -> Self {
        self.features.enable_play_count_reporting = enabled;
        self
    }

    /// Sets all feature flags at once.
    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns an error if:
    /// - The play-count endpoint is not a valid URL
    /// - An HTTP-backed feature is enabled without a client
    /// - Configuration values are invalid
    pub fn build(self) -> Result<CoreConfig> {
        let play_count_endpoint = self
            .play_count_endpoint
            .map(|raw| {
                Url::parse(raw.trim()).map_err(|e| {
                    Error::Config(format!("Invalid play-count endpoint '{}': {}", raw, e))
                })
            })
            .transpose()?;

        let http_client = match self.http_client {
            Some(client) => Some(client),
            None if self.features.needs_http() => provide_default_http_client(),
            None => None,
        };

        let config = CoreConfig {
            http_client,
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            play_count_endpoint,
            features: self.features,
        };

        config.validate()?;

        Ok(config)
    }
}
