//! Convenience helpers for wiring the wasm bridge implementations together.
//!
//! Host shells can use [`build_wasm_bridges`] to get an audio engine and an
//! HTTP client in one call. The result mirrors the role that the
//! `bridge-desktop` crate plays for native targets.

use std::sync::Arc;

use bridge_traits::{error::Result as BridgeResult, http::HttpClient, MediaEngine};
use wasm_bindgen::JsCast;
use web_sys::HtmlAudioElement;

use crate::{audio::HtmlAudioEngine, error::WasmError, http::WasmHttpClient};

/// Configuration for [`build_wasm_bridges`].
#[derive(Debug, Clone, Default)]
pub struct WasmBridgeConfig {
    /// Id of an `<audio>` element already in the page. A detached element
    /// is created when unset.
    pub audio_element_id: Option<String>,
}

impl WasmBridgeConfig {
    /// Drive the page's `<audio id="...">` element instead of a detached one.
    pub fn with_audio_element_id(mut self, id: impl Into<String>) -> Self {
        self.audio_element_id = Some(id.into());
        self
    }
}

/// Fully constructed wasm bridge objects ready for injection into the core.
pub struct WasmBridgeSet {
    /// Audio engine around an `HTMLAudioElement`.
    pub media_engine: Arc<dyn MediaEngine>,
    /// HTTP client powered by browser `fetch`.
    pub http_client: Arc<dyn HttpClient>,
}

impl WasmBridgeSet {
    /// Convenience accessor to clone the media engine.
    pub fn engine(&self) -> Arc<dyn MediaEngine> {
        Arc::clone(&self.media_engine)
    }

    /// Convenience accessor to clone the HTTP client.
    pub fn http(&self) -> Arc<dyn HttpClient> {
        Arc::clone(&self.http_client)
    }
}

/// Build the default wasm bridge stack.
///
/// Hosts should call this during startup (e.g., inside their wasm bindgen
/// bootstrap) and pass the returned trait objects into `core-service`.
pub fn build_wasm_bridges(config: WasmBridgeConfig) -> BridgeResult<WasmBridgeSet> {
    console_error_panic_hook::set_once();

    let engine = match &config.audio_element_id {
        Some(id) => HtmlAudioEngine::with_element(find_audio_element(id)?)?,
        None => HtmlAudioEngine::new()?,
    };

    Ok(WasmBridgeSet {
        media_engine: Arc::new(engine),
        http_client: Arc::new(WasmHttpClient::new()?),
    })
}

fn find_audio_element(id: &str) -> Result<HtmlAudioElement, WasmError> {
    web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| WasmError::NotAvailable("document".to_string()))?
        .get_element_by_id(id)
        .ok_or_else(|| WasmError::NotAvailable(format!("audio element #{id}")))?
        .dyn_into::<HtmlAudioElement>()
        .map_err(|_| WasmError::NotAvailable(format!("#{id} is not an <audio> element")))
}
