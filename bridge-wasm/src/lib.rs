//! WebAssembly Bridge Implementations
//!
//! This crate provides browser implementations of the bridge traits defined
//! in `bridge-traits`, using `web-sys` and `wasm-bindgen`.
//!
//! # Platform Support
//!
//! This crate is designed exclusively for the `wasm32-unknown-unknown` target.
//! It compiles to nothing on native targets.
//!
//! # Implementations
//!
//! - `HtmlAudioEngine`: `MediaEngine` around an `HTMLAudioElement`
//! - `WasmHttpClient`: `HttpClient` over `fetch`
//!
//! # Examples
//!
//! ```ignore
//! use bridge_wasm::{build_wasm_bridges, WasmBridgeConfig};
//!
//! let bridges = build_wasm_bridges(WasmBridgeConfig::default())?;
//! let config = CoreConfig::builder().http_client(bridges.http()).build()?;
//! let service = CoreService::bootstrap(config, bridges.engine(), None)?;
//! ```

#![cfg(target_arch = "wasm32")]
#![warn(missing_docs)]

pub mod audio;
pub mod bootstrap;
pub mod error;
pub mod http;

// Re-export commonly used types
pub use audio::HtmlAudioEngine;
pub use bootstrap::{build_wasm_bridges, WasmBridgeConfig, WasmBridgeSet};
pub use error::{WasmError, WasmResult};
pub use http::WasmHttpClient;
