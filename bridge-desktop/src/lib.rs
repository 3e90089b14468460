//! # Desktop Bridge Implementations
//!
//! Native implementations of the bridge traits for desktop hosts
//! (macOS, Windows, Linux):
//! - `HttpClient` using `reqwest`, used for media reachability probes and
//!   play-count reporting
//!
//! Desktop hosts bring their own [`MediaEngine`](bridge_traits::MediaEngine);
//! the player core does not ship a native audio backend.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::ReqwestHttpClient;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .http_client(Arc::new(ReqwestHttpClient::new()))
//!     .build()?;
//! ```

mod http;

pub use http::ReqwestHttpClient;
