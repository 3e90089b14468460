//! # Host Bridge Traits
//!
//! Contracts between the player core and the host platform. Each trait is a
//! capability the core needs but cannot implement portably:
//!
//! - [`MediaEngine`](media::MediaEngine) - the native audio primitive, plus
//!   the [`MediaEventSink`](media::MediaEventSink) it reports lifecycle
//!   events through
//! - [`HttpClient`](http::HttpClient) - reachability probes and small JSON calls
//! - [`LoggerSink`](logger::LoggerSink) - forwarding structured logs to the host
//!
//! | Platform | Implementation Crate |
//! |----------|----------------------|
//! | Desktop  | `bridge-desktop` (HTTP) |
//! | Web      | `bridge-wasm` (HTML audio element, fetch) |
//!
//! ## Error Handling
//!
//! All bridge traits return [`BridgeError`](error::BridgeError). Adapters
//! should convert platform errors into it with enough context to be logged
//! as-is.
//!
//! ## Thread Safety
//!
//! On native targets every bridge object is `Send + Sync`
//! ([`PlatformSendSync`](platform::PlatformSendSync)); on `wasm32` the bound
//! is dropped because browser objects live on a single thread.

pub mod error;
pub mod http;
pub mod logger;
pub mod media;
pub mod platform;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use logger::{redact_url, ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use media::{
    media_event_channel, MediaEngine, MediaErrorKind, MediaEvent, MediaEventReceiver,
    MediaEventSink, SourceTag, TaggedMediaEvent,
};
pub use platform::PlatformSendSync;
