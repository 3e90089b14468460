//! Marker traits that keep bridge bounds aligned with each target's threading
//! model.
//!
//! Native hosts share engines and HTTP clients across tokio tasks, so every
//! bridge object must be `Send + Sync`. In the browser everything runs on the
//! page's event loop and the wrapped objects (`HtmlAudioElement`, `Window`)
//! are neither, so the bounds collapse to nothing on `wasm32`.

/// `Send + Sync` on native targets, no bound on `wasm32`.
#[cfg(not(target_arch = "wasm32"))]
pub trait PlatformSendSync: Send + Sync {}

#[cfg(not(target_arch = "wasm32"))]
impl<T> PlatformSendSync for T where T: Send + Sync {}

#[cfg(target_arch = "wasm32")]
pub trait PlatformSendSync {}

#[cfg(target_arch = "wasm32")]
impl<T> PlatformSendSync for T {}
