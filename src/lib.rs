//! Player core umbrella crate.
//!
//! Exposes the workspace through a single dependency with platform feature
//! flags: `desktop-shims` (default) injects the `reqwest` HTTP client,
//! `wasm` adds the browser bridges and `bootstrap_wasm`. Build web targets
//! with `--no-default-features --features wasm`.

pub use core_service::*;
