//! # Ad Gate
//!
//! The coordinator asks an [`AdGate`] before every new play request whether
//! an interstitial has to be shown first. The gate owns its business rules
//! (frequency, tiers, cooldowns); the coordinator only understands the
//! two-state answer and the dismissal hand-off:
//!
//! 1. `should_gate_before_play()` returns [`GateDecision::Gate`]
//! 2. the coordinator parks the track and raises `show_interstitial`
//! 3. the UI shows the interstitial, then calls `interstitial_dismissed()`
//! 4. the UI calls `PlaybackCoordinator::resolve_interstitial()`, which plays
//!    the parked track without asking the gate again

use std::sync::atomic::{AtomicU32, Ordering};
use thiserror::Error;
use tracing::debug;

use bridge_traits::PlatformSendSync;

/// Answer of an [`AdGate`] for one play request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    Gate,
}

/// The gate could not decide, e.g. because its remote configuration did not
/// load. The coordinator treats this as [`GateDecision::Proceed`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Ad gate check failed: {0}")]
pub struct GateError(pub String);

/// Interstitial policy consulted before playback starts.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait AdGate: PlatformSendSync {
    /// Decide whether the upcoming play request must wait for an
    /// interstitial.
    async fn should_gate_before_play(&self) -> Result<GateDecision, GateError>;

    /// The UI finished showing an interstitial.
    fn interstitial_dismissed(&self) {}
}

/// Gate that never shows an interstitial.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoGate;

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl AdGate for NoGate {
    async fn should_gate_before_play(&self) -> Result<GateDecision, GateError> {
        Ok(GateDecision::Proceed)
    }
}

/// Gate that shows an interstitial on every `interval`-th play request.
///
/// Requests are counted while no interstitial is outstanding; dismissal
/// starts a new count.
#[derive(Debug)]
pub struct EveryNthPlayGate {
    interval: u32,
    plays_since_interstitial: AtomicU32,
}

impl EveryNthPlayGate {
    /// An `interval` of 0 disables gating.
    pub fn new(interval: u32) -> Self {
        Self {
            interval,
            plays_since_interstitial: AtomicU32::new(0),
        }
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    /// Play requests counted since the last dismissal.
    pub fn plays_since_interstitial(&self) -> u32 {
        self.plays_since_interstitial.load(Ordering::SeqCst)
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl AdGate for EveryNthPlayGate {
    async fn should_gate_before_play(&self) -> Result<GateDecision, GateError> {
        if self.interval == 0 {
            return Ok(GateDecision::Proceed);
        }

        let count = self
            .plays_since_interstitial
            .fetch_add(1, Ordering::SeqCst)
            .saturating_add(1);

        if count >= self.interval {
            debug!(count, interval = self.interval, "Interstitial due");
            Ok(GateDecision::Gate)
        } else {
            Ok(GateDecision::Proceed)
        }
    }

    fn interstitial_dismissed(&self) {
        self.plays_since_interstitial.store(0, Ordering::SeqCst);
    }
}
