//! # Playback Module
//!
//! The application-wide playback coordinator and the types around it.
//!
//! ## Overview
//!
//! This module handles:
//! - The track model and media URL validation
//! - The single authoritative [`PlaybackState`] and its lifecycle phases
//! - [`PlaybackCoordinator`]: commands, engine event folding and the
//!   superseded-request guard
//! - The [`AdGate`] contract with stock policies
//! - Play-count reporting for completed tracks
//!
//! The platform audio primitive stays behind
//! [`bridge_traits::MediaEngine`]; nothing here produces sound itself.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod gate;
pub mod play_count;
pub mod state;
pub mod track;

pub use config::PlaybackConfig;
pub use coordinator::{PlaybackCoordinator, PlaybackCoordinatorBuilder};
pub use error::{InvalidSourceReason, PlaybackError, PlaybackFailure, Result};
pub use gate::{AdGate, EveryNthPlayGate, GateDecision, GateError, NoGate};
pub use play_count::PlayCountReporter;
pub use state::{PlaybackPhase, PlaybackState};
pub use track::Track;
