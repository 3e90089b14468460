//! Media engine bridge.
//!
//! A [`MediaEngine`] wraps the host's native audio primitive (an
//! `HTMLAudioElement` in the browser, a platform player elsewhere). The core
//! drives it through a small imperative surface and learns what actually
//! happened from the lifecycle events the engine pushes into a
//! [`MediaEventSink`].
//!
//! Engines must keep exactly one source attached: calling
//! [`MediaEngine::load`] while something is playing stops the previous source
//! before the new one is attached.
//!
//! Every event is stamped with the [`SourceTag`] value current when it was
//! emitted. The core bumps the tag right before each `load`, so events that
//! were still queued for a replaced source can be told apart from events of
//! the new one.
//!
//! ```ignore
//! let (sink, receiver) = media_event_channel();
//! let tag = sink.source_tag();
//! engine.attach(sink);
//! tag.set(1);
//! engine.load("https://cdn.example/t1.mp3")?;
//! engine.play().await?;
//! // receiver now yields Play, MetadataLoaded { .. }, ... all with source 1
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::channel::mpsc;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::platform::PlatformSendSync;

/// Error category reported by the engine while loading or playing a source.
///
/// The first four variants mirror the standard media error codes exposed by
/// browsers; anything else is [`MediaErrorKind::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaErrorKind {
    /// Fetching was aborted at the user's or host's request.
    Aborted,
    /// A network failure interrupted fetching.
    Network,
    /// The resource was fetched but could not be decoded.
    Decode,
    /// The source or its format is not supported.
    SourceNotSupported,
    Unknown,
}

impl MediaErrorKind {
    /// Map a `MediaError.code` value (1-4) to a kind.
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => MediaErrorKind::Aborted,
            2 => MediaErrorKind::Network,
            3 => MediaErrorKind::Decode,
            4 => MediaErrorKind::SourceNotSupported,
            _ => MediaErrorKind::Unknown,
        }
    }
}

/// Lifecycle signal emitted by a [`MediaEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum MediaEvent {
    /// Metadata for the attached source is known.
    MetadataLoaded {
        /// Total duration in seconds.
        duration: f64,
    },
    /// Playback position advanced.
    TimeUpdate {
        /// Current position in seconds.
        position: f64,
    },
    /// The engine started (or resumed) producing audio.
    Play,
    /// The engine paused.
    Pause,
    /// The attached source played through to its end.
    Ended,
    /// Loading or playback failed.
    Error {
        kind: MediaErrorKind,
        /// Extra detail from the host, when it has any.
        message: Option<String>,
    },
}

/// An event together with the source it was emitted for.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedMediaEvent {
    pub source: u64,
    pub event: MediaEvent,
}

/// Shared counter naming the source an engine is currently playing.
#[derive(Debug, Clone, Default)]
pub struct SourceTag(Arc<AtomicU64>);

impl SourceTag {
    pub fn set(&self, source: u64) {
        self.0.store(source, Ordering::SeqCst);
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Receiving half of a media event channel, owned by the core.
pub type MediaEventReceiver = mpsc::UnboundedReceiver<TaggedMediaEvent>;

/// Sending half handed to an engine via [`MediaEngine::attach`].
///
/// Events are delivered in the order they are emitted. Emitting never blocks;
/// once the receiving side is gone events are dropped.
#[derive(Debug, Clone)]
pub struct MediaEventSink {
    sender: mpsc::UnboundedSender<TaggedMediaEvent>,
    tag: SourceTag,
}

impl MediaEventSink {
    /// Push an event for the current source. Returns `false` when nobody is
    /// listening anymore.
    pub fn emit(&self, event: MediaEvent) -> bool {
        let source = self.tag.current();
        self.sender
            .unbounded_send(TaggedMediaEvent { source, event })
            .is_ok()
    }

    /// Handle to the tag this sink stamps events with.
    pub fn source_tag(&self) -> SourceTag {
        self.tag.clone()
    }

    pub fn metadata_loaded(&self, duration: f64) -> bool {
        self.emit(MediaEvent::MetadataLoaded { duration })
    }

    pub fn time_update(&self, position: f64) -> bool {
        self.emit(MediaEvent::TimeUpdate { position })
    }

    pub fn play(&self) -> bool {
        self.emit(MediaEvent::Play)
    }

    pub fn pause(&self) -> bool {
        self.emit(MediaEvent::Pause)
    }

    pub fn ended(&self) -> bool {
        self.emit(MediaEvent::Ended)
    }

    pub fn error(&self, kind: MediaErrorKind, message: Option<String>) -> bool {
        self.emit(MediaEvent::Error { kind, message })
    }

    /// Whether the receiving side has been dropped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Create a connected sink/receiver pair.
pub fn media_event_channel() -> (MediaEventSink, MediaEventReceiver) {
    let (sender, receiver) = mpsc::unbounded();
    let sink = MediaEventSink {
        sender,
        tag: SourceTag::default(),
    };
    (sink, receiver)
}

/// Platform audio engine driven by the playback coordinator.
///
/// Only [`MediaEngine::play`] is asynchronous: hosts commonly resolve it
/// later (or reject it, e.g. when an autoplay policy blocks audio). Every
/// other control takes effect immediately and reports its outcome through
/// the event sink.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait MediaEngine: PlatformSendSync {
    /// Register the sink lifecycle events are pushed into. Replaces any
    /// previously attached sink.
    fn attach(&self, sink: MediaEventSink);

    /// Replace the current source with `url`, stopping whatever was playing.
    fn load(&self, url: &str) -> Result<()>;

    /// Start or resume playback of the current source.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Rejected`](crate::error::BridgeError::Rejected)
    /// when the host refuses to start audio.
    async fn play(&self) -> Result<()>;

    /// Pause playback, keeping the source and position.
    fn pause(&self) -> Result<()>;

    /// Move the playback position, in seconds.
    fn set_current_time(&self, seconds: f64) -> Result<()>;

    /// Set output volume in `0.0..=1.0`.
    fn set_volume(&self, volume: f32) -> Result<()>;
}
