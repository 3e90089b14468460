//! # Playback Coordinator
//!
//! Single owner of the application's "now playing" state.
//!
//! ## Architecture
//!
//! ```text
//!  UI surfaces ──commands──> PlaybackCoordinator ──load/play/pause──> MediaEngine
//!       ^                      │        ^                                  │
//!       │ watch::Receiver      │        └──────── MediaEvent channel ──────┘
//!       └──── PlaybackState <──┤
//!                              ├──should_gate_before_play──> AdGate
//!                              └──CoreEvent──> EventBus (play counts, analytics)
//! ```
//!
//! Only the coordinator writes [`PlaybackState`]. Commands never return
//! playback failures; they record them in [`PlaybackState::error`] and
//! publish a [`PlaybackEvent::Error`].
//!
//! ## Superseded requests
//!
//! `play_track` awaits twice at most: the reachability probe and the engine's
//! `play()`. Each new load takes a fresh generation number and every
//! continuation compares its own number with the latest before touching
//! state, so a slow probe for an older request can never overwrite a newer
//! one. Gate consultations carry a request number for the same reason.
//!
//! Engine events are stamped with the generation of the source they were
//! emitted for. Only events of the current generation touch state; a late
//! `Ended` from a replaced source still credits that source's track.
//!
//! ## Usage
//!
//! ```ignore
//! let coordinator = Arc::new(
//!     PlaybackCoordinator::builder()
//!         .engine(engine)
//!         .ad_gate(Arc::new(EveryNthPlayGate::new(5)))
//!         .http_client(http_client)
//!         .build()?,
//! );
//!
//! let pump = Arc::clone(&coordinator);
//! tokio::spawn(async move { pump.run_event_pump().await });
//!
//! coordinator.play_track(track).await;
//! let state = coordinator.snapshot();
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bridge_traits::{
    media_event_channel, BridgeError, HttpClient, HttpRequest, MediaEngine, MediaEvent,
    MediaEventReceiver, RetryPolicy, SourceTag, TaggedMediaEvent,
};
use core_runtime::events::{CoreEvent, EventBus, InterstitialEvent, PlaybackEvent};
use core_runtime::logging::redact_url;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::PlaybackConfig;
use crate::error::{PlaybackError, PlaybackFailure, Result};
use crate::gate::{AdGate, GateDecision};
use crate::state::{clamp_volume, seconds_to_ms, PlaybackPhase, PlaybackState};
use crate::track::Track;

/// Global playback coordinator.
///
/// Construct one per application session with
/// [`PlaybackCoordinator::builder`] and share it (usually behind an `Arc`)
/// with every surface that plays audio.
pub struct PlaybackCoordinator {
    engine: Arc<dyn MediaEngine>,
    gate: Option<Arc<dyn AdGate>>,
    http_client: Option<Arc<dyn HttpClient>>,
    events: EventBus,
    config: PlaybackConfig,
    state: watch::Sender<PlaybackState>,
    /// Bumped by every new load; async continuations compare against it.
    load_generation: AtomicU64,
    /// Bumped by every play request; gate answers compare against it.
    request_seq: AtomicU64,
    /// Sources handed to the engine, with their completion guards.
    sources: Mutex<SourceLedger>,
    source_tag: SourceTag,
    media_events: Mutex<Option<MediaEventReceiver>>,
}

/// A source the engine was told to load.
#[derive(Debug)]
struct LoadedSource {
    generation: u64,
    track_id: String,
    /// Whether the current run already produced a completion.
    completed: bool,
}

/// The engine's current source and the one it replaced. Older sources
/// cannot have events left in flight.
#[derive(Debug, Default)]
struct SourceLedger {
    current: Option<LoadedSource>,
    retired: Option<LoadedSource>,
}

impl SourceLedger {
    fn replace(&mut self, generation: u64, track_id: String) {
        self.retired = self.current.replace(LoadedSource {
            generation,
            track_id,
            completed: false,
        });
    }

    fn get_mut(&mut self, generation: u64) -> Option<&mut LoadedSource> {
        [self.current.as_mut(), self.retired.as_mut()]
            .into_iter()
            .flatten()
            .find(|source| source.generation == generation)
    }
}

impl std::fmt::Debug for PlaybackCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackCoordinator")
            .field("gate", &self.gate.as_ref().map(|_| "AdGate { ... }"))
            .field(
                "http_client",
                &self.http_client.as_ref().map(|_| "HttpClient { ... }"),
            )
            .field("config", &self.config)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

/// Builder for [`PlaybackCoordinator`].
#[derive(Default)]
pub struct PlaybackCoordinatorBuilder {
    engine: Option<Arc<dyn MediaEngine>>,
    gate: Option<Arc<dyn AdGate>>,
    http_client: Option<Arc<dyn HttpClient>>,
    events: Option<EventBus>,
    config: PlaybackConfig,
}

impl PlaybackCoordinatorBuilder {
    /// Sets the media engine (required).
    pub fn engine(mut self, engine: Arc<dyn MediaEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Sets the ad gate. Without one every request proceeds.
    pub fn ad_gate(mut self, gate: Arc<dyn AdGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Sets the HTTP client used for reachability probes.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Publishes notifications on an existing bus instead of a private one.
    pub fn event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn config(mut self, config: PlaybackConfig) -> Self {
        self.config = config;
        self
    }

    /// Wire the coordinator to its engine.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::AdapterNotInitialized`] when no engine was
    /// set.
    pub fn build(self) -> Result<PlaybackCoordinator> {
        let engine = self.engine.ok_or(PlaybackError::AdapterNotInitialized)?;

        let (sink, receiver) = media_event_channel();
        let source_tag = sink.source_tag();
        engine.attach(sink);

        let volume = self.config.effective_initial_volume();
        if let Err(e) = engine.set_volume(volume) {
            warn!(error = %e, "Engine rejected initial volume");
        }

        if self.config.reachability_probe && self.http_client.is_none() {
            debug!("No HTTP client configured, reachability probes are skipped");
        }

        let (state, _) = watch::channel(PlaybackState::new(volume));

        Ok(PlaybackCoordinator {
            engine,
            gate: self.gate,
            http_client: self.http_client,
            events: self.events.unwrap_or_default(),
            config: self.config,
            state,
            load_generation: AtomicU64::new(0),
            request_seq: AtomicU64::new(0),
            sources: Mutex::new(SourceLedger::default()),
            source_tag,
            media_events: Mutex::new(Some(receiver)),
        })
    }
}

impl PlaybackCoordinator {
    pub fn builder() -> PlaybackCoordinatorBuilder {
        PlaybackCoordinatorBuilder::default()
    }

    // ------------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------------

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.state.subscribe()
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> PlaybackState {
        self.state.borrow().clone()
    }

    /// Bus the coordinator publishes on.
    pub fn event_bus(&self) -> &EventBus {
        &self.events
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    /// Play `track`, or toggle play/pause when it is already current.
    ///
    /// Returns once the request has been settled: deferred by the gate,
    /// rejected, superseded, or handed to the engine. Outcomes are observed
    /// through state and events.
    #[instrument(skip(self, track), fields(track_id = %track.id))]
    pub async fn play_track(&self, track: Track) {
        let request = self.request_seq.fetch_add(1, Ordering::SeqCst) + 1;

        let decision = self.consult_gate().await;
        if self.request_seq.load(Ordering::SeqCst) != request {
            debug!("Play request superseded while consulting the ad gate");
            return;
        }

        if decision == GateDecision::Gate {
            info!("Playback deferred by ad gate");
            let track_id = track.id.clone();
            self.state.send_modify(|state| {
                state.pending_gated_track = Some(track);
                state.show_interstitial = true;
            });
            self.emit(CoreEvent::Interstitial(InterstitialEvent::Requested {
                track_id,
            }));
            return;
        }

        self.state.send_if_modified(|state| {
            let abandoned = state.pending_gated_track.take();
            let was_shown = std::mem::replace(&mut state.show_interstitial, false);
            if let Some(abandoned) = &abandoned {
                debug!(abandoned = %abandoned.id, "Newer request replaces the deferred track");
            }
            abandoned.is_some() || was_shown
        });

        self.start(track).await;
    }

    /// Pause the current track. No-op without one.
    ///
    /// `is_playing` changes only when the engine reports the pause.
    pub fn pause(&self) {
        let Some(track_id) = self.current_track_id() else {
            debug!("Pause ignored, no current track");
            return;
        };

        if let Err(e) = self.engine.pause() {
            warn!(track_id = %track_id, error = %e, "Engine failed to pause");
            return;
        }

        let position_ms = seconds_to_ms(self.state.borrow().current_time);
        self.emit(CoreEvent::Playback(PlaybackEvent::Paused {
            track_id,
            position_ms,
        }));
    }

    /// Resume the current track. No-op unless a source is loaded.
    ///
    /// A rejected start is recorded as [`PlaybackFailure::PlaybackRejected`].
    pub async fn resume(&self) {
        let (track_id, phase) = {
            let state = self.state.borrow();
            (state.current_track_id().map(str::to_owned), state.phase)
        };
        let Some(track_id) = track_id else {
            debug!("Resume ignored, no current track");
            return;
        };
        if !phase.is_loaded() {
            debug!(track_id = %track_id, ?phase, "Resume ignored, no source loaded");
            return;
        }

        let generation = self.load_generation.load(Ordering::SeqCst);
        match self.engine.play().await {
            Ok(()) => {
                let position_ms = seconds_to_ms(self.state.borrow().current_time);
                self.emit(CoreEvent::Playback(PlaybackEvent::Resumed {
                    track_id,
                    position_ms,
                }));
            }
            Err(e) if self.is_current(generation) => {
                warn!(track_id = %track_id, error = %e, "Engine rejected resume");
                self.record_failure(PlaybackFailure::PlaybackRejected(rejection_reason(e)));
            }
            Err(e) => debug!(error = %e, "Stale resume rejection ignored"),
        }
    }

    /// Pause and rewind to the start. The track stays current so the UI can
    /// keep showing it.
    ///
    /// Stopping while a track is still loading cancels that attempt.
    pub fn stop(&self) {
        let (track_id, phase) = {
            let state = self.state.borrow();
            (state.current_track_id().map(str::to_owned), state.phase)
        };
        let Some(track_id) = track_id else {
            debug!("Stop ignored, no current track");
            return;
        };

        if phase == PlaybackPhase::Loading {
            self.load_generation.fetch_add(1, Ordering::SeqCst);
        }

        if let Err(e) = self.engine.pause() {
            warn!(track_id = %track_id, error = %e, "Engine failed to pause on stop");
        }
        if let Err(e) = self.engine.set_current_time(0.0) {
            warn!(track_id = %track_id, error = %e, "Engine failed to rewind on stop");
        }

        self.state.send_modify(|state| {
            state.is_playing = false;
            state.current_time = 0.0;
            state.phase = match state.phase {
                PlaybackPhase::Loading => {
                    state.is_loading = false;
                    PlaybackPhase::Idle
                }
                phase if phase.is_loaded() => PlaybackPhase::Ready,
                phase => phase,
            };
        });

        info!(track_id = %track_id, "Playback stopped");
        self.emit(CoreEvent::Playback(PlaybackEvent::Stopped { track_id }));
    }

    /// Move the playhead, clamped into `[0, duration]`.
    pub fn seek(&self, seconds: f64) {
        let (track_id, position, duration) = {
            let state = self.state.borrow();
            (
                state.current_track_id().map(str::to_owned),
                state.clamp_position(seconds),
                state.duration,
            )
        };
        let Some(track_id) = track_id else {
            debug!("Seek ignored, no current track");
            return;
        };

        if let Err(e) = self.engine.set_current_time(position) {
            warn!(track_id = %track_id, error = %e, "Engine failed to seek");
            return;
        }

        self.state.send_modify(|state| state.current_time = position);
        debug!(track_id = %track_id, requested = seconds, position, "Seeked");
        self.emit(CoreEvent::Playback(PlaybackEvent::Seeked {
            track_id,
            position_ms: seconds_to_ms(position),
            duration_ms: seconds_to_ms(duration),
        }));
    }

    /// Set output volume, clamped into `[0, 1]`. NaN is ignored.
    pub fn set_volume(&self, volume: f32) {
        let Some(volume) = clamp_volume(volume) else {
            warn!("Ignoring NaN volume");
            return;
        };

        if let Err(e) = self.engine.set_volume(volume) {
            warn!(volume, error = %e, "Engine failed to apply volume");
        }
        self.state.send_if_modified(|state| {
            let changed = state.volume != volume;
            state.volume = volume;
            changed
        });
    }

    /// Dismiss the current error without retrying.
    pub fn clear_error(&self) {
        self.state.send_if_modified(|state| state.error.take().is_some());
    }

    /// Play the track the gate deferred, without consulting the gate again.
    /// No-op when nothing is pending.
    #[instrument(skip(self))]
    pub async fn resolve_interstitial(&self) {
        let mut pending = None;
        self.state.send_if_modified(|state| {
            pending = state.pending_gated_track.take();
            let was_shown = std::mem::replace(&mut state.show_interstitial, false);
            pending.is_some() || was_shown
        });

        let Some(track) = pending else {
            debug!("No deferred track to resume");
            return;
        };

        // A gate check still in flight must not override this request.
        self.request_seq.fetch_add(1, Ordering::SeqCst);

        info!(track_id = %track.id, "Interstitial resolved, retrying deferred track");
        self.emit(CoreEvent::Interstitial(InterstitialEvent::Resolved {
            track_id: track.id.clone(),
        }));
        self.start(track).await;
    }

    // ------------------------------------------------------------------------
    // Engine events
    // ------------------------------------------------------------------------

    /// Consume engine events until the engine side of the channel closes.
    ///
    /// Only the first caller gets the channel; later calls return at once.
    pub async fn run_event_pump(&self) {
        let receiver = self.media_events.lock().take();
        let Some(mut receiver) = receiver else {
            warn!("Media event pump already running");
            return;
        };

        debug!("Media event pump started");
        while let Some(event) = receiver.next().await {
            self.handle_media_event(event);
        }
        debug!("Media event channel closed");
    }

    /// Fold every engine event queued so far. Returns how many were taken.
    ///
    /// For hosts that drive the coordinator without a spawned pump.
    pub fn drain_media_events(&self) -> usize {
        let mut guard = self.media_events.lock();
        let Some(receiver) = guard.as_mut() else {
            return 0;
        };

        let mut applied = 0;
        while let Ok(Some(event)) = receiver.try_next() {
            self.handle_media_event(event);
            applied += 1;
        }
        applied
    }

    /// Fold one engine lifecycle event into state.
    fn handle_media_event(&self, tagged: TaggedMediaEvent) {
        let TaggedMediaEvent { source, event } = tagged;
        if !self.is_current(source) {
            self.handle_replaced_source_event(source, event);
            return;
        }

        let Some(track_id) = self.current_track_id() else {
            debug!(?event, "Engine event without a current track ignored");
            return;
        };

        match event {
            MediaEvent::MetadataLoaded { duration } => {
                let duration = if duration.is_finite() && duration > 0.0 {
                    duration
                } else {
                    0.0
                };
                self.state.send_modify(|state| {
                    state.duration = duration;
                    state.is_loading = false;
                    state.error = None;
                    state.current_time = state.clamp_position(state.current_time);
                    if state.phase == PlaybackPhase::Loading {
                        state.phase = PlaybackPhase::Ready;
                    }
                });
                debug!(track_id = %track_id, duration, "Metadata loaded");
            }
            MediaEvent::TimeUpdate { position } => {
                self.state.send_if_modified(|state| {
                    let position = state.clamp_position(position);
                    let changed = state.current_time != position;
                    state.current_time = position;
                    changed
                });
            }
            MediaEvent::Play => {
                if let Some(loaded) = self.sources.lock().get_mut(source) {
                    loaded.completed = false;
                }
                self.state.send_modify(|state| {
                    state.is_playing = true;
                    state.error = None;
                    state.phase = PlaybackPhase::Playing;
                });
            }
            MediaEvent::Pause => {
                self.state.send_modify(|state| {
                    state.is_playing = false;
                    if state.phase == PlaybackPhase::Playing {
                        state.phase = PlaybackPhase::Paused;
                    }
                });
            }
            MediaEvent::Ended => {
                self.state.send_modify(|state| {
                    state.is_playing = false;
                    state.current_time = 0.0;
                    state.phase = PlaybackPhase::Ready;
                });

                match self.take_completion(source) {
                    Some(track_id) => {
                        info!(track_id = %track_id, "Track completed");
                        self.emit(CoreEvent::Playback(PlaybackEvent::Completed { track_id }));
                    }
                    None => debug!(track_id = %track_id, "Duplicate end of track ignored"),
                }
            }
            MediaEvent::Error { kind, message } => {
                let failure = PlaybackFailure::from_media_error(kind, message);
                warn!(track_id = %track_id, ?kind, error = %failure, "Engine reported an error");
                self.fail_attempt(failure);
            }
        }
    }

    /// Events of a replaced source never touch state. Its end still counts
    /// as a completed play of the track it was loaded for.
    fn handle_replaced_source_event(&self, source: u64, event: MediaEvent) {
        if event == MediaEvent::Ended {
            if let Some(track_id) = self.take_completion(source) {
                info!(track_id = %track_id, "Replaced track completed");
                self.emit(CoreEvent::Playback(PlaybackEvent::Completed { track_id }));
                return;
            }
        }
        debug!(source, ?event, "Event from a replaced source ignored");
    }

    /// The track id of `source` the first time its end is reported.
    fn take_completion(&self, source: u64) -> Option<String> {
        let mut sources = self.sources.lock();
        let loaded = sources.get_mut(source)?;
        if std::mem::replace(&mut loaded.completed, true) {
            None
        } else {
            Some(loaded.track_id.clone())
        }
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    async fn consult_gate(&self) -> GateDecision {
        let Some(gate) = &self.gate else {
            return GateDecision::Proceed;
        };

        match gate.should_gate_before_play().await {
            Ok(decision) => decision,
            Err(e) => {
                warn!(error = %e, "Ad gate check failed, proceeding with playback");
                GateDecision::Proceed
            }
        }
    }

    /// Validate, then toggle or load. Shared by fresh and resolved requests.
    async fn start(&self, track: Track) {
        let url = match track.validate_media_url() {
            Ok(url) => url,
            Err(failure) => {
                warn!(track_id = %track.id, error = %failure, "Rejected invalid media URL");
                self.report_failure(Some(track.id.clone()), failure);
                return;
            }
        };

        let (same_track, phase, is_playing) = {
            let state = self.state.borrow();
            (
                state.current_track_id() == Some(track.id.as_str()),
                state.phase,
                state.is_playing,
            )
        };

        if same_track {
            match phase {
                PlaybackPhase::Loading => {
                    debug!(track_id = %track.id, "Track already loading");
                    return;
                }
                phase if phase.is_loaded() => {
                    if is_playing {
                        self.pause();
                    } else {
                        self.resume().await;
                    }
                    return;
                }
                _ => debug!(track_id = %track.id, ?phase, "Reloading current track"),
            }
        }

        self.load(track, url).await;
    }

    async fn load(&self, track: Track, url: Url) {
        let generation = self.load_generation.fetch_add(1, Ordering::SeqCst) + 1;

        if self.state.borrow().current_track.is_some() {
            if let Err(e) = self.engine.pause() {
                warn!(error = %e, "Engine failed to pause previous track");
            }
        }

        let track_id = track.id.clone();
        let title = track.title.clone();
        self.state.send_modify(|state| {
            state.current_track = Some(track);
            state.is_playing = false;
            state.is_loading = true;
            state.error = None;
            state.current_time = 0.0;
            state.duration = 0.0;
            state.phase = PlaybackPhase::Loading;
        });
        info!(track_id = %track_id, url = %redact_url(url.as_str()), "Loading track");
        self.emit(CoreEvent::Playback(PlaybackEvent::Loading {
            track_id: track_id.clone(),
            title: title.clone(),
        }));

        if let Some(client) = self.probe_client() {
            let outcome = self.probe(client, &url).await;
            if !self.is_current(generation) {
                debug!(track_id = %track_id, "Probe finished for a superseded request");
                return;
            }
            if let Err(failure) = outcome {
                warn!(track_id = %track_id, error = %failure, "Media URL unreachable");
                self.fail_attempt(failure);
                return;
            }
        }

        self.sources.lock().replace(generation, track_id.clone());
        self.source_tag.set(generation);
        if let Err(e) = self.engine.load(url.as_str()) {
            warn!(track_id = %track_id, error = %e, "Engine refused source");
            self.fail_attempt(PlaybackFailure::SourceNotSupported);
            return;
        }
        if let Err(e) = self.engine.set_current_time(0.0) {
            debug!(error = %e, "Engine failed to rewind new source");
        }

        let result = self.engine.play().await;
        if !self.is_current(generation) {
            self.settle_stale_start(&track_id, result.is_ok());
            return;
        }

        match result {
            Ok(()) => {
                info!(track_id = %track_id, "Playback started");
                self.emit(CoreEvent::Playback(PlaybackEvent::Started { track_id, title }));
            }
            Err(e) => {
                warn!(track_id = %track_id, error = %e, "Engine rejected playback start");
                self.fail_attempt(PlaybackFailure::PlaybackRejected(rejection_reason(e)));
            }
        }
    }

    /// A start that resolved after its load was superseded. If the track was
    /// stopped while loading (and not reloaded since), silence the engine.
    fn settle_stale_start(&self, track_id: &str, started: bool) {
        let stopped_while_loading = {
            let state = self.state.borrow();
            state.current_track_id() == Some(track_id) && state.phase == PlaybackPhase::Idle
        };

        if started && stopped_while_loading {
            debug!(track_id, "Silencing start that resolved after stop");
            if let Err(e) = self.engine.pause() {
                warn!(track_id, error = %e, "Engine failed to pause stale start");
            }
        } else {
            debug!(track_id, started, "Stale playback start ignored");
        }
    }

    fn probe_client(&self) -> Option<&Arc<dyn HttpClient>> {
        if self.config.reachability_probe {
            self.http_client.as_ref()
        } else {
            None
        }
    }

    async fn probe(
        &self,
        client: &Arc<dyn HttpClient>,
        url: &Url,
    ) -> std::result::Result<(), PlaybackFailure> {
        let request = HttpRequest::head(url.as_str()).timeout(self.config.probe_timeout);

        match client
            .execute_with_retry(request, RetryPolicy::no_retry())
            .await
        {
            Ok(response) if response.is_success() => Ok(()),
            Ok(response) => Err(PlaybackFailure::SourceUnreachable(format!(
                "HTTP {}",
                response.status
            ))),
            Err(e) => Err(PlaybackFailure::SourceUnreachable(e.to_string())),
        }
    }

    /// End the current attempt with `failure`.
    fn fail_attempt(&self, failure: PlaybackFailure) {
        self.state.send_modify(|state| {
            state.is_playing = false;
            state.phase = PlaybackPhase::Errored;
        });
        self.record_failure(failure);
    }

    /// Record `failure` against the current track without ending the attempt.
    fn record_failure(&self, failure: PlaybackFailure) {
        self.report_failure(self.current_track_id(), failure);
    }

    fn report_failure(&self, track_id: Option<String>, failure: PlaybackFailure) {
        let message = failure.to_string();
        let recoverable = failure.is_transient();
        self.state.send_modify(|state| {
            state.error = Some(failure);
            state.is_loading = false;
        });
        self.emit(CoreEvent::Playback(PlaybackEvent::Error {
            track_id,
            message,
            recoverable,
        }));
    }

    fn current_track_id(&self) -> Option<String> {
        self.state.borrow().current_track_id().map(str::to_owned)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.load_generation.load(Ordering::SeqCst) == generation
    }

    fn emit(&self, event: CoreEvent) {
        // Nobody listening is fine.
        self.events.emit(event).ok();
    }
}

fn rejection_reason(error: BridgeError) -> String {
    match error {
        BridgeError::Rejected(reason) => reason,
        other => other.to_string(),
    }
}
