//! Behavioural tests for the playback coordinator
//!
//! This test suite verifies:
//! - Command semantics (play/toggle, pause, resume, stop, seek, volume)
//! - Engine event folding and the completion notification
//! - Ad gate deferral and interstitial resolution
//! - Source validation and reachability probing
//! - Superseded requests never overwrite newer state

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    BridgeError, HttpClient, HttpMethod, HttpRequest, HttpResponse, MediaEngine, MediaErrorKind,
    MediaEvent, MediaEventSink, RetryPolicy,
};
use bytes::Bytes;
use core_playback::{
    AdGate, GateDecision, GateError, InvalidSourceReason, PlaybackConfig, PlaybackCoordinator,
    PlaybackFailure, PlaybackPhase, Track,
};
use core_runtime::events::{CoreEvent, EventBus, InterstitialEvent, PlaybackEvent, Receiver};
use mockall::mock;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

// ============================================================================
// Fake MediaEngine
// ============================================================================

#[derive(Default)]
struct EngineState {
    sink: Option<MediaEventSink>,
    source: Option<String>,
    playing: bool,
    position: f64,
    volume: f32,
    loads: Vec<String>,
    pauses: usize,
    reject_play: Option<String>,
    hold_play: Option<Arc<Notify>>,
    fail_load: bool,
}

/// In-memory engine with a single source slot, reporting through its sink
/// the way a browser audio element does.
#[derive(Default)]
struct FakeEngine {
    state: Mutex<EngineState>,
}

impl FakeEngine {
    fn emit(&self, event: MediaEvent) {
        let state = self.state.lock().unwrap();
        if let Some(sink) = &state.sink {
            sink.emit(event);
        }
    }

    fn loads(&self) -> Vec<String> {
        self.state.lock().unwrap().loads.clone()
    }

    fn pauses(&self) -> usize {
        self.state.lock().unwrap().pauses
    }

    fn reject_next_play(&self, reason: &str) {
        self.state.lock().unwrap().reject_play = Some(reason.to_string());
    }

    /// Make the next `play()` wait until the returned handle is notified.
    fn hold_next_play(&self) -> Arc<Notify> {
        let release = Arc::new(Notify::new());
        self.state.lock().unwrap().hold_play = Some(Arc::clone(&release));
        release
    }
}

#[async_trait]
impl MediaEngine for FakeEngine {
    fn attach(&self, sink: MediaEventSink) {
        self.state.lock().unwrap().sink = Some(sink);
    }

    fn load(&self, url: &str) -> BridgeResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_load {
            return Err(BridgeError::OperationFailed("unsupported".to_string()));
        }
        // One slot: the previous source goes silent.
        state.playing = false;
        state.source = Some(url.to_string());
        state.position = 0.0;
        state.loads.push(url.to_string());
        Ok(())
    }

    async fn play(&self) -> BridgeResult<()> {
        let hold = self.state.lock().unwrap().hold_play.take();
        if let Some(release) = hold {
            release.notified().await;
        }

        let mut state = self.state.lock().unwrap();
        if let Some(reason) = state.reject_play.take() {
            return Err(BridgeError::Rejected(reason));
        }
        if state.source.is_none() {
            return Err(BridgeError::OperationFailed("no source".to_string()));
        }
        state.playing = true;
        if let Some(sink) = &state.sink {
            sink.play();
        }
        Ok(())
    }

    fn pause(&self) -> BridgeResult<()> {
        let mut state = self.state.lock().unwrap();
        state.pauses += 1;
        if std::mem::replace(&mut state.playing, false) {
            if let Some(sink) = &state.sink {
                sink.pause();
            }
        }
        Ok(())
    }

    fn set_current_time(&self, seconds: f64) -> BridgeResult<()> {
        self.state.lock().unwrap().position = seconds;
        Ok(())
    }

    fn set_volume(&self, volume: f32) -> BridgeResult<()> {
        self.state.lock().unwrap().volume = volume;
        Ok(())
    }
}

// ============================================================================
// Mocks
// ============================================================================

mock! {
    Gate {}

    #[async_trait]
    impl AdGate for Gate {
        async fn should_gate_before_play(&self) -> Result<GateDecision, GateError>;
        fn interstitial_dismissed(&self);
    }
}

mock! {
    Http {}

    #[async_trait]
    impl HttpClient for Http {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        async fn execute_with_retry(
            &self,
            request: HttpRequest,
            policy: RetryPolicy,
        ) -> BridgeResult<HttpResponse>;
    }
}

/// Probe client that holds requests for `slow_url` until released.
struct SlowProbe {
    slow_url: String,
    release: Notify,
    seen: Mutex<Vec<String>>,
}

#[async_trait]
impl HttpClient for SlowProbe {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        self.seen.lock().unwrap().push(request.url.clone());
        if request.url == self.slow_url {
            self.release.notified().await;
        }
        Ok(status(200))
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn status(code: u16) -> HttpResponse {
    HttpResponse {
        status: code,
        headers: HashMap::new(),
        body: Bytes::new(),
    }
}

fn track(id: &str) -> Track {
    Track::new(id, format!("Track {}", id), format!("https://cdn.example/{}.mp3", id))
}

struct Harness {
    coordinator: Arc<PlaybackCoordinator>,
    engine: Arc<FakeEngine>,
    events: Receiver<CoreEvent>,
}

impl Harness {
    fn new() -> Self {
        Self::with(|builder| builder)
    }

    fn with(
        configure: impl FnOnce(
            core_playback::PlaybackCoordinatorBuilder,
        ) -> core_playback::PlaybackCoordinatorBuilder,
    ) -> Self {
        let engine = Arc::new(FakeEngine::default());
        let bus = EventBus::new(64);
        let events = bus.subscribe();
        let builder = PlaybackCoordinator::builder()
            .engine(engine.clone())
            .event_bus(bus);
        let coordinator = Arc::new(configure(builder).build().unwrap());

        Self {
            coordinator,
            engine,
            events,
        }
    }

    /// Fold everything the engine emitted so far.
    fn settle(&self) {
        self.coordinator.drain_media_events();
    }

    fn engine_emits(&self, event: MediaEvent) {
        self.engine.emit(event);
        self.settle();
    }

    fn published(&mut self) -> Vec<CoreEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    fn completions(&mut self) -> Vec<String> {
        self.published()
            .into_iter()
            .filter_map(|event| match event {
                CoreEvent::Playback(PlaybackEvent::Completed { track_id }) => Some(track_id),
                _ => None,
            })
            .collect()
    }
}

// ============================================================================
// Load and fold
// ============================================================================

#[tokio::test]
async fn test_track_plays_to_completion() {
    let mut h = Harness::new();

    h.coordinator.play_track(track("t1")).await;
    h.engine_emits(MediaEvent::MetadataLoaded { duration: 180.0 });

    let state = h.coordinator.snapshot();
    assert!(!state.is_loading);
    assert_eq!(state.duration, 180.0);
    assert_eq!(state.current_track_id(), Some("t1"));
    assert!(state.is_playing);
    assert_eq!(state.phase, PlaybackPhase::Playing);

    h.engine_emits(MediaEvent::TimeUpdate { position: 179.5 });
    h.engine_emits(MediaEvent::Ended);

    let state = h.coordinator.snapshot();
    assert!(!state.is_playing);
    assert_eq!(state.current_time, 0.0);
    assert_eq!(state.phase, PlaybackPhase::Ready);
    assert_eq!(h.completions(), vec!["t1".to_string()]);
}

#[tokio::test]
async fn test_completion_fires_once_per_natural_end() {
    let mut h = Harness::new();

    h.coordinator.play_track(track("t1")).await;
    h.settle();
    h.engine_emits(MediaEvent::Ended);
    h.engine_emits(MediaEvent::Ended);
    assert_eq!(h.completions(), vec!["t1".to_string()]);

    // Playing it again arms a new completion.
    h.coordinator.play_track(track("t1")).await;
    h.settle();
    h.engine_emits(MediaEvent::Ended);
    assert_eq!(h.completions(), vec!["t1".to_string()]);
}

#[tokio::test]
async fn test_late_end_of_replaced_track_is_credited_to_it() {
    let mut h = Harness::new();

    h.coordinator.play_track(track("a")).await;
    h.engine_emits(MediaEvent::MetadataLoaded { duration: 100.0 });
    h.published();

    // Still queued for `a` when `b` is requested.
    h.engine.emit(MediaEvent::TimeUpdate { position: 99.0 });
    h.engine.emit(MediaEvent::Ended);
    h.coordinator.play_track(track("b")).await;
    h.settle();

    assert_eq!(h.completions(), vec!["a".to_string()]);
    let state = h.coordinator.snapshot();
    assert_eq!(state.current_track_id(), Some("b"));
    assert_eq!(state.phase, PlaybackPhase::Playing);
    assert!(state.is_playing);
    assert_eq!(state.current_time, 0.0);
}

#[tokio::test]
async fn test_replaced_track_events_leave_new_track_alone() {
    let mut h = Harness::new();

    h.coordinator.play_track(track("a")).await;
    h.settle();
    h.engine.emit(MediaEvent::MetadataLoaded { duration: 240.0 });
    h.engine.emit(MediaEvent::Error {
        kind: MediaErrorKind::Network,
        message: None,
    });
    h.coordinator.play_track(track("b")).await;
    h.settle();

    let state = h.coordinator.snapshot();
    assert_eq!(state.current_track_id(), Some("b"));
    assert_eq!(state.duration, 0.0);
    assert!(state.error.is_none());
    assert!(state.is_playing);

    // Its own end completes `b`, exactly once.
    h.engine_emits(MediaEvent::Ended);
    h.engine_emits(MediaEvent::Ended);
    assert_eq!(h.completions(), vec!["b".to_string()]);
}

#[tokio::test]
async fn test_loading_publishes_lifecycle_events() {
    let mut h = Harness::new();

    h.coordinator.play_track(track("t1")).await;

    let events = h.published();
    assert_eq!(
        events,
        vec![
            CoreEvent::Playback(PlaybackEvent::Loading {
                track_id: "t1".to_string(),
                title: "Track t1".to_string(),
            }),
            CoreEvent::Playback(PlaybackEvent::Started {
                track_id: "t1".to_string(),
                title: "Track t1".to_string(),
            }),
        ]
    );
    assert_eq!(h.engine.loads(), vec!["https://cdn.example/t1.mp3".to_string()]);
}

#[tokio::test]
async fn test_is_playing_follows_engine_events_only() {
    let h = Harness::new();

    h.coordinator.play_track(track("t1")).await;
    // The engine accepted play but its event has not been folded yet.
    assert!(!h.coordinator.snapshot().is_playing);

    h.settle();
    assert!(h.coordinator.snapshot().is_playing);
}

#[tokio::test]
async fn test_time_updates_never_exceed_duration() {
    let h = Harness::new();

    h.coordinator.play_track(track("t1")).await;
    h.engine_emits(MediaEvent::MetadataLoaded { duration: 120.0 });
    h.engine_emits(MediaEvent::TimeUpdate { position: 130.0 });

    assert_eq!(h.coordinator.snapshot().current_time, 120.0);
}

// ============================================================================
// Same-track toggle and single player
// ============================================================================

#[tokio::test]
async fn test_same_track_toggles_without_reload() {
    let h = Harness::new();

    h.coordinator.play_track(track("t1")).await;
    h.engine_emits(MediaEvent::MetadataLoaded { duration: 180.0 });
    h.engine_emits(MediaEvent::TimeUpdate { position: 42.0 });
    assert!(h.coordinator.snapshot().is_playing);

    h.coordinator.play_track(track("t1")).await;
    h.settle();
    let state = h.coordinator.snapshot();
    assert!(!state.is_playing);
    assert!(!state.is_loading);
    assert_eq!(state.current_time, 42.0);
    assert_eq!(state.phase, PlaybackPhase::Paused);

    h.coordinator.play_track(track("t1")).await;
    h.settle();
    let state = h.coordinator.snapshot();
    assert!(state.is_playing);
    assert_eq!(state.current_time, 42.0);

    assert_eq!(h.engine.loads().len(), 1);
}

#[tokio::test]
async fn test_new_track_silences_previous_before_loading() {
    let h = Harness::new();

    for id in ["a", "b", "c"] {
        h.coordinator.play_track(track(id)).await;
        h.settle();
    }

    let state = h.engine.state.lock().unwrap();
    assert!(state.playing);
    assert_eq!(state.source.as_deref(), Some("https://cdn.example/c.mp3"));
    // One pause before each replacement load.
    assert_eq!(state.pauses, 2);
    drop(state);

    let snapshot = h.coordinator.snapshot();
    assert_eq!(snapshot.current_track_id(), Some("c"));
    assert!(snapshot.is_playing);
}

#[tokio::test]
async fn test_same_track_while_loading_is_ignored() {
    let probe = Arc::new(SlowProbe {
        slow_url: "https://cdn.example/t1.mp3".to_string(),
        release: Notify::new(),
        seen: Mutex::new(Vec::new()),
    });
    let h = Harness::with(|b| b.http_client(probe.clone()));

    let first = tokio::spawn({
        let coordinator = Arc::clone(&h.coordinator);
        async move { coordinator.play_track(track("t1")).await }
    });
    while probe.seen.lock().unwrap().is_empty() {
        tokio::task::yield_now().await;
    }

    h.coordinator.play_track(track("t1")).await;
    assert_eq!(probe.seen.lock().unwrap().len(), 1);

    probe.release.notify_one();
    first.await.unwrap();
    assert_eq!(h.engine.loads().len(), 1);
}

// ============================================================================
// Source validation
// ============================================================================

#[tokio::test]
async fn test_invalid_source_leaves_current_track_alone() {
    let mut h = Harness::new();

    h.coordinator.play_track(track("t1")).await;
    h.settle();
    h.published();

    let mut broken = track("t2");
    broken.media_url = String::new();
    h.coordinator.play_track(broken).await;

    let state = h.coordinator.snapshot();
    assert_eq!(
        state.error,
        Some(PlaybackFailure::InvalidSource(InvalidSourceReason::Empty))
    );
    assert!(!state.is_loading);
    assert_eq!(state.current_track_id(), Some("t1"));
    assert!(state.is_playing);
    assert_eq!(h.engine.loads().len(), 1);

    assert_eq!(
        h.published(),
        vec![CoreEvent::Playback(PlaybackEvent::Error {
            track_id: Some("t2".to_string()),
            message: "No audio file available for this track. Please contact support."
                .to_string(),
            recoverable: false,
        })]
    );
}

#[tokio::test]
async fn test_invalid_source_without_prior_track() {
    let h = Harness::new();

    let mut placeholder = track("t1");
    placeholder.media_url = "https://cdn.example/undefined".to_string();
    h.coordinator.play_track(placeholder).await;

    let state = h.coordinator.snapshot();
    assert_eq!(
        state.error,
        Some(PlaybackFailure::InvalidSource(
            InvalidSourceReason::Placeholder
        ))
    );
    assert!(state.current_track.is_none());
    assert!(!state.is_loading);
    assert_eq!(state.phase, PlaybackPhase::Idle);

    let mut relative = track("t2");
    relative.media_url = "audio/t2.mp3".to_string();
    h.coordinator.play_track(relative).await;
    assert!(matches!(
        h.coordinator.snapshot().error,
        Some(PlaybackFailure::InvalidSource(InvalidSourceReason::Malformed(_)))
    ));
    assert!(h.engine.loads().is_empty());
}

#[tokio::test]
async fn test_clear_error_does_not_retry() {
    let h = Harness::new();

    let mut broken = track("t1");
    broken.media_url = "  ".to_string();
    h.coordinator.play_track(broken).await;
    assert!(h.coordinator.snapshot().error.is_some());

    h.coordinator.clear_error();
    assert!(h.coordinator.snapshot().error.is_none());
    assert!(h.engine.loads().is_empty());
}

// ============================================================================
// Reachability probe
// ============================================================================

#[tokio::test]
async fn test_probe_success_loads_source() {
    let mut http = MockHttp::new();
    http.expect_execute_with_retry()
        .withf(|request, policy| {
            request.method == HttpMethod::Head
                && request.url == "https://cdn.example/t1.mp3"
                && policy.max_attempts == 1
        })
        .times(1)
        .returning(|_, _| Ok(status(200)));
    let h = Harness::with(|b| b.http_client(Arc::new(http)));

    h.coordinator.play_track(track("t1")).await;

    assert_eq!(h.engine.loads().len(), 1);
    assert!(h.coordinator.snapshot().error.is_none());
}

#[tokio::test]
async fn test_probe_failure_is_source_unreachable() {
    let mut http = MockHttp::new();
    http.expect_execute_with_retry()
        .returning(|_, _| Ok(status(404)));
    let mut h = Harness::with(|b| b.http_client(Arc::new(http)));

    h.coordinator.play_track(track("t1")).await;

    let state = h.coordinator.snapshot();
    assert_eq!(
        state.error,
        Some(PlaybackFailure::SourceUnreachable("HTTP 404".to_string()))
    );
    assert!(!state.is_loading);
    assert!(!state.is_playing);
    assert_eq!(state.phase, PlaybackPhase::Errored);
    assert_eq!(state.current_track_id(), Some("t1"));
    assert!(h.engine.loads().is_empty());

    let errors: Vec<_> = h
        .published()
        .into_iter()
        .filter(|event| matches!(event, CoreEvent::Playback(PlaybackEvent::Error { .. })))
        .collect();
    assert_eq!(
        errors,
        vec![CoreEvent::Playback(PlaybackEvent::Error {
            track_id: Some("t1".to_string()),
            message: "Audio file not accessible: HTTP 404".to_string(),
            recoverable: true,
        })]
    );
}

#[tokio::test]
async fn test_probe_transport_error_is_source_unreachable() {
    let mut http = MockHttp::new();
    http.expect_execute_with_retry()
        .returning(|_, _| Err(BridgeError::OperationFailed("Request timed out".to_string())));
    let h = Harness::with(|b| b.http_client(Arc::new(http)));

    h.coordinator.play_track(track("t1")).await;

    assert!(matches!(
        h.coordinator.snapshot().error,
        Some(PlaybackFailure::SourceUnreachable(reason)) if reason.contains("timed out")
    ));
}

#[tokio::test]
async fn test_probe_can_be_disabled() {
    let http = MockHttp::new();
    let h = Harness::with(|b| {
        b.http_client(Arc::new(http))
            .config(PlaybackConfig::default().with_reachability_probe(false))
    });

    h.coordinator.play_track(track("t1")).await;
    assert_eq!(h.engine.loads().len(), 1);
}

#[tokio::test]
async fn test_slow_probe_cannot_overwrite_newer_request() {
    let probe = Arc::new(SlowProbe {
        slow_url: "https://cdn.example/a.mp3".to_string(),
        release: Notify::new(),
        seen: Mutex::new(Vec::new()),
    });
    let h = Harness::with(|b| b.http_client(probe.clone()));

    let slow = tokio::spawn({
        let coordinator = Arc::clone(&h.coordinator);
        async move { coordinator.play_track(track("a")).await }
    });
    while probe.seen.lock().unwrap().is_empty() {
        tokio::task::yield_now().await;
    }
    assert_eq!(h.coordinator.snapshot().current_track_id(), Some("a"));
    assert!(h.coordinator.snapshot().is_loading);

    h.coordinator.play_track(track("b")).await;
    h.settle();

    probe.release.notify_one();
    slow.await.unwrap();
    h.settle();

    let state = h.coordinator.snapshot();
    assert_eq!(state.current_track_id(), Some("b"));
    assert!(state.is_playing);
    assert!(state.error.is_none());
    assert_eq!(h.engine.loads(), vec!["https://cdn.example/b.mp3".to_string()]);
}

// ============================================================================
// Engine failures
// ============================================================================

#[tokio::test]
async fn test_rejected_play_surfaces_error() {
    let h = Harness::new();
    h.engine.reject_next_play("NotAllowedError: autoplay blocked");

    h.coordinator.play_track(track("t1")).await;

    let state = h.coordinator.snapshot();
    assert_eq!(
        state.error,
        Some(PlaybackFailure::PlaybackRejected(
            "NotAllowedError: autoplay blocked".to_string()
        ))
    );
    assert!(!state.is_loading);
    assert!(!state.is_playing);
    assert_eq!(state.current_track_id(), Some("t1"));
}

#[tokio::test]
async fn test_rejected_resume_keeps_source_loaded() {
    let h = Harness::new();

    h.coordinator.play_track(track("t1")).await;
    h.engine_emits(MediaEvent::MetadataLoaded { duration: 60.0 });
    h.coordinator.pause();
    h.settle();

    h.engine.reject_next_play("NotAllowedError");
    h.coordinator.resume().await;

    let state = h.coordinator.snapshot();
    assert_eq!(
        state.error,
        Some(PlaybackFailure::PlaybackRejected("NotAllowedError".to_string()))
    );
    assert_eq!(state.phase, PlaybackPhase::Paused);
    assert!(!state.is_playing);
}

#[tokio::test]
async fn test_engine_refusing_source_is_not_supported() {
    let h = Harness::new();
    h.engine.state.lock().unwrap().fail_load = true;

    h.coordinator.play_track(track("t1")).await;

    let state = h.coordinator.snapshot();
    assert_eq!(state.error, Some(PlaybackFailure::SourceNotSupported));
    assert_eq!(state.phase, PlaybackPhase::Errored);
    assert!(!state.is_loading);
}

#[tokio::test]
async fn test_engine_error_kinds_are_mapped() {
    let cases = [
        (MediaErrorKind::Aborted, PlaybackFailure::Aborted),
        (MediaErrorKind::Network, PlaybackFailure::NetworkError),
        (MediaErrorKind::Decode, PlaybackFailure::DecodeError),
        (
            MediaErrorKind::SourceNotSupported,
            PlaybackFailure::SourceNotSupported,
        ),
        (MediaErrorKind::Unknown, PlaybackFailure::UnknownError(None)),
    ];

    for (kind, expected) in cases {
        let h = Harness::new();
        h.coordinator.play_track(track("t1")).await;
        h.settle();

        h.engine_emits(MediaEvent::Error {
            kind,
            message: None,
        });

        let state = h.coordinator.snapshot();
        assert_eq!(state.error, Some(expected));
        assert!(!state.is_playing);
        assert!(!state.is_loading);
        assert_eq!(state.phase, PlaybackPhase::Errored);
    }
}

#[tokio::test]
async fn test_errored_track_reloads_on_next_request() {
    let h = Harness::new();

    h.coordinator.play_track(track("t1")).await;
    h.engine_emits(MediaEvent::Error {
        kind: MediaErrorKind::Network,
        message: None,
    });

    h.coordinator.play_track(track("t1")).await;
    h.settle();

    let state = h.coordinator.snapshot();
    assert_eq!(h.engine.loads().len(), 2);
    assert!(state.error.is_none());
    assert!(state.is_playing);
}

// ============================================================================
// Ad gate
// ============================================================================

#[tokio::test]
async fn test_gate_defers_and_resolve_retries() {
    let mut gate = MockGate::new();
    gate.expect_should_gate_before_play()
        .times(1)
        .returning(|| Ok(GateDecision::Gate));
    let mut h = Harness::with(|b| b.ad_gate(Arc::new(gate)));

    h.coordinator.play_track(track("t1")).await;

    let state = h.coordinator.snapshot();
    assert!(state.current_track.is_none());
    assert_eq!(
        state.pending_gated_track.as_ref().map(|t| t.id.as_str()),
        Some("t1")
    );
    assert!(state.show_interstitial);
    assert!(h.engine.loads().is_empty());
    assert_eq!(
        h.published(),
        vec![CoreEvent::Interstitial(InterstitialEvent::Requested {
            track_id: "t1".to_string(),
        })]
    );

    h.coordinator.resolve_interstitial().await;
    h.settle();

    let state = h.coordinator.snapshot();
    assert_eq!(state.current_track_id(), Some("t1"));
    assert!(state.pending_gated_track.is_none());
    assert!(!state.show_interstitial);
    assert!(state.is_playing);
    assert_eq!(h.engine.loads().len(), 1);
    assert_eq!(
        h.published().first(),
        Some(&CoreEvent::Interstitial(InterstitialEvent::Resolved {
            track_id: "t1".to_string(),
        }))
    );
}

#[tokio::test]
async fn test_gated_request_keeps_previous_track_playing() {
    let mut gate = MockGate::new();
    let mut calls = 0;
    gate.expect_should_gate_before_play().returning(move || {
        calls += 1;
        Ok(if calls == 2 {
            GateDecision::Gate
        } else {
            GateDecision::Proceed
        })
    });
    let h = Harness::with(|b| b.ad_gate(Arc::new(gate)));

    h.coordinator.play_track(track("a")).await;
    h.settle();
    h.coordinator.play_track(track("b")).await;
    h.settle();

    let state = h.coordinator.snapshot();
    assert_eq!(state.current_track_id(), Some("a"));
    assert!(state.is_playing);
    assert!(state.show_interstitial);
}

#[tokio::test]
async fn test_proceeding_request_drops_stale_interstitial() {
    let mut gate = MockGate::new();
    let mut calls = 0;
    gate.expect_should_gate_before_play().returning(move || {
        calls += 1;
        Ok(if calls == 1 {
            GateDecision::Gate
        } else {
            GateDecision::Proceed
        })
    });
    let h = Harness::with(|b| b.ad_gate(Arc::new(gate)));

    h.coordinator.play_track(track("a")).await;
    assert!(h.coordinator.snapshot().show_interstitial);

    h.coordinator.play_track(track("b")).await;
    h.settle();

    let state = h.coordinator.snapshot();
    assert!(!state.show_interstitial);
    assert!(state.pending_gated_track.is_none());
    assert_eq!(state.current_track_id(), Some("b"));
    assert!(state.is_playing);

    // Nothing left to resolve, so `b` keeps playing.
    h.coordinator.resolve_interstitial().await;
    h.settle();
    assert_eq!(h.coordinator.snapshot().current_track_id(), Some("b"));
    assert_eq!(h.engine.loads(), vec!["https://cdn.example/b.mp3".to_string()]);
}

#[tokio::test]
async fn test_gate_failure_proceeds() {
    let mut gate = MockGate::new();
    gate.expect_should_gate_before_play()
        .returning(|| Err(GateError("config fetch failed".to_string())));
    let h = Harness::with(|b| b.ad_gate(Arc::new(gate)));

    h.coordinator.play_track(track("t1")).await;

    let state = h.coordinator.snapshot();
    assert_eq!(state.current_track_id(), Some("t1"));
    assert!(!state.show_interstitial);
    assert_eq!(h.engine.loads().len(), 1);
}

#[tokio::test]
async fn test_resolve_without_pending_is_noop() {
    let mut h = Harness::new();

    h.coordinator.resolve_interstitial().await;

    assert!(h.coordinator.snapshot().current_track.is_none());
    assert!(h.engine.loads().is_empty());
    assert!(h.published().is_empty());
}

// ============================================================================
// Transport controls
// ============================================================================

#[tokio::test]
async fn test_volume_is_clamped() {
    let h = Harness::new();

    h.coordinator.set_volume(-0.5);
    assert_eq!(h.coordinator.snapshot().volume, 0.0);

    h.coordinator.set_volume(1.7);
    assert_eq!(h.coordinator.snapshot().volume, 1.0);
    assert_eq!(h.engine.state.lock().unwrap().volume, 1.0);

    h.coordinator.set_volume(f32::NAN);
    assert_eq!(h.coordinator.snapshot().volume, 1.0);
}

#[tokio::test]
async fn test_seek_is_clamped_to_duration() {
    let mut h = Harness::new();
    h.coordinator.play_track(track("t1")).await;
    h.engine_emits(MediaEvent::MetadataLoaded { duration: 120.0 });
    h.published();

    h.coordinator.seek(-10.0);
    assert_eq!(h.coordinator.snapshot().current_time, 0.0);

    h.coordinator.seek(500.0);
    assert_eq!(h.coordinator.snapshot().current_time, 120.0);
    assert_eq!(h.engine.state.lock().unwrap().position, 120.0);

    h.coordinator.seek(30.5);
    assert_eq!(h.coordinator.snapshot().current_time, 30.5);
    assert_eq!(
        h.published().last(),
        Some(&CoreEvent::Playback(PlaybackEvent::Seeked {
            track_id: "t1".to_string(),
            position_ms: 30_500,
            duration_ms: 120_000,
        }))
    );
}

#[tokio::test]
async fn test_stop_rewinds_but_keeps_track() {
    let mut h = Harness::new();
    h.coordinator.play_track(track("t1")).await;
    h.engine_emits(MediaEvent::MetadataLoaded { duration: 200.0 });
    h.engine_emits(MediaEvent::TimeUpdate { position: 75.0 });
    h.published();

    h.coordinator.stop();
    h.settle();

    let state = h.coordinator.snapshot();
    assert!(!state.is_playing);
    assert_eq!(state.current_time, 0.0);
    assert_eq!(state.current_track_id(), Some("t1"));
    assert_eq!(state.phase, PlaybackPhase::Ready);
    assert_eq!(h.engine.state.lock().unwrap().position, 0.0);
    assert_eq!(
        h.published(),
        vec![CoreEvent::Playback(PlaybackEvent::Stopped {
            track_id: "t1".to_string(),
        })]
    );

    // Stopped tracks resume in place instead of reloading.
    h.coordinator.play_track(track("t1")).await;
    h.settle();
    assert!(h.coordinator.snapshot().is_playing);
    assert_eq!(h.engine.loads().len(), 1);
}

#[tokio::test]
async fn test_stop_during_probe_cancels_load() {
    let probe = Arc::new(SlowProbe {
        slow_url: "https://cdn.example/t1.mp3".to_string(),
        release: Notify::new(),
        seen: Mutex::new(Vec::new()),
    });
    let mut h = Harness::with(|b| b.http_client(probe.clone()));

    let first = tokio::spawn({
        let coordinator = Arc::clone(&h.coordinator);
        async move { coordinator.play_track(track("t1")).await }
    });
    while probe.seen.lock().unwrap().is_empty() {
        tokio::task::yield_now().await;
    }

    h.coordinator.stop();

    let state = h.coordinator.snapshot();
    assert_eq!(state.phase, PlaybackPhase::Idle);
    assert!(!state.is_loading);
    assert!(!state.is_playing);
    assert_eq!(state.current_track_id(), Some("t1"));

    probe.release.notify_one();
    first.await.unwrap();
    h.settle();

    assert!(h.engine.loads().is_empty());
    assert_eq!(h.coordinator.snapshot().phase, PlaybackPhase::Idle);
    let events = h.published();
    assert!(events.contains(&CoreEvent::Playback(PlaybackEvent::Stopped {
        track_id: "t1".to_string(),
    })));
    assert!(!events
        .iter()
        .any(|event| matches!(event, CoreEvent::Playback(PlaybackEvent::Started { .. }))));

    // Requesting it again loads it from scratch.
    probe.release.notify_one();
    h.coordinator.play_track(track("t1")).await;
    h.settle();

    let state = h.coordinator.snapshot();
    assert!(state.is_playing);
    assert_eq!(state.phase, PlaybackPhase::Playing);
    assert_eq!(h.engine.loads(), vec!["https://cdn.example/t1.mp3".to_string()]);
}

#[tokio::test]
async fn test_start_resolving_after_stop_is_silenced() {
    let mut h = Harness::new();
    let release = h.engine.hold_next_play();

    let start = tokio::spawn({
        let coordinator = Arc::clone(&h.coordinator);
        async move { coordinator.play_track(track("t1")).await }
    });
    while h.engine.loads().is_empty() {
        tokio::task::yield_now().await;
    }
    assert_eq!(h.coordinator.snapshot().phase, PlaybackPhase::Loading);

    h.coordinator.stop();
    release.notify_one();
    start.await.unwrap();
    h.settle();

    assert!(!h.engine.state.lock().unwrap().playing);
    let state = h.coordinator.snapshot();
    assert!(!state.is_playing);
    assert_eq!(state.phase, PlaybackPhase::Idle);
    assert_eq!(state.current_track_id(), Some("t1"));
    assert!(!h
        .published()
        .iter()
        .any(|event| matches!(event, CoreEvent::Playback(PlaybackEvent::Started { .. }))));

    h.coordinator.play_track(track("t1")).await;
    h.settle();
    assert!(h.coordinator.snapshot().is_playing);
    assert_eq!(h.engine.loads().len(), 2);
}

#[tokio::test]
async fn test_pause_and_resume_publish_positions() {
    let mut h = Harness::new();
    h.coordinator.play_track(track("t1")).await;
    h.engine_emits(MediaEvent::MetadataLoaded { duration: 200.0 });
    h.engine_emits(MediaEvent::TimeUpdate { position: 12.0 });
    h.published();

    h.coordinator.pause();
    h.settle();
    assert!(!h.coordinator.snapshot().is_playing);

    h.coordinator.resume().await;
    h.settle();
    assert!(h.coordinator.snapshot().is_playing);

    assert_eq!(
        h.published(),
        vec![
            CoreEvent::Playback(PlaybackEvent::Paused {
                track_id: "t1".to_string(),
                position_ms: 12_000,
            }),
            CoreEvent::Playback(PlaybackEvent::Resumed {
                track_id: "t1".to_string(),
                position_ms: 12_000,
            }),
        ]
    );
    assert_eq!(h.engine.pauses(), 1);
}

// ============================================================================
// Observation
// ============================================================================

#[tokio::test]
async fn test_event_pump_and_watchers_see_updates() {
    let h = Harness::new();
    let mut watcher = h.coordinator.subscribe();

    let pump = tokio::spawn({
        let coordinator = Arc::clone(&h.coordinator);
        async move { coordinator.run_event_pump().await }
    });

    h.coordinator.play_track(track("t1")).await;
    h.engine.emit(MediaEvent::MetadataLoaded { duration: 90.0 });

    let state = watcher
        .wait_for(|state| state.is_playing && state.duration == 90.0)
        .await
        .unwrap()
        .clone();
    assert_eq!(state.current_track_id(), Some("t1"));

    // The pump owns the channel now.
    assert_eq!(h.coordinator.drain_media_events(), 0);
    pump.abort();
}
