//! Core service façade and bootstrap helpers.
//!
//! This crate is the application root of the player core. It takes a
//! validated [`CoreConfig`] plus the host's bridges (a [`MediaEngine`] and an
//! optional [`AdGate`]) and wires exactly one [`PlaybackCoordinator`] for the
//! session, along with its event bus and, when enabled, the play-count
//! reporter. [`CoreService::start`] then launches the background tasks:
//!
//! - the media event pump folding engine events into playback state
//! - the play-count reporter listening for completed tracks
//!
//! Desktop apps typically enable the `desktop-shims` feature (which injects
//! the `bridge-desktop` HTTP client), whereas WebAssembly builds enable the
//! `wasm` feature and rely on the adapters from `bridge-wasm`.
//!
//! ```ignore
//! let config = CoreConfig::builder()
//!     .play_count_endpoint("https://music.example/api/audio/update-play-count")
//!     .enable_play_count_reporting(true)
//!     .build()?;
//!
//! let service = CoreService::bootstrap(config, CoreDependencies::new(engine))?;
//! service.start()?;
//!
//! service.coordinator().play_track(track).await;
//! ```

pub mod error;

pub use error::{CoreError, Result};

// Hosts reach the playback and runtime types through the façade.
pub use bridge_traits;
pub use core_playback;
pub use core_runtime;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bridge_traits::MediaEngine;
use core_playback::{AdGate, PlayCountReporter, PlaybackConfig, PlaybackCoordinator};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, Receiver};
use tracing::{debug, info};

#[cfg(feature = "wasm")]
pub use bridge_wasm::WasmBridgeConfig;
#[cfg(feature = "wasm")]
use bridge_wasm::{build_wasm_bridges, WasmBridgeSet};
#[cfg(feature = "wasm")]
use core_runtime::config::CoreConfigBuilder;

/// Host bridges the core requires beyond what [`CoreConfig`] carries.
pub struct CoreDependencies {
    pub media_engine: Arc<dyn MediaEngine>,
    pub ad_gate: Option<Arc<dyn AdGate>>,
}

impl CoreDependencies {
    pub fn new(media_engine: Arc<dyn MediaEngine>) -> Self {
        Self {
            media_engine,
            ad_gate: None,
        }
    }

    /// Consult `gate` before play requests (when interstitials are enabled).
    pub fn with_ad_gate(mut self, gate: Arc<dyn AdGate>) -> Self {
        self.ad_gate = Some(gate);
        self
    }
}

#[cfg(feature = "wasm")]
impl From<&WasmBridgeSet> for CoreDependencies {
    fn from(set: &WasmBridgeSet) -> Self {
        Self::new(set.engine())
    }
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    config: CoreConfig,
    events: EventBus,
    coordinator: Arc<PlaybackCoordinator>,
    reporter: Option<Arc<PlayCountReporter>>,
    started: AtomicBool,
    #[cfg(not(target_arch = "wasm32"))]
    tasks: parking_lot::Mutex<Vec<tokio::task::JoinHandle<()>>>,
}

impl CoreService {
    /// Wire the session's coordinator with default playback settings.
    pub fn bootstrap(config: CoreConfig, deps: CoreDependencies) -> Result<Self> {
        Self::bootstrap_with(config, deps, PlaybackConfig::default())
    }

    /// Wire the session's coordinator.
    ///
    /// Feature flags in `config` win over `playback`: a probe disabled in
    /// [`CoreConfig::features`] stays off whatever `playback` says.
    pub fn bootstrap_with(
        config: CoreConfig,
        deps: CoreDependencies,
        mut playback: PlaybackConfig,
    ) -> Result<Self> {
        config.validate()?;

        let features = config.features;
        let events = EventBus::new(config.event_buffer_size);
        playback.reachability_probe &= features.enable_reachability_probe;

        let mut builder = PlaybackCoordinator::builder()
            .engine(deps.media_engine)
            .event_bus(events.clone())
            .config(playback);

        if features.enable_reachability_probe {
            if let Some(client) = &config.http_client {
                builder = builder.http_client(Arc::clone(client));
            }
        }

        match deps.ad_gate {
            Some(gate) if features.enable_interstitials => builder = builder.ad_gate(gate),
            Some(_) => debug!("Interstitials disabled, ad gate not installed"),
            None => {}
        }

        let coordinator = Arc::new(builder.build()?);

        let reporter = if features.enable_play_count_reporting {
            Some(Arc::new(Self::build_reporter(&config, events.clone())?))
        } else {
            None
        };

        info!(
            event_buffer_size = config.event_buffer_size,
            reachability_probe = coordinator.config().reachability_probe,
            interstitials = features.enable_interstitials,
            play_count_reporting = reporter.is_some(),
            "Core service bootstrapped"
        );

        Ok(Self {
            inner: Arc::new(ServiceInner {
                config,
                events,
                coordinator,
                reporter,
                started: AtomicBool::new(false),
                #[cfg(not(target_arch = "wasm32"))]
                tasks: parking_lot::Mutex::new(Vec::new()),
            }),
        })
    }

    fn build_reporter(config: &CoreConfig, events: EventBus) -> Result<PlayCountReporter> {
        let client = config
            .http_client
            .clone()
            .ok_or_else(|| CoreError::CapabilityMissing {
                capability: "HttpClient".to_string(),
                message: "Play-count reporting needs an HTTP client".to_string(),
            })?;
        let endpoint = config.play_count_endpoint.clone().ok_or_else(|| {
            CoreError::InitializationFailed(
                "Play-count reporting enabled without an endpoint".to_string(),
            )
        })?;

        Ok(PlayCountReporter::new(client, endpoint, events))
    }

    /// Launch the background tasks. Calling it again is a no-op.
    ///
    /// # Errors
    ///
    /// On native targets this must run inside a tokio runtime.
    pub fn start(&self) -> Result<()> {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            debug!("Core service already started");
            return Ok(());
        }

        if let Err(e) = self.spawn_tasks() {
            self.inner.started.store(false, Ordering::SeqCst);
            return Err(e);
        }

        info!("Core service started");
        Ok(())
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn spawn_tasks(&self) -> Result<()> {
        let handle = tokio::runtime::Handle::try_current().map_err(|e| {
            CoreError::InitializationFailed(format!(
                "CoreService::start requires a tokio runtime: {}",
                e
            ))
        })?;

        let mut tasks = self.inner.tasks.lock();

        let coordinator = Arc::clone(&self.inner.coordinator);
        tasks.push(handle.spawn(async move { coordinator.run_event_pump().await }));

        if let Some(reporter) = &self.inner.reporter {
            // Subscribe here so completions emitted before the task first
            // runs are still delivered.
            let receiver = self.inner.events.subscribe();
            let reporter = Arc::clone(reporter);
            tasks.push(handle.spawn(async move { reporter.run(receiver).await }));
        }

        Ok(())
    }

    #[cfg(target_arch = "wasm32")]
    fn spawn_tasks(&self) -> Result<()> {
        let coordinator = Arc::clone(&self.inner.coordinator);
        wasm_bindgen_futures::spawn_local(async move { coordinator.run_event_pump().await });

        if let Some(reporter) = &self.inner.reporter {
            let receiver = self.inner.events.subscribe();
            let reporter = Arc::clone(reporter);
            wasm_bindgen_futures::spawn_local(async move { reporter.run(receiver).await });
        }

        Ok(())
    }

    /// Stop the background tasks started by [`start`](Self::start). A shut
    /// down service cannot be started again.
    ///
    /// On `wasm32` the tasks live as long as the page.
    pub fn shutdown(&self) {
        self.abort_tasks();
        info!("Core service stopped");
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn abort_tasks(&self) {
        for task in self.inner.tasks.lock().drain(..) {
            task.abort();
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn abort_tasks(&self) {}

    /// Whether [`start`](Self::start) has run.
    pub fn is_started(&self) -> bool {
        self.inner.started.load(Ordering::SeqCst)
    }

    /// The session's playback coordinator.
    pub fn coordinator(&self) -> Arc<PlaybackCoordinator> {
        Arc::clone(&self.inner.coordinator)
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    /// Receiver for every notification published from now on.
    pub fn subscribe_events(&self) -> Receiver<CoreEvent> {
        self.inner.events.subscribe()
    }

    pub fn config(&self) -> &CoreConfig {
        &self.inner.config
    }

    pub fn play_count_reporter(&self) -> Option<Arc<PlayCountReporter>> {
        self.inner.reporter.clone()
    }
}

/// Convenience bootstrapper for WebAssembly hosts.
///
/// Builds the browser bridges, injects the `fetch` client into `config`,
/// wires the service and starts it.
///
/// ```ignore
/// use core_service::{bootstrap_wasm, WasmBridgeConfig};
/// use core_runtime::config::CoreConfig;
///
/// let core = bootstrap_wasm(
///     WasmBridgeConfig::default().with_audio_element_id("player"),
///     CoreConfig::builder(),
///     None,
/// )?;
/// core.coordinator().play_track(track).await;
/// ```
#[cfg(feature = "wasm")]
pub fn bootstrap_wasm(
    bridge_config: WasmBridgeConfig,
    config: CoreConfigBuilder,
    ad_gate: Option<Arc<dyn AdGate>>,
) -> Result<CoreService> {
    let bridges = build_wasm_bridges(bridge_config)
        .map_err(|err| CoreError::InitializationFailed(err.to_string()))?;

    let config = config.http_client(bridges.http()).build()?;
    let mut deps = CoreDependencies::from(&bridges);
    deps.ad_gate = ad_gate;

    let service = CoreService::bootstrap(config, deps)?;
    service.start()?;
    Ok(service)
}
