//! `MediaEngine` backed by an `HTMLAudioElement`.
//!
//! The element's DOM events are forwarded into the attached
//! [`MediaEventSink`]:
//!
//! | DOM event        | Media event                      |
//! |------------------|----------------------------------|
//! | `loadedmetadata` | `MetadataLoaded { duration }`    |
//! | `timeupdate`     | `TimeUpdate { position }`        |
//! | `play`           | `Play`                           |
//! | `pause`          | `Pause`                          |
//! | `ended`          | `Ended`                          |
//! | `error`          | `Error { kind, message }`        |
//!
//! Listeners are removed again when the engine is dropped.

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result as BridgeResult},
    MediaEngine, MediaErrorKind, MediaEventSink,
};
use tracing::{debug, warn};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Event, HtmlAudioElement};

use crate::error::{js_message, WasmError, WasmResult};

type SharedSink = Rc<RefCell<Option<MediaEventSink>>>;

struct Listener {
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

/// Audio engine driving a single `HTMLAudioElement`.
///
/// The element holds one source at a time, so loading a new track stops the
/// previous one.
pub struct HtmlAudioEngine {
    element: HtmlAudioElement,
    sink: SharedSink,
    listeners: Vec<Listener>,
}

impl HtmlAudioEngine {
    /// Create a detached audio element and wire its events.
    pub fn new() -> WasmResult<Self> {
        let element = HtmlAudioElement::new()?;
        Self::with_element(element)
    }

    /// Drive an element the host already owns, e.g. one placed in the page.
    pub fn with_element(element: HtmlAudioElement) -> WasmResult<Self> {
        element.set_preload("metadata");

        let sink: SharedSink = Rc::new(RefCell::new(None));
        let mut engine = Self {
            element,
            sink,
            listeners: Vec::new(),
        };

        engine.listen("loadedmetadata", |element, sink| {
            sink.metadata_loaded(element.duration());
        })?;
        engine.listen("timeupdate", |element, sink| {
            sink.time_update(element.current_time());
        })?;
        engine.listen("play", |_, sink| {
            sink.play();
        })?;
        engine.listen("pause", |_, sink| {
            sink.pause();
        })?;
        engine.listen("ended", |_, sink| {
            sink.ended();
        })?;
        engine.listen("error", |element, sink| {
            let (kind, message) = match element.error() {
                Some(error) => {
                    let message = error.message();
                    (
                        MediaErrorKind::from_code(error.code()),
                        (!message.is_empty()).then_some(message),
                    )
                }
                None => (MediaErrorKind::Unknown, None),
            };
            warn!(?kind, "Audio element reported an error");
            sink.error(kind, message);
        })?;

        Ok(engine)
    }

    /// The wrapped element.
    pub fn element(&self) -> &HtmlAudioElement {
        &self.element
    }

    fn listen(
        &mut self,
        event: &'static str,
        forward: impl Fn(&HtmlAudioElement, &MediaEventSink) + 'static,
    ) -> WasmResult<()> {
        let element = self.element.clone();
        let sink = Rc::clone(&self.sink);
        let callback = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            if let Some(sink) = sink.borrow().as_ref() {
                forward(&element, sink);
            }
        });

        self.element
            .add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
            .map_err(WasmError::from)?;
        self.listeners.push(Listener { event, callback });
        Ok(())
    }
}

impl Drop for HtmlAudioEngine {
    fn drop(&mut self) {
        let _ = self.element.pause();
        for listener in self.listeners.drain(..) {
            let _ = self.element.remove_event_listener_with_callback(
                listener.event,
                listener.callback.as_ref().unchecked_ref(),
            );
        }
    }
}

#[async_trait(?Send)]
impl MediaEngine for HtmlAudioEngine {
    fn attach(&self, sink: MediaEventSink) {
        *self.sink.borrow_mut() = Some(sink);
    }

    fn load(&self, url: &str) -> BridgeResult<()> {
        self.element
            .pause()
            .map_err(|err| media_error("pause", &err))?;
        self.element.set_src(url);
        self.element.load();
        debug!("Audio element source replaced");
        Ok(())
    }

    async fn play(&self) -> BridgeResult<()> {
        let promise = self
            .element
            .play()
            .map_err(|err| BridgeError::Rejected(js_message(&err)))?;

        JsFuture::from(promise)
            .await
            .map(|_| ())
            .map_err(|err| BridgeError::Rejected(js_message(&err)))
    }

    fn pause(&self) -> BridgeResult<()> {
        self.element
            .pause()
            .map_err(|err| media_error("pause", &err))
    }

    fn set_current_time(&self, seconds: f64) -> BridgeResult<()> {
        self.element.set_current_time(seconds);
        Ok(())
    }

    fn set_volume(&self, volume: f32) -> BridgeResult<()> {
        self.element.set_volume(f64::from(volume.clamp(0.0, 1.0)));
        Ok(())
    }
}

fn media_error(context: &str, err: &wasm_bindgen::JsValue) -> BridgeError {
    BridgeError::OperationFailed(format!("HtmlAudioEngine {context}: {}", js_message(err)))
}
