//! # Play-Count Reporter
//!
//! Listens for [`PlaybackEvent::Completed`] on the event bus and tells the
//! backend a track was played through. The coordinator never waits for this:
//! a failed report is logged and dropped. Each completion is posted once,
//! never retried: the endpoint increments a counter.
//!
//! Wire format:
//!
//! ```text
//! POST <endpoint>            {"trackId": "t1"}
//! 200 OK                     {"playCount": 42}
//! ```

use std::sync::Arc;

use bridge_traits::{HttpClient, HttpMethod, HttpRequest, RetryPolicy};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent, Receiver, RecvError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{PlaybackError, Result};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlayCountRequest<'a> {
    track_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayCountResponse {
    play_count: u64,
}

/// Reports completed tracks to the play-count endpoint.
pub struct PlayCountReporter {
    http_client: Arc<dyn HttpClient>,
    endpoint: Url,
    events: EventBus,
}

impl PlayCountReporter {
    pub fn new(http_client: Arc<dyn HttpClient>, endpoint: Url, events: EventBus) -> Self {
        Self {
            http_client,
            endpoint,
            events,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Report one completed play and publish the updated count.
    pub async fn report(&self, track_id: &str) -> Result<u64> {
        let request = HttpRequest::new(HttpMethod::Post, self.endpoint.as_str())
            .json(&PlayCountRequest { track_id })?;

        let response = self
            .http_client
            .execute_with_retry(request, RetryPolicy::no_retry())
            .await?;
        if !response.is_success() {
            return Err(PlaybackError::Internal(format!(
                "Play-count endpoint answered HTTP {}",
                response.status
            )));
        }

        let body: PlayCountResponse = response.json()?;
        info!(track_id, play_count = body.play_count, "Play count updated");

        self.events
            .emit(CoreEvent::Playback(PlaybackEvent::PlayCountUpdated {
                track_id: track_id.to_string(),
                play_count: body.play_count,
            }))
            .ok();

        Ok(body.play_count)
    }

    /// Report every completion arriving on `receiver` until its bus closes.
    ///
    /// Subscribe before spawning so no completion slips through in between.
    pub async fn run(&self, mut receiver: Receiver<CoreEvent>) {
        debug!(endpoint = %self.endpoint, "Play-count reporter started");

        loop {
            match receiver.recv().await {
                Ok(CoreEvent::Playback(PlaybackEvent::Completed { track_id })) => {
                    if let Err(e) = self.report(&track_id).await {
                        warn!(track_id = %track_id, error = %e, "Failed to report play count");
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Play-count reporter lagged behind the event bus");
                }
                Err(RecvError::Closed) => break,
            }
        }

        debug!("Play-count reporter stopped");
    }
}
