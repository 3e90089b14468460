//! Playable track model and media URL validation.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{InvalidSourceReason, PlaybackFailure};

/// Language shown for lyrics that carry no explicit language label.
pub const DEFAULT_LYRICS_LANGUAGE: &str = "en";

/// Substrings left behind when a missing value was stringified on its way
/// into a URL.
const PLACEHOLDER_MARKERS: &[&str] = &["undefined", "null"];

/// An identified, playable audio item.
///
/// Tracks are plain values handed to the coordinator by whatever feature
/// selected them. Identity is the `id` alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub album: String,
    /// Advisory duration in seconds; the engine's metadata wins once loaded.
    #[serde(default)]
    pub duration_hint: Option<f64>,
    #[serde(default)]
    pub artwork_url: Option<String>,
    #[serde(default)]
    pub media_url: String,
    #[serde(default)]
    pub lyrics: Option<String>,
    #[serde(default)]
    pub lyrics_language: Option<String>,
}

impl Track {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        media_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: String::new(),
            album: String::new(),
            duration_hint: None,
            artwork_url: None,
            media_url: media_url.into(),
            lyrics: None,
            lyrics_language: None,
        }
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = artist.into();
        self
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = album.into();
        self
    }

    pub fn with_duration_hint(mut self, seconds: f64) -> Self {
        self.duration_hint = Some(seconds);
        self
    }

    pub fn with_artwork_url(mut self, url: impl Into<String>) -> Self {
        self.artwork_url = Some(url.into());
        self
    }

    pub fn with_lyrics(mut self, lyrics: impl Into<String>, language: Option<String>) -> Self {
        self.lyrics = Some(lyrics.into());
        self.lyrics_language = language;
        self
    }

    /// Label for the lyrics language. `None` when the track has no lyrics.
    pub fn lyrics_language(&self) -> Option<&str> {
        self.lyrics.as_ref()?;
        Some(
            self.lyrics_language
                .as_deref()
                .filter(|lang| !lang.trim().is_empty())
                .unwrap_or(DEFAULT_LYRICS_LANGUAGE),
        )
    }

    /// Check the media URL before any network activity.
    ///
    /// Blank URLs, stringified placeholders and URLs that fail to parse as
    /// absolute URLs are each reported with their own reason.
    pub fn validate_media_url(&self) -> Result<Url, PlaybackFailure> {
        let raw = self.media_url.trim();
        if raw.is_empty() {
            return Err(PlaybackFailure::InvalidSource(InvalidSourceReason::Empty));
        }

        if PLACEHOLDER_MARKERS.iter().any(|marker| raw.contains(marker)) {
            return Err(PlaybackFailure::InvalidSource(
                InvalidSourceReason::Placeholder,
            ));
        }

        Url::parse(raw).map_err(|e| {
            PlaybackFailure::InvalidSource(InvalidSourceReason::Malformed(e.to_string()))
        })
    }
}
