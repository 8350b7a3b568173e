//! Track recommendation client
//!
//! One outbound request per call, no retry: the upstream is rate-limited and the
//! caller is already showing an "analyzing" state, so failures surface immediately.
//!
//! Request: `GET {recommender_url}?limit=N&seed_genres=a,b&market=XX` with a bearer token.
//! Response: `{ "tracks": [...] }` or a bare array. Items are either flat
//! (`name|title`, `artist`, `spotify_url`, `embed_url`) or catalog-shaped
//! (`name`, `artists[].name`, `external_urls.spotify`, `id`, `album.images`); both are
//! folded into `Track` here and nowhere else.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::TokenSource;
use crate::models::Track;
use crate::services::detection_client::upstream_error_message;

const USER_AGENT: &str = concat!("MoodTune/", env!("CARGO_PKG_VERSION"));
const EMBED_BASE_URL: &str = "https://open.spotify.com/embed/track";
const UNKNOWN_TITLE: &str = "Unknown Title";
const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Recommendation client errors
///
/// A successful response with zero tracks is NOT an error; callers get `Ok(vec![])`.
#[derive(Debug, Error)]
pub enum RecommendationError {
    #[error("No seed genres supplied")]
    EmptySeeds,

    #[error("Recommendation service credential is not configured")]
    MissingCredential,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Recommendation service timed out")]
    Timeout,

    #[error("Recommendation service error {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Anything that can turn seed genres into tracks
#[async_trait]
pub trait TrackRecommender: Send + Sync {
    async fn recommend(
        &self,
        seeds: &[String],
        limit: u32,
        market: &str,
    ) -> Result<Vec<Track>, RecommendationError>;
}

/// HTTP client for the external recommendation service
pub struct RecommendationClient {
    http_client: reqwest::Client,
    endpoint: String,
    tokens: Arc<dyn TokenSource>,
}

impl RecommendationClient {
    pub fn new(
        endpoint: impl Into<String>,
        tokens: Arc<dyn TokenSource>,
        timeout: Duration,
    ) -> Result<Self, RecommendationError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| RecommendationError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
            tokens,
        })
    }
}

#[async_trait]
impl TrackRecommender for RecommendationClient {
    async fn recommend(
        &self,
        seeds: &[String],
        limit: u32,
        market: &str,
    ) -> Result<Vec<Track>, RecommendationError> {
        if seeds.is_empty() {
            return Err(RecommendationError::EmptySeeds);
        }

        let token = self
            .tokens
            .current_token()
            .ok_or(RecommendationError::MissingCredential)?;

        let seed_genres = seeds.join(",");
        let limit = limit.to_string();
        let params = [
            ("limit", limit.as_str()),
            ("seed_genres", seed_genres.as_str()),
            ("market", market),
        ];

        tracing::debug!(
            seed_genres = %seed_genres,
            limit = %limit,
            market = %market,
            "Querying recommendation service"
        );

        let response = self
            .http_client
            .get(&self.endpoint)
            .bearer_auth(token)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RecommendationError::Timeout
                } else {
                    RecommendationError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = upstream_error_message(&body);
            tracing::warn!(
                status = status.as_u16(),
                message = %message,
                "Recommendation service rejected request"
            );
            return Err(RecommendationError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                RecommendationError::Timeout
            } else {
                RecommendationError::ParseError(e.to_string())
            }
        })?;

        let tracks = normalize_tracks(&body)?;
        tracing::info!(
            seed_genres = %seed_genres,
            tracks = tracks.len(),
            "Recommendations received"
        );
        Ok(tracks)
    }
}

// ============================================================================
// Wire normalization
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireTrack {
    id: Option<String>,
    name: Option<String>,
    title: Option<String>,
    artist: Option<String>,
    artists: Option<Vec<WireArtist>>,
    spotify_url: Option<String>,
    embed_url: Option<String>,
    external_urls: Option<WireExternalUrls>,
    image: Option<String>,
    album: Option<WireAlbum>,
    preview_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireArtist {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireExternalUrls {
    spotify: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireAlbum {
    images: Option<Vec<WireImage>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireImage {
    url: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl From<WireTrack> for Track {
    fn from(wire: WireTrack) -> Self {
        let title = non_empty(wire.title)
            .or_else(|| non_empty(wire.name))
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string());

        let artist = non_empty(wire.artist)
            .or_else(|| {
                wire.artists
                    .unwrap_or_default()
                    .into_iter()
                    .find_map(|a| non_empty(a.name))
            })
            .unwrap_or_else(|| UNKNOWN_ARTIST.to_string());

        let external_url = non_empty(wire.spotify_url)
            .or_else(|| wire.external_urls.and_then(|u| non_empty(u.spotify)));

        let embeddable_url = non_empty(wire.embed_url).or_else(|| {
            non_empty(wire.id).map(|id| format!("{}/{}", EMBED_BASE_URL, id))
        });

        let image_url = non_empty(wire.image).or_else(|| {
            wire.album
                .and_then(|album| album.images)
                .and_then(|images| images.into_iter().find_map(|i| non_empty(i.url)))
        });

        Track {
            title,
            artist,
            external_url,
            embeddable_url,
            image_url,
            preview_url: non_empty(wire.preview_url),
        }
    }
}

/// Extract and normalize the track list from a recommender response body
///
/// Items without any link are kept. Items that are not JSON objects are not tracks
/// and are skipped with a warning.
pub fn normalize_tracks(body: &Value) -> Result<Vec<Track>, RecommendationError> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("tracks") {
            Some(Value::Array(items)) => items,
            Some(Value::Object(page)) => match page.get("items") {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(RecommendationError::ParseError(
                        "tracks object has no items array".to_string(),
                    ))
                }
            },
            Some(Value::Null) | None => {
                return Err(RecommendationError::ParseError(
                    "response has no tracks field".to_string(),
                ))
            }
            Some(other) => {
                return Err(RecommendationError::ParseError(format!(
                    "tracks field is not a list: {}",
                    other
                )))
            }
        },
        other => {
            return Err(RecommendationError::ParseError(format!(
                "unexpected response body: {}",
                other
            )))
        }
    };

    let mut tracks = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        if !item.is_object() {
            tracing::warn!(index, "Skipping non-object track entry");
            continue;
        }
        match serde_json::from_value::<WireTrack>(item.clone()) {
            Ok(wire) => tracks.push(Track::from(wire)),
            Err(e) => {
                tracing::warn!(index, error = %e, "Skipping malformed track entry");
            }
        }
    }
    Ok(tracks)
}
