//! Catalog client for a Spotify-compatible Web API.
//!
//! Popular tracks come from a configured playlist; search uses the track
//! search endpoint with offset/limit paging. The `next`/`previous` URLs of
//! the response are passed through untouched as page cursors.

mod mapping;
pub mod models;

use async_trait::async_trait;
use deck_core::{Catalog, CatalogConfig, CatalogError, CatalogResult, PageRequest, Track, TrackPage};
use mapping::{map_page, map_track};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

pub const CATALOG_ID: &str = "spotify";

/// The playlist endpoint caps a page at 50 entries.
const POPULAR_LIMIT: u32 = 50;

#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub base_url: String,
    pub access_token: Option<String>,
    pub popular_playlist_id: String,
    pub market: Option<String>,
}

impl SpotifyConfig {
    /// The token is resolved separately (config or keyring) and passed in.
    pub fn from_catalog_config(config: &CatalogConfig, access_token: Option<String>) -> Self {
        Self {
            base_url: config.base_url.clone(),
            access_token,
            popular_playlist_id: config.popular_playlist_id.clone(),
            market: config.market.clone(),
        }
    }
}

#[derive(Clone)]
pub struct SpotifyCatalog {
    id: String,
    client: Client,
    base_url: Url,
    access_token: Option<String>,
    popular_playlist_id: String,
    market: Option<String>,
}

impl std::fmt::Debug for SpotifyCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyCatalog")
            .field("base_url", &self.base_url.as_str())
            .field("popular_playlist_id", &self.popular_playlist_id)
            .field("market", &self.market)
            .field("authenticated", &self.access_token.is_some())
            .finish()
    }
}

impl SpotifyCatalog {
    pub fn new(config: SpotifyConfig) -> CatalogResult<Self> {
        let mut base = config.base_url.trim().to_string();
        // `Url::join` drops the last segment unless the base ends in a slash.
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| CatalogError::Other {
            message: format!("invalid base_url: {e}"),
        })?;
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| CatalogError::Other {
                message: e.to_string(),
            })?;
        Ok(Self {
            id: CATALOG_ID.into(),
            client,
            base_url,
            access_token: config.access_token.filter(|t| !t.trim().is_empty()),
            popular_playlist_id: config.popular_playlist_id,
            market: config.market.filter(|m| !m.trim().is_empty()),
        })
    }

    fn endpoint(&self, path: &str) -> CatalogResult<Url> {
        self.base_url.join(path).map_err(|e| CatalogError::Other {
            message: e.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        mut query: Vec<(&'static str, String)>,
    ) -> CatalogResult<T> {
        if let Some(market) = &self.market {
            query.push(("market", market.clone()));
        }
        let mut request = self.client.get(url.clone()).query(&query);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        tracing::debug!(url = %url, ?query, "catalog request");
        let resp = request.send().await.map_err(|e| CatalogError::Network {
            message: e.to_string(),
        })?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let err = map_status(status, &body);
            tracing::warn!(%status, error = %err, "catalog request rejected");
            return Err(err);
        }
        let bytes = resp.bytes().await.map_err(|e| CatalogError::Network {
            message: e.to_string(),
        })?;
        serde_json::from_slice(&bytes).map_err(|e| CatalogError::InvalidResponse {
            message: e.to_string(),
        })
    }
}

/// Map a non-success status to a catalog error, using the API's error
/// message when the body carries one.
fn map_status(status: StatusCode, body: &str) -> CatalogError {
    let message = serde_json::from_str::<models::ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| status.to_string());
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            CatalogError::Authentication { message }
        }
        StatusCode::TOO_MANY_REQUESTS => CatalogError::RateLimited { message },
        _ => CatalogError::Other { message },
    }
}

#[async_trait]
impl Catalog for SpotifyCatalog {
    fn id(&self) -> &str {
        &self.id
    }

    async fn popular_tracks(&self) -> CatalogResult<Vec<Track>> {
        let url = self.endpoint(&format!("v1/playlists/{}/tracks", self.popular_playlist_id))?;
        let body: models::PlaylistTracksResponse = self
            .get_json(url, vec![("limit", POPULAR_LIMIT.to_string())])
            .await?;
        let tracks: Vec<Track> = body
            .items
            .iter()
            .filter_map(|item| item.track.as_ref())
            .filter_map(|track| map_track(track, &self.id))
            .collect();
        tracing::debug!(count = tracks.len(), "popular playlist fetched");
        Ok(tracks)
    }

    async fn search_tracks(&self, keyword: &str, paging: PageRequest) -> CatalogResult<TrackPage> {
        let url = self.endpoint("v1/search")?;
        let body: models::SearchResponse = self
            .get_json(
                url,
                vec![
                    ("q", keyword.to_string()),
                    ("type", "track".to_string()),
                    ("limit", paging.limit.to_string()),
                    ("offset", paging.offset.to_string()),
                ],
            )
            .await?;
        Ok(map_page(body.tracks, &self.id))
    }
}
