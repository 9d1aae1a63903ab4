use crate::models::{PageRequest, Track, TrackPage};
use std::time::Duration;
use thiserror::Error;

/// Categories of catalog failures surfaced to the session and the view.
///
/// Every variant is recoverable: the caller keeps its previous state and the
/// user may retry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("network error: {message}")]
    Network { message: String },
    #[error("authentication error: {message}")]
    Authentication { message: String },
    #[error("rate limited: {message}")]
    RateLimited { message: String },
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },
    #[error("request timed out after {after:?}")]
    Timeout { after: Duration },
    #[error("{message}")]
    Other { message: String },
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Catalog interface.
///
/// Catalogs return metadata and preview URLs only; playback is handled by the
/// audio output.
#[async_trait::async_trait]
pub trait Catalog: Send + Sync {
    /// Stable catalog identifier (e.g., "spotify" or "memory").
    fn id(&self) -> &str;

    /// The default list shown before any search has been issued.
    async fn popular_tracks(&self) -> CatalogResult<Vec<Track>>;

    /// One page of keyword matches in catalog order. The presence of the
    /// page's `next`/`previous` cursors is the only pagination signal.
    async fn search_tracks(&self, keyword: &str, paging: PageRequest)
        -> CatalogResult<TrackPage>;
}
