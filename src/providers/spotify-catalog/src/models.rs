//! Wire shapes of the Web API responses this catalog reads. Fields the
//! client does not use are left out.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PlaylistTracksResponse {
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistItem {
    /// Null for removed or unavailable entries.
    #[serde(default)]
    pub track: Option<SpotifyTrack>,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub tracks: TrackPaging,
}

#[derive(Debug, Deserialize)]
pub struct TrackPaging {
    #[serde(default)]
    pub items: Vec<SpotifyTrack>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default)]
    pub total: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SpotifyTrack {
    /// Local files in playlists carry no id.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default)]
    pub album: Option<AlbumRef>,
    #[serde(default)]
    pub duration_ms: Option<u32>,
    #[serde(default)]
    pub preview_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ArtistRef {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AlbumRef {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: String,
}
