use crate::models::{SpotifyTrack, TrackPaging};
use deck_core::{Page, PageCursor, PreviewUrl, Track, TrackId, TrackPage};

/// `None` for entries without an id, which cannot be selected again later.
pub fn map_track(track: &SpotifyTrack, catalog_id: &str) -> Option<Track> {
    let id = track.id.as_deref().filter(|id| !id.is_empty())?;
    Some(Track {
        id: TrackId::new(id),
        catalog_id: catalog_id.to_string(),
        title: track.name.clone(),
        artists: track.artists.iter().map(|a| a.name.clone()).collect(),
        album: track.album.as_ref().map(|a| a.name.clone()),
        duration_ms: track.duration_ms,
        preview_url: track
            .preview_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .map(PreviewUrl::new),
    })
}

pub fn map_page(paging: TrackPaging, catalog_id: &str) -> TrackPage {
    Page {
        items: paging
            .items
            .iter()
            .filter_map(|track| map_track(track, catalog_id))
            .collect(),
        next: paging.next.map(PageCursor::new),
        previous: paging.previous.map(PageCursor::new),
    }
}
