//! In-memory catalog used by tests, the contract suite and offline mode.

use crate::catalog::{Catalog, CatalogResult};
use crate::models::{Page, PageCursor, PageRequest, PreviewUrl, Track, TrackId, TrackPage};

#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    id: String,
    popular: Vec<Track>,
    library: Vec<Track>,
}

impl MemoryCatalog {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            popular: Vec::new(),
            library: Vec::new(),
        }
    }

    pub fn with_popular(mut self, tracks: Vec<Track>) -> Self {
        self.popular = tracks;
        self
    }

    pub fn with_library(mut self, tracks: Vec<Track>) -> Self {
        self.library = tracks;
        self
    }

    /// A small fixed catalog, enough to page through a few searches.
    pub fn sample() -> Self {
        let catalog_id = "memory";
        let entries: &[(&str, &str, &str, bool)] = &[
            ("so-what", "So What", "Miles Davis", true),
            ("take-five", "Take Five", "The Dave Brubeck Quartet", true),
            ("blue-in-green", "Blue in Green", "Miles Davis", false),
            ("naima", "Naima", "John Coltrane", true),
            ("round-midnight", "'Round Midnight", "Thelonious Monk", true),
            ("strange-fruit", "Strange Fruit", "Billie Holiday", false),
            ("cantaloupe-island", "Cantaloupe Island", "Herbie Hancock", true),
            ("moanin", "Moanin'", "Art Blakey", true),
            ("song-for-my-father", "Song for My Father", "Horace Silver", true),
            ("footprints", "Footprints", "Wayne Shorter", false),
            ("giant-steps", "Giant Steps", "John Coltrane", true),
            ("watermelon-man", "Watermelon Man", "Herbie Hancock", true),
        ];
        let library: Vec<Track> = entries
            .iter()
            .map(|(id, title, artist, preview)| Track {
                id: TrackId::new(*id),
                catalog_id: catalog_id.into(),
                title: (*title).into(),
                artists: vec![(*artist).into()],
                album: Some("Jazz Standards".into()),
                duration_ms: Some(30_000),
                preview_url: preview
                    .then(|| PreviewUrl::new(format!("https://previews.invalid/{id}.mp3"))),
            })
            .collect();
        let popular = library.iter().take(5).cloned().collect();
        Self::new(catalog_id)
            .with_popular(popular)
            .with_library(library)
    }

    fn matches(track: &Track, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        track.title.to_lowercase().contains(needle)
            || track
                .artists
                .iter()
                .any(|artist| artist.to_lowercase().contains(needle))
            || track
                .album
                .as_ref()
                .is_some_and(|album| album.to_lowercase().contains(needle))
    }

    fn cursor(keyword: &str, offset: u32, limit: u32) -> PageCursor {
        PageCursor::new(format!("memory:{keyword}?offset={offset}&limit={limit}"))
    }
}

#[async_trait::async_trait]
impl Catalog for MemoryCatalog {
    fn id(&self) -> &str {
        &self.id
    }

    async fn popular_tracks(&self) -> CatalogResult<Vec<Track>> {
        Ok(self.popular.clone())
    }

    async fn search_tracks(
        &self,
        keyword: &str,
        paging: PageRequest,
    ) -> CatalogResult<TrackPage> {
        let needle = keyword.trim().to_lowercase();
        let matched: Vec<&Track> = self
            .library
            .iter()
            .filter(|track| Self::matches(track, &needle))
            .collect();
        let total = matched.len() as u32;
        let limit = paging.limit.max(1);
        let items: Vec<Track> = matched
            .into_iter()
            .skip(paging.offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();

        let end = paging.offset.saturating_add(limit);
        let next = (end < total).then(|| Self::cursor(keyword, end, limit));
        // Past the end there is nothing to step back from.
        let previous = (paging.offset > 0 && !items.is_empty())
            .then(|| Self::cursor(keyword, paging.offset.saturating_sub(limit), limit));

        Ok(Page {
            items,
            next,
            previous,
        })
    }
}
