use deck_core::{CatalogError, CatalogResult, Track};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopularTicket {
    seq: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopularOutcome {
    Stale,
    Loaded(usize),
    Failed(CatalogError),
}

/// The default list shown while no search is active.
///
/// Loaded once; after a successful load it never changes. A failed load can
/// be started again.
#[derive(Debug, Clone, Default)]
pub struct PopularTracks {
    tracks: Option<Vec<Track>>,
    in_flight: Option<u64>,
    issued: u64,
    last_error: Option<CatalogError>,
}

impl PopularTracks {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` when the list is already loaded or a load is running.
    pub fn begin_load(&mut self) -> Option<PopularTicket> {
        if self.tracks.is_some() || self.in_flight.is_some() {
            return None;
        }
        self.issued += 1;
        self.in_flight = Some(self.issued);
        tracing::debug!(seq = self.issued, "popular tracks load issued");
        Some(PopularTicket { seq: self.issued })
    }

    pub fn apply(
        &mut self,
        ticket: PopularTicket,
        result: CatalogResult<Vec<Track>>,
    ) -> PopularOutcome {
        if self.in_flight != Some(ticket.seq) {
            return PopularOutcome::Stale;
        }
        self.in_flight = None;
        match result {
            Ok(tracks) => {
                tracing::info!(count = tracks.len(), "popular tracks loaded");
                let count = tracks.len();
                self.tracks = Some(tracks);
                self.last_error = None;
                PopularOutcome::Loaded(count)
            }
            Err(error) => {
                tracing::warn!(error = %error, "popular tracks load failed");
                self.last_error = Some(error.clone());
                PopularOutcome::Failed(error)
            }
        }
    }

    /// Empty until loaded.
    pub fn tracks(&self) -> &[Track] {
        self.tracks.as_deref().unwrap_or_default()
    }

    pub fn is_loaded(&self) -> bool {
        self.tracks.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn last_error(&self) -> Option<&CatalogError> {
        self.last_error.as_ref()
    }
}
