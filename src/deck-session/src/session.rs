use std::{sync::Arc, time::Duration};

use deck_audio::AudioOutput;
use deck_browse::{FetchTicket, PopularTicket, PopularTracks, SearchController};
use deck_core::{
    Catalog, CatalogError, CatalogResult, RequestedPage, SearchConfig, Track, TrackId, TrackPage,
};
use deck_player::PlaybackController;
use tokio::sync::mpsc;

use crate::command::{Command, CommandOutcome, FetchId, FetchReport, Rejection, SessionError};
use crate::view::{Heading, PaginationView, PlayerBar, SessionView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub page_size: u32,
    pub fetch_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

impl From<&SearchConfig> for SessionSettings {
    fn from(config: &SearchConfig) -> Self {
        Self {
            page_size: config.page_size,
            fetch_timeout: config.fetch_timeout(),
        }
    }
}

enum Completion {
    Popular {
        id: FetchId,
        ticket: PopularTicket,
        result: CatalogResult<Vec<Track>>,
    },
    Search {
        id: FetchId,
        ticket: FetchTicket,
        result: CatalogResult<TrackPage>,
    },
}

/// Single owner of all browsing and playback state.
///
/// `dispatch` never blocks: catalog calls are spawned onto the current tokio
/// runtime (so it must be called from within one) and their results are
/// applied by `settle`. The session is `Send`; to share it between tasks
/// wrap it in a `tokio::sync::Mutex`.
pub struct Session<A> {
    catalog: Arc<dyn Catalog>,
    settings: SessionSettings,
    popular: PopularTracks,
    search: SearchController,
    player: PlaybackController<A>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    next_fetch: u64,
    outstanding: usize,
    notice: Option<String>,
}

impl<A: AudioOutput> Session<A> {
    pub fn new(catalog: Arc<dyn Catalog>, output: A, settings: SessionSettings) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            catalog,
            settings,
            popular: PopularTracks::new(),
            search: SearchController::new(settings.page_size),
            player: PlaybackController::new(output),
            completions_tx,
            completions_rx,
            next_fetch: 0,
            outstanding: 0,
            notice: None,
        }
    }

    pub fn popular(&self) -> &PopularTracks {
        &self.popular
    }

    pub fn search(&self) -> &SearchController {
        &self.search
    }

    pub fn player(&self) -> &PlaybackController<A> {
        &self.player
    }

    /// Popular load in flight, or the latest search not yet resolved.
    pub fn is_loading(&self) -> bool {
        self.popular.is_loading() || self.search.is_loading()
    }

    /// Fetches spawned but not yet settled, stale ones included.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Search results when a search is active, popular tracks otherwise.
    pub fn displayed(&self) -> &[Track] {
        match self.search.results() {
            Some(page) => &page.items,
            None => self.popular.tracks(),
        }
    }

    pub fn dispatch(&mut self, command: Command) -> CommandOutcome {
        tracing::debug!(?command, "dispatch");
        self.notice = None;
        let outcome = self.route(command);
        match &outcome {
            CommandOutcome::Rejected(reason) => self.notice = Some(reason.to_string()),
            CommandOutcome::Failed(err) => self.notice = Some(err.to_string()),
            CommandOutcome::Done | CommandOutcome::Pending(_) => {}
        }
        outcome
    }

    /// Wait for the next spawned fetch to finish and apply it. `None` when
    /// nothing is outstanding.
    pub async fn settle(&mut self) -> Option<FetchReport> {
        if self.outstanding == 0 {
            return None;
        }
        // The session keeps its own sender alive, so `recv` only yields `None`
        // if that invariant is broken.
        let completion = self.completions_rx.recv().await?;
        self.outstanding -= 1;
        let report = self.apply(completion);
        if let Some(err) = report.error() {
            self.notice = Some(err.to_string());
        }
        Some(report)
    }

    /// Dispatch and, for fetch commands, settle until that fetch resolved.
    pub async fn execute(&mut self, command: Command) -> CommandOutcome {
        let outcome = self.dispatch(command);
        let CommandOutcome::Pending(id) = outcome else {
            return outcome;
        };
        while let Some(report) = self.settle().await {
            if report.id() == id {
                return report.into_outcome();
            }
        }
        outcome
    }

    pub fn view(&self) -> SessionView<'_> {
        let heading = match self.search.results() {
            Some(_) => Heading::SearchResults {
                keyword: self.search.keyword(),
            },
            None => Heading::Popular,
        };
        let pagination = self.search.results().map(|_| PaginationView {
            page: self.search.page(),
            has_next: self.search.has_next(),
            has_prev: self.search.has_prev(),
        });
        let player = self.player.selected().map(|track| PlayerBar {
            track,
            is_playing: self.player.is_playing(),
        });
        SessionView {
            heading,
            tracks: self.displayed(),
            pagination,
            player,
            loading: self.is_loading(),
            keyword: self.search.pending_keyword(),
            error: self.notice.as_deref(),
        }
    }

    fn route(&mut self, command: Command) -> CommandOutcome {
        match command {
            Command::LoadPopular => self.load_popular(),
            Command::SetKeyword(text) => {
                self.search.set_keyword(text);
                CommandOutcome::Done
            }
            Command::Search(requested) => {
                let ticket = self.search.search(requested);
                self.spawn_search(ticket)
            }
            Command::SubmitSearch => {
                let ticket = self.search.search(RequestedPage::first());
                self.spawn_search(ticket)
            }
            Command::NextPage => match self.search.next_page() {
                Ok(ticket) => self.spawn_search(ticket),
                Err(err) => CommandOutcome::Rejected(err.into()),
            },
            Command::PrevPage => match self.search.prev_page() {
                Ok(ticket) => self.spawn_search(ticket),
                Err(err) => CommandOutcome::Rejected(err.into()),
            },
            Command::ClearSearch => {
                self.search.clear();
                CommandOutcome::Done
            }
            Command::Select(track) => self.select(track),
            Command::SelectDisplayed(id) => match self.find_displayed(&id) {
                Some(track) => self.select(track),
                None => CommandOutcome::Rejected(Rejection::UnknownTrack(id)),
            },
            Command::Toggle => match self.player.toggle() {
                Ok(true) => CommandOutcome::Done,
                Ok(false) => CommandOutcome::Rejected(Rejection::NothingToToggle),
                Err(err) => CommandOutcome::Failed(SessionError::Playback(err)),
            },
        }
    }

    fn select(&mut self, track: Track) -> CommandOutcome {
        match self.player.select_track(track) {
            Ok(()) => CommandOutcome::Done,
            Err(err) => CommandOutcome::Failed(SessionError::Playback(err)),
        }
    }

    fn find_displayed(&self, id: &TrackId) -> Option<Track> {
        self.displayed().iter().find(|t| &t.id == id).cloned()
    }

    fn load_popular(&mut self) -> CommandOutcome {
        let Some(ticket) = self.popular.begin_load() else {
            return if self.popular.is_loaded() {
                CommandOutcome::Done
            } else {
                CommandOutcome::Rejected(Rejection::PopularInFlight)
            };
        };
        let id = self.next_fetch_id();
        let catalog = Arc::clone(&self.catalog);
        let timeout = self.settings.fetch_timeout;
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = bounded(timeout, catalog.popular_tracks()).await;
            let _ = tx.send(Completion::Popular { id, ticket, result });
        });
        CommandOutcome::Pending(id)
    }

    fn spawn_search(&mut self, ticket: FetchTicket) -> CommandOutcome {
        let id = self.next_fetch_id();
        let catalog = Arc::clone(&self.catalog);
        let timeout = self.settings.fetch_timeout;
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = bounded(
                timeout,
                catalog.search_tracks(&ticket.keyword, ticket.request),
            )
            .await;
            let _ = tx.send(Completion::Search { id, ticket, result });
        });
        CommandOutcome::Pending(id)
    }

    fn next_fetch_id(&mut self) -> FetchId {
        self.next_fetch += 1;
        self.outstanding += 1;
        FetchId(self.next_fetch)
    }

    fn apply(&mut self, completion: Completion) -> FetchReport {
        match completion {
            Completion::Popular { id, ticket, result } => FetchReport::Popular {
                id,
                outcome: self.popular.apply(ticket, result),
            },
            Completion::Search { id, ticket, result } => FetchReport::Search {
                id,
                intent: ticket.intent,
                outcome: self.search.apply(&ticket, result),
            },
        }
    }
}

async fn bounded<T>(
    after: Duration,
    fetch: impl std::future::Future<Output = CatalogResult<T>>,
) -> CatalogResult<T> {
    match tokio::time::timeout(after, fetch).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(after_ms = after.as_millis() as u64, "catalog fetch timed out");
            Err(CatalogError::Timeout { after })
        }
    }
}
