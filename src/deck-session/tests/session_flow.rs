use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use deck_audio::{AudioError, AudioOutput, AudioResult, NullAudioOutput, OutputCall};
use deck_browse::{FetchIntent, FetchOutcome};
use deck_core::{
    Catalog, CatalogError, CatalogResult, PageCursor, PageRequest, PreviewUrl, RequestedPage,
    Track, TrackId, TrackPage,
};
use deck_session::{
    Command, CommandOutcome, FetchReport, Heading, PaginationView, Rejection, Session,
    SessionError, SessionSettings,
};
use tokio::sync::oneshot;

enum Reply {
    Page(TrackPage),
    Fail(CatalogError),
    Hang,
    Gate(oneshot::Receiver<CatalogResult<TrackPage>>),
}

/// Catalog that answers each (keyword, offset) with scripted replies and
/// records every search it receives.
#[derive(Default)]
struct ScriptedCatalog {
    popular: Vec<Track>,
    script: Mutex<HashMap<(String, u32), VecDeque<Reply>>>,
    requests: Mutex<Vec<(String, PageRequest)>>,
}

impl ScriptedCatalog {
    fn with_popular(popular: Vec<Track>) -> Self {
        Self {
            popular,
            ..Default::default()
        }
    }

    fn on(&self, keyword: &str, offset: u32, reply: Reply) {
        self.script
            .lock()
            .unwrap()
            .entry((keyword.to_string(), offset))
            .or_default()
            .push_back(reply);
    }

    fn gate(&self, keyword: &str, offset: u32) -> oneshot::Sender<CatalogResult<TrackPage>> {
        let (tx, rx) = oneshot::channel();
        self.on(keyword, offset, Reply::Gate(rx));
        tx
    }

    fn requests(&self) -> Vec<(String, PageRequest)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Catalog for ScriptedCatalog {
    fn id(&self) -> &str {
        "scripted"
    }

    async fn popular_tracks(&self) -> CatalogResult<Vec<Track>> {
        Ok(self.popular.clone())
    }

    async fn search_tracks(&self, keyword: &str, paging: PageRequest) -> CatalogResult<TrackPage> {
        self.requests
            .lock()
            .unwrap()
            .push((keyword.to_string(), paging));
        let reply = self
            .script
            .lock()
            .unwrap()
            .get_mut(&(keyword.to_string(), paging.offset))
            .and_then(|queue| queue.pop_front());
        match reply {
            Some(Reply::Page(page)) => Ok(page),
            Some(Reply::Fail(err)) => Err(err),
            Some(Reply::Hang) => std::future::pending().await,
            Some(Reply::Gate(rx)) => rx.await.unwrap_or_else(|_| {
                Err(CatalogError::Other {
                    message: "gate dropped".into(),
                })
            }),
            None => Err(CatalogError::Other {
                message: format!("unscripted search {keyword}@{}", paging.offset),
            }),
        }
    }
}

/// Output whose `play` always fails.
struct BrokenSpeaker;

impl AudioOutput for BrokenSpeaker {
    fn set_source(&mut self, _url: &PreviewUrl) -> AudioResult<()> {
        Ok(())
    }

    fn play(&mut self) -> AudioResult<()> {
        Err(AudioError::Backend("no device".into()))
    }

    fn pause(&mut self) -> AudioResult<()> {
        Ok(())
    }
}

fn track(id: &str, preview: Option<&str>) -> Track {
    Track {
        id: TrackId::new(id),
        catalog_id: "scripted".into(),
        title: format!("Title {id}"),
        artists: vec!["Someone".into()],
        album: None,
        duration_ms: Some(30_000),
        preview_url: preview.map(PreviewUrl::new),
    }
}

fn page(ids: &[&str], next: bool, prev: bool) -> TrackPage {
    TrackPage {
        items: ids
            .iter()
            .map(|id| track(id, Some("https://cdn.test/clip.mp3")))
            .collect(),
        next: next.then(|| PageCursor::new("https://api.test/next")),
        previous: prev.then(|| PageCursor::new("https://api.test/prev")),
    }
}

fn settings(timeout: Duration) -> SessionSettings {
    SessionSettings {
        page_size: 20,
        fetch_timeout: timeout,
    }
}

fn session_with(catalog: Arc<ScriptedCatalog>) -> Session<NullAudioOutput> {
    Session::new(catalog, NullAudioOutput::new(), settings(Duration::from_secs(5)))
}

/// Searched "jazz" and landed on page 1 with more pages available.
async fn on_jazz_page_one() -> (Arc<ScriptedCatalog>, Session<NullAudioOutput>) {
    let catalog = Arc::new(ScriptedCatalog::with_popular(vec![track("pop", None)]));
    catalog.on("jazz", 0, Reply::Page(page(&["j1", "j2"], true, false)));
    let mut session = session_with(Arc::clone(&catalog));
    session.dispatch(Command::SetKeyword("jazz".into()));
    assert_eq!(session.execute(Command::SubmitSearch).await, CommandOutcome::Done);
    (catalog, session)
}

#[tokio::test]
async fn first_page_of_a_keyword_search() {
    let (catalog, session) = on_jazz_page_one().await;

    assert_eq!(catalog.requests(), vec![("jazz".into(), PageRequest::new(0, 20))]);
    let view = session.view();
    assert_eq!(view.heading, Heading::SearchResults { keyword: "jazz" });
    assert_eq!(
        view.pagination,
        Some(PaginationView {
            page: 1,
            has_next: true,
            has_prev: false
        })
    );
    assert_eq!(view.tracks.len(), 2);
    assert!(!view.loading);
}

#[tokio::test]
async fn next_page_sends_offset_and_commits_page() {
    let (catalog, mut session) = on_jazz_page_one().await;
    catalog.on("jazz", 20, Reply::Page(page(&["j3"], false, true)));

    let outcome = session.dispatch(Command::NextPage);
    assert!(matches!(outcome, CommandOutcome::Pending(_)));
    assert!(session.view().loading);
    assert_eq!(session.view().pagination.map(|p| p.page), Some(1));

    let report = session.settle().await.unwrap();
    assert!(matches!(
        report,
        FetchReport::Search {
            intent: FetchIntent::NextPage,
            outcome: FetchOutcome::Committed { page: 2, .. },
            ..
        }
    ));
    assert_eq!(catalog.requests()[1], ("jazz".into(), PageRequest::new(20, 20)));
    let view = session.view();
    assert_eq!(
        view.pagination,
        Some(PaginationView {
            page: 2,
            has_next: false,
            has_prev: true
        })
    );
    assert_eq!(view.tracks[0].id.as_ref(), "j3");
}

#[tokio::test]
async fn failed_next_page_leaves_state_untouched() {
    let (catalog, mut session) = on_jazz_page_one().await;
    let unavailable = CatalogError::Network {
        message: "unreachable".into(),
    };
    catalog.on("jazz", 20, Reply::Fail(unavailable.clone()));
    let before: Vec<TrackId> = session.view().tracks.iter().map(|t| t.id.clone()).collect();

    let outcome = session.execute(Command::NextPage).await;
    assert_eq!(
        outcome,
        CommandOutcome::Failed(SessionError::Catalog(unavailable.clone()))
    );

    let view = session.view();
    let after: Vec<TrackId> = view.tracks.iter().map(|t| t.id.clone()).collect();
    assert_eq!(after, before);
    assert_eq!(view.pagination.map(|p| p.page), Some(1));
    assert_eq!(view.pagination.map(|p| p.has_next), Some(true));
    assert!(!view.loading);
    assert_eq!(view.error, Some("network error: unreachable"));
}

#[tokio::test]
async fn silent_selection_stops_current_preview() {
    let catalog = Arc::new(ScriptedCatalog::default());
    let mut session = session_with(catalog);
    session.dispatch(Command::Select(track("loud", Some("https://cdn.test/loud.mp3"))));
    assert!(session.player().is_playing());

    let outcome = session.dispatch(Command::Select(track("quiet", None)));
    assert_eq!(outcome, CommandOutcome::Done);

    let view = session.view();
    let bar = view.player.unwrap();
    assert_eq!(bar.track.id.as_ref(), "quiet");
    assert!(!bar.is_playing);
    assert!(!session.player().output().is_playing());
    assert_eq!(session.player().output().calls().last(), Some(&OutputCall::Pause));
}

#[tokio::test]
async fn selecting_a_preview_loads_and_plays_it() {
    let catalog = Arc::new(ScriptedCatalog::default());
    let mut session = session_with(catalog);
    session.dispatch(Command::Select(track("p", Some("https://cdn.test/p.mp3"))));

    let output = session.player().output();
    assert_eq!(output.source().map(|u| u.as_ref()), Some("https://cdn.test/p.mp3"));
    assert!(output.is_playing());
    assert!(session.view().player.is_some_and(|bar| bar.is_playing));
}

#[tokio::test]
async fn toggle_pairs_return_to_playing() {
    let catalog = Arc::new(ScriptedCatalog::default());
    let mut session = session_with(catalog);
    assert_eq!(
        session.dispatch(Command::Toggle),
        CommandOutcome::Rejected(Rejection::NothingToToggle)
    );

    session.dispatch(Command::Select(track("p", Some("https://cdn.test/p.mp3"))));
    session.dispatch(Command::Toggle);
    assert!(!session.player().is_playing());
    session.dispatch(Command::Toggle);
    assert!(session.player().is_playing());
}

#[tokio::test]
async fn garbage_page_numbers_search_from_offset_zero() {
    let catalog = Arc::new(ScriptedCatalog::default());
    catalog.on("x", 0, Reply::Page(page(&["a"], false, false)));
    catalog.on("x", 0, Reply::Page(page(&["a"], false, false)));
    catalog.on("x", 40, Reply::Page(page(&["c"], true, true)));
    let mut session = session_with(Arc::clone(&catalog));
    session.dispatch(Command::SetKeyword("x".into()));

    session.execute(Command::Search(RequestedPage::parse("abc"))).await;
    assert_eq!(session.view().pagination.map(|p| p.page), Some(1));
    session.execute(Command::Search(RequestedPage::from(-2i64))).await;
    session.execute(Command::Search(RequestedPage::parse("3"))).await;

    let offsets: Vec<u32> = catalog.requests().iter().map(|(_, p)| p.offset).collect();
    assert_eq!(offsets, vec![0, 0, 40]);
    assert_eq!(session.view().pagination.map(|p| p.page), Some(3));
}

#[tokio::test]
async fn navigation_without_cursor_is_rejected_without_fetch() {
    let (catalog, mut session) = on_jazz_page_one().await;
    let outcome = session.dispatch(Command::PrevPage);
    assert!(matches!(outcome, CommandOutcome::Rejected(Rejection::Navigation(_))));
    assert_eq!(catalog.requests().len(), 1);
    assert_eq!(session.outstanding(), 0);
}

#[tokio::test]
async fn later_search_wins_when_earlier_resolves_last() {
    let catalog = Arc::new(ScriptedCatalog::default());
    let release_first = catalog.gate("first", 0);
    let release_second = catalog.gate("second", 0);
    let mut session = session_with(Arc::clone(&catalog));

    session.dispatch(Command::SetKeyword("first".into()));
    session.dispatch(Command::SubmitSearch);
    session.dispatch(Command::SetKeyword("second".into()));
    session.dispatch(Command::SubmitSearch);

    release_second.send(Ok(page(&["s"], false, false))).unwrap();
    let report = session.settle().await.unwrap();
    assert!(!report.is_stale());
    assert!(!session.view().loading);

    release_first.send(Ok(page(&["f"], true, false))).unwrap();
    let report = session.settle().await.unwrap();
    assert!(report.is_stale());

    let view = session.view();
    assert_eq!(view.heading, Heading::SearchResults { keyword: "second" });
    assert_eq!(view.tracks[0].id.as_ref(), "s");
    assert_eq!(view.pagination.map(|p| p.has_next), Some(false));
}

#[tokio::test]
async fn later_search_wins_when_earlier_resolves_first() {
    let catalog = Arc::new(ScriptedCatalog::default());
    let release_first = catalog.gate("first", 0);
    let release_second = catalog.gate("second", 0);
    let mut session = session_with(Arc::clone(&catalog));

    session.dispatch(Command::SetKeyword("first".into()));
    session.dispatch(Command::SubmitSearch);
    session.dispatch(Command::SetKeyword("second".into()));
    session.dispatch(Command::SubmitSearch);

    release_first.send(Ok(page(&["f"], true, false))).unwrap();
    assert!(session.settle().await.unwrap().is_stale());
    assert!(session.view().loading);
    assert!(session.view().pagination.is_none());

    release_second.send(Ok(page(&["s"], false, false))).unwrap();
    assert!(!session.settle().await.unwrap().is_stale());
    assert_eq!(session.view().tracks[0].id.as_ref(), "s");
}

#[tokio::test]
async fn hanging_fetch_times_out() {
    let catalog = Arc::new(ScriptedCatalog::default());
    catalog.on("jazz", 0, Reply::Page(page(&["j1"], true, false)));
    catalog.on("jazz", 20, Reply::Hang);
    let mut session = Session::new(
        Arc::clone(&catalog) as Arc<dyn Catalog>,
        NullAudioOutput::new(),
        settings(Duration::from_millis(50)),
    );
    session.dispatch(Command::SetKeyword("jazz".into()));
    session.execute(Command::SubmitSearch).await;

    let outcome = session.execute(Command::NextPage).await;
    assert_eq!(
        outcome,
        CommandOutcome::Failed(SessionError::Catalog(CatalogError::Timeout {
            after: Duration::from_millis(50)
        }))
    );
    let view = session.view();
    assert!(!view.loading);
    assert_eq!(view.pagination.map(|p| p.page), Some(1));
    assert_eq!(view.tracks[0].id.as_ref(), "j1");
}

#[tokio::test]
async fn clearing_returns_to_popular_tracks() {
    let (_catalog, mut session) = on_jazz_page_one().await;
    session.execute(Command::LoadPopular).await;
    assert_eq!(session.view().tracks[0].id.as_ref(), "j1");

    assert_eq!(session.dispatch(Command::ClearSearch), CommandOutcome::Done);
    let view = session.view();
    assert_eq!(view.heading, Heading::Popular);
    assert!(view.pagination.is_none());
    assert_eq!(view.tracks[0].id.as_ref(), "pop");
    assert_eq!(view.keyword, "");
}

#[tokio::test]
async fn clearing_invalidates_in_flight_search() {
    let catalog = Arc::new(ScriptedCatalog::default());
    let release = catalog.gate("late", 0);
    let mut session = session_with(Arc::clone(&catalog));
    session.dispatch(Command::SetKeyword("late".into()));
    session.dispatch(Command::SubmitSearch);
    session.dispatch(Command::ClearSearch);
    assert!(!session.view().loading);

    release.send(Ok(page(&["x"], false, false))).unwrap();
    assert!(session.settle().await.unwrap().is_stale());
    assert!(session.view().pagination.is_none());
}

#[tokio::test]
async fn empty_keyword_is_passed_through() {
    let catalog = Arc::new(ScriptedCatalog::default());
    catalog.on("", 0, Reply::Page(TrackPage::empty()));
    let mut session = session_with(Arc::clone(&catalog));

    assert_eq!(session.execute(Command::SubmitSearch).await, CommandOutcome::Done);
    assert_eq!(catalog.requests()[0].0, "");
    let view = session.view();
    assert!(view.tracks.is_empty());
    assert_eq!(
        view.pagination,
        Some(PaginationView {
            page: 1,
            has_next: false,
            has_prev: false
        })
    );
}

#[tokio::test]
async fn popular_loading_shows_in_view() {
    let catalog = Arc::new(ScriptedCatalog::with_popular(vec![
        track("a", None),
        track("b", Some("https://cdn.test/b.mp3")),
    ]));
    let mut session = session_with(catalog);
    assert_eq!(session.view().heading, Heading::Popular);
    assert!(session.view().tracks.is_empty());

    session.dispatch(Command::LoadPopular);
    assert!(session.view().loading);
    session.settle().await.unwrap();
    assert!(!session.view().loading);
    assert_eq!(session.view().tracks.len(), 2);

    let outcome = session.dispatch(Command::SelectDisplayed(TrackId::new("b")));
    assert_eq!(outcome, CommandOutcome::Done);
    assert!(session.player().is_playing());
    assert_eq!(
        session.dispatch(Command::SelectDisplayed(TrackId::new("zzz"))),
        CommandOutcome::Rejected(Rejection::UnknownTrack(TrackId::new("zzz")))
    );
}

#[tokio::test]
async fn playback_failure_is_reported_and_recoverable() {
    let catalog: Arc<dyn Catalog> = Arc::new(ScriptedCatalog::default());
    let mut session = Session::new(catalog, BrokenSpeaker, settings(Duration::from_secs(1)));

    let outcome = session.dispatch(Command::Select(track("p", Some("https://cdn.test/p.mp3"))));
    assert!(matches!(outcome, CommandOutcome::Failed(SessionError::Playback(_))));
    let view = session.view();
    assert!(view.player.is_some_and(|bar| !bar.is_playing));
    assert!(view.error.is_some());

    let outcome = session.dispatch(Command::Select(track("q", None)));
    assert_eq!(outcome, CommandOutcome::Done);
    assert!(session.view().error.is_none());
}
