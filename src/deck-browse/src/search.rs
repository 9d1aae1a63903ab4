use deck_core::{CatalogError, CatalogResult, PageRequest, RequestedPage, TrackPage};
use thiserror::Error;

/// Why a fetch was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchIntent {
    NewSearch,
    NextPage,
    PrevPage,
}

/// A search fetch that has been issued but not yet applied.
///
/// Nothing about the controller changes until the ticket comes back through
/// [`SearchController::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub seq: u64,
    pub intent: FetchIntent,
    pub keyword: String,
    pub request: PageRequest,
    /// Page number committed if the fetch succeeds.
    pub target_page: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A newer request was issued (or the search was cleared); nothing changed.
    Stale,
    Committed {
        page: u32,
        has_next: bool,
        has_prev: bool,
    },
    Failed(CatalogError),
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("there is no next page")]
    NoNextPage,
    #[error("there is no previous page")]
    NoPreviousPage,
}

/// Keyword, page number and the active result page.
///
/// Results being absent means "showing popular tracks"; an empty page means
/// the search matched nothing. The cursor flags come straight from the last
/// successful page and gate navigation.
#[derive(Debug, Clone)]
pub struct SearchController {
    page_size: u32,
    pending_keyword: String,
    keyword: String,
    page: u32,
    results: Option<TrackPage>,
    loading: bool,
    last_error: Option<CatalogError>,
    latest_seq: u64,
}

impl SearchController {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            pending_keyword: String::new(),
            keyword: String::new(),
            page: 1,
            results: None,
            loading: false,
            last_error: None,
            latest_seq: 0,
        }
    }

    /// Text typed so far; not yet searched.
    pub fn pending_keyword(&self) -> &str {
        &self.pending_keyword
    }

    /// Keyword behind the displayed results.
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn results(&self) -> Option<&TrackPage> {
        self.results.as_ref()
    }

    pub fn has_next(&self) -> bool {
        self.results.as_ref().is_some_and(|p| p.has_next())
    }

    pub fn has_prev(&self) -> bool {
        self.results.as_ref().is_some_and(|p| p.has_prev())
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&CatalogError> {
        self.last_error.as_ref()
    }

    pub fn is_latest(&self, ticket: &FetchTicket) -> bool {
        ticket.seq == self.latest_seq
    }

    pub fn set_keyword(&mut self, text: impl Into<String>) {
        self.pending_keyword = text.into();
    }

    /// Issue a search for the pending keyword.
    ///
    /// The offset is `(page - 1) * page_size` for a positive page and 0
    /// otherwise; on success the committed page is the requested one, or 1
    /// for an invalid request.
    pub fn search(&mut self, requested: RequestedPage) -> FetchTicket {
        let keyword = self.pending_keyword.clone();
        let request = requested.page_request(self.page_size);
        self.issue(FetchIntent::NewSearch, keyword, request, requested.number())
    }

    pub fn next_page(&mut self) -> Result<FetchTicket, NavigationError> {
        if !self.has_next() {
            return Err(NavigationError::NoNextPage);
        }
        Ok(self.navigate(FetchIntent::NextPage, self.page.saturating_add(1)))
    }

    pub fn prev_page(&mut self) -> Result<FetchTicket, NavigationError> {
        if !self.has_prev() {
            return Err(NavigationError::NoPreviousPage);
        }
        Ok(self.navigate(FetchIntent::PrevPage, self.page.saturating_sub(1).max(1)))
    }

    /// Commit the result of a fetch. Only the most recently issued ticket is
    /// honoured; a failure keeps the previous page, results and flags.
    pub fn apply(
        &mut self,
        ticket: &FetchTicket,
        result: CatalogResult<TrackPage>,
    ) -> FetchOutcome {
        if !self.is_latest(ticket) {
            tracing::debug!(
                seq = ticket.seq,
                latest = self.latest_seq,
                "discarding stale search result"
            );
            return FetchOutcome::Stale;
        }
        self.loading = false;

        match result {
            Ok(page) => {
                let has_next = page.has_next();
                let has_prev = page.has_prev();
                tracing::debug!(
                    keyword = %ticket.keyword,
                    page = ticket.target_page,
                    items = page.len(),
                    has_next,
                    has_prev,
                    "search page committed"
                );
                self.keyword = ticket.keyword.clone();
                self.page = ticket.target_page;
                self.results = Some(page);
                self.last_error = None;
                FetchOutcome::Committed {
                    page: self.page,
                    has_next,
                    has_prev,
                }
            }
            Err(error) => {
                tracing::warn!(keyword = %ticket.keyword, error = %error, "search failed");
                self.last_error = Some(error.clone());
                FetchOutcome::Failed(error)
            }
        }
    }

    /// Drop the results and go back to the popular list. Fetches still in
    /// flight become stale.
    pub fn clear(&mut self) {
        self.latest_seq += 1;
        self.keyword.clear();
        self.pending_keyword.clear();
        self.page = 1;
        self.results = None;
        self.loading = false;
        self.last_error = None;
        tracing::debug!("search cleared");
    }

    fn navigate(&mut self, intent: FetchIntent, target_page: u32) -> FetchTicket {
        let keyword = self.keyword.clone();
        let request = PageRequest::for_page(target_page, self.page_size);
        self.issue(intent, keyword, request, target_page)
    }

    fn issue(
        &mut self,
        intent: FetchIntent,
        keyword: String,
        request: PageRequest,
        target_page: u32,
    ) -> FetchTicket {
        self.latest_seq += 1;
        self.loading = true;
        tracing::debug!(
            seq = self.latest_seq,
            ?intent,
            keyword = %keyword,
            offset = request.offset,
            limit = request.limit,
            "search issued"
        );
        FetchTicket {
            seq: self.latest_seq,
            intent,
            keyword,
            request,
            target_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use deck_core::{PageCursor, Track, TrackId};

    use super::*;

    fn track(id: &str) -> Track {
        Track {
            id: TrackId::new(id),
            catalog_id: "test".into(),
            title: id.to_string(),
            artists: Vec::new(),
            album: None,
            duration_ms: None,
            preview_url: None,
        }
    }

    fn page(ids: &[&str], next: bool, prev: bool) -> TrackPage {
        TrackPage {
            items: ids.iter().map(|id| track(id)).collect(),
            next: next.then(|| PageCursor::new("next")),
            previous: prev.then(|| PageCursor::new("prev")),
        }
    }

    fn network() -> CatalogError {
        CatalogError::Network {
            message: "connection reset".into(),
        }
    }

    fn on_first_page() -> SearchController {
        let mut search = SearchController::new(20);
        search.set_keyword("jazz");
        let ticket = search.search(RequestedPage::first());
        search.apply(&ticket, Ok(page(&["a", "b"], true, false)));
        search
    }

    #[test]
    fn keyword_search_starts_at_offset_zero() {
        let mut search = SearchController::new(20);
        search.set_keyword("jazz");
        let ticket = search.search(RequestedPage::first());

        assert_eq!(ticket.keyword, "jazz");
        assert_eq!(ticket.request, PageRequest::new(0, 20));
        assert!(search.is_loading());

        let outcome = search.apply(&ticket, Ok(page(&["a"], true, false)));
        assert_eq!(
            outcome,
            FetchOutcome::Committed {
                page: 1,
                has_next: true,
                has_prev: false
            }
        );
        assert_eq!(search.page(), 1);
        assert!(search.has_next());
        assert!(!search.has_prev());
        assert!(!search.is_loading());
    }

    #[test]
    fn set_keyword_alone_changes_nothing_visible() {
        let mut search = on_first_page();
        search.set_keyword("blues");
        assert_eq!(search.keyword(), "jazz");
        assert_eq!(search.pending_keyword(), "blues");
        assert!(!search.is_loading());
    }

    #[test]
    fn invalid_requested_pages_use_offset_zero() {
        let mut search = SearchController::new(20);
        for requested in [
            RequestedPage::from(0i64),
            RequestedPage::from(-1i64),
            RequestedPage::parse("two"),
        ] {
            let ticket = search.search(requested);
            assert_eq!(ticket.request.offset, 0);
            assert_eq!(ticket.target_page, 1);
        }
        let ticket = search.search(RequestedPage::from(3u32));
        assert_eq!(ticket.request.offset, 40);
        assert_eq!(ticket.target_page, 3);
    }

    #[test]
    fn next_page_commits_only_after_success() {
        let mut search = on_first_page();
        let ticket = search.next_page().unwrap();
        assert_eq!(ticket.request, PageRequest::new(20, 20));
        assert_eq!(ticket.keyword, "jazz");
        assert_eq!(search.page(), 1);

        search.apply(&ticket, Ok(page(&["c"], false, true)));
        assert_eq!(search.page(), 2);
        assert!(!search.has_next());
        assert!(search.has_prev());
    }

    #[test]
    fn failed_next_page_keeps_everything() {
        let mut search = on_first_page();
        let before = search.results().cloned();
        let ticket = search.next_page().unwrap();

        let outcome = search.apply(&ticket, Err(network()));
        assert_eq!(outcome, FetchOutcome::Failed(network()));
        assert_eq!(search.page(), 1);
        assert_eq!(search.results().cloned(), before);
        assert!(search.has_next());
        assert!(!search.is_loading());
        assert_eq!(search.last_error(), Some(&network()));
    }

    #[test]
    fn navigation_is_gated_by_cursors() {
        let mut search = SearchController::new(20);
        assert_eq!(search.next_page(), Err(NavigationError::NoNextPage));

        let mut search = on_first_page();
        assert_eq!(search.prev_page(), Err(NavigationError::NoPreviousPage));
        assert!(!search.is_loading());
    }

    #[test]
    fn prev_page_goes_back_one() {
        let mut search = on_first_page();
        let next = search.next_page().unwrap();
        search.apply(&next, Ok(page(&["c"], true, true)));

        let prev = search.prev_page().unwrap();
        assert_eq!(prev.request.offset, 0);
        search.apply(&prev, Ok(page(&["a", "b"], true, false)));
        assert_eq!(search.page(), 1);
    }

    #[test]
    fn new_search_resets_page() {
        let mut search = on_first_page();
        let next = search.next_page().unwrap();
        search.apply(&next, Ok(page(&["c"], true, true)));
        assert_eq!(search.page(), 2);

        search.set_keyword("blues");
        let ticket = search.search(RequestedPage::first());
        search.apply(&ticket, Ok(page(&["x"], false, false)));
        assert_eq!(search.page(), 1);
        assert_eq!(search.keyword(), "blues");
    }

    #[test]
    fn cursor_flags_follow_response_not_item_count() {
        let mut search = SearchController::new(2);
        let ticket = search.search(RequestedPage::first());
        search.apply(&ticket, Ok(page(&[], true, true)));
        assert!(search.has_next());
        assert!(search.has_prev());

        let ticket = search.search(RequestedPage::first());
        search.apply(&ticket, Ok(page(&["a", "b"], false, false)));
        assert!(!search.has_next());
        assert!(!search.has_prev());
    }

    #[test]
    fn empty_result_is_distinct_from_no_search() {
        let mut search = SearchController::new(20);
        assert!(search.results().is_none());

        let ticket = search.search(RequestedPage::first());
        search.apply(&ticket, Ok(TrackPage::empty()));
        assert!(search.results().is_some_and(|p| p.is_empty()));
    }

    #[test]
    fn later_issued_search_wins_regardless_of_arrival() {
        let mut search = SearchController::new(20);
        search.set_keyword("first");
        let first = search.search(RequestedPage::first());
        search.set_keyword("second");
        let second = search.search(RequestedPage::first());

        search.apply(&second, Ok(page(&["s"], false, false)));
        assert_eq!(
            search.apply(&first, Ok(page(&["f"], true, false))),
            FetchOutcome::Stale
        );
        assert_eq!(search.keyword(), "second");
        assert_eq!(search.results().map(|p| p.items[0].id.as_ref()), Some("s"));
        assert!(!search.has_next());
    }

    #[test]
    fn stale_failure_does_not_clear_loading() {
        let mut search = SearchController::new(20);
        let first = search.search(RequestedPage::first());
        let _second = search.search(RequestedPage::first());

        assert_eq!(search.apply(&first, Err(network())), FetchOutcome::Stale);
        assert!(search.is_loading());
        assert!(search.last_error().is_none());
    }

    #[test]
    fn clear_returns_to_no_search() {
        let mut search = on_first_page();
        let in_flight = search.next_page().unwrap();
        search.clear();

        assert!(search.results().is_none());
        assert_eq!(search.page(), 1);
        assert!(!search.has_next());
        assert!(!search.is_loading());
        assert_eq!(
            search.apply(&in_flight, Ok(page(&["late"], false, true))),
            FetchOutcome::Stale
        );
        assert!(search.results().is_none());
    }

    #[test]
    fn empty_keyword_is_searched_as_is() {
        let mut search = SearchController::new(20);
        search.set_keyword("");
        let ticket = search.search(RequestedPage::first());
        assert_eq!(ticket.keyword, "");
    }

    #[tokio::test]
    async fn paging_through_memory_catalog() {
        use deck_core::{Catalog, MemoryCatalog};

        let catalog = MemoryCatalog::sample();
        let mut search = SearchController::new(4);
        search.set_keyword("");

        let ticket = search.search(RequestedPage::first());
        let result = catalog.search_tracks(&ticket.keyword, ticket.request).await;
        search.apply(&ticket, result);
        assert!(search.has_next());

        let ticket = search.next_page().unwrap();
        let result = catalog.search_tracks(&ticket.keyword, ticket.request).await;
        search.apply(&ticket, result);
        assert_eq!(search.page(), 2);
        assert!(search.has_prev());
    }
}
