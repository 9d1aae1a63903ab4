use std::fmt;

use deck_core::Track;

/// Read-only snapshot of a session for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView<'a> {
    pub heading: Heading<'a>,
    pub tracks: &'a [Track],
    /// Only while search results are shown.
    pub pagination: Option<PaginationView>,
    /// Only while a track is selected.
    pub player: Option<PlayerBar<'a>>,
    pub loading: bool,
    /// Text in the search box, which may differ from the searched keyword.
    pub keyword: &'a str,
    pub error: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heading<'a> {
    Popular,
    SearchResults { keyword: &'a str },
}

impl fmt::Display for Heading<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Heading::Popular => f.write_str("Popular tracks"),
            Heading::SearchResults { keyword } if keyword.is_empty() => {
                f.write_str("All tracks")
            }
            Heading::SearchResults { keyword } => write!(f, "Results for \"{keyword}\""),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationView {
    pub page: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerBar<'a> {
    pub track: &'a Track,
    pub is_playing: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_text() {
        assert_eq!(Heading::Popular.to_string(), "Popular tracks");
        assert_eq!(
            Heading::SearchResults { keyword: "jazz" }.to_string(),
            "Results for \"jazz\""
        );
        assert_eq!(Heading::SearchResults { keyword: "" }.to_string(), "All tracks");
    }
}
