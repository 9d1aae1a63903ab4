use serde::{Deserialize, Serialize};
use std::fmt;

/// A catalog-scoped track identifier.
///
/// Catalogs MUST treat this as an opaque, case-sensitive identifier that is
/// stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct TrackId(pub String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl AsRef<str> for TrackId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TrackId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for TrackId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Location of a short preview clip. The catalog only hands out the URL;
/// fetching and decoding belong to the audio output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct PreviewUrl(pub String);

impl PreviewUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }
}

impl AsRef<str> for PreviewUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PreviewUrl {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for PreviewUrl {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Track metadata as returned by a catalog. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub catalog_id: String,
    pub title: String,
    pub artists: Vec<String>,
    pub album: Option<String>,
    pub duration_ms: Option<u32>,
    /// Absent for tracks the catalog offers no preview for.
    pub preview_url: Option<PreviewUrl>,
}

impl Track {
    pub fn has_preview(&self) -> bool {
        self.preview_url.is_some()
    }

    pub fn artist_line(&self) -> String {
        self.artists.join(", ")
    }
}

/// Paging request represented as offset/limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub offset: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(offset: u32, limit: u32) -> Self {
        Self { offset, limit }
    }

    pub fn first_page(limit: u32) -> Self {
        Self { offset: 0, limit }
    }

    /// One-based page number to offset. Page 0 maps to the first page.
    pub fn for_page(page: u32, limit: u32) -> Self {
        Self {
            offset: page.saturating_sub(1).saturating_mul(limit),
            limit,
        }
    }
}

/// Opaque continuation handed back by a catalog (usually the upstream URL).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor(pub String);

impl PageCursor {
    pub fn new(cursor: impl Into<String>) -> Self {
        Self(cursor.into())
    }
}

/// A single page of items plus the cursors the source declared around it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<PageCursor>,
    pub previous: Option<PageCursor>,
}

impl<T> Page<T> {
    pub fn single_page(items: Vec<T>) -> Self {
        Self {
            items,
            next: None,
            previous: None,
        }
    }

    pub fn empty() -> Self {
        Self::single_page(Vec::new())
    }

    /// Derived from the cursor alone; item counts are never consulted.
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn has_prev(&self) -> bool {
        self.previous.is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

pub type TrackPage = Page<Track>;

/// Page designator as supplied by the user, possibly garbage.
///
/// Anything other than a positive integer is treated as "no page" and
/// resolves to the first page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestedPage(Option<u32>);

impl RequestedPage {
    pub fn first() -> Self {
        Self(Some(1))
    }

    pub fn unspecified() -> Self {
        Self(None)
    }

    pub fn parse(input: &str) -> Self {
        match input.trim().parse::<i64>() {
            Ok(value) => Self::from(value),
            Err(_) => Self(None),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_some()
    }

    /// Page number committed once a fetch for this request succeeds.
    pub fn number(&self) -> u32 {
        self.0.unwrap_or(1)
    }

    pub fn offset(&self, limit: u32) -> u32 {
        match self.0 {
            Some(page) => PageRequest::for_page(page, limit).offset,
            None => 0,
        }
    }

    pub fn page_request(&self, limit: u32) -> PageRequest {
        PageRequest::new(self.offset(limit), limit)
    }
}

impl From<i64> for RequestedPage {
    fn from(value: i64) -> Self {
        if value >= 1 {
            Self(u32::try_from(value).ok())
        } else {
            Self(None)
        }
    }
}

impl From<u32> for RequestedPage {
    fn from(value: u32) -> Self {
        Self::from(i64::from(value))
    }
}
