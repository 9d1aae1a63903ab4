use std::fmt;

use deck_browse::{FetchIntent, FetchOutcome, NavigationError, PopularOutcome};
use deck_core::{CatalogError, RequestedPage, Track, TrackId};
use deck_player::PlaybackError;
use thiserror::Error;

/// Everything the view layer may ask of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    LoadPopular,
    SetKeyword(String),
    /// Search the pending keyword at a user-supplied page.
    Search(RequestedPage),
    /// Search the pending keyword from page 1.
    SubmitSearch,
    NextPage,
    PrevPage,
    ClearSearch,
    Select(Track),
    /// Select a track from the list currently displayed.
    SelectDisplayed(TrackId),
    Toggle,
}

/// Identifies one spawned catalog fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FetchId(pub(crate) u64);

impl fmt::Display for FetchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fetch#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Done,
    /// A catalog fetch is running; its result arrives through `settle`.
    Pending(FetchId),
    /// Not applicable in the current state; nothing changed.
    Rejected(Rejection),
    Failed(SessionError),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Rejection {
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error("track {0} is not in the displayed list")]
    UnknownTrack(TrackId),
    #[error("popular tracks are already loading")]
    PopularInFlight,
    #[error("nothing playable is selected")]
    NothingToToggle,
    #[error("the request was superseded by a newer one")]
    Superseded,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

/// What happened when a completed fetch was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchReport {
    Popular {
        id: FetchId,
        outcome: PopularOutcome,
    },
    Search {
        id: FetchId,
        intent: FetchIntent,
        outcome: FetchOutcome,
    },
}

impl FetchReport {
    pub fn id(&self) -> FetchId {
        match self {
            FetchReport::Popular { id, .. } | FetchReport::Search { id, .. } => *id,
        }
    }

    pub fn error(&self) -> Option<&CatalogError> {
        match self {
            FetchReport::Popular {
                outcome: PopularOutcome::Failed(err),
                ..
            }
            | FetchReport::Search {
                outcome: FetchOutcome::Failed(err),
                ..
            } => Some(err),
            _ => None,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(
            self,
            FetchReport::Popular {
                outcome: PopularOutcome::Stale,
                ..
            } | FetchReport::Search {
                outcome: FetchOutcome::Stale,
                ..
            }
        )
    }

    pub(crate) fn into_outcome(self) -> CommandOutcome {
        if self.is_stale() {
            return CommandOutcome::Rejected(Rejection::Superseded);
        }
        match self.error() {
            Some(err) => CommandOutcome::Failed(SessionError::Catalog(err.clone())),
            None => CommandOutcome::Done,
        }
    }
}
