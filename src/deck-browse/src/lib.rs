//! Search and browse state: the paged keyword search and the popular list
//! shown before any search.
//!
//! Both holders are synchronous. Starting a fetch hands out a ticket; the
//! caller performs the catalog call and feeds the result back with the
//! ticket, which lets late responses from superseded requests be dropped.

mod popular;
mod search;

pub use popular::{PopularOutcome, PopularTicket, PopularTracks};
pub use search::{
    FetchIntent, FetchOutcome, FetchTicket, NavigationError, SearchController,
};
