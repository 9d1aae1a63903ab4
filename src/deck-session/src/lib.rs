//! The coordinating state container.
//!
//! A [`Session`] owns the popular list, the search controller and the
//! playback controller. The view layer talks to it only through
//! [`Command`]s and reads it only through [`SessionView`].

mod command;
mod session;
mod view;

pub use command::{Command, CommandOutcome, FetchId, FetchReport, Rejection, SessionError};
pub use session::{Session, SessionSettings};
pub use view::{Heading, PaginationView, PlayerBar, SessionView};
