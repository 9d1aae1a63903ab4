mod playback;

pub use playback::{PlaybackController, PlaybackError, Transport};
