use deck_audio::{AudioError, AudioOutput};
use deck_core::{PreviewUrl, Track, TrackId};
use thiserror::Error;

/// Transport of the single audio output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    /// Nothing loaded, or the selection has no preview.
    #[default]
    Idle,
    Playing,
    Paused,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("could not load preview for {track}: {source}")]
    Load { track: TrackId, source: AudioError },
    #[error("could not start preview for {track}: {source}")]
    Start { track: TrackId, source: AudioError },
    #[error("could not pause preview for {track}: {source}")]
    Pause { track: TrackId, source: AudioError },
}

/// Owns the audio output for its whole lifetime and the current selection.
///
/// `is_playing()` is only ever true while the selected track has a preview
/// URL. Output failures never leave the transport at `Playing`; they are
/// kept in `last_error()` and the controller stays usable.
#[derive(Debug)]
pub struct PlaybackController<A> {
    output: A,
    selected: Option<Track>,
    transport: Transport,
    last_error: Option<PlaybackError>,
}

impl<A: AudioOutput> PlaybackController<A> {
    pub fn new(output: A) -> Self {
        Self {
            output,
            selected: None,
            transport: Transport::Idle,
            last_error: None,
        }
    }

    pub fn selected(&self) -> Option<&Track> {
        self.selected.as_ref()
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn is_playing(&self) -> bool {
        self.transport == Transport::Playing
    }

    pub fn last_error(&self) -> Option<&PlaybackError> {
        self.last_error.as_ref()
    }

    pub fn output(&self) -> &A {
        &self.output
    }

    /// Replace the selection. A track with a preview is loaded and started;
    /// a silent one stops whatever was playing and stays selected.
    pub fn select_track(&mut self, track: Track) -> Result<(), PlaybackError> {
        tracing::debug!(track = %track.id, preview = track.has_preview(), "select track");
        self.last_error = None;
        let preview = track.preview_url.clone();
        self.selected = Some(track);

        match preview {
            Some(url) => self.load_and_start(&url),
            None => {
                if self.transport == Transport::Playing {
                    // The old source is abandoned; a failing pause must not keep it marked live.
                    if let Err(source) = self.output.pause() {
                        tracing::warn!(error = %source, "pause before silent selection failed");
                    }
                }
                self.transport = Transport::Idle;
                Ok(())
            }
        }
    }

    /// Start or resume the selection. Returns whether the transport changed.
    ///
    /// A preview whose load failed earlier is loaded again.
    pub fn play(&mut self) -> Result<bool, PlaybackError> {
        let Some(url) = self.selected_preview() else {
            return Ok(false);
        };
        match self.transport {
            Transport::Playing => Ok(false),
            Transport::Paused => {
                self.start()?;
                Ok(true)
            }
            Transport::Idle => {
                self.load_and_start(&url)?;
                Ok(true)
            }
        }
    }

    /// Returns whether the transport changed.
    pub fn pause(&mut self) -> Result<bool, PlaybackError> {
        if self.transport != Transport::Playing {
            return Ok(false);
        }
        if let Err(source) = self.output.pause() {
            return Err(self.fail(PlaybackError::Pause {
                track: self.selected_id(),
                source,
            }));
        }
        self.transport = Transport::Paused;
        tracing::debug!("preview paused");
        Ok(true)
    }

    /// Playing pauses, anything else plays. With no selection, or a silent
    /// one, nothing happens and `false` is returned.
    pub fn toggle(&mut self) -> Result<bool, PlaybackError> {
        match self.transport {
            Transport::Playing => self.pause(),
            Transport::Paused | Transport::Idle => self.play(),
        }
    }

    fn load_and_start(&mut self, url: &PreviewUrl) -> Result<(), PlaybackError> {
        self.transport = Transport::Idle;
        if let Err(source) = self.output.set_source(url) {
            return Err(self.fail(PlaybackError::Load {
                track: self.selected_id(),
                source,
            }));
        }
        // Loaded but not yet audible, so a failed start can be retried by toggling.
        self.transport = Transport::Paused;
        self.start()
    }

    fn start(&mut self) -> Result<(), PlaybackError> {
        if let Err(source) = self.output.play() {
            return Err(self.fail(PlaybackError::Start {
                track: self.selected_id(),
                source,
            }));
        }
        self.transport = Transport::Playing;
        self.last_error = None;
        tracing::debug!(track = %self.selected_id(), "preview playing");
        Ok(())
    }

    fn fail(&mut self, error: PlaybackError) -> PlaybackError {
        tracing::warn!(error = %error, "playback failure");
        self.last_error = Some(error.clone());
        error
    }

    fn selected_preview(&self) -> Option<PreviewUrl> {
        self.selected.as_ref().and_then(|t| t.preview_url.clone())
    }

    fn selected_id(&self) -> TrackId {
        self.selected
            .as_ref()
            .map(|t| t.id.clone())
            .unwrap_or_else(|| TrackId::new(""))
    }
}
