use deck_core::PreviewUrl;
use thiserror::Error;

/// Audio output errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AudioError {
    #[error("audio backend unavailable: {0}")]
    Backend(String),
    #[error("unsupported source: {0}")]
    UnsupportedSource(String),
    #[error("failed to fetch preview: {0}")]
    Fetch(String),
    #[error("failed to decode preview: {0}")]
    Decode(String),
    #[error("no source loaded")]
    NoSource,
    #[error("audio thread is gone")]
    Disconnected,
}

pub type AudioResult<T> = Result<T, AudioError>;

/// The single playable-media handle owned by the playback controller.
///
/// Implementations are plain synchronous calls. Callers running on a
/// multi-threaded runtime must serialise access (the controller takes
/// `&mut self` for every transport change).
pub trait AudioOutput: Send {
    /// Replace the current source. Playback is stopped until `play`.
    fn set_source(&mut self, url: &PreviewUrl) -> AudioResult<()>;

    fn play(&mut self) -> AudioResult<()>;

    fn pause(&mut self) -> AudioResult<()>;
}

impl<T: AudioOutput + ?Sized> AudioOutput for Box<T> {
    fn set_source(&mut self, url: &PreviewUrl) -> AudioResult<()> {
        (**self).set_source(url)
    }

    fn play(&mut self) -> AudioResult<()> {
        (**self).play()
    }

    fn pause(&mut self) -> AudioResult<()> {
        (**self).pause()
    }
}

/// Calls observed by [`NullAudioOutput`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputCall {
    SetSource(PreviewUrl),
    Play,
    Pause,
}

/// Silent output used for tests and headless environments.
#[derive(Debug, Default, Clone)]
pub struct NullAudioOutput {
    source: Option<PreviewUrl>,
    playing: bool,
    calls: Vec<OutputCall>,
}

impl NullAudioOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(&self) -> Option<&PreviewUrl> {
        self.source.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn calls(&self) -> &[OutputCall] {
        &self.calls
    }
}

impl AudioOutput for NullAudioOutput {
    fn set_source(&mut self, url: &PreviewUrl) -> AudioResult<()> {
        self.calls.push(OutputCall::SetSource(url.clone()));
        self.source = Some(url.clone());
        self.playing = false;
        tracing::debug!(url = url.as_ref(), "null output: source set");
        Ok(())
    }

    fn play(&mut self) -> AudioResult<()> {
        self.calls.push(OutputCall::Play);
        if self.source.is_none() {
            return Err(AudioError::NoSource);
        }
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) -> AudioResult<()> {
        self.calls.push(OutputCall::Pause);
        self.playing = false;
        Ok(())
    }
}
