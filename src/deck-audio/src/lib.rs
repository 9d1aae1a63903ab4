mod output;
#[cfg(feature = "cpal-backend")]
mod real;

pub use output::{AudioError, AudioOutput, AudioResult, NullAudioOutput, OutputCall};
#[cfg(feature = "cpal-backend")]
pub use real::CpalAudioOutput;
