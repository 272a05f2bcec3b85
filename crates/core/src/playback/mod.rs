#[cfg(feature = "playback")]
mod audio;

use crate::speech::SpeechAudio;
use futures::future::BoxFuture;

#[cfg(feature = "playback")]
pub use audio::RodioPlaybackSink;

#[derive(thiserror::Error, Debug)]
pub enum PlaybackError {
    #[error("audio output unavailable: {details}")]
    AudioOutputUnavailable { details: String },

    #[error("could not decode {format} audio: {details}")]
    Decode { format: &'static str, details: String },

    #[error("playback task failed: {0}")]
    Task(String),
}

pub trait PlaybackSink: Send + Sync {
    /// Resolves once the clip has finished playing.
    fn play(&self, audio: SpeechAudio) -> BoxFuture<'_, Result<(), PlaybackError>>;
}
