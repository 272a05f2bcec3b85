use crate::playback::{PlaybackError, PlaybackSink};
use crate::speech::SpeechAudio;
use futures::future::BoxFuture;
use futures::FutureExt;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};
use std::io::Cursor;
use std::sync::{Arc, Mutex};

/// Plays encoded clips on the default output device.
///
/// The [`OutputStream`] is opened on first use and kept for the lifetime of
/// the sink; dropping it mid-clip silences playback. Clones share one stream.
#[derive(Clone, Default)]
pub struct RodioPlaybackSink {
    stream: Arc<Mutex<Option<OutputStream>>>,
}

impl RodioPlaybackSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn play_blocking(&self, audio: SpeechAudio) -> Result<(), PlaybackError> {
        let format = audio.format.extension();
        let source = Decoder::new(Cursor::new(audio.data)).map_err(|e| PlaybackError::Decode {
            format,
            details: e.to_string(),
        })?;

        let sink = {
            let mut guard = match self.stream.lock() {
                Ok(g) => g,
                Err(poisoned) => {
                    tracing::warn!("output stream lock was poisoned; recovering");
                    poisoned.into_inner()
                }
            };
            if guard.is_none() {
                tracing::debug!("opening default output stream");
                let stream = OutputStreamBuilder::open_default_stream().map_err(|e| {
                    PlaybackError::AudioOutputUnavailable {
                        details: e.to_string(),
                    }
                })?;
                *guard = Some(stream);
            }
            match guard.as_ref() {
                Some(stream) => Sink::connect_new(stream.mixer()),
                None => {
                    return Err(PlaybackError::AudioOutputUnavailable {
                        details: "output stream missing after open".to_owned(),
                    })
                }
            }
        };

        sink.append(source);
        sink.sleep_until_end();
        Ok(())
    }
}

impl PlaybackSink for RodioPlaybackSink {
    fn play(&self, audio: SpeechAudio) -> BoxFuture<'_, Result<(), PlaybackError>> {
        let this = self.clone();
        async move {
            if audio.data.is_empty() {
                tracing::debug!("skipping playback of empty clip");
                return Ok(());
            }
            tokio::task::spawn_blocking(move || this.play_blocking(audio))
                .await
                .map_err(|e| PlaybackError::Task(e.to_string()))?
        }
        .boxed()
    }
}
