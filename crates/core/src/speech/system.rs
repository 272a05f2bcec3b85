use crate::lang::speech_language;
use crate::speech::{AudioFormat, SpeechAudio, SpeechError, SpeechRequest, SpeechSynthesizer};
use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

pub const BASE_WORDS_PER_MINUTE: f32 = 175.0;

/// On-device voice backed by `espeak-ng`. Text goes in on stdin, WAV comes out on stdout.
#[derive(Clone, Debug)]
pub struct SystemVoice {
    binary: PathBuf,
}

impl SystemVoice {
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

pub fn espeak_args(request: &SpeechRequest) -> Vec<String> {
    let wpm = (BASE_WORDS_PER_MINUTE * request.rate.factor()).round() as u32;
    vec![
        "-v".to_owned(),
        speech_language(&request.lang).to_owned(),
        "-s".to_owned(),
        wpm.to_string(),
        "--stdout".to_owned(),
    ]
}

impl SpeechSynthesizer for SystemVoice {
    fn synthesize(
        &self,
        request: SpeechRequest,
    ) -> BoxFuture<'_, Result<SpeechAudio, SpeechError>> {
        async move {
            let binary = self.binary.display().to_string();
            let mut child = Command::new(&self.binary)
                .args(espeak_args(&request))
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .spawn()
                .map_err(|source| SpeechError::Spawn {
                    binary: binary.clone(),
                    source,
                })?;

            if let Some(mut stdin) = child.stdin.take() {
                stdin
                    .write_all(request.text.as_bytes())
                    .await
                    .map_err(|source| SpeechError::Spawn {
                        binary: binary.clone(),
                        source,
                    })?;
            }

            let output = child
                .wait_with_output()
                .await
                .map_err(|source| SpeechError::Spawn {
                    binary: binary.clone(),
                    source,
                })?;

            if !output.status.success() {
                return Err(SpeechError::ProcessFailed {
                    binary,
                    status: output.status,
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
                });
            }
            if output.stdout.is_empty() {
                return Err(SpeechError::Empty);
            }

            tracing::debug!(bytes = output.stdout.len(), "system voice produced audio");
            Ok(SpeechAudio {
                format: AudioFormat::Wav,
                data: Bytes::from(output.stdout),
            })
        }
        .boxed()
    }
}
