//! Pronunciation practice: record an attempt, get an accuracy score.
//!
//! Scoring is simulated. [`AccuracyScorer`] is the seam where a real
//! recognizer would plug in.

use bytes::Bytes;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const GOOD_THRESHOLD: u8 = 85;
pub const FAIR_THRESHOLD: u8 = 70;

const SIMULATED_MIN: u8 = 65;
const SIMULATED_MAX_EXCLUSIVE: u8 = 95;

pub const WAVE_MIN_HEIGHT: f32 = 10.0;
pub const WAVE_MAX_HEIGHT: f32 = 80.0;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum AccuracyBand {
    Good,
    Fair,
    Poor,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Accuracy {
    percent: u8,
}

impl Accuracy {
    pub fn new(percent: u8) -> Self {
        Self {
            percent: percent.min(100),
        }
    }

    pub fn percent(self) -> u8 {
        self.percent
    }

    pub fn band(self) -> AccuracyBand {
        match self.percent {
            p if p >= GOOD_THRESHOLD => AccuracyBand::Good,
            p if p >= FAIR_THRESHOLD => AccuracyBand::Fair,
            _ => AccuracyBand::Poor,
        }
    }
}

impl fmt::Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Recording {
    pub data: Bytes,
    pub mime: String,
}

impl Recording {
    pub fn wav(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            mime: "audio/wav".to_owned(),
        }
    }
}

pub trait AccuracyScorer: Send {
    fn score(&mut self, reference: &str, recording: &Recording) -> Accuracy;
}

/// Uniform draw in 65..95 regardless of input.
pub struct SimulatedScorer<R = StdRng> {
    rng: R,
}

impl SimulatedScorer<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

/// Reproducible generator for a seed, OS entropy otherwise.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

impl<R: Rng> SimulatedScorer<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng + Send> AccuracyScorer for SimulatedScorer<R> {
    fn score(&mut self, _reference: &str, _recording: &Recording) -> Accuracy {
        Accuracy::new(self.rng.random_range(SIMULATED_MIN..SIMULATED_MAX_EXCLUSIVE))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FixedScorer(pub u8);

impl AccuracyScorer for FixedScorer {
    fn score(&mut self, _reference: &str, _recording: &Recording) -> Accuracy {
        Accuracy::new(self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ShadowingError {
    #[error("already recording")]
    AlreadyRecording,
    #[error("not recording")]
    NotRecording,
    #[error("recording is empty")]
    EmptyRecording,
}

pub struct ShadowingPanel<S> {
    scorer: S,
    state: RecorderState,
    last_recording: Option<Recording>,
    last_accuracy: Option<Accuracy>,
}

impl<S: AccuracyScorer> ShadowingPanel<S> {
    pub fn new(scorer: S) -> Self {
        Self {
            scorer,
            state: RecorderState::Idle,
            last_recording: None,
            last_accuracy: None,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn last_recording(&self) -> Option<&Recording> {
        self.last_recording.as_ref()
    }

    pub fn last_accuracy(&self) -> Option<Accuracy> {
        self.last_accuracy
    }

    pub fn start(&mut self) -> Result<(), ShadowingError> {
        if self.state == RecorderState::Recording {
            return Err(ShadowingError::AlreadyRecording);
        }
        self.state = RecorderState::Recording;
        tracing::debug!("recording started");
        Ok(())
    }

    /// Ends the attempt and scores it against `reference`.
    ///
    /// The panel returns to idle even when the recording is rejected.
    pub fn stop(
        &mut self,
        reference: &str,
        recording: Recording,
    ) -> Result<Accuracy, ShadowingError> {
        if self.state != RecorderState::Recording {
            return Err(ShadowingError::NotRecording);
        }
        self.state = RecorderState::Idle;
        if recording.data.is_empty() {
            return Err(ShadowingError::EmptyRecording);
        }

        let accuracy = self.scorer.score(reference, &recording);
        tracing::info!(
            accuracy = accuracy.percent(),
            band = ?accuracy.band(),
            bytes = recording.data.len(),
            "shadowing attempt scored"
        );
        self.last_recording = Some(recording);
        self.last_accuracy = Some(accuracy);
        Ok(accuracy)
    }
}

/// One animation frame of `bars` heights in `10.0..80.0`.
pub fn waveform_frame(rng: &mut impl Rng, bars: usize) -> Vec<f32> {
    (0..bars)
        .map(|_| rng.random_range(WAVE_MIN_HEIGHT..WAVE_MAX_HEIGHT))
        .collect()
}
