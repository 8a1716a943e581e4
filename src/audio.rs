//! The normalized audio representation consumed by the transcription pipeline.
//!
//! Upstream decoding (see `decode`) produces a mono, fixed-sample-rate buffer of
//! `f32` amplitudes in `[-1.0, 1.0]`. Everything downstream — planning, windowing,
//! inference — works against this one shape.

use crate::error::{Error, Result};

/// Recite's target mono sample rate (Hz).
///
/// This matches what whisper.cpp expects; the decoder resamples everything to it.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// A mono audio buffer at a known sample rate.
///
/// Immutable once constructed: windows extracted from it alias its memory and must
/// never observe mutation. One buffer belongs to one pipeline invocation; it is not
/// shared across concurrent requests.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Wrap normalized mono samples with their sample rate.
    ///
    /// A zero sample rate is a contract violation by the caller: duration would be
    /// undefined and windowing arithmetic would divide by zero.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::invalid_input("sample rate must be positive"));
        }

        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// The raw mono samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// The sample rate (Hz).
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples in the buffer.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the buffer holds no samples at all.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Total duration in seconds (`samples / sample_rate`).
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}
