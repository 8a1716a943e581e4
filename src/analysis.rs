//! Short-term audio metrics for answer quality heuristics.
//!
//! Downstream scoring wants a rough sense of how energetic a recording is and how
//! much of it is silence, without running a model. We compute both over short frames
//! (50 ms windows, 25 ms hop) of the normalized buffer.

use crate::audio::SampleBuffer;
use crate::error::{Error, Result};

/// RMS level below which a frame counts as silent.
const SILENCE_RMS_THRESHOLD: f32 = 0.01;

const FRAME_SECONDS: f64 = 0.05;
const HOP_SECONDS: f64 = 0.025;

/// Aggregate metrics over one buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioMetrics {
    /// Mean short-term energy (mean square amplitude) across frames.
    pub energy: f32,

    /// Fraction of frames whose RMS falls below the silence threshold, in `[0, 1]`.
    pub silence_ratio: f32,
}

/// Compute short-term metrics for `buffer`.
///
/// An empty buffer has no frames to measure and is rejected as invalid input.
pub fn analyze(buffer: &SampleBuffer) -> Result<AudioMetrics> {
    if buffer.is_empty() {
        return Err(Error::invalid_input("cannot analyze an empty buffer"));
    }

    let samples = buffer.samples();
    let frame_len = ((FRAME_SECONDS * buffer.sample_rate() as f64) as usize).max(1);
    let hop = ((HOP_SECONDS * buffer.sample_rate() as f64) as usize).max(1);

    let mut energy_sum = 0.0f64;
    let mut silent_frames = 0usize;
    let mut frames = 0usize;

    let mut start = 0;
    while start < samples.len() {
        let end = (start + frame_len).min(samples.len());
        let frame = &samples[start..end];

        let mean_square = frame.iter().map(|s| (*s as f64) * (*s as f64)).sum::<f64>()
            / frame.len() as f64;

        energy_sum += mean_square;
        if mean_square.sqrt() < SILENCE_RMS_THRESHOLD as f64 {
            silent_frames += 1;
        }
        frames += 1;

        start += hop;
    }

    Ok(AudioMetrics {
        energy: (energy_sum / frames as f64) as f32,
        silence_ratio: silent_frames as f32 / frames as f32,
    })
}
