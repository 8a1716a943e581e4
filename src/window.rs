//! Window extraction: cut a sample buffer into the (possibly overlapping) slices
//! the executor feeds to the model.
//!
//! Multi-window plans add one second of overlap at each shared boundary so the model
//! keeps context across cut points; the final window is clamped to the true buffer
//! length and absorbs the remainder of the integer division.

use crate::audio::SampleBuffer;
use crate::plan::SegmentationPlan;

/// One contiguous slice of the source buffer, submitted to the model as a unit of work.
///
/// Windows borrow from the buffer they were extracted from; they are read-only views
/// and are consumed once by the executor.
#[derive(Debug, Clone, Copy)]
pub struct Window<'a> {
    pub samples: &'a [f32],
    pub sample_rate: u32,
}

impl Window<'_> {
    /// Window length in samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether this window holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Cut `buffer` into `plan.segment_count` windows.
///
/// The single-window case deliberately stays a separate path with no overlap
/// arithmetic: it returns the whole buffer as one slice. For multi-window plans,
/// window `i` spans `[i*base_len - overlap, (i+1)*base_len + overlap)` clamped to the
/// buffer, where `base_len = len / segment_count` and `overlap` is one second of
/// samples. Every sample of the buffer lands in at least one window.
///
/// A buffer shorter than `segment_count` samples degenerates to overlapping
/// empty/near-empty slices; that is accepted input (it produces sentinel transcripts
/// downstream), not an error.
pub fn extract<'a>(buffer: &'a SampleBuffer, plan: &SegmentationPlan) -> Vec<Window<'a>> {
    let samples = buffer.samples();
    let sample_rate = buffer.sample_rate();

    if plan.segment_count == 1 {
        return vec![Window {
            samples,
            sample_rate,
        }];
    }

    let base_len = samples.len() / plan.segment_count;
    let overlap = (1.0 * sample_rate as f64).round() as usize;

    let mut windows = Vec::with_capacity(plan.segment_count);
    for i in 0..plan.segment_count {
        let start = (i * base_len).saturating_sub(overlap);
        let end = ((i + 1) * base_len + overlap).min(samples.len());
        windows.push(Window {
            samples: &samples[start..end],
            sample_rate,
        });
    }

    windows
}
