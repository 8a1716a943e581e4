//! Duration-adaptive planning: which model profile to use and how many windows to cut.
//!
//! Longer recordings cost more to transcribe in one pass, so we split them to bound
//! per-call latency and memory; shorter recordings get a single pass on the
//! higher-accuracy model. Both decisions are independent step functions over the total
//! duration, kept as ordered `(upper_bound, value)` tables so boundary behavior is
//! obvious and testable.

use std::fmt;

use crate::error::{Error, Result};

/// A named speed/accuracy trade-off of the transcription model, selected per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelProfile {
    /// Higher quality, slower. Used for short answers.
    Accurate,

    /// Lower latency, lower quality. Used once answers get long.
    Fast,
}

impl ModelProfile {
    /// The external identifier reported in outcomes (whisper.cpp model name).
    pub fn identifier(&self) -> &'static str {
        match self {
            Self::Accurate => "base.en",
            Self::Fast => "tiny.en",
        }
    }

    /// File name of the GGML artifact for this profile inside a models directory.
    pub fn model_filename(&self) -> &'static str {
        match self {
            Self::Accurate => "ggml-base.en.bin",
            Self::Fast => "ggml-tiny.en.bin",
        }
    }

    /// Every profile the planner can select.
    pub fn all() -> &'static [ModelProfile] {
        &[Self::Accurate, Self::Fast]
    }
}

impl fmt::Display for ModelProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// The planner's decision for one request: which model to run and how many windows
/// to cut the buffer into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentationPlan {
    pub model_profile: ModelProfile,
    pub segment_count: usize,
}

// Half-open on the lower bound: a duration selects the first row whose upper bound
// is strictly greater than it, falling back to the default past the last row.
const MODEL_PROFILE_STEPS: &[(f64, ModelProfile)] = &[(120.0, ModelProfile::Accurate)];
const MODEL_PROFILE_FLOOR: ModelProfile = ModelProfile::Fast;

const SEGMENT_COUNT_STEPS: &[(f64, usize)] = &[(60.0, 1), (120.0, 2), (300.0, 3)];
const SEGMENT_COUNT_FLOOR: usize = 5;

/// Derive a [`SegmentationPlan`] from the total audio duration.
///
/// Pure: the same duration always yields the same plan. Any non-negative finite
/// duration is accepted; negative or non-finite durations are a contract violation
/// by the caller.
pub fn plan(duration_seconds: f64) -> Result<SegmentationPlan> {
    if !duration_seconds.is_finite() || duration_seconds < 0.0 {
        return Err(Error::invalid_input(format!(
            "duration must be a non-negative finite number of seconds, got {duration_seconds}"
        )));
    }

    Ok(SegmentationPlan {
        model_profile: step_value(MODEL_PROFILE_STEPS, MODEL_PROFILE_FLOOR, duration_seconds),
        segment_count: step_value(SEGMENT_COUNT_STEPS, SEGMENT_COUNT_FLOOR, duration_seconds),
    })
}

fn step_value<T: Copy>(steps: &[(f64, T)], floor: T, duration_seconds: f64) -> T {
    for &(upper_bound, value) in steps {
        if duration_seconds < upper_bound {
            return value;
        }
    }
    floor
}
