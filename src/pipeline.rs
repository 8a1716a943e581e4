//! High-level API for transcribing one spoken answer.
//!
//! We expose a single, ergonomic entry point (`Pipeline`) that wires together the
//! lower-level pieces:
//! - the planner decides model profile + window count from total duration
//! - the window extractor cuts the buffer accordingly
//! - the executor runs the selected model over each window, sequentially
//! - the assembler packages per-window transcripts into one outcome
//!
//! The intent is:
//! - Model handles load once (expensive) and live in the injected registry.
//! - One `Pipeline` serves many requests; each request owns its own buffer.
//! - Everything downstream of the buffer is deterministic given the duration.

use tracing::{info, warn};

use crate::audio::SampleBuffer;
use crate::error::Result;
use crate::outcome::{TranscriptionOutcome, assemble};
use crate::registry::ModelRegistry;
use crate::{executor, plan, window};

/// The transcription entry point. Owns the model registry; callers construct it once
/// and call [`Pipeline::transcribe`] per request.
pub struct Pipeline {
    registry: ModelRegistry,
}

impl Pipeline {
    /// Create a pipeline around an existing registry.
    pub fn new(registry: ModelRegistry) -> Self {
        Self { registry }
    }

    /// Access the underlying model registry.
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Transcribe one answer buffer into a structured outcome.
    ///
    /// Within this call, windows are transcribed strictly sequentially; across calls,
    /// only the registry is shared. The call is not cancellable mid-window — a caller
    /// abandoning the request does not interrupt an in-flight inference.
    pub fn transcribe(&self, buffer: &SampleBuffer) -> Result<TranscriptionOutcome> {
        let duration_seconds = buffer.duration_seconds();
        let plan = plan::plan(duration_seconds)?;

        info!(
            duration_seconds,
            model = %plan.model_profile,
            segments = plan.segment_count,
            "planned transcription"
        );

        let windows = window::extract(buffer, &plan);
        let model = self.registry.get(plan.model_profile)?;
        let transcripts = executor::transcribe_windows(model.as_ref(), &windows)?;

        let outcome = assemble(
            transcripts,
            plan.model_profile.identifier(),
            plan.segment_count,
        );

        if outcome.is_all_silence() {
            warn!("all windows returned empty transcriptions");
        }

        Ok(outcome)
    }
}
