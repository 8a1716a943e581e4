use anyhow::Result;

/// Pluggable speech-to-text model used by the transcription executor.
///
/// A model turns mono `f32` samples at Recite's target sample rate into raw text for
/// one window of audio. Implementations must be shareable across requests
/// (`Send + Sync`): the registry hands out one handle per profile for the lifetime of
/// the process.
///
/// Inference is treated as a synchronous, potentially slow call; callers are expected
/// to invoke it from a blocking context. Implementations are not assumed safe for
/// concurrent invocation from multiple windows of the same request, which is why the
/// executor runs windows sequentially.
pub trait SpeechModel: Send + Sync + std::fmt::Debug {
    /// Transcribe one window of mono samples into raw text.
    ///
    /// Returns whatever the model produced, including the empty string for silence;
    /// sentinel substitution is the executor's job, not the model's.
    fn transcribe(&self, samples: &[f32]) -> Result<String>;
}
