//! Built-in model powered by `whisper-rs` / `whisper.cpp`.

use anyhow::{Context, Result, ensure};
use std::path::Path;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::logging::init_whisper_logging;
use crate::model::SpeechModel;

/// A loaded whisper.cpp model.
///
/// Loading is expensive (seconds for the larger profiles), so instances are created
/// once per profile and cached by the registry. Each `transcribe` call creates a fresh
/// `WhisperState`, which keeps the context itself stateless for inference purposes.
pub struct WhisperModel {
    ctx: WhisperContext,
}

impl WhisperModel {
    /// Load a GGML model from disk.
    pub fn load(model_path: &Path) -> Result<Self> {
        // Whisper can be very chatty; keep it quiet by default.
        // This function is idempotent (safe to call multiple times).
        init_whisper_logging();

        ensure!(
            model_path.is_file(),
            "model file not found at '{}'",
            model_path.display()
        );

        let ctx_params = WhisperContextParameters::default();
        let ctx = WhisperContext::new_with_params(&model_path.to_string_lossy(), ctx_params)
            .with_context(|| format!("failed to load model from path: {}", model_path.display()))?;

        Ok(Self { ctx })
    }

    /// Access the underlying Whisper context.
    pub fn context(&self) -> &WhisperContext {
        &self.ctx
    }
}

impl std::fmt::Debug for WhisperModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperModel").finish_non_exhaustive()
    }
}

impl SpeechModel for WhisperModel {
    fn transcribe(&self, samples: &[f32]) -> Result<String> {
        let params = build_full_params();

        let mut state = self
            .ctx
            .create_state()
            .context("failed to create whisper state")?;

        state
            .full(params, samples)
            .context("failed to run whisper full()")?;

        let mut text = String::new();
        for segment in state.as_iter() {
            let piece = segment.to_str().context("failed to get segment text")?;
            text.push_str(piece);
        }

        Ok(text)
    }
}

fn build_full_params() -> FullParams<'static, 'static> {
    let mut params = FullParams::new(SamplingStrategy::BeamSearch {
        beam_size: 5,
        patience: 1.0,
    });

    params.set_n_threads(num_cpus::get() as i32);
    params.set_translate(false);
    // Both supported profiles are English-only models.
    params.set_language(Some("en"));
    params.set_no_context(true);
    params.set_single_segment(false);

    params.set_print_progress(false);
    params.set_print_special(false);
    params.set_print_realtime(false);
    params.set_print_timestamps(false);

    params
}
