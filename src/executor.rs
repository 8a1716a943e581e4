//! Sequential window transcription.
//!
//! Windows run strictly in plan order, one at a time: the model handle is a shared,
//! stateful resource whose inference call is not assumed safe for concurrent use
//! within one request. A window that comes back empty or whitespace-only is replaced
//! with a fixed sentinel so downstream consumers never see an empty transcript.

use std::time::Instant;

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::model::SpeechModel;
use crate::window::Window;

/// Placeholder transcript for a window in which the model heard nothing.
///
/// Sentinel substitution is a designed degenerate output, not an error; it keeps the
/// "silent answer" case distinguishable from a pipeline failure.
pub const NO_SPEECH_SENTINEL: &str = "[No speech detected]";

/// Run `model` over each window in order, producing one transcript per window.
///
/// Inference failure on any window aborts the remaining ones — the request fails as a
/// whole rather than returning an incomplete transcript silently.
pub fn transcribe_windows(
    model: &dyn SpeechModel,
    windows: &[Window<'_>],
) -> Result<Vec<String>> {
    let mut transcripts = Vec::with_capacity(windows.len());

    for (index, window) in windows.iter().enumerate() {
        let started = Instant::now();

        let raw = model
            .transcribe(window.samples)
            .map_err(|err| Error::transcription(index, err))?;

        info!(
            window = index + 1,
            windows = windows.len(),
            elapsed_seconds = started.elapsed().as_secs_f64(),
            "window transcribed"
        );

        transcripts.push(non_empty_or_sentinel(raw, index));
    }

    Ok(transcripts)
}

fn non_empty_or_sentinel(raw: String, index: usize) -> String {
    if raw.trim().is_empty() {
        warn!(window = index + 1, "model returned empty transcription");
        return NO_SPEECH_SENTINEL.to_owned();
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::TARGET_SAMPLE_RATE;

    // Replays a fixed script of per-window results, tracking call order.
    #[derive(Debug)]
    struct ScriptedModel {
        script: Vec<anyhow::Result<String>>,
        calls: std::sync::Mutex<usize>,
    }

    impl ScriptedModel {
        fn new(script: Vec<anyhow::Result<String>>) -> Self {
            Self {
                script,
                calls: std::sync::Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().expect("calls lock")
        }
    }

    impl SpeechModel for ScriptedModel {
        fn transcribe(&self, _samples: &[f32]) -> anyhow::Result<String> {
            let mut calls = self.calls.lock().expect("calls lock");
            let index = *calls;
            *calls += 1;
            match &self.script[index] {
                Ok(text) => Ok(text.clone()),
                Err(err) => Err(anyhow::anyhow!("{err}")),
            }
        }
    }

    fn windows_of(samples: &[f32], count: usize) -> Vec<Window<'_>> {
        (0..count)
            .map(|_| Window {
                samples,
                sample_rate: TARGET_SAMPLE_RATE,
            })
            .collect()
    }

    #[test]
    fn transcripts_preserve_window_order() -> anyhow::Result<()> {
        let model = ScriptedModel::new(vec![
            Ok("first".to_owned()),
            Ok("second".to_owned()),
            Ok("third".to_owned()),
        ]);
        let samples = vec![0.0; 8];

        let transcripts = transcribe_windows(&model, &windows_of(&samples, 3))?;
        assert_eq!(transcripts, vec!["first", "second", "third"]);
        Ok(())
    }

    #[test]
    fn empty_and_whitespace_results_become_the_sentinel() -> anyhow::Result<()> {
        let model = ScriptedModel::new(vec![
            Ok(String::new()),
            Ok("   ".to_owned()),
            Ok("\n\t".to_owned()),
            Ok("actual speech".to_owned()),
        ]);
        let samples = vec![0.0; 8];

        let transcripts = transcribe_windows(&model, &windows_of(&samples, 4))?;
        assert_eq!(
            transcripts,
            vec![
                NO_SPEECH_SENTINEL,
                NO_SPEECH_SENTINEL,
                NO_SPEECH_SENTINEL,
                "actual speech"
            ]
        );
        Ok(())
    }

    #[test]
    fn inference_failure_aborts_remaining_windows() {
        let model = ScriptedModel::new(vec![
            Ok("fine".to_owned()),
            Err(anyhow::anyhow!("inference blew up")),
            Ok("never reached".to_owned()),
        ]);
        let samples = vec![0.0; 8];

        let err = transcribe_windows(&model, &windows_of(&samples, 3)).unwrap_err();
        assert!(matches!(err, Error::Transcription { window: 1, .. }));
        assert_eq!(model.calls(), 2);
    }
}
