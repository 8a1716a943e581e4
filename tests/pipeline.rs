//! End-to-end pipeline behavior with scripted models, so nothing here needs GGML
//! files or a network connection.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use recite::{
    ModelProfile, ModelRegistry, NO_SPEECH_SENTINEL, Pipeline, SampleBuffer, SpeechModel,
    TARGET_SAMPLE_RATE,
};

/// A model that answers every window with a fixed text and records the length of
/// each window it was handed.
#[derive(Debug)]
struct RecordingModel {
    reply: String,
    window_lens: Mutex<Vec<usize>>,
}

impl RecordingModel {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_owned(),
            window_lens: Mutex::new(Vec::new()),
        })
    }

    fn window_lens(&self) -> Vec<usize> {
        self.window_lens.lock().expect("window lens lock").clone()
    }
}

impl SpeechModel for RecordingModel {
    fn transcribe(&self, samples: &[f32]) -> anyhow::Result<String> {
        self.window_lens
            .lock()
            .expect("window lens lock")
            .push(samples.len());
        Ok(self.reply.clone())
    }
}

fn pipeline_with(model: Arc<RecordingModel>) -> Pipeline {
    Pipeline::new(ModelRegistry::new(move |_| {
        Ok(Arc::clone(&model) as Arc<dyn SpeechModel>)
    }))
}

fn buffer_of_seconds(seconds: usize) -> SampleBuffer {
    SampleBuffer::new(
        vec![0.1; seconds * TARGET_SAMPLE_RATE as usize],
        TARGET_SAMPLE_RATE,
    )
    .expect("valid sample rate")
}

#[test]
fn thirty_second_answer_gets_one_accurate_pass() -> anyhow::Result<()> {
    let model = RecordingModel::new("the whole answer");
    let pipeline = pipeline_with(Arc::clone(&model));

    let buffer = buffer_of_seconds(30);
    let outcome = pipeline.transcribe(&buffer)?;

    assert_eq!(outcome.model_used, "base.en");
    assert_eq!(outcome.segments_used, 1);
    assert_eq!(outcome.transcriptions, vec!["the whole answer"]);

    // The single window is the full buffer.
    assert_eq!(model.window_lens(), vec![buffer.len()]);
    Ok(())
}

#[test]
fn ninety_second_answer_is_cut_into_two_overlapping_windows() -> anyhow::Result<()> {
    let model = RecordingModel::new("part of the answer");
    let pipeline = pipeline_with(Arc::clone(&model));

    // 1,440,000 samples at 16 kHz: base_len = 720,000, overlap = 16,000.
    let buffer = buffer_of_seconds(90);
    let outcome = pipeline.transcribe(&buffer)?;

    assert_eq!(outcome.model_used, "base.en");
    assert_eq!(outcome.segments_used, 2);
    assert_eq!(outcome.transcriptions.len(), 2);

    // Window 0 = [0, 736,000), window 1 = [704,000, 1,440,000).
    assert_eq!(model.window_lens(), vec![736_000, 736_000]);
    Ok(())
}

#[test]
fn long_answer_gets_five_fast_windows_covering_the_buffer() -> anyhow::Result<()> {
    let model = RecordingModel::new("a long ramble");
    let pipeline = pipeline_with(Arc::clone(&model));

    // 400s: base_len = 1,280,000, overlap = 16,000. Interior windows carry overlap on
    // both sides; the edge windows only on one.
    let buffer = buffer_of_seconds(400);
    let outcome = pipeline.transcribe(&buffer)?;

    assert_eq!(outcome.model_used, "tiny.en");
    assert_eq!(outcome.segments_used, 5);
    assert_eq!(
        model.window_lens(),
        vec![1_296_000, 1_312_000, 1_312_000, 1_312_000, 1_296_000]
    );

    // Stripping the overlaps, the windows tile the whole buffer: total length equals
    // the buffer plus two overlaps per internal boundary.
    let total: usize = model.window_lens().iter().sum();
    assert_eq!(total, buffer.len() + 4 * 2 * 16_000);
    Ok(())
}

#[test]
fn silent_answer_yields_sentinels_not_errors() -> anyhow::Result<()> {
    let model = RecordingModel::new("   ");
    let pipeline = pipeline_with(model);

    let outcome = pipeline.transcribe(&buffer_of_seconds(400))?;

    assert_eq!(outcome.segments_used, 5);
    assert_eq!(outcome.transcriptions, vec![NO_SPEECH_SENTINEL; 5]);
    assert!(outcome.is_all_silence());
    Ok(())
}

#[test]
fn empty_buffer_still_produces_a_sentinel_outcome() -> anyhow::Result<()> {
    let model = RecordingModel::new("");
    let pipeline = pipeline_with(model);

    let buffer = SampleBuffer::new(Vec::new(), TARGET_SAMPLE_RATE)?;
    let outcome = pipeline.transcribe(&buffer)?;

    assert_eq!(outcome.segments_used, 1);
    assert_eq!(outcome.transcriptions, vec![NO_SPEECH_SENTINEL]);
    Ok(())
}

#[test]
fn model_is_loaded_once_across_requests() -> anyhow::Result<()> {
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&loads);
    let pipeline = Pipeline::new(ModelRegistry::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(RecordingModel::new("words") as Arc<dyn SpeechModel>)
    }));

    let buffer = buffer_of_seconds(30);
    pipeline.transcribe(&buffer)?;
    pipeline.transcribe(&buffer)?;
    pipeline.transcribe(&buffer)?;

    assert_eq!(loads.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn failed_profile_load_leaves_other_profiles_usable() -> anyhow::Result<()> {
    let pipeline = Pipeline::new(ModelRegistry::new(|profile| match profile {
        ModelProfile::Fast => anyhow::bail!("artifact missing"),
        ModelProfile::Accurate => Ok(RecordingModel::new("short answer") as Arc<dyn SpeechModel>),
    }));

    // 400s selects the Fast profile, whose load fails.
    let err = pipeline.transcribe(&buffer_of_seconds(400)).unwrap_err();
    assert!(matches!(
        err,
        recite::Error::ModelLoad {
            profile: ModelProfile::Fast,
            ..
        }
    ));

    // A short answer selects Accurate and succeeds independently.
    let outcome = pipeline.transcribe(&buffer_of_seconds(30))?;
    assert_eq!(outcome.transcriptions, vec!["short answer"]);
    Ok(())
}

#[test]
fn window_failure_fails_the_whole_request() {
    #[derive(Debug)]
    struct FailsOnSecondWindow {
        calls: AtomicUsize,
    }

    impl SpeechModel for FailsOnSecondWindow {
        fn transcribe(&self, _samples: &[f32]) -> anyhow::Result<String> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 1 {
                anyhow::bail!("inference failed");
            }
            Ok("ok".to_owned())
        }
    }

    let pipeline = Pipeline::new(ModelRegistry::new(|_| {
        Ok(Arc::new(FailsOnSecondWindow {
            calls: AtomicUsize::new(0),
        }) as Arc<dyn SpeechModel>)
    }));

    let err = pipeline.transcribe(&buffer_of_seconds(90)).unwrap_err();
    assert!(matches!(
        err,
        recite::Error::Transcription { window: 1, .. }
    ));
}
