//! Assembly of per-window transcripts into the value returned to callers.

use serde::Serialize;

use crate::executor::NO_SPEECH_SENTINEL;

/// The assembled result of one pipeline invocation, immutable after assembly.
///
/// Serialized field names are the wire contract consumed downstream (transcript
/// cleanup, scoring, HTTP serialization). Callers append derived fields of their own
/// (e.g. rounded audio duration) before responding to a client.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptionOutcome {
    /// One transcript per window, in window order. Never contains an empty string.
    pub transcriptions: Vec<String>,

    /// Identifier of the model profile that produced the transcripts.
    pub model_used: String,

    /// How many windows the audio was cut into.
    pub segments_used: usize,
}

impl TranscriptionOutcome {
    /// Whether every window came back as the no-speech sentinel.
    ///
    /// Still a valid outcome — the caller or observability layer may choose to warn.
    pub fn is_all_silence(&self) -> bool {
        self.transcriptions
            .iter()
            .all(|t| t == NO_SPEECH_SENTINEL)
    }
}

/// Package per-window transcripts plus metadata. Pure aggregation: text content is
/// not transformed here (merging overlapping transcripts is downstream's job).
pub fn assemble(
    transcriptions: Vec<String>,
    model_used: &str,
    segments_used: usize,
) -> TranscriptionOutcome {
    debug_assert_eq!(transcriptions.len(), segments_used);

    TranscriptionOutcome {
        transcriptions,
        model_used: model_used.to_owned(),
        segments_used,
    }
}
