//! `recite` — duration-adaptive transcription for spoken interview answers.
//!
//! This crate provides:
//! - Decoding arbitrary uploads into a normalized mono 16 kHz sample buffer
//! - Duration-based planning (model profile + window count)
//! - Overlapping window extraction
//! - Sequential Whisper transcription with a lazy, per-profile model registry
//! - Assembly of per-window transcripts into one structured outcome
//!
//! The library is designed to be used by both CLI tools and long-running services,
//! with an emphasis on deterministic planning and minimal surprises.

// High-level API (most consumers should start here).
pub mod pipeline;
pub mod registry;

// The normalized audio representation and its producers.
pub mod audio;
pub mod decode;

// Planning and window extraction.
pub mod plan;
pub mod window;

// Model seam and built-in implementations.
pub mod model;
pub mod models;

// Sequential execution and result assembly.
pub mod executor;
pub mod outcome;

// Short-term audio metrics.
pub mod analysis;

// Logging configuration and control.
pub mod logging;

pub mod error;

pub use audio::{SampleBuffer, TARGET_SAMPLE_RATE};
pub use error::{Error, Result};
pub use executor::NO_SPEECH_SENTINEL;
pub use model::SpeechModel;
pub use outcome::TranscriptionOutcome;
pub use pipeline::Pipeline;
pub use plan::{ModelProfile, SegmentationPlan};
pub use registry::ModelRegistry;
