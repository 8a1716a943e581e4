/// Built-in speech models.
pub mod whisper;
