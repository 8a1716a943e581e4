use anyhow::{Context, Result};
use clap::Parser;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use recite::decode::sample_buffer_from_reader;
use recite::{ModelRegistry, Pipeline};

fn main() -> Result<()> {
    recite::logging::init();

    let params = Params::parse();

    let registry = ModelRegistry::whisper(&params.models_dir);
    let pipeline = Pipeline::new(registry);

    let audio = File::open(&params.audio_path)
        .with_context(|| format!("failed to open audio file: {}", params.audio_path.display()))?;
    let buffer = sample_buffer_from_reader(audio)?;

    let outcome = pipeline.transcribe(&buffer)?;

    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    serde_json::to_writer_pretty(&mut writer, &outcome)?;
    writeln!(writer)?;

    Ok(())
}

#[derive(Parser, Debug)]
#[command(name = "recite")]
#[command(about = "Transcribe a recorded answer from the command line")]
struct Params {
    /// Directory holding the GGML model artifacts for all profiles.
    #[arg(short = 'm', long = "models-dir", default_value = "./models")]
    pub models_dir: PathBuf,

    /// Path to the audio file to transcribe.
    #[arg(short = 'a', long = "audio")]
    pub audio_path: PathBuf,
}
