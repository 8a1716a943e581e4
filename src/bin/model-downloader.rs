// A small CLI utility to download the Whisper GGML models recite's planner can
// select into a target directory.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use reqwest::blocking::Client;

#[derive(Parser, Debug)]
#[command(name = "model-downloader")]
#[command(about = "Download the Whisper models used by recite", long_about = None)]
struct Args {
    /// List supported model names and exit.
    #[arg(long)]
    list: bool,

    /// Download every model the planner can select.
    #[arg(long)]
    all: bool,

    /// Model name (tiny.en or base.en).
    ///
    /// We intentionally keep an allowlist of known-good model artifacts.
    #[arg(long, required_unless_present_any = ["list", "all"])]
    name: Option<String>,

    /// Target directory to store models (created if missing).
    #[arg(long, default_value = "./models")]
    dir: PathBuf,
}

/// Download source for a known model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ModelSpec {
    /// Friendly name users type (and the planner reports), e.g. "base.en".
    name: &'static str,

    /// Filename written to disk (e.g. "ggml-base.en.bin").
    filename: &'static str,

    /// Full download URL.
    url: &'static str,
}

// -----------------------------------------------------------------------------
// Whisper models (allowlist)
//
// These URLs match whisper.cpp's standard Hugging Face repo for GGML models.
// Only the two profiles the segmentation planner selects between are listed.
// -----------------------------------------------------------------------------
static WHISPER_MODELS: &[ModelSpec] = &[
    ModelSpec {
        name: "tiny.en",
        filename: "ggml-tiny.en.bin",
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-tiny.en.bin",
    },
    ModelSpec {
        name: "base.en",
        filename: "ggml-base.en.bin",
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-base.en.bin",
    },
];

fn main() -> Result<()> {
    let args = Args::parse();

    if args.list {
        print_model_list();
        return Ok(());
    }

    fs::create_dir_all(&args.dir)
        .with_context(|| format!("failed to create target dir: {}", args.dir.display()))?;

    let specs: Vec<&'static ModelSpec> = if args.all {
        WHISPER_MODELS.iter().collect()
    } else {
        let name = args.name.as_deref().expect("clap should require --name");
        let spec = lookup_model(name).with_context(|| {
            format!("unknown model '{name}'. Run with --list to see supported models.")
        })?;
        vec![spec]
    };

    let client = Client::builder()
        .user_agent("recite-model-downloader")
        .build()
        .context("failed to build HTTP client")?;

    for spec in specs {
        let dest_path = args.dir.join(spec.filename);

        if dest_path.exists() {
            println!("✅ already exists: {}", dest_path.display());
            continue;
        }

        println!("⬇️  downloading {}", spec.filename);
        println!("    {}", spec.url);

        download_to_path(&client, spec.url, &dest_path)?;

        println!("✅ saved: {}", dest_path.display());
    }

    Ok(())
}

fn lookup_model(name: &str) -> Option<&'static ModelSpec> {
    WHISPER_MODELS.iter().find(|m| m.name == name)
}

fn print_model_list() {
    print!("{}", model_list_string());
}

fn model_list_string() -> String {
    let mut out = String::new();

    out.push_str("Whisper models:\n");
    for m in WHISPER_MODELS {
        out.push_str("  - ");
        out.push_str(m.name);
        out.push('\n');
    }

    out
}

/// Download a URL into `dest_path` safely:
/// - download to `dest_path.part`
/// - fsync + rename to final path
fn download_to_path(client: &Client, url: &str, dest_path: &Path) -> Result<()> {
    let resp = client
        .get(url)
        .send()
        .with_context(|| format!("request failed: {url}"))?
        .error_for_status()
        .with_context(|| format!("download failed (bad status): {url}"))?;

    let total = resp.content_length();
    download_to_path_with_reader(resp, total, dest_path)
}

fn download_to_path_with_reader<R: Read>(
    mut reader: R,
    total_bytes: Option<u64>,
    dest_path: &Path,
) -> Result<()> {
    let total = total_bytes.unwrap_or(0);

    let pb = if total > 0 {
        ProgressBar::new(total)
    } else {
        ProgressBar::new_spinner()
    };

    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} {bytes}/{total_bytes} {bar:40.cyan/blue} {eta}",
        )
        .unwrap()
        .progress_chars("#>-"),
    );

    let tmp_path = PathBuf::from(format!("{}.part", dest_path.display()));

    let result = (|| -> Result<()> {
        let mut file = fs::File::create(&tmp_path)
            .with_context(|| format!("failed to create temp file: {}", tmp_path.display()))?;

        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n])?;
            pb.inc(n as u64);
        }

        file.sync_all()?;
        pb.finish_and_clear();

        fs::rename(&tmp_path, dest_path)
            .with_context(|| format!("failed to move into place: {}", dest_path.display()))?;

        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
        pb.finish_and_clear();
    }

    result
}
