use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnResponse, TraceLayer};
use tracing::{Level, error, info};

mod metrics;

use recite::{ModelProfile, ModelRegistry, Pipeline, TranscriptionOutcome, decode};

/// Uploads smaller than this cannot hold a usable recording.
const MIN_UPLOAD_BYTES: usize = 1000;

/// Recordings shorter than this are rejected before transcription.
const MIN_DURATION_SECONDS: f64 = 0.5;

#[derive(Parser, Debug)]
#[command(name = "recite-server")]
#[command(about = "HTTP server for interview answer transcription")]
struct Params {
    /// Directory holding the GGML model artifacts for all profiles.
    #[arg(short = 'm', long = "models-dir", default_value = "./models")]
    models_dir: PathBuf,

    /// Host interface to bind to.
    #[arg(long = "host", default_value = "127.0.0.1")]
    host: String,

    /// TCP port to listen on.
    #[arg(long = "port", default_value_t = 8080)]
    port: u16,

    /// Maximum request body size (bytes).
    #[arg(long = "max-bytes", default_value_t = 25 * 1024 * 1024)]
    max_bytes: usize,
}

#[derive(Clone)]
struct AppState {
    pipeline: Arc<Pipeline>,
    models_dir: String,
}

#[derive(Debug, Serialize)]
struct TranscribeResponse {
    #[serde(flatten)]
    outcome: TranscriptionOutcome,

    /// Derived field appended for the client; the pipeline itself does not report it.
    audio_duration_seconds: f64,
}

#[derive(Debug, Serialize)]
struct ProfileInfo {
    profile: &'static str,
    model_filename: &'static str,
    loaded: bool,
}

#[derive(Debug, Serialize)]
struct ModelsResponse {
    profiles: Vec<ProfileInfo>,
    models_dir: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<recite::Error> for AppError {
    fn from(err: recite::Error) -> Self {
        if err.is_invalid_input() {
            return Self::bad_request(err.to_string());
        }
        error!(error = %err, "transcription pipeline failed");
        Self::internal(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

#[tokio::main]
async fn main() {
    recite::logging::init();

    if let Err(err) = run().await {
        error!(error = ?err, "recite-server failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let params = Params::parse();

    metrics::init();

    let addr: SocketAddr = format!("{}:{}", params.host, params.port)
        .parse()
        .context("invalid host/port bind address")?;

    let models_dir = params.models_dir.display().to_string();
    let registry = ModelRegistry::whisper(&params.models_dir);
    let state = AppState {
        pipeline: Arc::new(Pipeline::new(registry)),
        models_dir,
    };

    let app = Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics::prometheus_metrics))
        .route("/v1/models", get(models))
        .route("/v1/transcribe", post(transcribe))
        .route_layer(from_fn(metrics::track_http_metrics))
        .with_state(state)
        .layer(DefaultBodyLimit::max(params.max_bytes))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_response(DefaultOnResponse::new().level(Level::INFO))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        );

    let listener = TcpListener::bind(addr).await.context("bind failed")?;
    info!(%addr, "listening");
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

async fn root() -> &'static str {
    "recite-server: POST /v1/transcribe (multipart field: answer)"
}

async fn healthz() -> &'static str {
    "ok"
}

async fn models(State(state): State<AppState>) -> Json<ModelsResponse> {
    let profiles = ModelProfile::all()
        .iter()
        .map(|profile| ProfileInfo {
            profile: profile.identifier(),
            model_filename: profile.model_filename(),
            loaded: state.pipeline.registry().is_loaded(*profile),
        })
        .collect();

    Json(ModelsResponse {
        profiles,
        models_dir: state.models_dir.clone(),
    })
}

async fn transcribe(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> std::result::Result<Json<TranscribeResponse>, AppError> {
    let content = read_answer_field(&mut multipart).await?;

    if content.len() < MIN_UPLOAD_BYTES {
        return Err(AppError::bad_request(format!(
            "audio file is too small ({} bytes); upload a valid recording",
            content.len()
        )));
    }

    let pipeline = Arc::clone(&state.pipeline);
    let started = Instant::now();

    // Decoding and inference are synchronous, potentially slow work; keep them off the
    // async runtime threads.
    let result = tokio::task::spawn_blocking(move || transcribe_blocking(&pipeline, content))
        .await
        .map_err(|err| AppError::internal(format!("transcription task failed: {err}")))?;

    let (outcome, duration_seconds) = result.map_err(AppError::from)?;
    metrics::observe_transcription(&outcome.model_used, started.elapsed().as_secs_f64());

    Ok(Json(TranscribeResponse {
        outcome,
        audio_duration_seconds: round2(duration_seconds),
    }))
}

fn transcribe_blocking(
    pipeline: &Pipeline,
    content: Vec<u8>,
) -> recite::Result<(TranscriptionOutcome, f64)> {
    let buffer = decode::sample_buffer_from_bytes(content)?;

    let duration_seconds = buffer.duration_seconds();
    if duration_seconds < MIN_DURATION_SECONDS {
        return Err(recite::Error::InvalidInput(format!(
            "audio duration too short ({duration_seconds:.2}s); upload a valid recording"
        )));
    }

    let outcome = pipeline.transcribe(&buffer)?;
    Ok((outcome, duration_seconds))
}

async fn read_answer_field(multipart: &mut Multipart) -> std::result::Result<Vec<u8>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(format!("malformed multipart body: {err}")))?
    {
        if field.name() == Some("answer") {
            let bytes = field
                .bytes()
                .await
                .map_err(|err| AppError::bad_request(format!("failed to read upload: {err}")))?;
            return Ok(bytes.to_vec());
        }
    }

    Err(AppError::bad_request(
        "multipart form must include an 'answer' file field",
    ))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
