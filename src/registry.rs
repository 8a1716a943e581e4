//! Lazy, process-lifetime cache of loaded model handles, keyed by profile.
//!
//! Model loading costs seconds and must not happen per request. The registry loads a
//! profile on first use and keeps the handle for the lifetime of the process; nothing
//! is ever evicted or invalidated.
//!
//! Concurrency note: two requests racing on the first use of the same profile may both
//! load it. We tolerate that (the duplicate load is wasted work, the last handle wins)
//! instead of serializing loads behind a per-key lock — handles are stateless for
//! inference once loaded, so this is a known benign race, not a correctness bug.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use crate::error::{Error, Result};
use crate::model::SpeechModel;
use crate::models::whisper::WhisperModel;
use crate::plan::ModelProfile;

type LoadFn = dyn Fn(ModelProfile) -> anyhow::Result<Arc<dyn SpeechModel>> + Send + Sync;

/// Owns loaded model handles and the recipe for producing missing ones.
///
/// The registry is constructed once and injected into the pipeline; it is the only
/// shared state between concurrent requests.
pub struct ModelRegistry {
    loader: Box<LoadFn>,
    loaded: RwLock<HashMap<ModelProfile, Arc<dyn SpeechModel>>>,
}

impl ModelRegistry {
    /// Create a registry with a custom loader.
    ///
    /// The loader runs on first use of each profile. Tests use this to substitute
    /// scripted models; production code normally goes through [`ModelRegistry::whisper`].
    pub fn new(
        loader: impl Fn(ModelProfile) -> anyhow::Result<Arc<dyn SpeechModel>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            loader: Box::new(loader),
            loaded: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry that loads whisper.cpp GGML models from `models_dir`,
    /// resolving each profile to its artifact file name.
    pub fn whisper(models_dir: impl Into<PathBuf>) -> Self {
        let models_dir = models_dir.into();
        Self::new(move |profile| {
            let path = models_dir.join(profile.model_filename());
            info!(%profile, path = %path.display(), "loading whisper model");
            let model = WhisperModel::load(&path)?;
            Ok(Arc::new(model) as Arc<dyn SpeechModel>)
        })
    }

    /// Return the cached handle for `profile`, loading it on first use.
    ///
    /// A load failure surfaces as [`Error::ModelLoad`] for this call only; the
    /// registry stays usable and other profiles are unaffected.
    pub fn get(&self, profile: ModelProfile) -> Result<Arc<dyn SpeechModel>> {
        {
            let loaded = self.loaded.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(model) = loaded.get(&profile) {
                return Ok(Arc::clone(model));
            }
        }

        // Loading happens outside the lock so a slow load of one profile doesn't block
        // lookups of already-loaded ones. Racing first-users may each reach here.
        let model = (self.loader)(profile).map_err(|err| Error::model_load(profile, err))?;

        self.loaded
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(profile, Arc::clone(&model));

        Ok(model)
    }

    /// Whether `profile` has already been loaded into the cache.
    pub fn is_loaded(&self, profile: ModelProfile) -> bool {
        self.loaded
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&profile)
    }
}
