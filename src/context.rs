//! Service context that bundles the capability implementation.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::adapters::live::gemini::GeminiCapability;
use crate::adapters::recording::capability::RecordingCapability;
use crate::adapters::replaying::capability::ReplayingCapability;
use crate::cassette::config::load_cassette;
use crate::cassette::recorder::CassetteRecorder;
use crate::config::{Config, API_KEY_ENV_VARS};
use crate::error::TryOnError;
use crate::ports::Capability;

/// How the capability is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Call the real API.
    Live,
    /// Call the real API and record a cassette.
    Recording,
    /// Serve replies from a cassette file.
    Replaying(PathBuf),
}

impl Mode {
    /// Pick the mode from `TRYON_REPLAY` / `TRYON_REC`.
    #[must_use]
    pub fn from_env() -> Self {
        if let Ok(path) = std::env::var("TRYON_REPLAY") {
            Self::Replaying(PathBuf::from(path))
        } else if std::env::var("TRYON_REC").is_ok_and(|v| v == "true" || v == "1") {
            Self::Recording
        } else {
            Self::Live
        }
    }
}

/// Bundles the capability trait object.
pub struct ServiceContext {
    /// The image service.
    pub capability: Box<dyn Capability>,
}

/// Handle to a recording session that must be finished after use.
pub struct RecordingSession {
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingSession {
    /// Finish the recording and write the cassette file to disk.
    ///
    /// The owning [`ServiceContext`] must be dropped first.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be written.
    pub fn finish(self) -> Result<PathBuf, String> {
        let recorder = Arc::try_unwrap(self.recorder)
            .map_err(|_| "Recording adapter still has references".to_string())?
            .into_inner()
            .map_err(|e| format!("Recorder lock poisoned: {e}"))?;
        debug!(interactions = recorder.interactions().len(), "writing cassette");
        recorder.finish().map_err(|e| format!("Failed to write cassette: {e}"))
    }
}

impl ServiceContext {
    /// Build a context for `mode`. Only recording returns a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing (live/recording) or the
    /// cassette cannot be loaded (replaying).
    pub fn for_mode(
        mode: &Mode,
        config: &Config,
    ) -> Result<(Self, Option<RecordingSession>), TryOnError> {
        match mode {
            Mode::Live => Ok((Self::live(config)?, None)),
            Mode::Recording => {
                let (ctx, session) = Self::recording(config)?;
                Ok((ctx, Some(session)))
            }
            Mode::Replaying(path) => Ok((Self::replaying(path)?, None)),
        }
    }

    /// Create a live context.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is not configured.
    pub fn live(config: &Config) -> Result<Self, TryOnError> {
        let key = config
            .gemini_key()
            .ok_or_else(|| TryOnError::MissingApiKey { env_var: API_KEY_ENV_VARS[0].into() })?;
        Ok(Self { capability: Box::new(GeminiCapability::new(key)) })
    }

    /// Create a recording context that wraps a live adapter with a recorder.
    ///
    /// # Errors
    ///
    /// Returns an error if the live context cannot be created.
    pub fn recording(config: &Config) -> Result<(Self, RecordingSession), TryOnError> {
        let live_ctx = Self::live(config)?;

        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        let path = PathBuf::from(".tryon/cassettes")
            .join(&timestamp)
            .join("capability.cassette.yaml");
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(
            path,
            format!("{timestamp}-capability"),
            get_commit_hash(),
        )));

        let capability = RecordingCapability::new(live_ctx.capability, Arc::clone(&recorder));
        Ok((Self { capability: Box::new(capability) }, RecordingSession { recorder }))
    }

    /// Create a replaying context from a cassette file.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be loaded.
    pub fn replaying(path: &Path) -> Result<Self, TryOnError> {
        let replayer = load_cassette(path)
            .map_err(|e| TryOnError::Config(format!("Failed to load cassette: {e}")))?;
        let capability = ReplayingCapability::new(Arc::new(Mutex::new(replayer)));
        Ok(Self { capability: Box::new(capability) })
    }
}

/// Get the current git commit hash, or "unknown" if unavailable.
fn get_commit_hash() -> String {
    std::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map_or_else(|| "unknown".to_string(), |s| s.trim().to_string())
}
