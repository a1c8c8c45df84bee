//! High score persistence
//!
//! The engine only needs a tiny key-value style service: read the best
//! score, and offer a new candidate when a run ends. The file store keeps it
//! in `highscore.toml` under the platform data directory.

use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Shared high score service
pub trait HighScoreStore: Send + Sync {
    /// Current high score, 0 when nothing has been stored
    fn get(&self) -> u64;

    /// Store `candidate` if it beats the current high score.
    /// Returns true iff it was stored.
    fn update(&self, candidate: u64) -> bool {
        if candidate > self.get() {
            self.set(candidate);
            true
        } else {
            false
        }
    }

    /// Overwrite unconditionally
    fn set(&self, value: u64);
}

/// Volatile store, used by tests and when no data dir is available
#[derive(Debug, Default)]
pub struct MemoryHighScores {
    value: Mutex<u64>,
}

impl MemoryHighScores {
    pub fn new(initial: u64) -> Self {
        Self {
            value: Mutex::new(initial),
        }
    }
}

impl HighScoreStore for MemoryHighScores {
    fn get(&self) -> u64 {
        *self.value.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set(&self, value: u64) {
        *self.value.lock().unwrap_or_else(|e| e.into_inner()) = value;
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct HighScoreFile {
    high_score: u64,
}

/// TOML-file backed store
#[derive(Debug)]
pub struct FileHighScores {
    path: PathBuf,
    value: Mutex<u64>,
}

impl FileHighScores {
    /// Get the default file location
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "blockfall", "blockfall")
            .map(|dirs| dirs.data_dir().join("highscore.toml"))
    }

    /// Open the store at the default location
    pub fn open_default() -> Option<Self> {
        Self::default_path().map(Self::open)
    }

    /// Open the store at `path`. A missing or unreadable file reads as 0.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let value = match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<HighScoreFile>(&contents) {
                Ok(file) => file.high_score,
                Err(e) => {
                    tracing::warn!("Ignoring corrupt high score file {}: {}", path.display(), e);
                    0
                }
            },
            Err(_) => 0,
        };
        tracing::debug!(high_score = value, "Loaded high score from {}", path.display());
        Self {
            path,
            value: Mutex::new(value),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, value: u64) -> anyhow::Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create data dir {}", dir.display()))?;
        }
        let contents = toml::to_string_pretty(&HighScoreFile { high_score: value })
            .context("Failed to serialize high score")?;
        fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

impl HighScoreStore for FileHighScores {
    fn get(&self) -> u64 {
        *self.value.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set(&self, value: u64) {
        *self.value.lock().unwrap_or_else(|e| e.into_inner()) = value;
        if let Err(e) = self.persist(value) {
            tracing::warn!("Could not save high score: {:#}", e);
        }
    }
}
