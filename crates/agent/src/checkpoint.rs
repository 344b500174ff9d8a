//! Conversation checkpoints, keyed by thread id.
//!
//! A checkpoint captures everything needed to pick a loop back up: the
//! log, the directive awaiting approval (if any) and the turn counter.
//! Two backends: [`InMemoryCheckpointer`] for tests and short sessions,
//! [`FileCheckpointer`] for one JSON file per thread on disk.

use actloop_core::error::CheckpointError;
use actloop_core::{Directive, Message};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Saved state of one conversation thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub thread_id: String,
    pub messages: Vec<Message>,

    /// Directive paused for approval when the checkpoint was taken
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<Directive>,

    /// Completions requested so far in the run
    #[serde(default)]
    pub turns: u32,

    /// Budget of the run in progress
    #[serde(default)]
    pub max_turns: u32,

    pub created_at: DateTime<Utc>,
}

/// Storage for checkpoints. Putting a thread again overwrites it.
#[async_trait]
pub trait Checkpointer: Send + Sync {
    fn name(&self) -> &str;

    async fn put(&self, checkpoint: Checkpoint) -> Result<(), CheckpointError>;

    async fn get(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointError>;

    /// Stored thread ids, sorted.
    async fn list(&self) -> Result<Vec<String>, CheckpointError>;
}

/// Checkpoints held in a map. Lost when dropped.
#[derive(Default)]
pub struct InMemoryCheckpointer {
    threads: Arc<RwLock<HashMap<String, Checkpoint>>>,
}

impl InMemoryCheckpointer {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Checkpointer for InMemoryCheckpointer {
    fn name(&self) -> &str {
        "memory"
    }

    async fn put(&self, checkpoint: Checkpoint) -> Result<(), CheckpointError> {
        self.threads
            .write()
            .await
            .insert(checkpoint.thread_id.clone(), checkpoint);
        Ok(())
    }

    async fn get(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointError> {
        Ok(self.threads.read().await.get(thread_id).cloned())
    }

    async fn list(&self) -> Result<Vec<String>, CheckpointError> {
        let mut ids: Vec<String> = self.threads.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

/// One `<thread_id>.json` file per thread under a directory.
///
/// The directory is created on first write.
pub struct FileCheckpointer {
    dir: PathBuf,
}

impl FileCheckpointer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, thread_id: &str) -> Result<PathBuf, CheckpointError> {
        validate_thread_id(thread_id)?;
        Ok(self.dir.join(format!("{thread_id}.json")))
    }
}

/// Thread ids become file names, so keep them to a safe alphabet.
fn validate_thread_id(thread_id: &str) -> Result<(), CheckpointError> {
    let valid = !thread_id.is_empty()
        && !thread_id.starts_with('.')
        && thread_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(CheckpointError::Storage(format!(
            "invalid thread id '{thread_id}'"
        )))
    }
}

#[async_trait]
impl Checkpointer for FileCheckpointer {
    fn name(&self) -> &str {
        "file"
    }

    async fn put(&self, checkpoint: Checkpoint) -> Result<(), CheckpointError> {
        let path = self.path_for(&checkpoint.thread_id)?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            CheckpointError::Storage(format!("Failed to create checkpoint directory: {e}"))
        })?;

        let json = serde_json::to_string_pretty(&checkpoint)?;
        tokio::fs::write(&path, json).await.map_err(|e| {
            CheckpointError::Storage(format!("Failed to write {}: {e}", path.display()))
        })?;

        debug!(
            thread_id = %checkpoint.thread_id,
            messages = checkpoint.messages.len(),
            path = %path.display(),
            "Checkpoint saved"
        );
        Ok(())
    }

    async fn get(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointError> {
        let path = self.path_for(thread_id)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CheckpointError::Storage(format!(
                    "Failed to read {}: {e}",
                    path.display()
                )));
            }
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    async fn list(&self) -> Result<Vec<String>, CheckpointError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CheckpointError::Storage(e.to_string())),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CheckpointError::Storage(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) if validate_thread_id(stem).is_ok() => ids.push(stem.to_string()),
                _ => warn!(path = %path.display(), "Skipping unexpected file in checkpoint directory"),
            }
        }
        ids.sort();
        Ok(ids)
    }
}
