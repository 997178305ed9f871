//! File-backed cursor store.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use watermon_core::{Cursor, CursorError};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Cursor file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cursor encoding error: {0}")]
    Encode(#[from] CursorError),
}

/// Persists the poll cursor as JSON.
///
/// Loading never fails: a missing or unreadable file yields the first-run
/// cursor. Saving writes a sibling temp file and renames it over the target,
/// so readers see either the old or the new record.
pub struct CursorStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn read(&self) -> Cursor {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No cursor file, starting fresh");
                return Cursor::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Unreadable cursor file, starting fresh");
                return Cursor::default();
            }
        };

        match Cursor::from_json(&text) {
            Ok(cursor) => cursor,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Corrupt cursor file, starting fresh");
                Cursor::default()
            }
        }
    }

    async fn write(&self, cursor: &Cursor) -> Result<(), StoreError> {
        let json = cursor.to_json()?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, json).await?;
        if let Err(e) = tokio::fs::rename(&temp, &self.path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }
        Ok(())
    }

    /// Current cursor, or the first-run cursor if none is readable.
    pub async fn load(&self) -> Cursor {
        let _guard = self.lock.lock().await;
        self.read().await
    }

    pub async fn save(&self, cursor: &Cursor) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        self.write(cursor).await
    }

    /// Load, modify and save under one lock. Returns the saved cursor.
    pub async fn update<F>(&self, f: F) -> Result<Cursor, StoreError>
    where
        F: FnOnce(&mut Cursor),
    {
        let _guard = self.lock.lock().await;
        let mut cursor = self.read().await;
        f(&mut cursor);
        self.write(&cursor).await?;
        Ok(cursor)
    }
}
