use crate::domain::early_access::EarlyAccessEntry;
use crate::domain::ports::EntryRepository;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Stores the early-access list as a single JSON array on disk.
///
/// A missing file reads as an empty list. Writes go to a uniquely named
/// temporary file in the same directory which is then renamed over the target,
/// so readers only ever see a complete array.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_entries(path: &Path) -> Result<Vec<EarlyAccessEntry>> {
    match std::fs::read_to_string(path) {
        Ok(raw) if raw.trim().is_empty() => Ok(Vec::new()),
        Ok(raw) => Ok(serde_json::from_str(&raw)?),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

fn write_atomic(path: &Path, entries: &[EarlyAccessEntry]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;

    let mut temp_file = tempfile::Builder::new()
        .prefix(".early-access.")
        .suffix(".tmp")
        .tempfile_in(parent)?;

    serde_json::to_writer_pretty(&mut temp_file, entries)?;
    temp_file.write_all(b"\n")?;
    temp_file.as_file().sync_all()?;

    temp_file.persist(path).map_err(|e| AppError::Storage(e.error))?;
    Ok(())
}

#[async_trait]
impl EntryRepository for JsonFileRepository {
    async fn load(&self) -> Result<Vec<EarlyAccessEntry>> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_entries(&path))
            .await
            .map_err(|e| AppError::Internal(format!("load task failed: {e}")))?
    }

    async fn replace(&self, entries: &[EarlyAccessEntry]) -> Result<()> {
        let path = self.path.clone();
        let entries = entries.to_vec();
        tokio::task::spawn_blocking(move || write_atomic(&path, &entries))
            .await
            .map_err(|e| AppError::Internal(format!("write task failed: {e}")))?
    }
}
