use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Durable string-keyed storage medium.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// One `<key>.json` file per key inside a data directory.
#[derive(Debug)]
pub struct FileStore {
    pub data_dir: PathBuf,
}

impl FileStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        info!(data_dir = %data_dir.display(), "opened file store");
        Ok(Self { data_dir })
    }

    pub fn path_for(&self, key: &str) -> anyhow::Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(anyhow!("invalid storage key: {key:?}"));
        }
        Ok(self.data_dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    #[tracing::instrument(skip(self))]
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            debug!(file = %path.display(), "storage slot is empty");
            return Ok(None);
        }

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed reading {}", path.display()))?;
        debug!(file = %path.display(), bytes = raw.len(), "read storage slot");
        Ok(Some(raw))
    }

    #[tracing::instrument(skip(self, value), fields(bytes = value.len()))]
    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        let mut temp = NamedTempFile::new_in(&self.data_dir)
            .with_context(|| format!("failed to create temp file in {}", self.data_dir.display()))?;
        temp.write_all(value.as_bytes())?;
        temp.flush()?;

        temp.persist(&path)
            .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

        debug!(file = %path.display(), "wrote storage slot");
        Ok(())
    }
}

/// In-process map; nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: HashMap<String, String>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.slots.insert(key.to_string(), value.to_string());
        self
    }

    /// Number of `set` calls served so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.slots.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }
}
