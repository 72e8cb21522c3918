//! JSON-lines prediction store
//!
//! Records are appended one per line and replayed into an in-memory index
//! when the store is opened. Unreadable lines are skipped with a warning
//! so a torn final write does not lose the rest of the log.

use super::memory::MemoryStore;
use super::{async_trait, LookupKey, PredictionRecord, PredictionStore, StoreError, StoreId};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub struct FileStore {
    path: PathBuf,
    log: Mutex<LogWriter>,
    index: MemoryStore,
}

/// Append handle that keeps the log made of whole lines
struct LogWriter {
    file: File,
    /// Length of the log up to the last complete entry
    committed: u64,
    /// Trailing bytes past `committed` could not be removed
    torn: bool,
}

impl LogWriter {
    async fn new(mut file: File, needs_newline: bool) -> Result<Self, StoreError> {
        if needs_newline {
            // terminate a torn final line before appending
            file.write_all(b"\n").await?;
            file.flush().await?;
        }
        let committed = file.metadata().await?.len();
        Ok(Self {
            file,
            committed,
            torn: false,
        })
    }

    /// Write one serialized entry, removing any partial bytes on failure
    async fn append(&mut self, line: &[u8]) -> Result<(), StoreError> {
        let mut buf = Vec::with_capacity(line.len() + 1);
        if self.torn {
            buf.push(b'\n');
        }
        buf.extend_from_slice(line);

        if let Err(e) = self.write(&buf).await {
            self.roll_back().await;
            return Err(e.into());
        }

        if self.torn {
            self.committed = self.file.metadata().await?.len();
            self.torn = false;
        } else {
            self.committed += buf.len() as u64;
        }
        Ok(())
    }

    async fn write(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.file.write_all(buf).await?;
        self.file.flush().await
    }

    async fn roll_back(&mut self) {
        if let Err(e) = self.file.set_len(self.committed).await {
            warn!(
                error = %e,
                committed = self.committed,
                "Could not truncate partial prediction log entry"
            );
            self.torn = true;
        }
    }
}

impl FileStore {
    /// Open or create the log at `path` and replay existing records
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let index = MemoryStore::new();
        let mut skipped = 0usize;
        let mut needs_newline = false;
        match fs::read_to_string(&path).await {
            Ok(contents) => {
                needs_newline = !contents.is_empty() && !contents.ends_with('\n');
                for (lineno, line) in contents.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let replayed = serde_json::from_str::<PredictionRecord>(line)
                        .map_err(StoreError::from)
                        .and_then(|record| index.insert_record(record));
                    if let Err(e) = replayed {
                        skipped += 1;
                        warn!(
                            path = %path.display(),
                            line = lineno + 1,
                            error = %e,
                            "Skipping unreadable prediction log entry"
                        );
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        let log = LogWriter::new(file, needs_newline).await?;

        info!(
            path = %path.display(),
            entries = index.len(),
            skipped,
            "Opened prediction log"
        );

        Ok(Self {
            path,
            log: Mutex::new(log),
            index,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[async_trait]
impl PredictionStore for FileStore {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        // the prediction_id index is rebuilt on open
        Ok(())
    }

    async fn insert(&self, record: PredictionRecord) -> Result<StoreId, StoreError> {
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        // held across check, write and index so duplicates cannot interleave
        let mut log = self.log.lock().await;
        if self.index.contains_prediction_id(&record.prediction_id) {
            return Err(StoreError::Duplicate(record.prediction_id));
        }
        log.append(&line).await?;
        self.index.insert_record(record)
    }

    async fn find(&self, key: &LookupKey) -> Result<Option<PredictionRecord>, StoreError> {
        Ok(self.index.get(key))
    }

    async fn recent(&self, limit: usize) -> Result<Vec<PredictionRecord>, StoreError> {
        Ok(self.index.newest(limit))
    }
}
