//! Append-only record of captured simulation attempts.
//!
//! Every record goes to an in-memory list (cheap "recent N" reads for the
//! running process) and to a durable store that survives restarts. The
//! shipped store is a JSON-lines file: one serialized [`AttemptRecord`] per line.
//!
//! Records carry only the length of the submitted password, never its value.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, AsyncWriteExt, BufReader, SeekFrom};
use tokio::sync::{Mutex, RwLock};

#[derive(Debug, Error)]
pub enum LogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Malformed store record at line {line}: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// One captured submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub timestamp: DateTime<Utc>,
    pub source_address: String,
    /// Submitted email, kept for correlation only.
    pub subject_identifier: String,
    pub secret_length: usize,
    /// Client-supplied user agent. Untrusted.
    pub client_descriptor: String,
    pub outcome: bool,
    /// Simulation session the attempt belongs to.
    pub correlation_id: String,
}

/// Length of a submitted secret in characters.
pub fn secret_length(secret: &str) -> usize {
    secret.chars().count()
}

/// Durable backend for attempt records.
#[async_trait]
pub trait AttemptStore: Send + Sync + 'static {
    /// Append one record. Must not leave a partial record behind for readers.
    async fn append(&self, record: &AttemptRecord) -> Result<(), LogError>;

    /// The last `n` readable records, oldest first.
    async fn recent(&self, n: usize) -> Result<Vec<AttemptRecord>, LogError>;

    /// Prepares the backing storage so it can be read before the first append.
    async fn ensure_ready(&self) -> Result<(), LogError> {
        Ok(())
    }
}

/// Newline-delimited JSON file store.
pub struct JsonLinesStore {
    path: PathBuf,
    // Serializes writers so lines never interleave.
    write_lock: Mutex<()>,
}

impl JsonLinesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the store file (and parent directories) if absent.
    pub async fn ensure_exists(&self) -> Result<(), LogError> {
        let _guard = self.write_lock.lock().await;
        self.create_parent().await?;
        OpenOptions::new().create(true).append(true).open(&self.path).await?;
        Ok(())
    }

    async fn create_parent(&self) -> Result<(), LogError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl AttemptStore for JsonLinesStore {
    async fn append(&self, record: &AttemptRecord) -> Result<(), LogError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        self.create_parent().await?;
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .await?;
        // A torn last line from an earlier crash stays on its own line.
        if ends_mid_line(&mut file).await? {
            line.insert(0, '\n');
        }
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn recent(&self, n: usize) -> Result<Vec<AttemptRecord>, LogError> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let file = match fs::File::open(&self.path).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut reader = BufReader::new(file);
        let mut tail: VecDeque<AttemptRecord> = VecDeque::with_capacity(n.min(1024));
        let mut buf = Vec::new();
        let mut line_no = 0;
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            line_no += 1;
            if buf.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            match parse_line(&buf, line_no) {
                Ok(record) => {
                    if tail.len() == n {
                        tail.pop_front();
                    }
                    tail.push_back(record);
                }
                Err(e) => tracing::warn!(path = %self.path.display(), "Skipping record: {}", e),
            }
        }
        Ok(tail.into())
    }

    async fn ensure_ready(&self) -> Result<(), LogError> {
        self.ensure_exists().await
    }
}

async fn ends_mid_line(file: &mut fs::File) -> Result<bool, LogError> {
    let len = file.metadata().await?.len();
    if len == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::Start(len - 1)).await?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last).await?;
    Ok(last[0] != b'\n')
}

fn parse_line(bytes: &[u8], line: usize) -> Result<AttemptRecord, LogError> {
    serde_json::from_slice(bytes).map_err(|source| LogError::Malformed { line, source })
}

/// In-memory list plus durable store, safe to share across request handlers.
pub struct AttemptLogger {
    entries: RwLock<Vec<AttemptRecord>>,
    store: Box<dyn AttemptStore>,
}

impl AttemptLogger {
    pub fn new(store: Box<dyn AttemptStore>) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            store,
        }
    }

    /// Logger backed by a JSON-lines file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(Box::new(JsonLinesStore::new(path)))
    }

    /// Records an attempt in memory, then in the durable store.
    ///
    /// The in-memory append always happens. A durable failure is reported
    /// but callers are expected to carry on.
    pub async fn append(&self, record: AttemptRecord) -> Result<(), LogError> {
        self.entries.write().await.push(record.clone());

        if let Err(e) = self.store.append(&record).await {
            tracing::error!(address = %record.source_address, "Error logging attempt: {}", e);
            return Err(e);
        }
        tracing::info!(
            address = %record.source_address,
            session = %record.correlation_id,
            "Logged simulation attempt"
        );
        Ok(())
    }

    /// Creates the durable store if it does not exist yet.
    pub async fn ensure_store(&self) -> Result<(), LogError> {
        self.store.ensure_ready().await
    }

    /// The last `n` in-memory records in insertion order.
    pub async fn recent(&self, n: usize) -> Vec<AttemptRecord> {
        let entries = self.entries.read().await;
        let start = entries.len().saturating_sub(n);
        entries[start..].to_vec()
    }

    /// The last `n` records from the durable store in file order.
    pub async fn recent_from_store(&self, n: usize) -> Result<Vec<AttemptRecord>, LogError> {
        self.store.recent(n).await
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
