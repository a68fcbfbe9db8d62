//! Audit sink trait and implementations.
//!
//! A sink failure must never block or change a decision. `append` is
//! therefore infallible from the caller's side: implementations that
//! cannot persist log the problem and drop the entry.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::entry::AuditEntry;
use crate::error::AuditResult;

/// Destination for audit entries.
pub trait AuditSink: Send + Sync {
    /// Record one entry. Failures are swallowed and logged, never
    /// surfaced to the decision path.
    fn append(&self, entry: &AuditEntry);
}

struct JsonlInner {
    file: File,
    written: u64,
}

/// Append-only JSON-lines sink with size-capped rotation.
///
/// When the active file would exceed the cap, it is renamed to
/// `<path>.1` (replacing any previous rotation) and a fresh file is
/// started. One rotation generation is kept.
pub struct JsonlAuditSink {
    path: PathBuf,
    max_bytes: u64,
    inner: Mutex<JsonlInner>,
}

impl JsonlAuditSink {
    /// Default rotation cap: 16 MiB.
    pub const DEFAULT_MAX_BYTES: u64 = 16 * 1024 * 1024;

    /// Open (or create) the sink at `path` with the default cap.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened for append.
    pub fn open(path: impl AsRef<Path>) -> AuditResult<Self> {
        Self::with_max_bytes(path, Self::DEFAULT_MAX_BYTES)
    }

    /// Open (or create) the sink at `path` with an explicit cap.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened for append.
    pub fn with_max_bytes(path: impl AsRef<Path>, max_bytes: u64) -> AuditResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = Self::open_append(&path)?;
        let written = file.metadata().map(|m| m.len()).unwrap_or(0);
        Ok(Self {
            path,
            max_bytes,
            inner: Mutex::new(JsonlInner { file, written }),
        })
    }

    fn open_append(path: &Path) -> AuditResult<File> {
        Ok(OpenOptions::new().create(true).append(true).open(path)?)
    }

    fn rotated_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".1");
        PathBuf::from(name)
    }

    fn write_entry(&self, entry: &AuditEntry) -> AuditResult<()> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if inner.written.saturating_add(line.len() as u64) > self.max_bytes && inner.written > 0 {
            std::fs::rename(&self.path, self.rotated_path())?;
            inner.file = Self::open_append(&self.path)?;
            inner.written = 0;
        }

        inner.file.write_all(&line)?;
        inner.written = inner.written.saturating_add(line.len() as u64);
        Ok(())
    }
}

impl AuditSink for JsonlAuditSink {
    fn append(&self, entry: &AuditEntry) {
        if let Err(error) = self.write_entry(entry) {
            tracing::warn!(
                entry_id = %entry.id,
                %error,
                "failed to persist audit entry; decision path continues"
            );
        }
    }
}

impl std::fmt::Debug for JsonlAuditSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlAuditSink")
            .field("path", &self.path)
            .field("max_bytes", &self.max_bytes)
            .finish_non_exhaustive()
    }
}

/// In-memory sink for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every entry appended so far, in order.
    #[must_use]
    pub fn entries(&self) -> Vec<AuditEntry> {
        match self.entries.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of entries appended so far.
    #[must_use]
    pub fn len(&self) -> usize {
        match self.entries.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// Whether the sink is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemoryAuditSink {
    fn append(&self, entry: &AuditEntry) {
        match self.entries.lock() {
            Ok(mut guard) => guard.push(entry.clone()),
            Err(poisoned) => poisoned.into_inner().push(entry.clone()),
        }
    }
}
