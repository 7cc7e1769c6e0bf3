use super::{CacheBackend, CacheEntry, CacheKey, CacheStore, Clock, SystemClock};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, warn};

const EXTENSION: &str = "json";

/// Longest file stem written to disk. Keys above this are shortened to a
/// prefix plus a digest, keeping temp names well under the 255-byte limit.
const MAX_STEM_LEN: usize = 128;
/// Prefix kept before the 64-char digest: `63 + '_' + 64 == MAX_STEM_LEN`.
const STEM_PREFIX_LEN: usize = MAX_STEM_LEN - 65;

/// File stem for `key`: the key itself when short enough, otherwise
/// `{prefix}_{sha256 hex}` so long keys stay distinct.
fn file_stem(key: &CacheKey) -> String {
    let key = key.as_str();
    if key.len() <= MAX_STEM_LEN {
        return key.to_string();
    }
    let digest = Sha256::digest(key.as_bytes());
    // Sanitized keys are ASCII, so any byte index is a char boundary.
    format!("{}_{}", &key[..STEM_PREFIX_LEN], hex::encode(digest))
}

/// On-disk layout of one entry. Field names are the compatibility contract.
#[derive(Serialize, Deserialize)]
struct Envelope {
    timestamp: i64,
    data: Value,
}

enum ReadOutcome {
    Missing,
    Corrupt(String),
    Found(CacheEntry),
}

/// Durable store: one JSON file per key under a single directory.
pub struct DiskStore {
    dir: PathBuf,
    clock: Arc<dyn Clock>,
    tmp_counter: AtomicU64,
}

impl DiskStore {
    /// Opens (creating if needed) the cache directory.
    pub async fn open(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            clock: Arc::new(SystemClock),
            tmp_counter: AtomicU64::new(0),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.{}", file_stem(key), EXTENSION))
    }

    async fn read_entry(path: &Path) -> ReadOutcome {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return ReadOutcome::Missing,
            Err(e) => return ReadOutcome::Corrupt(e.to_string()),
        };
        match serde_json::from_slice::<Envelope>(&bytes) {
            Ok(envelope) => ReadOutcome::Found(CacheEntry::new(envelope.data, envelope.timestamp)),
            Err(e) => ReadOutcome::Corrupt(e.to_string()),
        }
    }

    async fn write_entry(&self, key: &CacheKey, entry: &CacheEntry) -> anyhow::Result<()> {
        let envelope = Envelope {
            timestamp: entry.stored_at,
            data: entry.value.clone(),
        };
        let bytes = serde_json::to_vec(&envelope)?;

        // The directory may have been removed underneath us.
        fs::create_dir_all(&self.dir).await?;

        // Write then rename so readers never observe a half-written file.
        let n = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        let tmp = self
            .dir
            .join(format!(".{}.{}.{}.tmp", file_stem(key), std::process::id(), n));
        fs::write(&tmp, &bytes).await?;
        if let Err(e) = fs::rename(&tmp, self.path_for(key)).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    /// Paths of every `*.json` file in the cache directory.
    async fn entry_paths(&self) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    warn!("Disk cache: failed to list {}: {}", self.dir.display(), e);
                }
                return paths;
            }
        };
        loop {
            match dir.next_entry().await {
                Ok(Some(entry)) => {
                    let path = entry.path();
                    if path.extension().and_then(|ext| ext.to_str()) == Some(EXTENSION) {
                        paths.push(path);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Disk cache: error while listing {}: {}", self.dir.display(), e);
                    break;
                }
            }
        }
        paths
    }

    async fn remove(path: &Path) -> bool {
        match fs::remove_file(path).await {
            Ok(()) => true,
            // Someone else got there first.
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                warn!("Disk cache: failed to delete {}: {}", path.display(), e);
                false
            }
        }
    }
}

#[async_trait]
impl CacheStore for DiskStore {
    async fn get(&self, key: &CacheKey, max_age: Duration) -> Option<Value> {
        if key.is_empty() {
            return None;
        }
        let path = self.path_for(key);
        match Self::read_entry(&path).await {
            ReadOutcome::Missing => None,
            ReadOutcome::Corrupt(reason) => {
                warn!("Disk cache: unreadable entry {}: {}", path.display(), reason);
                None
            }
            ReadOutcome::Found(entry) => {
                if entry.is_expired(self.clock.now_millis(), max_age) {
                    debug!("Disk cache: entry {} is stale", key);
                    None
                } else {
                    Some(entry.value)
                }
            }
        }
    }

    async fn set(&self, key: &CacheKey, value: &Value) -> bool {
        if key.is_empty() {
            return false;
        }
        let entry = CacheEntry::new(value.clone(), self.clock.now_millis());
        match self.write_entry(key, &entry).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Disk cache: failed to persist {}: {}", key, e);
                false
            }
        }
    }

    async fn sweep_expired(&self, max_age: Duration) -> usize {
        let now = self.clock.now_millis();
        let mut removed = 0;
        for path in self.entry_paths().await {
            let stale = match Self::read_entry(&path).await {
                ReadOutcome::Missing => false,
                ReadOutcome::Corrupt(reason) => {
                    debug!("Disk cache: sweeping corrupt entry {}: {}", path.display(), reason);
                    true
                }
                ReadOutcome::Found(entry) => entry.is_expired(now, max_age),
            };
            if stale && Self::remove(&path).await {
                removed += 1;
            }
        }
        removed
    }

    async fn entry_count(&self) -> usize {
        self.entry_paths().await.len()
    }

    async fn clear(&self) -> usize {
        let mut removed = 0;
        for path in self.entry_paths().await {
            if Self::remove(&path).await {
                removed += 1;
            }
        }
        removed
    }

    fn backend(&self) -> CacheBackend {
        CacheBackend::Disk
    }
}
