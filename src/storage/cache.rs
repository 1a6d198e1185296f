use std::io::Write;
use std::path::{Path, PathBuf};

use crate::storage::{CacheError, NewsItem};

/// Date-partitioned on-disk store for normalized news items.
///
/// One JSON artifact per `(feed host, calendar date)` pair:
/// `<root>/<host>/<host>_<YYYYMMDD>.json`. Partitions are read whole and
/// overwritten whole; concurrent writers are not coordinated (single
/// run-to-completion invocations are the supported mode).
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deterministic partition path for a feed host and a `YYYYMMDD` key.
    pub fn partition_path(&self, host: &str, date_key: &str) -> PathBuf {
        self.root.join(host).join(format!("{}_{}.json", host, date_key))
    }

    pub fn exists(&self, host: &str, date_key: &str) -> bool {
        self.partition_path(host, date_key).is_file()
    }

    /// Hosts that have at least one cached partition, sorted for stable
    /// replay order.
    pub fn hosts(&self) -> Result<Vec<String>, CacheError> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(CacheError::Io {
                    path: self.root.clone(),
                    source: e,
                })
            }
        };

        let mut hosts = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CacheError::Io {
                path: self.root.clone(),
                source: e,
            })?;
            if entry.path().is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    hosts.push(name.to_string());
                }
            }
        }
        hosts.sort();
        Ok(hosts)
    }

    /// Loads a partition.
    ///
    /// `NotFound` is recoverable in fetch-and-cache mode (treated as an empty
    /// partition) and fatal in offline replay. `Corrupt` is always fatal and
    /// the file is left untouched for inspection.
    pub fn load(&self, host: &str, date_key: &str) -> Result<Vec<NewsItem>, CacheError> {
        let path = self.partition_path(host, date_key);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CacheError::NotFound(format!("{}_{}", host, date_key)));
            }
            Err(e) => return Err(CacheError::Io { path, source: e }),
        };

        serde_json::from_str(&content).map_err(|source| CacheError::Corrupt { path, source })
    }

    /// Overwrites a partition atomically: the serialized list goes to a temp
    /// file in the partition directory, synced, then renamed over the target.
    /// A reader never observes a partial partition.
    pub fn save(&self, host: &str, date_key: &str, items: &[NewsItem]) -> Result<(), CacheError> {
        let path = self.partition_path(host, date_key);
        let dir = path.parent().unwrap_or(&self.root).to_path_buf();
        // Idempotent: succeeds when the directory already exists.
        std::fs::create_dir_all(&dir).map_err(|source| CacheError::Io {
            path: dir.clone(),
            source,
        })?;

        let serialized =
            serde_json::to_string_pretty(items).map_err(|source| CacheError::Io {
                path: path.clone(),
                source: source.into(),
            })?;

        let temp_path = path.with_extension(format!("tmp.{}", std::process::id()));
        let write_result = (|| {
            let mut temp_file = std::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)?;
            temp_file.write_all(serialized.as_bytes())?;
            temp_file.sync_all()?;
            drop(temp_file);
            std::fs::rename(&temp_path, &path)
        })();

        write_result.map_err(|source| {
            let _ = std::fs::remove_file(&temp_path);
            CacheError::Io {
                path: path.clone(),
                source,
            }
        })?;

        tracing::info!(path = %path.display(), items = items.len(), "Partition written");
        Ok(())
    }
}
