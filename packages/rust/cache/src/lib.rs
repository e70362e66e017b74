//! Advisory TTL cache for expensive oracle and search responses.
//!
//! Entries are JSON files under `<root>/<category>/<sha256(key)>.json`, each
//! carrying its own expiry. Reads after expiry behave exactly like a miss
//! (the stale file is removed on the way out). Writes are idempotent:
//! re-storing a key with a new TTL simply extends its life.
//!
//! The cache is advisory — every call site must work correctly (just slower
//! and costlier) when the cache is disabled, empty, or broken. Read problems
//! therefore degrade to misses instead of erroring.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Serialize, de::DeserializeOwned};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use prospector_shared::{ProspectorError, Result};

/// One stored value with its absolute expiry (unix seconds).
#[derive(Debug, Serialize, serde::Deserialize)]
struct CacheEntry<T> {
    value: T,
    expires_at: u64,
}

/// File-backed TTL cache.
///
/// Safe for any number of concurrent distinct-key writers: each key maps to
/// its own file and writes go through a rename from a unique temp file.
#[derive(Debug, Clone)]
pub struct Cache {
    root: PathBuf,
    enabled: bool,
}

impl Cache {
    /// Create a cache rooted at `root`. The directory is created lazily on
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            enabled: true,
        }
    }

    /// A cache that never hits and never stores. Used when caching is
    /// disabled by config and in tests that must exercise cold paths.
    pub fn disabled() -> Self {
        Self {
            root: PathBuf::new(),
            enabled: false,
        }
    }

    /// The cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Look up `key` in `category`. Expired, missing, and unreadable entries
    /// are all misses.
    pub async fn get<T: DeserializeOwned>(&self, category: &str, key: &str) -> Option<T> {
        if !self.enabled {
            return None;
        }

        let path = self.entry_path(category, key);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(_) => return None,
        };

        let entry: CacheEntry<T> = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(?path, error = %e, "unreadable cache entry, treating as miss");
                let _ = tokio::fs::remove_file(&path).await;
                return None;
            }
        };

        if unix_now() >= entry.expires_at {
            debug!(category, "cache entry expired");
            let _ = tokio::fs::remove_file(&path).await;
            return None;
        }

        debug!(category, "cache hit");
        Some(entry.value)
    }

    /// Store `value` under `key` in `category` with the given TTL,
    /// overwriting any previous entry for the key.
    pub async fn set<T: Serialize>(
        &self,
        category: &str,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let dir = self.root.join(category);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| ProspectorError::io(&dir, e))?;

        let entry = CacheEntry {
            value,
            expires_at: unix_now().saturating_add(ttl.as_secs()),
        };
        let content = serde_json::to_string(&entry)
            .map_err(|e| ProspectorError::Cache(format!("serialize entry: {e}")))?;

        // Write-then-rename so concurrent readers never observe a torn file.
        let path = self.entry_path(category, key);
        let tmp = dir.join(format!(".{}.tmp-{}", hash_key(key), std::process::id()));
        tokio::fs::write(&tmp, &content)
            .await
            .map_err(|e| ProspectorError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| ProspectorError::io(&path, e))?;

        debug!(category, "cache entry stored");
        Ok(())
    }

    /// Remove every entry from the cache root.
    pub async fn clear(&self) -> Result<()> {
        if !self.enabled || !self.root.exists() {
            return Ok(());
        }
        tokio::fs::remove_dir_all(&self.root)
            .await
            .map_err(|e| ProspectorError::io(&self.root, e))?;
        Ok(())
    }

    fn entry_path(&self, category: &str, key: &str) -> PathBuf {
        self.root.join(category).join(format!("{}.json", hash_key(key)))
    }
}

/// Hash a cache key to a stable filename.
fn hash_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Build a stable content fingerprint from several identifying parts.
/// Used to key derived artifacts (e.g., a research bundle) by company.
pub fn fingerprint(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_cache() -> (tempfile::TempDir, Cache) {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = Cache::new(dir.path());
        (dir, cache)
    }

    #[tokio::test]
    async fn set_then_get_hits() {
        let (_dir, cache) = temp_cache();
        cache
            .set("search", "acme startup", &vec!["result".to_string()], Duration::from_secs(60))
            .await
            .expect("set");

        let hit: Option<Vec<String>> = cache.get("search", "acme startup").await;
        assert_eq!(hit, Some(vec!["result".to_string()]));
    }

    #[tokio::test]
    async fn expired_entry_is_a_miss() {
        let (_dir, cache) = temp_cache();
        cache
            .set("search", "acme", &"value".to_string(), Duration::from_secs(0))
            .await
            .expect("set");

        let hit: Option<String> = cache.get("search", "acme").await;
        assert_eq!(hit, None);
    }

    #[tokio::test]
    async fn rewriting_a_key_extends_its_life() {
        let (_dir, cache) = temp_cache();
        cache
            .set("summary", "k", &"v1".to_string(), Duration::from_secs(0))
            .await
            .expect("set");
        cache
            .set("summary", "k", &"v2".to_string(), Duration::from_secs(120))
            .await
            .expect("set again");

        let hit: Option<String> = cache.get("summary", "k").await;
        assert_eq!(hit, Some("v2".to_string()));
    }

    #[tokio::test]
    async fn corrupt_entry_degrades_to_miss() {
        let (dir, cache) = temp_cache();
        cache
            .set("search", "k", &"v".to_string(), Duration::from_secs(60))
            .await
            .expect("set");

        // Clobber the entry file with junk.
        let category_dir = dir.path().join("search");
        let entry = std::fs::read_dir(&category_dir)
            .expect("read dir")
            .next()
            .expect("one entry")
            .expect("dirent");
        std::fs::write(entry.path(), "not json").expect("clobber");

        let hit: Option<String> = cache.get("search", "k").await;
        assert_eq!(hit, None);
    }

    #[tokio::test]
    async fn disabled_cache_never_hits() {
        let cache = Cache::disabled();
        cache
            .set("search", "k", &"v".to_string(), Duration::from_secs(60))
            .await
            .expect("set is a no-op");
        let hit: Option<String> = cache.get("search", "k").await;
        assert_eq!(hit, None);
    }

    #[tokio::test]
    async fn clear_empties_the_root() {
        let (_dir, cache) = temp_cache();
        cache
            .set("search", "k", &"v".to_string(), Duration::from_secs(60))
            .await
            .expect("set");
        cache.clear().await.expect("clear");

        let hit: Option<String> = cache.get("search", "k").await;
        assert_eq!(hit, None);
    }

    #[test]
    fn fingerprint_is_stable_and_part_sensitive() {
        let a = fingerprint(&["acme", "https://acme.io"]);
        let b = fingerprint(&["acme", "https://acme.io"]);
        let c = fingerprint(&["acme", "https://acme.dev"]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        // Part boundaries matter: ["ab","c"] != ["a","bc"].
        assert_ne!(fingerprint(&["ab", "c"]), fingerprint(&["a", "bc"]));
    }
}
