use crate::error::PipelineError;
use crate::extract::ParsedUnit;
use crate::model::ClassModel;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Parsed units plus their resolved classes, enough to rebuild a finalized
/// registry without parsing again.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub fingerprint: String,
    pub words: Vec<String>,
    pub units: Vec<ParsedUnit>,
    /// Registered classes in registration order, each carrying its resolution.
    pub classes: Vec<ClassModel>,
}

pub struct SnapshotCache {
    cache_dir: PathBuf,
}

impl SnapshotCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Hash over every input that affects parsing and resolution.
    pub fn compute_fingerprint<'s>(
        units: impl IntoIterator<Item = (&'s str, &'s str)>,
        words: &[String],
        define_callees: &[String],
    ) -> String {
        let mut hasher = Sha256::new();
        for (path, source) in units {
            hasher.update(path.as_bytes());
            hasher.update([0u8]);
            hasher.update(source.as_bytes());
            hasher.update([0u8]);
        }
        for word in words.iter().chain(define_callees.iter()) {
            hasher.update(word.as_bytes());
            hasher.update([1u8]);
        }
        format!("{:x}", hasher.finalize())
    }

    fn snapshot_path(&self, id: &str) -> PathBuf {
        // stable file name for the snapshot id
        let safe_name = id.replace(['/', '\\', ':'], "_");
        self.cache_dir.join(format!("{}.json", safe_name))
    }

    /// The snapshot stored under `id`, if it exists and matches `fingerprint`.
    pub fn get(&self, id: &str, fingerprint: &str) -> Option<Snapshot> {
        let path = self.snapshot_path(id);
        let data = fs::read_to_string(&path).ok()?;

        let snapshot: Snapshot = match serde_json::from_str(&data) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("snapshot {} is unreadable: {}", path.display(), e);
                // Invalidate corrupt snapshot file
                fs::remove_file(&path).ok();
                return None;
            }
        };

        if snapshot.fingerprint == fingerprint {
            log::info!("using snapshot '{}'", id);
            Some(snapshot)
        } else {
            log::info!("snapshot '{}' is stale", id);
            None
        }
    }

    pub fn set(&self, id: &str, snapshot: &Snapshot) -> Result<(), PipelineError> {
        fs::create_dir_all(&self.cache_dir).map_err(|e| PipelineError::io(&self.cache_dir, e))?;
        let path = self.snapshot_path(id);
        let data = serde_json::to_string(snapshot)?;
        fs::write(&path, data).map_err(|e| PipelineError::io(&path, e))
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(fingerprint: &str) -> Snapshot {
        Snapshot {
            fingerprint: fingerprint.to_string(),
            words: vec!["Pin".to_string()],
            units: Vec::new(),
            classes: vec![ClassModel::new("App.A", "a.js")],
        }
    }

    #[test]
    fn test_fingerprint_depends_on_content_and_words() {
        let a = SnapshotCache::compute_fingerprint([("a.js", "x")], &[], &[]);
        let b = SnapshotCache::compute_fingerprint([("a.js", "y")], &[], &[]);
        let c = SnapshotCache::compute_fingerprint([("a.js", "x")], &["Pin".to_string()], &[]);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, SnapshotCache::compute_fingerprint([("a.js", "x")], &[], &[]));
    }

    #[test]
    fn test_stale_snapshot_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SnapshotCache::new(dir.path().join("snapshots"));
        cache.set("main", &snapshot("abc")).unwrap();

        assert!(cache.get("main", "abc").is_some());
        assert!(cache.get("main", "def").is_none());
        assert!(cache.get("other", "abc").is_none());
    }

    #[test]
    fn test_corrupt_snapshot_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SnapshotCache::new(dir.path());
        fs::write(dir.path().join("main.json"), "{ not json").unwrap();
        assert!(cache.get("main", "abc").is_none());
        assert!(!dir.path().join("main.json").exists());
    }
}
