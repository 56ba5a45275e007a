//! File change detection.
//!
//! Decides whether a document needs reindexing without paying for an
//! embedding run. The cheap path compares size and mtime against the stored
//! [`FileMetadata`]; only when those disagree (or are unavailable) is the
//! file's content rehashed.

use super::types::FileMetadata;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::UNIX_EPOCH;
use thiserror::Error;
use tracing::warn;

/// Errors that can occur while checking files for changes.
#[derive(Debug, Error)]
pub enum ChangeError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ChangeError>;

/// Hash of in-memory document content, comparable with stored `file_hash`
/// values and with [`ChangeDetector::compute_hash`] digests.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Change detection over source files.
///
/// A hashing failure is an error, never a silent "changed" or "unchanged"
/// verdict; the caller owns the policy for unreadable files.
#[async_trait]
pub trait ChangeDetector: Send + Sync {
    /// Deterministic content hash of the file's bytes.
    async fn compute_hash(&self, path: &str) -> Result<String>;

    /// Whether the file differs from its recorded state. `None` means the
    /// file was never indexed, which always counts as changed.
    async fn has_changed(&self, path: &str, known: Option<&FileMetadata>) -> Result<bool>;

    /// The same decision applied across many files in one call. Per-file
    /// errors are kept per entry so callers can decide whether to propagate
    /// or skip.
    async fn batch_check(
        &self,
        paths: &[String],
        known: &HashMap<String, FileMetadata>,
    ) -> HashMap<String, Result<bool>> {
        let mut verdicts = HashMap::with_capacity(paths.len());
        for path in paths {
            let verdict = self.has_changed(path, known.get(path)).await;
            verdicts.insert(path.clone(), verdict);
        }
        verdicts
    }
}

/// Filesystem-backed change detector.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsChangeDetector;

impl FsChangeDetector {
    /// Size and mtime (unix millis) of a readable disk file, if any.
    pub(crate) async fn probe(path: &str) -> Option<(u64, i64)> {
        let meta = tokio::fs::metadata(path).await.ok()?;
        let modified = meta.modified().ok()?;
        let millis = modified.duration_since(UNIX_EPOCH).ok()?.as_millis() as i64;
        Some((meta.len(), millis))
    }
}

#[async_trait]
impl ChangeDetector for FsChangeDetector {
    async fn compute_hash(&self, path: &str) -> Result<String> {
        let bytes = tokio::fs::read(path).await.map_err(|source| ChangeError::Io {
            path: path.to_string(),
            source,
        })?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }

    async fn has_changed(&self, path: &str, known: Option<&FileMetadata>) -> Result<bool> {
        let Some(known) = known else {
            return Ok(true);
        };

        // Cheap short-circuit: an untouched file needs no rehash.
        if let Some((size, modified)) = Self::probe(path).await {
            if known.last_modified == Some(modified) && known.size == size {
                return Ok(false);
            }
        }

        let current = self.compute_hash(path).await?;
        Ok(current != known.hash)
    }
}

/// Collapse batch verdicts into the facade's `path -> changed` map.
///
/// An unreadable file is reported as changed (with a warning) so that bulk
/// reindexers never silently skip it.
pub(crate) fn resolve_batch(
    verdicts: HashMap<String, Result<bool>>,
) -> HashMap<String, bool> {
    verdicts
        .into_iter()
        .map(|(path, verdict)| match verdict {
            Ok(changed) => (path, changed),
            Err(error) => {
                warn!("Change check failed for {path}, treating as changed: {error}");
                (path, true)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::io::Write;

    fn state_for(path: &str, hash: String, size: u64, last_modified: Option<i64>) -> FileMetadata {
        FileMetadata {
            file_path: path.to_string(),
            hash,
            size,
            last_modified,
            last_checked: Utc::now(),
        }
    }

    #[test]
    fn content_hash_is_stable() {
        assert_eq!(content_hash("hello"), content_hash("hello"));
        assert_ne!(content_hash("hello"), content_hash("hello!"));
        assert_eq!(content_hash("hello").len(), 64);
    }

    #[tokio::test]
    async fn never_indexed_counts_as_changed() {
        let detector = FsChangeDetector;
        let changed = detector
            .has_changed("/nonexistent/anywhere.txt", None)
            .await
            .unwrap();
        assert!(changed);
    }

    #[tokio::test]
    async fn missing_file_with_known_state_is_an_error() {
        let detector = FsChangeDetector;
        let known = state_for("/nonexistent/f.txt", content_hash("x"), 1, None);
        let result = detector
            .has_changed("/nonexistent/f.txt", Some(&known))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn untouched_file_is_unchanged_via_mtime() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "stable contents").unwrap();
        file.flush().unwrap();
        let path = file.path().to_string_lossy().to_string();

        let detector = FsChangeDetector;
        let (size, modified) = FsChangeDetector::probe(&path).await.unwrap();
        let known = state_for(&path, content_hash("stable contents"), size, Some(modified));

        assert!(!detector.has_changed(&path, Some(&known)).await.unwrap());
    }

    #[tokio::test]
    async fn rewritten_file_is_changed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "version one").unwrap();
        file.flush().unwrap();
        let path = file.path().to_string_lossy().to_string();

        let detector = FsChangeDetector;
        // Stored state carries a stale hash and no mtime, forcing the
        // hash-comparison path.
        let known = state_for(&path, content_hash("something else"), 0, None);

        assert!(detector.has_changed(&path, Some(&known)).await.unwrap());
    }

    #[tokio::test]
    async fn hash_matches_content_hash_for_plain_text() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "same bytes").unwrap();
        file.flush().unwrap();
        let path = file.path().to_string_lossy().to_string();

        let detector = FsChangeDetector;
        assert_eq!(
            detector.compute_hash(&path).await.unwrap(),
            content_hash("same bytes")
        );
    }

    #[tokio::test]
    async fn batch_check_mixes_verdicts() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "aaa").unwrap();
        file.flush().unwrap();
        let path = file.path().to_string_lossy().to_string();

        let detector = FsChangeDetector;
        let (size, modified) = FsChangeDetector::probe(&path).await.unwrap();
        let mut known = HashMap::new();
        known.insert(
            path.clone(),
            state_for(&path, content_hash("aaa"), size, Some(modified)),
        );

        let paths = vec![path.clone(), "/nonexistent/other.txt".to_string()];
        let verdicts = detector.batch_check(&paths, &known).await;

        assert!(!verdicts[&path].as_ref().unwrap());
        // Unknown path: no stored state, changed.
        assert!(*verdicts["/nonexistent/other.txt"].as_ref().unwrap());

        let resolved = resolve_batch(verdicts);
        assert_eq!(resolved.len(), 2);
        assert!(!resolved[&path]);
    }
}
