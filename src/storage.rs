use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::Context as _;

use crate::error::RenderResult;

/// mp4 doesn't handle audio correctly
pub const FORMAT: &str = "webm";

/// Hands out output paths under the storage directory. Ids are the capture
/// start timestamp plus a process-wide counter so two renders issued in the
/// same millisecond never collide.
#[derive(Debug)]
pub struct OutputStore {
    dir: PathBuf,
    seq: AtomicU64,
}

impl OutputStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            seq: AtomicU64::new(0),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ensure_dir(&self) -> RenderResult<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create storage directory '{}'", self.dir.display()))?;
        Ok(())
    }

    pub fn next_path(&self) -> PathBuf {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.dir.join(format!("{millis}-{seq:04}.{FORMAT}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_unique_and_webm() {
        let store = OutputStore::new("/tmp/replaycast-test");
        let a = store.next_path();
        let b = store.next_path();
        assert_ne!(a, b);
        assert_eq!(a.extension().unwrap(), "webm");
        assert!(a.starts_with("/tmp/replaycast-test"));
    }

    #[test]
    fn sequence_survives_same_millisecond() {
        let store = OutputStore::new(".");
        let names: Vec<_> = (0..64).map(|_| store.next_path()).collect();
        let mut dedup = names.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(dedup.len(), names.len());
    }
}
