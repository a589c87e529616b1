use std::collections::BTreeSet;
use std::path::PathBuf;

use replaycast::storage::{FORMAT, OutputStore};

#[test]
fn repeated_renders_never_collide() {
    let dir = PathBuf::from("target").join("storage_paths");
    let store = OutputStore::new(&dir);

    // Far more paths than one millisecond of wall clock can separate.
    let paths: BTreeSet<_> = (0..256).map(|_| store.next_path()).collect();
    assert_eq!(paths.len(), 256);
}

#[test]
fn outputs_use_the_fixed_container_extension() {
    assert_eq!(FORMAT, "webm");
    let store = OutputStore::new("target/storage_paths");
    let path = store.next_path();
    assert_eq!(path.extension().unwrap(), FORMAT);
}

#[test]
fn ensure_dir_creates_the_storage_root() {
    let dir = PathBuf::from("target")
        .join("storage_paths")
        .join("nested")
        .join("deeper");
    let _ = std::fs::remove_dir_all(&dir);

    let store = OutputStore::new(&dir);
    store.ensure_dir().unwrap();
    assert!(dir.is_dir());
    // Idempotent.
    store.ensure_dir().unwrap();
}
