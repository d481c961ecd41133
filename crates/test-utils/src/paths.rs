//! On-disk frame stores for source adapter tests.
//!
//! Layout matches the directory source: `{root}/{sensor}/{YYYY-MM-DD}.json`.

use std::fs;
use std::path::{Path, PathBuf};

use albedo_common::Frame;

/// Path of a frame file inside a store rooted at `root`.
pub fn frame_path(root: &Path, frame: &Frame) -> PathBuf {
    root.join(frame.sensor().as_str())
        .join(format!("{}.json", frame.date().format("%Y-%m-%d")))
}

/// Write a frame as JSON into the store, creating the sensor directory.
pub fn write_frame(root: &Path, frame: &Frame) -> PathBuf {
    let path = frame_path(root, frame);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create sensor dir");
    }
    let json = serde_json::to_vec_pretty(frame).expect("serialize frame");
    fs::write(&path, json).expect("write frame");
    path
}

/// Creates a temporary directory for test outputs.
///
/// The directory is automatically cleaned up when the returned `TempDir` is dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("albedo-test-")
        .tempdir()
        .expect("Failed to create temp directory")
}

/// Temporary frame store pre-populated with `frames`.
pub fn frame_store(frames: &[Frame]) -> tempfile::TempDir {
    let dir = temp_test_dir();
    for frame in frames {
        write_frame(dir.path(), frame);
    }
    dir
}
