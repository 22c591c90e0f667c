//! Test helpers for writing sightings files into temporary workspaces.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

/// Heron at (10, 20) and crane at (30, 40).
pub(super) const TWO_SIGHTINGS: &str = r#"[
  {"id": 1, "latitude": 10.0, "longitude": 20.0, "species": "Grey heron"},
  {"id": 2, "latitude": 30.0, "longitude": 40.0, "species": "Common crane", "notes": "pair"}
]"#;

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    fs::write(path.as_std_path(), contents).expect("write fixture file");
}

/// A temporary directory holding a single sightings file.
pub(super) struct SightingsFile {
    _dir: TempDir,
    path: Utf8PathBuf,
}

impl SightingsFile {
    pub(super) fn with_contents(contents: &str) -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root =
            Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        let path = root.join("sightings.json");
        write_utf8(&path, contents.as_bytes());
        Self { _dir: dir, path }
    }

    pub(super) fn path(&self) -> &Utf8Path {
        &self.path
    }
}
