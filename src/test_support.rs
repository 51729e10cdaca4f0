//! Scratch directories for tests that touch the filesystem.

use std::{fs, path::Path};
use tempfile::TempDir;

/// Removed with its contents when dropped.
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    pub fn new(label: &str) -> Self {
        let dir = tempfile::Builder::new()
            .prefix(&format!("overlay-scoreboard-{label}-"))
            .tempdir()
            .expect("create scratch dir");
        ScratchDir { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn read(&self, rel: &str) -> Option<String> {
        fs::read_to_string(self.path().join(rel)).ok()
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path().join(rel).exists()
    }

    pub fn write(&self, rel: &str, contents: &[u8]) {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create scratch parent");
        }
        fs::write(path, contents).expect("write scratch file");
    }
}
