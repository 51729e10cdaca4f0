//! Output directory writer.
//!
//! Every write is fire-and-forget from the caller's point of view: failures
//! are logged and swallowed so one bad file never stops the rest of an
//! update cascade. The `try_*` variants return the error for callers (and
//! tests) that care.

use crate::error::{Result, ScoreboardError};
use crate::types::{CUSTOM_DIR, EMBEDDED_PLACEHOLDER_PNG, PLACEHOLDER_ASSET};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct OutputWriter {
    root: PathBuf,
    assets: PathBuf,
}

impl OutputWriter {
    pub fn new(root: impl Into<PathBuf>, assets: impl Into<PathBuf>) -> Self {
        OutputWriter {
            root: root.into(),
            assets: assets.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn assets(&self) -> &Path {
        &self.assets
    }

    pub fn target(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Path of an asset below the asset root, e.g. `asset(&["roles", "tank.png"])`.
    pub fn asset(&self, parts: &[&str]) -> PathBuf {
        let mut path = self.assets.clone();
        for part in parts {
            path.push(part);
        }
        path
    }

    pub fn ensure_dirs(&self) {
        for dir in [self.root.clone(), self.root.join(CUSTOM_DIR)] {
            if let Err(e) = fs::create_dir_all(&dir) {
                warn!(dir = %dir.display(), error = %e, "could not create output directory");
            }
        }
    }

    pub fn try_write_text(&self, name: &str, text: &str) -> Result<()> {
        let path = self.target(name);
        fs::write(&path, text).map_err(|e| ScoreboardError::io(&path, e))
    }

    pub fn write_text(&self, name: &str, text: &str) {
        if let Err(e) = self.try_write_text(name, text) {
            warn!(file = name, error = %e, "output write skipped");
        }
    }

    /// Minimal page that refreshes every second so browser sources re-poll.
    /// Without a colour the body is left out but the refreshing shell stays.
    pub fn write_color(&self, name: &str, color: Option<&str>) {
        self.write_text(name, &color_document(color));
    }

    /// Copy `src` to `name`; a missing source falls back to the placeholder
    /// asset, and a missing placeholder to an embedded blank image, so the
    /// target exists afterwards unless the output directory itself is
    /// unwritable.
    pub fn copy_asset(&self, src: &Path, name: &str) {
        let target = self.target(name);
        if fs::copy(src, &target).is_ok() {
            return;
        }
        debug!(src = %src.display(), file = name, "asset missing, using placeholder");
        let placeholder = self.assets.join(PLACEHOLDER_ASSET);
        if fs::copy(&placeholder, &target).is_ok() {
            return;
        }
        if let Err(e) = fs::write(&target, EMBEDDED_PLACEHOLDER_PNG) {
            warn!(file = name, error = %e, "output write skipped");
        }
    }

    pub fn try_remove(&self, name: &str) -> Result<()> {
        let path = self.target(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) => {
                let err = ScoreboardError::io(&path, e);
                if err.is_not_found() {
                    Ok(())
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Removing a file that is already gone is not an error.
    pub fn remove(&self, name: &str) {
        if let Err(e) = self.try_remove(name) {
            warn!(file = name, error = %e, "output removal skipped");
        }
    }

    /// File names (not paths) directly inside `subdir` of the output root.
    pub fn list(&self, subdir: Option<&str>) -> Vec<String> {
        let dir = match subdir {
            Some(sub) => self.root.join(sub),
            None => self.root.clone(),
        };
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "could not list output directory");
                return Vec::new();
            }
        };
        let mut out: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect();
        out.sort();
        out
    }
}

pub fn color_document(color: Option<&str>) -> String {
    let body = match color {
        Some(color) => format!(
            "<body style=\"width:100%; height:100%; background-color:{color};\"></body>"
        ),
        None => String::new(),
    };
    format!(
        "<!DOCTYPE html>\
         <html>\
         <head>\
         <meta http-equiv=\"refresh\" content=\"1\">\
         <title>Solid Colour</title>\
         </head>\
         {body}\
         </html>"
    )
}
