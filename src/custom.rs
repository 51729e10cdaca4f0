//! Free-form text files under `output/custom/`.

use crate::error::{Result, ScoreboardError};
use crate::format::{filename_fmt, text_fmt};
use crate::scoreboard::Scoreboard;
use crate::types::*;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, info};

fn numbered_suffix() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^(.*)_(\d+)$").expect("static suffix pattern"))
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomEntry {
    pub file: String,
    pub data: String,
}

impl CustomEntry {
    fn target(&self) -> String {
        format!("{CUSTOM_DIR}/{}", self.file)
    }
}

#[derive(Debug, Default)]
pub struct CustomPanel {
    entries: Vec<CustomEntry>,
}

impl CustomPanel {
    pub fn entries(&self) -> &[CustomEntry] {
        &self.entries
    }

    fn get_mut(&mut self, file: &str) -> Option<&mut CustomEntry> {
        self.entries.iter_mut().find(|e| e.file == file)
    }

    fn contains(&self, file: &str) -> bool {
        self.entries.iter().any(|e| e.file == file)
    }

    /// Sanitised, non-colliding file name for a requested one. Names that
    /// sanitise to nothing (or only dots) become `untitled.txt`; names
    /// without an extension get `.txt`. Collisions count up from an
    /// existing `_N` suffix, or from `_2`.
    pub fn unique_name(&self, requested: &str) -> String {
        let mut name = filename_fmt(requested.trim()).trim().to_string();
        if name.chars().all(|c| c == '.') {
            name = DEFAULT_CUSTOM_FILE.to_string();
        } else if !name.contains('.') {
            name.push_str(".txt");
        }
        if !self.contains(&name) {
            return name;
        }

        let (stem, ext) = match name.rfind('.') {
            Some(dot) if dot > 0 => (&name[..dot], &name[dot..]),
            _ => (name.as_str(), ""),
        };
        let (base, mut n) = match numbered_suffix().captures(stem) {
            Some(caps) => (
                caps[1].to_string(),
                caps[2].parse::<u64>().unwrap_or(1),
            ),
            None => (stem.to_string(), 1),
        };
        loop {
            n += 1;
            let candidate = format!("{base}_{n}{ext}");
            if !self.contains(&candidate) {
                return candidate;
            }
        }
    }

    pub fn add(&mut self, requested: &str, data: &str) -> String {
        let file = self.unique_name(requested);
        self.entries.push(CustomEntry {
            file: file.clone(),
            data: data.to_string(),
        });
        file
    }

    fn remove(&mut self, file: &str) -> Option<CustomEntry> {
        let pos = self.entries.iter().position(|e| e.file == file)?;
        Some(self.entries.remove(pos))
    }

    /// `None` seeds the default caster/analyst files.
    pub fn from_state(state: CustomPanelState) -> Self {
        let mut panel = CustomPanel::default();
        match state.entries {
            Some(entries) => {
                for entry in entries {
                    panel.add(&entry.file, &entry.data);
                }
            }
            None => {
                for file in DEFAULT_CUSTOM_FILES {
                    panel.add(file, "");
                }
            }
        }
        panel
    }

    pub fn export(&self) -> CustomPanelState {
        CustomPanelState {
            entries: Some(
                self.entries
                    .iter()
                    .map(|e| CustomEntryState {
                        file: e.file.clone(),
                        data: e.data.clone(),
                    })
                    .collect(),
            ),
        }
    }
}

impl Scoreboard {
    /// Returns the file name actually used.
    pub fn add_custom_entry(&mut self, requested: &str, data: &str) -> String {
        let file = self.custom.add(requested, data);
        info!(file = %file, "custom entry added");
        self.draw_custom_entry(&file);
        file
    }

    pub fn set_custom_data(&mut self, file: &str, data: &str) -> Result<()> {
        let entry = self
            .custom
            .get_mut(file)
            .ok_or_else(|| unknown_file(file))?;
        entry.data = data.to_string();
        self.draw_custom_entry(file);
        Ok(())
    }

    pub fn delete_custom_entry(&mut self, file: &str) -> Result<()> {
        self.custom.remove(file).ok_or_else(|| unknown_file(file))?;
        info!(file, "custom entry deleted");
        self.clean_custom();
        Ok(())
    }

    /// Deletes files in the custom directory that no entry owns.
    pub fn clean_custom(&self) {
        for file in self.out.list(Some(CUSTOM_DIR)) {
            if !self.custom.contains(&file) {
                debug!(file = %file, "removing orphaned custom file");
                self.out.remove(&format!("{CUSTOM_DIR}/{file}"));
            }
        }
    }

    pub(crate) fn draw_custom(&self) {
        for entry in self.custom.entries() {
            self.out.write_text(&entry.target(), &text_fmt(&entry.data));
        }
    }

    fn draw_custom_entry(&self, file: &str) {
        if let Some(entry) = self.custom.entries().iter().find(|e| e.file == file) {
            self.out.write_text(&entry.target(), &text_fmt(&entry.data));
        }
    }
}

fn unknown_file(file: &str) -> ScoreboardError {
    ScoreboardError::InvalidArgument(format!("no custom entry named {file:?}"))
}
