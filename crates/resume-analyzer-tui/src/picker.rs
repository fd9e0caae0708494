//! Directory browser used while selecting files to upload.
//!
//! Listings are filtered by the accepted-types hint unless the user asks to
//! see everything; the backend decides what it actually accepts.

use std::fs;
use std::path::{Path, PathBuf};

use ratatui::widgets::ListState;
use resume_analyzer_core::upload::matches_accept_hint;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerEntry {
    pub path: PathBuf,
    pub name: String,
    pub is_dir: bool,
}

pub struct FilePicker {
    pub dir: PathBuf,
    pub entries: Vec<PickerEntry>,
    pub state: ListState,
    pub show_all: bool,
    pub error: Option<String>,
    marked: Vec<PathBuf>,
}

impl FilePicker {
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        let mut picker = Self {
            dir: dir.into(),
            entries: Vec::new(),
            state: ListState::default(),
            show_all: false,
            error: None,
            marked: Vec::new(),
        };
        picker.refresh();
        picker
    }

    pub fn refresh(&mut self) {
        match list_dir(&self.dir, self.show_all) {
            Ok(entries) => {
                self.entries = entries;
                self.error = None;
            }
            Err(e) => {
                tracing::warn!(dir = %self.dir.display(), "Failed to list directory: {e}");
                self.entries.clear();
                self.error = Some(e.to_string());
            }
        }
        self.state.select(if self.entries.is_empty() { None } else { Some(0) });
    }

    pub fn nav_down(&mut self) {
        let len = self.entries.len();
        if len > 0 {
            let i = self.state.selected().unwrap_or(0);
            self.state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn nav_up(&mut self) {
        let i = self.state.selected().unwrap_or(0);
        self.state.select(Some(i.saturating_sub(1)));
    }

    pub fn selected_entry(&self) -> Option<&PickerEntry> {
        self.state.selected().and_then(|i| self.entries.get(i))
    }

    /// Descend into the highlighted directory, or toggle the highlighted file
    pub fn activate(&mut self) {
        let Some(entry) = self.selected_entry().cloned() else {
            return;
        };
        if entry.is_dir {
            self.dir = entry.path;
            self.refresh();
        } else {
            self.toggle(&entry.path);
        }
    }

    pub fn toggle_selected(&mut self) {
        if let Some(entry) = self.selected_entry().cloned() {
            if !entry.is_dir {
                self.toggle(&entry.path);
            }
        }
    }

    pub fn parent(&mut self) {
        if let Some(parent) = self.dir.parent() {
            self.dir = parent.to_path_buf();
            self.refresh();
        }
    }

    pub fn toggle_show_all(&mut self) {
        self.show_all = !self.show_all;
        self.refresh();
    }

    pub fn is_marked(&self, path: &Path) -> bool {
        self.marked.iter().any(|p| p == path)
    }

    /// Marked files in the order they were marked
    pub fn marked(&self) -> &[PathBuf] {
        &self.marked
    }

    fn toggle(&mut self, path: &Path) {
        if let Some(pos) = self.marked.iter().position(|p| p == path) {
            self.marked.remove(pos);
        } else {
            self.marked.push(path.to_path_buf());
        }
    }
}

fn list_dir(dir: &Path, show_all: bool) -> std::io::Result<Vec<PickerEntry>> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let path = entry.path();
        if path.is_dir() {
            dirs.push(PickerEntry { path, name, is_dir: true });
        } else if show_all || matches_accept_hint(&path) {
            files.push(PickerEntry { path, name, is_dir: false });
        }
    }

    dirs.sort_by(|a, b| a.name.cmp(&b.name));
    files.sort_by(|a, b| a.name.cmp(&b.name));
    dirs.extend(files);
    Ok(dirs)
}
