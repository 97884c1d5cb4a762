//! JSONL storage for work items
//!
//! Items are stored in `.wbs/items.jsonl` with one JSON object per line, in
//! tree pre-order so diffs follow the outline. Uses file locking for
//! concurrent access safety.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;

use crate::domain::{ProjectId, TreeStore, WorkItem};

/// Store for work item data in JSONL format
pub struct ItemStore {
    path: PathBuf,
}

impl ItemStore {
    /// Creates a new item store at the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates the default store for a project
    pub fn for_project(project_root: &Path) -> Self {
        Self::new(project_root.join(".wbs").join("items.jsonl"))
    }

    /// Returns the path to the store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads all records in file order
    pub fn read_all(&self) -> Result<Vec<WorkItem>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open item store: {}", self.path.display()))?;

        file.lock_shared()
            .context("Failed to acquire read lock on item store")?;

        let reader = BufReader::new(&file);
        let mut items = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {}", line_num + 1))?;

            if line.trim().is_empty() {
                continue;
            }

            let item: WorkItem = serde_json::from_str(&line)
                .with_context(|| format!("Failed to parse work item at line {}", line_num + 1))?;
            items.push(item);
        }

        tracing::debug!(path = %self.path.display(), count = items.len(), "read item store");
        Ok(items)
    }

    /// Writes records in the given order (full rewrite)
    pub fn write_all<'a>(&self, items: impl IntoIterator<Item = &'a WorkItem>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let temp_path = self.path.with_extension("jsonl.tmp");
        let mut count = 0usize;

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

            file.lock_exclusive()
                .context("Failed to acquire write lock on item store")?;

            let mut writer = BufWriter::new(&file);
            for item in items {
                let line = serde_json::to_string(item).context("Failed to serialize work item")?;
                writeln!(writer, "{}", line).context("Failed to write work item")?;
                count += 1;
            }

            writer.flush().context("Failed to flush item store")?;
        }

        fs::rename(&temp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                self.path.display()
            )
        })?;

        tracing::debug!(path = %self.path.display(), count, "wrote item store");
        Ok(())
    }

    /// Loads and validates the tree for a project
    pub fn load_tree(&self, project_id: &ProjectId) -> Result<TreeStore> {
        let items = self.read_all()?;
        TreeStore::from_items(project_id.clone(), items)
            .with_context(|| format!("Invalid work breakdown in {}", self.path.display()))
    }

    /// Saves a tree in pre-order
    pub fn save_tree(&self, tree: &TreeStore) -> Result<()> {
        self.write_all(tree.items())
    }
}
