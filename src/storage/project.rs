//! Project management
//!
//! Handles project initialization and provides access to the item store.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use thiserror::Error;

use super::{Config, ItemStore};
use crate::domain::timeline::TimelineOptions;
use crate::domain::{ProjectId, TreeStore};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not in a wbs project. Run 'wbs init' first.")]
    NotInProject,

    #[error("Project config at {0} has no project id")]
    MissingId(PathBuf),
}

/// A WBS project rooted at a directory containing `.wbs/`
pub struct Project {
    root: PathBuf,
    id: ProjectId,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let wbs_dir = root.join(".wbs");

        if !wbs_dir.is_dir() {
            return Err(ProjectError::NotInProject.into());
        }

        let config = Config::for_project(&root)?;
        let id = config
            .project
            .require_id()
            .map_err(|_| ProjectError::MissingId(Config::project_config_path(&root)))?
            .clone();

        Ok(Self { root, id, config })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        let root = Config::find_project_root(&cwd).ok_or(ProjectError::NotInProject)?;

        Self::open(root)
    }

    /// Initializes a new project at the given path.
    ///
    /// Re-running on an existing project keeps its ID and items.
    pub fn init(root: impl Into<PathBuf>, name: &str) -> Result<Self> {
        let root = root.into();
        let wbs_dir = root.join(".wbs");

        fs::create_dir_all(&wbs_dir)
            .with_context(|| format!("Failed to create .wbs directory: {}", wbs_dir.display()))?;

        let mut config = Config::for_project(&root)?;
        if config.project.project.id.is_none() {
            let id = ProjectId::new(name, Utc::now());
            tracing::info!(project = %id, name, "initializing project");
            config.project.project.id = Some(id);
            config.project.project.name = name.to_string();
            config.save_project()?;
        }

        let store = ItemStore::for_project(&root);
        if !store.path().exists() {
            fs::write(store.path(), "")
                .with_context(|| format!("Failed to create {}", store.path().display()))?;
        }

        Self::open(root)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .wbs directory path
    pub fn wbs_dir(&self) -> PathBuf {
        self.root.join(".wbs")
    }

    pub fn id(&self) -> &ProjectId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.config.project.project.name
    }

    /// Returns the item store
    pub fn item_store(&self) -> ItemStore {
        ItemStore::for_project(&self.root)
    }

    /// Loads this project's tree
    pub fn load_tree(&self) -> Result<TreeStore> {
        self.item_store().load_tree(&self.id)
    }

    /// Persists this project's tree
    pub fn save_tree(&self, tree: &TreeStore) -> Result<()> {
        self.item_store().save_tree(tree)
    }

    /// Timeline options from the project config
    pub fn timeline_options(&self) -> Result<TimelineOptions> {
        self.config
            .project
            .timeline
            .options()
            .context("Invalid [timeline] section in project config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_creates_structure() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path(), "Apollo").unwrap();

        assert!(project.wbs_dir().is_dir());
        assert!(project.wbs_dir().join("config.toml").is_file());
        assert!(project.wbs_dir().join("items.jsonl").is_file());
        assert_eq!(project.name(), "Apollo");
        assert!(project.load_tree().unwrap().is_empty());
    }

    #[test]
    fn init_is_idempotent() {
        let dir = TempDir::new().unwrap();

        let first = Project::init(dir.path(), "Apollo").unwrap();
        let mut tree = first.load_tree().unwrap();
        tree.insert_root("Kept");
        first.save_tree(&tree).unwrap();

        let second = Project::init(dir.path(), "Renamed").unwrap();
        assert_eq!(first.id(), second.id());
        assert_eq!(second.name(), "Apollo");
        assert_eq!(second.load_tree().unwrap().len(), 1);
    }

    #[test]
    fn open_existing_project() {
        let dir = TempDir::new().unwrap();
        Project::init(dir.path(), "Apollo").unwrap();

        let project = Project::open(dir.path()).unwrap();
        assert_eq!(project.root(), dir.path());
    }

    #[test]
    fn open_non_project_fails() {
        let dir = TempDir::new().unwrap();
        assert!(Project::open(dir.path()).is_err());
    }

    #[test]
    fn open_without_id_fails() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".wbs")).unwrap();

        let err = Project::open(dir.path()).err().unwrap();
        assert!(err.to_string().contains("no project id"));
    }

    #[test]
    fn timeline_options_come_from_config() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path(), "Apollo").unwrap();
        assert_eq!(project.timeline_options().unwrap(), TimelineOptions::default());
    }
}
