//! Configuration handling for the WBS engine
//!
//! Configuration is stored in `.wbs/config.toml` (project) and
//! `~/.config/wbs/config.toml` (global).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::timeline::TimelineOptions;
use crate::domain::ProjectId;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Identity of the project stored in this directory
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ProjectSection {
    pub id: Option<ProjectId>,
    pub name: String,
}

/// Largest accepted `timeline.min_span_days`, about ten years
pub const MAX_MIN_SPAN_DAYS: i64 = 3660;

/// Timeline layout settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimelineConfig {
    /// Width of one day column
    pub column_width: f64,

    /// Minimum number of days shown
    pub min_span_days: i64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        let options = TimelineOptions::default();
        Self {
            column_width: options.column_width,
            min_span_days: options.min_span_days,
        }
    }
}

impl TimelineConfig {
    /// Converts to layout options, rejecting non-positive values
    pub fn options(&self) -> Result<TimelineOptions, ConfigError> {
        if self.column_width.is_nan() || self.column_width <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "timeline.column_width must be positive, got {}",
                self.column_width
            )));
        }
        if !(0..=MAX_MIN_SPAN_DAYS).contains(&self.min_span_days) {
            return Err(ConfigError::Invalid(format!(
                "timeline.min_span_days must be between 0 and {}, got {}",
                MAX_MIN_SPAN_DAYS, self.min_span_days
            )));
        }
        Ok(TimelineOptions {
            column_width: self.column_width,
            min_span_days: self.min_span_days,
        })
    }
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ProjectConfig {
    pub project: ProjectSection,
    pub timeline: TimelineConfig,
}

impl ProjectConfig {
    /// Returns the project ID, or an error if the config has none
    pub fn require_id(&self) -> Result<&ProjectId, ConfigError> {
        self.project
            .id
            .as_ref()
            .ok_or_else(|| ConfigError::Invalid("project.id is missing".to_string()))
    }
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Combined configuration (global + project)
#[derive(Debug, Clone)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,
    pub project_root: Option<PathBuf>,
}

impl Config {
    /// Loads global configuration only
    pub fn load_global_only() -> Result<Self> {
        Ok(Self {
            project: ProjectConfig::default(),
            global: Self::load_global()?,
            project_root: None,
        })
    }

    /// Loads configuration for a specific project
    pub fn for_project(project_root: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project_config(project_root)?;

        Ok(Self {
            project,
            global,
            project_root: Some(project_root.to_path_buf()),
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "wbs", "wbs").map(|dirs| dirs.config_dir().to_path_buf())
    }

    fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Path of the project config file under a project root
    pub fn project_config_path(project_root: &Path) -> PathBuf {
        project_root.join(".wbs").join("config.toml")
    }

    fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
        let config_path = Self::project_config_path(project_root);

        if !config_path.exists() {
            return Ok(ProjectConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read project config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse project config")
    }

    /// Finds the project root by looking for a `.wbs/` directory
    pub fn find_project_root(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            if current.join(".wbs").is_dir() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Returns the project root, or an error if not in a project
    pub fn require_project_root(&self) -> Result<&Path> {
        self.project_root
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Not in a wbs project. Run 'wbs init' first."))
    }

    /// Saves the project configuration
    pub fn save_project(&self) -> Result<()> {
        let root = self.require_project_root()?;
        let config_path = Self::project_config_path(root);

        let content =
            toml::to_string_pretty(&self.project).context("Failed to serialize project config")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write project config: {}", config_path.display()))
    }
}
