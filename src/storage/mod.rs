//! # Storage Layer
//!
//! Persistence for WBS projects in plain, diffable files.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Work items | JSONL (one JSON per line, tree pre-order) | `.wbs/items.jsonl` |
//! | Config | TOML | `.wbs/config.toml` |
//!
//! ## Concurrency Safety
//!
//! - [`ItemStore`] uses file locking (`fs2`) for concurrent access
//! - Writes are atomic (temp file + rename)
//!
//! ## Project Structure
//!
//! ```text
//! .wbs/
//! ├── config.toml   # Project id/name and timeline settings
//! └── items.jsonl   # All work items
//! ```

mod config;
mod jsonl;
mod project;

pub use config::{Config, ConfigError, GlobalConfig, OutputFormat, ProjectConfig, TimelineConfig};
pub use jsonl::ItemStore;
pub use project::{Project, ProjectError};
