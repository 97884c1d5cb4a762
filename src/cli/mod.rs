//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Project setup | `init` |
//! | Item | Work item management | `item add`, `item mv`, `item status` |
//! | Query | Derived views | `tree`, `progress`, `timeline` |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Logging
//!
//! Logs go to stderr. `--verbose` (or `-v`) enables debug logs; otherwise
//! `RUST_LOG` is honored:
//! ```bash
//! wbs --verbose item mv w-1a2b3c4 --root
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod item;
mod output;
mod query;
mod render;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
