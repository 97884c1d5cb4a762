//! Domain models for the WBS engine
//!
//! Contains the core tree logic without any I/O concerns.

mod id;
mod item;
mod tree;
pub mod moves;
mod portfolio;
pub mod progress;
pub mod timeline;

pub use id::{IdError, ProjectId, WorkItemId};
pub use item::{ItemStatus, WorkItem, MAX_LEVEL};
pub use moves::{move_item, potential_parents, LevelChange, MoveOutcome, ParentCandidate};
pub use portfolio::Portfolio;
pub use tree::{Ancestors, TreeError, TreeStore};
