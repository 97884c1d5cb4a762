//! WBS Engine - hierarchical work breakdown structures
//!
//! A project is decomposed into a tree of work items at most five levels
//! deep. The engine validates structural edits (insert, move, remove),
//! rolls status up into progress percentages and lays the tree out on a
//! day-by-day timeline for Gantt rendering.

pub mod cli;
pub mod domain;
pub mod storage;

pub use domain::{ItemStatus, ProjectId, TreeError, TreeStore, WorkItem, WorkItemId};
