//! Work item domain model
//!
//! Work items are the nodes of a project's breakdown structure. The tree
//! shape lives in `parent_id`; children are derived by the store and never
//! stored on the record itself.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::id::{ProjectId, WorkItemId};
use super::tree::TreeError;

/// Deepest level a work item may sit at (roots are level 1)
pub const MAX_LEVEL: u8 = 5;

/// Status of a work item
///
/// Deserialization is lenient: an unrecognized token degrades to
/// `NotStarted` instead of failing the whole snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum ItemStatus {
    #[default]
    NotStarted,
    InProgress,
    Paused,
    Completed,
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 4] = [
        ItemStatus::NotStarted,
        ItemStatus::InProgress,
        ItemStatus::Paused,
        ItemStatus::Completed,
    ];

    /// Progress contributed by the status alone, in percent
    pub fn progress_weight(&self) -> u8 {
        match self {
            ItemStatus::NotStarted => 0,
            ItemStatus::Paused => 25,
            ItemStatus::InProgress => 50,
            ItemStatus::Completed => 100,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::NotStarted => "not_started",
            ItemStatus::InProgress => "in_progress",
            ItemStatus::Paused => "paused",
            ItemStatus::Completed => "completed",
        }
    }

    /// Recognizes a status token, ignoring case and `_`/`-`/space separators
    pub fn from_token(token: &str) -> Option<Self> {
        let normalized: String = token
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "notstarted" | "todo" => Some(ItemStatus::NotStarted),
            "inprogress" | "doing" => Some(ItemStatus::InProgress),
            "paused" | "onhold" => Some(ItemStatus::Paused),
            "completed" | "done" => Some(ItemStatus::Completed),
            _ => None,
        }
    }

    /// Like [`ItemStatus::from_token`], but unknown tokens become `NotStarted`
    pub fn from_token_lenient(token: &str) -> Self {
        Self::from_token(token).unwrap_or_else(|| {
            tracing::warn!(token, "unrecognized status token, treating as not_started");
            ItemStatus::NotStarted
        })
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s).ok_or_else(|| TreeError::InvalidStatus(s.to_string()))
    }
}

impl From<String> for ItemStatus {
    fn from(value: String) -> Self {
        Self::from_token_lenient(&value)
    }
}

/// A node in a project's work breakdown structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Unique identifier
    pub id: WorkItemId,

    /// Owning project
    pub project_id: ProjectId,

    /// Parent item (None = root)
    #[serde(default)]
    pub parent_id: Option<WorkItemId>,

    /// Human-readable name
    pub name: String,

    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Depth in the tree, 1 for roots
    pub level: u8,

    /// Ordering key among siblings
    pub position: i64,

    #[serde(default)]
    pub status: ItemStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_start: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_end: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_start: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_end: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl WorkItem {
    /// Creates a root-level item with default status and no dates
    pub fn new(id: WorkItemId, project_id: ProjectId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            project_id,
            parent_id: None,
            name: name.into(),
            description: None,
            level: 1,
            position: 0,
            status: ItemStatus::NotStarted,
            planned_start: None,
            planned_end: None,
            actual_start: None,
            actual_end: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if this item sits at the top of the tree
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Returns true if this item may not gain children
    pub fn at_max_depth(&self) -> bool {
        self.level >= MAX_LEVEL
    }

    /// Marks the record as modified now
    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
