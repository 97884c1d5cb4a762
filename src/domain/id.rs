//! Identifiers for projects and work items
//!
//! ID Format:
//! - Project IDs: `p-{7-char-hash}` (e.g., `p-7f2b4c1`)
//! - Work item IDs: `w-{7-char-hash}` (e.g., `w-9d3e5f2`)
//!
//! Hash is derived from name + creation timestamp + a salt. The salt lets a
//! store re-roll an ID when two items with the same name are created within
//! the same instant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const HASH_LEN: usize = 7;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Invalid project ID format: expected 'p-{{7-char-hash}}', got '{0}'")]
    InvalidProjectId(String),

    #[error("Invalid work item ID format: expected 'w-{{7-char-hash}}', got '{0}'")]
    InvalidWorkItemId(String),
}

/// Generates a 7-character hash from name, timestamp and salt
fn generate_hash(name: &str, timestamp: DateTime<Utc>, salt: u32) -> String {
    let input = format!(
        "{}{}{}",
        name,
        timestamp.timestamp_nanos_opt().unwrap_or(0),
        salt
    );
    let hash = blake3::hash(input.as_bytes());
    let hex = hash.to_hex();
    hex[..HASH_LEN].to_string()
}

/// Strips `prefix` and validates the remaining hash portion
fn parse_hash<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let hash = s.strip_prefix(prefix)?;
    if hash.len() == HASH_LEN && hash.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(hash)
    } else {
        None
    }
}

/// Project ID in the format `p-{7-char-hash}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectId {
    hash: String,
}

impl ProjectId {
    /// Creates a new project ID from name and timestamp
    pub fn new(name: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            hash: generate_hash(name, timestamp, 0),
        }
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p-{}", self.hash)
    }
}

impl FromStr for ProjectId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let hash = parse_hash(s, "p-").ok_or_else(|| IdError::InvalidProjectId(s.to_string()))?;
        Ok(Self {
            hash: hash.to_ascii_lowercase(),
        })
    }
}

impl TryFrom<String> for ProjectId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProjectId> for String {
    fn from(id: ProjectId) -> Self {
        id.to_string()
    }
}

/// Work item ID in the format `w-{7-char-hash}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkItemId {
    hash: String,
}

impl WorkItemId {
    /// Creates a new work item ID from name and timestamp
    pub fn new(name: &str, timestamp: DateTime<Utc>) -> Self {
        Self::salted(name, timestamp, 0)
    }

    /// Creates a work item ID with an explicit salt, used to re-roll collisions
    pub fn salted(name: &str, timestamp: DateTime<Utc>, salt: u32) -> Self {
        Self {
            hash: generate_hash(name, timestamp, salt),
        }
    }
}

impl fmt::Display for WorkItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w-{}", self.hash)
    }
}

impl FromStr for WorkItemId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let hash =
            parse_hash(s, "w-").ok_or_else(|| IdError::InvalidWorkItemId(s.to_string()))?;
        Ok(Self {
            hash: hash.to_ascii_lowercase(),
        })
    }
}

impl TryFrom<String> for WorkItemId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WorkItemId> for String {
    fn from(id: WorkItemId) -> Self {
        id.to_string()
    }
}
