//! Identifiers for projects and tasks
//!
//! IDs are supplied by whatever layer owns the records, so they are opaque
//! strings here. They must be non-empty, contain no whitespace and be at most
//! [`MAX_ID_LEN`] bytes long. IDs order lexicographically, which is the final
//! tie-breaker for every ordering the estimator produces.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum length of an identifier in bytes
pub const MAX_ID_LEN: usize = 64;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Identifier must not be empty")]
    Empty,

    #[error("Identifier must not contain whitespace: '{0}'")]
    Whitespace(String),

    #[error("Identifier longer than {max} bytes: '{0}'", max = MAX_ID_LEN)]
    TooLong(String),
}

fn validate(raw: &str) -> Result<String, IdError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(IdError::Empty);
    }
    if s.chars().any(char::is_whitespace) {
        return Err(IdError::Whitespace(s.to_string()));
    }
    if s.len() > MAX_ID_LEN {
        return Err(IdError::TooLong(s.to_string()));
    }
    Ok(s.to_string())
}

/// Task identifier, unique within a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId(String);

impl TaskId {
    /// Creates a task ID, validating its format
    pub fn new(raw: &str) -> Result<Self, IdError> {
        validate(raw).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TaskId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for TaskId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.0
    }
}

/// Project identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectId(String);

impl ProjectId {
    /// Creates a project ID, validating its format
    pub fn new(raw: &str) -> Result<Self, IdError> {
        validate(raw).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ProjectId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
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
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_task_id() {
        let id: TaskId = "api-1".parse().unwrap();
        assert_eq!(id.as_str(), "api-1");
        assert_eq!(id.to_string(), "api-1");
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let id: TaskId = "  api-1 \n".parse().unwrap();
        assert_eq!(id.as_str(), "api-1");
    }

    #[test]
    fn empty_id_rejected() {
        assert_eq!("".parse::<TaskId>(), Err(IdError::Empty));
        assert_eq!("   ".parse::<ProjectId>(), Err(IdError::Empty));
    }

    #[test]
    fn inner_whitespace_rejected() {
        assert!(matches!(
            "write docs".parse::<TaskId>(),
            Err(IdError::Whitespace(_))
        ));
    }

    #[test]
    fn overlong_id_rejected() {
        let raw = "x".repeat(MAX_ID_LEN + 1);
        assert!(matches!(raw.parse::<TaskId>(), Err(IdError::TooLong(_))));

        let raw = "x".repeat(MAX_ID_LEN);
        assert!(raw.parse::<TaskId>().is_ok());
    }

    #[test]
    fn ids_order_lexicographically() {
        let mut ids: Vec<TaskId> = ["b", "a10", "a2", "A"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        ids.sort();

        let sorted: Vec<_> = ids.iter().map(TaskId::as_str).collect();
        assert_eq!(sorted, vec!["A", "a10", "a2", "b"]);
    }

    #[test]
    fn serde_as_plain_string() {
        let id = TaskId::new("t-1").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"t-1\"");

        let parsed: TaskId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn serde_rejects_invalid_id() {
        let result: Result<ProjectId, _> = serde_json::from_str("\"has space\"");
        assert!(result.is_err());
    }
}
