//! Core types for the scope layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a single revision within a branch.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RevisionId(pub String);

impl RevisionId {
    pub fn new(id: impl Into<String>) -> Self {
        RevisionId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RevisionId({})", self.0)
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RevisionId {
    fn from(s: &str) -> Self {
        RevisionId(s.to_string())
    }
}

/// Immutable (organization, project, branch) triple naming one branch.
///
/// Used as a registry key: scopes sharing an identity share staleness
/// broadcasts.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BranchIdentity {
    pub organization: String,
    pub project: String,
    pub branch: String,
}

impl BranchIdentity {
    pub fn new(
        organization: impl Into<String>,
        project: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            organization: organization.into(),
            project: project.into(),
            branch: branch.into(),
        }
    }

    /// Composite registry key: the triple joined with '/'.
    pub fn key(&self) -> String {
        format!("{}/{}/{}", self.organization, self.project, self.branch)
    }
}

impl fmt::Display for BranchIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// How a scope tracks its revision. Fixed at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionMode {
    /// The branch's current uncommitted working revision; mutable.
    Draft,
    /// The branch's most recently committed revision; read-only.
    Head,
    /// A pinned revision id; read-only and never refreshed.
    Explicit,
}

impl fmt::Display for RevisionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RevisionMode::Draft => "draft",
            RevisionMode::Head => "head",
            RevisionMode::Explicit => "explicit",
        };
        write!(f, "{}", name)
    }
}

/// A table within a revision, with its JSON Schema description.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub schema: serde_json::Value,
}

/// A single row. Field contents are schema-defined JSON.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Row {
    pub id: String,
    pub fields: serde_json::Value,
}

/// One page of rows plus an optional continuation cursor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RowPage {
    pub rows: Vec<Row>,
    pub cursor: Option<String>,
}

/// Filter, ordering, and pagination parameters for a row query.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RowQuery {
    pub filter: Option<serde_json::Value>,
    pub order_by: Option<String>,
    pub limit: Option<u32>,
    pub cursor: Option<String>,
}

/// An uncommitted change recorded on a draft revision.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub table: String,
    /// Change kind as reported by the server (e.g. "row_created").
    pub kind: String,
    pub payload: serde_json::Value,
}

/// A single schema migration step.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MigrationStep {
    /// Operation name (e.g. "add_column").
    pub operation: String,
    pub payload: serde_json::Value,
}

/// A migration already recorded on the branch.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MigrationInfo {
    /// Revision the migration was applied at.
    pub revision: RevisionId,
    pub steps: Vec<MigrationStep>,
}

/// A generated data endpoint exposed by a revision.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EndpointInfo {
    pub name: String,
    pub path: String,
    pub method: String,
}

/// Reference to a file stored against a row column.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileRef {
    pub id: String,
    pub size: u64,
    pub content_type: String,
}
