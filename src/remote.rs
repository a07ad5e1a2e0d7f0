//! The remote store surface: one asynchronous operation per server
//! capability.
//!
//! This layer treats every call as opaque. It never retries, never
//! interprets payloads, and passes server failures through unchanged as
//! [`ClientError::Transport`](crate::error::ClientError::Transport). A
//! resolved [`RevisionId`] is threaded into each data operation by the
//! calling scope.

use crate::error::Result;
use crate::types::{
    BranchIdentity, ChangeEntry, EndpointInfo, FileRef, MigrationInfo, MigrationStep, RevisionId,
    Row, RowPage, RowQuery, TableInfo,
};
use async_trait::async_trait;
use serde_json::Value;

/// Typed operations exposed by the server.
///
/// Implementations are expected to be cheap to share (`Arc<dyn
/// RemoteOperations>`); every scope created by a client holds a clone.
#[async_trait]
pub trait RemoteOperations: Send + Sync {
    // --- Revision resolution ---

    /// Fetch the branch's current draft revision id.
    async fn fetch_draft_revision(&self, identity: &BranchIdentity) -> Result<RevisionId>;

    /// Fetch the branch's most recently committed revision id.
    async fn fetch_head_revision(&self, identity: &BranchIdentity) -> Result<RevisionId>;

    /// Check whether `revision` names a revision the server knows about.
    async fn validate_revision(
        &self,
        identity: &BranchIdentity,
        revision: &RevisionId,
    ) -> Result<bool>;

    // --- Tables ---

    async fn list_tables(
        &self,
        identity: &BranchIdentity,
        revision: &RevisionId,
    ) -> Result<Vec<TableInfo>>;

    async fn table_schema(
        &self,
        identity: &BranchIdentity,
        revision: &RevisionId,
        table: &str,
    ) -> Result<TableInfo>;

    async fn create_table(
        &self,
        identity: &BranchIdentity,
        revision: &RevisionId,
        table: &str,
        schema: &Value,
    ) -> Result<TableInfo>;

    async fn update_table(
        &self,
        identity: &BranchIdentity,
        revision: &RevisionId,
        table: &str,
        schema: &Value,
    ) -> Result<TableInfo>;

    async fn rename_table(
        &self,
        identity: &BranchIdentity,
        revision: &RevisionId,
        table: &str,
        new_name: &str,
    ) -> Result<TableInfo>;

    async fn delete_table(
        &self,
        identity: &BranchIdentity,
        revision: &RevisionId,
        table: &str,
    ) -> Result<()>;

    // --- Rows ---

    async fn list_rows(
        &self,
        identity: &BranchIdentity,
        revision: &RevisionId,
        table: &str,
        query: &RowQuery,
    ) -> Result<RowPage>;

    async fn get_row(
        &self,
        identity: &BranchIdentity,
        revision: &RevisionId,
        table: &str,
        row_id: &str,
    ) -> Result<Row>;

    /// Rows in other tables whose `column` references `row_id`.
    async fn linked_rows(
        &self,
        identity: &BranchIdentity,
        revision: &RevisionId,
        table: &str,
        row_id: &str,
        column: &str,
    ) -> Result<RowPage>;

    async fn create_row(
        &self,
        identity: &BranchIdentity,
        revision: &RevisionId,
        table: &str,
        fields: &Value,
    ) -> Result<Row>;

    /// Replace a row's fields entirely.
    async fn update_row(
        &self,
        identity: &BranchIdentity,
        revision: &RevisionId,
        table: &str,
        row_id: &str,
        fields: &Value,
    ) -> Result<Row>;

    /// Merge `fields` into an existing row.
    async fn patch_row(
        &self,
        identity: &BranchIdentity,
        revision: &RevisionId,
        table: &str,
        row_id: &str,
        fields: &Value,
    ) -> Result<Row>;

    async fn delete_row(
        &self,
        identity: &BranchIdentity,
        revision: &RevisionId,
        table: &str,
        row_id: &str,
    ) -> Result<()>;

    async fn insert_rows(
        &self,
        identity: &BranchIdentity,
        revision: &RevisionId,
        table: &str,
        rows: &[Value],
    ) -> Result<Vec<Row>>;

    /// Delete many rows by id; returns the number actually deleted.
    async fn delete_rows(
        &self,
        identity: &BranchIdentity,
        revision: &RevisionId,
        table: &str,
        row_ids: &[String],
    ) -> Result<u64>;

    // --- Changes, migrations, endpoints, files ---

    async fn list_changes(
        &self,
        identity: &BranchIdentity,
        revision: &RevisionId,
    ) -> Result<Vec<ChangeEntry>>;

    async fn list_migrations(
        &self,
        identity: &BranchIdentity,
        revision: &RevisionId,
    ) -> Result<Vec<MigrationInfo>>;

    async fn apply_migrations(
        &self,
        identity: &BranchIdentity,
        revision: &RevisionId,
        steps: &[MigrationStep],
    ) -> Result<()>;

    async fn list_endpoints(
        &self,
        identity: &BranchIdentity,
        revision: &RevisionId,
    ) -> Result<Vec<EndpointInfo>>;

    async fn upload_file(
        &self,
        identity: &BranchIdentity,
        revision: &RevisionId,
        table: &str,
        row_id: &str,
        column: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<FileRef>;

    // --- Branch writes ---

    /// Commit the branch's draft. Returns the committed revision id; the
    /// server allocates a fresh draft as a side effect.
    async fn commit(
        &self,
        identity: &BranchIdentity,
        comment: Option<&str>,
    ) -> Result<RevisionId>;

    /// Discard all uncommitted changes on the branch's draft.
    async fn revert(&self, identity: &BranchIdentity) -> Result<()>;
}
