//! Revision scope: the handle every data operation goes through.
//!
//! A scope caches one revision id and refreshes it lazily when its owner
//! broadcasts staleness. Concurrent callers of a stale scope share a single
//! in-flight refresh; a failed refresh leaves the scope stale so the next
//! caller retries naturally.

use crate::error::{ClientError, Result};
use crate::remote::RemoteOperations;
use crate::scopes::core::{RefreshFuture, ScopeCore, ScopeOwner};
use crate::types::{
    BranchIdentity, ChangeEntry, EndpointInfo, FileRef, MigrationInfo, MigrationStep, RevisionId,
    RevisionMode, Row, RowPage, RowQuery, TableInfo,
};
use futures::FutureExt;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A disposable handle bound to one (identity, revision) pair.
///
/// Draft scopes accept mutations; head and explicit scopes are read-only.
/// Scopes belonging to the same branch identity are kept coherent by their
/// owner: a commit on one marks the others stale, and each refreshes on its
/// next use.
pub struct RevisionScope {
    core: Arc<ScopeCore>,
    remote: Arc<dyn RemoteOperations>,
    owner: Arc<dyn ScopeOwner>,
}

impl fmt::Debug for RevisionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RevisionScope({}, {})",
            self.core.identity(),
            self.core.mode()
        )
    }
}

impl RevisionScope {
    /// Build a scope and register it with its owner. The initial revision
    /// id must already be resolved.
    pub(crate) fn new(
        remote: Arc<dyn RemoteOperations>,
        owner: Arc<dyn ScopeOwner>,
        identity: BranchIdentity,
        mode: RevisionMode,
        initial: RevisionId,
    ) -> Self {
        let core = ScopeCore::new(identity, mode, initial);
        owner.register_scope(Arc::clone(&core));
        Self {
            core,
            remote,
            owner,
        }
    }

    // --- Introspection ---

    pub fn identity(&self) -> &BranchIdentity {
        self.core.identity()
    }

    pub fn mode(&self) -> RevisionMode {
        self.core.mode()
    }

    pub fn is_draft(&self) -> bool {
        self.core.is_draft()
    }

    pub fn is_stale(&self) -> bool {
        self.core.is_stale()
    }

    pub fn is_disposed(&self) -> bool {
        self.core.is_disposed()
    }

    /// The currently cached revision id, without refreshing.
    pub fn cached_revision(&self) -> RevisionId {
        self.core.cached_revision()
    }

    // --- Revision resolution ---

    /// The revision id this scope operates against, refreshed first if the
    /// scope is stale.
    ///
    /// At most one refresh fetch is outstanding per scope: concurrent
    /// callers of a stale scope all await the same shared future. A failed
    /// refresh is reported to every waiter and leaves the scope stale, so a
    /// later call retries.
    pub async fn resolve_revision(&self) -> Result<RevisionId> {
        let refresh = {
            let mut state = self.core.state();
            if state.disposed {
                return Err(ClientError::Disposed);
            }
            if !state.stale {
                return Ok(state.cached_revision.clone());
            }
            match &state.refresh {
                Some(pending) => pending.clone(),
                None => {
                    let started = self.start_refresh(state.stale_epoch);
                    state.refresh = Some(started.clone());
                    started
                }
            }
        };
        refresh.await
    }

    /// Start a refresh fetch for the current mode. `epoch` is the stale
    /// epoch observed under the lock when the refresh was scheduled; if it
    /// has moved on by the time the fetch settles, the result is returned
    /// to waiters but the scope stays stale.
    fn start_refresh(&self, epoch: u64) -> RefreshFuture {
        let remote = Arc::clone(&self.remote);
        let core = Arc::clone(&self.core);
        debug!(scope = core.id().0, identity = %core.identity(), "refreshing revision id");
        async move {
            let fetched = match core.mode() {
                RevisionMode::Draft => remote.fetch_draft_revision(core.identity()).await,
                _ => remote.fetch_head_revision(core.identity()).await,
            };
            let mut state = core.state();
            state.refresh = None;
            match fetched {
                Ok(revision) => {
                    if state.stale_epoch == epoch {
                        state.cached_revision = revision.clone();
                        state.stale = false;
                    }
                    Ok(revision)
                }
                Err(err) => {
                    debug!(scope = core.id().0, error = %err, "revision refresh failed");
                    Err(err)
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Mark this scope's cached revision as outdated. No-op for explicit
    /// scopes. Idempotent.
    pub fn mark_stale(&self) {
        self.core.mark_stale();
    }

    /// Unregister from the owner and refuse all further operations.
    /// Idempotent; does not cancel an in-flight refresh, whose outcome is
    /// discarded.
    pub fn dispose(&self) {
        let already = {
            let mut state = self.core.state();
            std::mem::replace(&mut state.disposed, true)
        };
        if !already {
            debug!(scope = self.core.id().0, identity = %self.core.identity(), "scope disposed");
            self.owner.unregister_scope(&self.core);
        }
    }

    fn ensure_draft(&self) -> Result<()> {
        if self.core.is_disposed() {
            return Err(ClientError::Disposed);
        }
        if !self.core.is_draft() {
            return Err(ClientError::NotDraft {
                mode: self.core.mode(),
            });
        }
        Ok(())
    }

    /// After a branch-level write (commit, revert, migrations): re-fetch
    /// the draft id directly, make this scope fresh, then stale every
    /// sibling. The writing scope is consistent before anyone else learns
    /// of the change. If the re-fetch itself fails, the whole branch,
    /// writer included, is marked stale before the error surfaces.
    async fn after_branch_write(&self) -> Result<()> {
        match self.remote.fetch_draft_revision(self.core.identity()).await {
            Ok(draft) => {
                {
                    let mut state = self.core.state();
                    state.cached_revision = draft;
                    state.stale = false;
                    // Invalidate any refresh still in flight; its fetched id
                    // predates this write.
                    state.stale_epoch += 1;
                }
                self.owner
                    .notify_branch_changed(self.core.identity(), Some(self.core.id()));
                Ok(())
            }
            Err(err) => {
                // The write already went through server-side, so every cache
                // on the branch is behind, this scope's included. Stale them
                // all; the next resolve on any scope re-fetches.
                self.core.mark_stale();
                self.owner
                    .notify_branch_changed(self.core.identity(), Some(self.core.id()));
                Err(err)
            }
        }
    }

    // --- Read operations (any mode) ---

    pub async fn list_tables(&self) -> Result<Vec<TableInfo>> {
        let revision = self.resolve_revision().await?;
        self.remote.list_tables(self.identity(), &revision).await
    }

    pub async fn table_schema(&self, table: &str) -> Result<TableInfo> {
        let revision = self.resolve_revision().await?;
        self.remote
            .table_schema(self.identity(), &revision, table)
            .await
    }

    pub async fn list_rows(&self, table: &str) -> Result<RowPage> {
        self.query_rows(table, &RowQuery::default()).await
    }

    pub async fn query_rows(&self, table: &str, query: &RowQuery) -> Result<RowPage> {
        let revision = self.resolve_revision().await?;
        self.remote
            .list_rows(self.identity(), &revision, table, query)
            .await
    }

    pub async fn get_row(&self, table: &str, row_id: &str) -> Result<Row> {
        let revision = self.resolve_revision().await?;
        self.remote
            .get_row(self.identity(), &revision, table, row_id)
            .await
    }

    /// Rows in other tables whose `column` references `row_id`.
    pub async fn linked_rows(&self, table: &str, row_id: &str, column: &str) -> Result<RowPage> {
        let revision = self.resolve_revision().await?;
        self.remote
            .linked_rows(self.identity(), &revision, table, row_id, column)
            .await
    }

    /// Uncommitted changes recorded on this revision.
    pub async fn list_changes(&self) -> Result<Vec<ChangeEntry>> {
        let revision = self.resolve_revision().await?;
        self.remote.list_changes(self.identity(), &revision).await
    }

    pub async fn list_migrations(&self) -> Result<Vec<MigrationInfo>> {
        let revision = self.resolve_revision().await?;
        self.remote
            .list_migrations(self.identity(), &revision)
            .await
    }

    pub async fn list_endpoints(&self) -> Result<Vec<EndpointInfo>> {
        let revision = self.resolve_revision().await?;
        self.remote
            .list_endpoints(self.identity(), &revision)
            .await
    }

    // --- Mutating operations (draft scopes only) ---

    pub async fn create_table(&self, table: &str, schema: &Value) -> Result<TableInfo> {
        self.ensure_draft()?;
        let revision = self.resolve_revision().await?;
        self.remote
            .create_table(self.identity(), &revision, table, schema)
            .await
    }

    pub async fn update_table(&self, table: &str, schema: &Value) -> Result<TableInfo> {
        self.ensure_draft()?;
        let revision = self.resolve_revision().await?;
        self.remote
            .update_table(self.identity(), &revision, table, schema)
            .await
    }

    pub async fn rename_table(&self, table: &str, new_name: &str) -> Result<TableInfo> {
        self.ensure_draft()?;
        let revision = self.resolve_revision().await?;
        self.remote
            .rename_table(self.identity(), &revision, table, new_name)
            .await
    }

    pub async fn delete_table(&self, table: &str) -> Result<()> {
        self.ensure_draft()?;
        let revision = self.resolve_revision().await?;
        self.remote
            .delete_table(self.identity(), &revision, table)
            .await
    }

    pub async fn create_row(&self, table: &str, fields: &Value) -> Result<Row> {
        self.ensure_draft()?;
        let revision = self.resolve_revision().await?;
        self.remote
            .create_row(self.identity(), &revision, table, fields)
            .await
    }

    pub async fn update_row(&self, table: &str, row_id: &str, fields: &Value) -> Result<Row> {
        self.ensure_draft()?;
        let revision = self.resolve_revision().await?;
        self.remote
            .update_row(self.identity(), &revision, table, row_id, fields)
            .await
    }

    pub async fn patch_row(&self, table: &str, row_id: &str, fields: &Value) -> Result<Row> {
        self.ensure_draft()?;
        let revision = self.resolve_revision().await?;
        self.remote
            .patch_row(self.identity(), &revision, table, row_id, fields)
            .await
    }

    pub async fn delete_row(&self, table: &str, row_id: &str) -> Result<()> {
        self.ensure_draft()?;
        let revision = self.resolve_revision().await?;
        self.remote
            .delete_row(self.identity(), &revision, table, row_id)
            .await
    }

    pub async fn insert_rows(&self, table: &str, rows: &[Value]) -> Result<Vec<Row>> {
        self.ensure_draft()?;
        let revision = self.resolve_revision().await?;
        self.remote
            .insert_rows(self.identity(), &revision, table, rows)
            .await
    }

    pub async fn delete_rows(&self, table: &str, row_ids: &[String]) -> Result<u64> {
        self.ensure_draft()?;
        let revision = self.resolve_revision().await?;
        self.remote
            .delete_rows(self.identity(), &revision, table, row_ids)
            .await
    }

    pub async fn upload_file(
        &self,
        table: &str,
        row_id: &str,
        column: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<FileRef> {
        self.ensure_draft()?;
        let revision = self.resolve_revision().await?;
        self.remote
            .upload_file(
                self.identity(),
                &revision,
                table,
                row_id,
                column,
                data,
                content_type,
            )
            .await
    }

    // --- Branch writes (draft scopes only) ---

    /// Commit the draft. Returns the committed revision id; this scope then
    /// tracks the branch's fresh draft, and every sibling is marked stale.
    pub async fn commit(&self, comment: Option<&str>) -> Result<RevisionId> {
        self.ensure_draft()?;
        let committed = self.remote.commit(self.identity(), comment).await?;
        debug!(identity = %self.identity(), revision = %committed, "draft committed");
        self.after_branch_write().await?;
        Ok(committed)
    }

    /// Discard all uncommitted changes on the draft.
    pub async fn revert_changes(&self) -> Result<()> {
        self.ensure_draft()?;
        self.remote.revert(self.identity()).await?;
        self.after_branch_write().await
    }

    /// Apply schema migrations to the draft.
    pub async fn apply_migrations(&self, steps: &[MigrationStep]) -> Result<()> {
        self.ensure_draft()?;
        let revision = self.resolve_revision().await?;
        self.remote
            .apply_migrations(self.identity(), &revision, steps)
            .await?;
        self.after_branch_write().await
    }
}
