//! Scripted remote store shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use revscope::{
    BranchIdentity, ChangeEntry, ClientError, EndpointInfo, FileRef, MigrationInfo, MigrationStep,
    RemoteOperations, Result, RevisionId, Row, RowPage, RowQuery, TableInfo,
};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct MockRevisions {
    head: RevisionId,
    draft: RevisionId,
    known: HashSet<String>,
}

/// In-memory remote with per-operation call counters.
///
/// Commits promote the current draft to head and allocate a fresh draft id
/// (`d1`, `d2`, ...). Revision fetches capture the id first and then sleep
/// for the configured delay, so a fetch in flight across a commit resolves
/// to the pre-commit id.
pub struct MockRemote {
    revisions: Mutex<MockRevisions>,
    next_draft: AtomicUsize,
    fetch_delay: Mutex<Option<Duration>>,
    fail_next_draft_fetch: AtomicBool,
    last_data_revision: Mutex<Option<RevisionId>>,

    draft_fetches: AtomicUsize,
    head_fetches: AtomicUsize,
    validations: AtomicUsize,
    commits: AtomicUsize,
    reverts: AtomicUsize,
    data_calls: AtomicUsize,
    calls: AtomicUsize,
}

impl MockRemote {
    pub fn new(head: &str, draft: &str) -> Arc<Self> {
        let mut known = HashSet::new();
        known.insert(head.to_string());
        known.insert(draft.to_string());
        Arc::new(Self {
            revisions: Mutex::new(MockRevisions {
                head: RevisionId::from(head),
                draft: RevisionId::from(draft),
                known,
            }),
            next_draft: AtomicUsize::new(1),
            fetch_delay: Mutex::new(None),
            fail_next_draft_fetch: AtomicBool::new(false),
            last_data_revision: Mutex::new(None),
            draft_fetches: AtomicUsize::new(0),
            head_fetches: AtomicUsize::new(0),
            validations: AtomicUsize::new(0),
            commits: AtomicUsize::new(0),
            reverts: AtomicUsize::new(0),
            data_calls: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn identity() -> BranchIdentity {
        BranchIdentity::new("org1", "proj1", "main")
    }

    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock().unwrap() = Some(delay);
    }

    pub fn clear_fetch_delay(&self) {
        *self.fetch_delay.lock().unwrap() = None;
    }

    pub fn fail_next_draft_fetch(&self) {
        self.fail_next_draft_fetch.store(true, Ordering::SeqCst);
    }

    pub fn draft_fetch_count(&self) -> usize {
        self.draft_fetches.load(Ordering::SeqCst)
    }

    pub fn head_fetch_count(&self) -> usize {
        self.head_fetches.load(Ordering::SeqCst)
    }

    pub fn validation_count(&self) -> usize {
        self.validations.load(Ordering::SeqCst)
    }

    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn data_call_count(&self) -> usize {
        self.data_calls.load(Ordering::SeqCst)
    }

    /// Total calls of any kind.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Revision id passed to the most recent data operation.
    pub fn last_data_revision(&self) -> Option<RevisionId> {
        self.last_data_revision.lock().unwrap().clone()
    }

    fn record_data_call(&self, revision: &RevisionId) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.data_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_data_revision.lock().unwrap() = Some(revision.clone());
    }

    async fn apply_fetch_delay(&self) {
        let delay = *self.fetch_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl RemoteOperations for MockRemote {
    async fn fetch_draft_revision(&self, _identity: &BranchIdentity) -> Result<RevisionId> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.draft_fetches.fetch_add(1, Ordering::SeqCst);
        let captured = self.revisions.lock().unwrap().draft.clone();
        self.apply_fetch_delay().await;
        if self.fail_next_draft_fetch.swap(false, Ordering::SeqCst) {
            return Err(ClientError::transport_with_status(503, "draft fetch failed"));
        }
        Ok(captured)
    }

    async fn fetch_head_revision(&self, _identity: &BranchIdentity) -> Result<RevisionId> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.head_fetches.fetch_add(1, Ordering::SeqCst);
        let captured = self.revisions.lock().unwrap().head.clone();
        self.apply_fetch_delay().await;
        Ok(captured)
    }

    async fn validate_revision(
        &self,
        _identity: &BranchIdentity,
        revision: &RevisionId,
    ) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.validations.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .revisions
            .lock()
            .unwrap()
            .known
            .contains(revision.as_str()))
    }

    async fn list_tables(
        &self,
        _identity: &BranchIdentity,
        revision: &RevisionId,
    ) -> Result<Vec<TableInfo>> {
        self.record_data_call(revision);
        Ok(Vec::new())
    }

    async fn table_schema(
        &self,
        _identity: &BranchIdentity,
        revision: &RevisionId,
        table: &str,
    ) -> Result<TableInfo> {
        self.record_data_call(revision);
        Ok(TableInfo {
            name: table.to_string(),
            schema: json!({}),
        })
    }

    async fn create_table(
        &self,
        _identity: &BranchIdentity,
        revision: &RevisionId,
        table: &str,
        schema: &Value,
    ) -> Result<TableInfo> {
        self.record_data_call(revision);
        Ok(TableInfo {
            name: table.to_string(),
            schema: schema.clone(),
        })
    }

    async fn update_table(
        &self,
        _identity: &BranchIdentity,
        revision: &RevisionId,
        table: &str,
        schema: &Value,
    ) -> Result<TableInfo> {
        self.record_data_call(revision);
        Ok(TableInfo {
            name: table.to_string(),
            schema: schema.clone(),
        })
    }

    async fn rename_table(
        &self,
        _identity: &BranchIdentity,
        revision: &RevisionId,
        _table: &str,
        new_name: &str,
    ) -> Result<TableInfo> {
        self.record_data_call(revision);
        Ok(TableInfo {
            name: new_name.to_string(),
            schema: json!({}),
        })
    }

    async fn delete_table(
        &self,
        _identity: &BranchIdentity,
        revision: &RevisionId,
        _table: &str,
    ) -> Result<()> {
        self.record_data_call(revision);
        Ok(())
    }

    async fn list_rows(
        &self,
        _identity: &BranchIdentity,
        revision: &RevisionId,
        _table: &str,
        _query: &RowQuery,
    ) -> Result<RowPage> {
        self.record_data_call(revision);
        Ok(RowPage {
            rows: Vec::new(),
            cursor: None,
        })
    }

    async fn get_row(
        &self,
        _identity: &BranchIdentity,
        revision: &RevisionId,
        _table: &str,
        row_id: &str,
    ) -> Result<Row> {
        self.record_data_call(revision);
        Ok(Row {
            id: row_id.to_string(),
            fields: json!({}),
        })
    }

    async fn linked_rows(
        &self,
        _identity: &BranchIdentity,
        revision: &RevisionId,
        _table: &str,
        _row_id: &str,
        _column: &str,
    ) -> Result<RowPage> {
        self.record_data_call(revision);
        Ok(RowPage {
            rows: Vec::new(),
            cursor: None,
        })
    }

    async fn create_row(
        &self,
        _identity: &BranchIdentity,
        revision: &RevisionId,
        _table: &str,
        fields: &Value,
    ) -> Result<Row> {
        self.record_data_call(revision);
        Ok(Row {
            id: "r1".to_string(),
            fields: fields.clone(),
        })
    }

    async fn update_row(
        &self,
        _identity: &BranchIdentity,
        revision: &RevisionId,
        _table: &str,
        row_id: &str,
        fields: &Value,
    ) -> Result<Row> {
        self.record_data_call(revision);
        Ok(Row {
            id: row_id.to_string(),
            fields: fields.clone(),
        })
    }

    async fn patch_row(
        &self,
        _identity: &BranchIdentity,
        revision: &RevisionId,
        _table: &str,
        row_id: &str,
        fields: &Value,
    ) -> Result<Row> {
        self.record_data_call(revision);
        Ok(Row {
            id: row_id.to_string(),
            fields: fields.clone(),
        })
    }

    async fn delete_row(
        &self,
        _identity: &BranchIdentity,
        revision: &RevisionId,
        _table: &str,
        _row_id: &str,
    ) -> Result<()> {
        self.record_data_call(revision);
        Ok(())
    }

    async fn insert_rows(
        &self,
        _identity: &BranchIdentity,
        revision: &RevisionId,
        _table: &str,
        rows: &[Value],
    ) -> Result<Vec<Row>> {
        self.record_data_call(revision);
        Ok(rows
            .iter()
            .enumerate()
            .map(|(i, fields)| Row {
                id: format!("r{}", i + 1),
                fields: fields.clone(),
            })
            .collect())
    }

    async fn delete_rows(
        &self,
        _identity: &BranchIdentity,
        revision: &RevisionId,
        _table: &str,
        row_ids: &[String],
    ) -> Result<u64> {
        self.record_data_call(revision);
        Ok(row_ids.len() as u64)
    }

    async fn list_changes(
        &self,
        _identity: &BranchIdentity,
        revision: &RevisionId,
    ) -> Result<Vec<ChangeEntry>> {
        self.record_data_call(revision);
        Ok(Vec::new())
    }

    async fn list_migrations(
        &self,
        _identity: &BranchIdentity,
        revision: &RevisionId,
    ) -> Result<Vec<MigrationInfo>> {
        self.record_data_call(revision);
        Ok(Vec::new())
    }

    async fn apply_migrations(
        &self,
        _identity: &BranchIdentity,
        revision: &RevisionId,
        _steps: &[MigrationStep],
    ) -> Result<()> {
        self.record_data_call(revision);
        Ok(())
    }

    async fn list_endpoints(
        &self,
        _identity: &BranchIdentity,
        revision: &RevisionId,
    ) -> Result<Vec<EndpointInfo>> {
        self.record_data_call(revision);
        Ok(Vec::new())
    }

    async fn upload_file(
        &self,
        _identity: &BranchIdentity,
        revision: &RevisionId,
        _table: &str,
        _row_id: &str,
        _column: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<FileRef> {
        self.record_data_call(revision);
        Ok(FileRef {
            id: "f1".to_string(),
            size: data.len() as u64,
            content_type: content_type.to_string(),
        })
    }

    async fn commit(
        &self,
        _identity: &BranchIdentity,
        _comment: Option<&str>,
    ) -> Result<RevisionId> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.commits.fetch_add(1, Ordering::SeqCst);
        let mut revisions = self.revisions.lock().unwrap();
        let committed = revisions.draft.clone();
        revisions.head = committed.clone();
        let n = self.next_draft.fetch_add(1, Ordering::SeqCst);
        let fresh = RevisionId::new(format!("d{}", n));
        revisions.known.insert(fresh.as_str().to_string());
        revisions.draft = fresh;
        Ok(committed)
    }

    async fn revert(&self, _identity: &BranchIdentity) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reverts.fetch_add(1, Ordering::SeqCst);
        // Discarding changes resets the draft to a fresh revision id.
        let mut revisions = self.revisions.lock().unwrap();
        let n = self.next_draft.fetch_add(1, Ordering::SeqCst);
        let fresh = RevisionId::new(format!("d{}", n));
        revisions.known.insert(fresh.as_str().to_string());
        revisions.draft = fresh;
        Ok(())
    }
}
