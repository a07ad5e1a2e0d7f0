//! Branch scope: owner of every revision scope bound to one branch.
//!
//! Besides the broadcast registry, a branch scope keeps its own cache of
//! the branch's head and draft revision ids, independent of any individual
//! scope's cache.

use crate::error::{ClientError, Result};
use crate::remote::RemoteOperations;
use crate::scopes::core::{ScopeCore, ScopeId, ScopeOwner};
use crate::scopes::revision::RevisionScope;
use crate::types::{BranchIdentity, RevisionId, RevisionMode};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// The branch's own view of its revision ids.
struct BranchRevisions {
    head: RevisionId,
    draft: RevisionId,
}

/// Registry half of a branch scope. Shared with every revision scope the
/// branch produces, which only reach it through [`ScopeOwner`].
struct BranchRegistry {
    identity: BranchIdentity,
    scopes: Mutex<HashMap<ScopeId, Arc<ScopeCore>>>,
    revisions: Mutex<BranchRevisions>,
}

impl ScopeOwner for BranchRegistry {
    fn register_scope(&self, core: Arc<ScopeCore>) {
        self.scopes.lock().insert(core.id(), core);
    }

    fn unregister_scope(&self, core: &ScopeCore) {
        self.scopes.lock().remove(&core.id());
    }

    fn notify_branch_changed(&self, identity: &BranchIdentity, excluding: Option<ScopeId>) {
        if identity != &self.identity {
            return;
        }
        let scopes = self.scopes.lock();
        debug!(identity = %identity, scopes = scopes.len(), "branch changed, broadcasting staleness");
        for (id, core) in scopes.iter() {
            if Some(*id) != excluding {
                core.mark_stale();
            }
        }
    }
}

/// A handle to one branch: factory for revision scopes and broadcast owner
/// for all of them.
pub struct BranchScope {
    remote: Arc<dyn RemoteOperations>,
    registry: Arc<BranchRegistry>,
}

impl BranchScope {
    /// Open a branch scope, fetching the branch's current head and draft
    /// revision ids.
    pub(crate) async fn open(
        remote: Arc<dyn RemoteOperations>,
        identity: BranchIdentity,
    ) -> Result<Self> {
        let head = remote.fetch_head_revision(&identity).await?;
        let draft = remote.fetch_draft_revision(&identity).await?;
        Ok(Self {
            remote,
            registry: Arc::new(BranchRegistry {
                identity,
                scopes: Mutex::new(HashMap::new()),
                revisions: Mutex::new(BranchRevisions { head, draft }),
            }),
        })
    }

    pub fn identity(&self) -> &BranchIdentity {
        &self.registry.identity
    }

    /// The branch's last known head revision id.
    pub fn head_revision(&self) -> RevisionId {
        self.registry.revisions.lock().head.clone()
    }

    /// The branch's last known draft revision id.
    pub fn draft_revision(&self) -> RevisionId {
        self.registry.revisions.lock().draft.clone()
    }

    /// Number of live revision scopes registered under this branch.
    pub fn scope_count(&self) -> usize {
        self.registry.scopes.lock().len()
    }

    /// Re-fetch both revision ids. Call after writes under this branch to
    /// keep the branch's own cache consistent.
    pub async fn refresh_revision_ids(&self) -> Result<()> {
        let head = self.remote.fetch_head_revision(self.identity()).await?;
        let draft = self.remote.fetch_draft_revision(self.identity()).await?;
        let mut revisions = self.registry.revisions.lock();
        revisions.head = head;
        revisions.draft = draft;
        Ok(())
    }

    /// Open a scope on the branch's draft revision.
    pub async fn draft(&self) -> Result<RevisionScope> {
        let draft = self.remote.fetch_draft_revision(self.identity()).await?;
        self.registry.revisions.lock().draft = draft.clone();
        Ok(self.make_scope(RevisionMode::Draft, draft))
    }

    /// Open a read-only scope on the branch's head revision.
    pub async fn head(&self) -> Result<RevisionScope> {
        let head = self.remote.fetch_head_revision(self.identity()).await?;
        self.registry.revisions.lock().head = head.clone();
        Ok(self.make_scope(RevisionMode::Head, head))
    }

    /// Open a read-only scope pinned to a specific revision. Fails with
    /// [`ClientError::UnknownRevision`] if the server does not recognize
    /// the id.
    pub async fn at(&self, revision: RevisionId) -> Result<RevisionScope> {
        if !self
            .remote
            .validate_revision(self.identity(), &revision)
            .await?
        {
            return Err(ClientError::UnknownRevision(revision));
        }
        Ok(self.make_scope(RevisionMode::Explicit, revision))
    }

    fn make_scope(&self, mode: RevisionMode, initial: RevisionId) -> RevisionScope {
        RevisionScope::new(
            Arc::clone(&self.remote),
            self.registry.clone() as Arc<dyn ScopeOwner>,
            self.identity().clone(),
            mode,
            initial,
        )
    }
}
