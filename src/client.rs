//! Root client tying navigation and the top-level registry together.

use crate::error::{ClientError, Result};
use crate::remote::RemoteOperations;
use crate::scopes::core::ScopeOwner;
use crate::scopes::navigation::OrganizationScope;
use crate::scopes::registry::ScopeRegistry;
use crate::scopes::revision::RevisionScope;
use crate::types::{BranchIdentity, RevisionId, RevisionMode};
use std::sync::Arc;

/// Client over a branchable table store.
///
/// Scopes can be opened two ways: navigating organization → project →
/// branch, where the branch scope owns its revision scopes, or ad hoc
/// against the client's default branch context, where this client's
/// top-level registry owns them. Each client instance carries its own
/// registry, so separate clients never see each other's broadcasts.
pub struct Client {
    remote: Arc<dyn RemoteOperations>,
    registry: Arc<ScopeRegistry>,
    context: Option<BranchIdentity>,
}

impl Client {
    pub fn new(remote: Arc<dyn RemoteOperations>) -> Self {
        Self {
            remote,
            registry: Arc::new(ScopeRegistry::new()),
            context: None,
        }
    }

    /// Build a client with a default branch context for ad-hoc scopes.
    pub fn with_context(remote: Arc<dyn RemoteOperations>, context: BranchIdentity) -> Self {
        Self {
            remote,
            registry: Arc::new(ScopeRegistry::new()),
            context: Some(context),
        }
    }

    pub fn set_context(&mut self, context: BranchIdentity) {
        self.context = Some(context);
    }

    pub fn context(&self) -> Option<&BranchIdentity> {
        self.context.as_ref()
    }

    /// The registry owning this client's ad-hoc scopes.
    pub fn registry(&self) -> &ScopeRegistry {
        &self.registry
    }

    // --- Navigation ---

    pub fn organization(&self, id: impl Into<String>) -> OrganizationScope {
        OrganizationScope::new(Arc::clone(&self.remote), id.into())
    }

    // --- Ad-hoc scopes against the default context ---

    /// Open a scope on the context branch's draft revision.
    pub async fn draft_scope(&self) -> Result<RevisionScope> {
        let identity = self.require_context()?.clone();
        let draft = self.remote.fetch_draft_revision(&identity).await?;
        Ok(self.make_scope(identity, RevisionMode::Draft, draft))
    }

    /// Open a read-only scope on the context branch's head revision.
    pub async fn head_scope(&self) -> Result<RevisionScope> {
        let identity = self.require_context()?.clone();
        let head = self.remote.fetch_head_revision(&identity).await?;
        Ok(self.make_scope(identity, RevisionMode::Head, head))
    }

    /// Open a read-only scope pinned to `revision` on the context branch.
    pub async fn scope_at(&self, revision: RevisionId) -> Result<RevisionScope> {
        let identity = self.require_context()?.clone();
        if !self.remote.validate_revision(&identity, &revision).await? {
            return Err(ClientError::UnknownRevision(revision));
        }
        Ok(self.make_scope(identity, RevisionMode::Explicit, revision))
    }

    fn require_context(&self) -> Result<&BranchIdentity> {
        self.context.as_ref().ok_or(ClientError::ContextNotSet)
    }

    fn make_scope(
        &self,
        identity: BranchIdentity,
        mode: RevisionMode,
        initial: RevisionId,
    ) -> RevisionScope {
        RevisionScope::new(
            Arc::clone(&self.remote),
            Arc::clone(&self.registry) as Arc<dyn ScopeOwner>,
            identity,
            mode,
            initial,
        )
    }
}
