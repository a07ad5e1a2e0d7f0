//! Shared per-scope state and the owner capability.
//!
//! A [`RevisionScope`](crate::scopes::RevisionScope) and the registry that
//! owns it share one [`ScopeCore`]. The registry only ever calls
//! [`ScopeCore::mark_stale`] on it; everything else is driven by the scope.

use crate::error::Result;
use crate::types::{BranchIdentity, RevisionId, RevisionMode};
use futures::future::{BoxFuture, Shared};
use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Unique identifier for a live scope. Used by staleness broadcasts to
/// exclude the scope that triggered them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u64);

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// A revision refresh in flight, cloned to every concurrent caller.
pub(crate) type RefreshFuture = Shared<BoxFuture<'static, Result<RevisionId>>>;

/// Mutable portion of a scope's state.
///
/// Only touched in synchronous sections; the lock is never held across an
/// await point.
pub(crate) struct ScopeState {
    pub cached_revision: RevisionId,
    pub stale: bool,
    /// Bumped on every `mark_stale`. A refresh snapshots the epoch when it
    /// starts and only clears `stale` if the epoch is still current when it
    /// settles, so a broadcast landing mid-refresh is never lost.
    pub stale_epoch: u64,
    pub disposed: bool,
    pub refresh: Option<RefreshFuture>,
}

/// State shared between a revision scope and the registry that owns it.
pub struct ScopeCore {
    id: ScopeId,
    identity: BranchIdentity,
    mode: RevisionMode,
    state: Mutex<ScopeState>,
}

impl ScopeCore {
    pub(crate) fn new(
        identity: BranchIdentity,
        mode: RevisionMode,
        initial: RevisionId,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: ScopeId(NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed)),
            identity,
            mode,
            state: Mutex::new(ScopeState {
                cached_revision: initial,
                stale: false,
                stale_epoch: 0,
                disposed: false,
                refresh: None,
            }),
        })
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }

    pub fn identity(&self) -> &BranchIdentity {
        &self.identity
    }

    pub fn mode(&self) -> RevisionMode {
        self.mode
    }

    pub fn is_draft(&self) -> bool {
        self.mode == RevisionMode::Draft
    }

    pub fn is_stale(&self) -> bool {
        self.state.lock().stale
    }

    pub fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }

    /// The revision id the scope currently operates against. Authoritative
    /// only while the scope is not stale.
    pub fn cached_revision(&self) -> RevisionId {
        self.state.lock().cached_revision.clone()
    }

    /// Mark the cached revision as outdated. No-op for explicit scopes,
    /// whose id is pinned for life. Idempotent.
    pub fn mark_stale(&self) {
        if self.mode == RevisionMode::Explicit {
            return;
        }
        let mut state = self.state.lock();
        state.stale = true;
        state.stale_epoch += 1;
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, ScopeState> {
        self.state.lock()
    }
}

/// The narrow owner surface a scope needs: registration bookkeeping and
/// staleness broadcast. Keeping it this small lets a scope be exercised
/// against a stub owner.
pub trait ScopeOwner: Send + Sync {
    /// Add a scope to the broadcast set for its identity.
    fn register_scope(&self, core: Arc<ScopeCore>);

    /// Remove a scope from its set. Registries drop an identity's entry
    /// once its set empties.
    fn unregister_scope(&self, core: &ScopeCore);

    /// Mark every registered scope under `identity` stale, except
    /// `excluding` (the scope whose write triggered the broadcast).
    fn notify_branch_changed(&self, identity: &BranchIdentity, excluding: Option<ScopeId>);
}
