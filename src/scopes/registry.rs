//! Top-level scope registry.
//!
//! Owner for scopes created ad hoc from a [`Client`](crate::Client) rather
//! than through an explicit branch scope. Keys broadcast sets by branch
//! identity so one registry can multiplex staleness across many branches.

use crate::scopes::core::{ScopeCore, ScopeId, ScopeOwner};
use crate::types::BranchIdentity;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Identity-keyed registry of live revision scopes.
///
/// Purely in-memory bookkeeping: registration never fails, and an
/// identity's entry is dropped as soon as its last scope unregisters, so
/// long-lived clients that repeatedly open and dispose scopes do not leak.
pub struct ScopeRegistry {
    scopes: Mutex<HashMap<String, HashMap<ScopeId, Arc<ScopeCore>>>>,
}

impl ScopeRegistry {
    pub fn new() -> Self {
        Self {
            scopes: Mutex::new(HashMap::new()),
        }
    }

    /// Number of live scopes registered under `identity`.
    pub fn scope_count(&self, identity: &BranchIdentity) -> usize {
        self.scopes
            .lock()
            .get(&identity.key())
            .map_or(0, |set| set.len())
    }

    /// Number of identities with at least one live scope.
    pub fn identity_count(&self) -> usize {
        self.scopes.lock().len()
    }
}

impl Default for ScopeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeOwner for ScopeRegistry {
    fn register_scope(&self, core: Arc<ScopeCore>) {
        self.scopes
            .lock()
            .entry(core.identity().key())
            .or_default()
            .insert(core.id(), core);
    }

    fn unregister_scope(&self, core: &ScopeCore) {
        let mut scopes = self.scopes.lock();
        let key = core.identity().key();
        if let Some(set) = scopes.get_mut(&key) {
            set.remove(&core.id());
            if set.is_empty() {
                scopes.remove(&key);
            }
        }
    }

    fn notify_branch_changed(&self, identity: &BranchIdentity, excluding: Option<ScopeId>) {
        let scopes = self.scopes.lock();
        if let Some(set) = scopes.get(&identity.key()) {
            debug!(identity = %identity, scopes = set.len(), "branch changed, broadcasting staleness");
            for (id, core) in set.iter() {
                if Some(*id) != excluding {
                    core.mark_stale();
                }
            }
        }
    }
}
