//! Navigation factories: organization and project scopes.
//!
//! Stateless beyond the identity fragments they carry; their only job is to
//! produce branch scopes.

use crate::error::Result;
use crate::remote::RemoteOperations;
use crate::scopes::branch::BranchScope;
use crate::types::BranchIdentity;
use std::sync::Arc;

/// Entry point for one organization.
pub struct OrganizationScope {
    remote: Arc<dyn RemoteOperations>,
    organization: String,
}

impl OrganizationScope {
    pub(crate) fn new(remote: Arc<dyn RemoteOperations>, organization: String) -> Self {
        Self {
            remote,
            organization,
        }
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    pub fn project(&self, name: impl Into<String>) -> ProjectScope {
        ProjectScope {
            remote: Arc::clone(&self.remote),
            organization: self.organization.clone(),
            project: name.into(),
        }
    }
}

/// One project within an organization.
pub struct ProjectScope {
    remote: Arc<dyn RemoteOperations>,
    organization: String,
    project: String,
}

impl ProjectScope {
    pub fn organization(&self) -> &str {
        &self.organization
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Open a branch scope, resolving the branch's current head and draft
    /// revision ids.
    pub async fn branch(&self, name: impl Into<String>) -> Result<BranchScope> {
        let identity =
            BranchIdentity::new(self.organization.clone(), self.project.clone(), name.into());
        BranchScope::open(Arc::clone(&self.remote), identity).await
    }
}
