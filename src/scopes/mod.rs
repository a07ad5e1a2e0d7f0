//! Scope hierarchy: navigation factories, branch owners, and revision
//! handles.

pub mod branch;
pub mod core;
pub mod navigation;
pub mod registry;
pub mod revision;

pub use branch::BranchScope;
pub use core::{ScopeCore, ScopeId, ScopeOwner};
pub use navigation::{OrganizationScope, ProjectScope};
pub use registry::ScopeRegistry;
pub use revision::RevisionScope;
