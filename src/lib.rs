//! # revscope
//!
//! Client-side scope handles for a branchable, versioned table store
//! (organizations → projects → branches → revisions).
//!
//! ## Core Concepts
//!
//! - **Scopes**: Disposable handles bound to one (branch, revision) pair
//! - **Modes**: Draft scopes accept mutations; head and explicit scopes are read-only
//! - **Staleness**: A commit on one scope marks its siblings stale; each
//!   refreshes its revision id lazily on next use
//! - **Owners**: Branch scopes and the client registry broadcast staleness
//!   to the scopes they own
//!
//! ## Example
//!
//! ```ignore
//! use revscope::Client;
//!
//! let client = Client::new(remote);
//! let branch = client.organization("org1").project("proj1").branch("main").await?;
//!
//! let draft = branch.draft().await?;
//! draft.create_row("posts", &json!({ "title": "Hello" })).await?;
//! draft.commit(Some("first post")).await?;
//! ```

pub mod client;
pub mod error;
pub mod remote;
pub mod scopes;
pub mod types;

// Re-exports
pub use client::Client;
pub use error::{ClientError, Result};
pub use remote::RemoteOperations;
pub use scopes::{
    BranchScope, OrganizationScope, ProjectScope, RevisionScope, ScopeCore, ScopeId, ScopeOwner,
    ScopeRegistry,
};
pub use types::*;
