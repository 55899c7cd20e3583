//! Version-control abstraction layer
//!
//! The [Repository] trait is the seam between the release pipeline and the
//! underlying version-control system. Two implementations exist:
//!
//! - [repository::Git2Repository]: the real implementation using the `git2` crate
//! - [mock::MockRepository]: an in-memory implementation for testing
//!
//! Orchestration code depends on the trait only, so recording behavior can be
//! tested without a working tree, a remote, or network access.

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::error::Result;
use git2::Oid;

/// Commit author identity, passed explicitly into recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorIdentity {
    pub name: String,
    pub email: String,
}

impl AuthorIdentity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        AuthorIdentity {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Version-control operations needed to record a release
///
/// All implementors must be `Send + Sync`. Implementations map underlying
/// errors (like `git2::Error`) to the typed [crate::error::ReleaseError]
/// variants: commit failures to `CommitFailed`, push failures to
/// `PushRejected`, tag collisions to `TagAlreadyExists`.
pub trait Repository: Send + Sync {
    /// Get the OID of the current HEAD commit
    fn head_oid(&self) -> Result<Oid>;

    /// Stage a single path (relative to the repository workdir)
    fn stage(&self, path: &std::path::Path) -> Result<()>;

    /// Create a commit of the staged changes on HEAD, returning its OID
    fn commit(&self, message: &str, author: &AuthorIdentity) -> Result<Oid>;

    /// Push a branch to a remote.
    ///
    /// Must never force-push: a non-fast-forward rejection is surfaced as
    /// `PushRejected` and is fatal for the run.
    fn push_branch(&self, remote: &str, branch: &str) -> Result<()>;

    /// Find a tag by name, returning its target OID if it exists
    fn find_tag_oid(&self, tag_name: &str) -> Result<Option<Oid>>;

    /// Create a lightweight tag at the given OID.
    ///
    /// Must never overwrite: an existing tag is `TagAlreadyExists`.
    fn create_tag(&self, name: &str, oid: Oid) -> Result<()>;

    /// Push a tag to a remote
    fn push_tag(&self, remote: &str, tag_name: &str) -> Result<()>;

    /// Author identity from repository configuration, used when none is
    /// supplied explicitly
    fn default_identity(&self) -> Result<AuthorIdentity>;
}
