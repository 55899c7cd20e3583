//! Package registry abstraction layer
//!
//! The [Registry] trait is the collaborator seam for artifact publishing.
//! [cargo::CargoRegistry] drives the real registry through an external
//! `cargo publish` process; [mock::MockRegistry] is the test implementation.
//!
//! Publishing is irreversible: once an artifact is resolvable under a version
//! there is no unpublish operation here. The registry's own duplicate-version
//! rejection is what makes retrying a failed publish safe.

pub mod cargo;
pub mod mock;

pub use cargo::CargoRegistry;
pub use mock::MockRegistry;

use crate::error::Result;
use crate::version::Version;
use std::fmt;
use std::path::PathBuf;

/// Registry credentials, scoped to a single invocation.
///
/// The token is never logged and never persisted: `Debug` redacts it and the
/// only consumer hands it to the publish process as an environment variable.
pub struct Credentials {
    token: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>) -> Self {
        Credentials {
            token: token.into(),
        }
    }

    /// Access the raw token for handing to the registry
    pub(crate) fn expose(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Reference to the built artifact to publish
#[derive(Debug, Clone)]
pub struct ArtifactRef {
    /// Directory containing the artifact's manifest
    pub dir: PathBuf,
    /// Version the artifact will be resolvable under
    pub version: Version,
}

/// Outcome of a successful publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishResult {
    /// Registry-assigned identifier, when the registry reports one
    pub registry_id: Option<String>,
}

/// Publish operations against a package registry
///
/// Implementations map failures to the typed [crate::error::ReleaseError]
/// variants: credential rejection to `AuthenticationFailed`, duplicate
/// versions to `VersionConflict` (fatal, evidence of a prior run), and
/// transport problems or timeouts to `NetworkError` (safe to retry at
/// whole-publish granularity).
pub trait Registry: Send + Sync {
    fn publish(&self, artifact: &ArtifactRef, credentials: &Credentials) -> Result<PublishResult>;
}
