use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for release-publish operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Malformed version '{0}': expected MAJOR.MINOR.PATCH")]
    MalformedVersion(String),

    #[error("Version not advancing: target {target} must be greater than current {current}")]
    VersionNotAdvancing { current: String, target: String },

    #[error("Manifest not found: {0}")]
    ManifestNotFound(PathBuf),

    #[error("No version field found in manifest {0}")]
    NoVersionField(PathBuf),

    #[error("Ambiguous manifest {path}: {count} version fields found, expected exactly one")]
    AmbiguousManifest { path: PathBuf, count: usize },

    #[error("Commit failed: {0}")]
    CommitFailed(String),

    #[error("Push rejected: {0}")]
    PushRejected(String),

    #[error("Tag already exists: {0}")]
    TagAlreadyExists(String),

    #[error("Registry authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Registry already has this version: {0}")]
    VersionConflict(String),

    #[error("Network error during publish: {0}")]
    NetworkError(String),

    #[error("Build/test gate failed: {0}")]
    GateFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in release-publish
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a commit error with context
    pub fn commit(msg: impl Into<String>) -> Self {
        ReleaseError::CommitFailed(msg.into())
    }

    /// Create a push-rejected error with context
    pub fn push(msg: impl Into<String>) -> Self {
        ReleaseError::PushRejected(msg.into())
    }

    /// Create a network error with context
    pub fn network(msg: impl Into<String>) -> Self {
        ReleaseError::NetworkError(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a gate error with context
    pub fn gate(msg: impl Into<String>) -> Self {
        ReleaseError::GateFailed(msg.into())
    }
}
