//! Release pipeline orchestration
//!
//! Wires the four stages strictly sequentially:
//! Validating -> Mutating -> Recording -> Publishing. Each stage fully
//! completes or fails before the next begins; the first failure is terminal
//! for the run and carries the stage it happened in. There is no automatic
//! retry and no rollback: if publishing fails after recording, the commit and
//! tag stay pushed and reconciliation is left to the operator (re-run with
//! `--resume-publish` once the cause is fixed).

use crate::config::Config;
use crate::error::{ReleaseError, Result};
use crate::gate::BuildGate;
use crate::git::{AuthorIdentity, Repository};
use crate::manifest::Manifest;
use crate::registry::{ArtifactRef, Credentials, PublishResult, Registry};
use crate::version::{self, Version};
use git2::Oid;
use std::fmt;
use std::path::PathBuf;

/// Pipeline stage, reported on failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    Mutating,
    Recording,
    Publishing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validating => "Validating",
            Stage::Mutating => "Mutating",
            Stage::Recording => "Recording",
            Stage::Publishing => "Publishing",
        };
        write!(f, "{}", name)
    }
}

/// Terminal failure: the stage that failed plus the typed reason
#[derive(Debug)]
pub struct StageFailure {
    pub stage: Stage,
    pub error: ReleaseError,
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "release failed at {}: {}", self.stage, self.error)
    }
}

impl std::error::Error for StageFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Externally supplied release request
#[derive(Debug, Clone)]
pub struct ReleaseRequest {
    /// Target version as supplied by the operator
    pub target_raw: String,
    /// Manifest whose version field will be rewritten
    pub manifest_path: PathBuf,
    /// Continue a run whose VCS recording already succeeded
    pub resume_publish: bool,
}

/// What the VCS recorder produced, for confirmation output only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRecord {
    pub commit: Oid,
    pub tag: String,
    pub branch: String,
}

/// Result of a complete successful run
#[derive(Debug)]
pub struct ReleaseOutcome {
    pub version: Version,
    /// Absent when Recording was skipped by a resumed run
    pub record: Option<ReleaseRecord>,
    pub publish: PublishResult,
    pub resumed: bool,
}

/// The release pipeline, bound to its collaborators for one invocation
pub struct Orchestrator<'a> {
    repo: &'a dyn Repository,
    registry: &'a dyn Registry,
    gate: &'a dyn BuildGate,
    config: &'a Config,
    credentials: Credentials,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        repo: &'a dyn Repository,
        registry: &'a dyn Registry,
        gate: &'a dyn BuildGate,
        config: &'a Config,
        credentials: Credentials,
    ) -> Self {
        Orchestrator {
            repo,
            registry,
            gate,
            config,
            credentials,
        }
    }

    /// Run the pipeline to completion or first failure
    pub fn run(&self, request: &ReleaseRequest) -> std::result::Result<ReleaseOutcome, StageFailure> {
        let at = |stage: Stage| move |error: ReleaseError| StageFailure { stage, error };

        // Validating
        let manifest = Manifest::load(&request.manifest_path).map_err(at(Stage::Validating))?;

        if request.resume_publish {
            let target =
                Version::parse(&request.target_raw).map_err(at(Stage::Validating))?;
            self.check_resumable(&manifest, &target)
                .map_err(at(Stage::Validating))?;

            let publish = self.publish(&manifest, &target).map_err(at(Stage::Publishing))?;

            return Ok(ReleaseOutcome {
                version: target,
                record: None,
                publish,
                resumed: true,
            });
        }

        let target = version::validate(manifest.current_raw(), &request.target_raw)
            .map_err(at(Stage::Validating))?;

        // Mutating
        manifest.rewrite(&target).map_err(at(Stage::Mutating))?;

        // Recording
        let record = self.record(&manifest, &target).map_err(at(Stage::Recording))?;

        // Publishing
        let publish = self.publish(&manifest, &target).map_err(at(Stage::Publishing))?;

        Ok(ReleaseOutcome {
            version: target,
            record: Some(record),
            publish,
            resumed: false,
        })
    }

    /// A run may skip straight to Publishing only when the prior run's
    /// recording is fully intact: the release tag exists, it points at the
    /// current HEAD, and the manifest already carries the target version.
    /// Any mismatch is surfaced rather than guessed around.
    fn check_resumable(&self, manifest: &Manifest, target: &Version) -> Result<()> {
        let current = Version::parse(manifest.current_raw())?;
        if current != *target {
            return Err(ReleaseError::config(format!(
                "cannot resume: manifest version {} does not match target {}",
                current, target
            )));
        }

        let tag = self.config.vcs.tag_name(target);
        let tag_oid = self.repo.find_tag_oid(&tag)?.ok_or_else(|| {
            ReleaseError::config(format!("cannot resume: tag {} does not exist", tag))
        })?;

        if tag_oid != self.repo.head_oid()? {
            return Err(ReleaseError::TagAlreadyExists(format!(
                "{} does not point at HEAD",
                tag
            )));
        }

        Ok(())
    }

    /// Recording sequence: stage -> commit -> push branch -> tag -> push tag.
    ///
    /// The branch is pushed before the tag so the remote never sees a tag
    /// referencing a commit it does not have.
    fn record(&self, manifest: &Manifest, target: &Version) -> Result<ReleaseRecord> {
        let author = self.author_identity()?;
        let vcs = &self.config.vcs;

        self.repo.stage(manifest.path())?;

        let commit = self.repo.commit(&vcs.commit_message(target), &author)?;

        self.repo.push_branch(&vcs.remote, &vcs.branch)?;

        let tag = vcs.tag_name(target);
        self.repo.create_tag(&tag, commit)?;
        self.repo.push_tag(&vcs.remote, &tag)?;

        Ok(ReleaseRecord {
            commit,
            tag,
            branch: vcs.branch.clone(),
        })
    }

    /// Publishing stage: gate first, registry second. Unverified artifacts
    /// never reach the registry.
    fn publish(&self, manifest: &Manifest, target: &Version) -> Result<PublishResult> {
        self.gate.verify()?;

        let artifact = ArtifactRef {
            dir: manifest.dir().to_path_buf(),
            version: *target,
        };

        self.registry.publish(&artifact, &self.credentials)
    }

    fn author_identity(&self) -> Result<AuthorIdentity> {
        let author = &self.config.author;
        match (&author.name, &author.email) {
            (Some(name), Some(email)) => Ok(AuthorIdentity::new(name, email)),
            _ => self.repo.default_identity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Validating.to_string(), "Validating");
        assert_eq!(Stage::Mutating.to_string(), "Mutating");
        assert_eq!(Stage::Recording.to_string(), "Recording");
        assert_eq!(Stage::Publishing.to_string(), "Publishing");
    }

    #[test]
    fn test_stage_failure_display() {
        let failure = StageFailure {
            stage: Stage::Publishing,
            error: ReleaseError::network("connection reset"),
        };
        let msg = failure.to_string();
        assert!(msg.contains("failed at Publishing"));
        assert!(msg.contains("connection reset"));
    }

    #[test]
    fn test_stage_failure_source() {
        use std::error::Error;
        let failure = StageFailure {
            stage: Stage::Validating,
            error: ReleaseError::MalformedVersion("x".to_string()),
        };
        assert!(failure.source().is_some());
    }
}
