use crate::error::{ReleaseError, Result};
use crate::git::AuthorIdentity;
use git2::{Oid, Repository as Git2Repo};
use std::path::Path;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)
            .map_err(|e| ReleaseError::config(format!("Not in a git repository: {}", e)))?;

        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }

    /// Credential callbacks for remote operations.
    ///
    /// Tries SSH keys from ~/.ssh/ in order of preference, then the SSH
    /// agent, then default credentials.
    fn remote_callbacks<'cb>() -> git2::RemoteCallbacks<'cb> {
        let mut callbacks = git2::RemoteCallbacks::new();
        callbacks.credentials(|_url, username_from_url, allowed_types| {
            if allowed_types.contains(git2::CredentialType::SSH_KEY) {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                let key_paths = vec![
                    format!("{}/.ssh/id_ed25519", home),
                    format!("{}/.ssh/id_rsa", home),
                    format!("{}/.ssh/id_ecdsa", home),
                ];

                for key_path in key_paths {
                    let path = std::path::Path::new(&key_path);
                    if path.exists() {
                        if let Ok(cred) = git2::Cred::ssh_key(
                            username_from_url.unwrap_or("git"),
                            None,
                            path,
                            None,
                        ) {
                            return Ok(cred);
                        }
                    }
                }

                if let Ok(cred) = git2::Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"))
                {
                    return Ok(cred);
                }
            }

            git2::Cred::default()
        });

        callbacks
    }

    /// Push a single refspec to a remote, collecting per-reference rejections
    fn push_refspec(&self, remote_name: &str, refspec: &str) -> Result<()> {
        let mut remote = self.repo.find_remote(remote_name).map_err(|e| {
            ReleaseError::push(format!("Remote '{}' not found: {}", remote_name, e))
        })?;

        let mut callbacks = Self::remote_callbacks();

        // The remote reports non-fast-forward and policy rejections per
        // reference rather than as a push error.
        callbacks.push_update_reference(|refname, status| {
            if let Some(status) = status {
                Err(git2::Error::from_str(&format!(
                    "{} rejected: {}",
                    refname, status
                )))
            } else {
                Ok(())
            }
        });

        let mut push_options = git2::PushOptions::new();
        push_options.remote_callbacks(callbacks);

        remote
            .push(&[refspec], Some(&mut push_options))
            .map_err(|e| Self::push_error(refspec, remote_name, &e))
    }

    /// Every push failure surfaces as `PushRejected`, transport trouble
    /// included. The commit may or may not have landed on the remote, so the
    /// retry advice attached to network errors elsewhere does not apply here;
    /// the transport detail stays in the message for the operator.
    fn push_error(refspec: &str, remote_name: &str, error: &git2::Error) -> ReleaseError {
        if error.class() == git2::ErrorClass::Net {
            ReleaseError::push(format!(
                "{} to '{}': network failure: {}",
                refspec, remote_name, error
            ))
        } else {
            ReleaseError::push(format!("{} to '{}': {}", refspec, remote_name, error))
        }
    }
}

impl super::Repository for Git2Repository {
    fn head_oid(&self) -> Result<Oid> {
        let head = self
            .repo
            .head()
            .map_err(|e| ReleaseError::commit(format!("Cannot resolve HEAD: {}", e)))?;

        head.target()
            .ok_or_else(|| ReleaseError::commit("HEAD is detached or invalid".to_string()))
    }

    fn stage(&self, path: &Path) -> Result<()> {
        let workdir = self
            .repo
            .workdir()
            .ok_or_else(|| ReleaseError::commit("Repository has no working tree".to_string()))?;

        // The index wants paths relative to the workdir
        let rel_path = match path.strip_prefix(workdir) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) if path.is_absolute() => {
                // Symlinked temp dirs make the workdir prefix miss verbatim
                let canon_path = path.canonicalize()?;
                let canon_workdir = workdir.canonicalize()?;
                canon_path
                    .strip_prefix(&canon_workdir)
                    .map(|p| p.to_path_buf())
                    .unwrap_or(canon_path)
            }
            Err(_) => path.to_path_buf(),
        };

        let mut index = self
            .repo
            .index()
            .map_err(|e| ReleaseError::commit(format!("Cannot open index: {}", e)))?;

        index
            .add_path(&rel_path)
            .map_err(|e| ReleaseError::commit(format!("Cannot stage {}: {}", path.display(), e)))?;
        index
            .write()
            .map_err(|e| ReleaseError::commit(format!("Cannot write index: {}", e)))?;

        Ok(())
    }

    fn commit(&self, message: &str, author: &AuthorIdentity) -> Result<Oid> {
        let mut index = self
            .repo
            .index()
            .map_err(|e| ReleaseError::commit(format!("Cannot open index: {}", e)))?;

        let tree_id = index
            .write_tree()
            .map_err(|e| ReleaseError::commit(format!("Cannot write tree: {}", e)))?;
        let tree = self
            .repo
            .find_tree(tree_id)
            .map_err(|e| ReleaseError::commit(format!("Cannot find tree: {}", e)))?;

        let signature = git2::Signature::now(&author.name, &author.email)
            .map_err(|e| ReleaseError::commit(format!("Invalid author identity: {}", e)))?;

        let parent = self
            .repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .map_err(|e| ReleaseError::commit(format!("Cannot resolve HEAD commit: {}", e)))?;

        let oid = self
            .repo
            .commit(
                Some("HEAD"),
                &signature,
                &signature,
                message,
                &tree,
                &[&parent],
            )
            .map_err(|e| ReleaseError::commit(e.to_string()))?;

        Ok(oid)
    }

    fn push_branch(&self, remote: &str, branch: &str) -> Result<()> {
        let refspec = format!("refs/heads/{}:refs/heads/{}", branch, branch);
        self.push_refspec(remote, &refspec)
    }

    fn find_tag_oid(&self, tag_name: &str) -> Result<Option<Oid>> {
        let reference_name = format!("refs/tags/{}", tag_name);

        match self.repo.find_reference(&reference_name) {
            Ok(reference) => {
                let oid = reference
                    .peel(git2::ObjectType::Any)
                    .map_err(|e| {
                        ReleaseError::commit(format!("Cannot peel tag '{}': {}", tag_name, e))
                    })?
                    .id();

                Ok(Some(oid))
            }
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(ReleaseError::commit(format!(
                "Cannot look up tag '{}': {}",
                tag_name, e
            ))),
        }
    }

    fn create_tag(&self, name: &str, oid: Oid) -> Result<()> {
        let object = self
            .repo
            .find_object(oid, None)
            .map_err(|e| ReleaseError::commit(format!("Cannot find object {}: {}", oid, e)))?;

        match self.repo.tag_lightweight(name, &object, false) {
            Ok(_) => Ok(()),
            Err(e) if e.code() == git2::ErrorCode::Exists => {
                Err(ReleaseError::TagAlreadyExists(name.to_string()))
            }
            Err(e) => Err(ReleaseError::commit(format!(
                "Cannot create tag '{}': {}",
                name, e
            ))),
        }
    }

    fn push_tag(&self, remote: &str, tag_name: &str) -> Result<()> {
        let refspec = format!("refs/tags/{}:refs/tags/{}", tag_name, tag_name);
        self.push_refspec(remote, &refspec)
    }

    fn default_identity(&self) -> Result<AuthorIdentity> {
        let signature = self
            .repo
            .signature()
            .map_err(|e| ReleaseError::commit(format!("No author identity configured: {}", e)))?;

        Ok(AuthorIdentity::new(
            signature.name().unwrap_or("unknown"),
            signature.email().unwrap_or("unknown"),
        ))
    }
}

// SAFETY: Git2Repository wraps git2::Repository which is Send + Sync.
// git2 library is thread-safe for read operations via libgit2's thread-safe design.
unsafe impl Sync for Git2Repository {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git2_repository_open() {
        // Should either succeed (running inside a checkout) or fail gracefully
        let result = Git2Repository::open(".");
        let _ = result;
    }

    #[test]
    fn test_push_error_never_reports_network_error() {
        // A connection drop mid-push leaves the remote in an unknown state,
        // so it must not come back as the retry-safe network variant.
        let transport = git2::Error::new(
            git2::ErrorCode::GenericError,
            git2::ErrorClass::Net,
            "connection timed out",
        );
        let err = Git2Repository::push_error("refs/heads/main:refs/heads/main", "origin", &transport);
        assert!(matches!(err, ReleaseError::PushRejected(_)));
        assert!(err.to_string().contains("network failure"));
        assert!(err.to_string().contains("connection timed out"));
    }

    #[test]
    fn test_push_error_keeps_refspec_and_remote() {
        let rejected = git2::Error::new(
            git2::ErrorCode::GenericError,
            git2::ErrorClass::Reference,
            "non-fast-forward",
        );
        let err = Git2Repository::push_error("refs/tags/version/1.0.0:refs/tags/version/1.0.0", "origin", &rejected);
        assert!(matches!(err, ReleaseError::PushRejected(_)));
        assert!(err.to_string().contains("origin"));
        assert!(err.to_string().contains("non-fast-forward"));
    }
}
