use crate::error::{ReleaseError, Result};
use crate::git::{AuthorIdentity, Repository};
use git2::Oid;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Recorded operations, in the order the pipeline performed them
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedOp {
    Stage(PathBuf),
    Commit(String),
    PushBranch { remote: String, branch: String },
    CreateTag(String),
    PushTag { remote: String, tag: String },
}

/// Mock repository for testing without actual git operations
///
/// Records every operation so tests can assert both the calls made and their
/// order. Individual operations can be set up to fail.
pub struct MockRepository {
    state: Mutex<MockState>,
}

struct MockState {
    head: Oid,
    tags: HashMap<String, Oid>,
    ops: Vec<RecordedOp>,
    next_commit: u8,
    fail_commit: Option<String>,
    fail_push_branch: Option<String>,
    fail_push_tag: Option<String>,
}

impl MockRepository {
    /// Create a mock repository with a synthetic HEAD commit
    pub fn new() -> Self {
        MockRepository {
            state: Mutex::new(MockState {
                head: Oid::from_bytes(&[1; 20]).expect("static oid"),
                tags: HashMap::new(),
                ops: Vec::new(),
                next_commit: 2,
                fail_commit: None,
                fail_push_branch: None,
                fail_push_tag: None,
            }),
        }
    }

    /// Add a pre-existing tag pointing to an OID
    pub fn add_tag(&self, name: impl Into<String>, oid: Oid) {
        self.state.lock().unwrap().tags.insert(name.into(), oid);
    }

    /// Current synthetic HEAD
    pub fn head(&self) -> Oid {
        self.state.lock().unwrap().head
    }

    /// Make the next commit fail with the given message
    pub fn fail_commit(&self, msg: impl Into<String>) {
        self.state.lock().unwrap().fail_commit = Some(msg.into());
    }

    /// Make branch pushes be rejected with the given message
    pub fn fail_push_branch(&self, msg: impl Into<String>) {
        self.state.lock().unwrap().fail_push_branch = Some(msg.into());
    }

    /// Make tag pushes be rejected with the given message
    pub fn fail_push_tag(&self, msg: impl Into<String>) {
        self.state.lock().unwrap().fail_push_tag = Some(msg.into());
    }

    /// All operations recorded so far
    pub fn ops(&self) -> Vec<RecordedOp> {
        self.state.lock().unwrap().ops.clone()
    }

    /// Tags currently known to the mock
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.state.lock().unwrap().tags.keys().cloned().collect();
        tags.sort();
        tags
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MockRepository {
    fn head_oid(&self) -> Result<Oid> {
        Ok(self.state.lock().unwrap().head)
    }

    fn stage(&self, path: &Path) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(RecordedOp::Stage(path.to_path_buf()));
        Ok(())
    }

    fn commit(&self, message: &str, _author: &AuthorIdentity) -> Result<Oid> {
        let mut state = self.state.lock().unwrap();

        if let Some(msg) = state.fail_commit.take() {
            return Err(ReleaseError::commit(msg));
        }

        let oid = Oid::from_bytes(&[state.next_commit; 20]).expect("static oid");
        state.next_commit += 1;
        state.head = oid;
        state.ops.push(RecordedOp::Commit(message.to_string()));
        Ok(oid)
    }

    fn push_branch(&self, remote: &str, branch: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();

        if let Some(msg) = state.fail_push_branch.take() {
            return Err(ReleaseError::push(msg));
        }

        state.ops.push(RecordedOp::PushBranch {
            remote: remote.to_string(),
            branch: branch.to_string(),
        });
        Ok(())
    }

    fn find_tag_oid(&self, tag_name: &str) -> Result<Option<Oid>> {
        Ok(self.state.lock().unwrap().tags.get(tag_name).copied())
    }

    fn create_tag(&self, name: &str, oid: Oid) -> Result<()> {
        let mut state = self.state.lock().unwrap();

        if state.tags.contains_key(name) {
            return Err(ReleaseError::TagAlreadyExists(name.to_string()));
        }

        state.tags.insert(name.to_string(), oid);
        state.ops.push(RecordedOp::CreateTag(name.to_string()));
        Ok(())
    }

    fn push_tag(&self, remote: &str, tag_name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();

        if let Some(msg) = state.fail_push_tag.take() {
            return Err(ReleaseError::push(msg));
        }

        state.ops.push(RecordedOp::PushTag {
            remote: remote.to_string(),
            tag: tag_name.to_string(),
        });
        Ok(())
    }

    fn default_identity(&self) -> Result<AuthorIdentity> {
        Ok(AuthorIdentity::new("Test User", "test@example.com"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_commit_advances_head() {
        let repo = MockRepository::new();
        let before = repo.head();

        let author = AuthorIdentity::new("Test User", "test@example.com");
        let oid = repo.commit("Bump version to 1.0.0", &author).unwrap();

        assert_ne!(oid, before);
        assert_eq!(repo.head(), oid);
    }

    #[test]
    fn test_mock_records_operation_order() {
        let repo = MockRepository::new();
        let author = AuthorIdentity::new("Test User", "test@example.com");

        repo.stage(Path::new("Cargo.toml")).unwrap();
        let oid = repo.commit("msg", &author).unwrap();
        repo.push_branch("origin", "main").unwrap();
        repo.create_tag("version/1.0.0", oid).unwrap();
        repo.push_tag("origin", "version/1.0.0").unwrap();

        let ops = repo.ops();
        assert_eq!(ops.len(), 5);
        assert!(matches!(ops[0], RecordedOp::Stage(_)));
        assert!(matches!(ops[1], RecordedOp::Commit(_)));
        assert!(matches!(ops[2], RecordedOp::PushBranch { .. }));
        assert!(matches!(ops[3], RecordedOp::CreateTag(_)));
        assert!(matches!(ops[4], RecordedOp::PushTag { .. }));
    }

    #[test]
    fn test_mock_existing_tag_rejected() {
        let repo = MockRepository::new();
        let oid = repo.head();
        repo.add_tag("version/1.0.0", oid);

        let err = repo.create_tag("version/1.0.0", oid).unwrap_err();
        assert!(matches!(err, ReleaseError::TagAlreadyExists(_)));
    }

    #[test]
    fn test_mock_find_tag() {
        let repo = MockRepository::new();
        let oid = repo.head();
        repo.add_tag("version/1.0.0", oid);

        assert_eq!(repo.find_tag_oid("version/1.0.0").unwrap(), Some(oid));
        assert_eq!(repo.find_tag_oid("version/2.0.0").unwrap(), None);
    }

    #[test]
    fn test_mock_injected_push_failure() {
        let repo = MockRepository::new();
        repo.fail_push_branch("non-fast-forward");

        let err = repo.push_branch("origin", "main").unwrap_err();
        assert!(matches!(err, ReleaseError::PushRejected(_)));

        // Failure is one-shot, the next push goes through
        repo.push_branch("origin", "main").unwrap();
    }
}
