use crate::error::{ReleaseError, Result};
use crate::registry::{ArtifactRef, Credentials, PublishResult, Registry};
use std::sync::Mutex;

/// Mock registry for testing without a publish process
///
/// Records published versions and, like a real registry, rejects a version
/// it has already accepted. A one-shot failure can be injected to simulate
/// auth or transport trouble.
pub struct MockRegistry {
    state: Mutex<MockState>,
}

struct MockState {
    published: Vec<String>,
    fail_next: Option<ReleaseError>,
}

impl MockRegistry {
    pub fn new() -> Self {
        MockRegistry {
            state: Mutex::new(MockState {
                published: Vec::new(),
                fail_next: None,
            }),
        }
    }

    /// Inject a failure for the next publish call
    pub fn fail_next(&self, err: ReleaseError) {
        self.state.lock().unwrap().fail_next = Some(err);
    }

    /// Mark a version as already present on the registry
    pub fn preload(&self, version: impl Into<String>) {
        self.state.lock().unwrap().published.push(version.into());
    }

    /// Versions accepted so far
    pub fn published(&self) -> Vec<String> {
        self.state.lock().unwrap().published.clone()
    }
}

impl Default for MockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry for MockRegistry {
    fn publish(&self, artifact: &ArtifactRef, _credentials: &Credentials) -> Result<PublishResult> {
        let mut state = self.state.lock().unwrap();

        if let Some(err) = state.fail_next.take() {
            return Err(err);
        }

        let version = artifact.version.to_string();
        if state.published.contains(&version) {
            return Err(ReleaseError::VersionConflict(version));
        }

        state.published.push(version.clone());
        Ok(PublishResult {
            registry_id: Some(format!("mock:{}", version)),
        })
    }
}
