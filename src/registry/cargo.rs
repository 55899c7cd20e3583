use crate::error::{ReleaseError, Result};
use crate::registry::{ArtifactRef, Credentials, PublishResult, Registry};
use std::io::Read;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Poll interval while waiting for the publish process
const WAIT_POLL: Duration = Duration::from_millis(100);

/// Registry implementation that publishes through an external `cargo publish`
/// process.
///
/// The token is passed to the child process environment only, never written
/// to disk or logged. The process runs under a bounded wall-clock timeout;
/// expiry kills it and is reported as `NetworkError`, which is safe to retry
/// because the registry rejects duplicate versions.
pub struct CargoRegistry {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CargoRegistry {
    pub fn new(timeout: Duration) -> Self {
        Self::with_command("cargo", &["publish"], timeout)
    }

    /// Publish through an arbitrary command instead of `cargo publish`.
    /// Lets tests drive the process-handling paths with a stand-in command.
    pub fn with_command(program: &str, args: &[&str], timeout: Duration) -> Self {
        CargoRegistry {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            timeout,
        }
    }

    /// Classify a failed publish from the process stderr.
    ///
    /// Anything not recognizably an authentication or duplicate-version
    /// failure is treated as transient transport trouble.
    fn classify_failure(stderr: &str, version: &str) -> ReleaseError {
        let lower = stderr.to_lowercase();

        if lower.contains("unauthorized")
            || lower.contains("authentication")
            || lower.contains("401")
            || lower.contains("invalid token")
            || lower.contains("token not provided")
        {
            ReleaseError::AuthenticationFailed(first_line(stderr))
        } else if lower.contains("already exists")
            || lower.contains("already uploaded")
            || lower.contains("duplicate")
        {
            ReleaseError::VersionConflict(version.to_string())
        } else {
            ReleaseError::network(first_line(stderr))
        }
    }
}

fn first_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("publish process failed without output")
        .to_string()
}

impl Registry for CargoRegistry {
    fn publish(&self, artifact: &ArtifactRef, credentials: &Credentials) -> Result<PublishResult> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&artifact.dir)
            .env("CARGO_REGISTRY_TOKEN", credentials.expose())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ReleaseError::network(format!("cannot start publish process: {}", e)))?;

        // Drain stderr on a separate thread so a chatty process cannot block
        // on a full pipe while we poll for exit.
        let mut stderr_pipe = child.stderr.take();
        let reader = std::thread::spawn(move || {
            let mut buf = String::new();
            if let Some(ref mut pipe) = stderr_pipe {
                let _ = pipe.read_to_string(&mut buf);
            }
            buf
        });

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(ReleaseError::network(format!(
                            "publish timed out after {}s",
                            self.timeout.as_secs()
                        )));
                    }
                    std::thread::sleep(WAIT_POLL);
                }
                Err(e) => {
                    return Err(ReleaseError::network(format!(
                        "waiting for publish process: {}",
                        e
                    )))
                }
            }
        };

        let stderr = reader.join().unwrap_or_default();

        if !status.success() {
            return Err(Self::classify_failure(
                &stderr,
                &artifact.version.to_string(),
            ));
        }

        // cargo does not hand back a registry identifier
        Ok(PublishResult { registry_id: None })
    }
}
