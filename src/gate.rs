use crate::error::{ReleaseError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Build/test gate collaborator
///
/// The pipeline only publishes artifacts the gate has verified. The gate is
/// consulted once, immediately before the registry is contacted.
pub trait BuildGate: Send + Sync {
    fn verify(&self) -> Result<()>;
}

/// Gate that runs a configured shell command and reports its exit status
///
/// A non-zero exit is a gate failure carrying the captured output. The
/// command runs with `sh -c` so configured gates can be pipelines like
/// `cargo test && cargo clippy`.
pub struct CommandGate {
    command: String,
    workdir: PathBuf,
}

impl CommandGate {
    pub fn new(command: impl Into<String>, workdir: impl AsRef<Path>) -> Self {
        CommandGate {
            command: command.into(),
            workdir: workdir.as_ref().to_path_buf(),
        }
    }
}

impl BuildGate for CommandGate {
    fn verify(&self) -> Result<()> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .current_dir(&self.workdir)
            .output()
            .map_err(|e| {
                ReleaseError::gate(format!("Failed to run gate '{}': {}", self.command, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            return Err(ReleaseError::gate(format!(
                "'{}' exited with code {}\nStdout: {}\nStderr: {}",
                self.command,
                output.status.code().unwrap_or(-1),
                stdout.trim(),
                stderr.trim()
            )));
        }

        Ok(())
    }
}

/// Fixed-outcome gate for tests and for `--no-verify`
pub struct StaticGate {
    pass: bool,
}

impl StaticGate {
    pub fn passing() -> Self {
        StaticGate { pass: true }
    }

    pub fn failing() -> Self {
        StaticGate { pass: false }
    }
}

impl BuildGate for StaticGate {
    fn verify(&self) -> Result<()> {
        if self.pass {
            Ok(())
        } else {
            Err(ReleaseError::gate("gate reported failure"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_gate_success() {
        let gate = CommandGate::new("true", ".");
        assert!(gate.verify().is_ok());
    }

    #[test]
    fn test_command_gate_nonzero_exit() {
        let gate = CommandGate::new("exit 3", ".");
        let err = gate.verify().unwrap_err();
        assert!(matches!(err, ReleaseError::GateFailed(_)));
        assert!(err.to_string().contains("code 3"));
    }

    #[test]
    fn test_command_gate_captures_output() {
        let gate = CommandGate::new("echo boom >&2; exit 1", ".");
        let err = gate.verify().unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_static_gate() {
        assert!(StaticGate::passing().verify().is_ok());
        assert!(StaticGate::failing().verify().is_err());
    }
}
