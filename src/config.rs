use crate::error::{ReleaseError, Result};
use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete configuration for one release-publish invocation.
///
/// All collaborator endpoints (remote, branch, gate command, timeout) live
/// here and are passed explicitly into the pipeline; component logic never
/// reads ambient process state.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub vcs: VcsConfig,

    #[serde(default)]
    pub author: AuthorConfig,

    #[serde(default)]
    pub gate: GateConfig,

    #[serde(default)]
    pub publish: PublishConfig,
}

/// Version-control endpoints and naming
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct VcsConfig {
    #[serde(default = "default_remote")]
    pub remote: String,

    #[serde(default = "default_branch")]
    pub branch: String,

    #[serde(default = "default_tag_prefix")]
    pub tag_prefix: String,

    #[serde(default = "default_commit_message")]
    pub commit_message: String,
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_tag_prefix() -> String {
    "version/".to_string()
}

fn default_commit_message() -> String {
    "Bump version to {version}".to_string()
}

impl Default for VcsConfig {
    fn default() -> Self {
        VcsConfig {
            remote: default_remote(),
            branch: default_branch(),
            tag_prefix: default_tag_prefix(),
            commit_message: default_commit_message(),
        }
    }
}

impl VcsConfig {
    /// Tag name for a version, e.g. "version/0.4.2"
    pub fn tag_name(&self, version: &Version) -> String {
        format!("{}{}", self.tag_prefix, version)
    }

    /// Commit message for a version from the configured template
    pub fn commit_message(&self, version: &Version) -> String {
        self.commit_message
            .replace("{version}", &version.to_string())
    }
}

/// Commit author override; falls back to the repository's configured identity
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct AuthorConfig {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub email: Option<String>,
}

/// Build/test gate command, run before any registry contact
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct GateConfig {
    #[serde(default)]
    pub command: Option<String>,
}

/// Publish behavior
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PublishConfig {
    #[serde(default = "default_manifest")]
    pub manifest: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_manifest() -> String {
    "Cargo.toml".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for PublishConfig {
    fn default() -> Self {
        PublishConfig {
            manifest: default_manifest(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            vcs: VcsConfig::default(),
            author: AuthorConfig::default(),
            gate: GateConfig::default(),
            publish: PublishConfig::default(),
        }
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `releasepublish.toml` in current directory
/// 3. `.releasepublish.toml` in the user config directory
/// 4. Default configuration if no file found
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path)?
    } else if Path::new("./releasepublish.toml").exists() {
        fs::read_to_string("./releasepublish.toml")?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join(".releasepublish.toml");
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    let config: Config =
        toml::from_str(&config_str).map_err(|e| ReleaseError::config(e.to_string()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.vcs.remote, "origin");
        assert_eq!(config.vcs.branch, "main");
        assert_eq!(config.vcs.tag_prefix, "version/");
        assert_eq!(config.publish.manifest, "Cargo.toml");
        assert_eq!(config.publish.timeout_secs, 300);
        assert!(config.gate.command.is_none());
    }

    #[test]
    fn test_tag_name_formatting() {
        let vcs = VcsConfig::default();
        assert_eq!(vcs.tag_name(&Version::new(0, 4, 2)), "version/0.4.2");
    }

    #[test]
    fn test_commit_message_template() {
        let vcs = VcsConfig::default();
        assert_eq!(
            vcs.commit_message(&Version::new(1, 2, 3)),
            "Bump version to 1.2.3"
        );
    }

    #[test]
    fn test_parse_partial_config() {
        let config: Config = toml::from_str(
            r#"
            [vcs]
            branch = "release"
            tag_prefix = "rel-"

            [gate]
            command = "cargo test"
            "#,
        )
        .unwrap();

        assert_eq!(config.vcs.branch, "release");
        assert_eq!(config.vcs.tag_prefix, "rel-");
        // Unspecified keys keep their defaults
        assert_eq!(config.vcs.remote, "origin");
        assert_eq!(config.gate.command.as_deref(), Some("cargo test"));
        assert_eq!(config.publish.timeout_secs, 300);
    }

    #[test]
    fn test_parse_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_custom_commit_template() {
        let config: Config = toml::from_str(
            r#"
            [vcs]
            commit_message = "release: {version}"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.vcs.commit_message(&Version::new(2, 0, 0)),
            "release: 2.0.0"
        );
    }
}
