// tests/config_test.rs
use release_publish::config::{load_config, Config};
use release_publish::version::Version;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_default_config() {
    let config = Config::default();
    assert_eq!(config.vcs.remote, "origin");
    assert_eq!(config.vcs.branch, "main");
    assert_eq!(config.vcs.tag_prefix, "version/");
    assert_eq!(config.vcs.commit_message, "Bump version to {version}");
}

#[test]
fn test_load_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();
    let toml_content = r#"
[vcs]
remote = "upstream"
branch = "release"
tag_prefix = "rel-"

[author]
name = "Release Bot"
email = "release@example.com"

[gate]
command = "cargo test --all"

[publish]
timeout_secs = 60
"#;
    temp_file.write_all(toml_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = load_config(Some(temp_file.path().to_str().unwrap())).unwrap();
    assert_eq!(config.vcs.remote, "upstream");
    assert_eq!(config.vcs.branch, "release");
    assert_eq!(config.vcs.tag_name(&Version::new(1, 2, 3)), "rel-1.2.3");
    assert_eq!(config.author.name.as_deref(), Some("Release Bot"));
    assert_eq!(config.gate.command.as_deref(), Some("cargo test --all"));
    assert_eq!(config.publish.timeout_secs, 60);
    // Unspecified keys keep their defaults
    assert_eq!(config.publish.manifest, "Cargo.toml");
}

#[test]
fn test_default_values() {
    let config = Config::default();
    assert!(config.author.name.is_none());
    assert!(config.author.email.is_none());
    assert!(config.gate.command.is_none());
    assert_eq!(config.publish.timeout_secs, 300);
    assert_eq!(config.publish.manifest, "Cargo.toml");
}

#[test]
fn test_load_missing_custom_path_fails() {
    let result = load_config(Some("/nonexistent/releasepublish.toml"));
    assert!(result.is_err());
}

#[test]
fn test_load_invalid_toml_fails() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[vcs\nbranch = ").unwrap();
    temp_file.flush().unwrap();

    let result = load_config(Some(temp_file.path().to_str().unwrap()));
    assert!(result.is_err());
}
