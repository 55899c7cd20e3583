use crate::error::{ReleaseError, Result};
use crate::version::Version;
use regex::Regex;
use std::io::Write;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Matches a version declaration line: `version = "..."`.
///
/// The three capture groups split the line into prefix, value and closing
/// quote so a rewrite can splice the value without touching any other byte.
const VERSION_LINE: &str = r#"(?m)^(\s*version\s*=\s*")([^"]*)(")"#;

/// In-memory manifest state: the full text plus the byte span of the single
/// version value.
///
/// Loading locates the version declaration and fails rather than guessing:
/// zero matching lines is `NoVersionField`, more than one is
/// `AmbiguousManifest`. The file on disk is never touched until
/// [Manifest::rewrite] succeeds in full.
#[derive(Debug)]
pub struct Manifest {
    path: PathBuf,
    text: String,
    value_span: Range<usize>,
}

impl Manifest {
    /// Load a manifest and locate its version declaration
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            return Err(ReleaseError::ManifestNotFound(path));
        }

        let text = std::fs::read_to_string(&path)?;

        let re = Regex::new(VERSION_LINE).expect("version line pattern is valid");
        let spans: Vec<Range<usize>> = re
            .captures_iter(&text)
            .filter_map(|caps| caps.get(2).map(|m| m.range()))
            .collect();

        let value_span = match spans.as_slice() {
            [] => return Err(ReleaseError::NoVersionField(path)),
            [span] => span.clone(),
            _ => {
                return Err(ReleaseError::AmbiguousManifest {
                    path,
                    count: spans.len(),
                })
            }
        };

        Ok(Manifest {
            path,
            text,
            value_span,
        })
    }

    /// The raw version value as declared in the manifest
    pub fn current_raw(&self) -> &str {
        &self.text[self.value_span.clone()]
    }

    /// Path this manifest was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory containing the manifest, used as the artifact root
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Rewrite the version value and persist the manifest atomically.
    ///
    /// Everything outside the located value is preserved byte-for-byte.
    /// The new content is written to a temporary file in the same directory
    /// and renamed into place, so a reader only ever observes the old content
    /// or the complete new content.
    pub fn rewrite(&self, new_version: &Version) -> Result<()> {
        let mut updated = String::with_capacity(self.text.len() + 8);
        updated.push_str(&self.text[..self.value_span.start]);
        updated.push_str(&new_version.to_string());
        updated.push_str(&self.text[self.value_span.end..]);

        let mut tmp = tempfile::NamedTempFile::new_in(self.dir())?;
        tmp.write_all(updated.as_bytes())?;
        tmp.flush()?;

        // Temp files are created 0600; keep the manifest's own mode so the
        // rename does not change its permissions.
        let permissions = std::fs::metadata(&self.path)?.permissions();
        tmp.as_file().set_permissions(permissions)?;

        tmp.persist(&self.path).map_err(|e| e.error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_manifest(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("Cargo.toml");
        fs::write(&path, content).expect("write test manifest");
        path
    }

    const BASIC: &str = "[package]\nname = \"demo\"\nversion = \"0.4.1\"\nedition = \"2021\"\n";

    #[test]
    fn test_load_locates_version() {
        let dir = TempDir::new().unwrap();
        let path = write_manifest(&dir, BASIC);

        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.current_raw(), "0.4.1");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Manifest::load(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ReleaseError::ManifestNotFound(_)));
    }

    #[test]
    fn test_load_no_version_field() {
        let dir = TempDir::new().unwrap();
        let path = write_manifest(&dir, "[package]\nname = \"demo\"\n");
        let err = Manifest::load(&path).unwrap_err();
        assert!(matches!(err, ReleaseError::NoVersionField(_)));
    }

    #[test]
    fn test_load_ambiguous_manifest() {
        let dir = TempDir::new().unwrap();
        let content = "version = \"1.0.0\"\n[other]\nversion = \"2.0.0\"\n";
        let path = write_manifest(&dir, content);

        let err = Manifest::load(&path).unwrap_err();
        match err {
            ReleaseError::AmbiguousManifest { count, .. } => assert_eq!(count, 2),
            other => panic!("expected AmbiguousManifest, got {other}"),
        }

        // File must be left untouched
        assert_eq!(fs::read_to_string(&path).unwrap(), content);
    }

    #[test]
    fn test_rewrite_only_changes_version_value() {
        let dir = TempDir::new().unwrap();
        let path = write_manifest(&dir, BASIC);

        let manifest = Manifest::load(&path).unwrap();
        manifest.rewrite(&Version::new(0, 4, 2)).unwrap();

        let rewritten = fs::read_to_string(&path).unwrap();
        assert_eq!(rewritten, BASIC.replace("0.4.1", "0.4.2"));
    }

    #[test]
    fn test_rewrite_preserves_surrounding_bytes() {
        let dir = TempDir::new().unwrap();
        let content =
            "# release manifest\n[package]\nname = \"demo\"   \nversion = \"1.2.3\"  # keep\n\n[deps]\n";
        let path = write_manifest(&dir, content);

        let manifest = Manifest::load(&path).unwrap();
        manifest.rewrite(&Version::new(1, 3, 0)).unwrap();

        let rewritten = fs::read_to_string(&path).unwrap();
        assert_eq!(
            rewritten,
            "# release manifest\n[package]\nname = \"demo\"   \nversion = \"1.3.0\"  # keep\n\n[deps]\n"
        );
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = write_manifest(&dir, BASIC);

        Manifest::load(&path)
            .unwrap()
            .rewrite(&Version::new(0, 5, 0))
            .unwrap();
        let first = fs::read_to_string(&path).unwrap();

        Manifest::load(&path)
            .unwrap()
            .rewrite(&Version::new(0, 5, 0))
            .unwrap();
        let second = fs::read_to_string(&path).unwrap();

        assert_eq!(first, second);
    }

    #[cfg(unix)]
    #[test]
    fn test_rewrite_preserves_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = write_manifest(&dir, BASIC);
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        Manifest::load(&path)
            .unwrap()
            .rewrite(&Version::new(0, 4, 2))
            .unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_indented_version_line_is_found() {
        let dir = TempDir::new().unwrap();
        let path = write_manifest(&dir, "[package]\n  version = \"2.0.0\"\n");

        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.current_raw(), "2.0.0");
    }

    #[test]
    fn test_non_declaration_lines_ignored() {
        // A commented-out declaration does not start the line, so it neither
        // matches nor makes the manifest ambiguous.
        let dir = TempDir::new().unwrap();
        let path = write_manifest(&dir, "# version = \"9.9.9\"\nversion = \"1.0.0\"\n");

        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.current_raw(), "1.0.0");
    }
}
