use crate::error::{ReleaseError, Result};
use std::fmt;

/// Semantic version representation
///
/// An ordered (major, minor, patch) triple. The derived `Ord` gives the
/// lexicographic order over the three components, which is exactly the
/// semantic-version total order for plain X.Y.Z versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// Which component to increment when deriving a target version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpKind {
    Major,
    Minor,
    Patch,
}

impl Version {
    /// Create a new version
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Version {
            major,
            minor,
            patch,
        }
    }

    /// Parse a version string of the form "X.Y.Z"
    ///
    /// Only plain three-component versions are accepted. Prefixes ("v1.2.3"),
    /// pre-release suffixes ("1.2.3-rc.1") and build metadata are rejected as
    /// malformed rather than stripped.
    pub fn parse(raw: &str) -> Result<Self> {
        let malformed = || ReleaseError::MalformedVersion(raw.to_string());

        let parts: Vec<&str> = raw.split('.').collect();
        if parts.len() != 3 {
            return Err(malformed());
        }

        // u32 parsing alone would admit signs and whitespace
        if parts
            .iter()
            .any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
        {
            return Err(malformed());
        }

        let major = parts[0].parse::<u32>().map_err(|_| malformed())?;
        let minor = parts[1].parse::<u32>().map_err(|_| malformed())?;
        let patch = parts[2].parse::<u32>().map_err(|_| malformed())?;

        Ok(Version {
            major,
            minor,
            patch,
        })
    }

    /// Return the version with the given component incremented.
    ///
    /// A component at `u32::MAX` has nowhere to go; that is reported as an
    /// error rather than wrapping or panicking.
    pub fn bump(&self, kind: BumpKind) -> Result<Self> {
        let overflow =
            || ReleaseError::config(format!("version {} cannot be bumped further", self));

        Ok(match kind {
            BumpKind::Major => Version::new(self.major.checked_add(1).ok_or_else(overflow)?, 0, 0),
            BumpKind::Minor => {
                Version::new(self.major, self.minor.checked_add(1).ok_or_else(overflow)?, 0)
            }
            BumpKind::Patch => Version::new(
                self.major,
                self.minor,
                self.patch.checked_add(1).ok_or_else(overflow)?,
            ),
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Validate a release target against the manifest's current version.
///
/// Both strings must parse as plain X.Y.Z versions; a malformed `current_raw`
/// means the manifest is corrupted or in an unsupported format and is fatal,
/// never silently defaulted. The target must be strictly greater than the
/// current version, so re-publishing the same version is rejected before any
/// mutation happens.
pub fn validate(current_raw: &str, target_raw: &str) -> Result<Version> {
    let current = Version::parse(current_raw)?;
    let target = Version::parse(target_raw)?;

    if target <= current {
        return Err(ReleaseError::VersionNotAdvancing {
            current: current.to_string(),
            target: target.to_string(),
        });
    }

    Ok(target)
}
