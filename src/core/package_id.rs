//! Package identification - name plus version.
//!
//! A `PackageId` identifies one concrete package. Its canonical textual
//! form is `name@version`, which is also the on-disk directory name of a
//! source distribution in the local repository.

use std::fmt;

use anyhow::{Context, Result};
use semver::Version;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::name::Name;

/// A unique identifier for a package: `(name, version)`.
///
/// Ordering is by name first, then by semantic version, which gives the
/// repository set and solver inputs a deterministic order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageId {
    name: Name,
    version: Version,
}

impl PackageId {
    /// Create a new package ID.
    pub fn new(name: impl Into<Name>, version: Version) -> Self {
        PackageId {
            name: name.into(),
            version,
        }
    }

    /// Parse the canonical `name@version` form.
    pub fn parse(s: &str) -> Result<Self> {
        let (name, version) = s
            .split_once('@')
            .with_context(|| format!("invalid package ID `{}`: expected `name@version`", s))?;
        let version: Version = version
            .parse()
            .with_context(|| format!("invalid version in package ID `{}`", s))?;
        Ok(PackageId::new(name, version))
    }

    /// Get the package name.
    pub fn name(&self) -> Name {
        self.name
    }

    /// Get the package version.
    pub fn version(&self) -> &Version {
        &self.version
    }
}

impl PartialOrd for PackageId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PackageId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.version.cmp(&other.version))
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

impl Serialize for PackageId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PackageId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PackageId::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_form_round_trips() {
        let id = PackageId::new("spdlog", Version::new(1, 4, 2));
        assert_eq!(id.to_string(), "spdlog@1.4.2");
        assert_eq!(PackageId::parse("spdlog@1.4.2").unwrap(), id);
    }

    #[test]
    fn parse_rejects_missing_separator() {
        assert!(PackageId::parse("spdlog-1.4.2").is_err());
        assert!(PackageId::parse("spdlog@not-a-version").is_err());
    }

    #[test]
    fn ordering_is_name_then_version() {
        let a1 = PackageId::new("aaa", Version::new(1, 0, 0));
        let a2 = PackageId::new("aaa", Version::new(2, 0, 0));
        let b1 = PackageId::new("bbb", Version::new(1, 0, 0));

        assert!(a1 < a2);
        assert!(a2 < b1);
    }
}
