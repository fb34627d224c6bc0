//! A dependency on a package: name plus version requirement.

use std::fmt;

use semver::{Version, VersionReq};

use crate::core::name::Name;

/// A version-ranged dependency declared by a manifest.
#[derive(Debug, Clone)]
pub struct Dependency {
    name: Name,
    req: VersionReq,
}

impl Dependency {
    /// Create a new dependency.
    pub fn new(name: impl Into<Name>, req: VersionReq) -> Self {
        Dependency {
            name: name.into(),
            req,
        }
    }

    /// Get the dependency name.
    pub fn name(&self) -> Name {
        self.name
    }

    /// Get the version requirement.
    pub fn version_req(&self) -> &VersionReq {
        &self.req
    }

    /// Check whether a concrete version satisfies this dependency.
    pub fn matches(&self, version: &Version) -> bool {
        self.req.matches(version)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_versions_in_range() {
        let dep = Dependency::new("fmt", "^6.0".parse().unwrap());
        assert!(dep.matches(&Version::new(6, 1, 2)));
        assert!(!dep.matches(&Version::new(7, 0, 0)));
    }
}
