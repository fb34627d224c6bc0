//! Package manifest loading.
//!
//! A package declares itself in a `Caravel.toml` at its root: identity,
//! version-ranged dependencies, and the libraries it publishes with their
//! usage (`uses`) and link (`links`) requirements.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use semver::{Version, VersionReq};
use serde::Deserialize;

use crate::core::name::Name;
use crate::core::{Dependency, PackageId};
use crate::usage::UsageKey;

/// Manifest file name looked up at a package root.
pub const MANIFEST_FILENAME: &str = "Caravel.toml";

/// A parsed package manifest.
#[derive(Debug, Clone)]
pub struct PackageManifest {
    id: PackageId,
    namespace: Name,
    dependencies: Vec<Dependency>,
    libraries: Vec<LibraryManifest>,
}

/// One library published by a package.
#[derive(Debug, Clone)]
pub struct LibraryManifest {
    /// Base name of the library, also the base of its archive filename.
    pub name: Name,
    /// Libraries whose headers and archives this library consumes.
    pub uses: Vec<UsageKey>,
    /// Libraries that must be linked alongside this one without exposing
    /// their headers.
    pub links: Vec<UsageKey>,
}

impl PackageManifest {
    /// Load the manifest from a package root directory.
    pub fn load(package_root: &Path) -> Result<Self> {
        let path = package_root.join(MANIFEST_FILENAME);
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("failed to parse manifest: {}", path.display()))
    }

    /// Parse a manifest from its TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let raw: RawManifest = toml::from_str(text)?;

        let version: Version = raw
            .package
            .version
            .parse()
            .with_context(|| format!("invalid package version `{}`", raw.package.version))?;
        let id = PackageId::new(raw.package.name.as_str(), version);
        let namespace = raw
            .package
            .namespace
            .map(Name::new)
            .unwrap_or_else(|| id.name());

        let mut dependencies = Vec::with_capacity(raw.dependencies.len());
        for (name, req) in raw.dependencies {
            let req: VersionReq = req
                .parse()
                .with_context(|| format!("invalid version requirement for dependency `{}`", name))?;
            dependencies.push(Dependency::new(name, req));
        }

        let mut libraries = Vec::with_capacity(raw.libraries.len());
        for lib in raw.libraries {
            libraries.push(LibraryManifest {
                name: Name::new(lib.name),
                uses: lib.uses,
                links: lib.links,
            });
        }

        Ok(PackageManifest {
            id,
            namespace,
            dependencies,
            libraries,
        })
    }

    /// Get the package identity.
    pub fn id(&self) -> &PackageId {
        &self.id
    }

    /// Get the namespace under which this package's libraries are published.
    pub fn namespace(&self) -> Name {
        self.namespace
    }

    /// Get the declared dependencies.
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Get the published libraries.
    pub fn libraries(&self) -> &[LibraryManifest] {
        &self.libraries
    }
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    package: RawPackage,
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
    #[serde(default)]
    libraries: Vec<RawLibrary>,
}

#[derive(Debug, Deserialize)]
struct RawPackage {
    name: String,
    version: String,
    namespace: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLibrary {
    name: String,
    #[serde(default)]
    uses: Vec<UsageKey>,
    #[serde(default)]
    links: Vec<UsageKey>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"
        [package]
        name = "spdlog"
        version = "1.4.2"

        [dependencies]
        fmt = "^6.0.0"

        [[libraries]]
        name = "spdlog"
        uses = ["fmt/fmt"]
    "#;

    #[test]
    fn parses_identity_and_dependencies() {
        let man = PackageManifest::from_toml_str(EXAMPLE).unwrap();
        assert_eq!(man.id().to_string(), "spdlog@1.4.2");
        assert_eq!(man.namespace().as_str(), "spdlog");
        assert_eq!(man.dependencies().len(), 1);
        assert_eq!(man.dependencies()[0].name().as_str(), "fmt");
        assert_eq!(man.libraries().len(), 1);
        assert_eq!(man.libraries()[0].uses[0].to_string(), "fmt/fmt");
    }

    #[test]
    fn namespace_defaults_to_package_name() {
        let man = PackageManifest::from_toml_str(
            "[package]\nname = \"zlib\"\nversion = \"1.2.11\"\n",
        )
        .unwrap();
        assert_eq!(man.namespace().as_str(), "zlib");
        assert!(man.dependencies().is_empty());
        assert!(man.libraries().is_empty());
    }

    #[test]
    fn explicit_namespace_wins() {
        let man = PackageManifest::from_toml_str(
            "[package]\nname = \"ms-gsl\"\nversion = \"2.0.0\"\nnamespace = \"microsoft\"\n",
        )
        .unwrap();
        assert_eq!(man.namespace().as_str(), "microsoft");
    }

    #[test]
    fn bad_version_requirement_is_rejected() {
        let res = PackageManifest::from_toml_str(
            "[package]\nname = \"a\"\nversion = \"1.0.0\"\n[dependencies]\nb = \"not-a-range\"\n",
        );
        assert!(res.is_err());
    }

    #[test]
    fn load_reads_manifest_from_directory() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join(MANIFEST_FILENAME), EXAMPLE).unwrap();
        let man = PackageManifest::load(tmp.path()).unwrap();
        assert_eq!(man.id().name().as_str(), "spdlog");
    }
}
