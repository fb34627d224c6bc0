//! Source distributions: one package's manifest and sources in a
//! directory.

use std::path::{Path, PathBuf};

use anyhow::{ensure, Result};

use crate::core::{PackageId, PackageManifest};

/// A source distribution on disk. Its directory name is the canonical
/// `name@version` form of its identity.
#[derive(Debug, Clone)]
pub struct Sdist {
    manifest: PackageManifest,
    path: PathBuf,
}

impl Sdist {
    /// Load a source distribution from its directory.
    pub fn from_directory(path: impl Into<PathBuf>) -> Result<Sdist> {
        let path = path.into();
        ensure!(
            path.is_dir(),
            "source distribution directory does not exist: {}",
            path.display()
        );
        let manifest = PackageManifest::load(&path)?;
        Ok(Sdist { manifest, path })
    }

    /// The package manifest.
    pub fn manifest(&self) -> &PackageManifest {
        &self.manifest
    }

    /// The identity of the contained package.
    pub fn package_id(&self) -> &PackageId {
        self.manifest.id()
    }

    /// The directory holding the distribution.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
