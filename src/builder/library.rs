//! A library rooted in a package directory.

use std::path::{Path, PathBuf};

use crate::builder::plan::CompileRules;
use crate::builder::source::SourceRoot;
use crate::core::name::Name;
use crate::core::LibraryManifest;

/// A buildable library: a root directory plus its manifest entry.
#[derive(Debug, Clone)]
pub struct Library {
    root: PathBuf,
    manifest: LibraryManifest,
}

impl Library {
    /// Create a library handle for a root directory.
    pub fn new(root: impl Into<PathBuf>, manifest: LibraryManifest) -> Self {
        Library {
            root: root.into(),
            manifest,
        }
    }

    /// The library's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The library's name.
    pub fn name(&self) -> Name {
        self.manifest.name
    }

    /// The library's manifest entry.
    pub fn manifest(&self) -> &LibraryManifest {
        &self.manifest
    }

    /// The library's source directory, `<root>/src`.
    pub fn src_dir(&self) -> SourceRoot {
        SourceRoot::new(self.root.join("src"))
    }

    /// The directory consumers should put on their include path:
    /// `<root>/include` when present, otherwise `<root>/src`.
    pub fn public_include_dir(&self) -> PathBuf {
        let include = self.root.join("include");
        if include.is_dir() {
            include
        } else {
            self.root.join("src")
        }
    }

    /// Compile rules shared by every translation unit of this library.
    pub fn base_compile_rules(&self) -> CompileRules {
        let mut include_dirs = vec![self.public_include_dir()];
        let src = self.root.join("src");
        if include_dirs[0] != src {
            include_dirs.push(src);
        }
        CompileRules {
            include_dirs,
            ..CompileRules::default()
        }
    }
}
