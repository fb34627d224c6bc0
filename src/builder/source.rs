//! Source tree classification.
//!
//! A library keeps its sources under `src/`. Every file in that tree is
//! tagged by what it contributes to the build: headers are never compiled,
//! regular sources feed the library archive, and `*.main.*` / `*.test.*`
//! stems are entry points for application and test executables.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

const HEADER_EXTENSIONS: &[&str] = &["h", "hh", "hpp", "hxx", "h++", "inl"];
// `.C` (uppercase) is a C source here and selects the C compiler.
const SOURCE_EXTENSIONS: &[&str] = &["c", "C", "cc", "cpp", "cxx", "c++"];

/// What a source file contributes to the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Included, never compiled.
    Header,
    /// Compiled into the library archive.
    Source,
    /// Entry point of an application executable.
    App,
    /// Entry point of a test executable.
    Test,
}

/// A classified source file, remembering the source root it was found
/// under so output paths can mirror the tree layout.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Absolute (or root-relative) path of the file.
    pub path: PathBuf,
    /// The source root the file was collected from.
    pub basis_path: PathBuf,
    /// The classification of the file.
    pub kind: SourceKind,
}

impl SourceFile {
    /// Classify a path by extension and stem, or `None` when the file is
    /// not a recognized source.
    pub fn classify(path: &Path) -> Option<SourceKind> {
        let ext = path.extension()?.to_str()?;
        if HEADER_EXTENSIONS.contains(&ext) {
            return Some(SourceKind::Header);
        }
        if !SOURCE_EXTENSIONS.contains(&ext) {
            return None;
        }
        match secondary_extension(path) {
            Some("main") => Some(SourceKind::App),
            Some("test") => Some(SourceKind::Test),
            _ => Some(SourceKind::Source),
        }
    }

    /// Path of the file relative to its source root.
    pub fn relative_path(&self) -> PathBuf {
        pathdiff::diff_paths(&self.path, &self.basis_path)
            .unwrap_or_else(|| self.path.clone())
    }
}

/// The inner extension of a stem, e.g. `foo.test.cpp` -> `test`.
fn secondary_extension(path: &Path) -> Option<&str> {
    Path::new(path.file_stem()?).extension()?.to_str()
}

/// Filename with every extension stripped: `foo.test.cpp` -> `foo`.
pub fn executable_stem(path: &Path) -> String {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    while let Some(dot) = name.rfind('.') {
        if dot == 0 {
            break;
        }
        name.truncate(dot);
    }
    name
}

/// A library's source directory.
#[derive(Debug, Clone)]
pub struct SourceRoot {
    path: PathBuf,
}

impl SourceRoot {
    /// Create a source root for a directory.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SourceRoot { path: path.into() }
    }

    /// The directory this root points at.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the directory exists.
    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    /// Walk the tree and classify every recognized source file,
    /// deterministically ordered by path.
    pub fn collect_sources(&self) -> Result<Vec<SourceFile>> {
        let mut sources = Vec::new();
        for entry in WalkDir::new(&self.path) {
            let entry = entry
                .with_context(|| format!("failed to walk source dir: {}", self.path.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(kind) = SourceFile::classify(entry.path()) {
                sources.push(SourceFile {
                    path: entry.into_path(),
                    basis_path: self.path.clone(),
                    kind,
                });
            }
        }
        sources.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn classification_by_extension_and_stem() {
        assert_eq!(
            SourceFile::classify(Path::new("src/a.cpp")),
            Some(SourceKind::Source)
        );
        assert_eq!(
            SourceFile::classify(Path::new("src/a.C")),
            Some(SourceKind::Source)
        );
        assert_eq!(
            SourceFile::classify(Path::new("src/a.hpp")),
            Some(SourceKind::Header)
        );
        assert_eq!(
            SourceFile::classify(Path::new("src/tool.main.cpp")),
            Some(SourceKind::App)
        );
        assert_eq!(
            SourceFile::classify(Path::new("src/a.test.cc")),
            Some(SourceKind::Test)
        );
        assert_eq!(SourceFile::classify(Path::new("src/readme.txt")), None);
        assert_eq!(SourceFile::classify(Path::new("Makefile")), None);
    }

    #[test]
    fn executable_stem_strips_all_extensions() {
        assert_eq!(executable_stem(Path::new("tests/foo.test.cpp")), "foo");
        assert_eq!(executable_stem(Path::new("app.main.c")), "app");
        assert_eq!(executable_stem(Path::new("plain.cpp")), "plain");
        assert_eq!(executable_stem(Path::new("noext")), "noext");
    }

    #[test]
    fn collect_sources_walks_and_sorts() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::write(src.join("z.cpp"), "").unwrap();
        fs::write(src.join("a.hpp"), "").unwrap();
        fs::write(src.join("nested/b.test.cpp"), "").unwrap();
        fs::write(src.join("notes.md"), "").unwrap();

        let root = SourceRoot::new(&src);
        let sources = root.collect_sources().unwrap();
        assert_eq!(sources.len(), 3);
        assert!(sources.windows(2).all(|w| w[0].path <= w[1].path));
        assert_eq!(
            sources
                .iter()
                .find(|s| s.kind == SourceKind::Test)
                .unwrap()
                .relative_path(),
            PathBuf::from("nested/b.test.cpp")
        );
    }

    #[test]
    fn missing_root_reports_not_existing() {
        let tmp = TempDir::new().unwrap();
        let root = SourceRoot::new(tmp.path().join("src"));
        assert!(!root.exists());
    }
}
