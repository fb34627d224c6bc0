//! The local package repository.
//!
//! A repository is a directory of source distributions, one per
//! subdirectory named `name@version`, guarded by an advisory OS file lock:
//! shared for read sessions, exclusive for write sessions. The in-memory
//! set is rebuilt on every open and never shared between processes.

pub mod sdist;

pub use sdist::Sdist;

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs4::FileExt;

use crate::core::{Dependency, PackageId};
use crate::error::UserError;
use crate::solve;
use crate::util::fs::{ensure_dir, replace_via_staging};

const LOCK_FILENAME: &str = ".caravel-lock";
const STAGING_DIRNAME: &str = ".tmp-import";

/// Policy for `add_sdist` when the identity is already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IfExists {
    /// Fail with a user error.
    Error,
    /// Keep the existing distribution, warn, and do nothing.
    Ignore,
    /// Replace the existing distribution on disk and in memory.
    Replace,
}

/// The remote package catalog, as far as the repository needs it: version
/// listings and dependency listings. The backing storage is elsewhere.
pub trait PackageCatalog {
    /// All identities published under a name, in any order.
    fn by_name(&self, name: &str) -> Result<Vec<PackageId>>;

    /// The dependencies of a concrete identity.
    fn dependencies_of(&self, id: &PackageId) -> Result<Vec<Dependency>>;
}

/// A locked-open view of the on-disk repository.
#[derive(Debug)]
pub struct Repository {
    write_enabled: bool,
    root: PathBuf,
    sdists: BTreeMap<PackageId, Sdist>,
    // Held for the lifetime of the handle; dropping the file releases the
    // advisory lock.
    _lock: File,
}

impl Repository {
    /// Default repository location under the user's data directory.
    pub fn default_local_path() -> PathBuf {
        directories::ProjectDirs::from("", "", "caravel")
            .map(|dirs| dirs.data_dir().join("repo"))
            .unwrap_or_else(|| PathBuf::from(".caravel-repo"))
    }

    /// Open the repository for reading, taking a shared lock.
    pub fn open_for_read(root: impl Into<PathBuf>) -> Result<Repository> {
        Self::open(root.into(), false)
    }

    /// Open the repository for writing, taking an exclusive lock. Blocks
    /// with a diagnostic while another process holds the lock.
    pub fn open_for_write(root: impl Into<PathBuf>) -> Result<Repository> {
        Self::open(root.into(), true)
    }

    fn open(root: PathBuf, write_enabled: bool) -> Result<Repository> {
        ensure_dir(&root)?;
        let lock = Self::acquire_lock(&root, write_enabled)?;
        let sdists = load_sdists(&root)?;
        Ok(Repository {
            write_enabled,
            root,
            sdists,
            _lock: lock,
        })
    }

    fn acquire_lock(root: &Path, exclusive: bool) -> Result<File> {
        let lock_path = root.join(LOCK_FILENAME);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("failed to open lock file: {}", lock_path.display()))?;

        let immediate = if exclusive {
            FileExt::try_lock_exclusive(&file)
        } else {
            FileExt::try_lock_shared(&file)
        };
        if immediate.is_err() {
            tracing::warn!(
                "another process has the repository directory locked [{}]",
                root.display()
            );
            tracing::warn!("waiting for the repository to be released...");
            if exclusive {
                FileExt::lock_exclusive(&file)
            } else {
                FileExt::lock_shared(&file)
            }
            .with_context(|| format!("failed to lock repository: {}", root.display()))?;
        }
        Ok(file)
    }

    /// The repository root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Iterate the loaded distributions, ordered by name then version.
    pub fn iter_sdists(&self) -> impl Iterator<Item = &Sdist> {
        self.sdists.values()
    }

    /// Number of loaded distributions.
    pub fn len(&self) -> usize {
        self.sdists.len()
    }

    /// Whether the repository holds no distributions.
    pub fn is_empty(&self) -> bool {
        self.sdists.is_empty()
    }

    /// Find a distribution by identity.
    pub fn find(&self, id: &PackageId) -> Option<&Sdist> {
        self.sdists.get(id)
    }

    /// Import a source distribution into the repository.
    ///
    /// The sources are copied into a staging directory next to the final
    /// destination and renamed over it, so a crash mid-copy never leaves a
    /// half-imported distribution under its final name.
    pub fn add_sdist(&mut self, sd: &Sdist, if_exists: IfExists) -> Result<()> {
        // Mutating a read-locked repository is a caller bug, and carrying
        // on could corrupt another process's view of the store.
        assert!(
            self.write_enabled,
            "attempted to write into a repository that was not opened with a write-lock; \
             this is a hard bug, aborting for the integrity of the local repository"
        );

        let id = sd.package_id().clone();
        let dest = self.root.join(id.to_string());
        if dest.exists() {
            match if_exists {
                IfExists::Error => {
                    return Err(UserError::SdistExists { id: id.to_string() }.into());
                }
                IfExists::Ignore => {
                    tracing::warn!(
                        "source distribution `{}` is already available in the local repo",
                        id
                    );
                    return Ok(());
                }
                IfExists::Replace => {
                    tracing::info!(
                        "source distribution `{}` is already available in the local repo - replacing",
                        id
                    );
                }
            }
        }

        let staging = self.root.join(STAGING_DIRNAME);
        replace_via_staging(sd.path(), &staging, &dest)?;

        // Re-read from the final location: that copy is now authoritative.
        let imported = Sdist::from_directory(&dest)?;
        self.sdists.insert(id.clone(), imported);
        tracing::info!("source distribution `{}` successfully imported", id);
        Ok(())
    }

    /// Solve a dependency set against this repository and a remote
    /// catalog, yielding the concrete identities that satisfy it.
    ///
    /// Candidate versions for a name are the union of local and catalog
    /// identities; the dependency list of a locally-present identity comes
    /// from its own manifest, with the catalog consulted only on a miss.
    pub fn solve(
        &self,
        deps: &[Dependency],
        catalog: &dyn PackageCatalog,
    ) -> Result<Vec<PackageId>> {
        solve::solve(
            deps,
            |name| {
                let mut all: Vec<PackageId> = self
                    .sdists
                    .keys()
                    .filter(|id| id.name().as_str() == name)
                    .cloned()
                    .collect();
                all.extend(catalog.by_name(name)?);
                all.sort();
                all.dedup();
                Ok(all)
            },
            |id| match self.find(id) {
                Some(sd) => Ok(sd.manifest().dependencies().to_vec()),
                None => catalog.dependencies_of(id),
            },
        )
    }
}

fn load_sdists(root: &Path) -> Result<BTreeMap<PackageId, Sdist>> {
    let mut sdists = BTreeMap::new();
    for entry in std::fs::read_dir(root)
        .with_context(|| format!("failed to read repository directory: {}", root.display()))?
    {
        let entry = entry?;
        let name = entry.file_name();
        // Hidden entries are the lock file and staging leftovers.
        if name.to_string_lossy().starts_with('.') {
            continue;
        }
        if !entry.file_type()?.is_dir() {
            continue;
        }
        match Sdist::from_directory(entry.path()) {
            Ok(sd) => {
                sdists.insert(sd.package_id().clone(), sd);
            }
            Err(err) => {
                // A malformed sdist must not block the whole repository.
                tracing::error!(
                    "failed to load source distribution from directory '{}': {:#}",
                    entry.path().display(),
                    err
                );
            }
        }
    }
    Ok(sdists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MANIFEST_FILENAME;
    use semver::Version;
    use std::fs;
    use tempfile::TempDir;

    fn make_sdist(dir: &Path, name: &str, version: &str, deps: &[(&str, &str)]) -> Sdist {
        fs::create_dir_all(dir).unwrap();
        let mut manifest = format!("[package]\nname = \"{}\"\nversion = \"{}\"\n", name, version);
        if !deps.is_empty() {
            manifest.push_str("\n[dependencies]\n");
            for (dep, range) in deps {
                manifest.push_str(&format!("{} = \"{}\"\n", dep, range));
            }
        }
        fs::write(dir.join(MANIFEST_FILENAME), manifest).unwrap();
        fs::create_dir_all(dir.join("src")).unwrap();
        fs::write(dir.join("src").join(format!("{}.cpp", name)), "").unwrap();
        Sdist::from_directory(dir).unwrap()
    }

    struct EmptyCatalog;

    impl PackageCatalog for EmptyCatalog {
        fn by_name(&self, _name: &str) -> Result<Vec<PackageId>> {
            Ok(Vec::new())
        }
        fn dependencies_of(&self, id: &PackageId) -> Result<Vec<Dependency>> {
            anyhow::bail!("catalog miss for {}", id)
        }
    }

    #[test]
    fn open_creates_and_loads_empty_repo() {
        let tmp = TempDir::new().unwrap();
        let repo = Repository::open_for_read(tmp.path().join("repo")).unwrap();
        assert!(repo.is_empty());
        assert!(tmp.path().join("repo").join(LOCK_FILENAME).exists());
    }

    #[test]
    fn add_and_find_round_trip() {
        let tmp = TempDir::new().unwrap();
        let sd = make_sdist(&tmp.path().join("pkg"), "fmt", "6.0.0", &[]);

        let mut repo = Repository::open_for_write(tmp.path().join("repo")).unwrap();
        repo.add_sdist(&sd, IfExists::Error).unwrap();

        let id = PackageId::new("fmt", Version::new(6, 0, 0));
        let found = repo.find(&id).expect("sdist should be present");
        assert_eq!(found.path(), tmp.path().join("repo").join("fmt@6.0.0"));

        // A fresh open sees the imported copy.
        drop(repo);
        let repo = Repository::open_for_read(tmp.path().join("repo")).unwrap();
        assert!(repo.find(&id).is_some());
    }

    #[test]
    fn add_existing_honours_policy() {
        let tmp = TempDir::new().unwrap();
        let sd = make_sdist(&tmp.path().join("pkg"), "fmt", "6.0.0", &[]);

        let mut repo = Repository::open_for_write(tmp.path().join("repo")).unwrap();
        repo.add_sdist(&sd, IfExists::Error).unwrap();

        let err = repo.add_sdist(&sd, IfExists::Error).unwrap_err();
        let user_err = err.downcast_ref::<UserError>().unwrap();
        assert_eq!(user_err.code(), "caravel::repo::sdist_exists");

        repo.add_sdist(&sd, IfExists::Ignore).unwrap();
        repo.add_sdist(&sd, IfExists::Replace).unwrap();

        // Replace twice leaves exactly one entry.
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn replace_recopies_the_directory() {
        let tmp = TempDir::new().unwrap();
        let pkg_dir = tmp.path().join("pkg");
        let sd = make_sdist(&pkg_dir, "fmt", "6.0.0", &[]);

        let mut repo = Repository::open_for_write(tmp.path().join("repo")).unwrap();
        repo.add_sdist(&sd, IfExists::Error).unwrap();

        fs::write(pkg_dir.join("src/extra.cpp"), "").unwrap();
        let sd = Sdist::from_directory(&pkg_dir).unwrap();
        repo.add_sdist(&sd, IfExists::Replace).unwrap();

        assert!(tmp
            .path()
            .join("repo/fmt@6.0.0/src/extra.cpp")
            .exists());
    }

    #[test]
    #[should_panic(expected = "write-lock")]
    fn write_through_read_handle_panics() {
        let tmp = TempDir::new().unwrap();
        let sd = make_sdist(&tmp.path().join("pkg"), "fmt", "6.0.0", &[]);
        let mut repo = Repository::open_for_read(tmp.path().join("repo")).unwrap();
        let _ = repo.add_sdist(&sd, IfExists::Error);
    }

    #[test]
    fn malformed_sdists_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("repo");
        fs::create_dir_all(root.join("broken@1.0.0")).unwrap();
        fs::write(root.join("broken@1.0.0").join(MANIFEST_FILENAME), "not toml [").unwrap();
        make_sdist(&root.join("good@1.0.0"), "good", "1.0.0", &[]);

        let repo = Repository::open_for_read(&root).unwrap();
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn hidden_entries_are_ignored() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("repo");
        fs::create_dir_all(root.join(".tmp-import")).unwrap();
        let repo = Repository::open_for_read(&root).unwrap();
        assert!(repo.is_empty());
    }

    #[test]
    fn iteration_is_ordered_by_name_then_version() {
        let tmp = TempDir::new().unwrap();
        let mut repo = Repository::open_for_write(tmp.path().join("repo")).unwrap();
        for (name, version) in [("zeta", "1.0.0"), ("alpha", "2.0.0"), ("alpha", "1.0.0")] {
            let sd = make_sdist(
                &tmp.path().join(format!("{}-{}", name, version)),
                name,
                version,
                &[],
            );
            repo.add_sdist(&sd, IfExists::Error).unwrap();
        }

        let ids: Vec<String> = repo.iter_sdists().map(|s| s.package_id().to_string()).collect();
        assert_eq!(ids, ["alpha@1.0.0", "alpha@2.0.0", "zeta@1.0.0"]);
    }

    #[test]
    fn solve_uses_local_manifests() {
        let tmp = TempDir::new().unwrap();
        let mut repo = Repository::open_for_write(tmp.path().join("repo")).unwrap();

        let app = make_sdist(&tmp.path().join("a"), "app", "1.0.0", &[("fmt", "^6.0")]);
        let fmt = make_sdist(&tmp.path().join("b"), "fmt", "6.1.0", &[]);
        repo.add_sdist(&app, IfExists::Error).unwrap();
        repo.add_sdist(&fmt, IfExists::Error).unwrap();

        let deps = vec![Dependency::new("app", "^1.0".parse().unwrap())];
        let solution = repo.solve(&deps, &EmptyCatalog).unwrap();
        let names: Vec<String> = solution.iter().map(|id| id.to_string()).collect();
        assert_eq!(names, ["app@1.0.0", "fmt@6.1.0"]);
    }

    #[test]
    fn candidates_union_local_and_catalog() {
        struct OneVersionCatalog;
        impl PackageCatalog for OneVersionCatalog {
            fn by_name(&self, name: &str) -> Result<Vec<PackageId>> {
                if name == "fmt" {
                    Ok(vec![PackageId::new("fmt", Version::new(7, 0, 0))])
                } else {
                    Ok(Vec::new())
                }
            }
            fn dependencies_of(&self, _id: &PackageId) -> Result<Vec<Dependency>> {
                Ok(Vec::new())
            }
        }

        let tmp = TempDir::new().unwrap();
        let mut repo = Repository::open_for_write(tmp.path().join("repo")).unwrap();
        let fmt = make_sdist(&tmp.path().join("b"), "fmt", "6.1.0", &[]);
        repo.add_sdist(&fmt, IfExists::Error).unwrap();

        // The catalog's newer version wins the range that admits both.
        let deps = vec![Dependency::new("fmt", ">=6".parse().unwrap())];
        let solution = repo.solve(&deps, &OneVersionCatalog).unwrap();
        assert_eq!(solution[0].to_string(), "fmt@7.0.0");

        // Adding an sdist never removes a previously offered candidate.
        let deps = vec![Dependency::new("fmt", "^6.0".parse().unwrap())];
        let solution = repo.solve(&deps, &OneVersionCatalog).unwrap();
        assert_eq!(solution[0].to_string(), "fmt@6.1.0");
    }
}
