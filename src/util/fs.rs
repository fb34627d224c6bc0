//! Filesystem operations for the sdist store and build outputs.

use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// Create a directory and any missing parents.
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

/// Delete a directory tree. A path that is already gone is success, so
/// callers clearing staging areas need no exists-check of their own.
pub fn remove_tree(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other.with_context(|| format!("failed to remove directory: {}", path.display())),
    }
}

/// Copy a directory tree, mirroring its layout under `dst`.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src) {
        let entry =
            entry.with_context(|| format!("failed to walk directory: {}", src.display()))?;
        let rel = entry.path().strip_prefix(src)?;
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            ensure_dir(&target)?;
        } else {
            fs::copy(entry.path(), &target).with_context(|| {
                format!(
                    "failed to copy {} to {}",
                    entry.path().display(),
                    target.display()
                )
            })?;
        }
    }
    Ok(())
}

/// Replace `dest` with a copy of `src`, staging the copy under `staging`
/// first and only touching `dest` by a final rename. A crash mid-copy
/// leaves at worst a stale staging directory, never a half-written tree
/// under the final name. Any leftover staging content is wiped first.
pub fn replace_via_staging(src: &Path, staging: &Path, dest: &Path) -> Result<()> {
    remove_tree(staging)?;
    copy_tree(src, staging)?;
    remove_tree(dest)?;
    fs::rename(staging, dest)
        .with_context(|| format!("failed to move staged copy into place: {}", dest.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn remove_tree_tolerates_absence() {
        let tmp = TempDir::new().unwrap();
        remove_tree(&tmp.path().join("never-existed")).unwrap();
    }

    #[test]
    fn copy_tree_mirrors_nested_layout() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::write(src.join("a.txt"), "a").unwrap();
        fs::write(src.join("nested/b.txt"), "b").unwrap();

        let dst = tmp.path().join("dst");
        copy_tree(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst.join("a.txt")).unwrap(), "a");
        assert_eq!(fs::read_to_string(dst.join("nested/b.txt")).unwrap(), "b");
    }

    #[test]
    fn replace_via_staging_imports_fresh_trees() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("pkg");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("file"), "new").unwrap();

        let staging = tmp.path().join(".staging");
        let dest = tmp.path().join("dest");
        replace_via_staging(&src, &staging, &dest).unwrap();

        assert_eq!(fs::read_to_string(dest.join("file")).unwrap(), "new");
        assert!(!staging.exists());
    }

    #[test]
    fn replace_via_staging_removes_the_old_tree_entirely() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("pkg");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("kept"), "v2").unwrap();

        let dest = tmp.path().join("dest");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("stale"), "v1").unwrap();

        // Leftover staging content from an interrupted run is wiped too.
        let staging = tmp.path().join(".staging");
        fs::create_dir_all(&staging).unwrap();
        fs::write(staging.join("junk"), "junk").unwrap();

        replace_via_staging(&src, &staging, &dest).unwrap();

        assert_eq!(fs::read_to_string(dest.join("kept")).unwrap(), "v2");
        assert!(!dest.join("stale").exists());
        assert!(!dest.join("junk").exists());
    }
}
