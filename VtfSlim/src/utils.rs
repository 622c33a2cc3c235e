//! Path and file helpers shared by the tree-wide operations

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Normalize path separators to forward slashes
pub fn normalize_path<P: AsRef<Path>>(path: P) -> String {
    path.as_ref().to_string_lossy().replace('\\', "/")
}

/// Path of `path` under `base`, forward-slashed and lowercased
pub fn relative_key(path: &Path, base: &Path) -> Option<String> {
    path.strip_prefix(base)
        .ok()
        .map(|rel| normalize_path(rel).to_lowercase())
}

/// Whether `path` has extension `ext` (case-insensitive)
pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Find all files with extension `ext` under `dir`, sorted.
pub fn find_files<P: AsRef<Path>>(dir: P, ext: &str) -> Vec<PathBuf> {
    let mut files: Vec<_> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file() && has_extension(e.path(), ext))
        .map(walkdir::DirEntry::into_path)
        .collect();

    files.sort();
    files
}

/// Like [`find_files`], but an entry that cannot be walked (unreadable
/// directory, symlink loop) fails the whole listing.
pub fn try_find_files<P: AsRef<Path>>(dir: P, ext: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry?;
        if entry.file_type().is_file() && has_extension(entry.path(), ext) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// Fail with [`Error::InvalidInputDirectory`] unless `dir` is a directory.
pub fn ensure_input_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(Error::InvalidInputDirectory(dir.to_path_buf()))
    }
}

/// Copy `src` to `dst`, creating parent directories. Copying a file onto itself is a no-op.
pub fn copy_file(src: &Path, dst: &Path) -> Result<u64> {
    if same_path(src, dst) {
        return Ok(fs::metadata(src)?.len());
    }
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(fs::copy(src, dst)?)
}

/// Mirror `path` from under `input` to the same place under `output`.
pub fn mirror_path(path: &Path, input: &Path, output: &Path) -> PathBuf {
    output.join(path.strip_prefix(input).unwrap_or(path))
}

/// Whether two paths name the same existing file or directory.
pub fn same_path(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_relative_key() {
        let key = relative_key(Path::new("/a/Materials/Props/Crate.VTF"), Path::new("/a"));
        assert_eq!(key.as_deref(), Some("materials/props/crate.vtf"));
        assert_eq!(relative_key(Path::new("/b/x.vtf"), Path::new("/a")), None);
    }

    #[test]
    fn test_find_files_is_case_insensitive_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/b.VTF"), b"").unwrap();
        fs::write(dir.path().join("a.vtf"), b"").unwrap();
        fs::write(dir.path().join("c.vmt"), b"").unwrap();

        let files = find_files(dir.path(), "vtf");
        assert_eq!(files, vec![dir.path().join("a.vtf"), dir.path().join("sub/b.VTF")]);
    }

    #[test]
    fn test_try_find_files_reports_walk_errors() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.vtf"), b"").unwrap();
        assert_eq!(try_find_files(dir.path(), "vtf").unwrap(), vec![dir.path().join("a.vtf")]);

        assert!(matches!(
            try_find_files(dir.path().join("missing"), "vtf"),
            Err(Error::WalkDirError(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_try_find_files_fails_on_symlink_loop() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("sub/back")).unwrap();

        assert!(matches!(try_find_files(dir.path(), "vtf"), Err(Error::WalkDirError(_))));
        assert!(find_files(dir.path(), "vtf").is_empty());
    }

    #[test]
    fn test_copy_onto_itself_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.bin");
        fs::write(&path, b"abc").unwrap();
        assert_eq!(copy_file(&path, &path).unwrap(), 3);
        assert_eq!(fs::read(&path).unwrap(), b"abc");

        let target = dir.path().join("x/y/a.bin");
        copy_file(&path, &target).unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"abc");
    }

    #[test]
    fn test_ensure_input_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ensure_input_dir(dir.path()).is_ok());
        assert!(matches!(
            ensure_input_dir(&dir.path().join("missing")),
            Err(Error::InvalidInputDirectory(_))
        ));
    }
}
