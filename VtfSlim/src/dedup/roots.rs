//! Asset-root discovery

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

fn name_matches(path: &Path, marker: &str) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().eq_ignore_ascii_case(marker))
}

/// Find every directory named `marker` (case-insensitive) under `input`.
///
/// The input itself counts when its own name matches. Roots nested inside
/// another root are covered by the outer one and are not returned.
#[must_use]
pub fn find_asset_roots(input: &Path, marker: &str) -> Vec<PathBuf> {
    let own_name = input.canonicalize().unwrap_or_else(|_| input.to_path_buf());
    if name_matches(&own_name, marker) {
        return vec![input.to_path_buf()];
    }

    let mut roots = Vec::new();
    let mut walker = WalkDir::new(input).min_depth(1).follow_links(true).into_iter();
    while let Some(entry) = walker.next() {
        let Ok(entry) = entry else { continue };
        if entry.file_type().is_dir() && name_matches(entry.path(), marker) {
            roots.push(entry.into_path());
            walker.skip_current_dir();
        }
    }

    roots.sort();
    roots
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_finds_roots_anywhere() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("mod_a/materials/materials")).unwrap();
        fs::create_dir_all(dir.path().join("mod_b/custom/Materials")).unwrap();
        fs::create_dir_all(dir.path().join("mod_c/models")).unwrap();
        fs::write(dir.path().join("mod_c/materials"), b"a file, not a root").unwrap();

        let roots = find_asset_roots(dir.path(), "materials");
        assert_eq!(
            roots,
            vec![
                dir.path().join("mod_a/materials"),
                dir.path().join("mod_b/custom/Materials"),
            ]
        );
    }

    #[test]
    fn test_input_itself_is_a_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("MATERIALS");
        fs::create_dir_all(root.join("materials")).unwrap();
        assert_eq!(find_asset_roots(&root, "materials"), vec![root]);
    }

    #[test]
    fn test_no_roots() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("models")).unwrap();
        assert!(find_asset_roots(dir.path(), "materials").is_empty());
    }
}
