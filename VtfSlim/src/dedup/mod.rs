//! Duplicate texture removal
//!
//! Byte-identical textures under an asset root are collapsed into one copy
//! per digest inside a shared-storage directory, and every material under the
//! root is rewritten to point at the shared copy.
//!
//! The pass is sequential per root and ordered: hash everything, form groups,
//! materialize shared copies, delete originals, rewrite references.

pub mod index;
pub mod rewrite;
pub mod roots;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::OptimizerConfig;
use crate::error::{Error, Result};
use crate::materials::{decode_latin1, encode_latin1};
use crate::progress::{OptimizePhase, OptimizeProgress, OptimizeProgressCallback};
use crate::stats;
use crate::utils::{copy_file, ensure_input_dir, mirror_path, relative_key, same_path, try_find_files};

pub use index::{ContentHash, DuplicateGroup, DuplicateIndex};
pub use rewrite::{RewriteResult, reference_key, rewrite_material_text};
pub use roots::find_asset_roots;

/// Names and extensions the duplicate pass works with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupOptions {
    pub asset_root_marker: String,
    pub shared_dir_name: String,
    pub texture_extension: String,
    pub material_extension: String,
}

impl From<&OptimizerConfig> for DedupOptions {
    fn from(config: &OptimizerConfig) -> Self {
        Self {
            asset_root_marker: config.asset_root_marker.clone(),
            shared_dir_name: config.shared_dir_name.clone(),
            texture_extension: config.texture_extension.clone(),
            material_extension: config.material_extension.clone(),
        }
    }
}

impl Default for DedupOptions {
    fn default() -> Self {
        Self::from(&OptimizerConfig::default())
    }
}

/// Summary of one duplicate pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DedupReport {
    /// Asset roots processed, sorted
    pub roots: Vec<PathBuf>,
    /// Number of duplicate groups across the input
    pub groups: usize,
    /// Number of files across all duplicate groups
    pub duplicate_files: usize,
    /// Files newly copied into shared storage
    pub shared_copies: usize,
    pub removed_files: usize,
    pub bytes_removed: u64,
    pub materials_rewritten: usize,
    pub references_rewritten: usize,
    /// Duplicates copied to a separate output directory
    pub copied_to_output: usize,
    /// Per-file failure messages
    pub failed: Vec<String>,
}

/// Remove duplicate textures under `input`.
///
/// When `output` names the same directory as `input` the tree is changed in
/// place. Otherwise every duplicate is copied to its mirrored location under
/// `output` and `input` is left untouched.
pub fn remove_duplicates(
    input: &Path,
    output: &Path,
    options: &DedupOptions,
    progress: OptimizeProgressCallback,
) -> Result<DedupReport> {
    ensure_input_dir(input)?;

    progress(&OptimizeProgress::new(OptimizePhase::ScanningFiles, 0, 0));
    let roots = find_asset_roots(input, &options.asset_root_marker);
    if roots.is_empty() {
        return Err(Error::MissingAssetRoot {
            marker: options.asset_root_marker.clone(),
            input: input.to_path_buf(),
        });
    }

    let index = DuplicateIndex::build(input, &options.texture_extension, progress)?;
    let mut report = DedupReport {
        groups: index.len(),
        duplicate_files: index.member_count(),
        ..DedupReport::default()
    };
    tracing::info!(
        "Found {} duplicate groups ({} files) under {}",
        report.groups,
        report.duplicate_files,
        input.display()
    );

    if same_path(input, output) {
        for root in &roots {
            dedup_root(root, &index, options, &mut report, progress)?;
        }
        report.roots = roots;
    } else {
        copy_duplicates(input, output, &index, &mut report, progress);
    }

    progress(&OptimizeProgress::new(OptimizePhase::Complete, 1, 1));
    Ok(report)
}

fn copy_duplicates(
    input: &Path,
    output: &Path,
    index: &DuplicateIndex,
    report: &mut DedupReport,
    progress: OptimizeProgressCallback,
) {
    let total = index.member_count();
    for (i, (path, _)) in index.members().enumerate() {
        progress(&OptimizeProgress::with_file(
            OptimizePhase::CopyingShared,
            i + 1,
            total,
            path.display().to_string(),
        ));
        match copy_file(path, &mirror_path(path, input, output)) {
            Ok(_) => report.copied_to_output += 1,
            Err(e) => {
                warn!("Failed to copy duplicate {}: {e}", path.display());
                report.failed.push(format!("{}: {e}", path.display()));
            }
        }
    }
}

fn dedup_root(
    root: &Path,
    index: &DuplicateIndex,
    options: &DedupOptions,
    report: &mut DedupReport,
    progress: OptimizeProgressCallback,
) -> Result<()> {
    let shared_dir = root.join(&options.shared_dir_name);
    fs::create_dir_all(&shared_dir)?;

    let members: Vec<(&Path, ContentHash)> = index
        .members()
        .filter(|(path, _)| path.starts_with(root) && !path.starts_with(&shared_dir))
        .collect();
    debug!("{}: {} duplicate members", root.display(), members.len());

    // Only members whose shared copy exists may be deleted or redirected.
    let total = members.len();
    let mut landed = Vec::with_capacity(total);
    let mut shared_names: HashMap<ContentHash, PathBuf> = HashMap::new();
    for (i, (path, hash)) in members.into_iter().enumerate() {
        progress(&OptimizeProgress::with_file(
            OptimizePhase::CopyingShared,
            i + 1,
            total,
            path.display().to_string(),
        ));
        // One shared copy per digest, named after the first member's extension.
        let shared = shared_names
            .entry(hash)
            .or_insert_with(|| shared_dir.join(shared_file_name(path, hash, options)));
        if !shared.exists() {
            if let Err(e) = copy_file(path, shared) {
                warn!("Failed to copy {} to shared storage: {e}", path.display());
                report.failed.push(format!("{}: {e}", path.display()));
                continue;
            }
            report.shared_copies += 1;
        }
        landed.push((path, hash));
    }

    let mut duplicates = HashMap::with_capacity(landed.len());
    let total = landed.len();
    for (i, (path, hash)) in landed.into_iter().enumerate() {
        progress(&OptimizeProgress::with_file(
            OptimizePhase::RemovingDuplicates,
            i + 1,
            total,
            path.display().to_string(),
        ));
        if let Some(key) = relative_key(path, root) {
            duplicates.insert(reference_key(&key, &options.texture_extension).to_string(), hash);
        }
        match remove_file(path) {
            Ok(size) => {
                report.removed_files += 1;
                report.bytes_removed += size;
            }
            Err(e) => {
                warn!("Failed to remove duplicate {}: {e}", path.display());
                report.failed.push(format!("{}: {e}", path.display()));
            }
        }
    }

    let materials = try_find_files(root, &options.material_extension)?;
    let total = materials.len();
    for (i, material) in materials.iter().enumerate() {
        progress(&OptimizeProgress::with_file(
            OptimizePhase::RewritingMaterials,
            i + 1,
            total,
            material.display().to_string(),
        ));
        match rewrite_material(material, &duplicates, options) {
            Ok(0) => {}
            Ok(count) => {
                report.materials_rewritten += 1;
                report.references_rewritten += count;
            }
            Err(e) => {
                warn!("Failed to rewrite {}: {e}", material.display());
                report.failed.push(format!("{}: {e}", material.display()));
            }
        }
    }

    Ok(())
}

/// `<digest>.<extension of path>`, falling back to the configured texture extension.
fn shared_file_name(path: &Path, hash: ContentHash, options: &DedupOptions) -> String {
    let ext = path
        .extension()
        .map_or_else(|| options.texture_extension.clone(), |e| e.to_string_lossy().into_owned());
    format!("{hash}.{ext}")
}

fn remove_file(path: &Path) -> Result<u64> {
    let size = fs::metadata(path)?.len();
    fs::remove_file(path)?;
    stats::record_removed(size);
    Ok(size)
}

/// Rewrite one material in place, returning the number of redirected references.
fn rewrite_material(
    path: &Path,
    duplicates: &HashMap<String, ContentHash>,
    options: &DedupOptions,
) -> Result<usize> {
    let text = decode_latin1(&fs::read(path)?);
    let result = rewrite_material_text(
        &text,
        duplicates,
        &options.shared_dir_name,
        &options.texture_extension,
    )?;
    if result.needs_write() {
        fs::write(path, encode_latin1(&result.text))?;
        debug!("Rewrote {} ({} references)", path.display(), result.substitutions);
    }
    Ok(result.substitutions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::no_progress;
    use pretty_assertions::assert_eq;

    fn write(path: &Path, data: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, data).unwrap();
    }

    #[test]
    fn test_in_place_collapses_and_rewrites() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("mod/materials");
        write(&root.join("x/y.vtf"), b"dup");
        write(&root.join("z/w.VTF"), b"dup");
        write(&root.join("x/unique.vtf"), b"unique");
        write(
            &root.join("x/a.vmt"),
            b"\"LightmappedGeneric\"\n{\n\t\"$basetexture\" \"x\\y\"\n\t\"$detail\" \"x/unique\"\n}\n",
        );

        let options = DedupOptions::default();
        let report = remove_duplicates(dir.path(), dir.path(), &options, &no_progress).unwrap();
        let hash = ContentHash::of_bytes(b"dup");

        assert_eq!(report.roots, vec![root.clone()]);
        assert_eq!(report.groups, 1);
        assert_eq!(report.shared_copies, 1);
        assert_eq!(report.removed_files, 2);
        assert_eq!(report.bytes_removed, 6);
        assert_eq!(report.references_rewritten, 1);
        assert!(report.failed.is_empty());

        assert!(!root.join("x/y.vtf").exists());
        assert!(!root.join("z/w.VTF").exists());
        assert!(root.join("x/unique.vtf").exists());
        assert_eq!(fs::read(root.join(format!("shared_duplicates/{hash}.vtf"))).unwrap(), b"dup");
        assert_eq!(
            fs::read_to_string(root.join("x/a.vmt")).unwrap(),
            format!(
                "\"LightmappedGeneric\"\n{{\n\t\"$basetexture\" \"shared_duplicates/{hash}\" // Original: x/y\n\t\"$detail\" \"x/unique\"\n}}\n"
            )
        );

        let before = fs::read(root.join("x/a.vmt")).unwrap();
        let rerun = remove_duplicates(dir.path(), dir.path(), &options, &no_progress).unwrap();
        assert_eq!(rerun.groups, 0);
        assert_eq!(rerun.removed_files, 0);
        assert_eq!(fs::read(root.join("x/a.vmt")).unwrap(), before);
    }

    #[test]
    fn test_separate_output_only_copies_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        let output = dir.path().join("out");
        write(&input.join("materials/a.vtf"), b"dup");
        write(&input.join("materials/b/a.vtf"), b"dup");
        write(&input.join("materials/c.vtf"), b"other");

        let report =
            remove_duplicates(&input, &output, &DedupOptions::default(), &no_progress).unwrap();
        assert_eq!(report.copied_to_output, 2);
        assert!(report.roots.is_empty());
        assert!(input.join("materials/a.vtf").exists());
        assert!(!input.join("materials/shared_duplicates").exists());
        assert_eq!(fs::read(output.join("materials/b/a.vtf")).unwrap(), b"dup");
        assert!(!output.join("materials/c.vtf").exists());
    }

    #[test]
    fn test_shared_copy_keeps_member_extension() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("materials");
        write(&root.join("a/w.VTF"), b"dup");
        write(&root.join("b/w.VTF"), b"dup");

        let report =
            remove_duplicates(dir.path(), dir.path(), &DedupOptions::default(), &no_progress).unwrap();
        let hash = ContentHash::of_bytes(b"dup");
        assert_eq!(report.shared_copies, 1);
        let shared: Vec<_> = fs::read_dir(root.join("shared_duplicates"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(shared, vec![format!("{hash}.VTF")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_unwalkable_tree_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("materials");
        write(&root.join("a/y.vtf"), b"dup");
        write(&root.join("b/y.vtf"), b"dup");
        std::os::unix::fs::symlink(&root, root.join("b/loop")).unwrap();

        let err = remove_duplicates(dir.path(), dir.path(), &DedupOptions::default(), &no_progress)
            .unwrap_err();
        assert!(matches!(err, Error::WalkDirError(_)));
        assert!(root.join("a/y.vtf").exists());
        assert!(root.join("b/y.vtf").exists());
        assert!(!root.join("shared_duplicates").exists());
    }

    #[test]
    fn test_missing_root_and_input() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("models/a.vtf"), b"dup");
        let options = DedupOptions::default();

        let err = remove_duplicates(dir.path(), dir.path(), &options, &no_progress).unwrap_err();
        assert!(matches!(err, Error::MissingAssetRoot { .. }));

        let missing = dir.path().join("nope");
        let err = remove_duplicates(&missing, &missing, &options, &no_progress).unwrap_err();
        assert!(matches!(err, Error::InvalidInputDirectory(_)));
    }

    #[test]
    fn test_options_follow_config() {
        let config = OptimizerConfig {
            shared_dir_name: "dupes".to_string(),
            ..OptimizerConfig::default()
        };
        let options = DedupOptions::from(&config);
        assert_eq!(options.shared_dir_name, "dupes");
        assert_eq!(options.asset_root_marker, "materials");
    }
}
