//! Removal of files the game never loads
//!
//! Both passes have two modes. Remove mode deletes in place. Copy mode
//! leaves the input alone and mirrors only the files worth keeping into an
//! output directory.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::warn;
use walkdir::WalkDir;

use crate::dedup::DedupOptions;
use crate::error::Result;
use crate::materials::scan_materials;
use crate::progress::{OptimizePhase, OptimizeProgress, OptimizeProgressCallback};
use crate::stats;
use crate::utils::{copy_file, ensure_input_dir, mirror_path, relative_key, try_find_files};

/// Model-mesh variants only older engine branches and consoles load
pub const LEGACY_SUFFIXES: &[&str] = &[".360.vtx", ".dx80.vtx", ".sw.vtx", ".xbox.vtx"];

/// Summary of a cleanup pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    /// Files examined
    pub scanned: usize,
    pub removed_files: usize,
    pub bytes_removed: u64,
    /// Files mirrored to the output directory
    pub copied_files: usize,
    /// Per-file failure messages
    pub failed: Vec<String>,
}

impl CleanupReport {
    fn remove(&mut self, path: &Path) {
        let result = fs::metadata(path).and_then(|m| fs::remove_file(path).map(|()| m.len()));
        match result {
            Ok(size) => {
                stats::record_removed(size);
                self.removed_files += 1;
                self.bytes_removed += size;
            }
            Err(e) => self.fail(path, &e),
        }
    }

    fn copy(&mut self, path: &Path, input: &Path, output: &Path) {
        match copy_file(path, &mirror_path(path, input, output)) {
            Ok(_) => self.copied_files += 1,
            Err(e) => self.fail(path, &e),
        }
    }

    fn fail(&mut self, path: &Path, e: &dyn std::fmt::Display) {
        warn!("Cleanup failed for {}: {e}", path.display());
        self.failed.push(format!("{}: {e}", path.display()));
    }
}

/// Whether a file name ends with a [`LEGACY_SUFFIXES`] entry (case-insensitive).
#[must_use]
pub fn is_legacy_file(path: &Path) -> bool {
    path.file_name().is_some_and(|name| {
        let name = name.to_string_lossy().to_lowercase();
        LEGACY_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
    })
}

/// Delete legacy files under `input`, or mirror everything else to `output`.
pub fn prune_legacy_files(
    input: &Path,
    output: &Path,
    remove: bool,
    progress: OptimizeProgressCallback,
) -> Result<CleanupReport> {
    ensure_input_dir(input)?;

    let files: Vec<_> = WalkDir::new(input)
        .follow_links(true)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .collect();

    let mut report = CleanupReport {
        scanned: files.len(),
        ..CleanupReport::default()
    };
    let total = files.len();
    for (i, path) in files.iter().enumerate() {
        progress(&OptimizeProgress::with_file(
            OptimizePhase::PruningFiles,
            i + 1,
            total,
            path.display().to_string(),
        ));
        match (is_legacy_file(path), remove) {
            (true, true) => report.remove(path),
            (false, false) => report.copy(path, input, output),
            _ => {}
        }
    }

    tracing::info!(
        "Pruned legacy files under {}: {} removed, {} copied",
        input.display(),
        report.removed_files,
        report.copied_files
    );
    Ok(report)
}

/// Every texture path referenced by a material under `input`, lowercased
/// with the texture extension appended where missing.
pub fn referenced_textures(input: &Path, options: &DedupOptions) -> Result<HashSet<String>> {
    let suffix = format!(".{}", options.texture_extension.to_lowercase());
    let deps = scan_materials(input, &options.material_extension)?;
    Ok(deps
        .into_values()
        .flatten()
        .map(|path| {
            if path.ends_with(&suffix) {
                path
            } else {
                path + &suffix
            }
        })
        .collect())
}

/// Whether a texture at relative key `key` is in `referenced`, with or
/// without a leading `<marker>/` directory.
fn is_referenced(key: &str, marker: &str, referenced: &HashSet<String>) -> bool {
    if referenced.contains(key) {
        return true;
    }
    let prefix = format!("{}/", marker.to_lowercase());
    key.strip_prefix(prefix.as_str())
        .is_some_and(|rest| referenced.contains(rest))
}

/// Delete textures no material references, or mirror the referenced ones
/// and every material to `output`.
pub fn prune_unreferenced_textures(
    input: &Path,
    output: &Path,
    remove: bool,
    options: &DedupOptions,
    progress: OptimizeProgressCallback,
) -> Result<CleanupReport> {
    ensure_input_dir(input)?;

    progress(&OptimizeProgress::new(OptimizePhase::ScanningFiles, 0, 0));
    let referenced = referenced_textures(input, options)?;
    let textures = try_find_files(input, &options.texture_extension)?;

    let mut report = CleanupReport {
        scanned: textures.len(),
        ..CleanupReport::default()
    };
    let total = textures.len();
    for (i, path) in textures.iter().enumerate() {
        progress(&OptimizeProgress::with_file(
            OptimizePhase::PruningFiles,
            i + 1,
            total,
            path.display().to_string(),
        ));
        let used = relative_key(path, input)
            .is_some_and(|key| is_referenced(&key, &options.asset_root_marker, &referenced));
        match (used, remove) {
            (false, true) => report.remove(path),
            (true, false) => report.copy(path, input, output),
            _ => {}
        }
    }

    if !remove {
        for material in try_find_files(input, &options.material_extension)? {
            report.copy(&material, input, output);
        }
    }

    tracing::info!(
        "Pruned unreferenced textures under {}: {} removed, {} copied",
        input.display(),
        report.removed_files,
        report.copied_files
    );
    Ok(report)
}
