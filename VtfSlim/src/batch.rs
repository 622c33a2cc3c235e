//! Batch texture operations
//!
//! This module runs one per-texture operation over every texture in a
//! directory tree in parallel, mirroring the tree into an output directory.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use serde::Serialize;

use crate::config::{NormalMapHints, OptimizerConfig};
use crate::error::Result;
use crate::optimize::{FileOutcome, fit_alpha, halve_normal, shrink_solid};
use crate::progress::{OptimizePhase, OptimizeProgress, OptimizeProgressCallback};
use crate::utils::{ensure_input_dir, find_files, mirror_path};

/// A per-texture operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureOperation {
    /// Re-encode in the narrowest format the alpha channel allows
    FitAlpha { lossless: bool },
    /// Halve normal maps (flag bit 19)
    HalveNormals { hints: NormalMapHints },
    /// Shrink solid-color textures to 4x4 (flag bit 20)
    ShrinkSolid,
}

impl TextureOperation {
    /// Fit-alpha with the configured lossless policy.
    #[must_use]
    pub fn fit_alpha(config: &OptimizerConfig) -> Self {
        Self::FitAlpha {
            lossless: config.lossless,
        }
    }

    /// Halve-normals with the configured filename hints.
    #[must_use]
    pub fn halve_normals(config: &OptimizerConfig) -> Self {
        Self::HalveNormals {
            hints: config.normal_map_hints.clone(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::FitAlpha { .. } => "fit-alpha",
            Self::HalveNormals { .. } => "halve-normals",
            Self::ShrinkSolid => "shrink-solid",
        }
    }

    /// Run the operation on `src`, writing the result to `dst`.
    pub fn apply(&self, src: &Path, dst: &Path) -> Result<FileOutcome> {
        match self {
            Self::FitAlpha { lossless } => fit_alpha(src, dst, *lossless),
            Self::HalveNormals { hints } => halve_normal(src, dst, hints),
            Self::ShrinkSolid => shrink_solid(src, dst),
        }
    }
}

/// Result of a batch operation
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchResult {
    /// Number of files processed without error
    pub success_count: usize,
    /// Number of files that failed
    pub fail_count: usize,
    /// Messages for each file processed
    pub results: Vec<String>,
}

/// Run `operation` over every file with extension `extension` under `input`.
///
/// Each file lands at the same relative path under `output`; `output` may
/// equal `input` to work in place. A failing or panicking file is logged and
/// counted, and never aborts the batch.
///
/// # Arguments
/// * `input` - Directory to search for textures
/// * `output` - Directory receiving the mirrored results
/// * `operation` - The per-texture operation
/// * `extension` - Texture extension, matched case-insensitively
/// * `progress` - Callback for progress updates
///
/// # Returns
/// Summary of the batch, or `InvalidInputDirectory` if `input` is not a directory.
pub fn process_tree(
    input: &Path,
    output: &Path,
    operation: &TextureOperation,
    extension: &str,
    progress: OptimizeProgressCallback,
) -> Result<BatchResult> {
    ensure_input_dir(input)?;

    progress(&OptimizeProgress::new(OptimizePhase::ScanningFiles, 0, 0));
    let files = find_files(input, extension);

    let success_counter = AtomicUsize::new(0);
    let fail_counter = AtomicUsize::new(0);
    let processed = AtomicUsize::new(0);
    let total = files.len();

    let results: Vec<String> = files
        .par_iter()
        .map(|src| {
            let display_path = src.strip_prefix(input).unwrap_or(src).display().to_string();

            let current = processed.fetch_add(1, Ordering::SeqCst) + 1;
            progress(&OptimizeProgress::with_file(
                OptimizePhase::ProcessingTextures,
                current,
                total,
                display_path.clone(),
            ));

            let dst = mirror_path(src, input, output);
            if let Some(parent) = dst.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    fail_counter.fetch_add(1, Ordering::SeqCst);
                    tracing::error!("Failed to create folder for {display_path}: {e}");
                    return format!("Failed to create folder for {display_path}: {e}");
                }
            }

            match catch_unwind(AssertUnwindSafe(|| operation.apply(src, &dst))) {
                Ok(Ok(outcome)) => {
                    success_counter.fetch_add(1, Ordering::SeqCst);
                    format!("{display_path}: {outcome}")
                }
                Ok(Err(e)) => {
                    fail_counter.fetch_add(1, Ordering::SeqCst);
                    tracing::error!("{} failed for {display_path}: {e}", operation.name());
                    format!("Failed {display_path}: {e}")
                }
                Err(_) => {
                    fail_counter.fetch_add(1, Ordering::SeqCst);
                    tracing::error!("{} panicked on {display_path}", operation.name());
                    format!("Failed {display_path}: panicked")
                }
            }
        })
        .collect();

    progress(&OptimizeProgress::new(OptimizePhase::Complete, total, total));

    Ok(BatchResult {
        success_count: success_counter.load(Ordering::SeqCst),
        fail_count: fail_counter.load(Ordering::SeqCst),
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::formats::{ImageFormat, VtfTexture};
    use crate::progress::no_progress;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_mirrors_tree_and_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        let output = dir.path().join("out");
        fs::create_dir_all(input.join("materials/a")).unwrap();

        let tex = VtfTexture::from_rgba_frames(4, 4, ImageFormat::Bgra8888, &[[9, 8, 7, 255].repeat(16)])
            .unwrap();
        tex.bake_to_file(&input.join("materials/a/opaque.vtf")).unwrap();
        fs::write(input.join("materials/broken.VTF"), b"garbage").unwrap();

        let op = TextureOperation::FitAlpha { lossless: true };
        let result = process_tree(&input, &output, &op, "vtf", &no_progress).unwrap();
        assert_eq!(result.success_count, 2);
        assert_eq!(result.fail_count, 0);
        assert_eq!(result.results.len(), 2);

        let fitted = VtfTexture::open(output.join("materials/a/opaque.vtf")).unwrap();
        assert_eq!(fitted.format(), ImageFormat::Bgr888);
        assert_eq!(fs::read(output.join("materials/broken.VTF")).unwrap(), b"garbage");
    }

    #[test]
    fn test_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let result = process_tree(&missing, &missing, &TextureOperation::ShrinkSolid, "vtf", &no_progress);
        assert!(matches!(result, Err(Error::InvalidInputDirectory(_))));
    }

    #[test]
    fn test_operation_from_config() {
        let config = OptimizerConfig {
            lossless: false,
            ..OptimizerConfig::default()
        };
        assert_eq!(
            TextureOperation::fit_alpha(&config),
            TextureOperation::FitAlpha { lossless: false }
        );
        assert_eq!(TextureOperation::halve_normals(&config).name(), "halve-normals");
    }
}
