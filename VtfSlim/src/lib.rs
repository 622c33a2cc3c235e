//! # VtfSlim
//!
//! Shrinks Source engine mod assets without changing how they look in game.
//!
//! ## Operations
//!
//! - **Format fitting** - Re-encode VTF textures in the narrowest format their alpha allows
//! - **Normal halving** - Halve normal maps and mark them with flag bit 19
//! - **Solid shrinking** - Shrink one-color textures to 4x4 and mark them with flag bit 20
//! - **Duplicate removal** - Collapse identical textures into shared storage and
//!   rewrite VMT references to point at it
//! - **Cleanup** - Remove legacy model meshes and textures no material references
//!
//! ## Quick Start
//!
//! ### Fitting a tree of textures
//!
//! ```no_run
//! use std::path::Path;
//! use vtfslim::prelude::*;
//!
//! let op = TextureOperation::FitAlpha { lossless: true };
//! let result = process_tree(Path::new("mod/"), Path::new("out/"), &op, "vtf", &no_progress)?;
//! println!("{} ok, {} failed", result.success_count, result.fail_count);
//! # Ok::<(), vtfslim::Error>(())
//! ```
//!
//! ### Removing duplicates in place
//!
//! ```no_run
//! use std::path::Path;
//! use vtfslim::prelude::*;
//!
//! let dir = Path::new("mod/");
//! let report = remove_duplicates(dir, dir, &DedupOptions::default(), &no_progress)?;
//! println!("removed {} files", report.removed_files);
//! # Ok::<(), vtfslim::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `vtfslim` command-line binary

pub mod batch;
pub mod cleanup;
pub mod config;
pub mod dedup;
pub mod error;
pub mod formats;
pub mod materials;
pub mod optimize;
pub mod progress;
pub mod stats;
pub mod utils;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::config::{NormalMapHints, OptimizerConfig};
    pub use crate::formats::{ImageFormat, ResizeFilter, TextureFlags, VtfTexture};
    pub use crate::progress::{OptimizePhase, OptimizeProgress, OptimizeProgressCallback, no_progress};

    // Per-texture operations
    pub use crate::optimize::{FileOutcome, KeepReason, fit_alpha, halve_normal, shrink_solid};
    pub use crate::batch::{BatchResult, TextureOperation, process_tree};

    // Materials and duplicates
    pub use crate::materials::{MaterialFile, TextureReference, scan_materials};
    pub use crate::dedup::{
        ContentHash, DedupOptions, DedupReport, DuplicateGroup, DuplicateIndex,
        find_asset_roots, remove_duplicates,
    };

    pub use crate::cleanup::{CleanupReport, prune_legacy_files, prune_unreferenced_textures};
    pub use crate::stats::SessionStats;
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
