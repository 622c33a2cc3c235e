//! Landing per-file results at the destination
//!
//! Every per-texture operation builds a [`Plan`] from the source bytes. The
//! plan either bakes a new texture or keeps the source; any error while
//! planning or baking falls back to copying the source unchanged, so the
//! destination is never missing or half-written.

use std::fmt;
use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::Result;
use crate::formats::{ImageFormat, VtfTexture};
use crate::stats;
use crate::utils::copy_file;

/// Why a texture was left as it is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepReason {
    /// A frame has all-zero alpha, treated as non-color data
    AlphaIsData,
    /// Some alpha lies strictly between 0 and 255
    Translucent,
    /// One-bit alpha would change color data
    LossyOneBitAlpha,
    /// Already the narrowest fitting format
    AlreadyNarrow,
    /// No pixel codec for the format
    UnsupportedFormat,
    /// The operation's flag bit is already set
    AlreadyProcessed,
    NotNormalMap,
    NotSolidColor,
    /// Target size equals the current size or is degenerate
    AtMinimumSize,
}

impl KeepReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AlphaIsData => "alpha channel holds data",
            Self::Translucent => "translucent alpha",
            Self::LossyOneBitAlpha => "one-bit alpha would crush color",
            Self::AlreadyNarrow => "already narrowest format",
            Self::UnsupportedFormat => "unsupported format",
            Self::AlreadyProcessed => "already processed",
            Self::NotNormalMap => "not a normal map",
            Self::NotSolidColor => "not a solid color",
            Self::AtMinimumSize => "at minimum size",
        }
    }
}

impl fmt::Display for KeepReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one texture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Converted { from: ImageFormat, to: ImageFormat },
    Resized { from: (u32, u32), to: (u32, u32) },
    Kept(KeepReason),
    /// Processing failed; the source was copied unchanged
    CopiedThrough { reason: String },
}

impl FileOutcome {
    /// Whether the destination differs from the source.
    #[must_use]
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Converted { .. } | Self::Resized { .. })
    }
}

impl fmt::Display for FileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Converted { from, to } => write!(f, "{from} -> {to}"),
            Self::Resized { from, to } => {
                write!(f, "{}x{} -> {}x{}", from.0, from.1, to.0, to.1)
            }
            Self::Kept(reason) => write!(f, "kept ({reason})"),
            Self::CopiedThrough { reason } => write!(f, "copied unchanged ({reason})"),
        }
    }
}

/// Result of planning one texture
#[derive(Debug)]
pub enum Plan {
    /// Write this texture to the destination
    Bake(Box<VtfTexture>, FileOutcome),
    /// Copy the source bytes verbatim
    Keep(KeepReason),
}

/// Plan `src` with `planner` and land the result at `dst`.
///
/// Errors from the planner or the bake are logged and turned into a verbatim
/// copy; only a failure to read `src` or to copy it is returned.
pub fn execute_plan<F>(src: &Path, dst: &Path, planner: F) -> Result<FileOutcome>
where
    F: FnOnce(&[u8]) -> Result<Plan>,
{
    let bytes = fs::read(src)?;
    let name = src.display();

    let outcome = match planner(&bytes) {
        Ok(Plan::Bake(texture, outcome)) => match texture.bake_to_file(dst) {
            Ok(()) => {
                debug!("{name}: {outcome}");
                outcome
            }
            Err(e) => {
                warn!("Failed to bake {name}, copying unchanged: {e}");
                copy_file(src, dst)?;
                FileOutcome::CopiedThrough {
                    reason: e.to_string(),
                }
            }
        },
        Ok(Plan::Keep(reason)) => {
            debug!("{name}: kept ({reason})");
            copy_file(src, dst)?;
            FileOutcome::Kept(reason)
        }
        Err(e) => {
            let reason = if e.is_decode_error() {
                warn!("Unreadable texture {name}, copying unchanged: {e}");
                format!("unreadable texture: {e}")
            } else {
                warn!("Failed to process {name}, copying unchanged: {e}");
                e.to_string()
            };
            copy_file(src, dst)?;
            FileOutcome::CopiedThrough { reason }
        }
    };

    let written = fs::metadata(dst).map_or(bytes.len() as u64, |m| m.len());
    stats::record_file(bytes.len() as u64, written);
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_planner_error_copies_source() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.vtf");
        let dst = dir.path().join("out/in.vtf");
        fs::write(&src, b"not a texture").unwrap();

        let outcome = execute_plan(&src, &dst, |bytes| {
            VtfTexture::read(bytes).map(|_| Plan::Keep(KeepReason::AlreadyNarrow))
        })
        .unwrap();

        let FileOutcome::CopiedThrough { reason } = outcome else {
            panic!("expected a copy-through, got {outcome:?}");
        };
        assert!(reason.starts_with("unreadable texture: "));
        assert_eq!(fs::read(&dst).unwrap(), b"not a texture");
    }

    #[test]
    fn test_encode_error_is_not_reported_as_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.vtf");
        let dst = dir.path().join("out/in.vtf");
        fs::write(&src, b"bytes").unwrap();

        let outcome = execute_plan(&src, &dst, |_| {
            Err(Error::Io(std::io::Error::other("disk full")))
        })
        .unwrap();
        let FileOutcome::CopiedThrough { reason } = outcome else {
            panic!("expected a copy-through, got {outcome:?}");
        };
        assert!(!reason.starts_with("unreadable texture"));
        assert_eq!(fs::read(&dst).unwrap(), b"bytes");
    }

    #[test]
    fn test_keep_in_place_leaves_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.vtf");
        fs::write(&src, b"bytes").unwrap();

        let outcome = execute_plan(&src, &src, |_| Ok(Plan::Keep(KeepReason::Translucent))).unwrap();
        assert_eq!(outcome, FileOutcome::Kept(KeepReason::Translucent));
        assert_eq!(fs::read(&src).unwrap(), b"bytes");
    }

    #[test]
    fn test_missing_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("missing.vtf");
        let result = execute_plan(&src, &src, |_| Ok(Plan::Keep(KeepReason::Translucent)));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
