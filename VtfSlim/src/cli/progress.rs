//! CLI progress display utilities
//!
//! Step indicators with emojis and a phase-aware progress bar fed by
//! [`OptimizeProgress`] callbacks.

use std::time::Duration;

use console::{Emoji, style};
use indicatif::{HumanBytes, HumanDuration, ProgressBar, ProgressStyle};

use crate::progress::OptimizeProgress;
use crate::stats::SessionStats;

// =============================================================================
// Emoji Constants (with ASCII fallbacks for terminals without emoji support)
// =============================================================================

/// Magnifying glass - for reading/scanning operations
pub static LOOKING_GLASS: Emoji<'_, '_> = Emoji("🔍 ", "");
/// Gear - for processing/conversion operations
pub static GEAR: Emoji<'_, '_> = Emoji("⚙️  ", "");
/// Link - for hashing/grouping operations
pub static LINK: Emoji<'_, '_> = Emoji("🔗 ", "");
/// Broom - for cleanup operations
pub static BROOM: Emoji<'_, '_> = Emoji("🧹 ", "");
/// Picture - for texture/image operations
pub static PICTURE: Emoji<'_, '_> = Emoji("🖼️  ", "");
/// Sparkles - for completion
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "");

// =============================================================================
// Step-Based Progress
// =============================================================================

/// Print a step indicator: `[1/3] 🔍 Message...`
pub fn print_step(current: usize, total: usize, emoji: Emoji, msg: &str) {
    println!(
        "{} {}{}",
        style(format!("[{current}/{total}]")).bold().dim(),
        emoji,
        msg
    );
}

/// Print completion message with session totals: `✨ Done in 2s (3 files, 1.20 MiB saved)`
pub fn print_done(elapsed: Duration, stats: &SessionStats) {
    let saved = if stats.bytes_saved >= 0 {
        format!("{} saved", HumanBytes(stats.bytes_saved.unsigned_abs()))
    } else {
        format!("{} added", HumanBytes(stats.bytes_saved.unsigned_abs()))
    };
    println!(
        "{} Done in {} ({} files, {})",
        SPARKLE,
        HumanDuration(elapsed),
        stats.files_processed + stats.files_removed,
        saved
    );
}

// =============================================================================
// Progress Bars
// =============================================================================

/// Progress bar style for tree-wide operations
///
/// Format: `Hashing textures [████████░░░░░░░░] 50/100 materials/wall.vtf`
///
/// # Panics
/// Panics if the template string is invalid (this is a compile-time constant).
#[must_use]
pub fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{prefix:.bold.dim} [{bar:40.cyan/blue}] {pos}/{len} {wide_msg}")
        .expect("valid template")
        .progress_chars("##-")
}

/// Create a progress bar, hidden when `quiet`
#[must_use]
pub fn phase_bar(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(0);
    pb.set_style(bar_style());
    pb
}

/// Mirror one progress update onto `pb`
pub fn update_bar(pb: &ProgressBar, progress: &OptimizeProgress) {
    pb.set_prefix(progress.phase.as_str());
    pb.set_length(progress.total as u64);
    pb.set_position(progress.current as u64);
    if let Some(ref name) = progress.current_file {
        pb.set_message(name.clone());
    }
}
