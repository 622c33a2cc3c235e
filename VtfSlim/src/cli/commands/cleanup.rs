//! CLI commands for cleanup passes

use std::path::Path;
use std::time::Instant;

use serde_json::json;

use super::{format_size, print_failures, print_json};
use crate::cleanup::{CleanupReport, prune_legacy_files, prune_unreferenced_textures};
use crate::cli::Context;
use crate::cli::progress::{BROOM, phase_bar, print_done, print_step, update_bar};
use crate::dedup::DedupOptions;
use crate::progress::OptimizeProgress;
use crate::stats;

/// Remove legacy meshes in place, or copy everything else to `output`
pub fn prune_legacy(ctx: &Context, input: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let start = Instant::now();
    if !ctx.json {
        print_step(1, 1, BROOM, "Pruning legacy files...");
    }

    let pb = phase_bar(ctx.json);
    let report = prune_legacy_files(
        input,
        output.unwrap_or(input),
        output.is_none(),
        &|progress: &OptimizeProgress| update_bar(&pb, progress),
    )?;
    pb.finish_and_clear();

    print_report(ctx, "Legacy file pruning", &report, start)
}

/// Remove unreferenced textures in place, or copy the referenced ones to `output`
pub fn prune_unreferenced(ctx: &Context, input: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let start = Instant::now();
    if !ctx.json {
        print_step(1, 1, BROOM, "Pruning unreferenced textures...");
    }

    let options = DedupOptions::from(&ctx.config);
    let pb = phase_bar(ctx.json);
    let report = prune_unreferenced_textures(
        input,
        output.unwrap_or(input),
        output.is_none(),
        &options,
        &|progress: &OptimizeProgress| update_bar(&pb, progress),
    )?;
    pb.finish_and_clear();

    print_report(ctx, "Unreferenced texture pruning", &report, start)
}

fn print_report(
    ctx: &Context,
    title: &str,
    report: &CleanupReport,
    start: Instant,
) -> anyhow::Result<()> {
    if ctx.json {
        return print_json(&json!({
            "report": report,
            "stats": stats::snapshot(),
        }));
    }

    println!();
    println!("{title} complete:");
    println!("  Scanned: {}", report.scanned);
    println!(
        "  Removed: {} ({})",
        report.removed_files,
        format_size(report.bytes_removed)
    );
    println!("  Copied: {}", report.copied_files);
    print_failures(&report.failed);
    print_done(start.elapsed(), &stats::snapshot());

    Ok(())
}
