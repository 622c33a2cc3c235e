//! CLI commands for duplicate textures

use std::path::Path;
use std::time::Instant;

use serde_json::json;

use super::{format_size, print_failures, print_json};
use crate::cli::Context;
use crate::cli::progress::{LINK, LOOKING_GLASS, phase_bar, print_done, print_step, update_bar};
use crate::dedup::{DedupOptions, DuplicateIndex, remove_duplicates};
use crate::progress::OptimizeProgress;
use crate::stats;
use crate::utils::ensure_input_dir;

/// Collapse duplicates into shared storage, or copy them to `output`
pub fn dedup(ctx: &Context, input: &Path, output: Option<&Path>, quiet: bool) -> anyhow::Result<()> {
    let options = DedupOptions::from(&ctx.config);
    let output = output.unwrap_or(input);
    let start = Instant::now();

    if !ctx.json {
        print_step(1, 2, LOOKING_GLASS, &format!("Scanning {}...", input.display()));
        print_step(2, 2, LINK, "Removing duplicate textures...");
    }

    let pb = phase_bar(quiet || ctx.json);
    let report = remove_duplicates(input, output, &options, &|progress: &OptimizeProgress| {
        update_bar(&pb, progress);
    })?;
    pb.finish_and_clear();

    if ctx.json {
        return print_json(&json!({
            "report": report,
            "stats": stats::snapshot(),
        }));
    }

    println!();
    println!("Duplicate removal complete:");
    println!("  Groups: {} ({} files)", report.groups, report.duplicate_files);
    if report.copied_to_output > 0 {
        println!("  Copied to {}: {}", output.display(), report.copied_to_output);
    } else {
        println!("  Asset roots: {}", report.roots.len());
        println!("  Shared copies: {}", report.shared_copies);
        println!(
            "  Removed: {} ({})",
            report.removed_files,
            format_size(report.bytes_removed)
        );
        println!(
            "  Materials rewritten: {} ({} references)",
            report.materials_rewritten, report.references_rewritten
        );
    }
    print_failures(&report.failed);
    print_done(start.elapsed(), &stats::snapshot());

    Ok(())
}

/// List groups of byte-identical textures
pub fn duplicates(ctx: &Context, input: &Path) -> anyhow::Result<()> {
    ensure_input_dir(input)?;

    let pb = phase_bar(ctx.json);
    let index = DuplicateIndex::build(
        input,
        &ctx.config.texture_extension,
        &|progress: &OptimizeProgress| update_bar(&pb, progress),
    )?;
    pb.finish_and_clear();

    let groups = index.groups();
    if ctx.json {
        return print_json(&groups);
    }

    if groups.is_empty() {
        println!("No duplicate textures found in: {}", input.display());
        return Ok(());
    }

    for group in &groups {
        println!("{} ({} files)", group.hash, group.paths.len());
        for path in &group.paths {
            println!("  {}", path.strip_prefix(input).unwrap_or(path).display());
        }
    }
    println!();
    println!("{} groups, {} files", groups.len(), index.member_count());

    Ok(())
}
