//! CLI commands for texture operations

use std::path::Path;
use std::time::Instant;

use serde_json::json;

use super::{print_failures, print_json};
use crate::batch::{TextureOperation, process_tree};
use crate::cli::Context;
use crate::cli::progress::{GEAR, LOOKING_GLASS, PICTURE, phase_bar, print_done, print_step, update_bar};
use crate::formats::{TextureFlags, VtfTexture};
use crate::progress::OptimizeProgress;
use crate::stats;

/// Run a per-texture operation over a directory tree
pub fn run(
    ctx: &Context,
    input: &Path,
    output: Option<&Path>,
    operation: &TextureOperation,
    quiet: bool,
) -> anyhow::Result<()> {
    let output = output.unwrap_or(input);
    let start = Instant::now();

    if !ctx.json {
        print_step(1, 2, LOOKING_GLASS, &format!("Scanning {}...", input.display()));
        print_step(2, 2, GEAR, &format!("Running {}...", operation.name()));
    }

    let pb = phase_bar(quiet || ctx.json);
    let result = process_tree(
        input,
        output,
        operation,
        &ctx.config.texture_extension,
        &|progress: &OptimizeProgress| update_bar(&pb, progress),
    )?;
    pb.finish_and_clear();

    if ctx.json {
        return print_json(&json!({
            "operation": operation.name(),
            "batch": result,
            "stats": stats::snapshot(),
        }));
    }

    println!();
    println!("{} complete:", operation.name());
    println!("  Success: {}", result.success_count);
    println!("  Failed: {}", result.fail_count);
    print_failures(result.results.iter().filter(|m| m.starts_with("Failed")));
    print_done(start.elapsed(), &stats::snapshot());

    Ok(())
}

/// Show info about a VTF texture
pub fn info(ctx: &Context, path: &Path) -> anyhow::Result<()> {
    let texture = VtfTexture::open(path)?;
    let (major, minor) = texture.version();
    let flags = texture.flags();
    let low_res = texture.low_res();

    if ctx.json {
        return print_json(&json!({
            "path": path.display().to_string(),
            "version": format!("{major}.{minor}"),
            "width": texture.width(),
            "height": texture.height(),
            "format": texture.format().name(),
            "frames": texture.frame_count(),
            "mipmaps": texture.mipmap_count(),
            "flags": flags.bits(),
            "halved_normal": flags.contains(TextureFlags::HALVED_NORMAL),
            "shrunk_solid": flags.contains(TextureFlags::SHRUNK_SOLID),
            "low_res": low_res.map(|(format, w, h)| json!({
                "format": format.name(),
                "width": w,
                "height": h,
            })),
            "extra_resources": texture.extra_resources().len(),
        }));
    }

    println!("VTF Information: {}", path.display());
    println!();
    println!("Version: {major}.{minor}");
    println!("Dimensions: {}x{}", texture.width(), texture.height());
    println!("Format: {}", texture.format());
    println!("Frames: {}", texture.frame_count());
    println!("Mip levels: {}", texture.mipmap_count());
    println!("Flags: {flags}");
    if flags.contains(TextureFlags::HALVED_NORMAL) {
        println!("  normal map already halved");
    }
    if flags.contains(TextureFlags::SHRUNK_SOLID) {
        println!("  solid color already shrunk");
    }
    match low_res {
        Some((format, w, h)) => println!("Low-res thumbnail: {w}x{h} {format}"),
        None => println!("Low-res thumbnail: none"),
    }
    for resource in texture.extra_resources() {
        println!("Resource: {}", String::from_utf8_lossy(&resource.tag));
    }

    Ok(())
}

/// Write one frame of a VTF texture as PNG
pub fn preview(path: &Path, output: Option<&Path>, frame: usize) -> anyhow::Result<()> {
    let texture = VtfTexture::open(path)?;
    let png = texture.frame_to_png_bytes(frame)?;

    let output = output.map_or_else(|| path.with_extension("png"), Path::to_path_buf);
    std::fs::write(&output, png)?;
    println!("{PICTURE}Wrote {}", output.display());

    Ok(())
}
