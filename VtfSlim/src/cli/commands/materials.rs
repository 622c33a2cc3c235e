//! CLI commands for material files

use std::collections::BTreeMap;
use std::path::Path;

use super::print_json;
use crate::cli::Context;
use crate::materials::scan_materials;
use crate::utils::{ensure_input_dir, normalize_path};

/// List the textures each material references
pub fn scan(ctx: &Context, input: &Path, non_empty: bool) -> anyhow::Result<()> {
    ensure_input_dir(input)?;
    let deps = scan_materials(input, &ctx.config.material_extension)?;

    let listed: BTreeMap<String, Vec<String>> = deps
        .into_iter()
        .filter(|(_, refs)| !non_empty || !refs.is_empty())
        .map(|(path, refs)| (normalize_path(path.strip_prefix(input).unwrap_or(&path)), refs))
        .collect();

    if ctx.json {
        return print_json(&listed);
    }

    for (material, refs) in &listed {
        println!("{material}");
        for reference in refs {
            println!("  {reference}");
        }
    }
    println!();
    println!(
        "{} materials, {} references",
        listed.len(),
        listed.values().map(Vec::len).sum::<usize>()
    );

    Ok(())
}
