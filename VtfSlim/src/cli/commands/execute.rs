//! Command execution implementations

use super::Commands;
use super::{cleanup, dedup, materials, texture};
use crate::batch::TextureOperation;
use crate::cli::Context;
use crate::config::NormalMapHints;

impl Commands {
    /// Execute the selected command.
    ///
    /// # Errors
    /// Returns an error if the underlying operation fails.
    pub fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        match self {
            Commands::FitAlpha {
                input,
                output,
                lossy,
                quiet,
            } => texture::run(
                ctx,
                input,
                output.as_deref(),
                &TextureOperation::FitAlpha {
                    lossless: ctx.config.lossless && !*lossy,
                },
                *quiet,
            ),
            Commands::HalveNormals {
                input,
                output,
                no_name_hints,
                quiet,
            } => {
                let hints = if *no_name_hints {
                    NormalMapHints::disabled()
                } else {
                    ctx.config.normal_map_hints.clone()
                };
                texture::run(
                    ctx,
                    input,
                    output.as_deref(),
                    &TextureOperation::HalveNormals { hints },
                    *quiet,
                )
            }
            Commands::ShrinkSolid {
                input,
                output,
                quiet,
            } => texture::run(
                ctx,
                input,
                output.as_deref(),
                &TextureOperation::ShrinkSolid,
                *quiet,
            ),
            Commands::Dedup {
                input,
                output,
                quiet,
            } => dedup::dedup(ctx, input, output.as_deref(), *quiet),
            Commands::Duplicates { input } => dedup::duplicates(ctx, input),
            Commands::Scan { input, non_empty } => materials::scan(ctx, input, *non_empty),
            Commands::PruneLegacy { input, output } => {
                cleanup::prune_legacy(ctx, input, output.as_deref())
            }
            Commands::PruneUnreferenced { input, output } => {
                cleanup::prune_unreferenced(ctx, input, output.as_deref())
            }
            Commands::Info { path } => texture::info(ctx, path),
            Commands::Preview {
                path,
                output,
                frame,
            } => texture::preview(path, output.as_deref(), *frame),
        }
    }
}
