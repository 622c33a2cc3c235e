//! Subcommand enum definitions for CLI

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Re-encode textures in the narrowest format their alpha allows
    FitAlpha {
        /// Directory containing VTF textures
        input: PathBuf,

        /// Output directory (works in place if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Allow DXT1 one-bit alpha even when it changes color under transparent texels
        #[arg(long)]
        lossy: bool,

        /// Suppress progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Halve normal maps (marks them with flag bit 19)
    HalveNormals {
        /// Directory containing VTF textures
        input: PathBuf,

        /// Output directory (works in place if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Classify by pixels only, ignoring filename hints like `_normal`
        #[arg(long)]
        no_name_hints: bool,

        /// Suppress progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Shrink solid-color textures to 4x4 (marks them with flag bit 20)
    ShrinkSolid {
        /// Directory containing VTF textures
        input: PathBuf,

        /// Output directory (works in place if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Suppress progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Move duplicate textures into shared storage and rewrite VMT references
    Dedup {
        /// Mod directory containing one or more `materials` folders
        input: PathBuf,

        /// Copy only the duplicates here instead of changing the input
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Suppress progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// List groups of byte-identical textures
    Duplicates {
        /// Directory to hash
        input: PathBuf,
    },

    /// List the textures each material references
    Scan {
        /// Directory containing VMT materials
        input: PathBuf,

        /// Only show materials with at least one reference
        #[arg(long)]
        non_empty: bool,
    },

    /// Remove legacy model meshes (.360.vtx, .dx80.vtx, .sw.vtx, .xbox.vtx)
    PruneLegacy {
        /// Mod directory
        input: PathBuf,

        /// Copy everything else here instead of deleting from the input
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Remove textures no material references
    PruneUnreferenced {
        /// Mod directory
        input: PathBuf,

        /// Copy referenced textures and all materials here instead of deleting
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show info about a VTF texture
    Info {
        /// VTF file to analyze
        path: PathBuf,
    },

    /// Write one frame of a VTF texture as PNG
    Preview {
        /// VTF file
        path: PathBuf,

        /// Output PNG (defaults to the input with a .png extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Frame index
        #[arg(short, long, default_value = "0")]
        frame: usize,
    },
}
