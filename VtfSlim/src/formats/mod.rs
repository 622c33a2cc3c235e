//! File format handlers for Source engine assets

pub mod vtf;

// Re-export main texture types
pub use vtf::{ImageFormat, ResizeFilter, TextureFlags, VtfTexture};
