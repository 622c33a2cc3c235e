//! Resize policy: halve normal maps, shrink solid colors
//!
//! Each operation marks its result with a flag bit and skips textures that
//! already carry it, so reruns copy the texture unchanged.

use std::path::Path;

use crate::config::NormalMapHints;
use crate::error::Result;
use crate::formats::{ImageFormat, ResizeFilter, TextureFlags, VtfTexture};

use super::classify::{is_normal_map, is_solid_color};
use super::output::{FileOutcome, KeepReason, Plan, execute_plan};

/// Smallest side produced by halving
pub const MIN_HALVED_SIDE: u32 = 4;
/// Side length of a shrunk solid-color texture
pub const SOLID_SIDE: u32 = 4;

/// Half of each side, not below [`MIN_HALVED_SIDE`].
#[must_use]
pub fn halved_dimensions(width: u32, height: u32) -> (u32, u32) {
    let halve = |side: u32| (side / 2).max(MIN_HALVED_SIDE);
    (halve(width), halve(height))
}

/// Resize to `width` x `height`, keeping the texture's format.
///
/// Filters that need float precision run on a temporary RGBA32323232F copy.
/// Returns `false` without touching the texture when the size is unchanged
/// or either side would be 1 or less.
pub fn resize_preserving_format(
    texture: &mut VtfTexture,
    width: u32,
    height: u32,
    filter: ResizeFilter,
) -> Result<bool> {
    if (width, height) == (texture.width(), texture.height()) || width <= 1 || height <= 1 {
        return Ok(false);
    }

    let original = texture.format();
    if filter.requires_float() && !original.is_float() {
        texture.set_format(ImageFormat::Rgba32323232F)?;
        texture.resize(width, height, filter)?;
        texture.set_format(original)?;
    } else {
        texture.resize(width, height, filter)?;
    }
    Ok(true)
}

fn plan_resize(
    mut texture: VtfTexture,
    (width, height): (u32, u32),
    flag: TextureFlags,
) -> Result<Plan> {
    let from = (texture.width(), texture.height());
    if !resize_preserving_format(&mut texture, width, height, ResizeFilter::Nice)? {
        return Ok(Plan::Keep(KeepReason::AtMinimumSize));
    }
    let mut flags = texture.flags();
    flags.insert(flag);
    texture.set_flags(flags);
    Ok(Plan::Bake(
        Box::new(texture),
        FileOutcome::Resized {
            from,
            to: (width, height),
        },
    ))
}

/// Plan for halving a normal map.
pub fn plan_halve_normal(bytes: &[u8], stem: &str, hints: &NormalMapHints) -> Result<Plan> {
    let texture = VtfTexture::read(bytes)?;
    if texture.flags().contains(TextureFlags::HALVED_NORMAL) {
        return Ok(Plan::Keep(KeepReason::AlreadyProcessed));
    }
    if !is_normal_map(stem, &texture, hints)? {
        return Ok(Plan::Keep(KeepReason::NotNormalMap));
    }
    let target = halved_dimensions(texture.width(), texture.height());
    plan_resize(texture, target, TextureFlags::HALVED_NORMAL)
}

/// Plan for shrinking a solid-color texture.
pub fn plan_shrink_solid(bytes: &[u8]) -> Result<Plan> {
    let texture = VtfTexture::read(bytes)?;
    if texture.flags().contains(TextureFlags::SHRUNK_SOLID) {
        return Ok(Plan::Keep(KeepReason::AlreadyProcessed));
    }
    if !is_solid_color(&texture)? {
        return Ok(Plan::Keep(KeepReason::NotSolidColor));
    }
    plan_resize(texture, (SOLID_SIDE, SOLID_SIDE), TextureFlags::SHRUNK_SOLID)
}

/// Halve the texture at `src` if it is a normal map, writing to `dst`.
pub fn halve_normal(src: &Path, dst: &Path, hints: &NormalMapHints) -> Result<FileOutcome> {
    let stem = src
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    execute_plan(src, dst, |bytes| plan_halve_normal(bytes, &stem, hints))
}

/// Shrink the texture at `src` to 4x4 if it is one solid color, writing to `dst`.
pub fn shrink_solid(src: &Path, dst: &Path) -> Result<FileOutcome> {
    execute_plan(src, dst, plan_shrink_solid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_halved_dimensions() {
        assert_eq!(halved_dimensions(512, 256), (256, 128));
        assert_eq!(halved_dimensions(8, 6), (4, 4));
        assert_eq!(halved_dimensions(4, 4), (4, 4));
        assert_eq!(halved_dimensions(2, 64), (4, 32));
    }

    #[test]
    fn test_thin_solid_strip_shrinks_to_4x4() {
        let tex = VtfTexture::from_rgba_frames(
            2,
            128,
            ImageFormat::Bgr888,
            &[[255, 0, 0, 255].repeat(256)],
        )
        .unwrap();
        let Plan::Bake(shrunk, outcome) = plan_shrink_solid(&tex.to_bytes().unwrap()).unwrap()
        else {
            panic!("expected a bake");
        };
        assert_eq!(outcome, FileOutcome::Resized { from: (2, 128), to: (4, 4) });
        assert_eq!((shrunk.width(), shrunk.height()), (4, 4));
        assert!(shrunk.flags().contains(TextureFlags::SHRUNK_SOLID));
        assert_eq!(shrunk.frame_rgba(0).unwrap(), [255, 0, 0, 255].repeat(16));
    }

    #[test]
    fn test_narrow_normal_map_halves_to_minimum_width() {
        let tex = VtfTexture::from_rgba_frames(
            2,
            64,
            ImageFormat::Rgba8888,
            &[[128, 128, 255, 255].repeat(128)],
        )
        .unwrap();
        let Plan::Bake(halved, outcome) =
            plan_halve_normal(&tex.to_bytes().unwrap(), "wall_normal", &NormalMapHints::default())
                .unwrap()
        else {
            panic!("expected a bake");
        };
        assert_eq!(outcome, FileOutcome::Resized { from: (2, 64), to: (4, 32) });
        assert!(halved.flags().contains(TextureFlags::HALVED_NORMAL));
    }

    #[test]
    fn test_resize_guard() {
        let mut tex = VtfTexture::from_rgba_frames(
            8,
            8,
            ImageFormat::Bgr888,
            &[[1, 2, 3, 255].repeat(64)],
        )
        .unwrap();
        assert!(!resize_preserving_format(&mut tex, 8, 8, ResizeFilter::Nice).unwrap());
        assert!(!resize_preserving_format(&mut tex, 1, 4, ResizeFilter::Nice).unwrap());
        assert_eq!(tex.width(), 8);

        assert!(resize_preserving_format(&mut tex, 4, 4, ResizeFilter::Nice).unwrap());
        assert_eq!((tex.width(), tex.height()), (4, 4));
        assert_eq!(tex.format(), ImageFormat::Bgr888);
        assert_eq!(tex.frame_rgba(0).unwrap(), [1, 2, 3, 255].repeat(16));
    }

    #[test]
    fn test_shrink_plan_sets_flag_once() {
        let tex = VtfTexture::from_rgba_frames(
            16,
            16,
            ImageFormat::Dxt1,
            &[[255, 0, 0, 255].repeat(256)],
        )
        .unwrap();
        let Plan::Bake(shrunk, outcome) = plan_shrink_solid(&tex.to_bytes().unwrap()).unwrap()
        else {
            panic!("expected a bake");
        };
        assert_eq!(outcome, FileOutcome::Resized { from: (16, 16), to: (4, 4) });
        assert!(shrunk.flags().contains(TextureFlags::SHRUNK_SOLID));

        let rerun = plan_shrink_solid(&shrunk.to_bytes().unwrap()).unwrap();
        assert!(matches!(rerun, Plan::Keep(KeepReason::AlreadyProcessed)));
    }

    #[test]
    fn test_halve_skips_non_normals() {
        let tex = VtfTexture::from_rgba_frames(
            16,
            16,
            ImageFormat::Rgba8888,
            &[[128, 128, 128, 255].repeat(256)],
        )
        .unwrap();
        let plan = plan_halve_normal(&tex.to_bytes().unwrap(), "rock", &NormalMapHints::disabled()).unwrap();
        assert!(matches!(plan, Plan::Keep(KeepReason::NotNormalMap)));
    }
}
