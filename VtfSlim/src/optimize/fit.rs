//! Format fitting: re-encode a texture in the narrowest format its pixels allow
//!
//! Only the pixel format changes; dimensions, frames and flags stay put.

use std::path::Path;

use crate::error::Result;
use crate::formats::{ImageFormat, VtfTexture};

use super::output::{FileOutcome, KeepReason, Plan, execute_plan};

/// Alpha usage across every frame of a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlphaProfile {
    /// Some frame's alpha is 0 everywhere
    AllZeroFrame,
    /// Some alpha value is strictly between 0 and 255
    Translucent,
    /// Alpha is only ever 0 or 255, with at least one 0
    BinaryTransparent,
    /// Alpha is 255 everywhere
    Opaque,
}

/// What [`decide`] chose
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitDecision {
    Keep(KeepReason),
    Convert(ImageFormat),
}

/// Classify alpha over every frame's mip 0.
pub fn alpha_profile(texture: &VtfTexture) -> Result<AlphaProfile> {
    let mut translucent = false;
    let mut transparent = false;

    for frame in 0..texture.frame_count() {
        let rgba = texture.frame_rgba(frame)?;
        let mut alphas = rgba.iter().skip(3).step_by(4);
        if alphas.clone().all(|&a| a == 0) {
            return Ok(AlphaProfile::AllZeroFrame);
        }
        translucent |= alphas.clone().any(|&a| a != 0 && a != 255);
        transparent |= alphas.any(|&a| a == 0);
    }

    Ok(if translucent {
        AlphaProfile::Translucent
    } else if transparent {
        AlphaProfile::BinaryTransparent
    } else {
        AlphaProfile::Opaque
    })
}

/// Whether DXT1 one-bit alpha would change any color channel of any frame.
pub fn one_bit_alpha_crushes_color(texture: &VtfTexture) -> Result<bool> {
    let mut trial = texture.clone();
    trial.set_format(ImageFormat::Dxt1OneBitAlpha)?;

    for frame in 0..texture.frame_count() {
        let original = texture.frame_rgba(frame)?;
        let converted = trial.frame_rgba(frame)?;
        let differs = original
            .chunks_exact(4)
            .zip(converted.chunks_exact(4))
            .any(|(a, b)| a[..3] != b[..3]);
        if differs {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Pick the narrowest format for `texture`.
pub fn decide(texture: &VtfTexture, lossless: bool) -> Result<FitDecision> {
    let format = texture.format();
    let target = match format {
        ImageFormat::Dxt5 | ImageFormat::Dxt3 | ImageFormat::Dxt1OneBitAlpha => {
            match alpha_profile(texture)? {
                AlphaProfile::AllZeroFrame => return Ok(FitDecision::Keep(KeepReason::AlphaIsData)),
                AlphaProfile::Translucent => return Ok(FitDecision::Keep(KeepReason::Translucent)),
                AlphaProfile::BinaryTransparent => {
                    if format != ImageFormat::Dxt1OneBitAlpha
                        && lossless
                        && one_bit_alpha_crushes_color(texture)?
                    {
                        return Ok(FitDecision::Keep(KeepReason::LossyOneBitAlpha));
                    }
                    ImageFormat::Dxt1OneBitAlpha
                }
                AlphaProfile::Opaque => ImageFormat::Dxt1,
            }
        }
        ImageFormat::Bgrx8888 => ImageFormat::Bgr888,
        ImageFormat::Bgra8888
        | ImageFormat::Rgba8888
        | ImageFormat::Abgr8888
        | ImageFormat::Argb8888 => {
            if alpha_profile(texture)? != AlphaProfile::Opaque {
                return Ok(FitDecision::Keep(KeepReason::Translucent));
            }
            narrow_packed(format)
        }
        _ if !format.is_supported() => return Ok(FitDecision::Keep(KeepReason::UnsupportedFormat)),
        _ => format,
    };

    if target == format {
        Ok(FitDecision::Keep(KeepReason::AlreadyNarrow))
    } else {
        Ok(FitDecision::Convert(target))
    }
}

/// Drop the alpha byte, keeping the color channel order of the source.
fn narrow_packed(format: ImageFormat) -> ImageFormat {
    match format {
        ImageFormat::Bgra8888 | ImageFormat::Abgr8888 | ImageFormat::Bgrx8888 => ImageFormat::Bgr888,
        ImageFormat::Rgba8888 | ImageFormat::Argb8888 => ImageFormat::Rgb888,
        other => other,
    }
}

/// Build the plan for one texture's bytes.
pub fn plan_fit(bytes: &[u8], lossless: bool) -> Result<Plan> {
    let mut texture = VtfTexture::read(bytes)?;
    match decide(&texture, lossless)? {
        FitDecision::Keep(reason) => Ok(Plan::Keep(reason)),
        FitDecision::Convert(target) => {
            let from = texture.format();
            texture.set_format(target)?;
            Ok(Plan::Bake(
                Box::new(texture),
                FileOutcome::Converted { from, to: target },
            ))
        }
    }
}

/// Fit the texture at `src` and write the result to `dst`.
///
/// Unchanged textures are copied byte-for-byte, so running this on its own
/// output is a no-op.
pub fn fit_alpha(src: &Path, dst: &Path, lossless: bool) -> Result<FileOutcome> {
    execute_plan(src, dst, |bytes| plan_fit(bytes, lossless))
}
