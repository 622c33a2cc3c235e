//! Content classification: normal maps and solid colors
//!
//! Both checks are heuristics over decoded mip 0 of every frame.

use std::ops::RangeInclusive;

use crate::config::NormalMapHints;
use crate::error::Result;
use crate::formats::VtfTexture;

/// Average texel vector length accepted as a normal map
pub const NORMAL_MAGNITUDE_RANGE: RangeInclusive<f64> = 0.85..=1.1;

/// Whether an average magnitude falls in [`NORMAL_MAGNITUDE_RANGE`].
#[must_use]
pub fn magnitude_is_normal(average: f64) -> bool {
    NORMAL_MAGNITUDE_RANGE.contains(&average)
}

/// Mean length of every texel's RGB mapped to [-1, 1].
pub fn average_normal_magnitude(texture: &VtfTexture) -> Result<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;

    for frame in 0..texture.frame_count() {
        for px in texture.frame_rgba(frame)?.chunks_exact(4) {
            let [x, y, z] = [px[0], px[1], px[2]].map(|c| f64::from(c) / 127.5 - 1.0);
            sum += (x * x + y * y + z * z).sqrt();
            count += 1;
        }
    }

    Ok(if count == 0 { 0.0 } else { sum / count as f64 })
}

/// Whether the texture looks like a tangent-space normal map.
///
/// A filename hint on `stem` answers yes without decoding.
pub fn is_normal_map(stem: &str, texture: &VtfTexture, hints: &NormalMapHints) -> Result<bool> {
    if hints.matches(stem) {
        return Ok(true);
    }
    Ok(magnitude_is_normal(average_normal_magnitude(texture)?))
}

/// Whether every texel of every frame equals the first texel.
pub fn is_solid_color(texture: &VtfTexture) -> Result<bool> {
    let mut first: Option<[u8; 4]> = None;
    for frame in 0..texture.frame_count() {
        let rgba = texture.frame_rgba(frame)?;
        for px in rgba.chunks_exact(4) {
            let first = *first.get_or_insert([px[0], px[1], px[2], px[3]]);
            if px != first.as_slice() {
                return Ok(false);
            }
        }
    }
    Ok(true)
}
