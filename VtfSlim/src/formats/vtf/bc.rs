//! DXT block compression
//!
//! Decoding goes through `bcdec_rs`; encoding is a small endpoint-fit encoder
//! that favours exact reproduction of flat blocks over overall quality.
//!
//! SPDX-FileCopyrightText: 2025 `VtfSlim` contributors
//!
//! SPDX-License-Identifier: MIT

use crate::error::{Error, Result};

/// Supported DXT variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BcFormat {
    /// DXT1, opaque 4-colour blocks
    Bc1,
    /// DXT1 with 3-colour blocks where any texel is transparent
    Bc1OneBitAlpha,
    /// DXT3 - explicit 4-bit alpha
    Bc2,
    /// DXT5 - interpolated alpha
    Bc3,
}

impl BcFormat {
    /// Block size in bytes for this format
    const fn block_size(self) -> usize {
        match self {
            Self::Bc1 | Self::Bc1OneBitAlpha => 8,
            Self::Bc2 | Self::Bc3 => 16,
        }
    }
}

/// Alpha below this is encoded as the transparent DXT1 index.
const ONE_BIT_ALPHA_THRESHOLD: u8 = 128;

// ============================================================================
// Decoding
// ============================================================================

/// Decode DXT-compressed data to straight RGBA8
pub fn decode(data: &[u8], width: usize, height: usize, format: BcFormat) -> Result<Vec<u8>> {
    let blocks_x = width.div_ceil(4);
    let blocks_y = height.div_ceil(4);
    let block_size = format.block_size();
    let needed = blocks_x * blocks_y * block_size;
    if data.len() < needed {
        return Err(Error::VtfTruncated {
            needed,
            available: data.len(),
        });
    }

    let mut rgba = vec![0u8; width * height * 4];
    // 4x4 block, 16 bytes per row
    let mut block_rgba = [0u8; 64];
    let block_pitch = 16;

    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            let block_idx = (by * blocks_x + bx) * block_size;
            let block = &data[block_idx..block_idx + block_size];

            match format {
                BcFormat::Bc1 | BcFormat::Bc1OneBitAlpha => {
                    bcdec_rs::bc1(block, &mut block_rgba, block_pitch);
                }
                BcFormat::Bc2 => bcdec_rs::bc2(block, &mut block_rgba, block_pitch),
                BcFormat::Bc3 => bcdec_rs::bc3(block, &mut block_rgba, block_pitch),
            }

            for py in 0..4 {
                for px in 0..4 {
                    let fx = bx * 4 + px;
                    let fy = by * 4 + py;
                    if fx >= width || fy >= height {
                        continue;
                    }
                    let src_idx = (py * 4 + px) * 4;
                    let dst_idx = (fy * width + fx) * 4;
                    rgba[dst_idx..dst_idx + 4].copy_from_slice(&block_rgba[src_idx..src_idx + 4]);
                }
            }
        }
    }

    Ok(rgba)
}

// ============================================================================
// Encoding
// ============================================================================

/// Encode straight RGBA8 pixels to DXT data
pub fn encode(pixels: &[u8], width: usize, height: usize, format: BcFormat) -> Vec<u8> {
    let blocks_x = width.div_ceil(4);
    let blocks_y = height.div_ceil(4);
    let block_size = format.block_size();
    let mut output = vec![0u8; blocks_x * blocks_y * block_size];

    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            let block = extract_block(pixels, width, height, bx * 4, by * 4);
            let offset = (by * blocks_x + bx) * block_size;
            let dst = &mut output[offset..offset + block_size];
            match format {
                BcFormat::Bc1 => dst.copy_from_slice(&encode_color_block(&block)),
                BcFormat::Bc1OneBitAlpha => dst.copy_from_slice(&encode_one_bit_alpha_block(&block)),
                BcFormat::Bc2 => {
                    dst[..8].copy_from_slice(&encode_explicit_alpha(&block));
                    dst[8..].copy_from_slice(&encode_color_block(&block));
                }
                BcFormat::Bc3 => {
                    dst[..8].copy_from_slice(&encode_interpolated_alpha(&block));
                    dst[8..].copy_from_slice(&encode_color_block(&block));
                }
            }
        }
    }

    output
}

/// Opaque 4-colour block (c0 > c1). Equal endpoints collapse to index 0.
fn encode_color_block(block: &[[u8; 4]; 16]) -> [u8; 8] {
    let (hi, lo) = find_endpoint_colors(block.iter());
    let (c0, c1) = if hi >= lo { (hi, lo) } else { (lo, hi) };

    let mut indices: u32 = 0;
    if c0 != c1 {
        let palette = four_color_palette(c0, c1);
        for (i, pixel) in block.iter().enumerate() {
            let best = find_closest_color(pixel, &palette);
            indices |= u32::from(best) << (i * 2);
        }
    }

    pack_color_block(c0, c1, indices)
}

/// DXT1 block with the transparent index used for texels under the alpha threshold.
fn encode_one_bit_alpha_block(block: &[[u8; 4]; 16]) -> [u8; 8] {
    let transparent = |p: &[u8; 4]| p[3] < ONE_BIT_ALPHA_THRESHOLD;
    if !block.iter().any(transparent) {
        return encode_color_block(block);
    }

    let opaque: Vec<&[u8; 4]> = block.iter().filter(|p| !transparent(p)).collect();
    let (hi, lo) = if opaque.is_empty() {
        (0, 0)
    } else {
        find_endpoint_colors(opaque.into_iter())
    };
    // 3-colour mode is selected by c0 <= c1
    let (c0, c1) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    let palette = three_color_palette(c0, c1);

    let mut indices: u32 = 0;
    for (i, pixel) in block.iter().enumerate() {
        let idx = if transparent(pixel) {
            3
        } else {
            find_closest_color(pixel, &palette)
        };
        indices |= u32::from(idx) << (i * 2);
    }

    pack_color_block(c0, c1, indices)
}

fn pack_color_block(c0: u16, c1: u16, indices: u32) -> [u8; 8] {
    let mut output = [0u8; 8];
    output[0..2].copy_from_slice(&c0.to_le_bytes());
    output[2..4].copy_from_slice(&c1.to_le_bytes());
    output[4..8].copy_from_slice(&indices.to_le_bytes());
    output
}

/// Explicit 4-bit alpha (DXT3)
fn encode_explicit_alpha(block: &[[u8; 4]; 16]) -> [u8; 8] {
    let mut output = [0u8; 8];
    for (i, pixel) in block.iter().enumerate() {
        // round to the nearest of the 16 levels (level * 17)
        let alpha_4bit = ((u16::from(pixel[3]) + 8) / 17) as u8;
        output[i / 2] |= alpha_4bit << ((i % 2) * 4);
    }
    output
}

/// Interpolated alpha (DXT5)
fn encode_interpolated_alpha(block: &[[u8; 4]; 16]) -> [u8; 8] {
    let min_alpha = block.iter().map(|p| p[3]).min().unwrap_or(255);
    let max_alpha = block.iter().map(|p| p[3]).max().unwrap_or(255);

    // 8-value interpolation when a0 > a1, otherwise a0 == a1 and index 0 is exact
    let a0 = max_alpha;
    let a1 = min_alpha;
    let (w0, w1) = (u16::from(a0), u16::from(a1));
    let alphas = if a0 > a1 {
        [
            a0,
            a1,
            ((6 * w0 + w1) / 7) as u8,
            ((5 * w0 + 2 * w1) / 7) as u8,
            ((4 * w0 + 3 * w1) / 7) as u8,
            ((3 * w0 + 4 * w1) / 7) as u8,
            ((2 * w0 + 5 * w1) / 7) as u8,
            ((w0 + 6 * w1) / 7) as u8,
        ]
    } else {
        [
            a0,
            a1,
            ((4 * w0 + w1) / 5) as u8,
            ((3 * w0 + 2 * w1) / 5) as u8,
            ((2 * w0 + 3 * w1) / 5) as u8,
            ((w0 + 4 * w1) / 5) as u8,
            0,
            255,
        ]
    };

    let mut indices: u64 = 0;
    for (i, pixel) in block.iter().enumerate() {
        let alpha = i32::from(pixel[3]);
        let mut best_idx = 0u64;
        let mut best_dist = i32::MAX;
        for (j, &palette_alpha) in alphas.iter().enumerate() {
            let dist = (alpha - i32::from(palette_alpha)).abs();
            if dist < best_dist {
                best_dist = dist;
                best_idx = j as u64;
            }
        }
        indices |= best_idx << (i * 3);
    }

    let mut output = [0u8; 8];
    output[0] = a0;
    output[1] = a1;
    output[2..8].copy_from_slice(&indices.to_le_bytes()[..6]);
    output
}

// ============================================================================
// Shared Helpers
// ============================================================================

/// Extract a 4x4 block of RGBA pixels, padding with edge pixels if needed
fn extract_block(pixels: &[u8], width: usize, height: usize, x: usize, y: usize) -> [[u8; 4]; 16] {
    let mut block = [[0u8; 4]; 16];

    for py in 0..4 {
        for px in 0..4 {
            let sx = (x + px).min(width - 1);
            let sy = (y + py).min(height - 1);
            let src_idx = (sy * width + sx) * 4;
            block[py * 4 + px].copy_from_slice(&pixels[src_idx..src_idx + 4]);
        }
    }

    block
}

/// Brightest and darkest texel (by channel sum) as RGB565 endpoints
fn find_endpoint_colors<'a>(pixels: impl Iterator<Item = &'a [u8; 4]>) -> (u16, u16) {
    let mut min_lum = u32::MAX;
    let mut max_lum = 0;
    let mut min_pixel = [0u8; 3];
    let mut max_pixel = [0u8; 3];

    for pixel in pixels {
        let lum = u32::from(pixel[0]) + u32::from(pixel[1]) + u32::from(pixel[2]);
        if lum < min_lum {
            min_lum = lum;
            min_pixel = [pixel[0], pixel[1], pixel[2]];
        }
        if lum >= max_lum {
            max_lum = lum;
            max_pixel = [pixel[0], pixel[1], pixel[2]];
        }
    }

    (
        rgb_to_565(max_pixel[0], max_pixel[1], max_pixel[2]),
        rgb_to_565(min_pixel[0], min_pixel[1], min_pixel[2]),
    )
}

/// Convert RGB888 to RGB565
pub fn rgb_to_565(r: u8, g: u8, b: u8) -> u16 {
    let r5 = u16::from(r >> 3);
    let g6 = u16::from(g >> 2);
    let b5 = u16::from(b >> 3);
    (r5 << 11) | (g6 << 5) | b5
}

/// Expand RGB565 to RGB888 by bit replication
pub fn expand_565(c: u16) -> [u8; 3] {
    let r = ((c >> 11) & 0x1F) as u8;
    let g = ((c >> 5) & 0x3F) as u8;
    let b = (c & 0x1F) as u8;
    [(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2)]
}

fn four_color_palette(c0: u16, c1: u16) -> [[u8; 3]; 4] {
    let a = expand_565(c0);
    let b = expand_565(c1);
    let mix = |wa: u16, wb: u16| -> [u8; 3] {
        std::array::from_fn(|i| ((wa * u16::from(a[i]) + wb * u16::from(b[i])) / (wa + wb)) as u8)
    };
    [a, b, mix(2, 1), mix(1, 2)]
}

fn three_color_palette(c0: u16, c1: u16) -> [[u8; 3]; 4] {
    let a = expand_565(c0);
    let b = expand_565(c1);
    let mid: [u8; 3] = std::array::from_fn(|i| ((u16::from(a[i]) + u16::from(b[i])) / 2) as u8);
    // index 3 is transparent and never picked for opaque texels
    [a, b, mid, mid]
}

/// Find the closest color in the palette
fn find_closest_color(pixel: &[u8; 4], palette: &[[u8; 3]; 4]) -> u8 {
    let mut best_idx = 0u8;
    let mut best_dist = u32::MAX;

    for (i, color) in palette.iter().enumerate() {
        let dr = i32::from(pixel[0]) - i32::from(color[0]);
        let dg = i32::from(pixel[1]) - i32::from(color[1]);
        let db = i32::from(pixel[2]) - i32::from(color[2]);
        let dist = (dr * dr + dg * dg + db * db) as u32;

        if dist < best_dist {
            best_dist = dist;
            best_idx = i as u8;
        }
    }

    best_idx
}
