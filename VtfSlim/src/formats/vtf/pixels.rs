//! Pixel conversion between VTF formats and straight RGBA
//!
//! SPDX-FileCopyrightText: 2025 `VtfSlim` contributors
//!
//! SPDX-License-Identifier: MIT

use byteorder::{ByteOrder, LittleEndian};
use half::f16;

use super::bc::{self, BcFormat};
use super::format::{Channel, ImageFormat, PackedLayout};
use crate::error::{Error, Result};

/// Decode one image to straight RGBA8.
pub fn decode_rgba8(data: &[u8], width: u32, height: u32, format: ImageFormat) -> Result<Vec<u8>> {
    let data = image_slice(data, width, height, format)?;
    let (w, h) = (width.max(1) as usize, height.max(1) as usize);

    if let Some(layout) = format.packed_layout() {
        return Ok(decode_packed(data, layout));
    }
    if let Some(bc_format) = bc_format(format) {
        return bc::decode(data, w, h, bc_format);
    }
    match format {
        ImageFormat::Rgb565 | ImageFormat::Bgr565 => Ok(decode_565(data, format)),
        ImageFormat::Rgba16161616F | ImageFormat::Rgba32323232F => {
            Ok(decode_rgba32f(data, width, height, format)?
                .into_iter()
                .map(f32_to_u8)
                .collect())
        }
        _ => Err(unsupported(format)),
    }
}

/// Encode straight RGBA8 pixels to `format`.
pub fn encode_rgba8(rgba: &[u8], width: u32, height: u32, format: ImageFormat) -> Result<Vec<u8>> {
    let (w, h) = (width.max(1) as usize, height.max(1) as usize);
    if rgba.len() != w * h * 4 {
        return Err(Error::EncodeFailed {
            format: format.name().to_string(),
            message: format!("expected {} bytes of RGBA, got {}", w * h * 4, rgba.len()),
        });
    }

    if let Some(layout) = format.packed_layout() {
        return Ok(encode_packed(rgba, layout));
    }
    if let Some(bc_format) = bc_format(format) {
        return Ok(bc::encode(rgba, w, h, bc_format));
    }
    match format {
        ImageFormat::Rgb565 | ImageFormat::Bgr565 => Ok(encode_565(rgba, format)),
        ImageFormat::Rgba16161616F | ImageFormat::Rgba32323232F => {
            let texels: Vec<f32> = rgba.iter().map(|&v| u8_to_f32(v)).collect();
            encode_rgba32f(&texels, width, height, format)
        }
        _ => Err(unsupported(format)),
    }
}

/// Decode one image to straight RGBA in `f32` (0.0-1.0 for integer formats).
pub fn decode_rgba32f(data: &[u8], width: u32, height: u32, format: ImageFormat) -> Result<Vec<f32>> {
    match format {
        ImageFormat::Rgba32323232F => {
            let data = image_slice(data, width, height, format)?;
            let mut texels = vec![0f32; data.len() / 4];
            LittleEndian::read_f32_into(data, &mut texels);
            Ok(texels)
        }
        ImageFormat::Rgba16161616F => {
            let data = image_slice(data, width, height, format)?;
            Ok(data
                .chunks_exact(2)
                .map(|half| f16::from_bits(LittleEndian::read_u16(half)).to_f32())
                .collect())
        }
        _ => Ok(decode_rgba8(data, width, height, format)?
            .into_iter()
            .map(u8_to_f32)
            .collect()),
    }
}

/// Encode straight RGBA `f32` texels to `format`.
pub fn encode_rgba32f(texels: &[f32], width: u32, height: u32, format: ImageFormat) -> Result<Vec<u8>> {
    match format {
        ImageFormat::Rgba32323232F => {
            let mut out = vec![0u8; texels.len() * 4];
            LittleEndian::write_f32_into(texels, &mut out);
            Ok(out)
        }
        ImageFormat::Rgba16161616F => {
            let mut out = vec![0u8; texels.len() * 2];
            for (chunk, &value) in out.chunks_exact_mut(2).zip(texels) {
                LittleEndian::write_u16(chunk, f16::from_f32(value).to_bits());
            }
            Ok(out)
        }
        _ => {
            let rgba: Vec<u8> = texels.iter().copied().map(f32_to_u8).collect();
            encode_rgba8(&rgba, width, height, format)
        }
    }
}

/// Quantize a unit float to a byte, clamping out-of-range filter overshoot.
#[must_use]
pub fn f32_to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn u8_to_f32(value: u8) -> f32 {
    f32::from(value) / 255.0
}

fn bc_format(format: ImageFormat) -> Option<BcFormat> {
    match format {
        ImageFormat::Dxt1 => Some(BcFormat::Bc1),
        ImageFormat::Dxt1OneBitAlpha => Some(BcFormat::Bc1OneBitAlpha),
        ImageFormat::Dxt3 => Some(BcFormat::Bc2),
        ImageFormat::Dxt5 => Some(BcFormat::Bc3),
        _ => None,
    }
}

fn unsupported(format: ImageFormat) -> Error {
    Error::UnsupportedFormat {
        format: format.name().to_string(),
    }
}

/// Slice exactly one image out of `data`, failing if it is short.
fn image_slice(data: &[u8], width: u32, height: u32, format: ImageFormat) -> Result<&[u8]> {
    let needed = format.data_size(width, height);
    data.get(..needed).ok_or(Error::VtfTruncated {
        needed,
        available: data.len(),
    })
}

// ============================================================================
// Packed 8-bit layouts
// ============================================================================

fn decode_packed(data: &[u8], layout: PackedLayout) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(data.len() / layout.len() * 4);
    for pixel in data.chunks_exact(layout.len()) {
        let mut out = [0, 0, 0, 255];
        for (&channel, &value) in layout.iter().zip(pixel) {
            match channel {
                Channel::R => out[0] = value,
                Channel::G => out[1] = value,
                Channel::B => out[2] = value,
                Channel::A => out[3] = value,
                Channel::L => out[..3].fill(value),
                Channel::X => {}
            }
        }
        rgba.extend_from_slice(&out);
    }
    rgba
}

fn encode_packed(rgba: &[u8], layout: PackedLayout) -> Vec<u8> {
    let mut data = Vec::with_capacity(rgba.len() / 4 * layout.len());
    for pixel in rgba.chunks_exact(4) {
        for channel in layout {
            data.push(match channel {
                Channel::R => pixel[0],
                Channel::G => pixel[1],
                Channel::B => pixel[2],
                Channel::A => pixel[3],
                Channel::L => luminance(pixel[0], pixel[1], pixel[2]),
                Channel::X => 255,
            });
        }
    }
    data
}

fn luminance(r: u8, g: u8, b: u8) -> u8 {
    ((77 * u32::from(r) + 150 * u32::from(g) + 29 * u32::from(b) + 128) >> 8) as u8
}

// ============================================================================
// 16-bit 565 layouts
// ============================================================================

// RGB565 keeps red in the low bits, BGR565 keeps blue there.
fn decode_565(data: &[u8], format: ImageFormat) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(data.len() * 2);
    for texel in data.chunks_exact(2) {
        let [hi, mid, lo] = bc::expand_565(LittleEndian::read_u16(texel));
        let (r, b) = if format == ImageFormat::Rgb565 { (lo, hi) } else { (hi, lo) };
        rgba.extend_from_slice(&[r, mid, b, 255]);
    }
    rgba
}

fn encode_565(rgba: &[u8], format: ImageFormat) -> Vec<u8> {
    let mut data = vec![0u8; rgba.len() / 2];
    for (texel, pixel) in data.chunks_exact_mut(2).zip(rgba.chunks_exact(4)) {
        let value = if format == ImageFormat::Rgb565 {
            bc::rgb_to_565(pixel[2], pixel[1], pixel[0])
        } else {
            bc::rgb_to_565(pixel[0], pixel[1], pixel[2])
        };
        LittleEndian::write_u16(texel, value);
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PIXELS: [u8; 8] = [10, 20, 30, 255, 200, 100, 50, 128];

    #[test]
    fn test_packed_layouts_follow_byte_order() {
        assert_eq!(
            encode_rgba8(&PIXELS, 2, 1, ImageFormat::Bgra8888).unwrap(),
            vec![30, 20, 10, 255, 50, 100, 200, 128]
        );
        assert_eq!(
            encode_rgba8(&PIXELS, 2, 1, ImageFormat::Abgr8888).unwrap(),
            vec![255, 30, 20, 10, 128, 50, 100, 200]
        );
        assert_eq!(
            encode_rgba8(&PIXELS, 2, 1, ImageFormat::Bgr888).unwrap(),
            vec![30, 20, 10, 50, 100, 200]
        );
        assert_eq!(
            encode_rgba8(&PIXELS, 2, 1, ImageFormat::Bgrx8888).unwrap(),
            vec![30, 20, 10, 255, 50, 100, 200, 255]
        );
    }

    #[test]
    fn test_packed_decode_inverts_encode() {
        for format in [
            ImageFormat::Rgba8888,
            ImageFormat::Abgr8888,
            ImageFormat::Argb8888,
            ImageFormat::Bgra8888,
        ] {
            let data = encode_rgba8(&PIXELS, 2, 1, format).unwrap();
            assert_eq!(decode_rgba8(&data, 2, 1, format).unwrap(), PIXELS.to_vec());
        }
    }

    #[test]
    fn test_single_channel_formats() {
        let grey = decode_rgba8(&[7], 1, 1, ImageFormat::I8).unwrap();
        assert_eq!(grey, vec![7, 7, 7, 255]);
        let alpha = decode_rgba8(&[9], 1, 1, ImageFormat::A8).unwrap();
        assert_eq!(alpha, vec![0, 0, 0, 9]);
        assert_eq!(luminance(255, 255, 255), 255);
    }

    #[test]
    fn test_565_channel_order() {
        let red = [255, 0, 0, 255];
        let rgb = encode_rgba8(&red, 1, 1, ImageFormat::Rgb565).unwrap();
        assert_eq!(LittleEndian::read_u16(&rgb), 0x001F);
        let bgr = encode_rgba8(&red, 1, 1, ImageFormat::Bgr565).unwrap();
        assert_eq!(LittleEndian::read_u16(&bgr), 0xF800);
        assert_eq!(decode_rgba8(&rgb, 1, 1, ImageFormat::Rgb565).unwrap(), red.to_vec());
        assert_eq!(decode_rgba8(&bgr, 1, 1, ImageFormat::Bgr565).unwrap(), red.to_vec());
    }

    #[test]
    fn test_float_formats() {
        let texels = [0.0, 0.5, 1.0, 1.0];
        let full = encode_rgba32f(&texels, 1, 1, ImageFormat::Rgba32323232F).unwrap();
        assert_eq!(decode_rgba32f(&full, 1, 1, ImageFormat::Rgba32323232F).unwrap(), texels.to_vec());
        let half = encode_rgba32f(&texels, 1, 1, ImageFormat::Rgba16161616F).unwrap();
        assert_eq!(decode_rgba32f(&half, 1, 1, ImageFormat::Rgba16161616F).unwrap(), texels.to_vec());
        assert_eq!(decode_rgba8(&full, 1, 1, ImageFormat::Rgba32323232F).unwrap(), vec![0, 128, 255, 255]);
    }

    #[test]
    fn test_unsupported_and_short_data() {
        assert!(matches!(
            decode_rgba8(&[0; 4], 2, 2, ImageFormat::P8),
            Err(Error::UnsupportedFormat { .. })
        ));
        assert!(matches!(
            decode_rgba8(&[0; 3], 1, 1, ImageFormat::Rgba8888),
            Err(Error::VtfTruncated { needed: 4, available: 3 })
        ));
    }
}
