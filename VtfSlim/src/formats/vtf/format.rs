//! VTF image formats and their storage layouts
//!
//! SPDX-FileCopyrightText: 2025 `VtfSlim` contributors
//!
//! SPDX-License-Identifier: MIT

use std::fmt;

/// One byte-sized channel slot in a packed pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    R,
    G,
    B,
    A,
    /// Padding byte, written as 0xFF and ignored on read.
    X,
    /// Luminance: replicated to RGB on read, weighted RGB on write.
    L,
}

/// Byte order of an 8-bit-per-channel packed format, first byte first.
pub type PackedLayout = &'static [Channel];

/// Pixel formats of the VTF container, numbered as stored in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Rgba8888,
    Abgr8888,
    Rgb888,
    Bgr888,
    Rgb565,
    I8,
    Ia88,
    P8,
    A8,
    Rgb888Bluescreen,
    Bgr888Bluescreen,
    Argb8888,
    Bgra8888,
    Dxt1,
    Dxt3,
    Dxt5,
    Bgrx8888,
    Bgr565,
    Bgrx5551,
    Bgra4444,
    Dxt1OneBitAlpha,
    Bgra5551,
    Uv88,
    Uvwq8888,
    Rgba16161616F,
    Rgba16161616,
    Uvlx8888,
    R32F,
    Rgb323232F,
    Rgba32323232F,
}

const ALL_FORMATS: [ImageFormat; 30] = [
    ImageFormat::Rgba8888,
    ImageFormat::Abgr8888,
    ImageFormat::Rgb888,
    ImageFormat::Bgr888,
    ImageFormat::Rgb565,
    ImageFormat::I8,
    ImageFormat::Ia88,
    ImageFormat::P8,
    ImageFormat::A8,
    ImageFormat::Rgb888Bluescreen,
    ImageFormat::Bgr888Bluescreen,
    ImageFormat::Argb8888,
    ImageFormat::Bgra8888,
    ImageFormat::Dxt1,
    ImageFormat::Dxt3,
    ImageFormat::Dxt5,
    ImageFormat::Bgrx8888,
    ImageFormat::Bgr565,
    ImageFormat::Bgrx5551,
    ImageFormat::Bgra4444,
    ImageFormat::Dxt1OneBitAlpha,
    ImageFormat::Bgra5551,
    ImageFormat::Uv88,
    ImageFormat::Uvwq8888,
    ImageFormat::Rgba16161616F,
    ImageFormat::Rgba16161616,
    ImageFormat::Uvlx8888,
    ImageFormat::R32F,
    ImageFormat::Rgb323232F,
    ImageFormat::Rgba32323232F,
];

impl ImageFormat {
    /// Look up a format by its header id. `-1` (no image) and unknown ids give `None`.
    #[must_use]
    pub fn from_id(id: i32) -> Option<Self> {
        usize::try_from(id).ok().and_then(|i| ALL_FORMATS.get(i).copied())
    }

    /// Header id of this format.
    #[must_use]
    pub fn id(self) -> i32 {
        ALL_FORMATS.iter().position(|&f| f == self).unwrap_or_default() as i32
    }

    /// Canonical upper-case name, as tools print it.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Rgba8888 => "RGBA8888",
            Self::Abgr8888 => "ABGR8888",
            Self::Rgb888 => "RGB888",
            Self::Bgr888 => "BGR888",
            Self::Rgb565 => "RGB565",
            Self::I8 => "I8",
            Self::Ia88 => "IA88",
            Self::P8 => "P8",
            Self::A8 => "A8",
            Self::Rgb888Bluescreen => "RGB888_BLUESCREEN",
            Self::Bgr888Bluescreen => "BGR888_BLUESCREEN",
            Self::Argb8888 => "ARGB8888",
            Self::Bgra8888 => "BGRA8888",
            Self::Dxt1 => "DXT1",
            Self::Dxt3 => "DXT3",
            Self::Dxt5 => "DXT5",
            Self::Bgrx8888 => "BGRX8888",
            Self::Bgr565 => "BGR565",
            Self::Bgrx5551 => "BGRX5551",
            Self::Bgra4444 => "BGRA4444",
            Self::Dxt1OneBitAlpha => "DXT1_ONEBITALPHA",
            Self::Bgra5551 => "BGRA5551",
            Self::Uv88 => "UV88",
            Self::Uvwq8888 => "UVWQ8888",
            Self::Rgba16161616F => "RGBA16161616F",
            Self::Rgba16161616 => "RGBA16161616",
            Self::Uvlx8888 => "UVLX8888",
            Self::R32F => "R32F",
            Self::Rgb323232F => "RGB323232F",
            Self::Rgba32323232F => "RGBA32323232F",
        }
    }

    /// Block-compressed (DXT) format.
    #[must_use]
    pub fn is_compressed(self) -> bool {
        matches!(
            self,
            Self::Dxt1 | Self::Dxt3 | Self::Dxt5 | Self::Dxt1OneBitAlpha
        )
    }

    /// Stores floating point texels.
    #[must_use]
    pub fn is_float(self) -> bool {
        matches!(
            self,
            Self::Rgba16161616F | Self::R32F | Self::Rgb323232F | Self::Rgba32323232F
        )
    }

    /// Bytes per 4x4 block for compressed formats.
    #[must_use]
    pub fn block_bytes(self) -> Option<usize> {
        match self {
            Self::Dxt1 | Self::Dxt1OneBitAlpha => Some(8),
            Self::Dxt3 | Self::Dxt5 => Some(16),
            _ => None,
        }
    }

    /// Bits per pixel for uncompressed formats (compressed formats report their average).
    #[must_use]
    pub fn bits_per_pixel(self) -> usize {
        match self {
            Self::Dxt1 | Self::Dxt1OneBitAlpha => 4,
            Self::Dxt3 | Self::Dxt5 => 8,
            Self::I8 | Self::P8 | Self::A8 => 8,
            Self::Rgb565
            | Self::Bgr565
            | Self::Bgrx5551
            | Self::Bgra4444
            | Self::Bgra5551
            | Self::Ia88
            | Self::Uv88 => 16,
            Self::Rgb888 | Self::Bgr888 | Self::Rgb888Bluescreen | Self::Bgr888Bluescreen => 24,
            Self::Rgba8888
            | Self::Abgr8888
            | Self::Argb8888
            | Self::Bgra8888
            | Self::Bgrx8888
            | Self::Uvwq8888
            | Self::Uvlx8888
            | Self::R32F => 32,
            Self::Rgba16161616F | Self::Rgba16161616 => 64,
            Self::Rgb323232F => 96,
            Self::Rgba32323232F => 128,
        }
    }

    /// Size in bytes of one image of `width` x `height` in this format.
    #[must_use]
    pub fn data_size(self, width: u32, height: u32) -> usize {
        let (w, h) = (width.max(1) as usize, height.max(1) as usize);
        match self.block_bytes() {
            Some(block) => w.div_ceil(4) * h.div_ceil(4) * block,
            None => w * h * self.bits_per_pixel() / 8,
        }
    }

    /// Byte layout for 8-bit-per-channel packed formats.
    #[must_use]
    pub fn packed_layout(self) -> Option<PackedLayout> {
        use Channel::{A, B, G, L, R, X};
        match self {
            Self::Rgba8888 => Some(&[R, G, B, A]),
            Self::Abgr8888 => Some(&[A, B, G, R]),
            Self::Rgb888 => Some(&[R, G, B]),
            Self::Bgr888 => Some(&[B, G, R]),
            Self::Argb8888 => Some(&[A, R, G, B]),
            Self::Bgra8888 => Some(&[B, G, R, A]),
            Self::Bgrx8888 => Some(&[B, G, R, X]),
            Self::I8 => Some(&[L]),
            Self::Ia88 => Some(&[L, A]),
            Self::A8 => Some(&[A]),
            _ => None,
        }
    }

    /// Whether the pixel codec can both decode and encode this format.
    #[must_use]
    pub fn is_supported(self) -> bool {
        self.packed_layout().is_some()
            || self.is_compressed()
            || matches!(
                self,
                Self::Rgb565 | Self::Bgr565 | Self::Rgba16161616F | Self::Rgba32323232F
            )
    }

    /// Whether the format carries an alpha channel.
    #[must_use]
    pub fn has_alpha(self) -> bool {
        match self.packed_layout() {
            Some(layout) => layout.contains(&Channel::A),
            None => matches!(
                self,
                Self::Dxt3
                    | Self::Dxt5
                    | Self::Dxt1OneBitAlpha
                    | Self::Bgra4444
                    | Self::Bgra5551
                    | Self::Rgba16161616F
                    | Self::Rgba16161616
                    | Self::Rgba32323232F
            ),
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_match_header_numbering() {
        assert_eq!(ImageFormat::from_id(0), Some(ImageFormat::Rgba8888));
        assert_eq!(ImageFormat::from_id(13), Some(ImageFormat::Dxt1));
        assert_eq!(ImageFormat::from_id(15), Some(ImageFormat::Dxt5));
        assert_eq!(ImageFormat::from_id(20), Some(ImageFormat::Dxt1OneBitAlpha));
        assert_eq!(ImageFormat::from_id(29), Some(ImageFormat::Rgba32323232F));
        assert_eq!(ImageFormat::from_id(-1), None);
        assert_eq!(ImageFormat::from_id(30), None);
        assert_eq!(ImageFormat::Bgrx8888.id(), 16);
    }

    #[test]
    fn test_data_size() {
        assert_eq!(ImageFormat::Dxt1.data_size(64, 64), 16 * 16 * 8);
        assert_eq!(ImageFormat::Dxt5.data_size(2, 2), 16);
        assert_eq!(ImageFormat::Bgr888.data_size(4, 4), 48);
        assert_eq!(ImageFormat::Rgba32323232F.data_size(4, 4), 256);
        // mips never shrink below one pixel
        assert_eq!(ImageFormat::Rgba8888.data_size(0, 0), 4);
    }

    #[test]
    fn test_alpha_channels() {
        assert!(ImageFormat::Bgra8888.has_alpha());
        assert!(!ImageFormat::Bgrx8888.has_alpha());
        assert!(!ImageFormat::Bgr888.has_alpha());
        assert!(!ImageFormat::Dxt1.has_alpha());
        assert!(ImageFormat::Dxt1OneBitAlpha.has_alpha());
    }
}
