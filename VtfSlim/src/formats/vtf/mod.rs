//! VTF texture container
//!
//! Reads and writes single-face VTF textures (versions 7.0-7.5): the mip
//! chain of every frame, the low-resolution thumbnail, and any other
//! resources, which are carried through untouched.
//!
//! SPDX-FileCopyrightText: 2025 `VtfSlim` contributors
//!
//! SPDX-License-Identifier: MIT

mod bc;
mod format;
mod header;
mod pixels;

use std::fs;
use std::io::Write;
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use image::imageops::{self, FilterType};
use image::{ImageBuffer, Rgba32FImage, RgbaImage};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};

pub use format::{Channel, ImageFormat, PackedLayout};
pub use header::{
    HIGH_RES_RESOURCE, LOW_RES_RESOURCE, ResourceEntry, TextureFlags, VTF_SIGNATURE, VtfHeader,
};

/// Largest side of the low-resolution thumbnail
const LOW_RES_MAX_SIDE: u32 = 16;

/// Resampling filter used by [`VtfTexture::resize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeFilter {
    /// Lanczos3; needs float texels to avoid banding.
    Nice,
    /// Bilinear; any precision.
    Triangle,
}

impl ResizeFilter {
    /// Whether the filter only runs on float formats.
    #[must_use]
    pub fn requires_float(self) -> bool {
        matches!(self, Self::Nice)
    }

    /// Display name of the filter.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Nice => "NICE",
            Self::Triangle => "TRIANGLE",
        }
    }

    fn filter_type(self) -> FilterType {
        match self {
            Self::Nice => FilterType::Lanczos3,
            Self::Triangle => FilterType::Triangle,
        }
    }
}

/// A resource other than the two images, preserved byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraResource {
    pub tag: [u8; 3],
    pub flags: u8,
    pub payload: ResourcePayload,
}

/// Storage of an [`ExtraResource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourcePayload {
    /// Value stored in the directory entry itself
    Inline(u32),
    /// Length-prefixed chunk in the file body
    Chunk(Vec<u8>),
}

/// A decoded VTF texture.
#[derive(Debug, Clone)]
pub struct VtfTexture {
    header: VtfHeader,
    format: ImageFormat,
    /// Raw image data indexed `[mip][frame]`, mip 0 being the largest
    mips: Vec<Vec<Vec<u8>>>,
    /// Raw low-resolution thumbnail, empty when absent
    low_res: Vec<u8>,
    extras: Vec<ExtraResource>,
}

impl VtfTexture {
    /// Read a texture from a file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path)?;
        Self::read(&data)
    }

    /// Parse a texture from bytes.
    pub fn read(data: &[u8]) -> Result<Self> {
        let header = VtfHeader::parse(data)?;

        if header.flags.contains(TextureFlags::ENVMAP) {
            return Err(Error::UnsupportedLayout("environment map".to_string()));
        }
        if header.depth > 1 {
            return Err(Error::UnsupportedLayout(format!(
                "volume texture with {} slices",
                header.depth
            )));
        }

        let format = format_from_id(header.format_id)?;
        let low_res_size = low_res_size(&header)?;
        let mut extras = Vec::new();
        let mut low_res = Vec::new();

        let mips = if header.uses_resources() {
            let mut mips = None;
            for entry in &header.resources {
                let offset = entry.data as usize;
                match entry.tag {
                    LOW_RES_RESOURCE => {
                        low_res = read_span(data, offset, low_res_size)?.to_vec();
                    }
                    HIGH_RES_RESOURCE => {
                        mips = Some(read_mips(data, offset, &header, format)?);
                    }
                    _ if entry.is_inline() => extras.push(ExtraResource {
                        tag: entry.tag,
                        flags: entry.flags,
                        payload: ResourcePayload::Inline(entry.data),
                    }),
                    _ => {
                        let len = LittleEndian::read_u32(read_span(data, offset, 4)?) as usize;
                        extras.push(ExtraResource {
                            tag: entry.tag,
                            flags: entry.flags,
                            payload: ResourcePayload::Chunk(
                                read_span(data, offset + 4, len)?.to_vec(),
                            ),
                        });
                    }
                }
            }
            mips.ok_or_else(|| {
                Error::UnsupportedLayout("missing high-resolution image resource".to_string())
            })?
        } else {
            let offset = header.header_size as usize;
            low_res = read_span(data, offset, low_res_size)?.to_vec();
            read_mips(data, offset + low_res_size, &header, format)?
        };

        Ok(Self {
            header,
            format,
            mips,
            low_res,
            extras,
        })
    }

    /// Build a single-mip 7.2 texture from RGBA8 frames.
    pub fn from_rgba_frames(
        width: u32,
        height: u32,
        format: ImageFormat,
        frames: &[Vec<u8>],
    ) -> Result<Self> {
        if frames.is_empty() {
            return Err(Error::EncodeFailed {
                format: format.name().to_string(),
                message: "texture needs at least one frame".to_string(),
            });
        }
        let (w, h) = checked_dimensions(width, height, format)?;
        let encoded = frames
            .iter()
            .map(|rgba| pixels::encode_rgba8(rgba, width, height, format))
            .collect::<Result<Vec<_>>>()?;

        let header = VtfHeader {
            major: 7,
            minor: 2,
            header_size: VtfHeader::size_for(2, 0),
            width: w,
            height: h,
            flags: TextureFlags::default(),
            frames: frames.len() as u16,
            first_frame: 0,
            reflectivity: [0.0; 3],
            bumpmap_scale: 1.0,
            format_id: format.id(),
            mipmap_count: 1,
            low_res_format_id: -1,
            low_res_width: 0,
            low_res_height: 0,
            depth: 1,
            resources: Vec::new(),
        };

        Ok(Self {
            header,
            format,
            mips: vec![encoded],
            low_res: Vec::new(),
            extras: Vec::new(),
        })
    }

    /// Change the container version written by [`VtfTexture::to_bytes`].
    #[must_use]
    pub fn with_version(mut self, minor: u32) -> Self {
        self.header.minor = minor.min(5);
        self
    }

    #[must_use]
    pub fn version(&self) -> (u32, u32) {
        (self.header.major, self.header.minor)
    }

    #[must_use]
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        u32::from(self.header.width)
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        u32::from(self.header.height)
    }

    #[must_use]
    pub fn frame_count(&self) -> usize {
        usize::from(self.header.frames)
    }

    #[must_use]
    pub fn mipmap_count(&self) -> usize {
        self.mips.len()
    }

    #[must_use]
    pub fn flags(&self) -> TextureFlags {
        self.header.flags
    }

    pub fn set_flags(&mut self, flags: TextureFlags) {
        self.header.flags = flags;
    }

    /// Format and size of the low-resolution thumbnail, if present.
    #[must_use]
    pub fn low_res(&self) -> Option<(ImageFormat, u32, u32)> {
        if self.low_res.is_empty() {
            return None;
        }
        ImageFormat::from_id(self.header.low_res_format_id).map(|format| {
            (
                format,
                u32::from(self.header.low_res_width),
                u32::from(self.header.low_res_height),
            )
        })
    }

    /// Resources other than the two images.
    #[must_use]
    pub fn extra_resources(&self) -> &[ExtraResource] {
        &self.extras
    }

    /// Raw mip 0 data of a frame.
    pub fn raw_frame(&self, frame: usize) -> Result<&[u8]> {
        self.mips
            .first()
            .and_then(|frames| frames.get(frame))
            .map(Vec::as_slice)
            .ok_or(Error::FrameOutOfRange {
                frame,
                count: self.frame_count(),
            })
    }

    /// Decode mip 0 of a frame to straight RGBA8.
    pub fn frame_rgba(&self, frame: usize) -> Result<Vec<u8>> {
        pixels::decode_rgba8(self.raw_frame(frame)?, self.width(), self.height(), self.format)
    }

    fn frame_image(&self, frame: usize) -> Result<Rgba32FImage> {
        let texels =
            pixels::decode_rgba32f(self.raw_frame(frame)?, self.width(), self.height(), self.format)?;
        ImageBuffer::from_raw(self.width(), self.height(), texels).ok_or(Error::ImageBufferFailed)
    }

    /// Transcode every mip of every frame to `target`.
    pub fn set_format(&mut self, target: ImageFormat) -> Result<()> {
        if target == self.format {
            return Ok(());
        }
        for format in [self.format, target] {
            if !format.is_supported() {
                return Err(Error::UnsupportedFormat {
                    format: format.name().to_string(),
                });
            }
        }

        let source = self.format;
        let via_float = source.is_float() || target.is_float();
        let (width, height) = (self.width(), self.height());

        for (mip, frames) in self.mips.iter_mut().enumerate() {
            let (w, h) = mip_dimensions(width, height, mip);
            for data in frames.iter_mut() {
                *data = if via_float {
                    let texels = pixels::decode_rgba32f(data, w, h, source)?;
                    pixels::encode_rgba32f(&texels, w, h, target)?
                } else {
                    let rgba = pixels::decode_rgba8(data, w, h, source)?;
                    pixels::encode_rgba8(&rgba, w, h, target)?
                };
            }
        }

        self.format = target;
        Ok(())
    }

    /// Resample every frame to `width` x `height` and rebuild the mip chain.
    ///
    /// A texture that carried a full mip chain gets a full chain for the new
    /// size; a partial chain keeps its length where the new size allows it.
    /// The low-resolution thumbnail is regenerated from frame 0.
    pub fn resize(&mut self, width: u32, height: u32, filter: ResizeFilter) -> Result<()> {
        if filter.requires_float() && !self.format.is_float() {
            return Err(Error::ResizePrecision {
                filter: filter.name(),
                format: self.format.name().to_string(),
            });
        }
        let (w, h) = checked_dimensions(width, height, self.format)?;

        let full_chain = self.mips.len() == full_mip_count(self.width(), self.height());
        let mip_count = if full_chain {
            full_mip_count(width, height)
        } else {
            self.mips.len().min(full_mip_count(width, height))
        };

        let mut mips = vec![Vec::with_capacity(self.frame_count()); mip_count];
        let mut thumbnail_source = None;

        for frame in 0..self.frame_count() {
            let base = imageops::resize(&self.frame_image(frame)?, width, height, filter.filter_type());
            for (mip, frames) in mips.iter_mut().enumerate() {
                let (mw, mh) = mip_dimensions(width, height, mip);
                let data = if mip == 0 {
                    pixels::encode_rgba32f(base.as_raw(), mw, mh, self.format)?
                } else {
                    let level = imageops::resize(&base, mw, mh, filter.filter_type());
                    pixels::encode_rgba32f(level.as_raw(), mw, mh, self.format)?
                };
                frames.push(data);
            }
            if frame == 0 {
                thumbnail_source = Some(base);
            }
        }

        self.mips = mips;
        self.header.width = w;
        self.header.height = h;
        self.header.mipmap_count = mip_count as u8;

        if let Some(base) = thumbnail_source {
            self.regenerate_low_res(&base)?;
        }
        Ok(())
    }

    fn regenerate_low_res(&mut self, base: &Rgba32FImage) -> Result<()> {
        let Some((format, _, _)) = self.low_res() else {
            return Ok(());
        };
        if !format.is_supported() {
            return Ok(());
        }

        let (lw, lh) = low_res_dimensions(self.width(), self.height());
        let thumbnail = imageops::resize(base, lw, lh, ResizeFilter::Triangle.filter_type());
        self.low_res = pixels::encode_rgba32f(thumbnail.as_raw(), lw, lh, format)?;
        self.header.low_res_width = lw as u8;
        self.header.low_res_height = lh as u8;
        Ok(())
    }

    /// Serialize the texture in its container version.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut header = self.header.clone();
        header.format_id = self.format.id();
        header.mipmap_count = self.mips.len() as u8;
        header.depth = 1;

        let mut image = Vec::new();
        for frames in self.mips.iter().rev() {
            for data in frames {
                image.extend_from_slice(data);
            }
        }

        let mut out = Vec::new();
        if !header.uses_resources() {
            header.resources.clear();
            header.header_size = VtfHeader::size_for(header.minor, 0);
            header.write(&mut out)?;
            out.extend_from_slice(&self.low_res);
            out.extend_from_slice(&image);
            return Ok(out);
        }

        let count = usize::from(!self.low_res.is_empty()) + self.extras.len() + 1;
        header.header_size = VtfHeader::size_for(header.minor, count);
        let mut offset = header.header_size;
        let mut body = Vec::new();
        let mut entries = Vec::with_capacity(count);

        if !self.low_res.is_empty() {
            entries.push(ResourceEntry {
                tag: LOW_RES_RESOURCE,
                flags: 0,
                data: offset,
            });
            body.extend_from_slice(&self.low_res);
            offset += self.low_res.len() as u32;
        }
        for extra in &self.extras {
            match &extra.payload {
                ResourcePayload::Inline(value) => entries.push(ResourceEntry {
                    tag: extra.tag,
                    flags: extra.flags,
                    data: *value,
                }),
                ResourcePayload::Chunk(chunk) => {
                    entries.push(ResourceEntry {
                        tag: extra.tag,
                        flags: extra.flags,
                        data: offset,
                    });
                    body.write_u32::<LittleEndian>(chunk.len() as u32)?;
                    body.extend_from_slice(chunk);
                    offset += 4 + chunk.len() as u32;
                }
            }
        }
        entries.push(ResourceEntry {
            tag: HIGH_RES_RESOURCE,
            flags: 0,
            data: offset,
        });
        body.extend_from_slice(&image);

        header.resources = entries;
        header.write(&mut out)?;
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Write the texture to `path` atomically.
    ///
    /// The bytes go to a temporary file beside `path` which is then renamed
    /// over it, so a failed bake never leaves a partial file behind.
    pub fn bake_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(&bytes)?;
        temp.as_file().sync_all()?;
        temp.persist(path)?;
        Ok(())
    }

    /// Encode mip 0 of a frame as PNG.
    pub fn frame_to_png_bytes(&self, frame: usize) -> Result<Vec<u8>> {
        let img: RgbaImage = ImageBuffer::from_raw(self.width(), self.height(), self.frame_rgba(frame)?)
            .ok_or(Error::ImageBufferFailed)?;

        let mut png_data = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut png_data);
        img.write_with_encoder(encoder)?;
        Ok(png_data)
    }
}

// ============================================================================
// Layout helpers
// ============================================================================

fn format_from_id(id: i32) -> Result<ImageFormat> {
    ImageFormat::from_id(id).ok_or_else(|| Error::UnsupportedFormat {
        format: format!("id {id}"),
    })
}

fn low_res_size(header: &VtfHeader) -> Result<usize> {
    if header.low_res_format_id == -1 || header.low_res_width == 0 || header.low_res_height == 0 {
        return Ok(0);
    }
    let format = format_from_id(header.low_res_format_id)?;
    Ok(format.data_size(
        u32::from(header.low_res_width),
        u32::from(header.low_res_height),
    ))
}

fn read_span(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    data.get(offset..offset + len).ok_or(Error::VtfTruncated {
        needed: offset + len,
        available: data.len(),
    })
}

/// Read the mip chain stored smallest mip first, frames inside each mip.
fn read_mips(
    data: &[u8],
    start: usize,
    header: &VtfHeader,
    format: ImageFormat,
) -> Result<Vec<Vec<Vec<u8>>>> {
    let mip_count = usize::from(header.mipmap_count.max(1));
    let frames = usize::from(header.frames);
    let (width, height) = (u32::from(header.width), u32::from(header.height));

    let mut mips = vec![Vec::with_capacity(frames); mip_count];
    let mut offset = start;
    for mip in (0..mip_count).rev() {
        let (w, h) = mip_dimensions(width, height, mip);
        let size = format.data_size(w, h);
        for _ in 0..frames {
            mips[mip].push(read_span(data, offset, size)?.to_vec());
            offset += size;
        }
    }
    Ok(mips)
}

fn mip_dimensions(width: u32, height: u32, mip: usize) -> (u32, u32) {
    ((width >> mip).max(1), (height >> mip).max(1))
}

/// Length of a mip chain running down to 1x1.
fn full_mip_count(width: u32, height: u32) -> usize {
    (u32::BITS - width.max(height).max(1).leading_zeros()) as usize
}

fn low_res_dimensions(width: u32, height: u32) -> (u32, u32) {
    let (mut w, mut h) = (width.max(1), height.max(1));
    while w > LOW_RES_MAX_SIDE || h > LOW_RES_MAX_SIDE {
        w = (w / 2).max(1);
        h = (h / 2).max(1);
    }
    (w, h)
}

fn checked_dimensions(width: u32, height: u32, format: ImageFormat) -> Result<(u16, u16)> {
    match (u16::try_from(width), u16::try_from(height)) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => Ok((w, h)),
        _ => Err(Error::EncodeFailed {
            format: format.name().to_string(),
            message: format!("invalid dimensions {width}x{height}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        rgba.iter()
            .copied()
            .cycle()
            .take((width * height * 4) as usize)
            .collect()
    }

    /// Full-chain texture with a DXT1 thumbnail, as authoring tools write them.
    fn authored(width: u32, height: u32, minor: u32) -> VtfTexture {
        let mut texture =
            VtfTexture::from_rgba_frames(width, height, ImageFormat::Rgba8888, &[solid(width, height, [40, 80, 120, 255])])
                .unwrap()
                .with_version(minor);
        let count = full_mip_count(width, height);
        texture.mips = (0..count)
            .map(|mip| {
                let (w, h) = mip_dimensions(width, height, mip);
                vec![solid(w, h, [40, 80, 120, 255])]
            })
            .collect();
        let (lw, lh) = low_res_dimensions(width, height);
        texture.low_res = pixels::encode_rgba8(&solid(lw, lh, [40, 80, 120, 255]), lw, lh, ImageFormat::Dxt1).unwrap();
        texture.header.low_res_format_id = ImageFormat::Dxt1.id();
        texture.header.low_res_width = lw as u8;
        texture.header.low_res_height = lh as u8;
        texture
    }

    #[test]
    fn test_roundtrip_classic_and_resource_layouts() {
        for minor in 0..=5 {
            let mut texture = authored(32, 16, minor);
            if minor >= 3 {
                texture.extras.push(ExtraResource {
                    tag: *b"CRC",
                    flags: 0x02,
                    payload: ResourcePayload::Inline(0xDEAD_BEEF),
                });
                texture.extras.push(ExtraResource {
                    tag: *b"KVD",
                    flags: 0,
                    payload: ResourcePayload::Chunk(b"\"key\" \"value\"".to_vec()),
                });
            }

            let bytes = texture.to_bytes().unwrap();
            let parsed = VtfTexture::read(&bytes).unwrap();
            assert_eq!(parsed.version(), (7, minor));
            assert_eq!(parsed.mips, texture.mips);
            assert_eq!(parsed.low_res, texture.low_res);
            assert_eq!(parsed.extras, texture.extras);
            assert_eq!(parsed.to_bytes().unwrap(), bytes);
        }
    }

    #[test]
    fn test_set_format_transcodes_every_mip() {
        let mut texture = authored(16, 16, 2);
        texture.set_format(ImageFormat::Bgr888).unwrap();
        assert_eq!(texture.format(), ImageFormat::Bgr888);
        assert_eq!(texture.mips[4][0], vec![120, 80, 40]);
        assert_eq!(texture.frame_rgba(0).unwrap(), solid(16, 16, [40, 80, 120, 255]));

        assert!(matches!(
            texture.set_format(ImageFormat::P8),
            Err(Error::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_resize_rebuilds_full_chain_and_thumbnail() {
        let mut texture = authored(64, 32, 2);
        texture.set_format(ImageFormat::Rgba32323232F).unwrap();
        texture.resize(32, 16, ResizeFilter::Nice).unwrap();
        texture.set_format(ImageFormat::Rgba8888).unwrap();

        assert_eq!((texture.width(), texture.height()), (32, 16));
        assert_eq!(texture.mipmap_count(), 6);
        assert_eq!(texture.low_res().map(|(_, w, h)| (w, h)), Some((16, 8)));
        assert_eq!(texture.frame_rgba(0).unwrap(), solid(32, 16, [40, 80, 120, 255]));
    }

    #[test]
    fn test_resize_requires_precision_for_nice() {
        let mut texture = authored(8, 8, 2);
        assert!(matches!(
            texture.resize(4, 4, ResizeFilter::Nice),
            Err(Error::ResizePrecision { filter: "NICE", .. })
        ));
        texture.resize(4, 4, ResizeFilter::Triangle).unwrap();
        assert_eq!(texture.width(), 4);
    }

    #[test]
    fn test_rejects_environment_maps() {
        let mut texture = authored(8, 8, 2);
        texture.set_flags(TextureFlags::ENVMAP);
        let bytes = texture.to_bytes().unwrap();
        assert!(matches!(
            VtfTexture::read(&bytes),
            Err(Error::UnsupportedLayout(_))
        ));
    }

    #[test]
    fn test_bake_writes_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.vtf");
        let texture = authored(8, 8, 4);
        texture.bake_to_file(&path).unwrap();

        let reread = VtfTexture::open(&path).unwrap();
        assert_eq!(reread.to_bytes().unwrap(), texture.to_bytes().unwrap());
        let leftovers = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_png_preview() {
        let texture = authored(8, 8, 2);
        let png = texture.frame_to_png_bytes(0).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        assert!(matches!(
            texture.frame_to_png_bytes(3),
            Err(Error::FrameOutOfRange { frame: 3, count: 1 })
        ));
    }
}
