//! VTF header and resource directory
//!
//! SPDX-FileCopyrightText: 2025 `VtfSlim` contributors
//!
//! SPDX-License-Identifier: MIT

use std::fmt;
use std::io::{Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};

/// File magic at offset 0
pub const VTF_SIGNATURE: [u8; 4] = *b"VTF\0";

/// Resource tag of the low-resolution thumbnail
pub const LOW_RES_RESOURCE: [u8; 3] = [0x01, 0x00, 0x00];
/// Resource tag of the high-resolution image data
pub const HIGH_RES_RESOURCE: [u8; 3] = [0x30, 0x00, 0x00];
/// Resource flag: the entry's data field is the value itself, no chunk follows
pub const RESOURCE_NO_DATA_CHUNK: u8 = 0x02;

/// Header size of 7.0 and 7.1 files
const HEADER_SIZE_V70: u32 = 64;
/// Header size of 7.2 files and of the fixed part of 7.3+ files
const HEADER_SIZE_V72: u32 = 80;
/// Size of one resource directory entry
const RESOURCE_ENTRY_SIZE: u32 = 8;
/// Resource directory limit used by the reference tools
const MAX_RESOURCES: u32 = 32;

// ============================================================================
// Flags
// ============================================================================

/// Texture flag bitset from the VTF header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureFlags(u32);

impl TextureFlags {
    /// Texture is a cube map
    pub const ENVMAP: Self = Self(0x0000_4000);
    /// Set once a normal map has been halved
    pub const HALVED_NORMAL: Self = Self(1 << 19);
    /// Set once a solid-color texture has been shrunk
    pub const SHRUNK_SOLID: Self = Self(1 << 20);

    /// Wrap raw header bits.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw header bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set every bit of `other`.
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

impl fmt::Display for TextureFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

// ============================================================================
// Header
// ============================================================================

/// One entry of the 7.3+ resource directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceEntry {
    /// Three-byte resource tag
    pub tag: [u8; 3],
    /// Resource flags
    pub flags: u8,
    /// Offset of the resource chunk, or the inline value
    pub data: u32,
}

impl ResourceEntry {
    /// Whether `data` is an inline value rather than an offset.
    #[must_use]
    pub fn is_inline(&self) -> bool {
        self.flags & RESOURCE_NO_DATA_CHUNK != 0
    }
}

/// Fixed VTF header fields.
#[derive(Debug, Clone, PartialEq)]
pub struct VtfHeader {
    pub major: u32,
    pub minor: u32,
    /// Header size as stored; image data follows it in 7.0-7.2 files
    pub header_size: u32,
    pub width: u16,
    pub height: u16,
    pub flags: TextureFlags,
    pub frames: u16,
    pub first_frame: u16,
    pub reflectivity: [f32; 3],
    pub bumpmap_scale: f32,
    /// High-resolution format id (see [`super::ImageFormat::from_id`])
    pub format_id: i32,
    pub mipmap_count: u8,
    /// Low-resolution format id, `-1` when absent
    pub low_res_format_id: i32,
    pub low_res_width: u8,
    pub low_res_height: u8,
    /// Slice count, 1 before 7.2
    pub depth: u16,
    /// Resource directory, empty before 7.3
    pub resources: Vec<ResourceEntry>,
}

impl VtfHeader {
    /// Whether this version stores its data through the resource directory.
    #[must_use]
    pub fn uses_resources(&self) -> bool {
        self.minor >= 3
    }

    /// Header size this version needs for `resource_count` directory entries.
    #[must_use]
    pub fn size_for(minor: u32, resource_count: usize) -> u32 {
        match minor {
            0 | 1 => HEADER_SIZE_V70,
            2 => HEADER_SIZE_V72,
            _ => HEADER_SIZE_V72 + RESOURCE_ENTRY_SIZE * resource_count as u32,
        }
    }

    /// Parse the header (and resource directory) at the start of `data`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE_V70 as usize {
            return Err(Error::VtfTruncated {
                needed: HEADER_SIZE_V70 as usize,
                available: data.len(),
            });
        }

        let mut cursor = Cursor::new(data);
        let mut magic = [0u8; 4];
        cursor.read_exact(&mut magic)?;
        if magic != VTF_SIGNATURE {
            return Err(Error::InvalidVtfMagic(magic));
        }

        let major = cursor.read_u32::<LittleEndian>()?;
        let minor = cursor.read_u32::<LittleEndian>()?;
        if major != 7 || minor > 5 {
            return Err(Error::UnsupportedVtfVersion { major, minor });
        }

        let header_size = cursor.read_u32::<LittleEndian>()?;
        let width = cursor.read_u16::<LittleEndian>()?;
        let height = cursor.read_u16::<LittleEndian>()?;
        let flags = TextureFlags(cursor.read_u32::<LittleEndian>()?);
        let frames = cursor.read_u16::<LittleEndian>()?;
        let first_frame = cursor.read_u16::<LittleEndian>()?;
        skip(&mut cursor, 4)?;
        let mut reflectivity = [0f32; 3];
        cursor.read_f32_into::<LittleEndian>(&mut reflectivity)?;
        skip(&mut cursor, 4)?;
        let bumpmap_scale = cursor.read_f32::<LittleEndian>()?;
        let format_id = cursor.read_i32::<LittleEndian>()?;
        let mipmap_count = cursor.read_u8()?;
        let low_res_format_id = cursor.read_i32::<LittleEndian>()?;
        let low_res_width = cursor.read_u8()?;
        let low_res_height = cursor.read_u8()?;

        let mut depth = 1;
        let mut resources = Vec::new();

        if minor >= 2 {
            ensure_len(data, HEADER_SIZE_V72 as usize)?;
            // some 7.2 writers leave the slice count zeroed
            depth = cursor.read_u16::<LittleEndian>()?.max(1);
        }

        if minor >= 3 {
            skip(&mut cursor, 3)?;
            let count = cursor.read_u32::<LittleEndian>()?;
            if count > MAX_RESOURCES {
                return Err(Error::UnsupportedLayout(format!(
                    "{count} resources (limit {MAX_RESOURCES})"
                )));
            }
            skip(&mut cursor, 8)?;
            ensure_len(data, Self::size_for(minor, count as usize) as usize)?;

            for _ in 0..count {
                let mut tag = [0u8; 3];
                cursor.read_exact(&mut tag)?;
                let flags = cursor.read_u8()?;
                let data = cursor.read_u32::<LittleEndian>()?;
                resources.push(ResourceEntry { tag, flags, data });
            }
        }

        Ok(Self {
            major,
            minor,
            header_size,
            width,
            height,
            flags,
            frames: frames.max(1),
            first_frame,
            reflectivity,
            bumpmap_scale,
            format_id,
            mipmap_count,
            low_res_format_id,
            low_res_width,
            low_res_height,
            depth,
            resources,
        })
    }

    /// Write the header, padded to [`VtfHeader::size_for`] its version.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        let size = Self::size_for(self.minor, self.resources.len());
        let mut buf = Vec::with_capacity(size as usize);

        buf.write_all(&VTF_SIGNATURE)?;
        buf.write_u32::<LittleEndian>(self.major)?;
        buf.write_u32::<LittleEndian>(self.minor)?;
        buf.write_u32::<LittleEndian>(size)?;
        buf.write_u16::<LittleEndian>(self.width)?;
        buf.write_u16::<LittleEndian>(self.height)?;
        buf.write_u32::<LittleEndian>(self.flags.bits())?;
        buf.write_u16::<LittleEndian>(self.frames)?;
        buf.write_u16::<LittleEndian>(self.first_frame)?;
        buf.write_all(&[0; 4])?;
        for value in self.reflectivity {
            buf.write_f32::<LittleEndian>(value)?;
        }
        buf.write_all(&[0; 4])?;
        buf.write_f32::<LittleEndian>(self.bumpmap_scale)?;
        buf.write_i32::<LittleEndian>(self.format_id)?;
        buf.write_u8(self.mipmap_count)?;
        buf.write_i32::<LittleEndian>(self.low_res_format_id)?;
        buf.write_u8(self.low_res_width)?;
        buf.write_u8(self.low_res_height)?;

        if self.minor >= 2 {
            buf.write_u16::<LittleEndian>(self.depth)?;
        }
        if self.minor >= 3 {
            buf.write_all(&[0; 3])?;
            buf.write_u32::<LittleEndian>(self.resources.len() as u32)?;
            buf.write_all(&[0; 8])?;
            for entry in &self.resources {
                buf.write_all(&entry.tag)?;
                buf.write_u8(entry.flags)?;
                buf.write_u32::<LittleEndian>(entry.data)?;
            }
        }

        buf.resize(size as usize, 0);
        writer.write_all(&buf)?;
        Ok(())
    }
}

fn skip(cursor: &mut Cursor<&[u8]>, count: u64) -> Result<()> {
    cursor.set_position(cursor.position() + count);
    Ok(())
}

fn ensure_len(data: &[u8], needed: usize) -> Result<()> {
    if data.len() < needed {
        return Err(Error::VtfTruncated {
            needed,
            available: data.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample(minor: u32) -> VtfHeader {
        VtfHeader {
            major: 7,
            minor,
            header_size: VtfHeader::size_for(minor, 0),
            width: 64,
            height: 32,
            flags: TextureFlags::from_bits(0x2000),
            frames: 1,
            first_frame: 0,
            reflectivity: [0.5, 0.25, 0.125],
            bumpmap_scale: 1.0,
            format_id: 13,
            mipmap_count: 7,
            low_res_format_id: 13,
            low_res_width: 16,
            low_res_height: 8,
            depth: 1,
            resources: Vec::new(),
        }
    }

    #[test]
    fn test_header_roundtrip_per_version() {
        for minor in 0..=5 {
            let mut header = sample(minor);
            if minor >= 3 {
                header.resources.push(ResourceEntry {
                    tag: HIGH_RES_RESOURCE,
                    flags: 0,
                    data: 88,
                });
            }
            header.header_size = VtfHeader::size_for(minor, header.resources.len());

            let mut bytes = Vec::new();
            header.write(&mut bytes).unwrap();
            assert_eq!(bytes.len() as u32, header.header_size);

            let parsed = VtfHeader::parse(&bytes).unwrap();
            assert_eq!(parsed, header);
        }
    }

    #[test]
    fn test_flag_bits() {
        let mut flags = TextureFlags::from_bits(0x2000);
        assert!(!flags.contains(TextureFlags::HALVED_NORMAL));
        flags.insert(TextureFlags::HALVED_NORMAL);
        assert!(flags.contains(TextureFlags::HALVED_NORMAL));
        assert!(!flags.contains(TextureFlags::SHRUNK_SOLID));
        assert_eq!(flags.bits(), 0x2000 | (1 << 19));
    }

    #[test]
    fn test_rejects_bad_magic_and_version() {
        let mut bytes = Vec::new();
        sample(2).write(&mut bytes).unwrap();

        let mut bad_magic = bytes.clone();
        bad_magic[0] = b'X';
        assert!(matches!(
            VtfHeader::parse(&bad_magic),
            Err(Error::InvalidVtfMagic(_))
        ));

        let mut bad_version = bytes;
        bad_version[8] = 9;
        assert!(matches!(
            VtfHeader::parse(&bad_version),
            Err(Error::UnsupportedVtfVersion { major: 7, minor: 9 })
        ));

        assert!(matches!(
            VtfHeader::parse(b"VTF\0"),
            Err(Error::VtfTruncated { .. })
        ));
    }
}
