//! Material (VMT) files
//!
//! Materials are read as Latin-1, where every byte maps to one char, so
//! decoding never fails and writing back reproduces untouched bytes exactly.

pub mod allowlist;
pub mod scanner;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

pub use allowlist::{TextureParams, texture_param_regex, texture_params};
pub use scanner::{TextureReference, extract_references, normalize_reference, scan_materials};

/// A material file and the texture references found in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialFile {
    pub path: PathBuf,
    pub text: String,
    pub references: Vec<TextureReference>,
}

impl MaterialFile {
    /// Read and scan a material file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = decode_latin1(&fs::read(path)?);
        let references = extract_references(&text)?;
        Ok(Self {
            path: path.to_path_buf(),
            text,
            references,
        })
    }
}

/// Decode Latin-1 bytes
#[must_use]
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Encode text as Latin-1; chars outside it become `?`
#[must_use]
pub fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_latin1_is_lossless_for_every_byte() {
        let bytes: Vec<u8> = (0..=255).collect();
        assert_eq!(encode_latin1(&decode_latin1(&bytes)), bytes);
        assert_eq!(encode_latin1("a\u{2014}b"), b"a?b".to_vec());
    }

    #[test]
    fn test_open_scans_references() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wall.vmt");
        fs::write(&path, b"\"LightmappedGeneric\"\n{\n\t\"$basetexture\" \"Brick\\Wall01\"\n\t\"$surfaceprop\" \"brick\"\n}\n\xE9").unwrap();

        let material = MaterialFile::open(&path).unwrap();
        assert_eq!(material.references.len(), 1);
        assert_eq!(material.references[0].path, "brick/wall01");
        assert!(material.text.ends_with('\u{e9}'));
    }
}
