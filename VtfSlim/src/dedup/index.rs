//! Content-hash index of texture files

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use serde::{Serialize, Serializer};

use crate::error::Result;
use crate::progress::{OptimizePhase, OptimizeProgress, OptimizeProgressCallback};
use crate::utils::try_find_files;

/// MD5 digest of a file's raw bytes
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    #[must_use]
    pub fn of_bytes(data: &[u8]) -> Self {
        Self(md5::compute(data).0)
    }

    /// Hash a file with a streaming 8 KiB reader.
    pub fn of_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut hasher = md5::Context::new();
        let mut buffer = [0u8; 8192];

        loop {
            let bytes_read = file.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            hasher.consume(&buffer[..bytes_read]);
        }

        Ok(Self(hasher.compute().0))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// 32 lowercase hex chars
    #[must_use]
    pub fn to_hex(&self) -> String {
        let mut hex = String::with_capacity(32);
        for b in self.0 {
            let _ = write!(hex, "{b:02x}");
        }
        hex
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({self})")
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Textures sharing one digest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub hash: ContentHash,
    /// Sorted member paths, at least two
    pub paths: Vec<PathBuf>,
}

/// Duplicate groups of a directory tree, ordered by digest
#[derive(Debug, Clone, Default)]
pub struct DuplicateIndex {
    groups: BTreeMap<ContentHash, Vec<PathBuf>>,
}

impl DuplicateIndex {
    /// Group already-hashed files, keeping only digests shared by two or more.
    pub fn from_hashes<I>(hashes: I) -> Self
    where
        I: IntoIterator<Item = (PathBuf, ContentHash)>,
    {
        let mut all: BTreeMap<ContentHash, Vec<PathBuf>> = BTreeMap::new();
        for (path, hash) in hashes {
            all.entry(hash).or_default().push(path);
        }

        let groups = all
            .into_iter()
            .filter(|(_, paths)| paths.len() >= 2)
            .map(|(hash, mut paths)| {
                paths.sort();
                (hash, paths)
            })
            .collect();

        Self { groups }
    }

    /// Hash every file with extension `ext` under `dir` in parallel.
    ///
    /// A file or directory that cannot be read fails the whole build.
    pub fn build<P: AsRef<Path>>(
        dir: P,
        ext: &str,
        progress: OptimizeProgressCallback,
    ) -> Result<Self> {
        let dir = dir.as_ref();
        let files = try_find_files(dir, ext)?;
        let total = files.len();
        let processed = AtomicUsize::new(0);

        let hashes = files
            .into_par_iter()
            .map(|path| {
                let hash = ContentHash::of_file(&path)?;
                let current = processed.fetch_add(1, Ordering::SeqCst) + 1;
                let display = path.strip_prefix(dir).unwrap_or(&path).display().to_string();
                progress(&OptimizeProgress::with_file(
                    OptimizePhase::HashingTextures,
                    current,
                    total,
                    display,
                ));
                Ok((path, hash))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::from_hashes(hashes))
    }

    /// Duplicate groups in digest order.
    #[must_use]
    pub fn groups(&self) -> Vec<DuplicateGroup> {
        self.groups
            .iter()
            .map(|(hash, paths)| DuplicateGroup {
                hash: *hash,
                paths: paths.clone(),
            })
            .collect()
    }

    /// Every member path with its digest, in digest then path order.
    pub fn members(&self) -> impl Iterator<Item = (&Path, ContentHash)> {
        self.groups
            .iter()
            .flat_map(|(hash, paths)| paths.iter().map(move |p| (p.as_path(), *hash)))
    }

    /// Number of duplicate groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of files across all groups.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::no_progress;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_hash_hex() {
        assert_eq!(ContentHash::of_bytes(b"").to_hex(), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(ContentHash::of_bytes(b"abc").to_string(), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn test_streaming_matches_whole_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.vtf");
        let data: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(&path, &data).unwrap();
        assert_eq!(ContentHash::of_file(&path).unwrap(), ContentHash::of_bytes(&data));
    }

    #[test]
    fn test_groups_only_shared_digests() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("b/a.vtf"), b"same").unwrap();
        fs::write(dir.path().join("a.VTF"), b"same").unwrap();
        fs::write(dir.path().join("c.vtf"), b"different").unwrap();
        fs::write(dir.path().join("d.vmt"), b"same").unwrap();

        let index = DuplicateIndex::build(dir.path(), "vtf", &no_progress).unwrap();
        assert_eq!(
            index.groups(),
            vec![DuplicateGroup {
                hash: ContentHash::of_bytes(b"same"),
                paths: vec![dir.path().join("a.VTF"), dir.path().join("b/a.vtf")],
            }]
        );
        assert_eq!(index.member_count(), 2);
    }

    #[test]
    fn test_empty_tree_has_no_groups() {
        let dir = tempfile::tempdir().unwrap();
        let index = DuplicateIndex::build(dir.path(), "vtf", &no_progress).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
    }
}
