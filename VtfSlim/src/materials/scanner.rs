//! Texture reference extraction

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::warn;

use super::MaterialFile;
use super::allowlist::texture_param_regex;
use crate::error::Result;
use crate::utils::try_find_files;

/// One `"$param" "path"` pair from a material
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureReference {
    /// Parameter name as written
    pub param: String,
    /// Path exactly as written between the quotes
    pub raw: String,
    /// Normalized path, see [`normalize_reference`]
    pub path: String,
}

/// Backslashes to forward slashes, trimmed, lowercased.
#[must_use]
pub fn normalize_reference(raw: &str) -> String {
    raw.replace('\\', "/").trim().to_lowercase()
}

/// Every allowlisted texture reference in `text`, in order.
pub fn extract_references(text: &str) -> Result<Vec<TextureReference>> {
    let regex = texture_param_regex()?;
    Ok(regex
        .captures_iter(text)
        .map(|caps| TextureReference {
            param: caps[1].to_string(),
            raw: caps[2].to_string(),
            path: normalize_reference(&caps[2]),
        })
        .collect())
}

/// Scan every material under `dir`.
///
/// Returns material path -> normalized references, ordered by path. Materials
/// without references are included with an empty list; unreadable ones are
/// logged and skipped. A directory that cannot be walked is an error.
pub fn scan_materials<P: AsRef<Path>>(
    dir: P,
    material_extension: &str,
) -> Result<BTreeMap<PathBuf, Vec<String>>> {
    let mut deps = BTreeMap::new();
    for path in try_find_files(dir, material_extension)? {
        match MaterialFile::open(&path) {
            Ok(material) => {
                let refs = material.references.into_iter().map(|r| r.path).collect();
                deps.insert(path, refs);
            }
            Err(e) => warn!("Skipping unreadable material {}: {e}", path.display()),
        }
    }
    Ok(deps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    const VMT: &str = r#""VertexLitGeneric"
{
    "$baseTexture" "Models\Props\Crate01 "
    $bumpmap "models/props/crate01_normal"
    "$detail2" "detail/noise"
    "$surfaceprop" "wood"
    "$envmaptint" "[1 1 1]"
    "%tooltexture" "tools/preview"
}
"#;

    #[test]
    fn test_extracts_allowlisted_params_in_order() {
        let refs = extract_references(VMT).unwrap();
        let paths: Vec<&str> = refs.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "models/props/crate01",
                "models/props/crate01_normal",
                "detail/noise",
                "tools/preview",
            ]
        );
        assert_eq!(refs[0].param, "$baseTexture");
        assert_eq!(refs[0].raw, "Models\\Props\\Crate01 ");
    }

    #[test]
    fn test_scan_tree() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("materials/props")).unwrap();
        fs::write(dir.path().join("materials/props/crate.vmt"), VMT).unwrap();
        fs::write(dir.path().join("materials/empty.VMT"), "\"UnlitGeneric\" {}").unwrap();
        fs::write(dir.path().join("materials/readme.txt"), VMT).unwrap();

        let deps = scan_materials(dir.path(), "vmt").unwrap();
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[&dir.path().join("materials/empty.VMT")], Vec::<String>::new());
        assert_eq!(deps[&dir.path().join("materials/props/crate.vmt")].len(), 4);
    }
}
