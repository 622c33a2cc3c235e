//! Optimizer configuration (`config.toml`)

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

// Default value functions for serde
fn default_asset_root_marker() -> String {
    "materials".to_string()
}
fn default_shared_dir_name() -> String {
    "shared_duplicates".to_string()
}
fn default_texture_extension() -> String {
    "vtf".to_string()
}
fn default_material_extension() -> String {
    "vmt".to_string()
}
fn default_true() -> bool {
    true
}
fn default_log_file() -> PathBuf {
    PathBuf::from("vtfslim-error.log")
}

/// Filename hints that mark a texture as a normal map without decoding it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalMapHints {
    /// Consult the hints at all
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Matched anywhere in the lowercased file stem
    #[serde(default = "default_substrings")]
    pub substrings: Vec<String>,
    /// Matched at the end of the lowercased file stem
    #[serde(default = "default_suffixes")]
    pub suffixes: Vec<String>,
}

fn default_substrings() -> Vec<String> {
    vec!["normal".to_string(), "bump".to_string()]
}
fn default_suffixes() -> Vec<String> {
    vec!["_n".to_string(), "_nrm".to_string(), "_nm".to_string()]
}

impl Default for NormalMapHints {
    fn default() -> Self {
        Self {
            enabled: true,
            substrings: default_substrings(),
            suffixes: default_suffixes(),
        }
    }
}

impl NormalMapHints {
    /// Hints that never match.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Whether a file stem carries a normal-map hint.
    #[must_use]
    pub fn matches(&self, stem: &str) -> bool {
        if !self.enabled {
            return false;
        }
        let stem = stem.to_lowercase();
        self.substrings.iter().any(|s| stem.contains(s.as_str()))
            || self.suffixes.iter().any(|s| stem.ends_with(s.as_str()))
    }
}

/// Optimizer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Directory name that marks an asset root
    #[serde(default = "default_asset_root_marker")]
    pub asset_root_marker: String,
    /// Shared-storage directory created inside each asset root
    #[serde(default = "default_shared_dir_name")]
    pub shared_dir_name: String,
    #[serde(default = "default_texture_extension")]
    pub texture_extension: String,
    #[serde(default = "default_material_extension")]
    pub material_extension: String,
    /// Verify DXT1 one-bit-alpha conversions against the source pixels
    #[serde(default = "default_true")]
    pub lossless: bool,
    #[serde(default)]
    pub normal_map_hints: NormalMapHints,
    /// Persistent log of warnings and failures
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            asset_root_marker: default_asset_root_marker(),
            shared_dir_name: default_shared_dir_name(),
            texture_extension: default_texture_extension(),
            material_extension: default_material_extension(),
            lossless: true,
            normal_map_hints: NormalMapHints::default(),
            log_file: default_log_file(),
        }
    }
}

impl OptimizerConfig {
    /// Default config location (`<config dir>/vtfslim/config.toml`)
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("vtfslim").join("config.toml"))
    }

    /// Load a config file. Missing keys take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config = toml::from_str(&content)?;
        debug!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Load `path` if given, else the default location if it exists, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// Write the config as TOML, creating parent directories.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_file_takes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "shared_dir_name = \"dupes\"\nlossless = false\n").unwrap();

        let config = OptimizerConfig::load(&path).unwrap();
        assert_eq!(config.shared_dir_name, "dupes");
        assert!(!config.lossless);
        assert_eq!(config.asset_root_marker, "materials");
        assert_eq!(config.normal_map_hints, NormalMapHints::default());
    }

    #[test]
    fn test_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = OptimizerConfig {
            normal_map_hints: NormalMapHints::disabled(),
            ..OptimizerConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(OptimizerConfig::load_or_default(Some(&path)).unwrap(), config);
    }

    #[test]
    fn test_invalid_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "lossless = \"maybe\"").unwrap();
        assert!(matches!(
            OptimizerConfig::load(&path),
            Err(crate::Error::ConfigParse(_))
        ));
    }

    #[test]
    fn test_name_hints() {
        let hints = NormalMapHints::default();
        assert!(hints.matches("brick_Normal"));
        assert!(hints.matches("wall_bump01"));
        assert!(hints.matches("rock_n"));
        assert!(hints.matches("metal_NRM"));
        assert!(!hints.matches("rock_diffuse"));
        assert!(!hints.matches("nose"));
        assert!(!NormalMapHints::disabled().matches("rock_normal"));
    }
}
