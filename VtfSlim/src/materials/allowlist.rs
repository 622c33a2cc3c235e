//! Texture-reference parameter allowlist
//!
//! The list ships in `data/texture_params.txt` and is compiled into the
//! crate. A `# version: N` header line identifies the revision.

use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};

use crate::error::Result;

const TEXTURE_PARAMS: &str = include_str!("../../data/texture_params.txt");

/// Parsed parameter allowlist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureParams {
    /// Revision from the `# version:` header, 0 if missing
    pub version: u32,
    /// Parameter names in file order, duplicates removed
    pub names: Vec<String>,
}

impl TextureParams {
    /// Parse allowlist text: one name per line, `#` comments, blank lines ignored.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut version = 0;
        let mut names: Vec<String> = Vec::new();

        for line in text.lines().map(str::trim) {
            if let Some(comment) = line.strip_prefix('#') {
                if let Some(v) = comment.trim().strip_prefix("version:") {
                    version = v.trim().parse().unwrap_or(0);
                }
                continue;
            }
            if line.is_empty() {
                continue;
            }
            let name = line.to_lowercase();
            if !names.contains(&name) {
                names.push(name);
            }
        }

        Self { version, names }
    }

    /// Build the `"$param" "path"` matcher for these names.
    ///
    /// Group 1 is the parameter name, group 2 the raw path. Quotes around the
    /// key are optional, the value must be quoted.
    pub fn build_regex(&self) -> Result<Regex> {
        let alternatives: Vec<String> = self.names.iter().map(|n| regex::escape(n)).collect();
        let pattern = format!(r#""?({})"?\s+"([^"]+)""#, alternatives.join("|"));
        Ok(RegexBuilder::new(&pattern).case_insensitive(true).build()?)
    }
}

/// The built-in allowlist.
pub fn texture_params() -> &'static TextureParams {
    static PARAMS: OnceLock<TextureParams> = OnceLock::new();
    PARAMS.get_or_init(|| TextureParams::parse(TEXTURE_PARAMS))
}

/// Matcher compiled from the built-in allowlist.
pub fn texture_param_regex() -> Result<&'static Regex> {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    if let Some(regex) = REGEX.get() {
        return Ok(regex);
    }
    let regex = texture_params().build_regex()?;
    Ok(REGEX.get_or_init(|| regex))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtin_list() {
        let params = texture_params();
        assert_eq!(params.version, 1);
        assert_eq!(params.names.len(), 88);
        assert_eq!(params.names[0], "$basetexture");
        assert!(params.names.iter().any(|n| n == "%tooltexture"));
    }

    #[test]
    fn test_parse_skips_comments_and_duplicates() {
        let params = TextureParams::parse("# version: 3\n\n$A\n$b\n$a\n");
        assert_eq!(params.version, 3);
        assert_eq!(params.names, vec!["$a".to_string(), "$b".to_string()]);
    }

    #[test]
    fn test_longer_names_are_not_shadowed() {
        let regex = texture_param_regex().unwrap();
        let caps = regex.captures("\"$detail2\" \"x/y\"").unwrap();
        assert_eq!(&caps[1], "$detail2");
        assert!(regex.captures("\"$basetexturetransform\" \"center .5 .5\"").is_none());
    }
}
