//! Redirecting material references to shared storage

use std::collections::HashMap;

use regex::RegexBuilder;

use super::index::ContentHash;
use crate::error::Result;
use crate::materials::extract_references;

/// Outcome of rewriting one material's text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteResult {
    /// Text with backslashes canonicalized and references redirected
    pub text: String,
    pub substitutions: usize,
    /// Whether the input contained backslashes
    pub had_backslashes: bool,
}

impl RewriteResult {
    /// Whether the file should be written back.
    #[must_use]
    pub fn needs_write(&self) -> bool {
        self.substitutions > 0 || self.had_backslashes
    }
}

/// Strip a trailing `.ext` from a normalized reference.
#[must_use]
pub fn reference_key<'a>(path: &'a str, texture_extension: &str) -> &'a str {
    let suffix = format!(".{}", texture_extension.to_lowercase());
    path.strip_suffix(suffix.as_str()).unwrap_or(path)
}

/// Rewrite every reference in `text` that names a key of `duplicates`.
///
/// The first case-insensitive occurrence of the quoted path becomes
/// `"<shared_dir>/<digest>"` and `// Original: <path>` is appended to the end
/// of its line.
pub fn rewrite_material_text(
    text: &str,
    duplicates: &HashMap<String, ContentHash>,
    shared_dir: &str,
    texture_extension: &str,
) -> Result<RewriteResult> {
    let had_backslashes = text.contains('\\');
    let mut text = text.replace('\\', "/");
    let mut substitutions = 0;

    for reference in extract_references(&text)? {
        let Some(hash) = duplicates.get(reference_key(&reference.path, texture_extension)) else {
            continue;
        };

        let pattern = RegexBuilder::new(&format!(
            r#""\s*{}\s*""#,
            regex::escape(&reference.path)
        ))
        .case_insensitive(true)
        .build()?;
        let Some(found) = pattern.find(&text) else {
            continue;
        };
        let (start, end) = (found.start(), found.end());

        let replacement = format!("\"{shared_dir}/{hash}\"");
        text.replace_range(start..end, &replacement);

        let after = start + replacement.len();
        let mut line_end = text[after..].find('\n').map_or(text.len(), |i| after + i);
        if line_end > after && text.as_bytes()[line_end - 1] == b'\r' {
            line_end -= 1;
        }
        text.insert_str(line_end, &format!(" // Original: {}", reference.path));
        substitutions += 1;
    }

    Ok(RewriteResult {
        text,
        substitutions,
        had_backslashes,
    })
}
