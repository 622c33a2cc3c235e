//! CLI command implementations

pub mod cleanup;
pub mod dedup;
pub mod definitions;
pub mod execute;
pub mod materials;
pub mod texture;

pub use definitions::Commands;

use serde::Serialize;

/// Print `value` as pretty JSON on stdout
pub(crate) fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print failure messages under a heading, if any
pub(crate) fn print_failures<'a>(failures: impl IntoIterator<Item = &'a String>) {
    let failures: Vec<_> = failures.into_iter().collect();
    if failures.is_empty() {
        return;
    }
    println!();
    println!("Failures:");
    for msg in failures {
        println!("  {msg}");
    }
}

/// Format byte size for display
pub(crate) fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
