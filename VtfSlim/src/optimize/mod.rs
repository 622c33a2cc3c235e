//! Per-texture optimizations
//!
//! Each operation reads one texture, decides from its pixels whether a
//! narrower encoding or a smaller size is safe, and writes the result to a
//! destination path. Failures never leave the destination missing: the
//! source is copied through unchanged instead.

pub mod classify;
pub mod fit;
pub mod output;
pub mod resize;

pub use classify::{average_normal_magnitude, is_normal_map, is_solid_color, magnitude_is_normal};
pub use fit::{AlphaProfile, FitDecision, alpha_profile, decide, fit_alpha};
pub use output::{FileOutcome, KeepReason, Plan, execute_plan};
pub use resize::{halve_normal, halved_dimensions, resize_preserving_format, shrink_solid};
