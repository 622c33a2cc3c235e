//! Progress reporting for tree-wide operations

/// Progress information during an optimization pass
#[derive(Debug, Clone)]
pub struct OptimizeProgress {
    /// Current operation phase
    pub phase: OptimizePhase,
    /// Current item number (1-indexed)
    pub current: usize,
    /// Total number of items
    pub total: usize,
    /// Current file being processed (if applicable)
    pub current_file: Option<String>,
}

impl OptimizeProgress {
    /// Create a new progress update
    #[must_use]
    pub fn new(phase: OptimizePhase, current: usize, total: usize) -> Self {
        Self {
            phase,
            current,
            total,
            current_file: None,
        }
    }

    /// Create a progress update with a file/item name
    #[must_use]
    pub fn with_file(
        phase: OptimizePhase,
        current: usize,
        total: usize,
        file: impl Into<String>,
    ) -> Self {
        Self {
            phase,
            current,
            total,
            current_file: Some(file.into()),
        }
    }

    /// Get the progress percentage (0.0 - 1.0)
    #[must_use]
    pub fn percentage(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.current as f32 / self.total as f32
        }
    }
}

/// Phase of an optimization pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizePhase {
    /// Enumerating files under the input
    ScanningFiles,
    /// Running a per-texture operation
    ProcessingTextures,
    /// Hashing textures for duplicate detection
    HashingTextures,
    /// Copying canonical duplicates into shared storage
    CopyingShared,
    /// Deleting redundant originals
    RemovingDuplicates,
    /// Rewriting material references
    RewritingMaterials,
    /// Deleting or mirroring files during cleanup
    PruningFiles,
    /// Operation complete
    Complete,
}

impl OptimizePhase {
    /// Get a human-readable description of this phase
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ScanningFiles => "Scanning files",
            Self::ProcessingTextures => "Processing textures",
            Self::HashingTextures => "Hashing textures",
            Self::CopyingShared => "Copying shared textures",
            Self::RemovingDuplicates => "Removing duplicates",
            Self::RewritingMaterials => "Rewriting materials",
            Self::PruningFiles => "Pruning files",
            Self::Complete => "Complete",
        }
    }
}

/// Progress callback type for optimization passes
pub type OptimizeProgressCallback<'a> = &'a (dyn Fn(&OptimizeProgress) + Sync + Send);

/// Callback that ignores every update
pub fn no_progress(_: &OptimizeProgress) {}
