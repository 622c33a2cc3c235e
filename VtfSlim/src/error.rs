//! Error types for `VtfSlim`

use std::path::PathBuf;

use thiserror::Error;

/// The error type for `VtfSlim` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory traversal error.
    #[error("directory walk error: {0}")]
    WalkDirError(String),

    // ==================== VTF Decode Errors ====================
    /// The file is not a VTF texture (missing `VTF\0` magic).
    #[error("invalid VTF magic: expected VTF\\0, found {0:?}")]
    InvalidVtfMagic([u8; 4]),

    /// The VTF version is not supported.
    #[error("unsupported VTF version: {major}.{minor} (supported: 7.0-7.5)")]
    UnsupportedVtfVersion {
        /// Major version found in the header.
        major: u32,
        /// Minor version found in the header.
        minor: u32,
    },

    /// The file ended before the data described by its header.
    #[error("VTF truncated: needed {needed} bytes, file has {available}")]
    VtfTruncated {
        /// Bytes required by the header.
        needed: usize,
        /// Bytes actually present.
        available: usize,
    },

    /// The VTF image format id is unknown or has no pixel codec.
    #[error("unsupported image format: {format}")]
    UnsupportedFormat {
        /// Format name or raw id.
        format: String,
    },

    /// The texture layout (faces, slices) is outside what the codec handles.
    #[error("unsupported texture layout: {0}")]
    UnsupportedLayout(String),

    /// A frame index past the end of the texture was requested.
    #[error("frame {frame} out of range (texture has {count})")]
    FrameOutOfRange {
        /// The requested frame.
        frame: usize,
        /// Number of frames in the texture.
        count: usize,
    },

    // ==================== Encode Errors ====================
    /// Pixel data could not be encoded to the requested format.
    #[error("failed to encode {format}: {message}")]
    EncodeFailed {
        /// Target format name.
        format: String,
        /// What went wrong.
        message: String,
    },

    /// The resize filter needs more precision than the current format stores.
    #[error("filter {filter} requires a float format, texture is {format}")]
    ResizePrecision {
        /// Filter name.
        filter: &'static str,
        /// Current format name.
        format: String,
    },

    /// Failed to create an image buffer from texel data.
    #[error("failed to create image buffer")]
    ImageBufferFailed,

    /// Failed to encode a PNG preview.
    #[error("failed to encode PNG: {0}")]
    PngEncodeFailed(#[from] image::ImageError),

    // ==================== Tree Operation Errors ====================
    /// The input directory is missing or not a directory.
    #[error("input is not a directory or does not exist: {0}")]
    InvalidInputDirectory(PathBuf),

    /// No asset-root directory was found under the input.
    #[error("no '{marker}' directory found under {input}")]
    MissingAssetRoot {
        /// The marker directory name searched for.
        marker: String,
        /// The input directory that was searched.
        input: PathBuf,
    },

    // ==================== Config Errors ====================
    /// The configuration file could not be parsed.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The configuration could not be serialized.
    #[error("config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// A pattern built from the parameter allowlist failed to compile.
    #[error("pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

// Add conversion from walkdir::Error
impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::WalkDirError(err.to_string())
    }
}

// Add conversion from tempfile::PersistError
impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::Io(err.error)
    }
}

impl Error {
    /// Whether this error came from reading a texture (corrupt or unsupported source).
    #[must_use]
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidVtfMagic(_)
                | Error::UnsupportedVtfVersion { .. }
                | Error::VtfTruncated { .. }
                | Error::UnsupportedFormat { .. }
                | Error::UnsupportedLayout(_)
                | Error::FrameOutOfRange { .. }
        )
    }
}

/// A specialized Result type for `VtfSlim` operations.
pub type Result<T> = std::result::Result<T, Error>;
