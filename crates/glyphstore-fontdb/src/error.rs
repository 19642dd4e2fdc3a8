//! Errors raised while turning a font file into glyph metrics

use std::path::PathBuf;

use glyphstore_core::{FontLoadError, GlyphStoreError};
use thiserror::Error;

/// Errors from font file loading and metric index caching.
#[derive(Debug, Error)]
pub enum FontFileError {
    #[error("Font not found: {path}")]
    FontNotFound { path: PathBuf },

    #[error("Font file too large: {path} ({size} bytes, max {max})")]
    FontTooLarge { path: PathBuf, size: u64, max: u64 },

    #[error("Failed to map font {path}: {source}")]
    Mmap {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid font {path}: {reason}")]
    InvalidFont { path: PathBuf, reason: String },

    #[error("Metric index {path} unusable: {reason}")]
    Index { path: PathBuf, reason: String },

    #[error("Font loader task failed: {0}")]
    Task(String),
}

impl From<FontFileError> for GlyphStoreError {
    fn from(err: FontFileError) -> Self {
        let load = match err {
            FontFileError::FontNotFound { path } => {
                FontLoadError::FileNotFound(path.display().to_string())
            },
            FontFileError::FontTooLarge { .. } => FontLoadError::NotSupported(err.to_string()),
            FontFileError::Index { .. } => FontLoadError::CacheStorage(err.to_string()),
            FontFileError::Task(reason) => return GlyphStoreError::Other(reason),
            other => FontLoadError::InvalidData(other.to_string()),
        };
        GlyphStoreError::FontLoad(load)
    }
}
