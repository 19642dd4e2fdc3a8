//! Error types for glyphstore

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GlyphStoreError>;

/// Main error type for glyphstore
#[derive(Debug, Error)]
pub enum GlyphStoreError {
    #[error("Font loading failed: {0}")]
    FontLoad(#[from] FontLoadError),

    #[error("Atlas allocation failed: {0}")]
    Atlas(#[from] AtlasError),

    #[error("No async runtime available to queue font loads")]
    NoRuntime,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Other error: {0}")]
    Other(String),
}

/// Font loading errors
#[derive(Debug, Error)]
pub enum FontLoadError {
    #[error("Font file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid font data: {0}")]
    InvalidData(String),

    #[error("Font not supported: {0}")]
    NotSupported(String),

    #[error("Font {0} was already loaded")]
    AlreadyLoaded(String),

    #[error("Glyph cache storage error: {0}")]
    CacheStorage(String),
}

/// Atlas allocation errors
#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("Upload of {width}x{height} does not fit a {page_size}x{page_size} atlas page")]
    TooLarge {
        width: u32,
        height: u32,
        page_size: u32,
    },

    #[error("Upload data is {actual} bytes, expected {expected}")]
    DataSizeMismatch { expected: usize, actual: usize },
}
