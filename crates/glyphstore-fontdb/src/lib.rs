//! Font files as glyph sources
//!
//! [`FontFileSource`] memory-maps a TrueType/OpenType file and indexes the
//! metrics of every character it maps. With cache storage inherited from
//! its store, the index survives between runs.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use glyphstore::FontStore;
//! use glyphstore_core::{CacheStorage, StoreConfig};
//! use glyphstore_fontdb::FontFileSource;
//!
//! # async fn demo() -> glyphstore_core::Result<()> {
//! let store = FontStore::builder()
//!     .config(StoreConfig::default())
//!     .cache_storage(CacheStorage::new("/tmp/glyphstore"))
//!     .build()?;
//! store.add_source(Arc::new(FontFileSource::new("fonts/NotoSans-Regular.ttf")));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod font_file;
pub mod metrics_index;

pub use error::FontFileError;
pub use font_file::{FontFileSource, DEFAULT_PIXEL_SIZE, MAX_FONT_SIZE};
pub use metrics_index::{hash_font_data, GlyphMetricsIndex};
