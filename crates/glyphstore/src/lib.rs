//! Glyphstore: one lookup over a whole tree of fonts
//!
//! Ask for `(font name, character)` and get back a glyph backed by a region
//! of a shared texture atlas, no matter which font in the tree provides it.
//!
//! ## How a lookup travels
//!
//! 1. The store checks its lookup cache. Hits, and remembered misses,
//!    return immediately.
//! 2. Its own glyph sources are searched in the order they were attached.
//!    A source matches when its name ends with the requested name (no name
//!    matches everything) and it has the character.
//! 3. Nested stores are asked next, again in attachment order.
//! 4. Whatever came back, glyph or nothing, is cached.
//!
//! ## How fonts load
//!
//! Attaching a glyph source queues its load on the store's
//! [`LoadSequencer`]. Loads on one store run one after another in
//! attachment order; separate stores load independently. A failing font is
//! logged and skipped, never retried, and lookups never wait for loading.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use glyphstore::{BitmapGlyph, BitmapGlyphSource, FontStore};
//! use glyphstore_core::{CharacterGlyph, StoreConfig, TextureUpload};
//!
//! # async fn demo() -> glyphstore_core::Result<()> {
//! let store = Arc::new(FontStore::new(StoreConfig::default())?);
//!
//! let a = BitmapGlyph::new(
//!     CharacterGlyph::new('A', 0.0, 0.0, 12.0, 16.0),
//!     TextureUpload::new(10, 14, vec![255; 140])?,
//! );
//! store.add_source(Arc::new(BitmapGlyphSource::new("Fonts/Sans", [a])));
//!
//! // ...once the source has loaded:
//! if let Some(glyph) = store.get(Some("Sans"), 'A') {
//!     assert_eq!(glyph.texture_key(), "Fonts/Sans/A");
//! }
//! # Ok(())
//! # }
//! ```

pub mod bitmap_source;
pub mod font_store;
pub mod glyph_cache;
pub mod load_queue;

pub use bitmap_source::{BitmapGlyph, BitmapGlyphSource};
pub use font_store::{FontStore, FontStoreBuilder};
pub use glyph_cache::{CachedGlyph, GlyphCacheKey, GlyphLookupCache};
pub use load_queue::LoadSequencer;
