//! Glyphstore Core: the vocabulary shared by glyph sources and stores
//!
//! A font tree resolves `(font name, character)` into a glyph whose pixels
//! live somewhere in a shared texture atlas. This crate holds the pieces
//! every part of that tree agrees on:
//!
//! - [`types`] - glyph metrics, texture uploads and regions, load state
//! - [`traits`] - the capabilities sources and stores expose to each other
//! - [`atlas`] - the shared row-packing [`TextureAtlas`]
//! - [`texture_store`] - named texture lookup, the base every font store builds on
//! - [`config`] - [`StoreConfig`] and its environment overrides
//! - [`error`] - [`GlyphStoreError`] and friends
//!
//! The composite font store itself lives in the `glyphstore` crate.

pub mod atlas;
pub mod config;
pub mod error;
pub mod texture_store;
pub mod traits;
pub mod types;

pub use atlas::TextureAtlas;
pub use config::StoreConfig;
pub use error::{AtlasError, FontLoadError, GlyphStoreError, Result};
pub use texture_store::TextureStore;
pub use traits::{
    ComposableStore, GlyphSource, InheritsSharedResources, NeedsCacheStorage, TextureSource,
    TexturedGlyphLookup,
};
pub use types::{
    AtomicLoadState, CacheStorage, CharacterGlyph, LoadState, TextureId, TextureRegion,
    TextureUpload, TexturedCharacterGlyph,
};
