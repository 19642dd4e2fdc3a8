//! The capabilities stores and sources advertise to each other
//!
//! A store never inspects concrete types. Anything handed to it is a
//! [`TextureSource`] or a [`ComposableStore`], and those expose narrower
//! capabilities through `as_*` accessors:
//!
//! - [`TextureSource::as_glyph_source`] - this source also provides glyphs
//! - [`GlyphSource::as_cache_consumer`] - this glyph source wants a [`CacheStorage`]
//! - [`ComposableStore::as_glyph_lookup`] - this store can resolve `(font, char)`
//! - [`ComposableStore::as_inheriting`] - this store takes an atlas and cache
//!   storage from the parent it is attached to
//!
//! Attach and detach logic dispatches on which accessors return `Some`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::atlas::TextureAtlas;
use crate::error::Result;
use crate::types::{
    CacheStorage, CharacterGlyph, LoadState, TextureRegion, TextureUpload, TexturedCharacterGlyph,
};

/// Anything that can hand out raw pixels for a texture name
///
/// ```ignore
/// struct Icons;
///
/// impl TextureSource for Icons {
///     fn get_upload(&self, name: &str) -> Option<TextureUpload> {
///         (name == "icons/close").then(|| close_icon())
///     }
/// }
/// ```
pub trait TextureSource: Send + Sync {
    /// Pixels for `name`, or `None` when this source doesn't know it
    fn get_upload(&self, name: &str) -> Option<TextureUpload>;

    /// Upgrade to a glyph source when the implementor is one
    fn as_glyph_source(self: Arc<Self>) -> Option<Arc<dyn GlyphSource>> {
        None
    }
}

/// One font's worth of glyphs
///
/// Sources are created outside the store, attached once and loaded once.
/// Until [`load`](GlyphSource::load) succeeds, `has_glyph` answers `false`
/// and `get` answers `None`; a failed load leaves it that way for good.
#[async_trait]
pub trait GlyphSource: TextureSource {
    /// Identifier used for matching lookups and naming glyph textures
    fn font_name(&self) -> &str;

    fn has_glyph(&self, character: char) -> bool;

    fn get(&self, character: char) -> Option<CharacterGlyph>;

    /// Bring the font's data in
    ///
    /// Implementations log their own failures before returning them.
    async fn load(&self) -> Result<()>;

    fn state(&self) -> LoadState;

    /// Sources that persist derived data expose their storage slot here
    fn as_cache_consumer(&self) -> Option<&dyn NeedsCacheStorage> {
        None
    }
}

/// A glyph source that can persist data in a [`CacheStorage`]
pub trait NeedsCacheStorage: Send + Sync {
    fn cache_storage(&self) -> Option<CacheStorage>;

    fn set_cache_storage(&self, storage: CacheStorage);
}

/// Resolves a character in an optionally named font into a textured glyph
pub trait TexturedGlyphLookup: Send + Sync {
    /// `None` (or an empty name) matches every font
    fn get(&self, font_name: Option<&str>, character: char) -> Option<Arc<TexturedCharacterGlyph>>;
}

/// A store that accepts an atlas and cache storage from its parent
pub trait InheritsSharedResources: Send + Sync {
    /// Adopt whichever of `atlas` / `storage` this store does not have yet
    ///
    /// Values already set, explicitly or by an earlier parent, are kept.
    fn inherit_shared(&self, atlas: Option<&Arc<TextureAtlas>>, storage: Option<&CacheStorage>);
}

/// A store that can be nested inside another store
pub trait ComposableStore: Send + Sync {
    /// Resolve a named texture through this store
    fn get_texture(&self, name: &str) -> Option<TextureRegion>;

    fn as_glyph_lookup(self: Arc<Self>) -> Option<Arc<dyn TexturedGlyphLookup>> {
        None
    }

    fn as_inheriting(&self) -> Option<&dyn InheritsSharedResources> {
        None
    }
}

/// Whether two handles point at the same object, whatever trait they're viewed through
pub fn same_object<A: ?Sized, B: ?Sized>(a: &Arc<A>, b: &Arc<B>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;

    impl TextureSource for Plain {
        fn get_upload(&self, _name: &str) -> Option<TextureUpload> {
            None
        }
    }

    #[test]
    fn plain_source_is_not_a_glyph_source() {
        let source: Arc<dyn TextureSource> = Arc::new(Plain);
        assert!(source.as_glyph_source().is_none());
    }

    #[test]
    fn same_object_sees_through_trait_views() {
        let concrete = Arc::new(Plain);
        let erased: Arc<dyn TextureSource> = concrete.clone();
        let other: Arc<dyn TextureSource> = Arc::new(Plain);

        assert!(same_object(&concrete, &erased));
        assert!(!same_object(&erased, &other));
    }
}
