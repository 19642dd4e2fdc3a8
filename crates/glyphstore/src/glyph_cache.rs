//! Per-store memo of `(font name, character)` lookups
//!
//! Misses are cached alongside hits so an unknown character costs one tree
//! scan, not one per frame. Nothing is ever evicted or invalidated: glyph
//! sets are small and finite, and a source detached from its store keeps
//! answering through entries resolved while it was attached.

use std::sync::Arc;

use dashmap::DashMap;
use glyphstore_core::TexturedCharacterGlyph;

/// A resolved lookup: the glyph, or the knowledge that there is none
pub type CachedGlyph = Option<Arc<TexturedCharacterGlyph>>;

/// Cache key, with the font name exactly as the caller asked for it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GlyphCacheKey {
    pub font_name: Option<String>,
    pub character: char,
}

impl GlyphCacheKey {
    pub fn new(font_name: Option<&str>, character: char) -> Self {
        Self {
            font_name: font_name.map(str::to_owned),
            character,
        }
    }
}

/// Concurrent append-only lookup cache
#[derive(Default)]
pub struct GlyphLookupCache {
    entries: DashMap<GlyphCacheKey, CachedGlyph>,
}

impl GlyphLookupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Some(..)` when the key has been resolved before, even to a miss
    pub fn get(&self, key: &GlyphCacheKey) -> Option<CachedGlyph> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Record a resolution and return what the cache now holds
    ///
    /// Two callers racing on the same key both compute an answer; the first
    /// one stored wins and both get it back, so every caller shares one
    /// `Arc` per key.
    pub fn insert(&self, key: GlyphCacheKey, value: CachedGlyph) -> CachedGlyph {
        self.entries.entry(key).or_insert(value).value().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
