// this_file: crates/glyphstore/src/font_store.rs

//! The composite font store.
//!
//! A [`FontStore`] owns glyph sources and nests other stores, presenting the
//! whole tree as one namespace. Lookups search own sources first, then
//! nested stores, and memoize the answer. Attaching a glyph source queues
//! its load behind every load already queued on the same store.

use std::sync::Arc;

use glyphstore_core::traits::same_object;
use glyphstore_core::{
    CacheStorage, ComposableStore, GlyphSource, GlyphStoreError, InheritsSharedResources, Result,
    StoreConfig, TextureAtlas, TextureRegion, TextureSource, TextureStore, TexturedCharacterGlyph,
    TexturedGlyphLookup,
};
use parking_lot::RwLock;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::glyph_cache::{CachedGlyph, GlyphCacheKey, GlyphLookupCache};
use crate::load_queue::LoadSequencer;

/// A node in a tree of font stores
///
/// ```ignore
/// let root = Arc::new(FontStore::new(StoreConfig::default())?);
/// let icons = Arc::new(FontStore::builder().without_atlas().build()?);
///
/// root.add_store(icons.clone()); // icons now packs into root's atlas
/// root.add_source(Arc::new(BitmapGlyphSource::new("Fonts/Sans", glyphs)));
///
/// let glyph = root.get(Some("Sans"), 'A');
/// ```
pub struct FontStore {
    textures: TextureStore,
    glyph_sources: RwLock<Vec<Arc<dyn GlyphSource>>>,
    nested: RwLock<Vec<Arc<dyn TexturedGlyphLookup>>>,
    cache_storage: RwLock<Option<CacheStorage>>,
    glyph_cache: GlyphLookupCache,
    loads: LoadSequencer,
}

impl FontStore {
    /// Build a store from a configuration on the ambient tokio runtime
    pub fn new(config: StoreConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    pub fn builder() -> FontStoreBuilder {
        FontStoreBuilder::default()
    }

    pub fn scale_adjust(&self) -> f32 {
        self.textures.scale_adjust()
    }

    pub fn atlas(&self) -> Option<Arc<TextureAtlas>> {
        self.textures.atlas()
    }

    pub fn cache_storage(&self) -> Option<CacheStorage> {
        self.cache_storage.read().clone()
    }

    /// The underlying named-texture store
    pub fn textures(&self) -> &TextureStore {
        &self.textures
    }

    /// Glyph sources in search order
    pub fn glyph_sources(&self) -> Vec<Arc<dyn GlyphSource>> {
        self.glyph_sources.read().clone()
    }

    pub fn nested_count(&self) -> usize {
        self.nested.read().len()
    }

    /// Number of `(font, character)` lookups resolved so far, misses included
    pub fn cached_lookups(&self) -> usize {
        self.glyph_cache.len()
    }

    /// Register a texture source
    ///
    /// Glyph sources are additionally tracked for lookups, handed this
    /// store's cache storage if they want one and have none, and queued
    /// for loading. Every source also resolves plain texture names.
    pub fn add_source(&self, source: Arc<dyn TextureSource>) {
        if let Some(glyphs) = Arc::clone(&source).as_glyph_source() {
            if let Some(consumer) = glyphs.as_cache_consumer() {
                if consumer.cache_storage().is_none() {
                    if let Some(storage) = self.cache_storage() {
                        consumer.set_cache_storage(storage);
                    }
                }
            }

            self.glyph_sources.write().push(Arc::clone(&glyphs));
            self.loads.queue(glyphs);
        }

        self.textures.add_source(source);
    }

    /// Stop searching a source
    ///
    /// A load in flight still finishes, and lookups already cached keep
    /// returning what this source provided.
    pub fn remove_source(&self, source: &Arc<dyn TextureSource>) {
        self.glyph_sources
            .write()
            .retain(|existing| !same_object(existing, source));

        self.textures.remove_source(source);
    }

    /// Nest another store
    ///
    /// Stores that inherit shared resources take this store's atlas and
    /// cache storage where they have none; this happens only now, never
    /// again later. Stores that can look up glyphs join the fallback search.
    pub fn add_store(&self, store: Arc<dyn ComposableStore>) {
        if let Some(inheriting) = store.as_inheriting() {
            inheriting.inherit_shared(self.atlas().as_ref(), self.cache_storage().as_ref());
        }

        if let Some(lookup) = Arc::clone(&store).as_glyph_lookup() {
            self.nested.write().push(lookup);
        }

        self.textures.add_store(store);
    }

    /// Un-nest a store; its own state and cache are untouched
    pub fn remove_store(&self, store: &Arc<dyn ComposableStore>) {
        self.nested
            .write()
            .retain(|existing| !same_object(existing, store));

        self.textures.remove_store(store);
    }

    /// Resolve a character, optionally restricted to fonts whose name ends with `font_name`
    ///
    /// Never waits for loads: a source that hasn't finished loading simply
    /// doesn't have the glyph yet. The answer, including "not found", is
    /// cached for the lifetime of the store.
    pub fn get(&self, font_name: Option<&str>, character: char) -> CachedGlyph {
        let key = GlyphCacheKey::new(font_name, character);

        if let Some(cached) = self.glyph_cache.get(&key) {
            return cached;
        }

        let resolved = self.resolve(font_name, character);
        self.glyph_cache.insert(key, resolved)
    }

    /// [`get`](Self::get) on the runtime's blocking pool
    pub fn get_async(self: &Arc<Self>, font_name: Option<String>, character: char) -> JoinHandle<CachedGlyph> {
        let store = Arc::clone(self);
        self.loads
            .runtime()
            .spawn_blocking(move || store.get(font_name.as_deref(), character))
    }

    fn resolve(&self, font_name: Option<&str>, character: char) -> CachedGlyph {
        let wanted = font_name.unwrap_or_default();

        let sources = self.glyph_sources.read().clone();
        for source in &sources {
            if !source.font_name().ends_with(wanted) || !source.has_glyph(character) {
                continue;
            }

            let Some(glyph) = source.get(character) else {
                continue;
            };

            let texture_key = format!("{}/{}", source.font_name(), character);
            let texture = self.textures.get(&texture_key);

            return Some(Arc::new(TexturedCharacterGlyph::new(
                glyph,
                texture_key,
                texture,
                1.0 / self.scale_adjust(),
            )));
        }

        let nested = self.nested.read().clone();
        nested
            .iter()
            .find_map(|store| store.get(font_name, character))
    }
}

impl TexturedGlyphLookup for FontStore {
    fn get(&self, font_name: Option<&str>, character: char) -> CachedGlyph {
        FontStore::get(self, font_name, character)
    }
}

impl InheritsSharedResources for FontStore {
    fn inherit_shared(&self, atlas: Option<&Arc<TextureAtlas>>, storage: Option<&CacheStorage>) {
        if let Some(atlas) = atlas {
            self.textures.inherit_atlas(atlas);
        }

        if let Some(storage) = storage {
            let mut slot = self.cache_storage.write();
            if slot.is_none() {
                *slot = Some(storage.clone());
            }
        }
    }
}

impl ComposableStore for FontStore {
    fn get_texture(&self, name: &str) -> Option<TextureRegion> {
        self.textures.get(name)
    }

    fn as_glyph_lookup(self: Arc<Self>) -> Option<Arc<dyn TexturedGlyphLookup>> {
        Some(self)
    }

    fn as_inheriting(&self) -> Option<&dyn InheritsSharedResources> {
        Some(self)
    }
}

impl std::fmt::Debug for FontStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontStore")
            .field("scale_adjust", &self.scale_adjust())
            .field("glyph_sources", &self.glyph_sources.read().len())
            .field("nested", &self.nested_count())
            .field("cached_lookups", &self.cached_lookups())
            .field("loads", &self.loads)
            .finish()
    }
}

/// Step-by-step construction of a [`FontStore`]
#[derive(Default)]
pub struct FontStoreBuilder {
    config: StoreConfig,
    atlas: Option<Arc<TextureAtlas>>,
    cache_storage: Option<CacheStorage>,
    runtime: Option<Handle>,
}

impl FontStoreBuilder {
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn scale_adjust(mut self, scale_adjust: f32) -> Self {
        self.config.scale_adjust = scale_adjust;
        self
    }

    /// Share an existing atlas instead of creating one
    pub fn atlas(mut self, atlas: Arc<TextureAtlas>) -> Self {
        self.atlas = Some(atlas);
        self
    }

    /// Start without an atlas, to inherit the parent's when nested
    pub fn without_atlas(mut self) -> Self {
        self.config.use_atlas = false;
        self.atlas = None;
        self
    }

    pub fn cache_storage(mut self, storage: CacheStorage) -> Self {
        self.cache_storage = Some(storage);
        self
    }

    /// Run loads on this runtime instead of the ambient one
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn build(self) -> Result<FontStore> {
        self.config.validate()?;

        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|_| GlyphStoreError::NoRuntime)?,
        };

        let atlas = self
            .atlas
            .or_else(|| self.config.build_atlas().map(Arc::new));

        let textures = match atlas {
            Some(atlas) => TextureStore::with_atlas(self.config.scale_adjust, atlas),
            None => TextureStore::new(self.config.scale_adjust),
        };

        Ok(FontStore {
            textures,
            glyph_sources: RwLock::new(Vec::new()),
            nested: RwLock::new(Vec::new()),
            cache_storage: RwLock::new(self.cache_storage),
            glyph_cache: GlyphLookupCache::new(),
            loads: LoadSequencer::new(runtime),
        })
    }
}
