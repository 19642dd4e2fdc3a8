// this_file: crates/glyphstore-core/src/texture_store.rs

//! Named texture lookup over a list of sources and nested stores.
//!
//! A texture name resolves to the first source that can produce pixels for
//! it, falling back to nested stores in attachment order. Resolved regions
//! are memoized per name so a texture is placed in the atlas once.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;

use crate::atlas::TextureAtlas;
use crate::config::DEFAULT_SCALE_ADJUST;
use crate::traits::{same_object, ComposableStore, TextureSource};
use crate::types::{TextureRegion, TextureUpload};

/// Registry of texture providers with memoized name resolution
pub struct TextureStore {
    sources: RwLock<Vec<Arc<dyn TextureSource>>>,
    stores: RwLock<Vec<Arc<dyn ComposableStore>>>,
    atlas: RwLock<Option<Arc<TextureAtlas>>>,
    regions: DashMap<String, TextureRegion>,
    scale_adjust: f32,
}

impl TextureStore {
    /// An empty store that places textures standalone until given an atlas
    pub fn new(scale_adjust: f32) -> Self {
        Self {
            sources: RwLock::new(Vec::new()),
            stores: RwLock::new(Vec::new()),
            atlas: RwLock::new(None),
            regions: DashMap::new(),
            scale_adjust,
        }
    }

    pub fn with_atlas(scale_adjust: f32, atlas: Arc<TextureAtlas>) -> Self {
        let store = Self::new(scale_adjust);
        *store.atlas.write() = Some(atlas);
        store
    }

    pub fn scale_adjust(&self) -> f32 {
        self.scale_adjust
    }

    pub fn atlas(&self) -> Option<Arc<TextureAtlas>> {
        self.atlas.read().clone()
    }

    /// Sets the atlas unless one is already there; returns whether it was taken
    pub fn inherit_atlas(&self, atlas: &Arc<TextureAtlas>) -> bool {
        let mut slot = self.atlas.write();
        if slot.is_some() {
            return false;
        }
        *slot = Some(Arc::clone(atlas));
        true
    }

    pub fn add_source(&self, source: Arc<dyn TextureSource>) {
        self.sources.write().push(source);
    }

    /// Detaches by identity; regions already resolved stay cached
    pub fn remove_source(&self, source: &Arc<dyn TextureSource>) {
        self.sources.write().retain(|s| !same_object(s, source));
    }

    pub fn add_store(&self, store: Arc<dyn ComposableStore>) {
        self.stores.write().push(store);
    }

    pub fn remove_store(&self, store: &Arc<dyn ComposableStore>) {
        self.stores.write().retain(|s| !same_object(s, store));
    }

    pub fn source_count(&self) -> usize {
        self.sources.read().len()
    }

    pub fn store_count(&self) -> usize {
        self.stores.read().len()
    }

    /// Resolve a texture by name
    ///
    /// Only hits are memoized: a source that is still loading may be able
    /// to answer the same name later.
    pub fn get(&self, name: &str) -> Option<TextureRegion> {
        if let Some(region) = self.regions.get(name) {
            return Some(*region);
        }

        match self.regions.entry(name.to_string()) {
            Entry::Occupied(entry) => Some(*entry.get()),
            Entry::Vacant(entry) => {
                let region = self.resolve(name)?;
                entry.insert(region);
                Some(region)
            },
        }
    }

    fn resolve(&self, name: &str) -> Option<TextureRegion> {
        // Snapshots keep the lists unlocked while sources do their work
        let sources = self.sources.read().clone();
        for source in &sources {
            if let Some(upload) = source.get_upload(name) {
                return Some(self.place(name, &upload));
            }
        }

        let stores = self.stores.read().clone();
        stores.iter().find_map(|store| store.get_texture(name))
    }

    fn place(&self, name: &str, upload: &TextureUpload) -> TextureRegion {
        let Some(atlas) = self.atlas() else {
            return TextureRegion::standalone(upload.width(), upload.height());
        };

        match atlas.allocate(upload) {
            Ok(region) => region,
            Err(err) => {
                log::warn!("Texture {name} bypasses the atlas: {err}");
                TextureRegion::standalone(upload.width(), upload.height())
            },
        }
    }
}

impl Default for TextureStore {
    fn default() -> Self {
        Self::new(DEFAULT_SCALE_ADJUST)
    }
}

impl ComposableStore for TextureStore {
    fn get_texture(&self, name: &str) -> Option<TextureRegion> {
        self.get(name)
    }
}
