// this_file: crates/glyphstore-fontdb/src/font_file.rs

//! A glyph source backed by a TrueType/OpenType file on disk
//!
//! Loading memory-maps the file on tokio's blocking pool and measures every
//! mapped character at the source's pixel size. When the source has cache
//! storage, the measured index is written there and reused on later runs
//! as long as the font bytes are unchanged.
//!
//! The source provides metrics only. It uploads no textures, so its
//! glyphs resolve with no atlas region.

use std::fs::File;
use std::io::ErrorKind;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use glyphstore_core::{
    AtomicLoadState, CacheStorage, CharacterGlyph, FontLoadError, GlyphSource, LoadState,
    NeedsCacheStorage, Result, TextureSource, TextureUpload,
};
use memmap2::Mmap;
use parking_lot::Mutex;

use crate::error::FontFileError;
use crate::metrics_index::{hash_font_data, GlyphMetricsIndex};

/// Maximum font file size (50MB)
pub const MAX_FONT_SIZE: u64 = 50 * 1024 * 1024;

/// Pixel size glyphs are measured at unless configured otherwise
pub const DEFAULT_PIXEL_SIZE: f32 = 100.0;

pub struct FontFileSource {
    font_name: String,
    path: Utf8PathBuf,
    pixel_size: f32,
    state: AtomicLoadState,
    index: OnceLock<GlyphMetricsIndex>,
    storage: Mutex<Option<CacheStorage>>,
}

impl FontFileSource {
    /// A source named after the file stem, so `fonts/NotoSans.ttf` is `NotoSans`
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        let path = path.into();
        let font_name = path.file_stem().unwrap_or(path.as_str()).to_string();
        Self::with_name(font_name, path)
    }

    pub fn with_name(font_name: impl Into<String>, path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            font_name: font_name.into(),
            path: path.into(),
            pixel_size: DEFAULT_PIXEL_SIZE,
            state: AtomicLoadState::new(),
            index: OnceLock::new(),
            storage: Mutex::new(None),
        }
    }

    pub fn with_pixel_size(mut self, pixel_size: f32) -> Self {
        self.pixel_size = pixel_size;
        self
    }

    pub fn with_cache_storage(self, storage: CacheStorage) -> Self {
        *self.storage.lock() = Some(storage);
        self
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn pixel_size(&self) -> f32 {
        self.pixel_size
    }

    /// Number of characters the font maps, zero until loaded
    pub fn glyph_count(&self) -> usize {
        self.index.get().map_or(0, GlyphMetricsIndex::len)
    }

    fn map_font(path: &Utf8Path) -> std::result::Result<Mmap, FontFileError> {
        let std_path = path.as_std_path();
        let file = File::open(std_path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => FontFileError::FontNotFound {
                path: std_path.to_path_buf(),
            },
            _ => FontFileError::Mmap {
                path: std_path.to_path_buf(),
                source: e,
            },
        })?;

        let meta = file.metadata().map_err(|e| FontFileError::Mmap {
            path: std_path.to_path_buf(),
            source: e,
        })?;

        if meta.len() > MAX_FONT_SIZE {
            return Err(FontFileError::FontTooLarge {
                path: std_path.to_path_buf(),
                size: meta.len(),
                max: MAX_FONT_SIZE,
            });
        }

        // SAFETY: the map is read-only and dropped before the loader returns.
        #[allow(unsafe_code)]
        let mmap = unsafe {
            Mmap::map(&file).map_err(|e| FontFileError::Mmap {
                path: std_path.to_path_buf(),
                source: e,
            })?
        };

        Ok(mmap)
    }

    /// Blocking part of loading: reuse a stored index or measure the font
    fn read_index(
        font_name: &str,
        path: &Utf8Path,
        pixel_size: f32,
        storage: Option<&CacheStorage>,
    ) -> std::result::Result<GlyphMetricsIndex, FontFileError> {
        let mmap = Self::map_font(path)?;
        let source_hash = hash_font_data(&mmap);

        let Some(storage) = storage else {
            return GlyphMetricsIndex::build_hashed(
                &mmap,
                source_hash,
                pixel_size,
                path.as_std_path(),
            );
        };

        let index_path =
            GlyphMetricsIndex::storage_path(storage, font_name, &source_hash, pixel_size);
        match GlyphMetricsIndex::read_from(&index_path) {
            Ok(Some(index))
                if index.source_hash == source_hash
                    && index.pixel_size.to_bits() == pixel_size.to_bits() =>
            {
                log::debug!("Reusing glyph metrics for {} from {}", font_name, index_path);
                return Ok(index);
            },
            Ok(_) => {},
            Err(err) => log::warn!("Ignoring stored glyph metrics: {}", err),
        }

        let index =
            GlyphMetricsIndex::build_hashed(&mmap, source_hash, pixel_size, path.as_std_path())?;
        let stored = storage
            .ensure_exists()
            .map_err(|e| FontFileError::Index {
                path: storage.root().as_std_path().to_path_buf(),
                reason: e.to_string(),
            })
            .and_then(|()| index.write_to(&index_path));
        if let Err(err) = stored {
            log::warn!("Couldn't store glyph metrics for {}: {}", font_name, err);
        }
        Ok(index)
    }
}

impl std::fmt::Debug for FontFileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFileSource")
            .field("font_name", &self.font_name)
            .field("path", &self.path)
            .field("pixel_size", &self.pixel_size)
            .field("state", &self.state.get())
            .field("glyphs", &self.glyph_count())
            .finish()
    }
}

impl TextureSource for FontFileSource {
    fn get_upload(&self, _name: &str) -> Option<TextureUpload> {
        None
    }

    fn as_glyph_source(self: Arc<Self>) -> Option<Arc<dyn GlyphSource>> {
        Some(self)
    }
}

#[async_trait]
impl GlyphSource for FontFileSource {
    fn font_name(&self) -> &str {
        &self.font_name
    }

    fn has_glyph(&self, character: char) -> bool {
        self.index.get().is_some_and(|index| index.contains(character))
    }

    fn get(&self, character: char) -> Option<CharacterGlyph> {
        self.index.get()?.get(character).copied()
    }

    async fn load(&self) -> Result<()> {
        if let Err(state) = self.state.begin() {
            log::warn!("Font {} load requested while {:?}", self.font_name, state);
            return Err(FontLoadError::AlreadyLoaded(self.font_name.clone()).into());
        }

        let font_name = self.font_name.clone();
        let path = self.path.clone();
        let pixel_size = self.pixel_size;
        let storage = self.cache_storage();

        let result = tokio::task::spawn_blocking(move || {
            Self::read_index(&font_name, &path, pixel_size, storage.as_ref())
        })
        .await
        .map_err(|e| FontFileError::Task(e.to_string()))
        .and_then(std::convert::identity);

        match result {
            Ok(index) => {
                log::debug!("Font {} maps {} characters", self.font_name, index.len());
                let _ = self.index.set(index);
                self.state.set(LoadState::Loaded);
                Ok(())
            },
            Err(err) => {
                log::warn!("Couldn't load font {}: {}", self.font_name, err);
                self.state.set(LoadState::Failed);
                Err(err.into())
            },
        }
    }

    fn state(&self) -> LoadState {
        self.state.get()
    }

    fn as_cache_consumer(&self) -> Option<&dyn NeedsCacheStorage> {
        Some(self)
    }
}

impl NeedsCacheStorage for FontFileSource {
    fn cache_storage(&self) -> Option<CacheStorage> {
        self.storage.lock().clone()
    }

    fn set_cache_storage(&self, storage: CacheStorage) {
        *self.storage.lock() = Some(storage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_defaults_to_file_stem() {
        let source = FontFileSource::new("fonts/NotoSans-Regular.ttf");
        assert_eq!(source.font_name(), "NotoSans-Regular");
        assert_eq!(source.pixel_size(), DEFAULT_PIXEL_SIZE);
        assert_eq!(source.state(), LoadState::Unloaded);
    }

    #[test]
    fn map_font_reports_missing_file() {
        let result = FontFileSource::map_font(Utf8Path::new("/nonexistent/font.ttf"));
        assert!(matches!(result, Err(FontFileError::FontNotFound { .. })));
    }

    #[test]
    fn no_glyphs_before_load() {
        let source = FontFileSource::new("Sans.ttf");
        assert!(!source.has_glyph('A'));
        assert!(source.get('A').is_none());
        assert!(source.get_upload("Sans/A").is_none());
    }
}
