//! Pre-rasterized glyphs held in memory
//!
//! The simplest glyph source there is: a bitmap font whose glyph metrics
//! and coverage bitmaps are handed over at construction. Loading validates
//! every bitmap against its metrics and publishes the set; until then the
//! source has no glyphs.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use glyphstore_core::{
    AtomicLoadState, CharacterGlyph, FontLoadError, GlyphSource, LoadState, Result, TextureSource,
    TextureUpload,
};
use parking_lot::Mutex;

/// One glyph: its metrics and its coverage
#[derive(Debug, Clone)]
pub struct BitmapGlyph {
    pub metrics: CharacterGlyph,
    pub bitmap: TextureUpload,
}

impl BitmapGlyph {
    pub fn new(metrics: CharacterGlyph, bitmap: TextureUpload) -> Self {
        Self { metrics, bitmap }
    }
}

/// A glyph source over in-memory bitmaps
pub struct BitmapGlyphSource {
    font_name: String,
    pending: Mutex<Option<Vec<BitmapGlyph>>>,
    glyphs: OnceLock<HashMap<char, BitmapGlyph>>,
    state: AtomicLoadState,
}

impl BitmapGlyphSource {
    pub fn new(font_name: impl Into<String>, glyphs: impl IntoIterator<Item = BitmapGlyph>) -> Self {
        Self {
            font_name: font_name.into(),
            pending: Mutex::new(Some(glyphs.into_iter().collect())),
            glyphs: OnceLock::new(),
            state: AtomicLoadState::new(),
        }
    }

    /// Checks bitmaps against metrics, filling in missing ink sizes
    fn index(&self, glyphs: Vec<BitmapGlyph>) -> std::result::Result<HashMap<char, BitmapGlyph>, FontLoadError> {
        let mut index = HashMap::with_capacity(glyphs.len());

        for mut glyph in glyphs {
            let (width, height) = (glyph.bitmap.width() as f32, glyph.bitmap.height() as f32);

            if glyph.metrics.width == 0.0 && glyph.metrics.height == 0.0 {
                glyph.metrics.width = width;
                glyph.metrics.height = height;
            } else if glyph.metrics.width != width || glyph.metrics.height != height {
                return Err(FontLoadError::InvalidData(format!(
                    "glyph {:?} in {} is {}x{} but its bitmap is {}x{}",
                    glyph.metrics.character,
                    self.font_name,
                    glyph.metrics.width,
                    glyph.metrics.height,
                    width,
                    height
                )));
            }

            index.insert(glyph.metrics.character, glyph);
        }

        Ok(index)
    }

    fn glyph(&self, character: char) -> Option<&BitmapGlyph> {
        self.glyphs.get()?.get(&character)
    }
}

impl TextureSource for BitmapGlyphSource {
    fn get_upload(&self, name: &str) -> Option<TextureUpload> {
        let rest = name.strip_prefix(self.font_name.as_str())?.strip_prefix('/')?;

        let mut chars = rest.chars();
        let character = chars.next()?;
        if chars.next().is_some() {
            return None;
        }

        self.glyph(character).map(|glyph| glyph.bitmap.clone())
    }

    fn as_glyph_source(self: Arc<Self>) -> Option<Arc<dyn GlyphSource>> {
        Some(self)
    }
}

#[async_trait]
impl GlyphSource for BitmapGlyphSource {
    fn font_name(&self) -> &str {
        &self.font_name
    }

    fn has_glyph(&self, character: char) -> bool {
        self.glyph(character).is_some()
    }

    fn get(&self, character: char) -> Option<CharacterGlyph> {
        self.glyph(character).map(|glyph| glyph.metrics)
    }

    async fn load(&self) -> Result<()> {
        if let Err(state) = self.state.begin() {
            log::warn!("Font {} load requested while {:?}", self.font_name, state);
            return Err(FontLoadError::AlreadyLoaded(self.font_name.clone()).into());
        }

        let glyphs = self.pending.lock().take().unwrap_or_default();

        match self.index(glyphs) {
            Ok(index) => {
                log::debug!("Font {} has {} bitmap glyphs", self.font_name, index.len());
                let _ = self.glyphs.set(index);
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
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(c: char, width: u32, height: u32) -> BitmapGlyph {
        BitmapGlyph::new(
            CharacterGlyph::new(c, 1.0, 2.0, width as f32 + 2.0, 80.0),
            TextureUpload::new(width, height, vec![200; (width * height) as usize]).unwrap(),
        )
    }

    #[tokio::test]
    async fn glyphs_appear_only_after_load() {
        let source = BitmapGlyphSource::new("Fonts/Sans", [glyph('A', 4, 6)]);

        assert!(!source.has_glyph('A'));
        assert!(source.get_upload("Fonts/Sans/A").is_none());
        assert_eq!(source.state(), LoadState::Unloaded);

        source.load().await.unwrap();

        assert_eq!(source.state(), LoadState::Loaded);
        assert!(source.has_glyph('A'));
        assert!(!source.has_glyph('B'));
        let metrics = source.get('A').unwrap();
        assert_eq!((metrics.width, metrics.height), (4.0, 6.0));
    }

    #[tokio::test]
    async fn uploads_are_named_font_slash_character() {
        let source = BitmapGlyphSource::new("Fonts/Sans", [glyph('/', 2, 2)]);
        source.load().await.unwrap();

        assert!(source.get_upload("Fonts/Sans//").is_some());
        assert!(source.get_upload("Fonts/Sans/").is_none());
        assert!(source.get_upload("Fonts/Sans//x").is_none());
        assert!(source.get_upload("Fonts/Serif//").is_none());
    }

    #[tokio::test]
    async fn mismatched_metrics_fail_the_load() {
        let mut bad = glyph('A', 4, 6);
        bad.metrics = bad.metrics.with_size(5.0, 6.0);
        let source = BitmapGlyphSource::new("Broken", [bad]);

        assert!(source.load().await.is_err());
        assert_eq!(source.state(), LoadState::Failed);
        assert!(!source.has_glyph('A'));
    }

    #[tokio::test]
    async fn second_load_is_rejected() {
        let source = BitmapGlyphSource::new("Once", [glyph('A', 1, 1)]);
        source.load().await.unwrap();

        assert!(source.load().await.is_err());
        assert_eq!(source.state(), LoadState::Loaded);
    }
}
