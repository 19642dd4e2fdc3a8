// this_file: crates/glyphstore-fontdb/src/metrics_index.rs

//! Per-character glyph metrics extracted from a font, and their on-disk form.
//!
//! Walking a font's character map and measuring every glyph is the slow
//! part of loading. The result only depends on the font bytes and the
//! pixel size, so it is stored as JSON in the cache storage, keyed by a hash
//! of the font data, and reused on the next load.

use std::collections::HashMap;
use std::path::Path;

use camino::Utf8PathBuf;
use glyphstore_core::{CacheStorage, CharacterGlyph};
use read_fonts::FileRef;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use skrifa::instance::{LocationRef, Size};
use skrifa::metrics::BoundingBox;
use skrifa::MetadataProvider;

use crate::error::FontFileError;

/// Hex SHA-256 of a font's bytes, stable across runs and toolchains
pub fn hash_font_data(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Metrics of one glyph from its advance and ink box
///
/// An absent or empty box means the glyph has no ink, like the space.
fn measure(
    character: char,
    advance: f32,
    ascent: f32,
    bounds: Option<BoundingBox>,
) -> CharacterGlyph {
    match bounds.filter(|b| b.x_max > b.x_min || b.y_max > b.y_min) {
        Some(b) => CharacterGlyph::new(character, b.x_min, ascent - b.y_max, advance, ascent)
            .with_size(b.x_max - b.x_min, b.y_max - b.y_min),
        None => CharacterGlyph::new(character, 0.0, 0.0, advance, ascent),
    }
}

/// Every mapped character of one font face, measured at one pixel size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphMetricsIndex {
    pub source_hash: String,
    pub pixel_size: f32,
    glyphs: HashMap<char, CharacterGlyph>,
}

impl GlyphMetricsIndex {
    pub fn from_glyphs(
        source_hash: impl Into<String>,
        pixel_size: f32,
        glyphs: impl IntoIterator<Item = CharacterGlyph>,
    ) -> Self {
        Self {
            source_hash: source_hash.into(),
            pixel_size,
            glyphs: glyphs.into_iter().map(|g| (g.character, g)).collect(),
        }
    }

    /// Measure the first face of `data` at `pixel_size`
    pub fn build(data: &[u8], pixel_size: f32, path: &Path) -> Result<Self, FontFileError> {
        Self::build_hashed(data, hash_font_data(data), pixel_size, path)
    }

    /// [`build`](Self::build) for bytes whose hash is already known
    pub(crate) fn build_hashed(
        data: &[u8],
        source_hash: String,
        pixel_size: f32,
        path: &Path,
    ) -> Result<Self, FontFileError> {
        let invalid = |reason: String| FontFileError::InvalidFont {
            path: path.to_path_buf(),
            reason,
        };

        let font = match FileRef::new(data).map_err(|e| invalid(format!("{e}")))? {
            FileRef::Font(font) => font,
            FileRef::Collection(collection) => collection
                .get(0)
                .map_err(|e| invalid(format!("Failed to get font from collection: {e}")))?,
        };

        let size = Size::new(pixel_size);
        let location = LocationRef::default();
        let ascent = font.metrics(size, location).ascent;
        let glyph_metrics = font.glyph_metrics(size, location);

        let mut glyphs = HashMap::new();
        for (codepoint, glyph_id) in font.charmap().mappings() {
            let Some(character) = char::from_u32(codepoint) else {
                continue;
            };

            let advance = glyph_metrics.advance_width(glyph_id).unwrap_or_default();
            let glyph = measure(character, advance, ascent, glyph_metrics.bounds(glyph_id));
            glyphs.insert(character, glyph);
        }

        if glyphs.is_empty() {
            return Err(invalid("Font maps no characters".to_string()));
        }

        Ok(Self {
            source_hash,
            pixel_size,
            glyphs,
        })
    }

    pub fn get(&self, character: char) -> Option<&CharacterGlyph> {
        self.glyphs.get(&character)
    }

    pub fn contains(&self, character: char) -> bool {
        self.glyphs.contains_key(&character)
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Where an index for this font would live inside `storage`
    pub fn storage_path(
        storage: &CacheStorage,
        font_name: &str,
        source_hash: &str,
        pixel_size: f32,
    ) -> Utf8PathBuf {
        let stem: String = font_name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        storage.entry(&format!(
            "{stem}-{source_hash}-{:08x}.glyphs.json",
            pixel_size.to_bits()
        ))
    }

    /// Read an index back, `Ok(None)` when nothing has been stored yet
    pub fn read_from(path: &Utf8PathBuf) -> Result<Option<Self>, FontFileError> {
        let bytes = match std::fs::read(path.as_std_path()) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(FontFileError::Index {
                    path: path.clone().into_std_path_buf(),
                    reason: e.to_string(),
                })
            },
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| FontFileError::Index {
                path: path.clone().into_std_path_buf(),
                reason: e.to_string(),
            })
    }

    /// Write the index; the directory must already exist
    pub fn write_to(&self, path: &Utf8PathBuf) -> Result<(), FontFileError> {
        let index_error = |reason: String| FontFileError::Index {
            path: path.clone().into_std_path_buf(),
            reason,
        };

        let json = serde_json::to_vec(self).map_err(|e| index_error(e.to_string()))?;
        std::fs::write(path.as_std_path(), json).map_err(|e| index_error(e.to_string()))
    }
}
