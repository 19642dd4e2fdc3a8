//! The data structures that travel between sources, stores and callers

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::AtlasError;

/// Metrics for one character as a font describes it
///
/// All values are in the source's pixel space. The store that resolves the
/// glyph applies its own scale on top (see [`TexturedCharacterGlyph`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CharacterGlyph {
    pub character: char,
    pub x_offset: f32,
    pub y_offset: f32,
    pub x_advance: f32,
    pub baseline: f32,
    pub width: f32,
    pub height: f32,
}

impl CharacterGlyph {
    pub fn new(character: char, x_offset: f32, y_offset: f32, x_advance: f32, baseline: f32) -> Self {
        Self {
            character,
            x_offset,
            y_offset,
            x_advance,
            baseline,
            width: 0.0,
            height: 0.0,
        }
    }

    /// Attach the ink bounds of the glyph
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// Raw single-channel (alpha) pixels waiting to be placed in a texture
#[derive(Clone, PartialEq, Eq)]
pub struct TextureUpload {
    width: u32,
    height: u32,
    data: Arc<[u8]>,
}

impl TextureUpload {
    /// Wraps coverage data, checking it holds exactly `width * height` bytes
    pub fn new(width: u32, height: u32, data: impl Into<Arc<[u8]>>) -> Result<Self, AtlasError> {
        let data = data.into();
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(AtlasError::DataSizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for TextureUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureUpload")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies a backing texture: an atlas page or a standalone texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TextureId(u64);

impl TextureId {
    /// Hands out a process-wide unique id
    pub fn next() -> Self {
        Self(NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// A rectangle inside a backing texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextureRegion {
    pub texture: TextureId,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl TextureRegion {
    /// A region covering a whole texture of its own
    pub fn standalone(width: u32, height: u32) -> Self {
        Self {
            texture: TextureId::next(),
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

/// A character glyph resolved against its backing texture
///
/// Immutable once built. Stores hand these out as
/// `Arc<TexturedCharacterGlyph>` so repeated lookups share one value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TexturedCharacterGlyph {
    glyph: CharacterGlyph,
    texture_key: String,
    texture: Option<TextureRegion>,
    scale: f32,
}

impl TexturedCharacterGlyph {
    pub fn new(
        glyph: CharacterGlyph,
        texture_key: impl Into<String>,
        texture: Option<TextureRegion>,
        scale: f32,
    ) -> Self {
        Self {
            glyph,
            texture_key: texture_key.into(),
            texture,
            scale,
        }
    }

    /// Unscaled metrics as reported by the source
    pub fn glyph(&self) -> &CharacterGlyph {
        &self.glyph
    }

    pub fn character(&self) -> char {
        self.glyph.character
    }

    /// Name the backing texture was resolved under (`"{font}/{character}"`)
    pub fn texture_key(&self) -> &str {
        &self.texture_key
    }

    /// Backing texture region, absent when no texture source could supply one
    pub fn texture(&self) -> Option<&TextureRegion> {
        self.texture.as_ref()
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn x_offset(&self) -> f32 {
        self.glyph.x_offset * self.scale
    }

    pub fn y_offset(&self) -> f32 {
        self.glyph.y_offset * self.scale
    }

    pub fn x_advance(&self) -> f32 {
        self.glyph.x_advance * self.scale
    }

    pub fn baseline(&self) -> f32 {
        self.glyph.baseline * self.scale
    }

    pub fn width(&self) -> f32 {
        self.glyph.width * self.scale
    }

    pub fn height(&self) -> f32 {
        self.glyph.height * self.scale
    }
}

/// Where a glyph source is in its one-shot load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    Unloaded,
    Loading,
    Loaded,
    Failed,
}

impl LoadState {
    /// Loaded or failed; nothing further will happen
    pub fn is_settled(self) -> bool {
        matches!(self, LoadState::Loaded | LoadState::Failed)
    }

    fn to_u8(self) -> u8 {
        match self {
            LoadState::Unloaded => 0,
            LoadState::Loading => 1,
            LoadState::Loaded => 2,
            LoadState::Failed => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => LoadState::Loading,
            2 => LoadState::Loaded,
            3 => LoadState::Failed,
            _ => LoadState::Unloaded,
        }
    }
}

/// Lock-free holder for a source's [`LoadState`]
#[derive(Debug)]
pub struct AtomicLoadState(AtomicU8);

impl AtomicLoadState {
    pub fn new() -> Self {
        Self(AtomicU8::new(LoadState::Unloaded.to_u8()))
    }

    pub fn get(&self) -> LoadState {
        LoadState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, state: LoadState) {
        self.0.store(state.to_u8(), Ordering::Release);
    }

    /// Moves `Unloaded -> Loading`; returns the state found otherwise
    pub fn begin(&self) -> Result<(), LoadState> {
        self.0
            .compare_exchange(
                LoadState::Unloaded.to_u8(),
                LoadState::Loading.to_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
            .map_err(LoadState::from_u8)
    }
}

impl Default for AtomicLoadState {
    fn default() -> Self {
        Self::new()
    }
}

/// Directory where sources may persist derived glyph data between runs
///
/// Stores never read or write it; they only hand it down to sources that
/// ask for one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheStorage {
    root: Utf8PathBuf,
}

impl CacheStorage {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Path of a named entry inside the storage
    pub fn entry(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }

    /// Creates the storage directory if it is missing
    pub fn ensure_exists(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.root.as_std_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_rejects_wrong_length() {
        let err = TextureUpload::new(2, 2, vec![0u8; 3]).unwrap_err();
        assert!(matches!(
            err,
            AtlasError::DataSizeMismatch {
                expected: 4,
                actual: 3
            }
        ));
    }

    #[test]
    fn textured_glyph_applies_scale() {
        let glyph = CharacterGlyph::new('A', 2.0, 4.0, 50.0, 80.0).with_size(40.0, 60.0);
        let textured = TexturedCharacterGlyph::new(glyph, "Foo/A", None, 0.01);

        assert_eq!(textured.texture_key(), "Foo/A");
        assert!((textured.x_advance() - 0.5).abs() < 1e-6);
        assert!((textured.height() - 0.6).abs() < 1e-6);
        assert_eq!(textured.glyph().x_advance, 50.0);
    }

    #[test]
    fn load_state_begins_only_once() {
        let state = AtomicLoadState::new();
        assert_eq!(state.begin(), Ok(()));
        assert_eq!(state.get(), LoadState::Loading);
        assert_eq!(state.begin(), Err(LoadState::Loading));

        state.set(LoadState::Failed);
        assert!(state.get().is_settled());
        assert_eq!(state.begin(), Err(LoadState::Failed));
    }

    #[test]
    fn texture_ids_are_unique() {
        let a = TextureRegion::standalone(1, 1);
        let b = TextureRegion::standalone(1, 1);
        assert_ne!(a.texture, b.texture);
    }
}
