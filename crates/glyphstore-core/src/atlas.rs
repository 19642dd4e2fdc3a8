//! Packs many small uploads into a few large textures
//!
//! The atlas uses a row-based packing strategy: fill a row left to right,
//! start a new row when the current one is full, and open a new page when
//! the current page is full. Pages are square and keep a CPU-side copy of
//! their alpha pixels; getting them onto the GPU is the renderer's job.

use parking_lot::Mutex;

use crate::error::AtlasError;
use crate::types::{TextureId, TextureRegion, TextureUpload};

/// Default page edge length in pixels
pub const DEFAULT_PAGE_SIZE: u32 = 1024;

struct AtlasPage {
    texture: TextureId,
    pixels: Vec<u8>,
    cursor_x: u32,
    cursor_y: u32,
    row_height: u32,
}

impl AtlasPage {
    fn new(size: u32, padding: u32) -> Self {
        Self {
            texture: TextureId::next(),
            pixels: vec![0; size as usize * size as usize],
            cursor_x: padding,
            cursor_y: padding,
            row_height: 0,
        }
    }

    /// Finds room for a `width` x `height` rectangle, advancing the cursor
    fn reserve(&mut self, width: u32, height: u32, size: u32, padding: u32) -> Option<(u32, u32)> {
        if self.cursor_x + width + padding > size {
            self.cursor_x = padding;
            self.cursor_y += self.row_height + padding;
            self.row_height = 0;
        }

        if self.cursor_y + height + padding > size {
            return None;
        }

        let origin = (self.cursor_x, self.cursor_y);
        self.cursor_x += width + padding;
        self.row_height = self.row_height.max(height);
        Some(origin)
    }

    fn blit(&mut self, upload: &TextureUpload, x: u32, y: u32, size: u32) {
        let width = upload.width() as usize;
        for (row, line) in upload.data().chunks_exact(width.max(1)).enumerate() {
            let start = (y as usize + row) * size as usize + x as usize;
            self.pixels[start..start + width].copy_from_slice(&line[..width]);
        }
    }
}

/// A shared texture atlas
///
/// Stores hold it as `Arc<TextureAtlas>` and nested stores inherit the
/// parent's handle, so every font in a tree packs into the same pages.
pub struct TextureAtlas {
    page_size: u32,
    padding: u32,
    pages: Mutex<Vec<AtlasPage>>,
}

impl TextureAtlas {
    pub fn new(page_size: u32, padding: u32) -> Self {
        Self {
            page_size,
            padding,
            pages: Mutex::new(Vec::new()),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn page_count(&self) -> usize {
        self.pages.lock().len()
    }

    /// Copies an upload into the atlas and returns where it landed
    pub fn allocate(&self, upload: &TextureUpload) -> Result<TextureRegion, AtlasError> {
        let (width, height) = (upload.width(), upload.height());
        let padding = self.padding;
        let size = self.page_size;

        if width + 2 * padding > size || height + 2 * padding > size {
            return Err(AtlasError::TooLarge {
                width,
                height,
                page_size: size,
            });
        }

        let mut pages = self.pages.lock();

        let fits = pages
            .last_mut()
            .and_then(|page| page.reserve(width, height, size, padding));

        let (x, y) = match fits {
            Some(at) => at,
            None => {
                if !pages.is_empty() {
                    log::debug!("Atlas page {} full, opening another", pages.len());
                }
                let mut page = AtlasPage::new(size, padding);
                // Cannot fail: the size check above guarantees a fresh page has room
                let at = page
                    .reserve(width, height, size, padding)
                    .ok_or(AtlasError::TooLarge {
                        width,
                        height,
                        page_size: size,
                    })?;
                pages.push(page);
                at
            },
        };

        let Some(page) = pages.last_mut() else {
            return Err(AtlasError::TooLarge {
                width,
                height,
                page_size: size,
            });
        };
        page.blit(upload, x, y, size);

        Ok(TextureRegion {
            texture: page.texture,
            x,
            y,
            width,
            height,
        })
    }

    /// Snapshot of a page's alpha pixels, row-major
    pub fn page_pixels(&self, texture: TextureId) -> Option<Vec<u8>> {
        self.pages
            .lock()
            .iter()
            .find(|page| page.texture == texture)
            .map(|page| page.pixels.clone())
    }
}

impl Default for TextureAtlas {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, 1)
    }
}

impl std::fmt::Debug for TextureAtlas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureAtlas")
            .field("page_size", &self.page_size)
            .field("padding", &self.padding)
            .field("pages", &self.page_count())
            .finish()
    }
}
