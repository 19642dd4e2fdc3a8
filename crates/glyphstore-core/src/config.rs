//! Store configuration
//!
//! Defaults suit a typical UI font tree: glyph metrics authored at a raw
//! pixel height of 100 and a shared 1024x1024 atlas.
//!
//! # Environment Variables
//!
//! [`StoreConfig::from_env`] applies these overrides on top of the defaults:
//!
//! - `GLYPHSTORE_SCALE_ADJUST` - raw pixel height of the fonts (positive float)
//! - `GLYPHSTORE_ATLAS` - `0`/`false`/`off` disables atlas packing
//! - `GLYPHSTORE_ATLAS_SIZE` - atlas page edge length in pixels, at most
//!   [`MAX_ATLAS_SIZE`]
//!
//! ```bash
//! GLYPHSTORE_ATLAS_SIZE=2048 ./my_app
//! ```

use std::sync::OnceLock;

use serde::Serialize;

use crate::atlas::{TextureAtlas, DEFAULT_PAGE_SIZE};
use crate::error::{GlyphStoreError, Result};

/// Raw pixel height glyph metrics are authored at unless told otherwise
pub const DEFAULT_SCALE_ADJUST: f32 = 100.0;

/// Largest atlas page edge a store accepts (a 256 MiB coverage page)
pub const MAX_ATLAS_SIZE: u32 = 16384;

/// How a store is set up
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreConfig {
    /// Glyph metrics are divided by this when resolved
    pub scale_adjust: f32,
    /// Whether the store creates its own atlas
    pub use_atlas: bool,
    /// Atlas page edge length
    pub atlas_size: u32,
    /// Gap kept between atlas allocations
    pub atlas_padding: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            scale_adjust: DEFAULT_SCALE_ADJUST,
            use_atlas: true,
            atlas_size: DEFAULT_PAGE_SIZE,
            atlas_padding: 1,
        }
    }
}

/// Environment overrides, read once per process
#[derive(Debug, Default)]
struct EnvOverrides {
    scale_adjust: Option<String>,
    use_atlas: Option<String>,
    atlas_size: Option<String>,
}

static ENV_OVERRIDES: OnceLock<EnvOverrides> = OnceLock::new();

fn env_overrides() -> &'static EnvOverrides {
    ENV_OVERRIDES.get_or_init(|| EnvOverrides {
        scale_adjust: std::env::var("GLYPHSTORE_SCALE_ADJUST").ok(),
        use_atlas: std::env::var("GLYPHSTORE_ATLAS").ok(),
        atlas_size: std::env::var("GLYPHSTORE_ATLAS_SIZE").ok(),
    })
}

impl StoreConfig {
    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self> {
        let env = env_overrides();
        Self::default().with_overrides(
            env.scale_adjust.as_deref(),
            env.use_atlas.as_deref(),
            env.atlas_size.as_deref(),
        )
    }

    fn with_overrides(
        mut self,
        scale_adjust: Option<&str>,
        use_atlas: Option<&str>,
        atlas_size: Option<&str>,
    ) -> Result<Self> {
        if let Some(raw) = scale_adjust {
            self.scale_adjust = raw.trim().parse().map_err(|_| {
                GlyphStoreError::Config(format!("GLYPHSTORE_SCALE_ADJUST is not a number: {raw}"))
            })?;
            log::info!("Scale adjust set to {} via GLYPHSTORE_SCALE_ADJUST", self.scale_adjust);
        }

        if let Some(raw) = use_atlas {
            self.use_atlas = !matches!(
                raw.trim().to_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            );
            log::info!(
                "Atlas packing {} via GLYPHSTORE_ATLAS",
                if self.use_atlas { "enabled" } else { "disabled" }
            );
        }

        if let Some(raw) = atlas_size {
            self.atlas_size = raw.trim().parse().map_err(|_| {
                GlyphStoreError::Config(format!("GLYPHSTORE_ATLAS_SIZE is not an integer: {raw}"))
            })?;
            log::info!("Atlas page size set to {} via GLYPHSTORE_ATLAS_SIZE", self.atlas_size);
        }

        self.validate()?;
        Ok(self)
    }

    /// Rejects values no store can work with
    pub fn validate(&self) -> Result<()> {
        if !(self.scale_adjust.is_finite() && self.scale_adjust > 0.0) {
            return Err(GlyphStoreError::Config(format!(
                "scale_adjust must be positive, got {}",
                self.scale_adjust
            )));
        }

        if self.atlas_size > MAX_ATLAS_SIZE {
            return Err(GlyphStoreError::Config(format!(
                "atlas_size {} exceeds the maximum of {}",
                self.atlas_size, MAX_ATLAS_SIZE
            )));
        }

        if self.atlas_size <= 2 * self.atlas_padding {
            return Err(GlyphStoreError::Config(format!(
                "atlas_size {} leaves no room inside padding {}",
                self.atlas_size, self.atlas_padding
            )));
        }

        Ok(())
    }

    /// The atlas this configuration asks for, if any
    pub fn build_atlas(&self) -> Option<TextureAtlas> {
        self.use_atlas
            .then(|| TextureAtlas::new(self.atlas_size, self.atlas_padding))
    }
}
