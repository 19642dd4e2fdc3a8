//! Lookup command implementation
//!
//! Builds a store tree from font files, waits for the fonts to load and
//! resolves every character of the input text against it.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use glyphstore::FontStore;
use glyphstore_core::{
    CacheStorage, GlyphSource, StoreConfig, TextureRegion, TexturedCharacterGlyph,
};
use glyphstore_fontdb::FontFileSource;
use rayon::prelude::*;
use serde::Serialize;

use crate::cli::LookupArgs;

/// One looked-up character, scaled the way the store hands it out
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupRow {
    pub character: char,
    /// `None` when no font in the tree has the character
    pub texture_key: Option<String>,
    pub x_offset: f32,
    pub y_offset: f32,
    pub x_advance: f32,
    pub baseline: f32,
    pub width: f32,
    pub height: f32,
    pub texture: Option<TextureRegion>,
}

impl LookupRow {
    fn found(glyph: &TexturedCharacterGlyph) -> Self {
        Self {
            character: glyph.character(),
            texture_key: Some(glyph.texture_key().to_string()),
            x_offset: glyph.x_offset(),
            y_offset: glyph.y_offset(),
            x_advance: glyph.x_advance(),
            baseline: glyph.baseline(),
            width: glyph.width(),
            height: glyph.height(),
            texture: glyph.texture().copied(),
        }
    }

    fn missing(character: char) -> Self {
        Self {
            character,
            texture_key: None,
            x_offset: 0.0,
            y_offset: 0.0,
            x_advance: 0.0,
            baseline: 0.0,
            width: 0.0,
            height: 0.0,
            texture: None,
        }
    }
}

pub async fn run(args: &LookupArgs) -> Result<()> {
    let rows = lookup(args).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!(
        "{:<8} {:<32} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9}",
        "char", "texture", "x_off", "y_off", "advance", "baseline", "width", "height"
    );
    for row in &rows {
        let character = format!("{:?}", row.character);
        match &row.texture_key {
            Some(key) => println!(
                "{:<8} {:<32} {:>9.4} {:>9.4} {:>9.4} {:>9.4} {:>9.4} {:>9.4}",
                character,
                key,
                row.x_offset,
                row.y_offset,
                row.x_advance,
                row.baseline,
                row.width,
                row.height
            ),
            None => println!("{:<8} (no glyph)", character),
        }
    }

    let found = rows.iter().filter(|row| row.texture_key.is_some()).count();
    println!();
    println!("{}/{} characters resolved", found, rows.len());

    Ok(())
}

/// Resolve the text of `args`, one row per character in input order
pub async fn lookup(args: &LookupArgs) -> Result<Vec<LookupRow>> {
    if args.fonts.is_empty() && args.nested_fonts.is_empty() {
        bail!("No fonts given; pass --font or --nested-font");
    }

    let config = StoreConfig::from_env().context("Invalid glyphstore environment")?;
    let pixel_size = args.pixel_size.unwrap_or(config.scale_adjust);

    let mut builder = FontStore::builder().config(config).scale_adjust(pixel_size);
    if let Some(dir) = &args.cache_dir {
        builder = builder.cache_storage(CacheStorage::new(dir.clone()));
    }
    let root = Arc::new(builder.build().context("Failed to create font store")?);

    let mut sources = Vec::new();
    for path in &args.fonts {
        let source = Arc::new(FontFileSource::new(path.clone()).with_pixel_size(pixel_size));
        root.add_source(source.clone());
        sources.push(source);
    }

    if !args.nested_fonts.is_empty() {
        // Attached first so its fonts pick up the root's atlas and storage
        let nested = Arc::new(
            FontStore::builder()
                .scale_adjust(pixel_size)
                .without_atlas()
                .build()
                .context("Failed to create nested font store")?,
        );
        root.add_store(nested.clone());

        for path in &args.nested_fonts {
            let source = Arc::new(FontFileSource::new(path.clone()).with_pixel_size(pixel_size));
            nested.add_source(source.clone());
            sources.push(source);
        }
    }

    wait_for_fonts(&sources, Duration::from_millis(args.timeout_ms)).await;

    let font_name = args.font_name.as_deref();
    let characters: Vec<char> = args.text.chars().collect();
    let rows = characters
        .par_iter()
        .map(|&character| match root.get(font_name, character) {
            Some(glyph) => LookupRow::found(&glyph),
            None => LookupRow::missing(character),
        })
        .collect();

    Ok(rows)
}

async fn wait_for_fonts(sources: &[Arc<FontFileSource>], timeout: Duration) {
    let settled = tokio::time::timeout(timeout, async {
        while !sources.iter().all(|source| source.state().is_settled()) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;

    if settled.is_err() {
        log::warn!(
            "Fonts still loading after {} ms, results may be incomplete",
            timeout.as_millis()
        );
    }

    for source in sources {
        log::info!(
            "{} ({}): {:?}, {} glyphs",
            source.font_name(),
            source.path(),
            source.state(),
            source.glyph_count()
        );
    }
}
