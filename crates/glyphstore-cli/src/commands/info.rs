//! Info command implementation
//!
//! Displays the store configuration the environment produces.

use anyhow::{Context, Result};
use glyphstore_core::config::MAX_ATLAS_SIZE;
use glyphstore_core::StoreConfig;

use crate::cli::InfoArgs;

pub fn run(args: &InfoArgs) -> Result<()> {
    let config = StoreConfig::from_env().context("Invalid glyphstore environment")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("Glyphstore v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Store configuration:");
    println!("  scale adjust      {}", config.scale_adjust);
    println!(
        "  atlas             {}",
        if config.use_atlas { "enabled" } else { "disabled" }
    );
    println!("  atlas page size   {0}x{0}", config.atlas_size);
    println!("  atlas padding     {}", config.atlas_padding);
    println!();
    println!("Environment overrides:");
    println!("  GLYPHSTORE_SCALE_ADJUST   raw pixel height of the fonts");
    println!("  GLYPHSTORE_ATLAS          0/false/off disables atlas packing");
    println!(
        "  GLYPHSTORE_ATLAS_SIZE     atlas page edge length in pixels, at most {}",
        MAX_ATLAS_SIZE
    );

    Ok(())
}
