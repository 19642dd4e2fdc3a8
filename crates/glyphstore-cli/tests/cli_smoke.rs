//! CLI Smoke Tests
//!
//! Runs the `glyphstore` binary for both commands, covering success cases
//! and failure cases (no fonts, missing fonts).

use std::path::Path;
use std::process::{Command, Output};

use camino::Utf8PathBuf;
use clap::Parser;
use glyphstore_cli::cli::{Cli, Commands};
use glyphstore_core::{CacheStorage, CharacterGlyph};
use glyphstore_fontdb::{hash_font_data, GlyphMetricsIndex};

const NOT_A_FONT: &[u8] = b"no font parser accepts these bytes";

fn glyphstore(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_glyphstore"))
        .args(args)
        .env_remove("GLYPHSTORE_SCALE_ADJUST")
        .env_remove("GLYPHSTORE_ATLAS")
        .env_remove("GLYPHSTORE_ATLAS_SIZE")
        .output()
        .expect("Failed to execute glyphstore")
}

/// A font file that only loads through its stored metrics
fn cached_font(dir: &Path) -> (Utf8PathBuf, Utf8PathBuf) {
    let root = Utf8PathBuf::from_path_buf(dir.to_path_buf()).unwrap();
    let font = root.join("Mono.ttf");
    std::fs::write(&font, NOT_A_FONT).unwrap();

    let cache = root.join("cache");
    let storage = CacheStorage::new(cache.clone());
    storage.ensure_exists().unwrap();

    let hash = hash_font_data(NOT_A_FONT);
    let index = GlyphMetricsIndex::from_glyphs(
        hash.as_str(),
        100.0,
        [CharacterGlyph::new('A', 3.0, 10.0, 60.0, 80.0).with_size(54.0, 70.0)],
    );
    index
        .write_to(&GlyphMetricsIndex::storage_path(&storage, "Mono", &hash, 100.0))
        .unwrap();

    (font, cache)
}

// ============================================================================
// Argument Parsing
// ============================================================================

#[test]
fn test_parse_lookup_with_fonts_in_order() {
    let cli = Cli::try_parse_from([
        "glyphstore", "lookup", "Ab", "-f", "a.ttf", "--font", "b.ttf", "-n", "c.ttf", "--name",
        "Sans",
    ])
    .unwrap();

    let Commands::Lookup(args) = cli.command else {
        panic!("expected lookup");
    };
    assert_eq!(args.text, "Ab");
    assert_eq!(args.fonts, vec![Utf8PathBuf::from("a.ttf"), Utf8PathBuf::from("b.ttf")]);
    assert_eq!(args.nested_fonts, vec![Utf8PathBuf::from("c.ttf")]);
    assert_eq!(args.font_name.as_deref(), Some("Sans"));
    assert_eq!(args.pixel_size, None);
    assert!(!args.json);
}

// ============================================================================
// Info Command Tests
// ============================================================================

#[test]
fn test_info_prints_defaults() {
    let output = glyphstore(&["info"]);

    assert!(output.status.success(), "info should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Store configuration"));
    assert!(stdout.contains("1024x1024"));
}

#[test]
fn test_info_with_oversized_atlas_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_glyphstore"))
        .arg("info")
        .env("GLYPHSTORE_ATLAS_SIZE", "100000")
        .output()
        .expect("Failed to execute glyphstore");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("exceeds the maximum"));
}

#[test]
fn test_info_json_is_parseable() {
    let output = glyphstore(&["info", "--json"]);

    assert!(output.status.success());
    let config: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config["scale_adjust"], 100.0);
    assert_eq!(config["use_atlas"], true);
}

// ============================================================================
// Lookup Command Tests
// ============================================================================

#[test]
fn test_lookup_without_fonts_fails() {
    let output = glyphstore(&["lookup", "A"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No fonts given"));
}

#[test]
fn test_lookup_missing_font_reports_no_glyphs() {
    let output = glyphstore(&["lookup", "AB", "--font", "/nonexistent/Missing.ttf"]);

    assert!(output.status.success(), "a font that fails to load is skipped");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("(no glyph)"));
    assert!(stdout.contains("0/2 characters resolved"));
}

#[test]
fn test_lookup_cached_font_resolves_json() {
    let dir = tempfile::tempdir().unwrap();
    let (font, cache) = cached_font(dir.path());

    let output = glyphstore(&[
        "lookup",
        "AB",
        "--font",
        font.as_str(),
        "--cache-dir",
        cache.as_str(),
        "--json",
    ]);

    assert!(output.status.success());
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rows[0]["character"], "A");
    assert_eq!(rows[0]["texture_key"], "Mono/A");
    assert!((rows[0]["x_advance"].as_f64().unwrap() - 0.6).abs() < 1e-6);
    assert!(rows[1]["texture_key"].is_null());
}

#[test]
fn test_lookup_nested_font_inherits_cache_dir() {
    let dir = tempfile::tempdir().unwrap();
    let (font, cache) = cached_font(dir.path());

    let output = glyphstore(&[
        "lookup",
        "A",
        "--font",
        "/nonexistent/Missing.ttf",
        "--nested-font",
        font.as_str(),
        "--cache-dir",
        cache.as_str(),
        "--name",
        "Mono",
    ]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Mono/A"));
    assert!(stdout.contains("1/1 characters resolved"));
}
