//! CLI argument definitions using Clap v4

use camino::Utf8PathBuf;
use clap::{ArgAction, Parser, Subcommand};

/// Glyphstore - resolve characters against a tree of fonts
#[derive(Parser, Debug)]
#[command(name = "glyphstore")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the effective store configuration
    #[command(alias = "i")]
    Info(InfoArgs),

    /// Look up every character of a text in a set of fonts
    #[command(alias = "l")]
    Lookup(LookupArgs),
}

/// Arguments for the info command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Print the configuration as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,
}

/// Arguments for the lookup command
#[derive(Parser, Debug)]
pub struct LookupArgs {
    /// Characters to look up
    pub text: String,

    /// Font file attached to the root store, searched in the order given
    #[arg(short = 'f', long = "font", action = ArgAction::Append)]
    pub fonts: Vec<Utf8PathBuf>,

    /// Font file attached to a nested store, searched after every root font
    #[arg(short = 'n', long = "nested-font", action = ArgAction::Append)]
    pub nested_fonts: Vec<Utf8PathBuf>,

    /// Only match fonts whose name ends with this
    #[arg(long = "name")]
    pub font_name: Option<String>,

    /// Directory where measured glyph metrics are kept between runs
    #[arg(short = 'c', long = "cache-dir")]
    pub cache_dir: Option<Utf8PathBuf>,

    /// Pixel size fonts are measured at [default: the store's scale adjust]
    #[arg(short = 's', long = "pixel-size")]
    pub pixel_size: Option<f32>,

    /// Give up waiting for fonts to load after this many milliseconds
    #[arg(long = "timeout-ms", default_value = "10000")]
    pub timeout_ms: u64,

    /// Print results as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,
}
