//! Command-line interface for glyphstore
//!
//! This crate provides the `glyphstore` binary. Argument definitions live
//! in [`cli`] and each subcommand in [`commands`].

pub mod cli;
pub mod commands;
