//! Meet CLI library.
//!
//! This crate provides the operator command line for live timing and results.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
