//! Bookshelf application library
//!
//! Application modules plus the bootstrap used by the server binary and the CLI.
#![recursion_limit = "256"]

pub mod bootstrap;
pub mod modules;
pub mod utils;
