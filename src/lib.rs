//! Command-line map editor built on the `voxedit-*` crates.
#![forbid(unsafe_code)]

pub mod config;
pub mod export;
pub mod script;
