//! Material sprites and the texture atlas packer.
#![forbid(unsafe_code)]

pub mod atlas;
pub mod library;

pub use atlas::{AtlasError, AtlasRect, AtlasTexture, MAX_SIZE_CLASS, TextureAtlasBuilder};
pub use library::{MaterialLibrary, Sprite};
