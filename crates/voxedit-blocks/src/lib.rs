//! Block records, faces, material keys, and the block type catalog.
#![forbid(unsafe_code)]

pub mod catalog;
pub mod sheet;
pub mod types;

pub use catalog::{BlockCatalog, CatalogError};
pub use sheet::{SheetName, SheetRole};
pub use types::{BlockRecord, ColliderShape, FACE_COUNT, Face, MaterialKey};
