//! CPU mesh synthesis: turns a voxel grid into one atlas-textured mesh plus
//! standalone objects for cells excluded from it.
#![forbid(unsafe_code)]

pub mod mesh_build;
pub mod primitive;
pub mod synth;

pub use mesh_build::MeshBuild;
pub use primitive::{PrimitiveMesh, PrimitiveSource, UnitCubePrimitives};
pub use synth::{
    AtlasConfig, CombinedMesh, MeshError, MeshSynthesizer, StandaloneObject, Submesh,
    SynthesizedMap,
};
