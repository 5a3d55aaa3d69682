use std::collections::BTreeMap;

use thiserror::Error;
use voxedit_atlas::{AtlasError, AtlasRect, AtlasTexture, MaterialLibrary, TextureAtlasBuilder};
use voxedit_blocks::{BlockRecord, MaterialKey};
use voxedit_geom::{Vec2, Vec3};
use voxedit_grid::{Coord, VoxelGrid};

use crate::mesh_build::MeshBuild;
use crate::primitive::PrimitiveSource;

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("atlas generation failed: {0}")]
    Atlas(#[from] AtlasError),
}

/// Atlas dimensions used for one synthesis run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AtlasConfig {
    /// Tiles per atlas side.
    pub grid_tiles: u32,
    /// Pixel size of one tile, the smallest sprite size.
    pub tile_px: u32,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            grid_tiles: 32,
            tile_px: 8,
        }
    }
}

/// Index range of one material inside a [`CombinedMesh`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submesh {
    pub material: MaterialKey,
    pub first_index: usize,
    pub index_count: usize,
}

/// One mesh whose indices are grouped by material.
#[derive(Clone, Debug, Default)]
pub struct CombinedMesh {
    pub name: String,
    pub mesh: MeshBuild,
    pub submeshes: Vec<Submesh>,
}

impl CombinedMesh {
    /// Concatenates per-material parts in key order.
    pub fn from_parts(name: impl Into<String>, parts: BTreeMap<MaterialKey, MeshBuild>) -> Self {
        let mut mesh = MeshBuild::default();
        let mut submeshes = Vec::with_capacity(parts.len());
        for (material, part) in parts {
            let first_index = mesh.idx.len();
            mesh.append_translated(&part, Vec3::ZERO);
            submeshes.push(Submesh {
                material,
                first_index,
                index_count: part.idx.len(),
            });
        }
        Self {
            name: name.into(),
            mesh,
            submeshes,
        }
    }

    pub fn submesh(&self, material: &MaterialKey) -> Option<&Submesh> {
        self.submeshes.iter().find(|s| &s.material == material)
    }
}

/// A cell excluded from the bulk mesh, kept as its own object so it can
/// carry its own renderer and collider.
#[derive(Clone, Debug)]
pub struct StandaloneObject {
    /// `x_y_z` of the source cell.
    pub name: String,
    pub coord: Coord,
    pub position: Vec3,
    /// Local-space geometry around `position`.
    pub mesh: CombinedMesh,
    pub record: BlockRecord,
}

#[derive(Clone, Debug)]
pub struct SynthesizedMap {
    pub mesh: CombinedMesh,
    pub objects: Vec<StandaloneObject>,
    pub atlas: AtlasTexture,
}

#[derive(Clone, Debug)]
pub struct MeshSynthesizer {
    pub atlas: AtlasConfig,
    pub map_name: String,
}

impl MeshSynthesizer {
    pub fn new(map_name: impl Into<String>, atlas: AtlasConfig) -> Self {
        Self {
            atlas,
            map_name: map_name.into(),
        }
    }

    /// Builds the map mesh, standalone objects and their shared atlas. An
    /// atlas failure aborts the run; nothing partial is returned.
    pub fn synthesize(
        &self,
        grid: &VoxelGrid,
        library: &MaterialLibrary,
        primitives: &dyn PrimitiveSource,
    ) -> Result<SynthesizedMap, MeshError> {
        let mut packer = TextureAtlasBuilder::new(self.atlas.grid_tiles, self.atlas.tile_px);
        let mut parts: BTreeMap<MaterialKey, MeshBuild> = BTreeMap::new();
        let mut objects = Vec::new();

        for (coord, record) in grid.iter_placed() {
            let prim = primitives.resolve(&record.block_type);
            let position = coord.anchor();
            if record.exclude_from_mesh {
                let mut own: BTreeMap<MaterialKey, MeshBuild> = BTreeMap::new();
                for (face, key) in record.textured_faces().filter(|(_, k)| !k.is_default()) {
                    let rect = packer.add_sprite(library, key)?;
                    let face_mesh = atlas_face(prim.face(face), rect, record.rotation(face), packer.grid_tiles());
                    own.entry(key.clone())
                        .or_default()
                        .append_translated(&face_mesh, Vec3::ZERO);
                }
                let name = format!("{}_{}_{}", coord.x, coord.y, coord.z);
                objects.push(StandaloneObject {
                    mesh: CombinedMesh::from_parts(name.clone(), own),
                    name,
                    coord,
                    position,
                    record: record.clone(),
                });
                continue;
            }
            for (face, key) in record.textured_faces().filter(|(_, k)| !k.is_default()) {
                let rect = packer.add_sprite(library, key)?;
                let face_mesh = atlas_face(prim.face(face), rect, record.rotation(face), packer.grid_tiles());
                parts
                    .entry(key.clone())
                    .or_default()
                    .append_translated(&face_mesh, position);
            }
        }

        let mut mesh = CombinedMesh::from_parts(format!("{}_mesh", self.map_name), parts);
        mesh.mesh.generate_lightmap_uvs();
        let atlas = packer.finish();
        log::info!(
            "synthesized {}: {} triangle(s) in {} submesh(es), {} standalone object(s)",
            mesh.name,
            mesh.mesh.triangle_count(),
            mesh.submeshes.len(),
            objects.len()
        );
        Ok(SynthesizedMap {
            mesh,
            objects,
            atlas,
        })
    }
}

/// Face geometry with its UVs rotated about the face center, then mapped
/// into `rect`.
fn atlas_face(face: &MeshBuild, rect: AtlasRect, rotation: u8, grid: u32) -> MeshBuild {
    let mut m = face.clone();
    m.map_uvs(|uv| rect.remap_uv(uv.rotate_quarter_turns(Vec2::HALF, rotation), grid));
    m
}
