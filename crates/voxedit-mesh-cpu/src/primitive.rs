use std::collections::BTreeSet;

use voxedit_blocks::{BlockCatalog, BlockRecord, FACE_COUNT, Face};
use voxedit_geom::{Vec2, Vec3};

use crate::mesh_build::MeshBuild;

/// Block geometry with one submesh per face, centered on the origin, with
/// face UVs spanning `[0,1]²` (top-left origin).
#[derive(Clone, Debug)]
pub struct PrimitiveMesh {
    pub name: String,
    faces: [MeshBuild; FACE_COUNT],
}

impl PrimitiveMesh {
    pub fn new(name: impl Into<String>, faces: [MeshBuild; FACE_COUNT]) -> Self {
        Self {
            name: name.into(),
            faces,
        }
    }

    /// Axis-aligned unit cube spanning `[-0.5, 0.5]³`.
    pub fn unit_cube() -> Self {
        Self::new(BlockRecord::DEFAULT_TYPE, Face::ALL.map(unit_face))
    }

    #[inline]
    pub fn face(&self, face: Face) -> &MeshBuild {
        &self.faces[face.index()]
    }
}

/// Right and up axes of a face's texture, with `right × up = normal`.
fn face_axes(face: Face) -> (Vec3, Vec3) {
    match face {
        Face::PosY => (Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -1.0)),
        Face::NegY => (Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0)),
        Face::PosX => (Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 1.0, 0.0)),
        Face::NegX => (Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 1.0, 0.0)),
        Face::PosZ => (Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)),
        Face::NegZ => (Vec3::new(-1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)),
    }
}

fn unit_face(face: Face) -> MeshBuild {
    let n = face.normal();
    let (r, u) = face_axes(face);
    let corner = |s: f32, t: f32| n * 0.5 + r * (s - 0.5) + u * (t - 0.5);
    let mut m = MeshBuild::default();
    m.add_quad(
        [
            corner(0.0, 0.0),
            corner(1.0, 0.0),
            corner(1.0, 1.0),
            corner(0.0, 1.0),
        ],
        n,
        // v grows downward in texture space
        [
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 0.0),
        ],
    );
    m
}

/// Supplies geometry for block types.
pub trait PrimitiveSource {
    /// Geometry for `block_type`, or `None` if the type has no shape.
    fn instantiate(&self, block_type: &str) -> Option<&PrimitiveMesh>;

    /// Geometry used for block types without one.
    fn placeholder(&self) -> &PrimitiveMesh;

    fn resolve(&self, block_type: &str) -> &PrimitiveMesh {
        match self.instantiate(block_type) {
            Some(p) => p,
            None => {
                log::debug!("no primitive for block type `{}`; using placeholder", block_type);
                self.placeholder()
            }
        }
    }
}

/// Every known block type is a unit cube.
#[derive(Clone, Debug)]
pub struct UnitCubePrimitives {
    known: BTreeSet<String>,
    cube: PrimitiveMesh,
}

impl Default for UnitCubePrimitives {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitCubePrimitives {
    pub fn new() -> Self {
        Self {
            known: BTreeSet::from([BlockRecord::DEFAULT_TYPE.to_owned()]),
            cube: PrimitiveMesh::unit_cube(),
        }
    }

    pub fn from_catalog(catalog: &BlockCatalog) -> Self {
        let mut p = Self::new();
        p.known.extend(catalog.types.keys().cloned());
        p
    }
}

impl PrimitiveSource for UnitCubePrimitives {
    fn instantiate(&self, block_type: &str) -> Option<&PrimitiveMesh> {
        self.known.contains(block_type).then_some(&self.cube)
    }

    fn placeholder(&self) -> &PrimitiveMesh {
        &self.cube
    }
}
