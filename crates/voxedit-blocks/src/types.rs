use std::fmt;

use serde::{Deserialize, Serialize};
use voxedit_geom::{Vec2, Vec3};

pub const FACE_COUNT: usize = 6;

/// The six sides of a cube voxel. The discriminant is the face slot used by
/// [`BlockRecord::materials`] and [`BlockRecord::rotations`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Face {
    PosY = 0,
    NegY = 1,
    PosX = 2,
    NegX = 3,
    PosZ = 4,
    NegZ = 5,
}

impl Face {
    pub const ALL: [Face; FACE_COUNT] = [
        Face::PosY,
        Face::NegY,
        Face::PosX,
        Face::NegX,
        Face::PosZ,
        Face::NegZ,
    ];

    /// Returns the `[0..6)` index of this face.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Converts a face index `[0..6)` back into a `Face` value.
    #[inline]
    pub fn from_index(i: usize) -> Option<Face> {
        Face::ALL.get(i).copied()
    }

    /// Returns the unit-normal vector for this face.
    #[inline]
    pub fn normal(self) -> Vec3 {
        match self {
            Face::PosY => Vec3::new(0.0, 1.0, 0.0),
            Face::NegY => Vec3::new(0.0, -1.0, 0.0),
            Face::PosX => Vec3::new(1.0, 0.0, 0.0),
            Face::NegX => Vec3::new(-1.0, 0.0, 0.0),
            Face::PosZ => Vec3::new(0.0, 0.0, 1.0),
            Face::NegZ => Vec3::new(0.0, 0.0, -1.0),
        }
    }
}

/// Name of a material sprite, e.g. `terrain_16_0_3`. The empty key selects
/// the default material.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialKey(pub String);

impl MaterialKey {
    #[inline]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn is_default(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for MaterialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MaterialKey {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// 2D collision template attached to a block.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColliderShape {
    #[default]
    DefaultBox,
    Polygon { verts: Vec<Vec2>, vert_count: usize },
}

impl ColliderShape {
    pub fn polygon(verts: Vec<Vec2>) -> Self {
        let vert_count = verts.len();
        ColliderShape::Polygon { verts, vert_count }
    }

    /// Outline of a polygon template: the first `vert_count` stored vertices.
    /// `None` for the default box.
    pub fn polygon_points(&self) -> Option<&[Vec2]> {
        match self {
            ColliderShape::DefaultBox => None,
            ColliderShape::Polygon { verts, vert_count } => {
                Some(&verts[..(*vert_count).min(verts.len())])
            }
        }
    }
}

fn default_block_type() -> String {
    BlockRecord::DEFAULT_TYPE.to_owned()
}

/// Everything stored about one voxel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockRecord {
    pub block_type: String,
    /// Set for every record that occupies its cell. Records read from legacy
    /// data may carry `false`; the grid purges those on compaction.
    pub placed: bool,
    pub materials: [Option<MaterialKey>; FACE_COUNT],
    /// Quarter turns (0..=3) applied to each face's texture.
    pub rotations: [u8; FACE_COUNT],
    pub breakable: bool,
    pub trigger_only: bool,
    pub exclude_from_mesh: bool,
    pub collider: ColliderShape,
}

impl Default for BlockRecord {
    fn default() -> Self {
        Self {
            block_type: default_block_type(),
            placed: false,
            materials: Default::default(),
            rotations: [0; FACE_COUNT],
            breakable: false,
            trigger_only: false,
            exclude_from_mesh: false,
            collider: ColliderShape::DefaultBox,
        }
    }
}

impl BlockRecord {
    pub const DEFAULT_TYPE: &'static str = "basic_cube";

    /// A placed record of the given type with no materials.
    pub fn placed(block_type: impl Into<String>) -> Self {
        Self {
            block_type: block_type.into(),
            placed: true,
            ..Self::default()
        }
    }

    #[inline]
    pub fn material(&self, face: Face) -> Option<&MaterialKey> {
        self.materials[face.index()].as_ref()
    }

    #[inline]
    pub fn set_material(&mut self, face: Face, key: Option<MaterialKey>) {
        self.materials[face.index()] = key;
    }

    /// Applies `key` to every face.
    pub fn fill_materials(&mut self, key: &MaterialKey) {
        for slot in &mut self.materials {
            *slot = Some(key.clone());
        }
    }

    /// Replaces every face that shares `face`'s current material with `key`.
    /// Returns how many faces changed.
    pub fn replace_material(&mut self, face: Face, key: &MaterialKey) -> usize {
        let target = self.materials[face.index()].clone();
        let mut changed = 0;
        for slot in &mut self.materials {
            if *slot == target && slot.as_ref() != Some(key) {
                *slot = Some(key.clone());
                changed += 1;
            }
        }
        changed
    }

    #[inline]
    pub fn rotation(&self, face: Face) -> u8 {
        self.rotations[face.index()] % 4
    }

    /// Advances `face`'s texture rotation by one quarter turn, wrapping 3 -> 0.
    pub fn rotate_face(&mut self, face: Face) -> u8 {
        let r = &mut self.rotations[face.index()];
        *r = (*r % 4 + 1) % 4;
        *r
    }

    /// Faces carrying a material, in face order.
    pub fn textured_faces(&self) -> impl Iterator<Item = (Face, &MaterialKey)> {
        Face::ALL
            .into_iter()
            .filter_map(|f| self.material(f).map(|m| (f, m)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_index_roundtrip() {
        for (i, f) in Face::ALL.iter().enumerate() {
            assert_eq!(f.index(), i);
            assert_eq!(Face::from_index(i), Some(*f));
        }
        assert_eq!(Face::from_index(6), None);
    }

    #[test]
    fn replace_material_only_touches_matching_faces() {
        let mut r = BlockRecord::placed("basic_cube");
        let grass = MaterialKey::from("grass");
        let dirt = MaterialKey::from("dirt");
        r.fill_materials(&dirt);
        r.set_material(Face::PosY, Some(grass.clone()));
        let stone = MaterialKey::from("stone");
        assert_eq!(r.replace_material(Face::PosX, &stone), 5);
        assert_eq!(r.material(Face::PosY), Some(&grass));
        assert_eq!(r.material(Face::NegZ), Some(&stone));
    }

    #[test]
    fn rotate_face_wraps() {
        let mut r = BlockRecord::default();
        for expect in [1, 2, 3, 0, 1] {
            assert_eq!(r.rotate_face(Face::PosZ), expect);
        }
        assert_eq!(r.rotation(Face::NegY), 0);
    }

    #[test]
    fn polygon_points_respects_vert_count() {
        let shape = ColliderShape::Polygon {
            verts: vec![Vec2::ZERO, Vec2::new(1.0, 0.0), Vec2::ONE, Vec2::new(0.0, 1.0)],
            vert_count: 3,
        };
        assert_eq!(shape.polygon_points().map(|p| p.len()), Some(3));
        let overlong = ColliderShape::Polygon {
            verts: vec![Vec2::ZERO],
            vert_count: 8,
        };
        assert_eq!(overlong.polygon_points().map(|p| p.len()), Some(1));
        assert!(ColliderShape::DefaultBox.polygon_points().is_none());
    }
}
