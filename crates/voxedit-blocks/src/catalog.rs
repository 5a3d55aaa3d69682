use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use voxedit_geom::Vec2;

use super::types::{BlockRecord, ColliderShape, Face, MaterialKey};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read block catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid block catalog: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("block type `{name}` has a polygon collider with {count} vertices (need at least 3)")]
    DegeneratePolygon { name: String, count: usize },
}

/// Template used when placing a block of a given type.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockType {
    pub name: String,
    pub breakable: bool,
    pub trigger_only: bool,
    pub exclude_from_mesh: bool,
    pub collider: ColliderShape,
    pub materials: [Option<MaterialKey>; 6],
}

impl BlockType {
    fn plain(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            breakable: false,
            trigger_only: false,
            exclude_from_mesh: false,
            collider: ColliderShape::DefaultBox,
            materials: Default::default(),
        }
    }
}

/// Known block types, keyed by type tag.
#[derive(Clone, Debug, Default)]
pub struct BlockCatalog {
    pub types: BTreeMap<String, BlockType>,
}

impl BlockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&BlockType> {
        self.types.get(name)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Fresh placed record for `name`. Unknown types produce a plain record
    /// that still carries the requested tag.
    pub fn instantiate(&self, name: &str) -> BlockRecord {
        let mut record = BlockRecord::placed(name);
        if let Some(ty) = self.get(name) {
            record.breakable = ty.breakable;
            record.trigger_only = ty.trigger_only;
            record.exclude_from_mesh = ty.exclude_from_mesh;
            record.collider = ty.collider.clone();
            record.materials = ty.materials.clone();
        }
        record
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self, CatalogError> {
        let cfg: BlocksConfig = toml::from_str(toml_str)?;
        let mut catalog = BlockCatalog::new();
        catalog
            .types
            .insert(BlockRecord::DEFAULT_TYPE.to_owned(), BlockType::plain(BlockRecord::DEFAULT_TYPE));
        for (name, def) in cfg.blocks {
            let collider = match def.collider {
                None => ColliderShape::DefaultBox,
                Some(points) if points.len() < 3 => {
                    return Err(CatalogError::DegeneratePolygon {
                        name,
                        count: points.len(),
                    });
                }
                Some(points) => {
                    ColliderShape::polygon(points.into_iter().map(|[x, y]| Vec2::new(x, y)).collect())
                }
            };
            let materials = def.materials.map(FaceMaterials::resolve).unwrap_or_default();
            catalog.types.insert(
                name.clone(),
                BlockType {
                    name,
                    breakable: def.breakable,
                    trigger_only: def.trigger_only,
                    exclude_from_mesh: def.exclude_from_mesh,
                    collider,
                    materials,
                },
            );
        }
        Ok(catalog)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }
}

// --- Config ---

#[derive(Deserialize)]
pub struct BlocksConfig {
    #[serde(default)]
    pub blocks: HashMap<String, BlockDef>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct BlockDef {
    pub breakable: bool,
    pub trigger_only: bool,
    pub exclude_from_mesh: bool,
    /// Polygon outline in cell-local units; absent means the default box.
    pub collider: Option<Vec<[f32; 2]>>,
    pub materials: Option<FaceMaterials>,
}

#[derive(Deserialize)]
#[serde(untagged)]
pub enum FaceMaterials {
    // Simple: materials = "terrain_16_0_0"
    All(String),
    // Detailed: materials = { top = "...", bottom = "...", side = "..." }
    Roles {
        top: Option<String>,
        bottom: Option<String>,
        side: Option<String>,
    },
}

impl FaceMaterials {
    fn resolve(self) -> [Option<MaterialKey>; 6] {
        let mut out: [Option<MaterialKey>; 6] = Default::default();
        match self {
            FaceMaterials::All(key) => {
                for slot in &mut out {
                    *slot = Some(MaterialKey(key.clone()));
                }
            }
            FaceMaterials::Roles { top, bottom, side } => {
                out[Face::PosY.index()] = top.map(MaterialKey);
                out[Face::NegY.index()] = bottom.map(MaterialKey);
                for f in [Face::PosX, Face::NegX, Face::PosZ, Face::NegZ] {
                    out[f.index()] = side.clone().map(MaterialKey);
                }
            }
        }
        out
    }
}
