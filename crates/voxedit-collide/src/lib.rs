//! 2D collision shapes for one layer of a voxel grid.
#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use voxedit_blocks::BlockRecord;
use voxedit_geom::{Vec2, Vec3};
use voxedit_grid::{Coord, GridError, VoxelGrid};

/// Layer colliders are generated for unless configured otherwise.
pub const DEFAULT_COLLIDER_LAYER: i32 = 3;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape2d {
    /// Axis-aligned box centered on the collider position.
    Box { size: Vec2 },
    /// Closed outline in cell-local units.
    Polygon { points: Vec<Vec2> },
}

impl Shape2d {
    pub const UNIT_BOX: Shape2d = Shape2d::Box { size: Vec2::ONE };
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Collider2d {
    pub coord: Coord,
    pub position: Vec3,
    pub shape: Shape2d,
    /// Reports overlaps without blocking movement.
    pub sensor: bool,
    pub block_type: String,
    pub breakable: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ColliderSet {
    pub name: String,
    pub layer: usize,
    pub colliders: Vec<Collider2d>,
}

impl ColliderSet {
    pub fn solid(&self) -> impl Iterator<Item = &Collider2d> {
        self.colliders.iter().filter(|c| !c.sensor)
    }

    pub fn sensors(&self) -> impl Iterator<Item = &Collider2d> {
        self.colliders.iter().filter(|c| c.sensor)
    }
}

#[derive(Clone, Debug)]
pub struct ColliderSynthesizer {
    pub map_name: String,
}

impl ColliderSynthesizer {
    pub fn new(map_name: impl Into<String>) -> Self {
        Self {
            map_name: map_name.into(),
        }
    }

    /// One collider per placed cell of layer `z`, in x-major order.
    pub fn synthesize(&self, grid: &VoxelGrid, z: i32) -> Result<ColliderSet, GridError> {
        let mut colliders = Vec::new();
        for (x, y, cell) in grid.layer(z)? {
            let Some(record) = cell.filter(|r| r.placed) else {
                continue;
            };
            let coord = Coord::new(x, y, z);
            colliders.push(Collider2d {
                coord,
                position: coord.anchor(),
                shape: shape_for(coord, record),
                sensor: record.trigger_only,
                block_type: record.block_type.clone(),
                breakable: record.breakable,
            });
        }
        let set = ColliderSet {
            name: format!("{}_colliders", self.map_name),
            layer: z as usize,
            colliders,
        };
        log::info!(
            "{}: {} collider(s) on layer {} ({} sensor(s))",
            set.name,
            set.colliders.len(),
            z,
            set.sensors().count()
        );
        Ok(set)
    }
}

fn shape_for(coord: Coord, record: &BlockRecord) -> Shape2d {
    match record.collider.polygon_points() {
        None => Shape2d::UNIT_BOX,
        Some(points) if points.len() < 3 => {
            log::warn!(
                "{} at {} has a {}-point collider outline; using a box",
                record.block_type,
                coord,
                points.len()
            );
            Shape2d::UNIT_BOX
        }
        Some(points) => Shape2d::Polygon {
            points: points.to_vec(),
        },
    }
}
