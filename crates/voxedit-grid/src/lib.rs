//! Flat 3D voxel grid of block records.
#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use thiserror::Error;
use voxedit_blocks::BlockRecord;
use voxedit_geom::Vec3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("voxel ({x}, {y}, {z}) is outside the {width}x{height}x{depth} grid")]
    OutOfRange {
        x: i32,
        y: i32,
        z: i32,
        width: usize,
        height: usize,
        depth: usize,
    },
}

/// Integer voxel position. May lie outside any particular grid.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Coord {
    pub const ZERO: Coord = Coord { x: 0, y: 0, z: 0 };

    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// World-space anchor of this cell: `(x+0.5, y+0.5, z-0.5)`. Meshes and
    /// colliders are placed here.
    #[inline]
    pub fn anchor(self) -> Vec3 {
        Vec3::new(
            self.x as f32 + 0.5,
            self.y as f32 + 0.5,
            self.z as f32 - 0.5,
        )
    }

    #[inline]
    pub fn left(self) -> Coord {
        Coord::new(self.x - 1, self.y, self.z)
    }

    #[inline]
    pub fn right(self) -> Coord {
        Coord::new(self.x + 1, self.y, self.z)
    }

    #[inline]
    pub fn down(self) -> Coord {
        Coord::new(self.x, self.y - 1, self.z)
    }

    #[inline]
    pub fn up(self) -> Coord {
        Coord::new(self.x, self.y + 1, self.z)
    }

    #[inline]
    pub fn forward(self) -> Coord {
        Coord::new(self.x, self.y, self.z + 1)
    }

    #[inline]
    pub fn backward(self) -> Coord {
        Coord::new(self.x, self.y, self.z - 1)
    }
}

impl core::ops::Add for Coord {
    type Output = Coord;
    #[inline]
    fn add(self, rhs: Coord) -> Coord {
        Coord::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl core::fmt::Display for Coord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Dense `width x height x depth` grid. Slot `z + y*depth + x*depth*height`
/// holds the record at `(x, y, z)`, so z varies fastest, then y, then x.
#[derive(Clone, Debug, PartialEq)]
pub struct VoxelGrid {
    width: usize,
    height: usize,
    depth: usize,
    slots: Vec<Option<BlockRecord>>,
}

impl VoxelGrid {
    /// Empty grid. Non-positive dimensions clamp to 1.
    pub fn new(width: i32, height: i32, depth: i32) -> Self {
        let (width, height, depth) = (clamp_dim(width), clamp_dim(height), clamp_dim(depth));
        Self {
            width,
            height,
            depth,
            slots: vec![None; width * height * depth],
        }
    }

    /// Rebuilds a grid from slots in index order. A slot vector of the wrong
    /// length is padded with empties or truncated.
    pub fn from_flat(width: i32, height: i32, depth: i32, slots: Vec<Option<BlockRecord>>) -> Self {
        let mut grid = Self::new(width, height, depth);
        let expect = grid.slots.len();
        let mut s = slots;
        if s.len() != expect {
            log::warn!(
                "grid data has {} slots, expected {}; resizing",
                s.len(),
                expect
            );
            s.resize(expect, None);
        }
        grid.slots = s;
        grid
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.width, self.height, self.depth)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        x >= 0
            && y >= 0
            && z >= 0
            && (x as usize) < self.width
            && (y as usize) < self.height
            && (z as usize) < self.depth
    }

    /// Flat slot index of an in-bounds position.
    #[inline]
    pub fn idx(&self, x: usize, y: usize, z: usize) -> usize {
        z + y * self.depth + x * self.depth * self.height
    }

    /// Position of flat slot `i`.
    #[inline]
    pub fn coord_of(&self, i: usize) -> Coord {
        let x = i / (self.depth * self.height);
        let y = (i / self.depth) % self.height;
        let z = i % self.depth;
        Coord::new(x as i32, y as i32, z as i32)
    }

    fn checked_idx(&self, x: i32, y: i32, z: i32) -> Result<usize, GridError> {
        if self.contains(x, y, z) {
            Ok(self.idx(x as usize, y as usize, z as usize))
        } else {
            Err(GridError::OutOfRange {
                x,
                y,
                z,
                width: self.width,
                height: self.height,
                depth: self.depth,
            })
        }
    }

    /// Record at `(x, y, z)`, `None` for an empty cell. Out-of-range positions
    /// are a caller bug and fail.
    pub fn get(&self, x: i32, y: i32, z: i32) -> Result<Option<&BlockRecord>, GridError> {
        let i = self.checked_idx(x, y, z)?;
        Ok(self.slots[i].as_ref())
    }

    pub fn get_mut(&mut self, x: i32, y: i32, z: i32) -> Result<Option<&mut BlockRecord>, GridError> {
        let i = self.checked_idx(x, y, z)?;
        Ok(self.slots[i].as_mut())
    }

    /// Placed record at `(x, y, z)`. Out-of-range and stale cells read as `None`.
    pub fn placed_at(&self, x: i32, y: i32, z: i32) -> Option<&BlockRecord> {
        self.get(x, y, z).ok().flatten().filter(|r| r.placed)
    }

    /// Writes `record` at `(x, y, z)`. Out-of-range writes are ignored and
    /// return `false`.
    pub fn set(&mut self, x: i32, y: i32, z: i32, record: BlockRecord) -> bool {
        match self.checked_idx(x, y, z) {
            Ok(i) => {
                self.slots[i] = Some(record);
                true
            }
            Err(e) => {
                log::trace!("ignored set: {}", e);
                false
            }
        }
    }

    /// Empties `(x, y, z)` and returns what was there. Out-of-range deletes
    /// are ignored.
    pub fn delete(&mut self, x: i32, y: i32, z: i32) -> Option<BlockRecord> {
        match self.checked_idx(x, y, z) {
            Ok(i) => self.slots[i].take(),
            Err(e) => {
                log::trace!("ignored delete: {}", e);
                None
            }
        }
    }

    /// Number of cells holding a placed record.
    pub fn count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.as_ref().is_some_and(|r| r.placed))
            .count()
    }

    /// Drops stored records whose `placed` flag is false. Returns how many
    /// were removed.
    pub fn compact(&mut self) -> usize {
        let mut removed = 0;
        for slot in &mut self.slots {
            if slot.as_ref().is_some_and(|r| !r.placed) {
                *slot = None;
                removed += 1;
            }
        }
        if removed > 0 {
            log::debug!("compacted {} stale record(s)", removed);
        }
        removed
    }

    /// Shrinks the grid to the bounding box of its placed records and returns
    /// the old position of the new origin. The caller adds the offset to the
    /// grid's world placement so existing voxels keep their world position.
    /// A grid with nothing placed collapses to a single empty cell.
    pub fn trim(&mut self) -> Coord {
        let mut bounds: Option<(Coord, Coord)> = None;
        for (c, _) in self.iter_placed() {
            bounds = Some(match bounds {
                None => (c, c),
                Some((lo, hi)) => (
                    Coord::new(lo.x.min(c.x), lo.y.min(c.y), lo.z.min(c.z)),
                    Coord::new(hi.x.max(c.x), hi.y.max(c.y), hi.z.max(c.z)),
                ),
            });
        }
        let Some((lo, hi)) = bounds else {
            *self = VoxelGrid::new(1, 1, 1);
            return Coord::ZERO;
        };
        let (nw, nh, nd) = (hi.x - lo.x + 1, hi.y - lo.y + 1, hi.z - lo.z + 1);
        let mut resized = VoxelGrid::new(nw, nh, nd);
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if !slot.as_ref().is_some_and(|r| r.placed) {
                continue;
            }
            let x = (i / (self.depth * self.height)) as i32;
            let y = ((i / self.depth) % self.height) as i32;
            let z = (i % self.depth) as i32;
            if let Some(r) = slot.take() {
                resized.set(x - lo.x, y - lo.y, z - lo.z, r);
            }
        }
        log::debug!(
            "trimmed grid {}x{}x{} -> {}x{}x{} (offset {})",
            self.width,
            self.height,
            self.depth,
            nw,
            nh,
            nd,
            lo
        );
        *self = resized;
        lo
    }

    /// Reallocates to new dimensions, keeping records that still fit.
    pub fn resize(&mut self, width: i32, height: i32, depth: i32) {
        let mut next = VoxelGrid::new(width, height, depth);
        let (w, h, d) = (
            self.width.min(next.width),
            self.height.min(next.height),
            self.depth.min(next.depth),
        );
        for x in 0..w {
            for y in 0..h {
                for z in 0..d {
                    let src = self.idx(x, y, z);
                    let dst = next.idx(x, y, z);
                    next.slots[dst] = self.slots[src].take();
                }
            }
        }
        *self = next;
    }

    /// Placed records with their positions, in slot order.
    pub fn iter_placed(&self) -> impl Iterator<Item = (Coord, &BlockRecord)> + '_ {
        self.slots.iter().enumerate().filter_map(move |(i, s)| {
            s.as_ref()
                .filter(|r| r.placed)
                .map(|r| (self.coord_of(i), r))
        })
    }

    /// Every cell of layer `z` as `(x, y, slot)`, x outer, y inner.
    pub fn layer(
        &self,
        z: i32,
    ) -> Result<impl Iterator<Item = (i32, i32, Option<&BlockRecord>)> + '_, GridError> {
        self.checked_idx(0, 0, z)?;
        let (w, h) = (self.width, self.height);
        Ok((0..w).flat_map(move |x| {
            (0..h).map(move |y| {
                let i = self.idx(x, y, z as usize);
                (x as i32, y as i32, self.slots[i].as_ref())
            })
        }))
    }

    #[inline]
    pub fn slots(&self) -> &[Option<BlockRecord>] {
        &self.slots
    }

    pub fn into_flat(self) -> Vec<Option<BlockRecord>> {
        self.slots
    }
}

#[inline]
fn clamp_dim(v: i32) -> usize {
    v.max(1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placed(tag: &str) -> BlockRecord {
        BlockRecord::placed(tag)
    }

    #[test]
    fn non_positive_dims_clamp_to_one() {
        let g = VoxelGrid::new(-1, -1, 0);
        assert_eq!(g.dims(), (1, 1, 1));
        assert_eq!(g.len(), 1);
        let g = VoxelGrid::new(4, 6, 8);
        assert_eq!(g.dims(), (4, 6, 8));
        assert_eq!(g.len(), 4 * 6 * 8);
    }

    #[test]
    fn index_order_is_z_then_y_then_x() {
        let g = VoxelGrid::new(3, 4, 5);
        assert_eq!(g.idx(0, 0, 1), 1);
        assert_eq!(g.idx(0, 1, 0), 5);
        assert_eq!(g.idx(1, 0, 0), 20);
        assert_eq!(g.coord_of(g.idx(2, 3, 4)), Coord::new(2, 3, 4));
    }

    #[test]
    fn set_get_delete() {
        let mut g = VoxelGrid::new(10, 10, 10);
        assert_eq!(g.get(4, 5, 3).unwrap(), None);
        let r = placed("basic_cube");
        assert!(g.set(4, 5, 3, r.clone()));
        assert_eq!(g.get(4, 5, 3).unwrap(), Some(&r));
        assert_eq!(g.delete(4, 5, 3), Some(r));
        assert_eq!(g.get(4, 5, 3).unwrap(), None);
    }

    #[test]
    fn out_of_range_get_fails_but_set_and_delete_are_ignored() {
        let mut g = VoxelGrid::new(4, 4, 4);
        assert!(matches!(g.get(4, 4, 4), Err(GridError::OutOfRange { .. })));
        assert!(matches!(g.get(-1, -1, -1), Err(GridError::OutOfRange { .. })));
        assert!(!g.set(10, 10, 10, placed("basic_cube")));
        assert!(!g.set(-1, 0, 0, placed("basic_cube")));
        assert_eq!(g.count(), 0);
        assert_eq!(g.delete(7, 0, 0), None);
    }

    #[test]
    fn compact_removes_unplaced_records_only() {
        let mut g = VoxelGrid::new(2, 2, 2);
        g.set(0, 0, 0, BlockRecord::default());
        g.set(1, 1, 1, BlockRecord::default());
        g.set(1, 0, 1, placed("basic_cube"));
        assert_eq!(g.count(), 1);
        assert_eq!(g.compact(), 2);
        assert_eq!(g.get(0, 0, 0).unwrap(), None);
        assert!(g.get(1, 0, 1).unwrap().is_some());
        assert_eq!(g.compact(), 0);
    }

    #[test]
    fn trim_single_record_collapses_to_origin() {
        let mut g = VoxelGrid::new(4, 6, 8);
        let r = placed("basic_cube");
        g.set(2, 5, 3, r.clone());
        let offset = g.trim();
        assert_eq!(offset, Coord::new(2, 5, 3));
        assert_eq!(g.dims(), (1, 1, 1));
        assert_eq!(g.get(0, 0, 0).unwrap(), Some(&r));
    }

    #[test]
    fn trim_without_records_resets() {
        let mut g = VoxelGrid::new(4, 6, 8);
        g.set(1, 1, 1, BlockRecord::default());
        assert_eq!(g.trim(), Coord::ZERO);
        assert_eq!(g.dims(), (1, 1, 1));
        assert_eq!(g.get(0, 0, 0).unwrap(), None);
    }

    #[test]
    fn trim_keeps_relative_positions_and_drops_stale() {
        let mut g = VoxelGrid::new(10, 10, 10);
        g.set(2, 3, 4, placed("a"));
        g.set(5, 3, 6, placed("b"));
        g.set(3, 4, 5, BlockRecord::default());
        let offset = g.trim();
        assert_eq!(offset, Coord::new(2, 3, 4));
        assert_eq!(g.dims(), (4, 1, 3));
        assert_eq!(g.get(0, 0, 0).unwrap().map(|r| r.block_type.as_str()), Some("a"));
        assert_eq!(g.get(3, 0, 2).unwrap().map(|r| r.block_type.as_str()), Some("b"));
        assert_eq!(g.count(), 2);
        assert_eq!(g.slots().iter().flatten().count(), 2);
    }

    #[test]
    fn resize_keeps_overlap() {
        let mut g = VoxelGrid::new(4, 4, 4);
        g.set(1, 1, 1, placed("keep"));
        g.set(3, 3, 3, placed("lost"));
        g.resize(2, 2, 5);
        assert_eq!(g.dims(), (2, 2, 5));
        assert_eq!(g.count(), 1);
        assert!(g.get(1, 1, 1).unwrap().is_some());
    }

    #[test]
    fn layer_visits_every_cell_of_one_z() {
        let mut g = VoxelGrid::new(3, 2, 4);
        g.set(2, 1, 3, placed("x"));
        g.set(2, 1, 2, placed("other_layer"));
        let cells: Vec<_> = g.layer(3).unwrap().collect();
        assert_eq!(cells.len(), 6);
        let hits: Vec<_> = cells.iter().filter(|c| c.2.is_some()).map(|c| (c.0, c.1)).collect();
        assert_eq!(hits, vec![(2, 1)]);
        assert!(g.layer(4).is_err());
        assert!(g.layer(-1).is_err());
    }
}
