//! Map files: the grid's flat slot array plus the editor state that goes
//! with it, stored as JSON.
#![forbid(unsafe_code)]

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use voxedit_blocks::BlockRecord;
use voxedit_edit::{MapEditor, VisualSink};
use voxedit_grid::{Coord, VoxelGrid};

#[derive(Debug, Error)]
pub enum MapIoError {
    #[error("map file io: {0}")]
    Io(#[from] std::io::Error),
    #[error("map file is not valid: {0}")]
    Json(#[from] serde_json::Error),
    #[error("map dimensions {width}x{height}x{depth} do not fit {blocks} stored slot(s)")]
    Dimensions {
        width: i32,
        height: i32,
        depth: i32,
        blocks: usize,
    },
}

/// Most empty slots a short `blocks` array may be padded with on load.
pub const MAX_PADDED_SLOTS: usize = 1 << 16;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapSaveData {
    /// Slots in grid index order (`z + y*depth + x*depth*height`).
    pub blocks: Vec<Option<BlockRecord>>,
    pub width: i32,
    pub height: i32,
    pub depth: i32,
    #[serde(default)]
    pub selected_layer: usize,
    /// World position of cell (0,0,0); moves when the map is trimmed.
    #[serde(default)]
    pub origin: Coord,
}

impl MapSaveData {
    /// A 1x1x1 map with nothing in it.
    pub fn empty() -> Self {
        Self::from_grid(&VoxelGrid::new(1, 1, 1), 0)
    }

    pub fn from_grid(grid: &VoxelGrid, selected_layer: usize) -> Self {
        let (w, h, d) = grid.dims();
        Self {
            blocks: grid.slots().to_vec(),
            width: w as i32,
            height: h as i32,
            depth: d as i32,
            selected_layer,
            origin: Coord::ZERO,
        }
    }

    pub fn from_editor<S: VisualSink>(editor: &MapEditor<S>) -> Self {
        Self {
            origin: editor.origin(),
            ..Self::from_grid(editor.grid(), editor.selected_layer())
        }
    }

    /// Rebuilds the grid, dropping records that are not marked placed.
    pub fn into_grid(self) -> VoxelGrid {
        let mut grid = VoxelGrid::from_flat(self.width, self.height, self.depth, self.blocks);
        let stale = grid.compact();
        if stale > 0 {
            log::info!("dropped {} stale record(s) from map data", stale);
        }
        grid
    }

    pub fn into_editor<S: VisualSink>(self, sink: S) -> MapEditor<S> {
        let (origin, layer) = (self.origin, self.selected_layer);
        let mut editor = MapEditor::new(self.into_grid(), sink).with_origin(origin);
        editor.set_selected_layer(layer as i32);
        editor
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), MapIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        log::info!(
            "saved {}x{}x{} map to {:?}",
            self.width,
            self.height,
            self.depth,
            path.as_ref()
        );
        Ok(())
    }

    /// Slot count the stored dimensions describe, after the grid's clamp of
    /// non-positive sizes to 1. `None` on overflow.
    pub fn cell_count(&self) -> Option<usize> {
        let dim = |v: i32| v.max(1) as usize;
        dim(self.width)
            .checked_mul(dim(self.height))?
            .checked_mul(dim(self.depth))
    }

    /// Rejects dimensions that overflow or that would pad `blocks` with more
    /// than [`MAX_PADDED_SLOTS`] empties.
    pub fn validate(&self) -> Result<(), MapIoError> {
        let fits = self
            .cell_count()
            .is_some_and(|cells| cells.saturating_sub(self.blocks.len()) <= MAX_PADDED_SLOTS);
        if fits {
            Ok(())
        } else {
            Err(MapIoError::Dimensions {
                width: self.width,
                height: self.height,
                depth: self.depth,
                blocks: self.blocks.len(),
            })
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, MapIoError> {
        let s = fs::read_to_string(path.as_ref())?;
        let data: MapSaveData = serde_json::from_str(&s)?;
        data.validate()?;
        log::debug!(
            "loaded {}x{}x{} map from {:?}",
            data.width,
            data.height,
            data.depth,
            path.as_ref()
        );
        Ok(data)
    }

    /// Like [`MapSaveData::load`], but a missing, unreadable or malformed
    /// file yields an empty map.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("could not load map {:?}: {}; starting empty", path.as_ref(), e);
                Self::empty()
            }
        }
    }

    /// Empty map only when nothing exists at `path` yet. Any other failure is
    /// returned, so callers that save back to `path` never clobber a bad file.
    pub fn load_or_new(path: impl AsRef<Path>) -> Result<Self, MapIoError> {
        match Self::load(path.as_ref()) {
            Err(MapIoError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("no map at {:?}; starting empty", path.as_ref());
                Ok(Self::empty())
            }
            other => other,
        }
    }
}
