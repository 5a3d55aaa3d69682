use voxedit_blocks::{BlockCatalog, BlockRecord, Face, MaterialKey};
use voxedit_grid::{Coord, VoxelGrid};

use crate::command::{CommandTarget, EditCommand};
use crate::history::CommandHistory;

/// Receives notifications so a front-end can keep its per-cell visuals in
/// step with the grid.
pub trait VisualSink {
    fn cell_changed(&mut self, coord: Coord, record: Option<&BlockRecord>);
    /// The whole grid was swapped (load, trim, resize, clear).
    fn grid_replaced(&mut self, grid: &VoxelGrid);
}

#[derive(Default, Debug, Clone, Copy)]
pub struct NullSink;

impl VisualSink for NullSink {
    fn cell_changed(&mut self, _coord: Coord, _record: Option<&BlockRecord>) {}
    fn grid_replaced(&mut self, _grid: &VoxelGrid) {}
}

/// Grid + sink view that commands write through.
struct CellWriter<'a, S: VisualSink> {
    grid: &'a mut VoxelGrid,
    sink: &'a mut S,
    rev: &'a mut u64,
}

impl<S: VisualSink> CommandTarget for CellWriter<'_, S> {
    fn apply_record(&mut self, coord: Coord, record: Option<&BlockRecord>) {
        match record {
            Some(r) => {
                self.grid.set(coord.x, coord.y, coord.z, r.clone());
            }
            None => {
                self.grid.delete(coord.x, coord.y, coord.z);
            }
        }
        *self.rev = self.rev.wrapping_add(1).max(1);
        self.sink.cell_changed(coord, record);
    }
}

/// An editable map: grid, undo history, world placement, and the layer the
/// operator is working on.
pub struct MapEditor<S: VisualSink = NullSink> {
    grid: VoxelGrid,
    history: CommandHistory,
    catalog: BlockCatalog,
    sink: S,
    /// World position of cell (0,0,0).
    origin: Coord,
    selected_layer: usize,
    // Change tracking
    rev: u64,
    built: u64,
}

impl MapEditor<NullSink> {
    pub fn headless(grid: VoxelGrid) -> Self {
        Self::new(grid, NullSink)
    }
}

impl<S: VisualSink> MapEditor<S> {
    pub fn new(grid: VoxelGrid, mut sink: S) -> Self {
        sink.grid_replaced(&grid);
        Self {
            grid,
            history: CommandHistory::default(),
            catalog: BlockCatalog::new(),
            sink,
            origin: Coord::ZERO,
            selected_layer: 0,
            rev: 1,
            built: 0,
        }
    }

    pub fn with_history_depth(mut self, depth: usize) -> Self {
        self.history = CommandHistory::new(depth);
        self
    }

    pub fn with_catalog(mut self, catalog: BlockCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_origin(mut self, origin: Coord) -> Self {
        self.origin = origin;
        self
    }

    #[inline]
    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    #[inline]
    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    #[inline]
    pub fn catalog(&self) -> &BlockCatalog {
        &self.catalog
    }

    #[inline]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    #[inline]
    pub fn origin(&self) -> Coord {
        self.origin
    }

    #[inline]
    pub fn selected_layer(&self) -> usize {
        self.selected_layer
    }

    /// Selects a layer, clamped to the grid depth.
    pub fn set_selected_layer(&mut self, layer: i32) {
        self.selected_layer = (layer.max(0) as usize).min(self.grid.depth() - 1);
    }

    /// Cell holding world position `world`.
    #[inline]
    pub fn cell_at_world(&self, world: Coord) -> Coord {
        Coord::new(
            world.x - self.origin.x,
            world.y - self.origin.y,
            world.z - self.origin.z,
        )
    }

    /// Splits the editor into its history and a writer over the rest.
    fn history_and_writer(&mut self) -> (&mut CommandHistory, CellWriter<'_, S>) {
        let Self {
            grid,
            history,
            sink,
            rev,
            ..
        } = self;
        (history, CellWriter { grid, sink, rev })
    }

    fn execute(&mut self, cmd: EditCommand) {
        let (history, mut writer) = self.history_and_writer();
        cmd.redo(&mut writer);
        log::debug!("{:?} at {}", cmd.kind, cmd.coord);
        history.register(cmd);
    }

    /// Places a new block of `block_type` using the catalog template.
    /// Returns `false` if the cell is outside the grid or already occupied.
    pub fn add_block(&mut self, coord: Coord, block_type: &str) -> bool {
        let record = self.catalog.instantiate(block_type);
        self.add_record(coord, record)
    }

    pub fn add_record(&mut self, coord: Coord, mut record: BlockRecord) -> bool {
        if !self.grid.contains(coord.x, coord.y, coord.z)
            || self.grid.placed_at(coord.x, coord.y, coord.z).is_some()
        {
            return false;
        }
        record.placed = true;
        self.execute(EditCommand::place(coord, record));
        true
    }

    /// Removes the block at `coord`, returning it.
    pub fn delete_block(&mut self, coord: Coord) -> Option<BlockRecord> {
        let prior = self.grid.placed_at(coord.x, coord.y, coord.z)?.clone();
        self.execute(EditCommand::delete(coord, prior.clone()));
        Some(prior)
    }

    /// Edits the placed block at `coord` in place as one undoable step.
    /// Returns `false` when there is no block or `f` changed nothing.
    pub fn update_block(&mut self, coord: Coord, f: impl FnOnce(&mut BlockRecord)) -> bool {
        let Some(before) = self.grid.placed_at(coord.x, coord.y, coord.z).cloned() else {
            return false;
        };
        let mut after = before.clone();
        f(&mut after);
        after.placed = true;
        if after == before {
            return false;
        }
        self.execute(EditCommand::paint(coord, before, after));
        true
    }

    pub fn paint_face(&mut self, coord: Coord, face: Face, key: Option<MaterialKey>) -> bool {
        self.update_block(coord, |r| r.set_material(face, key))
    }

    pub fn fill_faces(&mut self, coord: Coord, key: &MaterialKey) -> bool {
        self.update_block(coord, |r| r.fill_materials(key))
    }

    /// Repaints every face sharing `face`'s material.
    pub fn replace_material(&mut self, coord: Coord, face: Face, key: &MaterialKey) -> bool {
        self.update_block(coord, |r| {
            r.replace_material(face, key);
        })
    }

    pub fn rotate_face_texture(&mut self, coord: Coord, face: Face) -> bool {
        self.update_block(coord, |r| {
            r.rotate_face(face);
        })
    }

    /// Material on `face` of the block at `coord`, if any.
    pub fn pick_material(&self, coord: Coord, face: Face) -> Option<MaterialKey> {
        self.grid
            .placed_at(coord.x, coord.y, coord.z)?
            .material(face)
            .cloned()
    }

    pub fn undo(&mut self) -> bool {
        let (history, mut writer) = self.history_and_writer();
        history.undo(&mut writer).is_some()
    }

    pub fn redo(&mut self) -> bool {
        let (history, mut writer) = self.history_and_writer();
        history.redo(&mut writer).is_some()
    }

    /// Shrinks the grid to its content and moves the origin so blocks keep
    /// their world positions. Returns the applied offset.
    pub fn trim(&mut self) -> Coord {
        let mut grid = std::mem::replace(&mut self.grid, VoxelGrid::new(1, 1, 1));
        let offset = grid.trim();
        self.origin = self.origin + offset;
        self.replace_grid(grid);
        offset
    }

    pub fn resize(&mut self, width: i32, height: i32, depth: i32) {
        let mut grid = std::mem::replace(&mut self.grid, VoxelGrid::new(1, 1, 1));
        grid.resize(width, height, depth);
        self.replace_grid(grid);
    }

    /// Empties the map, keeping its dimensions.
    pub fn clear(&mut self) {
        let (w, h, d) = self.grid.dims();
        self.replace_grid(VoxelGrid::new(w as i32, h as i32, d as i32));
    }

    /// Swaps in a whole new grid. History refers to cells of the old grid, so
    /// it is dropped.
    pub fn replace_grid(&mut self, grid: VoxelGrid) {
        self.grid = grid;
        self.history.clear();
        let layer = self.selected_layer as i32;
        self.set_selected_layer(layer);
        self.rev = self.rev.wrapping_add(1).max(1);
        self.sink.grid_replaced(&self.grid);
        log::info!(
            "map grid now {}x{}x{} with {} block(s)",
            self.grid.width(),
            self.grid.height(),
            self.grid.depth(),
            self.grid.count()
        );
    }

    pub fn into_grid(self) -> VoxelGrid {
        self.grid
    }

    // --- change tracking ---

    #[inline]
    pub fn rev(&self) -> u64 {
        self.rev
    }

    pub fn mark_built(&mut self, rev: u64) {
        if rev > self.built {
            self.built = rev;
        }
    }

    #[inline]
    pub fn needs_rebuild(&self) -> bool {
        self.rev > self.built
    }
}
