use serde::{Deserialize, Serialize};
use voxedit_blocks::BlockRecord;
use voxedit_grid::Coord;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditKind {
    Place,
    Delete,
    Paint,
}

/// One reversible change to a single cell: the record before and after.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EditCommand {
    pub kind: EditKind,
    pub coord: Coord,
    pub before: Option<BlockRecord>,
    pub after: Option<BlockRecord>,
}

impl EditCommand {
    pub fn place(coord: Coord, record: BlockRecord) -> Self {
        Self {
            kind: EditKind::Place,
            coord,
            before: None,
            after: Some(record),
        }
    }

    pub fn delete(coord: Coord, prior: BlockRecord) -> Self {
        Self {
            kind: EditKind::Delete,
            coord,
            before: Some(prior),
            after: None,
        }
    }

    pub fn paint(coord: Coord, before: BlockRecord, after: BlockRecord) -> Self {
        Self {
            kind: EditKind::Paint,
            coord,
            before: Some(before),
            after: Some(after),
        }
    }

    /// Restores the cell to its state before the edit.
    pub fn undo(&self, target: &mut dyn CommandTarget) {
        target.apply_record(self.coord, self.before.as_ref());
    }

    /// Re-applies the edit.
    pub fn redo(&self, target: &mut dyn CommandTarget) {
        target.apply_record(self.coord, self.after.as_ref());
    }
}

/// Whatever owns the grid a command writes into. Implementations must also
/// refresh any cached visuals of the cell.
pub trait CommandTarget {
    fn apply_record(&mut self, coord: Coord, record: Option<&BlockRecord>);
}
