use std::collections::VecDeque;

use crate::command::{CommandTarget, EditCommand};

pub const DEFAULT_HISTORY_DEPTH: usize = 50;

/// Linear undo/redo stacks. Registering a new command drops the redo stack;
/// past `depth` entries the oldest undo entry is evicted.
#[derive(Clone, Debug)]
pub struct CommandHistory {
    undo: VecDeque<EditCommand>,
    redo: Vec<EditCommand>,
    depth: usize,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DEPTH)
    }
}

impl CommandHistory {
    /// `depth` of zero is treated as one.
    pub fn new(depth: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            depth: depth.max(1),
        }
    }

    pub fn register(&mut self, cmd: EditCommand) {
        self.undo.push_back(cmd);
        if self.undo.len() > self.depth {
            self.undo.pop_front();
        }
        self.redo.clear();
    }

    /// Reverts the newest command. Returns it, or `None` if there was nothing
    /// to undo.
    pub fn undo(&mut self, target: &mut dyn CommandTarget) -> Option<&EditCommand> {
        let cmd = self.undo.pop_back()?;
        cmd.undo(target);
        self.redo.push(cmd);
        self.redo.last()
    }

    pub fn redo(&mut self, target: &mut dyn CommandTarget) -> Option<&EditCommand> {
        let cmd = self.redo.pop()?;
        cmd.redo(target);
        self.undo.push_back(cmd);
        self.undo.back()
    }

    #[inline]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    #[inline]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    #[inline]
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    #[inline]
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
