//! Batch edit scripts: a TOML list of editor operations applied in order
//! through [`MapEditor`], so every step is undoable like an interactive edit.
//!
//! ```toml
//! [[op]]
//! action = "place"
//! at = [1, 0, 2]
//! block_type = "basic_cube"
//!
//! [[op]]
//! action = "paint"
//! at = [1, 0, 2]
//! face = "pos_y"
//! material = "terrain_16_0_0"
//!
//! [[op]]
//! action = "undo"
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use voxedit_blocks::{BlockRecord, Face, MaterialKey};
use voxedit_edit::{MapEditor, VisualSink};
use voxedit_grid::Coord;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to read edit script: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid edit script: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EditOp {
    Place {
        at: [i32; 3],
        #[serde(default = "default_block_type")]
        block_type: String,
    },
    Delete {
        at: [i32; 3],
    },
    Paint {
        at: [i32; 3],
        face: Face,
        /// Absent clears the face.
        material: Option<String>,
    },
    Fill {
        at: [i32; 3],
        material: String,
    },
    Replace {
        at: [i32; 3],
        face: Face,
        material: String,
    },
    Rotate {
        at: [i32; 3],
        face: Face,
    },
    Flags {
        at: [i32; 3],
        breakable: Option<bool>,
        trigger_only: Option<bool>,
        exclude_from_mesh: Option<bool>,
    },
    Undo,
    Redo,
    Trim,
    Resize {
        size: [i32; 3],
    },
    Clear,
    Layer {
        z: i32,
    },
}

fn default_block_type() -> String {
    BlockRecord::DEFAULT_TYPE.to_owned()
}

#[inline]
fn coord(at: [i32; 3]) -> Coord {
    Coord::new(at[0], at[1], at[2])
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct EditScript {
    #[serde(default, rename = "op")]
    pub ops: Vec<EditOp>,
}

/// Outcome counts of [`EditScript::apply`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ScriptReport {
    pub applied: usize,
    pub skipped: usize,
}

impl EditScript {
    pub fn from_toml_str(s: &str) -> Result<Self, ScriptError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ScriptError> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    /// Runs every op. Ops that change nothing (occupied cell, empty history,
    /// ...) are counted as skipped rather than failing the script.
    pub fn apply<S: VisualSink>(&self, editor: &mut MapEditor<S>) -> ScriptReport {
        let mut report = ScriptReport::default();
        for (i, op) in self.ops.iter().enumerate() {
            if apply_op(editor, op) {
                report.applied += 1;
            } else {
                log::warn!("edit op #{} had no effect: {:?}", i + 1, op);
                report.skipped += 1;
            }
        }
        report
    }
}

fn apply_op<S: VisualSink>(editor: &mut MapEditor<S>, op: &EditOp) -> bool {
    match op {
        EditOp::Place { at, block_type } => editor.add_block(coord(*at), block_type),
        EditOp::Delete { at } => editor.delete_block(coord(*at)).is_some(),
        EditOp::Paint { at, face, material } => {
            editor.paint_face(coord(*at), *face, material.as_deref().map(MaterialKey::from))
        }
        EditOp::Fill { at, material } => {
            editor.fill_faces(coord(*at), &MaterialKey::from(material.as_str()))
        }
        EditOp::Replace { at, face, material } => {
            editor.replace_material(coord(*at), *face, &MaterialKey::from(material.as_str()))
        }
        EditOp::Rotate { at, face } => editor.rotate_face_texture(coord(*at), *face),
        EditOp::Flags {
            at,
            breakable,
            trigger_only,
            exclude_from_mesh,
        } => editor.update_block(coord(*at), |r| {
            if let Some(v) = breakable {
                r.breakable = *v;
            }
            if let Some(v) = trigger_only {
                r.trigger_only = *v;
            }
            if let Some(v) = exclude_from_mesh {
                r.exclude_from_mesh = *v;
            }
        }),
        EditOp::Undo => editor.undo(),
        EditOp::Redo => editor.redo(),
        EditOp::Trim => {
            editor.trim();
            true
        }
        EditOp::Resize { size } => {
            editor.resize(size[0], size[1], size[2]);
            true
        }
        EditOp::Clear => {
            editor.clear();
            true
        }
        EditOp::Layer { z } => {
            editor.set_selected_layer(*z);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxedit_grid::VoxelGrid;

    #[test]
    fn parses_tagged_ops() {
        let s = EditScript::from_toml_str(
            r#"
            [[op]]
            action = "place"
            at = [0, 1, 2]

            [[op]]
            action = "paint"
            at = [0, 1, 2]
            face = "neg_z"
            material = "m"

            [[op]]
            action = "undo"
            "#,
        )
        .unwrap();
        assert_eq!(s.ops.len(), 3);
        assert_eq!(
            s.ops[0],
            EditOp::Place {
                at: [0, 1, 2],
                block_type: "basic_cube".into()
            }
        );
        assert!(matches!(s.ops[1], EditOp::Paint { face: Face::NegZ, .. }));
        assert_eq!(s.ops[2], EditOp::Undo);
    }

    #[test]
    fn no_op_steps_are_skipped() {
        let script = EditScript {
            ops: vec![
                EditOp::Place {
                    at: [0, 0, 0],
                    block_type: "basic_cube".into(),
                },
                EditOp::Place {
                    at: [0, 0, 0],
                    block_type: "basic_cube".into(),
                },
                EditOp::Redo,
            ],
        };
        let mut ed = MapEditor::headless(VoxelGrid::new(2, 2, 2));
        let report = script.apply(&mut ed);
        assert_eq!(report, ScriptReport { applied: 1, skipped: 2 });
    }
}
