use voxedit_blocks::{BlockCatalog, BlockRecord, Face, MaterialKey};
use voxedit_edit::{MapEditor, VisualSink};
use voxedit_grid::{Coord, VoxelGrid};

#[derive(Default)]
struct Recorder {
    changed: Vec<(Coord, bool)>,
    replaced: usize,
}

impl VisualSink for Recorder {
    fn cell_changed(&mut self, coord: Coord, record: Option<&BlockRecord>) {
        self.changed.push((coord, record.is_some()));
    }
    fn grid_replaced(&mut self, _grid: &VoxelGrid) {
        self.replaced += 1;
    }
}

fn editor() -> MapEditor<Recorder> {
    MapEditor::new(VoxelGrid::new(8, 8, 4), Recorder::default())
}

#[test]
fn n_undos_restore_empty_grid() {
    let mut ed = editor();
    let cells = [Coord::new(0, 0, 0), Coord::new(1, 2, 3), Coord::new(7, 7, 0)];
    for c in cells {
        assert!(ed.add_block(c, "basic_cube"));
    }
    assert!(ed.delete_block(cells[1]).is_some());
    assert!(ed.paint_face(cells[0], Face::PosY, Some(MaterialKey::from("grass"))));
    assert_eq!(ed.grid().count(), 2);
    for _ in 0..5 {
        assert!(ed.undo());
    }
    assert!(!ed.undo());
    assert_eq!(ed.grid().count(), 0);
    assert!(ed.grid().slots().iter().all(|s| s.is_none()));
}

#[test]
fn redo_after_fresh_edit_is_noop() {
    let mut ed = editor();
    ed.add_block(Coord::new(1, 1, 1), "basic_cube");
    ed.add_block(Coord::new(2, 1, 1), "basic_cube");
    assert!(ed.undo());
    ed.add_block(Coord::new(3, 1, 1), "basic_cube");
    assert!(!ed.redo());
    assert!(ed.grid().placed_at(2, 1, 1).is_none());
    assert_eq!(ed.grid().count(), 2);
}

#[test]
fn redo_reapplies_delete_and_notifies_sink() {
    let mut ed = editor();
    let c = Coord::new(4, 4, 2);
    ed.add_block(c, "basic_cube");
    ed.delete_block(c);
    assert!(ed.undo());
    assert!(ed.grid().placed_at(4, 4, 2).is_some());
    assert!(ed.redo());
    assert!(ed.grid().placed_at(4, 4, 2).is_none());
    let flags: Vec<bool> = ed.sink().changed.iter().map(|(_, present)| *present).collect();
    assert_eq!(flags, vec![true, false, true, false]);
}

#[test]
fn add_rejects_occupied_and_out_of_range() {
    let mut ed = editor();
    assert!(ed.add_block(Coord::new(0, 0, 0), "basic_cube"));
    assert!(!ed.add_block(Coord::new(0, 0, 0), "other"));
    assert!(!ed.add_block(Coord::new(8, 0, 0), "basic_cube"));
    assert!(!ed.add_block(Coord::new(0, -1, 0), "basic_cube"));
    assert_eq!(ed.history().undo_len(), 1);
}

#[test]
fn add_over_stale_record_is_allowed() {
    let mut grid = VoxelGrid::new(2, 2, 2);
    grid.set(1, 1, 1, BlockRecord::default());
    let mut ed = MapEditor::headless(grid);
    assert!(ed.add_block(Coord::new(1, 1, 1), "basic_cube"));
    assert!(ed.grid().placed_at(1, 1, 1).is_some());
}

#[test]
fn paint_family_is_undoable() {
    let mut ed = editor();
    let c = Coord::new(2, 2, 2);
    ed.add_block(c, "basic_cube");
    let dirt = MaterialKey::from("dirt");
    let stone = MaterialKey::from("stone");
    assert!(ed.fill_faces(c, &dirt));
    assert!(ed.paint_face(c, Face::PosY, Some(MaterialKey::from("grass"))));
    assert!(ed.replace_material(c, Face::NegX, &stone));
    assert!(ed.rotate_face_texture(c, Face::PosZ));
    let r = ed.grid().placed_at(2, 2, 2).unwrap();
    assert_eq!(r.material(Face::NegY), Some(&stone));
    assert_eq!(r.material(Face::PosY).map(|k| k.as_str()), Some("grass"));
    assert_eq!(r.rotation(Face::PosZ), 1);
    assert_eq!(ed.pick_material(c, Face::PosY), Some(MaterialKey::from("grass")));

    ed.undo();
    ed.undo();
    let r = ed.grid().placed_at(2, 2, 2).unwrap();
    assert_eq!(r.rotation(Face::PosZ), 0);
    assert_eq!(r.material(Face::NegY), Some(&dirt));
}

#[test]
fn noop_paint_registers_nothing() {
    let mut ed = editor();
    let c = Coord::new(0, 0, 0);
    ed.add_block(c, "basic_cube");
    let key = MaterialKey::from("dirt");
    assert!(ed.fill_faces(c, &key));
    assert!(!ed.fill_faces(c, &key));
    assert!(!ed.paint_face(Coord::new(5, 5, 0), Face::PosY, Some(key)));
    assert_eq!(ed.history().undo_len(), 2);
}

#[test]
fn update_block_sets_flags() {
    let mut ed = editor();
    let c = Coord::new(3, 0, 1);
    ed.add_block(c, "basic_cube");
    assert!(ed.update_block(c, |r| {
        r.breakable = true;
        r.exclude_from_mesh = true;
    }));
    let r = ed.grid().placed_at(3, 0, 1).unwrap();
    assert!(r.breakable && r.exclude_from_mesh);
}

#[test]
fn catalog_templates_apply_on_place() {
    let catalog = BlockCatalog::from_toml_str(
        r#"
        [blocks.spikes]
        trigger_only = true
    "#,
    )
    .unwrap();
    let mut ed = editor().with_catalog(catalog);
    ed.add_block(Coord::new(1, 1, 1), "spikes");
    assert!(ed.grid().placed_at(1, 1, 1).unwrap().trigger_only);
}

#[test]
fn trim_moves_origin_and_clears_history() {
    let mut ed = editor().with_origin(Coord::new(10, 0, 0));
    ed.add_block(Coord::new(2, 3, 1), "basic_cube");
    ed.add_block(Coord::new(4, 3, 2), "basic_cube");
    let world = Coord::new(14, 3, 2);
    assert_eq!(ed.cell_at_world(world), Coord::new(4, 3, 2));
    let offset = ed.trim();
    assert_eq!(offset, Coord::new(2, 3, 1));
    assert_eq!(ed.origin(), Coord::new(12, 3, 1));
    assert_eq!(ed.grid().dims(), (3, 1, 2));
    let cell = ed.cell_at_world(world);
    assert!(ed.grid().placed_at(cell.x, cell.y, cell.z).is_some());
    assert!(!ed.history().can_undo());
    assert!(!ed.undo());
    assert_eq!(ed.sink().replaced, 2);
}

#[test]
fn selected_layer_is_clamped() {
    let mut ed = editor();
    ed.set_selected_layer(2);
    assert_eq!(ed.selected_layer(), 2);
    ed.set_selected_layer(99);
    assert_eq!(ed.selected_layer(), 3);
    ed.set_selected_layer(-5);
    assert_eq!(ed.selected_layer(), 0);
    ed.set_selected_layer(3);
    ed.resize(8, 8, 2);
    assert_eq!(ed.selected_layer(), 1);
}

#[test]
fn rev_tracks_unbuilt_changes() {
    let mut ed = editor();
    let r0 = ed.rev();
    ed.mark_built(r0);
    assert!(!ed.needs_rebuild());
    ed.add_block(Coord::new(0, 0, 0), "basic_cube");
    assert!(ed.rev() > r0);
    assert!(ed.needs_rebuild());
    ed.mark_built(ed.rev());
    assert!(!ed.needs_rebuild());
    ed.mark_built(r0);
    assert!(!ed.needs_rebuild());
}

#[test]
fn undo_and_redo_bump_rev_like_edits() {
    let mut ed = editor();
    let c = Coord::new(2, 2, 2);
    ed.add_block(c, "basic_cube");
    ed.mark_built(ed.rev());
    assert!(ed.undo());
    assert!(ed.needs_rebuild());
    ed.mark_built(ed.rev());
    assert!(ed.redo());
    assert!(ed.needs_rebuild());
    assert_eq!(ed.sink().changed, vec![(c, true), (c, false), (c, true)]);
}
