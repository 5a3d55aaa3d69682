use proptest::prelude::*;
use voxedit_blocks::BlockRecord;
use voxedit_grid::{Coord, VoxelGrid};

fn dim() -> impl Strategy<Value = i32> {
    1i32..=6
}

fn any_dim() -> impl Strategy<Value = i32> {
    -4i32..=6
}

fn tagged(i: usize) -> BlockRecord {
    BlockRecord::placed(format!("t{i}"))
}

proptest! {
    // Requested dims clamp to at least one and the store matches their product
    #[test]
    fn dims_clamp_and_len_matches(w in any_dim(), h in any_dim(), d in any_dim()) {
        let g = VoxelGrid::new(w, h, d);
        let (gw, gh, gd) = g.dims();
        prop_assert_eq!(gw, w.max(1) as usize);
        prop_assert_eq!(gh, h.max(1) as usize);
        prop_assert_eq!(gd, d.max(1) as usize);
        prop_assert_eq!(g.len(), gw * gh * gd);
    }

    // idx maps each (x,y,z) within bounds to a unique in-range slot, and coord_of inverts it
    #[test]
    fn idx_is_unique_and_invertible(w in dim(), h in dim(), d in dim()) {
        let g = VoxelGrid::new(w, h, d);
        let mut seen = vec![false; g.len()];
        for x in 0..w as usize { for y in 0..h as usize { for z in 0..d as usize {
            let i = g.idx(x, y, z);
            prop_assert!(i < g.len());
            prop_assert!(!seen[i]);
            seen[i] = true;
            prop_assert_eq!(g.coord_of(i), Coord::new(x as i32, y as i32, z as i32));
        }}}
        prop_assert!(seen.into_iter().all(|b| b));
    }

    // get agrees with contains: Ok inside, Err outside
    #[test]
    fn get_fails_exactly_outside(w in dim(), h in dim(), d in dim(), x in -2i32..8, y in -2i32..8, z in -2i32..8) {
        let g = VoxelGrid::new(w, h, d);
        let inside = x >= 0 && y >= 0 && z >= 0 && x < w && y < h && z < d;
        prop_assert_eq!(g.contains(x, y, z), inside);
        prop_assert_eq!(g.get(x, y, z).is_ok(), inside);
    }

    // Out-of-range set never changes the placed count
    #[test]
    fn set_outside_is_noop(w in dim(), h in dim(), d in dim(), x in -3i32..10, y in -3i32..10, z in -3i32..10) {
        let mut g = VoxelGrid::new(w, h, d);
        let inside = g.contains(x, y, z);
        let written = g.set(x, y, z, BlockRecord::placed("basic_cube"));
        prop_assert_eq!(written, inside);
        prop_assert_eq!(g.count(), usize::from(inside));
    }

    // Trim keeps every placed record at (old position - offset)
    #[test]
    fn trim_preserves_world_positions(
        w in dim(), h in dim(), d in dim(),
        picks in proptest::collection::vec((0i32..6, 0i32..6, 0i32..6), 0..8),
    ) {
        let mut g = VoxelGrid::new(w, h, d);
        let mut expected = Vec::new();
        for (n, (x, y, z)) in picks.into_iter().enumerate() {
            if g.contains(x, y, z) {
                g.set(x, y, z, tagged(n));
            }
        }
        for (c, r) in g.iter_placed() {
            expected.push((c, r.clone()));
        }
        let offset = g.trim();
        prop_assert_eq!(g.count(), expected.len());
        if expected.is_empty() {
            prop_assert_eq!(offset, Coord::ZERO);
            prop_assert_eq!(g.dims(), (1, 1, 1));
        }
        for (c, r) in expected {
            let local = Coord::new(c.x - offset.x, c.y - offset.y, c.z - offset.z);
            prop_assert_eq!(g.get(local.x, local.y, local.z).unwrap(), Some(&r));
        }
    }

    // from_flat resizes or preserves to the exact length
    #[test]
    fn from_flat_resizes(w in dim(), h in dim(), d in dim(), extra in 0usize..4) {
        let expect = (w * h * d) as usize;
        let ok = VoxelGrid::from_flat(w, h, d, vec![None; expect]);
        prop_assert_eq!(ok.slots().len(), expect);
        let long = VoxelGrid::from_flat(w, h, d, vec![None; expect + extra]);
        prop_assert_eq!(long.slots().len(), expect);
        let short = VoxelGrid::from_flat(w, h, d, vec![None; expect.saturating_sub(1)]);
        prop_assert_eq!(short.slots().len(), expect);
    }
}
