use voxedit_geom::{Aabb, Vec2, Vec3};

/// Triangle mesh in flat attribute arrays. Geometry is always emitted as
/// quads: four consecutive vertices and six indices per quad.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct MeshBuild {
    pub pos: Vec<f32>,
    pub norm: Vec<f32>,
    pub uv: Vec<f32>,
    /// Secondary UV set for baked lighting; empty until generated.
    pub uv2: Vec<f32>,
    pub idx: Vec<u32>,
}

/// Fraction of a lightmap cell left empty on each side of a quad.
const LIGHTMAP_PAD: f32 = 0.0625;

impl MeshBuild {
    /// Clears all arrays but retains capacity for reuse.
    #[inline]
    pub fn clear_keep_capacity(&mut self) {
        self.pos.clear();
        self.norm.clear();
        self.uv.clear();
        self.uv2.clear();
        self.idx.clear();
    }

    /// Pre-reserve capacity for approximately `n_quads` quads worth of data.
    #[inline]
    pub fn reserve_quads(&mut self, n_quads: usize) {
        self.pos.reserve(n_quads * 4 * 3);
        self.norm.reserve(n_quads * 4 * 3);
        self.uv.reserve(n_quads * 4 * 2);
        self.idx.reserve(n_quads * 6);
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.pos.len() / 3
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.idx.len() / 3
    }

    #[inline]
    pub fn quad_count(&self) -> usize {
        self.vertex_count() / 4
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.idx.is_empty()
    }

    #[inline]
    pub fn position(&self, i: usize) -> Vec3 {
        Vec3::new(self.pos[i * 3], self.pos[i * 3 + 1], self.pos[i * 3 + 2])
    }

    #[inline]
    pub fn normal(&self, i: usize) -> Vec3 {
        Vec3::new(self.norm[i * 3], self.norm[i * 3 + 1], self.norm[i * 3 + 2])
    }

    #[inline]
    pub fn uv_at(&self, i: usize) -> Vec2 {
        Vec2::new(self.uv[i * 2], self.uv[i * 2 + 1])
    }

    pub fn uv2_at(&self, i: usize) -> Option<Vec2> {
        (self.uv2.len() >= (i + 1) * 2).then(|| Vec2::new(self.uv2[i * 2], self.uv2[i * 2 + 1]))
    }

    /// Appends a quad with explicit per-vertex UVs. Corners are reordered if
    /// needed so the front face winds counter-clockwise around `n`.
    pub fn add_quad(&mut self, corners: [Vec3; 4], n: Vec3, uvs: [Vec2; 4]) {
        let base = self.vertex_count() as u32;
        let mut vs = corners;
        let mut uvs = uvs;
        let cross = (vs[1] - vs[0]).cross(vs[2] - vs[0]);
        if cross.dot(n) < 0.0 {
            vs.swap(1, 3);
            uvs.swap(1, 3);
        }
        for i in 0..4 {
            self.pos.extend_from_slice(&[vs[i].x, vs[i].y, vs[i].z]);
            self.norm.extend_from_slice(&[n.x, n.y, n.z]);
            self.uv.extend_from_slice(&[uvs[i].x, uvs[i].y]);
        }
        self.idx
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Rewrites every primary UV through `f`.
    pub fn map_uvs(&mut self, mut f: impl FnMut(Vec2) -> Vec2) {
        for uv in self.uv.chunks_exact_mut(2) {
            let out = f(Vec2::new(uv[0], uv[1]));
            uv[0] = out.x;
            uv[1] = out.y;
        }
    }

    /// Appends `other` with its positions shifted by `offset`.
    pub fn append_translated(&mut self, other: &MeshBuild, offset: Vec3) {
        let base = self.vertex_count() as u32;
        for p in other.pos.chunks_exact(3) {
            self.pos
                .extend_from_slice(&[p[0] + offset.x, p[1] + offset.y, p[2] + offset.z]);
        }
        self.norm.extend_from_slice(&other.norm);
        self.uv.extend_from_slice(&other.uv);
        self.idx.extend(other.idx.iter().map(|i| i + base));
        // A partial secondary set would misalign; drop it.
        self.uv2.clear();
    }

    pub fn bounds(&self) -> Option<Aabb> {
        let mut it = (0..self.vertex_count()).map(|i| self.position(i));
        let mut aabb = Aabb::from_point(it.next()?);
        for p in it {
            aabb.extend(p);
        }
        Some(aabb)
    }

    /// Lays every quad out in its own cell of a square grid covering
    /// `[0,1]²` so no two quads share lightmap texels.
    pub fn generate_lightmap_uvs(&mut self) {
        const CORNERS: [Vec2; 4] = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        let quads = self.quad_count();
        self.uv2.clear();
        if quads == 0 {
            return;
        }
        let cells = (quads as f32).sqrt().ceil() as usize;
        let cell = 1.0 / cells as f32;
        let inner = cell * (1.0 - 2.0 * LIGHTMAP_PAD);
        self.uv2.reserve(quads * 8);
        for q in 0..quads {
            let ox = (q % cells) as f32 * cell + cell * LIGHTMAP_PAD;
            let oy = (q / cells) as f32 * cell + cell * LIGHTMAP_PAD;
            for c in CORNERS {
                self.uv2.extend_from_slice(&[ox + c.x * inner, oy + c.y * inner]);
            }
        }
        log::trace!("lightmap uvs: {} quad(s) in a {}x{} layout", quads, cells, cells);
    }
}
