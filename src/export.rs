//! Wavefront OBJ/MTL output for synthesized maps.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use voxedit_geom::Vec3;
use voxedit_mesh_cpu::{CombinedMesh, SynthesizedMap};

/// Writes `mesh` as one OBJ object, one group per submesh. Vertex indices
/// continue from `base` (OBJ indices are global and 1-based).
fn write_object<W: Write>(
    w: &mut W,
    mesh: &CombinedMesh,
    offset: Vec3,
    base: usize,
) -> io::Result<usize> {
    let m = &mesh.mesh;
    writeln!(w, "o {}", mesh.name)?;
    for i in 0..m.vertex_count() {
        let p = m.position(i) + offset;
        writeln!(w, "v {} {} {}", p.x, p.y, p.z)?;
    }
    for i in 0..m.vertex_count() {
        let uv = m.uv_at(i);
        // OBJ texture space has v pointing up.
        writeln!(w, "vt {} {}", uv.x, 1.0 - uv.y)?;
    }
    for i in 0..m.vertex_count() {
        let n = m.normal(i);
        writeln!(w, "vn {} {} {}", n.x, n.y, n.z)?;
    }
    for sub in &mesh.submeshes {
        writeln!(w, "g {}", sub.material)?;
        let tris = m.idx[sub.first_index..sub.first_index + sub.index_count].chunks_exact(3);
        for t in tris {
            let (a, b, c) = (
                t[0] as usize + base + 1,
                t[1] as usize + base + 1,
                t[2] as usize + base + 1,
            );
            writeln!(w, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}")?;
        }
    }
    Ok(base + m.vertex_count())
}

/// Writes the bulk mesh and every standalone object (moved to its position)
/// into one OBJ stream that uses a single atlas material.
pub fn write_obj<W: Write>(w: &mut W, map: &SynthesizedMap, mtl_file: &str) -> io::Result<()> {
    writeln!(w, "mtllib {}", mtl_file)?;
    writeln!(w, "usemtl {}", map.atlas.name)?;
    let mut base = write_object(w, &map.mesh, Vec3::ZERO, 0)?;
    for obj in &map.objects {
        base = write_object(w, &obj.mesh, obj.position, base)?;
    }
    Ok(())
}

pub fn write_mtl<W: Write>(w: &mut W, material: &str, texture_file: &str) -> io::Result<()> {
    writeln!(w, "newmtl {}", material)?;
    writeln!(w, "Kd 1 1 1")?;
    writeln!(w, "map_Kd {}", texture_file)?;
    Ok(())
}

fn file_name(p: &Path) -> String {
    p.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Files written by [`export_map`].
#[derive(Debug, Clone)]
pub struct ExportedFiles {
    pub obj: PathBuf,
    pub mtl: PathBuf,
    pub atlas: PathBuf,
}

/// Writes `<name>.obj`, `<name>.mtl` and the atlas PNG into `dir`.
pub fn export_map(
    map: &SynthesizedMap,
    dir: &Path,
    name: &str,
) -> Result<ExportedFiles, Box<dyn std::error::Error>> {
    fs::create_dir_all(dir)?;
    let files = ExportedFiles {
        obj: dir.join(format!("{name}.obj")),
        mtl: dir.join(format!("{name}.mtl")),
        atlas: dir.join(format!("{}.png", map.atlas.name)),
    };

    let mut obj = BufWriter::new(File::create(&files.obj)?);
    write_obj(&mut obj, map, &file_name(&files.mtl))?;
    obj.flush()?;

    let mut mtl = BufWriter::new(File::create(&files.mtl)?);
    write_mtl(&mut mtl, &map.atlas.name, &file_name(&files.atlas))?;
    mtl.flush()?;

    map.atlas.save_png(&files.atlas)?;
    log::info!("exported {} to {:?}", name, files.obj);
    Ok(files)
}
