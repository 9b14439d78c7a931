//! Wavefront OBJ format support.
//!
//! Saving writes one `vt` per face loop when the mesh has a UV layer, so
//! the decal placement computed by the label engine survives export. An
//! optional companion MTL file binds the base image as the diffuse map.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use nalgebra::{Point2, Point3};

use crate::error::{Result, SynthError};
use crate::mesh::{build_from_polygons, PieceMesh};
use crate::uv::UvLayer;

/// Material written next to an OBJ file.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjMaterial {
    /// Material name used by `usemtl`.
    pub name: String,
    /// Diffuse texture path (`map_Kd`).
    pub diffuse_map: Option<PathBuf>,
    /// Specular intensity written as a grey `Ks`.
    pub specular: f64,
}

/// Save a mesh as OBJ. When `material` is given, an MTL file with the same
/// stem is written next to it and referenced with `mtllib`.
pub fn save_obj<P: AsRef<Path>>(
    mesh: &PieceMesh,
    path: P,
    material: Option<&ObjMaterial>,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "# Generated by jigsaw-synth")?;
    if let Some(mat) = material {
        let mtl_path = path.with_extension("mtl");
        save_mtl(mat, &mtl_path)?;
        let mtl_name = mtl_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        writeln!(writer, "mtllib {}", mtl_name)?;
    }

    for p in mesh.positions() {
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }
    let uv = mesh.uv();
    if let Some(layer) = uv {
        for t in layer.as_slice() {
            writeln!(writer, "vt {} {}", t.x, t.y)?;
        }
    }
    if let Some(mat) = material {
        writeln!(writer, "usemtl {}", mat.name)?;
    }

    // OBJ indices are 1-based
    for f in mesh.face_ids() {
        write!(writer, "f")?;
        for l in mesh.face_loops(f) {
            let v = mesh.loop_vertex(l).index() + 1;
            if uv.is_some() {
                write!(writer, " {}/{}", v, l.index() + 1)?;
            } else {
                write!(writer, " {}", v)?;
            }
        }
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write a single-material MTL file.
pub fn save_mtl<P: AsRef<Path>>(material: &ObjMaterial, path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    writeln!(writer, "newmtl {}", material.name)?;
    writeln!(writer, "Kd 1 1 1")?;
    writeln!(writer, "Ks {0} {0} {0}", material.specular)?;
    if let Some(map) = &material.diffuse_map {
        writeln!(writer, "map_Kd {}", map.display())?;
    }
    writer.flush()?;
    Ok(())
}

/// Load positions, polygons and per-loop UVs from an OBJ file.
///
/// Normals, groups and materials are ignored. The UV layer is only kept when
/// every face corner references a texture coordinate.
pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<PieceMesh> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let load_error = |line: usize, message: &str| SynthError::LoadError {
        path: path.to_path_buf(),
        message: format!("line {}: {}", line, message),
    };

    let mut positions: Vec<Point3<f64>> = Vec::new();
    let mut texcoords: Vec<Point2<f64>> = Vec::new();
    let mut faces: Vec<Vec<usize>> = Vec::new();
    let mut loop_uvs: Vec<Option<usize>> = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let lineno = i + 1;
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("v") => {
                let c = parse_floats::<3>(tokens).ok_or_else(|| load_error(lineno, "bad vertex"))?;
                positions.push(Point3::new(c[0], c[1], c[2]));
            }
            Some("vt") => {
                let c = parse_floats::<2>(tokens).ok_or_else(|| load_error(lineno, "bad texcoord"))?;
                texcoords.push(Point2::new(c[0], c[1]));
            }
            Some("f") => {
                let mut face = Vec::new();
                for corner in tokens {
                    let mut parts = corner.split('/');
                    let v = parts
                        .next()
                        .and_then(|s| resolve_index(s, positions.len()))
                        .ok_or_else(|| load_error(lineno, "bad face index"))?;
                    let t = parts
                        .next()
                        .filter(|s| !s.is_empty())
                        .and_then(|s| resolve_index(s, texcoords.len()));
                    face.push(v);
                    loop_uvs.push(t);
                }
                faces.push(face);
            }
            _ => {}
        }
    }

    let mut mesh = build_from_polygons(&positions, &faces)?;
    let uvs: Option<Vec<Point2<f64>>> = loop_uvs
        .iter()
        .map(|t| t.and_then(|t| texcoords.get(t).copied()))
        .collect();
    if let Some(uvs) = uvs {
        mesh.set_uv(Some(UvLayer::new(uvs)));
    }
    Ok(mesh)
}

fn parse_floats<'a, const N: usize>(mut tokens: impl Iterator<Item = &'a str>) -> Option<[f64; N]> {
    let mut out = [0.0; N];
    for slot in &mut out {
        *slot = tokens.next()?.parse().ok()?;
    }
    Some(out)
}

/// Convert a 1-based (or negative, relative) OBJ index to 0-based.
fn resolve_index(token: &str, count: usize) -> Option<usize> {
    let i: i64 = token.parse().ok()?;
    match i {
        0 => None,
        i if i > 0 => Some(i as usize - 1),
        i => count.checked_sub(i.unsigned_abs() as usize),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::LoopId;

    fn quad() -> PieceMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mut mesh = build_from_polygons(&vertices, &[vec![0, 1, 2, 3]]).unwrap();
        mesh.set_uv(Some(UvLayer::new(vec![
            Point2::new(0.1, 0.1),
            Point2::new(0.2, 0.1),
            Point2::new(0.2, 0.2),
            Point2::new(0.1, 0.2),
        ])));
        mesh
    }

    #[test]
    fn test_roundtrip_with_uvs_and_material() {
        let dir = std::env::temp_dir().join(format!("jigsaw_obj_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("0.obj");
        let material = ObjMaterial {
            name: "piece".to_string(),
            diffuse_map: Some(PathBuf::from("base.png")),
            specular: 0.1,
        };
        save_obj(&quad(), &path, Some(&material)).unwrap();

        let mtl = std::fs::read_to_string(dir.join("0.mtl")).unwrap();
        assert!(mtl.contains("map_Kd base.png"));
        let obj = std::fs::read_to_string(&path).unwrap();
        assert!(obj.contains("mtllib 0.mtl"));
        assert!(obj.contains("f 1/1 2/2 3/3 4/4"));

        let loaded = load_obj(&path).unwrap();
        std::fs::remove_dir_all(&dir).ok();
        assert_eq!(loaded.num_faces(), 1);
        let uv = loaded.uv().unwrap();
        assert!((uv.get(LoopId::new(2)) - Point2::new(0.2, 0.2)).norm() < 1e-12);
    }

    #[test]
    fn test_negative_indices() {
        assert_eq!(resolve_index("-1", 4), Some(3));
        assert_eq!(resolve_index("2", 4), Some(1));
        assert_eq!(resolve_index("0", 4), None);
        assert_eq!(resolve_index("-5", 4), None);
    }
}
