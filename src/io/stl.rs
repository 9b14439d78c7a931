//! STL (stereolithography) format support.
//!
//! STL stores bare triangles, so polygons are fan-triangulated on save and
//! groups and UVs are lost. Loading welds coincident corners back together.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use nalgebra::Point3;

use crate::error::{Result, SynthError};
use crate::mesh::{build_from_polygons, to_triangles, PieceMesh};

/// Load a mesh from an STL file (binary or ASCII).
pub fn load_stl<P: AsRef<Path>>(path: P) -> Result<PieceMesh> {
    let path = path.as_ref();
    let mut file = File::open(path)?;

    let stl = stl_io::read_stl(&mut file).map_err(|e| SynthError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    // stl_io already shares identical vertices between triangles
    let vertices: Vec<Point3<f64>> = stl
        .vertices
        .iter()
        .map(|v| Point3::new(v[0] as f64, v[1] as f64, v[2] as f64))
        .collect();

    let faces: Vec<Vec<usize>> = stl
        .faces
        .iter()
        .map(|tri| tri.vertices.to_vec())
        .filter(|f| f[0] != f[1] && f[1] != f[2] && f[0] != f[2])
        .collect();

    if faces.is_empty() {
        return Err(SynthError::LoadError {
            path: path.to_path_buf(),
            message: "STL file contains no valid triangles".to_string(),
        });
    }

    build_from_polygons(&vertices, &faces)
}

/// Save a mesh to a binary STL file.
pub fn save_stl<P: AsRef<Path>>(mesh: &PieceMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let (vertices, faces) = to_triangles(mesh);

    let triangles: Vec<stl_io::Triangle> = faces
        .iter()
        .map(|f| {
            let p0 = &vertices[f[0]];
            let p1 = &vertices[f[1]];
            let p2 = &vertices[f[2]];

            let n = (p1 - p0).cross(&(p2 - p0));
            let n = if n.norm() > 0.0 { n.normalize() } else { n };

            stl_io::Triangle {
                normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: [
                    stl_io::Vertex::new([p0.x as f32, p0.y as f32, p0.z as f32]),
                    stl_io::Vertex::new([p1.x as f32, p1.y as f32, p1.z as f32]),
                    stl_io::Vertex::new([p2.x as f32, p2.y as f32, p2.z as f32]),
                ],
            }
        })
        .collect();

    stl_io::write_stl(&mut writer, triangles.iter()).map_err(|e| SynthError::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    Ok(())
}
