//! PLY (Stanford polygon) format support.
//!
//! Polygons are kept as-is on load and save. Vertex group membership is
//! stored in an optional per-vertex `groups` property holding the
//! [`GroupSet`] bitmask; files without it load with empty groups.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};

use crate::error::{Result, SynthError};
use crate::mesh::{build_with_groups, to_face_vertex, GroupSet, PieceMesh, VertexId};

/// Load a mesh from a PLY file.
///
/// # Example
///
/// ```no_run
/// use jigsaw_synth::io::ply;
///
/// let mesh = ply::load_ply("section.ply").unwrap();
/// ```
pub fn load_ply<P: AsRef<Path>>(path: P) -> Result<PieceMesh> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let load_error = |message: &str| SynthError::LoadError {
        path: path.to_path_buf(),
        message: message.to_string(),
    };

    let parser = Parser::<DefaultElement>::new();
    let ply = parser.read_ply(&mut reader).map_err(|e| SynthError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let vertex_element = ply
        .payload
        .get("vertex")
        .ok_or_else(|| load_error("PLY file has no vertex element"))?;

    let mut vertices: Vec<Point3<f64>> = Vec::with_capacity(vertex_element.len());
    let mut groups: Vec<GroupSet> = Vec::with_capacity(vertex_element.len());
    for vertex in vertex_element {
        let x = get_float_property(vertex, "x").ok_or_else(|| load_error("vertex missing x coordinate"))?;
        let y = get_float_property(vertex, "y").ok_or_else(|| load_error("vertex missing y coordinate"))?;
        let z = get_float_property(vertex, "z").ok_or_else(|| load_error("vertex missing z coordinate"))?;
        vertices.push(Point3::new(x, y, z));

        let bits = get_float_property(vertex, "groups").unwrap_or(0.0);
        groups.push(GroupSet::from_bits(bits as u8));
    }

    let face_element = ply
        .payload
        .get("face")
        .ok_or_else(|| load_error("PLY file has no face element"))?;

    let mut faces: Vec<Vec<usize>> = Vec::with_capacity(face_element.len());
    for face in face_element {
        let indices = get_list_property(face, "vertex_indices")
            .or_else(|| get_list_property(face, "vertex_index"))
            .ok_or_else(|| load_error("face missing vertex_indices property"))?;
        faces.push(indices);
    }

    if faces.is_empty() {
        return Err(load_error("PLY file contains no faces"));
    }

    build_with_groups(&vertices, &groups, &faces)
}

fn get_float_property(element: &DefaultElement, name: &str) -> Option<f64> {
    match element.get(name)? {
        Property::Float(v) => Some(*v as f64),
        Property::Double(v) => Some(*v),
        Property::Int(v) => Some(*v as f64),
        Property::UInt(v) => Some(*v as f64),
        Property::Short(v) => Some(*v as f64),
        Property::UShort(v) => Some(*v as f64),
        Property::Char(v) => Some(*v as f64),
        Property::UChar(v) => Some(*v as f64),
        _ => None,
    }
}

fn get_list_property(element: &DefaultElement, name: &str) -> Option<Vec<usize>> {
    match element.get(name)? {
        Property::ListInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        _ => None,
    }
}

/// Save a mesh to an ASCII PLY file, including vertex groups.
///
/// Coordinates are written in double precision so a saved template section
/// loads back unchanged.
pub fn save_ply<P: AsRef<Path>>(mesh: &PieceMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let (vertices, faces) = to_face_vertex(mesh);

    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "comment Generated by jigsaw-synth")?;
    writeln!(writer, "element vertex {}", vertices.len())?;
    writeln!(writer, "property double x")?;
    writeln!(writer, "property double y")?;
    writeln!(writer, "property double z")?;
    writeln!(writer, "property uchar groups")?;
    writeln!(writer, "element face {}", faces.len())?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    writeln!(writer, "end_header")?;

    for (i, v) in vertices.iter().enumerate() {
        let bits = mesh.groups(VertexId::new(i)).bits();
        writeln!(writer, "{} {} {} {}", v.x, v.y, v.z, bits)?;
    }

    for f in &faces {
        if f.len() > u8::MAX as usize {
            return Err(SynthError::SaveError {
                path: path.to_path_buf(),
                message: format!("face with {} corners exceeds PLY list size", f.len()),
            });
        }
        write!(writer, "{}", f.len())?;
        for v in f {
            write!(writer, " {}", v)?;
        }
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::VertexGroup;
    use crate::template::{TemplateOptions, TemplateSection};

    #[test]
    fn test_section_roundtrip_keeps_groups() {
        let section = TemplateSection::build(&TemplateOptions::default()).unwrap();
        let path = std::env::temp_dir().join(format!("jigsaw_section_{}.ply", std::process::id()));
        save_ply(section.mesh(), &path).unwrap();
        let loaded = load_ply(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let original = section.mesh();
        assert_eq!(loaded.num_vertices(), original.num_vertices());
        assert_eq!(loaded.num_faces(), original.num_faces());
        for v in original.vertex_ids() {
            assert_eq!(loaded.groups(v), original.groups(v));
            assert!((loaded.position(v) - original.position(v)).norm() < 1e-12);
        }
        assert_eq!(loaded.vertices_in(VertexGroup::Corner).len(), 2);
    }

    #[test]
    fn test_load_without_groups() {
        let path = std::env::temp_dir().join(format!("jigsaw_plain_{}.ply", std::process::id()));
        std::fs::write(
            &path,
            "ply\nformat ascii 1.0\nelement vertex 4\nproperty float x\nproperty float y\n\
             property float z\nelement face 1\nproperty list uchar int vertex_indices\n\
             end_header\n0 0 0\n1 0 0\n1 1 0\n0 1 0\n4 0 1 2 3\n",
        )
        .unwrap();
        let mesh = load_ply(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(mesh.num_faces(), 1);
        assert_eq!(mesh.face_len(crate::mesh::FaceId::new(0)), 4);
        assert_eq!(mesh.groups(VertexId::new(0)), GroupSet::EMPTY);
    }
}
