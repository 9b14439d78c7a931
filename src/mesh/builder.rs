//! Mesh construction utilities.
//!
//! Build [`PieceMesh`]es from face-vertex lists as found in mesh file formats,
//! and flatten them back for export.

use nalgebra::Point3;

use super::groups::GroupSet;
use super::index::VertexId;
use super::piece::PieceMesh;
use crate::error::{Result, SynthError};

/// Build a polygon mesh from vertices and faces of arbitrary size.
///
/// All vertices start with no group membership; use
/// [`build_with_groups`] to tag them at construction.
///
/// # Example
/// ```
/// use jigsaw_synth::mesh::build_from_polygons;
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let faces = vec![vec![0, 1, 2, 3]];
///
/// let mesh = build_from_polygons(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 4);
/// assert_eq!(mesh.num_loops(), 4);
/// ```
pub fn build_from_polygons(vertices: &[Point3<f64>], faces: &[Vec<usize>]) -> Result<PieceMesh> {
    build_with_groups(vertices, &vec![GroupSet::EMPTY; vertices.len()], faces)
}

/// Build a polygon mesh with per-vertex group membership.
///
/// # Errors
/// - [`SynthError::EmptyMesh`] if there are no faces
/// - [`SynthError::InvalidVertexIndex`] if a face references a missing vertex
/// - [`SynthError::DegenerateFace`] if a face has fewer than three corners or
///   repeats a vertex
pub fn build_with_groups(
    vertices: &[Point3<f64>],
    groups: &[GroupSet],
    faces: &[Vec<usize>],
) -> Result<PieceMesh> {
    if faces.is_empty() {
        return Err(SynthError::EmptyMesh);
    }
    if groups.len() != vertices.len() {
        return Err(SynthError::invalid_param(
            "groups",
            groups.len(),
            "must have one entry per vertex",
        ));
    }

    for (fi, face) in faces.iter().enumerate() {
        if face.len() < 3 {
            return Err(SynthError::DegenerateFace { face: fi });
        }
        for (i, &vi) in face.iter().enumerate() {
            if vi >= vertices.len() {
                return Err(SynthError::InvalidVertexIndex { face: fi, vertex: vi });
            }
            if face[..i].contains(&vi) {
                return Err(SynthError::DegenerateFace { face: fi });
            }
        }
    }

    let num_loops = faces.iter().map(Vec::len).sum();
    let mut mesh = PieceMesh::new();
    mesh.positions = vertices.to_vec();
    mesh.groups = groups.to_vec();
    mesh.loop_vertices.reserve(num_loops);
    mesh.face_starts.reserve(faces.len());

    for face in faces {
        mesh.loop_vertices.extend(face.iter().map(|&v| VertexId::new(v)));
        mesh.face_starts.push(mesh.loop_vertices.len());
    }

    Ok(mesh)
}

/// Convert a mesh back to face-vertex lists.
pub fn to_face_vertex(mesh: &PieceMesh) -> (Vec<Point3<f64>>, Vec<Vec<usize>>) {
    let faces = mesh
        .face_ids()
        .map(|f| mesh.face_vertices(f).iter().map(|v| v.index()).collect())
        .collect();
    (mesh.positions().to_vec(), faces)
}

/// Fan-triangulate every face, for formats that only store triangles.
pub fn to_triangles(mesh: &PieceMesh) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let mut tris = Vec::with_capacity(mesh.num_loops());
    for f in mesh.face_ids() {
        let verts = mesh.face_vertices(f);
        for i in 1..verts.len() - 1 {
            tris.push([verts[0].index(), verts[i].index(), verts[i + 1].index()]);
        }
    }
    (mesh.positions().to_vec(), tris)
}
