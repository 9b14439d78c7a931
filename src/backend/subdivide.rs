//! Catmull-Clark subdivision for polygon meshes.
//!
//! Each level splits an n-sided face into n quads around a new face point.
//! Positions follow the classic rules:
//!
//! - **Face point**: centroid of the face corners
//! - **Edge point**: `(v0 + v1 + f0 + f1) / 4` for interior edges, the
//!   midpoint on boundary edges
//! - **Vertex point**: `(Q + 2R + (n-3)S) / n` where
//!   - Q = average of adjacent face points
//!   - R = average of adjacent edge midpoints
//!   - S = original position
//!   - n = valence
//!
//! Boundary vertices use the curve rule `(l + r) / 8 + 3v / 4`; boundary
//! vertices with more than two boundary neighbours keep their position.
//!
//! UVs are interpolated linearly inside each face, so seams stay seams.
//! New points belong to the groups shared by all vertices they are made
//! from, except that face points never join a rim group: a rim is a chain of
//! edges, so only edge points can extend it. Original vertex `i` stays at
//! index `i`.

use nalgebra::{Point2, Point3, Vector2, Vector3};
use rayon::prelude::*;

use crate::mesh::{EdgeTopology, GroupSet, LoopId, PieceMesh, VertexGroup, VertexId};
use crate::uv::UvLayer;

/// Subdivide `levels` times.
pub fn catmull_clark(mesh: &PieceMesh, levels: u32, parallel: bool) -> PieceMesh {
    let mut current = mesh.clone();
    for level in 0..levels {
        current = subdivide_once(&current, parallel);
        log::debug!(
            "Subdivision level {}: {} faces",
            level + 1,
            current.num_faces()
        );
    }
    current
}

/// Perform one level of Catmull-Clark subdivision.
fn subdivide_once(mesh: &PieceMesh, parallel: bool) -> PieceMesh {
    if mesh.num_faces() == 0 {
        return mesh.clone();
    }

    let topo = EdgeTopology::build(mesh);
    let n = mesh.num_vertices();

    // Step 1: Face points
    let face_point = |f| mesh.face_centroid(f);
    let face_points: Vec<Point3<f64>> = if parallel {
        let ids: Vec<_> = mesh.face_ids().collect();
        ids.par_iter().map(|&f| face_point(f)).collect()
    } else {
        mesh.face_ids().map(face_point).collect()
    };

    // Step 2: Edge points
    let edge_points: Vec<Point3<f64>> = topo
        .edges()
        .iter()
        .map(|edge| {
            let p0 = mesh.position(edge.vertices[0]).coords;
            let p1 = mesh.position(edge.vertices[1]).coords;
            if edge.sides.len() == 2 {
                let f0 = face_points[edge.sides[0].face.index()].coords;
                let f1 = face_points[edge.sides[1].face.index()].coords;
                Point3::from((p0 + p1 + f0 + f1) / 4.0)
            } else {
                Point3::from((p0 + p1) * 0.5)
            }
        })
        .collect();

    // Step 3: Vertex points
    let mut vertex_faces: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (f, _, v) in mesh.loops() {
        vertex_faces[v.index()].push(f.index());
    }
    let mut vertex_edges: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut boundary_neighbors: Vec<Vec<VertexId>> = vec![Vec::new(); n];
    for (ei, edge) in topo.edges().iter().enumerate() {
        let [a, b] = edge.vertices;
        vertex_edges[a.index()].push(ei);
        vertex_edges[b.index()].push(ei);
        if edge.is_boundary() {
            boundary_neighbors[a.index()].push(b);
            boundary_neighbors[b.index()].push(a);
        }
    }

    let vertex_point = |i: usize| -> Point3<f64> {
        let pos = mesh.positions()[i];
        let boundary = &boundary_neighbors[i];
        if !boundary.is_empty() {
            return if boundary.len() == 2 {
                let left = mesh.position(boundary[0]).coords;
                let right = mesh.position(boundary[1]).coords;
                Point3::from((left + right) * (1.0 / 8.0) + pos.coords * (3.0 / 4.0))
            } else {
                pos
            };
        }

        let valence = vertex_faces[i].len();
        if valence == 0 || vertex_edges[i].is_empty() {
            return pos;
        }

        // Q = average of adjacent face points
        let q: Vector3<f64> = vertex_faces[i]
            .iter()
            .map(|&fi| face_points[fi].coords)
            .sum::<Vector3<f64>>()
            / valence as f64;

        // R = average of adjacent edge midpoints
        let r: Vector3<f64> = vertex_edges[i]
            .iter()
            .map(|&ei| {
                let [a, b] = topo.edge(ei).vertices;
                (mesh.position(a).coords + mesh.position(b).coords) * 0.5
            })
            .sum::<Vector3<f64>>()
            / vertex_edges[i].len() as f64;

        let n_f = valence as f64;
        Point3::from((q + r * 2.0 + pos.coords * (n_f - 3.0)) / n_f)
    };
    let vertex_points: Vec<Point3<f64>> = if parallel {
        (0..n).into_par_iter().map(vertex_point).collect()
    } else {
        (0..n).map(vertex_point).collect()
    };

    // Step 4: Connectivity
    let num_faces = mesh.num_faces();
    let face_base = n;
    let edge_base = n + num_faces;

    let mut out = PieceMesh::new();
    out.positions = vertex_points;
    out.positions.extend_from_slice(&face_points);
    out.positions.extend_from_slice(&edge_points);

    out.groups = mesh.groups.clone();
    out.groups
        .extend(mesh.face_ids().map(|f| {
            common_groups(mesh, mesh.face_vertices(f))
                .without(VertexGroup::TopRim)
                .without(VertexGroup::BottomRim)
        }));
    out.groups
        .extend(topo.edges().iter().map(|e| common_groups(mesh, &e.vertices)));
    debug_assert_eq!(out.groups.len(), out.positions.len());

    let src_uv = mesh.uv();
    let mut uvs: Vec<Point2<f64>> = Vec::with_capacity(mesh.num_loops() * 4);

    for f in mesh.face_ids() {
        let loops: Vec<LoopId> = mesh.face_loops(f).collect();
        let k = loops.len();
        let fp = VertexId::new(face_base + f.index());

        let face_uv = src_uv.map(|src| {
            let sum: Vector2<f64> = loops.iter().map(|&l| src.get(l).coords).sum();
            Point2::from(sum / k as f64)
        });

        for i in 0..k {
            let cur = loops[i];
            let prev = loops[(i + k - 1) % k];
            let next = loops[(i + 1) % k];
            let e_next = VertexId::new(edge_base + topo.loop_edge(cur));
            let e_prev = VertexId::new(edge_base + topo.loop_edge(prev));

            out.loop_vertices
                .extend_from_slice(&[mesh.loop_vertex(cur), e_next, fp, e_prev]);
            out.face_starts.push(out.loop_vertices.len());

            if let (Some(src), Some(center)) = (src_uv, face_uv) {
                let u = src.get(cur);
                uvs.push(u);
                uvs.push(Point2::from((u.coords + src.get(next).coords) * 0.5));
                uvs.push(center);
                uvs.push(Point2::from((u.coords + src.get(prev).coords) * 0.5));
            }
        }
    }

    if src_uv.is_some() {
        out.uv = Some(UvLayer::new(uvs));
    }
    out
}

/// Group membership shared by every vertex in `verts`.
fn common_groups(mesh: &PieceMesh, verts: &[VertexId]) -> GroupSet {
    verts
        .iter()
        .map(|&v| mesh.groups(v))
        .reduce(GroupSet::intersection)
        .unwrap_or(GroupSet::EMPTY)
}
