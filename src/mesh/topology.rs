//! Edge adjacency derived from a [`PieceMesh`].
//!
//! The polygon mesh stores faces only; [`EdgeTopology`] links every face
//! side to the undirected edge it lies on. Boundary edges (used by exactly
//! one face) are chained into loops by matching each edge's end vertex with
//! the start vertex of the next boundary edge.

use std::collections::{HashMap, HashSet};

use nalgebra::Vector3;

use super::index::{FaceId, LoopId, VertexId};
use super::piece::PieceMesh;

/// One face's traversal of an edge, from `from` to `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeSide {
    /// The face.
    pub face: FaceId,
    /// Loop at the start of the traversal.
    pub loop_id: LoopId,
    /// Start vertex in the face's winding.
    pub from: VertexId,
    /// End vertex in the face's winding.
    pub to: VertexId,
}

/// An undirected edge and the face sides lying on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Endpoints, smaller id first.
    pub vertices: [VertexId; 2],
    /// Face sides on this edge (one for boundary edges).
    pub sides: Vec<EdgeSide>,
}

impl Edge {
    /// Whether only one face uses this edge.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        self.sides.len() == 1
    }
}

/// Edge table for a polygon mesh.
#[derive(Debug, Clone)]
pub struct EdgeTopology {
    edges: Vec<Edge>,
    lookup: HashMap<(VertexId, VertexId), usize>,
    /// Edge index for the side starting at each loop.
    loop_edges: Vec<usize>,
}

#[inline]
fn key(a: VertexId, b: VertexId) -> (VertexId, VertexId) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

impl EdgeTopology {
    /// Build the edge table of a mesh.
    pub fn build(mesh: &PieceMesh) -> Self {
        let mut edges: Vec<Edge> = Vec::with_capacity(mesh.num_loops());
        let mut lookup = HashMap::with_capacity(mesh.num_loops());
        let mut loop_edges = vec![0; mesh.num_loops()];

        for f in mesh.face_ids() {
            let verts = mesh.face_vertices(f);
            let n = verts.len();
            for (k, l) in mesh.face_loops(f).enumerate() {
                let from = verts[k];
                let to = verts[(k + 1) % n];
                let side = EdgeSide {
                    face: f,
                    loop_id: l,
                    from,
                    to,
                };
                let idx = *lookup.entry(key(from, to)).or_insert_with(|| {
                    let (a, b) = key(from, to);
                    edges.push(Edge {
                        vertices: [a, b],
                        sides: Vec::with_capacity(2),
                    });
                    edges.len() - 1
                });
                edges[idx].sides.push(side);
                loop_edges[l.index()] = idx;
            }
        }

        Self {
            edges,
            lookup,
            loop_edges,
        }
    }

    /// Number of undirected edges.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// All edges.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Edge by index.
    pub fn edge(&self, idx: usize) -> &Edge {
        &self.edges[idx]
    }

    /// Index of the edge between two vertices, if any.
    pub fn find(&self, a: VertexId, b: VertexId) -> Option<usize> {
        self.lookup.get(&key(a, b)).copied()
    }

    /// Index of the edge starting at loop `l` in its face.
    #[inline]
    pub fn loop_edge(&self, l: LoopId) -> usize {
        self.loop_edges[l.index()]
    }

    /// Iterate over boundary edges.
    pub fn boundary_edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.iter().filter(|e| e.is_boundary())
    }

    /// Vertices lying on at least one boundary edge.
    pub fn boundary_vertices(&self, num_vertices: usize) -> Vec<bool> {
        let mut flags = vec![false; num_vertices];
        for e in self.boundary_edges() {
            flags[e.vertices[0].index()] = true;
            flags[e.vertices[1].index()] = true;
        }
        flags
    }

    /// Whether any edge is shared by more than two faces.
    pub fn is_manifold(&self) -> bool {
        self.edges.iter().all(|e| e.sides.len() <= 2)
    }

    /// Chain boundary edges into loops.
    ///
    /// Each loop lists its vertices in the winding of the adjacent faces. An
    /// open chain (which only occurs on non-manifold input) is reported as
    /// its own loop.
    pub fn boundary_loops(&self) -> Vec<Vec<VertexId>> {
        let boundary: Vec<EdgeSide> = self.boundary_edges().map(|e| e.sides[0]).collect();

        // Group by start vertex for quick lookup
        let mut outgoing: HashMap<VertexId, usize> = HashMap::with_capacity(boundary.len());
        for (i, side) in boundary.iter().enumerate() {
            outgoing.insert(side.from, i);
        }

        let mut visited: HashSet<usize> = HashSet::with_capacity(boundary.len());
        let mut loops = Vec::new();

        for start in 0..boundary.len() {
            if visited.contains(&start) {
                continue;
            }
            let mut chain = Vec::new();
            let mut current = start;
            while visited.insert(current) {
                chain.push(boundary[current].from);
                match outgoing.get(&boundary[current].to) {
                    Some(&next) => current = next,
                    None => break,
                }
            }
            loops.push(chain);
        }

        loops
    }

    /// Angle between the normals of the two faces on an edge, in radians.
    ///
    /// `None` for boundary and non-manifold edges.
    pub fn dihedral_angle(&self, idx: usize, face_normals: &[Vector3<f64>]) -> Option<f64> {
        let edge = &self.edges[idx];
        if edge.sides.len() != 2 {
            return None;
        }
        let n0 = face_normals[edge.sides[0].face.index()];
        let n1 = face_normals[edge.sides[1].face.index()];
        Some(n0.dot(&n1).clamp(-1.0, 1.0).acos())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_polygons;
    use nalgebra::Point3;

    /// 2x2 grid of quads over [0,2]^2.
    fn grid() -> PieceMesh {
        let mut vertices = Vec::new();
        for j in 0..3 {
            for i in 0..3 {
                vertices.push(Point3::new(i as f64, j as f64, 0.0));
            }
        }
        let idx = |i: usize, j: usize| j * 3 + i;
        let mut faces = Vec::new();
        for j in 0..2 {
            for i in 0..2 {
                faces.push(vec![idx(i, j), idx(i + 1, j), idx(i + 1, j + 1), idx(i, j + 1)]);
            }
        }
        build_from_polygons(&vertices, &faces).unwrap()
    }

    #[test]
    fn test_edge_counts() {
        let topo = EdgeTopology::build(&grid());
        assert_eq!(topo.num_edges(), 12);
        assert_eq!(topo.boundary_edges().count(), 8);
        assert!(topo.is_manifold());
    }

    #[test]
    fn test_single_boundary_loop() {
        let topo = EdgeTopology::build(&grid());
        let loops = topo.boundary_loops();
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].len(), 8);
        // Center vertex is interior
        assert!(!loops[0].contains(&VertexId::new(4)));
    }

    #[test]
    fn test_two_islands_two_loops() {
        let mesh = grid();
        let joined = PieceMesh::join(&[mesh.clone(), mesh]);
        let topo = EdgeTopology::build(&joined);
        assert_eq!(topo.boundary_loops().len(), 2);
    }

    #[test]
    fn test_loop_edge_lookup() {
        let mesh = grid();
        let topo = EdgeTopology::build(&mesh);
        let l = mesh.face_loops(FaceId::new(0)).next().unwrap();
        let e = topo.edge(topo.loop_edge(l));
        assert_eq!(e.vertices, [VertexId::new(0), VertexId::new(1)]);
        assert_eq!(topo.find(VertexId::new(1), VertexId::new(0)), Some(topo.loop_edge(l)));
    }

    #[test]
    fn test_flat_dihedral() {
        let mesh = grid();
        let topo = EdgeTopology::build(&mesh);
        let normals: Vec<_> = mesh.face_ids().map(|f| mesh.face_normal(f)).collect();
        let interior = topo.find(VertexId::new(1), VertexId::new(4)).unwrap();
        assert!(topo.dihedral_angle(interior, &normals).unwrap().abs() < 1e-10);
        let rim = topo.find(VertexId::new(0), VertexId::new(1)).unwrap();
        assert!(topo.dihedral_angle(rim, &normals).is_none());
    }
}
