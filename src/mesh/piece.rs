//! Polygon mesh with vertex groups and per-loop UVs.
//!
//! [`PieceMesh`] is the working representation for every stage of piece
//! synthesis. Faces are arbitrary polygons stored as contiguous runs of
//! *loops* (face corners); each loop references a vertex and optionally
//! carries a UV coordinate, so a vertex shared by several faces can have a
//! different UV in each of them.
//!
//! Topology edits never compare coordinates to decide identity: masking,
//! joining and welding return a [`VertexRemap`] so that callers can follow a
//! vertex through the pipeline.

use std::ops::Range;

use nalgebra::{Point2, Point3, Rotation3, Vector3};

use super::groups::{GroupSet, VertexGroup};
use super::index::{FaceId, LoopId, VertexId, VertexRemap};
use crate::uv::UvLayer;

/// A polygon mesh with vertex groups and an optional per-loop UV layer.
#[derive(Debug, Clone, PartialEq)]
pub struct PieceMesh {
    /// Vertex positions.
    pub(crate) positions: Vec<Point3<f64>>,

    /// Group membership per vertex.
    pub(crate) groups: Vec<GroupSet>,

    /// Start of each face's loop run; has `num_faces + 1` entries.
    pub(crate) face_starts: Vec<usize>,

    /// Vertex referenced by each loop.
    pub(crate) loop_vertices: Vec<VertexId>,

    /// Per-loop UV coordinates, if the mesh has been unwrapped.
    pub(crate) uv: Option<UvLayer>,
}

impl Default for PieceMesh {
    fn default() -> Self {
        Self::new()
    }
}

impl PieceMesh {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            groups: Vec::new(),
            face_starts: vec![0],
            loop_vertices: Vec::new(),
            uv: None,
        }
    }

    // ==================== Accessors ====================

    /// Number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    /// Number of faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.face_starts.len().saturating_sub(1)
    }

    /// Number of face loops (sum of face sizes).
    #[inline]
    pub fn num_loops(&self) -> usize {
        self.loop_vertices.len()
    }

    /// Position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId) -> &Point3<f64> {
        &self.positions[v.index()]
    }

    /// Set the position of a vertex.
    #[inline]
    pub fn set_position(&mut self, v: VertexId, pos: Point3<f64>) {
        self.positions[v.index()] = pos;
    }

    /// All vertex positions.
    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    /// Mutable access to all vertex positions.
    pub fn positions_mut(&mut self) -> &mut [Point3<f64>] {
        &mut self.positions
    }

    /// Groups a vertex belongs to.
    #[inline]
    pub fn groups(&self, v: VertexId) -> GroupSet {
        self.groups[v.index()]
    }

    /// Replace the group membership of a vertex.
    #[inline]
    pub fn set_groups(&mut self, v: VertexId, groups: GroupSet) {
        self.groups[v.index()] = groups;
    }

    /// Whether a vertex belongs to `group`.
    #[inline]
    pub fn in_group(&self, v: VertexId, group: VertexGroup) -> bool {
        self.groups(v).contains(group)
    }

    /// Loop ids of a face.
    pub fn face_loops(&self, f: FaceId) -> impl Iterator<Item = LoopId> + '_ {
        self.loop_range(f).map(LoopId::new)
    }

    /// Vertices of a face, in winding order.
    #[inline]
    pub fn face_vertices(&self, f: FaceId) -> &[VertexId] {
        &self.loop_vertices[self.loop_range(f)]
    }

    /// Number of corners of a face.
    #[inline]
    pub fn face_len(&self, f: FaceId) -> usize {
        self.loop_range(f).len()
    }

    /// Vertex referenced by a loop.
    #[inline]
    pub fn loop_vertex(&self, l: LoopId) -> VertexId {
        self.loop_vertices[l.index()]
    }

    /// The loop after `l` within face `f`, wrapping around.
    #[inline]
    pub fn next_loop(&self, f: FaceId, l: LoopId) -> LoopId {
        let range = self.loop_range(f);
        if l.index() + 1 < range.end {
            LoopId::new(l.index() + 1)
        } else {
            LoopId::new(range.start)
        }
    }

    #[inline]
    pub(crate) fn loop_range(&self, f: FaceId) -> Range<usize> {
        self.face_starts[f.index()]..self.face_starts[f.index() + 1]
    }

    /// The UV layer, if present.
    pub fn uv(&self) -> Option<&UvLayer> {
        self.uv.as_ref()
    }

    /// Mutable UV layer, if present.
    pub fn uv_mut(&mut self) -> Option<&mut UvLayer> {
        self.uv.as_mut()
    }

    /// Attach (or remove) a UV layer.
    ///
    /// # Panics
    /// Panics if the layer length differs from the loop count.
    pub fn set_uv(&mut self, uv: Option<UvLayer>) {
        if let Some(layer) = &uv {
            assert_eq!(layer.len(), self.num_loops(), "UV layer must cover every loop");
        }
        self.uv = uv;
    }

    // ==================== Iteration ====================

    /// Iterate over all vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..self.positions.len()).map(VertexId::new)
    }

    /// Iterate over all face IDs.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        (0..self.num_faces()).map(FaceId::new)
    }

    /// Iterate over every loop in face order as `(face, loop, vertex)`.
    pub fn loops(&self) -> impl Iterator<Item = (FaceId, LoopId, VertexId)> + '_ {
        self.face_ids().flat_map(move |f| {
            self.face_loops(f)
                .map(move |l| (f, l, self.loop_vertices[l.index()]))
        })
    }

    /// Vertices belonging to `group`, in id order.
    pub fn vertices_in(&self, group: VertexGroup) -> Vec<VertexId> {
        self.vertex_ids()
            .filter(|&v| self.in_group(v, group))
            .collect()
    }

    // ==================== Geometry ====================

    /// Newell normal of a face (area-weighted, not normalized).
    pub fn face_area_vector(&self, f: FaceId) -> Vector3<f64> {
        let verts = self.face_vertices(f);
        let mut n = Vector3::zeros();
        for (i, &v) in verts.iter().enumerate() {
            let p = self.position(v);
            let q = self.position(verts[(i + 1) % verts.len()]);
            n.x += (p.y - q.y) * (p.z + q.z);
            n.y += (p.z - q.z) * (p.x + q.x);
            n.z += (p.x - q.x) * (p.y + q.y);
        }
        n * 0.5
    }

    /// Unit normal of a face.
    pub fn face_normal(&self, f: FaceId) -> Vector3<f64> {
        let n = self.face_area_vector(f);
        let len = n.norm();
        if len > 1e-15 {
            n / len
        } else {
            Vector3::z()
        }
    }

    /// Area of a (planar) face.
    pub fn face_area(&self, f: FaceId) -> f64 {
        self.face_area_vector(f).norm()
    }

    /// Average of a face's corner positions.
    pub fn face_centroid(&self, f: FaceId) -> Point3<f64> {
        let verts = self.face_vertices(f);
        let sum: Vector3<f64> = verts.iter().map(|&v| self.position(v).coords).sum();
        Point3::from(sum / verts.len() as f64)
    }

    /// Area-weighted normal at every vertex.
    pub fn vertex_normals(&self) -> Vec<Vector3<f64>> {
        let mut normals = vec![Vector3::zeros(); self.num_vertices()];
        for f in self.face_ids() {
            let n = self.face_area_vector(f);
            for &v in self.face_vertices(f) {
                normals[v.index()] += n;
            }
        }
        for n in &mut normals {
            let len = n.norm();
            if len > 1e-15 {
                *n /= len;
            }
        }
        normals
    }

    /// Total surface area.
    pub fn surface_area(&self) -> f64 {
        self.face_ids().map(|f| self.face_area(f)).sum()
    }

    /// Surface center of mass: fan triangles weighted by their area.
    ///
    /// Returns `None` for meshes without area.
    pub fn center_of_mass(&self) -> Option<Point3<f64>> {
        let mut weighted = Vector3::zeros();
        let mut total = 0.0;

        for f in self.face_ids() {
            let verts = self.face_vertices(f);
            let p0 = self.position(verts[0]);
            for i in 1..verts.len() - 1 {
                let p1 = self.position(verts[i]);
                let p2 = self.position(verts[i + 1]);
                let area = 0.5 * (p1 - p0).cross(&(p2 - p0)).norm();
                weighted += (p0.coords + p1.coords + p2.coords) / 3.0 * area;
                total += area;
            }
        }

        (total > 1e-15).then(|| Point3::from(weighted / total))
    }

    /// Axis-aligned bounding box of the vertex positions.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = *self.positions.first()?;
        let mut min = first;
        let mut max = first;

        for p in &self.positions {
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }

        Some((min, max))
    }

    // ==================== Transforms ====================

    /// Translate every vertex.
    pub fn translate(&mut self, offset: Vector3<f64>) {
        for p in &mut self.positions {
            *p += offset;
        }
    }

    /// Rotate every vertex about the Z axis through the origin.
    pub fn rotate_z(&mut self, angle: f64) {
        let rot = Rotation3::from_axis_angle(&Vector3::z_axis(), angle);
        for p in &mut self.positions {
            *p = rot * *p;
        }
    }

    // ==================== Topology edits ====================

    /// Concatenate several meshes into one.
    ///
    /// Vertex `v` of part `i` becomes vertex `offset_i + v`, where `offset_i`
    /// is the total vertex count of the parts before it. If any part has a UV
    /// layer the result has one too; loops of parts without UVs are zeroed.
    pub fn join(parts: &[PieceMesh]) -> PieceMesh {
        let mut out = PieceMesh::new();
        let any_uv = parts.iter().any(|p| p.uv.is_some());
        let mut uvs: Vec<Point2<f64>> = Vec::new();

        for part in parts {
            let base = out.positions.len();
            out.positions.extend_from_slice(&part.positions);
            out.groups.extend_from_slice(&part.groups);

            for f in part.face_ids() {
                out.loop_vertices.extend(
                    part.face_vertices(f)
                        .iter()
                        .map(|v| VertexId::new(v.index() + base)),
                );
                out.face_starts.push(out.loop_vertices.len());
            }

            if any_uv {
                match &part.uv {
                    Some(layer) => uvs.extend_from_slice(layer.as_slice()),
                    None => uvs.extend(std::iter::repeat(Point2::origin()).take(part.num_loops())),
                }
            }
        }

        if any_uv {
            out.uv = Some(UvLayer::new(uvs));
        }
        out
    }

    /// Keep only the vertices flagged in `keep` and the faces whose corners
    /// are all kept.
    ///
    /// Returns the compacted mesh and the remap from old to new vertex ids.
    pub fn retain_vertices(&self, keep: &[bool]) -> (PieceMesh, VertexRemap) {
        debug_assert_eq!(keep.len(), self.num_vertices());

        let mut targets = vec![None; self.num_vertices()];
        let mut out = PieceMesh::new();
        for v in self.vertex_ids() {
            if keep[v.index()] {
                targets[v.index()] = Some(VertexId::new(out.positions.len()));
                out.positions.push(self.positions[v.index()]);
                out.groups.push(self.groups[v.index()]);
            }
        }

        let mut uvs = self.uv.as_ref().map(|_| Vec::new());
        for f in self.face_ids() {
            let verts = self.face_vertices(f);
            if !verts.iter().all(|v| keep[v.index()]) {
                continue;
            }
            out.loop_vertices
                .extend(verts.iter().filter_map(|v| targets[v.index()]));
            out.face_starts.push(out.loop_vertices.len());
            if let (Some(dst), Some(src)) = (uvs.as_mut(), self.uv.as_ref()) {
                dst.extend(self.face_loops(f).map(|l| src.get(l)));
            }
        }
        out.uv = uvs.map(UvLayer::new);

        (out, VertexRemap::from_targets(targets))
    }

    /// Merge vertices according to `merge`, which maps every vertex to its
    /// representative (a vertex id of *this* mesh).
    ///
    /// Representatives keep their position; groups of merged vertices are
    /// unioned onto the representative. Repeated consecutive corners are
    /// collapsed and faces left with fewer than three corners are removed.
    /// Returns the compacted mesh and the remap from old to new vertex ids.
    pub fn merge_vertices(&self, merge: &[VertexId]) -> (PieceMesh, VertexRemap) {
        debug_assert_eq!(merge.len(), self.num_vertices());

        let mut merged_groups = self.groups.clone();
        for (v, rep) in merge.iter().enumerate() {
            if rep.index() != v {
                merged_groups[rep.index()] = merged_groups[rep.index()].union(self.groups[v]);
            }
        }

        let mut compact = vec![None; self.num_vertices()];
        let mut out = PieceMesh::new();
        for (v, rep) in merge.iter().enumerate() {
            if rep.index() == v {
                compact[v] = Some(VertexId::new(out.positions.len()));
                out.positions.push(self.positions[v]);
                out.groups.push(merged_groups[v]);
            }
        }
        let targets: Vec<Option<VertexId>> =
            merge.iter().map(|rep| compact[rep.index()]).collect();

        let mut uvs = self.uv.as_ref().map(|_| Vec::new());
        let mut corners: Vec<(VertexId, LoopId)> = Vec::new();
        for f in self.face_ids() {
            corners.clear();
            for l in self.face_loops(f) {
                if let Some(v) = targets[self.loop_vertex(l).index()] {
                    if corners.last().map(|c| c.0) != Some(v) {
                        corners.push((v, l));
                    }
                }
            }
            while corners.len() > 1 && corners.first().map(|c| c.0) == corners.last().map(|c| c.0)
            {
                corners.pop();
            }
            if corners.len() < 3 {
                continue;
            }

            out.loop_vertices.extend(corners.iter().map(|c| c.0));
            out.face_starts.push(out.loop_vertices.len());
            if let (Some(dst), Some(src)) = (uvs.as_mut(), self.uv.as_ref()) {
                dst.extend(corners.iter().map(|c| src.get(c.1)));
            }
        }
        out.uv = uvs.map(UvLayer::new);

        (out, VertexRemap::from_targets(targets))
    }
}
