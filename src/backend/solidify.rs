//! Shell extrusion.
//!
//! Every vertex gets a copy offset against its normal by the thickness. The
//! copies form a second surface with reversed winding, and each boundary
//! edge is closed with a quad side wall. Input vertex `i` stays at index `i`;
//! its copy is at `i + n`. Outline vertices join [`VertexGroup::TopRim`] on
//! the top surface and [`VertexGroup::BottomRim`] on the bottom one.

use nalgebra::Point2;

use crate::error::{Result, SynthError};
use crate::mesh::{EdgeTopology, PieceMesh, VertexGroup, VertexId};
use crate::uv::UvLayer;

/// Give `mesh` the given thickness.
///
/// A zero thickness returns an unchanged copy.
///
/// # Errors
/// [`SynthError::InvalidParameter`] for a negative or non-finite thickness.
pub fn solidify(mesh: &PieceMesh, thickness: f64) -> Result<PieceMesh> {
    if !thickness.is_finite() || thickness < 0.0 {
        return Err(SynthError::invalid_param(
            "thickness",
            thickness,
            "must be finite and non-negative",
        ));
    }
    if thickness == 0.0 {
        return Ok(mesh.clone());
    }

    let n = mesh.num_vertices();
    let normals = mesh.vertex_normals();
    let topo = EdgeTopology::build(mesh);

    let mut out = PieceMesh::new();
    out.positions.reserve(2 * n);
    out.positions.extend_from_slice(mesh.positions());
    out.positions.extend(
        mesh.positions()
            .iter()
            .zip(&normals)
            .map(|(p, normal)| p - normal * thickness),
    );
    let outline = topo.boundary_vertices(n);
    for ring in [VertexGroup::TopRim, VertexGroup::BottomRim] {
        out.groups.extend(
            mesh.groups
                .iter()
                .zip(&outline)
                .map(|(g, &on_rim)| if on_rim { g.with(ring) } else { *g }),
        );
    }

    let shell = |v: VertexId| VertexId::new(v.index() + n);
    let src_uv = mesh.uv();
    let mut uvs: Vec<Point2<f64>> = Vec::new();

    // Top surface
    for f in mesh.face_ids() {
        out.loop_vertices.extend_from_slice(mesh.face_vertices(f));
        out.face_starts.push(out.loop_vertices.len());
        if let Some(src) = src_uv {
            uvs.extend(mesh.face_loops(f).map(|l| src.get(l)));
        }
    }

    // Bottom surface, reversed
    for f in mesh.face_ids() {
        let loops: Vec<_> = mesh.face_loops(f).collect();
        for &l in loops.iter().rev() {
            out.loop_vertices.push(shell(mesh.loop_vertex(l)));
            if let Some(src) = src_uv {
                uvs.push(src.get(l));
            }
        }
        out.face_starts.push(out.loop_vertices.len());
    }

    // Side walls
    for edge in topo.boundary_edges() {
        let side = edge.sides[0];
        let next = mesh.next_loop(side.face, side.loop_id);
        out.loop_vertices
            .extend_from_slice(&[side.to, side.from, shell(side.from), shell(side.to)]);
        out.face_starts.push(out.loop_vertices.len());
        if let Some(src) = src_uv {
            let (a, b) = (src.get(next), src.get(side.loop_id));
            uvs.extend_from_slice(&[a, b, b, a]);
        }
    }

    if src_uv.is_some() {
        out.uv = Some(UvLayer::new(uvs));
    }
    Ok(out)
}
