//! Rim rounding.
//!
//! A rim vertex is pulled inward along its normal onto the middle of a
//! fillet profile of radius `width` tangent to both faces. For a dihedral
//! angle `theta` the corner sits `width / cos(theta / 2)` from the fillet
//! center. The profile is a polyline of `segments` pieces: with an even count
//! its middle is a point on the arc, with an odd count it is the midpoint of
//! a chord. Topology is not changed.
//!
//! Rim vertices are the ones solidify tagged with a rim group; subdivision
//! keeps those tags along the outline, so the rim is found even after the
//! shell has been smoothed. The rim of a solidified flat piece is square, so
//! tagged vertices use a right-angle profile. Meshes without rim tags fall
//! back to edges whose dihedral angle exceeds `sharp_angle_degrees`.

use std::f64::consts::FRAC_PI_2;

use crate::error::{Result, SynthError};
use crate::mesh::{EdgeTopology, PieceMesh};

/// Distance from a sharp corner with dihedral `theta` to the middle of the
/// segmented fillet profile of radius `width`.
pub fn profile_inset(theta: f64, width: f64, segments: u32) -> f64 {
    let half = 0.5 * theta;
    let cos_half = half.cos();
    if cos_half <= 1e-6 {
        return 0.0;
    }
    let to_center = width / cos_half;
    let mid_radius = if segments % 2 == 0 {
        width
    } else {
        // The arc spans theta; each segment subtends theta / segments
        width * (theta / (2.0 * segments as f64)).cos()
    };
    (to_center - mid_radius).max(0.0)
}

/// Round the rim of `mesh`.
///
/// # Errors
/// [`SynthError::InvalidParameter`] for zero segments or a negative width.
pub fn bevel_rims(
    mesh: &PieceMesh,
    segments: u32,
    width: f64,
    sharp_angle_degrees: f64,
) -> Result<PieceMesh> {
    if segments == 0 {
        return Err(SynthError::invalid_param("segments", segments, "must be at least 1"));
    }
    if !width.is_finite() || width < 0.0 {
        return Err(SynthError::invalid_param(
            "width",
            width,
            "must be finite and non-negative",
        ));
    }

    let theta: Vec<f64> = if mesh.groups.iter().any(|g| g.is_rim()) {
        mesh.groups
            .iter()
            .map(|g| if g.is_rim() { FRAC_PI_2 } else { 0.0 })
            .collect()
    } else {
        sharp_edge_angles(mesh, sharp_angle_degrees.to_radians())
    };

    let normals = mesh.vertex_normals();
    let mut out = mesh.clone();
    let mut moved = 0;
    for v in mesh.vertex_ids() {
        let t = theta[v.index()];
        if t > 0.0 {
            let inset = profile_inset(t, width, segments);
            let p = *mesh.position(v) - normals[v.index()] * inset;
            out.set_position(v, p);
            moved += 1;
        }
    }
    log::debug!("Bevel moved {} rim vertices", moved);

    Ok(out)
}

/// Sharpest incident dihedral per vertex, counting only edges above `sharp`.
fn sharp_edge_angles(mesh: &PieceMesh, sharp: f64) -> Vec<f64> {
    let topo = EdgeTopology::build(mesh);
    let face_normals: Vec<_> = mesh.face_ids().map(|f| mesh.face_normal(f)).collect();

    let mut theta = vec![0.0_f64; mesh.num_vertices()];
    for idx in 0..topo.num_edges() {
        if let Some(angle) = topo.dihedral_angle(idx, &face_normals) {
            if angle > sharp {
                for v in topo.edge(idx).vertices {
                    theta[v.index()] = theta[v.index()].max(angle);
                }
            }
        }
    }
    theta
}
