//! Warp operator.

use rayon::prelude::*;

use crate::deform::WarpField;
use crate::mesh::PieceMesh;

/// Move every vertex by `field`.
pub fn warp_mesh(mesh: &mut PieceMesh, field: &WarpField, parallel: bool) {
    let positions = mesh.positions_mut();
    if parallel {
        positions.par_iter_mut().for_each(|p| *p = field.apply(p));
    } else {
        positions.iter_mut().for_each(|p| *p = field.apply(p));
    }
}
