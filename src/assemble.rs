//! Piece assembly.
//!
//! A live copy of the template section carries a deferred stack of one weld
//! and eight warps. Four copies of it are rotated to face +X, +Y, -X and -Y,
//! each masked down to the connector style drawn for that side, and joined.
//! The joined piece inherits the first copy's stack, which is then applied:
//! the weld stitches the quarters together along their shared spokes and
//! the warps randomize the outline. Finally the piece is moved so that its
//! center of mass sits at the origin.

use std::f64::consts::FRAC_PI_2;

use log::debug;

use crate::config::PieceConfig;
use crate::deform::{sample_anchor_pairs, warp_fields, WarpField};
use crate::error::{Result, SynthError};
use crate::mesh::{EdgeTopology, VertexGroup};
use crate::modifier::{MeshObject, Modifier, ModifierBackend};
use crate::sampler::{IterationParams, ParameterSampler, SideKind};
use crate::template::TemplateSection;
use crate::uv::NUM_CORNERS;

/// Merge distance used to stitch the quarters together.
pub const WELD_THRESHOLD: f64 = 0.005;

/// Copy the section and defer a weld followed by `warps` on it.
pub fn live_section(section: &TemplateSection, warps: &[WarpField]) -> MeshObject {
    let mut live = MeshObject::new(section.instantiate());
    live.push(Modifier::Weld {
        threshold: WELD_THRESHOLD,
    });
    for warp in warps {
        live.push(Modifier::Warp(*warp));
    }
    live
}

/// Make one rotated, masked copy of `live` per side.
///
/// Copy `i` is rotated by `i * 90` degrees about Z and masked to the group of
/// `sides[i]`. Rotation and mask are baked; the copy keeps `live`'s deferred
/// stack.
pub fn quarter_copies(
    live: &MeshObject,
    sides: &[SideKind; 4],
    backend: &dyn ModifierBackend,
) -> Result<Vec<MeshObject>> {
    sides
        .iter()
        .enumerate()
        .map(|(i, side)| {
            let mut copy = live.clone();
            copy.mesh.rotate_z(i as f64 * FRAC_PI_2);
            copy.push(Modifier::Mask { group: side.group() });
            copy.apply_modifier(backend, copy.modifiers().len() - 1)?;
            Ok(copy)
        })
        .collect()
}

/// Join the quarters, apply the inherited stack and recenter.
///
/// # Errors
/// - [`SynthError::NotWatertight`] unless the outline is one closed loop
/// - [`SynthError::CornerExtraction`] unless exactly four corners remain
pub fn join_quarters(
    quarters: Vec<MeshObject>,
    backend: &dyn ModifierBackend,
) -> Result<MeshObject> {
    let mut piece = MeshObject::join(quarters);
    piece.apply_all(backend)?;

    let com = piece.mesh.center_of_mass().ok_or(SynthError::EmptyMesh)?;
    piece.mesh.translate(-com.coords);

    let loops = EdgeTopology::build(&piece.mesh).boundary_loops().len();
    if loops != 1 {
        return Err(SynthError::NotWatertight {
            boundary_loops: loops,
        });
    }
    let corners = piece.mesh.vertices_in(VertexGroup::Corner).len();
    if corners != NUM_CORNERS {
        return Err(SynthError::CornerExtraction {
            found: corners,
            expected: NUM_CORNERS,
        });
    }

    debug!(
        "Assembled piece: {} vertices, {} faces",
        piece.mesh.num_vertices(),
        piece.mesh.num_faces()
    );
    Ok(piece)
}

/// Sample anchors and build a complete piece in one call.
pub fn assemble_piece(
    section: &TemplateSection,
    params: &IterationParams,
    config: &PieceConfig,
    sampler: &mut ParameterSampler,
    backend: &dyn ModifierBackend,
) -> Result<MeshObject> {
    let anchors = sample_anchor_pairs(sampler, params, config);
    let live = live_section(section, &warp_fields(&anchors));
    let quarters = quarter_copies(&live, &params.sides, backend)?;
    join_quarters(quarters, backend)
}
