//! Finishing stack.
//!
//! Gives the flat, labelled piece its physical look: a cardboard thickness,
//! rounded surfaces and a die-cut rim. Everything is pushed onto the piece's
//! deferred modifier stack so the labels, which were computed on the flat
//! piece, are unaffected. The stack is evaluated at render time.

use serde::{Deserialize, Serialize};

use crate::config::PieceConfig;
use crate::modifier::{MeshObject, Modifier};
use crate::sampler::ParameterSampler;
use crate::scene::Material;

/// Catmull-Clark levels in the viewport and at render time.
pub const SUBDIVISION_LEVELS: u32 = 3;

/// Segments across the rim bevel.
pub const BEVEL_SEGMENTS: u32 = 4;

/// Sampled finishing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinishParams {
    /// Solidify thickness.
    pub thickness: f64,
    /// Bevel width.
    pub bevel_width: f64,
    /// Material specular.
    pub specular: f64,
}

/// Draw thickness, bevel width and specular, in that order.
pub fn sample_finish(sampler: &mut ParameterSampler, config: &PieceConfig) -> FinishParams {
    let thickness = sampler.range(config.solidify);
    let bevel_width = sampler.range(config.bevel);
    let specular = sampler.range(config.specular);
    FinishParams {
        thickness,
        bevel_width,
        specular,
    }
}

/// The three finishing modifiers, in stack order.
pub fn finish_modifiers(params: &FinishParams) -> [Modifier; 3] {
    [
        Modifier::Solidify {
            thickness: params.thickness,
        },
        Modifier::Subdivision {
            levels: SUBDIVISION_LEVELS,
            render_levels: SUBDIVISION_LEVELS,
        },
        Modifier::Bevel {
            segments: BEVEL_SEGMENTS,
            width: params.bevel_width,
        },
    ]
}

/// Push the finishing stack onto `piece` and set the material's specular.
pub fn apply_finish(piece: &mut MeshObject, material: &mut Material, params: &FinishParams) {
    for modifier in finish_modifiers(params) {
        piece.push(modifier);
    }
    material.specular = params.specular;
}
