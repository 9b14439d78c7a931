//! # jigsaw-synth
//!
//! Procedural jigsaw pieces and their corner labels, for synthetic
//! training data.
//!
//! Each sample builds a randomized piece from a template quarter-section,
//! places the piece's UV island on a source image and records where the four
//! piece corners land in UV space. Those four coordinates are the labels a
//! corner-detection model is trained on; the piece itself, thickened,
//! smoothed and bevelled, is handed to a renderer along with a randomized
//! scene.
//!
//! ## Pipeline
//!
//! | Stage | Module |
//! |-------|--------|
//! | Parameter sampling | [`sampler`] |
//! | Warp anchors | [`deform`] |
//! | Quarter masking, join, weld | [`assemble`] |
//! | UV placement and labels | [`uv`] |
//! | Thickness, subdivision, bevel | [`finish`] |
//! | Lights, camera, floor | [`scene`] |
//! | Sequencing and reset | [`batch`] |
//!
//! Geometry operators and the initial unwrap are injected through the
//! [`modifier::ModifierBackend`] and [`uv::Unwrapper`] traits; the crate
//! ships deterministic implementations of both ([`backend::MeshBackend`],
//! [`uv::PlanarUnwrap`]).
//!
//! ## Quick Start
//!
//! ```
//! use jigsaw_synth::prelude::*;
//!
//! let section = TemplateSection::build(&TemplateOptions::default()).unwrap();
//! let config = GeneratorConfig::default();
//! let backend = MeshBackend::default();
//! let generator = PieceGenerator::new(&section, &config.piece, &backend, &PlanarUnwrap);
//!
//! let mut sampler = ParameterSampler::new(42);
//! let mut scene = SceneState::default();
//! let piece = generator
//!     .generate(&mut sampler, ImageSize::new(1920, 1080), &mut scene.material)
//!     .unwrap();
//!
//! for corner in piece.labels.corners {
//!     assert!((0.0..=1.0).contains(&corner.x));
//!     assert!((0.0..=1.0).contains(&corner.y));
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assemble;
pub mod backend;
pub mod batch;
pub mod config;
pub mod deform;
pub mod error;
pub mod finish;
pub mod generator;
pub mod io;
pub mod mesh;
pub mod modifier;
pub mod render;
pub mod sampler;
pub mod scene;
pub mod template;
pub mod textures;
pub mod uv;

/// Prelude module for convenient imports.
///
/// ```
/// use jigsaw_synth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::backend::MeshBackend;
    pub use crate::batch::{BatchMode, BatchOptions, BatchOrchestrator, BatchProgress};
    pub use crate::config::{GeneratorConfig, PieceConfig, SceneConfig, ValueRange};
    pub use crate::error::{Result, SynthError};
    pub use crate::generator::{GeneratedPiece, PieceGenerator};
    pub use crate::mesh::{PieceMesh, VertexGroup, VertexId};
    pub use crate::modifier::{MeshObject, Modifier, ModifierBackend};
    pub use crate::render::{Renderer, SceneExporter};
    pub use crate::sampler::{ParameterSampler, SideKind};
    pub use crate::scene::{SceneRandomizer, SceneState};
    pub use crate::template::{TemplateOptions, TemplateSection};
    pub use crate::uv::{CornerLabels, ImageSize, PlanarUnwrap, Unwrapper};
}

// Re-export nalgebra types for convenience
pub use nalgebra;
