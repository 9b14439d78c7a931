//! UV layout and corner labels.
//!
//! - [`UvLayer`]: per-loop UV storage
//! - [`Unwrapper`]: initial island layout ([`PlanarUnwrap`] built in)
//! - [`LabelEngine`]: places the island on the image and extracts the four
//!   corner coordinates that become the training labels
//!
//! # Example
//!
//! ```
//! use jigsaw_synth::assemble::assemble_piece;
//! use jigsaw_synth::backend::MeshBackend;
//! use jigsaw_synth::config::PieceConfig;
//! use jigsaw_synth::sampler::ParameterSampler;
//! use jigsaw_synth::template::{TemplateOptions, TemplateSection};
//! use jigsaw_synth::uv::{ImageSize, LabelEngine, PlanarUnwrap, UnwrapOptions};
//!
//! let section = TemplateSection::build(&TemplateOptions::default()).unwrap();
//! let mut sampler = ParameterSampler::new(7);
//! let config = PieceConfig::default();
//! let params = sampler.iteration_params(&config);
//!
//! let mut piece = assemble_piece(&section, &params, &config, &mut sampler, &MeshBackend::default())
//!     .unwrap();
//!
//! let engine = LabelEngine::new(&PlanarUnwrap, UnwrapOptions::default());
//! let labels = engine
//!     .label(&mut piece.mesh, ImageSize::new(1024, 768), params.overall_scale,
//!            params.rotation_degrees, &mut sampler)
//!     .unwrap();
//! assert_eq!(labels.corners.len(), 4);
//! ```

mod labels;
mod layer;
mod unwrap;

pub use labels::{CornerLabels, ImageSize, LabelEngine, NUM_CORNERS};
pub use layer::UvLayer;
pub use unwrap::{PlanarUnwrap, UnwrapMethod, UnwrapOptions, Unwrapper};
