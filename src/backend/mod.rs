//! Built-in geometry operators.
//!
//! [`MeshBackend`] implements [`ModifierBackend`] directly on [`PieceMesh`]
//! so that the whole pipeline runs without an external modelling tool. Each
//! operator lives in its own module:
//!
//! - [`warp`]: pose-to-pose warp with radial falloff
//! - [`mask`]: keep one vertex group
//! - [`weld`]: merge vertices by distance
//! - [`solidify`]: extrude a shell with side walls
//! - [`subdivide`]: Catmull-Clark on arbitrary polygons
//! - [`bevel`]: round sharp rims
//!
//! # Example
//!
//! ```
//! use jigsaw_synth::backend::MeshBackend;
//! use jigsaw_synth::mesh::build_from_polygons;
//! use jigsaw_synth::modifier::ModifierBackend;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mesh = build_from_polygons(&vertices, &[vec![0, 1, 2, 3]]).unwrap();
//!
//! let backend = MeshBackend::default();
//! let refined = backend.subdivide(&mesh, 2).unwrap();
//! assert_eq!(refined.num_faces(), 16);
//! ```

pub mod bevel;
pub mod mask;
pub mod solidify;
pub mod subdivide;
pub mod warp;
pub mod weld;

use crate::deform::WarpField;
use crate::error::Result;
use crate::mesh::{PieceMesh, VertexGroup, VertexRemap};
use crate::modifier::ModifierBackend;

/// Options for the built-in backend.
#[derive(Debug, Clone)]
pub struct BackendOptions {
    /// Edges whose face normals differ by more than this angle (degrees) are
    /// treated as sharp rims by the bevel operator.
    pub sharp_angle_degrees: f64,

    /// Whether to use parallel execution (default: true).
    pub parallel: bool,
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            sharp_angle_degrees: 30.0,
            parallel: true,
        }
    }
}

impl BackendOptions {
    /// Set the sharp-edge angle used by bevel.
    pub fn with_sharp_angle(mut self, degrees: f64) -> Self {
        self.sharp_angle_degrees = degrees.clamp(0.0, 180.0);
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Deterministic in-process implementation of every modifier.
#[derive(Debug, Clone, Default)]
pub struct MeshBackend {
    /// Operator options.
    pub options: BackendOptions,
}

impl MeshBackend {
    /// Create a backend with the given options.
    pub fn new(options: BackendOptions) -> Self {
        Self { options }
    }
}

impl ModifierBackend for MeshBackend {
    fn warp(&self, mesh: &mut PieceMesh, field: &WarpField) -> Result<()> {
        warp::warp_mesh(mesh, field, self.options.parallel);
        Ok(())
    }

    fn mask(&self, mesh: &PieceMesh, group: VertexGroup) -> Result<(PieceMesh, VertexRemap)> {
        mask::mask_group(mesh, group)
    }

    fn weld(&self, mesh: &PieceMesh, threshold: f64) -> Result<(PieceMesh, VertexRemap)> {
        weld::weld_by_distance(mesh, threshold)
    }

    fn solidify(&self, mesh: &PieceMesh, thickness: f64) -> Result<PieceMesh> {
        solidify::solidify(mesh, thickness)
    }

    fn subdivide(&self, mesh: &PieceMesh, levels: u32) -> Result<PieceMesh> {
        Ok(subdivide::catmull_clark(mesh, levels, self.options.parallel))
    }

    fn bevel(&self, mesh: &PieceMesh, segments: u32, width: f64) -> Result<PieceMesh> {
        bevel::bevel_rims(mesh, segments, width, self.options.sharp_angle_degrees)
    }
}
