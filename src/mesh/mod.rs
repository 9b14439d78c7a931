//! Core mesh data structures.
//!
//! # Overview
//!
//! The primary type is [`PieceMesh`], a polygon mesh whose faces are runs of
//! *loops* (face corners). Vertices carry [`GroupSet`] membership so that a
//! template section can be masked down to one connector style, and loops
//! carry optional UV coordinates.
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe index wrappers:
//! - [`VertexId`] - Identifies a vertex
//! - [`FaceId`] - Identifies a face
//! - [`LoopId`] - Identifies a face corner
//!
//! Topology edits return a [`VertexRemap`] so a vertex can be followed by id
//! through masking, joining and welding.
//!
//! # Construction
//!
//! ```
//! use jigsaw_synth::mesh::build_from_polygons;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![vec![0, 1, 2]];
//!
//! let mesh = build_from_polygons(&vertices, &faces).unwrap();
//! assert_eq!(mesh.num_faces(), 1);
//! ```

mod builder;
mod groups;
mod index;
mod piece;
mod topology;

pub use builder::{build_from_polygons, build_with_groups, to_face_vertex, to_triangles};
pub use groups::{GroupSet, VertexGroup};
pub use index::{FaceId, LoopId, VertexId, VertexRemap};
pub use piece::PieceMesh;
pub use topology::{Edge, EdgeSide, EdgeTopology};
