//! Deferred modifier stacks.
//!
//! A [`MeshObject`] pairs base geometry with an ordered list of
//! [`Modifier`]s that are not baked into the geometry until they are
//! explicitly applied or the object is evaluated for export. The operators
//! themselves are supplied by a [`ModifierBackend`]; the crate ships a
//! deterministic built-in one in [`crate::backend`].

use serde::{Deserialize, Serialize};

use crate::deform::WarpField;
use crate::error::{Result, SynthError};
use crate::mesh::{PieceMesh, VertexGroup, VertexRemap};

/// A deferred geometry operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Modifier {
    /// Merge vertices closer than `threshold`.
    Weld {
        /// Merge distance.
        threshold: f64,
    },
    /// Pose-to-pose warp.
    Warp(WarpField),
    /// Keep only vertices in `group`.
    Mask {
        /// Group to keep.
        group: VertexGroup,
    },
    /// Give the surface thickness.
    Solidify {
        /// Shell thickness.
        thickness: f64,
    },
    /// Catmull-Clark subdivision.
    Subdivision {
        /// Viewport levels.
        levels: u32,
        /// Levels used when rendering or exporting.
        render_levels: u32,
    },
    /// Round the rims.
    Bevel {
        /// Profile segments.
        segments: u32,
        /// Bevel width.
        width: f64,
    },
}

impl Modifier {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Modifier::Weld { .. } => "weld",
            Modifier::Warp(_) => "warp",
            Modifier::Mask { .. } => "mask",
            Modifier::Solidify { .. } => "solidify",
            Modifier::Subdivision { .. } => "subdivision",
            Modifier::Bevel { .. } => "bevel",
        }
    }
}

/// Geometry operators a modifier stack can be evaluated with.
///
/// Topology-changing operators return the remap from input to output vertex
/// ids so that callers can follow vertices by identity.
pub trait ModifierBackend {
    /// Move vertices by a warp field.
    fn warp(&self, mesh: &mut PieceMesh, field: &WarpField) -> Result<()>;

    /// Keep vertices in `group` and faces whose corners are all kept.
    fn mask(&self, mesh: &PieceMesh, group: VertexGroup) -> Result<(PieceMesh, VertexRemap)>;

    /// Merge vertices within `threshold` of each other.
    fn weld(&self, mesh: &PieceMesh, threshold: f64) -> Result<(PieceMesh, VertexRemap)>;

    /// Extrude a shell of the given thickness.
    fn solidify(&self, mesh: &PieceMesh, thickness: f64) -> Result<PieceMesh>;

    /// Subdivide `levels` times.
    fn subdivide(&self, mesh: &PieceMesh, levels: u32) -> Result<PieceMesh>;

    /// Round rim edges.
    fn bevel(&self, mesh: &PieceMesh, segments: u32, width: f64) -> Result<PieceMesh>;

    /// Apply one modifier, returning the new mesh and the vertex remap.
    ///
    /// Operators that create or destroy vertices without a one-to-one
    /// correspondence (solidify, subdivision, bevel) keep input vertex `i`
    /// at output index `i`, so the remap is the identity on the input.
    fn apply(&self, mut mesh: PieceMesh, modifier: &Modifier) -> Result<(PieceMesh, VertexRemap)> {
        let n = mesh.num_vertices();
        match modifier {
            Modifier::Weld { threshold } => self.weld(&mesh, *threshold),
            Modifier::Mask { group } => self.mask(&mesh, *group),
            Modifier::Warp(field) => {
                self.warp(&mut mesh, field)?;
                Ok((mesh, VertexRemap::identity(n)))
            }
            Modifier::Solidify { thickness } => {
                Ok((self.solidify(&mesh, *thickness)?, VertexRemap::identity(n)))
            }
            Modifier::Subdivision { render_levels, .. } => {
                Ok((self.subdivide(&mesh, *render_levels)?, VertexRemap::identity(n)))
            }
            Modifier::Bevel { segments, width } => {
                Ok((self.bevel(&mesh, *segments, *width)?, VertexRemap::identity(n)))
            }
        }
    }
}

/// Geometry plus its deferred modifier stack.
#[derive(Debug, Clone, Default)]
pub struct MeshObject {
    /// Base geometry.
    pub mesh: PieceMesh,
    modifiers: Vec<Modifier>,
}

impl MeshObject {
    /// Wrap a mesh with an empty stack.
    pub fn new(mesh: PieceMesh) -> Self {
        Self {
            mesh,
            modifiers: Vec::new(),
        }
    }

    /// Append a modifier to the end of the stack.
    pub fn push(&mut self, modifier: Modifier) {
        self.modifiers.push(modifier);
    }

    /// The deferred stack, in evaluation order.
    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    /// Bake the modifier at `index` into the base mesh and remove it.
    ///
    /// Only that modifier is evaluated: modifiers before it in the stack stay
    /// deferred and are not applied first.
    pub fn apply_modifier(
        &mut self,
        backend: &dyn ModifierBackend,
        index: usize,
    ) -> Result<VertexRemap> {
        if index >= self.modifiers.len() {
            return Err(SynthError::invalid_param(
                "modifier index",
                index,
                "out of range for modifier stack",
            ));
        }
        let modifier = self.modifiers.remove(index);
        let (mesh, remap) = backend.apply(std::mem::take(&mut self.mesh), &modifier)?;
        self.mesh = mesh;
        Ok(remap)
    }

    /// Bake the whole stack in order and clear it.
    ///
    /// Returns the composed remap from the old base mesh to the new one.
    pub fn apply_all(&mut self, backend: &dyn ModifierBackend) -> Result<VertexRemap> {
        let mut remap = VertexRemap::identity(self.mesh.num_vertices());
        for modifier in std::mem::take(&mut self.modifiers) {
            log::debug!("Applying {} modifier", modifier.name());
            let (mesh, step) = backend.apply(std::mem::take(&mut self.mesh), &modifier)?;
            self.mesh = mesh;
            remap = remap.then(&step);
        }
        Ok(remap)
    }

    /// Evaluate the stack on a copy of the base mesh, leaving `self` intact.
    pub fn evaluate(&self, backend: &dyn ModifierBackend) -> Result<PieceMesh> {
        let mut mesh = self.mesh.clone();
        for modifier in &self.modifiers {
            mesh = backend.apply(mesh, modifier)?.0;
        }
        Ok(mesh)
    }

    /// Join objects into one. The result keeps only the first object's
    /// modifier stack.
    pub fn join(objects: Vec<MeshObject>) -> MeshObject {
        let meshes: Vec<PieceMesh> = objects.iter().map(|o| o.mesh.clone()).collect();
        let modifiers = objects
            .into_iter()
            .next()
            .map(|o| o.modifiers)
            .unwrap_or_default();
        MeshObject {
            mesh: PieceMesh::join(&meshes),
            modifiers,
        }
    }
}
