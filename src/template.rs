//! The template section: one quarter of a piece with every connector style.
//!
//! A section is the wedge between the piece center and the side facing +X.
//! Its side corners sit at `(1, -1, 0)` and `(1, 1, 0)`. The wedge is built as
//! concentric rings of boundary samples so that all three side styles share
//! the center, both diagonal spokes and both corners; only the interior of
//! each side is duplicated per style. Masking a copy down to one style group
//! therefore leaves a single fan-shaped quarter whose spokes coincide with
//! the neighbouring quarters after a 90 degree rotation.
//!
//! # Example
//!
//! ```
//! use jigsaw_synth::template::{TemplateOptions, TemplateSection};
//! use jigsaw_synth::mesh::VertexGroup;
//!
//! let section = TemplateSection::build(&TemplateOptions::default()).unwrap();
//! assert_eq!(section.mesh().vertices_in(VertexGroup::Corner).len(), 2);
//! ```

use std::f64::consts::PI;
use std::path::Path;

use log::debug;
use nalgebra::Point3;

use crate::error::{Result, SynthError};
use crate::mesh::{build_with_groups, GroupSet, PieceMesh, VertexGroup};

/// Options for the procedural template section.
#[derive(Debug, Clone)]
pub struct TemplateOptions {
    /// Boundary samples along a side (even, at least 4).
    pub side_samples: usize,

    /// Concentric rings between the center and the side (at least 1).
    pub rings: usize,

    /// How far a connector bulges out of (or into) the side.
    pub connector_depth: f64,

    /// Half of the connector's extent along the side.
    pub connector_half_width: f64,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            side_samples: 24,
            rings: 6,
            connector_depth: 0.35,
            connector_half_width: 0.3,
        }
    }
}

impl TemplateOptions {
    /// Set the number of boundary samples per side.
    pub fn with_side_samples(mut self, samples: usize) -> Self {
        self.side_samples = samples;
        self
    }

    /// Set the number of rings.
    pub fn with_rings(mut self, rings: usize) -> Self {
        self.rings = rings;
        self
    }

    /// Set the connector depth.
    pub fn with_connector_depth(mut self, depth: f64) -> Self {
        self.connector_depth = depth;
        self
    }

    /// Set the connector half width.
    pub fn with_connector_half_width(mut self, half_width: f64) -> Self {
        self.connector_half_width = half_width;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.side_samples < 4 || self.side_samples % 2 != 0 {
            return Err(SynthError::invalid_param(
                "side_samples",
                self.side_samples,
                "must be even and at least 4",
            ));
        }
        if self.rings == 0 {
            return Err(SynthError::invalid_param("rings", self.rings, "must be at least 1"));
        }
        if !(0.0..0.9).contains(&self.connector_depth) {
            return Err(SynthError::invalid_param(
                "connector_depth",
                self.connector_depth,
                "must be in [0, 0.9)",
            ));
        }
        if !(self.connector_half_width > 0.0 && self.connector_half_width < 1.0) {
            return Err(SynthError::invalid_param(
                "connector_half_width",
                self.connector_half_width,
                "must be in (0, 1)",
            ));
        }
        Ok(())
    }

    /// Offset of the side outline from `x = 1` at height `y`.
    fn bump(&self, y: f64) -> f64 {
        let w = self.connector_half_width;
        if y.abs() >= w {
            return 0.0;
        }
        let c = (PI * y / (2.0 * w)).cos();
        self.connector_depth * c * c
    }
}

/// Immutable quarter-piece template shared by every iteration.
#[derive(Debug, Clone)]
pub struct TemplateSection {
    mesh: PieceMesh,
}

impl TemplateSection {
    /// Build the procedural section.
    pub fn build(options: &TemplateOptions) -> Result<Self> {
        options.validate()?;

        let n = options.side_samples;
        let rings = options.rings;
        let ring_scale = |r: usize| r as f64 / rings as f64;

        let mut positions = vec![Point3::origin()];
        let mut groups = vec![GroupSet::all_sides()];

        // Spokes k = 0 and k = n are shared by every style.
        let mut spoke = [Vec::with_capacity(rings), Vec::with_capacity(rings)];
        for (s, y) in [(0, -1.0), (1, 1.0)] {
            for r in 1..=rings {
                let t = ring_scale(r);
                spoke[s].push(positions.len());
                positions.push(Point3::new(t, t * y, 0.0));
                groups.push(if r == rings {
                    GroupSet::all_sides().with(VertexGroup::Corner)
                } else {
                    GroupSet::all_sides()
                });
            }
        }

        let mut faces: Vec<Vec<usize>> = Vec::new();

        for (group, sign) in [
            (VertexGroup::Edge, 0.0),
            (VertexGroup::Inward, -1.0),
            (VertexGroup::Outward, 1.0),
        ] {
            // grid[k][r - 1] is the vertex at boundary sample k on ring r
            let mut grid: Vec<Vec<usize>> = Vec::with_capacity(n + 1);
            grid.push(spoke[0].clone());
            for k in 1..n {
                let y = -1.0 + 2.0 * k as f64 / n as f64;
                let x = 1.0 + sign * options.bump(y);
                let column = (1..=rings)
                    .map(|r| {
                        let t = ring_scale(r);
                        positions.push(Point3::new(t * x, t * y, 0.0));
                        groups.push(GroupSet::only(group));
                        positions.len() - 1
                    })
                    .collect();
                grid.push(column);
            }
            grid.push(spoke[1].clone());

            for k in 0..n {
                faces.push(vec![0, grid[k][0], grid[k + 1][0]]);
                for r in 0..rings - 1 {
                    faces.push(vec![grid[k][r], grid[k][r + 1], grid[k + 1][r + 1], grid[k + 1][r]]);
                }
            }
        }

        let mesh = build_with_groups(&positions, &groups, &faces)?;
        debug!(
            "Built template section: {} vertices, {} faces",
            mesh.num_vertices(),
            mesh.num_faces()
        );
        Self::from_mesh(mesh)
    }

    /// Wrap an existing mesh, checking that every group is populated and
    /// that exactly two vertices are tagged as corners.
    pub fn from_mesh(mesh: PieceMesh) -> Result<Self> {
        if mesh.num_faces() == 0 {
            return Err(SynthError::EmptyMesh);
        }
        for group in VertexGroup::SECTION {
            if mesh.vertices_in(group).is_empty() {
                return Err(SynthError::MissingGroup { group: group.name() });
            }
        }
        let corners = mesh.vertices_in(VertexGroup::Corner).len();
        if corners != 2 {
            return Err(SynthError::CornerExtraction {
                found: corners,
                expected: 2,
            });
        }
        Ok(Self { mesh })
    }

    /// Load a section from a PLY file with a per-vertex `groups` property.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_mesh(crate::io::ply::load_ply(path)?)
    }

    /// Save the section as PLY.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        crate::io::ply::save_ply(&self.mesh, path)
    }

    /// The section mesh.
    pub fn mesh(&self) -> &PieceMesh {
        &self.mesh
    }

    /// Deep copy of the mesh for one iteration.
    pub fn instantiate(&self) -> PieceMesh {
        self.mesh.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::EdgeTopology;

    fn masked(section: &TemplateSection, group: VertexGroup) -> PieceMesh {
        let mesh = section.mesh();
        let keep: Vec<bool> = mesh.vertex_ids().map(|v| mesh.in_group(v, group)).collect();
        mesh.retain_vertices(&keep).0
    }

    #[test]
    fn test_default_section_counts() {
        let opts = TemplateOptions::default();
        let section = TemplateSection::build(&opts).unwrap();
        let mesh = section.mesh();

        let n = opts.side_samples;
        let r = opts.rings;
        assert_eq!(mesh.num_vertices(), 1 + 2 * r + 3 * (n - 1) * r);
        assert_eq!(mesh.num_faces(), 3 * n * r);
    }

    #[test]
    fn test_each_style_is_a_disk() {
        let section = TemplateSection::build(&TemplateOptions::default()).unwrap();
        for group in [VertexGroup::Edge, VertexGroup::Inward, VertexGroup::Outward] {
            let quarter = masked(&section, group);
            let topo = EdgeTopology::build(&quarter);
            assert_eq!(topo.boundary_loops().len(), 1, "{} quarter", group);
            assert_eq!(quarter.vertices_in(VertexGroup::Corner).len(), 2);
            // Counter-clockwise winding seen from +Z
            for f in quarter.face_ids() {
                assert!(quarter.face_area_vector(f).z > 0.0);
            }
        }
    }

    #[test]
    fn test_edge_quarter_is_flat_triangle() {
        let section = TemplateSection::build(&TemplateOptions::default()).unwrap();
        let quarter = masked(&section, VertexGroup::Edge);
        // Triangle (0,0), (1,-1), (1,1)
        assert!((quarter.surface_area() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_connectors_change_area() {
        let section = TemplateSection::build(&TemplateOptions::default()).unwrap();
        let inward = masked(&section, VertexGroup::Inward).surface_area();
        let outward = masked(&section, VertexGroup::Outward).surface_area();
        assert!(inward < 1.0);
        assert!(outward > 1.0);
    }

    #[test]
    fn test_invalid_options() {
        let opts = TemplateOptions::default().with_side_samples(5);
        assert!(TemplateSection::build(&opts).is_err());
        let opts = TemplateOptions::default().with_rings(0);
        assert!(TemplateSection::build(&opts).is_err());
    }

    #[test]
    fn test_from_mesh_requires_groups() {
        let section = TemplateSection::build(&TemplateOptions::default()).unwrap();
        let quarter = masked(&section, VertexGroup::Edge);
        // Inward/Outward-only vertices were removed
        let mut mesh = quarter;
        for v in mesh.vertex_ids().collect::<Vec<_>>() {
            let g = mesh.groups(v);
            mesh.set_groups(
                v,
                GroupSet::from_bits(g.bits() & !GroupSet::only(VertexGroup::Outward).bits()),
            );
        }
        assert!(matches!(
            TemplateSection::from_mesh(mesh),
            Err(SynthError::MissingGroup { group: "Outward" })
        ));
    }
}
