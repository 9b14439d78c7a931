//! Vertex-group mask.

use crate::error::{Result, SynthError};
use crate::mesh::{PieceMesh, VertexGroup, VertexRemap};

/// Keep the vertices in `group` and the faces whose corners are all kept.
///
/// # Errors
/// [`SynthError::MissingGroup`] if no vertex belongs to `group`.
pub fn mask_group(mesh: &PieceMesh, group: VertexGroup) -> Result<(PieceMesh, VertexRemap)> {
    let keep: Vec<bool> = mesh.vertex_ids().map(|v| mesh.in_group(v, group)).collect();
    if !keep.iter().any(|&k| k) {
        return Err(SynthError::MissingGroup { group: group.name() });
    }
    Ok(mesh.retain_vertices(&keep))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_with_groups, GroupSet};
    use crate::template::{TemplateOptions, TemplateSection};
    use nalgebra::Point3;

    #[test]
    fn test_mask_keeps_one_style() {
        let section = TemplateSection::build(&TemplateOptions::default()).unwrap();
        let (quarter, remap) = mask_group(section.mesh(), VertexGroup::Outward).unwrap();

        assert_eq!(quarter.num_faces() * 3, section.mesh().num_faces());
        assert_eq!(remap.len(), section.mesh().num_vertices());
        for v in quarter.vertex_ids() {
            assert!(quarter.in_group(v, VertexGroup::Outward));
        }
    }

    #[test]
    fn test_mask_missing_group() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let groups = vec![GroupSet::only(VertexGroup::Edge); 3];
        let mesh = build_with_groups(&vertices, &groups, &[vec![0, 1, 2]]).unwrap();
        assert!(matches!(
            mask_group(&mesh, VertexGroup::Inward),
            Err(SynthError::MissingGroup { group: "Inward" })
        ));
    }
}
