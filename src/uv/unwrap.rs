//! Initial UV unwrap.
//!
//! The label engine only needs *some* island layout to start from; it is
//! produced by an injected [`Unwrapper`]. The built-in [`PlanarUnwrap`]
//! projects onto the piece's mean plane, which is exact for the flat pieces
//! the assembler produces.

use nalgebra::{Point2, Vector3};
use serde::{Deserialize, Serialize};

use super::UvLayer;
use crate::error::{Result, SynthError};
use crate::mesh::PieceMesh;

/// Unwrap algorithm requested from the unwrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnwrapMethod {
    /// Angle-based flattening.
    AngleBased,
    /// Conformal flattening.
    Conformal,
}

/// Options passed to an [`Unwrapper`].
#[derive(Debug, Clone, PartialEq)]
pub struct UnwrapOptions {
    /// Flattening method.
    pub method: UnwrapMethod,
    /// Fill holes before flattening.
    pub fill_holes: bool,
    /// Account for image aspect in the unwrap itself.
    pub correct_aspect: bool,
    /// Space left around the island.
    pub margin: f64,
}

impl Default for UnwrapOptions {
    fn default() -> Self {
        Self {
            method: UnwrapMethod::AngleBased,
            fill_holes: true,
            correct_aspect: true,
            margin: 0.001,
        }
    }
}

impl UnwrapOptions {
    /// Set the island margin.
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    /// Set the flattening method.
    pub fn with_method(mut self, method: UnwrapMethod) -> Self {
        self.method = method;
        self
    }
}

/// Produces an initial per-loop UV layout for a mesh.
pub trait Unwrapper {
    /// Compute one UV per loop of `mesh`.
    fn unwrap(&self, mesh: &PieceMesh, options: &UnwrapOptions) -> Result<UvLayer>;
}

/// Orthographic projection onto the mean plane of the mesh.
///
/// The island is scaled uniformly so that its longest extent spans
/// `1 - 2 * margin` and placed at `(margin, margin)`.
///
/// Only [`UnwrapOptions::margin`] is honoured. On a planar mesh the
/// projection is an isometry, so it is the exact answer for either
/// [`UnwrapMethod`]; on a curved mesh it is neither. `fill_holes` is ignored
/// because a projection has no interior to fill, and `correct_aspect` is
/// ignored because [`LabelEngine`](super::LabelEngine) applies the image
/// aspect itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanarUnwrap;

impl Unwrapper for PlanarUnwrap {
    fn unwrap(&self, mesh: &PieceMesh, options: &UnwrapOptions) -> Result<UvLayer> {
        if mesh.num_faces() == 0 {
            return Err(SynthError::EmptyMesh);
        }
        if !(0.0..0.5).contains(&options.margin) {
            return Err(SynthError::invalid_param(
                "margin",
                options.margin,
                "must be in [0, 0.5)",
            ));
        }

        let normal: Vector3<f64> = mesh.face_ids().map(|f| mesh.face_area_vector(f)).sum();
        let normal = if normal.norm() > 1e-15 {
            normal.normalize()
        } else {
            Vector3::z()
        };

        let seed = if normal.x.abs() < 0.9 {
            Vector3::x()
        } else {
            Vector3::y()
        };
        let u_axis = (seed - normal * normal.dot(&seed)).normalize();
        let v_axis = normal.cross(&u_axis);

        let coords = mesh
            .loops()
            .map(|(_, _, v)| {
                let p = mesh.position(v).coords;
                Point2::new(p.dot(&u_axis), p.dot(&v_axis))
            })
            .collect();

        let mut layer = UvLayer::new(coords);
        layer.normalize_with_margin(options.margin);
        Ok(layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_from_polygons, LoopId};
    use nalgebra::Point3;

    #[test]
    fn test_planar_square() {
        let vertices = vec![
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(-1.0, 1.0, 0.0),
        ];
        let mesh = build_from_polygons(&vertices, &[vec![0, 1, 2, 3]]).unwrap();
        let layer = PlanarUnwrap.unwrap(&mesh, &UnwrapOptions::default()).unwrap();

        assert_eq!(layer.len(), 4);
        let a = layer.get(LoopId::new(0));
        let c = layer.get(LoopId::new(2));
        assert!((a.x - 0.001).abs() < 1e-12 && (a.y - 0.001).abs() < 1e-12);
        assert!((c.x - 0.999).abs() < 1e-12 && (c.y - 0.999).abs() < 1e-12);
    }

    #[test]
    fn test_tilted_plane_keeps_shape() {
        // Unit right triangle in the XZ plane
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 2.0),
        ];
        let mesh = build_from_polygons(&vertices, &[vec![0, 1, 2]]).unwrap();
        let layer = PlanarUnwrap
            .unwrap(&mesh, &UnwrapOptions::default().with_margin(0.0))
            .unwrap();
        let d01 = (layer.get(LoopId::new(1)) - layer.get(LoopId::new(0))).norm();
        let d02 = (layer.get(LoopId::new(2)) - layer.get(LoopId::new(0))).norm();
        assert!((d01 - d02).abs() < 1e-12);
        assert!((d01 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_bad_margin() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh = build_from_polygons(&vertices, &[vec![0, 1, 2]]).unwrap();
        let options = UnwrapOptions::default().with_margin(0.6);
        assert!(PlanarUnwrap.unwrap(&mesh, &options).is_err());
    }

    #[test]
    fn test_only_margin_changes_layout() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(3.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh = build_from_polygons(&vertices, &[vec![0, 1, 2, 3]]).unwrap();
        let base = PlanarUnwrap.unwrap(&mesh, &UnwrapOptions::default()).unwrap();

        let other = UnwrapOptions {
            method: UnwrapMethod::Conformal,
            fill_holes: false,
            correct_aspect: false,
            ..UnwrapOptions::default()
        };
        assert_eq!(PlanarUnwrap.unwrap(&mesh, &other).unwrap(), base);

        let wide = PlanarUnwrap
            .unwrap(&mesh, &UnwrapOptions::default().with_margin(0.1))
            .unwrap();
        assert_ne!(wide, base);
    }
}
