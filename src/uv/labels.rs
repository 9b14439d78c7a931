//! Corner labels.
//!
//! Places a piece's UV island on the source image and reads off where its
//! four corners land. The steps run in a fixed order:
//!
//! 1. Unwrap, unless the mesh already has a UV layer
//! 2. Snapshot the corner vertices
//! 3. Correct for the image aspect ratio
//! 4. Scale by the piece's overall scale
//! 5. Rotate about `(0.5, 0.5)`
//! 6. Measure the bounding box
//! 7. Draw a random offset that keeps the box inside the unit square
//! 8. Move the island to that offset
//! 9. Record the first UV of each corner vertex in face-loop order

use std::collections::HashSet;

use log::debug;
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use super::unwrap::{UnwrapOptions, Unwrapper};
use crate::error::{Result, SynthError};
use crate::mesh::{PieceMesh, VertexGroup, VertexId};
use crate::sampler::ParameterSampler;

/// Number of labelled corners per piece.
pub const NUM_CORNERS: usize = 4;

/// Pixel dimensions of a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ImageSize {
    /// Create an image size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Per-axis UV factors that undo the image's aspect ratio.
    ///
    /// The shorter axis is compressed by `short / long`; the other factor is
    /// 1. Both are exactly 1 for a square image.
    pub fn aspect_factors(&self) -> (f64, f64) {
        let w = self.width as f64;
        let h = self.height as f64;
        if w < h {
            (1.0, w / h)
        } else {
            (h / w, 1.0)
        }
    }
}

/// The four corner UVs of a piece, in face-loop discovery order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CornerLabels {
    /// Corner coordinates, each in `[0, 1]`.
    pub corners: [Point2<f64>; NUM_CORNERS],
}

impl CornerLabels {
    /// Coordinates as `[x1, y1, x2, y2, ...]`.
    pub fn flatten(&self) -> [f64; 2 * NUM_CORNERS] {
        let mut out = [0.0; 2 * NUM_CORNERS];
        for (i, c) in self.corners.iter().enumerate() {
            out[2 * i] = c.x;
            out[2 * i + 1] = c.y;
        }
        out
    }
}

/// Computes UV placement and corner labels.
pub struct LabelEngine<'a> {
    unwrapper: &'a dyn Unwrapper,
    options: UnwrapOptions,
}

impl<'a> LabelEngine<'a> {
    /// Create an engine using `unwrapper` with the given options.
    pub fn new(unwrapper: &'a dyn Unwrapper, options: UnwrapOptions) -> Self {
        Self { unwrapper, options }
    }

    /// Place the island and extract the corner labels.
    ///
    /// On success every loop UV of `mesh` lies in `[0, 1]`, up to rounding in
    /// the final translation.
    ///
    /// # Errors
    /// - [`SynthError::UvOverflow`] if the transformed island is larger than
    ///   the unit square
    /// - [`SynthError::CornerExtraction`] unless exactly four corners are found
    pub fn label(
        &self,
        mesh: &mut PieceMesh,
        image: ImageSize,
        overall_scale: f64,
        rotation_degrees: f64,
        sampler: &mut ParameterSampler,
    ) -> Result<CornerLabels> {
        if image.width == 0 || image.height == 0 {
            return Err(SynthError::invalid_param(
                "image size",
                format!("{}x{}", image.width, image.height),
                "must be non-zero",
            ));
        }

        // Step 1: Unwrap
        if mesh.uv().is_none() {
            let layer = self.unwrapper.unwrap(mesh, &self.options)?;
            if layer.len() != mesh.num_loops() {
                return Err(SynthError::invalid_param(
                    "unwrap result",
                    layer.len(),
                    "must have one UV per loop",
                ));
            }
            mesh.set_uv(Some(layer));
        }

        // Step 2: Corner snapshot
        let corners: HashSet<VertexId> = mesh.vertices_in(VertexGroup::Corner).into_iter().collect();
        if corners.len() != NUM_CORNERS {
            return Err(SynthError::CornerExtraction {
                found: corners.len(),
                expected: NUM_CORNERS,
            });
        }

        let (su, sv) = image.aspect_factors();
        let rotation = rotation_degrees.to_radians();

        let (width, height) = {
            let layer = match mesh.uv_mut() {
                Some(layer) => layer,
                None => return Err(SynthError::EmptyMesh),
            };

            // Steps 3-5: Aspect, scale, rotation
            layer.scale(su * overall_scale, sv * overall_scale);
            layer.rotate_about(Point2::new(0.5, 0.5), rotation);

            // Step 6: Bounding box
            let (min, max) = layer.bounding_box().ok_or(SynthError::EmptyMesh)?;
            let width = max.x - min.x;
            let height = max.y - min.y;
            if width > 1.0 || height > 1.0 {
                return Err(SynthError::UvOverflow { width, height });
            }

            // Steps 7-8: Random placement
            let offset_x = sampler.uniform(0.0, 1.0 - width);
            let offset_y = sampler.uniform(0.0, 1.0 - height);
            layer.translate(Vector2::new(offset_x - min.x, offset_y - min.y));
            (width, height)
        };
        debug!(
            "UV island {:.4} x {:.4} (aspect {:.4}/{:.4}, rotation {:.1})",
            width, height, su, sv, rotation_degrees
        );

        // Step 9: Corner extraction
        let layer = mesh.uv().ok_or(SynthError::EmptyMesh)?;
        let mut seen: HashSet<VertexId> = HashSet::with_capacity(NUM_CORNERS);
        let mut found: Vec<Point2<f64>> = Vec::with_capacity(NUM_CORNERS);
        for (_, l, v) in mesh.loops() {
            if corners.contains(&v) && seen.insert(v) {
                found.push(layer.get(l));
                if found.len() == NUM_CORNERS {
                    break;
                }
            }
        }

        let corners: [Point2<f64>; NUM_CORNERS] =
            found
                .as_slice()
                .try_into()
                .map_err(|_| SynthError::CornerExtraction {
                    found: found.len(),
                    expected: NUM_CORNERS,
                })?;
        Ok(CornerLabels { corners })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_with_groups, GroupSet};
    use crate::uv::{PlanarUnwrap, UvLayer};
    use nalgebra::Point3;

    /// A 3x3 grid over [-1, 1]^2 with the outer corners tagged.
    fn tagged_square() -> PieceMesh {
        let mut vertices = Vec::new();
        let mut groups = Vec::new();
        for j in 0..3 {
            for i in 0..3 {
                vertices.push(Point3::new(i as f64 - 1.0, j as f64 - 1.0, 0.0));
                let corner = (i == 0 || i == 2) && (j == 0 || j == 2);
                groups.push(if corner {
                    GroupSet::only(VertexGroup::Corner)
                } else {
                    GroupSet::EMPTY
                });
            }
        }
        let idx = |i: usize, j: usize| j * 3 + i;
        let mut faces = Vec::new();
        for j in 0..2 {
            for i in 0..2 {
                faces.push(vec![idx(i, j), idx(i + 1, j), idx(i + 1, j + 1), idx(i, j + 1)]);
            }
        }
        build_with_groups(&vertices, &groups, &faces).unwrap()
    }

    fn engine() -> LabelEngine<'static> {
        LabelEngine::new(&PlanarUnwrap, UnwrapOptions::default())
    }

    #[test]
    fn test_square_aspect_is_exactly_one() {
        assert_eq!(ImageSize::new(512, 512).aspect_factors(), (1.0, 1.0));
        assert_eq!(ImageSize::new(200, 100).aspect_factors(), (0.5, 1.0));
        assert_eq!(ImageSize::new(100, 400).aspect_factors(), (1.0, 0.25));
    }

    #[test]
    fn test_axis_aligned_square_labels() {
        let mut mesh = tagged_square();
        let mut sampler = ParameterSampler::new(5);
        let labels = engine()
            .label(&mut mesh, ImageSize::new(256, 256), 0.1, 0.0, &mut sampler)
            .unwrap();

        let xs: Vec<f64> = labels.corners.iter().map(|c| c.x).collect();
        let ys: Vec<f64> = labels.corners.iter().map(|c| c.y).collect();
        let span = |v: &[f64]| {
            v.iter().cloned().fold(f64::MIN, f64::max) - v.iter().cloned().fold(f64::MAX, f64::min)
        };
        assert!((span(&xs) - 0.0998).abs() < 1e-9);
        assert!((span(&ys) - 0.0998).abs() < 1e-9);
        assert!(mesh.uv().unwrap().within_unit_square(1e-12));
    }

    #[test]
    fn test_corner_order_follows_loops() {
        let mut mesh = tagged_square();
        let mut sampler = ParameterSampler::new(9);
        let labels = engine()
            .label(&mut mesh, ImageSize::new(300, 200), 0.15, 0.0, &mut sampler)
            .unwrap();
        // Face 0 reaches corner (-1,-1) first, then face 1 (1,-1), face 2 (-1,1), face 3 (1,1)
        let c = labels.corners;
        assert!(c[0].x < c[1].x && (c[0].y - c[1].y).abs() < 1e-12);
        assert!(c[2].y > c[0].y && (c[2].x - c[0].x).abs() < 1e-12);
        assert!(c[3].x > c[2].x && c[3].y > c[1].y);
        // Wide image compresses u
        assert!(((c[1].x - c[0].x) / (c[2].y - c[0].y) - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotated_island_stays_inside() {
        let mut sampler = ParameterSampler::new(1);
        for step in 0..24 {
            let mut mesh = tagged_square();
            let angle = step as f64 * 15.0;
            let labels = engine()
                .label(&mut mesh, ImageSize::new(640, 480), 0.7, angle, &mut sampler)
                .unwrap();
            let inside = |x: f64| (-1e-12..=1.0 + 1e-12).contains(&x);
            for c in labels.corners {
                assert!(inside(c.x) && inside(c.y));
            }
        }
    }

    #[test]
    fn test_existing_layer_reused() {
        let mut mesh = tagged_square();
        let n = mesh.num_loops();
        mesh.set_uv(Some(UvLayer::new(vec![Point2::new(0.5, 0.5); n])));
        let mut sampler = ParameterSampler::new(2);
        let labels = engine()
            .label(&mut mesh, ImageSize::new(10, 10), 0.1, 30.0, &mut sampler)
            .unwrap();
        // Degenerate island: all corners land on the same spot
        assert!(labels.corners.iter().all(|c| *c == labels.corners[0]));
    }

    #[test]
    fn test_overflow() {
        let mut mesh = tagged_square();
        let mut sampler = ParameterSampler::new(3);
        let result = engine().label(&mut mesh, ImageSize::new(64, 64), 1.2, 0.0, &mut sampler);
        assert!(matches!(result, Err(SynthError::UvOverflow { .. })));
    }

    #[test]
    fn test_wrong_corner_count() {
        let mut mesh = tagged_square();
        mesh.set_groups(VertexId::new(4), GroupSet::only(VertexGroup::Corner));
        let mut sampler = ParameterSampler::new(4);
        let result = engine().label(&mut mesh, ImageSize::new(64, 64), 0.1, 0.0, &mut sampler);
        assert!(matches!(
            result,
            Err(SynthError::CornerExtraction { found: 5, expected: 4 })
        ));
    }

    #[test]
    fn test_flatten() {
        let labels = CornerLabels {
            corners: [
                Point2::new(0.1, 0.2),
                Point2::new(0.3, 0.4),
                Point2::new(0.5, 0.6),
                Point2::new(0.7, 0.8),
            ],
        };
        assert_eq!(labels.flatten(), [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8]);
    }
}
