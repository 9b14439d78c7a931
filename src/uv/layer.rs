//! Per-loop UV coordinate storage.

use nalgebra::{Point2, Rotation2, Vector2};

use crate::mesh::LoopId;

/// UV coordinates for the face loops of a mesh.
///
/// Coordinates are indexed by [`LoopId`], so a vertex shared by several faces
/// may carry a different UV in each. After the label engine has placed the
/// island, every coordinate lies in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct UvLayer {
    coords: Vec<Point2<f64>>,
}

impl UvLayer {
    /// Create a layer from per-loop coordinates.
    pub fn new(coords: Vec<Point2<f64>>) -> Self {
        Self { coords }
    }

    /// Create a layer filled with zeros.
    pub fn zeros(n: usize) -> Self {
        Self {
            coords: vec![Point2::origin(); n],
        }
    }

    /// UV of a loop.
    #[inline]
    pub fn get(&self, l: LoopId) -> Point2<f64> {
        self.coords[l.index()]
    }

    /// Set the UV of a loop.
    #[inline]
    pub fn set(&mut self, l: LoopId, uv: Point2<f64>) {
        self.coords[l.index()] = uv;
    }

    /// Number of loops covered.
    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Iterate over all UVs with their loop ids.
    pub fn iter(&self) -> impl Iterator<Item = (LoopId, Point2<f64>)> + '_ {
        self.coords
            .iter()
            .enumerate()
            .map(|(i, &uv)| (LoopId::new(i), uv))
    }

    /// Raw coordinates.
    pub fn as_slice(&self) -> &[Point2<f64>] {
        &self.coords
    }

    /// Mutable raw coordinates.
    pub fn as_mut_slice(&mut self) -> &mut [Point2<f64>] {
        &mut self.coords
    }

    /// Axis-aligned bounding box of all coordinates.
    ///
    /// Returns `None` if the layer is empty.
    pub fn bounding_box(&self) -> Option<(Point2<f64>, Point2<f64>)> {
        let first = *self.coords.first()?;
        let mut min = first;
        let mut max = first;

        for uv in &self.coords {
            min.x = min.x.min(uv.x);
            min.y = min.y.min(uv.y);
            max.x = max.x.max(uv.x);
            max.y = max.y.max(uv.y);
        }

        Some((min, max))
    }

    /// Multiply every u by `su` and every v by `sv`.
    pub fn scale(&mut self, su: f64, sv: f64) {
        for uv in &mut self.coords {
            uv.x *= su;
            uv.y *= sv;
        }
    }

    /// Rotate every coordinate about `pivot` by `angle` radians
    /// (counter-clockwise).
    pub fn rotate_about(&mut self, pivot: Point2<f64>, angle: f64) {
        let rot = Rotation2::new(angle);
        for uv in &mut self.coords {
            *uv = pivot + rot * (*uv - pivot);
        }
    }

    /// Add `offset` to every coordinate.
    pub fn translate(&mut self, offset: Vector2<f64>) {
        for uv in &mut self.coords {
            *uv += offset;
        }
    }

    /// Fit uniformly into `[margin, 1 - margin]`, anchored at
    /// `(margin, margin)` and keeping the aspect ratio.
    pub fn normalize_with_margin(&mut self, margin: f64) {
        if let Some((min, max)) = self.bounding_box() {
            let extent = (max.x - min.x).max(max.y - min.y);
            if extent > 1e-12 {
                let scale = (1.0 - 2.0 * margin) / extent;
                for uv in &mut self.coords {
                    uv.x = margin + (uv.x - min.x) * scale;
                    uv.y = margin + (uv.y - min.y) * scale;
                }
            }
        }
    }

    /// Whether every coordinate lies in `[0, 1]` (with `eps` slack).
    pub fn within_unit_square(&self, eps: f64) -> bool {
        self.coords
            .iter()
            .all(|uv| (-eps..=1.0 + eps).contains(&uv.x) && (-eps..=1.0 + eps).contains(&uv.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uv_layer_basic() {
        let layer = UvLayer::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.5, 1.0),
        ]);
        assert_eq!(layer.len(), 3);
        assert_eq!(layer.get(LoopId::new(2)), Point2::new(0.5, 1.0));
        assert_eq!(UvLayer::zeros(4).get(LoopId::new(3)), Point2::origin());
    }

    #[test]
    fn test_uv_layer_bounding_box() {
        let layer = UvLayer::new(vec![
            Point2::new(-1.0, 0.5),
            Point2::new(2.0, -0.5),
            Point2::new(0.5, 3.0),
        ]);
        let (min, max) = layer.bounding_box().unwrap();
        assert_eq!(min, Point2::new(-1.0, -0.5));
        assert_eq!(max, Point2::new(2.0, 3.0));
        assert!(UvLayer::new(Vec::new()).bounding_box().is_none());
    }

    #[test]
    fn test_rotate_about_center() {
        let mut layer = UvLayer::new(vec![Point2::new(1.0, 0.5)]);
        layer.rotate_about(Point2::new(0.5, 0.5), std::f64::consts::FRAC_PI_2);
        let uv = layer.get(LoopId::new(0));
        assert!((uv.x - 0.5).abs() < 1e-10);
        assert!((uv.y - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_normalize_with_margin() {
        let mut layer = UvLayer::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(2.0, 2.0),
        ]);
        layer.normalize_with_margin(0.001);

        let (min, max) = layer.bounding_box().unwrap();
        assert!((min.x - 0.001).abs() < 1e-10);
        assert!((min.y - 0.001).abs() < 1e-10);
        assert!((max.x - 0.999).abs() < 1e-10);
        // Aspect ratio is kept
        assert!((max.y - (0.001 + 0.499)).abs() < 1e-10);
        assert!(layer.within_unit_square(0.0));
    }
}
