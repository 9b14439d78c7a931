//! Warp-based piece deformation.
//!
//! Eight anchors sit at fixed positions around the unit piece: one on each
//! corner and one just beyond each side's midpoint, where a connector would
//! be. Every iteration samples a target pose per anchor; the resulting
//! [`WarpField`]s pull the geometry near each anchor towards its target,
//! which randomizes the outline without touching the topology.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::config::PieceConfig;
use crate::sampler::{IterationParams, ParameterSampler};

/// Number of anchors per piece.
pub const NUM_ANCHORS: usize = 8;

/// Radius of influence of every warp.
pub const WARP_FALLOFF_RADIUS: f64 = 1.0;

/// Fixed anchor origins: four corners, then four connector positions.
pub fn anchor_origins() -> [Point3<f64>; NUM_ANCHORS] {
    [
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(1.0, -1.0, 0.0),
        Point3::new(-1.0, -1.0, 0.0),
        Point3::new(-1.0, 1.0, 0.0),
        Point3::new(0.0, -1.4, 0.0),
        Point3::new(0.0, 1.4, 0.0),
        Point3::new(-1.4, 0.0, 0.0),
        Point3::new(1.4, 0.0, 0.0),
    ]
}

/// Position and per-axis scale of an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Location.
    pub position: Point3<f64>,
    /// Scale along X, Y and Z.
    pub scale: Vector3<f64>,
}

impl Pose {
    /// Unit-scale pose at `position`.
    pub fn at(position: Point3<f64>) -> Self {
        Self {
            position,
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

/// An anchor's origin pose and the target pose it is warped to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchorPair {
    /// Where the anchor starts.
    pub origin: Pose,
    /// Where the anchor is pulled to.
    pub target: Pose,
}

/// Falloff curve of a warp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Falloff {
    /// Hermite `3x^2 - 2x^3`.
    Smooth,
    /// Straight line.
    Linear,
    /// Full strength everywhere inside the radius.
    Constant,
}

impl Falloff {
    /// Evaluate the curve for `x` in `[0, 1]`.
    #[inline]
    pub fn eval(self, x: f64) -> f64 {
        let x = x.clamp(0.0, 1.0);
        match self {
            Falloff::Smooth => x * x * (3.0 - 2.0 * x),
            Falloff::Linear => x,
            Falloff::Constant => 1.0,
        }
    }
}

/// A deferred warp from one pose to another.
///
/// For a point at distance `d` from `from.position`, the influence is
/// `falloff(1 - d / falloff_radius)` (zero outside the radius). The full
/// transform maps `from` onto `to`: `p -> s * p + t` with
/// `s = to.scale / from.scale` and `t = to.position - s * from.position`.
///
/// With `volume_preserve`, translation and scale are each blended from the
/// identity by the influence before being applied. Otherwise the point is
/// linearly interpolated towards its fully transformed position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WarpField {
    /// Source pose.
    pub from: Pose,
    /// Target pose.
    pub to: Pose,
    /// Radius of influence around `from.position`.
    pub falloff_radius: f64,
    /// Influence curve.
    pub falloff: Falloff,
    /// Blend the transform instead of the displaced position.
    pub volume_preserve: bool,
}

impl WarpField {
    /// Warp between an anchor's poses with the standard falloff.
    pub fn from_pair(pair: &AnchorPair) -> Self {
        Self {
            from: pair.origin,
            to: pair.target,
            falloff_radius: WARP_FALLOFF_RADIUS,
            falloff: Falloff::Smooth,
            volume_preserve: true,
        }
    }

    /// Influence at point `p`.
    #[inline]
    pub fn influence(&self, p: &Point3<f64>) -> f64 {
        let d = (p - self.from.position).norm();
        if d >= self.falloff_radius || self.falloff_radius <= 0.0 {
            0.0
        } else {
            self.falloff.eval(1.0 - d / self.falloff_radius)
        }
    }

    fn scale_and_translation(&self) -> (Vector3<f64>, Vector3<f64>) {
        let s = self.to.scale.component_div(&self.from.scale);
        let t = self.to.position.coords - s.component_mul(&self.from.position.coords);
        (s, t)
    }

    /// Warp a single point.
    pub fn apply(&self, p: &Point3<f64>) -> Point3<f64> {
        let fac = self.influence(p);
        if fac == 0.0 {
            return *p;
        }
        let (s, t) = self.scale_and_translation();

        if self.volume_preserve {
            let blended = Vector3::repeat(1.0).lerp(&s, fac);
            Point3::from(blended.component_mul(&p.coords) + t * fac)
        } else {
            let full = Point3::from(s.component_mul(&p.coords) + t);
            p + (full - p) * fac
        }
    }
}

/// Sample the target pose of every anchor for one iteration.
///
/// Target position is the origin plus independent `[-j, j]` offsets on X and
/// Y; target scale is `end_scale` plus independent `[-s, s]` offsets on X and
/// Y, with Z scale fixed at 1.
pub fn sample_anchor_pairs(
    sampler: &mut ParameterSampler,
    params: &IterationParams,
    config: &PieceConfig,
) -> Vec<AnchorPair> {
    let j = config.warp_location_randomness;
    let s = config.warp_scale_randomness;

    anchor_origins()
        .iter()
        .map(|&origin| {
            let dx = sampler.symmetric(j);
            let dy = sampler.symmetric(j);
            let sx = params.end_scale + sampler.symmetric(s);
            let sy = params.end_scale + sampler.symmetric(s);
            AnchorPair {
                origin: Pose::at(origin),
                target: Pose {
                    position: origin + Vector3::new(dx, dy, 0.0),
                    scale: Vector3::new(sx, sy, 1.0),
                },
            }
        })
        .collect()
}

/// Warp fields for a set of anchor pairs, in anchor order.
pub fn warp_fields(pairs: &[AnchorPair]) -> Vec<WarpField> {
    pairs.iter().map(WarpField::from_pair).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::SideKind;

    fn params(end_scale: f64) -> IterationParams {
        IterationParams {
            overall_scale: 0.1,
            end_scale,
            rotation_degrees: 0.0,
            sides: [SideKind::Edge; 4],
        }
    }

    #[test]
    fn test_smooth_falloff() {
        assert_eq!(Falloff::Smooth.eval(0.0), 0.0);
        assert_eq!(Falloff::Smooth.eval(1.0), 1.0);
        assert!((Falloff::Smooth.eval(0.5) - 0.5).abs() < 1e-12);
        assert!((Falloff::Smooth.eval(0.25) - 0.15625).abs() < 1e-12);
    }

    #[test]
    fn test_identity_warp() {
        let pair = AnchorPair {
            origin: Pose::at(Point3::new(1.0, 1.0, 0.0)),
            target: Pose::at(Point3::new(1.0, 1.0, 0.0)),
        };
        let warp = WarpField::from_pair(&pair);
        let p = Point3::new(0.7, 0.9, 0.0);
        assert!((warp.apply(&p) - p).norm() < 1e-12);
    }

    #[test]
    fn test_translation_at_anchor() {
        let pair = AnchorPair {
            origin: Pose::at(Point3::new(1.0, 1.0, 0.0)),
            target: Pose::at(Point3::new(1.2, 0.9, 0.0)),
        };
        let warp = WarpField::from_pair(&pair);
        // Full influence at the anchor itself
        let moved = warp.apply(&Point3::new(1.0, 1.0, 0.0));
        assert!((moved - Point3::new(1.2, 0.9, 0.0)).norm() < 1e-12);
        // No influence beyond the radius
        let far = Point3::new(-0.5, 1.0, 0.0);
        assert_eq!(warp.apply(&far), far);
    }

    #[test]
    fn test_half_influence_blend() {
        let pair = AnchorPair {
            origin: Pose::at(Point3::origin()),
            target: Pose {
                position: Point3::new(0.2, 0.0, 0.0),
                scale: Vector3::new(2.0, 1.0, 1.0),
            },
        };
        let mut warp = WarpField::from_pair(&pair);
        // d = 0.5 gives fac = smooth(0.5) = 0.5
        let p = Point3::new(0.0, 0.5, 0.0);
        let preserved = warp.apply(&p);
        assert!((preserved.x - 0.1).abs() < 1e-12);
        assert!((preserved.y - 0.5).abs() < 1e-12);

        warp.volume_preserve = false;
        let lerped = warp.apply(&p);
        assert!((lerped.x - 0.1).abs() < 1e-12);
        assert!((lerped.y - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_pinned_sampling() {
        let mut config = PieceConfig::default();
        config.warp_location_randomness = 0.0;
        config.warp_scale_randomness = 0.0;
        let mut sampler = ParameterSampler::new(0);

        let pairs = sample_anchor_pairs(&mut sampler, &params(1.0), &config);
        assert_eq!(pairs.len(), NUM_ANCHORS);
        for (pair, origin) in pairs.iter().zip(anchor_origins()) {
            assert_eq!(pair.origin.position, origin);
            assert_eq!(pair.target.position, origin);
            assert_eq!(pair.target.scale, Vector3::new(1.0, 1.0, 1.0));
        }
    }

    #[test]
    fn test_sampled_targets_within_jitter() {
        let config = PieceConfig::default();
        let mut sampler = ParameterSampler::new(11);
        let pairs = sample_anchor_pairs(&mut sampler, &params(0.9), &config);
        for pair in &pairs {
            let d = pair.target.position - pair.origin.position;
            assert!(d.x.abs() <= 0.25 && d.y.abs() <= 0.25 && d.z == 0.0);
            assert!((pair.target.scale.x - 0.9).abs() <= 0.125);
            assert_eq!(pair.target.scale.z, 1.0);
        }
        assert_eq!(warp_fields(&pairs).len(), NUM_ANCHORS);
    }
}
