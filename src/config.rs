//! Generator configuration.
//!
//! Every randomized quantity is drawn from a range stored here. Defaults
//! reproduce the reference dataset; a JSON file can override any subset of
//! fields (missing fields keep their defaults).
//!
//! # Example
//!
//! ```
//! use jigsaw_synth::config::GeneratorConfig;
//!
//! let config: GeneratorConfig =
//!     serde_json::from_str(r#"{ "piece": { "scale": [0.08, 0.12] } }"#).unwrap();
//! assert_eq!(config.piece.scale.min(), 0.08);
//! assert_eq!(config.piece.cutoff_edge, 0.9);
//! config.validate().unwrap();
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthError};

/// Largest overall piece scale whose rotated UV island always fits in the
/// unit square (a unit island rotated by 45 degrees spans `sqrt(2)`).
pub const MAX_PIECE_SCALE: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// Closed interval `[min, max]`, serialized as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange(pub f64, pub f64);

impl ValueRange {
    /// Create a range.
    pub const fn new(min: f64, max: f64) -> Self {
        Self(min, max)
    }

    /// Lower bound.
    #[inline]
    pub fn min(&self) -> f64 {
        self.0
    }

    /// Upper bound.
    #[inline]
    pub fn max(&self) -> f64 {
        self.1
    }

    fn check(&self, name: &'static str) -> Result<()> {
        if !(self.0.is_finite() && self.1.is_finite()) {
            return Err(SynthError::invalid_param(name, self, "bounds must be finite"));
        }
        if self.0 > self.1 {
            return Err(SynthError::invalid_param(name, self, "min must not exceed max"));
        }
        Ok(())
    }
}

impl std::fmt::Display for ValueRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.0, self.1)
    }
}

/// Scene randomization ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Sun rotation per axis is drawn from `[-limit, limit]` degrees.
    pub sun_rotation_limit_degrees: f64,
    /// Sun strength.
    pub sun_energy: ValueRange,
    /// Sun angular diameter (radians).
    pub sun_spread: ValueRange,
    /// Per-axis camera translation added each sample is drawn from
    /// `[-jitter, jitter]`.
    pub camera_location_jitter: f64,
    /// Per-axis camera rotation added each sample, in degrees.
    pub camera_rotation_jitter_degrees: f64,
    /// Camera focal length (mm).
    pub camera_lens: ValueRange,
    /// Floor rotation about Z, in degrees.
    pub floor_rotation_degrees: ValueRange,
    /// Floor scale on X and Y.
    pub floor_scale: ValueRange,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            sun_rotation_limit_degrees: 50.0,
            sun_energy: ValueRange::new(4.5, 6.0),
            sun_spread: ValueRange::new(0.25, 1.0),
            camera_location_jitter: 0.25,
            camera_rotation_jitter_degrees: 2.5,
            camera_lens: ValueRange::new(24.0, 28.0),
            floor_rotation_degrees: ValueRange::new(0.0, 360.0),
            floor_scale: ValueRange::new(0.75, 1.5),
        }
    }
}

/// Piece geometry, label and finishing ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PieceConfig {
    /// Overall piece size relative to the source image.
    pub scale: ValueRange,
    /// Base scale applied to every warp target.
    pub end_scale: ValueRange,
    /// Per-axis jitter of warp target positions.
    pub warp_location_randomness: f64,
    /// Per-axis jitter of warp target scales.
    pub warp_scale_randomness: f64,
    /// Probability that a side carries a connector.
    pub cutoff_edge: f64,
    /// Probability that a connector side is cut inward.
    pub cutoff_inward: f64,
    /// UV rotation angle, in degrees.
    pub uv_rotation_degrees: ValueRange,
    /// Margin left by the unwrapper around the island.
    pub unwrap_margin: f64,
    /// Shell thickness.
    pub solidify: ValueRange,
    /// Rim bevel width.
    pub bevel: ValueRange,
    /// Material specular intensity.
    pub specular: ValueRange,
}

impl Default for PieceConfig {
    fn default() -> Self {
        Self {
            scale: ValueRange::new(0.05, 0.15),
            end_scale: ValueRange::new(0.75, 1.25),
            warp_location_randomness: 0.25,
            warp_scale_randomness: 0.125,
            cutoff_edge: 0.9,
            cutoff_inward: 0.5,
            uv_rotation_degrees: ValueRange::new(0.0, 360.0),
            unwrap_margin: 0.001,
            solidify: ValueRange::new(0.15, 0.35),
            bevel: ValueRange::new(0.05, 0.1),
            specular: ValueRange::new(0.05, 0.2),
        }
    }
}

/// Complete generator configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Scene randomization.
    pub scene: SceneConfig,
    /// Piece synthesis.
    pub piece: PieceConfig,
}

impl GeneratorConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path.as_ref(), self.to_json()?)?;
        Ok(())
    }

    /// Check ranges and probabilities.
    ///
    /// # Errors
    /// [`SynthError::InvalidParameter`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let s = &self.scene;
        s.sun_energy.check("scene.sun_energy")?;
        s.sun_spread.check("scene.sun_spread")?;
        s.camera_lens.check("scene.camera_lens")?;
        s.floor_rotation_degrees.check("scene.floor_rotation_degrees")?;
        s.floor_scale.check("scene.floor_scale")?;
        non_negative("scene.sun_rotation_limit_degrees", s.sun_rotation_limit_degrees)?;
        non_negative("scene.camera_location_jitter", s.camera_location_jitter)?;
        non_negative(
            "scene.camera_rotation_jitter_degrees",
            s.camera_rotation_jitter_degrees,
        )?;

        let p = &self.piece;
        p.scale.check("piece.scale")?;
        p.end_scale.check("piece.end_scale")?;
        p.uv_rotation_degrees.check("piece.uv_rotation_degrees")?;
        p.solidify.check("piece.solidify")?;
        p.bevel.check("piece.bevel")?;
        p.specular.check("piece.specular")?;
        non_negative("piece.warp_location_randomness", p.warp_location_randomness)?;
        non_negative("piece.warp_scale_randomness", p.warp_scale_randomness)?;
        probability("piece.cutoff_edge", p.cutoff_edge)?;
        probability("piece.cutoff_inward", p.cutoff_inward)?;

        if p.scale.min() <= 0.0 {
            return Err(SynthError::invalid_param("piece.scale", p.scale, "must be positive"));
        }
        if p.scale.max() > MAX_PIECE_SCALE {
            return Err(SynthError::invalid_param(
                "piece.scale",
                p.scale,
                "rotated UV island would not fit in the unit square",
            ));
        }
        if !(0.0..0.5).contains(&p.unwrap_margin) {
            return Err(SynthError::invalid_param(
                "piece.unwrap_margin",
                p.unwrap_margin,
                "must be in [0, 0.5)",
            ));
        }

        Ok(())
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SynthError::invalid_param(name, value, "must be non-negative"))
    }
}

fn probability(name: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SynthError::invalid_param(name, value, "must be in [0, 1]"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        GeneratorConfig::default().validate().unwrap();
    }

    #[test]
    fn test_json_roundtrip() {
        let config = GeneratorConfig::default();
        let text = config.to_json().unwrap();
        assert!(text.contains("\"scale\": [\n"));
        assert_eq!(GeneratorConfig::from_json(&text).unwrap(), config);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = GeneratorConfig::from_json(r#"{"scene": {"camera_lens": [30, 35]}}"#).unwrap();
        assert_eq!(config.scene.camera_lens, ValueRange::new(30.0, 35.0));
        assert_eq!(config.scene.sun_energy, ValueRange::new(4.5, 6.0));
        assert_eq!(config.piece, PieceConfig::default());
    }

    #[test]
    fn test_rejects_inverted_range() {
        let mut config = GeneratorConfig::default();
        config.piece.bevel = ValueRange::new(0.2, 0.1);
        assert!(matches!(
            config.validate(),
            Err(SynthError::InvalidParameter { name: "piece.bevel", .. })
        ));
    }

    #[test]
    fn test_rejects_bad_probability() {
        let mut config = GeneratorConfig::default();
        config.piece.cutoff_inward = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_oversized_scale() {
        let mut config = GeneratorConfig::default();
        config.piece.scale = ValueRange::new(0.5, 0.8);
        assert!(matches!(
            config.validate(),
            Err(SynthError::InvalidParameter { name: "piece.scale", .. })
        ));
        config.piece.scale = ValueRange::new(0.5, MAX_PIECE_SCALE);
        config.validate().unwrap();
    }

    #[test]
    fn test_load_save() {
        let dir = std::env::temp_dir().join(format!("jigsaw_config_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");

        let mut config = GeneratorConfig::default();
        config.piece.cutoff_edge = 0.5;
        config.save(&path).unwrap();
        assert_eq!(GeneratorConfig::load(&path).unwrap(), config);

        fs::remove_dir_all(&dir).ok();
    }
}
