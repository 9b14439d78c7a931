//! Scene state and its per-sample randomization.
//!
//! The scene is plain data. [`SceneRandomizer::randomize`] folds one sample's
//! perturbations into it. Some are absolute (sun rotation, lens, floor) and
//! some accumulate on the previous value (sun color, camera pose), so
//! [`SceneState::reset`] must run after every sample to return to the
//! baseline.

use log::debug;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::config::SceneConfig;
use crate::sampler::ParameterSampler;
use crate::textures::{FloorLibrary, FloorTextureSet};

/// Directional light.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sun {
    /// Euler rotation in radians.
    pub rotation: Vector3<f64>,
    /// Linear RGB color.
    pub color: Vector3<f64>,
    /// Strength.
    pub energy: f64,
    /// Angular diameter in radians.
    pub angle: f64,
}

impl Default for Sun {
    fn default() -> Self {
        Self {
            rotation: Vector3::zeros(),
            color: Vector3::new(1.0, 1.0, 1.0),
            energy: 5.0,
            angle: 0.526,
        }
    }
}

/// Perspective camera looking down -Z.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// World position.
    pub location: Vector3<f64>,
    /// Euler rotation in radians.
    pub rotation: Vector3<f64>,
    /// Focal length in millimetres.
    pub lens: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            location: Vector3::new(0.0, 0.0, 3.0),
            rotation: Vector3::zeros(),
            lens: 25.0,
        }
    }
}

/// Ground plane under the piece.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Floor {
    /// Euler rotation in radians (only Z is randomized).
    pub rotation: Vector3<f64>,
    /// Per-axis scale.
    pub scale: Vector3<f64>,
    /// Material textures, if any were discovered.
    pub texture: Option<FloorTextureSet>,
}

impl Default for Floor {
    fn default() -> Self {
        Self {
            rotation: Vector3::zeros(),
            scale: Vector3::new(1.0, 1.0, 1.0),
            texture: None,
        }
    }
}

/// Surface properties of the piece.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Specular intensity.
    pub specular: f64,
}

/// Everything the renderer needs besides the piece geometry.
///
/// `Default` is the baseline every sample starts from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneState {
    /// Sun light.
    pub sun: Sun,
    /// Camera.
    pub camera: Camera,
    /// Floor plane.
    pub floor: Floor,
    /// Piece material.
    pub material: Material,
}

impl SceneState {
    /// Restore the baseline.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Applies one sample's worth of scene perturbation.
#[derive(Debug, Clone)]
pub struct SceneRandomizer {
    /// Ranges to draw from.
    pub config: SceneConfig,
    /// Perturb the sun.
    pub lighting: bool,
    /// Perturb the camera.
    pub camera: bool,
}

impl Default for SceneRandomizer {
    fn default() -> Self {
        Self::new(SceneConfig::default())
    }
}

impl SceneRandomizer {
    /// Randomizer with lighting and camera perturbation enabled.
    pub fn new(config: SceneConfig) -> Self {
        Self {
            config,
            lighting: true,
            camera: true,
        }
    }

    /// Enable or disable sun perturbation.
    pub fn with_lighting(mut self, lighting: bool) -> Self {
        self.lighting = lighting;
        self
    }

    /// Enable or disable camera perturbation.
    pub fn with_camera(mut self, camera: bool) -> Self {
        self.camera = camera;
        self
    }

    /// Perturb `state`. The floor is always randomized.
    pub fn randomize(
        &self,
        state: &mut SceneState,
        sampler: &mut ParameterSampler,
        floors: &FloorLibrary,
    ) {
        if self.lighting {
            self.randomize_sun(&mut state.sun, sampler);
        }
        if self.camera {
            self.randomize_camera(&mut state.camera, sampler);
        }
        self.randomize_floor(&mut state.floor, sampler, floors);
        debug!(
            "Scene: sun energy {:.3}, lens {:.2}, floor {}",
            state.sun.energy,
            state.camera.lens,
            state
                .floor
                .texture
                .as_ref()
                .map_or("untextured", |t| t.name.as_str())
        );
    }

    fn randomize_sun(&self, sun: &mut Sun, sampler: &mut ParameterSampler) {
        let limit = self.config.sun_rotation_limit_degrees;
        for i in 0..3 {
            sun.rotation[i] = sampler.symmetric(limit).to_radians();
        }
        sun.energy = sampler.range(self.config.sun_energy);
        sun.angle = sampler.range(self.config.sun_spread);

        // Tint drifts from whatever color the sun had before
        let tint = Vector3::new(sampler.unit(), sampler.unit(), sampler.unit());
        sun.color = (sun.color + tint) / 2.0;
    }

    fn randomize_camera(&self, camera: &mut Camera, sampler: &mut ParameterSampler) {
        let jitter = self.config.camera_location_jitter;
        for i in 0..3 {
            camera.location[i] += sampler.symmetric(jitter);
        }
        let rot = self.config.camera_rotation_jitter_degrees;
        for i in 0..3 {
            camera.rotation[i] += sampler.symmetric(rot).to_radians();
        }
        camera.lens = sampler.range(self.config.camera_lens);
    }

    fn randomize_floor(
        &self,
        floor: &mut Floor,
        sampler: &mut ParameterSampler,
        floors: &FloorLibrary,
    ) {
        floor.texture = floors.pick(sampler);
        floor.rotation.z = sampler.range(self.config.floor_rotation_degrees).to_radians();
        let s = sampler.range(self.config.floor_scale);
        floor.scale = Vector3::new(s, s, 1.0);
    }
}
