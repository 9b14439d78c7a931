//! Input discovery: base images and floor texture sets.
//!
//! # Directory layout
//!
//! ```text
//! Materials/
//!   Base/            one image per source picture
//!   Floor/
//!     fallback/      color.png, normal.jpg, ...
//!     wood/          any subset of the channels
//!     tiles/
//! ```
//!
//! A floor set maps each [`TextureChannel`] to `<channel>.jpg` or
//! `<channel>.png` (png wins when both exist). Channels a set lacks are
//! taken from `fallback` when the set is used.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthError};
use crate::sampler::ParameterSampler;
use crate::uv::ImageSize;

/// Name of the floor subdirectory holding per-channel defaults.
pub const FALLBACK_DIR: &str = "fallback";

/// A material channel of the floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureChannel {
    /// Base color.
    Color,
    /// Height displacement.
    Displacement,
    /// Metalness.
    Metallic,
    /// Tangent-space normals.
    Normal,
    /// Roughness.
    Roughness,
}

impl TextureChannel {
    /// All channels.
    pub const ALL: [TextureChannel; 5] = [
        TextureChannel::Color,
        TextureChannel::Displacement,
        TextureChannel::Metallic,
        TextureChannel::Normal,
        TextureChannel::Roughness,
    ];

    /// File stem used on disk.
    pub fn file_stem(self) -> &'static str {
        match self {
            TextureChannel::Color => "color",
            TextureChannel::Displacement => "displacement",
            TextureChannel::Metallic => "metallic",
            TextureChannel::Normal => "normal",
            TextureChannel::Roughness => "roughness",
        }
    }
}

impl fmt::Display for TextureChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

/// Texture files of one floor material.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FloorTextureSet {
    /// Directory name.
    pub name: String,
    /// Channel files present.
    pub channels: BTreeMap<TextureChannel, PathBuf>,
}

impl FloorTextureSet {
    /// Scan `dir` for channel files.
    pub fn discover(dir: &Path) -> Self {
        let mut channels = BTreeMap::new();
        for channel in TextureChannel::ALL {
            for ext in ["jpg", "png"] {
                let path = dir.join(format!("{}.{}", channel.file_stem(), ext));
                if path.is_file() {
                    // Later extensions overwrite earlier ones
                    channels.insert(channel, path);
                }
            }
        }
        Self {
            name: dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            channels,
        }
    }

    /// File for `channel`, if present.
    pub fn get(&self, channel: TextureChannel) -> Option<&Path> {
        self.channels.get(&channel).map(PathBuf::as_path)
    }

    /// Copy of this set with missing channels taken from `fallback`.
    pub fn with_fallback(&self, fallback: &FloorTextureSet) -> FloorTextureSet {
        let mut out = self.clone();
        for (channel, path) in &fallback.channels {
            out.channels.entry(*channel).or_insert_with(|| path.clone());
        }
        out
    }
}

/// All floor materials plus the fallback set.
#[derive(Debug, Clone, Default)]
pub struct FloorLibrary {
    sets: Vec<FloorTextureSet>,
    fallback: FloorTextureSet,
}

impl FloorLibrary {
    /// Create a library from already-discovered sets.
    pub fn new(sets: Vec<FloorTextureSet>, fallback: FloorTextureSet) -> Self {
        Self { sets, fallback }
    }

    /// Scan every subdirectory of `dir`; `fallback` is kept apart.
    ///
    /// Sets are ordered by directory name. A missing floor directory yields
    /// an empty library.
    pub fn discover<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            warn!("Floor directory {} not found; floor stays untextured", dir.display());
            return Ok(Self::default());
        }

        let mut subdirs: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_dir())
            .collect();
        subdirs.sort();

        let mut sets = Vec::new();
        let mut fallback = FloorTextureSet::default();
        for sub in subdirs {
            let set = FloorTextureSet::discover(&sub);
            if set.name == FALLBACK_DIR {
                fallback = set;
            } else {
                if set.channels.is_empty() {
                    warn!("Floor set {} has no textures", set.name);
                }
                sets.push(set);
            }
        }
        debug!(
            "Discovered {} floor sets ({} fallback channels)",
            sets.len(),
            fallback.channels.len()
        );

        Ok(Self { sets, fallback })
    }

    /// Number of sets, excluding the fallback.
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Whether there are no sets.
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// The sets, excluding the fallback.
    pub fn sets(&self) -> &[FloorTextureSet] {
        &self.sets
    }

    /// The fallback set.
    pub fn fallback(&self) -> &FloorTextureSet {
        &self.fallback
    }

    /// Pick a set uniformly and fill its gaps from the fallback.
    pub fn pick(&self, sampler: &mut ParameterSampler) -> Option<FloorTextureSet> {
        if self.sets.is_empty() {
            return None;
        }
        let idx = sampler.index(self.sets.len());
        Some(self.sets[idx].with_fallback(&self.fallback))
    }
}

/// A source image and its dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseImage {
    /// File path.
    pub path: PathBuf,
    /// Pixel size.
    pub size: ImageSize,
}

impl BaseImage {
    /// Read the dimensions of the image at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let (width, height) = image::image_dimensions(&path).map_err(|source| SynthError::Image {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            path,
            size: ImageSize::new(width, height),
        })
    }
}

/// Every readable image file directly inside `dir`, ordered by name.
///
/// Files whose dimensions cannot be read are skipped with a warning.
///
/// # Errors
/// [`SynthError::NoBaseImages`] if nothing usable is found.
pub fn discover_base_images<P: AsRef<Path>>(dir: P) -> Result<Vec<BaseImage>> {
    let dir = dir.as_ref();
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    let mut images = Vec::with_capacity(files.len());
    for file in files {
        match BaseImage::open(&file) {
            Ok(img) => images.push(img),
            Err(e) => warn!("Skipping base image {}: {}", file.display(), e),
        }
    }

    if images.is_empty() {
        return Err(SynthError::NoBaseImages {
            dir: dir.to_path_buf(),
        });
    }
    debug!("Discovered {} base images in {}", images.len(), dir.display());
    Ok(images)
}
