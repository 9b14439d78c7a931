//! File I/O.
//!
//! # Supported Mesh Formats
//!
//! | Format | Extension | Load | Save | Notes |
//! |--------|-----------|------|------|-------|
//! | Wavefront OBJ | `.obj` | ✓ | ✓ | Per-loop UVs, optional MTL |
//! | STL | `.stl` | ✓ | ✓ | Binary; triangles only |
//! | PLY | `.ply` | ✓ | ✓ | Polygons plus vertex groups |
//!
//! Labels are written by [`csv::LabelWriter`].
//!
//! # Usage
//!
//! ```no_run
//! use jigsaw_synth::io::{load, save};
//!
//! let mesh = load("section.ply").unwrap();
//! save(&mesh, "section.obj").unwrap();
//! ```

pub mod csv;
pub mod obj;
pub mod ply;
pub mod stl;

use std::path::Path;

use crate::error::{Result, SynthError};
use crate::mesh::PieceMesh;

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Wavefront OBJ format.
    Obj,
    /// STL (stereolithography) format.
    Stl,
    /// PLY (Stanford polygon) format.
    Ply,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "obj" => Some(Format::Obj),
            "stl" => Some(Format::Stl),
            "ply" => Some(Format::Ply),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }

    /// Detect the format of `path` or fail with [`SynthError::UnsupportedFormat`].
    fn require(path: &Path) -> Result<Format> {
        Format::from_path(path).ok_or_else(|| SynthError::UnsupportedFormat {
            extension: path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("(none)")
                .to_string(),
        })
    }
}

/// Load a mesh, choosing the format from the file extension.
pub fn load<P: AsRef<Path>>(path: P) -> Result<PieceMesh> {
    let path = path.as_ref();
    match Format::require(path)? {
        Format::Obj => obj::load_obj(path),
        Format::Stl => stl::load_stl(path),
        Format::Ply => ply::load_ply(path),
    }
}

/// Save a mesh, choosing the format from the file extension.
///
/// OBJ is written without a material; use [`obj::save_obj`] directly to
/// attach one.
pub fn save<P: AsRef<Path>>(mesh: &PieceMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    match Format::require(path)? {
        Format::Obj => obj::save_obj(mesh, path, None),
        Format::Stl => stl::save_stl(mesh, path),
        Format::Ply => ply::save_ply(mesh, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(Format::from_path("a/b.PLY"), Some(Format::Ply));
        assert_eq!(Format::from_path("piece.obj"), Some(Format::Obj));
        assert_eq!(Format::from_path("piece.glb"), None);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load("mesh.fbx").unwrap_err();
        assert!(matches!(err, SynthError::UnsupportedFormat { ref extension } if extension == "fbx"));
    }
}
