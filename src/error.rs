//! Error types for jigsaw-synth.
//!
//! This module defines all error types used throughout the library.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`SynthError`].
pub type Result<T> = std::result::Result<T, SynthError>;

/// Errors that can occur while synthesizing pieces, labels or batches.
#[derive(Error, Debug)]
pub enum SynthError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A face has fewer than three distinct vertices.
    #[error("face {face} is degenerate (fewer than 3 distinct vertices)")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// A template section lacks a required vertex group.
    #[error("template section has no vertices in group {group}")]
    MissingGroup {
        /// Name of the empty group.
        group: &'static str,
    },

    /// The assembled piece is not a single closed outline.
    #[error("assembled piece has {boundary_loops} boundary loops (expected 1)")]
    NotWatertight {
        /// Number of boundary loops found.
        boundary_loops: usize,
    },

    /// The labeled corner count is not exactly four.
    #[error("found {found} corner vertices (expected {expected})")]
    CornerExtraction {
        /// Number of corners found.
        found: usize,
        /// Number of corners required.
        expected: usize,
    },

    /// The transformed UV island does not fit in the unit square.
    #[error("UV island {width} x {height} does not fit in the unit square")]
    UvOverflow {
        /// Bounding box width after aspect, scale and rotation.
        width: f64,
        /// Bounding box height after aspect, scale and rotation.
        height: f64,
    },

    /// The base image directory contains no usable images.
    #[error("no base images found in {dir}")]
    NoBaseImages {
        /// The directory that was scanned.
        dir: PathBuf,
    },

    /// Reading an image header failed.
    #[error("failed to read image {path}: {source}")]
    Image {
        /// The image path.
        path: PathBuf,
        /// Underlying decoder error.
        #[source]
        source: image::ImageError,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading a mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving a mesh to file.
    #[error("failed to save mesh to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// Configuration file could not be parsed or written.
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl SynthError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        SynthError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }
}
