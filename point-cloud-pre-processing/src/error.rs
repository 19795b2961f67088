/// Error types for point access, octree construction and out-of-core conversion
use std::path::PathBuf;
use thiserror::Error;

/// Raised when a point is accessed through a capability its layout lacks.
#[derive(Debug, Error)]
pub enum AccessorError {
    #[error("point type {point_type} has no {field} field")]
    Unsupported {
        point_type: &'static str,
        field: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum OctreeError {
    #[error("cannot build an octree from an empty point set")]
    EmptyInput,
    #[error("bucket capacity must be greater than zero")]
    ZeroCapacity,
    #[error("point layout of {0} carries no position")]
    UnsupportedLayout(&'static str),
    #[error("octant index {0} is out of range")]
    UnknownOctant(usize),
    #[error(transparent)]
    Accessor(#[from] AccessorError),
}

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("unsupported point layout: {0}")]
    UnsupportedPointLayout(String),
    #[error("point layout mismatch: file holds {found}, accessor expects {expected}")]
    LayoutMismatch { expected: String, found: String },
    #[error("malformed hierarchy file {path}: {reason}")]
    MalformedHierarchy { path: PathBuf, reason: String },
    #[error("malformed node file {path}: {reason}")]
    MalformedNode { path: PathBuf, reason: String },
    #[error("octant {octant} holds {points} points, more than a node file can index")]
    OversizedNode { octant: String, points: usize },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("LAS error: {0}")]
    Las(#[from] las::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Octree(#[from] OctreeError),
    #[error(transparent)]
    Accessor(#[from] AccessorError),
}
