/// Errors raised while building or editing a DCEL
use crate::handles::{FaceHandle, HalfEdgeHandle, VertHandle};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("vertex {0} does not exist")]
    VertexNotFound(VertHandle),
    #[error("half-edge {0} does not exist")]
    HalfEdgeNotFound(HalfEdgeHandle),
    #[error("face {0} does not exist")]
    FaceNotFound(FaceHandle),
    #[error("degenerate outline {index}: {reason}")]
    DegenerateOutline { index: usize, reason: String },
    #[error("hole outline {0} is not inside any outer outline")]
    HoleWithoutOuter(usize),
    #[error("vertices {0} and {1} do not share a bounded face")]
    NoCommonFace(VertHandle, VertHandle),
    #[error("cannot insert diagonal {p} -> {q}: {reason}")]
    InvalidDiagonal {
        p: VertHandle,
        q: VertHandle,
        reason: &'static str,
    },
    #[error("face {0} has holes and is not y-monotone")]
    NotMonotone(FaceHandle),
    #[error("inconsistent DCEL: {0}")]
    Inconsistent(String),
    #[error("sweep line status fault: {0}")]
    SweepStatus(String),
}
