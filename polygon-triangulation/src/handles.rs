/// Typed arena indices for DCEL elements
use std::fmt;

/// Index of a vertex in [`crate::Geometry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertHandle(pub usize);

/// Index of a half-edge in [`crate::Geometry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HalfEdgeHandle(pub usize);

/// Index of a face in [`crate::Geometry`]. Handle 0 is the unbounded face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaceHandle(pub usize);

impl FaceHandle {
    pub const UNBOUNDED: FaceHandle = FaceHandle(0);

    pub fn is_unbounded(self) -> bool {
        self == Self::UNBOUNDED
    }
}

impl fmt::Display for VertHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl fmt::Display for HalfEdgeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "he{}", self.0)
    }
}

impl fmt::Display for FaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}
