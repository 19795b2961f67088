/// Planar polygon triangulation on a doubly connected edge list
pub mod error;
pub mod geometry;
pub mod handles;
pub mod status;
pub mod triangulation;

pub use error::GeometryError;
pub use geometry::{Diagonal, Face, Geometry, HalfEdge, Outline, Vertex};
pub use handles::{FaceHandle, HalfEdgeHandle, VertHandle};
pub use status::{StatusNode, SweepLineStatus};
pub use triangulation::{Triangulation, VertexType};
