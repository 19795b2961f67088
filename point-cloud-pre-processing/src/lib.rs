/// Out-of-core point cloud octree generation
pub mod accessor;
pub mod bounds;
pub mod codec;
pub mod config;
pub mod converter;
pub mod error;
pub mod hierarchy;
pub mod laz;
pub mod manifest;
pub mod octree;
pub mod point_types;
pub mod reader;
pub mod source;
pub mod writer;

pub use accessor::{PointAccessor, PointLayout, PointRecord};
pub use bounds::PointCloudBounds;
pub use config::ConversionConfig;
pub use converter::{ConversionSummary, PointCloudConverter};
pub use error::{AccessorError, ConversionError, OctreeError};
pub use octree::{Octant, OctantId, PtOctree};
pub use reader::OctreeFileReader;
pub use writer::{OctreeFileWriter, WriteSummary};
