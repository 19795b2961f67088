/// Shared configuration for out-of-core point cloud conversion
pub mod coordinate_system;
pub mod octree;
