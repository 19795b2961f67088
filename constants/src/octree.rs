/// Octree construction and out-of-core layout configuration

/// Deepest level the builder subdivides to. Coincident points cannot be
/// separated, so leaves at this level may exceed the bucket capacity.
pub const MAX_OCTREE_LEVEL: u32 = 21;

/// Cells per axis of the sampling grid laid over an octant
pub const GRID_CELLS_PER_AXIS: u32 = 128;

/// Upper bound on grid resolution; keeps the packed cell key within `u64`
pub const MAX_GRID_CELLS_PER_AXIS: u32 = 1 << 21;

/// Relative padding added to the root cube so no point lies on its border
pub const ROOT_PADDING_FACTOR: f64 = 0.0001;

/// Root cube side used when every source point is coincident
pub const MIN_ROOT_EXTENT: f64 = 1.0e-6;

/// Metadata document describing the whole tree
pub const META_FILE_NAME: &str = "meta.json";

/// Binary index of every octant
pub const HIERARCHY_FILE_NAME: &str = "octree.hierarchy";

/// Folder holding one payload file per octant
pub const OCTANTS_DIR_NAME: &str = "Octants";

/// Extension of per-octant payload files
pub const NODE_FILE_EXTENSION: &str = "node";

/// Magic bytes opening the hierarchy file
pub const HIERARCHY_MAGIC: &[u8; 4] = b"OCTH";

/// Version shared by the hierarchy file and the metadata document
pub const FILE_FORMAT_VERSION: u32 = 1;

/// Progress bar refresh interval while streaming source points
pub const PROGRESS_UPDATE_INTERVAL: usize = 50_000;
