/// Metadata document (`meta.json`) describing a written octree.
use crate::accessor::{PointAccessor, PointLayout};
use crate::bounds::PointCloudBounds;
use crate::octree::PtOctree;
use constants::octree::{
    FILE_FORMAT_VERSION, GRID_CELLS_PER_AXIS, HIERARCHY_FILE_NAME, OCTANTS_DIR_NAME,
};
use serde::{Deserialize, Serialize};

/// Root cube of the octree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RootNodeInfo {
    pub center: [f64; 3],
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OctreeMeta {
    pub format_version: u32,
    /// Name of the point record type the files were written with.
    pub point_type: String,
    pub point_count: u64,
    pub node_count: u64,
    pub max_points_per_bucket: u64,
    pub max_level: u32,
    /// Tight bounds of the source points.
    pub source_bounds: PointCloudBounds,
    pub root_node: RootNodeInfo,
    /// Cell size of the sampling grid at the root level.
    pub spacing: f64,
    pub layout: PointLayout,
    /// `Has…` flags set for the point layout.
    pub capabilities: Vec<String>,
    pub point_size: u32,
    pub hierarchy_file: String,
    pub octants_dir: String,
}

impl OctreeMeta {
    pub fn describe<P, A>(octree: &PtOctree<P>, accessor: &A) -> Self
    where
        A: PointAccessor<P> + ?Sized,
    {
        let layout = accessor.layout();
        let root = octree.root_cube();
        let size = root.max_extent();

        Self {
            format_version: FILE_FORMAT_VERSION,
            point_type: accessor.type_name().to_string(),
            point_count: octree.point_count() as u64,
            node_count: octree.len() as u64,
            max_points_per_bucket: octree.max_points_per_bucket() as u64,
            max_level: octree.max_level(),
            source_bounds: *octree.source_bounds(),
            root_node: RootNodeInfo {
                center: root.center(),
                size,
            },
            spacing: size / GRID_CELLS_PER_AXIS as f64,
            layout,
            capabilities: layout
                .capability_names()
                .into_iter()
                .map(String::from)
                .collect(),
            point_size: layout.point_size() as u32,
            hierarchy_file: HIERARCHY_FILE_NAME.to_string(),
            octants_dir: OCTANTS_DIR_NAME.to_string(),
        }
    }
}
