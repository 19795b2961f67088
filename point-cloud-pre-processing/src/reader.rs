/// Out-of-core octree reader.
/// Pages individual octant payloads on demand or reassembles the complete tree.
use crate::accessor::{PointAccessor, PointRecord};
use crate::codec::decode_point;
use crate::error::ConversionError;
use crate::hierarchy::{HierarchyEntry, decode_hierarchy};
use crate::manifest::OctreeMeta;
use crate::octree::{Octant, OctantId, PtOctree};
use crate::writer::OctreeFileWriter;
use constants::octree::{HIERARCHY_FILE_NAME, META_FILE_NAME};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct OctreeFileReader {
    input_dir: PathBuf,
}

impl OctreeFileReader {
    pub fn new(input_dir: &Path) -> Self {
        Self {
            input_dir: input_dir.to_path_buf(),
        }
    }

    pub fn read_meta(&self) -> Result<OctreeMeta, ConversionError> {
        let content = fs::read_to_string(self.input_dir.join(META_FILE_NAME))?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn read_hierarchy(&self) -> Result<Vec<HierarchyEntry>, ConversionError> {
        let path = self.input_dir.join(HIERARCHY_FILE_NAME);
        let bytes = fs::read(&path)?;
        decode_hierarchy(&bytes, &path)
    }

    /// Load the payload of a single octant. Octants without a node file hold no points.
    pub fn load_octant_points<P, A>(
        &self,
        id: &OctantId,
        accessor: &A,
    ) -> Result<Vec<P>, ConversionError>
    where
        P: PointRecord,
        A: PointAccessor<P> + ?Sized,
    {
        Ok(self.read_node(id, accessor)?.unwrap_or_default())
    }

    /// Rebuild the full tree written to this directory.
    pub fn read_octree<P, A>(&self, accessor: &A) -> Result<PtOctree<P>, ConversionError>
    where
        P: PointRecord,
        A: PointAccessor<P> + ?Sized,
    {
        let meta = self.read_meta()?;
        let expected = accessor.layout();
        if meta.layout != expected {
            return Err(ConversionError::LayoutMismatch {
                expected: expected.describe(),
                found: meta.layout.describe(),
            });
        }

        let entries = self.read_hierarchy()?;
        let hierarchy_path = self.input_dir.join(HIERARCHY_FILE_NAME);
        let malformed = |reason: String| ConversionError::MalformedHierarchy {
            path: hierarchy_path.clone(),
            reason,
        };

        let mut index_of: HashMap<OctantId, usize> = HashMap::with_capacity(entries.len());
        let mut octants: Vec<Octant<P>> = Vec::with_capacity(entries.len());

        for entry in &entries {
            let parent = match entry.id.parent() {
                Some(parent_id) => Some(
                    *index_of
                        .get(&parent_id)
                        .ok_or_else(|| malformed(format!("missing parent of {}", entry.id)))?,
                ),
                None => None,
            };

            let points = match self.read_node(&entry.id, accessor)? {
                Some(points) => points,
                None if entry.point_count == 0 => Vec::new(),
                None => {
                    return Err(ConversionError::MalformedNode {
                        path: OctreeFileWriter::node_path(&self.input_dir, entry.id.as_str()),
                        reason: format!("missing file for {} points", entry.point_count),
                    });
                }
            };
            if points.len() as u64 != entry.point_count {
                return Err(malformed(format!(
                    "octant {} lists {} points, node file holds {}",
                    entry.id,
                    entry.point_count,
                    points.len()
                )));
            }

            let index = octants.len();
            let mut octant = Octant::new(entry.id.clone(), entry.bounds, parent);
            octant.points = points;
            octant.is_leaf = entry.is_leaf;
            octants.push(octant);
            index_of.insert(entry.id.clone(), index);

            if let (Some(parent), Some(slot)) = (parent, entry.id.child_index()) {
                octants[parent].children[slot] = Some(index);
            }
        }

        for (octant, entry) in octants.iter().zip(&entries) {
            if octant.child_mask() != entry.child_mask {
                return Err(malformed(format!(
                    "child mask of {} does not match its children",
                    entry.id
                )));
            }
        }

        let tree = PtOctree::from_parts(
            octants,
            meta.source_bounds,
            meta.max_points_per_bucket as usize,
            meta.max_level,
        )?;
        info!(
            octants = tree.len(),
            points = tree.point_count(),
            "Loaded octree from {}",
            self.input_dir.display()
        );
        Ok(tree)
    }

    fn read_node<P, A>(&self, id: &OctantId, accessor: &A) -> Result<Option<Vec<P>>, ConversionError>
    where
        P: PointRecord,
        A: PointAccessor<P> + ?Sized,
    {
        if !accessor.layout().has_position() {
            return Err(ConversionError::UnsupportedPointLayout(
                accessor.type_name().to_string(),
            ));
        }
        let path = OctreeFileWriter::node_path(&self.input_dir, id.as_str());
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let malformed = |reason: String| ConversionError::MalformedNode {
            path: path.clone(),
            reason,
        };
        if bytes.len() < 8 {
            return Err(malformed("truncated header".into()));
        }
        let count = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        let point_size = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;

        let expected_size = accessor.layout().point_size();
        if point_size != expected_size {
            return Err(malformed(format!(
                "point size {point_size}, accessor expects {expected_size}"
            )));
        }
        let body = &bytes[8..];
        if body.len() != count * point_size {
            return Err(malformed(format!(
                "expected {} payload bytes, found {}",
                count * point_size,
                body.len()
            )));
        }

        let points = body
            .chunks_exact(point_size)
            .map(|record| decode_point(accessor, record))
            .collect::<Result<Vec<P>, _>>()?;
        debug!(octant = %id, points = points.len(), "Loaded node file");
        Ok(Some(points))
    }
}
