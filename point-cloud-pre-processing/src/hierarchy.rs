/// Binary octree hierarchy index.
///
/// Layout (little endian): magic, `u32` version, `u32` record count, then one record
/// per octant in breadth-first order: `u8` id length, id bytes, `u32` level,
/// six `f64` bounds (min xyz, max xyz), `u8` child mask, `u8` leaf flag, `u64` point count.
use crate::bounds::PointCloudBounds;
use crate::error::ConversionError;
use crate::octree::{OctantId, PtOctree};
use constants::octree::{FILE_FORMAT_VERSION, HIERARCHY_MAGIC};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyEntry {
    pub id: OctantId,
    pub level: u32,
    pub bounds: PointCloudBounds,
    pub child_mask: u8,
    pub is_leaf: bool,
    pub point_count: u64,
}

impl HierarchyEntry {
    /// Entries for every octant of `octree`, breadth first.
    pub fn collect<P>(octree: &PtOctree<P>) -> Vec<HierarchyEntry> {
        octree
            .breadth_first()
            .into_iter()
            .map(|i| {
                let octant = &octree.octants()[i];
                HierarchyEntry {
                    id: octant.id.clone(),
                    level: octant.level,
                    bounds: octant.bounds,
                    child_mask: octant.child_mask(),
                    is_leaf: octant.is_leaf,
                    point_count: octant.points.len() as u64,
                }
            })
            .collect()
    }
}

pub fn encode_hierarchy(entries: &[HierarchyEntry]) -> Vec<u8> {
    let mut out = Vec::with_capacity(12 + entries.len() * 80);
    out.extend_from_slice(HIERARCHY_MAGIC);
    out.extend_from_slice(&FILE_FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&(entries.len() as u32).to_le_bytes());

    for entry in entries {
        let id = entry.id.as_str().as_bytes();
        out.push(id.len() as u8);
        out.extend_from_slice(id);
        out.extend_from_slice(&entry.level.to_le_bytes());
        for v in entry.bounds.min().into_iter().chain(entry.bounds.max()) {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out.push(entry.child_mask);
        out.push(entry.is_leaf as u8);
        out.extend_from_slice(&entry.point_count.to_le_bytes());
    }

    out
}

/// Parse and validate a hierarchy file already loaded into memory.
/// The first record must be the root and every parent must precede its children.
pub fn decode_hierarchy(bytes: &[u8], path: &Path) -> Result<Vec<HierarchyEntry>, ConversionError> {
    let malformed = |reason: String| ConversionError::MalformedHierarchy {
        path: path.to_path_buf(),
        reason,
    };
    let mut input = Input { bytes, offset: 0 };

    let magic = input.take(4).ok_or_else(|| malformed("truncated header".into()))?;
    if magic != HIERARCHY_MAGIC {
        return Err(malformed("bad magic".into()));
    }
    let version = input.u32().ok_or_else(|| malformed("truncated header".into()))?;
    if version != FILE_FORMAT_VERSION {
        return Err(malformed(format!("unsupported version {version}")));
    }
    let count = input.u32().ok_or_else(|| malformed("truncated header".into()))? as usize;

    let mut entries = Vec::with_capacity(count);
    let mut seen = HashSet::with_capacity(count);
    for n in 0..count {
        let truncated = || malformed(format!("truncated record {n}"));
        let id_len = input.u8().ok_or_else(truncated)? as usize;
        let id_bytes = input.take(id_len).ok_or_else(truncated)?;
        let id = std::str::from_utf8(id_bytes)
            .ok()
            .and_then(OctantId::parse)
            .ok_or_else(|| malformed(format!("invalid octant id in record {n}")))?;
        let level = input.u32().ok_or_else(truncated)?;
        let mut corners = [0.0f64; 6];
        for v in corners.iter_mut() {
            *v = input.f64().ok_or_else(truncated)?;
        }
        let child_mask = input.u8().ok_or_else(truncated)?;
        let is_leaf = input.u8().ok_or_else(truncated)? != 0;
        let point_count = input.u64().ok_or_else(truncated)?;

        if level != id.level() {
            return Err(malformed(format!("octant {id} has level {level}")));
        }
        match id.parent() {
            None if n != 0 => return Err(malformed(format!("second root in record {n}"))),
            Some(_) if n == 0 => return Err(malformed("first record is not the root".into())),
            Some(parent) if !seen.contains(&parent) => {
                return Err(malformed(format!("octant {id} precedes its parent")));
            }
            _ => {}
        }
        seen.insert(id.clone());

        entries.push(HierarchyEntry {
            id,
            level,
            bounds: PointCloudBounds::from_min_max(
                [corners[0], corners[1], corners[2]],
                [corners[3], corners[4], corners[5]],
            ),
            child_mask,
            is_leaf,
            point_count,
        });
    }

    if input.offset != bytes.len() {
        return Err(malformed("trailing bytes after last record".into()));
    }
    Ok(entries)
}

struct Input<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Input<'a> {
    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.offset.checked_add(len)?;
        let slice = self.bytes.get(self.offset..end)?;
        self.offset = end;
        Some(slice)
    }

    fn u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    fn u32(&mut self) -> Option<u32> {
        self.take(4)?.try_into().ok().map(u32::from_le_bytes)
    }

    fn u64(&mut self) -> Option<u64> {
        self.take(8)?.try_into().ok().map(u64::from_le_bytes)
    }

    fn f64(&mut self) -> Option<f64> {
        self.take(8)?.try_into().ok().map(f64::from_le_bytes)
    }
}
