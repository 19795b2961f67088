/// Bucket octree over point records.
/// Octants live in an arena owned by the tree; parents are referenced by index only.
use crate::accessor::{PointAccessor, PointRecord};
use crate::bounds::PointCloudBounds;
use crate::error::OctreeError;
use constants::octree::{MAX_GRID_CELLS_PER_AXIS, MAX_OCTREE_LEVEL};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use tracing::{debug, info, warn};

/// Path of an octant from the root: `r`, then one child digit per level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OctantId(String);

impl OctantId {
    pub fn root() -> Self {
        OctantId("r".to_string())
    }

    pub fn child(&self, index: usize) -> Self {
        debug_assert!(index < 8);
        let mut path = self.0.clone();
        path.push(char::from(b'0' + index as u8));
        OctantId(path)
    }

    /// Parse a path read back from disk
    pub fn parse(path: &str) -> Option<Self> {
        let mut chars = path.chars();
        if chars.next() != Some('r') {
            return None;
        }
        if chars.all(|c| ('0'..='7').contains(&c)) {
            Some(OctantId(path.to_string()))
        } else {
            None
        }
    }

    pub fn level(&self) -> u32 {
        (self.0.len() - 1) as u32
    }

    pub fn parent(&self) -> Option<Self> {
        if self.0.len() <= 1 {
            None
        } else {
            Some(OctantId(self.0[..self.0.len() - 1].to_string()))
        }
    }

    /// Child slot this octant occupies in its parent
    pub fn child_index(&self) -> Option<usize> {
        if self.0.len() <= 1 {
            return None;
        }
        self.0
            .as_bytes()
            .last()
            .map(|digit| (digit - b'0') as usize)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OctantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Octant<P> {
    pub id: OctantId,
    pub bounds: PointCloudBounds,
    pub level: u32,
    pub parent: Option<usize>,
    pub children: [Option<usize>; 8],
    pub points: Vec<P>,
    pub is_leaf: bool,
}

impl<P> Octant<P> {
    pub fn new(id: OctantId, bounds: PointCloudBounds, parent: Option<usize>) -> Self {
        Self {
            level: id.level(),
            id,
            bounds,
            parent,
            children: [None; 8],
            points: Vec::new(),
            is_leaf: true,
        }
    }

    /// Bit `i` is set when child slot `i` exists
    pub fn child_mask(&self) -> u8 {
        self.children
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_some())
            .fold(0u8, |mask, (i, _)| mask | (1 << i))
    }

    /// Existing children in slot order
    pub fn child_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.children.iter().flatten().copied()
    }
}

pub struct PtOctree<P> {
    octants: Vec<Octant<P>>,
    source_bounds: PointCloudBounds,
    max_points_per_bucket: usize,
    max_level: u32,
    point_count: usize,
}

struct PendingOctant<P> {
    index: usize,
    points: Vec<([f64; 3], P)>,
}

impl<P: PointRecord> PtOctree<P> {
    /// Build an octree with the default level limit.
    pub fn build<A>(
        bounds: PointCloudBounds,
        accessor: &A,
        points: Vec<P>,
        max_points_per_bucket: usize,
    ) -> Result<Self, OctreeError>
    where
        A: PointAccessor<P> + ?Sized,
    {
        Self::build_with_max_level(bounds, accessor, points, max_points_per_bucket, MAX_OCTREE_LEVEL)
    }

    /// Build an octree over `points`.
    ///
    /// A node holding at most `max_points_per_bucket` points becomes a leaf; larger
    /// nodes split at their centre and hand every point to exactly one child. Splitting
    /// stops at `max_level`, where leaves may exceed the capacity.
    pub fn build_with_max_level<A>(
        bounds: PointCloudBounds,
        accessor: &A,
        points: Vec<P>,
        max_points_per_bucket: usize,
        max_level: u32,
    ) -> Result<Self, OctreeError>
    where
        A: PointAccessor<P> + ?Sized,
    {
        if points.is_empty() {
            return Err(OctreeError::EmptyInput);
        }
        if max_points_per_bucket == 0 {
            return Err(OctreeError::ZeroCapacity);
        }
        if !accessor.layout().has_position() {
            return Err(OctreeError::UnsupportedLayout(accessor.type_name()));
        }

        let point_count = points.len();
        let root_cube = bounds.to_root_cube();
        info!(
            points = point_count,
            capacity = max_points_per_bucket,
            size = root_cube.max_extent(),
            "Building octree"
        );

        let mut outside = 0usize;
        let mut located = Vec::with_capacity(point_count);
        for point in points {
            let p = accessor.position(&point)?;
            if !root_cube.contains(p) {
                outside += 1;
            }
            located.push((p, point));
        }
        if outside > 0 {
            warn!(outside, "Points outside the root cube were clamped into border octants");
        }

        let mut octants = vec![Octant::new(OctantId::root(), root_cube, None)];
        let mut pending = vec![PendingOctant {
            index: 0,
            points: located,
        }];

        while let Some(PendingOctant { index, points }) = pending.pop() {
            let level = octants[index].level;
            if points.len() <= max_points_per_bucket || level >= max_level {
                if points.len() > max_points_per_bucket {
                    debug!(octant = %octants[index].id, count = points.len(), "Leaf at level limit exceeds capacity");
                }
                let node = &mut octants[index];
                node.points = points.into_iter().map(|(_, p)| p).collect();
                node.is_leaf = true;
                continue;
            }

            let node_bounds = octants[index].bounds;
            let mut buckets: [Vec<([f64; 3], P)>; 8] = Default::default();
            for entry in points {
                buckets[node_bounds.octant_index(entry.0)].push(entry);
            }

            debug!(octant = %octants[index].id, "Splitting octant");
            octants[index].is_leaf = false;

            let mut created = Vec::new();
            for (slot, bucket) in buckets.into_iter().enumerate() {
                if bucket.is_empty() {
                    continue;
                }
                let child_index = octants.len();
                let id = octants[index].id.child(slot);
                octants.push(Octant::new(id, node_bounds.octant_bounds(slot), Some(index)));
                octants[index].children[slot] = Some(child_index);
                created.push(PendingOctant {
                    index: child_index,
                    points: bucket,
                });
            }
            // Reverse so children are processed in slot order.
            pending.extend(created.into_iter().rev());
        }

        let tree = Self {
            octants,
            source_bounds: bounds,
            max_points_per_bucket,
            max_level,
            point_count,
        };
        info!(
            octants = tree.len(),
            depth = tree.depth(),
            "Octree built"
        );
        Ok(tree)
    }

    /// Reassemble a tree from an octant arena whose parents precede their children.
    pub fn from_parts(
        octants: Vec<Octant<P>>,
        source_bounds: PointCloudBounds,
        max_points_per_bucket: usize,
        max_level: u32,
    ) -> Result<Self, OctreeError> {
        if octants.is_empty() {
            return Err(OctreeError::EmptyInput);
        }
        for (i, octant) in octants.iter().enumerate() {
            for child in octant.child_indices() {
                if child <= i || child >= octants.len() {
                    return Err(OctreeError::UnknownOctant(child));
                }
            }
        }
        let point_count = octants.iter().map(|o| o.points.len()).sum();
        Ok(Self {
            octants,
            source_bounds,
            max_points_per_bucket,
            max_level,
            point_count,
        })
    }

    /// Deterministic subsample of everything stored below `index`.
    ///
    /// A leaf returns its payload. An interior node lays a `cells_per_axis`³ grid over
    /// its cube and keeps, per occupied cell, the point closest to the cell centre;
    /// ties keep the point met first in pre-order. Output is in cell order.
    /// `cells_per_axis` is clamped to `1..=MAX_GRID_CELLS_PER_AXIS`.
    pub fn grid_points<A>(
        &self,
        index: usize,
        cells_per_axis: u32,
        accessor: &A,
    ) -> Result<Vec<P>, OctreeError>
    where
        A: PointAccessor<P> + ?Sized,
    {
        let octant = self.octant(index).ok_or(OctreeError::UnknownOctant(index))?;
        if octant.is_leaf {
            return Ok(octant.points.clone());
        }

        let n = cells_per_axis.clamp(1, MAX_GRID_CELLS_PER_AXIS) as u64;
        let cube = octant.bounds;
        let size = cube.max_extent();
        let cell_size = size / n as f64;
        let min = cube.min();

        let mut best: BTreeMap<u64, (f64, &P)> = BTreeMap::new();
        for point in self.points_under(index) {
            let p = accessor.position(point)?;
            let mut cell = [0u64; 3];
            let mut dist2 = 0.0;
            for axis in 0..3 {
                let raw = ((p[axis] - min[axis]) / cell_size).floor();
                let c = raw.clamp(0.0, (n - 1) as f64) as u64;
                let centre = min[axis] + (c as f64 + 0.5) * cell_size;
                dist2 += (p[axis] - centre) * (p[axis] - centre);
                cell[axis] = c;
            }
            let key = (cell[0] * n + cell[1]) * n + cell[2];
            if best.get(&key).is_none_or(|(d, _)| dist2 < *d) {
                best.insert(key, (dist2, point));
            }
        }

        Ok(best.into_values().map(|(_, p)| p.clone()).collect())
    }
}

impl<P> PtOctree<P> {
    pub fn root(&self) -> &Octant<P> {
        &self.octants[0]
    }

    pub fn octant(&self, index: usize) -> Option<&Octant<P>> {
        self.octants.get(index)
    }

    /// All octants in arena order
    pub fn octants(&self) -> &[Octant<P>] {
        &self.octants
    }

    pub fn len(&self) -> usize {
        self.octants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.octants.is_empty()
    }

    pub fn source_bounds(&self) -> &PointCloudBounds {
        &self.source_bounds
    }

    pub fn root_cube(&self) -> &PointCloudBounds {
        &self.root().bounds
    }

    pub fn max_points_per_bucket(&self) -> usize {
        self.max_points_per_bucket
    }

    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }

    /// Deepest level present in the tree
    pub fn depth(&self) -> u32 {
        self.octants.iter().map(|o| o.level).max().unwrap_or(0)
    }

    pub fn leaves(&self) -> impl Iterator<Item = &Octant<P>> {
        self.octants.iter().filter(|o| o.is_leaf)
    }

    /// Pre-order depth-first indices, children in slot order.
    pub fn traverse(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.octants.len());
        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            order.push(index);
            let node = &self.octants[index];
            for child in node.children.iter().rev().flatten() {
                stack.push(*child);
            }
        }
        order
    }

    /// Level-order indices, children in slot order.
    pub fn breadth_first(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.octants.len());
        let mut queue = VecDeque::from([0usize]);
        while let Some(index) = queue.pop_front() {
            order.push(index);
            queue.extend(self.octants[index].child_indices());
        }
        order
    }

    /// Pre-order indices of every octant at or above `level`.
    pub fn octants_to_level(&self, level: u32) -> Vec<usize> {
        let mut order = Vec::new();
        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            let node = &self.octants[index];
            order.push(index);
            if node.level < level {
                for child in node.children.iter().rev().flatten() {
                    stack.push(*child);
                }
            }
        }
        order
    }

    /// Leaf whose cube holds `p`, if the descent reaches one.
    pub fn locate_leaf(&self, p: [f64; 3]) -> Option<usize> {
        if !self.root().bounds.contains(p) {
            return None;
        }
        let mut index = 0;
        loop {
            let node = &self.octants[index];
            if node.is_leaf {
                return Some(index);
            }
            index = node.children[node.bounds.octant_index(p)]?;
        }
    }

    /// Every payload point stored in the subtree rooted at `index`, in pre-order.
    pub fn points_under(&self, index: usize) -> Vec<&P> {
        let mut result = Vec::new();
        if index >= self.octants.len() {
            return result;
        }
        let mut stack = vec![index];
        while let Some(i) = stack.pop() {
            let node = &self.octants[i];
            result.extend(node.points.iter());
            for child in node.children.iter().rev().flatten() {
                stack.push(*child);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point_types::{Pos64, Pos64Accessor};

    fn cloud(coords: &[[f64; 3]]) -> (PointCloudBounds, Vec<Pos64>) {
        let mut bounds = PointCloudBounds::new();
        let points = coords
            .iter()
            .map(|&position| {
                bounds.update(position[0], position[1], position[2]);
                Pos64 { position }
            })
            .collect();
        (bounds, points)
    }

    #[test]
    fn octant_ids_encode_path_and_level() {
        let id = OctantId::root().child(0).child(7);
        assert_eq!(id.as_str(), "r07");
        assert_eq!(id.level(), 2);
        assert_eq!(id.child_index(), Some(7));
        assert_eq!(id.parent(), Some(OctantId::root().child(0)));
        assert_eq!(OctantId::parse("r07"), Some(id));
        assert_eq!(OctantId::parse("r8"), None);
        assert_eq!(OctantId::parse("x0"), None);
    }

    #[test]
    fn rejects_empty_input_and_zero_capacity() {
        let (bounds, points) = cloud(&[[0.0, 0.0, 0.0]]);
        assert!(matches!(
            PtOctree::build(bounds, &Pos64Accessor, Vec::<Pos64>::new(), 4),
            Err(OctreeError::EmptyInput)
        ));
        assert!(matches!(
            PtOctree::build(bounds, &Pos64Accessor, points, 0),
            Err(OctreeError::ZeroCapacity)
        ));
    }

    #[test]
    fn small_input_stays_in_root_leaf() {
        let (bounds, points) = cloud(&[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [0.5, 0.2, 0.9]]);
        let tree = PtOctree::build(bounds, &Pos64Accessor, points, 10).unwrap();

        assert_eq!(tree.len(), 1);
        assert!(tree.root().is_leaf);
        assert_eq!(tree.root().points.len(), 3);
        assert_eq!(tree.root().child_mask(), 0);
    }

    #[test]
    fn coincident_points_stop_at_level_limit() {
        let coords = vec![[1.0, 1.0, 1.0]; 5];
        let (bounds, points) = cloud(&coords);
        let tree = PtOctree::build_with_max_level(bounds, &Pos64Accessor, points, 2, 4).unwrap();

        assert_eq!(tree.depth(), 4);
        let leaves: Vec<_> = tree.leaves().collect();
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].points.len(), 5);
    }

    #[test]
    fn traversal_orders_visit_every_octant_once() {
        let coords: Vec<[f64; 3]> = (0..40)
            .map(|i| {
                let t = i as f64;
                [t % 7.0, (t * 3.0) % 11.0, (t * 5.0) % 13.0]
            })
            .collect();
        let (bounds, points) = cloud(&coords);
        let tree = PtOctree::build(bounds, &Pos64Accessor, points, 3).unwrap();

        let mut dfs = tree.traverse();
        let bfs = tree.breadth_first();
        assert_eq!(dfs[0], 0);
        assert_eq!(bfs[0], 0);
        for pair in bfs.windows(2) {
            assert!(tree.octants()[pair[0]].level <= tree.octants()[pair[1]].level);
        }
        dfs.sort_unstable();
        assert_eq!(dfs, (0..tree.len()).collect::<Vec<_>>());
    }

    #[test]
    fn octants_to_level_respects_cutoff() {
        let coords: Vec<[f64; 3]> = (0..64)
            .map(|i| [(i % 4) as f64, ((i / 4) % 4) as f64, (i / 16) as f64])
            .collect();
        let (bounds, points) = cloud(&coords);
        let tree = PtOctree::build(bounds, &Pos64Accessor, points, 1).unwrap();

        let shallow = tree.octants_to_level(1);
        assert!(shallow.iter().all(|&i| tree.octants()[i].level <= 1));
        assert_eq!(shallow.len(), 1 + tree.root().child_indices().count());
        assert_eq!(tree.octants_to_level(0), vec![0]);
    }

    #[test]
    fn grid_points_picks_point_nearest_each_cell_centre() {
        let coords = [
            [0.1, 0.1, 0.1],
            [0.45, 0.45, 0.45],
            [0.26, 0.24, 0.25],
            [0.9, 0.9, 0.9],
        ];
        let (bounds, points) = cloud(&coords);
        let tree = PtOctree::build(bounds, &Pos64Accessor, points, 1).unwrap();

        let sampled = tree.grid_points(0, 2, &Pos64Accessor).unwrap();
        // The lower cell holds three candidates; the one nearest its centre survives.
        assert_eq!(sampled.len(), 2);
        assert_eq!(sampled[0].position, [0.26, 0.24, 0.25]);
        assert_eq!(sampled[1].position, [0.9, 0.9, 0.9]);

        let again = tree.grid_points(0, 2, &Pos64Accessor).unwrap();
        assert_eq!(sampled, again);

        // A huge grid is clamped, so every point lands in its own cell.
        let fine = tree.grid_points(0, u32::MAX, &Pos64Accessor).unwrap();
        assert_eq!(fine.len(), coords.len());
        assert!(tree.grid_points(tree.len(), 2, &Pos64Accessor).is_err());
    }
}
