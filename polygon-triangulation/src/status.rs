/// Sweep-line status: the edges crossing the sweep line, ordered left to right
use crate::error::GeometryError;
use crate::handles::{HalfEdgeHandle, VertHandle};
use glam::DVec2;
use std::cmp::Ordering;

/// Sweep order: larger y first, on equal y smaller x first.
pub fn is_above(a: DVec2, b: DVec2) -> bool {
    a.y > b.y || (a.y == b.y && a.x < b.x)
}

/// Status entry for one half-edge whose interior lies to its right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusNode {
    pub half_edge: HalfEdgeHandle,
    pub upper: DVec2,
    pub lower: DVec2,
    pub helper: VertHandle,
    /// Whether the helper is a merge vertex.
    pub is_merge: bool,
}

impl StatusNode {
    pub fn new(half_edge: HalfEdgeHandle, a: DVec2, b: DVec2, helper: VertHandle) -> Self {
        let (upper, lower) = if is_above(a, b) { (a, b) } else { (b, a) };
        Self {
            half_edge,
            upper,
            lower,
            helper,
            is_merge: false,
        }
    }

    /// X of the edge at the height of `sweep`.
    ///
    /// Endpoints return their exact x. A horizontal edge reports the sweep x clamped
    /// to its extent.
    pub fn x_at(&self, sweep: DVec2) -> f64 {
        if self.upper.y == self.lower.y {
            let (lo, hi) = if self.upper.x <= self.lower.x {
                (self.upper.x, self.lower.x)
            } else {
                (self.lower.x, self.upper.x)
            };
            return sweep.x.clamp(lo, hi);
        }
        if sweep.y == self.upper.y {
            return self.upper.x;
        }
        if sweep.y == self.lower.y {
            return self.lower.x;
        }
        let t = (self.upper.y - sweep.y) / (self.upper.y - self.lower.y);
        self.upper.x + t * (self.lower.x - self.upper.x)
    }

    /// Left-to-right order at the sweep point. Only the edge and its endpoints count.
    fn cmp_at(&self, other: &StatusNode, sweep: DVec2) -> Ordering {
        if self.half_edge == other.half_edge {
            return Ordering::Equal;
        }
        let by_x = self.x_at(sweep).total_cmp(&other.x_at(sweep));
        if by_x != Ordering::Equal {
            return by_x;
        }
        if self.lower == other.lower {
            // Both edges end here: compare just above the shared endpoint.
            let cross = (self.upper - self.lower).perp_dot(other.upper - other.lower);
            if cross != 0.0 {
                return if cross < 0.0 {
                    Ordering::Less
                } else {
                    Ordering::Greater
                };
            }
        } else if self.upper == other.upper {
            let cross = (self.lower - self.upper).perp_dot(other.lower - other.upper);
            if cross != 0.0 {
                return if cross > 0.0 {
                    Ordering::Less
                } else {
                    Ordering::Greater
                };
            }
        }
        self.half_edge.cmp(&other.half_edge)
    }
}

#[derive(Debug, Clone)]
struct TreeNode {
    entry: StatusNode,
    left: Option<usize>,
    right: Option<usize>,
    height: i32,
}

/// AVL tree in an index arena with no stored key. Every operation takes the current
/// sweep point and compares edges by their x at that height; edges of a simple polygon
/// keep their relative order while they are in the status.
#[derive(Debug, Clone, Default)]
pub struct SweepLineStatus {
    nodes: Vec<TreeNode>,
    free: Vec<usize>,
    root: Option<usize>,
    len: usize,
}

impl SweepLineStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn insert(&mut self, entry: StatusNode, sweep: DVec2) -> Result<(), GeometryError> {
        let root = self.insert_at(self.root, entry, sweep)?;
        self.root = Some(root);
        self.len += 1;
        Ok(())
    }

    /// Remove the entry for `probe.half_edge` and return it.
    pub fn remove(
        &mut self,
        probe: &StatusNode,
        sweep: DVec2,
    ) -> Result<StatusNode, GeometryError> {
        let (root, removed) = self.remove_at(self.root, probe, sweep)?;
        self.root = root;
        self.len -= 1;
        Ok(removed)
    }

    pub fn find(&self, probe: &StatusNode, sweep: DVec2) -> Option<&StatusNode> {
        self.locate(probe, sweep).map(|i| &self.nodes[i].entry)
    }

    pub fn find_mut(&mut self, probe: &StatusNode, sweep: DVec2) -> Option<&mut StatusNode> {
        self.locate(probe, sweep).map(|i| &mut self.nodes[i].entry)
    }

    pub fn set_helper(
        &mut self,
        probe: &StatusNode,
        sweep: DVec2,
        helper: VertHandle,
        is_merge: bool,
    ) -> Result<(), GeometryError> {
        let entry = self.find_mut(probe, sweep).ok_or_else(|| {
            GeometryError::SweepStatus(format!("{} is not in the status", probe.half_edge))
        })?;
        entry.helper = helper;
        entry.is_merge = is_merge;
        Ok(())
    }

    /// Entry directly left of `point`: the largest x at its height strictly below `point.x`.
    pub fn left_of(&self, point: DVec2) -> Option<StatusNode> {
        let mut best = None;
        let mut current = self.root;
        while let Some(i) = current {
            let node = &self.nodes[i];
            if node.entry.x_at(point) < point.x {
                best = Some(node.entry);
                current = node.right;
            } else {
                current = node.left;
            }
        }
        best
    }

    /// Entries in left-to-right order.
    pub fn entries(&self) -> Vec<StatusNode> {
        let mut out = Vec::with_capacity(self.len);
        let mut stack = Vec::new();
        let mut current = self.root;
        while current.is_some() || !stack.is_empty() {
            while let Some(i) = current {
                stack.push(i);
                current = self.nodes[i].left;
            }
            if let Some(i) = stack.pop() {
                out.push(self.nodes[i].entry);
                current = self.nodes[i].right;
            }
        }
        out
    }

    fn locate(&self, probe: &StatusNode, sweep: DVec2) -> Option<usize> {
        let mut current = self.root;
        while let Some(i) = current {
            current = match probe.cmp_at(&self.nodes[i].entry, sweep) {
                Ordering::Less => self.nodes[i].left,
                Ordering::Greater => self.nodes[i].right,
                Ordering::Equal => return Some(i),
            };
        }
        None
    }

    fn alloc(&mut self, entry: StatusNode) -> usize {
        let node = TreeNode {
            entry,
            left: None,
            right: None,
            height: 1,
        };
        match self.free.pop() {
            Some(i) => {
                self.nodes[i] = node;
                i
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn insert_at(
        &mut self,
        node: Option<usize>,
        entry: StatusNode,
        sweep: DVec2,
    ) -> Result<usize, GeometryError> {
        let Some(i) = node else {
            return Ok(self.alloc(entry));
        };
        match entry.cmp_at(&self.nodes[i].entry, sweep) {
            Ordering::Less => {
                let left = self.insert_at(self.nodes[i].left, entry, sweep)?;
                self.nodes[i].left = Some(left);
            }
            Ordering::Greater => {
                let right = self.insert_at(self.nodes[i].right, entry, sweep)?;
                self.nodes[i].right = Some(right);
            }
            Ordering::Equal => {
                return Err(GeometryError::SweepStatus(format!(
                    "{} is already in the status",
                    entry.half_edge
                )));
            }
        }
        Ok(self.rebalance(i))
    }

    fn remove_at(
        &mut self,
        node: Option<usize>,
        probe: &StatusNode,
        sweep: DVec2,
    ) -> Result<(Option<usize>, StatusNode), GeometryError> {
        let Some(i) = node else {
            return Err(GeometryError::SweepStatus(format!(
                "{} is not in the status",
                probe.half_edge
            )));
        };
        match probe.cmp_at(&self.nodes[i].entry, sweep) {
            Ordering::Less => {
                let (left, removed) = self.remove_at(self.nodes[i].left, probe, sweep)?;
                self.nodes[i].left = left;
                Ok((Some(self.rebalance(i)), removed))
            }
            Ordering::Greater => {
                let (right, removed) = self.remove_at(self.nodes[i].right, probe, sweep)?;
                self.nodes[i].right = right;
                Ok((Some(self.rebalance(i)), removed))
            }
            Ordering::Equal => {
                let removed = self.nodes[i].entry;
                let (left, right) = (self.nodes[i].left, self.nodes[i].right);
                self.free.push(i);
                let replacement = match (left, right) {
                    (None, right) => right,
                    (left, None) => left,
                    (Some(left), Some(right)) => {
                        let (right, min) = self.detach_min(right);
                        self.nodes[min].left = Some(left);
                        self.nodes[min].right = right;
                        Some(self.rebalance(min))
                    }
                };
                Ok((replacement, removed))
            }
        }
    }

    /// Unlink the leftmost node of a subtree; returns the new subtree root and that node.
    fn detach_min(&mut self, i: usize) -> (Option<usize>, usize) {
        match self.nodes[i].left {
            None => (self.nodes[i].right, i),
            Some(left) => {
                let (left, min) = self.detach_min(left);
                self.nodes[i].left = left;
                (Some(self.rebalance(i)), min)
            }
        }
    }

    fn height(&self, node: Option<usize>) -> i32 {
        node.map_or(0, |i| self.nodes[i].height)
    }

    fn balance_factor(&self, i: usize) -> i32 {
        self.height(self.nodes[i].left) - self.height(self.nodes[i].right)
    }

    fn update_height(&mut self, i: usize) {
        let height = 1 + self
            .height(self.nodes[i].left)
            .max(self.height(self.nodes[i].right));
        self.nodes[i].height = height;
    }

    fn rotate_right(&mut self, i: usize) -> usize {
        let Some(pivot) = self.nodes[i].left else {
            return i;
        };
        self.nodes[i].left = self.nodes[pivot].right;
        self.nodes[pivot].right = Some(i);
        self.update_height(i);
        self.update_height(pivot);
        pivot
    }

    fn rotate_left(&mut self, i: usize) -> usize {
        let Some(pivot) = self.nodes[i].right else {
            return i;
        };
        self.nodes[i].right = self.nodes[pivot].left;
        self.nodes[pivot].left = Some(i);
        self.update_height(i);
        self.update_height(pivot);
        pivot
    }

    fn rebalance(&mut self, i: usize) -> usize {
        self.update_height(i);
        let balance = self.balance_factor(i);
        if balance > 1 {
            if let Some(left) = self.nodes[i].left {
                if self.balance_factor(left) < 0 {
                    let rotated = self.rotate_left(left);
                    self.nodes[i].left = Some(rotated);
                }
            }
            return self.rotate_right(i);
        }
        if balance < -1 {
            if let Some(right) = self.nodes[i].right {
                if self.balance_factor(right) > 0 {
                    let rotated = self.rotate_right(right);
                    self.nodes[i].right = Some(rotated);
                }
            }
            return self.rotate_left(i);
        }
        i
    }
}
