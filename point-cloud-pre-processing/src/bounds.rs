/// Axis-aligned point cloud bounds and octant subdivision
use constants::octree::{MIN_ROOT_EXTENT, ROOT_PADDING_FACTOR};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointCloudBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl Default for PointCloudBounds {
    fn default() -> Self {
        Self::new()
    }
}

impl PointCloudBounds {
    /// Create new bounds initialised to infinity values
    pub fn new() -> Self {
        Self {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
            min_z: f64::INFINITY,
            max_z: f64::NEG_INFINITY,
        }
    }

    /// Create bounds from explicit corners
    pub fn from_min_max(min: [f64; 3], max: [f64; 3]) -> Self {
        Self {
            min_x: min[0],
            max_x: max[0],
            min_y: min[1],
            max_y: max[1],
            min_z: min[2],
            max_z: max[2],
        }
    }

    /// True until the first point has been added
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y || self.min_z > self.max_z
    }

    /// Update bounds with a new point
    pub fn update(&mut self, x: f64, y: f64, z: f64) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
        self.min_z = self.min_z.min(z);
        self.max_z = self.max_z.max(z);
    }

    /// Merge another box into this one
    pub fn union(&mut self, other: &PointCloudBounds) {
        self.min_x = self.min_x.min(other.min_x);
        self.max_x = self.max_x.max(other.max_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_y = self.max_y.max(other.max_y);
        self.min_z = self.min_z.min(other.min_z);
        self.max_z = self.max_z.max(other.max_z);
    }

    /// Inclusive containment test on every axis
    pub fn contains(&self, p: [f64; 3]) -> bool {
        p[0] >= self.min_x
            && p[0] <= self.max_x
            && p[1] >= self.min_y
            && p[1] <= self.max_y
            && p[2] >= self.min_z
            && p[2] <= self.max_z
    }

    pub fn min(&self) -> [f64; 3] {
        [self.min_x, self.min_y, self.min_z]
    }

    pub fn max(&self) -> [f64; 3] {
        [self.max_x, self.max_y, self.max_z]
    }

    pub fn center(&self) -> [f64; 3] {
        [
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
            (self.min_z + self.max_z) * 0.5,
        ]
    }

    /// Get world space dimensions
    pub fn dimensions(&self) -> (f64, f64, f64) {
        (
            self.max_x - self.min_x,
            self.max_y - self.min_y,
            self.max_z - self.min_z,
        )
    }

    pub fn max_extent(&self) -> f64 {
        let (dx, dy, dz) = self.dimensions();
        dx.max(dy).max(dz)
    }

    /// Build the padded cube used as octree root.
    /// The cube shares the box centre so subdivision stays balanced on every axis.
    pub fn to_root_cube(&self) -> PointCloudBounds {
        let extent = self.max_extent();
        let size = if extent > 0.0 {
            extent * (1.0 + ROOT_PADDING_FACTOR)
        } else {
            MIN_ROOT_EXTENT
        };
        let half = size * 0.5;
        let c = self.center();

        Self::from_min_max(
            [c[0] - half, c[1] - half, c[2] - half],
            [c[0] + half, c[1] + half, c[2] + half],
        )
    }

    /// Bounds of one of the eight children.
    /// Bit 0 selects the upper x half, bit 1 the upper z half and bit 2 the upper y half.
    pub fn octant_bounds(&self, index: usize) -> PointCloudBounds {
        let c = self.center();
        let mut min = self.min();
        let mut max = self.max();

        let axis_for_bit = [(0usize, 0usize), (1, 2), (2, 1)];
        for (bit, axis) in axis_for_bit {
            if index & (1 << bit) != 0 {
                min[axis] = c[axis];
            } else {
                max[axis] = c[axis];
            }
        }

        Self::from_min_max(min, max)
    }

    /// Child slot a point falls into.
    /// Coordinates on a splitting plane belong to the upper half.
    pub fn octant_index(&self, p: [f64; 3]) -> usize {
        let c = self.center();
        let mut index = 0;
        if p[0] >= c[0] {
            index |= 1;
        }
        if p[2] >= c[2] {
            index |= 2;
        }
        if p[1] >= c[1] {
            index |= 4;
        }
        index
    }
}
