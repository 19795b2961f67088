//! Shared fixtures for octree integration tests

#![allow(dead_code)]

use point_cloud_pre_processing::PointCloudBounds;
use point_cloud_pre_processing::point_types::{Pos64, Pos64Col32IShort};

/// Deterministic pseudo random cloud inside `[0, extent)^3`.
pub fn scattered_coords(count: usize, extent: f64, seed: u64) -> Vec<[f64; 3]> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((state >> 11) as f64 / (1u64 << 53) as f64) * extent
    };
    (0..count).map(|_| [next(), next(), next()]).collect()
}

pub fn bounds_of(coords: &[[f64; 3]]) -> PointCloudBounds {
    let mut bounds = PointCloudBounds::new();
    for p in coords {
        bounds.update(p[0], p[1], p[2]);
    }
    bounds
}

pub fn pos64_points(coords: &[[f64; 3]]) -> Vec<Pos64> {
    coords.iter().map(|&position| Pos64 { position }).collect()
}

pub fn colored_points(coords: &[[f64; 3]]) -> Vec<Pos64Col32IShort> {
    coords
        .iter()
        .enumerate()
        .map(|(i, &position)| Pos64Col32IShort {
            position,
            color: [(i % 7) as f32 / 7.0, 0.5, 1.0 - (i % 3) as f32 / 3.0],
            intensity: (i * 37 % 65_536) as u16,
        })
        .collect()
}

/// Positions sorted for order-independent comparison.
pub fn sorted_positions<'a>(positions: impl Iterator<Item = &'a [f64; 3]>) -> Vec<[f64; 3]> {
    let mut out: Vec<[f64; 3]> = positions.copied().collect();
    out.sort_by(|a, b| a.partial_cmp(b).expect("finite coordinates"));
    out
}

/// The eight corners of the cube `[-1, 1]^3`.
pub fn cube_corners() -> Vec<[f64; 3]> {
    let mut corners = Vec::with_capacity(8);
    for x in [-1.0, 1.0] {
        for y in [-1.0, 1.0] {
            for z in [-1.0, 1.0] {
                corners.push([x, y, z]);
            }
        }
    }
    corners
}
