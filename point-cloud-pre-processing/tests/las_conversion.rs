//! Integration tests: LAS source through the full conversion pipeline

mod common;

use common::*;
use las::{Builder, Color, Point, Writer};
use point_cloud_pre_processing::point_types::{
    Pos64Col32IShort, Pos64Col32IShortAccessor, Pos64IShort, Pos64IShortAccessor,
    Pos64Nor32Col32IShort, Pos64Nor32Col32IShortAccessor,
};
use point_cloud_pre_processing::source::VecPointReader;
use point_cloud_pre_processing::{
    ConversionConfig, ConversionError, OctreeError, OctreeFileReader, PointCloudConverter,
};
use std::path::Path;
use tempfile::TempDir;

fn write_las(path: &Path, coords: &[[f64; 3]]) {
    let mut builder = Builder::from((1, 2));
    builder.point_format.has_color = true;
    builder.transforms = las::Vector {
        x: las::Transform {
            scale: 0.001,
            offset: 0.0,
        },
        y: las::Transform {
            scale: 0.001,
            offset: 0.0,
        },
        z: las::Transform {
            scale: 0.001,
            offset: 0.0,
        },
    };
    let header = builder.into_header().unwrap();
    let mut writer = Writer::from_path(path, header).unwrap();
    for (i, p) in coords.iter().enumerate() {
        let mut point = Point::default();
        point.x = p[0];
        point.y = p[1];
        point.z = p[2];
        point.intensity = i as u16;
        point.color = Some(Color::new(u16::MAX, 0, u16::MAX / 2));
        writer.write_point(point).unwrap();
    }
    writer.close().unwrap();
}

#[test]
fn converts_las_file_with_axis_exchange() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("cloud.las");
    let output = dir.path().join("octree");
    let coords: Vec<[f64; 3]> = (0..200)
        .map(|i| [(i % 10) as f64, (i / 10 % 10) as f64, (i / 100) as f64 * 50.0])
        .collect();
    write_las(&source, &coords);

    let config = ConversionConfig::new(&source, &output, 16, 1, true).unwrap();
    let summary = PointCloudConverter::new(config).convert().unwrap();

    assert_eq!(summary.points_read, 200);
    assert_eq!(summary.point_type, "Pos64Col32IShort");
    // Source Z spans 0..50 and lands on the Y axis after the exchange.
    assert!((summary.bounds.max_y - 50.0).abs() < 1e-6);
    assert!((summary.bounds.max_z - 9.0).abs() < 1e-6);

    let tree = OctreeFileReader::new(&output)
        .read_octree::<Pos64Col32IShort, _>(&Pos64Col32IShortAccessor)
        .unwrap();
    assert_eq!(tree.point_count(), 200);
    for leaf in tree.leaves() {
        assert!(leaf.points.len() <= 16);
        for point in &leaf.points {
            assert_eq!(point.color[0], 1.0);
            assert_eq!(point.color[1], 0.0);
        }
    }
}

#[test]
fn in_memory_source_runs_all_stages() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("unused.las");
    std::fs::write(&source, b"").unwrap();
    let output = dir.path().join("octree");

    let coords = scattered_coords(300, 10.0, 9);
    let points: Vec<Pos64IShort> = coords
        .iter()
        .map(|&position| Pos64IShort {
            position,
            intensity: 7,
        })
        .collect();

    let config = ConversionConfig::new(&source, &output, 32, 2, false).unwrap();
    let converter = PointCloudConverter::new(config);
    let summary = converter
        .convert_points(&mut VecPointReader::new(points), &Pos64IShortAccessor)
        .unwrap();

    assert_eq!(summary.points_read, 300);
    assert_eq!(summary.bounds, bounds_of(&coords));
    assert_eq!(summary.node_files, summary.leaf_count);
    assert!(output.join("meta.json").is_file());
}

#[test]
fn empty_source_fails_the_build_stage() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("unused.las");
    std::fs::write(&source, b"").unwrap();

    let config = ConversionConfig::new(&source, &dir.path().join("octree"), 32, 2, false).unwrap();
    let result = PointCloudConverter::new(config).convert_points(
        &mut VecPointReader::<Pos64IShort>::new(Vec::new()),
        &Pos64IShortAccessor,
    );
    assert!(matches!(
        result,
        Err(ConversionError::Octree(OctreeError::EmptyInput))
    ));
}

#[test]
fn axis_exchange_swaps_positions_and_normals() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("unused.las");
    std::fs::write(&source, b"").unwrap();
    let output = dir.path().join("octree");

    let points: Vec<Pos64Nor32Col32IShort> = (0..5)
        .map(|i| Pos64Nor32Col32IShort {
            position: [i as f64, 2.0 * i as f64 + 0.5, 100.0 + i as f64],
            normal: [0.0, 0.6, 0.8],
            color: [0.25, 0.5, 1.0],
            intensity: i as u16,
        })
        .collect();

    let config = ConversionConfig::new(&source, &output, 100, 5, true).unwrap();
    let summary = PointCloudConverter::new(config)
        .convert_points(
            &mut VecPointReader::new(points.clone()),
            &Pos64Nor32Col32IShortAccessor,
        )
        .unwrap();
    assert_eq!(summary.points_read, 5);
    assert!((summary.bounds.min_y - 100.0).abs() < 1e-9);
    assert!((summary.bounds.max_z - 8.5).abs() < 1e-9);

    let tree = OctreeFileReader::new(&output)
        .read_octree::<Pos64Nor32Col32IShort, _>(&Pos64Nor32Col32IShortAccessor)
        .unwrap();
    assert_eq!(tree.len(), 1);
    let stored = &tree.root().points;
    assert_eq!(stored.len(), points.len());
    for (original, converted) in points.iter().zip(stored) {
        let [x, y, z] = original.position;
        assert_eq!(converted.position, [x, z, y]);
        assert_eq!(converted.normal, [0.0, 0.8, 0.6]);
        assert_eq!(converted.color, original.color);
        assert_eq!(converted.intensity, original.intensity);
    }
}
