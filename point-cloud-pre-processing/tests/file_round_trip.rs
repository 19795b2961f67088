//! Integration tests: out-of-core writer and reader round trip

mod common;

use common::*;
use constants::octree::{HIERARCHY_FILE_NAME, META_FILE_NAME, OCTANTS_DIR_NAME};
use point_cloud_pre_processing::point_types::{
    Pos32, Pos32Accessor, Pos64, Pos64Accessor, Pos64Col32IShort, Pos64Col32IShortAccessor,
};
use point_cloud_pre_processing::{
    ConversionError, OctantId, OctreeFileReader, OctreeFileWriter, PtOctree,
};
use std::fs;
use tempfile::TempDir;

#[test]
fn written_tree_reads_back_identically() {
    let dir = TempDir::new().unwrap();
    let coords = scattered_coords(1_500, 40.0, 21);
    let tree = PtOctree::build(
        bounds_of(&coords),
        &Pos64Col32IShortAccessor,
        colored_points(&coords),
        40,
    )
    .unwrap();

    let summary = OctreeFileWriter::new(dir.path())
        .write_complete_data(&tree, &Pos64Col32IShortAccessor)
        .unwrap();
    assert_eq!(summary.octant_count, tree.len());
    assert_eq!(summary.node_files, tree.leaves().count());

    let loaded: PtOctree<Pos64Col32IShort> = OctreeFileReader::new(dir.path())
        .read_octree(&Pos64Col32IShortAccessor)
        .unwrap();

    assert_eq!(loaded.len(), tree.len());
    assert_eq!(loaded.point_count(), tree.point_count());
    for (a, b) in tree.breadth_first().into_iter().zip(loaded.breadth_first()) {
        let (original, restored) = (&tree.octants()[a], &loaded.octants()[b]);
        assert_eq!(original.id, restored.id);
        assert_eq!(original.bounds, restored.bounds);
        assert_eq!(original.is_leaf, restored.is_leaf);
        assert_eq!(original.child_mask(), restored.child_mask());
        assert_eq!(original.points, restored.points);
    }
}

#[test]
fn output_directory_has_expected_layout() {
    let dir = TempDir::new().unwrap();
    let coords = cube_corners();
    let tree = PtOctree::build(bounds_of(&coords), &Pos64Accessor, pos64_points(&coords), 1).unwrap();
    OctreeFileWriter::new(dir.path())
        .write_complete_data(&tree, &Pos64Accessor)
        .unwrap();

    assert!(dir.path().join(META_FILE_NAME).is_file());
    assert!(dir.path().join(HIERARCHY_FILE_NAME).is_file());
    let mut node_files: Vec<String> = fs::read_dir(dir.path().join(OCTANTS_DIR_NAME))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    node_files.sort();
    let expected: Vec<String> = (0..8).map(|i| format!("r{i}.node")).collect();
    assert_eq!(node_files, expected);

    let node = fs::read(dir.path().join(OCTANTS_DIR_NAME).join("r3.node")).unwrap();
    assert_eq!(&node[0..4], &1u32.to_le_bytes());
    assert_eq!(&node[4..8], &24u32.to_le_bytes());
    assert_eq!(node.len(), 8 + 24);

    let meta: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join(META_FILE_NAME)).unwrap()).unwrap();
    assert_eq!(meta["point_type"], "Pos64");
    assert_eq!(meta["point_count"], 8);
    assert_eq!(meta["node_count"], 9);
    assert_eq!(meta["capabilities"][0], "HasPositionFloat64");
}

#[test]
fn lazy_paging_loads_single_octants() {
    let dir = TempDir::new().unwrap();
    let coords = cube_corners();
    let tree = PtOctree::build(bounds_of(&coords), &Pos64Accessor, pos64_points(&coords), 1).unwrap();
    OctreeFileWriter::new(dir.path())
        .write_complete_data(&tree, &Pos64Accessor)
        .unwrap();

    let reader = OctreeFileReader::new(dir.path());
    let hierarchy = reader.read_hierarchy().unwrap();
    assert_eq!(hierarchy.len(), 9);
    assert_eq!(hierarchy[0].id, OctantId::root());
    assert_eq!(hierarchy[0].child_mask, 0xFF);

    let root_points = reader.load_octant_points::<Pos64, _>(&OctantId::root(), &Pos64Accessor).unwrap();
    assert!(root_points.is_empty());

    let corner = reader
        .load_octant_points::<Pos64, _>(&OctantId::root().child(7), &Pos64Accessor)
        .unwrap();
    assert_eq!(corner.len(), 1);
    assert_eq!(corner[0].position, [1.0, 1.0, 1.0]);
}

#[test]
fn reading_with_another_layout_is_rejected() {
    let dir = TempDir::new().unwrap();
    let coords = scattered_coords(50, 1.0, 2);
    let tree = PtOctree::build(bounds_of(&coords), &Pos64Accessor, pos64_points(&coords), 10).unwrap();
    OctreeFileWriter::new(dir.path())
        .write_complete_data(&tree, &Pos64Accessor)
        .unwrap();

    let result = OctreeFileReader::new(dir.path()).read_octree::<Pos32, _>(&Pos32Accessor);
    assert!(matches!(result, Err(ConversionError::LayoutMismatch { .. })));
}

#[test]
fn missing_node_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let coords = cube_corners();
    let tree = PtOctree::build(bounds_of(&coords), &Pos64Accessor, pos64_points(&coords), 1).unwrap();
    OctreeFileWriter::new(dir.path())
        .write_complete_data(&tree, &Pos64Accessor)
        .unwrap();
    fs::remove_file(dir.path().join(OCTANTS_DIR_NAME).join("r5.node")).unwrap();

    let result = OctreeFileReader::new(dir.path()).read_octree::<Pos64, _>(&Pos64Accessor);
    assert!(matches!(result, Err(ConversionError::MalformedNode { .. })));
}

#[test]
fn rewriting_an_output_directory_replaces_old_nodes() {
    let dir = TempDir::new().unwrap();
    let coords = cube_corners();

    let coarse = PtOctree::build(bounds_of(&coords), &Pos64Accessor, pos64_points(&coords), 100).unwrap();
    OctreeFileWriter::new(dir.path())
        .write_complete_data(&coarse, &Pos64Accessor)
        .unwrap();
    assert!(dir.path().join(OCTANTS_DIR_NAME).join("r.node").is_file());
    fs::write(dir.path().join(OCTANTS_DIR_NAME).join("r1.node.tmp"), b"partial").unwrap();
    fs::write(dir.path().join(OCTANTS_DIR_NAME).join("notes.txt"), b"keep").unwrap();

    let fine = PtOctree::build(bounds_of(&coords), &Pos64Accessor, pos64_points(&coords), 1).unwrap();
    OctreeFileWriter::new(dir.path())
        .write_complete_data(&fine, &Pos64Accessor)
        .unwrap();

    let octants_dir = dir.path().join(OCTANTS_DIR_NAME);
    assert!(!octants_dir.join("r.node").exists());
    assert!(!octants_dir.join("r1.node.tmp").exists());
    assert!(octants_dir.join("notes.txt").is_file());

    let reader = OctreeFileReader::new(dir.path());
    let root_points = reader
        .load_octant_points::<Pos64, _>(&OctantId::root(), &Pos64Accessor)
        .unwrap();
    assert!(root_points.is_empty());

    let loaded = reader.read_octree::<Pos64, _>(&Pos64Accessor).unwrap();
    assert_eq!(loaded.len(), fine.len());
    assert_eq!(loaded.point_count(), 8);
    assert_eq!(loaded.leaves().count(), 8);
}
