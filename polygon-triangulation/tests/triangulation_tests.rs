//! Integration tests: DCEL editing and polygon triangulation

use glam::DVec3;
use polygon_triangulation::{
    FaceHandle, Geometry, GeometryError, Outline, Triangulation, VertHandle,
};

fn outline(points: &[(f64, f64)]) -> Vec<DVec3> {
    points.iter().map(|&(x, y)| DVec3::new(x, y, 0.0)).collect()
}

fn star(tips: usize, outer: f64, inner: f64) -> Vec<DVec3> {
    (0..tips * 2)
        .map(|i| {
            let angle = 0.3 + i as f64 * std::f64::consts::PI / tips as f64;
            let r = if i % 2 == 0 { outer } else { inner };
            DVec3::new(r * angle.cos(), r * angle.sin(), 0.0)
        })
        .collect()
}

/// Every listed face is a triangle and the triangles tile `area`.
fn assert_triangulated(geometry: &Geometry, triangles: &[FaceHandle], area: f64) {
    geometry.validate().unwrap();
    let mut total = 0.0;
    for &face in triangles {
        assert_eq!(geometry.face_outer_vertices(face).unwrap().len(), 3, "{face}");
        assert!(geometry.face(face).unwrap().inner_components.is_empty());
        let face_area = geometry.face_area(face).unwrap();
        assert!(face_area > 0.0, "{face} has area {face_area}");
        total += face_area;
    }
    assert_eq!(geometry.bounded_faces().len(), triangles.len());
    assert!((total - area).abs() < 1e-9, "area {total} != {area}");
}

#[test]
fn notched_square_needs_one_diagonal() {
    let points = outline(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (2.0, 2.0), (0.0, 4.0)]);
    let geometry = Geometry::from_outlines(&[Outline::outer(points)]).unwrap();
    let mut triangulation = Triangulation::new(geometry);

    let pieces = triangulation.make_monotone(FaceHandle(1)).unwrap();
    assert_eq!(pieces.len(), 2);
    let geometry = triangulation.geometry();
    geometry.validate().unwrap();
    assert_eq!(geometry.half_edges().len(), 12);

    // The diagonal joins the bottom-left corner to the notch.
    let diagonal = &geometry.half_edges()[10];
    assert_eq!(diagonal.origin, VertHandle(0));
    assert_eq!(geometry.destination(diagonal.handle).unwrap(), VertHandle(3));

    for piece in pieces {
        assert!(triangulation.is_monotone(piece).unwrap());
    }
}

#[test]
fn notched_square_triangulates_into_three_triangles() {
    let points = outline(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (2.0, 2.0), (0.0, 4.0)]);
    let mut triangulation =
        Triangulation::new(Geometry::from_outlines(&[Outline::outer(points)]).unwrap());

    let triangles = triangulation.triangulate().unwrap();
    assert_eq!(triangles.len(), 3);
    assert_triangulated(triangulation.geometry(), &triangles, 12.0);
}

#[test]
fn inserting_a_diagonal_splits_the_square() {
    let points = outline(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
    let mut geometry = Geometry::from_outlines(&[Outline::outer(points)]).unwrap();
    assert_eq!(geometry.bounded_faces().len(), 1);

    let diagonal = geometry
        .insert_half_edge(VertHandle(0), VertHandle(2))
        .unwrap();
    let new_face = diagonal.new_face.unwrap();
    assert_eq!(geometry.bounded_faces().len(), 2);
    geometry.validate().unwrap();

    for face in [FaceHandle(1), new_face] {
        let cycle = geometry.face_half_edges(face).unwrap();
        assert_eq!(cycle.len(), 3);
        for h in cycle {
            let edge = geometry.half_edge(h).unwrap();
            assert_eq!(geometry.half_edge(edge.next).unwrap().prev, h);
            assert_eq!(geometry.half_edge(edge.prev).unwrap().next, h);
            assert_eq!(edge.incident_face, face);
        }
        assert!((geometry.face_area(face).unwrap() - 0.5).abs() < 1e-12);
    }

    let forward = geometry.half_edge(diagonal.half_edge).unwrap();
    assert_eq!(forward.origin, VertHandle(0));
    assert_eq!(forward.twin, diagonal.twin);
    assert_eq!(geometry.half_edges_starting_at(VertHandle(0)).unwrap().len(), 3);
}

#[test]
fn square_with_hole_is_triangulated() {
    let outer = outline(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
    let hole = outline(&[(5.0, 3.0), (7.0, 5.0), (5.0, 7.0), (3.0, 5.0)]);
    let geometry =
        Geometry::from_outlines(&[Outline::outer(outer), Outline::hole(hole)]).unwrap();
    assert_eq!(geometry.face(FaceHandle(1)).unwrap().inner_components.len(), 1);
    assert!((geometry.face_area(FaceHandle(1)).unwrap() - 92.0).abs() < 1e-12);

    let mut triangulation = Triangulation::new(geometry);
    assert!(!triangulation.is_monotone(FaceHandle(1)).unwrap());

    let pieces = triangulation.make_monotone(FaceHandle(1)).unwrap();
    for &piece in &pieces {
        assert!(triangulation.is_monotone(piece).unwrap(), "{piece}");
    }

    let triangles = triangulation.triangulate().unwrap();
    assert_eq!(triangles.len(), 8);
    assert_triangulated(triangulation.geometry(), &triangles, 92.0);
}

#[test]
fn star_triangulates_into_n_minus_two_triangles() {
    let points = star(6, 5.0, 2.0);
    let n = points.len();
    let geometry = Geometry::from_outlines(&[Outline::outer(points)]).unwrap();
    let area = geometry.face_area(FaceHandle(1)).unwrap();

    let mut triangulation = Triangulation::new(geometry);
    let triangles = triangulation.triangulate().unwrap();
    assert_eq!(triangles.len(), n - 2);
    assert_triangulated(triangulation.geometry(), &triangles, area);
}

#[test]
fn tilted_polygon_is_triangulated_in_its_plane() {
    // The notched square rotated into the plane x + z = 0.
    let points: Vec<DVec3> = [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (2.0, 2.0), (0.0, 4.0)]
        .iter()
        .map(|&(u, v)| DVec3::new(u, v, -u))
        .collect();
    let geometry = Geometry::from_outlines(&[Outline::outer(points)]).unwrap();
    let area = geometry.face_area(FaceHandle(1)).unwrap();
    assert!((area - 12.0 * 2f64.sqrt()).abs() < 1e-9);

    let mut triangulation = Triangulation::new(geometry);
    let triangles = triangulation.triangulate().unwrap();
    assert_eq!(triangles.len(), 3);
    assert_triangulated(triangulation.geometry(), &triangles, area);
}

#[test]
fn two_separate_outlines_are_both_triangulated() {
    let left = outline(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]);
    let right = outline(&[(5.0, 0.0), (7.0, 0.0), (7.0, 3.0), (6.0, 1.0), (5.0, 3.0)]);
    let geometry =
        Geometry::from_outlines(&[Outline::outer(left), Outline::outer(right)]).unwrap();
    assert_eq!(geometry.bounded_faces().len(), 2);

    let mut triangulation = Triangulation::new(geometry);
    let triangles = triangulation.triangulate().unwrap();
    assert_eq!(triangles.len(), 2 + 3);
    assert_triangulated(triangulation.geometry(), &triangles, 4.0 + 4.0);
}

#[test]
fn invalid_diagonals_are_rejected() {
    let points = outline(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
    let mut geometry = Geometry::from_outlines(&[Outline::outer(points)]).unwrap();

    assert!(matches!(
        geometry.insert_half_edge(VertHandle(1), VertHandle(2)),
        Err(GeometryError::InvalidDiagonal { .. })
    ));
    assert!(matches!(
        geometry.insert_half_edge(VertHandle(3), VertHandle(3)),
        Err(GeometryError::InvalidDiagonal { .. })
    ));
    assert!(matches!(
        geometry.insert_half_edge(VertHandle(0), VertHandle(40)),
        Err(GeometryError::VertexNotFound(VertHandle(40)))
    ));

    geometry
        .insert_half_edge(VertHandle(0), VertHandle(2))
        .unwrap();
    // The second diagonal would cross the first one.
    assert!(matches!(
        geometry.insert_half_edge(VertHandle(1), VertHandle(3)),
        Err(GeometryError::NoCommonFace(_, _))
    ));
    geometry.validate().unwrap();
}

#[test]
fn malformed_outlines_are_rejected() {
    assert!(matches!(
        Geometry::from_outlines(&[]),
        Err(GeometryError::DegenerateOutline { .. })
    ));
    assert!(matches!(
        Geometry::from_outlines(&[Outline::outer(outline(&[(0.0, 0.0), (1.0, 1.0)]))]),
        Err(GeometryError::DegenerateOutline { index: 0, .. })
    ));
    assert!(matches!(
        Geometry::from_outlines(&[Outline::hole(outline(&[
            (0.0, 0.0),
            (1.0, 0.0),
            (0.0, 1.0)
        ]))]),
        Err(GeometryError::HoleWithoutOuter(0))
    ));
}
