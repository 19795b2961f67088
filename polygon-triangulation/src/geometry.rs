/// Handle-based doubly connected edge list for planar polygons with holes
use crate::error::GeometryError;
use crate::handles::{FaceHandle, HalfEdgeHandle, VertHandle};
use glam::{DVec2, DVec3};
use std::collections::HashSet;
use std::f64::consts::TAU;
use tracing::debug;

const AREA_EPSILON: f64 = 1e-12;

/// Closed polygon boundary used to build a [`Geometry`].
#[derive(Debug, Clone, PartialEq)]
pub struct Outline {
    pub points: Vec<DVec3>,
    pub is_outer: bool,
}

impl Outline {
    pub fn outer(points: Vec<DVec3>) -> Self {
        Self {
            points,
            is_outer: true,
        }
    }

    pub fn hole(points: Vec<DVec3>) -> Self {
        Self {
            points,
            is_outer: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub handle: VertHandle,
    pub coord: DVec3,
    /// Any half-edge starting at this vertex.
    pub incident_half_edge: HalfEdgeHandle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HalfEdge {
    pub handle: HalfEdgeHandle,
    pub origin: VertHandle,
    pub twin: HalfEdgeHandle,
    pub next: HalfEdgeHandle,
    pub prev: HalfEdgeHandle,
    pub incident_face: FaceHandle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Face {
    pub handle: FaceHandle,
    /// One half-edge of the outer boundary; `None` only for the unbounded face.
    pub outer_component: Option<HalfEdgeHandle>,
    /// One half-edge per hole boundary.
    pub inner_components: Vec<HalfEdgeHandle>,
}

/// Result of [`Geometry::insert_half_edge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diagonal {
    /// Half-edge running from the first to the second endpoint.
    pub half_edge: HalfEdgeHandle,
    pub twin: HalfEdgeHandle,
    /// Face created when the diagonal split a boundary cycle in two.
    pub new_face: Option<FaceHandle>,
}

/// Orthonormal frame of the polygon plane.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PlaneBasis {
    normal: DVec3,
    u: DVec3,
    v: DVec3,
}

impl PlaneBasis {
    fn from_normal(normal: DVec3) -> Self {
        let flip = normal.z < 0.0
            || (normal.z == 0.0 && (normal.y < 0.0 || (normal.y == 0.0 && normal.x < 0.0)));
        let normal = if flip { -normal } else { normal };

        let reference = if normal.x.abs() < 0.9 {
            DVec3::X
        } else {
            DVec3::Y
        };
        let u = (reference - normal * reference.dot(normal)).normalize();
        let v = normal.cross(u);
        Self { normal, u, v }
    }

    fn reduce(&self, coord: DVec3) -> DVec2 {
        DVec2::new(coord.dot(self.u), coord.dot(self.v))
    }
}

/// Outer outlines are stored counter-clockwise and holes clockwise with respect to the
/// plane normal, so the interior of a bounded face always lies left of its half-edges.
/// Every boundary half-edge has a twin on the unbounded face.
#[derive(Debug, Clone)]
pub struct Geometry {
    vertices: Vec<Vertex>,
    half_edges: Vec<HalfEdge>,
    faces: Vec<Face>,
    basis: PlaneBasis,
}

impl Geometry {
    /// Build the DCEL of one or more planar outlines.
    ///
    /// The plane is taken from the first outer outline. Each outer outline becomes a
    /// bounded face; each hole is attached to the smallest outer outline containing it.
    pub fn from_outlines(outlines: &[Outline]) -> Result<Self, GeometryError> {
        if outlines.is_empty() {
            return Err(GeometryError::DegenerateOutline {
                index: 0,
                reason: "no outlines given".into(),
            });
        }

        let mut cleaned = outlines
            .iter()
            .enumerate()
            .map(|(index, outline)| clean_outline(index, &outline.points))
            .collect::<Result<Vec<_>, _>>()?;

        let first_outer = match outlines.iter().position(|o| o.is_outer) {
            Some(index) => index,
            None => return Err(GeometryError::HoleWithoutOuter(0)),
        };

        let normal = newell_normal(&cleaned[first_outer]);
        if normal.length_squared() <= AREA_EPSILON * AREA_EPSILON {
            return Err(GeometryError::DegenerateOutline {
                index: first_outer,
                reason: "outline encloses no area".into(),
            });
        }
        let basis = PlaneBasis::from_normal(normal.normalize());

        let mut projected: Vec<Vec<DVec2>> = Vec::with_capacity(cleaned.len());
        for (index, points) in cleaned.iter_mut().enumerate() {
            let mut reduced: Vec<DVec2> = points.iter().map(|&p| basis.reduce(p)).collect();
            let area = signed_area(&reduced);
            if area.abs() <= AREA_EPSILON {
                return Err(GeometryError::DegenerateOutline {
                    index,
                    reason: "outline encloses no area".into(),
                });
            }
            if (outlines[index].is_outer && area < 0.0) || (!outlines[index].is_outer && area > 0.0)
            {
                points.reverse();
                reduced.reverse();
            }
            projected.push(reduced);
        }

        let mut geometry = Geometry {
            vertices: Vec::new(),
            half_edges: Vec::new(),
            faces: vec![Face {
                handle: FaceHandle::UNBOUNDED,
                outer_component: None,
                inner_components: Vec::new(),
            }],
            basis,
        };

        let mut face_of_outline = vec![FaceHandle::UNBOUNDED; outlines.len()];
        for (index, outline) in outlines.iter().enumerate() {
            if outline.is_outer {
                face_of_outline[index] = geometry.push_face(None);
            }
        }
        for (index, outline) in outlines.iter().enumerate() {
            if outline.is_outer {
                continue;
            }
            let probe = projected[index][0];
            let container = outlines
                .iter()
                .enumerate()
                .filter(|(j, o)| o.is_outer && point_in_polygon(probe, &projected[*j]))
                .min_by(|(a, _), (b, _)| {
                    signed_area(&projected[*a]).total_cmp(&signed_area(&projected[*b]))
                })
                .map(|(j, _)| j)
                .ok_or(GeometryError::HoleWithoutOuter(index))?;
            face_of_outline[index] = face_of_outline[container];
        }

        for (index, outline) in outlines.iter().enumerate() {
            let face = face_of_outline[index];
            let first = geometry.push_cycle(&cleaned[index], face);
            let twin = geometry.half_edges[first.0].twin;
            if outline.is_outer {
                geometry.faces[face.0].outer_component = Some(first);
            } else {
                geometry.faces[face.0].inner_components.push(first);
            }
            geometry.faces[0].inner_components.push(twin);
        }

        debug!(
            vertices = geometry.vertices.len(),
            faces = geometry.faces.len(),
            "Built DCEL from {} outlines",
            outlines.len()
        );
        Ok(geometry)
    }

    fn push_face(&mut self, outer_component: Option<HalfEdgeHandle>) -> FaceHandle {
        let handle = FaceHandle(self.faces.len());
        self.faces.push(Face {
            handle,
            outer_component,
            inner_components: Vec::new(),
        });
        handle
    }

    /// Append one closed boundary; returns the half-edge leaving its first vertex.
    fn push_cycle(&mut self, points: &[DVec3], face: FaceHandle) -> HalfEdgeHandle {
        let n = points.len();
        let v0 = self.vertices.len();
        let h0 = self.half_edges.len();
        let inner = |i: usize| HalfEdgeHandle(h0 + 2 * i);
        let outer = |i: usize| HalfEdgeHandle(h0 + 2 * i + 1);

        for (i, &coord) in points.iter().enumerate() {
            self.vertices.push(Vertex {
                handle: VertHandle(v0 + i),
                coord,
                incident_half_edge: inner(i),
            });
        }
        for i in 0..n {
            let next = (i + 1) % n;
            let prev = (i + n - 1) % n;
            self.half_edges.push(HalfEdge {
                handle: inner(i),
                origin: VertHandle(v0 + i),
                twin: outer(i),
                next: inner(next),
                prev: inner(prev),
                incident_face: face,
            });
            self.half_edges.push(HalfEdge {
                handle: outer(i),
                origin: VertHandle(v0 + next),
                twin: inner(i),
                next: outer(prev),
                prev: outer(next),
                incident_face: FaceHandle::UNBOUNDED,
            });
        }
        inner(0)
    }

    pub fn vertex(&self, handle: VertHandle) -> Result<&Vertex, GeometryError> {
        self.vertices
            .get(handle.0)
            .ok_or(GeometryError::VertexNotFound(handle))
    }

    pub fn half_edge(&self, handle: HalfEdgeHandle) -> Result<&HalfEdge, GeometryError> {
        self.half_edges
            .get(handle.0)
            .ok_or(GeometryError::HalfEdgeNotFound(handle))
    }

    pub fn face(&self, handle: FaceHandle) -> Result<&Face, GeometryError> {
        self.faces
            .get(handle.0)
            .ok_or(GeometryError::FaceNotFound(handle))
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn half_edges(&self) -> &[HalfEdge] {
        &self.half_edges
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Every face except the unbounded one.
    pub fn bounded_faces(&self) -> Vec<FaceHandle> {
        self.faces.iter().skip(1).map(|f| f.handle).collect()
    }

    /// Unit normal of the polygon plane.
    pub fn normal(&self) -> DVec3 {
        self.basis.normal
    }

    /// Project a coordinate onto the polygon plane.
    pub fn reduce_2d(&self, coord: DVec3) -> DVec2 {
        self.basis.reduce(coord)
    }

    pub fn vertex_2d(&self, handle: VertHandle) -> Result<DVec2, GeometryError> {
        Ok(self.reduce_2d(self.vertex(handle)?.coord))
    }

    /// Vertex a half-edge points to.
    pub fn destination(&self, handle: HalfEdgeHandle) -> Result<VertHandle, GeometryError> {
        let twin = self.half_edge(handle)?.twin;
        Ok(self.half_edge(twin)?.origin)
    }

    /// Half-edges of the cycle containing `start`, beginning with `start`.
    pub fn edge_loop(&self, start: HalfEdgeHandle) -> Result<Vec<HalfEdgeHandle>, GeometryError> {
        let mut cycle = Vec::new();
        let mut current = start;
        loop {
            cycle.push(current);
            current = self.half_edge(current)?.next;
            if current == start {
                return Ok(cycle);
            }
            if cycle.len() > self.half_edges.len() {
                return Err(GeometryError::Inconsistent(format!(
                    "cycle through {start} does not close"
                )));
            }
        }
    }

    /// Boundary cycles of a face, outer boundary first.
    pub fn face_cycles(&self, face: FaceHandle) -> Result<Vec<Vec<HalfEdgeHandle>>, GeometryError> {
        let record = self.face(face)?;
        record
            .outer_component
            .iter()
            .chain(record.inner_components.iter())
            .map(|&start| self.edge_loop(start))
            .collect()
    }

    pub fn face_half_edges(&self, face: FaceHandle) -> Result<Vec<HalfEdgeHandle>, GeometryError> {
        Ok(self.face_cycles(face)?.into_iter().flatten().collect())
    }

    /// Origins of every boundary half-edge of a face: outer cycle, then holes.
    pub fn face_vertices(&self, face: FaceHandle) -> Result<Vec<VertHandle>, GeometryError> {
        self.face_half_edges(face)?
            .into_iter()
            .map(|h| Ok(self.half_edge(h)?.origin))
            .collect()
    }

    /// Vertices of the outer cycle of a face only.
    pub fn face_outer_vertices(&self, face: FaceHandle) -> Result<Vec<VertHandle>, GeometryError> {
        let Some(start) = self.face(face)?.outer_component else {
            return Ok(Vec::new());
        };
        self.edge_loop(start)?
            .into_iter()
            .map(|h| Ok(self.half_edge(h)?.origin))
            .collect()
    }

    /// Outgoing half-edges of a vertex, rotating through `twin(prev(e))`.
    pub fn half_edges_starting_at(
        &self,
        vertex: VertHandle,
    ) -> Result<Vec<HalfEdgeHandle>, GeometryError> {
        let start = self.vertex(vertex)?.incident_half_edge;
        let mut outgoing = Vec::new();
        let mut current = start;
        loop {
            if self.half_edge(current)?.origin != vertex {
                return Err(GeometryError::Inconsistent(format!(
                    "{current} does not start at {vertex}"
                )));
            }
            outgoing.push(current);
            let prev = self.half_edge(current)?.prev;
            current = self.half_edge(prev)?.twin;
            if current == start {
                return Ok(outgoing);
            }
            if outgoing.len() > self.half_edges.len() {
                return Err(GeometryError::Inconsistent(format!(
                    "edges around {vertex} do not close"
                )));
            }
        }
    }

    /// Signed area of a face in the polygon plane (holes subtract).
    pub fn face_area(&self, face: FaceHandle) -> Result<f64, GeometryError> {
        let mut area = 0.0;
        for cycle in self.face_cycles(face)? {
            area += signed_area(&self.cycle_points(&cycle)?);
        }
        Ok(area)
    }

    fn cycle_points(&self, cycle: &[HalfEdgeHandle]) -> Result<Vec<DVec2>, GeometryError> {
        cycle
            .iter()
            .map(|&h| self.vertex_2d(self.half_edge(h)?.origin))
            .collect()
    }

    /// Outgoing half-edge at `vertex` whose face wedge contains `direction`.
    fn wedge_edge(
        &self,
        vertex: VertHandle,
        direction: DVec2,
    ) -> Result<Option<HalfEdgeHandle>, GeometryError> {
        let origin = self.vertex_2d(vertex)?;
        for h in self.half_edges_starting_at(vertex)? {
            let edge = self.half_edge(h)?;
            if edge.incident_face.is_unbounded() {
                continue;
            }
            let out_dir = self.vertex_2d(self.destination(h)?)? - origin;
            let in_dir = self.vertex_2d(self.half_edge(edge.prev)?.origin)? - origin;
            let wedge = ccw_angle(out_dir, in_dir);
            let angle = ccw_angle(out_dir, direction);
            if angle > 0.0 && angle < wedge {
                return Ok(Some(h));
            }
        }
        Ok(None)
    }

    /// Insert the edge `p -> q` and its twin inside the face both vertices bound.
    ///
    /// When `p` and `q` lie on the same boundary cycle the face is split: the existing
    /// face keeps the `p -> q` side and a new face receives the `q -> p` side together
    /// with any holes it encloses. When they lie on different cycles (outer boundary and
    /// a hole, or two holes) the cycles are joined and no face is created.
    pub fn insert_half_edge(
        &mut self,
        p: VertHandle,
        q: VertHandle,
    ) -> Result<Diagonal, GeometryError> {
        let p2 = self.vertex_2d(p)?;
        let q2 = self.vertex_2d(q)?;
        if p == q {
            return Err(GeometryError::InvalidDiagonal {
                p,
                q,
                reason: "endpoints are the same vertex",
            });
        }
        if p2 == q2 {
            return Err(GeometryError::InvalidDiagonal {
                p,
                q,
                reason: "endpoints coincide",
            });
        }
        for h in self.half_edges_starting_at(p)? {
            if self.destination(h)? == q {
                return Err(GeometryError::InvalidDiagonal {
                    p,
                    q,
                    reason: "vertices are already adjacent",
                });
            }
        }

        let (hp, hq) = match (self.wedge_edge(p, q2 - p2)?, self.wedge_edge(q, p2 - q2)?) {
            (Some(hp), Some(hq))
                if self.half_edges[hp.0].incident_face == self.half_edges[hq.0].incident_face =>
            {
                (hp, hq)
            }
            _ => return Err(GeometryError::NoCommonFace(p, q)),
        };
        let face = self.half_edges[hp.0].incident_face;

        let cycle_p = self.edge_loop(hp)?;
        let same_cycle = cycle_p.contains(&hq);
        let cycle_q = if same_cycle {
            Vec::new()
        } else {
            self.edge_loop(hq)?
        };

        let a = self.half_edges[hp.0].prev;
        let b = self.half_edges[hq.0].prev;
        let e1 = HalfEdgeHandle(self.half_edges.len());
        let e2 = HalfEdgeHandle(self.half_edges.len() + 1);

        self.half_edges.push(HalfEdge {
            handle: e1,
            origin: p,
            twin: e2,
            next: hq,
            prev: a,
            incident_face: face,
        });
        self.half_edges.push(HalfEdge {
            handle: e2,
            origin: q,
            twin: e1,
            next: hp,
            prev: b,
            incident_face: face,
        });
        self.half_edges[a.0].next = e1;
        self.half_edges[hq.0].prev = e1;
        self.half_edges[b.0].next = e2;
        self.half_edges[hp.0].prev = e2;

        let new_face = if same_cycle {
            Some(self.split_face(face, e1, e2, &cycle_p)?)
        } else {
            self.join_cycles(face, &cycle_p, &cycle_q);
            None
        };

        debug!(%p, %q, %face, ?new_face, "Inserted diagonal");
        Ok(Diagonal {
            half_edge: e1,
            twin: e2,
            new_face,
        })
    }

    fn split_face(
        &mut self,
        face: FaceHandle,
        e1: HalfEdgeHandle,
        e2: HalfEdgeHandle,
        old_cycle: &[HalfEdgeHandle],
    ) -> Result<FaceHandle, GeometryError> {
        let split_outer = self.faces[face.0]
            .outer_component
            .is_some_and(|o| old_cycle.contains(&o));

        // `kept` stays with `face` as its outer boundary or as a hole.
        let (enclosed, kept) = if split_outer {
            self.faces[face.0].outer_component = Some(e1);
            (e2, e1)
        } else {
            let area = signed_area(&self.cycle_points(&self.edge_loop(e1)?)?);
            let (enclosed, kept) = if area > 0.0 { (e1, e2) } else { (e2, e1) };
            let holes = &mut self.faces[face.0].inner_components;
            holes.retain(|h| !old_cycle.contains(h));
            holes.push(kept);
            (enclosed, kept)
        };

        let new_face = self.push_face(Some(enclosed));
        let enclosed_cycle = self.edge_loop(enclosed)?;
        for &h in &enclosed_cycle {
            self.half_edges[h.0].incident_face = new_face;
        }

        let outline = self.cycle_points(&enclosed_cycle)?;
        let holes = std::mem::take(&mut self.faces[face.0].inner_components);
        let kept_cycle = self.edge_loop(kept)?;
        let mut remaining = Vec::with_capacity(holes.len());
        for hole in holes {
            let inside = !kept_cycle.contains(&hole)
                && point_in_polygon(self.vertex_2d(self.half_edges[hole.0].origin)?, &outline);
            if inside {
                for h in self.edge_loop(hole)? {
                    self.half_edges[h.0].incident_face = new_face;
                }
                self.faces[new_face.0].inner_components.push(hole);
            } else {
                remaining.push(hole);
            }
        }
        self.faces[face.0].inner_components = remaining;

        Ok(new_face)
    }

    fn join_cycles(&mut self, face: FaceHandle, cycle_p: &[HalfEdgeHandle], cycle_q: &[HalfEdgeHandle]) {
        let outer_in_q = self.faces[face.0]
            .outer_component
            .is_some_and(|o| cycle_q.contains(&o));
        let absorbed = if outer_in_q { cycle_p } else { cycle_q };
        self.faces[face.0]
            .inner_components
            .retain(|h| !absorbed.contains(h));
    }

    /// Check every structural invariant of the DCEL.
    pub fn validate(&self) -> Result<(), GeometryError> {
        let fail = |msg: String| Err(GeometryError::Inconsistent(msg));

        for (i, edge) in self.half_edges.iter().enumerate() {
            let h = HalfEdgeHandle(i);
            if edge.handle != h {
                return fail(format!("{h} stores handle {}", edge.handle));
            }
            let next = self.half_edge(edge.next)?;
            let prev = self.half_edge(edge.prev)?;
            let twin = self.half_edge(edge.twin)?;
            if next.prev != h {
                return fail(format!("next of {h} does not point back"));
            }
            if prev.next != h {
                return fail(format!("prev of {h} does not point forward"));
            }
            if twin.twin != h || edge.twin == h {
                return fail(format!("twin of {h} is not mutual"));
            }
            if twin.origin != next.origin {
                return fail(format!("twin of {h} does not start where next starts"));
            }
            if next.incident_face != edge.incident_face {
                return fail(format!("{h} and its next lie on different faces"));
            }
            self.face(edge.incident_face)?;
        }

        for (i, vertex) in self.vertices.iter().enumerate() {
            if self.half_edge(vertex.incident_half_edge)?.origin != VertHandle(i) {
                return fail(format!("incident half-edge of v{i} starts elsewhere"));
            }
        }

        let mut seen = HashSet::with_capacity(self.half_edges.len());
        for face in &self.faces {
            if face.handle.is_unbounded() != face.outer_component.is_none() {
                return fail(format!("{} has the wrong kind of outer component", face.handle));
            }
            for cycle in self.face_cycles(face.handle)? {
                for h in cycle {
                    if self.half_edges[h.0].incident_face != face.handle {
                        return fail(format!("{h} is listed on {} but points elsewhere", face.handle));
                    }
                    if !seen.insert(h) {
                        return fail(format!("{h} belongs to two boundary components"));
                    }
                }
            }
        }
        if seen.len() != self.half_edges.len() {
            return fail(format!(
                "{} half-edges are not reachable from any face",
                self.half_edges.len() - seen.len()
            ));
        }

        Ok(())
    }
}

/// Drop repeated consecutive points and the closing duplicate.
fn clean_outline(index: usize, points: &[DVec3]) -> Result<Vec<DVec3>, GeometryError> {
    let mut cleaned: Vec<DVec3> = Vec::with_capacity(points.len());
    for &p in points {
        if cleaned.last() != Some(&p) {
            cleaned.push(p);
        }
    }
    while cleaned.len() > 1 && cleaned.first() == cleaned.last() {
        cleaned.pop();
    }
    if cleaned.len() < 3 {
        return Err(GeometryError::DegenerateOutline {
            index,
            reason: format!("{} distinct points, at least 3 required", cleaned.len()),
        });
    }
    Ok(cleaned)
}

fn newell_normal(points: &[DVec3]) -> DVec3 {
    let mut normal = DVec3::ZERO;
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }
    normal
}

pub(crate) fn signed_area(points: &[DVec2]) -> f64 {
    let mut twice = 0.0;
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        twice += a.perp_dot(b);
    }
    twice * 0.5
}

fn point_in_polygon(p: DVec2, polygon: &[DVec2]) -> bool {
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Counter-clockwise angle from `from` to `to` in `[0, 2π)`.
fn ccw_angle(from: DVec2, to: DVec2) -> f64 {
    (to.y.atan2(to.x) - from.y.atan2(from.x)).rem_euclid(TAU)
}
