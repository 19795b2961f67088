/// Plane-sweep decomposition into y-monotone faces, then monotone triangulation
use crate::error::GeometryError;
use crate::geometry::Geometry;
use crate::handles::{FaceHandle, HalfEdgeHandle, VertHandle};
use crate::status::{StatusNode, SweepLineStatus, is_above};
use glam::DVec2;
use tracing::{debug, info};

/// Role of a boundary vertex during the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexType {
    Start,
    End,
    Split,
    Merge,
    Regular,
}

/// Vertex event with the half-edges it had before any diagonal was added.
#[derive(Debug, Clone, Copy)]
struct SweepEvent {
    vertex: VertHandle,
    point: DVec2,
    prev_point: DVec2,
    next_point: DVec2,
    /// e_i, leaving the vertex.
    outgoing: HalfEdgeHandle,
    /// e_{i-1}, arriving at the vertex.
    incoming: HalfEdgeHandle,
    kind: VertexType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chain {
    Left,
    Right,
}

fn sweep_order(a: DVec2, b: DVec2) -> std::cmp::Ordering {
    b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x))
}

fn classify(prev: DVec2, v: DVec2, next: DVec2) -> VertexType {
    let prev_below = is_above(v, prev);
    let next_below = is_above(v, next);
    // Interior lies left of the boundary, so a right turn means an angle above pi.
    let reflex = (v - prev).perp_dot(next - v) < 0.0;
    match (prev_below, next_below) {
        (true, true) if reflex => VertexType::Split,
        (true, true) => VertexType::Start,
        (false, false) if reflex => VertexType::Merge,
        (false, false) => VertexType::End,
        _ => VertexType::Regular,
    }
}

pub struct Triangulation {
    geometry: Geometry,
}

impl Triangulation {
    pub fn new(geometry: Geometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn into_geometry(self) -> Geometry {
        self.geometry
    }

    /// Classify the origin of `half_edge` within the face the half-edge bounds.
    pub fn vertex_type(&self, half_edge: HalfEdgeHandle) -> Result<VertexType, GeometryError> {
        let event = self.event(half_edge)?;
        Ok(event.kind)
    }

    fn event(&self, outgoing: HalfEdgeHandle) -> Result<SweepEvent, GeometryError> {
        let edge = self.geometry.half_edge(outgoing)?;
        let incoming = edge.prev;
        let point = self.geometry.vertex_2d(edge.origin)?;
        let prev_point = self
            .geometry
            .vertex_2d(self.geometry.half_edge(incoming)?.origin)?;
        let next_point = self.geometry.vertex_2d(self.geometry.destination(outgoing)?)?;
        Ok(SweepEvent {
            vertex: edge.origin,
            point,
            prev_point,
            next_point,
            outgoing,
            incoming,
            kind: classify(prev_point, point, next_point),
        })
    }

    /// A face is monotone when it has no holes and no split or merge vertex.
    pub fn is_monotone(&self, face: FaceHandle) -> Result<bool, GeometryError> {
        let record = self.geometry.face(face)?;
        if !record.inner_components.is_empty() {
            return Ok(false);
        }
        for h in self.geometry.face_half_edges(face)? {
            if matches!(
                self.vertex_type(h)?,
                VertexType::Split | VertexType::Merge
            ) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Split `face` into y-monotone faces without holes.
    ///
    /// Returns `face` followed by every face created by an inserted diagonal.
    pub fn make_monotone(&mut self, face: FaceHandle) -> Result<Vec<FaceHandle>, GeometryError> {
        let mut events = self
            .geometry
            .face_half_edges(face)?
            .into_iter()
            .map(|h| self.event(h))
            .collect::<Result<Vec<_>, _>>()?;
        events.sort_by(|a, b| sweep_order(a.point, b.point));

        let mut status = SweepLineStatus::new();
        let mut faces = vec![face];
        let mut diagonals = 0;

        for event in &events {
            let v = event.vertex;
            let sweep = event.point;
            let outgoing = StatusNode::new(event.outgoing, event.point, event.next_point, v);
            let incoming = StatusNode::new(event.incoming, event.prev_point, event.point, v);

            match event.kind {
                VertexType::Start => status.insert(outgoing, sweep)?,
                VertexType::End => {
                    let closed = status.remove(&incoming, sweep)?;
                    if closed.is_merge {
                        diagonals += self.add_diagonal(v, closed.helper, &mut faces)?;
                    }
                }
                VertexType::Split => {
                    let left = left_entry(&status, event)?;
                    diagonals += self.add_diagonal(v, left.helper, &mut faces)?;
                    status.set_helper(&left, sweep, v, false)?;
                    status.insert(outgoing, sweep)?;
                }
                VertexType::Merge => {
                    let closed = status.remove(&incoming, sweep)?;
                    if closed.is_merge {
                        diagonals += self.add_diagonal(v, closed.helper, &mut faces)?;
                    }
                    let left = left_entry(&status, event)?;
                    if left.is_merge {
                        diagonals += self.add_diagonal(v, left.helper, &mut faces)?;
                    }
                    status.set_helper(&left, sweep, v, true)?;
                }
                VertexType::Regular if is_above(event.prev_point, event.point) => {
                    // Interior to the right: swap the arriving edge for the leaving one.
                    let closed = status.remove(&incoming, sweep)?;
                    if closed.is_merge {
                        diagonals += self.add_diagonal(v, closed.helper, &mut faces)?;
                    }
                    status.insert(outgoing, sweep)?;
                }
                VertexType::Regular => {
                    let left = left_entry(&status, event)?;
                    if left.is_merge {
                        diagonals += self.add_diagonal(v, left.helper, &mut faces)?;
                    }
                    status.set_helper(&left, sweep, v, false)?;
                }
            }
        }

        if !status.is_empty() {
            return Err(GeometryError::SweepStatus(format!(
                "{} edges left in the status after sweeping {face}",
                status.len()
            )));
        }

        debug!(%face, diagonals, pieces = faces.len(), "Made face monotone");
        Ok(faces)
    }

    fn add_diagonal(
        &mut self,
        from: VertHandle,
        to: VertHandle,
        faces: &mut Vec<FaceHandle>,
    ) -> Result<usize, GeometryError> {
        let diagonal = self.geometry.insert_half_edge(from, to)?;
        if let Some(face) = diagonal.new_face {
            faces.push(face);
        }
        Ok(1)
    }

    /// Cut a y-monotone face into triangles with the two-chain stack sweep.
    ///
    /// Returns `face` followed by every face created.
    pub fn triangulate_monotone(
        &mut self,
        face: FaceHandle,
    ) -> Result<Vec<FaceHandle>, GeometryError> {
        let record = self.geometry.face(face)?;
        if !record.inner_components.is_empty() || record.outer_component.is_none() {
            return Err(GeometryError::NotMonotone(face));
        }

        let vertices = self.geometry.face_outer_vertices(face)?;
        let mut faces = vec![face];
        if vertices.len() == 3 {
            return Ok(faces);
        }
        if vertices.len() < 3 {
            return Err(GeometryError::Inconsistent(format!(
                "{face} has only {} vertices",
                vertices.len()
            )));
        }

        let points = vertices
            .iter()
            .map(|&v| self.geometry.vertex_2d(v))
            .collect::<Result<Vec<_>, _>>()?;
        let n = vertices.len();
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| sweep_order(points[a], points[b]));
        let (top, bottom) = (order[0], order[n - 1]);

        // Walking forward from the top runs down the left chain of a counter-clockwise boundary.
        let mut chain = vec![Chain::Right; n];
        let mut i = top;
        while i != bottom {
            chain[i] = Chain::Left;
            i = (i + 1) % n;
        }

        let mut stack = vec![order[0], order[1]];
        for &u in &order[2..n - 1] {
            let top_of_stack = stack[stack.len() - 1];
            if chain[u] != chain[top_of_stack] {
                let popped: Vec<usize> = stack.drain(..).collect();
                for &s in popped.iter().skip(1) {
                    self.add_diagonal(vertices[u], vertices[s], &mut faces)?;
                }
                stack.push(top_of_stack);
                stack.push(u);
            } else {
                let mut last = stack.pop().unwrap_or(top_of_stack);
                while let Some(&s) = stack.last() {
                    let turn = (points[last] - points[s]).perp_dot(points[u] - points[last]);
                    let inside = match chain[u] {
                        Chain::Left => turn > 0.0,
                        Chain::Right => turn < 0.0,
                    };
                    if !inside {
                        break;
                    }
                    self.add_diagonal(vertices[u], vertices[s], &mut faces)?;
                    last = s;
                    stack.pop();
                }
                stack.push(last);
                stack.push(u);
            }
        }

        if stack.len() > 2 {
            for &s in &stack[1..stack.len() - 1] {
                self.add_diagonal(vertices[bottom], vertices[s], &mut faces)?;
            }
        }

        Ok(faces)
    }

    /// Triangulate every bounded face; returns the resulting triangles.
    pub fn triangulate(&mut self) -> Result<Vec<FaceHandle>, GeometryError> {
        let mut triangles = Vec::new();
        for face in self.geometry.bounded_faces() {
            let pieces = if self.is_monotone(face)? {
                vec![face]
            } else {
                self.make_monotone(face)?
            };
            for piece in pieces {
                triangles.extend(self.triangulate_monotone(piece)?);
            }
        }
        info!(
            triangles = triangles.len(),
            vertices = self.geometry.vertices().len(),
            "Triangulated geometry"
        );
        Ok(triangles)
    }
}

fn left_entry(status: &SweepLineStatus, event: &SweepEvent) -> Result<StatusNode, GeometryError> {
    status.left_of(event.point).ok_or_else(|| {
        GeometryError::SweepStatus(format!(
            "no edge left of {:?} vertex {}",
            event.kind, event.vertex
        ))
    })
}
