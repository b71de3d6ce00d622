use crate::coords::Vec2;

use super::Vertex;

/// Epsilon applied to the numerator and denominator terms of [`intersect`].
const EPS: f32 = 1e-12;

/// How two segments relate, as classified by [`intersect`].
///
/// The intersection point is always computed for the infinite lines; the
/// classification says where that point falls relative to the parametric
/// range [0, 1] of each segment.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LineRelation {
    /// The lines coincide. The returned point is the midpoint of `p1`-`p2`.
    Coincident,
    /// The lines are parallel and distinct. The returned point is a zero
    /// sentinel and carries no geometric meaning.
    Parallel,
    /// The intersection lies inside both segments.
    InsideBoth,
    /// The intersection lies outside segment 1 only.
    OutsideSegment1,
    /// The intersection lies outside segment 2 only.
    OutsideSegment2,
    /// The intersection lies outside both segments.
    OutsideBoth,
}

/// Intersects the infinite lines through segments (`p1`, `p2`) and
/// (`p3`, `p4`).
///
/// Classification priority: coincident, then parallel, then the in/out
/// classification of the computed point against both parametric ranges.
pub fn intersect(p1: Vec2, p2: Vec2, p3: Vec2, p4: Vec2) -> (LineRelation, Vec2) {
    let near_zero = |v: f32| -EPS < v && v < EPS;

    let denom = (p4.y - p3.y) * (p2.x - p1.x) - (p4.x - p3.x) * (p2.y - p1.y);
    let numer_a = (p4.x - p3.x) * (p1.y - p3.y) - (p4.y - p3.y) * (p1.x - p3.x);
    let numer_b = (p2.x - p1.x) * (p1.y - p3.y) - (p2.y - p1.y) * (p1.x - p3.x);

    if near_zero(numer_a) && near_zero(numer_b) && near_zero(denom) {
        return (LineRelation::Coincident, p1.midpoint(p2));
    }
    if near_zero(denom) {
        return (LineRelation::Parallel, Vec2::zero());
    }

    let mu_a = numer_a / denom;
    let mu_b = numer_b / denom;
    let point = Vec2::new(p1.x + mu_a * (p2.x - p1.x), p1.y + mu_a * (p2.y - p1.y));

    let out1 = mu_a < 0.0 || mu_a > 1.0;
    let out2 = mu_b < 0.0 || mu_b > 1.0;

    let relation = match (out1, out2) {
        (true, true) => LineRelation::OutsideBoth,
        (true, false) => LineRelation::OutsideSegment1,
        (false, true) => LineRelation::OutsideSegment2,
        (false, false) => LineRelation::InsideBoth,
    };

    (relation, point)
}

/// Ephemeral tessellation output: a vertex list plus a u16 triangle list.
///
/// Produced per draw call and consumed immediately by the canvas; never
/// retained across frames.
#[derive(Debug, Clone, Default)]
pub struct GeometryBatch {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl GeometryBatch {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Tessellates a polyline into a triangulated stroke of width
/// `2 * half_width`.
///
/// - 0 or 1 points produce an empty batch.
/// - 2 points produce a single quad (4 vertices, 2 triangles), no joints.
/// - 3 or more points produce one miter joint per vertex. For closed paths
///   every vertex is a joint; for open paths the two endpoints get no joint
///   and the stroke is pinned to the raw endpoints instead.
///
/// Each joint contributes 8 vertices and 6 triangles (two side quads plus
/// the miter fan), with indices rebased onto the running vertex count.
pub fn tessellate_polyline(points: &[Vec2], closed: bool, half_width: f32) -> GeometryBatch {
    let mut batch = GeometryBatch::default();

    match points {
        [] | [_] => {}
        [p0, p1] => emit_segment(&mut batch, *p0, *p1, half_width),
        _ => {
            let n = points.len();
            if closed {
                // Every consecutive pair wraps; every vertex is a joint.
                let midpoints: Vec<Vec2> = (0..n)
                    .map(|i| points[i].midpoint(points[(i + 1) % n]))
                    .collect();

                for i in 0..n {
                    let prev = midpoints[(i + n - 1) % n];
                    emit_joint(&mut batch, prev, points[i], midpoints[i], half_width);
                }
            } else {
                // The first and last "midpoints" are pinned to the raw
                // endpoints so the interior joints cover the whole stroke.
                let mut midpoints: Vec<Vec2> = (0..n - 1)
                    .map(|i| points[i].midpoint(points[i + 1]))
                    .collect();
                midpoints[0] = points[0];
                midpoints[n - 2] = points[n - 1];

                // One joint per interior vertex, none at the open ends.
                for i in 1..n - 1 {
                    emit_joint(&mut batch, midpoints[i - 1], points[i], midpoints[i], half_width);
                }
            }
        }
    }

    batch
}

/// Single-segment quad: two triangles offset to both sides of `p0`-`p1`.
fn emit_segment(batch: &mut GeometryBatch, p0: Vec2, p1: Vec2, half_width: f32) {
    let normal = (p1 - p0).perp();
    let length = normal.length();
    if length <= 0.0 {
        // Coincident endpoints have no defined normal; degenerate no-op.
        return;
    }
    let offset = normal / length * half_width;

    batch.vertices.extend_from_slice(&[
        Vertex::from_pos(p0 + offset), // 0
        Vertex::from_pos(p0 - offset), // 1
        Vertex::from_pos(p1 + offset), // 2
        Vertex::from_pos(p1 - offset), // 3
    ]);
    batch.indices.extend_from_slice(&[0, 2, 3, 3, 1, 0]);
}

/// Miter joint at `cur`, spanning `prev` -> `cur` -> `next`.
///
/// The outer apex is the intersection of the two offset edges; when they
/// are parallel or coincident the first edge's offset point at the vertex
/// stands in for it. The inner corner mirrors the apex through the vertex.
fn emit_joint(batch: &mut GeometryBatch, prev: Vec2, cur: Vec2, next: Vec2, half_width: f32) {
    let n0 = (cur - prev).perp();
    let n2 = (next - cur).perp();
    let n0 = n0 / n0.length();
    let n2 = n2 / n2.length();

    let t0 = prev - n0 * half_width; // 0
    let mint0 = prev + n0 * half_width; // 1
    let t2 = next - n2 * half_width; // 2
    let mint2 = next + n2 * half_width; // 3
    let at = cur - n0 * half_width; // 4
    let bt = cur - n2 * half_width; // 5

    let (relation, apex) = intersect(t0, at, t2, bt);
    let apex = match relation {
        LineRelation::Parallel | LineRelation::Coincident => at,
        _ => apex,
    }; // 6
    let inner = Vec2::new(cur.x - (apex.x - cur.x), cur.y - (apex.y - cur.y)); // 7

    let base = batch.vertices.len() as u16;
    batch.vertices.extend_from_slice(&[
        Vertex::from_pos(t0),
        Vertex::from_pos(mint0),
        Vertex::from_pos(t2),
        Vertex::from_pos(mint2),
        Vertex::from_pos(at),
        Vertex::from_pos(bt),
        Vertex::from_pos(apex),
        Vertex::from_pos(inner),
    ]);

    // Two side quads plus the miter fan.
    const JOINT_INDICES: [u16; 18] = [0, 4, 7, 0, 7, 1, 4, 6, 5, 4, 5, 7, 5, 2, 7, 2, 3, 7];
    batch
        .indices
        .extend(JOINT_INDICES.iter().map(|&i| base + i));
}
