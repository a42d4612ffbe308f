use glam::Vec3;
use tracing::{instrument, trace};

use crate::{
    ClipError, Primitive, VertexArena,
    elements::SideList,
    math::{self, PlaneBasis, approx_eq, approx_lt},
};

/// Projected equality of two points on the in-plane axes.
fn points_coincide(a: Vec3, b: Vec3, basis: PlaneBasis) -> bool {
    approx_eq(a[basis.x], b[basis.x]) && approx_eq(a[basis.y], b[basis.y])
}

fn in_range(value: f32, a: f32, b: f32) -> bool {
    !approx_lt(value, a.min(b)) && !approx_lt(a.max(b), value)
}

/// Whether a point on the carrier line of segment `(a, b)` lies within the
/// segment, endpoints included.
fn in_segment(point: Vec3, a: Vec3, b: Vec3, basis: PlaneBasis) -> bool {
    in_range(point[basis.x], a[basis.x], b[basis.x])
        && in_range(point[basis.y], a[basis.y], b[basis.y])
}

fn push_capped(sides: &mut SideList, vertex: usize) -> Result<(), ClipError> {
    if sides.len() == crate::MAX_SIDES {
        return Err(ClipError::TooManySides);
    }
    sides.push(vertex);
    Ok(())
}

impl Primitive {
    /// Whether the segment between vertices `a` and `b` crosses any edge of
    /// this polygon.
    ///
    /// The segment's own endpoints do not count as crossings, so a polygon
    /// that merely abuts this one edge-to-edge is not intersected. Points on
    /// this polygon's edges, corners included, do count, so a segment
    /// entering through a corner is still seen. Edges sharing a vertex
    /// index with the segment are skipped.
    pub fn intersected_by(
        &self,
        a: usize,
        b: usize,
        arena: &VertexArena,
        basis: PlaneBasis,
    ) -> bool {
        let pa = arena.coords(a);
        let pb = arena.coords(b);

        for (start, end) in self.edges() {
            if start == a || start == b || end == a || end == b {
                continue;
            }

            let ps = arena.coords(start);
            let pe = arena.coords(end);
            let Some(hit) = math::intersect(pa, pb, ps, pe, basis) else {
                continue;
            };
            if points_coincide(hit, pa, basis) || points_coincide(hit, pb, basis) {
                continue;
            }
            if in_segment(hit, pa, pb, basis) && in_segment(hit, ps, pe, basis) {
                return true;
            }
        }

        false
    }

    /// Splits this polygon along the infinite line through vertices `a` and
    /// `b`, returning the piece that was cut off.
    ///
    /// The polygon's edges are walked once; the first two line crossings
    /// open and close the cut and everything between them moves to the new
    /// piece. Crossing vertices are deduplicated against the arena and
    /// against the edge endpoints they coincide with, so a cut through a
    /// corner re-uses that corner and never produces a zero-length edge.
    ///
    /// A line that misses, merely grazes the boundary, or would leave either
    /// piece with fewer than three sides yields `Ok(None)` and the polygon
    /// is left untouched. The piece inherits colour, id and the cached
    /// normal.
    #[instrument(skip(self, arena))]
    pub fn split(
        &mut self,
        a: usize,
        b: usize,
        arena: &mut VertexArena,
        basis: PlaneBasis,
    ) -> Result<Option<Primitive>, ClipError> {
        let line_a = arena.coords(a);
        let line_b = arena.coords(b);

        let mut halves = [SideList::new(), SideList::new()];
        let mut current = 0;
        let mut crossings = 0;

        for (start, end) in self.edges() {
            let ps = arena.coords(start);
            let pe = arena.coords(end);

            let hit = if crossings < 2 {
                math::intersect(line_a, line_b, ps, pe, basis)
                    .filter(|&hit| in_segment(hit, ps, pe, basis))
                    // a hit on the start corner was handled by the previous edge
                    .filter(|&hit| !points_coincide(hit, ps, basis))
            } else {
                None
            };

            match hit {
                Some(hit) if points_coincide(hit, pe, basis) => {
                    // the cut passes through this corner; both pieces keep it
                    push_capped(&mut halves[current], end)?;
                    current ^= 1;
                    crossings += 1;
                    push_capped(&mut halves[current], end)?;
                }
                Some(hit) => {
                    let vertex = arena.find_or_add(hit);
                    push_capped(&mut halves[current], vertex)?;
                    current ^= 1;
                    crossings += 1;
                    push_capped(&mut halves[current], vertex)?;
                    push_capped(&mut halves[current], end)?;
                }
                None => push_capped(&mut halves[current], end)?,
            }
        }

        if crossings < 2 {
            return Ok(None);
        }

        let [kept, severed] = halves;
        if kept.len() < 3 || severed.len() < 3 {
            // the line only grazed the boundary; a sliver is no cut at all
            trace!(kept = kept.len(), severed = severed.len(), "abandoned grazing cut");
            return Ok(None);
        }

        let piece = Primitive::from_parts(self.colour, self.id, severed, self.cached_normal());
        self.replace_sides(kept);
        Ok(Some(piece))
    }
}
