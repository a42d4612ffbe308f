use crate::{
    Primitive, VertexArena,
    math::{PlaneBasis, approx_eq, approx_lt},
};

impl Primitive {
    /// Whether the vertex at `vertex` lies inside this polygon, by casting a
    /// ray towards `+x` in the projected plane and counting edge crossings.
    ///
    /// Borderline points count as inside: when a cut has to decide which
    /// half keeps a point sitting on the line, keeping it is the answer
    /// that closes the mesh.
    pub fn contains_vertex(
        &self,
        vertex: usize,
        arena: &VertexArena,
        basis: PlaneBasis,
    ) -> bool {
        let Some(bbox) = self.bbox(arena) else {
            return false;
        };

        let point = arena.coords(vertex);
        if !bbox.contains_point(point, basis) {
            return false;
        }
        if self.sides().contains(&vertex) {
            return true;
        }

        let (px, py) = (point[basis.x], point[basis.y]);
        let top_y = bbox.high[basis.y];
        let mut inside = false;

        for (start, end) in self.edges() {
            let s = arena.coords(start);
            let e = arena.coords(end);
            let (sx, sy) = (s[basis.x], s[basis.y]);
            let (ex, ey) = (e[basis.x], e[basis.y]);

            // entirely left of the ray origin
            if approx_lt(sx.max(ex), px) {
                continue;
            }

            if approx_eq(sy, ey) {
                // a horizontal edge is never a crossing, but the point may
                // sit on it
                if approx_lt(px, sx.min(ex)) {
                    continue;
                }
                if approx_eq(py, sy) {
                    return true;
                }
                continue;
            }

            if approx_lt(py, sy.min(ey)) || approx_lt(sy.max(ey), py) {
                continue;
            }

            // a shared corner must only be counted once: take an edge's
            // upper endpoint only at the polygon's top
            if approx_eq(py, sy.max(ey)) && !approx_eq(sy.max(ey), top_y) {
                continue;
            }

            let ix = if approx_eq(sx, ex) {
                sx
            } else {
                sx + (py - sy) * (ex - sx) / (ey - sy)
            };

            if approx_eq(px, ix) {
                return true;
            }
            if approx_lt(px, ix) {
                inside = !inside;
            }
        }

        inside
    }

    /// Whether every corner of `other` lies inside this polygon.
    pub fn contains(
        &self,
        other: &Primitive,
        arena: &VertexArena,
        basis: PlaneBasis,
    ) -> bool {
        let (Some(outer), Some(inner)) = (self.bbox(arena), other.bbox(arena)) else {
            return false;
        };
        if !outer.contains(&inner, basis) {
            return false;
        }

        other
            .sides()
            .iter()
            .all(|&side| self.contains_vertex(side, arena, basis))
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    const XY: PlaneBasis = PlaneBasis { x: 0, y: 1, z: 2 };

    fn polygon(arena: &mut VertexArena, corners: &[Vec3]) -> Primitive {
        let mut primitive = Primitive::new();
        for &corner in corners {
            primitive.push_side(arena.add(corner)).unwrap();
        }
        primitive
    }

    fn hexagon(arena: &mut VertexArena) -> Primitive {
        polygon(
            arena,
            &[
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(6.0, 0.0, 0.0),
                Vec3::new(8.0, 3.0, 0.0),
                Vec3::new(6.0, 6.0, 0.0),
                Vec3::new(2.0, 6.0, 0.0),
                Vec3::new(0.0, 3.0, 0.0),
            ],
        )
    }

    #[test]
    fn test_own_corners_are_inside() {
        let mut arena = VertexArena::new();
        let hex = hexagon(&mut arena);

        for &side in hex.sides() {
            assert!(hex.contains_vertex(side, &arena, XY));
        }
    }

    #[test]
    fn test_interior_and_exterior_points() {
        let mut arena = VertexArena::new();
        let hex = hexagon(&mut arena);

        let inside = arena.add(Vec3::new(4.0, 3.0, 0.0));
        assert!(hex.contains_vertex(inside, &arena, XY));

        let outside = arena.add(Vec3::new(7.5, 5.5, 0.0));
        assert!(!hex.contains_vertex(outside, &arena, XY));

        let far = arena.add(Vec3::new(20.0, 3.0, 0.0));
        assert!(!hex.contains_vertex(far, &arena, XY));
    }

    #[test]
    fn test_points_on_the_boundary_are_inside() {
        let mut arena = VertexArena::new();
        let hex = hexagon(&mut arena);

        // midpoint of the bottom (horizontal) edge
        let bottom = arena.add(Vec3::new(4.0, 0.0, 0.0));
        assert!(hex.contains_vertex(bottom, &arena, XY));

        // midpoint of a sloped edge
        let sloped = arena.add(Vec3::new(7.0, 1.5, 0.0));
        assert!(hex.contains_vertex(sloped, &arena, XY));
    }

    #[test]
    fn test_point_level_with_a_corner() {
        let mut arena = VertexArena::new();
        let hex = hexagon(&mut arena);

        // level with the side corners; the crossing at their shared height
        // must be counted exactly once on each side
        let level = arena.add(Vec3::new(4.0, 3.0, 0.0));
        assert!(hex.contains_vertex(level, &arena, XY));

        let level_outside = arena.add(Vec3::new(-3.0, 3.0, 0.0));
        assert!(!hex.contains_vertex(level_outside, &arena, XY));
    }

    #[test]
    fn test_polygon_containment() {
        let mut arena = VertexArena::new();
        let hex = hexagon(&mut arena);

        let inner = polygon(
            &mut arena,
            &[
                Vec3::new(3.0, 2.0, 0.0),
                Vec3::new(5.0, 2.0, 0.0),
                Vec3::new(5.0, 4.0, 0.0),
                Vec3::new(3.0, 4.0, 0.0),
            ],
        );
        assert!(hex.contains(&inner, &arena, XY));
        assert!(!inner.contains(&hex, &arena, XY));

        let straddling = polygon(
            &mut arena,
            &[
                Vec3::new(5.0, 2.0, 0.0),
                Vec3::new(12.0, 2.0, 0.0),
                Vec3::new(12.0, 4.0, 0.0),
                Vec3::new(5.0, 4.0, 0.0),
            ],
        );
        assert!(!hex.contains(&straddling, &arena, XY));
    }
}
