use std::cell::Cell;

use glam::Vec3;
use smallvec::SmallVec;

use crate::{
    ClipError, VertexArena,
    math::{self, Aabb, PlaneBasis, approx_eq, vec3_approx_eq},
};

/// Maximum number of sides a primitive can carry.
///
/// A split that would push either half past this bound is a hard error so
/// the clipper can detect it locally instead of committing half a cut.
pub const MAX_SIDES: usize = 15;

pub(crate) type SideList = SmallVec<[usize; MAX_SIDES]>;

/// A closed polygon referencing its corners by vertex arena index.
///
/// Side `i` connects the vertex at `sides[i - 1]` (wrapping) to the vertex
/// at `sides[i]`. One or two sides describe a point or a line; those are
/// carried through untouched by the clipper. The plane normal and bounding
/// box are cached and recomputed lazily after any side mutation.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Primitive {
    /// Opaque colour tag resolved to a material name on output.
    pub colour: u32,
    /// Host-assigned identifier, unrelated to any group position.
    pub id: u32,
    sides: SideList,
    #[cfg_attr(feature = "serde", serde(skip))]
    normal_cache: Cell<Option<Vec3>>,
    #[cfg_attr(feature = "serde", serde(skip))]
    bbox_cache: Cell<Option<Aabb>>,
}

impl Primitive {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(
        colour: u32,
        id: u32,
        sides: SideList,
        normal: Option<Vec3>,
    ) -> Self {
        Self {
            colour,
            id,
            sides,
            normal_cache: Cell::new(normal),
            bbox_cache: Cell::new(None),
        }
    }

    /// The vertex indices of this polygon's corners, in winding order.
    #[inline]
    pub fn sides(&self) -> &[usize] {
        &self.sides
    }

    #[inline]
    pub fn side_count(&self) -> usize {
        self.sides.len()
    }

    /// Appends a corner, failing once the polygon holds [`MAX_SIDES`].
    pub fn push_side(&mut self, vertex: usize) -> Result<(), ClipError> {
        if self.sides.len() == MAX_SIDES {
            return Err(ClipError::TooManySides);
        }
        self.sides.push(vertex);
        self.invalidate_caches();
        Ok(())
    }

    /// Drops every side, leaving colour and id in place.
    pub fn clear_sides(&mut self) {
        self.sides.clear();
        self.invalidate_caches();
    }

    /// Reverses the winding, which flips the normal.
    pub fn reverse(&mut self) {
        self.sides.reverse();
        self.invalidate_caches();
    }

    /// Reverses the winding if needed so the normal points along
    /// `direction`. Returns `false` when the polygon has no normal.
    pub fn orient(&mut self, direction: Vec3, arena: &VertexArena) -> bool {
        match self.normal(arena) {
            Some(normal) => {
                if normal.dot(direction) < 0.0 {
                    self.reverse();
                }
                true
            }
            None => false,
        }
    }

    pub(crate) fn replace_sides(&mut self, sides: SideList) {
        self.sides = sides;
        self.invalidate_caches();
    }

    pub(crate) fn cached_normal(&self) -> Option<Vec3> {
        self.normal_cache.get()
    }

    fn invalidate_caches(&self) {
        self.normal_cache.set(None);
        self.bbox_cache.set(None);
    }

    /// The closed edges `(start, end)` of this polygon as vertex indices,
    /// beginning with the edge that closes the loop.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let count = self.sides.len();
        (0..count).map(move |i| (self.sides[(i + count - 1) % count], self.sides[i]))
    }

    /// Unit normal computed from the first three corners, or `None` for
    /// points, lines and collinear leading corners.
    pub fn normal(&self, arena: &VertexArena) -> Option<Vec3> {
        if let Some(normal) = self.normal_cache.get() {
            return Some(normal);
        }
        if self.sides.len() < 3 {
            return None;
        }

        let v0 = arena.coords(self.sides[0]);
        let v1 = arena.coords(self.sides[1]);
        let v2 = arena.coords(self.sides[2]);
        let normal = math::normalize((v1 - v0).cross(v2 - v1))?;

        self.normal_cache.set(Some(normal));
        Some(normal)
    }

    /// Componentwise bounds over all corners. `None` for an empty polygon.
    pub fn bbox(&self, arena: &VertexArena) -> Option<Aabb> {
        if let Some(bbox) = self.bbox_cache.get() {
            return Some(bbox);
        }

        let mut points = self.sides.iter().map(|&side| arena.coords(side));
        let first = points.next()?;
        let (low, high) = points.fold((first, first), |(low, high), point| {
            (low.min(point), high.max(point))
        });

        let bbox = Aabb { low, high };
        self.bbox_cache.set(Some(bbox));
        Some(bbox)
    }

    /// The projection basis of this polygon's plane.
    pub fn find_plane(&self, arena: &VertexArena) -> Option<PlaneBasis> {
        self.normal(arena).map(PlaneBasis::from_normal)
    }

    /// Whether `self` and `other` lie in the same plane with the same
    /// orientation.
    ///
    /// Opposite-facing polygons in one plane are back-to-back decals, not a
    /// depth conflict, so they do not count as coplanar. A point or line is
    /// coplanar with a polygon when all of its vertices lie on the
    /// polygon's plane.
    pub fn coplanar(&self, other: &Primitive, arena: &VertexArena) -> bool {
        match (self.normal(arena), other.normal(arena)) {
            (Some(normal), Some(other_normal)) => {
                if !vec3_approx_eq(normal, other_normal) {
                    return false;
                }
                let origin = arena.coords(self.sides[0]);
                let probe = arena.coords(other.sides[0]);
                approx_eq(normal.dot(probe - origin), 0.0)
            }
            (Some(normal), None) => Self::on_plane(normal, self.sides[0], other, arena),
            (None, Some(other_normal)) => {
                Self::on_plane(other_normal, other.sides[0], self, arena)
            }
            (None, None) => false,
        }
    }

    fn on_plane(
        normal: Vec3,
        origin: usize,
        degenerate: &Primitive,
        arena: &VertexArena,
    ) -> bool {
        let origin = arena.coords(origin);
        !degenerate.sides.is_empty()
            && degenerate
                .sides
                .iter()
                .all(|&side| approx_eq(normal.dot(arena.coords(side) - origin), 0.0))
    }

    /// Whether both polygons walk the same vertex cycle.
    ///
    /// Any rotation of the side sequence matches; a reversed winding does
    /// not. Two empty polygons compare equal.
    pub fn same_cycle(&self, other: &Primitive) -> bool {
        let count = self.sides.len();
        if other.sides.len() != count {
            return false;
        }
        if count == 0 {
            return true;
        }

        (0..count).any(|shift| {
            (0..count).all(|i| self.sides[i] == other.sides[(i + shift) % count])
        })
    }

    /// First side whose endpoint leaves the plane of the leading three
    /// corners, for polygons with at least four sides.
    pub fn skew_side(&self, arena: &VertexArena) -> Option<usize> {
        if self.sides.len() < 4 {
            return None;
        }
        let normal = self.normal(arena)?;
        let origin = arena.coords(self.sides[0]);

        self.sides
            .iter()
            .enumerate()
            .skip(3)
            .find(|&(_, &side)| !approx_eq(normal.dot(arena.coords(side) - origin), 0.0))
            .map(|(index, _)| index)
    }
}
