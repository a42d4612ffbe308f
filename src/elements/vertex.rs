use glam::Vec3;
use tracing::{debug, instrument, trace};

use crate::math::vec3_approx_eq;

/// A corner point stored in the [`VertexArena`].
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vertex {
    /// Position in model space.
    pub coords: Vec3,
    /// Output id. Equals the arena index until [`VertexArena::renumber`] runs.
    pub(crate) id: usize,
    /// The representative this vertex duplicates, if any. Links are flat:
    /// a duplicate always points at a non-duplicate.
    pub(crate) dup: Option<usize>,
    /// Whether a surviving primitive references this vertex.
    pub(crate) marked: bool,
}

/// Append-only store of vertices referenced by primitives through indices.
///
/// Vertices are never removed; a vertex disappears from the output by not
/// being marked. [`find_duplicates`](Self::find_duplicates) collapses
/// tolerantly equal positions onto one representative and
/// [`renumber`](Self::renumber) assigns the compact output ids. Marking and
/// dedup can run in either order: marking follows duplicate links, and dedup
/// propagates existing marks onto the representative, so the representative
/// always ends up being the vertex that is emitted.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VertexArena {
    vertices: Vec<Vertex>,
}

impl VertexArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Appends a vertex unconditionally and returns its index.
    pub fn add(&mut self, coords: Vec3) -> usize {
        let index = self.vertices.len();
        self.vertices.push(Vertex {
            coords,
            id: index,
            dup: None,
            marked: false,
        });
        index
    }

    /// Finds an existing vertex tolerantly equal to `coords`.
    pub fn find(&self, coords: Vec3) -> Option<usize> {
        self.vertices
            .iter()
            .position(|vertex| vec3_approx_eq(vertex.coords, coords))
    }

    /// Finds a tolerantly equal vertex or appends a new one.
    pub fn find_or_add(&mut self, coords: Vec3) -> usize {
        match self.find(coords) {
            Some(index) => index,
            None => self.add(coords),
        }
    }

    pub fn get(&self, index: usize) -> Option<&Vertex> {
        self.vertices.get(index)
    }

    /// Position of the vertex at `index`.
    #[inline]
    pub fn coords(&self, index: usize) -> Vec3 {
        self.vertices[index].coords
    }

    /// Output id of the vertex at `index`, resolved through its duplicate
    /// link. Only meaningful for emission after [`renumber`](Self::renumber).
    pub fn id(&self, index: usize) -> usize {
        let vertex = &self.vertices[index];
        match vertex.dup {
            Some(representative) => self.vertices[representative].id,
            None => vertex.id,
        }
    }

    /// Marks the vertex at `index` (or its duplicate representative) as
    /// referenced by a surviving primitive.
    pub fn mark_used(&mut self, index: usize) {
        let target = self.vertices[index].dup.unwrap_or(index);
        self.vertices[target].marked = true;
    }

    /// Marks every vertex through its representative.
    pub fn mark_all(&mut self) {
        for index in 0..self.vertices.len() {
            self.mark_used(index);
        }
    }

    /// Whether the vertex at `index` itself will be emitted.
    #[inline]
    pub fn is_used(&self, index: usize) -> bool {
        self.vertices[index].marked
    }

    /// Collapses tolerantly equal vertices onto a single representative.
    ///
    /// The arena is viewed in lexicographic coordinate order and runs of
    /// tolerantly equal neighbours become one duplicate class whose
    /// representative is the first vertex of the run. Marks move onto the
    /// representative so duplicates are never emitted. Returns the number of
    /// vertices collapsed.
    #[instrument(skip(self))]
    pub fn find_duplicates(&mut self) -> usize {
        let mut order: Vec<usize> = (0..self.vertices.len()).collect();
        order.sort_by(|&a, &b| {
            let (va, vb) = (self.vertices[a].coords, self.vertices[b].coords);
            va.x.total_cmp(&vb.x)
                .then(va.y.total_cmp(&vb.y))
                .then(va.z.total_cmp(&vb.z))
        });

        let mut representative = match order.first() {
            Some(&index) => index,
            None => return 0,
        };
        let mut merged = 0;

        for window in order.windows(2) {
            let (previous, current) = (window[0], window[1]);
            if vec3_approx_eq(
                self.vertices[previous].coords,
                self.vertices[current].coords,
            ) {
                self.vertices[current].dup = Some(representative);
                if self.vertices[current].marked {
                    self.vertices[current].marked = false;
                    self.vertices[representative].marked = true;
                }
                merged += 1;
                trace!(duplicate = current, representative, "collapsed vertex");
            } else {
                representative = current;
            }
        }

        debug!(merged, "merged duplicate vertices");
        merged
    }

    /// Assigns compact output ids `0..` to the marked vertices in arena
    /// order and returns how many were kept. Unmarked vertices keep a stale
    /// id; they are never emitted.
    #[instrument(skip(self))]
    pub fn renumber(&mut self) -> usize {
        let mut next = 0;
        for vertex in &mut self.vertices {
            if vertex.marked {
                vertex.id = next;
                next += 1;
            }
        }

        debug!(kept = next, "renumbered vertices");
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_find() {
        let mut arena = VertexArena::new();
        let a = arena.add(Vec3::new(1.0, 2.0, 3.0));
        let b = arena.add(Vec3::new(4.0, 5.0, 6.0));

        assert_eq!(arena.len(), 2);
        assert_eq!(arena.find(Vec3::new(4.0, 5.0, 6.0)), Some(b));
        assert_eq!(arena.find(Vec3::new(4.0005, 5.0, 6.0)), Some(b));
        assert_eq!(arena.find(Vec3::new(9.0, 9.0, 9.0)), None);
        assert_eq!(arena.id(a), a);
    }

    #[test]
    fn test_find_or_add_reuses_nearby_vertices() {
        let mut arena = VertexArena::new();
        let a = arena.add(Vec3::new(1.0, 1.0, 1.0));

        assert_eq!(arena.find_or_add(Vec3::new(1.0004, 0.9996, 1.0)), a);
        assert_eq!(arena.len(), 1);

        let b = arena.find_or_add(Vec3::new(2.0, 1.0, 1.0));
        assert_eq!(arena.len(), 2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_duplicates_collapse_to_one_id() {
        let mut arena = VertexArena::new();
        let a = arena.add(Vec3::new(1.0, 1.0, 1.0));
        let b = arena.add(Vec3::new(1.0001, 0.9999, 1.0));

        assert_eq!(arena.find_duplicates(), 1);
        assert_eq!(arena.id(a), arena.id(b));

        arena.mark_used(b);
        assert_eq!(arena.renumber(), 1);
        assert_eq!(arena.id(a), 0);
        assert_eq!(arena.id(b), 0);
    }

    #[test]
    fn test_dedup_moves_marks_onto_the_representative() {
        let mut arena = VertexArena::new();
        let a = arena.add(Vec3::new(1.0, 1.0, 1.0));
        let b = arena.add(Vec3::new(1.0001, 1.0, 1.0));

        // marked before dedup ran
        arena.mark_used(b);
        arena.find_duplicates();

        assert!(arena.is_used(a));
        assert!(!arena.is_used(b));
    }

    #[test]
    fn test_marking_after_dedup_follows_the_link() {
        let mut arena = VertexArena::new();
        let a = arena.add(Vec3::new(2.0, 0.0, 0.0));
        let b = arena.add(Vec3::new(2.0001, 0.0, 0.0));

        arena.find_duplicates();
        arena.mark_used(b);

        assert!(arena.is_used(a));
        assert!(!arena.is_used(b));
    }

    #[test]
    fn test_dedup_then_id_is_idempotent() {
        let mut arena = VertexArena::new();
        let a = arena.add(Vec3::new(0.0, 0.0, 0.0));
        let b = arena.add(Vec3::new(0.0005, 0.0, 0.0));
        let c = arena.add(Vec3::new(7.0, 0.0, 0.0));

        arena.find_duplicates();
        let first = (arena.id(a), arena.id(b), arena.id(c));
        arena.find_duplicates();
        assert_eq!(first, (arena.id(a), arena.id(b), arena.id(c)));
    }

    #[test]
    fn test_renumber_is_gap_free() {
        let mut arena = VertexArena::new();
        for x in 0..5 {
            arena.add(Vec3::new(x as f32, 0.0, 0.0));
        }

        arena.mark_used(1);
        arena.mark_used(3);
        arena.mark_used(4);

        assert_eq!(arena.renumber(), 3);
        assert_eq!(arena.id(1), 0);
        assert_eq!(arena.id(3), 1);
        assert_eq!(arena.id(4), 2);
    }
}
