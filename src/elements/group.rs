use derive_more::{Deref, DerefMut};

use crate::{Primitive, VertexArena};

/// An ordered run of primitives sharing one render-order rank.
///
/// Position doubles as render order: the rearmost primitive comes first.
/// Primitives have no stable identity beyond their position, and inserting
/// or deleting shifts every successor, so callers address primitives by
/// index and re-index after any structural change.
#[derive(Debug, Clone, Default, Deref, DerefMut)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Group {
    primitives: Vec<Primitive>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            primitives: Vec::with_capacity(capacity),
        }
    }

    /// Appends an empty primitive and hands it out to be filled in.
    pub fn add(&mut self) -> &mut Primitive {
        self.primitives.push(Primitive::new());
        self.primitives.last_mut().expect("just pushed")
    }

    /// Inserts a primitive at `at`, shifting successors towards the front.
    pub fn insert(&mut self, at: usize, primitive: Primitive) {
        self.primitives.insert(at, primitive);
    }

    /// Removes and returns the primitive at `at`, shifting successors back.
    pub fn delete(&mut self, at: usize) -> Primitive {
        self.primitives.remove(at)
    }

    /// Drops every primitive but keeps the backing storage.
    pub fn clear(&mut self) {
        self.primitives.clear();
    }

    /// Marks every vertex referenced by any primitive in this group.
    pub fn set_used(&self, arena: &mut VertexArena) {
        for primitive in &self.primitives {
            for &side in primitive.sides() {
                arena.mark_used(side);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    #[test]
    fn test_insert_and_delete_shift_positions() {
        let mut group = Group::new();
        group.add().id = 0;
        group.add().id = 2;

        let mut middle = Primitive::new();
        middle.id = 1;
        group.insert(1, middle);

        assert_eq!(group.iter().map(|p| p.id).collect::<Vec<_>>(), [0, 1, 2]);

        let removed = group.delete(0);
        assert_eq!(removed.id, 0);
        assert_eq!(group.iter().map(|p| p.id).collect::<Vec<_>>(), [1, 2]);
    }

    #[test]
    fn test_set_used_marks_referenced_vertices() {
        let mut arena = VertexArena::new();
        let a = arena.add(Vec3::ZERO);
        let b = arena.add(Vec3::X);
        let unused = arena.add(Vec3::Y);

        let mut group = Group::new();
        let primitive = group.add();
        primitive.push_side(a).unwrap();
        primitive.push_side(b).unwrap();

        group.set_used(&mut arena);
        assert!(arena.is_used(a));
        assert!(arena.is_used(b));
        assert!(!arena.is_used(unused));
    }
}
