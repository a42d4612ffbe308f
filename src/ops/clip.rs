use tracing::{debug, error, instrument};

use crate::{ClipError, Mesh, Primitive, VertexArena, math::PlaneBasis};

/// Hard ceiling on splits while clipping one group.
///
/// Exhausting it means the input is pathological; the whole run is aborted
/// rather than left grinding.
pub const MAX_SPLITS: u32 = 1024;

/// Counts reported by a successful [`Mesh::clip_polygons`] run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClipStats {
    /// Polygons cut in two.
    pub splits: u32,
    /// Fully covered polygons removed.
    pub deletions: u32,
}

impl Primitive {
    /// Cuts this polygon along the first edge of `clipper` that overlaps it,
    /// returning the severed piece.
    ///
    /// An edge qualifies when both of its endpoints lie inside this polygon
    /// or when it crosses this polygon's boundary. Only one cut is made per
    /// call so the caller can re-evaluate coverage between cuts; edges whose
    /// line merely grazes this polygon are passed over.
    #[instrument(skip(self, clipper, arena))]
    pub fn clip(
        &mut self,
        clipper: &Primitive,
        arena: &mut VertexArena,
        basis: PlaneBasis,
    ) -> Result<Option<Primitive>, ClipError> {
        if clipper.side_count() < 3 {
            return Err(ClipError::DegenerateClipper);
        }
        let (Some(bounds), Some(clipper_bounds)) = (self.bbox(arena), clipper.bbox(arena))
        else {
            return Err(ClipError::DegenerateClipper);
        };
        if !bounds.overlaps(&clipper_bounds, basis) {
            return Ok(None);
        }

        for (start, end) in clipper.edges() {
            let straddles = (self.contains_vertex(start, arena, basis)
                && self.contains_vertex(end, arena, basis))
                || self.intersected_by(start, end, arena, basis);

            if straddles && let Some(piece) = self.split(start, end, arena, basis)? {
                return Ok(Some(piece));
            }
        }

        Ok(None)
    }
}

impl Mesh {
    /// Resolves coplanar overlap between polygons, walking groups back to
    /// front.
    ///
    /// `order` lists group indices rearmost first; within a group, position
    /// is render order with the rearmost primitive first. Every polygon is
    /// clipped against the coplanar polygons in front of it: overlapped
    /// regions are cut along the front polygon's edges and pieces that end
    /// up fully covered are deleted, so nothing is left to fight for depth.
    ///
    /// The number of splits while clipping one group is capped at
    /// [`MAX_SPLITS`]; exceeding the budget abandons the run with the mesh
    /// in its partially clipped (but structurally sound) state. Running the
    /// driver on its own output is a no-op.
    #[instrument(skip(self))]
    pub fn clip_polygons(&mut self, order: &[usize]) -> Result<ClipStats, ClipError> {
        let mut stats = ClipStats::default();

        for back_position in 0..order.len() {
            self.clip_group(order, back_position, &mut stats)?;
        }

        debug!(
            splits = stats.splits,
            deletions = stats.deletions,
            "clipping finished"
        );
        Ok(stats)
    }

    /// Clips every polygon of one group against its successors in the same
    /// group and against all groups later in the render order.
    fn clip_group(
        &mut self,
        order: &[usize],
        back_position: usize,
        stats: &mut ClipStats,
    ) -> Result<(), ClipError> {
        let back_group = order[back_position];
        let mut splits = 0;
        let mut back = 0;

        while back < self.groups[back_group].len() {
            // successors in the same group render in front of `back`
            let mut deleted =
                self.clip_back_against(back_group, back, back_group, back + 1, &mut splits, stats)?;

            for front_position in back_position + 1..order.len() {
                if deleted {
                    break;
                }
                let front_group = order[front_position];
                if front_group == back_group {
                    continue;
                }
                deleted =
                    self.clip_back_against(back_group, back, front_group, 0, &mut splits, stats)?;
            }

            if deleted {
                stats.deletions += 1;
                // `back` now addresses the deleted polygon's successor
            } else {
                back += 1;
            }
        }

        Ok(())
    }

    /// Clips the polygon at `back` against the primitives of `front_group`
    /// starting at `front_start`. Returns whether the back polygon was
    /// deleted as fully covered.
    fn clip_back_against(
        &mut self,
        back_group: usize,
        back: usize,
        front_group: usize,
        front_start: usize,
        splits: &mut u32,
        stats: &mut ClipStats,
    ) -> Result<bool, ClipError> {
        let Some(basis) = self.groups[back_group][back].find_plane(&self.vertices) else {
            // points, lines and collapsed polygons cannot fight for depth
            return Ok(false);
        };

        let mut front = front_start;
        while front < self.groups[front_group].len() {
            let front_primitive = self.groups[front_group][front].clone();
            if front_primitive.side_count() < 3 {
                front += 1;
                continue;
            }
            if !front_primitive.coplanar(&self.groups[back_group][back], &self.vertices) {
                front += 1;
                continue;
            }

            let covered = loop {
                let Mesh { vertices, groups } = self;
                let back_primitive = &mut groups[back_group][back];

                if front_primitive.same_cycle(back_primitive) {
                    break true;
                }
                if front_primitive.contains(back_primitive, vertices, basis) {
                    break true;
                }

                match back_primitive.clip(&front_primitive, vertices, basis)? {
                    Some(piece) => {
                        groups[back_group].insert(back + 1, piece);
                        *splits += 1;
                        stats.splits += 1;
                        if *splits == MAX_SPLITS {
                            error!(group = back_group, "split budget exhausted");
                            return Err(ClipError::SplitBudgetExhausted);
                        }
                        if front_group == back_group {
                            // the new piece was inserted before the clipper
                            front += 1;
                        }
                    }
                    None => break false,
                }
            };

            if covered {
                let doomed = &self.groups[back_group][back];
                debug!(
                    group = back_group,
                    position = back,
                    id = doomed.id,
                    "deleting fully covered polygon"
                );
                self.groups[back_group].delete(back);
                return Ok(true);
            }

            front += 1;
        }

        Ok(false)
    }
}
