use thiserror::Error;

use crate::{MAX_SIDES, MAX_SPLITS};

/// Failures surfaced by clipping and mesh construction.
///
/// Degenerate geometry (points, lines, polygons without a definable normal)
/// is not an error: the clipper silently skips it. These variants cover the
/// cases where continuing would corrupt the mesh.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ClipError {
    /// Appending a side, or committing a split, would exceed the fixed
    /// per-polygon side capacity.
    #[error("polygon cannot take more than {} sides", MAX_SIDES)]
    TooManySides,

    /// The split budget ran out while clipping one group, which indicates a
    /// pathological input. The mesh is left in its partially clipped state.
    #[error("clipping exceeded the budget of {} splits", MAX_SPLITS)]
    SplitBudgetExhausted,

    /// A polygon with fewer than three sides or no usable bounds was asked
    /// to act in a clip.
    #[error("degenerate polygon cannot drive a clip")]
    DegenerateClipper,
}
