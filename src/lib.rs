//! MeshClip removes Z-fighting from polygonal meshes by clipping coplanar
//! polygons against each other.
//!
//! Two polygons lying in the same plane flicker at render time wherever they
//! overlap, because neither wins the depth test. Given groups of polygons
//! and a back-to-front render order, this crate finds coplanar overlapping
//! pairs, re-cuts the rear polygon along the front polygon's edges and
//! deletes rear pieces that end up fully covered, so decals and painted-on
//! details render cleanly.
//!
//! ## Features
//!
//! - Vertex arena with tolerant deduplication and compact output numbering
//! - Polygons of up to 15 sides with cached normals and bounding boxes
//! - Single-cut splitting that never produces zero-length edges
//! - OBJ output with absolute or relative numbering and fan/strip
//!   triangulation (see [`output`])
//!
//! ## Usage
//!
//! ```
//! use glam::Vec3;
//! use mesh_clip::Mesh;
//!
//! let mut mesh = Mesh::new();
//! let panel = mesh.add_group();
//! let decal = mesh.add_group();
//!
//! let quads = [
//!     (panel, [[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]]),
//!     (decal, [[1.0, 1.0], [3.0, 1.0], [3.0, 3.0], [1.0, 3.0]]),
//! ];
//! for (group, corners) in quads {
//!     let sides: Vec<usize> = corners
//!         .iter()
//!         .map(|&[x, y]| mesh.vertices.add(Vec3::new(x, y, 0.0)))
//!         .collect();
//!     let primitive = mesh.groups[group].add();
//!     for side in sides {
//!         primitive.push_side(side).unwrap();
//!     }
//! }
//!
//! // the panel renders behind the decal
//! let stats = mesh.clip_polygons(&[panel, decal]).unwrap();
//!
//! // the overlapped centre is gone; the panel is now a frame
//! assert_eq!(stats.splits, 4);
//! assert_eq!(stats.deletions, 1);
//! assert_eq!(mesh.groups[panel].len(), 4);
//! ```
//!
//! All coordinate comparisons are tolerant with [`math::EPS`]` = 1e-3`:
//! positions closer than that are the same position as far as this crate is
//! concerned.

mod elements;
mod error;
pub mod math;
mod ops;
pub mod output;
mod utils;

pub use elements::*;
pub use error::ClipError;
pub use ops::*;

/// A polygonal mesh: a vertex arena plus groups of primitives.
///
/// Groups partition the primitives into render-order ranks; primitives
/// reference vertices by arena index. See [`Mesh::clip_polygons`] for the
/// overlap resolution pass.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mesh {
    pub vertices: VertexArena,
    pub groups: Vec<Group>,
}

impl Mesh {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an empty group and returns its index.
    pub fn add_group(&mut self) -> usize {
        self.groups.push(Group::new());
        self.groups.len() - 1
    }

    /// Marks every vertex referenced by any group, in preparation for
    /// [`VertexArena::renumber`] and output.
    pub fn set_used(&mut self) {
        for group in &self.groups {
            group.set_used(&mut self.vertices);
        }
    }
}
