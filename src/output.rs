//! OBJ emission for clipped meshes.
//!
//! The writer emits one object per [`write_object`](ObjWriter::write_object)
//! call: the used vertices in arena order, then every non-empty group as a
//! named `g` block. Vertex ids must be compact, so run
//! [`VertexArena::renumber`] (after [`VertexArena::find_duplicates`] if
//! duplicates may exist) before writing.

use std::io::{self, Write};

use itertools::Itertools;
use tracing::{debug, instrument};

use crate::{Mesh, Primitive, VertexArena};

/// How face lines reference vertices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VertexStyle {
    /// Absolute 1-based indices counted from the start of the file.
    #[default]
    Positive,
    /// Indices counted back from the most recently emitted vertex.
    Negative,
}

/// How polygons with more than three sides are emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MeshStyle {
    /// One face line per polygon.
    #[default]
    NoChange,
    /// Triangles fanned out from the first corner.
    TriangleFan,
    /// Triangles alternating between the head and tail of the corner list.
    TriangleStrip,
}

/// Streaming OBJ writer.
///
/// Multiple objects can share one writer; the vertex counters carry across
/// objects so face indices stay correct in both numbering styles.
pub struct ObjWriter<'a, W> {
    out: W,
    vertex_style: VertexStyle,
    mesh_style: MeshStyle,
    material: Option<&'a dyn Fn(u32) -> String>,
    last_colour: Option<u32>,
    vtotal: usize,
    vobject: usize,
}

impl<'a, W: Write> ObjWriter<'a, W> {
    pub fn new(out: W, vertex_style: VertexStyle, mesh_style: MeshStyle) -> Self {
        Self {
            out,
            vertex_style,
            mesh_style,
            material: None,
            last_colour: None,
            vtotal: 0,
            vobject: 0,
        }
    }

    /// Resolves colours to material names. Without a resolver, colour `n`
    /// becomes `colour_<n>`.
    pub fn with_material_names(mut self, material: &'a dyn Fn(u32) -> String) -> Self {
        self.material = Some(material);
        self
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Emits one object: its used vertices followed by every non-empty
    /// group. `rotation_pivot` marks the arena index before which the
    /// rotating-vertices banner is printed.
    #[instrument(skip(self, mesh))]
    pub fn write_object(
        &mut self,
        mesh: &Mesh,
        name: &str,
        rotation_pivot: Option<usize>,
    ) -> io::Result<()> {
        self.write_vertices(&mesh.vertices, rotation_pivot)?;

        for (index, group) in mesh.groups.iter().enumerate() {
            if group.is_empty() {
                continue;
            }
            self.write_group(mesh, index, name)?;
        }

        debug!(object = name, vertices = self.vobject, "wrote object");
        self.vtotal += self.vobject;
        self.vobject = 0;
        Ok(())
    }

    fn write_vertices(
        &mut self,
        arena: &VertexArena,
        rotation_pivot: Option<usize>,
    ) -> io::Result<()> {
        let used = (0..arena.len()).filter(|&index| arena.is_used(index)).count();
        writeln!(self.out, "# {used} vertices")?;

        for index in 0..arena.len() {
            if rotation_pivot == Some(index) {
                writeln!(self.out, "# Following vertices rotate")?;
            }
            if !arena.is_used(index) {
                continue;
            }
            let coords = arena.coords(index);
            writeln!(
                self.out,
                "v {:.6} {:.6} {:.6}",
                coords.x, coords.y, coords.z
            )?;
        }

        self.vobject = used;
        Ok(())
    }

    fn write_group(&mut self, mesh: &Mesh, group_index: usize, name: &str) -> io::Result<()> {
        let group = &mesh.groups[group_index];
        writeln!(self.out, "# {} primitives", group.len())?;
        writeln!(self.out, "g {name} {name}_{group_index}")?;

        for primitive in group.iter() {
            self.write_primitive(&mesh.vertices, primitive)?;
        }
        Ok(())
    }

    fn write_primitive(
        &mut self,
        arena: &VertexArena,
        primitive: &Primitive,
    ) -> io::Result<()> {
        if primitive.side_count() == 0 {
            return Ok(());
        }

        if self.last_colour != Some(primitive.colour) {
            let material = match self.material {
                Some(material) => material(primitive.colour),
                None => format!("colour_{}", primitive.colour),
            };
            writeln!(self.out, "usemtl {material}")?;
            self.last_colour = Some(primitive.colour);
        }

        let ids = primitive
            .sides()
            .iter()
            .map(|&side| arena.id(side))
            .collect_vec();

        match ids.len() {
            1 => writeln!(self.out, "p {}", self.face_index(ids[0])),
            2 => writeln!(
                self.out,
                "l {} {}",
                self.face_index(ids[0]),
                self.face_index(ids[1])
            ),
            3 => self.write_face(&ids),
            _ => match self.mesh_style {
                MeshStyle::NoChange => self.write_face(&ids),
                MeshStyle::TriangleFan => {
                    for s in 2..ids.len() {
                        self.write_face(&[ids[0], ids[s - 1], ids[s]])?;
                    }
                    Ok(())
                }
                MeshStyle::TriangleStrip => {
                    let count = ids.len();
                    let (mut first, mut second, mut third) = (0, 1, 2);
                    self.write_face(&[ids[first], ids[second], ids[third]])?;

                    for s in 3..count {
                        if s % 2 == 0 {
                            second = third;
                            third = 1 + s / 2;
                        } else {
                            second = first;
                            first = count - (s - 1) / 2;
                        }
                        self.write_face(&[ids[first], ids[second], ids[third]])?;
                    }
                    Ok(())
                }
            },
        }
    }

    fn write_face(&mut self, ids: &[usize]) -> io::Result<()> {
        let indices = ids.iter().map(|&id| self.face_index(id)).join(" ");
        writeln!(self.out, "f {indices}")
    }

    fn face_index(&self, id: usize) -> i64 {
        match self.vertex_style {
            VertexStyle::Positive => (1 + self.vtotal + id) as i64,
            VertexStyle::Negative => -((self.vobject - id) as i64),
        }
    }
}
