//! Narrow interface between the tile core and whatever draws it.
//!
//! The core only ever uploads finished vertex lists and asks for them to be
//! drawn, plus a world-space line primitive for debug overlays.

use nalgebra::{Point2, Vector4};

use crate::data_types::TileVertex;

/// Owner of GPU vertex storage.
pub trait GeometryUploader {
    /// Handle to a vertex buffer. Dropping it releases the GPU memory.
    type VertexBuffer;

    /// Replaces the contents of `slot` with `vertices`, creating the buffer if
    /// the slot is empty. Implementations should reuse the existing buffer
    /// when it is large enough.
    fn upload_vertices(&mut self, slot: &mut Option<Self::VertexBuffer>, vertices: &[TileVertex]);
}

pub trait TileRenderer: GeometryUploader {
    fn add_line(
        &mut self,
        start: Point2<f32>,
        end: Point2<f32>,
        thickness: f32,
        color: Vector4<f32>,
        depth: f32,
    );

    /// Queues `vertex_count` vertices of `buffer` as a triangle list.
    fn draw_vertex_buffer(&mut self, buffer: &Self::VertexBuffer, vertex_count: u32);
}

/// Discards everything. Useful for headless simulation of a map where meshes
/// are built but never shown.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullRenderer;

impl GeometryUploader for NullRenderer {
    type VertexBuffer = ();

    fn upload_vertices(&mut self, slot: &mut Option<()>, _vertices: &[TileVertex]) {
        *slot = Some(());
    }
}

impl TileRenderer for NullRenderer {
    fn add_line(&mut self, _: Point2<f32>, _: Point2<f32>, _: f32, _: Vector4<f32>, _: f32) {}

    fn draw_vertex_buffer(&mut self, _buffer: &(), _vertex_count: u32) {}
}
