//! Renderer double that records everything the core asks of it.

use std::cell::Cell;
use std::rc::Rc;

use nalgebra::{Point2, Vector4};

use crate::data_types::TileVertex;
use crate::renderer::{GeometryUploader, TileRenderer};

#[derive(Debug)]
pub struct RecordedBuffer {
    pub id: usize,
    pub vertices: Vec<TileVertex>,
    released: Rc<Cell<usize>>,
}

impl Drop for RecordedBuffer {
    fn drop(&mut self) {
        self.released.set(self.released.get() + 1);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecordedLine {
    pub start: Point2<f32>,
    pub end: Point2<f32>,
    pub thickness: f32,
    pub color: Vector4<f32>,
    pub depth: f32,
}

#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub buffers_created: usize,
    pub uploads: usize,
    pub lines: Vec<RecordedLine>,
    /// `(buffer id, vertex count)` per draw call.
    pub draws: Vec<(usize, u32)>,
    released: Rc<Cell<usize>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffers_released(&self) -> usize {
        self.released.get()
    }
}

impl GeometryUploader for RecordingRenderer {
    type VertexBuffer = RecordedBuffer;

    fn upload_vertices(&mut self, slot: &mut Option<RecordedBuffer>, vertices: &[TileVertex]) {
        self.uploads += 1;
        match slot {
            Some(buffer) => {
                buffer.vertices.clear();
                buffer.vertices.extend_from_slice(vertices);
            }
            None => {
                *slot = Some(RecordedBuffer {
                    id: self.buffers_created,
                    vertices: vertices.to_vec(),
                    released: self.released.clone(),
                });
                self.buffers_created += 1;
            }
        }
    }
}

impl TileRenderer for RecordingRenderer {
    fn add_line(
        &mut self,
        start: Point2<f32>,
        end: Point2<f32>,
        thickness: f32,
        color: Vector4<f32>,
        depth: f32,
    ) {
        self.lines.push(RecordedLine {
            start,
            end,
            thickness,
            color,
            depth,
        });
    }

    fn draw_vertex_buffer(&mut self, buffer: &RecordedBuffer, vertex_count: u32) {
        self.draws.push((buffer.id, vertex_count));
    }
}
