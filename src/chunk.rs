use bytemuck::Zeroable;
use nalgebra::{Point2, Vector4};
use rand::Rng;

use crate::coords::ChunkCoord;
use crate::data_types::{push_quad, TileVertex};
use crate::renderer::GeometryUploader;
use crate::tile::{Tile, TileFlags};
use crate::tile_layer::TileLayer;

/// Depth distance between consecutive layers. Large enough that no per-tile
/// offset can reorder layers.
pub const LAYER_DEPTH_STEP: f32 = 100_000.0;

pub const VERTICES_PER_TILE: usize = 6;

/// Placeholder colour until tiles are textured: exactly one full channel,
/// picked by `type % 3`.
pub fn debug_color(tile_type: u8) -> Vector4<f32> {
    match tile_type % 3 {
        0 => Vector4::new(1.0, 0.0, 0.0, 1.0),
        1 => Vector4::new(0.0, 1.0, 0.0, 1.0),
        _ => Vector4::new(0.0, 0.0, 1.0, 1.0),
    }
}

/// `debug_color` dimmed by animation progress, so a cycling tile pulses
/// between 40% and full brightness. Alpha is left alone.
pub fn tile_color(tile: Tile) -> Vector4<f32> {
    let mut color = debug_color(tile.tile_type());
    let max = tile.anim_max();
    if tile.check_flag(TileFlags::ANIMATED) && max > 1 {
        let t = tile.anim_frame().min(max - 1) as f32 / (max - 1) as f32;
        let brightness = 1.0 - 0.6 * t;
        color.x *= brightness;
        color.y *= brightness;
        color.z *= brightness;
    }
    color
}

/// CPU copy of a chunk's geometry plus the GPU buffer it was last uploaded to.
#[derive(Debug)]
pub struct ChunkMesh<B> {
    vertices: Vec<TileVertex>,
    buffer: Option<B>,
    tile_size: f32,
}

impl<B> Default for ChunkMesh<B> {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            buffer: None,
            tile_size: 0.0,
        }
    }
}

impl<B> ChunkMesh<B> {
    pub fn vertices(&self) -> &[TileVertex] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn buffer(&self) -> Option<&B> {
        self.buffer.as_ref()
    }

    /// Tile size the mesh was last built with, 0 if never built.
    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }
}

/// Fixed-size block of tiles: an ordered layer stack (index 0 drawn first)
/// and the geometry built from it.
///
/// The chunk exclusively owns its vertex buffer, so dropping the chunk
/// releases it.
#[derive(Debug)]
pub struct Chunk<B> {
    layers: Vec<TileLayer>,
    width: u32,
    height: u32,
    coord: ChunkCoord,
    active: bool,
    mesh: ChunkMesh<B>,
}

impl<B> Chunk<B> {
    pub fn new(width: u32, height: u32, layer_count: usize, coord: ChunkCoord) -> Self {
        Self {
            layers: (0..layer_count)
                .map(|_| TileLayer::new(width, height))
                .collect(),
            width,
            height,
            coord,
            active: false,
            mesh: ChunkMesh::default(),
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layers(&self) -> &[TileLayer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&TileLayer> {
        self.layers.get(index)
    }

    pub fn layer_mut(&mut self, index: usize) -> Option<&mut TileLayer> {
        self.layers.get_mut(index)
    }

    /// Panics if `layer` does not exist. Tile bounds follow [`TileLayer::tile_mut`].
    pub fn tile_mut(&mut self, layer: usize, x: u32, y: u32) -> &mut Tile {
        self.layers[layer].tile_mut(x, y)
    }

    pub fn mesh(&self) -> &ChunkMesh<B> {
        &self.mesh
    }

    /// World tile coordinate of local tile `(x, y)`.
    pub fn world_tile(&self, x: u32, y: u32) -> (i64, i64) {
        (
            self.coord.x as i64 * self.width as i64 + x as i64,
            self.coord.y as i64 * self.height as i64 + y as i64,
        )
    }

    /// Lower-left and upper-right corners of the chunk in world units.
    pub fn world_bounds(&self, tile_size: f32) -> (Point2<f32>, Point2<f32>) {
        let (x0, y0) = self.world_tile(0, 0);
        let min = Point2::new(x0 as f32 * tile_size, y0 as f32 * tile_size);
        let max = Point2::new(
            min.x + self.width as f32 * tile_size,
            min.y + self.height as f32 * tile_size,
        );
        (min, max)
    }

    /// Rebuilds the whole chunk's geometry and uploads it, replacing the
    /// previous buffer contents. Only VISIBLE tiles produce vertices.
    pub fn build_mesh<U>(&mut self, tile_size: f32, uploader: &mut U)
    where
        U: GeometryUploader<VertexBuffer = B>,
    {
        let mut vertices = std::mem::take(&mut self.mesh.vertices);
        vertices.clear();

        for (layer_index, layer) in self.layers.iter().enumerate() {
            let depth = layer_index as f32 * LAYER_DEPTH_STEP;

            for (x, y, tile) in layer.iter() {
                if !tile.check_flag(TileFlags::VISIBLE) {
                    continue;
                }

                let (world_x, world_y) = self.world_tile(x, y);
                let min = Point2::new(world_x as f32 * tile_size, world_y as f32 * tile_size);
                let max = Point2::new(min.x + tile_size, min.y + tile_size);

                push_quad(&mut vertices, min, max, tile_color(tile), depth);
            }
        }

        if vertices.is_empty() {
            // keep a valid binding around; nothing is drawn from it
            uploader.upload_vertices(&mut self.mesh.buffer, &[TileVertex::zeroed()]);
        } else {
            uploader.upload_vertices(&mut self.mesh.buffer, &vertices);
        }

        log::trace!(
            "built chunk ({}, {}): {} vertices",
            self.coord.x,
            self.coord.y,
            vertices.len()
        );

        self.mesh.vertices = vertices;
        self.mesh.tile_size = tile_size;
    }

    /// Drops the GPU buffer and the cached vertices. Tile data is untouched.
    pub fn release_mesh(&mut self) {
        self.mesh = ChunkMesh::default();
    }

    /// Steps every animated tile one frame. Returns how many tiles changed.
    pub fn advance_animations(&mut self) -> usize {
        self.advance_animations_by(1)
    }

    /// Steps every animated tile `frames` frames. Returns the number of tile
    /// frame steps taken, i.e. animated tiles times `frames`.
    pub fn advance_animations_by(&mut self, frames: u32) -> usize {
        if frames == 0 {
            return 0;
        }
        let tiles = self
            .layers
            .iter_mut()
            .flat_map(|layer| layer.tiles_mut().iter_mut())
            .filter(|tile| tile.check_flag(TileFlags::ANIMATED))
            .map(|tile| tile.advance_animation_by(frames))
            .filter(|changed| *changed)
            .count();
        tiles.saturating_mul(frames as usize)
    }

    /// Placeholder test data: each tile of `layer` becomes visible with
    /// probability `visible_ratio` and gets a random type below `type_count`.
    pub fn fill_random<R: Rng + ?Sized>(
        &mut self,
        layer: usize,
        rng: &mut R,
        visible_ratio: f64,
        type_count: u32,
    ) {
        let type_count = type_count.max(1);
        let Some(layer) = self.layers.get_mut(layer) else {
            log::warn!("fill_random: chunk ({}, {}) has no layer {}", self.coord.x, self.coord.y, layer);
            return;
        };

        for tile in layer.tiles_mut() {
            *tile = Tile::default();
            tile.set_type(rng.gen_range(0..type_count));
            if rng.gen_bool(visible_ratio.clamp(0.0, 1.0)) {
                tile.set_flag(TileFlags::VISIBLE);
            }
        }
    }
}
