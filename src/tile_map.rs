use std::collections::HashMap;
use std::time::Duration;

use crate::chunk::Chunk;
use crate::config::TileWorldConfig;
use crate::coords::{chunk_key, ChunkCoord};
use crate::tile::Tile;

/// Opaque handle to an atlas texture owned by the texture loader.
pub type TextureId = u32;

/// Sparse set of chunks keyed by chunk coordinate. A missing key means the
/// chunk does not exist, not that it is empty.
#[derive(Debug)]
pub struct TileMap<B> {
    chunks: HashMap<u64, Chunk<B>>,
    chunk_width: u32,
    chunk_height: u32,
    tile_width: u32,
    tile_height: u32,
    tile_count: u32,
    atlas_texture: Option<TextureId>,
    animation_elapsed: Duration,
}

impl<B> TileMap<B> {
    pub fn new(chunk_width: u32, chunk_height: u32, tile_width: u32, tile_height: u32) -> Self {
        Self {
            chunks: HashMap::new(),
            chunk_width,
            chunk_height,
            tile_width,
            tile_height,
            tile_count: 1,
            atlas_texture: None,
            animation_elapsed: Duration::ZERO,
        }
    }

    pub fn from_config(config: &TileWorldConfig) -> Self {
        let mut map = Self::new(
            config.chunk_width,
            config.chunk_height,
            config.tile_width,
            config.tile_height,
        );
        map.tile_count = config.tile_count;
        map
    }

    pub fn with_atlas(mut self, texture: TextureId, tile_count: u32) -> Self {
        self.atlas_texture = Some(texture);
        self.tile_count = tile_count;
        self
    }

    pub fn chunk_width(&self) -> u32 {
        self.chunk_width
    }

    pub fn chunk_height(&self) -> u32 {
        self.chunk_height
    }

    pub fn tile_width(&self) -> u32 {
        self.tile_width
    }

    pub fn tile_height(&self) -> u32 {
        self.tile_height
    }

    pub fn tile_count(&self) -> u32 {
        self.tile_count
    }

    pub fn atlas_texture(&self) -> Option<TextureId> {
        self.atlas_texture
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Existing chunk at `(cx, cy)`, or a fresh zero-filled one with
    /// `layer_count` layers. The layer count of an existing chunk is never
    /// changed.
    pub fn get_or_create_chunk(&mut self, cx: i32, cy: i32, layer_count: usize) -> &mut Chunk<B> {
        let (width, height) = (self.chunk_width, self.chunk_height);
        self.chunks
            .entry(chunk_key(cx, cy))
            .or_insert_with(|| Chunk::new(width, height, layer_count, ChunkCoord::new(cx, cy)))
    }

    /// Creates the chunk if absent, otherwise does nothing.
    pub fn add_chunk(&mut self, cx: i32, cy: i32, layer_count: usize) {
        self.get_or_create_chunk(cx, cy, layer_count);
    }

    pub fn get_chunk(&self, cx: i32, cy: i32) -> Option<&Chunk<B>> {
        self.chunks.get(&chunk_key(cx, cy))
    }

    pub fn get_chunk_mut(&mut self, cx: i32, cy: i32) -> Option<&mut Chunk<B>> {
        self.chunks.get_mut(&chunk_key(cx, cy))
    }

    pub fn contains_chunk(&self, cx: i32, cy: i32) -> bool {
        self.chunks.contains_key(&chunk_key(cx, cy))
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk<B>> {
        self.chunks.values()
    }

    pub fn chunks_mut(&mut self) -> impl Iterator<Item = &mut Chunk<B>> {
        self.chunks.values_mut()
    }

    pub fn active_chunks(&self) -> impl Iterator<Item = &Chunk<B>> {
        self.chunks.values().filter(|c| c.is_active())
    }

    pub fn active_chunks_mut(&mut self) -> impl Iterator<Item = &mut Chunk<B>> {
        self.chunks.values_mut().filter(|c| c.is_active())
    }

    /// Marks every known chunk active if it lies in the inclusive window and
    /// inactive otherwise. Returns how many chunks went from active to
    /// inactive.
    pub fn deactivate_chunks_outside(&mut self, min_cx: i32, max_cx: i32, min_cy: i32, max_cy: i32) -> usize {
        let (min, max) = (ChunkCoord::new(min_cx, min_cy), ChunkCoord::new(max_cx, max_cy));
        let mut deactivated = 0;
        for chunk in self.chunks.values_mut() {
            let inside = chunk.coord().within(min, max);
            if chunk.is_active() && !inside {
                deactivated += 1;
            }
            chunk.set_active(inside);
        }
        deactivated
    }

    /// Tile at a world tile coordinate, `None` if its chunk is not allocated
    /// or has no such layer.
    pub fn tile_at(&self, layer: usize, tile_x: i64, tile_y: i64) -> Option<Tile> {
        let (coord, x, y) =
            ChunkCoord::from_world_tile(tile_x, tile_y, self.chunk_width, self.chunk_height);
        self.get_chunk(coord.x, coord.y)?
            .layer(layer)
            .map(|l| l.tile(x, y))
    }

    pub fn tile_at_mut(&mut self, layer: usize, tile_x: i64, tile_y: i64) -> Option<&mut Tile> {
        let (coord, x, y) =
            ChunkCoord::from_world_tile(tile_x, tile_y, self.chunk_width, self.chunk_height);
        self.get_chunk_mut(coord.x, coord.y)?
            .layer_mut(layer)
            .map(|l| l.tile_mut(x, y))
    }

    /// Adds `dt` to the animation clock and returns how many whole frames of
    /// `frame_time` have elapsed, keeping the remainder.
    pub(crate) fn take_animation_frames(&mut self, dt: Duration, frame_time: Duration) -> u32 {
        if frame_time.is_zero() {
            return 0;
        }
        let elapsed = self.animation_elapsed.saturating_add(dt).as_nanos();
        let frame_nanos = frame_time.as_nanos();
        let remainder = (elapsed % frame_nanos) as u64;
        self.animation_elapsed = Duration::from_nanos(remainder);
        u32::try_from(elapsed / frame_nanos).unwrap_or(u32::MAX)
    }

    /// Drops every chunk and its GPU buffer.
    pub fn clear(&mut self) {
        self.chunks.clear();
    }
}
