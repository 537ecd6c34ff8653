//! Chunk streaming, mesh building and draw submission over a set of maps.
//!
//! Per chunk the lifecycle is: unallocated -> active (entered the stream
//! window) -> inactive (left it) -> active again. Streaming never frees a
//! chunk; tile data stays resident once allocated.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::Duration;

use nalgebra::{Point2, Vector4};

use crate::chunk::LAYER_DEPTH_STEP;
use crate::config::TileWorldConfig;
use crate::coords::ChunkCoord;
use crate::renderer::{GeometryUploader, TileRenderer};
use crate::tile::TileFlags;
use crate::tile_map::TileMap;

pub type MapId = i32;

/// What a call to [`stream_chunks`] changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamReport {
    pub created: usize,
    pub activated: usize,
    pub deactivated: usize,
}

impl StreamReport {
    pub fn changed(&self) -> bool {
        self.created + self.activated + self.deactivated > 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutlineStyle {
    pub thickness: f32,
    pub color: Vector4<f32>,
}

/// Makes every chunk in the inclusive square window of `radius` around
/// `player` resident and active, and deactivates every other known chunk.
///
/// New chunks get `layer_count` layers. A negative radius yields an empty
/// window, which deactivates everything.
pub fn stream_chunks<B>(
    map: &mut TileMap<B>,
    player: ChunkCoord,
    radius: i32,
    layer_count: usize,
) -> StreamReport {
    let mut report = StreamReport::default();

    let min = ChunkCoord::new(player.x.saturating_sub(radius), player.y.saturating_sub(radius));
    let max = ChunkCoord::new(player.x.saturating_add(radius), player.y.saturating_add(radius));

    if radius >= 0 {
        for cx in min.x..=max.x {
            for cy in min.y..=max.y {
                if !map.contains_chunk(cx, cy) {
                    report.created += 1;
                }
                let chunk = map.get_or_create_chunk(cx, cy, layer_count);
                if !chunk.is_active() {
                    report.activated += 1;
                    chunk.set_active(true);
                }
            }
        }
    }

    // full scan: chunks are never evicted so this is bounded by every chunk
    // the session has touched. A negative radius leaves min > max, so
    // nothing is inside.
    report.deactivated = map.deactivate_chunks_outside(min.x, max.x, min.y, max.y);

    report
}

/// Rebuilds the mesh of every active chunk, dirty or not. Returns the number
/// of chunks rebuilt.
pub fn build_active_chunk_meshes<B, U>(map: &mut TileMap<B>, tile_size: f32, uploader: &mut U) -> usize
where
    U: GeometryUploader<VertexBuffer = B>,
{
    let mut built = 0;
    for chunk in map.active_chunks_mut() {
        chunk.build_mesh(tile_size, uploader);
        built += 1;
    }
    built
}

/// Submits every active chunk that has geometry. With `outline` set, the
/// chunk boundary is drawn on top as four lines first. Returns the number of
/// vertex buffer draws issued.
pub fn draw_tile_map<B, R>(map: &TileMap<B>, renderer: &mut R, outline: Option<&OutlineStyle>) -> usize
where
    R: TileRenderer<VertexBuffer = B>,
{
    let mut draws = 0;
    for chunk in map.active_chunks() {
        let mesh = chunk.mesh();
        if mesh.is_empty() {
            continue;
        }
        let Some(buffer) = mesh.buffer() else {
            continue;
        };

        if let Some(style) = outline {
            let (min, max) = chunk.world_bounds(mesh.tile_size());
            let depth = chunk.layer_count() as f32 * LAYER_DEPTH_STEP;
            let corners = [
                min,
                Point2::new(max.x, min.y),
                max,
                Point2::new(min.x, max.y),
            ];
            for i in 0..corners.len() {
                renderer.add_line(
                    corners[i],
                    corners[(i + 1) % corners.len()],
                    style.thickness,
                    style.color,
                    depth,
                );
            }
        }

        renderer.draw_vertex_buffer(buffer, mesh.vertex_count());
        draws += 1;
    }
    draws
}

/// Owns every tile map, addressed by integer id.
pub struct TileManager<B> {
    tile_maps: HashMap<MapId, TileMap<B>>,
    config: TileWorldConfig,
}

impl<B> TileManager<B> {
    pub fn new(config: TileWorldConfig) -> Self {
        Self {
            tile_maps: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &TileWorldConfig {
        &self.config
    }

    pub fn set_debug_outlines(&mut self, enabled: bool) {
        self.config.debug_outlines = enabled;
    }

    /// Installs `map` under `id`, dropping any map previously stored there.
    pub fn add_tile_map(&mut self, id: MapId, map: TileMap<B>) {
        if self.tile_maps.insert(id, map).is_some() {
            log::debug!("replaced tile map {}", id);
        }
    }

    pub fn get_tile_map(&self, id: MapId) -> Option<&TileMap<B>> {
        self.tile_maps.get(&id)
    }

    pub fn get_tile_map_mut(&mut self, id: MapId) -> Option<&mut TileMap<B>> {
        self.tile_maps.get_mut(&id)
    }

    /// Removes the map, releasing all of its chunks' GPU buffers.
    pub fn remove_tile_map(&mut self, id: MapId) -> Option<TileMap<B>> {
        self.tile_maps.remove(&id)
    }

    pub fn map_ids(&self) -> impl Iterator<Item = MapId> + '_ {
        self.tile_maps.keys().copied()
    }

    fn map_or_warn(&mut self, id: MapId, op: &str) -> Option<&mut TileMap<B>> {
        let map = self.tile_maps.get_mut(&id);
        if map.is_none() {
            log::warn!("{}: no tile map with id {}", op, id);
        }
        map
    }

    /// [`stream_chunks`] on map `id`, creating chunks with the configured
    /// layer count. `None` if the map does not exist.
    pub fn stream_chunks(&mut self, id: MapId, player_cx: i32, player_cy: i32, radius: i32) -> Option<StreamReport> {
        let layer_count = self.config.layer_count;
        let map = self.map_or_warn(id, "stream_chunks")?;
        let report = stream_chunks(map, ChunkCoord::new(player_cx, player_cy), radius, layer_count);

        if report.changed() {
            log::debug!(
                "map {} streamed around ({}, {}) r={}: {} created, {} activated, {} deactivated, {} resident",
                id,
                player_cx,
                player_cy,
                radius,
                report.created,
                report.activated,
                report.deactivated,
                map.chunk_count()
            );
        }
        Some(report)
    }

    pub fn build_active_chunk_meshes<U>(&mut self, id: MapId, tile_size: f32, uploader: &mut U) -> Option<usize>
    where
        U: GeometryUploader<VertexBuffer = B>,
    {
        let map = self.map_or_warn(id, "build_active_chunk_meshes")?;
        let built = build_active_chunk_meshes(map, tile_size, uploader);
        log::debug!("map {}: rebuilt {} chunk meshes", id, built);
        Some(built)
    }

    pub fn draw_tile_map<R>(&self, id: MapId, renderer: &mut R) -> Option<usize>
    where
        R: TileRenderer<VertexBuffer = B>,
    {
        let Some(map) = self.tile_maps.get(&id) else {
            log::warn!("draw_tile_map: no tile map with id {}", id);
            return None;
        };
        let style = OutlineStyle {
            thickness: self.config.outline_thickness,
            color: self.config.outline_color,
        };
        let outline = self.config.debug_outlines.then_some(&style);
        Some(draw_tile_map(map, renderer, outline))
    }

    /// Advances tile animations of the active chunks of map `id` by however
    /// many animation frames fit in the accumulated time. Returns the number
    /// of tile frame steps; the caller rebuilds meshes when it is non-zero.
    pub fn update_tile_map(&mut self, id: MapId, dt: Duration) -> Option<usize> {
        let frame_time = self.config.animation_frame_time;
        let map = self.map_or_warn(id, "update_tile_map")?;
        let frames = map.take_animation_frames(dt, frame_time);

        let stepped = map
            .active_chunks_mut()
            .map(|chunk| chunk.advance_animations_by(frames))
            .fold(0usize, usize::saturating_add);
        if stepped > 0 {
            log::trace!("map {}: {} animation steps over {} frames", id, stepped, frames);
        }
        Some(stepped)
    }

    /// Installs map 0: one chunk at the origin with layer 0 filled with
    /// visible tiles of type 1.
    pub fn generate_blank_tile_map(&mut self) -> &mut TileMap<B> {
        let mut map = TileMap::from_config(&self.config);
        let chunk = map.get_or_create_chunk(0, 0, self.config.layer_count);
        if let Some(ground) = chunk.layer_mut(0) {
            for tile in ground.tiles_mut() {
                tile.set_type(1);
                tile.set_flag(TileFlags::VISIBLE);
            }
        }

        log::info!("generated blank tile map 0");
        match self.tile_maps.entry(0) {
            Entry::Occupied(mut slot) => {
                slot.insert(map);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(map),
        }
    }
}

impl<B> Default for TileManager<B> {
    fn default() -> Self {
        Self::new(TileWorldConfig::default())
    }
}
