use std::time::Duration;

use log::LevelFilter;
use nalgebra::Vector4;

/// Map-wide and engine-wide settings. Defaults match a 16x16 tile chunk of
/// 16px tiles with a ground and a decoration layer.
#[derive(Clone, Debug)]
pub struct TileWorldConfig {
    pub chunk_width: u32,
    pub chunk_height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub tile_count: u32,
    pub layer_count: usize,
    pub stream_radius: i32,

    pub animation_frame_time: Duration,
    pub update_dt: Duration,
    pub frame_dt: Duration,

    pub debug_outlines: bool,
    pub outline_thickness: f32,
    pub outline_color: Vector4<f32>,

    pub log_level: LevelFilter,
}

impl Default for TileWorldConfig {
    fn default() -> Self {
        Self {
            chunk_width: 16,
            chunk_height: 16,
            tile_width: 16,
            tile_height: 16,
            tile_count: 1,
            layer_count: 2,
            stream_radius: 2,

            animation_frame_time: Duration::from_secs_f64(1.0 / 8.0),
            update_dt: Duration::from_secs_f64(1.0 / 60.0),
            frame_dt: Duration::from_secs_f64(1.0 / 60.0),

            debug_outlines: false,
            outline_thickness: 1.0,
            outline_color: Vector4::new(1.0, 1.0, 0.0, 1.0),

            log_level: LevelFilter::Info,
        }
    }
}

impl TileWorldConfig {
    pub fn with_chunk_size(mut self, width: u32, height: u32) -> Self {
        self.chunk_width = width;
        self.chunk_height = height;
        self
    }

    pub fn with_tile_size(mut self, width: u32, height: u32) -> Self {
        self.tile_width = width;
        self.tile_height = height;
        self
    }

    pub fn with_tile_count(mut self, tile_count: u32) -> Self {
        self.tile_count = tile_count;
        self
    }

    pub fn with_layer_count(mut self, layer_count: usize) -> Self {
        self.layer_count = layer_count;
        self
    }

    pub fn with_stream_radius(mut self, radius: i32) -> Self {
        self.stream_radius = radius;
        self
    }

    pub fn with_animation_frame_time(mut self, frame_time: Duration) -> Self {
        self.animation_frame_time = frame_time;
        self
    }

    pub fn with_debug_outlines(mut self, enabled: bool) -> Self {
        self.debug_outlines = enabled;
        self
    }

    pub fn with_log_level(mut self, level: LevelFilter) -> Self {
        self.log_level = level;
        self
    }

    /// Tile edge length used for mesh building, in world pixels.
    pub fn tile_size(&self) -> f32 {
        self.tile_width as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = TileWorldConfig::default()
            .with_chunk_size(8, 4)
            .with_layer_count(3)
            .with_debug_outlines(true);

        assert_eq!((config.chunk_width, config.chunk_height), (8, 4));
        assert_eq!(config.layer_count, 3);
        assert!(config.debug_outlines);
        assert_eq!(config.tile_width, 16);
    }
}
