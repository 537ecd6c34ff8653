pub mod chunk;
pub mod common_component;
pub mod config;
pub mod coords;
pub mod data_types;
pub mod error;
pub mod game;
pub mod render_system;
pub mod renderer;
pub mod shader_library;
pub mod tile;
pub mod tile_layer;
pub mod tile_manager;
pub mod tile_map;
pub mod time;
pub mod util;

#[cfg(test)]
mod test_support;

pub use chunk::Chunk;
pub use config::TileWorldConfig;
pub use coords::{chunk_key, ChunkCoord};
pub use renderer::{GeometryUploader, NullRenderer, TileRenderer};
pub use tile::{Tile, TileFlags};
pub use tile_layer::TileLayer;
pub use tile_manager::{MapId, StreamReport, TileManager};
pub use tile_map::TileMap;
