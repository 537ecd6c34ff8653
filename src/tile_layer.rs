use crate::tile::Tile;

/// One plane of tiles (ground, decoration, collision...) inside a chunk.
///
/// Tiles are stored row-major, `index = y * width + x`.
#[derive(Clone, Debug)]
pub struct TileLayer {
    tiles: Vec<Tile>,
    width: u32,
    height: u32,
}

impl TileLayer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            tiles: vec![Tile::default(); width as usize * height as usize],
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        // hot path, release builds only get the slice bounds check
        debug_assert!(
            x < self.width && y < self.height,
            "tile ({}, {}) outside {}x{} layer",
            x,
            y,
            self.width,
            self.height
        );
        (y * self.width + x) as usize
    }

    #[inline]
    pub fn tile(&self, x: u32, y: u32) -> Tile {
        self.tiles[self.index(x, y)]
    }

    #[inline]
    pub fn tile_mut(&mut self, x: u32, y: u32) -> &mut Tile {
        let index = self.index(x, y);
        &mut self.tiles[index]
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tiles_mut(&mut self) -> &mut [Tile] {
        &mut self.tiles
    }

    /// Iterates `(x, y, tile)` in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, Tile)> + '_ {
        let width = self.width;
        self.tiles
            .iter()
            .enumerate()
            .map(move |(i, tile)| (i as u32 % width, i as u32 / width, *tile))
    }
}
