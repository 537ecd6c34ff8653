/// Grid position of a chunk in chunk-space coordinates.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug, Default, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Packs the coordinate into a map key. See [`chunk_key`].
    pub const fn key(self) -> u64 {
        chunk_key(self.x, self.y)
    }

    pub const fn from_key(key: u64) -> Self {
        Self {
            x: (key >> 32) as u32 as i32,
            y: key as u32 as i32,
        }
    }

    /// Chunk containing the world tile `(tile_x, tile_y)`, plus the tile's
    /// local position inside it. Negative tiles round towards negative
    /// infinity so `-1` lands in chunk `-1`, not chunk `0`.
    pub fn from_world_tile(tile_x: i64, tile_y: i64, chunk_width: u32, chunk_height: u32) -> (Self, u32, u32) {
        let (w, h) = (chunk_width as i64, chunk_height as i64);
        let coord = Self::new(tile_x.div_euclid(w) as i32, tile_y.div_euclid(h) as i32);
        (coord, tile_x.rem_euclid(w) as u32, tile_y.rem_euclid(h) as u32)
    }

    /// True if the coordinate lies in the inclusive rectangle.
    pub fn within(self, min: ChunkCoord, max: ChunkCoord) -> bool {
        self.x >= min.x && self.x <= max.x && self.y >= min.y && self.y <= max.y
    }
}

impl From<(i32, i32)> for ChunkCoord {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Packs a chunk coordinate into a 64-bit key: high 32 bits are `x`, low 32
/// bits are `y`, both reinterpreted as unsigned first so negative values do
/// not sign-extend over each other.
pub const fn chunk_key(x: i32, y: i32) -> u64 {
    ((x as u32 as u64) << 32) | (y as u32 as u64)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn key_layout() {
        assert_eq!(chunk_key(0, 0), 0);
        assert_eq!(chunk_key(1, 2), 0x0000_0001_0000_0002);
        assert_eq!(chunk_key(-1, 0), 0xFFFF_FFFF_0000_0000);
        assert_eq!(chunk_key(0, -1), 0x0000_0000_FFFF_FFFF);
    }

    #[test]
    fn key_is_injective_around_origin() {
        let mut seen = HashSet::new();
        for x in -20..=20 {
            for y in -20..=20 {
                assert!(seen.insert(chunk_key(x, y)), "collision at ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn key_round_trips_extremes() {
        for (x, y) in [
            (i32::MIN, i32::MAX),
            (i32::MAX, i32::MIN),
            (-1, -1),
            (i32::MIN, 0),
            (0, i32::MIN),
        ] {
            assert_eq!(ChunkCoord::from_key(chunk_key(x, y)), ChunkCoord::new(x, y));
        }
        assert_ne!(chunk_key(-1, 0), chunk_key(0, -1));
    }

    #[test]
    fn world_tile_floor_division() {
        assert_eq!(ChunkCoord::from_world_tile(0, 0, 16, 16), (ChunkCoord::new(0, 0), 0, 0));
        assert_eq!(ChunkCoord::from_world_tile(17, 31, 16, 16), (ChunkCoord::new(1, 1), 1, 15));
        assert_eq!(ChunkCoord::from_world_tile(-1, -16, 16, 16), (ChunkCoord::new(-1, -1), 15, 0));
        assert_eq!(ChunkCoord::from_world_tile(-17, 5, 16, 8), (ChunkCoord::new(-2, 0), 15, 5));
    }
}
