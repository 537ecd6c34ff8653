//! Packed 32-bit tile record.
//!
//! ```text
//! bits 0-7   : flags
//! bits 8-15  : type (palette index)
//! bits 16-23 : animation frame
//! bits 24-31 : animation frame count
//! ```

use bitflags::bitflags;

bitflags! {
    /// Per-tile flag bits. They live in the low byte of the tile word so they
    /// are applied to the raw value without shifting.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct TileFlags: u8 {
        const SOLID = 0x01;
        const ANIMATED = 0x02;
        const VISIBLE = 0x04;
        const FIRE = 0x08;

        // remaining bits are reserved but must survive a round trip
        const _ = !0;
    }
}

pub const FLAGS_SHIFT: u32 = 0;
pub const TYPE_SHIFT: u32 = 8;
pub const ANIM_FRAME_SHIFT: u32 = 16;
pub const ANIM_MAX_SHIFT: u32 = 24;

pub const FLAGS_MASK: u32 = 0xFF << FLAGS_SHIFT;
pub const TYPE_MASK: u32 = 0xFF << TYPE_SHIFT;
pub const ANIM_FRAME_MASK: u32 = 0xFF << ANIM_FRAME_SHIFT;
pub const ANIM_MAX_MASK: u32 = 0xFF << ANIM_MAX_SHIFT;

/// A single tile. The zero value is a valid tile: no flags, type 0.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Tile(u32);

#[inline]
fn write_field(word: u32, mask: u32, shift: u32, value: u32) -> u32 {
    (word & !mask) | ((value << shift) & mask)
}

#[inline]
fn read_field(word: u32, mask: u32, shift: u32) -> u8 {
    ((word & mask) >> shift) as u8
}

impl Tile {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn set_flag(&mut self, flag: TileFlags) {
        self.0 |= flag.bits() as u32;
    }

    #[inline]
    pub fn clear_flag(&mut self, flag: TileFlags) {
        self.0 &= !(flag.bits() as u32);
    }

    /// True if any bit of `flag` is set.
    #[inline]
    pub fn check_flag(self, flag: TileFlags) -> bool {
        self.0 & flag.bits() as u32 != 0
    }

    #[inline]
    pub fn flags(self) -> TileFlags {
        TileFlags::from_bits_retain(read_field(self.0, FLAGS_MASK, FLAGS_SHIFT))
    }

    /// Values above 255 are truncated to their low byte.
    #[inline]
    pub fn set_type(&mut self, tile_type: u32) {
        self.0 = write_field(self.0, TYPE_MASK, TYPE_SHIFT, tile_type);
    }

    #[inline]
    pub fn tile_type(self) -> u8 {
        read_field(self.0, TYPE_MASK, TYPE_SHIFT)
    }

    #[inline]
    pub fn set_anim_frame(&mut self, frame: u32) {
        self.0 = write_field(self.0, ANIM_FRAME_MASK, ANIM_FRAME_SHIFT, frame);
    }

    #[inline]
    pub fn anim_frame(self) -> u8 {
        read_field(self.0, ANIM_FRAME_MASK, ANIM_FRAME_SHIFT)
    }

    #[inline]
    pub fn set_anim_max(&mut self, max: u32) {
        self.0 = write_field(self.0, ANIM_MAX_MASK, ANIM_MAX_SHIFT, max);
    }

    #[inline]
    pub fn anim_max(self) -> u8 {
        read_field(self.0, ANIM_MAX_MASK, ANIM_MAX_SHIFT)
    }

    /// Steps the animation frame, wrapping at `anim_max`. Returns false when
    /// the tile has no frames to cycle through.
    pub fn advance_animation(&mut self) -> bool {
        self.advance_animation_by(1)
    }

    /// Steps the animation frame `steps` times at once.
    pub fn advance_animation_by(&mut self, steps: u32) -> bool {
        let max = self.anim_max() as u32;
        if max == 0 {
            return false;
        }
        let next = (self.anim_frame() as u32 + steps % max) % max;
        self.set_anim_frame(next);
        true
    }
}

impl From<u32> for Tile {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl From<Tile> for u32 {
    fn from(tile: Tile) -> Self {
        tile.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_FLAGS: [TileFlags; 4] = [
        TileFlags::SOLID,
        TileFlags::ANIMATED,
        TileFlags::VISIBLE,
        TileFlags::FIRE,
    ];

    fn busy_tile() -> Tile {
        Tile::from_raw(0xA5_5A_C3_00)
    }

    #[test]
    fn mask_table_matches_layout() {
        assert_eq!(FLAGS_MASK, 0x0000_00FF);
        assert_eq!(TYPE_MASK, 0x0000_FF00);
        assert_eq!(ANIM_FRAME_MASK, 0x00FF_0000);
        assert_eq!(ANIM_MAX_MASK, 0xFF00_0000);
        assert_eq!(FLAGS_MASK | TYPE_MASK | ANIM_FRAME_MASK | ANIM_MAX_MASK, u32::MAX);
    }

    #[test]
    fn default_tile_is_zero() {
        let tile = Tile::default();
        assert_eq!(tile.raw(), 0);
        assert_eq!(tile.tile_type(), 0);
        assert!(tile.flags().is_empty());
    }

    #[test]
    fn flag_set_and_clear_leave_other_fields_alone() {
        for flag in ALL_FLAGS {
            let mut tile = busy_tile();
            tile.set_flag(flag);
            assert!(tile.check_flag(flag));
            assert_eq!(tile.tile_type(), 0xC3);
            assert_eq!(tile.anim_frame(), 0x5A);
            assert_eq!(tile.anim_max(), 0xA5);

            tile.clear_flag(flag);
            assert!(!tile.check_flag(flag));
            assert_eq!(tile.raw(), busy_tile().raw());
        }
    }

    #[test]
    fn flags_are_independent() {
        let mut tile = Tile::default();
        tile.set_flag(TileFlags::SOLID);
        tile.set_flag(TileFlags::FIRE);
        tile.clear_flag(TileFlags::SOLID);
        assert!(tile.check_flag(TileFlags::FIRE));
        assert!(!tile.check_flag(TileFlags::SOLID));
        assert!(!tile.check_flag(TileFlags::VISIBLE));
    }

    #[test]
    fn reserved_flag_bits_survive() {
        let mut tile = Tile::default();
        tile.set_flag(TileFlags::from_bits_retain(0x80));
        assert!(tile.check_flag(TileFlags::from_bits_retain(0x80)));
        assert_eq!(tile.raw(), 0x80);
    }

    #[test]
    fn type_writes_only_type_field() {
        for value in [0u32, 1, 7, 128, 255] {
            let mut tile = busy_tile();
            tile.set_flag(TileFlags::VISIBLE);
            tile.set_type(value);
            assert_eq!(tile.tile_type() as u32, value);
            assert!(tile.check_flag(TileFlags::VISIBLE));
            assert_eq!(tile.anim_frame(), 0x5A);
            assert_eq!(tile.anim_max(), 0xA5);
        }
    }

    #[test]
    fn anim_fields_round_trip() {
        let mut tile = busy_tile();
        for value in 0..=255u32 {
            tile.set_anim_frame(value);
            tile.set_anim_max(255 - value);
            assert_eq!(tile.anim_frame() as u32, value);
            assert_eq!(tile.anim_max() as u32, 255 - value);
            assert_eq!(tile.tile_type(), 0xC3);
        }
    }

    #[test]
    fn oversized_values_truncate() {
        let mut tile = Tile::default();
        tile.set_type(0x1_23);
        assert_eq!(tile.tile_type(), 0x23);
        assert_eq!(tile.anim_frame(), 0);

        tile.set_anim_max(0xFFFF_FF07);
        assert_eq!(tile.anim_max(), 0x07);
        assert_eq!(tile.tile_type(), 0x23);
    }

    #[test]
    fn animation_wraps_at_max() {
        let mut tile = Tile::default();
        assert!(!tile.advance_animation());

        tile.set_anim_max(3);
        tile.set_anim_frame(1);
        assert!(tile.advance_animation());
        assert_eq!(tile.anim_frame(), 2);
        assert!(tile.advance_animation());
        assert_eq!(tile.anim_frame(), 0);
    }

    #[test]
    fn animation_skips_many_frames() {
        let mut tile = Tile::default();
        tile.set_anim_max(4);
        tile.set_anim_frame(3);
        assert!(tile.advance_animation_by(u32::MAX));
        // (3 + 2^32 - 1) mod 4
        assert_eq!(tile.anim_frame(), 2);
        assert!(tile.advance_animation_by(0));
        assert_eq!(tile.anim_frame(), 2);
    }
}
