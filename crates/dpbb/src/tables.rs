//! GFX9 bin-size tables.
//!
//! Each table is indexed `[rb_index][se_index]` (see [`crate::CapabilityIndex`]). A subtable is a
//! list of `{start, width, height}` entries with strictly increasing `start`, terminated by a
//! sentinel whose size is `0x0`. The sentinel's `start` is the exclusive upper bound of the last
//! real entry.
//!
//! These values are hardware tuning data. New generations get new tables; existing rows must never
//! be edited.

use crate::caps::{ChipClass, TABLE_DIM};

/// Width/height of a bin in pixels. `0x0` means "do not bin".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BinSize {
    pub width: u32,
    pub height: u32,
}

impl BinSize {
    pub const ZERO: Self = Self::new(0, 0);
    /// Largest bin the hardware supports; used when depth/stencil does not constrain binning.
    pub const MAX: Self = Self::new(512, 512);

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(self) -> u32 {
        self.width * self.height
    }

    pub fn is_degenerate(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinSizeEntry {
    /// Inclusive lower bound of the workload sum for this entry.
    pub start: u32,
    pub size: BinSize,
}

const fn e(start: u32, width: u32, height: u32) -> BinSizeEntry {
    BinSizeEntry {
        start,
        size: BinSize::new(width, height),
    }
}

pub type BinSizeSubtable = &'static [BinSizeEntry];

pub type BinSizeTable = [[BinSizeSubtable; TABLE_DIM]; TABLE_DIM];

/// Tables used for color-bound binning, keyed by summed bytes per pixel.
pub static GFX9_COLOR_BIN_SIZE_TABLE: BinSizeTable = [
    // One RB / SE
    [
        // One shader engine
        &[e(0, 128, 128), e(1, 64, 128), e(2, 32, 128), e(3, 16, 128), e(17, 0, 0)],
        // Two shader engines
        &[e(0, 128, 128), e(2, 64, 128), e(3, 32, 128), e(5, 16, 128), e(17, 0, 0)],
        // Four shader engines
        &[e(0, 128, 128), e(3, 64, 128), e(5, 16, 128), e(17, 0, 0)],
    ],
    // Two RB / SE
    [
        &[e(0, 128, 128), e(2, 64, 128), e(3, 32, 128), e(9, 16, 128), e(33, 0, 0)],
        &[e(0, 128, 128), e(3, 64, 128), e(5, 32, 128), e(9, 16, 128), e(33, 0, 0)],
        &[
            e(0, 256, 256),
            e(2, 128, 256),
            e(3, 128, 128),
            e(5, 64, 128),
            e(9, 16, 128),
            e(33, 0, 0),
        ],
    ],
    // Four RB / SE
    [
        &[
            e(0, 128, 256),
            e(2, 128, 128),
            e(3, 64, 128),
            e(5, 32, 128),
            e(9, 16, 128),
            e(17, 0, 0),
        ],
        &[
            e(0, 256, 256),
            e(2, 128, 256),
            e(3, 128, 128),
            e(5, 64, 128),
            e(9, 32, 128),
            e(17, 16, 128),
            e(33, 0, 0),
        ],
        &[
            e(0, 256, 512),
            e(2, 128, 512),
            e(3, 64, 512),
            e(5, 32, 512),
            e(9, 32, 256),
            e(17, 32, 128),
            e(33, 0, 0),
        ],
    ],
];

/// Tables used for depth/stencil-bound binning.
pub static GFX9_DEPTH_BIN_SIZE_TABLE: BinSizeTable = [
    // One RB / SE
    [
        // One shader engine
        &[
            e(0, 64, 512),
            e(2, 64, 256),
            e(4, 64, 128),
            e(7, 32, 128),
            e(13, 16, 128),
            e(49, 0, 0),
        ],
        // Two shader engines
        &[
            e(0, 128, 512),
            e(2, 64, 512),
            e(4, 64, 256),
            e(7, 64, 128),
            e(13, 32, 128),
            e(25, 16, 128),
            e(49, 0, 0),
        ],
        // Four shader engines
        &[
            e(0, 256, 512),
            e(2, 128, 512),
            e(4, 64, 512),
            e(7, 64, 256),
            e(13, 64, 128),
            e(25, 16, 128),
            e(49, 0, 0),
        ],
    ],
    // Two RB / SE
    [
        &[
            e(0, 128, 512),
            e(2, 64, 512),
            e(4, 64, 256),
            e(7, 64, 128),
            e(13, 32, 128),
            e(25, 16, 128),
            e(97, 0, 0),
        ],
        &[
            e(0, 256, 512),
            e(2, 128, 512),
            e(4, 64, 512),
            e(7, 64, 256),
            e(13, 64, 128),
            e(25, 32, 128),
            e(49, 16, 128),
            e(97, 0, 0),
        ],
        &[
            e(0, 512, 512),
            e(2, 256, 512),
            e(4, 128, 512),
            e(7, 64, 512),
            e(13, 64, 256),
            e(25, 64, 128),
            e(49, 16, 128),
            e(97, 0, 0),
        ],
    ],
    // Four RB / SE
    [
        &[
            e(0, 256, 512),
            e(2, 128, 512),
            e(4, 64, 512),
            e(7, 64, 256),
            e(13, 64, 128),
            e(25, 32, 128),
            e(49, 16, 128),
            e(193, 0, 0),
        ],
        &[
            e(0, 512, 512),
            e(2, 256, 512),
            e(4, 128, 512),
            e(7, 64, 512),
            e(13, 64, 256),
            e(25, 64, 128),
            e(49, 32, 128),
            e(97, 16, 128),
            e(193, 0, 0),
        ],
        &[
            e(0, 512, 512),
            e(4, 256, 512),
            e(7, 128, 512),
            e(13, 64, 512),
            e(25, 32, 512),
            e(49, 32, 256),
            e(97, 16, 128),
            e(193, 0, 0),
        ],
    ],
];

/// The color and depth tables for one chip generation.
#[derive(Debug, Clone, Copy)]
pub struct BinSizeTables {
    pub color: &'static BinSizeTable,
    pub depth: &'static BinSizeTable,
}

impl BinSizeTables {
    pub fn for_chip_class(chip_class: ChipClass) -> Option<Self> {
        match chip_class {
            ChipClass::Gfx9 => Some(Self {
                color: &GFX9_COLOR_BIN_SIZE_TABLE,
                depth: &GFX9_DEPTH_BIN_SIZE_TABLE,
            }),
            ChipClass::Gfx6 | ChipClass::Gfx7 | ChipClass::Gfx8 => None,
        }
    }
}
