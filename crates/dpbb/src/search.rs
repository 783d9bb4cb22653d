use crate::caps::CapabilityIndex;
use crate::tables::{BinSize, BinSizeSubtable, BinSizeTable};

/// Select the subtable for a device.
pub fn subtable_for(table: &BinSizeTable, index: CapabilityIndex) -> BinSizeSubtable {
    table[index.rb_index][index.se_index]
}

/// Find the bin size whose range `[entries[i].start, entries[i + 1].start)` contains `sum`.
///
/// Returns [`BinSize::ZERO`] once `sum` reaches the sentinel's start, or for a subtable with no
/// real entries.
pub fn find_bin_size(subtable: BinSizeSubtable, sum: u32) -> BinSize {
    let mut found = None;
    for pair in subtable.windows(2) {
        let (entry, next) = (&pair[0], &pair[1]);
        if entry.size.is_degenerate() {
            break;
        }
        if sum >= entry.start && sum < next.start {
            found = Some(entry.size);
            break;
        }
    }
    found.unwrap_or(BinSize::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::{GFX9_COLOR_BIN_SIZE_TABLE, GFX9_DEPTH_BIN_SIZE_TABLE};

    const RAVEN: CapabilityIndex = CapabilityIndex {
        rb_index: 1,
        se_index: 0,
    };

    #[test]
    fn boundary_selects_bucket_starting_at_threshold() {
        let subtable = subtable_for(&GFX9_COLOR_BIN_SIZE_TABLE, RAVEN);
        // { 0, 128x128 }, { 2, 64x128 }, { 3, 32x128 }, { 9, 16x128 }, { 33, 0x0 }
        assert_eq!(find_bin_size(subtable, 0), BinSize::new(128, 128));
        assert_eq!(find_bin_size(subtable, 1), BinSize::new(128, 128));
        assert_eq!(find_bin_size(subtable, 2), BinSize::new(64, 128));
        assert_eq!(find_bin_size(subtable, 8), BinSize::new(32, 128));
        assert_eq!(find_bin_size(subtable, 9), BinSize::new(16, 128));
        assert_eq!(find_bin_size(subtable, 32), BinSize::new(16, 128));
    }

    #[test]
    fn sentinel_start_and_beyond_disable_binning() {
        let subtable = subtable_for(&GFX9_COLOR_BIN_SIZE_TABLE, RAVEN);
        assert_eq!(find_bin_size(subtable, 33), BinSize::ZERO);
        assert_eq!(find_bin_size(subtable, u32::MAX), BinSize::ZERO);
    }

    #[test]
    fn depth_table_first_row_for_two_rbs_one_se() {
        let subtable = subtable_for(&GFX9_DEPTH_BIN_SIZE_TABLE, RAVEN);
        assert_eq!(find_bin_size(subtable, 0), BinSize::new(128, 512));
    }

    #[test]
    fn empty_and_sentinel_only_subtables_are_total() {
        assert_eq!(find_bin_size(&[], 0), BinSize::ZERO);

        static ONLY_SENTINEL: [crate::tables::BinSizeEntry; 1] = [crate::tables::BinSizeEntry {
            start: 0,
            size: BinSize::ZERO,
        }];
        assert_eq!(find_bin_size(&ONLY_SENTINEL, 0), BinSize::ZERO);
    }
}
