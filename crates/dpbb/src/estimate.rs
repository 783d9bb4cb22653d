//! Workload estimates fed to the bin-size search.
//!
//! The weights used here are empirical hardware cost coefficients and are not tunable.

use crate::caps::CapabilityIndex;
use crate::search::{find_bin_size, subtable_for};
use crate::snapshot::{DepthStencilState, FramebufferState, TargetMask, MAX_COLOR_TARGETS};
use crate::tables::{BinSize, BinSizeTable};

/// Cost factor applied when multisampled color is shaded once per pixel.
const PARTIAL_MSAA_FACTOR: u32 = 2;
const DEPTH_BYTES: u32 = 4;
const DEPTH_COEFF: u32 = 5;
const STENCIL_COEFF: u32 = 1;

/// Sum of bytes per pixel of the enabled color targets, scaled by the sample count.
pub fn color_workload_sum(
    framebuffer: &FramebufferState,
    cb_target_enabled_4bit: TargetMask,
    ps_iter_samples: u32,
) -> u32 {
    let mut sum = framebuffer
        .color_targets
        .iter()
        .take(MAX_COLOR_TARGETS)
        .enumerate()
        .filter(|(i, _)| cb_target_enabled_4bit.target_enabled(*i))
        .filter_map(|(_, target)| target.as_ref())
        .fold(0u32, |acc, target| acc.saturating_add(target.bytes_per_pixel));

    let num_fragments = framebuffer.nr_color_samples;
    if num_fragments >= 2 {
        if ps_iter_samples >= 2 {
            sum = sum.saturating_mul(num_fragments);
        } else {
            sum = sum.saturating_mul(PARTIAL_MSAA_FACTOR);
        }
    }
    sum
}

/// Depth/stencil workload, or `None` when depth/stencil does not limit the bin size.
pub fn depth_workload_sum(framebuffer: &FramebufferState, dsa: &DepthStencilState) -> Option<u32> {
    let zsbuf = framebuffer.zsbuf.as_ref()?;
    if !dsa.depth_enabled && !dsa.stencil_enabled {
        return None;
    }

    let depth_coeff = if dsa.depth_enabled { DEPTH_COEFF } else { 0 };
    let stencil_coeff = if zsbuf.has_stencil && dsa.stencil_enabled {
        STENCIL_COEFF
    } else {
        0
    };
    Some((DEPTH_BYTES * (depth_coeff + stencil_coeff)).saturating_mul(zsbuf.sample_count))
}

pub fn color_bin_size(
    table: &BinSizeTable,
    index: CapabilityIndex,
    framebuffer: &FramebufferState,
    cb_target_enabled_4bit: TargetMask,
    ps_iter_samples: u32,
) -> BinSize {
    let sum = color_workload_sum(framebuffer, cb_target_enabled_4bit, ps_iter_samples);
    find_bin_size(subtable_for(table, index), sum)
}

pub fn depth_bin_size(
    table: &BinSizeTable,
    index: CapabilityIndex,
    framebuffer: &FramebufferState,
    dsa: &DepthStencilState,
) -> BinSize {
    match depth_workload_sum(framebuffer, dsa) {
        Some(sum) => find_bin_size(subtable_for(table, index), sum),
        None => BinSize::MAX,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{ColorTarget, DepthStencilTarget};

    fn rgba(bytes_per_pixel: u32) -> Option<ColorTarget> {
        Some(ColorTarget {
            bytes_per_pixel,
            component_mask: 0xf,
        })
    }

    fn framebuffer(targets: Vec<Option<ColorTarget>>, color_samples: u32) -> FramebufferState {
        FramebufferState {
            color_targets: targets,
            zsbuf: None,
            nr_samples: color_samples,
            nr_color_samples: color_samples,
        }
    }

    #[test]
    fn color_sum_only_counts_enabled_targets() {
        let fb = framebuffer(vec![rgba(4), rgba(8), rgba(16)], 1);
        let mask = TargetMask::for_target(0, 0xf) | TargetMask::for_target(2, 0x1);
        assert_eq!(color_workload_sum(&fb, mask, 1), 20);
        assert_eq!(color_workload_sum(&fb, TargetMask::NONE, 1), 0);
    }

    #[test]
    fn color_sum_ignores_unbound_slots_even_if_mask_is_set() {
        let fb = framebuffer(vec![None, rgba(4)], 1);
        assert_eq!(color_workload_sum(&fb, TargetMask::ALL, 1), 4);
    }

    #[test]
    fn msaa_scaling() {
        let fb = framebuffer(vec![rgba(4)], 8);
        // Per-sample shading multiplies by the full sample count.
        assert_eq!(color_workload_sum(&fb, TargetMask::ALL, 8), 32);
        assert_eq!(color_workload_sum(&fb, TargetMask::ALL, 2), 32);
        // Otherwise a flat factor of two.
        assert_eq!(color_workload_sum(&fb, TargetMask::ALL, 1), 8);

        let fb = framebuffer(vec![rgba(4)], 1);
        assert_eq!(color_workload_sum(&fb, TargetMask::ALL, 4), 4);
    }

    #[test]
    fn depth_sum_weights() {
        let mut fb = framebuffer(Vec::new(), 1);
        fb.zsbuf = Some(DepthStencilTarget {
            has_stencil: true,
            sample_count: 4,
        });
        let both = DepthStencilState {
            depth_enabled: true,
            stencil_enabled: true,
            db_can_write: true,
        };
        assert_eq!(depth_workload_sum(&fb, &both), Some(4 * 6 * 4));

        let depth_only = DepthStencilState {
            stencil_enabled: false,
            ..both
        };
        assert_eq!(depth_workload_sum(&fb, &depth_only), Some(4 * 5 * 4));

        let stencil_only = DepthStencilState {
            depth_enabled: false,
            ..both
        };
        assert_eq!(depth_workload_sum(&fb, &stencil_only), Some(4 * 4));

        fb.zsbuf = Some(DepthStencilTarget {
            has_stencil: false,
            sample_count: 1,
        });
        assert_eq!(depth_workload_sum(&fb, &stencil_only), Some(0));
    }

    #[test]
    fn unbound_or_disabled_depth_is_unconstrained() {
        let index = CapabilityIndex {
            rb_index: 0,
            se_index: 0,
        };
        let table = &crate::tables::GFX9_DEPTH_BIN_SIZE_TABLE;
        let enabled = DepthStencilState {
            depth_enabled: true,
            stencil_enabled: true,
            db_can_write: true,
        };

        let mut fb = framebuffer(Vec::new(), 1);
        assert_eq!(depth_bin_size(table, index, &fb, &enabled), BinSize::MAX);

        fb.zsbuf = Some(DepthStencilTarget {
            has_stencil: true,
            sample_count: 1,
        });
        assert_eq!(
            depth_bin_size(table, index, &fb, &DepthStencilState::default()),
            BinSize::MAX
        );
        // sum = 4 * 6 = 24 -> { 13, 16x128 }
        assert_eq!(
            depth_bin_size(table, index, &fb, &enabled),
            BinSize::new(16, 128)
        );
    }
}
