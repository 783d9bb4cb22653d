//! Read-only view of the pipeline state that feeds the binning decision.
//!
//! Callers rebuild a [`PipelineSnapshot`] whenever blend, depth/stencil, framebuffer or pixel
//! shader state changes. Nothing here is validated; the snapshot is trusted as given.

use bitflags::bitflags;

use crate::caps::{ChipClass, ChipFamily};

/// Maximum number of bound color targets.
pub const MAX_COLOR_TARGETS: usize = 8;

/// Four bits per color target (one per component), target `i` in bits `4*i..4*i+4`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TargetMask(pub u32);

impl TargetMask {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(u32::MAX);

    /// Component mask for a single target; empty for `index >= MAX_COLOR_TARGETS`.
    pub fn for_target(index: usize, components: u8) -> Self {
        if index >= MAX_COLOR_TARGETS {
            return Self::NONE;
        }
        Self(u32::from(components & 0xf) << (index * 4))
    }

    pub fn target_enabled(self, index: usize) -> bool {
        index < MAX_COLOR_TARGETS && self.0 & (0xf << (index * 4)) != 0
    }

    pub fn intersect(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for TargetMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorTarget {
    /// Bytes per pixel (element) of the target's format.
    pub bytes_per_pixel: u32,
    /// Components present in the format (RGBA bits 0..3).
    pub component_mask: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthStencilTarget {
    pub has_stencil: bool,
    /// Gallium-style sample count; 0 and 1 both mean single-sampled.
    pub sample_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramebufferState {
    /// Bound color targets by slot; `None` for unbound slots.
    pub color_targets: Vec<Option<ColorTarget>>,
    pub zsbuf: Option<DepthStencilTarget>,
    /// Coverage sample count.
    pub nr_samples: u32,
    /// Color sample count (differs from `nr_samples` with EQAA).
    pub nr_color_samples: u32,
}

impl Default for FramebufferState {
    fn default() -> Self {
        Self {
            color_targets: Vec::new(),
            zsbuf: None,
            nr_samples: 1,
            nr_color_samples: 1,
        }
    }
}

impl FramebufferState {
    /// Mask of components the bound targets can store.
    pub fn colorbuf_enabled_4bit(&self) -> TargetMask {
        self.color_targets
            .iter()
            .take(MAX_COLOR_TARGETS)
            .enumerate()
            .filter_map(|(i, target)| {
                target.map(|target| TargetMask::for_target(i, target.component_mask))
            })
            .fold(TargetMask::NONE, |acc, mask| acc | mask)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlendState {
    pub alpha_to_coverage: bool,
    /// Per-target color write mask.
    pub cb_target_enabled_4bit: TargetMask,
    /// Targets with blending enabled.
    pub blend_enable_4bit: TargetMask,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DepthStencilState {
    pub depth_enabled: bool,
    pub stencil_enabled: bool,
    /// Depth or stencil writes may happen.
    pub db_can_write: bool,
}

/// `DB_SHADER_CONTROL.Z_ORDER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZOrder {
    LateZ = 0,
    EarlyZThenLateZ = 1,
    ReZ = 2,
    EarlyZThenReZ = 3,
}

bitflags! {
    /// `DB_SHADER_CONTROL` ([`crate::regs::offsets::DB_SHADER_CONTROL`]) as derived from the bound
    /// pixel shader.
    #[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
    pub struct DbShaderControl: u32 {
        const Z_EXPORT_ENABLE = 1 << 0;
        const STENCIL_TEST_VAL_EXPORT_ENABLE = 1 << 1;
        const STENCIL_OP_VAL_EXPORT_ENABLE = 1 << 2;
        const Z_ORDER = 0b11 << 4;
        const KILL_ENABLE = 1 << 6;
        const COVERAGE_TO_MASK_ENABLE = 1 << 7;
        const MASK_EXPORT_ENABLE = 1 << 8;
        const EXEC_ON_HIER_FAIL = 1 << 9;
        const EXEC_ON_NOOP = 1 << 10;
        const ALPHA_TO_MASK_DISABLE = 1 << 11;
        const DEPTH_BEFORE_SHADER = 1 << 12;
        const CONSERVATIVE_Z_EXPORT = 0b11 << 13;
        const DUAL_QUAD_DISABLE = 1 << 15;
    }
}

const Z_ORDER_SHIFT: u32 = 4;
const CONSERVATIVE_Z_EXPORT_SHIFT: u32 = 13;

impl DbShaderControl {
    pub fn z_order(self) -> ZOrder {
        match (self.bits() >> Z_ORDER_SHIFT) & 0b11 {
            0 => ZOrder::LateZ,
            1 => ZOrder::EarlyZThenLateZ,
            2 => ZOrder::ReZ,
            _ => ZOrder::EarlyZThenReZ,
        }
    }

    pub fn with_z_order(self, z_order: ZOrder) -> Self {
        let bits = (self.bits() & !Self::Z_ORDER.bits()) | ((z_order as u32) << Z_ORDER_SHIFT);
        Self::from_bits_retain(bits)
    }

    /// Raw `CONSERVATIVE_Z_EXPORT` field (0 = off, 1 = less-than, 2 = greater-than).
    pub fn conservative_z_export(self) -> u32 {
        (self.bits() >> CONSERVATIVE_Z_EXPORT_SHIFT) & 0b11
    }

    pub fn with_conservative_z_export(self, mode: u32) -> Self {
        let bits = (self.bits() & !Self::CONSERVATIVE_Z_EXPORT.bits())
            | ((mode & 0b11) << CONSERVATIVE_Z_EXPORT_SHIFT);
        Self::from_bits_retain(bits)
    }
}

/// Everything the binning policy reads for one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSnapshot {
    pub chip_class: ChipClass,
    pub family: ChipFamily,
    pub framebuffer: FramebufferState,
    /// `None` while no blend state object is bound.
    pub blend: Option<BlendState>,
    /// `None` while no depth/stencil/alpha state object is bound.
    pub dsa: Option<DepthStencilState>,
    pub db_shader_control: DbShaderControl,
    /// Number of samples the pixel shader is iterated per pixel.
    pub ps_iter_samples: u32,
    /// Caller-side override (e.g. while occlusion queries are active).
    pub force_off: bool,
}

impl PipelineSnapshot {
    /// Empty single-sampled pipeline with default blend and depth/stencil state bound.
    pub fn new(family: ChipFamily) -> Self {
        Self {
            chip_class: family.chip_class(),
            family,
            framebuffer: FramebufferState::default(),
            blend: Some(BlendState::default()),
            dsa: Some(DepthStencilState::default()),
            db_shader_control: DbShaderControl::empty().with_z_order(ZOrder::EarlyZThenLateZ),
            ps_iter_samples: 1,
            force_off: false,
        }
    }
}
