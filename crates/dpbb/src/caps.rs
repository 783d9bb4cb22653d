//! Chip identity and the render-backend/shader-engine indices used to pick bin-size subtables.

use std::fmt;

use crate::error::DpbbError;

/// Number of rows/columns in each bin-size table (1, 2 or 4 RBs per SE; 1, 2 or 4 SEs).
pub const TABLE_DIM: usize = 3;

/// Chip generation. Only GFX9 has a primitive binner programmed by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChipClass {
    Gfx6,
    Gfx7,
    Gfx8,
    Gfx9,
}

/// Chip family, as reported by the kernel driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChipFamily {
    Polaris10,
    Vega10,
    Vega12,
    Vega20,
    Raven,
    Raven2,
}

impl ChipFamily {
    /// Generation the family belongs to.
    pub fn chip_class(self) -> ChipClass {
        match self {
            Self::Polaris10 => ChipClass::Gfx8,
            Self::Vega10 | Self::Vega12 | Self::Vega20 | Self::Raven | Self::Raven2 => {
                ChipClass::Gfx9
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Polaris10 => "polaris10",
            Self::Vega10 => "vega10",
            Self::Vega12 => "vega12",
            Self::Vega20 => "vega20",
            Self::Raven => "raven",
            Self::Raven2 => "raven2",
        }
    }

    /// Parse a lowercase family name (`"raven"`, `"vega10"`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        [
            Self::Polaris10,
            Self::Vega10,
            Self::Vega12,
            Self::Vega20,
            Self::Raven,
            Self::Raven2,
        ]
        .into_iter()
        .find(|family| family.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for ChipFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Static device counts supplied once at device init.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCapability {
    pub render_backend_count: u32,
    pub shader_engine_count: u32,
}

/// Subtable selector derived from a [`DeviceCapability`].
///
/// Both fields are guaranteed to be `< TABLE_DIM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CapabilityIndex {
    /// `ceil(log2(render_backends / shader_engines))`.
    pub rb_index: usize,
    /// `ceil(log2(shader_engines))`.
    pub se_index: usize,
}

impl CapabilityIndex {
    pub fn from_capability(caps: DeviceCapability) -> Result<Self, DpbbError> {
        let unsupported = DpbbError::UnsupportedCapability {
            render_backends: caps.render_backend_count,
            shader_engines: caps.shader_engine_count,
        };

        if caps.shader_engine_count == 0 {
            return Err(unsupported);
        }

        let rb_per_se = caps.render_backend_count / caps.shader_engine_count;
        let rb_index = ceil_log2(rb_per_se) as usize;
        let se_index = ceil_log2(caps.shader_engine_count) as usize;

        if rb_index >= TABLE_DIM || se_index >= TABLE_DIM {
            return Err(unsupported);
        }

        Ok(Self { rb_index, se_index })
    }
}

/// Ceiling log2; 0 and 1 both map to 0.
pub(crate) fn ceil_log2(n: u32) -> u32 {
    if n <= 1 {
        0
    } else {
        u32::BITS - (n - 1).leading_zeros()
    }
}

/// Floor log2; callers guarantee `n != 0`.
pub(crate) fn floor_log2(n: u32) -> u32 {
    debug_assert!(n != 0);
    u32::BITS - 1 - n.leading_zeros()
}
