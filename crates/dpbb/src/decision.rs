//! The binning policy: whether to bin, the bin size, punch-out, and batch tunables.

use tracing::{debug, trace};

use crate::caps::{CapabilityIndex, ChipClass, ChipFamily, DeviceCapability};
use crate::config::BinningConfig;
use crate::error::DpbbError;
use crate::estimate::{color_bin_size, depth_bin_size};
use crate::snapshot::{DbShaderControl, PipelineSnapshot, ZOrder};
use crate::tables::{BinSize, BinSizeTables};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PunchoutMode {
    Off,
    Auto,
}

/// Why an evaluation ended with binning disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisableReason {
    /// Binning is disabled for the whole device.
    NotAllowed,
    /// Blend or depth/stencil state is not bound yet.
    MissingState,
    /// The caller asked for binning to be off.
    ForcedOff,
    /// The pixel shader can kill while early Z is trusted and depth writes are on.
    Inefficient,
    /// The selected bin size has a zero dimension.
    DegenerateSize,
}

/// Per-family batch parameters programmed into `PA_SC_BINNER_CNTL_0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchTunables {
    /// Allowed range: `[0, 5]`.
    pub context_states_per_bin: u32,
    /// Allowed range: `[0, 31]`.
    pub persistent_states_per_bin: u32,
    /// Allowed range: `[0, 255]`, 0 = unlimited.
    pub fpovs_per_batch: u32,
}

impl BatchTunables {
    pub fn for_family(family: ChipFamily) -> Result<Self, DpbbError> {
        match family {
            // Tuned for Raven. Vega might need different values.
            ChipFamily::Vega10 | ChipFamily::Vega12 | ChipFamily::Raven => Ok(Self {
                context_states_per_bin: 5,
                persistent_states_per_bin: 31,
                fpovs_per_batch: 63,
            }),
            ChipFamily::Polaris10 | ChipFamily::Vega20 | ChipFamily::Raven2 => {
                Err(DpbbError::UnsupportedChipFamily(family))
            }
        }
    }
}

/// Result of one evaluation. Disabled decisions have a zero bin size, punch-out off, start of
/// primitive disabled and zeroed tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinDecision {
    pub binning_enabled: bool,
    pub bin_size: BinSize,
    pub punchout_mode: PunchoutMode,
    pub disable_start_of_primitive: bool,
    pub tunables: BatchTunables,
    pub disable_reason: Option<DisableReason>,
}

impl BinDecision {
    pub fn disabled(reason: DisableReason) -> Self {
        Self {
            binning_enabled: false,
            bin_size: BinSize::ZERO,
            punchout_mode: PunchoutMode::Off,
            disable_start_of_primitive: true,
            tunables: BatchTunables::default(),
            disable_reason: Some(reason),
        }
    }
}

/// Pixel shader may discard samples.
pub fn ps_can_kill(control: DbShaderControl, alpha_to_coverage: bool) -> bool {
    control.intersects(
        DbShaderControl::KILL_ENABLE
            | DbShaderControl::MASK_EXPORT_ENABLE
            | DbShaderControl::COVERAGE_TO_MASK_ENABLE,
    ) || alpha_to_coverage
}

/// The depth block can reject on the incoming Z without waiting for the shader.
pub fn db_can_reject_z_trivially(control: DbShaderControl) -> bool {
    !control.contains(DbShaderControl::Z_EXPORT_ENABLE)
        || control.conservative_z_export() != 0
        || control.contains(DbShaderControl::DEPTH_BEFORE_SHADER)
}

/// Binning policy for one device.
#[derive(Debug, Clone, Copy)]
pub struct BinningDevice {
    capability: DeviceCapability,
    index: CapabilityIndex,
    config: BinningConfig,
}

impl BinningDevice {
    pub fn new(capability: DeviceCapability, config: BinningConfig) -> Result<Self, DpbbError> {
        let index = CapabilityIndex::from_capability(capability)?;
        debug!(
            render_backends = capability.render_backend_count,
            shader_engines = capability.shader_engine_count,
            rb_index = index.rb_index,
            se_index = index.se_index,
            dpbb_allowed = config.dpbb_allowed,
            dfsm_allowed = config.dfsm_allowed,
            "binning device configured"
        );
        Ok(Self {
            capability,
            index,
            config,
        })
    }

    pub fn capability(&self) -> DeviceCapability {
        self.capability
    }

    pub fn index(&self) -> CapabilityIndex {
        self.index
    }

    pub fn config(&self) -> BinningConfig {
        self.config
    }

    /// Decide the binning state for `snapshot`.
    pub fn evaluate(&self, snapshot: &PipelineSnapshot) -> Result<BinDecision, DpbbError> {
        if snapshot.chip_class < ChipClass::Gfx9 {
            return Err(DpbbError::UnsupportedChipClass(snapshot.chip_class));
        }
        let tables = BinSizeTables::for_chip_class(snapshot.chip_class)
            .ok_or(DpbbError::UnsupportedChipClass(snapshot.chip_class))?;

        if !self.config.dpbb_allowed {
            return Ok(disable(DisableReason::NotAllowed));
        }
        let (Some(blend), Some(dsa)) = (snapshot.blend.as_ref(), snapshot.dsa.as_ref()) else {
            return Ok(disable(DisableReason::MissingState));
        };
        if snapshot.force_off {
            return Ok(disable(DisableReason::ForcedOff));
        }

        let framebuffer = &snapshot.framebuffer;
        let control = snapshot.db_shader_control;

        if ps_can_kill(control, blend.alpha_to_coverage)
            && db_can_reject_z_trivially(control)
            && framebuffer.zsbuf.is_some()
            && dsa.db_can_write
        {
            return Ok(disable(DisableReason::Inefficient));
        }

        // TODO: Also look at the pixel shader's written outputs, not just the bound targets.
        let cb_target_enabled_4bit = framebuffer
            .colorbuf_enabled_4bit()
            .intersect(blend.cb_target_enabled_4bit);

        let color = color_bin_size(
            tables.color,
            self.index,
            framebuffer,
            cb_target_enabled_4bit,
            snapshot.ps_iter_samples,
        );
        let depth = depth_bin_size(tables.depth, self.index, framebuffer, dsa);

        // Equal areas keep the color size.
        let bin_size = if color.area() <= depth.area() {
            color
        } else {
            depth
        };
        trace!(?color, ?depth, ?bin_size, "computed bin sizes");

        if bin_size.is_degenerate() {
            return Ok(disable(DisableReason::DegenerateSize));
        }

        let zs_eqaa_dfsm_bug = snapshot.chip_class == ChipClass::Gfx9
            && framebuffer
                .zsbuf
                .is_some_and(|zs| framebuffer.nr_samples != zs.sample_count.max(1));

        let mut punchout_mode = PunchoutMode::Off;
        let mut disable_start_of_primitive = true;
        if self.config.dfsm_allowed
            && !zs_eqaa_dfsm_bug
            && !cb_target_enabled_4bit.is_empty()
            && !control.contains(DbShaderControl::KILL_ENABLE)
            // These two also mean the pixel shader doesn't write to memory.
            && !control.contains(DbShaderControl::EXEC_ON_HIER_FAIL)
            && !control.contains(DbShaderControl::EXEC_ON_NOOP)
            && control.z_order() == ZOrder::EarlyZThenLateZ
        {
            punchout_mode = PunchoutMode::Auto;
            disable_start_of_primitive = !cb_target_enabled_4bit
                .intersect(blend.blend_enable_4bit)
                .is_empty();
        }

        let tunables = BatchTunables::for_family(snapshot.family)?;

        Ok(BinDecision {
            binning_enabled: true,
            bin_size,
            punchout_mode,
            disable_start_of_primitive,
            tunables,
            disable_reason: None,
        })
    }
}

fn disable(reason: DisableReason) -> BinDecision {
    debug!(?reason, "primitive binning disabled");
    BinDecision::disabled(reason)
}
