//! Context register layouts for the binner and DFSM, and packing of a [`BinDecision`].
//!
//! Unspecified bits are always written as zero.

use crate::caps::floor_log2;
use crate::decision::{BinDecision, BinningDevice, PunchoutMode};
use crate::error::DpbbError;
use crate::snapshot::PipelineSnapshot;

/// Context register offsets.
pub mod offsets {
    pub const DB_DFSM_CONTROL: u32 = 0x0002_8060;
    pub const DB_SHADER_CONTROL: u32 = 0x0002_880C;
    pub const PA_SC_BINNER_CNTL_0: u32 = 0x0002_8C44;
}

/// `PA_SC_BINNER_CNTL_0` fields as `(shift, mask)` pairs.
pub mod binner_cntl_0 {
    pub const BINNING_MODE: (u32, u32) = (0, 0x3);
    pub const BIN_SIZE_X: (u32, u32) = (2, 0x1);
    pub const BIN_SIZE_Y: (u32, u32) = (3, 0x1);
    pub const BIN_SIZE_X_EXTEND: (u32, u32) = (4, 0x7);
    pub const BIN_SIZE_Y_EXTEND: (u32, u32) = (7, 0x7);
    pub const CONTEXT_STATES_PER_BIN: (u32, u32) = (10, 0x7);
    pub const PERSISTENT_STATES_PER_BIN: (u32, u32) = (13, 0x1F);
    pub const DISABLE_START_OF_PRIM: (u32, u32) = (18, 0x1);
    pub const FPOVS_PER_BATCH: (u32, u32) = (19, 0xFF);
    pub const OPTIMAL_BIN_SELECTION: (u32, u32) = (27, 0x1);

    // BINNING_MODE values.
    pub const BINNING_ALLOWED: u32 = 0;
    pub const FORCE_BINNING_ON: u32 = 1;
    pub const DISABLE_BINNING_USE_NEW_SC: u32 = 2;
    pub const DISABLE_BINNING_USE_LEGACY_SC: u32 = 3;
}

/// `DB_DFSM_CONTROL` fields as `(shift, mask)` pairs.
pub mod dfsm_control {
    pub const PUNCHOUT_MODE: (u32, u32) = (0, 0x3);
    pub const POPS_DRAIN_PS_ON_OVERLAP: (u32, u32) = (2, 0x1);

    // PUNCHOUT_MODE values.
    pub const AUTO: u32 = 0;
    pub const FORCE_ON: u32 = 1;
    pub const FORCE_OFF: u32 = 2;
}

/// Place `value` in a `(shift, mask)` field. Out-of-range values are truncated to the field.
pub const fn field(field: (u32, u32), value: u32) -> u32 {
    (value & field.1) << field.0
}

/// Extract a `(shift, mask)` field from a register word.
pub const fn get_field(field: (u32, u32), word: u32) -> u32 {
    (word >> field.0) & field.1
}

/// `PA_SC_BINNER_CNTL_0` with binning disabled.
pub const BINNER_CNTL_0_DISABLED: u32 = field(
    binner_cntl_0::BINNING_MODE,
    binner_cntl_0::DISABLE_BINNING_USE_LEGACY_SC,
) | field(binner_cntl_0::DISABLE_START_OF_PRIM, 1);

/// `DB_DFSM_CONTROL` with punch-out forced off.
pub const DFSM_CONTROL_DISABLED: u32 = field(dfsm_control::PUNCHOUT_MODE, dfsm_control::FORCE_OFF)
    | field(dfsm_control::POPS_DRAIN_PS_ON_OVERLAP, 1);

/// The two context register values produced for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BinningRegisters {
    pub pa_sc_binner_cntl_0: u32,
    pub db_dfsm_control: u32,
}

impl BinningRegisters {
    pub const DISABLED: Self = Self {
        pa_sc_binner_cntl_0: BINNER_CNTL_0_DISABLED,
        db_dfsm_control: DFSM_CONTROL_DISABLED,
    };

    pub fn from_decision(decision: &BinDecision) -> Self {
        if !decision.binning_enabled {
            return Self::DISABLED;
        }
        Self {
            pa_sc_binner_cntl_0: pack_binner_cntl_0(decision),
            db_dfsm_control: pack_dfsm_control(decision.punchout_mode),
        }
    }

    /// `(offset, value)` pairs in emission order.
    pub fn writes(&self) -> [(u32, u32); 2] {
        [
            (offsets::PA_SC_BINNER_CNTL_0, self.pa_sc_binner_cntl_0),
            (offsets::DB_DFSM_CONTROL, self.db_dfsm_control),
        ]
    }
}

/// `log2(size) - 5` for sizes of at least 32 pixels, otherwise 0.
pub fn bin_size_extend(size: u32) -> u32 {
    if size >= 32 {
        floor_log2(size) - 5
    } else {
        0
    }
}

fn pack_binner_cntl_0(decision: &BinDecision) -> u32 {
    use binner_cntl_0::*;

    let size = decision.bin_size;
    let tunables = decision.tunables;
    field(BINNING_MODE, BINNING_ALLOWED)
        | field(BIN_SIZE_X, u32::from(size.width == 16))
        | field(BIN_SIZE_Y, u32::from(size.height == 16))
        | field(BIN_SIZE_X_EXTEND, bin_size_extend(size.width))
        | field(BIN_SIZE_Y_EXTEND, bin_size_extend(size.height))
        | field(CONTEXT_STATES_PER_BIN, tunables.context_states_per_bin)
        | field(PERSISTENT_STATES_PER_BIN, tunables.persistent_states_per_bin)
        | field(
            DISABLE_START_OF_PRIM,
            u32::from(decision.disable_start_of_primitive),
        )
        | field(FPOVS_PER_BATCH, tunables.fpovs_per_batch)
        | field(OPTIMAL_BIN_SELECTION, 1)
}

fn pack_dfsm_control(mode: PunchoutMode) -> u32 {
    let mode = match mode {
        PunchoutMode::Off => dfsm_control::FORCE_OFF,
        PunchoutMode::Auto => dfsm_control::AUTO,
    };
    field(dfsm_control::PUNCHOUT_MODE, mode) | field(dfsm_control::POPS_DRAIN_PS_ON_OVERLAP, 1)
}

/// Receiver of context register writes (typically a command buffer that drops redundant writes).
pub trait ContextRegisterSink {
    fn set_context_reg(&mut self, offset: u32, value: u32);
}

impl ContextRegisterSink for Vec<(u32, u32)> {
    fn set_context_reg(&mut self, offset: u32, value: u32) {
        self.push((offset, value));
    }
}

/// Write both binning registers to `sink`.
pub fn write_binning_registers(
    sink: &mut (impl ContextRegisterSink + ?Sized),
    regs: &BinningRegisters,
) {
    for (offset, value) in regs.writes() {
        sink.set_context_reg(offset, value);
    }
}

/// Evaluate `snapshot` and write the resulting registers.
///
/// Nothing is written when the evaluation fails.
pub fn emit_dpbb_state(
    device: &BinningDevice,
    snapshot: &PipelineSnapshot,
    sink: &mut (impl ContextRegisterSink + ?Sized),
) -> Result<BinningRegisters, DpbbError> {
    let decision = device.evaluate(snapshot)?;
    let regs = BinningRegisters::from_decision(&decision);
    write_binning_registers(sink, &regs);
    Ok(regs)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::decision::{BatchTunables, DisableReason};
    use crate::tables::BinSize;

    fn enabled(bin_size: BinSize, punchout_mode: PunchoutMode, dis_sop: bool) -> BinDecision {
        BinDecision {
            binning_enabled: true,
            bin_size,
            punchout_mode,
            disable_start_of_primitive: dis_sop,
            tunables: BatchTunables {
                context_states_per_bin: 5,
                persistent_states_per_bin: 31,
                fpovs_per_batch: 63,
            },
            disable_reason: None,
        }
    }

    #[test]
    fn disabled_words() {
        assert_eq!(BINNER_CNTL_0_DISABLED, 0x0004_0003);
        assert_eq!(DFSM_CONTROL_DISABLED, 0x0000_0006);
        assert_eq!(
            BinningRegisters::from_decision(&BinDecision::disabled(DisableReason::Inefficient)),
            BinningRegisters::DISABLED
        );
    }

    #[test]
    fn size_extend_encoding() {
        assert_eq!(bin_size_extend(16), 0);
        assert_eq!(bin_size_extend(32), 0);
        assert_eq!(bin_size_extend(64), 1);
        assert_eq!(bin_size_extend(128), 2);
        assert_eq!(bin_size_extend(256), 3);
        assert_eq!(bin_size_extend(512), 4);
    }

    #[test]
    fn packs_raven_32x128_with_punchout() {
        let regs = BinningRegisters::from_decision(&enabled(
            BinSize::new(32, 128),
            PunchoutMode::Auto,
            false,
        ));
        let expected = (2 << 7) // Y extend: 128
            | (5 << 10)
            | (31 << 13)
            | (63 << 19)
            | (1 << 27);
        assert_eq!(regs.pa_sc_binner_cntl_0, expected);
        assert_eq!(regs.db_dfsm_control, 0x4);
    }

    #[test]
    fn sixteen_pixel_bins_set_min_size_bits() {
        let regs = BinningRegisters::from_decision(&enabled(
            BinSize::new(16, 128),
            PunchoutMode::Off,
            true,
        ));
        let word = regs.pa_sc_binner_cntl_0;
        assert_eq!(get_field(binner_cntl_0::BINNING_MODE, word), 0);
        assert_eq!(get_field(binner_cntl_0::BIN_SIZE_X, word), 1);
        assert_eq!(get_field(binner_cntl_0::BIN_SIZE_Y, word), 0);
        assert_eq!(get_field(binner_cntl_0::BIN_SIZE_X_EXTEND, word), 0);
        assert_eq!(get_field(binner_cntl_0::BIN_SIZE_Y_EXTEND, word), 2);
        assert_eq!(get_field(binner_cntl_0::DISABLE_START_OF_PRIM, word), 1);
        assert_eq!(regs.db_dfsm_control, DFSM_CONTROL_DISABLED);
    }

    #[test]
    fn fields_truncate_out_of_range_values() {
        assert_eq!(field(binner_cntl_0::CONTEXT_STATES_PER_BIN, 0xF), 0x7 << 10);
        assert_eq!(field(binner_cntl_0::FPOVS_PER_BATCH, 0x1FF), 0xFF << 19);
    }

    #[test]
    fn writes_binner_then_dfsm() {
        let mut sink = Vec::new();
        write_binning_registers(&mut sink, &BinningRegisters::DISABLED);
        assert_eq!(
            sink,
            vec![
                (offsets::PA_SC_BINNER_CNTL_0, 0x0004_0003),
                (offsets::DB_DFSM_CONTROL, 0x0000_0006),
            ]
        );
    }

    #[test]
    fn emit_writes_nothing_on_error() {
        use crate::caps::{ChipFamily, DeviceCapability};
        use crate::config::BinningConfig;

        let device = BinningDevice::new(
            DeviceCapability {
                render_backend_count: 2,
                shader_engine_count: 1,
            },
            BinningConfig::default(),
        )
        .unwrap();
        let mut sink: Vec<(u32, u32)> = Vec::new();
        let snapshot = PipelineSnapshot::new(ChipFamily::Polaris10);
        assert!(emit_dpbb_state(&device, &snapshot, &mut sink).is_err());
        assert!(sink.is_empty());

        let mut snapshot = PipelineSnapshot::new(ChipFamily::Raven);
        snapshot.force_off = true;
        let regs = emit_dpbb_state(&device, &snapshot, &mut sink).unwrap();
        assert_eq!(regs, BinningRegisters::DISABLED);
        assert_eq!(sink.len(), 2);
    }
}
