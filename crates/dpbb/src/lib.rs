//! Deferred primitive/pixel binning (DPBB) policy for GFX9 GPUs.
//!
//! Given the device's render-backend/shader-engine counts and a snapshot of the current pipeline
//! state, this crate decides whether the rasterizer should bin primitives, picks the bin size,
//! decides whether DFSM punch-out can be used, and packs the result into the
//! `PA_SC_BINNER_CNTL_0` and `DB_DFSM_CONTROL` context register values.
//!
//! The flow for a draw is:
//! - [`BinningDevice::new`] once per device (validates the capability counts),
//! - [`BinningDevice::evaluate`] per state change, producing a [`BinDecision`],
//! - [`BinningRegisters::from_decision`] (or [`emit_dpbb_state`] to do both and write to a
//!   [`ContextRegisterSink`]).
//!
//! Evaluation is a pure function of its inputs; the only shared data are the static bin-size
//! tables. Deduplicating unchanged register writes is left to the sink.
#![forbid(unsafe_code)]

pub mod caps;
pub mod config;
pub mod decision;
pub mod error;
pub mod estimate;
pub mod regs;
pub mod search;
pub mod snapshot;
pub mod tables;

pub use caps::{CapabilityIndex, ChipClass, ChipFamily, DeviceCapability};
pub use config::BinningConfig;
pub use decision::{BatchTunables, BinDecision, BinningDevice, DisableReason, PunchoutMode};
pub use error::DpbbError;
pub use regs::{emit_dpbb_state, BinningRegisters, ContextRegisterSink};
pub use search::find_bin_size;
pub use snapshot::{
    BlendState, ColorTarget, DbShaderControl, DepthStencilState, DepthStencilTarget,
    FramebufferState, PipelineSnapshot, TargetMask, ZOrder, MAX_COLOR_TARGETS,
};
pub use tables::{BinSize, BinSizeEntry, BinSizeTables};
