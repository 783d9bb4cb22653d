use thiserror::Error;

use crate::caps::{ChipClass, ChipFamily};

/// Fatal configuration errors.
///
/// Everything that merely turns binning off (missing state, an inefficient shader/depth
/// combination, a zero-sized bin) is reported through [`crate::DisableReason`] instead.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum DpbbError {
    #[error(
        "unsupported render backend/shader engine configuration \
         ({render_backends} RBs, {shader_engines} SEs)"
    )]
    UnsupportedCapability {
        render_backends: u32,
        shader_engines: u32,
    },
    #[error("no binning tunables for chip family {0:?}")]
    UnsupportedChipFamily(ChipFamily),
    #[error("primitive binning is not supported on {0:?}")]
    UnsupportedChipClass(ChipClass),
}
