//! Device-level policy switches.
//!
//! Binning and DFSM can be turned off for a whole device without touching per-draw state, which
//! is useful for bisecting rendering/performance issues:
//! - `DPBB_DISABLE=1` disables primitive binning (and therefore DFSM).
//! - `DPBB_DISABLE_DFSM=1` keeps binning but never enables punch-out.

/// Env var that disables primitive binning for the device.
pub const DISABLE_DPBB_ENV: &str = "DPBB_DISABLE";

/// Env var that disables DFSM/punch-out for the device.
pub const DISABLE_DFSM_ENV: &str = "DPBB_DISABLE_DFSM";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinningConfig {
    pub dpbb_allowed: bool,
    /// Never true while `dpbb_allowed` is false.
    pub dfsm_allowed: bool,
}

impl Default for BinningConfig {
    fn default() -> Self {
        Self::new(false, false)
    }
}

impl BinningConfig {
    pub fn new(disable_dpbb: bool, disable_dfsm: bool) -> Self {
        let dpbb_allowed = !disable_dpbb;
        Self {
            dpbb_allowed,
            dfsm_allowed: dpbb_allowed && !disable_dfsm,
        }
    }

    pub fn from_env() -> Self {
        Self::new(
            env_var_truthy(DISABLE_DPBB_ENV),
            env_var_truthy(DISABLE_DFSM_ENV),
        )
    }
}

fn env_var_truthy(name: &str) -> bool {
    let Ok(raw) = std::env::var(name) else {
        return false;
    };
    is_truthy(&raw)
}

fn is_truthy(raw: &str) -> bool {
    let v = raw.trim();
    v == "1"
        || v.eq_ignore_ascii_case("true")
        || v.eq_ignore_ascii_case("yes")
        || v.eq_ignore_ascii_case("on")
}
