use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use dpbb::{
    BinDecision, BinningConfig, BinningDevice, BinningRegisters, DeviceCapability, PunchoutMode,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod doc;

use doc::SnapshotDoc;

#[derive(Parser, Debug)]
#[command(
    about = "Evaluate the primitive binning policy for a pipeline snapshot and print the resulting PA_SC_BINNER_CNTL_0 / DB_DFSM_CONTROL values."
)]
struct Args {
    /// Number of render backends on the device.
    #[arg(long, default_value_t = 2)]
    render_backends: u32,

    /// Number of shader engines on the device.
    #[arg(long, default_value_t = 1)]
    shader_engines: u32,

    /// Disable primitive binning for the device (same as DPBB_DISABLE=1).
    #[arg(long)]
    no_dpbb: bool,

    /// Disable DFSM punch-out for the device (same as DPBB_DISABLE_DFSM=1).
    #[arg(long)]
    no_dfsm: bool,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,

    /// Pipeline snapshot JSON (`-` reads stdin).
    snapshot: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let text = read_snapshot(&args.snapshot)?;
    let doc: SnapshotDoc = serde_json::from_str(&text)
        .with_context(|| format!("parse {}", args.snapshot.display()))?;
    let snapshot = doc.into_snapshot()?;

    let device = BinningDevice::new(
        DeviceCapability {
            render_backend_count: args.render_backends,
            shader_engine_count: args.shader_engines,
        },
        device_config(&args),
    )?;
    debug!(
        capability = ?device.capability(),
        config = ?device.config(),
        family = %snapshot.family,
        "evaluating snapshot"
    );

    let decision = device.evaluate(&snapshot)?;
    let regs = BinningRegisters::from_decision(&decision);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report_json(&decision, &regs))?);
    } else {
        print!("{}", report_text(&decision, &regs));
    }
    Ok(())
}

fn read_snapshot(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("read snapshot from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

/// Command-line switches add to the environment; neither can re-enable what the other disabled.
fn device_config(args: &Args) -> BinningConfig {
    let env = BinningConfig::from_env();
    BinningConfig::new(
        args.no_dpbb || !env.dpbb_allowed,
        args.no_dfsm || !env.dfsm_allowed,
    )
}

fn punchout_name(mode: PunchoutMode) -> &'static str {
    match mode {
        PunchoutMode::Off => "off",
        PunchoutMode::Auto => "auto",
    }
}

fn report_text(decision: &BinDecision, regs: &BinningRegisters) -> String {
    let mut out = String::new();
    if decision.binning_enabled {
        out.push_str(&format!(
            "binning:  enabled, {}x{} bins, punch-out {}\n",
            decision.bin_size.width,
            decision.bin_size.height,
            punchout_name(decision.punchout_mode)
        ));
    } else if let Some(reason) = decision.disable_reason {
        out.push_str(&format!("binning:  disabled ({reason:?})\n"));
    } else {
        out.push_str("binning:  disabled\n");
    }
    out.push_str(&format!(
        "PA_SC_BINNER_CNTL_0 = 0x{:08x}\nDB_DFSM_CONTROL     = 0x{:08x}\n",
        regs.pa_sc_binner_cntl_0, regs.db_dfsm_control
    ));
    out
}

fn report_json(decision: &BinDecision, regs: &BinningRegisters) -> serde_json::Value {
    serde_json::json!({
        "binning_enabled": decision.binning_enabled,
        "disable_reason": decision.disable_reason.map(|reason| format!("{reason:?}")),
        "bin_size": {
            "width": decision.bin_size.width,
            "height": decision.bin_size.height,
        },
        "punchout": punchout_name(decision.punchout_mode),
        "disable_start_of_primitive": decision.disable_start_of_primitive,
        "tunables": {
            "context_states_per_bin": decision.tunables.context_states_per_bin,
            "persistent_states_per_bin": decision.tunables.persistent_states_per_bin,
            "fpovs_per_batch": decision.tunables.fpovs_per_batch,
        },
        "registers": {
            "PA_SC_BINNER_CNTL_0": format!("0x{:08x}", regs.pa_sc_binner_cntl_0),
            "DB_DFSM_CONTROL": format!("0x{:08x}", regs.db_dfsm_control),
        },
    })
}
