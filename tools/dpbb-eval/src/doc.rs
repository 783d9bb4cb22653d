//! JSON description of a pipeline snapshot.
//!
//! ```json
//! {
//!   "family": "raven",
//!   "color_targets": [{ "bytes_per_pixel": 4 }, null],
//!   "depth_stencil": { "has_stencil": true, "samples": 1 },
//!   "samples": 1,
//!   "blend": { "write_mask": "0xffffffff", "blend_enable": "0x0" },
//!   "dsa": { "depth_enabled": true, "stencil_enabled": false, "can_write": true },
//!   "db_shader_control": "0x10"
//! }
//! ```
//!
//! Masks and control words accept either JSON numbers or hex strings.

use anyhow::{anyhow, bail, Context, Result};
use dpbb::{
    BlendState, ChipFamily, ColorTarget, DbShaderControl, DepthStencilState, DepthStencilTarget,
    FramebufferState, PipelineSnapshot, TargetMask, ZOrder, MAX_COLOR_TARGETS,
};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotDoc {
    family: String,
    #[serde(default)]
    color_targets: Vec<Option<ColorTargetDoc>>,
    #[serde(default)]
    depth_stencil: Option<DepthStencilTargetDoc>,
    #[serde(default = "one")]
    samples: u32,
    /// Defaults to `samples`.
    #[serde(default)]
    color_samples: Option<u32>,
    #[serde(default = "one")]
    ps_iter_samples: u32,
    #[serde(default)]
    blend: Option<BlendDoc>,
    #[serde(default)]
    dsa: Option<DsaDoc>,
    /// Defaults to EARLY_Z_THEN_LATE_Z with nothing else set.
    #[serde(default)]
    db_shader_control: Option<Word>,
    #[serde(default)]
    force_off: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ColorTargetDoc {
    bytes_per_pixel: u32,
    #[serde(default = "all_components")]
    component_mask: u8,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct DepthStencilTargetDoc {
    #[serde(default)]
    has_stencil: bool,
    #[serde(default = "one")]
    samples: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct BlendDoc {
    #[serde(default)]
    alpha_to_coverage: bool,
    #[serde(default)]
    write_mask: Option<Word>,
    #[serde(default)]
    blend_enable: Option<Word>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct DsaDoc {
    #[serde(default)]
    depth_enabled: bool,
    #[serde(default)]
    stencil_enabled: bool,
    #[serde(default)]
    can_write: bool,
}

/// A 32-bit register value written as a number or a string (`"0x1f"`, `"31"`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Word {
    Number(u32),
    Text(String),
}

impl Word {
    fn value(&self) -> Result<u32> {
        match self {
            Word::Number(v) => Ok(*v),
            Word::Text(s) => parse_u32(s),
        }
    }
}

fn one() -> u32 {
    1
}

fn all_components() -> u8 {
    0xf
}

fn parse_u32(s: &str) -> Result<u32> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(&hex.replace('_', ""), 16),
        None => s.replace('_', "").parse(),
    };
    parsed.with_context(|| format!("invalid 32-bit value {s:?}"))
}

impl SnapshotDoc {
    pub fn into_snapshot(self) -> Result<PipelineSnapshot> {
        let family = ChipFamily::from_name(&self.family)
            .ok_or_else(|| anyhow!("unknown chip family {:?}", self.family))?;

        if self.color_targets.len() > MAX_COLOR_TARGETS {
            bail!(
                "{} color targets given, at most {MAX_COLOR_TARGETS} are supported",
                self.color_targets.len()
            );
        }

        let framebuffer = FramebufferState {
            color_targets: self
                .color_targets
                .into_iter()
                .map(|target| {
                    target.map(|t| ColorTarget {
                        bytes_per_pixel: t.bytes_per_pixel,
                        component_mask: t.component_mask & 0xf,
                    })
                })
                .collect(),
            zsbuf: self.depth_stencil.map(|zs| DepthStencilTarget {
                has_stencil: zs.has_stencil,
                sample_count: zs.samples,
            }),
            nr_samples: self.samples,
            nr_color_samples: self.color_samples.unwrap_or(self.samples),
        };

        let blend = self
            .blend
            .map(|blend| -> Result<BlendState> {
                Ok(BlendState {
                    alpha_to_coverage: blend.alpha_to_coverage,
                    cb_target_enabled_4bit: TargetMask(
                        blend.write_mask.map(|w| w.value()).transpose()?.unwrap_or(u32::MAX),
                    ),
                    blend_enable_4bit: TargetMask(
                        blend.blend_enable.map(|w| w.value()).transpose()?.unwrap_or(0),
                    ),
                })
            })
            .transpose()
            .context("invalid blend state")?;

        let dsa = self.dsa.map(|dsa| DepthStencilState {
            depth_enabled: dsa.depth_enabled,
            stencil_enabled: dsa.stencil_enabled,
            db_can_write: dsa.can_write,
        });

        let db_shader_control = match self.db_shader_control {
            Some(word) => DbShaderControl::from_bits_retain(
                word.value().context("invalid db_shader_control")?,
            ),
            None => DbShaderControl::empty().with_z_order(ZOrder::EarlyZThenLateZ),
        };

        Ok(PipelineSnapshot {
            chip_class: family.chip_class(),
            family,
            framebuffer,
            blend,
            dsa,
            db_shader_control,
            ps_iter_samples: self.ps_iter_samples,
            force_off: self.force_off,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(json: &str) -> Result<PipelineSnapshot> {
        serde_json::from_str::<SnapshotDoc>(json)?.into_snapshot()
    }

    #[test]
    fn minimal_document_uses_defaults() {
        let snapshot = parse(r#"{ "family": "raven" }"#).unwrap();
        assert_eq!(snapshot.family, ChipFamily::Raven);
        assert_eq!(snapshot.framebuffer, FramebufferState::default());
        assert_eq!(snapshot.blend, None);
        assert_eq!(snapshot.dsa, None);
        assert_eq!(snapshot.db_shader_control.z_order(), ZOrder::EarlyZThenLateZ);
        assert_eq!(snapshot.ps_iter_samples, 1);
    }

    #[test]
    fn full_document() {
        let snapshot = parse(
            r#"{
                "family": "vega10",
                "color_targets": [{ "bytes_per_pixel": 8 }, null, { "bytes_per_pixel": 4, "component_mask": 1 }],
                "depth_stencil": { "has_stencil": true, "samples": 4 },
                "samples": 4,
                "color_samples": 2,
                "blend": { "write_mask": "0xf0f", "blend_enable": 15 },
                "dsa": { "depth_enabled": true, "can_write": true },
                "db_shader_control": "0x50"
            }"#,
        )
        .unwrap();

        assert_eq!(snapshot.framebuffer.colorbuf_enabled_4bit(), TargetMask(0x10f));
        assert_eq!(snapshot.framebuffer.nr_samples, 4);
        assert_eq!(snapshot.framebuffer.nr_color_samples, 2);
        assert_eq!(
            snapshot.framebuffer.zsbuf,
            Some(DepthStencilTarget {
                has_stencil: true,
                sample_count: 4
            })
        );
        assert_eq!(
            snapshot.blend,
            Some(BlendState {
                alpha_to_coverage: false,
                cb_target_enabled_4bit: TargetMask(0xf0f),
                blend_enable_4bit: TargetMask(0xf),
            })
        );
        assert_eq!(
            snapshot.dsa,
            Some(DepthStencilState {
                depth_enabled: true,
                stencil_enabled: false,
                db_can_write: true,
            })
        );
        assert!(snapshot
            .db_shader_control
            .contains(DbShaderControl::KILL_ENABLE));
        assert_eq!(snapshot.db_shader_control.z_order(), ZOrder::EarlyZThenLateZ);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse(r#"{ "family": "navi10" }"#).is_err());
        assert!(parse(r#"{ "family": "raven", "bogus": 1 }"#).is_err());
        assert!(parse(r#"{ "family": "raven", "db_shader_control": "0xzz" }"#).is_err());
        assert!(parse(
            r#"{ "family": "raven", "color_targets": [null, null, null, null, null, null, null, null, null] }"#
        )
        .is_err());
    }

    #[test]
    fn parse_u32_accepts_hex_and_decimal() {
        assert_eq!(parse_u32("0x1F").unwrap(), 31);
        assert_eq!(parse_u32("0XFFFF_FFFF").unwrap(), u32::MAX);
        assert_eq!(parse_u32(" 42 ").unwrap(), 42);
        assert!(parse_u32("-1").is_err());
    }
}
