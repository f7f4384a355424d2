//! VP9-specific encoding configuration.
//!
//! libvpx-vp9 measures before it encodes: CRF runs two passes as well
//! unless `single_pass` is set.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use super::encoder::{CodecBuilder, PassContext};
use super::error::PlanError;
use super::hdr::HdrCarrier;
use super::plan::{ArgList, Pass};
use super::types::{Chroma, CodecFamily, EncodeOptions, RateMode, RateTarget};

fn default_speed() -> u32 {
    1
}
fn default_row_mt() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vp9Quality {
    #[default]
    Good,
    Best,
    Realtime,
}

impl Vp9Quality {
    pub fn as_str(self) -> &'static str {
        match self {
            Vp9Quality::Good => "good",
            Vp9Quality::Best => "best",
            Vp9Quality::Realtime => "realtime",
        }
    }
}

/// VP9-specific encoding settings (libvpx-vp9)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vp9Config {
    #[serde(default)]
    pub quality: Vp9Quality,

    #[serde(default = "default_speed")]
    pub speed: u32, // 0-8, final pass only

    #[serde(default = "default_row_mt")]
    pub row_mt: bool,

    #[serde(default)]
    pub profile: Option<u8>, // 0-3

    /// Skip the measurement pass for CRF
    #[serde(default)]
    pub single_pass: bool,
}

impl Default for Vp9Config {
    fn default() -> Self {
        Self {
            quality: Vp9Quality::default(),
            speed: default_speed(),
            row_mt: default_row_mt(),
            profile: None,
            single_pass: false,
        }
    }
}

impl CodecBuilder for Vp9Config {
    fn family(&self) -> CodecFamily {
        CodecFamily::Vp9
    }

    fn encoder_name(&self) -> &'static str {
        "libvpx-vp9"
    }

    fn pass_one_format(&self) -> &'static str {
        "webm"
    }

    fn value_range(&self, mode: RateMode) -> Option<RangeInclusive<u32>> {
        match mode {
            RateMode::Crf => Some(0..=63),
            RateMode::Qp | RateMode::Bitrate => None,
        }
    }

    fn needs_measurement_pass(&self, target: &RateTarget) -> bool {
        match target {
            RateTarget::Bitrate(_) => true,
            RateTarget::Crf(_) => !self.single_pass,
            RateTarget::Qp(_) => false,
        }
    }

    fn validate(&self, opts: &EncodeOptions) -> Result<(), PlanError> {
        if self.speed > 8 {
            return Err(PlanError::invalid(
                "encoder.speed",
                format!("VP9 speed {} is outside 0..=8", self.speed),
            ));
        }
        let Some(profile) = self.profile else {
            return Ok(());
        };
        if profile > 3 {
            return Err(PlanError::invalid(
                "encoder.profile",
                format!("VP9 profile {} is outside 0..=3", profile),
            ));
        }
        let Some(layout) = opts.pixel_layout() else {
            return Ok(());
        };

        let high_chroma = matches!(layout.chroma, Chroma::Yuv422 | Chroma::Yuv440 | Chroma::Yuv444);
        let high_depth = matches!(layout.bit_depth, 10 | 12);
        let ok = match profile {
            0 => layout.bit_depth == 8 && layout.chroma == Chroma::Yuv420,
            1 => layout.bit_depth == 8 && high_chroma,
            2 => high_depth && layout.chroma == Chroma::Yuv420,
            _ => high_depth && high_chroma,
        };
        if ok {
            Ok(())
        } else {
            Err(PlanError::unsupported(
                "profile",
                format!(
                    "VP9 profile {} cannot encode pixel format {}",
                    profile,
                    opts.pix_fmt.as_deref().unwrap_or_default()
                ),
            ))
        }
    }

    fn codec_args(&self, args: &mut ArgList, ctx: &PassContext<'_>) {
        match ctx.target {
            RateTarget::Crf(crf) => {
                // CQCap: libvpx-vp9 needs a non-zero -b:v when capped by a max rate
                let cap = ctx.opts.max_rate_kbps.map(|k| format!("{}k", k));
                args.flag("-b:v", cap.unwrap_or_else(|| "0".to_string()));
                args.flag("-crf", crf.to_string());
            }
            RateTarget::Bitrate(bitrate) => {
                args.flag("-b:v", bitrate.as_str());
            }
            // rejected by value_range before assembly
            RateTarget::Qp(_) => {}
        }

        if ctx.pass == Pass::First {
            args.flag("-quality", Vp9Quality::Good.as_str());
        } else {
            args.flag("-quality", self.quality.as_str());
            args.flag("-speed", self.speed.to_string());
        }

        if self.row_mt {
            args.flag("-row-mt", "1");
        }
        args.flag_opt("-profile:v", self.profile);
    }

    fn hdr_carrier(&self) -> HdrCarrier {
        HdrCarrier::StreamFlags
    }
}
