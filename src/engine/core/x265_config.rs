//! x265 (libx265) encoding configuration.
//!
//! Unlike the other codecs, x265 takes its pass number inside
//! `-x265-params` rather than through `-pass`.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use super::encoder::{CodecBuilder, PassContext, user_bundle_params};
use super::error::PlanError;
use super::hdr::HdrParam;
use super::plan::ArgList;
use super::types::{Chroma, CodecFamily, EncodeOptions, RateMode, RateTarget};
use super::x264_config::X26xPreset;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum X265Tune {
    Psnr,
    Ssim,
    Grain,
    Zerolatency,
    Fastdecode,
    Animation,
}

impl X265Tune {
    pub fn as_str(self) -> &'static str {
        match self {
            X265Tune::Psnr => "psnr",
            X265Tune::Ssim => "ssim",
            X265Tune::Grain => "grain",
            X265Tune::Zerolatency => "zerolatency",
            X265Tune::Fastdecode => "fastdecode",
            X265Tune::Animation => "animation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum X265Profile {
    #[serde(rename = "main")]
    Main,
    #[serde(rename = "main10")]
    Main10,
    #[serde(rename = "main12")]
    Main12,
    #[serde(rename = "main422-10")]
    Main422_10,
    #[serde(rename = "main444-8")]
    Main444_8,
    #[serde(rename = "main444-10")]
    Main444_10,
}

impl X265Profile {
    pub fn as_str(self) -> &'static str {
        match self {
            X265Profile::Main => "main",
            X265Profile::Main10 => "main10",
            X265Profile::Main12 => "main12",
            X265Profile::Main422_10 => "main422-10",
            X265Profile::Main444_8 => "main444-8",
            X265Profile::Main444_10 => "main444-10",
        }
    }
}

/// x265-specific encoding settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct X265Config {
    #[serde(default)]
    pub preset: X26xPreset,

    #[serde(default)]
    pub tune: Option<X265Tune>,

    #[serde(default)]
    pub profile: Option<X265Profile>,

    /// Every frame is a keyframe (`keyint=1`)
    #[serde(default)]
    pub intra_encoding: bool,

    /// Raw `key=value` entries for `-x265-params`
    #[serde(default)]
    pub x265_params: Vec<String>,
}

impl CodecBuilder for X265Config {
    fn family(&self) -> CodecFamily {
        CodecFamily::X265
    }

    fn encoder_name(&self) -> &'static str {
        "libx265"
    }

    fn pass_one_format(&self) -> &'static str {
        "mp4"
    }

    fn value_range(&self, mode: RateMode) -> Option<RangeInclusive<u32>> {
        match mode {
            RateMode::Crf | RateMode::Qp => Some(0..=51),
            RateMode::Bitrate => None,
        }
    }

    fn validate(&self, opts: &EncodeOptions) -> Result<(), PlanError> {
        let (Some(profile), Some(layout)) = (self.profile, opts.pixel_layout()) else {
            return Ok(());
        };
        let depth = layout.bit_depth;
        let ok = match profile {
            X265Profile::Main => depth == 8 && layout.chroma == Chroma::Yuv420,
            X265Profile::Main10 => depth <= 10 && layout.chroma == Chroma::Yuv420,
            X265Profile::Main12 => depth <= 12 && layout.chroma == Chroma::Yuv420,
            X265Profile::Main422_10 => {
                depth <= 10 && matches!(layout.chroma, Chroma::Yuv420 | Chroma::Yuv422)
            }
            X265Profile::Main444_8 => depth == 8,
            X265Profile::Main444_10 => depth <= 10,
        };
        if ok {
            Ok(())
        } else {
            Err(PlanError::unsupported(
                "profile",
                format!(
                    "x265 profile {} cannot encode pixel format {}",
                    profile.as_str(),
                    opts.pix_fmt.as_deref().unwrap_or_default()
                ),
            ))
        }
    }

    fn codec_args(&self, args: &mut ArgList, ctx: &PassContext<'_>) {
        args.flag_opt("-tune", self.tune.map(X265Tune::as_str));
        args.flag_opt("-profile:v", self.profile.map(X265Profile::as_str));
        args.flag("-preset", self.preset.as_str());

        match ctx.target {
            RateTarget::Crf(crf) => args.flag("-crf", crf.to_string()),
            RateTarget::Qp(qp) => args.flag("-qp", qp.to_string()),
            RateTarget::Bitrate(bitrate) => args.flag("-b:v", bitrate.as_str()),
        };
    }

    // pass=N travels in the bundle
    fn pass_args(&self, _args: &mut ArgList, _ctx: &PassContext<'_>) {}

    fn bundle_flag(&self) -> Option<&'static str> {
        Some("-x265-params")
    }

    fn bundle_params(&self, ctx: &PassContext<'_>, hdr: &[HdrParam]) -> Vec<String> {
        let mut params: Vec<String> = user_bundle_params(&self.x265_params).collect();
        params.extend(hdr.iter().map(ToString::to_string));
        if self.intra_encoding {
            params.push("keyint=1".to_string());
        }
        if let Some(n) = ctx.pass.number() {
            params.push(format!("pass={}", n));
        }
        params
    }
}
