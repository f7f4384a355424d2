//! x264 (libx264) encoding configuration.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use super::encoder::{CodecBuilder, PassContext, user_bundle_params};
use super::error::PlanError;
use super::hdr::HdrParam;
use super::plan::ArgList;
use super::types::{Chroma, CodecFamily, EncodeOptions, RateMode, RateTarget};

/// Speed/efficiency presets shared by x264 and x265
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum X26xPreset {
    Ultrafast,
    Superfast,
    Veryfast,
    Faster,
    Fast,
    #[default]
    Medium,
    Slow,
    Slower,
    Veryslow,
    Placebo,
}

impl X26xPreset {
    pub fn as_str(self) -> &'static str {
        match self {
            X26xPreset::Ultrafast => "ultrafast",
            X26xPreset::Superfast => "superfast",
            X26xPreset::Veryfast => "veryfast",
            X26xPreset::Faster => "faster",
            X26xPreset::Fast => "fast",
            X26xPreset::Medium => "medium",
            X26xPreset::Slow => "slow",
            X26xPreset::Slower => "slower",
            X26xPreset::Veryslow => "veryslow",
            X26xPreset::Placebo => "placebo",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum X264Tune {
    Film,
    Animation,
    Grain,
    Stillimage,
    Psnr,
    Ssim,
    Zerolatency,
    Fastdecode,
}

impl X264Tune {
    pub fn as_str(self) -> &'static str {
        match self {
            X264Tune::Film => "film",
            X264Tune::Animation => "animation",
            X264Tune::Grain => "grain",
            X264Tune::Stillimage => "stillimage",
            X264Tune::Psnr => "psnr",
            X264Tune::Ssim => "ssim",
            X264Tune::Zerolatency => "zerolatency",
            X264Tune::Fastdecode => "fastdecode",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum X264Profile {
    Baseline,
    Main,
    High,
    High10,
    High422,
    High444,
}

impl X264Profile {
    pub fn as_str(self) -> &'static str {
        match self {
            X264Profile::Baseline => "baseline",
            X264Profile::Main => "main",
            X264Profile::High => "high",
            X264Profile::High10 => "high10",
            X264Profile::High422 => "high422",
            X264Profile::High444 => "high444",
        }
    }
}

/// x264-specific encoding settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct X264Config {
    #[serde(default)]
    pub preset: X26xPreset,

    #[serde(default)]
    pub tune: Option<X264Tune>,

    #[serde(default)]
    pub profile: Option<X264Profile>,

    /// Raw `key=value` entries for `-x264-params`
    #[serde(default)]
    pub x264_params: Vec<String>,
}

impl CodecBuilder for X264Config {
    fn family(&self) -> CodecFamily {
        CodecFamily::X264
    }

    fn encoder_name(&self) -> &'static str {
        "libx264"
    }

    fn pass_one_format(&self) -> &'static str {
        "mp4"
    }

    fn value_range(&self, mode: RateMode) -> Option<RangeInclusive<u32>> {
        match mode {
            RateMode::Crf => Some(0..=51),
            RateMode::Qp => Some(0..=69),
            RateMode::Bitrate => None,
        }
    }

    fn validate(&self, opts: &EncodeOptions) -> Result<(), PlanError> {
        let (Some(profile), Some(layout)) = (self.profile, opts.pixel_layout()) else {
            return Ok(());
        };
        let ok = match profile {
            X264Profile::Baseline | X264Profile::Main | X264Profile::High => {
                layout.bit_depth == 8 && layout.chroma == Chroma::Yuv420
            }
            X264Profile::High10 => layout.bit_depth <= 10 && layout.chroma == Chroma::Yuv420,
            X264Profile::High422 => {
                layout.bit_depth <= 10 && matches!(layout.chroma, Chroma::Yuv420 | Chroma::Yuv422)
            }
            X264Profile::High444 => true,
        };
        if ok {
            Ok(())
        } else {
            Err(PlanError::unsupported(
                "profile",
                format!(
                    "x264 profile {} cannot encode pixel format {}",
                    profile.as_str(),
                    opts.pix_fmt.as_deref().unwrap_or_default()
                ),
            ))
        }
    }

    fn codec_args(&self, args: &mut ArgList, ctx: &PassContext<'_>) {
        args.flag_opt("-tune", self.tune.map(X264Tune::as_str));
        args.flag_opt("-profile:v", self.profile.map(X264Profile::as_str));
        args.flag("-preset", self.preset.as_str());

        match ctx.target {
            RateTarget::Crf(crf) => args.flag("-crf", crf.to_string()),
            RateTarget::Qp(qp) => args.flag("-qp", qp.to_string()),
            RateTarget::Bitrate(bitrate) => args.flag("-b:v", bitrate.as_str()),
        };
    }

    fn bundle_flag(&self) -> Option<&'static str> {
        Some("-x264-params")
    }

    fn bundle_params(&self, _ctx: &PassContext<'_>, hdr: &[HdrParam]) -> Vec<String> {
        user_bundle_params(&self.x264_params)
            .chain(hdr.iter().map(ToString::to_string))
            .collect()
    }
}
