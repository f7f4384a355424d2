//! rav1e (librav1e) encoding configuration.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use super::encoder::{CodecBuilder, PassContext};
use super::error::PlanError;
use super::hdr::{HdrCarrier, HdrParam};
use super::plan::ArgList;
use super::types::{CodecFamily, EncodeOptions, RateMode, RateTarget};

fn default_speed() -> u32 {
    6
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rav1eTune {
    #[default]
    Psychovisual,
    Psnr,
}

impl Rav1eTune {
    pub fn as_str(self) -> &'static str {
        match self {
            Rav1eTune::Psychovisual => "Psychovisual",
            Rav1eTune::Psnr => "Psnr",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelRange {
    Limited,
    Full,
}

impl PixelRange {
    /// FFmpeg `-color_range` value
    pub fn as_str(self) -> &'static str {
        match self {
            PixelRange::Limited => "tv",
            PixelRange::Full => "pc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rav1eConfig {
    #[serde(default = "default_speed")]
    pub speed: u32, // 0-10, 10 is fastest

    #[serde(default)]
    pub tune: Rav1eTune,

    #[serde(default)]
    pub tiles: Option<u32>,

    #[serde(default)]
    pub pixel_range: Option<PixelRange>,
}

impl Default for Rav1eConfig {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            tune: Rav1eTune::default(),
            tiles: None,
            pixel_range: None,
        }
    }
}

impl CodecBuilder for Rav1eConfig {
    fn family(&self) -> CodecFamily {
        CodecFamily::Rav1e
    }

    fn encoder_name(&self) -> &'static str {
        "librav1e"
    }

    fn pass_one_format(&self) -> &'static str {
        "matroska"
    }

    fn value_range(&self, mode: RateMode) -> Option<RangeInclusive<u32>> {
        match mode {
            RateMode::Qp => Some(0..=255),
            RateMode::Crf | RateMode::Bitrate => None,
        }
    }

    fn validate(&self, _opts: &EncodeOptions) -> Result<(), PlanError> {
        if self.speed > 10 {
            return Err(PlanError::invalid(
                "encoder.speed",
                format!("rav1e speed {} is outside 0..=10", self.speed),
            ));
        }
        if self.tiles == Some(0) {
            return Err(PlanError::invalid("encoder.tiles", "tiles must be at least 1"));
        }
        Ok(())
    }

    fn codec_args(&self, args: &mut ArgList, ctx: &PassContext<'_>) {
        args.flag("-speed", self.speed.to_string());
        match ctx.target {
            RateTarget::Qp(qp) => {
                args.flag("-qp", qp.to_string());
            }
            RateTarget::Bitrate(bitrate) => {
                args.flag("-b:v", bitrate.as_str());
            }
            RateTarget::Crf(_) => {}
        }
        args.flag_opt("-tiles", self.tiles);
        args.flag_opt("-color_range", self.pixel_range.map(PixelRange::as_str));
    }

    fn bundle_flag(&self) -> Option<&'static str> {
        Some("-rav1e-params")
    }

    // HDR goes out as stream flags; the bundle only carries the tune
    fn bundle_params(&self, _ctx: &PassContext<'_>, _hdr: &[HdrParam]) -> Vec<String> {
        vec![format!("tune={}", self.tune.as_str())]
    }

    fn hdr_carrier(&self) -> HdrCarrier {
        HdrCarrier::StreamFlags
    }
}
