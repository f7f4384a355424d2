//! AV1 encoding configuration for libsvtav1.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use super::encoder::{CodecBuilder, PassContext, user_bundle_params};
use super::error::PlanError;
use super::hdr::HdrParam;
use super::plan::ArgList;
use super::types::{CodecFamily, EncodeOptions, RateMode, RateTarget};

fn default_svt_preset() -> u32 {
    8
}

/// SVT-AV1 settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SvtAv1Config {
    #[serde(default = "default_svt_preset")]
    pub preset: u32, // 0-13, default 8

    #[serde(default)]
    pub tune: Option<u32>, // 0=visual (PSNR), 1=SSIM, 2=VMAF

    #[serde(default)]
    pub film_grain: u32, // 0-50

    #[serde(default)]
    pub film_grain_denoise: bool, // denoise before grain synthesis

    /// Raw `key=value` entries for `-svtav1-params`
    #[serde(default)]
    pub svtav1_params: Vec<String>,
}

impl Default for SvtAv1Config {
    fn default() -> Self {
        Self {
            preset: default_svt_preset(),
            tune: None,
            film_grain: 0,
            film_grain_denoise: false,
            svtav1_params: Vec::new(),
        }
    }
}

impl CodecBuilder for SvtAv1Config {
    fn family(&self) -> CodecFamily {
        CodecFamily::SvtAv1
    }

    fn encoder_name(&self) -> &'static str {
        "libsvtav1"
    }

    fn pass_one_format(&self) -> &'static str {
        "matroska"
    }

    fn value_range(&self, mode: RateMode) -> Option<RangeInclusive<u32>> {
        match mode {
            RateMode::Crf => Some(1..=63),
            RateMode::Qp | RateMode::Bitrate => None,
        }
    }

    fn validate(&self, _opts: &EncodeOptions) -> Result<(), PlanError> {
        if self.preset > 13 {
            return Err(PlanError::invalid(
                "encoder.preset",
                format!("SVT-AV1 preset {} is outside 0..=13", self.preset),
            ));
        }
        if let Some(tune) = self.tune {
            if tune > 2 {
                return Err(PlanError::invalid(
                    "encoder.tune",
                    format!("SVT-AV1 tune {} is outside 0..=2", tune),
                ));
            }
        }
        if self.film_grain > 50 {
            return Err(PlanError::invalid(
                "encoder.film_grain",
                format!("film grain {} is outside 0..=50", self.film_grain),
            ));
        }
        Ok(())
    }

    fn codec_args(&self, args: &mut ArgList, ctx: &PassContext<'_>) {
        args.flag("-preset", self.preset.to_string());
        match ctx.target {
            RateTarget::Crf(crf) => {
                args.flag("-crf", crf.to_string());
            }
            RateTarget::Bitrate(bitrate) => {
                args.flag("-b:v", bitrate.as_str());
            }
            RateTarget::Qp(_) => {}
        }
    }

    fn bundle_flag(&self) -> Option<&'static str> {
        Some("-svtav1-params")
    }

    fn bundle_params(&self, _ctx: &PassContext<'_>, hdr: &[HdrParam]) -> Vec<String> {
        let mut params = Vec::new();
        if let Some(tune) = self.tune {
            params.push(format!("tune={}", tune));
        }
        if self.film_grain > 0 {
            params.push(format!("film-grain={}", self.film_grain));
            params.push(format!(
                "film-grain-denoise={}",
                u8::from(self.film_grain_denoise)
            ));
        }
        params.extend(user_bundle_params(&self.svtav1_params));
        params.extend(hdr.iter().map(ToString::to_string));
        params
    }
}
