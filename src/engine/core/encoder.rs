//! Codec dispatch and plan assembly.
//!
//! Every codec implements [`CodecBuilder`]; [`build_plans`] owns the argument
//! order shared by all of them and decides the pass topology.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::RangeInclusive;
use tracing::debug;

use super::av1_config::SvtAv1Config;
use super::ending::{apply_discard_tail, apply_output_tail};
use super::error::PlanError;
use super::hdr::{HdrCarrier, HdrParam, SideData, project_hdr, warn_if_low_depth};
use super::plan::{ArgList, InvocationPlan, Pass, PassLogHandle, PlanTag};
use super::rav1e_config::Rav1eConfig;
use super::types::{CodecFamily, EncodeOptions, RateMode, RateTarget};
use super::vp9_config::Vp9Config;
use super::x264_config::X264Config;
use super::x265_config::X265Config;

/// Everything a codec needs to emit its flags for one pass
pub struct PassContext<'a> {
    pub opts: &'a EncodeOptions,
    pub target: &'a RateTarget,
    pub pass: Pass,
    pub pass_log: Option<&'a PassLogHandle>,
}

/// Codec-specific argument grammar.
pub trait CodecBuilder {
    fn family(&self) -> CodecFamily;

    /// FFmpeg encoder name passed to `-c:v:0`
    fn encoder_name(&self) -> &'static str;

    /// Muxer used for the discarded output of pass 1
    fn pass_one_format(&self) -> &'static str;

    /// Legal values for a quality mode; `None` means the mode is unsupported
    fn value_range(&self, mode: RateMode) -> Option<RangeInclusive<u32>>;

    fn supports(&self, mode: RateMode) -> bool {
        mode == RateMode::Bitrate || self.value_range(mode).is_some()
    }

    /// Whether the target needs a measurement pass before the real encode
    fn needs_measurement_pass(&self, target: &RateTarget) -> bool {
        matches!(target, RateTarget::Bitrate(_))
    }

    /// Codec-specific option checks (profile vs pixel format, setting ranges)
    fn validate(&self, _opts: &EncodeOptions) -> Result<(), PlanError> {
        Ok(())
    }

    /// Preset, tune, profile and rate-control flags
    fn codec_args(&self, args: &mut ArgList, ctx: &PassContext<'_>);

    /// Pass number flags for two-pass encodes
    fn pass_args(&self, args: &mut ArgList, ctx: &PassContext<'_>) {
        if let Some(n) = ctx.pass.number() {
            args.flag("-pass", n.to_string());
        }
    }

    /// `-<codec>-params` flag, for codecs that take a `key=value:...` bundle
    fn bundle_flag(&self) -> Option<&'static str> {
        None
    }

    /// Bundle entries in order; HDR fragments are passed in for bundled carriers
    fn bundle_params(&self, _ctx: &PassContext<'_>, hdr: &[HdrParam]) -> Vec<String> {
        hdr.iter().map(ToString::to_string).collect()
    }

    fn hdr_carrier(&self) -> HdrCarrier {
        HdrCarrier::Bundled
    }
}

/// Target codec together with its codec-specific settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "codec", rename_all = "snake_case")]
pub enum Encoder {
    X264(X264Config),
    X265(X265Config),
    Vp9(Vp9Config),
    SvtAv1(SvtAv1Config),
    Rav1e(Rav1eConfig),
}

impl Encoder {
    pub fn builder(&self) -> &dyn CodecBuilder {
        match self {
            Encoder::X264(c) => c,
            Encoder::X265(c) => c,
            Encoder::Vp9(c) => c,
            Encoder::SvtAv1(c) => c,
            Encoder::Rav1e(c) => c,
        }
    }

    pub fn family(&self) -> CodecFamily {
        self.builder().family()
    }
}

/// Compile options into invocation plans using the thread RNG for the pass log.
///
/// Returns an empty list for the explicit no-op request (no rate-control mode
/// and no values), one plan for single-pass encodes, two for two-pass.
pub fn build_plans(
    opts: &EncodeOptions,
    side_data: Option<&SideData>,
    null_sink: &str,
) -> Result<Vec<InvocationPlan>, PlanError> {
    build_plans_with_rng(opts, side_data, null_sink, &mut rand::thread_rng())
}

/// Same as [`build_plans`] with a caller-supplied RNG
pub fn build_plans_with_rng<R: RngCore + ?Sized>(
    opts: &EncodeOptions,
    side_data: Option<&SideData>,
    null_sink: &str,
    rng: &mut R,
) -> Result<Vec<InvocationPlan>, PlanError> {
    let Some(target) = opts.rate_control.resolve()? else {
        debug!("no rate-control mode selected, nothing to plan");
        return Ok(Vec::new());
    };

    let builder = opts.encoder.builder();
    validate_target(builder, &target)?;
    opts.validate()?;
    builder.validate(opts)?;

    let disable_hdr = opts.disable_hdr || opts.transforms.remove_hdr;
    let hdr = project_hdr(side_data, disable_hdr, builder.family());
    warn_if_low_depth(&hdr, opts.pixel_layout());

    let plans = if builder.needs_measurement_pass(&target) {
        if null_sink.trim().is_empty() {
            return Err(PlanError::invalid("null_sink", "null sink must not be empty"));
        }
        let pass_log = PassLogHandle::with_rng(&opts.temp_dir, rng);
        vec![
            assemble(builder, opts, &target, &hdr, Pass::First, Some(&pass_log), null_sink),
            assemble(builder, opts, &target, &hdr, Pass::Second, Some(&pass_log), null_sink),
        ]
    } else {
        vec![assemble(builder, opts, &target, &hdr, Pass::Single, None, null_sink)]
    };

    for plan in &plans {
        debug!(name = %plan.name, codec = builder.encoder_name(), "{}", plan.display());
    }
    Ok(plans)
}

fn validate_target(builder: &dyn CodecBuilder, target: &RateTarget) -> Result<(), PlanError> {
    let mode = target.mode();
    if !builder.supports(mode) {
        return Err(PlanError::unsupported(
            "rate_control",
            format!("{} does not support {} mode", builder.encoder_name(), mode.label()),
        ));
    }

    let field = match mode {
        RateMode::Crf => "rate_control.crf",
        RateMode::Qp => "rate_control.qp",
        RateMode::Bitrate => return Ok(()),
    };
    if let (Some(range), Some(value)) = (builder.value_range(mode), target.quality_value()) {
        if !range.contains(&value) {
            return Err(PlanError::invalid(
                field,
                format!(
                    "{} {} is outside {}..={} for {}",
                    mode.label(),
                    value,
                    range.start(),
                    range.end(),
                    builder.encoder_name()
                ),
            ));
        }
    }
    Ok(())
}

fn plan_name(pass: Pass, mode: RateMode) -> String {
    let prefix = match pass {
        Pass::Single => "Single pass",
        Pass::First => "First pass",
        Pass::Second => "Second pass",
    };
    format!("{} {}", prefix, mode.label())
}

fn assemble(
    builder: &dyn CodecBuilder,
    opts: &EncodeOptions,
    target: &RateTarget,
    hdr: &[HdrParam],
    pass: Pass,
    pass_log: Option<&PassLogHandle>,
    null_sink: &str,
) -> InvocationPlan {
    let ctx = PassContext {
        opts,
        target,
        pass,
        pass_log,
    };
    let mut args = ArgList::new();

    // Global: fast seek goes before the input, accurate seek after it
    args.arg("-y");
    if opts.trim.fast_seek {
        apply_trim(&mut args, opts);
    }
    args.flag("-i", opts.source.to_string_lossy());
    if !opts.trim.fast_seek {
        apply_trim(&mut args, opts);
    }

    // Stream mapping and codec selection
    args.flag("-map", format!("0:{}", opts.video_track));
    if opts.strip_metadata {
        args.flag("-map_metadata", "-1");
    }
    args.flag("-c:v:0", builder.encoder_name());

    if let Some(filters) = opts.transforms.filter_chain().to_arg() {
        args.flag("-vf", filters);
    }
    if let Some(pix_fmt) = &opts.pix_fmt {
        args.flag("-pix_fmt", pix_fmt.trim());
    }

    // Quality, rate control and pass plumbing
    builder.codec_args(&mut args, &ctx);
    args.flag_opt("-maxrate:v", opts.max_rate_kbps.map(|k| format!("{}k", k)));
    args.flag_opt("-bufsize:v", opts.buffer_size_kbps.map(|k| format!("{}k", k)));
    builder.pass_args(&mut args, &ctx);
    if let Some(log) = pass_log {
        args.flag("-passlogfile", log.as_arg());
    }

    // Parameter bundle, with HDR folded in for bundled carriers
    let carrier = builder.hdr_carrier();
    let bundled_hdr: &[HdrParam] = match carrier {
        HdrCarrier::Bundled => hdr,
        HdrCarrier::StreamFlags => &[],
    };
    if let Some(flag) = builder.bundle_flag() {
        let params: Vec<String> = builder
            .bundle_params(&ctx, bundled_hdr)
            .into_iter()
            .map(|p| p.trim().trim_matches(':').to_string())
            .filter(|p| !p.is_empty())
            .collect();
        if !params.is_empty() {
            args.flag(flag, params.join(":"));
        }
    }
    if carrier == HdrCarrier::StreamFlags {
        for param in hdr {
            args.extend(param.as_flag());
        }
    }

    args.flag_opt("-max_muxing_queue_size", opts.max_muxing_queue_size);

    let mut tags = BTreeSet::from([PlanTag::Ffmpeg]);
    if pass.is_final() {
        apply_output_tail(&mut args, opts);
        tags.insert(PlanTag::Output);
    } else {
        apply_discard_tail(&mut args, opts, builder.pass_one_format(), null_sink);
    }

    InvocationPlan {
        name: plan_name(pass, target.mode()),
        executable: opts.ffmpeg.trim().to_string(),
        args: args.into_vec(),
        abort_on_failure: !pass.is_final(),
        tags,
    }
}

fn apply_trim(args: &mut ArgList, opts: &EncodeOptions) {
    let trim = &opts.trim;
    if trim.is_empty() {
        return;
    }
    args.flag_opt("-ss", trim.start());
    args.flag_opt("-to", trim.end_time);
    args.flag_opt("-t", trim.duration);
}

/// Shared helper: `key=value` entries for the user-supplied part of a bundle
pub(crate) fn user_bundle_params(raw: &[String]) -> impl Iterator<Item = String> + '_ {
    raw.iter()
        .flat_map(|entry| entry.split(':'))
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
}
