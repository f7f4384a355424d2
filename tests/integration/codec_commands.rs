// Per-codec argument grammar and ordering

use ffplan::engine::{
    Bitrate, Crop, Encoder, PlanError, RateControl, Rav1eConfig, Scale, SvtAv1Config, Transforms,
    Vp9Config, X264Config, X264Profile, X264Tune, X265Config, X265Profile, X26xPreset, build_plans,
};
use std::num::NonZeroU32;

use crate::common::assertions::*;
use crate::common::*;

fn position(args: &[String], token: &str) -> usize {
    args.iter()
        .position(|a| a == token)
        .unwrap_or_else(|| panic!("'{}' missing from {:?}", token, args))
}

#[test]
fn test_encoder_names() {
    let expected = ["libx264", "libx265", "libvpx-vp9", "libsvtav1", "librav1e"];
    for (encoder, name) in all_encoders().into_iter().zip(expected) {
        let rc = quality_rate_control(&encoder);
        let plans = build_plans(&options(encoder, rc), None, "/dev/null").unwrap();
        for plan in &plans {
            assert_plan_has_flag_value(plan, "-c:v:0", name);
        }
    }
}

#[test]
fn test_global_ordering() {
    let mut opts = options(
        Encoder::X264(X264Config {
            preset: X26xPreset::Slow,
            tune: Some(X264Tune::Film),
            profile: Some(X264Profile::High),
            x264_params: vec!["aq-mode=3".to_string()],
        }),
        RateControl::crf(20),
    );
    opts.pix_fmt = Some("yuv420p".to_string());
    opts.transforms.deinterlace = true;
    opts.max_rate_kbps = Some(8000);
    opts.buffer_size_kbps = Some(16000);
    opts.max_muxing_queue_size = Some(1024);

    let plans = build_plans(&opts, None, "/dev/null").unwrap();
    let args = &plans[0].args;

    let order = [
        "-y",
        "-i",
        "-map",
        "-map_metadata",
        "-c:v:0",
        "-vf",
        "-pix_fmt",
        "-tune",
        "-profile:v",
        "-preset",
        "-crf",
        "-maxrate:v",
        "-bufsize:v",
        "-x264-params",
        "-max_muxing_queue_size",
        "/media/out.mkv",
    ];
    let positions: Vec<usize> = order.iter().map(|t| position(args, t)).collect();
    assert!(
        positions.windows(2).all(|w| w[0] < w[1]),
        "out of order: {:?}",
        args
    );
    assert_plan_has_flag_value(&plans[0], "-maxrate:v", "8000k");
    assert_plan_has_flag_value(&plans[0], "-bufsize:v", "16000k");
    assert_plan_has_flag_value(&plans[0], "-x264-params", "aq-mode=3");
}

#[test]
fn test_keep_metadata_omits_map_metadata() {
    let mut opts = options(Encoder::X264(Default::default()), RateControl::crf(20));
    opts.strip_metadata = false;
    let plans = build_plans(&opts, None, "/dev/null").unwrap();
    assert_eq!(count_token(&plans[0], "-map_metadata"), 0);
}

#[test]
fn test_video_track_index() {
    let mut opts = options(Encoder::X264(Default::default()), RateControl::crf(20));
    opts.video_track = 3;
    let plans = build_plans(&opts, None, "/dev/null").unwrap();
    assert_plan_has_flag_value(&plans[0], "-map", "0:3");
}

#[test]
fn test_filter_chain_in_plan() {
    let mut opts = options(Encoder::X265(Default::default()), RateControl::crf(20));
    opts.transforms = Transforms {
        crop: Some(Crop {
            width: NonZeroU32::new(1920).unwrap(),
            height: NonZeroU32::new(800).unwrap(),
            left: 0,
            top: 140,
        }),
        scale: Some(Scale::Height(NonZeroU32::new(720).unwrap())),
        custom_filters: Some("  ".to_string()),
        ..Default::default()
    };
    let plans = build_plans(&opts, None, "/dev/null").unwrap();
    assert_plan_has_flag_value(
        &plans[0],
        "-vf",
        "crop=1920:800:0:140,scale=-2:720:flags=lanczos",
    );
    assert_well_formed(&plans[0]);
}

#[test]
fn test_no_filters_no_vf() {
    for encoder in all_encoders() {
        let rc = quality_rate_control(&encoder);
        for plan in build_plans(&options(encoder, rc), None, "/dev/null").unwrap() {
            assert_eq!(count_token(&plan, "-vf"), 0);
            assert_eq!(count_token(&plan, "-pix_fmt"), 0);
        }
    }
}

#[test]
fn test_x264_qp_and_bitrate() {
    let qp = build_plans(
        &options(Encoder::X264(Default::default()), RateControl::qp(69)),
        None,
        "/dev/null",
    )
    .unwrap();
    assert_plan_has_flag_value(&qp[0], "-qp", "69");
    assert_mutually_exclusive(&qp[0], "-qp", "-crf");

    let br = build_plans(
        &options(
            Encoder::X264(Default::default()),
            RateControl::bitrate("6M".parse().unwrap()),
        ),
        None,
        "/dev/null",
    )
    .unwrap();
    for plan in &br {
        assert_plan_has_flag_value(plan, "-b:v", "6M");
    }
    assert_plan_has_flag_value(&br[0], "-pass", "1");
    assert_plan_has_flag_value(&br[1], "-pass", "2");
    assert_plan_has_flag_value(&br[0], "-f", "mp4");
}

#[test]
fn test_x265_profile_mismatch_rejected() {
    let mut opts = options(
        Encoder::X265(X265Config {
            profile: Some(X265Profile::Main),
            ..Default::default()
        }),
        RateControl::crf(20),
    );
    opts.pix_fmt = Some("yuv420p10le".to_string());
    let err = build_plans(&opts, None, "/dev/null").unwrap_err();
    assert!(matches!(
        err,
        PlanError::UnsupportedCombination { field: "profile", .. }
    ));
}

#[test]
fn test_vp9_profile_mismatch_rejected() {
    let mut opts = options(
        Encoder::Vp9(Vp9Config {
            profile: Some(0),
            ..Default::default()
        }),
        RateControl::crf(31),
    );
    opts.pix_fmt = Some("yuv420p10le".to_string());
    let err = build_plans(&opts, None, "/dev/null").unwrap_err();
    assert_eq!(err.field(), "profile");
}

#[test]
fn test_codec_specific_ranges() {
    let cases = [
        (Encoder::X264(Default::default()), RateControl::qp(70)),
        (Encoder::X265(Default::default()), RateControl::qp(52)),
        (Encoder::Vp9(Default::default()), RateControl::crf(64)),
        (Encoder::SvtAv1(Default::default()), RateControl::crf(64)),
        (Encoder::Rav1e(Default::default()), RateControl::qp(256)),
    ];
    for (encoder, rc) in cases {
        let err = build_plans(&options(encoder, rc), None, "/dev/null").unwrap_err();
        assert!(matches!(err, PlanError::InvalidOptions { .. }), "{}", err);
    }
}

#[test]
fn test_unsupported_modes() {
    let cases = [
        (Encoder::Vp9(Default::default()), RateControl::qp(30)),
        (Encoder::SvtAv1(Default::default()), RateControl::qp(30)),
        (Encoder::Rav1e(Default::default()), RateControl::crf(30)),
    ];
    for (encoder, rc) in cases {
        let err = build_plans(&options(encoder, rc), None, "/dev/null").unwrap_err();
        assert!(matches!(err, PlanError::UnsupportedCombination { .. }), "{}", err);
    }
}

#[test]
fn test_svt_two_pass_format() {
    let plans = build_plans(
        &options(
            Encoder::SvtAv1(SvtAv1Config::default()),
            RateControl::bitrate(Bitrate::kbps(3000)),
        ),
        None,
        "/dev/null",
    )
    .unwrap();
    assert_plan_has_flag_value(&plans[0], "-f", "matroska");
    assert_plan_has_flag_value(&plans[0], "-pass", "1");
}

#[test]
fn test_rav1e_bitrate() {
    let plans = build_plans(
        &options(
            Encoder::Rav1e(Rav1eConfig::default()),
            RateControl::bitrate(Bitrate::kbps(3000)),
        ),
        None,
        "/dev/null",
    )
    .unwrap();
    assert_eq!(plans.len(), 2);
    assert_plan_has_flag_value(&plans[1], "-b:v", "3000k");
    assert_plan_has_flag_value(&plans[1], "-rav1e-params", "tune=Psychovisual");
}
