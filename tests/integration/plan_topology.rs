// Pass topology: how many plans, how they are tagged, and what they share

use ffplan::engine::{
    Bitrate, Encoder, PlanTag, RateControl, RateMode, Vp9Config, build_plans,
};

use crate::common::assertions::*;
use crate::common::*;

#[test]
fn test_bitrate_always_two_passes() {
    for encoder in all_encoders() {
        let opts = options(encoder, RateControl::bitrate(Bitrate::kbps(5000)));
        let plans = build_plans(&opts, None, "/dev/null").unwrap();

        assert_eq!(plans.len(), 2, "{:?}", opts.encoder);
        let (first, second) = (&plans[0], &plans[1]);

        assert!(first.tags.contains(&PlanTag::Ffmpeg));
        assert!(!first.is_output());
        assert!(second.is_output());
        assert!(first.abort_on_failure);
        assert!(!second.abort_on_failure);

        let log = first.pass_log().expect("pass 1 has a pass log");
        assert_eq!(Some(log), second.pass_log());
        assert!(log.starts_with("/tmp/ffplan/pass_log_file_"));
        assert_eq!(count_token(first, "-passlogfile"), 1);
        assert_eq!(count_token(second, "-passlogfile"), 1);
    }
}

#[test]
fn test_quality_modes_single_pass_except_vp9() {
    for encoder in all_encoders() {
        let rc = quality_rate_control(&encoder);
        let is_vp9 = matches!(encoder, Encoder::Vp9(_));
        let plans = build_plans(&options(encoder, rc), None, "/dev/null").unwrap();

        if is_vp9 {
            assert_eq!(plans.len(), 2);
        } else {
            assert_eq!(plans.len(), 1);
            assert!(plans[0].is_output());
            assert_eq!(plans[0].pass_log(), None);
            assert!(plans[0].name.starts_with("Single pass"));
        }
    }
}

#[test]
fn test_vp9_single_pass_flag() {
    let config = Vp9Config {
        single_pass: true,
        ..Default::default()
    };
    let plans = build_plans(
        &options(Encoder::Vp9(config), RateControl::crf(30)),
        None,
        "/dev/null",
    )
    .unwrap();
    assert_eq!(plans.len(), 1);
}

#[test]
fn test_noop_request_yields_nothing() {
    for encoder in all_encoders() {
        let plans = build_plans(&options(encoder, RateControl::default()), None, "/dev/null")
            .unwrap();
        assert!(plans.is_empty());
    }
}

#[test]
fn test_mode_without_value_rejected() {
    for mode in [RateMode::Crf, RateMode::Qp, RateMode::Bitrate] {
        let rc = RateControl {
            mode: Some(mode),
            ..Default::default()
        };
        let opts = options(Encoder::X264(Default::default()), rc);
        assert!(build_plans(&opts, None, "/dev/null").is_err());
    }
}

#[test]
fn test_pass_one_discards_streams() {
    let mut opts = options(
        Encoder::X264(Default::default()),
        RateControl::bitrate(Bitrate::kbps(4000)),
    );
    opts.audio_tracks.push(ffplan::engine::AudioTrack {
        index: 1,
        outdex: 1,
        title: None,
        language: None,
        conversion: None,
    });
    let plans = build_plans(&opts, None, "NUL").unwrap();

    let tail: Vec<&str> = plans[0].args.iter().rev().take(6).rev().map(String::as_str).collect();
    assert_eq!(tail, ["-an", "-sn", "-dn", "-f", "mp4", "NUL"]);
    assert_eq!(get_flag_value(&plans[0], "-map"), Some("0:0"));
    assert_eq!(count_token(&plans[0], "-map"), 1);
    assert_eq!(count_token(&plans[1], "-map"), 2);
    assert_eq!(plans[1].args.last().map(String::as_str), Some("/media/out.mkv"));
}

#[test]
fn test_plan_names() {
    let opts = options(
        Encoder::X265(Default::default()),
        RateControl::bitrate(Bitrate::kbps(4000)),
    );
    let names: Vec<_> = build_plans(&opts, None, "/dev/null")
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, ["First pass bitrate", "Second pass bitrate"]);

    let opts = options(Encoder::X265(Default::default()), RateControl::crf(20));
    assert_eq!(
        build_plans(&opts, None, "/dev/null").unwrap()[0].name,
        "Single pass CRF"
    );
}

#[test]
fn test_extra_args_both_passes() {
    let mut opts = options(
        Encoder::X264(Default::default()),
        RateControl::bitrate(Bitrate::kbps(4000)),
    );
    opts.extra = "-g 240".to_string();

    let plans = build_plans(&opts, None, "/dev/null").unwrap();
    assert_eq!(count_token(&plans[0], "-g"), 0);
    assert_eq!(count_token(&plans[1], "-g"), 1);

    opts.extra_both_passes = true;
    let plans = build_plans(&opts, None, "/dev/null").unwrap();
    assert_eq!(count_token(&plans[0], "-g"), 1);
    assert_eq!(count_token(&plans[1], "-g"), 1);
}
