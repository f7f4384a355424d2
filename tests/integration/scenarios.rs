// End-to-end scenarios: realistic jobs checked token by token

use ffplan::engine::{
    AudioConversion, AudioTrack, Attachment, Bitrate, Encoder, PlanError, RateControl,
    SubtitleTrack, X264Config, X265Config, X265Profile, X26xPreset, build_plans,
};

use crate::common::assertions::*;
use crate::common::*;

#[test]
fn test_sdr_x264_crf() {
    let mut opts = options(
        Encoder::X264(X264Config {
            preset: X26xPreset::Slow,
            ..Default::default()
        }),
        RateControl::crf(18),
    );
    opts.disable_hdr = true;

    let plans = build_plans(&opts, None, "/dev/null").unwrap();
    assert_eq!(plans.len(), 1);
    let plan = &plans[0];

    assert_eq!(count_token(plan, "-crf"), 1);
    assert_eq!(count_token(plan, "-preset"), 1);
    assert_plan_has_flag_value(plan, "-crf", "18");
    assert_plan_has_flag_value(plan, "-preset", "slow");
    assert_eq!(count_token(plan, "-x264-params"), 0);
    assert_mutually_exclusive(plan, "-crf", "-b:v");
    assert_well_formed(plan);
}

#[test]
fn test_hdr_x265_bitrate_two_pass() {
    let mut opts = options(
        Encoder::X265(X265Config {
            profile: Some(X265Profile::Main10),
            ..Default::default()
        }),
        RateControl::bitrate("5000k".parse().unwrap()),
    );
    opts.pix_fmt = Some("yuv420p10le".to_string());
    opts.audio_tracks.push(AudioTrack {
        index: 1,
        outdex: 1,
        title: Some("Main".to_string()),
        language: Some("eng".to_string()),
        conversion: None,
    });
    opts.subtitle_tracks.push(SubtitleTrack {
        index: 2,
        outdex: 2,
        language: Some("eng".to_string()),
        disposition: Some("default".to_string()),
    });

    let sd = hdr10_side_data();
    let plans = build_plans(&opts, Some(&sd), "/dev/null").unwrap();
    assert_eq!(plans.len(), 2);
    let (first, second) = (&plans[0], &plans[1]);

    // Measurement pass: video only into the null sink
    assert_eq!(first.args.last().map(String::as_str), Some("/dev/null"));
    assert_eq!(count_token(first, "0:1"), 0);
    assert_eq!(count_token(first, "-c:1"), 0);
    let bundle = get_flag_value(first, "-x265-params").unwrap();
    assert!(bundle.ends_with(":pass=1"), "{}", bundle);

    // Final pass
    let bundle = get_flag_value(second, "-x265-params").unwrap();
    assert!(
        bundle.contains(&format!("master-display={}", MASTER_DISPLAY)),
        "{}",
        bundle
    );
    assert!(bundle.contains("colorprim=bt2020"));
    assert!(bundle.ends_with(":pass=2"), "{}", bundle);

    let cmd = cmd_string(second);
    assert_cmd_contains(
        &cmd,
        "-map 0:1 -metadata:s:1 title=Main -metadata:s:1 handler=Main -metadata:s:1 language=eng -c:1 copy",
    );
    assert_cmd_contains(
        &cmd,
        "-map 0:2 -c:2 copy -disposition:2 default -metadata:s:2 language=eng",
    );
    assert_eq!(second.args.last().map(String::as_str), Some("/media/out.mkv"));

    assert_eq!(first.pass_log(), second.pass_log());
    for plan in &plans {
        assert_plan_has_flag_value(plan, "-b:v", "5000k");
        assert_plan_has_flag_value(plan, "-profile:v", "main10");
        assert_eq!(count_token(plan, "-pass"), 0);
        assert_well_formed(plan);
    }
}

#[test]
fn test_audio_conversion_tail() {
    let mut opts = options(Encoder::X264(Default::default()), RateControl::crf(20));
    opts.audio_tracks = vec![
        AudioTrack {
            index: 1,
            outdex: 1,
            title: None,
            language: None,
            conversion: Some(AudioConversion {
                codec: "libopus".to_string(),
                bitrate: Some(Bitrate::kbps(128)),
                channels: Some(2),
            }),
        },
        AudioTrack {
            index: 2,
            outdex: 2,
            title: Some("  ".to_string()),
            language: None,
            conversion: Some(AudioConversion {
                codec: "flac".to_string(),
                bitrate: Some(Bitrate::kbps(900)),
                channels: None,
            }),
        },
    ];

    let plan = &build_plans(&opts, None, "/dev/null").unwrap()[0];
    let cmd = cmd_string(plan);
    assert_cmd_contains(&cmd, "-map 0:1 -c:1 libopus -b:1 128k -ac:1 2");
    assert_cmd_contains(&cmd, "-map 0:2 -c:2 flac /media/out.mkv");
    assert_cmd_not_contains(&cmd, "-b:2");
    assert_cmd_not_contains(&cmd, "title=");
}

#[test]
fn test_attachments_into_matroska() {
    let mut opts = options(Encoder::X265(Default::default()), RateControl::crf(22));
    opts.attachments.push(Attachment {
        path: "/media/cover.jpg".into(),
        mime_type: "image/jpeg".to_string(),
        filename: "cover.jpg".to_string(),
    });

    let plan = &build_plans(&opts, None, "/dev/null").unwrap()[0];
    assert_cmd_contains(
        &cmd_string(plan),
        "-attach /media/cover.jpg -metadata:s:t:0 mimetype=image/jpeg -metadata:s:t:0 filename=cover.jpg",
    );

    opts.output = "/media/out.mp4".into();
    let err = build_plans(&opts, None, "/dev/null").unwrap_err();
    assert!(matches!(
        err,
        PlanError::UnsupportedCombination {
            field: "attachments",
            ..
        }
    ));
}

#[test]
fn test_trimmed_clip() {
    let mut opts = options(Encoder::X264(Default::default()), RateControl::crf(20));
    opts.trim.start_time = Some(90.0);
    opts.trim.end_time = Some(120.5);

    let plan = &build_plans(&opts, None, "/dev/null").unwrap()[0];
    assert_cmd_contains(&cmd_string(plan), "-i /media/in.mkv -ss 90 -to 120.5 -map 0:0");

    opts.trim.end_time = Some(60.0);
    let err = build_plans(&opts, None, "/dev/null").unwrap_err();
    assert_eq!(err.field(), "trim.end_time");
}

#[test]
fn test_extra_args_with_quotes() {
    let mut opts = options(Encoder::X264(Default::default()), RateControl::crf(20));
    opts.extra = r#"-metadata comment="made with care" -g 240"#.to_string();

    let plan = &build_plans(&opts, None, "/dev/null").unwrap()[0];
    let n = plan.args.len();
    assert_eq!(
        &plan.args[n - 5..],
        ["-metadata", "comment=made with care", "-g", "240", "/media/out.mkv"]
    );
}

#[test]
fn test_custom_ffmpeg_path() {
    let mut opts = options(Encoder::X264(Default::default()), RateControl::crf(20));
    opts.ffmpeg = "/opt/ffmpeg/bin/ffmpeg".to_string();
    let plan = &build_plans(&opts, None, "/dev/null").unwrap()[0];
    assert_eq!(plan.executable, "/opt/ffmpeg/bin/ffmpeg");
    assert_eq!(plan.to_command().get_program(), "/opt/ffmpeg/bin/ffmpeg");
}

#[test]
fn test_audio_track_cannot_replace_video_codec() {
    let mut opts = options(Encoder::X264(Default::default()), RateControl::crf(20));
    opts.audio_tracks.push(AudioTrack {
        index: 1,
        outdex: 0,
        title: None,
        language: None,
        conversion: None,
    });
    let err = build_plans(&opts, None, "/dev/null").unwrap_err();
    assert!(matches!(
        err,
        PlanError::InvalidOptions {
            field: "audio_tracks",
            ..
        }
    ));

    opts.audio_tracks[0].outdex = 1;
    let plan = &build_plans(&opts, None, "/dev/null").unwrap()[0];
    assert_plan_has_flag_value(plan, "-c:v:0", "libx264");
    assert_eq!(count_token(plan, "-c:0"), 0);
}
