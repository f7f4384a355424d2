//! Output tails: the muxing arguments of the final pass and the discard
//! arguments of a measurement pass.

use tracing::warn;

use super::plan::ArgList;
use super::tracks::{apply_attachments, apply_audio_tracks, apply_subtitle_tracks};
use super::types::EncodeOptions;

/// Split user-provided FFmpeg arguments shell-style so quoted strings survive.
pub fn split_extra_args(extra: &str) -> Vec<String> {
    if extra.trim().is_empty() {
        return Vec::new();
    }

    match shlex::split(extra) {
        Some(args) => args,
        None => {
            // Unbalanced quotes: fall back to a plain whitespace split
            warn!(extra, "could not parse extra arguments, splitting on whitespace");
            extra.split_whitespace().map(str::to_string).collect()
        }
    }
}

/// Audio, subtitles, attachments, title, extras and destination
pub fn apply_output_tail(args: &mut ArgList, opts: &EncodeOptions) {
    apply_audio_tracks(args, &opts.audio_tracks);
    apply_subtitle_tracks(args, &opts.subtitle_tracks);
    apply_attachments(args, &opts.attachments);

    if let Some(title) = opts.video_title.as_deref().map(str::trim) {
        if !title.is_empty() {
            args.flag("-metadata", format!("title={}", title));
        }
    }

    args.extend(split_extra_args(&opts.extra));
    args.arg(opts.output.to_string_lossy());
}

/// Pass-1 tail: no audio, subtitles or data, muxed into the null sink
pub fn apply_discard_tail(
    args: &mut ArgList,
    opts: &EncodeOptions,
    format: &str,
    null_sink: &str,
) {
    if opts.extra_both_passes {
        args.extend(split_extra_args(&opts.extra));
    }
    args.extend(["-an", "-sn", "-dn"]);
    args.flag("-f", format);
    args.arg(null_sink);
}
