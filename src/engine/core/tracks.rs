use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::plan::ArgList;
use super::types::Bitrate;

/// Codecs whose bitrate is implied by the source; `-b` is never passed to them
fn is_lossless_audio(codec: &str) -> bool {
    matches!(codec, "flac" | "alac" | "truehd") || codec.starts_with("pcm_")
}

/// Re-encode settings for one audio track; absent means stream copy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioConversion {
    pub codec: String,
    #[serde(default)]
    pub bitrate: Option<Bitrate>,
    /// Downmix to this many channels
    #[serde(default)]
    pub channels: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioTrack {
    /// Input stream index
    pub index: u32,
    /// Output stream index
    pub outdex: u32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub conversion: Option<AudioConversion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleTrack {
    pub index: u32,
    pub outdex: u32,
    #[serde(default)]
    pub language: Option<String>,
    /// e.g. "default", "forced"; unset clears the source disposition
    #[serde(default)]
    pub disposition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub path: PathBuf,
    pub mime_type: String,
    pub filename: String,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn apply_audio_tracks(args: &mut ArgList, tracks: &[AudioTrack]) {
    for track in tracks {
        let o = track.outdex;
        args.flag("-map", format!("0:{}", track.index));

        if let Some(title) = non_blank(&track.title) {
            args.flag(&format!("-metadata:s:{}", o), format!("title={}", title));
            args.flag(&format!("-metadata:s:{}", o), format!("handler={}", title));
        }
        if let Some(language) = non_blank(&track.language) {
            args.flag(&format!("-metadata:s:{}", o), format!("language={}", language));
        }

        match &track.conversion {
            None => {
                args.flag(&format!("-c:{}", o), "copy");
            }
            Some(conv) => {
                args.flag(&format!("-c:{}", o), conv.codec.trim());
                if !is_lossless_audio(conv.codec.trim()) {
                    args.flag_opt(&format!("-b:{}", o), conv.bitrate.as_ref());
                }
                args.flag_opt(&format!("-ac:{}", o), conv.channels);
            }
        }
    }
}

pub fn apply_subtitle_tracks(args: &mut ArgList, tracks: &[SubtitleTrack]) {
    for track in tracks {
        let o = track.outdex;
        args.flag("-map", format!("0:{}", track.index));
        args.flag(&format!("-c:{}", o), "copy");
        args.flag(
            &format!("-disposition:{}", o),
            non_blank(&track.disposition).unwrap_or("0"),
        );
        if let Some(language) = non_blank(&track.language) {
            args.flag(&format!("-metadata:s:{}", o), format!("language={}", language));
        }
    }
}

pub fn apply_attachments(args: &mut ArgList, attachments: &[Attachment]) {
    for (i, attachment) in attachments.iter().enumerate() {
        args.flag("-attach", attachment.path.to_string_lossy());
        args.flag(
            &format!("-metadata:s:t:{}", i),
            format!("mimetype={}", attachment.mime_type),
        );
        args.flag(
            &format!("-metadata:s:t:{}", i),
            format!("filename={}", attachment.filename),
        );
    }
}
