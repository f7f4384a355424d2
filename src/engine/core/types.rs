use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::encoder::Encoder;
use super::error::PlanError;
use super::filters::Transforms;
use super::hdr::SideData;
use super::tracks::{Attachment, AudioTrack, SubtitleTrack};

pub const DEFAULT_FFMPEG: &str = "ffmpeg";

fn default_ffmpeg() -> String {
    DEFAULT_FFMPEG.to_string()
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir()
}

fn default_true() -> bool {
    true
}

/// Codec families the compiler knows how to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodecFamily {
    X264,
    X265,
    Vp9,
    SvtAv1,
    Rav1e,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateMode {
    Crf,
    Bitrate,
    Qp,
}

impl RateMode {
    /// Label used in pass names ("Single pass CRF", "First pass bitrate")
    pub fn label(self) -> &'static str {
        match self {
            RateMode::Crf => "CRF",
            RateMode::Bitrate => "bitrate",
            RateMode::Qp => "QP",
        }
    }
}

/// FFmpeg bitrate value: a number with an optional `k`/`M` suffix ("5000k", "1.5M", "800000")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Bitrate(String);

impl Bitrate {
    pub fn kbps(kbps: u32) -> Self {
        Bitrate(format!("{}k", kbps))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Bitrate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mantissa = s
            .strip_suffix(['k', 'K', 'm', 'M'])
            .unwrap_or(s);
        let is_digits = |part: &str| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit());
        let well_formed = match mantissa.split_once('.') {
            Some((whole, frac)) => is_digits(whole) && is_digits(frac),
            None => is_digits(mantissa),
        };
        if !well_formed {
            return Err(format!(
                "invalid bitrate '{}': expected a number with an optional k/M suffix",
                s
            ));
        }
        if mantissa.chars().all(|c| c == '0' || c == '.') {
            return Err(format!("invalid bitrate '{}': must be greater than zero", s));
        }
        Ok(Bitrate(s.to_string()))
    }
}

impl TryFrom<String> for Bitrate {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Bitrate> for String {
    fn from(value: Bitrate) -> Self {
        value.0
    }
}

impl fmt::Display for Bitrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rate-control selection as supplied by the settings layer.
///
/// `mode` plus the value fields are kept separate so that inconsistent
/// input (a mode without its value, or several values at once) can be
/// detected and rejected instead of silently picking one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateControl {
    #[serde(default)]
    pub mode: Option<RateMode>,
    #[serde(default)]
    pub crf: Option<u32>,
    #[serde(default)]
    pub qp: Option<u32>,
    #[serde(default)]
    pub bitrate: Option<Bitrate>,
}

impl RateControl {
    pub fn crf(value: u32) -> Self {
        Self {
            mode: Some(RateMode::Crf),
            crf: Some(value),
            ..Default::default()
        }
    }

    pub fn qp(value: u32) -> Self {
        Self {
            mode: Some(RateMode::Qp),
            qp: Some(value),
            ..Default::default()
        }
    }

    pub fn bitrate(value: Bitrate) -> Self {
        Self {
            mode: Some(RateMode::Bitrate),
            bitrate: Some(value),
            ..Default::default()
        }
    }

    /// Resolve into a single target.
    ///
    /// `Ok(None)` is the explicit no-op request: no mode and no value.
    pub fn resolve(&self) -> Result<Option<RateTarget>, PlanError> {
        let values_set = [
            self.crf.is_some(),
            self.qp.is_some(),
            self.bitrate.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count();

        let Some(mode) = self.mode else {
            if values_set == 0 {
                return Ok(None);
            }
            return Err(PlanError::invalid(
                "rate_control.mode",
                "a rate-control value is set but no mode is selected",
            ));
        };

        if values_set > 1 {
            return Err(PlanError::invalid(
                "rate_control",
                "conflicting rate-control values; exactly one of crf, qp, bitrate may be set",
            ));
        }

        let target = match mode {
            RateMode::Crf => self.crf.map(RateTarget::Crf).ok_or_else(|| {
                PlanError::invalid("rate_control.crf", "mode is CRF but no CRF value is set")
            })?,
            RateMode::Qp => self.qp.map(RateTarget::Qp).ok_or_else(|| {
                PlanError::invalid("rate_control.qp", "mode is QP but no QP value is set")
            })?,
            RateMode::Bitrate => self
                .bitrate
                .clone()
                .map(RateTarget::Bitrate)
                .ok_or_else(|| {
                    PlanError::invalid(
                        "rate_control.bitrate",
                        "mode is bitrate but no bitrate value is set",
                    )
                })?,
        };
        Ok(Some(target))
    }
}

/// A resolved, internally consistent rate-control target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateTarget {
    Crf(u32),
    Qp(u32),
    Bitrate(Bitrate),
}

impl RateTarget {
    pub fn mode(&self) -> RateMode {
        match self {
            RateTarget::Crf(_) => RateMode::Crf,
            RateTarget::Qp(_) => RateMode::Qp,
            RateTarget::Bitrate(_) => RateMode::Bitrate,
        }
    }

    /// Numeric quality value (CRF or QP); bitrate targets have none
    pub fn quality_value(&self) -> Option<u32> {
        match self {
            RateTarget::Crf(v) | RateTarget::Qp(v) => Some(*v),
            RateTarget::Bitrate(_) => None,
        }
    }
}

/// Seek and length limits, in seconds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Trim {
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    pub duration: Option<f64>,
    /// Seek on the input side (before `-i`): fast, keyframe-accurate
    pub fast_seek: bool,
}

impl Trim {
    pub fn is_empty(&self) -> bool {
        self.start().is_none() && self.end_time.is_none() && self.duration.is_none()
    }

    /// Start offset; zero means "from the beginning" and is not emitted
    pub fn start(&self) -> Option<f64> {
        self.start_time.filter(|s| *s > 0.0)
    }

    fn validate(&self) -> Result<(), PlanError> {
        for (field, value) in [
            ("trim.start_time", self.start_time),
            ("trim.end_time", self.end_time),
            ("trim.duration", self.duration),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(PlanError::invalid(
                        field,
                        format!("must be a non-negative number of seconds, got {}", v),
                    ));
                }
            }
        }
        if self.end_time.is_some() && self.duration.is_some() {
            return Err(PlanError::invalid(
                "trim.duration",
                "end_time and duration cannot both be set",
            ));
        }
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            if end <= start {
                return Err(PlanError::invalid(
                    "trim.end_time",
                    format!("end_time {} must be after start_time {}", end, start),
                ));
            }
        }
        if self.end_time.is_some_and(|end| end <= 0.0) {
            return Err(PlanError::invalid("trim.end_time", "end_time must be greater than zero"));
        }
        if self.duration == Some(0.0) {
            return Err(PlanError::invalid("trim.duration", "duration must be greater than zero"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chroma {
    Gray,
    Yuv420,
    Yuv422,
    Yuv440,
    Yuv444,
}

/// Chroma layout and bit depth of a pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelLayout {
    pub chroma: Chroma,
    pub bit_depth: u8,
}

/// Describe an FFmpeg pixel format name. Unknown formats (RGB, packed) yield `None`.
pub fn pixel_layout(pix_fmt: &str) -> Option<PixelLayout> {
    let name = pix_fmt
        .strip_suffix("le")
        .or_else(|| pix_fmt.strip_suffix("be"))
        .unwrap_or(pix_fmt);

    let layout = |chroma, bit_depth| Some(PixelLayout { chroma, bit_depth });

    match name {
        "nv12" | "nv21" => return layout(Chroma::Yuv420, 8),
        "nv16" => return layout(Chroma::Yuv422, 8),
        "p010" => return layout(Chroma::Yuv420, 10),
        "p016" => return layout(Chroma::Yuv420, 16),
        "p210" => return layout(Chroma::Yuv422, 10),
        _ => {}
    }

    if let Some(depth) = name.strip_prefix("gray") {
        return layout(Chroma::Gray, parse_depth(depth)?);
    }

    let rest = name
        .strip_prefix("yuvj")
        .or_else(|| name.strip_prefix("yuv"))?;
    let (sampling, rest) = rest.split_at_checked(3)?;
    let chroma = match sampling {
        "420" => Chroma::Yuv420,
        "422" => Chroma::Yuv422,
        "440" => Chroma::Yuv440,
        "444" => Chroma::Yuv444,
        _ => return None,
    };
    let depth = rest.strip_prefix('p')?;
    layout(chroma, parse_depth(depth)?)
}

fn parse_depth(digits: &str) -> Option<u8> {
    if digits.is_empty() {
        Some(8)
    } else {
        digits.parse().ok()
    }
}

/// The normalized, immutable input to the plan compiler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodeOptions {
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,
    pub source: PathBuf,
    pub output: PathBuf,
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    // Stream selection
    #[serde(default)]
    pub video_track: u32,
    #[serde(default)]
    pub audio_tracks: Vec<AudioTrack>,
    #[serde(default)]
    pub subtitle_tracks: Vec<SubtitleTrack>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,

    // Codec + rate control
    pub encoder: Encoder,
    #[serde(default)]
    pub rate_control: RateControl,
    #[serde(default)]
    pub max_rate_kbps: Option<u32>,
    #[serde(default)]
    pub buffer_size_kbps: Option<u32>,

    /// Forced output pixel format; `None` keeps the source format
    #[serde(default)]
    pub pix_fmt: Option<String>,
    #[serde(default)]
    pub disable_hdr: bool,

    #[serde(default)]
    pub transforms: Transforms,
    #[serde(default)]
    pub trim: Trim,

    // Muxing
    #[serde(default)]
    pub max_muxing_queue_size: Option<u32>,
    #[serde(default = "default_true")]
    pub strip_metadata: bool,
    #[serde(default)]
    pub video_title: Option<String>,

    /// Raw FFmpeg arguments, shell-style quoting
    #[serde(default)]
    pub extra: String,
    #[serde(default)]
    pub extra_both_passes: bool,
}

impl EncodeOptions {
    pub fn new(source: impl Into<PathBuf>, output: impl Into<PathBuf>, encoder: Encoder) -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            source: source.into(),
            output: output.into(),
            temp_dir: default_temp_dir(),
            video_track: 0,
            audio_tracks: Vec::new(),
            subtitle_tracks: Vec::new(),
            attachments: Vec::new(),
            encoder,
            rate_control: RateControl::default(),
            max_rate_kbps: None,
            buffer_size_kbps: None,
            pix_fmt: None,
            disable_hdr: false,
            transforms: Transforms::default(),
            trim: Trim::default(),
            max_muxing_queue_size: None,
            strip_metadata: true,
            video_title: None,
            extra: String::new(),
            extra_both_passes: false,
        }
    }

    /// Layout of the forced pixel format, when forced and recognized
    pub fn pixel_layout(&self) -> Option<PixelLayout> {
        self.pix_fmt.as_deref().and_then(pixel_layout)
    }

    pub fn output_extension(&self) -> Option<String> {
        self.output
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase())
    }

    /// Checks shared by every codec
    pub(crate) fn validate(&self) -> Result<(), PlanError> {
        if self.ffmpeg.trim().is_empty() {
            return Err(PlanError::invalid("ffmpeg", "executable must not be empty"));
        }
        if is_blank(&self.source) {
            return Err(PlanError::invalid("source", "source path must not be empty"));
        }
        if is_blank(&self.output) {
            return Err(PlanError::invalid("output", "output path must not be empty"));
        }
        if is_blank(&self.temp_dir) {
            return Err(PlanError::invalid("temp_dir", "temp directory must not be empty"));
        }
        if let Some(pix_fmt) = &self.pix_fmt {
            if pix_fmt.trim().is_empty() || pix_fmt.contains(char::is_whitespace) {
                return Err(PlanError::invalid(
                    "pix_fmt",
                    format!("'{}' is not a pixel format name", pix_fmt),
                ));
            }
        }
        if self.max_rate_kbps == Some(0) {
            return Err(PlanError::invalid("max_rate_kbps", "must be greater than zero"));
        }
        if self.buffer_size_kbps == Some(0) {
            return Err(PlanError::invalid("buffer_size_kbps", "must be greater than zero"));
        }
        if self.max_muxing_queue_size == Some(0) {
            return Err(PlanError::invalid(
                "max_muxing_queue_size",
                "must be greater than zero",
            ));
        }
        self.trim.validate()?;
        self.validate_outdexes()?;

        if !self.attachments.is_empty()
            && !matches!(self.output_extension().as_deref(), Some("mkv" | "mka"))
        {
            return Err(PlanError::unsupported(
                "attachments",
                format!(
                    "attachments require a Matroska output, got '{}'",
                    self.output.display()
                ),
            ));
        }
        Ok(())
    }
}

impl EncodeOptions {
    /// Output stream 0 is the video; every other output index is used once
    fn validate_outdexes(&self) -> Result<(), PlanError> {
        let mut seen = BTreeSet::new();
        let audio = self.audio_tracks.iter().map(|t| ("audio_tracks", t.outdex));
        let subtitles = self
            .subtitle_tracks
            .iter()
            .map(|t| ("subtitle_tracks", t.outdex));

        for (field, outdex) in audio.chain(subtitles) {
            if outdex == 0 {
                return Err(PlanError::invalid(
                    field,
                    "output stream 0 is the video stream",
                ));
            }
            if !seen.insert(outdex) {
                return Err(PlanError::invalid(
                    field,
                    format!("output stream {} is used by more than one track", outdex),
                ));
            }
        }
        Ok(())
    }
}

fn is_blank(path: &Path) -> bool {
    path.as_os_str().to_string_lossy().trim().is_empty()
}

/// On-disk job description: the options plus the source's HDR side data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFile {
    pub options: EncodeOptions,
    #[serde(default)]
    pub side_data: Option<SideData>,
}
