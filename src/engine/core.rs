mod av1_config;
mod encoder;
mod ending;
mod error;
mod filters;
mod hdr;
mod log;
mod plan;
mod rav1e_config;
mod scan;
mod tracks;
mod types;
mod vp9_config;
mod x264_config;
mod x265_config;

pub use av1_config::SvtAv1Config;
pub use encoder::{CodecBuilder, Encoder, PassContext, build_plans, build_plans_with_rng};
pub use ending::split_extra_args;
pub use error::PlanError;
pub use filters::{Crop, FilterChain, Scale, ToneMap, Transforms};
pub use hdr::{
    Chromaticity, ContentLightLevel, HdrCarrier, HdrParam, Luminance, MasterDisplay, SideData,
    project_hdr,
};
pub use log::{init_logging, write_debug_log};
pub use plan::{ArgList, InvocationPlan, Pass, PassLogHandle, PlanTag};
pub use rav1e_config::{PixelRange, Rav1eConfig, Rav1eTune};
pub use scan::{is_job_file, load_job, scan, scan_streaming};
pub use tracks::{AudioConversion, AudioTrack, Attachment, SubtitleTrack};
pub use types::{
    Bitrate, Chroma, CodecFamily, DEFAULT_FFMPEG, EncodeOptions, JobFile, PixelLayout, RateControl,
    RateMode, RateTarget, Trim, pixel_layout,
};
pub use vp9_config::{Vp9Config, Vp9Quality};
pub use x264_config::{X26xPreset, X264Config, X264Profile, X264Tune};
pub use x265_config::{X265Config, X265Profile, X265Tune};
