//! HDR side data and its per-codec projection.
//!
//! Chromaticities are stored in the units x265 uses on the command line
//! (0.00002 per step), luminance in 0.0001 cd/m² steps.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use super::types::{CodecFamily, PixelLayout};

const CHROMA_DENOMINATOR: f64 = 50_000.0;
const LUMINANCE_DENOMINATOR: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chromaticity {
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Luminance {
    pub max: u32,
    pub min: u32,
}

/// SMPTE ST 2086 mastering display colour volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MasterDisplay {
    pub red: Chromaticity,
    pub green: Chromaticity,
    pub blue: Chromaticity,
    pub white_point: Chromaticity,
    pub luminance: Luminance,
}

impl MasterDisplay {
    /// Integer form used by x265 and x264: `G(x,y)B(x,y)R(x,y)WP(x,y)L(max,min)`
    pub fn to_x26x(&self) -> String {
        self.to_string()
    }

    /// Decimal form used by SVT-AV1: `G(0.2650,0.6900)...L(1000.0000,0.0050)`
    pub fn to_svt(&self) -> String {
        let c = |p: Chromaticity| {
            format!(
                "({:.4},{:.4})",
                p.x as f64 / CHROMA_DENOMINATOR,
                p.y as f64 / CHROMA_DENOMINATOR
            )
        };
        format!(
            "G{}B{}R{}WP{}L({:.4},{:.4})",
            c(self.green),
            c(self.blue),
            c(self.red),
            c(self.white_point),
            self.luminance.max as f64 / LUMINANCE_DENOMINATOR,
            self.luminance.min as f64 / LUMINANCE_DENOMINATOR
        )
    }
}

impl fmt::Display for MasterDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "G({},{})B({},{})R({},{})WP({},{})L({},{})",
            self.green.x,
            self.green.y,
            self.blue.x,
            self.blue.y,
            self.red.x,
            self.red.y,
            self.white_point.x,
            self.white_point.y,
            self.luminance.max,
            self.luminance.min
        )
    }
}

impl FromStr for MasterDisplay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rest = s.trim();
        let mut take = |label: &str| -> Result<(u32, u32), String> {
            let after = rest
                .strip_prefix(label)
                .and_then(|r| r.strip_prefix('('))
                .ok_or_else(|| format!("master display '{}': expected {}(", s, label))?;
            let close = after
                .find(')')
                .ok_or_else(|| format!("master display '{}': missing ')' after {}", s, label))?;
            let (a, b) = after[..close]
                .split_once(',')
                .ok_or_else(|| format!("master display '{}': {} needs two values", s, label))?;
            let parse = |v: &str| {
                v.trim()
                    .parse::<u32>()
                    .map_err(|_| format!("master display '{}': '{}' is not an integer", s, v))
            };
            let pair = (parse(a)?, parse(b)?);
            rest = &after[close + 1..];
            Ok(pair)
        };

        let (gx, gy) = take("G")?;
        let (bx, by) = take("B")?;
        let (rx, ry) = take("R")?;
        let (wx, wy) = take("WP")?;
        let (lmax, lmin) = take("L")?;
        if !rest.is_empty() {
            return Err(format!("master display '{}': trailing text '{}'", s, rest));
        }

        Ok(MasterDisplay {
            red: Chromaticity { x: rx, y: ry },
            green: Chromaticity { x: gx, y: gy },
            blue: Chromaticity { x: bx, y: by },
            white_point: Chromaticity { x: wx, y: wy },
            luminance: Luminance {
                max: lmax,
                min: lmin,
            },
        })
    }
}

impl TryFrom<String> for MasterDisplay {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MasterDisplay> for String {
    fn from(value: MasterDisplay) -> Self {
        value.to_string()
    }
}

/// MaxCLL / MaxFALL in cd/m²; zero is a legal value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentLightLevel {
    pub max_cll: u32,
    pub max_fall: u32,
}

impl fmt::Display for ContentLightLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.max_cll, self.max_fall)
    }
}

/// HDR descriptor of the source, as reported by the probe layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SideData {
    pub color_primaries: Option<String>,
    pub color_transfer: Option<String>,
    pub color_space: Option<String>,
    pub master_display: Option<MasterDisplay>,
    pub cll: Option<ContentLightLevel>,
}

impl SideData {
    fn is_bt2020(&self) -> bool {
        self.color_primaries
            .as_deref()
            .is_some_and(|p| p.trim().eq_ignore_ascii_case("bt2020"))
    }

    fn transfer(&self) -> &str {
        self.color_transfer
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or("smpte2084")
    }

    fn matrix(&self) -> &str {
        self.color_space
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or("bt2020nc")
    }
}

/// Where a codec expects its HDR fragments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HdrCarrier {
    /// Joined into the codec's `-<codec>-params` bundle
    Bundled,
    /// Emitted as `-key value` FFmpeg stream flags
    StreamFlags,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HdrParam {
    pub key: &'static str,
    pub value: String,
}

impl HdrParam {
    fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }

    /// `-key value` pair for stream-flag carriers
    pub fn as_flag(&self) -> [String; 2] {
        [format!("-{}", self.key), self.value.clone()]
    }
}

impl fmt::Display for HdrParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Project side data into the fragments one codec understands.
///
/// Returns nothing when HDR is disabled or there is no side data.
/// Colorimetry is gated on bt2020 primaries; mastering display and content
/// light level are emitted whenever present.
pub fn project_hdr(
    side_data: Option<&SideData>,
    disable_hdr: bool,
    family: CodecFamily,
) -> Vec<HdrParam> {
    let Some(sd) = side_data else {
        return Vec::new();
    };
    if disable_hdr {
        return Vec::new();
    }

    let mut params = Vec::new();
    let bt2020 = sd.is_bt2020();

    match family {
        CodecFamily::X265 => {
            if bt2020 {
                params.push(HdrParam::new("hdr-opt", "1"));
                params.push(HdrParam::new("repeat-headers", "1"));
                params.push(HdrParam::new("colorprim", "bt2020"));
                params.push(HdrParam::new("transfer", sd.transfer()));
                params.push(HdrParam::new("colormatrix", sd.matrix()));
            }
            if let Some(md) = &sd.master_display {
                params.push(HdrParam::new("master-display", md.to_x26x()));
            }
            if let Some(cll) = &sd.cll {
                params.push(HdrParam::new("max-cll", cll.to_string()));
            }
        }
        CodecFamily::X264 => {
            if bt2020 {
                params.push(HdrParam::new("colorprim", "bt2020"));
                params.push(HdrParam::new("transfer", sd.transfer()));
                params.push(HdrParam::new("colormatrix", sd.matrix()));
            }
            if let Some(md) = &sd.master_display {
                params.push(HdrParam::new("mastering-display", md.to_x26x()));
            }
            if let Some(cll) = &sd.cll {
                params.push(HdrParam::new("cll", cll.to_string()));
            }
        }
        CodecFamily::SvtAv1 => {
            if bt2020 {
                params.push(HdrParam::new("color-primaries", "9"));
                params.push(HdrParam::new(
                    "transfer-characteristics",
                    svt_transfer_code(sd.transfer()),
                ));
                params.push(HdrParam::new(
                    "matrix-coefficients",
                    svt_matrix_code(sd.matrix()),
                ));
            }
            if let Some(md) = &sd.master_display {
                params.push(HdrParam::new("mastering-display", md.to_svt()));
            }
            if let Some(cll) = &sd.cll {
                params.push(HdrParam::new("content-light", cll.to_string()));
            }
        }
        // libvpx-vp9 and librav1e wrappers take colorimetry as stream flags only
        CodecFamily::Vp9 | CodecFamily::Rav1e => {
            if bt2020 {
                params.push(HdrParam::new("color_primaries", "bt2020"));
                params.push(HdrParam::new("color_trc", sd.transfer()));
                params.push(HdrParam::new("colorspace", sd.matrix()));
            }
        }
    }

    params
}

/// Warn when HDR metadata is about to be written into an 8-bit stream
pub(crate) fn warn_if_low_depth(params: &[HdrParam], layout: Option<PixelLayout>) {
    if let Some(layout) = layout {
        if !params.is_empty() && layout.bit_depth < 10 {
            warn!(
                bit_depth = layout.bit_depth,
                "HDR metadata on an 8-bit pixel format will cause severe banding; use a 10-bit format"
            );
        }
    }
}

// ITU-T H.273 transfer characteristics
fn svt_transfer_code(transfer: &str) -> String {
    match transfer {
        "bt709" => "1".to_string(),
        "bt2020-10" => "14".to_string(),
        "bt2020-12" => "15".to_string(),
        "smpte2084" => "16".to_string(),
        "arib-std-b67" => "18".to_string(),
        other => other.to_string(),
    }
}

// ITU-T H.273 matrix coefficients
fn svt_matrix_code(matrix: &str) -> String {
    match matrix {
        "bt709" => "1".to_string(),
        "bt2020nc" => "9".to_string(),
        "bt2020c" => "10".to_string(),
        other => other.to_string(),
    }
}
