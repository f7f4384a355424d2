//! Video filter chain (`-vf`) construction.
//!
//! Fragments always appear in the same order: crop, scale, HDR strip,
//! deinterlace, then user-supplied filters.

use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crop {
    pub width: NonZeroU32,
    pub height: NonZeroU32,
    #[serde(default)]
    pub left: u32,
    #[serde(default)]
    pub top: u32,
}

impl Crop {
    fn fragment(&self) -> String {
        format!("crop={}:{}:{}:{}", self.width, self.height, self.left, self.top)
    }
}

/// Target size; a missing side is derived from the aspect ratio (`-2` keeps it even)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scale {
    Width(NonZeroU32),
    Height(NonZeroU32),
    Exact {
        width: NonZeroU32,
        height: NonZeroU32,
    },
}

impl Scale {
    fn fragment(&self) -> String {
        let (w, h) = match self {
            Scale::Width(w) => (w.to_string(), "-2".to_string()),
            Scale::Height(h) => ("-2".to_string(), h.to_string()),
            Scale::Exact { width, height } => (width.to_string(), height.to_string()),
        };
        format!("scale={}:{}:flags=lanczos", w, h)
    }
}

/// Tone-mapping curve used when stripping HDR
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToneMap {
    #[default]
    Hable,
    Reinhard,
    Mobius,
    Clip,
    Linear,
    Gamma,
}

impl ToneMap {
    pub fn as_str(self) -> &'static str {
        match self {
            ToneMap::Hable => "hable",
            ToneMap::Reinhard => "reinhard",
            ToneMap::Mobius => "mobius",
            ToneMap::Clip => "clip",
            ToneMap::Linear => "linear",
            ToneMap::Gamma => "gamma",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transforms {
    pub crop: Option<Crop>,
    pub scale: Option<Scale>,
    /// Tone-map to SDR bt709 (also suppresses HDR metadata)
    pub remove_hdr: bool,
    pub tone_map: ToneMap,
    pub deinterlace: bool,
    /// Raw filter text appended last
    pub custom_filters: Option<String>,
}

impl Transforms {
    pub fn filter_chain(&self) -> FilterChain {
        let mut chain = FilterChain::default();
        if let Some(crop) = &self.crop {
            chain.push(crop.fragment());
        }
        if let Some(scale) = &self.scale {
            chain.push(scale.fragment());
        }
        if self.remove_hdr {
            chain.push(hdr_strip(self.tone_map));
        }
        if self.deinterlace {
            chain.push("yadif");
        }
        if let Some(custom) = &self.custom_filters {
            chain.push(custom.as_str());
        }
        chain
    }
}

fn hdr_strip(tone_map: ToneMap) -> String {
    format!(
        "zscale=t=linear:npl=100,format=gbrpf32le,zscale=p=bt709,tonemap=tonemap={}:desat=0,zscale=t=bt709:m=bt709:r=tv,format=yuv420p",
        tone_map.as_str()
    )
}

/// Ordered filter fragments. Empty chains produce no `-vf` at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterChain(Vec<String>);

impl FilterChain {
    /// Add a fragment, dropping empty `,`-separated pieces; blank input is ignored.
    /// Text inside a piece is kept as written, so quoted arguments survive.
    pub fn push(&mut self, fragment: impl AsRef<str>) {
        let joined = fragment
            .as_ref()
            .split(',')
            .filter(|piece| !piece.trim().is_empty())
            .collect::<Vec<_>>()
            .join(",");
        let cleaned = joined.trim();
        if !cleaned.is_empty() {
            self.0.push(cleaned.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fragments(&self) -> &[String] {
        &self.0
    }

    pub fn to_arg(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.0.join(","))
        }
    }
}
