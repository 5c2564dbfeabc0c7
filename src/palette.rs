//! Colour palettes for rendering temperatures.
//!
//! The sequential palettes map a normalized value in
//! `[0, 1]` (0 at the bottom of the scale) onto an RGB
//! colour. Some are built from [`colorous`] gradients, the
//! rest interpolate linearly between fixed colour stops.
use std::{convert::TryFrom, fmt, str::FromStr};

use serde_derive::*;

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum Palette {
    #[serde(rename = "iron")]
    IronBow = 0,
    #[serde(rename = "rainbow")]
    RainBow,
    #[serde(rename = "grayscale")]
    GreyScale,
    #[serde(rename = "grayscale_inv")]
    GreyScaleInv,
    #[serde(rename = "sepia")]
    Sepia,
    #[serde(rename = "bluered")]
    BlueRed,
    #[serde(rename = "hotcold")]
    HotCold,
    #[serde(rename = "testo")]
    Testo,
    #[serde(rename = "dewpoint")]
    DewPoint,
    #[serde(rename = "hochtemp")]
    HochTemp,
    #[serde(rename = "rainbowhc")]
    RainbowHc,
}

const IRON: &[u32] = &[
    0x000000, 0x440154, 0x721f81, 0xb73779, 0xf1605d, 0xfeb078, 0xfcfdbf,
];
const RAINBOW: &[u32] = &[
    0x0000ff, 0x00ffff, 0x00ff00, 0xffff00, 0xff8000, 0xff0000, 0xffffff,
];
const SEPIA: &[u32] = &[0x2d1b0e, 0x6b4423, 0xa0673a, 0xd4a574, 0xf5deb3];
const HOT_COLD: &[u32] = &[0x0000ff, 0x8080ff, 0xffffff, 0xff8080, 0xff0000];
const TESTO: &[u32] = &[
    0x000020, 0x1d0a6b, 0x7b0f8a, 0xd3244f, 0xf77a16, 0xfbd33c, 0xffffe0,
];
// Blue below the dew point region, neutral grey above.
const DEW_POINT: &[u32] = &[0x0000a0, 0x2060ff, 0x80c0ff, 0x808080, 0xc0c0c0];

impl Palette {
    pub const ALL: [Palette; 11] = [
        Palette::IronBow,
        Palette::RainBow,
        Palette::GreyScale,
        Palette::GreyScaleInv,
        Palette::Sepia,
        Palette::BlueRed,
        Palette::HotCold,
        Palette::Testo,
        Palette::DewPoint,
        Palette::HochTemp,
        Palette::RainbowHc,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Palette::IronBow => "iron",
            Palette::RainBow => "rainbow",
            Palette::GreyScale => "grayscale",
            Palette::GreyScaleInv => "grayscale_inv",
            Palette::Sepia => "sepia",
            Palette::BlueRed => "bluered",
            Palette::HotCold => "hotcold",
            Palette::Testo => "testo",
            Palette::DewPoint => "dewpoint",
            Palette::HochTemp => "hochtemp",
            Palette::RainbowHc => "rainbowhc",
        }
    }

    /// Colour for a normalized value; values outside
    /// `[0, 1]` (or NaN) are clamped to the ends.
    pub fn color_at(self, value: f64) -> [u8; 3] {
        let value = if value.is_nan() {
            0.
        } else {
            value.max(0.).min(1.)
        };
        match self {
            Palette::IronBow => interpolate_stops(IRON, value),
            Palette::RainBow => interpolate_stops(RAINBOW, value),
            Palette::GreyScale => colorous::GREYS.eval_continuous(1. - value).as_array(),
            Palette::GreyScaleInv => colorous::GREYS.eval_continuous(value).as_array(),
            Palette::Sepia => interpolate_stops(SEPIA, value),
            Palette::BlueRed => colorous::RED_BLUE.eval_continuous(1. - value).as_array(),
            Palette::HotCold => interpolate_stops(HOT_COLD, value),
            Palette::Testo => interpolate_stops(TESTO, value),
            Palette::DewPoint => interpolate_stops(DEW_POINT, value),
            Palette::HochTemp => colorous::INFERNO.eval_continuous(value).as_array(),
            Palette::RainbowHc => colorous::TURBO.eval_continuous(value).as_array(),
        }
    }
}

fn rgb(hex: u32) -> [f64; 3] {
    [
        ((hex >> 16) & 0xff) as f64,
        ((hex >> 8) & 0xff) as f64,
        (hex & 0xff) as f64,
    ]
}

fn interpolate_stops(stops: &[u32], value: f64) -> [u8; 3] {
    let index = value * (stops.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;
    let factor = index - lower as f64;

    let (lo, hi) = (rgb(stops[lower]), rgb(stops[upper]));
    let mut out = [0u8; 3];
    for (c, o) in out.iter_mut().enumerate() {
        *o = (lo[c] + factor * (hi[c] - lo[c])).round() as u8;
    }
    out
}

impl Default for Palette {
    fn default() -> Self {
        Palette::IronBow
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Palette {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.to_ascii_lowercase().replace(|c: char| c == ' ' || c == '-', "_");
        Palette::ALL
            .iter()
            .copied()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| Error::invalid_argument(format!("unknown palette `{}`", s)))
    }
}

impl TryFrom<u32> for Palette {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        Palette::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| Error::invalid_argument(format!("palette index {} out of range", value)))
    }
}
