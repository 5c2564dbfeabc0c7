//! Summaries of an opened image: a serializable report and
//! a CSV dump of every pixel's temperature.
use std::{io::Write, path::PathBuf};

use itertools::iproduct;
use ndarray::Array2;
use serde_derive::*;

use crate::{
    metadata::{MeasurementRange, RecordingTime},
    palette::Palette,
    stats::Stats,
    temperature::TemperatureUnit,
};

/// Most sample points a report carries.
pub const MAX_SAMPLE_POINTS: usize = 20;

#[derive(Clone, Debug, Serialize)]
pub struct FileInfo {
    pub path: PathBuf,
    pub file_name: String,
    pub file_size: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct DeviceInfo {
    pub device_name: String,
    pub serial_number: u32,
    pub field_of_view: u16,
}

#[derive(Clone, Debug, Serialize)]
pub struct ImageInfo {
    pub width: usize,
    pub height: usize,
    pub recorded_at: Option<RecordingTime>,
    pub palette: Palette,
    pub has_visual_image: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct MeasurementInfo {
    pub emissivity: f64,
    pub reflected_temperature: f64,
    pub humidity: f64,
    pub unit: TemperatureUnit,
    pub range: MeasurementRange,
}

#[derive(Clone, Debug, Serialize)]
pub struct ScaleInfo {
    pub min: f32,
    pub max: f32,
}

#[derive(Clone, Debug, Serialize)]
pub struct HighlightInfo {
    pub use_limits: bool,
    pub lower_limit: f32,
    pub upper_limit: f32,
    pub use_isotherm: bool,
    pub lower_isotherm: f32,
    pub upper_isotherm: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SamplePoint {
    pub x: usize,
    pub y: usize,
    pub temperature: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct TemperatureSummary {
    #[serde(flatten)]
    pub stats: Stats,
    pub mean: Option<f64>,
    pub sample_points: Vec<SamplePoint>,
}

/// Everything known about one image. Temperatures are in
/// [`MeasurementInfo::unit`], except the measurement range,
/// scale and highlight bands which stay in Celsius.
#[derive(Clone, Debug, Serialize)]
pub struct Report {
    pub file: Option<FileInfo>,
    pub device: DeviceInfo,
    pub image: ImageInfo,
    pub measurement: MeasurementInfo,
    pub scale: ScaleInfo,
    pub highlight: HighlightInfo,
    pub temperatures: TemperatureSummary,
}

impl Report {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Temperatures on the grid of quarter width and height
/// steps, row by row, at most [`MAX_SAMPLE_POINTS`].
pub fn sample_points(temps: &Array2<f64>) -> Vec<SamplePoint> {
    let (ht, wid) = temps.dim();
    let step_x = (wid / 4).max(1);
    let step_y = (ht / 4).max(1);

    iproduct!((0..ht).step_by(step_y), (0..wid).step_by(step_x))
        .take(MAX_SAMPLE_POINTS)
        .map(|(y, x)| SamplePoint {
            x,
            y,
            temperature: temps[(y, x)],
        })
        .collect()
}

/// Write `temps` as `Y,X,Temperature` rows behind a comment
/// header, followed by a statistics comment.
pub fn write_csv<W: Write>(
    mut out: W,
    device_name: &str,
    temps: &Array2<f64>,
    unit: TemperatureUnit,
    stats: &Stats,
) -> std::io::Result<()> {
    let (ht, wid) = temps.dim();
    writeln!(out, "# Temperature Data Export")?;
    writeln!(out, "# Device: {}", device_name)?;
    writeln!(out, "# Size: {}x{}", wid, ht)?;
    writeln!(out, "# Unit: {}", unit.symbol())?;
    writeln!(out, "Y,X,Temperature")?;

    for ((y, x), temp) in temps.indexed_iter() {
        writeln!(out, "{},{},{:.2}", y, x, temp)?;
    }

    if let Some(mean) = stats.mean() {
        writeln!(
            out,
            "# Statistics: Min={:.2}, Max={:.2}, Avg={:.2}",
            stats.min, stats.max, mean
        )?;
    }
    out.flush()
}
