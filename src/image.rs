//! An opened BMT image. [`BmtImage`] owns everything parsed
//! from one file and turns raw values into temperatures on
//! demand, for one pixel or the whole matrix at once. It also
//! writes the derived outputs: the report, the CSV dump and
//! the visual, thermal and palette exports.
use std::{
    fs,
    path::{Path, PathBuf},
};

use ndarray::{Array2, Zip};
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::{
    calibration::Calibration,
    config::Config,
    container::Container,
    error::{Component, Error, Result},
    export,
    metadata::Metadata,
    palette::Palette,
    report::{self, Report},
    stats::Stats,
    temperature::{SensorConstants, TemperatureUnit},
};

/// One opened BMT image: raw sensor values with everything
/// needed to turn them into temperatures, plus the embedded
/// visual image if there is one.
#[derive(Clone, Debug)]
pub struct BmtImage {
    path: Option<PathBuf>,
    file_size: u64,
    overwrite: bool,

    raw: Option<Array2<u16>>,
    constants: SensorConstants,
    calibration: Calibration,
    metadata: Metadata,
    palette: Palette,
    visual: Option<Vec<u8>>,
}

impl BmtImage {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let Container {
            raw,
            constants,
            calibration,
            metadata,
            palette,
            visual,
        } = Container::parse(data)?;

        Ok(BmtImage {
            path: None,
            file_size: data.len() as u64,
            overwrite: false,
            raw,
            constants: constants.unwrap_or_default(),
            calibration,
            metadata,
            palette,
            visual,
        })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, &Config::default())
    }

    /// Open `path`, then apply the overrides in `config`.
    #[instrument(skip(path, config), fields(path = %path.as_ref().display()))]
    pub fn open_with<P: AsRef<Path>>(path: P, config: &Config) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|e| Error::file_io(path, e))?;
        let mut image = Self::from_bytes(&data)?;

        image.path = Some(path.to_path_buf());
        image.overwrite = config.overwrite;
        if let Some(palette) = config.palette {
            image.palette = palette;
        }
        if let Some(distance) = config.object_distance {
            image.constants.object_distance = distance;
        }

        info!(
            device = %image.metadata.device_name,
            width = image.width(),
            height = image.height(),
            visual = image.visual.is_some(),
            "opened image"
        );
        Ok(image)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Width of the thermal image; 0 without raw data.
    pub fn width(&self) -> usize {
        self.raw.as_ref().map_or(0, |r| r.ncols())
    }

    /// Height of the thermal image; 0 without raw data.
    pub fn height(&self) -> usize {
        self.raw.as_ref().map_or(0, |r| r.nrows())
    }

    pub fn has_thermal_image(&self) -> bool {
        self.raw.is_some()
    }

    pub fn has_visual_image(&self) -> bool {
        self.visual.is_some()
    }

    pub fn raw_data(&self) -> Result<&Array2<u16>> {
        self.raw
            .as_ref()
            .ok_or(Error::ComponentMissing(Component::ThermalImage))
    }

    /// Bytes of the embedded visual image file.
    pub fn visual_image(&self) -> Result<&[u8]> {
        self.visual
            .as_deref()
            .ok_or(Error::ComponentMissing(Component::VisualImage))
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn constants(&self) -> &SensorConstants {
        &self.constants
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn calibration_mut(&mut self) -> &mut Calibration {
        &mut self.calibration
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
    }

    /// Temperature at column `x`, row `y`.
    pub fn temperature_at(&self, x: usize, y: usize, unit: TemperatureUnit) -> Result<f64> {
        let raw = self.raw_data()?;
        let val = raw.get((y, x)).ok_or_else(|| {
            Error::invalid_argument(format!(
                "pixel ({}, {}) outside {}x{} image",
                x,
                y,
                raw.ncols(),
                raw.nrows()
            ))
        })?;
        let celsius = self.constants.raw_to_temp(&self.calibration, *val as f64);
        Ok(unit.from_celsius(celsius))
    }

    /// Temperatures of all pixels, computed in parallel.
    pub fn temperature_matrix(&self, unit: TemperatureUnit) -> Result<Array2<f64>> {
        let raw = self.raw_data()?;
        let temp_t = self.constants.temperature_transform(&self.calibration);
        Ok(Zip::from(raw).par_map_collect(|val| unit.from_celsius(temp_t(*val as f64))))
    }

    pub fn stats(&self, unit: TemperatureUnit) -> Result<Stats> {
        Ok(stats_of(&self.temperature_matrix(unit)?))
    }

    pub fn report(&self, unit: TemperatureUnit) -> Result<Report> {
        let temps = self.temperature_matrix(unit)?;
        let stats = stats_of(&temps);
        let limits = self.calibration.limits();
        let isotherm = self.calibration.isotherm();

        let file = self.path.as_ref().map(|path| report::FileInfo {
            path: path.clone(),
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            file_size: self.file_size,
        });

        Ok(Report {
            file,
            device: report::DeviceInfo {
                device_name: self.metadata.device_name.clone(),
                serial_number: self.metadata.serial_number,
                field_of_view: self.metadata.field_of_view,
            },
            image: report::ImageInfo {
                width: self.width(),
                height: self.height(),
                recorded_at: Some(self.metadata.recorded_at).filter(|t| t.is_valid()),
                palette: self.palette,
                has_visual_image: self.has_visual_image(),
            },
            measurement: report::MeasurementInfo {
                emissivity: self.calibration.emissivity(),
                reflected_temperature: self.calibration.reflected_temperature(),
                humidity: self.calibration.humidity(),
                unit,
                range: self.metadata.measurement_range,
            },
            scale: report::ScaleInfo {
                min: self.calibration.min_scale(),
                max: self.calibration.max_scale(),
            },
            highlight: report::HighlightInfo {
                use_limits: limits.applied,
                lower_limit: limits.lower,
                upper_limit: limits.upper,
                use_isotherm: isotherm.applied,
                lower_isotherm: isotherm.lower,
                upper_isotherm: isotherm.upper,
            },
            temperatures: report::TemperatureSummary {
                mean: stats.mean(),
                stats,
                sample_points: report::sample_points(&temps),
            },
        })
    }

    /// Dump all temperatures to a CSV file; returns the path
    /// written.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn write_csv<P: AsRef<Path>>(&self, path: P, unit: TemperatureUnit) -> Result<PathBuf> {
        let temps = self.temperature_matrix(unit)?;
        let stats = stats_of(&temps);

        let out = export::OutputFile::create(path.as_ref(), "csv", self.overwrite)?;
        let path = out.path.clone();
        report::write_csv(
            out.writer()?,
            &self.metadata.device_name,
            &temps,
            unit,
            &stats,
        )
        .map_err(|e| Error::file_io(&path, e))?;
        debug!(path = %path.display(), "wrote csv");
        Ok(path)
    }

    /// Write the embedded visual image as found in the file.
    /// The extension follows the detected image format.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn export_visual<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf> {
        let data = self.visual_image()?;
        let ext = match image::guess_format(data) {
            Ok(image::ImageFormat::Png) => "png",
            Ok(image::ImageFormat::Jpeg) => "jpg",
            Ok(image::ImageFormat::Bmp) => "bmp",
            _ => "bin",
        };
        let out = export::OutputFile::create(path.as_ref(), ext, self.overwrite)?;
        export::write_bytes(&out, data)?;
        debug!(path = %out.path.display(), len = data.len(), "wrote visual image");
        Ok(out.path)
    }

    /// Write temperatures in `unit` as a fixed point TIFF.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn export_thermal<P: AsRef<Path>>(&self, path: P, unit: TemperatureUnit) -> Result<PathBuf> {
        let temps = self.temperature_matrix(unit)?;
        let out = export::OutputFile::create(path.as_ref(), "tif", self.overwrite)?;
        export::write_thermal_tiff(&out, &temps)?;
        Ok(out.path)
    }

    /// Render the thermal image through the current palette.
    /// Colours depend on the scale and bands alone, so `unit`
    /// does not change the pixels.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn export_thermal_with_palette<P: AsRef<Path>>(
        &self,
        path: P,
        unit: TemperatureUnit,
    ) -> Result<PathBuf> {
        let temps = self.temperature_matrix(TemperatureUnit::Celsius)?;
        let rgb = export::render_palette(&temps, &self.calibration, self.palette);
        let out = export::OutputFile::create(path.as_ref(), "png", self.overwrite)?;
        let (ht, wid) = temps.dim();
        export::write_rgb_png(&out, &rgb, wid as u32, ht as u32)?;
        debug!(palette = %self.palette, %unit, "rendered palette image");
        Ok(out.path)
    }
}

fn stats_of(temps: &Array2<f64>) -> Stats {
    temps
        .par_iter()
        .fold(Stats::default, |mut acc, val| {
            acc += *val;
            acc
        })
        .reduce(Stats::default, |mut acc, val| {
            acc += &val;
            acc
        })
}
