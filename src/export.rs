//! Writers for derived images.
//!
//! Thermal data goes out as a 16-bit greyscale TIFF in
//! deci-degree fixed point: `round(t * 10) + 32768`, so
//! -3276.8 to 3276.7 degrees fit without loss of the first
//! decimal. Palette renderings go out as 8-bit RGB PNGs.
use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufWriter, Cursor, ErrorKind, Write},
    iter,
    path::{Path, PathBuf},
};

use byteordered::ByteOrdered;
use image::tiff::TiffEncoder;
use ndarray::Array2;
use tracing::debug;

use crate::{
    calibration::{ordered, Calibration},
    error::{Error, Result},
    palette::Palette,
};

pub const FIXED_POINT_SCALE: f64 = 10.;
pub const FIXED_POINT_OFFSET: f64 = 32768.;

pub const LIMIT_ABOVE_COLOR: [u8; 3] = [0xff, 0x00, 0x00];
pub const LIMIT_BELOW_COLOR: [u8; 3] = [0x00, 0x00, 0xff];
pub const ISOTHERM_COLOR: [u8; 3] = [0x00, 0xff, 0x00];

pub fn to_fixed_point(temp: f64) -> u16 {
    let val = (temp * FIXED_POINT_SCALE).round() + FIXED_POINT_OFFSET;
    if val.is_nan() {
        return 0;
    }
    val.max(0.).min(u16::MAX as f64) as u16
}

pub fn from_fixed_point(val: u16) -> f64 {
    (val as f64 - FIXED_POINT_OFFSET) / FIXED_POINT_SCALE
}

/// `path`, then `stem_1.ext`, `stem_2.ext`, ...
fn candidates(path: &Path) -> impl Iterator<Item = PathBuf> + '_ {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path.extension().map(|e| e.to_string_lossy().into_owned());

    iter::once(path.to_path_buf()).chain((1u32..).map(move |idx| {
        let name = match &ext {
            Some(ext) => format!("{}_{}.{}", stem, idx, ext),
            None => format!("{}_{}", stem, idx),
        };
        path.with_file_name(name)
    }))
}

/// A freshly created output file and where it lives.
#[derive(Debug)]
pub struct OutputFile {
    pub path: PathBuf,
    file: File,
}

impl OutputFile {
    /// Create the file for a requested path: extension replaced
    /// by `ext`, parent directories created. Without
    /// `overwrite` the first free name of `path`, `stem_1.ext`,
    /// ... is claimed with `create_new`, so concurrent writers
    /// never share a file.
    pub fn create(requested: &Path, ext: &str, overwrite: bool) -> Result<Self> {
        let path = requested.with_extension(ext);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::file_io(parent, e))?;
        }
        if overwrite {
            let file = File::create(&path).map_err(|e| Error::file_io(&path, e))?;
            return Ok(OutputFile { path, file });
        }

        for candidate in candidates(&path) {
            match OpenOptions::new().write(true).create_new(true).open(&candidate) {
                Ok(file) => {
                    return Ok(OutputFile {
                        path: candidate,
                        file,
                    })
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(Error::file_io(&candidate, e)),
            }
        }
        Err(Error::file_io(
            &path,
            io::Error::new(ErrorKind::AlreadyExists, "no free file name left"),
        ))
    }

    pub fn writer(&self) -> Result<BufWriter<File>> {
        let file = self.file.try_clone().map_err(|e| Error::file_io(&self.path, e))?;
        Ok(BufWriter::new(file))
    }
}

pub(crate) fn write_bytes(out: &OutputFile, data: &[u8]) -> Result<()> {
    let mut writer = out.writer()?;
    writer
        .write_all(data)
        .and_then(|_| writer.flush())
        .map_err(|e| Error::file_io(&out.path, e))
}

/// Write temperatures as a fixed point 16-bit TIFF.
pub fn write_thermal_tiff(out: &OutputFile, temps: &Array2<f64>) -> Result<()> {
    let path = out.path.as_path();
    let (ht, wid) = temps.dim();
    let mut image_buffer = {
        let vec = Vec::with_capacity(2 * ht * wid);
        ByteOrdered::native(Cursor::new(vec))
    };
    for temp in temps.iter() {
        image_buffer
            .write_u16(to_fixed_point(*temp))
            .map_err(|e| Error::Encoding("TIFF", e.to_string()))?;
    }

    let image_writer = out.writer()?;
    TiffEncoder::new(image_writer)
        .encode(
            &image_buffer.into_inner().into_inner(),
            wid as u32,
            ht as u32,
            image::ColorType::L16,
        )
        .map_err(|e| match e {
            image::ImageError::IoError(source) => Error::file_io(path, source),
            other => Error::Encoding("TIFF", other.to_string()),
        })?;
    debug!(path = %path.display(), wid, ht, "wrote thermal tiff");
    Ok(())
}

/// Write packed RGB rows as a PNG.
pub fn write_rgb_png(out: &OutputFile, rgb: &[u8], width: u32, height: u32) -> Result<()> {
    let path = out.path.as_path();
    let map_err = |e: png::EncodingError| match e {
        png::EncodingError::IoError(source) => Error::file_io(path, source),
        other => Error::Encoding("PNG", other.to_string()),
    };

    let image_writer = out.writer()?;
    let mut png_writer = {
        let mut encoder = png::Encoder::new(image_writer, width, height);
        encoder.set_color(png::ColorType::RGB);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.write_header().map_err(map_err)?
    };
    png_writer.write_image_data(rgb).map_err(map_err)?;
    debug!(path = %path.display(), width, height, "wrote palette png");
    Ok(())
}

/// Render Celsius temperatures through `palette` over the
/// calibration's scale, with limit and isotherm highlights
/// when they are applied.
pub fn render_palette(temps: &Array2<f64>, calibration: &Calibration, palette: Palette) -> Vec<u8> {
    let (lo, hi) = ordered(calibration.min_scale(), calibration.max_scale());
    let span = hi - lo;
    let limits = calibration.limits();
    let (lower_limit, upper_limit) = ordered(limits.lower, limits.upper);
    let isotherm = calibration.isotherm();

    let mut rgb = Vec::with_capacity(3 * temps.len());
    for &temp in temps.iter() {
        let color = if limits.applied && temp > upper_limit {
            LIMIT_ABOVE_COLOR
        } else if limits.applied && temp < lower_limit {
            LIMIT_BELOW_COLOR
        } else if isotherm.applied && isotherm.contains(temp) {
            ISOTHERM_COLOR
        } else if span > 0. {
            palette.color_at((temp - lo) / span)
        } else {
            palette.color_at(if temp > lo { 1. } else { 0. })
        };
        rgb.extend_from_slice(&color);
    }
    rgb
}
