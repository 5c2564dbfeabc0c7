//! Parse the BMT container.
//!
//! A BMT file is a record directory in the style of the FLIR
//! FFF format: a fixed header points at a table of directory
//! entries, each describing one typed record (raw sensor
//! values, camera parameters, device information, display
//! settings, embedded visual image) by offset and length.
//! The byte order of the file is inferred from the header
//! version; each record additionally announces its own byte
//! order in its first two bytes.
//!
//! # Layout
//!
//! ```text
//! 0x00  string[4]   signature = "BMT\0"
//! 0x04  string[16]  creator
//! 0x14  int32u      format version, 100..200
//! 0x18  int32u      offset to record directory
//! 0x1c  int32u      number of directory entries
//! 0x20  int32u      next free index id
//! 0x24  int16u      swap pattern
//! 0x26  int16u[7]   spares
//! 0x34  int32u[2]   reserved
//! 0x3c  int32u      checksum
//! ```
//!
//! Every record starts with a 0x20 byte header; record
//! specific fields start at [`RECORD_BODY`].
use std::{convert::TryFrom, io::Read};

use bincode::{DefaultOptions, Options};
use byteordered::{ByteOrdered, Endianness};
use ndarray::Array2;
use serde::Deserialize;
use serde_derive::*;
use tracing::{debug, instrument, warn};

use crate::{
    bitmap,
    calibration::{Band, Calibration, DisplaySettings},
    error::{Error, Result},
    metadata::{text_field, MeasurementRange, Metadata, RecordingTime},
    palette::Palette,
    temperature::{SensorConstants, CELSIUS_OFFSET},
};

pub(crate) const SIGNATURE: &[u8; 4] = b"BMT\0";
pub(crate) const HEADER_LEN: usize = 0x40;
pub(crate) const DIR_ENTRY_LEN: usize = 0x20;
pub(crate) const RECORD_BODY: usize = 0x20;
pub(crate) const VERSIONS: std::ops::Range<u32> = 100..200;

pub(crate) const LITTLE_ENDIAN_MARKER: u16 = 2;
pub(crate) const BIG_ENDIAN_MARKER: u16 = 1;

pub(crate) const CAMERA_PARAMS_LEN: usize = RECORD_BODY + 0x4c;
pub(crate) const DEVICE_INFO_LEN: usize = RECORD_BODY + 0x50;
pub(crate) const DISPLAY_PARAMS_LEN: usize = RECORD_BODY + 0x20;

pub(crate) const FLAG_LIMITS_APPLIED: u32 = 0b01;
pub(crate) const FLAG_ISOTHERM_APPLIED: u32 = 0b10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum RecordType {
    RawData = 0x01,
    VisualImage = 0x0e,
    CameraParams = 0x20,
    DeviceInfo = 0x21,
    DisplayParams = 0x22,
}

impl TryFrom<u16> for RecordType {
    type Error = u16;

    fn try_from(value: u16) -> std::result::Result<Self, u16> {
        Ok(match value {
            0x01 => RecordType::RawData,
            0x0e => RecordType::VisualImage,
            0x20 => RecordType::CameraParams,
            0x21 => RecordType::DeviceInfo,
            0x22 => RecordType::DisplayParams,
            other => return Err(other),
        })
    }
}

/// Raw data subtypes: 1 = big endian, 2 = little endian,
/// 3 = PNG compressed.
pub(crate) const RAW_SUBTYPE_PNG: u16 = 3;

/// Contents of a parsed container. Sections absent from the
/// file are `None`.
#[derive(Debug)]
pub struct Container {
    pub raw: Option<Array2<u16>>,
    pub constants: Option<SensorConstants>,
    pub calibration: Calibration,
    pub metadata: Metadata,
    pub palette: Palette,
    pub visual: Option<Vec<u8>>,
}

impl Container {
    #[instrument(level = "debug", skip(data), fields(len = data.len()))]
    pub fn parse(data: &[u8]) -> Result<Self> {
        let is_le = is_container_little_endian(data)?;
        let dir = parse_directory(data, is_le)?;
        debug!(entries = dir.len(), little_endian = is_le, "read record directory");
        for entry in dir.iter() {
            entry.data(data)?;
            if let Err(ty) = RecordType::try_from(entry.ty) {
                debug!(ty, offset = entry.offset, "skipping unknown record");
            }
        }

        let record = |ty: RecordType| dir.iter().find(|e| e.ty == ty as u16);

        let raw = record(RecordType::RawData)
            .map(|e| e.parse_raw_data(data))
            .transpose()?;
        let camera = record(RecordType::CameraParams)
            .map(|e| e.parse_record::<CameraParamsRecord>(data, CAMERA_PARAMS_LEN))
            .transpose()?;
        let device = record(RecordType::DeviceInfo)
            .map(|e| e.parse_record::<DeviceInfoRecord>(data, DEVICE_INFO_LEN))
            .transpose()?;
        let display = record(RecordType::DisplayParams)
            .map(|e| e.parse_record::<DisplayParamsRecord>(data, DISPLAY_PARAMS_LEN))
            .transpose()?;
        let visual = record(RecordType::VisualImage)
            .map(|e| e.parse_visual(data))
            .transpose()?;

        if raw.is_none() && visual.is_none() {
            return Err(Error::format("container holds neither raw data nor a visual image"));
        }
        if raw.is_some() && camera.is_none() {
            return Err(Error::format("raw data present but no camera params found"));
        }

        let mut metadata = device.map(Metadata::from).unwrap_or_default();
        let (constants, mut calibration) = match camera {
            Some(params) => {
                metadata.measurement_range = MeasurementRange {
                    min: kelvin_to_celsius(params.measurement_range[0]),
                    max: kelvin_to_celsius(params.measurement_range[1]),
                };
                let calibration = Calibration::from_recorded(
                    params.emissivity as f64,
                    kelvin_to_celsius(params.reflected_apparent_temperature) as f64,
                    params.relative_humidity as f64 * 100.,
                );
                (Some(SensorConstants::from(&params)), calibration)
            }
            None => (None, Calibration::default()),
        };

        let palette = match display {
            Some(display) => {
                calibration = calibration.with_display(DisplaySettings::from(&display));
                Palette::try_from(display.palette).unwrap_or_else(|e| {
                    warn!("{}, using default palette", e);
                    Palette::default()
                })
            }
            None => {
                let range = metadata.measurement_range;
                if range.min < range.max {
                    calibration = calibration.with_display(DisplaySettings::spanning(range));
                }
                Palette::default()
            }
        };

        Ok(Container {
            raw,
            constants,
            calibration,
            metadata,
            palette,
            visual,
        })
    }
}

fn kelvin_to_celsius(kelvin: f32) -> f32 {
    (kelvin as f64 - CELSIUS_OFFSET) as f32
}

/// Read the header version and decide the file's byte
/// order: a version in `100..200` read little endian means
/// a little endian file, the byte-swapped value in that range
/// a big endian one.
fn is_container_little_endian(data: &[u8]) -> Result<bool> {
    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct BmtHeaderPre {
        format: [u8; 4],
        creator: [u8; 16],
        version: u32,
    }

    if data.len() < HEADER_LEN {
        return Err(Error::format(format!(
            "file too short for header: {} bytes",
            data.len()
        )));
    }

    let hdr: BmtHeaderPre = deserialize_with_endian(true, data)?;
    if &hdr.format != SIGNATURE {
        return Err(Error::format("unexpected signature"));
    }

    if VERSIONS.contains(&hdr.version) {
        Ok(true)
    } else if VERSIONS.contains(&hdr.version.swap_bytes()) {
        Ok(false)
    } else {
        Err(Error::format(format!(
            "unsupported format version {:#x}",
            hdr.version
        )))
    }
}

fn parse_directory(data: &[u8], is_le: bool) -> Result<Vec<BmtRecordDirEntry>> {
    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct BmtHeader {
        offset: u32,
        num_entries: u32,

        next_free: u32,
        swap_pattern: u16,
        spares: [u16; 7],
        reserved: [u32; 2],
        checksum: u32,
    }

    let hdr: BmtHeader = deserialize_with_endian(is_le, &data[0x18..])?;
    let offset = hdr.offset as usize;
    let dir_len = (hdr.num_entries as usize)
        .checked_mul(DIR_ENTRY_LEN)
        .ok_or_else(|| Error::format("record directory size overflows"))?;
    let mut dir_segment = data
        .get(offset..)
        .filter(|d| d.len() >= dir_len)
        .ok_or_else(|| {
            Error::format(format!(
                "record directory ({} entries at {:#x}) exceeds file",
                hdr.num_entries, offset
            ))
        })?;

    (0..hdr.num_entries)
        .map(|_| deserialize_with_endian(is_le, &mut dir_segment))
        .collect()
}

// Directory entry:
// 0x00 - int16u record type
// 0x02 - int16u record subtype
// 0x04 - int32u record version
// 0x08 - int32u index id
// 0x0c - int32u record offset from start of file
// 0x10 - int32u record length
// 0x14 - int32u parent
// 0x18 - int32u object number
// 0x1c - int32u checksum: 0 for no checksum
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
pub(crate) struct BmtRecordDirEntry {
    ty: u16,
    sub_type: u16,
    version: u32,

    id: u32,
    offset: u32,
    length: u32,

    parent: u32,
    obj_num: u32,
    checksum: u32,
}

impl BmtRecordDirEntry {
    fn data<'a>(&self, segment: &'a [u8]) -> Result<&'a [u8]> {
        let start = self.offset as usize;
        start
            .checked_add(self.length as usize)
            .and_then(|end| segment.get(start..end))
            .ok_or_else(|| {
                Error::format(format!(
                    "record {:#x} ({} bytes at {:#x}) exceeds file",
                    self.ty, self.length, self.offset
                ))
            })
    }

    /// Record data, checked to hold at least `min_len` bytes,
    /// with its own byte order.
    fn record_data<'a>(&self, segment: &'a [u8], min_len: usize) -> Result<(&'a [u8], bool)> {
        let data = self.data(segment)?;
        if data.len() < min_len {
            return Err(Error::format(format!(
                "record {:#x} size mismatch: expected at least {} bytes, found {}",
                self.ty,
                min_len,
                data.len()
            )));
        }
        let is_le = deserialize_with_endian::<u16, _>(true, data)? == LITTLE_ENDIAN_MARKER;
        Ok((data, is_le))
    }

    fn parse_record<T>(&self, segment: &[u8], min_len: usize) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let (data, is_le) = self.record_data(segment, min_len)?;
        deserialize_with_endian(is_le, &data[RECORD_BODY..])
    }

    fn parse_raw_data(&self, segment: &[u8]) -> Result<Array2<u16>> {
        if self.sub_type == RAW_SUBTYPE_PNG {
            return Err(Error::NotImplemented("PNG compressed raw data"));
        }

        let (data, is_le) = self.record_data(segment, 6)?;

        #[derive(Debug, Deserialize)]
        struct RawDataDims {
            width: u16,
            height: u16,
        }
        let dims: RawDataDims = deserialize_with_endian(is_le, &data[2..])?;
        let width = dims.width as usize;
        let height = dims.height as usize;
        if width == 0 || height == 0 {
            return Err(Error::format(format!(
                "raw data has empty dimensions {}x{}",
                width, height
            )));
        }

        let expected = 2 * (16 + width * height);
        if data.len() != expected {
            return Err(Error::format(format!(
                "raw data record size mismatch: expected {} bytes, found {}",
                expected,
                data.len()
            )));
        }

        let endianness = if is_le {
            Endianness::Little
        } else {
            Endianness::Big
        };
        let mut rdr = ByteOrdered::runtime(&data[RECORD_BODY..], endianness);
        let mut raw_data = Vec::with_capacity(width * height);
        for _ in 0..width * height {
            let val = rdr
                .read_u16()
                .map_err(|e| Error::format(format!("reading raw data: {}", e)))?;
            raw_data.push(val);
        }

        Array2::from_shape_vec((height, width), raw_data)
            .map_err(|e| Error::format(e.to_string()))
    }

    /// Embedded image file bytes. Bitmaps are cut to the size
    /// their own header declares, dropping record padding.
    fn parse_visual(&self, segment: &[u8]) -> Result<Vec<u8>> {
        let (data, _) = self.record_data(segment, RECORD_BODY + 1)?;
        let payload = &data[RECORD_BODY..];
        let payload = match bitmap::bitmap_len(payload) {
            Some(len) => &payload[..len],
            None => payload,
        };
        Ok(payload.to_vec())
    }
}

/// Camera parameter record, at [`RECORD_BODY`].
/// Temperatures in Kelvin, humidity as a fraction.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct CameraParamsRecord {
    pub(crate) emissivity: f32,
    pub(crate) object_distance: f32,

    pub(crate) reflected_apparent_temperature: f32,
    pub(crate) atmospheric_temperature: f32,
    pub(crate) ir_window_temperature: f32,
    pub(crate) ir_window_transmission: f32,
    pub(crate) relative_humidity: f32,

    pub(crate) planck_r1: f32,
    pub(crate) planck_b: f32,
    pub(crate) planck_f: f32,
    pub(crate) planck_o: i32,
    pub(crate) planck_r2: f32,

    pub(crate) atmospheric_transmission_alpha_1: f32,
    pub(crate) atmospheric_transmission_alpha_2: f32,
    pub(crate) atmospheric_transmission_beta_1: f32,
    pub(crate) atmospheric_transmission_beta_2: f32,
    pub(crate) atmospheric_transmission_x: f32,

    pub(crate) measurement_range: [f32; 2],
}

impl From<&CameraParamsRecord> for SensorConstants {
    fn from(p: &CameraParamsRecord) -> Self {
        SensorConstants {
            planck_r1: p.planck_r1 as f64,
            planck_b: p.planck_b as f64,
            planck_f: p.planck_f as f64,
            planck_o: p.planck_o as f64,
            planck_r2: p.planck_r2 as f64,

            atmospheric_temperature: p.atmospheric_temperature as f64 - CELSIUS_OFFSET,
            atmospheric_transmission_alpha_1: p.atmospheric_transmission_alpha_1 as f64,
            atmospheric_transmission_alpha_2: p.atmospheric_transmission_alpha_2 as f64,
            atmospheric_transmission_beta_1: p.atmospheric_transmission_beta_1 as f64,
            atmospheric_transmission_beta_2: p.atmospheric_transmission_beta_2 as f64,
            atmospheric_transmission_x: p.atmospheric_transmission_x as f64,

            ir_window_temperature: p.ir_window_temperature as f64 - CELSIUS_OFFSET,
            ir_window_transmission: p.ir_window_transmission as f64,

            object_distance: p.object_distance as f64,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct DeviceInfoRecord {
    pub(crate) device_name: [u8; 32],
    pub(crate) part_number: [u8; 16],
    pub(crate) serial_number: u32,
    pub(crate) firmware: [u8; 16],
    pub(crate) field_of_view: u16,
    pub(crate) _reserved: u16,
    pub(crate) year: u16,
    pub(crate) month: u8,
    pub(crate) day: u8,
    pub(crate) hour: u8,
    pub(crate) minute: u8,
    pub(crate) second: u8,
    pub(crate) _pad: u8,
}

impl From<DeviceInfoRecord> for Metadata {
    fn from(d: DeviceInfoRecord) -> Self {
        let device_name = text_field(&d.device_name);
        Metadata {
            device_name: if device_name.is_empty() {
                Metadata::default().device_name
            } else {
                device_name
            },
            part_number: text_field(&d.part_number),
            firmware: text_field(&d.firmware),
            serial_number: d.serial_number,
            field_of_view: d.field_of_view,
            recorded_at: RecordingTime {
                year: d.year,
                month: d.month,
                day: d.day,
                hour: d.hour,
                minute: d.minute,
                second: d.second,
            },
            measurement_range: MeasurementRange::default(),
        }
    }
}

/// Display parameter record, temperatures in Kelvin.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct DisplayParamsRecord {
    pub(crate) min_scale: f32,
    pub(crate) max_scale: f32,
    pub(crate) lower_limit: f32,
    pub(crate) upper_limit: f32,
    pub(crate) lower_isotherm: f32,
    pub(crate) upper_isotherm: f32,
    pub(crate) flags: u32,
    pub(crate) palette: u32,
}

impl From<&DisplayParamsRecord> for DisplaySettings {
    fn from(d: &DisplayParamsRecord) -> Self {
        DisplaySettings {
            min_scale: kelvin_to_celsius(d.min_scale),
            max_scale: kelvin_to_celsius(d.max_scale),
            limits: Band {
                lower: kelvin_to_celsius(d.lower_limit),
                upper: kelvin_to_celsius(d.upper_limit),
                applied: d.flags & FLAG_LIMITS_APPLIED != 0,
            },
            isotherm: Band {
                lower: kelvin_to_celsius(d.lower_isotherm),
                upper: kelvin_to_celsius(d.upper_isotherm),
                applied: d.flags & FLAG_ISOTHERM_APPLIED != 0,
            },
        }
    }
}

impl DisplaySettings {
    /// Scale and bands covering the whole measurement range,
    /// nothing applied.
    fn spanning(range: MeasurementRange) -> Self {
        DisplaySettings {
            min_scale: range.min,
            max_scale: range.max,
            limits: Band::new(range.min, range.max),
            isotherm: Band::new(range.min, range.max),
        }
    }
}

fn deserialize_with_endian<T, R>(use_little_endian: bool, read: R) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
    R: Read,
{
    let opts = DefaultOptions::new()
        .with_fixint_encoding()
        .allow_trailing_bytes();
    Ok(if use_little_endian {
        opts.with_little_endian().deserialize_from(read)?
    } else {
        opts.with_big_endian().deserialize_from(read)?
    })
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    use super::*;
    use crate::{
        builder::{fixtures, ContainerBuilder},
        error::ResultCode,
    };

    fn raw_record(width: u16, height: u16, values: usize) -> Vec<u8> {
        let mut data = vec![0u8; RECORD_BODY];
        data[0..2].copy_from_slice(&LITTLE_ENDIAN_MARKER.to_le_bytes());
        data[2..4].copy_from_slice(&width.to_le_bytes());
        data[4..6].copy_from_slice(&height.to_le_bytes());
        data.resize(RECORD_BODY + 2 * values, 0x11);
        data
    }

    fn visual_only() -> ContainerBuilder {
        ContainerBuilder::new().visual_image(fixtures::tiny_bitmap())
    }

    fn assert_format_error(data: &[u8]) {
        let err = Container::parse(data).unwrap_err();
        assert_eq!(err.code(), ResultCode::GenericError, "{}", err);
    }

    #[test]
    fn parses_little_endian_container() -> anyhow::Result<()> {
        let container = Container::parse(&fixtures::thermal_only())?;

        assert_eq!(container.raw.as_ref(), Some(&fixtures::scene()));
        assert!(container.visual.is_none());
        assert_eq!(container.palette, Palette::RainBow);

        let constants = container.constants.unwrap();
        assert!(approx_eq!(f64, constants.object_distance, 0.));
        assert!(approx_eq!(f64, constants.planck_o, -7340.));

        let calibration = &container.calibration;
        assert!(approx_eq!(f64, calibration.emissivity(), 1.));
        assert!(approx_eq!(f64, calibration.humidity(), 50., epsilon = 1e-4));
        assert!(approx_eq!(f32, calibration.min_scale(), 15., epsilon = 1e-4));
        assert!(approx_eq!(f32, calibration.max_scale(), 40., epsilon = 1e-4));

        let expected = fixtures::metadata();
        let metadata = &container.metadata;
        assert_eq!(metadata.device_name, expected.device_name);
        assert_eq!(metadata.serial_number, expected.serial_number);
        assert_eq!(metadata.firmware, expected.firmware);
        assert_eq!(metadata.recorded_at, expected.recorded_at);
        assert_eq!(metadata.field_of_view, 42);
        assert!(approx_eq!(f32, metadata.measurement_range.min, -30., epsilon = 1e-3));
        assert!(approx_eq!(f32, metadata.measurement_range.max, 650., epsilon = 1e-3));
        Ok(())
    }

    #[test]
    fn big_endian_container_reads_the_same() -> anyhow::Result<()> {
        let data = fixtures::thermal_builder().big_endian(true).build()?;
        assert!(!is_container_little_endian(&data)?);

        let container = Container::parse(&data)?;
        assert_eq!(container.raw.as_ref(), Some(&fixtures::scene()));
        assert_eq!(container.palette, Palette::RainBow);
        assert_eq!(container.metadata.serial_number, 61_234_567);
        assert!(approx_eq!(f64, container.calibration.emissivity(), 1.));
        Ok(())
    }

    #[test]
    fn display_flags_survive() -> anyhow::Result<()> {
        let mut calibration = fixtures::black_body();
        calibration.set_lower_isotherm(30.)?;
        calibration.set_upper_isotherm(32.)?;
        calibration.apply_isotherm(true);

        let data = fixtures::thermal_builder().calibration(calibration).build()?;
        let container = Container::parse(&data)?;
        assert!(!container.calibration.limits().applied);
        assert!(container.calibration.isotherm().applied);
        assert!(approx_eq!(f32, container.calibration.isotherm().lower, 30., epsilon = 1e-4));
        Ok(())
    }

    #[test]
    fn visual_only_container() -> anyhow::Result<()> {
        let container = Container::parse(&visual_only().build()?)?;
        assert!(container.raw.is_none());
        assert!(container.constants.is_none());
        assert_eq!(container.metadata.device_name, "Unknown");

        // record padding behind the bitmap is dropped
        let visual = container.visual.unwrap();
        assert_eq!(visual.len(), 70);
        assert_eq!(&visual[..], &fixtures::tiny_bitmap()[..70]);
        Ok(())
    }

    #[test]
    fn unknown_records_are_skipped() -> anyhow::Result<()> {
        let data = fixtures::thermal_builder()
            .record(0x99, 0, vec![0xee; 48])
            .build()?;
        assert!(Container::parse(&data)?.raw.is_some());
        Ok(())
    }

    #[test]
    fn rejects_bad_headers() {
        let data = fixtures::thermal_only();

        let mut bad = data.clone();
        bad[0] = b'X';
        assert_format_error(&bad);

        let mut bad = data.clone();
        bad[0x14..0x18].copy_from_slice(&7u32.to_le_bytes());
        assert_format_error(&bad);

        assert_format_error(&data[..HEADER_LEN - 1]);
        assert_format_error(&[]);
    }

    #[test]
    fn rejects_truncated_and_out_of_range_records() {
        let data = fixtures::thermal_only();
        assert_format_error(&data[..HEADER_LEN + 5]);
        assert_format_error(&data[..data.len() - 3]);

        // point the first record past the end of the file
        let mut bad = data.clone();
        let at = HEADER_LEN + 0x0c;
        bad[at..at + 4].copy_from_slice(&u32::MAX.to_le_bytes());
        assert_format_error(&bad);

        // absurd directory size
        let mut bad = data.clone();
        bad[0x1c..0x20].copy_from_slice(&u32::MAX.to_le_bytes());
        assert_format_error(&bad);
    }

    #[test]
    fn skipped_records_are_still_bounds_checked() -> anyhow::Result<()> {
        let mut data = fixtures::thermal_builder()
            .record(0x99, 0, vec![0xee; 48])
            .build()?;
        assert!(Container::parse(&data).is_ok());

        // the unknown record is the last directory entry
        let count = u32::from_le_bytes([data[0x1c], data[0x1d], data[0x1e], data[0x1f]]) as usize;
        let at = HEADER_LEN + (count - 1) * DIR_ENTRY_LEN + 0x0c;
        data[at..at + 4].copy_from_slice(&u32::MAX.to_le_bytes());
        assert_format_error(&data);
        Ok(())
    }

    #[test]
    fn raw_size_must_match_dimensions() -> anyhow::Result<()> {
        let data = visual_only()
            .constants(fixtures::vacuum())
            .record(RecordType::RawData as u16, 2, raw_record(4, 4, 10))
            .build()?;
        assert_format_error(&data);

        let data = visual_only()
            .constants(fixtures::vacuum())
            .record(RecordType::RawData as u16, 2, raw_record(0, 4, 0))
            .build()?;
        assert_format_error(&data);
        Ok(())
    }

    #[test]
    fn compressed_raw_data_is_not_implemented() -> anyhow::Result<()> {
        let data = visual_only()
            .record(RecordType::RawData as u16, RAW_SUBTYPE_PNG, raw_record(4, 4, 16))
            .build()?;
        let err = Container::parse(&data).unwrap_err();
        assert_eq!(err.code(), ResultCode::NotImplemented);
        Ok(())
    }

    #[test]
    fn raw_data_needs_camera_params() -> anyhow::Result<()> {
        let data = ContainerBuilder::new()
            .record(RecordType::RawData as u16, 2, raw_record(2, 2, 4))
            .build()?;
        assert_format_error(&data);
        Ok(())
    }

    #[test]
    fn empty_container_is_rejected() -> anyhow::Result<()> {
        assert_format_error(&ContainerBuilder::new().build()?);
        Ok(())
    }
}
