//! Assemble BMT containers.
//!
//! Writes the same record layout [`Container::parse`]
//! reads. Mostly useful to produce test data and sample
//! files; temperatures and calibration are taken in Celsius
//! and stored in Kelvin like a camera would.
//!
//! [`Container::parse`]: crate::container::Container::parse
use std::{fs, io::Write, path::Path};

use bincode::{DefaultOptions, Options};
use byteordered::{ByteOrdered, Endianness};
use ndarray::Array2;
use serde::Serialize;

use crate::{
    calibration::Calibration,
    container::{
        CameraParamsRecord, DeviceInfoRecord, DisplayParamsRecord, RecordType,
        BIG_ENDIAN_MARKER, DIR_ENTRY_LEN, FLAG_ISOTHERM_APPLIED, FLAG_LIMITS_APPLIED, HEADER_LEN,
        LITTLE_ENDIAN_MARKER, RECORD_BODY, SIGNATURE,
    },
    error::{Error, Result},
    metadata::Metadata,
    palette::Palette,
    temperature::{SensorConstants, CELSIUS_OFFSET},
};

const FORMAT_VERSION: u32 = 100;
const RECORD_VERSION: u32 = 0x64;

struct Record {
    ty: u16,
    sub_type: u16,
    data: Vec<u8>,
}

#[derive(Clone, Debug, Default)]
pub struct ContainerBuilder {
    big_endian: bool,
    raw: Option<Array2<u16>>,
    constants: Option<SensorConstants>,
    calibration: Option<Calibration>,
    metadata: Option<Metadata>,
    palette: Palette,
    visual: Option<Vec<u8>>,
    extra: Vec<(u16, u16, Vec<u8>)>,
}

fn encoding_error<E: std::fmt::Display>(e: E) -> Error {
    Error::Encoding("BMT container", e.to_string())
}

fn kelvin(celsius: f64) -> f32 {
    (celsius + CELSIUS_OFFSET) as f32
}

fn text<const N: usize>(val: &str) -> [u8; N] {
    let mut out = [0u8; N];
    let bytes = val.as_bytes();
    let len = bytes.len().min(N - 1);
    out[..len].copy_from_slice(&bytes[..len]);
    out
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn big_endian(mut self, big_endian: bool) -> Self {
        self.big_endian = big_endian;
        self
    }

    /// Raw sensor values, `height` rows by `width` columns.
    pub fn raw_data(mut self, raw: Array2<u16>) -> Self {
        self.raw = Some(raw);
        self
    }

    pub fn constants(mut self, constants: SensorConstants) -> Self {
        self.constants = Some(constants);
        self
    }

    pub fn calibration(mut self, calibration: Calibration) -> Self {
        self.calibration = Some(calibration);
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// Embedded visual image, as the bytes of an image file.
    pub fn visual_image(mut self, image: Vec<u8>) -> Self {
        self.visual = Some(image);
        self
    }

    /// Append an arbitrary record; `data` includes the record
    /// header.
    pub fn record(mut self, ty: u16, sub_type: u16, data: Vec<u8>) -> Self {
        self.extra.push((ty, sub_type, data));
        self
    }

    fn endianness(&self) -> Endianness {
        if self.big_endian {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }

    fn record_header(&self) -> Result<ByteOrdered<Vec<u8>, Endianness>> {
        let marker = if self.big_endian {
            BIG_ENDIAN_MARKER
        } else {
            LITTLE_ENDIAN_MARKER
        };
        let mut w = ByteOrdered::runtime(Vec::with_capacity(RECORD_BODY), self.endianness());
        w.write_u16(marker).map_err(encoding_error)?;
        Ok(w)
    }

    fn struct_record<T: Serialize>(&self, body: &T) -> Result<Vec<u8>> {
        let mut data = self.record_header()?.into_inner();
        data.resize(RECORD_BODY, 0);
        let opts = DefaultOptions::new().with_fixint_encoding();
        let encoded = if self.big_endian {
            opts.with_big_endian().serialize(body)
        } else {
            opts.with_little_endian().serialize(body)
        }
        .map_err(encoding_error)?;
        data.extend(encoded);
        Ok(data)
    }

    fn raw_record(&self, raw: &Array2<u16>) -> Result<Vec<u8>> {
        let (height, width) = raw.dim();
        if width > u16::MAX as usize || height > u16::MAX as usize {
            return Err(Error::invalid_argument(format!(
                "raw data of {}x{} does not fit the record",
                width, height
            )));
        }
        let mut w = self.record_header()?;
        (|| -> std::io::Result<()> {
            w.write_u16(width as u16)?;
            w.write_u16(height as u16)?;
            w.write_all(&[0u8; RECORD_BODY - 6])?;
            for val in raw.iter() {
                w.write_u16(*val)?;
            }
            Ok(())
        })()
        .map_err(encoding_error)?;
        Ok(w.into_inner())
    }

    fn camera_record(&self, calibration: &Calibration) -> CameraParamsRecord {
        let c = self.constants.unwrap_or_default();
        let range = self
            .metadata
            .as_ref()
            .map(|m| m.measurement_range)
            .unwrap_or_default();
        CameraParamsRecord {
            emissivity: calibration.emissivity() as f32,
            object_distance: c.object_distance as f32,
            reflected_apparent_temperature: kelvin(calibration.reflected_temperature()),
            atmospheric_temperature: kelvin(c.atmospheric_temperature),
            ir_window_temperature: kelvin(c.ir_window_temperature),
            ir_window_transmission: c.ir_window_transmission as f32,
            relative_humidity: (calibration.humidity() / 100.) as f32,
            planck_r1: c.planck_r1 as f32,
            planck_b: c.planck_b as f32,
            planck_f: c.planck_f as f32,
            planck_o: c.planck_o.round() as i32,
            planck_r2: c.planck_r2 as f32,
            atmospheric_transmission_alpha_1: c.atmospheric_transmission_alpha_1 as f32,
            atmospheric_transmission_alpha_2: c.atmospheric_transmission_alpha_2 as f32,
            atmospheric_transmission_beta_1: c.atmospheric_transmission_beta_1 as f32,
            atmospheric_transmission_beta_2: c.atmospheric_transmission_beta_2 as f32,
            atmospheric_transmission_x: c.atmospheric_transmission_x as f32,
            measurement_range: [kelvin(range.min as f64), kelvin(range.max as f64)],
        }
    }

    fn display_record(&self, calibration: &Calibration) -> DisplayParamsRecord {
        let limits = calibration.limits();
        let isotherm = calibration.isotherm();
        let mut flags = 0;
        if limits.applied {
            flags |= FLAG_LIMITS_APPLIED;
        }
        if isotherm.applied {
            flags |= FLAG_ISOTHERM_APPLIED;
        }
        DisplayParamsRecord {
            min_scale: kelvin(calibration.min_scale() as f64),
            max_scale: kelvin(calibration.max_scale() as f64),
            lower_limit: kelvin(limits.lower as f64),
            upper_limit: kelvin(limits.upper as f64),
            lower_isotherm: kelvin(isotherm.lower as f64),
            upper_isotherm: kelvin(isotherm.upper as f64),
            flags,
            palette: self.palette as u32,
        }
    }

    fn device_record(metadata: &Metadata) -> DeviceInfoRecord {
        let t = metadata.recorded_at;
        DeviceInfoRecord {
            device_name: text(&metadata.device_name),
            part_number: text(&metadata.part_number),
            serial_number: metadata.serial_number,
            firmware: text(&metadata.firmware),
            field_of_view: metadata.field_of_view,
            _reserved: 0,
            year: t.year,
            month: t.month,
            day: t.day,
            hour: t.hour,
            minute: t.minute,
            second: t.second,
            _pad: 0,
        }
    }

    fn records(&self) -> Result<Vec<Record>> {
        let mut records = vec![];
        let calibration = self.calibration.clone().unwrap_or_default();

        if let Some(raw) = &self.raw {
            records.push(Record {
                ty: RecordType::RawData as u16,
                sub_type: if self.big_endian { 1 } else { 2 },
                data: self.raw_record(raw)?,
            });
        }
        if self.raw.is_some() || self.constants.is_some() {
            records.push(Record {
                ty: RecordType::CameraParams as u16,
                sub_type: 1,
                data: self.struct_record(&self.camera_record(&calibration))?,
            });
            records.push(Record {
                ty: RecordType::DisplayParams as u16,
                sub_type: 1,
                data: self.struct_record(&self.display_record(&calibration))?,
            });
        }
        if let Some(metadata) = &self.metadata {
            records.push(Record {
                ty: RecordType::DeviceInfo as u16,
                sub_type: 1,
                data: self.struct_record(&Self::device_record(metadata))?,
            });
        }
        if let Some(visual) = &self.visual {
            let mut data = self.record_header()?.into_inner();
            data.resize(RECORD_BODY, 0);
            data.extend_from_slice(visual);
            records.push(Record {
                ty: RecordType::VisualImage as u16,
                sub_type: 1,
                data,
            });
        }
        for (ty, sub_type, data) in self.extra.iter() {
            records.push(Record {
                ty: *ty,
                sub_type: *sub_type,
                data: data.clone(),
            });
        }
        Ok(records)
    }

    pub fn build(&self) -> Result<Vec<u8>> {
        let records = self.records()?;
        let dir_offset = HEADER_LEN;
        let mut record_offset = dir_offset + records.len() * DIR_ENTRY_LEN;

        let mut w = ByteOrdered::runtime(Vec::new(), self.endianness());
        (|| -> std::io::Result<()> {
            w.write_all(SIGNATURE)?;
            w.write_all(&text::<16>("bmt-rs"))?;
            w.write_u32(FORMAT_VERSION)?;
            w.write_u32(dir_offset as u32)?;
            w.write_u32(records.len() as u32)?;
            w.write_u32(records.len() as u32 + 1)?;
            // swap pattern, spares, reserved, checksum
            w.write_all(&[0u8; HEADER_LEN - 0x24])?;

            for (idx, record) in records.iter().enumerate() {
                w.write_u16(record.ty)?;
                w.write_u16(record.sub_type)?;
                w.write_u32(RECORD_VERSION)?;
                w.write_u32(idx as u32 + 1)?;
                w.write_u32(record_offset as u32)?;
                w.write_u32(record.data.len() as u32)?;
                // parent, object number, checksum
                w.write_all(&[0u8; 12])?;
                record_offset += record.data.len();
            }

            for record in records.iter() {
                w.write_all(&record.data)?;
            }
            Ok(())
        })()
        .map_err(encoding_error)?;

        Ok(w.into_inner())
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let data = self.build()?;
        fs::File::create(path)
            .and_then(|mut f| f.write_all(&data))
            .map_err(|e| Error::file_io(path, e))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use ndarray::Array2;

    use super::ContainerBuilder;
    use crate::{
        calibration::Calibration,
        metadata::{MeasurementRange, Metadata, RecordingTime},
        palette::Palette,
        temperature::SensorConstants,
    };

    pub(crate) const WIDTH: usize = 8;
    pub(crate) const HEIGHT: usize = 6;

    /// Constants under which the sensor sees the object
    /// directly: no air, no window.
    pub(crate) fn vacuum() -> SensorConstants {
        SensorConstants {
            object_distance: 0.,
            ..SensorConstants::default()
        }
    }

    pub(crate) fn black_body() -> Calibration {
        let mut calibration = Calibration::default();
        calibration.set_emissivity(1.).unwrap();
        calibration.set_min_scale(15.).unwrap();
        calibration.set_max_scale(40.).unwrap();
        calibration
    }

    /// The temperature the fixture scene has at column `x`,
    /// row `y`.
    pub(crate) fn scene_temperature(x: usize, y: usize) -> f64 {
        20. + x as f64 + 2.5 * y as f64
    }

    pub(crate) fn scene() -> Array2<u16> {
        let constants = vacuum();
        Array2::from_shape_fn((HEIGHT, WIDTH), |(y, x)| {
            constants.planck_temp_to_raw(scene_temperature(x, y)).round() as u16
        })
    }

    pub(crate) fn metadata() -> Metadata {
        Metadata {
            device_name: "testo 872".into(),
            part_number: "0560 8721".into(),
            firmware: "V1.08".into(),
            serial_number: 61_234_567,
            field_of_view: 42,
            recorded_at: RecordingTime {
                year: 2023,
                month: 11,
                day: 2,
                hour: 14,
                minute: 30,
                second: 5,
            },
            measurement_range: MeasurementRange {
                min: -30.,
                max: 650.,
            },
        }
    }

    /// A 2x2 24-bit bitmap with a few bytes of record padding
    /// behind it.
    pub(crate) fn tiny_bitmap() -> Vec<u8> {
        let mut bmp = b"BM".to_vec();
        bmp.extend_from_slice(&70u32.to_le_bytes());
        bmp.extend_from_slice(&[0; 4]);
        bmp.extend_from_slice(&54u32.to_le_bytes());
        bmp.extend_from_slice(&40u32.to_le_bytes());
        bmp.extend_from_slice(&2i32.to_le_bytes());
        bmp.extend_from_slice(&2i32.to_le_bytes());
        bmp.extend_from_slice(&1u16.to_le_bytes());
        bmp.extend_from_slice(&24u16.to_le_bytes());
        bmp.extend_from_slice(&[0; 24]);
        for _ in 0..2 {
            bmp.extend_from_slice(&[0xff, 0x00, 0x00, 0x00, 0xff, 0x00, 0, 0]);
        }
        bmp.extend_from_slice(&[0xaa; 6]);
        bmp
    }

    pub(crate) fn thermal_builder() -> ContainerBuilder {
        ContainerBuilder::new()
            .raw_data(scene())
            .constants(vacuum())
            .calibration(black_body())
            .metadata(metadata())
            .palette(Palette::RainBow)
    }

    pub(crate) fn thermal_only() -> Vec<u8> {
        thermal_builder().build().unwrap()
    }

    pub(crate) fn with_visual() -> Vec<u8> {
        thermal_builder()
            .visual_image(tiny_bitmap())
            .build()
            .unwrap()
    }
}
