//! Id-based access to opened images.
//!
//! A [`Registry`] hands out an [`ImageId`] per opened file
//! and routes every call through it, the way the IrApi call
//! surface does. The id map sits behind a read-write lock
//! and each image behind its own mutex, so calls on one id
//! are serialized while different ids proceed in parallel.
//! Closing an id drops the image; any later call with it
//! fails with [`Error::InvalidId`].
use std::{
    collections::HashMap,
    fmt,
    fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicI32, Ordering},
        Arc,
    },
};

use parking_lot::{Mutex, RwLock};
use serde_derive::*;
use tracing::{debug, instrument, warn};

use crate::{
    config::Config,
    error::{Error, Result},
    image::BmtImage,
    metadata::{MeasurementRange, RecordingTime},
    palette::Palette,
    temperature::TemperatureUnit,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImageId(pub i32);

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Copy `text` into `buf` as UTF-16 followed by a NUL.
/// Returns the number of units written, without the NUL. A
/// buffer that is too small is left untouched.
pub fn copy_wide(text: &str, buf: &mut [u16]) -> Result<usize> {
    let wide: Vec<u16> = text.encode_utf16().collect();
    let required = wide.len() + 1;
    if buf.len() < required {
        return Err(Error::BufferTooSmall {
            required,
            available: buf.len(),
        });
    }
    buf[..wide.len()].copy_from_slice(&wide);
    buf[wide.len()] = 0;
    Ok(wide.len())
}

type Shared = Arc<Mutex<BmtImage>>;

pub struct Registry {
    config: Config,
    next_id: AtomicI32,
    images: RwLock<HashMap<ImageId, Shared>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_config(Config::default())
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Registry {
            config,
            next_id: AtomicI32::new(1),
            images: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of open images.
    pub fn len(&self) -> usize {
        self.images.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<ImageId> {
        let image = BmtImage::open_with(path, &self.config)?;
        let id = self.allocate_id()?;
        self.images.write().insert(id, Arc::new(Mutex::new(image)));
        debug!(%id, "registered image");
        Ok(id)
    }

    /// Next unused id. Ids only grow, so running past
    /// `i32::MAX` is an error rather than a wrap.
    fn allocate_id(&self) -> Result<ImageId> {
        self.next_id
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |id| id.checked_add(1))
            .map(ImageId)
            .map_err(|_| Error::format("image ids exhausted"))
    }

    pub fn close(&self, id: ImageId) -> Result<()> {
        match self.images.write().remove(&id) {
            Some(_) => {
                debug!(%id, "closed image");
                Ok(())
            }
            None => Err(Error::InvalidId(id)),
        }
    }

    fn get(&self, id: ImageId) -> Result<Shared> {
        self.images
            .read()
            .get(&id)
            .cloned()
            .ok_or(Error::InvalidId(id))
    }

    /// Run `f` on the image behind `id`, holding its lock.
    pub fn with_image<T, F>(&self, id: ImageId, f: F) -> Result<T>
    where
        F: FnOnce(&mut BmtImage) -> Result<T>,
    {
        let image = self.get(id)?;
        let mut guard = image.lock();
        f(&mut guard)
    }

    pub fn width(&self, id: ImageId) -> Result<usize> {
        self.with_image(id, |img| Ok(img.raw_data()?.ncols()))
    }

    pub fn height(&self, id: ImageId) -> Result<usize> {
        self.with_image(id, |img| Ok(img.raw_data()?.nrows()))
    }

    pub fn emissivity(&self, id: ImageId) -> Result<f64> {
        self.with_image(id, |img| Ok(img.calibration().emissivity()))
    }

    pub fn set_emissivity(&self, id: ImageId, val: f64) -> Result<()> {
        self.with_image(id, |img| img.calibration_mut().set_emissivity(val))
    }

    pub fn reflected_temperature(&self, id: ImageId) -> Result<f64> {
        self.with_image(id, |img| Ok(img.calibration().reflected_temperature()))
    }

    pub fn set_reflected_temperature(&self, id: ImageId, celsius: f64) -> Result<()> {
        self.with_image(id, |img| {
            img.calibration_mut().set_reflected_temperature(celsius)
        })
    }

    pub fn humidity(&self, id: ImageId) -> Result<f64> {
        self.with_image(id, |img| Ok(img.calibration().humidity()))
    }

    pub fn set_humidity(&self, id: ImageId, percentage: f64) -> Result<()> {
        self.with_image(id, |img| img.calibration_mut().set_humidity(percentage))
    }

    pub fn device_name(&self, id: ImageId) -> Result<String> {
        self.with_image(id, |img| Ok(img.metadata().device_name.clone()))
    }

    pub fn device_name_into(&self, id: ImageId, buf: &mut [u16]) -> Result<usize> {
        let name = self.device_name(id)?;
        copy_wide(&name, buf)
    }

    pub fn serial_number(&self, id: ImageId) -> Result<u32> {
        self.with_image(id, |img| Ok(img.metadata().serial_number))
    }

    pub fn date_time(&self, id: ImageId) -> Result<RecordingTime> {
        self.with_image(id, |img| Ok(img.metadata().recorded_at))
    }

    pub fn field_of_view(&self, id: ImageId) -> Result<u16> {
        self.with_image(id, |img| Ok(img.metadata().field_of_view))
    }

    pub fn measurement_range(&self, id: ImageId) -> Result<MeasurementRange> {
        self.with_image(id, |img| Ok(img.metadata().measurement_range))
    }

    pub fn min_scale(&self, id: ImageId) -> Result<f32> {
        self.with_image(id, |img| Ok(img.calibration().min_scale()))
    }

    pub fn set_min_scale(&self, id: ImageId, celsius: f32) -> Result<()> {
        self.with_image(id, |img| img.calibration_mut().set_min_scale(celsius))
    }

    pub fn max_scale(&self, id: ImageId) -> Result<f32> {
        self.with_image(id, |img| Ok(img.calibration().max_scale()))
    }

    pub fn set_max_scale(&self, id: ImageId, celsius: f32) -> Result<()> {
        self.with_image(id, |img| img.calibration_mut().set_max_scale(celsius))
    }

    pub fn lower_limit(&self, id: ImageId) -> Result<f32> {
        self.with_image(id, |img| Ok(img.calibration().limits().lower))
    }

    pub fn set_lower_limit(&self, id: ImageId, celsius: f32) -> Result<()> {
        self.with_image(id, |img| img.calibration_mut().set_lower_limit(celsius))
    }

    pub fn upper_limit(&self, id: ImageId) -> Result<f32> {
        self.with_image(id, |img| Ok(img.calibration().limits().upper))
    }

    pub fn set_upper_limit(&self, id: ImageId, celsius: f32) -> Result<()> {
        self.with_image(id, |img| img.calibration_mut().set_upper_limit(celsius))
    }

    pub fn lower_isotherm(&self, id: ImageId) -> Result<f32> {
        self.with_image(id, |img| Ok(img.calibration().isotherm().lower))
    }

    pub fn set_lower_isotherm(&self, id: ImageId, celsius: f32) -> Result<()> {
        self.with_image(id, |img| img.calibration_mut().set_lower_isotherm(celsius))
    }

    pub fn upper_isotherm(&self, id: ImageId) -> Result<f32> {
        self.with_image(id, |img| Ok(img.calibration().isotherm().upper))
    }

    pub fn set_upper_isotherm(&self, id: ImageId, celsius: f32) -> Result<()> {
        self.with_image(id, |img| img.calibration_mut().set_upper_isotherm(celsius))
    }

    pub fn limits_applied(&self, id: ImageId) -> Result<bool> {
        self.with_image(id, |img| Ok(img.calibration().limits().applied))
    }

    pub fn apply_limits(&self, id: ImageId, applied: bool) -> Result<()> {
        self.with_image(id, |img| {
            img.calibration_mut().apply_limits(applied);
            Ok(())
        })
    }

    pub fn isotherm_applied(&self, id: ImageId) -> Result<bool> {
        self.with_image(id, |img| Ok(img.calibration().isotherm().applied))
    }

    pub fn apply_isotherm(&self, id: ImageId, applied: bool) -> Result<()> {
        self.with_image(id, |img| {
            img.calibration_mut().apply_isotherm(applied);
            Ok(())
        })
    }

    /// Temperature at column `x`, row `y`.
    pub fn temperature_at(
        &self,
        id: ImageId,
        x: usize,
        y: usize,
        unit: TemperatureUnit,
    ) -> Result<f64> {
        self.with_image(id, |img| img.temperature_at(x, y, unit))
    }

    pub fn palette(&self, id: ImageId) -> Result<Palette> {
        self.with_image(id, |img| Ok(img.palette()))
    }

    pub fn set_palette(&self, id: ImageId, palette: Palette) -> Result<()> {
        self.with_image(id, |img| {
            img.set_palette(palette);
            Ok(())
        })
    }

    /// Base path for exports of `img`: the source file's stem
    /// inside the configured output directory.
    fn export_base(&self, id: ImageId, img: &BmtImage, suffix: &str) -> PathBuf {
        let stem = img
            .path()
            .and_then(Path::file_stem)
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("image{}", id.0));
        self.config.output_dir.join(format!("{}_{}", stem, suffix))
    }

    /// Write the embedded visual image to the output
    /// directory; returns the path written.
    pub fn visual_image(&self, id: ImageId) -> Result<PathBuf> {
        self.with_image(id, |img| {
            img.export_visual(self.export_base(id, img, "visual"))
        })
    }

    pub fn thermal_image(&self, id: ImageId, unit: TemperatureUnit) -> Result<PathBuf> {
        self.with_image(id, |img| {
            let base = self.export_base(id, img, &format!("thermal_{}", unit));
            img.export_thermal(base, unit)
        })
    }

    pub fn thermal_image_with_palette(
        &self,
        id: ImageId,
        unit: TemperatureUnit,
    ) -> Result<PathBuf> {
        self.with_image(id, |img| {
            let base = self.export_base(id, img, &format!("thermal_{}", img.palette()));
            img.export_thermal_with_palette(base, unit)
        })
    }

    pub fn visual_image_into(&self, id: ImageId, buf: &mut [u16]) -> Result<usize> {
        path_into(self.visual_image(id)?, buf)
    }

    pub fn thermal_image_into(
        &self,
        id: ImageId,
        unit: TemperatureUnit,
        buf: &mut [u16],
    ) -> Result<usize> {
        path_into(self.thermal_image(id, unit)?, buf)
    }

    pub fn thermal_image_with_palette_into(
        &self,
        id: ImageId,
        unit: TemperatureUnit,
        buf: &mut [u16],
    ) -> Result<usize> {
        path_into(self.thermal_image_with_palette(id, unit)?, buf)
    }
}

/// Report a freshly written file through `buf`. The file is
/// removed again when its path does not fit.
fn path_into(path: PathBuf, buf: &mut [u16]) -> Result<usize> {
    copy_wide(&path.to_string_lossy(), buf).map_err(|e| {
        if let Err(rm) = fs::remove_file(&path) {
            warn!(path = %path.display(), "could not remove export: {}", rm);
        }
        e
    })
}

#[cfg(test)]
mod tests {
    use std::thread;

    use float_cmp::approx_eq;

    use super::*;
    use crate::{builder::fixtures, error::ResultCode, export};

    struct Scratch {
        dir: tempfile::TempDir,
        registry: Registry,
    }

    fn scratch() -> Scratch {
        let dir = tempfile::tempdir().unwrap();
        fixtures::thermal_builder()
            .visual_image(fixtures::tiny_bitmap())
            .write(dir.path().join("scene.bmt"))
            .unwrap();
        let registry = Registry::with_config(Config {
            output_dir: dir.path().join("out"),
            ..Config::default()
        });
        Scratch { dir, registry }
    }

    impl Scratch {
        fn open(&self) -> ImageId {
            self.registry.open(self.dir.path().join("scene.bmt")).unwrap()
        }
    }

    #[test]
    fn wide_copy_checks_capacity() {
        let mut buf = [0xffffu16; 4];
        assert_eq!(copy_wide("abc", &mut buf).unwrap(), 3);
        assert_eq!(buf, [b'a' as u16, b'b' as u16, b'c' as u16, 0]);

        let mut small = [7u16; 3];
        match copy_wide("abc", &mut small) {
            Err(Error::BufferTooSmall {
                required,
                available,
            }) => assert_eq!((required, available), (4, 3)),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(small, [7; 3]);

        let mut one = [9u16; 1];
        assert_eq!(copy_wide("", &mut one).unwrap(), 0);
        assert_eq!(one, [0]);
    }

    #[test]
    fn ids_are_unique_and_close_once() {
        let s = scratch();
        let a = s.open();
        let b = s.open();
        assert_ne!(a, b);
        assert_eq!(s.registry.len(), 2);

        s.registry.close(a).unwrap();
        assert_eq!(s.registry.close(a).unwrap_err().code(), ResultCode::InvalidId);
        assert_eq!(s.registry.width(b).unwrap(), fixtures::WIDTH);
        s.registry.close(b).unwrap();
        assert!(s.registry.is_empty());
    }

    #[test]
    fn open_failures_register_nothing() {
        let s = scratch();
        let err = s.registry.open(s.dir.path().join("missing.bmt")).unwrap_err();
        assert_eq!(err.code(), ResultCode::FileIoError);
        assert!(s.registry.is_empty());
    }

    #[test]
    fn every_call_fails_after_close() {
        let s = scratch();
        let id = s.open();
        s.registry.close(id).unwrap();

        let r = &s.registry;
        let c = TemperatureUnit::Celsius;
        let mut buf = [0u16; 512];
        let codes = vec![
            ResultCode::of(&r.width(id)),
            ResultCode::of(&r.height(id)),
            ResultCode::of(&r.emissivity(id)),
            ResultCode::of(&r.set_emissivity(id, 0.9)),
            ResultCode::of(&r.reflected_temperature(id)),
            ResultCode::of(&r.set_reflected_temperature(id, 21.)),
            ResultCode::of(&r.humidity(id)),
            ResultCode::of(&r.set_humidity(id, 40.)),
            ResultCode::of(&r.device_name(id)),
            ResultCode::of(&r.device_name_into(id, &mut buf)),
            ResultCode::of(&r.serial_number(id)),
            ResultCode::of(&r.date_time(id)),
            ResultCode::of(&r.field_of_view(id)),
            ResultCode::of(&r.measurement_range(id)),
            ResultCode::of(&r.min_scale(id)),
            ResultCode::of(&r.set_min_scale(id, 0.)),
            ResultCode::of(&r.max_scale(id)),
            ResultCode::of(&r.set_max_scale(id, 50.)),
            ResultCode::of(&r.lower_limit(id)),
            ResultCode::of(&r.set_lower_limit(id, 0.)),
            ResultCode::of(&r.upper_limit(id)),
            ResultCode::of(&r.set_upper_limit(id, 50.)),
            ResultCode::of(&r.lower_isotherm(id)),
            ResultCode::of(&r.set_lower_isotherm(id, 0.)),
            ResultCode::of(&r.upper_isotherm(id)),
            ResultCode::of(&r.set_upper_isotherm(id, 50.)),
            ResultCode::of(&r.limits_applied(id)),
            ResultCode::of(&r.apply_limits(id, true)),
            ResultCode::of(&r.isotherm_applied(id)),
            ResultCode::of(&r.apply_isotherm(id, true)),
            ResultCode::of(&r.temperature_at(id, 0, 0, c)),
            ResultCode::of(&r.palette(id)),
            ResultCode::of(&r.set_palette(id, Palette::Sepia)),
            ResultCode::of(&r.visual_image(id)),
            ResultCode::of(&r.visual_image_into(id, &mut buf)),
            ResultCode::of(&r.thermal_image(id, c)),
            ResultCode::of(&r.thermal_image_into(id, c, &mut buf)),
            ResultCode::of(&r.thermal_image_with_palette(id, c)),
            ResultCode::of(&r.thermal_image_with_palette_into(id, c, &mut buf)),
        ];
        for (idx, code) in codes.iter().enumerate() {
            assert_eq!(*code, ResultCode::InvalidId, "call {}", idx);
        }
        assert!(buf.iter().all(|u| *u == 0));
    }

    #[test]
    fn setters_round_trip_and_reject_bad_values() {
        let s = scratch();
        let r = &s.registry;
        let id = s.open();

        r.set_emissivity(id, 0.85).unwrap();
        assert_eq!(
            r.set_emissivity(id, 1.5).unwrap_err().code(),
            ResultCode::InvalidArgument
        );
        assert!(approx_eq!(f64, r.emissivity(id).unwrap(), 0.85));

        r.set_reflected_temperature(id, -10.5).unwrap();
        assert!(approx_eq!(f64, r.reflected_temperature(id).unwrap(), -10.5));
        r.set_humidity(id, 72.).unwrap();
        assert!(approx_eq!(f64, r.humidity(id).unwrap(), 72.));

        r.set_min_scale(id, -5.).unwrap();
        r.set_max_scale(id, 55.5).unwrap();
        r.set_lower_limit(id, 1.).unwrap();
        r.set_upper_limit(id, 2.).unwrap();
        r.set_lower_isotherm(id, 3.).unwrap();
        r.set_upper_isotherm(id, 4.).unwrap();
        assert!(approx_eq!(f32, r.min_scale(id).unwrap(), -5.));
        assert!(approx_eq!(f32, r.max_scale(id).unwrap(), 55.5));
        assert!(approx_eq!(f32, r.lower_limit(id).unwrap(), 1.));
        assert!(approx_eq!(f32, r.upper_limit(id).unwrap(), 2.));
        assert!(approx_eq!(f32, r.lower_isotherm(id).unwrap(), 3.));
        assert!(approx_eq!(f32, r.upper_isotherm(id).unwrap(), 4.));

        r.apply_limits(id, true).unwrap();
        r.apply_isotherm(id, true).unwrap();
        assert!(r.limits_applied(id).unwrap());
        assert!(r.isotherm_applied(id).unwrap());

        r.set_palette(id, Palette::DewPoint).unwrap();
        assert_eq!(r.palette(id).unwrap(), Palette::DewPoint);
    }

    #[test]
    fn metadata_getters() {
        let s = scratch();
        let r = &s.registry;
        let id = s.open();
        let expected = fixtures::metadata();

        assert_eq!(r.device_name(id).unwrap(), expected.device_name);
        assert_eq!(r.serial_number(id).unwrap(), expected.serial_number);
        assert_eq!(r.date_time(id).unwrap(), expected.recorded_at);
        assert_eq!(r.field_of_view(id).unwrap(), expected.field_of_view);
        assert_eq!(r.height(id).unwrap(), fixtures::HEIGHT);

        let mut buf = [0u16; 10];
        let written = r.device_name_into(id, &mut buf).unwrap();
        assert_eq!(String::from_utf16(&buf[..written]).unwrap(), "testo 872");
        assert_eq!(buf[written], 0);

        let mut small = [1u16; 9];
        let err = r.device_name_into(id, &mut small).unwrap_err();
        assert_eq!(err.code(), ResultCode::StringAllocationFailed);
        assert_eq!(small, [1; 9]);
    }

    #[test]
    fn exports_go_to_output_dir() -> anyhow::Result<()> {
        let s = scratch();
        let r = &s.registry;
        let id = s.open();
        let out = s.dir.path().join("out");

        assert_eq!(r.visual_image(id)?, out.join("scene_visual.bmp"));
        assert_eq!(
            r.thermal_image(id, TemperatureUnit::Fahrenheit)?,
            out.join("scene_thermal_F.tif")
        );
        assert_eq!(
            r.thermal_image_with_palette(id, TemperatureUnit::Celsius)?,
            out.join("scene_thermal_rainbow.png")
        );

        let mut buf = vec![0u16; 1024];
        let len = r.thermal_image_into(id, TemperatureUnit::Celsius, &mut buf)?;
        let written = PathBuf::from(String::from_utf16(&buf[..len])?);
        assert_eq!(written, out.join("scene_thermal_C.tif"));
        assert!(written.is_file());

        let mut tiny = [0u16; 4];
        let err = r.visual_image_into(id, &mut tiny).unwrap_err();
        assert_eq!(err.code(), ResultCode::StringAllocationFailed);
        assert_eq!(tiny, [0; 4]);
        assert!(!out.join("scene_visual_1.bmp").exists());
        Ok(())
    }

    #[test]
    fn ids_never_wrap() {
        let s = scratch();
        s.registry.next_id.store(i32::MAX - 1, Ordering::Relaxed);
        let last = s.open();
        assert_eq!(last, ImageId(i32::MAX - 1));

        let path = s.dir.path().join("scene.bmt");
        let err = s.registry.open(&path).unwrap_err();
        assert_eq!(err.code(), ResultCode::GenericError);
        assert_eq!(s.registry.open(&path).unwrap_err().code(), ResultCode::GenericError);
        assert_eq!(s.registry.len(), 1);
    }

    #[test]
    fn fahrenheit_tiff_holds_fahrenheit_fixed_point() -> anyhow::Result<()> {
        use image::ImageDecoder;

        let s = scratch();
        let r = &s.registry;
        let id = s.open();

        let path = r.thermal_image(id, TemperatureUnit::Fahrenheit)?;
        let file = std::io::BufReader::new(fs::File::open(&path)?);
        let decoder = image::tiff::TiffDecoder::new(file)?;
        let mut bytes = vec![0u8; decoder.total_bytes() as usize];
        decoder.read_image(&mut bytes)?;
        let values: Vec<u16> = bytes
            .chunks(2)
            .map(|c| u16::from_ne_bytes([c[0], c[1]]))
            .collect();

        let temps = r.with_image(id, |img| img.temperature_matrix(TemperatureUnit::Celsius))?;
        let expected: Vec<u16> = temps
            .iter()
            .map(|t| export::to_fixed_point(TemperatureUnit::Fahrenheit.from_celsius(*t)))
            .collect();
        assert_eq!(values, expected);

        // 20 °C in the scene's corner is 68 °F
        assert!(approx_eq!(
            f64,
            export::from_fixed_point(values[0]),
            68.,
            epsilon = 0.1
        ));
        Ok(())
    }

    #[test]
    fn parallel_exports_never_share_a_file() -> anyhow::Result<()> {
        let s = scratch();
        let registry = Arc::new(s.registry);
        let path = s.dir.path().join("scene.bmt");
        let ids = (0..8)
            .map(|_| registry.open(&path))
            .collect::<Result<Vec<_>>>()?;
        let barrier = Arc::new(std::sync::Barrier::new(ids.len()));

        let workers: Vec<_> = ids
            .iter()
            .map(|&id| {
                let registry = registry.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    registry.thermal_image(id, TemperatureUnit::Celsius)
                })
            })
            .collect();
        let mut written = workers
            .into_iter()
            .map(|w| w.join().unwrap())
            .collect::<Result<Vec<_>>>()?;

        written.sort();
        written.dedup();
        assert_eq!(written.len(), ids.len());
        for path in written.iter() {
            assert!(fs::metadata(path)?.len() > 0, "{} is empty", path.display());
        }
        Ok(())
    }

    #[test]
    fn handles_are_shared_across_threads() {
        let s = scratch();
        let registry = Arc::new(s.registry);
        let path = s.dir.path().join("scene.bmt");

        let workers: Vec<_> = (0..4)
            .map(|n| {
                let registry = registry.clone();
                let path = path.clone();
                thread::spawn(move || {
                    let id = registry.open(&path).unwrap();
                    let emissivity = 0.5 + n as f64 / 10.;
                    registry.set_emissivity(id, emissivity).unwrap();
                    registry.temperature_at(id, 1, 1, TemperatureUnit::Celsius).unwrap();
                    assert!(approx_eq!(f64, registry.emissivity(id).unwrap(), emissivity));
                    registry.close(id).unwrap();
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        assert!(registry.is_empty());
    }
}
