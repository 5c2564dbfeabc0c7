//! Radiometric and display parameters of one image.
//!
//! Setters validate before they assign, so a rejected value
//! leaves the previous one in place.
use serde_derive::*;

use crate::{
    error::{Error, Result},
    temperature::CELSIUS_OFFSET,
};

/// A temperature interval with a switch telling renderers
/// whether to honour it. Used for alarm limits and for the
/// isotherm band.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub lower: f32,
    pub upper: f32,
    pub applied: bool,
}

impl Band {
    pub fn new(lower: f32, upper: f32) -> Self {
        Band {
            lower,
            upper,
            applied: false,
        }
    }

    /// Whether `celsius` lies inside the band. An inverted band
    /// is read with its bounds swapped.
    pub fn contains(&self, celsius: f64) -> bool {
        let (lo, hi) = ordered(self.lower, self.upper);
        celsius >= lo && celsius <= hi
    }
}

pub(crate) fn ordered(a: f32, b: f32) -> (f64, f64) {
    let (a, b) = (a as f64, b as f64);
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    emissivity: f64,
    reflected_temperature: f64,
    humidity: f64,

    min_scale: f32,
    max_scale: f32,

    limits: Band,
    isotherm: Band,
}

impl Default for Calibration {
    fn default() -> Self {
        Calibration {
            emissivity: 0.95,
            reflected_temperature: 20.,
            humidity: 50.,
            min_scale: 0.,
            max_scale: 100.,
            limits: Band::new(0., 100.),
            isotherm: Band::new(0., 100.),
        }
    }
}

fn ensure_finite(name: &str, val: f64) -> Result<()> {
    if !val.is_finite() {
        return Err(Error::invalid_argument(format!(
            "{} must be finite, got {}",
            name, val
        )));
    }
    Ok(())
}

fn ensure_temperature(name: &str, celsius: f64) -> Result<()> {
    ensure_finite(name, celsius)?;
    if celsius <= -CELSIUS_OFFSET {
        return Err(Error::invalid_argument(format!(
            "{} must lie above absolute zero, got {}",
            name, celsius
        )));
    }
    Ok(())
}

impl Calibration {
    pub fn emissivity(&self) -> f64 {
        self.emissivity
    }

    /// Emissivity must lie in `(0, 1]`.
    pub fn set_emissivity(&mut self, val: f64) -> Result<()> {
        ensure_finite("emissivity", val)?;
        if val <= 0. || val > 1. {
            return Err(Error::invalid_argument(format!(
                "emissivity must lie in (0, 1], got {}",
                val
            )));
        }
        self.emissivity = val;
        Ok(())
    }

    /// Reflected apparent temperature in Celsius.
    pub fn reflected_temperature(&self) -> f64 {
        self.reflected_temperature
    }

    pub fn set_reflected_temperature(&mut self, celsius: f64) -> Result<()> {
        ensure_temperature("reflected temperature", celsius)?;
        self.reflected_temperature = celsius;
        Ok(())
    }

    /// Relative humidity in percent.
    pub fn humidity(&self) -> f64 {
        self.humidity
    }

    pub fn set_humidity(&mut self, percentage: f64) -> Result<()> {
        ensure_finite("humidity", percentage)?;
        if !(0. ..=100.).contains(&percentage) {
            return Err(Error::invalid_argument(format!(
                "humidity must lie in [0, 100], got {}",
                percentage
            )));
        }
        self.humidity = percentage;
        Ok(())
    }

    pub fn min_scale(&self) -> f32 {
        self.min_scale
    }

    pub fn set_min_scale(&mut self, celsius: f32) -> Result<()> {
        ensure_temperature("min scale", celsius as f64)?;
        self.min_scale = celsius;
        Ok(())
    }

    pub fn max_scale(&self) -> f32 {
        self.max_scale
    }

    pub fn set_max_scale(&mut self, celsius: f32) -> Result<()> {
        ensure_temperature("max scale", celsius as f64)?;
        self.max_scale = celsius;
        Ok(())
    }

    pub fn limits(&self) -> &Band {
        &self.limits
    }

    pub fn set_lower_limit(&mut self, celsius: f32) -> Result<()> {
        ensure_temperature("lower limit", celsius as f64)?;
        self.limits.lower = celsius;
        Ok(())
    }

    pub fn set_upper_limit(&mut self, celsius: f32) -> Result<()> {
        ensure_temperature("upper limit", celsius as f64)?;
        self.limits.upper = celsius;
        Ok(())
    }

    pub fn apply_limits(&mut self, applied: bool) {
        self.limits.applied = applied;
    }

    pub fn isotherm(&self) -> &Band {
        &self.isotherm
    }

    pub fn set_lower_isotherm(&mut self, celsius: f32) -> Result<()> {
        ensure_temperature("lower isotherm", celsius as f64)?;
        self.isotherm.lower = celsius;
        Ok(())
    }

    pub fn set_upper_isotherm(&mut self, celsius: f32) -> Result<()> {
        ensure_temperature("upper isotherm", celsius as f64)?;
        self.isotherm.upper = celsius;
        Ok(())
    }

    pub fn apply_isotherm(&mut self, applied: bool) {
        self.isotherm.applied = applied;
    }

    /// Build a calibration from values read out of a file,
    /// falling back to defaults for anything out of range.
    pub(crate) fn from_recorded(
        emissivity: f64,
        reflected_temperature: f64,
        humidity: f64,
    ) -> Self {
        let mut calibration = Calibration::default();
        let applied = [
            calibration.set_emissivity(emissivity),
            calibration.set_reflected_temperature(reflected_temperature),
            calibration.set_humidity(humidity),
        ];
        for res in applied.iter() {
            if let Err(e) = res {
                tracing::warn!("ignoring recorded value: {}", e);
            }
        }
        calibration
    }

    pub(crate) fn with_display(mut self, display: DisplaySettings) -> Self {
        self.min_scale = display.min_scale;
        self.max_scale = display.max_scale;
        self.limits = display.limits;
        self.isotherm = display.isotherm;
        self
    }
}

/// Scale and highlight settings as stored in the display
/// parameter record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct DisplaySettings {
    pub(crate) min_scale: f32,
    pub(crate) max_scale: f32,
    pub(crate) limits: Band,
    pub(crate) isotherm: Band,
}
