//! Functions to compute temperature from raw sensor values.
//!
//! The model follows the [Thermimage R library]: the
//! radiance measured by the sensor is corrected for the
//! object's emissivity, the reflected apparent temperature,
//! the transmission through the atmosphere (a function of
//! humidity, air temperature and distance) and an optional
//! IR window, then inverted through the camera's Planck
//! curve.
//!
//! [Thermimage R library]: //github.com/gtatters/Thermimage/blob/master/R/raw2temp.R
use std::{fmt, str::FromStr};

use serde_derive::*;

use crate::calibration::Calibration;

pub const CELSIUS_OFFSET: f64 = 273.15;

#[derive(Clone, Copy, Debug, Deserialize, Hash, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(i32)]
pub enum TemperatureUnit {
    Celsius = 0,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Express a Celsius value in this unit.
    pub fn from_celsius(self, celsius: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius * 1.8 + 32.,
        }
    }

    /// Express a value in this unit in Celsius.
    pub fn to_celsius(self, value: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => value,
            TemperatureUnit::Fahrenheit => (value - 32.) / 1.8,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }
}

impl Default for TemperatureUnit {
    fn default() -> Self {
        TemperatureUnit::Celsius
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(match self {
            TemperatureUnit::Celsius => "C",
            TemperatureUnit::Fahrenheit => "F",
        })
    }
}

impl FromStr for TemperatureUnit {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match &s.to_ascii_lowercase() as &str {
            "celsius" | "c" => Ok(TemperatureUnit::Celsius),
            "fahrenheit" | "f" => Ok(TemperatureUnit::Fahrenheit),
            _ => Err("unknown temperature unit"),
        }
    }
}

/// Per-camera constants needed to turn raw sensor values
/// into radiance and back. Read from the camera parameter
/// record; temperatures are in Celsius.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SensorConstants {
    pub planck_r1: f64,
    pub planck_b: f64,
    pub planck_f: f64,
    pub planck_o: f64,
    pub planck_r2: f64,

    pub atmospheric_temperature: f64,
    #[serde(rename = "AtmosphericTransAlpha1")]
    pub atmospheric_transmission_alpha_1: f64,
    #[serde(rename = "AtmosphericTransAlpha2")]
    pub atmospheric_transmission_alpha_2: f64,
    #[serde(rename = "AtmosphericTransBeta1")]
    pub atmospheric_transmission_beta_1: f64,
    #[serde(rename = "AtmosphericTransBeta2")]
    pub atmospheric_transmission_beta_2: f64,
    #[serde(rename = "AtmosphericTransX")]
    pub atmospheric_transmission_x: f64,

    #[serde(rename = "IRWindowTemperature")]
    pub ir_window_temperature: f64,
    #[serde(rename = "IRWindowTransmission")]
    pub ir_window_transmission: f64,

    pub object_distance: f64,
}

impl Default for SensorConstants {
    fn default() -> Self {
        SensorConstants {
            planck_r1: 21106.77,
            planck_b: 1501.,
            planck_f: 1.,
            planck_o: -7340.,
            planck_r2: 0.012545258,

            atmospheric_temperature: 20.,
            atmospheric_transmission_alpha_1: 0.006569,
            atmospheric_transmission_alpha_2: 0.01262,
            atmospheric_transmission_beta_1: -0.002276,
            atmospheric_transmission_beta_2: -0.00667,
            atmospheric_transmission_x: 1.9,

            ir_window_temperature: 20.,
            ir_window_transmission: 1.,

            object_distance: 1.,
        }
    }
}

impl SensorConstants {
    /// Raw value a black body at `temp` Celsius produces on
    /// this sensor, without any attenuation.
    // raw = PR1/(PR2*(exp(PB/(temp+273.15))-PF))-PO
    pub fn planck_temp_to_raw(&self, temp: f64) -> f64 {
        self.planck_r1
            / (self.planck_r2 * ((self.planck_b / (temp + CELSIUS_OFFSET)).exp() - self.planck_f))
            - self.planck_o
    }

    // inverse of above
    fn planck_raw_to_temp(&self, raw: f64) -> f64 {
        self.planck_b
            / (self.planck_r1 / (self.planck_r2 * (raw + self.planck_o)) + self.planck_f).ln()
            - CELSIUS_OFFSET
    }

    fn atmospheric_affine1(&self, val: f64) -> f64 {
        self.atmospheric_transmission_alpha_1 + self.atmospheric_transmission_beta_1 * val
    }

    fn atmospheric_affine2(&self, val: f64) -> f64 {
        self.atmospheric_transmission_alpha_2 + self.atmospheric_transmission_beta_2 * val
    }

    fn atmospheric_interpolate(&self, val1: f64, val2: f64) -> f64 {
        self.atmospheric_transmission_x * val1 + (1. - self.atmospheric_transmission_x) * val2
    }

    /// Transmission of the air between object and camera.
    ///
    /// Water vapour pressure follows from relative humidity
    /// and air temperature; the window sits half way, so each
    /// leg covers `distance / 2` (Minkina and Dudzik).
    pub fn atmospheric_transmission(&self, humidity_percentage: f64) -> f64 {
        const ATMOSPHERIC_SERIES: [f64; 4] = [1.5587, 0.06939, -0.00027816, 0.00000068455];
        let h2o = (humidity_percentage / 100.)
            * power_series_at(&ATMOSPHERIC_SERIES, self.atmospheric_temperature).exp();
        let h2o_sqrt = h2o.sqrt();

        let dist_factor = (self.object_distance / 2.).sqrt();
        self.atmospheric_interpolate(
            (-dist_factor * self.atmospheric_affine1(h2o_sqrt)).exp(),
            (-dist_factor * self.atmospheric_affine2(h2o_sqrt)).exp(),
        )
    }

    /// Affine map from the raw value read by the sensor to the
    /// raw value the object alone would have produced.
    pub fn raw_transform(&self, calibration: &Calibration) -> impl Fn(f64) -> f64 {
        let emissivity = calibration.emissivity();
        let window = self.ir_window_transmission;
        let emiss_wind = 1. - window;
        // anti-reflective coating on the window
        let refl_wind = 0.;

        let tau = self.atmospheric_transmission(calibration.humidity());

        // radiance reflecting off the object before the window
        let refl1 = self.planck_temp_to_raw(calibration.reflected_temperature());
        let refl1_attn = (1. - emissivity) / emissivity * refl1;

        // radiance from the atmosphere before the window
        let atm1 = self.planck_temp_to_raw(self.atmospheric_temperature);
        let atm1_attn = (1. - tau) / tau / emissivity * atm1;

        let wind = self.planck_temp_to_raw(self.ir_window_temperature);
        let wind_attn = emiss_wind / emissivity / tau / window * wind;

        let refl2 = self.planck_temp_to_raw(calibration.reflected_temperature());
        let refl2_attn = refl_wind / emissivity / tau / window * refl2;

        let atm2 = self.planck_temp_to_raw(self.atmospheric_temperature);
        let atm2_attn = (1. - tau) / emissivity / tau / window / tau * atm2;

        let coeffs = [
            -atm1_attn - atm2_attn - wind_attn - refl1_attn - refl2_attn,
            1. / emissivity / tau / window / tau,
        ];

        move |raw| power_series_at(&coeffs, raw)
    }

    /// Raw sensor value to Celsius under the given
    /// calibration. The returned closure owns everything it
    /// needs, so it can be shared across threads.
    pub fn temperature_transform(&self, calibration: &Calibration) -> impl Fn(f64) -> f64 + Sync {
        let t = self.raw_transform(calibration);
        let constants = *self;
        move |raw| constants.planck_raw_to_temp(t(raw))
    }

    pub fn raw_to_temp(&self, calibration: &Calibration, raw: f64) -> f64 {
        self.temperature_transform(calibration)(raw)
    }
}

#[inline]
fn power_series_at(coeffs: &[f64], x: f64) -> f64 {
    let mut pow = 1.;
    let mut sum = 0.;
    for coeff in coeffs.iter() {
        sum += pow * coeff;
        pow *= x;
    }
    sum
}
