//! Library to read radiometric BMT thermal images.
//!
//! This crate provides three functionalities:
//!
//! 1. [Parse](container::Container) the BMT container: a
//! record directory holding raw sensor values, camera and
//! display parameters, device information and an optional
//! embedded visual image.
//!
//! 2. Compute [temperature] from raw sensor values and the
//! image's [calibration], following the [Thermimage R
//! library].
//!
//! 3. [Export](image::BmtImage::export_thermal) derived
//! images: the embedded visual image, a fixed point thermal
//! TIFF and a [palette] rendering as PNG.
//!
//! # Usage
//!
//! A file is opened either directly as a [`BmtImage`]:
//!
//! ```rust
//! # fn test_compile() -> bmt::Result<()> {
//! use bmt::{BmtImage, TemperatureUnit};
//!
//! let mut image = BmtImage::open("image.bmt")?;
//! image.calibration_mut().set_emissivity(0.93)?;
//! let temp = image.temperature_at(10, 20, TemperatureUnit::Celsius)?;
//! image.export_thermal_with_palette("out/image", TemperatureUnit::Celsius)?;
//! # Ok(())
//! # }
//! ```
//!
//! or through a [`Registry`], which hands out ids and can
//! be shared between threads:
//!
//! ```rust
//! # fn test_compile() -> bmt::Result<()> {
//! use bmt::{Registry, TemperatureUnit};
//!
//! let registry = Registry::new();
//! let id = registry.open("image.bmt")?;
//! let temp = registry.temperature_at(id, 10, 20, TemperatureUnit::Fahrenheit)?;
//! registry.close(id)?;
//! # Ok(())
//! # }
//! ```
//!
//! Failures are reported as [`Error`]; [`Error::code`]
//! collapses them into the IrApi [`ResultCode`]s.
//!
//! [Thermimage R library]: //github.com/gtatters/Thermimage/blob/master/R/raw2temp.R

pub mod bitmap;
pub mod builder;
pub mod calibration;
pub mod config;
pub mod container;
pub mod error;
pub mod export;
pub mod image;
pub mod logging;
pub mod metadata;
pub mod palette;
pub mod registry;
pub mod report;
pub mod stats;
pub mod temperature;

pub use crate::builder::ContainerBuilder;
pub use crate::calibration::{Band, Calibration};
pub use crate::config::Config;
pub use crate::error::{Component, Error, Result, ResultCode};
pub use crate::image::BmtImage;
pub use crate::metadata::Metadata;
pub use crate::palette::Palette;
pub use crate::registry::{ImageId, Registry};
pub use crate::temperature::{SensorConstants, TemperatureUnit};
