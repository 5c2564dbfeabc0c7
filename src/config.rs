//! Settings shared by images opened through a registry.
use std::{
    fs,
    path::{Path, PathBuf},
};

use serde_derive::*;

use crate::{
    error::{Error, Result},
    palette::Palette,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory exports are written to.
    pub output_dir: PathBuf,
    /// Replace existing files instead of picking a fresh
    /// name.
    pub overwrite: bool,
    /// Palette to use instead of the recorded one.
    pub palette: Option<Palette>,
    /// Object distance in meters to use instead of the
    /// recorded one.
    pub object_distance: Option<f64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            output_dir: std::env::temp_dir(),
            overwrite: false,
            palette: None,
            object_distance: None,
        }
    }
}

impl Config {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)
            .map_err(|e| Error::invalid_argument(format!("bad configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| Error::file_io(path, e))?;
        Self::from_json_str(&json)
    }

    fn validate(&self) -> Result<()> {
        match self.object_distance {
            Some(d) if !d.is_finite() || d < 0. => Err(Error::invalid_argument(format!(
                "object distance must be a non-negative number, got {}",
                d
            ))),
            _ => Ok(()),
        }
    }
}
