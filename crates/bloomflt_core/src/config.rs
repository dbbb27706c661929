use crate::codec::{Encoding, SaveOptions};
use crate::consts::DEFAULT_COMPRESSION_LEVEL;
use crate::errors::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Persisted defaults for tools working with filter files. Missing keys fall back
/// to [`Config::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub compression_level: i32,
    /// Fold factor applied when loading.
    pub load_factor: usize,
    pub encoding: Encoding,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            load_factor: 1,
            encoding: Encoding::Compressed,
        }
    }
}

impl Config {
    /// Reads a JSON config; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let s = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&s)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn save_options(&self) -> SaveOptions {
        SaveOptions { compression_level: self.compression_level }
    }
}
