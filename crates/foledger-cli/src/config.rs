//! Runtime settings
//!
//! Settings come from an optional TOML file:
//!
//! ```toml
//! price_per_meter = 820.0
//! export_dir = "exports"
//! ```
//!
//! A `--price` flag (or `FOLEDGER_PRICE_PER_METER`) overrides the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use foledger_core::PricePerMeter;
use serde::Deserialize;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Revenue per installed meter
    pub price_per_meter: f64,
    /// Directory for spreadsheets exported without an explicit path
    pub export_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            price_per_meter: PricePerMeter::DEFAULT.value(),
            export_dir: PathBuf::from("."),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or the defaults when no file is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        let settings = Self::from_toml_str(&text)
            .with_context(|| format!("invalid settings file {}", path.display()))?;
        tracing::debug!(path = %path.display(), ?settings, "loaded settings");
        Ok(settings)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let settings: Self = toml::from_str(text)?;
        settings.price()?;
        Ok(settings)
    }

    /// Apply a command-line price override
    pub fn with_price(mut self, price: Option<PricePerMeter>) -> Self {
        if let Some(price) = price {
            self.price_per_meter = price.value();
        }
        self
    }

    /// The configured price, validated
    pub fn price(&self) -> Result<PricePerMeter> {
        Ok(PricePerMeter::new(self.price_per_meter)?)
    }
}
