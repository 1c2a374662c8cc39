//! Engine configuration.
//!
//! ```toml
//! [decoder]
//! num_keys = 88
//! gate_order = "ijfo"
//!
//! [performance]
//! temperature = 0.25
//! seed = 7
//! ```

use crate::{Error, Result};
use genie_core::DecoderConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default sampling temperature for interactive play.
pub const DEFAULT_TEMPERATURE: f32 = 0.25;

/// Settings of an interactive session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Softmax temperature; 0 always plays the most likely key.
    pub temperature: f32,
    /// Sampler seed. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            seed: None,
        }
    }
}

impl PerformanceConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(Error::Config(format!(
                "temperature must be finite and non-negative, got {}",
                self.temperature
            )));
        }
        Ok(())
    }
}

/// Full engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenieConfig {
    pub decoder: DecoderConfig,
    pub performance: PerformanceConfig,
}

impl GenieConfig {
    pub fn validate(&self) -> Result<()> {
        self.decoder.validate()?;
        self.performance.validate()
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read config {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&contents)
    }
}
