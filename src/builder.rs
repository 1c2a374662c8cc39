//! Builder for configuring and constructing a `GenieEngine`.

use crate::config::{GenieConfig, PerformanceConfig};
use crate::input::KeyboardMap;
use crate::performance::Performance;
use crate::sampling::KeySampler;
use crate::{Error, GenieEngine, Result};
use genie_burn::{BackendPool, DeviceDecoder, DevicePlacement};
use genie_core::config::sidecar_path;
use genie_core::{BufferLedger, DecoderConfig, ParameterStore, StepDecoder};
use std::path::PathBuf;

/// Parameters come from either a weights manifest or an in-memory
/// [`ParameterStore`]. When no decoder config is given, a TOML sidecar next to
/// the manifest (`weights_manifest.toml`) is used if present, otherwise the
/// defaults.
///
/// # Example
///
/// ```ignore
/// use genie::prelude::*;
///
/// let engine = GenieEngine::builder()
///     .manifest("model/weights_manifest.json")
///     .placement(DevicePlacement::Auto)
///     .seed(7)
///     .build()?;
/// ```
pub struct GenieEngineBuilder {
    manifest: Option<PathBuf>,
    parameters: Option<ParameterStore>,
    decoder_config: Option<DecoderConfig>,
    performance: PerformanceConfig,
    placement: DevicePlacement,
    pool: Option<BackendPool>,
    keyboard: KeyboardMap,
    ledger: BufferLedger,
}

impl Default for GenieEngineBuilder {
    fn default() -> Self {
        Self {
            manifest: None,
            parameters: None,
            decoder_config: None,
            performance: PerformanceConfig::default(),
            placement: DevicePlacement::Cpu,
            pool: None,
            keyboard: KeyboardMap::default(),
            ledger: BufferLedger::new(),
        }
    }
}

impl GenieEngineBuilder {
    /// Load parameters from a weights manifest.
    pub fn manifest(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest = Some(path.into());
        self
    }

    /// Use already loaded parameters instead of a manifest.
    pub fn parameters(mut self, store: ParameterStore) -> Self {
        self.parameters = Some(store);
        self
    }

    pub fn config(mut self, config: GenieConfig) -> Self {
        self.decoder_config = Some(config.decoder);
        self.performance = config.performance;
        self
    }

    pub fn decoder_config(mut self, config: DecoderConfig) -> Self {
        self.decoder_config = Some(config);
        self
    }

    /// Default: 0.25
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.performance.temperature = temperature;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.performance.seed = Some(seed);
        self
    }

    /// Default: CPU
    pub fn placement(mut self, placement: DevicePlacement) -> Self {
        self.placement = placement;
        self
    }

    /// Reuse a probed device pool instead of detecting devices again.
    pub fn backend_pool(mut self, pool: BackendPool) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn keyboard(mut self, keyboard: KeyboardMap) -> Self {
        self.keyboard = keyboard;
        self
    }

    /// Share a buffer ledger, e.g. to check for leaks from outside.
    pub fn ledger(mut self, ledger: BufferLedger) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn build(self) -> Result<GenieEngine> {
        self.performance.validate()?;

        let store = match (self.parameters, &self.manifest) {
            (Some(store), _) => store,
            (None, Some(path)) => ParameterStore::load(path)?,
            (None, None) => {
                return Err(Error::Config(
                    "no parameters: set a manifest or a parameter store".into(),
                ))
            }
        };

        let decoder_config = match (self.decoder_config, &self.manifest) {
            (Some(config), _) => config,
            (None, Some(path)) if sidecar_path(path).is_file() => {
                let sidecar = sidecar_path(path);
                tracing::debug!("Loading decoder config from {}", sidecar.display());
                DecoderConfig::load(sidecar)?
            }
            _ => DecoderConfig::default(),
        };

        if self.keyboard.num_buttons() > decoder_config.num_buttons {
            tracing::warn!(
                "Keyboard layout has {} keys but the decoder only knows {} buttons",
                self.keyboard.num_buttons(),
                decoder_config.num_buttons
            );
        }

        // Skip GPU probing entirely when the CPU was asked for.
        let pool = match (self.pool, self.placement) {
            (Some(pool), _) => pool,
            (None, DevicePlacement::Cpu) => BackendPool::cpu_only(),
            (None, _) => BackendPool::detect(),
        };

        let mut decoder = DeviceDecoder::new(
            store,
            decoder_config,
            self.placement,
            &pool,
            self.ledger.clone(),
        )?;
        decoder.init()?;
        tracing::info!(
            "Genie engine ready on {:?}: {} keys, temperature {}",
            decoder.placement(),
            decoder.num_keys(),
            self.performance.temperature
        );

        let sampler = KeySampler::new(self.performance.temperature, self.performance.seed);
        Ok(GenieEngine::from_parts(
            Performance::new(decoder, sampler),
            self.keyboard,
            self.ledger,
        ))
    }
}
