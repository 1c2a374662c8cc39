//! Decoder configuration.
//!
//! Describes the alphabets, layer count, LSTM conventions and parameter
//! naming of a trained decoder. Loaded from TOML, usually a sidecar file
//! next to the weights manifest:
//!
//! ```toml
//! num_buttons = 8
//! num_keys = 88
//! num_layers = 2
//! gate_order = "ijfo"
//! forget_bias = 1.0
//!
//! [names]
//! input_kernel = "phero_model/decoder/rnn_input/dense/kernel"
//! ```

use crate::error::{Error, Result};
use crate::quantizer::Quantizer;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Placeholder substituted with the layer index in LSTM parameter names.
pub const LAYER_PLACEHOLDER: &str = "{layer}";

/// Order of the four gate blocks along the last axis of an LSTM kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GateOrder {
    /// input, candidate, forget, output (TensorFlow `LSTMCell`).
    #[default]
    #[serde(rename = "ijfo")]
    Ijfo,
    /// input, forget, candidate, output (PyTorch / cuDNN).
    #[serde(rename = "ifjo")]
    Ifjo,
}

impl GateOrder {
    /// For each canonical gate slot (`i`, `j`, `f`, `o`), the block index
    /// holding that gate in this layout.
    pub fn canonical_blocks(self) -> [usize; 4] {
        match self {
            GateOrder::Ijfo => [0, 1, 2, 3],
            GateOrder::Ifjo => [0, 2, 1, 3],
        }
    }
}

/// Names of the parameters the decoder looks up in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterNames {
    pub input_kernel: String,
    pub input_bias: String,
    /// Contains [`LAYER_PLACEHOLDER`].
    pub lstm_kernel: String,
    /// Contains [`LAYER_PLACEHOLDER`].
    pub lstm_bias: String,
    pub output_kernel: String,
    pub output_bias: String,
}

impl Default for ParameterNames {
    fn default() -> Self {
        let prefix = "phero_model/decoder";
        let cell = "rnn/rnn/multi_rnn_cell/cell_{layer}/lstm_cell";
        Self {
            input_kernel: format!("{prefix}/rnn_input/dense/kernel"),
            input_bias: format!("{prefix}/rnn_input/dense/bias"),
            lstm_kernel: format!("{prefix}/{cell}/kernel"),
            lstm_bias: format!("{prefix}/{cell}/bias"),
            output_kernel: format!("{prefix}/pitches/dense/kernel"),
            output_bias: format!("{prefix}/pitches/dense/bias"),
        }
    }
}

impl ParameterNames {
    pub fn lstm_kernel(&self, layer: usize) -> String {
        self.lstm_kernel.replace(LAYER_PLACEHOLDER, &layer.to_string())
    }

    pub fn lstm_bias(&self, layer: usize) -> String {
        self.lstm_bias.replace(LAYER_PLACEHOLDER, &layer.to_string())
    }
}

/// Static description of a trained decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Size of the button alphabet fed through the quantizer.
    pub num_buttons: usize,
    /// Size of the output alphabet (piano keys).
    pub num_keys: usize,
    /// Number of stacked LSTM cells.
    pub num_layers: usize,
    pub gate_order: GateOrder,
    /// Added to the forget gate pre-activation.
    pub forget_bias: f32,
    /// Bounds of the quantized button signal.
    pub button_range: (f32, f32),
    pub names: ParameterNames,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            num_buttons: 8,
            num_keys: 88,
            num_layers: 2,
            gate_order: GateOrder::Ijfo,
            forget_bias: 1.0,
            button_range: (-1.0, 1.0),
            names: ParameterNames::default(),
        }
    }
}

impl DecoderConfig {
    /// Width of the one-hot previous-key block (one extra slot for "none").
    pub fn one_hot_width(&self) -> usize {
        self.num_keys + 1
    }

    /// Width of the feature vector: one-hot, time delta, button signal.
    pub fn feature_width(&self) -> usize {
        self.one_hot_width() + 2
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_buttons < 2 {
            return Err(Error::config(format!(
                "num_buttons must be at least 2, got {}",
                self.num_buttons
            )));
        }
        let (min, max) = self.button_range;
        Quantizer::new(self.num_buttons, min, max)?;
        if self.num_keys == 0 {
            return Err(Error::config("num_keys must be positive"));
        }
        if self.num_layers == 0 {
            return Err(Error::config("num_layers must be positive"));
        }
        if !self.forget_bias.is_finite() {
            return Err(Error::config("forget_bias must be finite"));
        }
        for template in [&self.names.lstm_kernel, &self.names.lstm_bias] {
            if self.num_layers > 1 && !template.contains(LAYER_PLACEHOLDER) {
                return Err(Error::config(format!(
                    "LSTM parameter name '{template}' needs a {LAYER_PLACEHOLDER} placeholder"
                )));
            }
        }
        Ok(())
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("cannot read config {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&contents)
    }
}

/// Sidecar config path for a manifest: `weights_manifest.json` becomes
/// `weights_manifest.toml`.
pub fn sidecar_path(manifest_path: &Path) -> PathBuf {
    manifest_path.with_extension("toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_widths() {
        let config = DecoderConfig::default();
        assert_eq!(config.one_hot_width(), 89);
        assert_eq!(config.feature_width(), 91);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_layer_names() {
        let names = ParameterNames::default();
        assert_eq!(
            names.lstm_kernel(1),
            "phero_model/decoder/rnn/rnn/multi_rnn_cell/cell_1/lstm_cell/kernel"
        );
        assert!(names.lstm_bias(0).ends_with("cell_0/lstm_cell/bias"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = DecoderConfig::from_toml_str(
            r#"
            num_layers = 3
            gate_order = "ifjo"
            forget_bias = 0.0
            "#,
        )
        .unwrap();
        assert_eq!(config.num_layers, 3);
        assert_eq!(config.gate_order, GateOrder::Ifjo);
        assert_eq!(config.num_keys, 88);
        assert_eq!(config.names, ParameterNames::default());
    }

    #[test]
    fn test_rejects_single_button() {
        let err = DecoderConfig::from_toml_str("num_buttons = 1").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_rejects_button_range_wider_than_f32() {
        let err = DecoderConfig::from_toml_str("button_range = [-3.4e38, 3.4e38]").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_rejects_template_without_placeholder() {
        let mut config = DecoderConfig::default();
        config.names.lstm_kernel = "cell/kernel".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_gate_blocks() {
        assert_eq!(GateOrder::Ijfo.canonical_blocks(), [0, 1, 2, 3]);
        assert_eq!(GateOrder::Ifjo.canonical_blocks(), [0, 2, 1, 3]);
    }

    #[test]
    fn test_sidecar_path() {
        let path = sidecar_path(Path::new("/models/genie/weights_manifest.json"));
        assert_eq!(path, Path::new("/models/genie/weights_manifest.toml"));
    }
}
