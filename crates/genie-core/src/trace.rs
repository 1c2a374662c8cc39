//! Golden trace recorded from the reference implementation.

use crate::decoder::StepInput;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parallel per-step inputs and expected logits.
///
/// `input_keys` uses `-1` for "no previous key".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldenTrace {
    pub input_keys: Vec<i64>,
    pub input_dts: Vec<f32>,
    pub input_buttons: Vec<usize>,
    pub output_logits: Vec<Vec<f32>>,
}

impl GoldenTrace {
    pub fn from_json(json: &str) -> Result<Self> {
        let trace: Self = serde_json::from_str(json)
            .map_err(|e| Error::Configuration(format!("malformed golden trace: {e}")))?;
        trace.validate()?;
        Ok(trace)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("cannot read trace {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<()> {
        let n = self.input_keys.len();
        if n == 0 {
            return Err(Error::Configuration("golden trace is empty".into()));
        }
        if self.input_dts.len() != n
            || self.input_buttons.len() != n
            || self.output_logits.len() != n
        {
            return Err(Error::Configuration(format!(
                "golden trace columns differ in length: keys={n}, dts={}, buttons={}, logits={}",
                self.input_dts.len(),
                self.input_buttons.len(),
                self.output_logits.len()
            )));
        }
        if let Some(&key) = self.input_keys.iter().find(|&&k| k < -1) {
            return Err(Error::Configuration(format!(
                "golden trace key {key} is below -1"
            )));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.input_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_keys.is_empty()
    }

    /// Input of step `i`, or `None` past the end of the trace.
    pub fn step(&self, i: usize) -> Option<StepInput> {
        let key = *self.input_keys.get(i)?;
        Some(StepInput {
            previous_key: (key >= 0).then_some(key as usize),
            time_delta: *self.input_dts.get(i)?,
            button: *self.input_buttons.get(i)?,
        })
    }

    /// Iterate over `(input, expected_logits)` pairs.
    pub fn steps(&self) -> impl Iterator<Item = (StepInput, &[f32])> + '_ {
        (0..self.len())
            .map_while(move |i| Some((self.step(i)?, self.output_logits.get(i)?.as_slice())))
    }
}
