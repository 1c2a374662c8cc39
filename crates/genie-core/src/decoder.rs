//! Step decoder capability and per-step I/O.

use crate::config::DecoderConfig;
use crate::error::{Error, Result};
use crate::quantizer::Quantizer;

/// Inputs for a single timestep (batch size 1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepInput {
    /// Key emitted on the previous step, `None` at sequence start.
    pub previous_key: Option<usize>,
    /// Seconds since the previous step.
    pub time_delta: f32,
    /// Index of the pressed button.
    pub button: usize,
}

impl StepInput {
    pub fn new(previous_key: Option<usize>, time_delta: f32, button: usize) -> Self {
        Self {
            previous_key,
            time_delta,
            button,
        }
    }
}

/// Output of a single timestep.
#[derive(Debug)]
pub struct StepOutput<S> {
    /// Unnormalised scores, one per key.
    pub logits: Vec<f32>,
    /// Updated recurrent state, owned by the caller.
    pub state: S,
}

/// Lifecycle of a component that owns device buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    Ready,
    Disposed,
}

impl Lifecycle {
    /// Fail unless the component is ready to run.
    pub fn ensure_ready(self, what: &str) -> Result<()> {
        match self {
            Lifecycle::Ready => Ok(()),
            Lifecycle::Created => Err(Error::usage(format!("{what} called before init()"))),
            Lifecycle::Disposed => Err(Error::usage(format!("{what} called after dispose()"))),
        }
    }
}

/// A single-step recurrent decoder.
///
/// `init` acquires device buffers, `forward` runs one timestep, `dispose`
/// releases everything the decoder owns. States returned by `forward` belong
/// to the caller; the decoder keeps no reference to them.
pub trait StepDecoder {
    type State;

    fn init(&mut self) -> Result<()>;

    /// Run one timestep. `None` is the all-zero state.
    fn forward(
        &self,
        input: &StepInput,
        previous: Option<&Self::State>,
    ) -> Result<StepOutput<Self::State>>;

    /// The all-zero state used at sequence start.
    fn zero_state(&self) -> Result<Self::State>;

    fn dispose(&mut self) -> Result<()>;

    fn lifecycle(&self) -> Lifecycle;

    fn num_keys(&self) -> usize;
}

/// Build the `[one_hot(previous_key), time_delta, button]` feature row.
///
/// Slot 0 of the one-hot block stands for "no previous key"; key `k` lights
/// slot `k + 1`.
pub fn encode_features(
    config: &DecoderConfig,
    quantizer: &Quantizer,
    input: &StepInput,
) -> Result<Vec<f32>> {
    if !input.time_delta.is_finite() || input.time_delta < 0.0 {
        return Err(Error::InvalidInput(format!(
            "time delta must be finite and non-negative, got {}",
            input.time_delta
        )));
    }

    let slot = match input.previous_key {
        None => 0,
        Some(key) if key < config.num_keys => key + 1,
        Some(key) => {
            return Err(Error::InvalidControl {
                index: key,
                alphabet: config.num_keys,
            })
        }
    };
    let button = quantizer.discrete_to_real(input.button)?;

    let mut features = vec![0.0; config.feature_width()];
    features[slot] = 1.0;
    features[config.one_hot_width()] = input.time_delta;
    features[config.one_hot_width() + 1] = button;
    Ok(features)
}
