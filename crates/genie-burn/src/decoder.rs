//! Burn implementation of the recurrent step decoder.

use crate::lstm::LstmCell;
use crate::state::{HiddenState, LayerState};
use crate::tensor::{tensor_to_vec, TrackedTensor};
use burn::prelude::*;
use genie_core::{
    encode_features, BufferLedger, DecoderConfig, Error, HostTensor, Lifecycle, ParameterStore,
    Quantizer, Result, StepDecoder, StepInput, StepOutput,
};
use std::path::Path;

/// Device-resident parameters, alive between `init` and `dispose`.
struct DecoderParams<B: Backend> {
    input_kernel: TrackedTensor<B, 2>,
    input_bias: TrackedTensor<B, 2>,
    cells: Vec<LstmCell<B>>,
    output_kernel: TrackedTensor<B, 2>,
    output_bias: TrackedTensor<B, 2>,
}

impl<B: Backend> DecoderParams<B> {
    fn upload(
        store: &ParameterStore,
        config: &DecoderConfig,
        device: &B::Device,
        ledger: &BufferLedger,
    ) -> Result<Self> {
        let names = &config.names;

        let kernel = store.lookup(&names.input_kernel)?;
        let projected = matrix_cols(&names.input_kernel, kernel, config.feature_width())?;
        let input_kernel = upload_matrix(kernel, device, ledger);
        let input_bias = upload_bias(&names.input_bias, store, projected, device, ledger)?;

        let mut cells = Vec::with_capacity(config.num_layers);
        let mut width = projected;
        for layer in 0..config.num_layers {
            let kernel_name = names.lstm_kernel(layer);
            let bias_name = names.lstm_bias(layer);
            let kernel = store.lookup(&kernel_name)?;
            let cell = LstmCell::from_host(
                (kernel_name.as_str(), bias_name.as_str()),
                kernel,
                store.lookup(&bias_name)?,
                width,
                config.gate_order,
                device,
                ledger,
            )?;
            // Every layer shares one hidden width so the state is rectangular.
            if let Some(first) = cells.first().map(LstmCell::hidden_size) {
                if cell.hidden_size() != first {
                    return Err(Error::shape(
                        kernel_name,
                        &[width + first, 4 * first],
                        kernel.shape(),
                    ));
                }
            }
            width = cell.hidden_size();
            cells.push(cell);
        }

        let kernel = store.lookup(&names.output_kernel)?;
        kernel.expect_shape(&names.output_kernel, &[width, config.num_keys])?;
        let output_kernel = upload_matrix(kernel, device, ledger);
        let output_bias = upload_bias(&names.output_bias, store, config.num_keys, device, ledger)?;

        Ok(Self {
            input_kernel,
            input_bias,
            cells,
            output_kernel,
            output_bias,
        })
    }

    fn hidden_size(&self) -> usize {
        self.cells.first().map_or(0, LstmCell::hidden_size)
    }
}

/// Column count of a `[rows, _]` matrix, checking the row count.
fn matrix_cols(name: &str, tensor: &HostTensor, rows: usize) -> Result<usize> {
    match tensor.shape() {
        &[r, cols] if r == rows => Ok(cols),
        other => Err(Error::shape(
            name,
            &[rows, other.get(1).copied().unwrap_or(0)],
            other,
        )),
    }
}

fn upload_matrix<B: Backend>(
    tensor: &HostTensor,
    device: &B::Device,
    ledger: &BufferLedger,
) -> TrackedTensor<B, 2> {
    let dims = [tensor.shape()[0], tensor.shape()[1]];
    TrackedTensor::from_host(tensor.data().to_vec(), dims, device, ledger)
}

/// Biases are stored `[n]` and uploaded as `[1, n]` rows.
fn upload_bias<B: Backend>(
    name: &str,
    store: &ParameterStore,
    width: usize,
    device: &B::Device,
    ledger: &BufferLedger,
) -> Result<TrackedTensor<B, 2>> {
    let bias = store.lookup(name)?;
    bias.expect_shape(name, &[width])?;
    Ok(TrackedTensor::from_host(
        bias.data().to_vec(),
        [1, width],
        device,
        ledger,
    ))
}

/// Two-stage decoder: input projection, stacked LSTM cells, output projection.
///
/// # Lifecycle
///
/// 1. [`BurnDecoder::new`] takes ownership of the parameter store
/// 2. [`init`](StepDecoder::init) uploads parameters to the device
/// 3. [`forward`](StepDecoder::forward) runs one timestep at a time
/// 4. [`dispose`](StepDecoder::dispose) releases parameters; every later
///    call fails with [`Error::Usage`]
pub struct BurnDecoder<B: Backend> {
    config: DecoderConfig,
    quantizer: Quantizer,
    store: Option<ParameterStore>,
    params: Option<DecoderParams<B>>,
    device: B::Device,
    ledger: BufferLedger,
    lifecycle: Lifecycle,
}

impl<B: Backend> BurnDecoder<B> {
    pub fn new(
        store: ParameterStore,
        config: DecoderConfig,
        device: B::Device,
        ledger: BufferLedger,
    ) -> Result<Self> {
        config.validate()?;
        let (min, max) = config.button_range;
        let quantizer = Quantizer::new(config.num_buttons, min, max)?;
        Ok(Self {
            config,
            quantizer,
            store: Some(store),
            params: None,
            device,
            ledger,
            lifecycle: Lifecycle::Created,
        })
    }

    /// Load the parameter store from a weights manifest.
    pub fn from_manifest(
        manifest_path: impl AsRef<Path>,
        config: DecoderConfig,
        device: B::Device,
        ledger: BufferLedger,
    ) -> Result<Self> {
        let store = ParameterStore::load(manifest_path)?;
        Self::new(store, config, device, ledger)
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn quantizer(&self) -> &Quantizer {
        &self.quantizer
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    pub fn ledger(&self) -> &BufferLedger {
        &self.ledger
    }

    /// Hidden width, known once initialised.
    pub fn hidden_size(&self) -> Option<usize> {
        self.params.as_ref().map(DecoderParams::hidden_size)
    }

    fn ready_params(&self, what: &str) -> Result<&DecoderParams<B>> {
        self.lifecycle.ensure_ready(what)?;
        self.params
            .as_ref()
            .ok_or_else(|| Error::usage(format!("{what} called without parameters")))
    }
}

impl<B: Backend> StepDecoder for BurnDecoder<B> {
    type State = HiddenState<B>;

    fn init(&mut self) -> Result<()> {
        match self.lifecycle {
            Lifecycle::Created => {}
            Lifecycle::Ready => return Err(Error::usage("init() called twice")),
            Lifecycle::Disposed => return Err(Error::usage("init() called after dispose()")),
        }
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| Error::usage("decoder has no parameter store"))?;

        let params = DecoderParams::upload(store, &self.config, &self.device, &self.ledger)?;
        tracing::debug!(
            "Decoder ready: {} layers, hidden size {}, {} keys, {} live buffer bytes",
            params.cells.len(),
            params.hidden_size(),
            self.config.num_keys,
            self.ledger.live_bytes()
        );
        self.params = Some(params);
        self.lifecycle = Lifecycle::Ready;
        Ok(())
    }

    fn forward(
        &self,
        input: &StepInput,
        previous: Option<&HiddenState<B>>,
    ) -> Result<StepOutput<HiddenState<B>>> {
        let params = self.ready_params("forward()")?;
        let hidden_size = params.hidden_size();
        if let Some(state) = previous {
            state.check_shape(params.cells.len(), hidden_size)?;
        }

        let features = encode_features(&self.config, &self.quantizer, input)?;
        let width = features.len();
        let mut x = Tensor::<B, 2>::from_data(TensorData::new(features, [1, width]), &self.device)
            .matmul(params.input_kernel.tensor().clone())
            + params.input_bias.tensor().clone();

        let mut layers = Vec::with_capacity(params.cells.len());
        for (index, cell) in params.cells.iter().enumerate() {
            let (c, h) = match previous {
                Some(state) => {
                    let layer = &state.layers()[index];
                    (layer.cell().clone(), layer.hidden().clone())
                }
                None => (
                    Tensor::zeros([1, hidden_size], &self.device),
                    Tensor::zeros([1, hidden_size], &self.device),
                ),
            };
            let (next_c, next_h) = cell.forward(x, c, h, self.config.forget_bias)?;
            x = next_h.clone();
            layers.push(LayerState::new(next_c, next_h, &self.ledger));
        }

        let logits = x.matmul(params.output_kernel.tensor().clone())
            + params.output_bias.tensor().clone();

        Ok(StepOutput {
            logits: tensor_to_vec(logits)?,
            state: HiddenState::from_layers(layers),
        })
    }

    fn zero_state(&self) -> Result<HiddenState<B>> {
        let params = self.ready_params("zero_state()")?;
        Ok(HiddenState::zeros(
            params.cells.len(),
            params.hidden_size(),
            &self.device,
            &self.ledger,
        ))
    }

    fn dispose(&mut self) -> Result<()> {
        if self.lifecycle == Lifecycle::Disposed {
            return Err(Error::usage("dispose() called twice"));
        }
        self.params = None;
        self.store = None;
        self.quantizer.dispose();
        self.lifecycle = Lifecycle::Disposed;
        tracing::debug!(
            "Decoder disposed, {} live buffer bytes remain",
            self.ledger.live_bytes()
        );
        Ok(())
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    fn num_keys(&self) -> usize {
        self.config.num_keys
    }
}
