//! Recurrent hidden state.

use crate::tensor::TrackedTensor;
use burn::prelude::*;
use genie_core::{BufferLedger, Error, Result};

/// Cell memory and output of one LSTM layer, each `[1, H]`.
pub struct LayerState<B: Backend> {
    pub(crate) cell: TrackedTensor<B, 2>,
    pub(crate) hidden: TrackedTensor<B, 2>,
}

impl<B: Backend> LayerState<B> {
    pub(crate) fn new(cell: Tensor<B, 2>, hidden: Tensor<B, 2>, ledger: &BufferLedger) -> Self {
        Self {
            cell: TrackedTensor::new(cell, ledger),
            hidden: TrackedTensor::new(hidden, ledger),
        }
    }

    pub fn cell(&self) -> &Tensor<B, 2> {
        self.cell.tensor()
    }

    pub fn hidden(&self) -> &Tensor<B, 2> {
        self.hidden.tensor()
    }
}

/// Per-layer recurrent memory carried between steps.
///
/// Returned by `forward` and owned by the caller from then on. Not `Clone`:
/// each state's buffers are released exactly once, when it is disposed or
/// dropped.
pub struct HiddenState<B: Backend> {
    layers: Vec<LayerState<B>>,
}

impl<B: Backend> HiddenState<B> {
    pub(crate) fn from_layers(layers: Vec<LayerState<B>>) -> Self {
        Self { layers }
    }

    /// All-zero state for `num_layers` layers of width `width`.
    pub fn zeros(
        num_layers: usize,
        width: usize,
        device: &B::Device,
        ledger: &BufferLedger,
    ) -> Self {
        let layers = (0..num_layers)
            .map(|_| LayerState {
                cell: TrackedTensor::zeros([1, width], device, ledger),
                hidden: TrackedTensor::zeros([1, width], device, ledger),
            })
            .collect();
        Self { layers }
    }

    pub fn layers(&self) -> &[LayerState<B>] {
        &self.layers
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Hidden width, 0 for a state without layers.
    pub fn width(&self) -> usize {
        self.layers.first().map_or(0, |l| l.hidden.dims()[1])
    }

    pub fn num_bytes(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.cell.num_bytes() + l.hidden.num_bytes())
            .sum()
    }

    /// Fail unless the state has `num_layers` layers of `[1, width]` tensors.
    pub fn check_shape(&self, num_layers: usize, width: usize) -> Result<()> {
        if self.layers.len() != num_layers {
            return Err(Error::shape(
                "hidden_state",
                &[num_layers],
                &[self.layers.len()],
            ));
        }
        for (index, layer) in self.layers.iter().enumerate() {
            for (what, tensor) in [("cell", &layer.cell), ("hidden", &layer.hidden)] {
                let dims = tensor.dims();
                if dims != [1, width] {
                    return Err(Error::shape(
                        format!("hidden_state[{index}].{what}"),
                        &[1, width],
                        &dims,
                    ));
                }
            }
        }
        Ok(())
    }

    /// Host copies of `(cell, hidden)` for every layer.
    pub fn to_host(&self) -> Result<Vec<(Vec<f32>, Vec<f32>)>> {
        self.layers
            .iter()
            .map(|l| Ok((l.cell.to_host()?, l.hidden.to_host()?)))
            .collect()
    }

    /// Release the state's buffers.
    pub fn dispose(self) {
        tracing::trace!(
            "Releasing hidden state ({} layers, {} bytes)",
            self.layers.len(),
            self.num_bytes()
        );
    }
}

impl<B: Backend> core::fmt::Debug for HiddenState<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HiddenState")
            .field("layers", &self.layers.len())
            .field("width", &self.width())
            .finish()
    }
}
