//! LSTM cell with fused kernel.
//!
//! The kernel maps `[x, h]` to all four gate pre-activations at once:
//! `z = [x, h] @ kernel + bias`, with `kernel: [in + H, 4H]`. Internally the
//! gate blocks are always stored as input, candidate, forget, output
//! (`ijfo`); kernels trained with another layout are permuted once when the
//! cell is built.

use crate::tensor::TrackedTensor;
use burn::prelude::*;
use burn::tensor::activation::sigmoid;
use genie_core::{BufferLedger, Error, GateOrder, HostTensor, Result};

pub(crate) struct LstmCell<B: Backend> {
    kernel: TrackedTensor<B, 2>,
    bias: TrackedTensor<B, 2>,
    hidden_size: usize,
}

impl<B: Backend> LstmCell<B> {
    /// Upload a cell whose input width is `input_size`.
    ///
    /// The hidden width is inferred from the kernel (`4H` columns).
    pub fn from_host(
        names: (&str, &str),
        kernel: &HostTensor,
        bias: &HostTensor,
        input_size: usize,
        gate_order: GateOrder,
        device: &B::Device,
        ledger: &BufferLedger,
    ) -> Result<Self> {
        let (kernel_name, bias_name) = names;
        let shape = kernel.shape();
        let cols = shape.get(1).copied().unwrap_or(0);
        if shape.len() != 2 || cols == 0 || cols % 4 != 0 {
            return Err(Error::shape(kernel_name, &[input_size, 4], shape));
        }
        let hidden_size = cols / 4;
        let rows = input_size + hidden_size;
        kernel.expect_shape(kernel_name, &[rows, cols])?;
        bias.expect_shape(bias_name, &[cols])?;

        let kernel_data = reorder_gate_columns(kernel.data(), rows, hidden_size, gate_order);
        let bias_data = reorder_gate_columns(bias.data(), 1, hidden_size, gate_order);

        Ok(Self {
            kernel: TrackedTensor::from_host(kernel_data, [rows, cols], device, ledger),
            bias: TrackedTensor::from_host(bias_data, [1, cols], device, ledger),
            hidden_size,
        })
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// One timestep. `x: [1, in]`, `cell` and `hidden`: `[1, H]`.
    /// Returns `(cell, hidden)` for the next step.
    pub fn forward(
        &self,
        x: Tensor<B, 2>,
        cell: Tensor<B, 2>,
        hidden: Tensor<B, 2>,
        forget_bias: f32,
    ) -> Result<(Tensor<B, 2>, Tensor<B, 2>)> {
        let z = Tensor::cat(vec![x, hidden], 1).matmul(self.kernel.tensor().clone())
            + self.bias.tensor().clone();

        let [i, j, f, o]: [Tensor<B, 2>; 4] = z
            .chunk(4, 1)
            .try_into()
            .map_err(|_| Error::Backend("gate split did not yield four blocks".into()))?;

        let next_cell = sigmoid(f.add_scalar(forget_bias)) * cell + sigmoid(i) * j.tanh();
        let next_hidden = sigmoid(o) * next_cell.clone().tanh();
        Ok((next_cell, next_hidden))
    }
}

/// Permute the four `hidden`-wide column blocks of a row-major `[rows, 4H]`
/// matrix from `order` into canonical `ijfo` order.
pub(crate) fn reorder_gate_columns(
    data: &[f32],
    rows: usize,
    hidden: usize,
    order: GateOrder,
) -> Vec<f32> {
    let blocks = order.canonical_blocks();
    if blocks == [0, 1, 2, 3] {
        return data.to_vec();
    }

    let cols = 4 * hidden;
    let mut out = Vec::with_capacity(data.len());
    for row in data.chunks_exact(cols).take(rows) {
        for &source in &blocks {
            out.extend_from_slice(&row[source * hidden..(source + 1) * hidden]);
        }
    }
    out
}
