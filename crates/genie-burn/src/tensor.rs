//! Device tensors registered with a buffer ledger.

use burn::prelude::*;
use genie_core::{BufferGuard, BufferLedger, Error, Result};

/// A device tensor that must outlive a single forward call.
///
/// The tensor's byte size is registered with the ledger on construction and
/// released when the wrapper drops, so parameters and hidden states show up
/// in leak checks. Per-call intermediates stay plain [`Tensor`]s.
pub struct TrackedTensor<B: Backend, const D: usize> {
    tensor: Tensor<B, D>,
    guard: BufferGuard,
}

impl<B: Backend, const D: usize> TrackedTensor<B, D> {
    pub fn new(tensor: Tensor<B, D>, ledger: &BufferLedger) -> Self {
        let bytes = tensor.shape().num_elements() * core::mem::size_of::<B::FloatElem>();
        Self {
            tensor,
            guard: ledger.register(bytes),
        }
    }

    /// Upload row-major host data.
    pub fn from_host(
        data: Vec<f32>,
        dims: [usize; D],
        device: &B::Device,
        ledger: &BufferLedger,
    ) -> Self {
        let tensor = Tensor::<B, D>::from_data(TensorData::new(data, dims), device);
        Self::new(tensor, ledger)
    }

    pub fn zeros(dims: [usize; D], device: &B::Device, ledger: &BufferLedger) -> Self {
        Self::new(Tensor::zeros(dims, device), ledger)
    }

    pub fn tensor(&self) -> &Tensor<B, D> {
        &self.tensor
    }

    pub fn dims(&self) -> [usize; D] {
        self.tensor.dims()
    }

    pub fn num_bytes(&self) -> usize {
        self.guard.bytes()
    }

    /// Copy the values back to host memory.
    pub fn to_host(&self) -> Result<Vec<f32>> {
        tensor_to_vec(self.tensor.clone())
    }
}

/// Read a tensor back into a flat `Vec<f32>`.
pub fn tensor_to_vec<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<Vec<f32>> {
    tensor
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| Error::Backend(format!("cannot read tensor data: {e:?}")))
}

impl<B: Backend, const D: usize> core::fmt::Debug for TrackedTensor<B, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TrackedTensor")
            .field("dims", &self.dims())
            .field("bytes", &self.guard.bytes())
            .finish()
    }
}
