//! Burn backend for the Genie decoder.
//!
//! [`BurnDecoder`] runs the input projection, LSTM stack and output
//! projection with [Burn](https://burn.dev) tensors on any backend.
//! [`DeviceDecoder`] picks NdArray (CPU) or wgpu (GPU) at construction,
//! using the GPU when [`BackendPool`] finds one and the placement allows it.
//!
//! ```rust,ignore
//! let pool = BackendPool::detect();
//! let mut decoder = DeviceDecoder::new(store, config, DevicePlacement::Auto, &pool, ledger)?;
//! decoder.init()?;
//! let step = decoder.forward(&StepInput::new(None, 0.0, 3), None)?;
//! ```

mod backend_pool;
mod decoder;
mod dispatch;
mod lstm;
mod state;
mod tensor;

#[cfg(test)]
mod testing;

pub use backend_pool::{BackendPool, CpuBackend, CpuDevice, GpuBackend};
pub use decoder::BurnDecoder;
pub use dispatch::{DeviceDecoder, DevicePlacement, DeviceState};
pub use state::{HiddenState, LayerState};
pub use tensor::{tensor_to_vec, TrackedTensor};
