//! Dynamic CPU/GPU dispatch for the decoder.
//!
//! A decoder is placed on either CPU (NdArray) or GPU (Wgpu) when it is
//! built. [`DeviceDecoder`] wraps both backend instantiations behind one
//! [`StepDecoder`] implementation so callers never name a backend type.

use crate::backend_pool::{BackendPool, CpuBackend, GpuBackend};
use crate::decoder::BurnDecoder;
use crate::state::HiddenState;
use genie_core::{
    BufferLedger, DecoderConfig, Error, Lifecycle, ParameterStore, Result, StepDecoder, StepInput,
    StepOutput,
};
use serde::{Deserialize, Serialize};

/// Where the decoder should execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePlacement {
    /// CPU via NdArray backend (always available).
    #[default]
    Cpu,
    /// GPU via Wgpu backend (requires GPU availability).
    Gpu,
    /// GPU when the pool found one, CPU otherwise.
    Auto,
}

impl DevicePlacement {
    /// Resolve to a concrete placement available in `pool`.
    pub fn resolve(self, pool: &BackendPool) -> DevicePlacement {
        match self {
            DevicePlacement::Gpu | DevicePlacement::Auto if pool.has_gpu() => DevicePlacement::Gpu,
            DevicePlacement::Gpu => {
                tracing::warn!("GPU placement requested but no GPU found, falling back to CPU");
                DevicePlacement::Cpu
            }
            _ => DevicePlacement::Cpu,
        }
    }
}

/// A decoder that lives on either CPU or GPU.
pub enum DeviceDecoder {
    Cpu(BurnDecoder<CpuBackend>),
    Gpu(BurnDecoder<GpuBackend>),
}

/// Hidden state of a [`DeviceDecoder`], tagged with its device.
#[derive(Debug)]
pub enum DeviceState {
    Cpu(HiddenState<CpuBackend>),
    Gpu(HiddenState<GpuBackend>),
}

impl DeviceState {
    pub fn num_bytes(&self) -> usize {
        match self {
            DeviceState::Cpu(s) => s.num_bytes(),
            DeviceState::Gpu(s) => s.num_bytes(),
        }
    }

    pub fn dispose(self) {
        match self {
            DeviceState::Cpu(s) => s.dispose(),
            DeviceState::Gpu(s) => s.dispose(),
        }
    }
}

impl DeviceDecoder {
    /// Build an uninitialised decoder on the device `placement` resolves to.
    pub fn new(
        store: ParameterStore,
        config: DecoderConfig,
        placement: DevicePlacement,
        pool: &BackendPool,
        ledger: BufferLedger,
    ) -> Result<Self> {
        match (placement.resolve(pool), pool.gpu_device()) {
            (DevicePlacement::Gpu, Some(device)) => {
                tracing::debug!("Placing decoder on GPU");
                Ok(DeviceDecoder::Gpu(BurnDecoder::new(
                    store,
                    config,
                    device.clone(),
                    ledger,
                )?))
            }
            _ => {
                tracing::debug!("Placing decoder on CPU");
                Ok(DeviceDecoder::Cpu(BurnDecoder::new(
                    store,
                    config,
                    *pool.cpu_device(),
                    ledger,
                )?))
            }
        }
    }

    /// Returns the placement of this decoder.
    pub fn placement(&self) -> DevicePlacement {
        match self {
            DeviceDecoder::Cpu(_) => DevicePlacement::Cpu,
            DeviceDecoder::Gpu(_) => DevicePlacement::Gpu,
        }
    }

    pub fn config(&self) -> &DecoderConfig {
        match self {
            DeviceDecoder::Cpu(d) => d.config(),
            DeviceDecoder::Gpu(d) => d.config(),
        }
    }
}

fn wrong_device(placement: DevicePlacement) -> Error {
    Error::usage(format!(
        "hidden state belongs to another device than this {placement:?} decoder"
    ))
}

impl StepDecoder for DeviceDecoder {
    type State = DeviceState;

    fn init(&mut self) -> Result<()> {
        match self {
            DeviceDecoder::Cpu(d) => d.init(),
            DeviceDecoder::Gpu(d) => d.init(),
        }
    }

    fn forward(
        &self,
        input: &StepInput,
        previous: Option<&DeviceState>,
    ) -> Result<StepOutput<DeviceState>> {
        match (self, previous) {
            (DeviceDecoder::Cpu(d), None) => d.forward(input, None).map(cpu_output),
            (DeviceDecoder::Cpu(d), Some(DeviceState::Cpu(s))) => {
                d.forward(input, Some(s)).map(cpu_output)
            }
            (DeviceDecoder::Gpu(d), None) => d.forward(input, None).map(gpu_output),
            (DeviceDecoder::Gpu(d), Some(DeviceState::Gpu(s))) => {
                d.forward(input, Some(s)).map(gpu_output)
            }
            (decoder, Some(_)) => Err(wrong_device(decoder.placement())),
        }
    }

    fn zero_state(&self) -> Result<DeviceState> {
        match self {
            DeviceDecoder::Cpu(d) => d.zero_state().map(DeviceState::Cpu),
            DeviceDecoder::Gpu(d) => d.zero_state().map(DeviceState::Gpu),
        }
    }

    fn dispose(&mut self) -> Result<()> {
        match self {
            DeviceDecoder::Cpu(d) => d.dispose(),
            DeviceDecoder::Gpu(d) => d.dispose(),
        }
    }

    fn lifecycle(&self) -> Lifecycle {
        match self {
            DeviceDecoder::Cpu(d) => d.lifecycle(),
            DeviceDecoder::Gpu(d) => d.lifecycle(),
        }
    }

    fn num_keys(&self) -> usize {
        self.config().num_keys
    }
}

fn cpu_output(out: StepOutput<HiddenState<CpuBackend>>) -> StepOutput<DeviceState> {
    StepOutput {
        logits: out.logits,
        state: DeviceState::Cpu(out.state),
    }
}

fn gpu_output(out: StepOutput<HiddenState<GpuBackend>>) -> StepOutput<DeviceState> {
    StepOutput {
        logits: out.logits,
        state: DeviceState::Gpu(out.state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{random_store, small_config};

    fn cpu_decoder(ledger: &BufferLedger) -> DeviceDecoder {
        let config = small_config();
        let store = random_store(&config, 6, 5, 3);
        let mut d = DeviceDecoder::new(
            store,
            config,
            DevicePlacement::Cpu,
            &BackendPool::cpu_only(),
            ledger.clone(),
        )
        .unwrap();
        d.init().unwrap();
        d
    }

    #[test]
    fn test_placement_falls_back_to_cpu() {
        let pool = BackendPool::cpu_only();
        assert_eq!(DevicePlacement::Gpu.resolve(&pool), DevicePlacement::Cpu);
        assert_eq!(DevicePlacement::Auto.resolve(&pool), DevicePlacement::Cpu);
        assert_eq!(DevicePlacement::Cpu.resolve(&pool), DevicePlacement::Cpu);
    }

    #[test]
    fn test_cpu_forward() {
        let ledger = BufferLedger::new();
        let d = cpu_decoder(&ledger);
        assert_eq!(d.placement(), DevicePlacement::Cpu);

        let first = d.forward(&StepInput::new(None, 0.0, 0), None).unwrap();
        let second = d
            .forward(&StepInput::new(Some(3), 0.1, 7), Some(&first.state))
            .unwrap();
        assert_eq!(second.logits.len(), d.num_keys());
        assert!(matches!(second.state, DeviceState::Cpu(_)));
    }

    #[test]
    fn test_dispose_through_dispatch() {
        let ledger = BufferLedger::new();
        let mut d = cpu_decoder(&ledger);
        let state = d.zero_state().unwrap();
        assert!(state.num_bytes() > 0);

        state.dispose();
        d.dispose().unwrap();
        assert_eq!(d.lifecycle(), Lifecycle::Disposed);
        assert_eq!(ledger.live_bytes(), 0);
    }

    #[test]
    fn test_placement_serde() {
        let p: DevicePlacement = serde_json::from_str("\"auto\"").unwrap();
        assert_eq!(p, DevicePlacement::Auto);
    }

    #[test]
    fn test_gpu_forward_if_available() {
        let pool = BackendPool::detect();
        if !pool.has_gpu() {
            return;
        }

        let ledger = BufferLedger::new();
        let config = small_config();
        let store = random_store(&config, 6, 5, 3);
        let mut d =
            DeviceDecoder::new(store, config, DevicePlacement::Gpu, &pool, ledger).unwrap();
        d.init().unwrap();
        assert_eq!(d.placement(), DevicePlacement::Gpu);

        let out = d.forward(&StepInput::new(None, 0.0, 1), None).unwrap();
        assert_eq!(out.logits.len(), d.num_keys());
    }
}
