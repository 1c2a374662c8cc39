//! Device pool with automatic GPU detection.

use burn::backend::wgpu::WgpuDevice;
use genie_core::{Error, Result};
use wgpu::PowerPreference;

pub type GpuBackend = burn::backend::wgpu::Wgpu;
pub type CpuBackend = burn::backend::NdArray;
pub type CpuDevice = burn::backend::ndarray::NdArrayDevice;

/// CPU device plus, when an adapter was found, an initialised GPU device.
#[derive(Debug, Clone)]
pub struct BackendPool {
    gpu_device: Option<WgpuDevice>,
    cpu_device: CpuDevice,
}

impl BackendPool {
    /// Probe for a GPU adapter. A missing GPU is not an error.
    pub fn detect() -> Self {
        let gpu_device = match Self::init_gpu() {
            Ok(device) => Some(device),
            Err(e) => {
                tracing::debug!("GPU unavailable, using CPU only: {e}");
                None
            }
        };
        Self {
            gpu_device,
            cpu_device: CpuDevice::default(),
        }
    }

    /// A pool that never touches the GPU.
    pub fn cpu_only() -> Self {
        Self {
            gpu_device: None,
            cpu_device: CpuDevice::default(),
        }
    }

    /// Check that wgpu can hand out an adapter. Burn creates the device
    /// itself on first use of `WgpuDevice::DefaultDevice`.
    fn init_gpu() -> Result<WgpuDevice> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::from_env_or_default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: None,
        }))
        .map_err(|e| Error::Backend(format!("no GPU adapter available: {e}")))?;

        tracing::debug!("Selected GPU adapter: {:?}", adapter.get_info());
        Ok(WgpuDevice::DefaultDevice)
    }

    pub fn has_gpu(&self) -> bool {
        self.gpu_device.is_some()
    }

    pub fn gpu_device(&self) -> Option<&WgpuDevice> {
        self.gpu_device.as_ref()
    }

    pub fn cpu_device(&self) -> &CpuDevice {
        &self.cpu_device
    }
}

impl Default for BackendPool {
    fn default() -> Self {
        Self::detect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_only_pool() {
        let pool = BackendPool::cpu_only();
        assert!(!pool.has_gpu());
        assert!(pool.gpu_device().is_none());
        let _cpu = pool.cpu_device();
    }

    #[test]
    fn test_detect_never_fails() {
        // GPU may or may not be available
        let pool = BackendPool::detect();
        assert_eq!(pool.has_gpu(), pool.gpu_device().is_some());
        if let Some(device) = pool.gpu_device() {
            assert_eq!(device, &WgpuDevice::DefaultDevice);
        }
    }
}
