//! Parameter store: named host tensors loaded from a weights manifest.

use crate::error::{Error, Result};
use crate::manifest::{ParameterSpec, WeightsManifest};
use std::collections::HashMap;
use std::path::Path;

/// Dense row-major `f32` tensor living in host memory.
#[derive(Debug, Clone, PartialEq)]
pub struct HostTensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl HostTensor {
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Self> {
        let expected = shape
            .iter()
            .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
            .ok_or_else(|| Error::config(format!("tensor shape {shape:?} is too large")))?;
        if shape.is_empty() || expected != data.len() {
            return Err(Error::config(format!(
                "tensor of shape {shape:?} cannot hold {} values",
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn num_bytes(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }

    /// Fail with [`Error::ShapeMismatch`] unless the shape equals `expected`.
    pub fn expect_shape(&self, name: &str, expected: &[usize]) -> Result<()> {
        if self.shape != expected {
            return Err(Error::shape(name, expected, &self.shape));
        }
        Ok(())
    }
}

/// Immutable set of named parameters.
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    tensors: HashMap<String, HostTensor>,
    order: Vec<String>,
}

impl ParameterStore {
    /// Load a manifest and the shard files it references. Shard paths are
    /// resolved relative to the manifest's directory.
    pub fn load(manifest_path: impl AsRef<Path>) -> Result<Self> {
        let manifest_path = manifest_path.as_ref();
        let manifest = WeightsManifest::load(manifest_path)?;
        let base = manifest_path.parent().unwrap_or_else(|| Path::new("."));

        let mut payload = Vec::new();
        for group in &manifest.groups {
            let declared = WeightsManifest::group_bytes(group)?;
            let start = payload.len();
            for shard in &group.paths {
                let shard_path = base.join(shard);
                let bytes = std::fs::read(&shard_path).map_err(|e| {
                    Error::config(format!("cannot read shard {}: {e}", shard_path.display()))
                })?;
                payload.extend_from_slice(&bytes);
            }
            let actual = payload.len() - start;
            if actual != declared {
                return Err(Error::config(format!(
                    "weight group {:?} declares {declared} bytes but its shards hold {actual}",
                    group.paths
                )));
            }
        }

        let store = Self::from_bytes(&manifest, &payload)?;
        tracing::info!(
            "Loaded {} parameters ({} bytes) from {}",
            store.len(),
            store.total_bytes(),
            manifest_path.display()
        );
        Ok(store)
    }

    /// Decode a concatenated little-endian payload against a manifest.
    pub fn from_bytes(manifest: &WeightsManifest, payload: &[u8]) -> Result<Self> {
        let specs = manifest.layout()?;
        let declared = manifest.total_bytes()?;
        if payload.len() != declared {
            return Err(Error::config(format!(
                "manifest declares {declared} bytes but payload holds {}",
                payload.len()
            )));
        }

        let mut store = Self::default();
        for spec in specs {
            let tensor = decode(&spec, payload)?;
            store.insert(spec.name, tensor)?;
        }
        Ok(store)
    }

    /// Build a store from already decoded tensors.
    pub fn from_tensors<I, S>(tensors: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, HostTensor)>,
        S: Into<String>,
    {
        let mut store = Self::default();
        for (name, tensor) in tensors {
            store.insert(name.into(), tensor)?;
        }
        Ok(store)
    }

    fn insert(&mut self, name: String, tensor: HostTensor) -> Result<()> {
        if self.tensors.contains_key(&name) {
            return Err(Error::config(format!("duplicate parameter name '{name}'")));
        }
        self.order.push(name.clone());
        self.tensors.insert(name, tensor);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&HostTensor> {
        self.tensors
            .get(name)
            .ok_or_else(|| Error::MissingParameter(name.to_string()))
    }

    /// Parameter names in manifest order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.tensors.values().map(HostTensor::num_bytes).sum()
    }
}

fn decode(spec: &ParameterSpec, payload: &[u8]) -> Result<HostTensor> {
    let bytes = payload
        .get(spec.offset..spec.offset + spec.length)
        .ok_or_else(|| Error::config(format!("parameter '{}' lies outside payload", spec.name)))?;
    let data = bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    HostTensor::new(spec.shape.clone(), data)
}
