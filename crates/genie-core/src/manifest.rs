//! Weights manifest format.
//!
//! The manifest is a JSON array of weight groups. Each group names the
//! binary shard files holding its tensors and lists the tensors in storage
//! order:
//!
//! ```json
//! [{
//!   "paths": ["group1-shard1of1.bin"],
//!   "weights": [
//!     {"name": "phero_model/decoder/pitches/dense/bias", "shape": [88], "dtype": "float32"}
//!   ]
//! }]
//! ```
//!
//! Tensor bytes are little-endian and concatenated group after group, shard
//! after shard, so byte offsets follow from the declaration order.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The only dtype the decoder consumes.
pub const FLOAT32: &str = "float32";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub name: String,
    pub shape: Vec<usize>,
    #[serde(default = "default_dtype")]
    pub dtype: String,
}

fn default_dtype() -> String {
    FLOAT32.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightGroup {
    pub paths: Vec<String>,
    pub weights: Vec<WeightEntry>,
}

/// Parsed manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightsManifest {
    pub groups: Vec<WeightGroup>,
}

/// Resolved location of one tensor inside the concatenated payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    pub name: String,
    pub shape: Vec<usize>,
    pub dtype: String,
    /// Byte offset into the concatenated payload.
    pub offset: usize,
    /// Byte length.
    pub length: usize,
}

impl ParameterSpec {
    pub fn num_elements(&self) -> usize {
        self.length / std::mem::size_of::<f32>()
    }
}

impl WeightsManifest {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::config(format!("malformed weights manifest: {e}")))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("cannot read manifest {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// Byte length declared by one group.
    pub fn group_bytes(group: &WeightGroup) -> Result<usize> {
        group.weights.iter().try_fold(0usize, |acc, entry| {
            acc.checked_add(entry_bytes(entry)?)
                .ok_or_else(|| Error::config("manifest byte size overflows"))
        })
    }

    /// Resolve offsets and lengths of every tensor, validating dtypes,
    /// shapes and name uniqueness.
    pub fn layout(&self) -> Result<Vec<ParameterSpec>> {
        let mut specs: Vec<ParameterSpec> = Vec::new();
        let mut offset = 0usize;

        for entry in self.groups.iter().flat_map(|g| g.weights.iter()) {
            if specs.iter().any(|s| s.name == entry.name) {
                return Err(Error::config(format!(
                    "duplicate parameter name '{}'",
                    entry.name
                )));
            }
            let length = entry_bytes(entry)?;
            specs.push(ParameterSpec {
                name: entry.name.clone(),
                shape: entry.shape.clone(),
                dtype: entry.dtype.clone(),
                offset,
                length,
            });
            offset = offset
                .checked_add(length)
                .ok_or_else(|| Error::config("manifest byte size overflows"))?;
        }

        Ok(specs)
    }

    /// Total payload size in bytes.
    pub fn total_bytes(&self) -> Result<usize> {
        self.groups.iter().try_fold(0usize, |acc, group| {
            acc.checked_add(Self::group_bytes(group)?)
                .ok_or_else(|| Error::config("manifest byte size overflows"))
        })
    }
}

fn entry_bytes(entry: &WeightEntry) -> Result<usize> {
    if entry.dtype != FLOAT32 {
        return Err(Error::config(format!(
            "parameter '{}' has unsupported dtype '{}'",
            entry.name, entry.dtype
        )));
    }
    if entry.shape.is_empty() || entry.shape.contains(&0) {
        return Err(Error::config(format!(
            "parameter '{}' has degenerate shape {:?}",
            entry.name, entry.shape
        )));
    }
    entry
        .shape
        .iter()
        .try_fold(std::mem::size_of::<f32>(), |acc, &dim| acc.checked_mul(dim))
        .ok_or_else(|| Error::config(format!("parameter '{}' is too large", entry.name)))
}
